use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::scheduler::{Scheduler, TimerHandle};

pub const TICK_INTERVAL_MS: u64 = 1000; // One countdown step per second
pub const POMODORO_WORK_SECONDS: u64 = 25 * 60;
pub const POMODORO_SHORT_BREAK_SECONDS: u64 = 5 * 60;
pub const POMODORO_LONG_BREAK_SECONDS: u64 = 15 * 60;
pub const POMODORO_CYCLE_LENGTH: u32 = 8; // Every 8th repetition is a long break

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Work,
    ShortBreak,
    LongBreak,
    Stopped,
}

impl Phase {
    pub(crate) fn as_str(&self) -> &str {
        match self {
            Phase::Idle => "Timer",
            Phase::Work => "Work",
            Phase::ShortBreak => "Short Break",
            Phase::LongBreak => "Long Break",
            Phase::Stopped => "Stopped",
        }
    }

    pub(crate) fn emoji(&self) -> &str {
        match self {
            Phase::Idle => "⏱",
            Phase::Work => "💼",
            Phase::ShortBreak | Phase::LongBreak => "☕",
            Phase::Stopped => "⏸",
        }
    }

    pub(crate) fn color(&self) -> LabelColor {
        match self {
            Phase::Idle => LabelColor::Black,
            Phase::Work => LabelColor::Green,
            Phase::ShortBreak => LabelColor::Blue,
            Phase::LongBreak | Phase::Stopped => LabelColor::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelColor {
    Black,
    Green,
    Blue,
    Red,
}

/// Lengths of the three phases plus the repetition period of the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalConfig {
    pub work_seconds: u64,
    pub short_break_seconds: u64,
    pub long_break_seconds: u64,
    pub cycle_length: u32,
    pub tick_interval: Duration,
}

impl Default for IntervalConfig {
    fn default() -> Self {
        Self {
            work_seconds: POMODORO_WORK_SECONDS,
            short_break_seconds: POMODORO_SHORT_BREAK_SECONDS,
            long_break_seconds: POMODORO_LONG_BREAK_SECONDS,
            cycle_length: POMODORO_CYCLE_LENGTH,
            tick_interval: Duration::from_millis(TICK_INTERVAL_MS),
        }
    }
}

impl IntervalConfig {
    /// Phase and duration selected for the given repetition number.
    pub fn phase_for(&self, repetition_count: u32) -> (Phase, u64) {
        let position = repetition_count % self.cycle_length;
        if position == 0 {
            (Phase::LongBreak, self.long_break_seconds)
        } else if position % 2 == 0 {
            (Phase::ShortBreak, self.short_break_seconds)
        } else {
            (Phase::Work, self.work_seconds)
        }
    }
}

/// Phase boundary alert. The view decides how to present it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Alert {
    BreakTime,
    WorkTime,
}

impl Alert {
    pub fn title(&self) -> &'static str {
        match self {
            Alert::BreakTime => "Break Time",
            Alert::WorkTime => "Work Time",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Alert::BreakTime => "Take a short break!",
            Alert::WorkTime => "Time to get back to work!",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntervalSnapshot {
    pub phase: Phase,
    pub repetition_count: u32,
    pub remaining_seconds: u64,
    pub running: bool,
    pub display: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum IntervalEvent {
    StateChanged(IntervalSnapshot),
    Alert(Alert),
}

pub type EventSender = mpsc::UnboundedSender<IntervalEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<IntervalEvent>;

/// Renders a second count as zero padded `MM:SS`.
pub fn format_remaining(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Work/break cycle state machine. Holds at most one pending timer.
pub struct IntervalController<S: Scheduler> {
    config: IntervalConfig,
    scheduler: S,
    phase: Phase,
    repetition_count: u32,
    remaining_seconds: u64,
    running: bool,
    pending: Option<TimerHandle>,
    subscribers: Vec<EventSender>,
}

impl<S: Scheduler> IntervalController<S> {
    pub fn new(config: IntervalConfig, scheduler: S) -> Self {
        Self {
            remaining_seconds: config.work_seconds,
            config,
            scheduler,
            phase: Phase::Idle,
            repetition_count: 0,
            running: false,
            pending: None,
            subscribers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self) -> EventReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn repetition_count(&self) -> u32 {
        self.repetition_count
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    #[cfg(test)]
    pub fn pending(&self) -> Option<TimerHandle> {
        self.pending
    }

    pub fn display(&self) -> String {
        format_remaining(self.remaining_seconds)
    }

    pub fn snapshot(&self) -> IntervalSnapshot {
        IntervalSnapshot {
            phase: self.phase,
            repetition_count: self.repetition_count,
            remaining_seconds: self.remaining_seconds,
            running: self.running,
            display: self.display(),
        }
    }

    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.repetition_count += 1;
        let (phase, duration) = self.config.phase_for(self.repetition_count);
        self.phase = phase;
        self.remaining_seconds = duration;
        self.running = true;
        info!(
            repetition = self.repetition_count,
            phase = phase.as_str(),
            seconds = duration,
            "phase started"
        );
        self.publish_state();
        self.arm();
    }

    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.disarm();
        self.running = false;
        self.phase = Phase::Stopped;
        info!(remaining = %self.display(), "timer stopped");
        self.publish_state();
    }

    pub fn reset(&mut self) {
        self.disarm();
        self.repetition_count = 0;
        self.running = false;
        self.remaining_seconds = self.config.work_seconds;
        self.phase = Phase::Idle;
        info!("timer reset");
        self.publish_state();
    }

    /// One countdown step. Ignored unless the countdown is running.
    pub fn tick(&mut self) {
        if !self.running {
            debug!("tick while not running ignored");
            return;
        }
        self.disarm();
        if self.remaining_seconds > 0 {
            self.remaining_seconds -= 1;
        }
        self.publish_state();

        if self.remaining_seconds > 0 {
            self.arm();
            return;
        }

        self.running = false;
        self.start();
        // Parity is taken after start() bumped the count for the next phase.
        let alert = if self.repetition_count % 2 == 0 {
            Alert::BreakTime
        } else {
            Alert::WorkTime
        };
        info!(alert = alert.message(), "phase boundary");
        self.publish(IntervalEvent::Alert(alert));
    }

    /// Host entry point for a fired timer. Only the live handle counts.
    pub fn on_timer_fired(&mut self, handle: TimerHandle) {
        if self.pending != Some(handle) {
            debug!(timer = handle.id(), "stale timer ignored");
            return;
        }
        // Fired, so nothing is left to cancel.
        self.pending = None;
        self.tick();
    }

    fn arm(&mut self) {
        self.disarm();
        self.pending = Some(self.scheduler.schedule_after(self.config.tick_interval));
    }

    fn disarm(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel(handle);
        }
    }

    fn publish_state(&mut self) {
        let snapshot = self.snapshot();
        self.publish(IntervalEvent::StateChanged(snapshot));
    }

    fn publish(&mut self, event: IntervalEvent) {
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}
