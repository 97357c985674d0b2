use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use serde_json::json;
use std::io::{self, Write};
use tracing::warn;

use crate::clock::canvas::ClockCanvas;
use crate::clock::face::HandAngles;
use crate::notify::DesktopNotifier;
use crate::pomodoro::pomodoro::{Alert, IntervalEvent, IntervalSnapshot, LabelColor};

fn term_color(color: LabelColor) -> Color {
    match color {
        LabelColor::Black => Color::Reset,
        LabelColor::Green => Color::Green,
        LabelColor::Blue => Color::Blue,
        LabelColor::Red => Color::Red,
    }
}

/// Largest rect with a 2:1 cell ratio centered in `area`. Terminal cells
/// are about twice as tall as wide, so this keeps the dial round.
fn dial_area(area: Rect) -> Rect {
    let height = area.height.min(area.width / 2);
    let width = height * 2;
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

/// Presentation state fed by controller events. Alerts are forwarded to the
/// desktop notifier and remembered for the status line.
pub struct TerminalView {
    snapshot: IntervalSnapshot,
    last_alert: Option<Alert>,
    notifier: DesktopNotifier,
}

impl TerminalView {
    pub fn new(initial: IntervalSnapshot, notifier: DesktopNotifier) -> Self {
        Self {
            snapshot: initial,
            last_alert: None,
            notifier,
        }
    }

    pub fn apply(&mut self, event: &IntervalEvent) {
        match event {
            IntervalEvent::StateChanged(snapshot) => self.snapshot = snapshot.clone(),
            IntervalEvent::Alert(alert) => {
                self.last_alert = Some(*alert);
                if let Err(e) = self.notifier.send(*alert) {
                    warn!("Failed to send notification: {}", e);
                }
            }
        }
    }

    fn phase_line(&self) -> Line<'static> {
        let phase = self.snapshot.phase;
        Line::from(vec![
            Span::styled(
                format!("{} {}", phase.emoji(), phase.as_str()),
                Style::default()
                    .fg(term_color(phase.color()))
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("   repetition {}", self.snapshot.repetition_count),
                Style::default().fg(Color::DarkGray),
            ),
        ])
    }

    fn status_line(&self) -> Line<'static> {
        let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));
        let mut spans = vec![
            key("s"),
            Span::raw(": start | "),
            key("x"),
            Span::raw(": stop | "),
            key("r"),
            Span::raw(": reset | "),
            key("q"),
            Span::raw(": quit"),
        ];
        if let Some(alert) = self.last_alert {
            spans.push(Span::raw("   "));
            spans.push(Span::styled(
                format!("🔔 {}", alert.message()),
                Style::default().fg(Color::LightYellow),
            ));
        }
        Line::from(spans)
    }

    pub fn ui(&self, f: &mut Frame, clock: &ClockCanvas) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(3),
            ])
            .split(f.area());

        let phase = Paragraph::new(self.phase_line())
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Pomodoro"));
        f.render_widget(phase, chunks[0]);

        let countdown = Paragraph::new(Line::from(Span::styled(
            self.snapshot.display.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Remaining"));
        f.render_widget(countdown, chunks[1]);

        f.render_widget(clock.widget(), dial_area(chunks[2]));

        let status = Paragraph::new(self.status_line()).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title("Status"),
        );
        f.render_widget(status, chunks[3]);
    }
}

/// Headless output: one JSON object per line on stdout.
pub fn print_event(event: &IntervalEvent) -> io::Result<()> {
    print_line(&serde_json::to_string(event)?)
}

pub fn print_clock(angles: HandAngles) -> io::Result<()> {
    let line = json!({
        "event": "clock",
        "data": {
            "hour": angles.hour,
            "minute": angles.minute,
            "second": angles.second,
        },
    });
    print_line(&line.to_string())
}

fn print_line(line: &str) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", line)?;
    stdout.flush()
}
