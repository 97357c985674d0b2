use chrono::Local;
use clap::Parser;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures_util::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::fs::OpenOptions;
use std::io::{self, Stdout};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::time::{Duration, MissedTickBehavior, interval};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod clock;
mod config;
mod notify;
mod pomodoro;
mod view;

use clock::canvas::ClockCanvas;
use clock::face::AnalogClockRenderer;
use config::AppConfig;
use notify::DesktopNotifier;
use pomodoro::pomodoro::IntervalController;
use pomodoro::scheduler::{Scheduler, TokioScheduler};
use view::TerminalView;

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Pomodoro interval timer with an analog clock, in the terminal.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON config file (defaults to ~/.config/pomo_clock/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log file (defaults to ~/.local/share/pomo_clock/pomo_clock.log)
    #[arg(short, long)]
    log: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    /// Headless: print events as JSON lines and read commands from stdin
    #[arg(long)]
    json: bool,

    /// Do not show desktop notifications
    #[arg(long)]
    no_notify: bool,

    /// Start the first work phase immediately
    #[arg(long)]
    autostart: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Start,
    Stop,
    Reset,
    Quit,
}

impl Command {
    /// Key bindings of the interactive screen.
    fn from_key(key: &KeyEvent) -> Option<Self> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(Command::Quit);
        }
        match key.code {
            KeyCode::Char('s') | KeyCode::Char('S') => Some(Command::Start),
            KeyCode::Char('x') | KeyCode::Char('X') => Some(Command::Stop),
            KeyCode::Char('r') | KeyCode::Char('R') => Some(Command::Reset),
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Command::Quit),
            _ => None,
        }
    }

    /// Line commands of the headless mode.
    fn parse(line: &str) -> Option<Self> {
        match line.trim().to_lowercase().as_str() {
            "start" | "s" => Some(Command::Start),
            "stop" | "x" => Some(Command::Stop),
            "reset" | "r" => Some(Command::Reset),
            "quit" | "q" | "exit" => Some(Command::Quit),
            _ => None,
        }
    }
}

fn default_log_path() -> PathBuf {
    PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
        .join(".local/share/pomo_clock/pomo_clock.log")
}

/// Logs go to a file so they never tear the terminal view.
fn init_logging(path: &Path, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn setup_terminal() -> io::Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

fn restore_terminal(terminal: &mut Tui) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()
}

fn apply_command<S: Scheduler>(controller: &mut IntervalController<S>, command: Command) {
    info!(?command, running = controller.is_running(), "command");
    match command {
        Command::Start => controller.start(),
        Command::Stop => controller.stop(),
        Command::Reset => controller.reset(),
        Command::Quit => {}
    }
}

async fn next_key(keys: &mut Option<EventStream>) -> Option<io::Result<Event>> {
    match keys.as_mut() {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}

async fn next_line(lines: &mut Option<Lines<BufReader<Stdin>>>) -> io::Result<Option<String>> {
    match lines.as_mut() {
        Some(lines) => lines.next_line().await,
        None => std::future::pending().await,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_path = args.log.clone().unwrap_or_else(default_log_path);
    init_logging(&log_path, args.verbose)?;
    info!(
        "=== Session started at {} ===",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );

    let config = AppConfig::load(args.config.as_deref())?;
    debug!(?config, "configuration loaded");

    let mut terminal = if args.json {
        None
    } else {
        Some(setup_terminal()?)
    };
    let result = run(&args, &config, terminal.as_mut()).await;
    if let Some(terminal) = terminal.as_mut() {
        restore_terminal(terminal)?;
    }
    result
}

async fn run(
    args: &Args,
    config: &AppConfig,
    mut terminal: Option<&mut Tui>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (scheduler, mut fired_rx) = TokioScheduler::new();
    let mut controller = IntervalController::new(config.interval(), scheduler);
    let mut events = controller.subscribe();

    let notifier = DesktopNotifier::new(config.desktop_notifications && !args.no_notify);
    info!(notifications = notifier.is_enabled(), json = args.json, "view ready");
    let mut view = TerminalView::new(controller.snapshot(), notifier);

    let mut clock = AnalogClockRenderer::new(config.clock_size);
    let mut canvas = ClockCanvas::new(config.clock_size);
    let mut clock_interval = interval(Duration::from_millis(config.tick_interval_ms));
    clock_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let headless = terminal.is_none();
    let mut keys = (!headless).then(EventStream::new);
    let mut lines = headless.then(|| BufReader::new(tokio::io::stdin()).lines());

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    if args.autostart {
        controller.start();
    }

    loop {
        tokio::select! {
            _ = clock_interval.tick() => {
                let angles = clock.render(&mut canvas, &Local::now());
                if headless {
                    view::print_clock(angles)?;
                }
            }
            Some(handle) = fired_rx.recv() => controller.on_timer_fired(handle),
            Some(event) = events.recv() => {
                view.apply(&event);
                if headless {
                    view::print_event(&event)?;
                }
            }
            key = next_key(&mut keys) => match key {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    match Command::from_key(&key) {
                        Some(Command::Quit) => break,
                        Some(command) => apply_command(&mut controller, command),
                        None => {}
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => keys = None,
            },
            line = next_line(&mut lines) => match line? {
                Some(line) => match Command::parse(&line) {
                    Some(Command::Quit) => break,
                    Some(command) => apply_command(&mut controller, command),
                    None => debug!(input = %line, "unknown command"),
                },
                None => {
                    debug!("stdin closed, waiting for Ctrl+C");
                    lines = None;
                }
            },
            _ = &mut ctrl_c => break,
        }

        if let Some(terminal) = terminal.as_deref_mut() {
            terminal.draw(|f| view.ui(f, &canvas))?;
        }
    }

    info!(
        repetitions = controller.repetition_count(),
        "=== Session ended ==="
    );
    Ok(())
}
