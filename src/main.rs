use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::KeyEventKind,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use hiit::{
    app::App,
    clock::{Clock, SystemClock},
    config::{ConfigStore, FileConfigStore, RawConfig},
    cue::TerminalCueEmitter,
    logging,
    runtime::{CrosstermEventSource, FixedTicker, HiitEvent, Runner},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};

/// interval workout timer for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "An interval workout timer: warm-up, work/rest rounds with an optional long rest every N rounds, and a cool-down, with terminal bell cues. Flags override the saved settings."
)]
pub struct Cli {
    /// warm-up length in seconds (0 to skip)
    #[clap(short = 'w', long)]
    warmup: Option<u32>,

    /// number of work rounds
    #[clap(short = 'r', long)]
    rounds: Option<u32>,

    /// work length in seconds
    #[clap(short = 'W', long)]
    work: Option<u32>,

    /// rest after each round, in seconds (0 for none)
    #[clap(long)]
    rest1: Option<u32>,

    /// long rest in seconds, replacing the regular rest every N rounds
    #[clap(long)]
    rest2: Option<u32>,

    /// take the long rest after every N-th round (0 for never)
    #[clap(long = "rest2-every")]
    rest2_every: Option<u32>,

    /// cool-down length in seconds (0 to skip)
    #[clap(short = 'c', long)]
    cooldown: Option<u32>,

    /// ring the terminal bell on cues
    #[clap(long)]
    sound: Option<bool>,

    /// request vibration cues (not available in a terminal)
    #[clap(long)]
    vibrate: Option<bool>,

    /// reconciliation interval in milliseconds
    #[clap(long = "tick-ms", default_value_t = 200, value_parser = clap::value_parser!(u64).range(10..1000))]
    tick_ms: u64,

    /// settings file to use instead of the default location
    #[clap(long = "config")]
    config_path: Option<PathBuf>,

    /// start the workout right away
    #[clap(long)]
    start: bool,
}

impl Cli {
    /// Apply command line overrides on top of the stored form
    fn apply_to(&self, raw: &mut RawConfig) {
        let overrides = [
            (self.warmup, &mut raw.warmup_seconds),
            (self.rounds, &mut raw.total_rounds),
            (self.work, &mut raw.work_seconds),
            (self.rest1, &mut raw.rest1_seconds),
            (self.rest2, &mut raw.rest2_seconds),
            (self.rest2_every, &mut raw.rest2_every_n_rounds),
            (self.cooldown, &mut raw.cooldown_seconds),
        ];
        for (value, slot) in overrides {
            if let Some(v) = value {
                *slot = v.to_string();
            }
        }
        if let Some(sound) = self.sound {
            raw.sound_enabled = sound;
        }
        if let Some(vibrate) = self.vibrate {
            raw.vibrate_enabled = vibrate;
        }
    }

    fn store(&self) -> FileConfigStore {
        match &self.config_path {
            Some(p) => FileConfigStore::with_path(p),
            None => FileConfigStore::new(),
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let _log_guard = logging::init();

    let store = cli.store();
    let mut raw = store.load();
    cli.apply_to(&mut raw);

    let mut app = App::new(
        raw,
        SystemClock,
        Box::new(TerminalCueEmitter::new(io::stdout())),
        Box::new(store),
    );
    if cli.start {
        if let Err(e) = app.start() {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::ValueValidation, e.to_string()).exit();
        }
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app, Duration::from_millis(cli.tick_ms));

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, C: Clock>(
    terminal: &mut Terminal<B>,
    app: &mut App<C>,
    tick: Duration,
) -> Result<(), Box<dyn Error>> {
    let mut runner = Runner::new(CrosstermEventSource::new(), FixedTicker::new(tick));

    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        match runner.step() {
            HiitEvent::Key(key) if key.kind == KeyEventKind::Press => {
                app.on_key(key);
                if app.should_quit() {
                    break;
                }
            }
            HiitEvent::Tick => {
                app.on_tick();
            }
            HiitEvent::Key(_) | HiitEvent::Resize => {}
        }
    }

    Ok(())
}
