use std::{
    fs::OpenOptions,
    io::{self, Write},
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{debug, error, info};
use ratatui::{Terminal, backend::CrosstermBackend};

use watchlink_core::{Config, Theme, WatchSession};

mod actions;
mod app;
mod mpv;
mod ui;

use app::App;

/// Terminal watch page for a single video link, played through mpv.
#[derive(Parser, Debug)]
#[command(name = "watchlink", version, about)]
struct Args {
    /// Page URL of the video (a `/watch/` segment is stripped)
    page_url: String,

    /// Config file (defaults to the user config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Title shown in the header and used for downloads
    #[arg(long)]
    title: Option<String>,

    /// Color theme
    #[arg(long)]
    theme: Option<Theme>,

    /// mpv executable
    #[arg(long)]
    mpv: Option<String>,

    /// Where downloads are saved
    #[arg(long)]
    download_dir: Option<PathBuf>,

    /// Log file (defaults to the user data dir)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Start paused
    #[arg(long)]
    no_autoplay: bool,
}

fn default_log_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("watchlink"))
        .unwrap_or_else(std::env::temp_dir)
        .join("watchlink.log")
}

/// The alternate screen owns stdout, so logs go to a file.
fn init_logging(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format(|buf, record| {
            let datetime = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
            writeln!(
                buf,
                "[{} {:?}] {} {}: {}",
                datetime,
                std::thread::current().id(),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
    Ok(())
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = Config::load(args.config.as_deref()).context("Failed to load config")?;
    if let Some(theme) = args.theme {
        config.theme = theme;
    }
    if let Some(mpv) = &args.mpv {
        config.mpv_path = mpv.clone();
    }
    if let Some(dir) = &args.download_dir {
        config.download_dir = Some(dir.clone());
    }
    if args.no_autoplay {
        config.autoplay = false;
    }
    Ok(config)
}

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_file.clone().unwrap_or_else(default_log_path))?;
    info!("Application starting");

    let config = load_config(&args)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let session = WatchSession::create(config, &args.page_url, args.title.as_deref());
    let mut app = App::new(session, runtime);

    // Set up clean terminal restoration on panic
    let orig_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        restore_terminal();
        error!("PANIC: {}", panic_info);
        orig_hook(panic_info);
    }));

    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen, EnableMouseCapture) {
        let _ = disable_raw_mode();
        return Err(e).context("Failed to setup terminal");
    }
    let mut terminal = match Terminal::new(CrosstermBackend::new(stdout)) {
        Ok(term) => term,
        Err(e) => {
            restore_terminal();
            return Err(e).context("Failed to create terminal");
        }
    };
    debug!("Terminal setup complete");

    app.start();
    let run_result = run(&mut terminal, &mut app);

    info!("Shutting down application");
    app.shutdown();

    let cleanup_result = (|| -> Result<()> {
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)
            .context("Failed to leave alternate screen")?;
        terminal.show_cursor().context("Failed to show cursor")?;
        Ok(())
    })();
    if let Err(e) = &cleanup_result {
        error!("Error during cleanup: {:#}", e);
        eprintln!("Error during cleanup: {:#}", e);
    }

    run_result?;
    info!("Application terminated successfully");
    cleanup_result
}

fn run<W: Write>(terminal: &mut Terminal<CrosstermBackend<W>>, app: &mut App) -> Result<()> {
    // ~30 FPS keeps the spinner and toast bar smooth without flicker
    let tick_rate = Duration::from_millis(33);
    let mut last_tick = Instant::now().checked_sub(tick_rate).unwrap_or_else(Instant::now);

    while !app.should_quit {
        if last_tick.elapsed() >= tick_rate {
            if let Err(e) = app.update() {
                error!("App update error: {:#}", e);
            }
            if let Err(e) = terminal.draw(|f| {
                if let Err(e) = ui::draw_ui(f, app) {
                    error!("UI draw function error: {:#}", e);
                }
            }) {
                // Draw errors are not fatal
                error!("Terminal draw error: {}", e);
            }
            last_tick = Instant::now();
        }

        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            match event::read() {
                Ok(Event::Key(key)) => {
                    debug!("EVENT: Key {:?} with modifiers {:?}", key.code, key.modifiers);
                    if let Err(e) = app.handle_key_event(key) {
                        error!("Key handler error: {:#}", e);
                    }
                }
                Ok(Event::Mouse(mouse)) => {
                    if let Err(e) = app.handle_mouse_event(mouse) {
                        error!("Mouse handler error: {:#}", e);
                    }
                }
                Ok(Event::Resize(w, h)) => {
                    debug!("Resize event: {}x{}", w, h);
                    last_tick = Instant::now().checked_sub(tick_rate).unwrap_or(last_tick);
                }
                Ok(_) => {}
                Err(e) => error!("Error reading event: {}", e),
            }
        }
    }
    Ok(())
}
