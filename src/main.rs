use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use interview_board::{
    app::App,
    app_dirs::AppDirs,
    backend::{BackendKind, FileBackend, SqliteBackend, StorageBackend},
    board::Board,
    candidate::Stage,
    clock::Clock,
    config::{Config, ConfigStore, FileConfigStore},
    error::StoreError,
    runtime::{CrosstermEventSource, EventSource, FixedTicker, Runner, StorageWatcher, Ticker},
    store::{CorruptPolicy, Store},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::OpenOptions,
    io::{self, stdin},
    path::PathBuf,
    sync::Mutex,
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// terminal kanban board for interview candidates
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Track interview candidates from the waiting lobby through Chinese and English interviews to completion. Runs an interactive board by default; subcommands script the same storage."
)]
pub struct Cli {
    /// directory holding the board's storage
    #[clap(short = 'd', long, global = true)]
    data_dir: Option<PathBuf>,

    /// storage backend to use
    #[clap(short = 'b', long, value_enum, global = true)]
    backend: Option<BackendKind>,

    /// reinitialise unreadable storage with the seed candidates instead of failing
    #[clap(long, global = true)]
    reseed_on_corrupt: bool,

    /// config file to read instead of the default location
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
enum Command {
    /// print the board grouped by stage
    List {
        /// print the stored candidate list as JSON
        #[clap(long)]
        json: bool,
    },
    /// check in a new candidate
    Add {
        name: String,
        /// role applied for (defaults to the configured default role)
        #[clap(short = 'r', long)]
        role: Option<String>,
    },
    /// move a candidate to WAITING, IN_CHINESE, IN_ENGLISH or COMPLETED
    Move { id: String, stage: String },
    /// remove a candidate
    Remove { id: String },
    /// replace the board with the seed candidates
    Reset,
}

impl Cli {
    /// Merge command-line overrides into the loaded config
    fn apply_to(&self, mut config: Config) -> Config {
        if let Some(dir) = &self.data_dir {
            config.data_dir = Some(dir.clone());
        }
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if self.reseed_on_corrupt {
            config.on_corrupt = CorruptPolicy::Reseed;
        }
        config
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let config_store = match &cli.config {
        Some(path) => FileConfigStore::with_path(path),
        None => FileConfigStore::new(),
    };
    let config = cli.apply_to(config_store.load());
    let config_path = config_store.path().to_path_buf();
    let data_dir = config.resolved_data_dir();

    match cli.command.clone() {
        Some(command) => {
            init_tracing(None, "interview_board=warn");
            match config.backend {
                BackendKind::File => run_command(FileBackend::new(&data_dir), &config, command),
                BackendKind::Sqlite => run_command(
                    SqliteBackend::open(AppDirs::sqlite_path(&data_dir))?,
                    &config,
                    command,
                ),
            }
        }
        None => {
            if !stdin().is_tty() {
                let mut cmd = Cli::command();
                cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
            }
            std::fs::create_dir_all(&data_dir)?;
            let log = OpenOptions::new()
                .create(true)
                .append(true)
                .open(AppDirs::log_path(&data_dir))?;
            init_tracing(Some(log), "interview_board=info,warn");
            info!(
                storage = %AppDirs::describe(&data_dir, config.backend).display(),
                backend = %config.backend,
                config = %config_path.display(),
                "starting board"
            );

            match config.backend {
                BackendKind::File => {
                    run_board(|| Ok(FileBackend::new(&data_dir)), &config)
                }
                BackendKind::Sqlite => {
                    let path = AppDirs::sqlite_path(&data_dir);
                    run_board(|| SqliteBackend::open(&path), &config)
                }
            }
        }
    }
}

fn init_tracing(log_file: Option<std::fs::File>, default_directive: &str) {
    let filter = EnvFilter::try_from_env("INTERVIEW_BOARD_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    let registry = tracing_subscriber::registry().with(filter);

    match log_file {
        Some(file) => registry
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .init(),
        None => registry
            .with(fmt::layer().compact().with_writer(io::stderr))
            .init(),
    }
}

fn open_store<B: StorageBackend>(backend: B, config: &Config) -> Store<B> {
    Store::new(backend).on_corrupt(config.on_corrupt)
}

fn run_command<B: StorageBackend>(
    backend: B,
    config: &Config,
    command: Command,
) -> Result<(), Box<dyn Error>> {
    let store = open_store(backend, config);
    match command {
        Command::List { json } => {
            let candidates = store.list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&candidates)?);
            } else {
                print!("{}", render_board_text(&Board::from_candidates(candidates)));
            }
        }
        Command::Add { name, role } => {
            let role = role.unwrap_or_else(|| config.default_role.clone());
            let added = store.add(&name, &role)?;
            println!("{}", added.id);
        }
        Command::Move { id, stage } => {
            let stage: Stage = stage.parse()?;
            store.move_stage(&id, stage)?;
        }
        Command::Remove { id } => store.remove(&id)?,
        Command::Reset => store.reset()?,
    }
    Ok(())
}

/// Plain-text board for `list`
fn render_board_text(board: &Board) -> String {
    let mut out = String::new();
    for (stage, cards) in board.columns() {
        out.push_str(&format!("{} ({})\n", stage, cards.len()));
        for c in cards {
            out.push_str(&format!(
                "  {}\t{}\t{}\tzh:{} en:{}\n",
                c.id,
                c.name,
                c.role,
                if c.has_completed_chinese { "done" } else { "-" },
                if c.has_completed_english { "done" } else { "-" },
            ));
        }
    }
    out
}

fn run_board<B, F>(open: F, config: &Config) -> Result<(), Box<dyn Error>>
where
    B: StorageBackend + Send + 'static,
    F: Fn() -> Result<B, StoreError>,
{
    let store = open_store(open()?, config);
    store.init()?;

    let events = CrosstermEventSource::new();
    let _watcher = StorageWatcher::spawn(
        open()?,
        store.key(),
        store.write_marker(),
        config.watch_interval(),
        events.sender(),
    );
    let runner = Runner::new(
        events,
        FixedTicker::new(config.tick_rate()),
    );
    let mut app = App::new(store, config.roles.clone(), config.default_role.clone());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<TB, B, C, E, T>(
    terminal: &mut Terminal<TB>,
    app: &mut App<B, C>,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>>
where
    TB: Backend,
    B: StorageBackend,
    C: Clock,
    E: EventSource,
    T: Ticker,
{
    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;
        if app.should_quit() {
            break;
        }
        app.handle_event(runner.step());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use interview_board::candidate::seed_candidates;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["interview-board"]);
        assert_eq!(cli.data_dir, None);
        assert_eq!(cli.backend, None);
        assert!(!cli.reseed_on_corrupt);
        assert_eq!(cli.command, None);
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "interview-board",
            "list",
            "--json",
            "--backend",
            "sqlite",
            "-d",
            "/tmp/x",
        ]);
        assert_eq!(cli.command, Some(Command::List { json: true }));
        assert_eq!(cli.backend, Some(BackendKind::Sqlite));
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/x")));
    }

    #[test]
    fn test_cli_add_with_role() {
        let cli = Cli::parse_from(["interview-board", "add", "王小明", "-r", "QA Engineer"]);
        assert_eq!(
            cli.command,
            Some(Command::Add {
                name: "王小明".to_string(),
                role: Some("QA Engineer".to_string())
            })
        );
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "interview-board",
            "--data-dir",
            "/srv/board",
            "--backend",
            "sqlite",
            "--reseed-on-corrupt",
        ]);
        let cfg = cli.apply_to(Config::default());
        assert_eq!(cfg.data_dir, Some(PathBuf::from("/srv/board")));
        assert_eq!(cfg.backend, BackendKind::Sqlite);
        assert_eq!(cfg.on_corrupt, CorruptPolicy::Reseed);
    }

    #[test]
    fn test_cli_without_overrides_keeps_config() {
        let cli = Cli::parse_from(["interview-board", "reset"]);
        let cfg = Config {
            backend: BackendKind::Sqlite,
            on_corrupt: CorruptPolicy::Reseed,
            ..Config::default()
        };
        assert_eq!(cli.apply_to(cfg.clone()), cfg);
    }

    #[test]
    fn test_render_board_text_groups_by_stage() {
        let text = render_board_text(&Board::from_candidates(seed_candidates(0)));
        let headers: Vec<_> = text.lines().filter(|l| !l.starts_with(' ')).collect();
        assert_eq!(
            headers,
            vec!["WAITING (1)", "IN_CHINESE (1)", "IN_ENGLISH (1)", "COMPLETED (0)"]
        );
        assert!(text.contains("  2\t陳雅婷\tProduct Manager\tzh:- en:done"));
    }
}
