use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::OpenOptions,
    io::{self, stdin, Write},
    path::PathBuf,
    sync::Mutex,
    time::Duration,
};
use tracing_subscriber::EnvFilter;

use wordgame::{
    app::{App, Control},
    app_dirs::AppDirs,
    config::{ConfigStore, FileConfigStore, MAX_ROUND_SECS},
    db::WordDb,
    runtime::{CrosstermEventSource, EventSource, Runner, ThreadTicker, Ticker},
    ui, Quiz, SortOrder, StoreError, WordStore, WordTally,
};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// timed vocabulary flashcards in the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Keep a list of words and race the clock through the ones you have not seen yet. Words you get right are marked seen and skipped in later rounds."
)]
pub struct Cli {
    /// round length in seconds for this run (does not change the saved default)
    #[clap(short = 's', long, value_parser = clap::value_parser!(u32).range(0..=MAX_ROUND_SECS as i64))]
    secs: Option<u32>,

    /// path to the word database
    #[clap(long)]
    db: Option<PathBuf>,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
enum Command {
    /// add one or more words
    Add {
        #[clap(required = true)]
        words: Vec<String>,
    },
    /// print the word list
    List {
        /// ordering (defaults to the saved one)
        #[clap(long, value_enum)]
        sort: Option<SortOrder>,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging();

    let mut store = match &cli.db {
        Some(path) => WordDb::open(path)?,
        None => WordDb::new()?,
    };

    match cli.command {
        Some(Command::Add { words }) => return add_words(&mut store, &words, &mut io::stdout()),
        Some(Command::List { sort }) => {
            let sort = sort.unwrap_or_else(|| FileConfigStore::new().load().sort);
            return list_words(&store, sort, &mut io::stdout());
        }
        None => {}
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let source = CrosstermEventSource::new();
    let ticker = ThreadTicker::new(source.sender());
    let quiz = Quiz::new(store, ticker);
    let mut app = App::new(quiz, Box::new(FileConfigStore::new()), cli.secs);
    let runner = Runner::new(source, POLL_INTERVAL);

    let result = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Log to a file under the state dir; the terminal belongs to the TUI.
fn init_logging() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if std::fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wordgame=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
}

fn start_tui<B, S, T, E>(
    terminal: &mut Terminal<B>,
    app: &mut App<S, T>,
    runner: &Runner<E>,
) -> Result<(), Box<dyn Error>>
where
    B: Backend,
    S: WordStore,
    T: Ticker,
    E: EventSource,
{
    terminal.draw(|f| ui::draw(app, f))?;

    loop {
        let Some(event) = runner.step() else {
            continue;
        };
        if app.handle_event(event) == Control::Quit {
            break;
        }
        terminal.draw(|f| ui::draw(app, f))?;
    }

    Ok(())
}

fn add_words<S: WordStore, W: Write>(
    store: &mut S,
    words: &[String],
    out: &mut W,
) -> Result<(), Box<dyn Error>> {
    for name in words {
        match store.create(name) {
            Ok(word) => writeln!(out, "added {}", word.name)?,
            Err(StoreError::Validation(e)) => writeln!(out, "skipped {name:?}: {e}")?,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn list_words<S: WordStore, W: Write>(
    store: &S,
    sort: SortOrder,
    out: &mut W,
) -> Result<(), Box<dyn Error>> {
    let words = store.list()?;
    let tally = WordTally::of(&words);
    writeln!(
        out,
        "Total words: {}   Seen: {}   Left: {}",
        tally.total, tally.seen, tally.left
    )?;
    for word in sort.apply(words) {
        let mark = if word.was_seen { 'x' } else { ' ' };
        writeln!(out, "[{mark}] {}", word.name)?;
    }
    Ok(())
}
