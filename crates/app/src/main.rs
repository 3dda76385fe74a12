use std::fmt;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use quiz_core::time::Clock;
use services::sessions::SessionMode;
use services::{AppServices, SessionError, SessionRequest};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidMode { raw: String },
    InvalidCount { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidMode { raw } => write!(f, "invalid --mode value: {raw}"),
            ArgsError::InvalidCount { raw } => write!(f, "invalid --count value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!(
        "  cargo run -p app -- quiz  [--db <sqlite_url>] [--content <bundle.json>] \
         [--mode quick5|quick10|focus] [--source <subject/topic>]... [--count <n>]"
    );
    eprintln!("  cargo run -p app -- stats [--db <sqlite_url>] [--content <bundle.json>] [--json]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:quiz.sqlite3");
    eprintln!("  --content content/bundle.json");
    eprintln!("  --mode quick10");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_CONTENT");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Quiz,
    Stats,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "quiz" => Some(Self::Quiz),
            "stats" => Some(Self::Stats),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    content_path: PathBuf,
    mode: SessionMode,
    count: Option<usize>,
    json: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("QUIZ_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://quiz.sqlite3".into(), normalize_sqlite_url);
        let mut content_path = std::env::var("QUIZ_CONTENT")
            .ok()
            .map_or_else(|| PathBuf::from("content/bundle.json"), PathBuf::from);
        let mut mode = SessionMode::Quick10;
        let mut sources: Vec<String> = Vec::new();
        let mut count = None;
        let mut json = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--content" => {
                    content_path = PathBuf::from(require_value(args, "--content")?);
                }
                "--mode" => {
                    let value = require_value(args, "--mode")?;
                    mode = match value.as_str() {
                        "quick5" => SessionMode::Quick5,
                        "quick10" => SessionMode::Quick10,
                        "focus" => SessionMode::Focus,
                        _ => return Err(ArgsError::InvalidMode { raw: value }),
                    };
                }
                "--source" => {
                    sources.push(require_value(args, "--source")?);
                }
                "--count" => {
                    let value = require_value(args, "--count")?;
                    let parsed: usize = value
                        .parse()
                        .ok()
                        .filter(|n| *n > 0)
                        .ok_or(ArgsError::InvalidCount { raw: value })?;
                    count = Some(parsed);
                }
                "--json" => json = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        // Source filters override the mode: one source runs a topic session,
        // several run a merged one.
        if !sources.is_empty() {
            mode = if sources.len() == 1 {
                SessionMode::Specific(sources.remove(0))
            } else {
                SessionMode::Multi(sources)
            };
        }

        Ok(Self {
            db_url,
            content_path,
            mode,
            count,
            json,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: run a quiz when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Quiz,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Quiz,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so
    // core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let app = AppServices::init(&parsed.db_url, &parsed.content_path, Clock::default_clock())
        .await?;

    match cmd {
        Command::Quiz => run_quiz(&app, &parsed).await,
        Command::Stats => run_stats(&app, parsed.json).await,
    }
}

async fn run_quiz(app: &AppServices, parsed: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut request = SessionRequest::new(parsed.mode.clone());
    if let Some(count) = parsed.count {
        request = request.with_count(count);
    }

    let mut session = match app.sessions.start_session(&request).await {
        Ok(session) => session,
        Err(SessionError::Empty) => {
            println!("No questions match that selection. Nothing to do.");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut out = std::io::stdout();

    while let Some(view) = app.sessions.current_question(&session) {
        println!();
        println!("[{}/{}] {}", view.number, view.total, view.text);
        if let Some(image) = &view.image {
            println!("  (bild: {image})");
        }
        for (i, text) in view.option_texts.iter().enumerate() {
            println!("  {}. {}", i + 1, text);
        }

        let Some(choice) = read_choice(&mut input, &mut out, view.option_texts.len())? else {
            println!("Avbrutet.");
            break;
        };

        let result = app.sessions.answer_current(&mut session, choice).await?;
        if result.is_correct {
            println!("Rätt!");
        } else {
            println!(
                "Fel. Rätt svar var {}: {}",
                result.correct_display_index + 1,
                view.option_texts[result.correct_display_index]
            );
        }
        if !result.feedback.is_empty() {
            println!("  {}", result.feedback);
        }
        if !result.explanation.is_empty() {
            println!("  {}", result.explanation);
        }

        app.sessions.advance(&mut session);
    }

    let summary = app.sessions.summary(&session);
    println!();
    println!(
        "Klart: {}/{} rätt av {} besvarade.",
        summary.correct, summary.total, summary.answered
    );
    let stats = app.dashboard.stats().await?;
    if let Some(accuracy) = stats.today_accuracy {
        println!("Idag: {} frågor, {accuracy}% rätt.", stats.today_seen);
    }

    Ok(())
}

/// Read a 1-based option number from stdin; `None` on quit or end of input.
fn read_choice(
    input: &mut impl BufRead,
    out: &mut impl Write,
    options: usize,
) -> Result<Option<usize>, std::io::Error> {
    loop {
        write!(out, "Svar (1-{options}, q för att avsluta): ")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim();
        if trimmed.eq_ignore_ascii_case("q") {
            return Ok(None);
        }
        match trimmed.parse::<usize>() {
            Ok(n) if (1..=options).contains(&n) => return Ok(Some(n - 1)),
            _ => writeln!(out, "Ange en siffra mellan 1 och {options}.")?,
        }
    }
}

async fn run_stats(app: &AppServices, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let stats = app.dashboard.stats().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Frågor i katalogen: {}", stats.total_questions);
    println!("Besvarade någon gång: {}", stats.answered);
    println!("  varav någon gång rätt: {}", stats.ever_correct);
    println!("  varav någon gång fel:  {}", stats.ever_wrong);
    match stats.overall_accuracy {
        Some(accuracy) => println!("Total träffsäkerhet: {accuracy}%"),
        None => println!("Total träffsäkerhet: –"),
    }
    println!("Idag: {} frågor, {} rätt.", stats.today_seen, stats.today_correct);
    println!();
    println!("Per ämnesområde:");
    for (source, count) in &stats.per_source {
        println!("  {source}: {count} frågor");
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        let mut iter = args.iter().map(ToString::to_string);
        Args::parse(&mut iter)
    }

    #[test]
    fn defaults_to_quick10() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.mode, SessionMode::Quick10);
        assert_eq!(args.count, None);
        assert!(!args.json);
    }

    #[test]
    fn mode_and_count_are_parsed() {
        let args = parse(&["--mode", "focus", "--count", "7"]).unwrap();
        assert_eq!(args.mode, SessionMode::Focus);
        assert_eq!(args.count, Some(7));
    }

    #[test]
    fn single_source_becomes_specific_mode() {
        let args = parse(&["--source", "Anatomi/Hjartat"]).unwrap();
        assert_eq!(args.mode, SessionMode::Specific("Anatomi/Hjartat".into()));
    }

    #[test]
    fn repeated_sources_merge_into_multi_mode() {
        let args = parse(&[
            "--source",
            "Anatomi/Hjartat",
            "--source",
            "Farmakologi/Antibiotika",
        ])
        .unwrap();
        assert_eq!(
            args.mode,
            SessionMode::Multi(vec![
                "Anatomi/Hjartat".into(),
                "Farmakologi/Antibiotika".into()
            ])
        );
    }

    #[test]
    fn rejects_bad_mode_and_zero_count() {
        assert!(matches!(
            parse(&["--mode", "cram"]),
            Err(ArgsError::InvalidMode { .. })
        ));
        assert!(matches!(
            parse(&["--count", "0"]),
            Err(ArgsError::InvalidCount { .. })
        ));
    }

    #[test]
    fn normalizes_relative_sqlite_paths() {
        assert_eq!(
            normalize_sqlite_url("sqlite::memory:".into()),
            "sqlite::memory:"
        );
        assert_eq!(
            normalize_sqlite_url("sqlite:///tmp/x.sqlite3".into()),
            "sqlite:///tmp/x.sqlite3"
        );
        assert!(normalize_sqlite_url("quiz.sqlite3".into()).starts_with("sqlite://"));
    }

    #[test]
    fn read_choice_accepts_numbers_and_quit() {
        let mut out = Vec::new();
        let mut input = "3\n".as_bytes();
        assert_eq!(read_choice(&mut input, &mut out, 4).unwrap(), Some(2));

        let mut input = "9\nq\n".as_bytes();
        assert_eq!(read_choice(&mut input, &mut out, 4).unwrap(), None);

        let mut input = "".as_bytes();
        assert_eq!(read_choice(&mut input, &mut out, 4).unwrap(), None);
    }
}
