use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use quiz_core::model::{ModuleSelector, Seed};
use services::{
    GradingMode, HttpQuizApi, HttpQuizConfig, LocalQuizApi, QuizApi, QuizLoopService,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod player;

const DEFAULT_BANK_DIR: &str = "demos/bank";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidMode { raw: String },
    InvalidModule { raw: String },
    InvalidSeed { raw: String },
    InvalidApiUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidMode { raw } => {
                write!(f, "invalid --mode value: {raw} (expected immediate or batch)")
            }
            ArgsError::InvalidModule { raw } => write!(f, "invalid --module value: {raw}"),
            ArgsError::InvalidSeed { raw } => write!(f, "invalid --seed value: {raw}"),
            ArgsError::InvalidApiUrl { raw } => write!(f, "invalid --api value: {raw}"),
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
    eprintln!("  cargo run -p quiz-app -- [play]  [--bank <dir>] [--api <url>] [--mode immediate|batch]");
    eprintln!("                                  [--module <id|all>] [--seed <n>]");
    eprintln!("  cargo run -p quiz-app -- modules [--bank <dir>] [--api <url>]");
    eprintln!("  cargo run -p quiz-app -- health  [--bank <dir>] [--api <url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --bank {DEFAULT_BANK_DIR}");
    eprintln!("  --mode immediate");
    eprintln!("  --module all");
    eprintln!("  --seed  (random on every start and retry)");
    eprintln!();
    eprintln!("Environment (.env is loaded first):");
    eprintln!("  QUIZ_BANK_DIR, QUIZ_API_BASE_URL, QUIZ_MODE, QUIZ_MODULE, QUIZ_SEED, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Modules,
    Health,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "modules" => Some(Self::Modules),
            "health" => Some(Self::Health),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Args {
    bank_dir: PathBuf,
    api_base_url: Option<String>,
    mode: GradingMode,
    module: ModuleSelector,
    seed: Option<Seed>,
}

impl Args {
    /// Defaults overlaid with environment values. Unusable values are logged and ignored.
    fn from_env() -> Self {
        let bank_dir = env_value("QUIZ_BANK_DIR")
            .map_or_else(|| PathBuf::from(DEFAULT_BANK_DIR), PathBuf::from);
        let api_base_url = env_value("QUIZ_API_BASE_URL");
        let mode = env_parsed("QUIZ_MODE").unwrap_or_default();
        let module = env_parsed("QUIZ_MODULE").unwrap_or_default();
        let seed = env_parsed("QUIZ_SEED");
        Self {
            bank_dir,
            api_base_url,
            mode,
            module,
            seed,
        }
    }

    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self::from_env();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--bank" => {
                    parsed.bank_dir = PathBuf::from(require_value(args, "--bank")?);
                }
                "--api" => {
                    let value = require_value(args, "--api")?;
                    if !(value.starts_with("http://") || value.starts_with("https://")) {
                        return Err(ArgsError::InvalidApiUrl { raw: value });
                    }
                    parsed.api_base_url = Some(value);
                }
                "--mode" => {
                    let value = require_value(args, "--mode")?;
                    parsed.mode = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidMode { raw: value.clone() })?;
                }
                "--module" => {
                    let value = require_value(args, "--module")?;
                    parsed.module = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidModule { raw: value.clone() })?;
                }
                "--seed" => {
                    let value = require_value(args, "--seed")?;
                    parsed.seed = Some(
                        value
                            .parse()
                            .map_err(|_| ArgsError::InvalidSeed { raw: value.clone() })?,
                    );
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }

    fn build_api(&self) -> Result<Arc<dyn QuizApi>, Box<dyn std::error::Error>> {
        if let Some(url) = &self.api_base_url {
            info!(%url, "using quiz http api");
            return Ok(Arc::new(HttpQuizApi::new(HttpQuizConfig::new(url.as_str()))?));
        }
        let bank = storage::load_bank_dir(&self.bank_dir)?;
        info!(dir = %self.bank_dir.display(), "using local question bank");
        Ok(Arc::new(LocalQuizApi::new(Arc::new(bank))))
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env_value(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unusable environment value");
            None
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "{}=info,services=info,storage=info",
                    env!("CARGO_CRATE_NAME")
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: play when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Play,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Play,
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

    let api = parsed.build_api()?;
    let service = QuizLoopService::new(Arc::clone(&api)).with_mode(parsed.mode);

    match cmd {
        Command::Play => player::play(&service, parsed.module, parsed.seed).await,
        Command::Modules => {
            let modules = service.modules().await?;
            println!("{:<12} {:<32} {:>6}", "ID", "NAME", "TOTAL");
            for module in modules {
                println!("{:<12} {:<32} {:>6}", module.id, module.name, module.total);
            }
            Ok(())
        }
        Command::Health => {
            let health = service.health().await?;
            println!("{}", health.0);
            Ok(())
        }
    }
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
        let mut iter = args.iter().map(|s| (*s).to_owned());
        Args::parse(&mut iter)
    }

    #[test]
    fn flags_override_defaults() {
        let args = parse(&["--mode", "batch", "--module", "cds", "--seed", "42", "--bank", "x"])
            .unwrap();
        assert_eq!(args.mode, GradingMode::Batch);
        assert_eq!(args.module.to_string(), "cds");
        assert_eq!(args.seed, Some(Seed::new(42)));
        assert_eq!(args.bank_dir, PathBuf::from("x"));
    }

    #[test]
    fn bad_flags_are_typed_errors() {
        assert!(matches!(parse(&["--mode", "later"]), Err(ArgsError::InvalidMode { .. })));
        assert!(matches!(parse(&["--seed", "-1"]), Err(ArgsError::InvalidSeed { .. })));
        assert!(matches!(parse(&["--module", "  "]), Err(ArgsError::InvalidModule { .. })));
        assert!(matches!(parse(&["--api", "ftp://x"]), Err(ArgsError::InvalidApiUrl { .. })));
        assert!(matches!(parse(&["--seed"]), Err(ArgsError::MissingValue { flag: "--seed" })));
        assert!(matches!(parse(&["--nope"]), Err(ArgsError::UnknownArg(_))));
    }

    #[test]
    fn subcommands_are_recognised() {
        assert_eq!(Command::from_arg("play"), Some(Command::Play));
        assert_eq!(Command::from_arg("modules"), Some(Command::Modules));
        assert_eq!(Command::from_arg("health"), Some(Command::Health));
        assert_eq!(Command::from_arg("seed"), None);
    }
}
