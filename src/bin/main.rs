use clap::{Parser, Subcommand};
use irodori::config::{self, EngineSettings, defaults};
use irodori::producer::{self, CandidateProducer, ProducerOutput};
use irodori::{
    Edit, EngineError, EngineResult, GenerationClock, HighlightEngine, Range, ReconcileOutcome,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Incremental semantic-highlight range tracking
#[derive(Parser)]
#[command(name = "irodori")]
#[command(version)]
#[command(about = "Compute and track semantic highlight ranges")]
struct Cli {
    /// Extra settings file layered over user and project config
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter (e.g. debug, irodori::reconcile=trace); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Highlight a file once and print the ranges as JSON
    Highlight {
        file: PathBuf,

        /// Use the tree-sitter producer for this language instead of the
        /// lexical rules (supported: rust)
        #[arg(long)]
        language: Option<String>,
    },
    /// Replay edits against a highlighted file and print the resulting diff
    Replay {
        file: PathBuf,

        /// JSON array of edits: [{"offset": 0, "removedLength": 0, "text": "x"}]
        #[arg(long)]
        edits: PathBuf,

        #[arg(long)]
        language: Option<String>,
    },
    /// Configuration helpers
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the built-in defaults as TOML
    Defaults,
}

fn init_logging(filter: Option<&str>) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Some(filter) = filter {
        builder.parse_filters(filter);
    }
    builder.format_timestamp_millis().init();
}

fn load_settings(file: &Path, override_path: Option<&Path>) -> EngineSettings {
    let root = file.parent().filter(|p| !p.as_os_str().is_empty());
    let outcome = config::load_settings(root, override_path);
    for event in &outcome.events {
        event.log();
    }
    outcome.settings
}

fn read_text(path: &Path) -> EngineResult<String> {
    Ok(std::fs::read_to_string(path)?)
}

fn print_json<T: Serialize>(value: &T) -> EngineResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|err| EngineError::internal(format!("JSON encoding failed: {}", err)))?;
    println!("{}", json);
    Ok(())
}

fn produce(producer: &dyn CandidateProducer, text: &str) -> EngineResult<Vec<Range>> {
    let clock = GenerationClock::new();
    match producer.compute(text, &clock.token())? {
        ProducerOutput::Candidates(ranges) => Ok(ranges),
        ProducerOutput::Skip => {
            log::warn!("producer skipped the text; it may contain syntax errors");
            Ok(Vec::new())
        }
    }
}

fn highlight(cli: &Cli, file: &Path, language: Option<&str>) -> EngineResult<()> {
    let settings = load_settings(file, cli.config.as_deref());
    let producer = producer::for_language(language, &settings)?;
    let text = read_text(file)?;
    print_json(&produce(producer.as_ref(), &text)?)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplayReport {
    generation: u64,
    /// Ranges after relocating through the edits, before recomputing
    relocated: Vec<Range>,
    added: Vec<Range>,
    removed: Vec<Range>,
    ranges: Vec<Range>,
}

fn replay(cli: &Cli, file: &Path, edits_path: &Path, language: Option<&str>) -> EngineResult<()> {
    let settings = load_settings(file, cli.config.as_deref());
    let producer = producer::for_language(language, &settings)?;
    let mut text = read_text(file)?;
    let edits: Vec<Edit> = serde_json::from_str(&read_text(edits_path)?)
        .map_err(|err| EngineError::config(format!("{}: {}", edits_path.display(), err)))?;

    let engine = HighlightEngine::new(&settings);
    engine.install()?;
    let token = engine.begin_recompute();
    engine.on_producer_output(producer.compute(&text, &token), token.generation());

    for (index, edit) in edits.iter().enumerate() {
        text = edit.apply_to(&text).ok_or_else(|| {
            EngineError::config(format!(
                "edit #{} at {} does not fit the text",
                index, edit.offset
            ))
        })?;
        engine.on_edit(edit);
    }
    let relocated = engine.snapshot();

    let token = engine.begin_recompute();
    let (added, removed) =
        match engine.on_producer_output(producer.compute(&text, &token), token.generation()) {
            ReconcileOutcome::Applied(applied) => (applied.added, applied.removed),
            ReconcileOutcome::Discarded(reason) => {
                log::warn!("final recompute discarded: {:?}", reason);
                (Vec::new(), Vec::new())
            }
        };

    print_json(&ReplayReport {
        generation: engine.generation(),
        relocated,
        added,
        removed,
        ranges: engine.snapshot(),
    })
}

fn print_defaults() -> EngineResult<()> {
    let text = toml::to_string_pretty(&defaults::default_settings())
        .map_err(|err| EngineError::internal(format!("TOML encoding failed: {}", err)))?;
    print!("{}", text);
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    let result = match &cli.command {
        Commands::Highlight { file, language } => highlight(&cli, file, language.as_deref()),
        Commands::Replay {
            file,
            edits,
            language,
        } => replay(&cli, file, edits, language.as_deref()),
        Commands::Config {
            command: ConfigCommands::Defaults,
        } => print_defaults(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
