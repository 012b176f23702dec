//! `insight` - ask the insight agent about a dashboard context from a terminal.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use insight_core::{AnalysisContext, ContextKind, Phase, StreamState, TableRow};
use tracing_subscriber::EnvFilter;

use insight_engine::services::insight::{ConversationManager, InsightStart, SessionOutcome};
use insight_engine::state::EngineState;
use insight_engine::storage::SettingsStore;

#[derive(Parser, Debug)]
#[command(name = "insight", version, about = "Conversational insights for dashboard contexts")]
struct Cli {
    /// Settings file (defaults to <config dir>/insight-engine/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Panel title sent with the request
    #[arg(long, global = true)]
    title: Option<String>,

    /// Follow-up question, asked after the first answer (repeatable)
    #[arg(long = "question", global = true)]
    questions: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(flatten)]
    Ask(ContextCommand),

    /// Print the tool declarations offered for a context kind
    Tools {
        #[arg(long)]
        kind: ContextKind,
    },

    /// Print the cache key derived for a context
    Key {
        #[command(subcommand)]
        context: ContextCommand,
    },

    /// Run one tool against the upstream and print its outcome
    Call {
        /// Tool name, e.g. get_fee_table
        name: String,
        /// Arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
        /// Refuse tools not offered for this kind
        #[arg(long)]
        kind: Option<ContextKind>,
    },
}

#[derive(Subcommand, Debug, Clone)]
enum ContextCommand {
    /// Explain a table view
    Table {
        #[arg(long)]
        total: u64,
        /// Visible row key (repeatable, in display order)
        #[arg(long = "row", required = true)]
        rows: Vec<String>,
        #[arg(long)]
        sort: Option<String>,
    },
    /// Explain a chain detail view
    Chain {
        #[arg(long)]
        chain_id: String,
        /// Weekly active addresses shown on the page
        #[arg(long)]
        metric: f64,
    },
    /// Explain a chart
    Chart {
        #[arg(long)]
        chart_id: String,
        #[arg(long = "series", required = true)]
        series: Vec<String>,
        #[arg(long)]
        range: Option<String>,
    },
    /// Explain a metric card
    Card {
        #[arg(long)]
        card_id: String,
        #[arg(long)]
        value: f64,
    },
}

impl ContextCommand {
    fn into_context(self) -> AnalysisContext {
        match self {
            ContextCommand::Table { total, rows, sort } => AnalysisContext::Table {
                total_items: total,
                sorted_by: sort,
                rows: rows.into_iter().map(TableRow::new).collect(),
                columns: Vec::new(),
            },
            ContextCommand::Chain { chain_id, metric } => AnalysisContext::Chain {
                chain_id,
                weekly_active_addresses: metric,
            },
            ContextCommand::Chart {
                chart_id,
                series,
                range,
            } => AnalysisContext::Chart {
                chart_id,
                series,
                range,
            },
            ContextCommand::Card { card_id, value } => AnalysisContext::Card { card_id, value },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Key { context } => {
            println!("{}", context.into_context().cache_key());
        }
        Command::Tools { kind } => {
            let catalog = insight_tools::ToolCatalog::default();
            let decls = catalog.function_declarations(kind);
            println!("{}", serde_json::to_string_pretty(&decls)?);
        }
        Command::Call { name, args, kind } => {
            let engine = load_engine(cli.config)?;
            let args: serde_json::Value =
                serde_json::from_str(&args).context("--args must be a JSON object")?;
            let outcome = match kind {
                Some(kind) => engine.executor().execute_for(kind, &name, &args).await,
                None => engine.executor().execute(&name, &args).await,
            };
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Ask(context) => {
            let engine = load_engine(cli.config)?;
            let context = context.into_context();
            let title = cli.title.unwrap_or_else(|| context.cache_key());
            let mut conversation = engine.conversation(title, context);

            let start = conversation.request_insight();
            if start == InsightStart::Cached {
                println!("(cached)");
            }
            if !follow(&mut conversation).await? {
                return Ok(());
            }
            for question in &cli.questions {
                println!("\n> {}", question);
                conversation.ask_follow_up(question)?;
                if !follow(&mut conversation).await? {
                    break;
                }
            }
        }
    }
    Ok(())
}

fn load_engine(config: Option<PathBuf>) -> Result<EngineState> {
    let store = match config {
        Some(path) => SettingsStore::open(path),
        None => SettingsStore::new(),
    }
    .context("Failed to load settings")?;
    tracing::debug!("Settings loaded from {}", store.path().display());
    Ok(EngineState::from_settings(store.settings().clone())?)
}

/// Print the panel's progress until the session ends. Returns whether it completed.
async fn follow(conversation: &mut ConversationManager) -> Result<bool> {
    let mut rx = conversation.subscribe();
    let mut printer = Printer::default();
    loop {
        let state = rx.borrow_and_update().clone();
        printer.render(&state)?;
        if state.phase.is_terminal() {
            break;
        }
        if rx.changed().await.is_err() {
            break;
        }
    }

    match conversation.wait().await {
        Some(SessionOutcome::Failed(message)) => {
            eprintln!("error: {}", message);
            Ok(false)
        }
        Some(SessionOutcome::Cancelled) => Ok(false),
        Some(SessionOutcome::Completed) | None => Ok(conversation.state().phase == Phase::Done),
    }
}

/// Prints only what changed since the previous render.
#[derive(Default)]
struct Printer {
    phase: Phase,
    thinking: usize,
    answer: usize,
    tools_started: usize,
    tools_done: Vec<bool>,
}

impl Printer {
    fn render(&mut self, state: &StreamState) -> Result<()> {
        let mut out = std::io::stdout().lock();
        if state.phase != self.phase {
            self.phase = state.phase;
            if !matches!(state.phase, Phase::Streaming | Phase::Done) {
                writeln!(out, "[{}]", state.phase)?;
            }
        }
        if let Some(delta) = state.thinking.get(self.thinking..).filter(|d| !d.is_empty()) {
            writeln!(out, "  . {}", delta.trim_end())?;
            self.thinking = state.thinking.len();
        }
        for call in state.tool_calls.iter().skip(self.tools_started) {
            writeln!(out, "  -> {} {}", call.name, call.args)?;
        }
        self.tools_started = state.tool_calls.len();
        self.tools_done.resize(state.tool_calls.len(), false);
        for (call, reported) in state.tool_calls.iter().zip(self.tools_done.iter_mut()) {
            if *reported || call.is_in_flight() {
                continue;
            }
            match &call.error {
                Some(error) => writeln!(out, "  <- {} failed: {}", call.name, error)?,
                None => writeln!(out, "  <- {} ({} ms)", call.name, call.duration_ms)?,
            }
            *reported = true;
        }
        if let Some(delta) = state.answer.get(self.answer..).filter(|d| !d.is_empty()) {
            write!(out, "{}", delta)?;
            self.answer = state.answer.len();
        }
        if state.phase == Phase::Done {
            writeln!(out)?;
            for source in &state.sources {
                match &source.url {
                    Some(url) => writeln!(out, "  source: {} <{}>", source.title, url)?,
                    None => writeln!(out, "  source: {}", source.title)?,
                }
            }
        }
        out.flush()?;
        Ok(())
    }
}
