//! Session commands shared by the REPL and the script runner.
//!
//! Grammar:
//!
//! ```text
//! store [type=T] [importance=F] [source=S] CONTENT [:: CONTEXT]
//! recall [limit=N] [min=F] QUERY [:: CONTEXT]
//! consolidate [force]
//! stats | export | help | quit
//! ```

use amem_memory::{
    ConsolidationOutcome, GraphExport, MemoryStatistics, NoteType, RecallMatch, RecallOptions,
    SharedMemory, StoreOptions,
};
use anyhow::{Result, anyhow, bail};
use console::{Style, style};

/// Separates content (or query) from context.
const CONTEXT_SEPARATOR: &str = "::";

// ─────────────────────────────────────────────────────────────────────────────
// Parsing
// ─────────────────────────────────────────────────────────────────────────────

/// One parsed session command.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Store {
        content: String,
        options: StoreOptions,
    },
    Recall {
        query: String,
        options: RecallOptions,
    },
    Consolidate {
        force: bool,
    },
    Stats,
    Export,
    Help,
    Quit,
}

/// Split `text` at the first `::` into body and optional context.
fn split_context(text: &str) -> (&str, Option<&str>) {
    match text.split_once(CONTEXT_SEPARATOR) {
        Some((body, context)) => (body.trim(), Some(context.trim())),
        None => (text.trim(), None),
    }
}

/// Pull leading `key=value` options whose key is in `keys`.
///
/// Returns the options and the remaining text.
fn take_options<'a>(mut text: &'a str, keys: &[&str]) -> (Vec<(&'a str, &'a str)>, &'a str) {
    let mut options = Vec::new();
    loop {
        text = text.trim_start();
        let token_end = text.find(char::is_whitespace).unwrap_or(text.len());
        let token = &text[..token_end];
        match token.split_once('=') {
            Some((key, value)) if keys.contains(&key) => {
                options.push((key, value));
                text = &text[token_end..];
            }
            _ => break,
        }
    }
    (options, text.trim())
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| anyhow!("invalid value for {}: '{}'", key, value))
}

/// Parse one line of session input.
pub fn parse_command(line: &str) -> Result<SessionCommand> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    match verb.to_ascii_lowercase().as_str() {
        "store" => {
            let (options, body) = take_options(rest, &["type", "importance", "source"]);
            let mut store = StoreOptions::new();
            for (key, value) in options {
                match key {
                    "type" => store.note_type = value.parse::<NoteType>()?,
                    "importance" => store.importance = parse_number(key, value)?,
                    _ => store.source = value.to_string(),
                }
            }
            let (content, context) = split_context(body);
            if content.is_empty() {
                bail!("store needs content");
            }
            if let Some(context) = context {
                store.context = context.to_string();
            }
            Ok(SessionCommand::Store {
                content: content.to_string(),
                options: store,
            })
        }
        "recall" => {
            let (options, body) = take_options(rest, &["limit", "min"]);
            let mut recall = RecallOptions::new();
            for (key, value) in options {
                match key {
                    "limit" => recall.limit = Some(parse_number(key, value)?),
                    _ => recall.min_relevance = Some(parse_number(key, value)?),
                }
            }
            let (query, context) = split_context(body);
            if query.is_empty() {
                bail!("recall needs a query");
            }
            recall.context = context.filter(|c| !c.is_empty()).map(str::to_string);
            Ok(SessionCommand::Recall {
                query: query.to_string(),
                options: recall,
            })
        }
        "consolidate" => match rest {
            "" => Ok(SessionCommand::Consolidate { force: false }),
            "force" => Ok(SessionCommand::Consolidate { force: true }),
            other => bail!("unexpected argument to consolidate: '{}'", other),
        },
        "stats" => Ok(SessionCommand::Stats),
        "export" => Ok(SessionCommand::Export),
        "help" | "?" => Ok(SessionCommand::Help),
        "quit" | "exit" | "q" => Ok(SessionCommand::Quit),
        "" => bail!("empty command"),
        other => bail!("unknown command: '{}' (try 'help')", other),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Execution
// ─────────────────────────────────────────────────────────────────────────────

/// What the caller should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    /// Print the output (may be empty) and keep going.
    Continue(String),
    Quit,
}

/// A memory plus output preferences.
pub struct Session {
    memory: SharedMemory,
    json: bool,
}

impl Session {
    pub fn new(memory: SharedMemory, json: bool) -> Self {
        Self { memory, json }
    }

    /// Run a command against the memory and render its result.
    pub async fn execute(&self, command: SessionCommand) -> Result<Flow> {
        let output = match command {
            SessionCommand::Store { content, options } => {
                let note = self.memory.store(&content, options).await?;
                if self.json {
                    serde_json::to_string(&note)?
                } else {
                    format!(
                        "Stored {} {} keywords: [{}] tags: [{}] links: {}",
                        style(&note.id).cyan(),
                        Style::new().dim().apply_to(note.note_type),
                        note.keywords.join(", "),
                        note.tags.join(", "),
                        note.linked_notes.len()
                    )
                }
            }
            SessionCommand::Recall { query, options } => {
                let hits = self.memory.recall(&query, options).await?;
                if self.json {
                    serde_json::to_string(&hits)?
                } else {
                    render_hits(&hits)
                }
            }
            SessionCommand::Consolidate { force } => {
                let outcome = if force {
                    ConsolidationOutcome::Completed(self.memory.consolidate_now().await)
                } else {
                    self.memory.consolidate().await
                };
                if self.json {
                    serde_json::to_string(&outcome)?
                } else {
                    render_consolidation(&outcome)
                }
            }
            SessionCommand::Stats => {
                let stats = self.memory.statistics().await;
                if self.json {
                    serde_json::to_string(&stats)?
                } else {
                    render_stats(&stats)
                }
            }
            SessionCommand::Export => {
                let export: GraphExport = self.memory.export_graph().await;
                if self.json {
                    serde_json::to_string(&export)?
                } else {
                    export.to_json()?
                }
            }
            SessionCommand::Help => help_text(),
            SessionCommand::Quit => return Ok(Flow::Quit),
        };
        Ok(Flow::Continue(output))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rendering
// ─────────────────────────────────────────────────────────────────────────────

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

fn render_hits(hits: &[RecallMatch]) -> String {
    let dim = Style::new().dim();
    if hits.is_empty() {
        return dim.apply_to("No matches").to_string();
    }
    hits.iter()
        .enumerate()
        .map(|(i, hit)| {
            format!(
                "{}. {} {} {}",
                style(i + 1).cyan(),
                dim.apply_to(format!("[{:.3}]", hit.score)),
                truncate(&hit.note.content, 70),
                dim.apply_to(format!("({})", hit.note.id))
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_consolidation(outcome: &ConsolidationOutcome) -> String {
    match outcome {
        ConsolidationOutcome::Completed(report) => format!(
            "Consolidated {} new semantic notes from {} episodic notes ({} notes total)",
            report.consolidated, report.episodic_processed, report.total_notes
        ),
        ConsolidationOutcome::Skipped(skipped) => format!(
            "{} {}",
            Style::new().yellow().apply_to("Skipped:"),
            skipped.reason
        ),
    }
}

fn render_stats(stats: &MemoryStatistics) -> String {
    let mut lines = vec![
        style("Memory Statistics").bold().to_string(),
        Style::new().dim().apply_to("─".repeat(40)).to_string(),
        format!("  Notes:           {}", stats.total_notes),
        format!("  Edges:           {}", stats.total_edges),
        format!("  Avg connections: {:.2}", stats.avg_connections),
    ];
    for (note_type, count) in &stats.note_types {
        lines.push(format!("    {:<14} {}", note_type, count));
    }
    lines.push(format!("  Stores:          {}", stats.total_stores));
    lines.push(format!("  Recalls:         {}", stats.total_recalls));
    lines.push(format!("  Consolidations:  {}", stats.total_consolidations));
    lines.join("\n")
}

/// Command reference.
pub fn help_text() -> String {
    let lines = [
        ("store [type=T] [importance=F] [source=S] CONTENT [:: CONTEXT]", "Store a note"),
        ("recall [limit=N] [min=F] QUERY [:: CONTEXT]", "Recall related notes"),
        ("consolidate [force]", "Synthesize semantic notes"),
        ("stats", "Show statistics"),
        ("export", "Dump the graph as JSON"),
        ("help", "Show this help"),
        ("quit", "Leave the session"),
    ];
    lines
        .iter()
        .map(|(usage, about)| format!("  {} {}", style(format!("{:<64}", usage)).cyan(), about))
        .collect::<Vec<_>>()
        .join("\n")
}
