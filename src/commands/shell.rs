//! Interactive query shell
//!
//! Reads one question per line. Lines starting with `:` adjust the session
//! instead of querying.

use super::query::write_query_response;
use crate::config::Config;
use crate::error::Result;
use crate::history::QueryHistory;
use crate::pipeline::{AnswerOutcome, QueryEngine, QueryRequest};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{error, info};

/// Entries shown by `:history`
const HISTORY_SHOWN: usize = 10;

const HELP: &str = "\
Commands:
  :history           show recent questions
  :clear             clear the history
  :k N               results to retrieve
  :threshold T       minimum similarity score
  :filter key:value  restrict by metadata (':filter' alone clears it)
  :help              show this help
  :quit              leave the shell";

/// Retrieval settings that persist between questions
#[derive(Debug, Clone, PartialEq)]
pub struct ShellSettings {
    pub k: usize,
    pub threshold: f32,
    pub filter: Option<String>,
}

impl ShellSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            k: config.query.default_k,
            threshold: config.query.default_threshold,
            filter: None,
        }
    }

    fn request(&self, query: &str) -> QueryRequest {
        QueryRequest {
            query: query.to_string(),
            k: self.k,
            threshold: self.threshold,
            filter: self.filter.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Ask(String),
    History,
    Clear,
    SetK(usize),
    SetThreshold(f32),
    SetFilter(Option<String>),
    Help,
    Quit,
    Empty,
    Invalid(String),
}

/// Interpret one input line
pub fn parse_line(line: &str) -> ShellCommand {
    let line = line.trim();
    if line.is_empty() {
        return ShellCommand::Empty;
    }
    let Some(directive) = line.strip_prefix(':') else {
        return ShellCommand::Ask(line.to_string());
    };

    let (name, arg) = match directive.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (directive, ""),
    };

    match name {
        "history" => ShellCommand::History,
        "clear" => ShellCommand::Clear,
        "help" => ShellCommand::Help,
        "quit" | "q" | "exit" => ShellCommand::Quit,
        "k" => match arg.parse::<usize>() {
            Ok(k) if k > 0 => ShellCommand::SetK(k),
            _ => ShellCommand::Invalid(format!("':k' expects a positive integer, got '{}'", arg)),
        },
        "threshold" => match arg.parse::<f32>() {
            Ok(t) if t.is_finite() && (-1.0..=1.0).contains(&t) => ShellCommand::SetThreshold(t),
            _ => ShellCommand::Invalid(format!(
                "':threshold' expects a number between -1 and 1, got '{}'",
                arg
            )),
        },
        "filter" if arg.is_empty() => ShellCommand::SetFilter(None),
        "filter" => ShellCommand::SetFilter(Some(arg.to_string())),
        other => ShellCommand::Invalid(format!("Unknown command ':{}' (try :help)", other)),
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// Apply everything except `Ask`
fn apply(
    command: ShellCommand,
    settings: &mut ShellSettings,
    history: &QueryHistory,
    out: &mut dyn Write,
) -> std::io::Result<Flow> {
    match command {
        ShellCommand::Ask(_) | ShellCommand::Empty => {}
        ShellCommand::Quit => return Ok(Flow::Stop),
        ShellCommand::Help => writeln!(out, "{}", HELP)?,
        ShellCommand::Invalid(message) => writeln!(out, "{}", message)?,
        ShellCommand::Clear => {
            history.clear();
            writeln!(out, "History cleared")?;
        }
        ShellCommand::History => {
            let entries = history.recent(HISTORY_SHOWN);
            if entries.is_empty() {
                writeln!(out, "No questions yet")?;
            }
            for entry in entries {
                let status = match &entry.response.outcome {
                    AnswerOutcome::Answered { sources, .. } => format!("{} sources", sources.len()),
                    AnswerOutcome::NoMatches => "no results".to_string(),
                    AnswerOutcome::BelowThreshold { best_score, .. } => {
                        format!("below threshold, best {:.3}", best_score)
                    }
                };
                writeln!(
                    out,
                    "[{}] {} (k={}, threshold={}) -> {}",
                    entry.asked_at.format("%H:%M:%S"),
                    entry.request.query,
                    entry.request.k,
                    entry.request.threshold,
                    status
                )?;
            }
        }
        ShellCommand::SetK(k) => {
            settings.k = k;
            writeln!(out, "k = {}", k)?;
        }
        ShellCommand::SetThreshold(t) => {
            settings.threshold = t;
            writeln!(out, "threshold = {}", t)?;
        }
        ShellCommand::SetFilter(filter) => {
            match &filter {
                Some(f) => writeln!(out, "filter = {}", f)?,
                None => writeln!(out, "filter cleared")?,
            }
            settings.filter = filter;
        }
    }
    Ok(Flow::Continue)
}

/// Run the shell until `:quit` or end of input
pub async fn cmd_shell<R>(
    engine: &QueryEngine,
    history: &QueryHistory,
    mut settings: ShellSettings,
    input: R,
    out: &mut dyn Write,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    writeln!(out, "Ask about the founders (:help for commands, :quit to leave)")?;
    let mut lines = input.lines();

    loop {
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = parse_line(&line);
        let ShellCommand::Ask(query) = command else {
            if apply(command, &mut settings, history, out)? == Flow::Stop {
                break;
            }
            continue;
        };

        let request = settings.request(&query);
        match engine.answer_query(&request).await {
            Ok(response) => {
                write_query_response(out, &response)?;
                history.record(request, response);
            }
            // errors are reported and the session continues
            Err(e) => {
                error!("{}", e);
                writeln!(out, "Error: {}", e)?;
            }
        }
    }

    info!("Shell closed after {} questions", history.len());
    Ok(())
}
