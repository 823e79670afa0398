use std::fmt::Write as FmtWrite;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use fex_lib::{ErrorOutput, ExportError, FexOutput, OutcomeStatus, RunState};

use crate::cli::OutputFormat;

/// Maps a run state to the process exit code.
pub fn exit_code(state: RunState) -> ExitCode {
    match state {
        RunState::CompletedAll => ExitCode::SUCCESS,
        RunState::CompletedPartial => ExitCode::from(1),
        RunState::Failed => ExitCode::from(2),
    }
}

/// Write output in the requested format.
pub fn write_output(
    body: &FexOutput,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => write_json_output(body, output)?,
        OutputFormat::Pretty => write_pretty_output(body, output)?,
    };
    Ok(())
}

/// Render an error and return the fatal exit code.
pub fn render_error(err: ExportError, format: OutputFormat, output: Option<PathBuf>) -> ExitCode {
    tracing::error!(error = %err, "export failed");
    let payload = FexOutput::Error(ErrorOutput::new(err.to_payload()));

    if let Err(write_err) = write_output(&payload, format, output.as_deref()) {
        eprintln!("Failed to write error output: {}", write_err);
        if let Ok(content) = serde_json::to_string(&payload) {
            println!("{content}");
        }
    }

    exit_code(RunState::Failed)
}

/// Write JSON output to file or stdout.
fn write_json_output(body: &FexOutput, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let content = serde_json::to_string(body)?;
    if let Some(path) = output {
        std::fs::write(path, content)?;
    } else {
        println!("{content}");
    }
    Ok(())
}

/// Write pretty output to file or stdout.
fn write_pretty_output(body: &FexOutput, output: Option<&Path>) -> io::Result<()> {
    let use_human = output.is_none() && std::io::stdout().is_terminal();

    if use_human {
        println!("{}", format_pretty(body, true));
        return Ok(());
    }

    // Non-tty or file output: keep JSON shape for pipelines/files.
    let content = serde_json::to_string_pretty(body).map_err(io::Error::other)?;
    if let Some(path) = output {
        std::fs::write(path, &content)?;
    } else {
        println!("{content}");
    }
    Ok(())
}

/// Format output for human consumption in a terminal.
pub fn format_pretty(body: &FexOutput, colorize: bool) -> String {
    let mut buf = String::new();
    match body {
        FexOutput::Export(out) => {
            let (label, code) = match out.state {
                RunState::CompletedAll => ("DONE", "32"),
                RunState::CompletedPartial => ("PARTIAL", "33"),
                RunState::Failed => ("FAILED", "31"),
            };
            writeln!(
                buf,
                "{} Exported {}/{} images from {} (node {}) to {}",
                color(label, code, colorize),
                out.summary.succeeded,
                out.summary.total,
                out.document.file_key,
                out.document.node_id,
                out.image_save_path.display()
            )
            .ok();
            for outcome in &out.outcomes {
                let (mark, code) = match outcome.status {
                    OutcomeStatus::Success => ("ok", "32"),
                    OutcomeStatus::RenderFailed => ("render failed", "31"),
                    OutcomeStatus::PersistFailed => ("save failed", "31"),
                    OutcomeStatus::Skipped => ("skipped", "33"),
                };
                let detail = match (&outcome.file_path, &outcome.error) {
                    (Some(path), _) => path.display().to_string(),
                    (None, Some(err)) => err.clone(),
                    (None, None) => String::new(),
                };
                writeln!(
                    buf,
                    "- [{}] {} ({}) {}",
                    color(mark, code, colorize),
                    outcome.name,
                    outcome.node_id,
                    detail
                )
                .ok();
            }
        }
        FexOutput::Error(err) => {
            writeln!(buf, "{} {}", color("ERROR", "31", colorize), err.error.message).ok();
            if let Some(remediation) = &err.error.remediation {
                writeln!(buf, "Hint: {remediation}").ok();
            }
        }
    }
    buf.trim_end().to_string()
}

fn color(text: &str, code: &str, enabled: bool) -> String {
    if enabled {
        format!("\u{1b}[{code}m{text}\u{1b}[0m")
    } else {
        text.to_string()
    }
}
