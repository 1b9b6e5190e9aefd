//! Shared output layer for human/JSON parity across all CLI commands.
//!
//! Every command handler receives an [`OutputMode`] and renders its result
//! with [`render`]. Failures are reported once, by `main`, through
//! [`render_error`]: `error: <message>` plus an optional hint on stderr, or a
//! `{"error": {...}}` object in JSON mode.

use serde::Serialize;
use std::io::{self, Write};
use tether_core::RelationError;

/// Output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Plain lines for operators.
    Human,
    /// Machine-readable JSON (one pretty-printed document per command).
    Json,
}

impl OutputMode {
    pub const fn from_json_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Human }
    }
}

/// A structured error with optional suggestion and error code.
#[derive(Debug, Serialize)]
pub struct CliError {
    /// Human-readable error message.
    pub message: String,
    /// Optional suggestion for how to fix the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Machine-readable error code (e.g. "E2001").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CliError {
    /// Create a simple error with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            error_code: None,
        }
    }
}

/// Build a [`CliError`] from a command failure, picking up the code and
/// hint of any [`RelationError`] in its cause chain.
impl From<&anyhow::Error> for CliError {
    fn from(err: &anyhow::Error) -> Self {
        let mut cli_error = Self::new(format!("{err:#}"));
        if let Some(relation) = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<RelationError>())
        {
            cli_error.error_code = Some(relation.code().code().to_string());
            cli_error.suggestion = relation.hint().map(str::to_string);
        }
        cli_error
    }
}

/// Render a serializable value to stdout in the requested format.
///
/// In JSON mode, the value is serialized with `serde_json`. In human mode,
/// the provided `human_fn` closure writes the text.
pub fn render<T: Serialize>(
    mode: OutputMode,
    value: &T,
    human_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputMode::Human => human_fn(value, &mut out)?,
    }
    Ok(())
}

/// Render an error to stderr in the requested format.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    write_error(mode, error, &mut out)
}

fn write_error(mode: OutputMode, error: &CliError, out: &mut dyn Write) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({
                "error": error,
            });
            serde_json::to_writer_pretty(&mut *out, &wrapper)?;
            writeln!(out)?;
        }
        OutputMode::Human => {
            writeln!(out, "error: {}", error.message)?;
            if let Some(ref suggestion) = error.suggestion {
                writeln!(out, "  suggestion: {suggestion}")?;
            }
        }
    }
    Ok(())
}

/// Join IDs for human output; `-` when empty.
pub fn id_list(ids: &[i64]) -> String {
    if ids.is_empty() {
        return "-".to_string();
    }
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context as _;

    #[test]
    fn output_mode_follows_json_flag() {
        assert_eq!(OutputMode::from_json_flag(true), OutputMode::Json);
        assert_eq!(OutputMode::from_json_flag(false), OutputMode::Human);
    }

    #[test]
    fn cli_error_picks_up_relation_code_through_context() {
        let err = Err::<(), _>(RelationError::NotFound("parts".into()))
            .context("resolve relationship")
            .expect_err("error");
        let cli_error = CliError::from(&err);

        assert_eq!(cli_error.error_code.as_deref(), Some("E2003"));
        assert!(cli_error.suggestion.is_some());
        assert!(cli_error.message.starts_with("resolve relationship: "));
        assert!(cli_error.message.contains("parts"));
    }

    #[test]
    fn plain_errors_have_no_code() {
        let err = anyhow::anyhow!("boom");
        let cli_error = CliError::from(&err);
        assert_eq!(cli_error.message, "boom");
        assert!(cli_error.error_code.is_none());
    }

    #[test]
    fn human_error_includes_suggestion() {
        let error = CliError {
            message: "nope".into(),
            suggestion: Some("try again".into()),
            error_code: Some("E2003".into()),
        };
        let mut buf = Vec::new();
        write_error(OutputMode::Human, &error, &mut buf).expect("write");
        assert_eq!(
            String::from_utf8(buf).expect("utf8"),
            "error: nope\n  suggestion: try again\n"
        );
    }

    #[test]
    fn json_error_is_wrapped() {
        let mut buf = Vec::new();
        write_error(OutputMode::Json, &CliError::new("nope"), &mut buf).expect("write");
        let value: serde_json::Value = serde_json::from_slice(&buf).expect("json");
        assert_eq!(value["error"]["message"], "nope");
        assert!(value["error"].get("error_code").is_none());
    }

    #[test]
    fn id_list_formats() {
        assert_eq!(id_list(&[]), "-");
        assert_eq!(id_list(&[3, 1]), "3 1");
    }
}
