//! Shared output layer for pretty/text/JSON parity across all CLI commands.
//!
//! Every command handler receives an [`OutputMode`] and formats its output
//! accordingly: pretty output for humans, compact text for scripts, or stable JSON.
//!
//! # Output mode resolution
//!
//! Precedence (highest wins):
//! 1. `--format` / hidden `--json` flag
//! 2. `FORMAT` env var → `"pretty"` | `"text"` | `"json"`
//! 3. `output` in the user config file
//! 4. Default: [`OutputMode::Pretty`] if stdout is a TTY; [`OutputMode::Text`] if piped.

use clap::ValueEnum;
use serde::Serialize;
use std::io::{self, IsTerminal, Write};
use task_core::config::normalize_output_mode;
use task_core::error::ErrorCode;
use task_core::store::StoreError;

/// Shared width for human pretty separators.
pub const PRETTY_RULE_WIDTH: usize = 72;

/// Write a horizontal separator used by pretty human output.
pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "", width = PRETTY_RULE_WIDTH)
}

/// Render a left-aligned key/value line in human output.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<12} {}", format!("{key}:"), value.as_ref())
}

/// The three output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Human-optimized output (sections, visual framing).
    Pretty,
    /// Plain rows for scripts and pipes.
    Text,
    /// Machine-readable JSON.
    Json,
}

impl OutputMode {
    /// Returns `true` if JSON output was requested.
    pub fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }

    fn from_name(raw: &str) -> Option<Self> {
        match normalize_output_mode(raw)? {
            "json" => Some(Self::Json),
            "text" => Some(Self::Text),
            _ => Some(Self::Pretty),
        }
    }
}

/// Core resolution logic, separated from I/O for testability.
fn resolve_output_mode_inner(
    format_flag: Option<OutputMode>,
    json_flag: bool,
    format_env: Option<&str>,
    config_output: Option<&str>,
    is_tty: bool,
) -> OutputMode {
    if let Some(mode) = format_flag {
        return mode;
    }

    if json_flag {
        return OutputMode::Json;
    }

    // Unknown values fall through to the next source.
    if let Some(mode) = format_env.and_then(OutputMode::from_name) {
        return mode;
    }

    if let Some(mode) = config_output.and_then(OutputMode::from_name) {
        return mode;
    }

    if is_tty {
        OutputMode::Pretty
    } else {
        OutputMode::Text
    }
}

/// Resolve the output mode from CLI flags, environment, config, and TTY defaults.
pub fn resolve_output_mode(
    format_flag: Option<OutputMode>,
    json_flag: bool,
    config_output: Option<&str>,
) -> OutputMode {
    let env_val = std::env::var("FORMAT").ok();
    let is_tty = io::stdout().is_terminal();
    resolve_output_mode_inner(
        format_flag,
        json_flag,
        env_val.as_deref(),
        config_output,
        is_tty,
    )
}

/// Trait implemented by any CLI result type that can be rendered in all modes.
pub trait Renderable {
    /// Render for human consumption: labelled fields with visual framing.
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()>;

    /// Render as one self-contained JSON value.
    fn render_json(&self, w: &mut dyn Write) -> io::Result<()>;

    /// Render as a single text row (no header; see [`table_headers`]).
    ///
    /// [`table_headers`]: Renderable::table_headers
    fn render_table(&self, w: &mut dyn Write) -> io::Result<()>;

    /// Column headers for text mode, in the same order as [`render_table`] fields.
    ///
    /// [`render_table`]: Renderable::render_table
    fn table_headers() -> &'static [&'static str]
    where
        Self: Sized,
    {
        &[]
    }
}

/// Render a list of [`Renderable`] items to stdout.
pub fn render_list<R: Renderable>(items: &[R], mode: OutputMode) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_list(&mut out, items, mode)
}

/// Write a list of [`Renderable`] items.
///
/// - In JSON mode, wraps items in a JSON array (`[]` when empty).
/// - In text mode, prints the header row once, then one row per item.
/// - In pretty mode, renders items sequentially.
pub fn write_list<R: Renderable>(
    out: &mut dyn Write,
    items: &[R],
    mode: OutputMode,
) -> io::Result<()> {
    match mode {
        OutputMode::Pretty => {
            for item in items {
                item.render_human(out)?;
            }
        }
        OutputMode::Text => {
            let headers = if items.is_empty() {
                &[] as &[&str]
            } else {
                R::table_headers()
            };
            if !headers.is_empty() {
                writeln!(out, "{}", headers.join("  "))?;
            }
            for item in items {
                item.render_table(out)?;
            }
        }
        OutputMode::Json => {
            if items.is_empty() {
                return writeln!(out, "[]");
            }
            write!(out, "[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(out, ",")?;
                }
                writeln!(out)?;
                let mut buf = Vec::new();
                item.render_json(&mut buf)?;
                if buf.last() == Some(&b'\n') {
                    buf.pop();
                }
                out.write_all(&buf)?;
            }
            writeln!(out, "\n]")?;
        }
    }
    Ok(())
}

/// A structured error with optional suggestion and error code.
#[derive(Debug, Serialize)]
pub struct CliError {
    /// Human-readable error message.
    pub message: String,
    /// Optional suggestion for how to fix the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Machine-readable error code (e.g. "E5003").
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

    /// Build the most specific error available from a command failure.
    ///
    /// Store errors carry their own code; other failures may be tagged with
    /// an [`ErrorCode`] context layer.
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        if let Some(store_err) = err.downcast_ref::<StoreError>() {
            return Self::from(store_err);
        }

        if let Some(code) = err.downcast_ref::<ErrorCode>() {
            let detail: Vec<String> = err.chain().skip(1).map(ToString::to_string).collect();
            let message = if detail.is_empty() {
                code.message().to_string()
            } else {
                detail.join(": ")
            };
            return Self {
                message,
                suggestion: code.hint().map(str::to_string),
                error_code: Some(code.code().to_string()),
            };
        }

        Self::new(format!("{err:#}"))
    }
}

impl From<&StoreError> for CliError {
    fn from(err: &StoreError) -> Self {
        Self {
            message: err.to_string(),
            suggestion: err.hint().map(str::to_string),
            error_code: Some(err.code().to_string()),
        }
    }
}

/// Render a serializable value to stdout in the requested format.
///
/// In JSON mode, the value is serialized with `serde_json`. In pretty/text mode,
/// the provided `human_fn` closure is called to produce text output.
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
        OutputMode::Pretty | OutputMode::Text => {
            human_fn(value, &mut out)?;
        }
    }
    Ok(())
}

/// Render an error to stderr in the requested format.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({
                "error": error,
            });
            serde_json::to_writer_pretty(&mut out, &wrapper)?;
            writeln!(out)?;
        }
        OutputMode::Pretty | OutputMode::Text => {
            writeln!(out, "error: {}", error.message)?;
            if let Some(ref suggestion) = error.suggestion {
                writeln!(out, "  suggestion: {suggestion}")?;
            }
        }
    }
    Ok(())
}

/// Write a one-line human confirmation.
pub fn write_success(w: &mut dyn Write, message: &str) -> io::Result<()> {
    writeln!(w, "✓ {message}")
}

/// Write a one-line human warning to stderr. JSON consumers get the
/// equivalent information in the command's payload instead.
pub fn render_warning(mode: OutputMode, message: &str) -> io::Result<()> {
    if mode.is_json() {
        return Ok(());
    }
    writeln!(io::stderr().lock(), "warning: {message}")
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── resolve_output_mode_inner ───────────────────────────────────────────

    #[test]
    fn resolve_format_flag_wins_over_everything() {
        let mode = resolve_output_mode_inner(
            Some(OutputMode::Text),
            true,
            Some("pretty"),
            Some("json"),
            true,
        );
        assert_eq!(mode, OutputMode::Text);
    }

    #[test]
    fn resolve_json_flag_wins_over_env() {
        let mode = resolve_output_mode_inner(None, true, Some("pretty"), None, true);
        assert_eq!(mode, OutputMode::Json);
    }

    #[test]
    fn resolve_env_wins_over_config() {
        let mode = resolve_output_mode_inner(None, false, Some("TEXT"), Some("json"), true);
        assert_eq!(mode, OutputMode::Text);
    }

    #[test]
    fn resolve_config_used_when_env_unknown() {
        let mode = resolve_output_mode_inner(None, false, Some("fancy"), Some("json"), true);
        assert_eq!(mode, OutputMode::Json);
    }

    #[test]
    fn resolve_config_accepts_legacy_aliases() {
        let mode = resolve_output_mode_inner(None, false, None, Some("human"), false);
        assert_eq!(mode, OutputMode::Pretty);
        let mode = resolve_output_mode_inner(None, false, None, Some("table"), true);
        assert_eq!(mode, OutputMode::Text);
    }

    #[test]
    fn resolve_defaults_follow_tty() {
        assert_eq!(
            resolve_output_mode_inner(None, false, None, None, true),
            OutputMode::Pretty
        );
        assert_eq!(
            resolve_output_mode_inner(None, false, None, None, false),
            OutputMode::Text
        );
    }

    // ── write_list ──────────────────────────────────────────────────────────

    struct SimpleItem {
        name: &'static str,
        count: u32,
    }

    impl Renderable for SimpleItem {
        fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
            writeln!(w, "{}: {}", self.name, self.count)
        }

        fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
            writeln!(w, "{{\"name\":\"{}\",\"count\":{}}}", self.name, self.count)
        }

        fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
            writeln!(w, "{}  {}", self.name, self.count)
        }

        fn table_headers() -> &'static [&'static str] {
            &["NAME", "COUNT"]
        }
    }

    fn written(items: &[SimpleItem], mode: OutputMode) -> String {
        let mut buf = Vec::new();
        write_list(&mut buf, items, mode).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn sample() -> Vec<SimpleItem> {
        vec![
            SimpleItem { name: "a", count: 1 },
            SimpleItem { name: "b", count: 2 },
        ]
    }

    #[test]
    fn text_list_has_header_then_rows() {
        assert_eq!(written(&sample(), OutputMode::Text), "NAME  COUNT\na  1\nb  2\n");
    }

    #[test]
    fn text_list_empty_has_no_header() {
        assert_eq!(written(&[], OutputMode::Text), "");
    }

    #[test]
    fn json_list_is_a_valid_array() {
        let value: serde_json::Value =
            serde_json::from_str(&written(&sample(), OutputMode::Json)).unwrap();
        let arr = value.as_array().unwrap();
        assert_eq!(arr.len(), 2);
        assert_eq!(arr[1]["name"], "b");
    }

    #[test]
    fn json_list_empty_is_empty_array() {
        let value: serde_json::Value =
            serde_json::from_str(&written(&[], OutputMode::Json)).unwrap();
        assert_eq!(value, serde_json::json!([]));
    }

    #[test]
    fn pretty_list_renders_each_item() {
        assert_eq!(written(&sample(), OutputMode::Pretty), "a: 1\nb: 2\n");
    }

    // ── CliError ────────────────────────────────────────────────────────────

    #[test]
    fn cli_error_simple() {
        let err = CliError::new("something went wrong");
        assert_eq!(err.message, "something went wrong");
        assert!(err.suggestion.is_none());
        assert!(err.error_code.is_none());
    }

    #[test]
    fn cli_error_from_store_error() {
        let err = StoreError::Lock(task_core::lock::LockError::Timeout {
            path: "tasks.json.lock".into(),
            waited: std::time::Duration::from_millis(20),
        });
        let cli_err = CliError::from(&err);
        assert!(cli_err.message.contains("tasks.json.lock"));
        assert!(cli_err.suggestion.is_some());
        assert_eq!(cli_err.error_code.as_deref(), Some("E5003"));
    }

    #[test]
    fn cli_error_from_anyhow_finds_store_error() {
        let err = anyhow::Error::from(StoreError::Lock(task_core::lock::LockError::Timeout {
            path: "x.lock".into(),
            waited: std::time::Duration::from_millis(1),
        }));
        assert_eq!(
            CliError::from_anyhow(&err).error_code.as_deref(),
            Some("E5003")
        );
    }

    #[test]
    fn cli_error_from_anyhow_uses_code_context() {
        use anyhow::Context;
        let err = Err::<(), _>(anyhow::anyhow!("Failed to parse config.toml"))
            .context(ErrorCode::ConfigParseError)
            .unwrap_err();
        let cli_err = CliError::from_anyhow(&err);
        assert_eq!(cli_err.error_code.as_deref(), Some("E1001"));
        assert_eq!(cli_err.message, "Failed to parse config.toml");
        assert!(cli_err.suggestion.is_some());
    }

    #[test]
    fn cli_error_from_plain_anyhow_keeps_chain() {
        use anyhow::Context;
        let err = Err::<(), _>(anyhow::anyhow!("inner"))
            .context("outer")
            .unwrap_err();
        let cli_err = CliError::from_anyhow(&err);
        assert_eq!(cli_err.message, "outer: inner");
        assert!(cli_err.error_code.is_none());
    }

    #[test]
    fn render_error_modes_do_not_fail() {
        let err = CliError::new("bad input");
        assert!(render_error(OutputMode::Json, &err).is_ok());
        assert!(render_error(OutputMode::Pretty, &err).is_ok());
        assert!(render_error(OutputMode::Text, &err).is_ok());
    }

    #[test]
    fn write_success_prefixes_check_mark() {
        let mut buf = Vec::new();
        write_success(&mut buf, "Task added").unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "✓ Task added\n");
    }
}
