use clap::ValueEnum;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use owo_colors::OwoColorize;
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    #[value(name = "json-pretty")]
    JsonPretty,
}

#[derive(Debug, Clone, Copy)]
enum Notice {
    Success,
    Info,
    Warning,
    Error,
}

impl Notice {
    fn as_str(self) -> &'static str {
        match self {
            Notice::Success => "success",
            Notice::Info => "info",
            Notice::Warning => "warning",
            Notice::Error => "error",
        }
    }
}

/// Terminal writer for command results. `quiet` silences notices and
/// decoration but never data or errors.
pub struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    pub fn is_human(&self) -> bool {
        self.format == OutputFormat::Human
    }

    pub fn success(&self, msg: impl AsRef<str>) {
        self.notice(Notice::Success, msg.as_ref());
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        self.notice(Notice::Info, msg.as_ref());
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        self.notice(Notice::Warning, msg.as_ref());
    }

    pub fn error(&self, msg: impl AsRef<str>) {
        self.notice(Notice::Error, msg.as_ref());
    }

    fn notice(&self, kind: Notice, msg: &str) {
        if self.quiet && !matches!(kind, Notice::Error) {
            return;
        }
        if !self.is_human() {
            self.print_json(&json!({ "type": kind.as_str(), "message": msg }));
            return;
        }
        match kind {
            Notice::Success => println!("{} {}", "✓".green(), msg),
            Notice::Info => println!("{}", msg),
            Notice::Warning => println!("{} {}", "⚠".yellow(), msg),
            Notice::Error => eprintln!("{} {}", "✗".red(), msg),
        }
    }

    /// Human-only line; JSON modes skip decorative text entirely.
    pub fn println(&self, msg: impl AsRef<str>) {
        if self.quiet || !self.is_human() {
            return;
        }
        println!("{}", msg.as_ref());
    }

    /// Print a table with the shared rounded style. Human mode only.
    pub fn table(&self, mut table: Table) {
        if !self.is_human() {
            return;
        }
        table.load_preset(UTF8_FULL);
        table.apply_modifier(UTF8_ROUND_CORNERS);
        println!("{}", table);
    }

    pub fn json(&self, data: &serde_json::Value) {
        self.print_json(data);
    }

    fn print_json(&self, data: &serde_json::Value) {
        let rendered = match self.format {
            OutputFormat::JsonPretty => serde_json::to_string_pretty(data),
            OutputFormat::Json | OutputFormat::Human => serde_json::to_string(data),
        };
        println!("{}", rendered.unwrap_or_default());
    }
}
