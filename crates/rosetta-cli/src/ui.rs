//! UI helpers for terminal display.

use console::{style, Color};

use rosetta_core::{LogEntry, LogKind, ProviderId};

/// Check if color output is disabled via `NO_COLOR` env var.
#[must_use]
pub fn is_color_disabled() -> bool {
    std::env::var("NO_COLOR").is_ok()
}

/// Print a styled header.
pub fn print_header(text: &str) {
    if is_color_disabled() {
        println!("=== {text} ===");
    } else {
        println!("{}", style(format!("=== {text} ===")).bold().cyan());
    }
}

/// Print a success message.
pub fn print_success(text: &str) {
    if is_color_disabled() {
        println!("[OK] {text}");
    } else {
        println!("{} {text}", style("[OK]").green().bold());
    }
}

/// Print a warning to stderr.
pub fn print_warning(text: &str) {
    if is_color_disabled() {
        eprintln!("[WARN] {text}");
    } else {
        eprintln!("{} {text}", style("[WARN]").yellow().bold());
    }
}

/// Print an error message.
pub fn print_error(text: &str) {
    if is_color_disabled() {
        eprintln!("[ERROR] {text}");
    } else {
        eprintln!("{} {text}", style("[ERROR]").red().bold());
    }
}

/// Accent color of a provider's card.
#[must_use]
pub fn provider_color(provider: &ProviderId) -> Color {
    match provider.as_str() {
        "openai" => Color::Green,
        "anthropic" => Color::Color256(180),
        "google" => Color::Blue,
        "kimi" => Color::Red,
        _ => Color::Cyan,
    }
}

/// Prefix color of a log kind.
#[must_use]
pub fn kind_color(kind: LogKind) -> Color {
    match kind {
        LogKind::System | LogKind::Thinking => Color::Color256(245),
        LogKind::Agent | LogKind::Result => Color::White,
        LogKind::Spawn | LogKind::Success => Color::Green,
        LogKind::Tool | LogKind::Error => Color::Red,
    }
}

/// Provider display name, in the provider's color when `color` is set.
#[must_use]
pub fn provider_label(provider: &ProviderId, color: bool) -> String {
    let name = provider.display_name();
    if color {
        style(name).fg(provider_color(provider)).bold().to_string()
    } else {
        name
    }
}

/// One log row: `HH:MM:SS KIND     message`.
#[must_use]
pub fn format_log_line(entry: &LogEntry, color: bool) -> String {
    let prefix = format!("{:<8}", entry.kind.as_str().to_uppercase());
    let prefix = if color {
        style(prefix).fg(kind_color(entry.kind)).bold().to_string()
    } else {
        prefix
    };
    format!("{} {prefix} {}", entry.clock(), entry.message)
}
