//! CLI store observer and result presenter.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use rosetta_core::{LogEntry, Progress, ProviderOutcome, ProviderResult, ResultSet, Screen};
use rosetta_orchestration::interfaces::{ResultPresenter, StoreObserver};

use crate::output::{format_change_count, format_duration};
use crate::ui::{format_log_line, is_color_disabled, provider_color, provider_label};

const BAR_TEMPLATE: &str = "{bar:40.cyan/blue} {pos:>3}% {msg}";

/// Streams the event log to stderr under a progress bar.
pub struct CliStoreObserver {
    bar: ProgressBar,
    show_logs: bool,
    color: bool,
}

impl CliStoreObserver {
    #[must_use]
    pub fn new(show_logs: bool, show_bar: bool) -> Self {
        let bar = if show_bar {
            let bar = ProgressBar::new(100);
            if let Ok(style) = ProgressStyle::with_template(BAR_TEMPLATE) {
                bar.set_style(style.progress_chars("=> "));
            }
            bar
        } else {
            ProgressBar::hidden()
        };
        Self {
            bar,
            show_logs,
            color: !is_color_disabled(),
        }
    }

    fn print_line(&self, line: &str) {
        if self.bar.is_hidden() {
            eprintln!("{line}");
        } else {
            self.bar.println(line);
        }
    }
}

impl StoreObserver for CliStoreObserver {
    fn on_log(&self, entry: &LogEntry) {
        if self.show_logs {
            self.print_line(&format_log_line(entry, self.color));
        }
    }

    fn on_progress(&self, progress: &Progress) {
        self.bar.set_position(u64::from(progress.percent));
        self.bar.set_message(progress.current_step.clone());
    }

    fn on_screen(&self, screen: Screen) {
        match screen {
            Screen::Processing => self.bar.reset(),
            Screen::Results | Screen::Input => self.bar.finish_and_clear(),
        }
    }
}

/// Render the result set as a table with a summary line.
#[must_use]
pub fn render_results(results: &ResultSet, color: bool) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} provider(s): {} succeeded, {} failed, {}\n",
        results.len(),
        results.succeeded(),
        results.failed(),
        format_change_count(results.total_changes())
    ));
    for r in results.iter() {
        let label = provider_label(&r.provider, color);
        // Pad on the plain name; ANSI codes would skew the width.
        let pad = 12usize.saturating_sub(r.provider.display_name().chars().count());
        let status = match (&r.outcome, color) {
            (ProviderOutcome::Optimized { .. }, true) => style("OK").green().bold().to_string(),
            (ProviderOutcome::Failed { .. }, true) => style("FAILED").red().bold().to_string(),
            (ProviderOutcome::Optimized { .. }, false) => "OK".to_string(),
            (ProviderOutcome::Failed { .. }, false) => "FAILED".to_string(),
        };
        out.push_str(&format!(
            "  {label}{:pad$} {status:<6} {} ({})\n",
            "",
            r.outcome.synopsis(),
            format_duration(r.elapsed),
        ));
    }
    out
}

/// Render one provider's detail view.
#[must_use]
pub fn render_detail(original: &str, result: &ProviderResult, color: bool) -> String {
    let mut out = String::new();
    let label = provider_label(&result.provider, color);
    match &result.outcome {
        ProviderOutcome::Optimized { prompt, changes } => {
            out.push_str(&format!("{label} [{}]\n\n", format_change_count(changes.len())));
            out.push_str("Optimized Prompt\n");
            out.push_str(prompt);
            out.push_str("\n\n");
            if !changes.is_empty() {
                out.push_str(&format!("Changes Applied ({})\n", changes.len()));
                for change in changes {
                    let category = if color {
                        style(&change.category)
                            .fg(provider_color(&result.provider))
                            .to_string()
                    } else {
                        change.category.clone()
                    };
                    out.push_str(&format!("  [{category}] {}\n", change.description));
                    if let (Some(before), Some(after)) = (&change.before, &change.after) {
                        out.push_str(&format!("      - {before}\n      + {after}\n"));
                    }
                }
                out.push('\n');
            }
            out.push_str(&format!("Original ({} chars)\n", original.chars().count()));
            out.push_str(original);
            out.push('\n');
        }
        ProviderOutcome::Failed { error } => {
            out.push_str(&format!("{label}\n\n"));
            let marker = if color {
                style("x").red().bold().to_string()
            } else {
                "x".to_string()
            };
            out.push_str(&format!("{marker} {error}\n"));
        }
    }
    out
}

/// CLI result presenter.
pub struct CliResultPresenter {
    quiet: bool,
    color: bool,
}

impl CliResultPresenter {
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            color: !is_color_disabled(),
        }
    }
}

impl ResultPresenter for CliResultPresenter {
    fn present_results(&self, results: &ResultSet) {
        if self.quiet {
            for r in results.iter() {
                println!("{}: {}", r.provider, r.outcome.synopsis());
            }
            return;
        }
        crate::ui::print_header("Results");
        print!("{}", render_results(results, self.color));
    }

    fn present_detail(&self, original: &str, result: &ProviderResult) {
        if self.quiet {
            match &result.outcome {
                ProviderOutcome::Optimized { prompt, .. } => println!("{prompt}"),
                ProviderOutcome::Failed { error } => eprintln!("{error}"),
            }
            return;
        }
        println!();
        print!("{}", render_detail(original, result, self.color));
    }

    fn present_error(&self, error: &str) {
        crate::ui::print_error(error);
    }
}
