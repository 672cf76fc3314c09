//! Rendering of cycle summaries

use anyhow::Result;
use colored::Colorize;
use harvester_core::CycleSummary;

/// Output format for cycle summaries
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Render one cycle summary in the requested format
pub fn render_summary(summary: &CycleSummary, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(summary)?),
        OutputFormat::Text => Ok(render_text(summary)),
    }
}

fn render_text(summary: &CycleSummary) -> String {
    let mut lines = vec![format!(
        "{} listed, {} delivered, {} failed",
        summary.listed,
        summary.delivered.len().to_string().green(),
        if summary.failed.is_empty() {
            "0".normal()
        } else {
            summary.failed.len().to_string().red()
        }
    )];

    for name in &summary.delivered {
        lines.push(format!("  {} {name}", "✓".green()));
    }
    for failure in &summary.failed {
        let marker = if failure.cleanup {
            "!".yellow()
        } else {
            "✗".red()
        };
        lines.push(format!("  {marker} {}: {}", failure.name, failure.error));
    }
    if summary.interrupted {
        lines.push("Stopped before every item was processed".yellow().to_string());
    }

    lines.join("\n")
}
