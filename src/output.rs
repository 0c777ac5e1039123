//! Output formatting for human and JSON modes
//!
//! The run report can be rendered either as human-readable text or as
//! machine-parseable JSON.

use colored::Colorize;

use crate::core::services::{RepoOutcome, RunReport};

/// Output mode for the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output (machine-readable)
    Json,
}

impl RunReport {
    /// Render the report based on output mode
    pub fn render(&self, mode: OutputMode) -> serde_json::Result<()> {
        match mode {
            OutputMode::Human => print!("{}", self.to_human()),
            OutputMode::Json => println!("{}", self.to_json()?),
        }
        Ok(())
    }

    /// Human-readable summary
    #[must_use]
    pub fn to_human(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("\nSummary for {}:\n", self.organization.bold()));

        for repo in &self.repositories {
            let line = match &repo.outcome {
                RepoOutcome::Skipped { reason } => {
                    format!("  {} {}: {reason}", "skip".dimmed(), repo.repository)
                },
                RepoOutcome::Unchanged { anomalies: 0 } => {
                    format!("  {} {}: no deprecated images", "ok".green(), repo.repository)
                },
                RepoOutcome::Unchanged { anomalies } => format!(
                    "  {} {}: no deprecated images ({anomalies} job(s) without an image)",
                    "ok".yellow(),
                    repo.repository
                ),
                RepoOutcome::Saved { changes, audit_file } => format!(
                    "  {} {}: {} change(s) saved to {}",
                    "dry".cyan(),
                    repo.repository,
                    changes.len(),
                    audit_file.display()
                ),
                RepoOutcome::Published { changes, pr_url, .. } => format!(
                    "  {} {}: {} change(s), pull request {pr_url}",
                    "pr".green().bold(),
                    repo.repository,
                    changes.len()
                ),
                RepoOutcome::Aborted { stage, error, audit_file, .. } => format!(
                    "  {} {}: aborted while {stage}: {error} (patched copy: {})",
                    "fail".red().bold(),
                    repo.repository,
                    audit_file.display()
                ),
                RepoOutcome::Failed { error } => {
                    format!("  {} {}: {error}", "fail".red().bold(), repo.repository)
                },
            };
            out.push_str(&line);
            out.push('\n');
        }

        out.push_str(&format!(
            "\n{} repositories: {} pull request(s) opened, {} failed, {} untouched\n",
            self.repositories.len(),
            self.published(),
            self.failed(),
            self.untouched()
        ));
        out
    }

    /// Pretty-printed JSON document
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
