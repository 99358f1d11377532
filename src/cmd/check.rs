//! Check command - advisory warnings for every operation line

use crate::cmd::read_catalog;
use brfiscal::fiscal::{Catalog, Warning};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct CheckCommand {
    /// Catalog JSON file. Reads from stdin if not specified.
    #[arg(default_value = "-")]
    file: PathBuf,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

/// A warning for output
#[derive(Debug, Clone, Serialize)]
struct CheckIssue {
    operation: String,
    line: String,
    title: &'static str,
    message: &'static str,
    warning: Warning,
}

/// JSON output structure
#[derive(Debug, Serialize)]
struct CheckOutput {
    line_count: usize,
    issue_count: usize,
    issues: Vec<CheckIssue>,
}

impl CheckCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let catalog = read_catalog(&self.file)?;
        let issues = collect_issues(&catalog)?;

        for issue in &issues {
            log::warn!("{} / {}: {}", issue.operation, issue.line, issue.message);
        }

        if self.json {
            let output = CheckOutput {
                line_count: catalog.lines().count(),
                issue_count: issues.len(),
                issues: issues.clone(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            print_text(&issues);
        }

        // Exit with code 1 if issues found
        if !issues.is_empty() {
            std::process::exit(1);
        }
        Ok(())
    }
}

fn collect_issues(catalog: &Catalog) -> anyhow::Result<Vec<CheckIssue>> {
    let mut issues = Vec::new();
    for line in catalog.lines() {
        if let Some(warning) = catalog.on_change_operation(line.id)? {
            let operation = catalog
                .operation(line.operation_id)
                .map_or_else(|| line.operation_id.to_string(), |o| o.name.clone());
            issues.push(CheckIssue {
                operation,
                line: line.name.clone(),
                title: warning.title(),
                message: warning.message(),
                warning,
            });
        }
    }
    Ok(issues)
}

fn print_text(issues: &[CheckIssue]) {
    println!();
    println!("CHECK RESULTS");
    println!();

    if issues.is_empty() {
        println!("\u{2713} No issues found.");
        return;
    }

    println!("\u{26A0} {} issue(s) found:", issues.len());
    println!();
    for (i, issue) in issues.iter().enumerate() {
        println!("  {}. [{}] {} / {}", i + 1, issue.title, issue.operation, issue.line);
        println!("     {}", issue.message);
        println!();
    }
}
