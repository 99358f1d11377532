//! Delete command - remove operation lines, or a whole operation with its lines

use crate::cmd::{read_catalog, select_lines, write_catalog};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct DeleteCommand {
    /// Catalog JSON file. Reads from stdin if not specified.
    #[arg(default_value = "-")]
    file: PathBuf,

    /// Operation name or id
    #[arg(short, long)]
    operation: String,

    /// Line name (repeat for several lines)
    #[arg(short, long = "line", required_unless_present = "all", conflicts_with = "all")]
    lines: Vec<String>,

    /// Delete the operation itself together with all of its lines
    #[arg(long)]
    all: bool,

    /// Write the updated catalog here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

impl DeleteCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let mut catalog = read_catalog(&self.file)?;

        let removed = if self.all {
            let operation = catalog
                .find_operation(&self.operation)
                .ok_or_else(|| anyhow::anyhow!("Unknown operation: {}", self.operation))?
                .id;
            catalog.delete_operation(operation)?
        } else {
            let ids: Vec<_> = select_lines(&catalog, &self.operation, &self.lines)?
                .iter()
                .map(|l| l.id)
                .collect();
            catalog.delete_lines(&ids)?
        };

        log::info!("{} line(s) deleted", removed.len());
        write_catalog(&catalog, self.output.as_deref())
    }
}
