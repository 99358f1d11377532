//! Copy command - duplicate an operation line as a new draft

use crate::cmd::{read_catalog, select_lines, write_catalog};
use brfiscal::fiscal::ensure_one;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct CopyCommand {
    /// Catalog JSON file. Reads from stdin if not specified.
    #[arg(default_value = "-")]
    file: PathBuf,

    /// Operation name or id
    #[arg(short, long)]
    operation: String,

    /// Line to copy
    #[arg(short, long)]
    line: String,

    /// Name of the new line
    #[arg(short, long)]
    name: String,

    /// Write the updated catalog here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

impl CopyCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let mut catalog = read_catalog(&self.file)?;
        let source = {
            let selected = select_lines(&catalog, &self.operation, &[self.line.clone()])?;
            ensure_one(&selected)?.id
        };
        let id = catalog.copy_line(source, &self.name)?;
        log::info!("Copied line {} to '{}' (id {})", source, self.name, id);
        write_catalog(&catalog, self.output.as_deref())
    }
}
