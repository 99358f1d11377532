pub mod approve;
pub mod check;
pub mod copy;
pub mod delete;
pub mod lines;
pub mod resolve;
pub mod review;
pub mod schema;

use brfiscal::fiscal::{self, Catalog, LineId, OperationLine};
use clap::Args;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Read the catalog JSON from a file (or stdin with "-")
pub fn read_catalog(path: &Path) -> anyhow::Result<Catalog> {
    if path.as_os_str() == "-" {
        read_from_stdin()
    } else {
        let file = File::open(path)?;
        fiscal::read_catalog_json(BufReader::new(file))
    }
}

fn read_from_stdin() -> anyhow::Result<Catalog> {
    let stdin = io::stdin();
    let mut reader = BufReader::new(stdin.lock());

    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;

    if buffer.is_empty() {
        anyhow::bail!("No input received. Provide a catalog file or pipe it to stdin.");
    }

    fiscal::read_catalog_json(io::Cursor::new(buffer))
}

/// Write the catalog JSON to a file, or stdout when no path is given
pub fn write_catalog(catalog: &Catalog, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            fiscal::write_catalog_json(catalog, &mut writer)?;
            writer.flush()?;
            log::info!("Catalog written to {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            fiscal::write_catalog_json(catalog, &mut writer)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

/// Lines of one operation picked by name, shared by the lifecycle commands
#[derive(Args, Debug)]
pub struct LineSelection {
    /// Catalog JSON file. Reads from stdin if not specified.
    #[arg(default_value = "-")]
    pub file: PathBuf,

    /// Operation name or id
    #[arg(short, long)]
    pub operation: String,

    /// Line name (repeat for several lines)
    #[arg(short, long = "line", required = true)]
    pub lines: Vec<String>,

    /// Write the updated catalog here instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
}

impl LineSelection {
    /// Load the catalog and resolve the selected line ids
    pub fn load(&self) -> anyhow::Result<(Catalog, Vec<LineId>)> {
        let catalog = read_catalog(&self.file)?;
        let ids = select_lines(&catalog, &self.operation, &self.lines)?
            .iter()
            .map(|l| l.id)
            .collect();
        Ok((catalog, ids))
    }
}

pub fn select_lines<'a>(
    catalog: &'a Catalog,
    operation: &str,
    names: &[String],
) -> anyhow::Result<Vec<&'a OperationLine>> {
    let operation = catalog
        .find_operation(operation)
        .ok_or_else(|| anyhow::anyhow!("Unknown operation: {operation}"))?;
    Ok(catalog.select_lines(operation.id, names)?)
}
