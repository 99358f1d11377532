//! Review command - send operation lines to review

use crate::cmd::{write_catalog, LineSelection};
use clap::Args;

#[derive(Args, Debug)]
pub struct ReviewCommand {
    #[command(flatten)]
    selection: LineSelection,
}

impl ReviewCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let (mut catalog, ids) = self.selection.load()?;
        let events = catalog.review(&ids)?;
        log::info!("{} line(s) sent to review", events.len());
        write_catalog(&catalog, self.selection.output.as_deref())
    }
}
