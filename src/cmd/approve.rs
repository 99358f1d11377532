//! Approve command - approve operation lines under review

use crate::cmd::{write_catalog, LineSelection};
use clap::Args;

#[derive(Args, Debug)]
pub struct ApproveCommand {
    #[command(flatten)]
    selection: LineSelection,
}

impl ApproveCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let (mut catalog, ids) = self.selection.load()?;
        let events = catalog.approve(&ids)?;
        log::info!("{} line(s) approved", events.len());
        write_catalog(&catalog, self.selection.output.as_deref())
    }
}
