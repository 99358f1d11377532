use clap::{Parser, Subcommand};

mod cmd;

use cmd::{
    approve::ApproveCommand, check::CheckCommand, copy::CopyCommand, delete::DeleteCommand,
    lines::LinesCommand, resolve::ResolveCommand, review::ReviewCommand, schema::SchemaCommand,
};

#[derive(Parser, Debug)]
#[command(
    name = "brfiscal",
    version,
    about = "Brazilian fiscal operation lines: CFOP selection and tax rule resolution"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve the CFOP and taxes of an operation line for a transaction
    Resolve(ResolveCommand),
    /// List operation lines
    Lines(LinesCommand),
    /// Send operation lines to review
    Review(ReviewCommand),
    /// Approve operation lines under review
    Approve(ApproveCommand),
    /// Duplicate an operation line as a new draft
    Copy(CopyCommand),
    /// Delete operation lines, or an operation with all its lines
    Delete(DeleteCommand),
    /// Report advisory warnings for every operation line
    Check(CheckCommand),
    /// Print the catalog input format
    Schema(SchemaCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Resolve(cmd) => cmd.exec(),
        Command::Lines(cmd) => cmd.exec(),
        Command::Review(cmd) => cmd.exec(),
        Command::Approve(cmd) => cmd.exec(),
        Command::Copy(cmd) => cmd.exec(),
        Command::Delete(cmd) => cmd.exec(),
        Command::Check(cmd) => cmd.exec(),
        Command::Schema(cmd) => cmd.exec(),
    }
}
