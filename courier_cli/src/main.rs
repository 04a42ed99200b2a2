use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;

use crate::{batch::BatchArgs, optimize::OptimizeArgs, schema::SchemaArgs};

mod batch;
mod file_utils;
mod optimize;
mod parsers;
mod schema;
mod table;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Optimize the routes of a single request
    #[command(visible_alias = "o")]
    Optimize {
        #[command(flatten)]
        args: OptimizeArgs,
    },
    /// Optimize several scenarios and pick the best one
    Batch {
        #[command(flatten)]
        args: BatchArgs,
    },
    /// Print the JSON schema of the request format
    Schema {
        #[command(flatten)]
        args: SchemaArgs,
    },
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Optimize { args }) => optimize::run(args)?,
        Some(Commands::Batch { args }) => batch::run(args)?,
        Some(Commands::Schema { args }) => schema::run(args)?,
        None => {}
    }

    Ok(())
}
