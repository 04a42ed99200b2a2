use clap::Args;
use courier_optimizer::json::schema::{generate_batch_json_schema, generate_json_schema};

#[derive(Args)]
pub struct SchemaArgs {
    /// Print the batch request schema instead
    #[arg(long)]
    batch: bool,
}

pub fn run(args: SchemaArgs) -> anyhow::Result<()> {
    let schema = if args.batch {
        generate_batch_json_schema()?
    } else {
        generate_json_schema()?
    };
    println!("{schema}");

    Ok(())
}
