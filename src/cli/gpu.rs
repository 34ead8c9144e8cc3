use clap::Command;

use crate::context::Context;
use crate::table::{or_dash, print_table};

pub fn args() -> Command {
    Command::new("gpu")
        .about("GPU catalog")
        .subcommand_required(true)
        .subcommand(Command::new("list").about("list GPU types and their aliases"))
}

pub async fn handlers(model_match: &clap::ArgMatches, context: &mut Context) -> anyhow::Result<()> {
    let client = context.client().await?;

    match model_match.subcommand() {
        Some(("list", _)) => {
            let response = client.list_gpus().await?;

            let table_data: Vec<Vec<String>> = response
                .gpus
                .into_iter()
                .map(|gpu| {
                    vec![
                        gpu.id,
                        gpu.display_name,
                        or_dash(gpu.memory_in_gb),
                        gpu.aliases.join(", "),
                    ]
                })
                .collect();

            print_table(&["ID", "NAME", "MEMORY (GB)", "ALIASES"], table_data);

            Ok(())
        }
        _ => unreachable!(), // subcommand_required
    }
}
