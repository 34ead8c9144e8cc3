use clap::{arg, Command};

use crate::context::Context;
use crate::table::{or_dash, print_table};

pub fn args() -> Command {
    Command::new("org")
        .about("manage organizations")
        .subcommand_required(true)
        .subcommand(Command::new("list").about("list organizations"))
        .subcommand(
            Command::new("create")
                .about("create organization")
                .arg(arg!(<NAME> "organization name"))
                .arg_required_else_help(true),
        )
        .subcommand(Command::new("roles").about("list account roles"))
}

pub async fn handlers(model_match: &clap::ArgMatches, context: &mut Context) -> anyhow::Result<()> {
    let client = context.client().await?;

    match model_match.subcommand() {
        Some(("list", _)) => {
            let response = client.list_organizations().await?;

            let table_data: Vec<Vec<String>> = response
                .organizations
                .into_iter()
                .map(|organization| {
                    vec![
                        organization.id.to_string(),
                        organization.name,
                        organization.created_at.to_rfc3339(),
                    ]
                })
                .collect();

            if table_data.is_empty() {
                tracing::info!("no organizations found");

                return Ok(());
            }

            print_table(&["ID", "NAME", "CREATED"], table_data);

            Ok(())
        }
        Some(("create", create_match)) => {
            let name = create_match
                .get_one::<String>("NAME")
                .ok_or_else(|| anyhow::anyhow!("organization name expected"))?;

            let response = client.create_organization(name).await?;

            tracing::info!(
                "organization '{}' created with id {}",
                response.organization.name,
                response.organization.id
            );

            Ok(())
        }
        Some(("roles", _)) => {
            let response = client.list_roles().await?;

            let table_data: Vec<Vec<String>> = response
                .roles
                .into_iter()
                .map(|role| vec![role.name, or_dash(role.description)])
                .collect();

            print_table(&["ROLE", "DESCRIPTION"], table_data);

            Ok(())
        }
        _ => unreachable!(), // subcommand_required
    }
}
