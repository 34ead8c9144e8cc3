use arion_core::{InviteRequest, ProfileMessage, Role, UpdateProfileRequest};
use clap::{arg, builder::PossibleValuesParser, value_parser, Arg, Command};
use uuid::Uuid;

use crate::context::Context;
use crate::table::{or_dash, print_table};

const ROLES: [&str; 3] = ["arion_admin", "org_admin", "workspace_user"];

fn role_arg() -> Arg {
    Arg::new("role")
        .long("role")
        .value_parser(PossibleValuesParser::new(ROLES))
        .help("account role")
}

fn contact_args(command: Command) -> Command {
    command
        .arg(Arg::new("first-name").long("first-name").help("first name"))
        .arg(Arg::new("last-name").long("last-name").help("last name"))
        .arg(Arg::new("job-title").long("job-title").help("job title"))
        .arg(Arg::new("phone").long("phone").help("phone number"))
}

pub fn args() -> Command {
    Command::new("user")
        .about("manage user accounts")
        .subcommand_required(true)
        .subcommand(Command::new("list").about("list users"))
        .subcommand(Command::new("me").about("show your own profile"))
        .subcommand(
            contact_args(
                Command::new("invite")
                    .about("invite a user")
                    .arg(arg!(<EMAIL> "email of the invitee"))
                    .arg(role_arg().default_value("workspace_user"))
                    .arg(
                        Arg::new("organization")
                            .long("organization")
                            .value_parser(value_parser!(Uuid))
                            .help("existing organization to add the user to"),
                    )
                    .arg(
                        Arg::new("organization-name")
                            .long("organization-name")
                            .conflicts_with("organization")
                            .help("create a new organization for the user"),
                    )
                    .arg(
                        Arg::new("password")
                            .long("password")
                            .help("create the account directly instead of emailing an invite"),
                    ),
            )
            .arg_required_else_help(true),
        )
        .subcommand(
            contact_args(
                Command::new("update")
                    .about("update a user")
                    .arg(arg!(<ID> "user id").value_parser(value_parser!(Uuid)))
                    .arg(role_arg())
                    .arg(
                        Arg::new("authorized")
                            .long("authorized")
                            .value_parser(value_parser!(bool))
                            .help("approve or revoke the account"),
                    ),
            )
            .arg_required_else_help(true),
        )
        .subcommand(
            Command::new("delete")
                .about("delete a user")
                .arg(arg!(<ID> "user id").value_parser(value_parser!(Uuid)))
                .arg_required_else_help(true),
        )
}

fn parse_role(matches: &clap::ArgMatches) -> anyhow::Result<Option<Role>> {
    match matches.get_one::<String>("role") {
        Some(role) => Ok(Some(Role::try_from(role.clone())?)),
        None => Ok(None),
    }
}

fn user_row(user: ProfileMessage) -> Vec<String> {
    let name = match (user.first_name, user.last_name) {
        (Some(first), Some(last)) => format!("{first} {last}"),
        (Some(first), None) => first,
        (None, Some(last)) => last,
        (None, None) => "-".to_string(),
    };

    vec![
        user.id.to_string(),
        or_dash(user.email),
        name,
        user.role.to_string(),
        user.authorized.to_string(),
        user.organization_ids.len().to_string(),
    ]
}

const USER_HEADERS: [&str; 6] = ["ID", "EMAIL", "NAME", "ROLE", "AUTHORIZED", "ORGS"];

pub async fn handlers(model_match: &clap::ArgMatches, context: &mut Context) -> anyhow::Result<()> {
    let client = context.client().await?;

    match model_match.subcommand() {
        Some(("list", _)) => {
            let response = client.list_users().await?;

            let table_data: Vec<Vec<String>> = response.users.into_iter().map(user_row).collect();

            if table_data.is_empty() {
                tracing::info!("no users found");

                return Ok(());
            }

            print_table(&USER_HEADERS, table_data);

            Ok(())
        }
        Some(("me", _)) => {
            let response = client.get_profile().await?;

            print_table(&USER_HEADERS, vec![user_row(response.user)]);

            Ok(())
        }
        Some(("invite", invite_match)) => {
            let email = invite_match
                .get_one::<String>("EMAIL")
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("email expected"))?;

            let request = InviteRequest {
                email: email.clone(),
                first_name: invite_match.get_one::<String>("first-name").cloned(),
                last_name: invite_match.get_one::<String>("last-name").cloned(),
                job_title: invite_match.get_one::<String>("job-title").cloned(),
                phone: invite_match.get_one::<String>("phone").cloned(),
                role: parse_role(invite_match)?,
                organization_id: invite_match.get_one::<Uuid>("organization").copied(),
                organization_name: invite_match
                    .get_one::<String>("organization-name")
                    .cloned(),
                password: invite_match.get_one::<String>("password").cloned(),
            };

            let response = client.invite_user(&request).await?;

            tracing::info!(
                "invited '{email}' as user {} in organization {}",
                response.user_id,
                response.organization_id
            );

            Ok(())
        }
        Some(("update", update_match)) => {
            let id = update_match
                .get_one::<Uuid>("ID")
                .copied()
                .ok_or_else(|| anyhow::anyhow!("user id expected"))?;

            let request = UpdateProfileRequest {
                first_name: update_match.get_one::<String>("first-name").cloned(),
                last_name: update_match.get_one::<String>("last-name").cloned(),
                job_title: update_match.get_one::<String>("job-title").cloned(),
                phone: update_match.get_one::<String>("phone").cloned(),
                authorized: update_match.get_one::<bool>("authorized").copied(),
                role: parse_role(update_match)?,
            };

            let response = client.update_user(&id, &request).await?;

            print_table(&USER_HEADERS, vec![user_row(response.user)]);

            Ok(())
        }
        Some(("delete", delete_match)) => {
            let id = delete_match
                .get_one::<Uuid>("ID")
                .copied()
                .ok_or_else(|| anyhow::anyhow!("user id expected"))?;

            client.delete_user(&id).await?;

            tracing::info!("user '{id}' deleted");

            Ok(())
        }
        _ => unreachable!(), // subcommand_required
    }
}
