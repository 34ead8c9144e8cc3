use arion_core::{catalog::DATACENTERS, CreateOrderRequest, OrderMessage};
use clap::{arg, value_parser, Arg, ArgAction, Command};
use uuid::Uuid;

use crate::context::Context;
use crate::table::{or_dash, print_table};

pub fn args() -> Command {
    Command::new("order")
        .about("manage GPU workspace orders")
        .subcommand_required(true)
        .subcommand(
            Command::new("create")
                .about("provision a GPU workspace")
                .arg(arg!(<NAME> "order name"))
                .arg(
                    Arg::new("datacenter")
                        .short('d')
                        .long("datacenter")
                        .required(true)
                        .value_parser(DATACENTERS)
                        .help("datacenter to provision in"),
                )
                .arg(
                    Arg::new("storage")
                        .short('s')
                        .long("storage")
                        .default_value("100")
                        .value_parser(value_parser!(i32))
                        .help("network volume size in GB"),
                )
                .arg(
                    Arg::new("gpu")
                        .short('g')
                        .long("gpu")
                        .required(true)
                        .help("GPU tier, shorthand or provider id"),
                )
                .arg(
                    Arg::new("organization")
                        .long("organization")
                        .value_parser(value_parser!(Uuid))
                        .help("organization to bill the order to"),
                )
                .arg_required_else_help(true),
        )
        .subcommand(Command::new("list").about("list orders"))
        .subcommand(
            Command::new("get")
                .about("show an order")
                .arg(arg!(<ID> "order id").value_parser(value_parser!(Uuid)))
                .arg_required_else_help(true),
        )
        .subcommand(
            Command::new("stop")
                .about("stop the order's pod")
                .arg(arg!(<ID> "order id").value_parser(value_parser!(Uuid)))
                .arg_required_else_help(true),
        )
        .subcommand(
            Command::new("terminate")
                .about("terminate the order's pod")
                .arg(arg!(<ID> "order id").value_parser(value_parser!(Uuid)))
                .arg(
                    Arg::new("delete-workspace")
                        .long("delete-workspace")
                        .action(ArgAction::SetTrue)
                        .help("also delete the network volume"),
                )
                .arg_required_else_help(true),
        )
        .subcommand(
            Command::new("telemetry")
                .about("show live pod telemetry")
                .arg(arg!(<ID> "order id").value_parser(value_parser!(Uuid)))
                .arg_required_else_help(true),
        )
}

fn order_id(matches: &clap::ArgMatches) -> anyhow::Result<Uuid> {
    matches
        .get_one::<Uuid>("ID")
        .copied()
        .ok_or_else(|| anyhow::anyhow!("order id expected"))
}

fn order_details(order: &OrderMessage) -> Vec<Vec<String>> {
    vec![
        vec!["ID".to_string(), order.id.to_string()],
        vec!["NAME".to_string(), order.name.clone()],
        vec!["STATUS".to_string(), order.status.to_string()],
        vec!["DATACENTER".to_string(), order.datacenter_id.clone()],
        vec!["GPU".to_string(), order.gpu_type.clone()],
        vec!["STORAGE (GB)".to_string(), order.storage_gb.to_string()],
        vec!["POD".to_string(), or_dash(order.pod_id.as_ref())],
        vec!["VOLUME".to_string(), or_dash(order.volume_id.as_ref())],
        vec!["WORKSPACE".to_string(), or_dash(order.workspace_url.as_ref())],
        vec!["RUNTIME".to_string(), or_dash(order.runtime_status.as_ref())],
        vec!["FAILURE".to_string(), or_dash(order.failure_reason.as_ref())],
        vec!["CREATED".to_string(), order.created_at.to_rfc3339()],
    ]
}

pub async fn handlers(model_match: &clap::ArgMatches, context: &mut Context) -> anyhow::Result<()> {
    let client = context.client().await?;

    match model_match.subcommand() {
        Some(("create", create_match)) => {
            let request = CreateOrderRequest {
                name: create_match
                    .get_one::<String>("NAME")
                    .cloned()
                    .ok_or_else(|| anyhow::anyhow!("order name expected"))?,
                datacenter_id: create_match
                    .get_one::<String>("datacenter")
                    .cloned()
                    .ok_or_else(|| anyhow::anyhow!("datacenter expected"))?,
                storage_gb: create_match.get_one::<i32>("storage").copied().unwrap_or(100),
                gpu_type: create_match
                    .get_one::<String>("gpu")
                    .cloned()
                    .ok_or_else(|| anyhow::anyhow!("gpu expected"))?,
                organization_id: create_match.get_one::<Uuid>("organization").copied(),
            };

            tracing::info!("provisioning '{}', this can take a minute", request.name);

            let response = client.create_order(&request).await?;

            tracing::info!(
                "order '{}' running on pod {}, workspace at {}",
                response.order_id,
                response.pod_id,
                response.workspace_url
            );

            Ok(())
        }
        Some(("list", _)) => {
            let response = client.list_orders().await?;

            let table_data: Vec<Vec<String>> = response
                .orders
                .into_iter()
                .map(|order| {
                    vec![
                        order.id.to_string(),
                        order.name,
                        order.status.to_string(),
                        order.gpu_type,
                        order.datacenter_id,
                        or_dash(order.workspace_url),
                    ]
                })
                .collect();

            if table_data.is_empty() {
                tracing::info!("no orders found");

                return Ok(());
            }

            print_table(
                &["ID", "NAME", "STATUS", "GPU", "DATACENTER", "WORKSPACE"],
                table_data,
            );

            Ok(())
        }
        Some(("get", get_match)) => {
            let response = client.get_order(&order_id(get_match)?).await?;

            print_table(&["FIELD", "VALUE"], order_details(&response.order));

            Ok(())
        }
        Some(("stop", stop_match)) => {
            let id = order_id(stop_match)?;
            let response = client.stop_order(&id).await?;

            tracing::info!(
                "pod {} for order '{id}' is {}",
                response.pod_id,
                response.desired_status.as_deref().unwrap_or("stopping")
            );

            Ok(())
        }
        Some(("terminate", terminate_match)) => {
            let id = order_id(terminate_match)?;
            let delete_workspace = terminate_match.get_flag("delete-workspace");

            let response = client.terminate_order(&id, delete_workspace).await?;

            if delete_workspace && !response.volume_deleted {
                tracing::warn!("order '{id}' terminated but its volume could not be deleted");
            } else {
                tracing::info!("order '{id}' terminated");
            }

            Ok(())
        }
        Some(("telemetry", telemetry_match)) => {
            let response = client
                .order_telemetry(&order_id(telemetry_match)?)
                .await?;
            let telemetry = response.telemetry;

            print_table(
                &["STATUS", "UPTIME (S)", "GPU", "VOLUME (GB)"],
                vec![vec![
                    telemetry.runtime_status,
                    telemetry.uptime_seconds.to_string(),
                    or_dash(telemetry.gpu_type),
                    or_dash(telemetry.volume_size_gb),
                ]],
            );

            Ok(())
        }
        _ => unreachable!(), // subcommand_required
    }
}
