use arion_core::api::client::ArionClient;
use arion_core::session::{AuthEvent, Effect, SessionInput, SessionTimeoutController, UserAction};
use arion_core::OrderStatus;
use chrono::{DateTime, Utc};
use clap::Command;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::context::Context;
use crate::login::sign_out;
use crate::profile::Profile;
use crate::table::{or_dash, print_table};

const TELEMETRY_INTERVAL: Duration = Duration::from_secs(15);
const REACHABILITY_INTERVAL: Duration = Duration::from_secs(10);
const RENDER_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DashboardRow {
    pub name: String,
    pub status: Option<OrderStatus>,
    pub workspace_url: Option<String>,
    pub runtime_status: Option<String>,
    pub uptime_seconds: Option<i64>,
    pub gpu_type: Option<String>,
    pub reachable: Option<bool>,
    pub updated_at: Option<DateTime<Utc>>,
}

pub type DashboardRows = Arc<Mutex<HashMap<Uuid, DashboardRow>>>;

/// The API client shared by the pollers. Replaced in place when the session is refreshed.
type SharedClient = Arc<RwLock<ArionClient>>;

pub fn args() -> Command {
    Command::new("dashboard")
        .about("live view of your orders; type 'stay' or 'logout' when the idle warning shows")
}

fn lock_rows(rows: &DashboardRows) -> std::sync::MutexGuard<'_, HashMap<Uuid, DashboardRow>> {
    rows.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// One telemetry pass: refreshes the order list and the live status of every non-deleted order.
pub async fn refresh_telemetry(client: &ArionClient, rows: &DashboardRows) -> anyhow::Result<()> {
    let orders = client.list_orders().await?.orders;

    {
        let mut rows = lock_rows(rows);
        rows.retain(|id, _| orders.iter().any(|order| order.id == *id));

        for order in &orders {
            let row = rows.entry(order.id).or_default();
            row.name = order.name.clone();
            row.status = Some(order.status);
            row.workspace_url = order.workspace_url.clone();
            if row.gpu_type.is_none() {
                row.gpu_type = Some(order.gpu_type.clone());
            }
        }
    }

    for order in orders {
        if order.status == OrderStatus::Deleted || order.pod_id.is_none() {
            continue;
        }

        match client.order_telemetry(&order.id).await {
            Ok(response) => {
                let telemetry = response.telemetry;
                let mut rows = lock_rows(rows);
                if let Some(row) = rows.get_mut(&order.id) {
                    row.runtime_status = Some(telemetry.runtime_status);
                    row.uptime_seconds = Some(telemetry.uptime_seconds);
                    if telemetry.gpu_type.is_some() {
                        row.gpu_type = telemetry.gpu_type;
                    }
                    row.updated_at = Some(Utc::now());
                }
            }
            Err(err) => tracing::debug!(order_id = %order.id, "telemetry failed: {}", err),
        }
    }

    Ok(())
}

/// One reachability pass over every row that has a workspace url.
pub async fn refresh_reachability(client: &ArionClient, rows: &DashboardRows) {
    let targets: Vec<(Uuid, String)> = lock_rows(rows)
        .iter()
        .filter(|(_, row)| row.status != Some(OrderStatus::Deleted))
        .filter_map(|(id, row)| row.workspace_url.clone().map(|url| (*id, url)))
        .collect();

    for (order_id, workspace_url) in targets {
        let reachable = match client.check_workspace(&workspace_url).await {
            Ok(response) => response.reachable,
            Err(err) => {
                tracing::debug!(order_id = %order_id, "reachability check failed: {}", err);
                false
            }
        };

        if let Some(row) = lock_rows(rows).get_mut(&order_id) {
            row.reachable = Some(reachable);
            row.updated_at = Some(Utc::now());
        }
    }
}

fn render(rows: &DashboardRows) {
    let mut table_data: Vec<(String, Vec<String>)> = lock_rows(rows)
        .iter()
        .map(|(id, row)| {
            (
                row.name.clone(),
                vec![
                    id.to_string(),
                    row.name.clone(),
                    or_dash(row.status),
                    or_dash(row.runtime_status.as_ref()),
                    or_dash(row.uptime_seconds),
                    or_dash(row.gpu_type.as_ref()),
                    match row.reachable {
                        Some(true) => "yes".to_string(),
                        Some(false) => "no".to_string(),
                        None => "-".to_string(),
                    },
                ],
            )
        })
        .collect();

    if table_data.is_empty() {
        println!("no orders yet");
        return;
    }

    table_data.sort_by(|a, b| a.0.cmp(&b.0));

    print_table(
        &["ID", "NAME", "STATUS", "RUNTIME", "UPTIME (S)", "GPU", "REACHABLE"],
        table_data.into_iter().map(|(_, row)| row).collect(),
    );
}

fn spawn_telemetry_poller(client: SharedClient, rows: DashboardRows) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TELEMETRY_INTERVAL);
        loop {
            interval.tick().await;
            let client = client.read().await.clone();
            if let Err(err) = refresh_telemetry(&client, &rows).await {
                tracing::warn!("order refresh failed: {}", err);
            }
        }
    })
}

fn spawn_reachability_poller(client: SharedClient, rows: DashboardRows) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(REACHABILITY_INTERVAL);
        loop {
            interval.tick().await;
            let client = client.read().await.clone();
            refresh_reachability(&client, &rows).await;
        }
    })
}

fn spawn_stdin_reader(inputs: mpsc::Sender<SessionInput>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        while let Ok(Some(line)) = lines.next_line().await {
            let action = match line.trim().to_lowercase().as_str() {
                "stay" => UserAction::Stay,
                "logout" => UserAction::LogoutNow,
                "" => continue,
                other => {
                    eprintln!("unknown input '{other}', type 'stay' or 'logout'");
                    continue;
                }
            };

            if inputs.send(SessionInput::User(action)).await.is_err() {
                return;
            }
        }
    })
}

/// Refreshes the access token shortly before it expires and reports each refresh to the idle timer.
fn spawn_session_refresher(
    context: &Context,
    client: SharedClient,
    inputs: mpsc::Sender<SessionInput>,
) -> anyhow::Result<JoinHandle<()>> {
    let auth = context.auth_client()?;
    let mut profile: Profile = context.profile.clone();

    Ok(tokio::spawn(async move {
        loop {
            let wait = match profile.refresh_due_in(Utc::now()) {
                Some(wait) => wait,
                None => return,
            };
            tokio::time::sleep(wait).await;

            let refresh_token = match &profile.refresh_token {
                Some(refresh_token) => refresh_token.clone(),
                None => return,
            };

            let session = match auth.refresh_session(&refresh_token).await {
                Ok(session) => session,
                Err(err) => {
                    tracing::error!("session refresh failed: {}", err);
                    return;
                }
            };

            profile.store_session(&session, Utc::now());
            if let Err(err) = profile.save() {
                tracing::warn!("failed to persist refreshed session: {}", err);
            }
            client
                .write()
                .await
                .set_token(Some(session.access_token.clone()));

            if inputs
                .send(SessionInput::Auth(AuthEvent::TokenRefreshed))
                .await
                .is_err()
            {
                return;
            }
        }
    }))
}

pub async fn handlers(_model_match: &clap::ArgMatches, context: &mut Context) -> anyhow::Result<()> {
    let client: SharedClient = Arc::new(RwLock::new(context.client().await?));
    let rows: DashboardRows = Arc::default();

    let (input_sender, input_receiver) = mpsc::channel(16);
    let (effect_sender, mut effect_receiver) = mpsc::unbounded_channel();

    let controller = tokio::spawn(SessionTimeoutController::default().run(input_receiver, effect_sender));
    input_sender
        .send(SessionInput::Auth(AuthEvent::SignedIn))
        .await?;

    let mut tasks = vec![
        spawn_telemetry_poller(Arc::clone(&client), Arc::clone(&rows)),
        spawn_reachability_poller(Arc::clone(&client), Arc::clone(&rows)),
        spawn_stdin_reader(input_sender.clone()),
    ];
    match spawn_session_refresher(context, Arc::clone(&client), input_sender.clone()) {
        Ok(task) => tasks.push(task),
        Err(err) => tracing::warn!("session will not be refreshed: {}", err),
    }

    let mut render_interval = tokio::time::interval(RENDER_INTERVAL);

    loop {
        tokio::select! {
            effect = effect_receiver.recv() => match effect {
                Some(Effect::ShowWarning { seconds_left }) => {
                    println!("you have been idle, signing out in {seconds_left}s. Type 'stay' to keep working or 'logout' to leave now.");
                }
                Some(Effect::Countdown { seconds_left }) => {
                    println!("signing out in {seconds_left}s");
                }
                Some(Effect::HideWarning) => {
                    println!("session continued");
                }
                Some(Effect::SignOut) => {
                    println!("signed out after inactivity");
                    sign_out(context).await?;
                    // the controller resets only on the backend's confirmation
                    let _ = input_sender.send(SessionInput::Auth(AuthEvent::SignedOut)).await;
                    break;
                }
                None => break,
            },
            _ = render_interval.tick() => render(&rows),
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    for task in tasks {
        task.abort();
    }
    drop(input_sender);
    controller.abort();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn order_json(id: Uuid, status: &str, pod_id: Option<&str>) -> serde_json::Value {
        json!({
            "id": id,
            "user_id": Uuid::new_v4(),
            "organization_id": Uuid::new_v4(),
            "name": format!("order-{status}"),
            "datacenter_id": "EU-RO-1",
            "storage_gb": 100,
            "gpu_type": "NVIDIA A40",
            "status": status,
            "pod_id": pod_id,
            "volume_id": "vol-1",
            "workspace_url": pod_id.map(|pod_id| format!("https://{pod_id}-8888.proxy.runpod.net")),
            "runtime_status": null,
            "uptime_seconds": null,
            "failure_reason": null,
            "created_at": "2024-03-01T00:00:00Z",
            "updated_at": "2024-03-01T00:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_pollers_fill_shared_rows() {
        let mock_server = MockServer::start().await;
        let running = Uuid::new_v4();
        let deleted = Uuid::new_v4();

        Mock::given(method("GET"))
            .and(path("/api/orders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "orders": [
                    order_json(running, "running", Some("pod-7")),
                    order_json(deleted, "deleted", None)
                ]
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path(format!("/api/orders/{running}/telemetry")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "runtime_status": "RUNNING",
                "uptime_seconds": 120,
                "gpu_type": "A40",
                "volume_size_gb": 100
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/check-workspace"))
            .and(query_param("url", "https://pod-7-8888.proxy.runpod.net"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "reachable": true,
                "status": 200
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = ArionClient::new(&mock_server.uri(), Some("token".to_owned())).unwrap();
        let rows: DashboardRows = Arc::default();

        refresh_telemetry(&client, &rows).await.unwrap();
        refresh_reachability(&client, &rows).await;

        let rows = lock_rows(&rows);
        assert_eq!(rows.len(), 2);

        let row = &rows[&running];
        assert_eq!(row.runtime_status.as_deref(), Some("RUNNING"));
        assert_eq!(row.uptime_seconds, Some(120));
        assert_eq!(row.gpu_type.as_deref(), Some("A40"));
        assert_eq!(row.reachable, Some(true));

        let row = &rows[&deleted];
        assert_eq!(row.status, Some(OrderStatus::Deleted));
        assert!(row.runtime_status.is_none());
        assert!(row.reachable.is_none());
    }

    #[tokio::test]
    async fn test_failed_probe_marks_unreachable() {
        let mock_server = MockServer::start().await;
        let order_id = Uuid::new_v4();

        Mock::given(method("GET"))
            .and(path("/api/check-workspace"))
            .respond_with(ResponseTemplate::new(502).set_body_json(json!({
                "ok": false,
                "error": "upstream"
            })))
            .mount(&mock_server)
            .await;

        let client = ArionClient::new(&mock_server.uri(), Some("token".to_owned())).unwrap();
        let rows: DashboardRows = Arc::default();
        lock_rows(&rows).insert(
            order_id,
            DashboardRow {
                name: "training".to_owned(),
                status: Some(OrderStatus::Running),
                workspace_url: Some("https://pod-1-8888.proxy.runpod.net".to_owned()),
                ..Default::default()
            },
        );

        refresh_reachability(&client, &rows).await;

        assert_eq!(lock_rows(&rows)[&order_id].reachable, Some(false));
    }
}
