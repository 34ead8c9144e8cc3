use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arion::acl::Authenticator;
use arion::api::{router, AppState};
use arion::config::ServiceConfig;
use arion::persistence::relational::{
    ContactRelationalPersistence, MembershipRelationalPersistence, OrderRelationalPersistence,
    OrganizationRelationalPersistence, ProfileRelationalPersistence, RoleRelationalPersistence,
};
use arion::runpod::{GpuCloud, RunPodClient};
use arion::services::{
    AccountService, ContactService, GpuService, OrderService, OrganizationService,
    WorkspaceService,
};
use arion::supabase::{IdentityProvider, SupabaseIdentity};

const SERVICE_NAME: &str = "arion-api";

fn init_tracing(exporter: Option<&str>) -> anyhow::Result<()> {
    let registry = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer());

    match exporter {
        Some("jaeger") => {
            let tracer = opentelemetry_jaeger::new_agent_pipeline()
                .with_service_name(SERVICE_NAME)
                .install_simple()?;

            registry
                .with(tracing_opentelemetry::layer().with_tracer(tracer))
                .try_init()?;
        }
        _ => registry.try_init()?,
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = ServiceConfig::from_env()?;
    init_tracing(config.tracing_exporter.as_deref())?;

    let db = Arc::new(
        PgPoolOptions::new()
            .max_connections(20)
            .connect(&config.database_url)
            .await?,
    );

    if config.run_migrations {
        sqlx::migrate!().run(&*db).await?;
    }

    let profiles = Arc::new(ProfileRelationalPersistence {
        db: Arc::clone(&db),
    });
    let organizations = Arc::new(OrganizationRelationalPersistence {
        db: Arc::clone(&db),
    });
    let memberships = Arc::new(MembershipRelationalPersistence {
        db: Arc::clone(&db),
    });

    let identity: Arc<dyn IdentityProvider> = Arc::new(SupabaseIdentity::new(
        &config.supabase_url,
        &config.supabase_anon_key,
        &config.supabase_service_role_key,
    )?);

    let cloud: Arc<dyn GpuCloud> = Arc::new(RunPodClient::new(
        &config.runpod_api_key,
        &config.runpod_rest_url,
        &config.runpod_graphql_url,
        config.pod_deploy_mode,
    )?);

    let state = AppState {
        authenticator: Arc::new(Authenticator {
            identity: Arc::clone(&identity),
            profiles: profiles.clone(),
            memberships: memberships.clone(),
        }),
        account_service: Arc::new(AccountService {
            profiles,
            organizations: organizations.clone(),
            memberships,
            identity,
            invite_redirect_url: config.invite_redirect_url.clone(),
        }),
        contact_service: Arc::new(ContactService {
            persistence: Box::new(ContactRelationalPersistence {
                db: Arc::clone(&db),
            }),
        }),
        gpu_service: Arc::new(GpuService {
            cloud: Arc::clone(&cloud),
        }),
        order_service: Arc::new(OrderService {
            persistence: Box::new(OrderRelationalPersistence {
                db: Arc::clone(&db),
            }),
            cloud,
            provisioning: config.provisioning.clone(),
        }),
        organization_service: Arc::new(OrganizationService {
            persistence: organizations,
            roles: Box::new(RoleRelationalPersistence {
                db: Arc::clone(&db),
            }),
        }),
        workspace_service: Arc::new(WorkspaceService::new(&config.workspace_host_suffix)?),
    };

    let listener = tokio::net::TcpListener::bind(&config.endpoint).await?;
    tracing::info!("http api listening on {}", config.endpoint);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    opentelemetry::global::shutdown_tracer_provider();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", err);
    }
}
