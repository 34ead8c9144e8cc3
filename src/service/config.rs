use std::time::Duration;

const DEFAULT_ENDPOINT: &str = "0.0.0.0:3000";
const DEFAULT_RUNPOD_REST_URL: &str = "https://rest.runpod.io/v1";
const DEFAULT_RUNPOD_GRAPHQL_URL: &str = "https://api.runpod.io/graphql";
const DEFAULT_POD_IMAGE_NAME: &str = "runpod/pytorch:2.1.0-py3.10-cuda11.8.0-devel-ubuntu22.04";
const DEFAULT_WORKSPACE_URL_TEMPLATE: &str = "https://{{pod_id}}-8888.proxy.runpod.net";
const DEFAULT_WORKSPACE_HOST_SUFFIX: &str = "proxy.runpod.net";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PodDeployMode {
    Rest,
    GraphQl,
}

/// Settings used by the provisioning workflow.
#[derive(Clone, Debug)]
pub struct ProvisioningConfig {
    pub image_name: String,
    pub container_disk_gb: i32,
    pub registry_auth_id: Option<String>,
    pub workspace_url_template: String,
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            image_name: DEFAULT_POD_IMAGE_NAME.to_string(),
            container_disk_gb: 20,
            registry_auth_id: None,
            workspace_url_template: DEFAULT_WORKSPACE_URL_TEMPLATE.to_string(),
            poll_interval: Duration::from_secs(5),
            max_poll_attempts: 12,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub endpoint: String,
    pub database_url: String,
    pub run_migrations: bool,

    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_role_key: String,
    pub invite_redirect_url: Option<String>,

    pub runpod_api_key: String,
    pub runpod_rest_url: String,
    pub runpod_graphql_url: String,
    pub pod_deploy_mode: PodDeployMode,

    pub workspace_host_suffix: String,
    pub tracing_exporter: Option<String>,

    pub provisioning: ProvisioningConfig,
}

impl ServiceConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let pod_deploy_mode = match optional("POD_DEPLOY_MODE").as_deref() {
            None | Some("rest") => PodDeployMode::Rest,
            Some("graphql") => PodDeployMode::GraphQl,
            Some(other) => anyhow::bail!("POD_DEPLOY_MODE must be 'rest' or 'graphql', got '{other}'"),
        };

        let provisioning = ProvisioningConfig {
            image_name: optional("POD_IMAGE_NAME")
                .unwrap_or_else(|| DEFAULT_POD_IMAGE_NAME.to_string()),
            container_disk_gb: parsed("POD_CONTAINER_DISK_GB", 20)?,
            registry_auth_id: optional("RUNPOD_REGISTRY_AUTH_ID"),
            workspace_url_template: optional("WORKSPACE_URL_TEMPLATE")
                .unwrap_or_else(|| DEFAULT_WORKSPACE_URL_TEMPLATE.to_string()),
            poll_interval: Duration::from_secs(parsed("POD_READY_POLL_INTERVAL_SECS", 5)?),
            max_poll_attempts: parsed("POD_READY_MAX_ATTEMPTS", 12)?,
        };

        Ok(Self {
            endpoint: optional("ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            database_url: required("DATABASE_URL")?,
            run_migrations: parsed("RUN_MIGRATIONS", false)?,

            supabase_url: required("SUPABASE_URL")?,
            supabase_anon_key: required("SUPABASE_ANON_KEY")?,
            supabase_service_role_key: required("SUPABASE_SERVICE_ROLE_KEY")?,
            invite_redirect_url: optional("INVITE_REDIRECT_URL"),

            runpod_api_key: required("RUNPOD_API_KEY")?,
            runpod_rest_url: optional("RUNPOD_REST_URL")
                .unwrap_or_else(|| DEFAULT_RUNPOD_REST_URL.to_string()),
            runpod_graphql_url: optional("RUNPOD_GRAPHQL_URL")
                .unwrap_or_else(|| DEFAULT_RUNPOD_GRAPHQL_URL.to_string()),
            pod_deploy_mode,

            workspace_host_suffix: optional("WORKSPACE_HOST_SUFFIX")
                .unwrap_or_else(|| DEFAULT_WORKSPACE_HOST_SUFFIX.to_string()),
            tracing_exporter: optional("TRACING_EXPORTER"),

            provisioning,
        })
    }
}

fn optional(key: &str) -> Option<String> {
    dotenvy::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn required(key: &str) -> anyhow::Result<String> {
    optional(key).ok_or_else(|| anyhow::anyhow!("{key} must be set"))
}

fn parsed<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match optional(key) {
        Some(value) => value
            .parse()
            .map_err(|err| anyhow::anyhow!("{key} is invalid: {err}")),
        None => Ok(default),
    }
}
