use arion_core::WorkspaceCheckResponse;
use std::time::Duration;
use url::Url;

use crate::error::ApiError;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Reachability probe for workspace URLs. Only hosts under the configured
/// suffix may be probed.
pub struct WorkspaceService {
    http: reqwest::Client,
    host_suffix: String,
}

impl WorkspaceService {
    pub fn new(host_suffix: &str) -> anyhow::Result<Self> {
        // Redirects would leave the allowed host suffix.
        let http = reqwest::Client::builder()
            .timeout(PROBE_TIMEOUT)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            http,
            host_suffix: host_suffix.trim_start_matches('.').to_lowercase(),
        })
    }

    fn validate(&self, workspace_url: &str) -> Result<Url, ApiError> {
        let url = Url::parse(workspace_url)
            .map_err(|err| ApiError::Validation(format!("invalid url: {err}")))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ApiError::Validation("url must be http or https".to_string()));
        }

        let host = url.host_str().unwrap_or_default().to_lowercase();
        let allowed =
            host == self.host_suffix || host.ends_with(&format!(".{}", self.host_suffix));

        if !allowed {
            return Err(ApiError::Validation(format!(
                "url host must be under {}",
                self.host_suffix
            )));
        }

        Ok(url)
    }

    #[tracing::instrument(name = "service::workspace::check", skip(self))]
    pub async fn check(&self, workspace_url: &str) -> Result<WorkspaceCheckResponse, ApiError> {
        let url = self.validate(workspace_url)?;

        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::debug!("workspace unreachable: {}", err);
                return Ok(WorkspaceCheckResponse {
                    ok: true,
                    reachable: false,
                    status: None,
                });
            }
        };

        let status = response.status();

        Ok(WorkspaceCheckResponse {
            ok: true,
            reachable: !status.is_server_error(),
            status: Some(status.as_u16()),
        })
    }
}
