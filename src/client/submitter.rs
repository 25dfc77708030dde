use std::path::Path;
use std::time::Duration;

use reqwest::Url;
use reqwest::multipart::{Form, Part};

use crate::core::constants::http;
use crate::core::error::{ReportError, Result};
use crate::render::ReportSession;
use crate::report::ReportPayload;

/// Uploads captures to a running server
#[derive(Debug, Clone)]
pub struct ReportClient {
    http: reqwest::Client,
    base: Url,
}

impl ReportClient {
    pub fn new(server_url: &str, timeout: Duration) -> Result<Self> {
        // Without the trailing slash `join` would replace the last path segment
        let normalized = if server_url.ends_with('/') {
            server_url.to_string()
        } else {
            format!("{server_url}/")
        };
        let base = Url::parse(&normalized).map_err(|e| {
            ReportError::Config(format!("Invalid server URL '{server_url}': {e}"))
        })?;

        let user_agent = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self { http, base })
    }

    /// Root the server's relative image references resolve against
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Post `capture` as the `pcapfile` part and decode the payload
    ///
    /// Any non-success status becomes [`ReportError::ServerResponse`] carrying
    /// the server's plain-text diagnostic.
    pub async fn submit(&self, capture: &Path) -> Result<ReportPayload> {
        let bytes = tokio::fs::read(capture).await?;
        let file_name = capture
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "capture.pcap".to_string());

        let form = Form::new().part(http::CAPTURE_FIELD, Part::bytes(bytes).file_name(file_name));
        let url = self.endpoint(http::UPLOAD_ROUTE)?;
        log::debug!("Submitting {} to {url}", capture.display());

        let response = self.http.post(url).multipart(form).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ReportError::ServerResponse {
                status: status.as_u16(),
                body,
            });
        }
        Ok(ReportPayload::from_json(&body)?)
    }

    /// Submit through `session`, drawing the result only if the upload succeeds
    pub async fn submit_to(&self, session: &ReportSession, capture: &Path) -> Result<()> {
        session.submit(self.submit(capture)).await
    }

    fn endpoint(&self, route: &str) -> Result<Url> {
        self.base
            .join(route.trim_start_matches('/'))
            .map_err(|e| ReportError::Config(format!("Invalid endpoint '{route}': {e}")))
    }
}
