//! HTTP trace sink

use crate::pending::PendingWrites;
use futures::future::{BoxFuture, FutureExt};
use reqwest::Client;
use threadline_core::{Error, Result, Thread, ThreadResponse, ThreadlineConfig, TraceSink};
use url::Url;

const THREADS_PATH: &str = "api/external/threads";

/// Trace sink that upserts threads into the remote trace store over HTTP
#[derive(Clone)]
pub struct ThreadlineClient {
    http: Client,
    api_key: String,
    project_id: u64,
    base_url: String,
    pending: PendingWrites,
}

impl ThreadlineClient {
    /// Create a new client against the default store
    pub fn new(api_key: impl Into<String>, project_id: u64) -> Self {
        Self {
            http: Client::new(),
            api_key: api_key.into(),
            project_id,
            base_url: threadline_core::config::DEFAULT_BASE_URL.to_string(),
            pending: PendingWrites::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build a client from configuration, failing if the key or project id
    /// is missing.
    pub fn from_config(config: &ThreadlineConfig) -> Result<Self> {
        let api_key = config.api_key()?;
        let project_id = config.project_id()?;

        Ok(Self::new(api_key, project_id).with_base_url(config.base_url.clone()))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Writes started but not yet settled
    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    fn threads_url(&self) -> Result<Url> {
        let base = if self.base_url.ends_with('/') {
            self.base_url.clone()
        } else {
            format!("{}/", self.base_url)
        };

        let mut url = Url::parse(&base)
            .and_then(|base| base.join(THREADS_PATH))
            .map_err(|e| Error::config_error(format!("Invalid base URL '{}': {}", self.base_url, e)))?;
        url.query_pairs_mut().append_pair("apiKey", &self.api_key);
        Ok(url)
    }
}

impl TraceSink for ThreadlineClient {
    fn project_id(&self) -> u64 {
        self.project_id
    }

    fn create_or_update_thread(&self, thread: Thread) -> BoxFuture<'static, Result<ThreadResponse>> {
        let guard = self.pending.register();
        let url = self.threads_url();
        let http = self.http.clone();

        async move {
            let _guard = guard;
            let url = url?;

            tracing::debug!(
                thread_id = %thread.external_id,
                messages = thread.messages.len(),
                "Upserting thread"
            );

            let response = http
                .put(url)
                .json(&thread)
                .send()
                .await
                .map_err(|e| Error::delivery(format!("Request failed: {}", e)))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(Error::Http {
                    status: status.as_u16(),
                    body,
                });
            }

            let body = response.text().await.unwrap_or_default();
            if body.trim().is_empty() {
                return Ok(ThreadResponse::default());
            }

            Ok(serde_json::from_str::<ThreadResponse>(&body).unwrap_or_else(|e| {
                tracing::debug!(status = status.as_u16(), error = %e, "Store reply carried no thread id");
                ThreadResponse::default()
            }))
        }
        .boxed()
    }

    fn flush(&self) -> BoxFuture<'static, ()> {
        self.pending.drain()
    }

    fn shutdown(&self) -> BoxFuture<'static, ()> {
        let drain = self.pending.drain();
        async move {
            drain.await;
            // Pooled connections close when the last clone of the client drops
            tracing::debug!("Trace client shut down");
        }
        .boxed()
    }
}
