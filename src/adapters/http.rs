use crate::utils::error::{AnnotateError, Result};
use reqwest::Client;
use std::time::{Duration, Instant};

/// Polls the annotation server until it answers HTTP at all.
#[derive(Debug, Clone)]
pub struct ReadinessProbe {
    client: Client,
    timeout: Duration,
    interval: Duration,
}

impl ReadinessProbe {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(2))
                .build()
                .unwrap_or_default(),
            timeout,
            interval: Duration::from_millis(250),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// 任何 HTTP 回應（含 4xx/5xx）都代表伺服器已在監聽
    pub async fn wait_until_ready(&self, url: &str) -> Result<u16> {
        let started = Instant::now();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            match self.client.get(url).send().await {
                Ok(response) => {
                    tracing::debug!(
                        "Server at {} answered {} after {} attempt(s)",
                        url,
                        response.status(),
                        attempts
                    );
                    return Ok(response.status().as_u16());
                }
                Err(e) => tracing::trace!("Probe {} failed: {}", attempts, e),
            }

            if started.elapsed() >= self.timeout {
                return Err(AnnotateError::ServerNotReadyError {
                    url: url.to_string(),
                    seconds: self.timeout.as_secs(),
                });
            }
            tokio::time::sleep(self.interval).await;
        }
    }
}
