//! Starts the external annotation server for one target.
//!
//! The server owns its configuration format and output directory; this module
//! only renders the command line, checks that the config file and port are
//! usable, and supervises the child process until it exits or Ctrl-C.

use crate::adapters::http::ReadinessProbe;
use crate::config::toml_config::ServerConfig;
use crate::domain::model::{access_url, AnnotationTarget};
use crate::utils::error::{AnnotateError, Result};
use std::future::Future;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};

#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    pub port: Option<u16>,
    pub wait_ready: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    DryRun { command: Vec<String>, url: String },
    Exited,
    Interrupted,
}

pub struct Launcher {
    server: ServerConfig,
}

impl Launcher {
    pub fn new(server: ServerConfig) -> Self {
        Self { server }
    }

    pub fn url(&self, port: u16) -> String {
        access_url(&self.server.host, port)
    }

    /// Program followed by its arguments, placeholders filled in.
    pub fn command_line(&self, target: &AnnotationTarget, port: u16) -> Vec<String> {
        let config = target.config.to_string_lossy();
        let port = port.to_string();

        std::iter::once(self.server.program.clone())
            .chain(self.server.args.iter().map(|arg| {
                arg.replace("{config}", &config)
                    .replace("{port}", &port)
                    .replace("{output_dir}", &target.output_dir.to_string_lossy())
            }))
            .collect()
    }

    pub async fn preflight(&self, target: &AnnotationTarget, port: u16) -> Result<()> {
        if port == 0 {
            return Err(AnnotateError::InvalidConfigValueError {
                field: "port".to_string(),
                value: port.to_string(),
                reason: "port must be between 1 and 65535".to_string(),
            });
        }

        let metadata = tokio::fs::metadata(&target.config).await.map_err(|e| {
            AnnotateError::ConfigError {
                message: format!(
                    "cannot read configuration file {}: {}",
                    target.config.display(),
                    e
                ),
            }
        })?;
        if !metadata.is_file() {
            return Err(AnnotateError::ConfigError {
                message: format!("{} is not a file", target.config.display()),
            });
        }

        self.ensure_port_free(port).await
    }

    // 每個解析出的位址都要能綁定，避免只測到 ::1 而漏掉 127.0.0.1
    async fn ensure_port_free(&self, port: u16) -> Result<()> {
        let addrs = tokio::net::lookup_host((self.server.host.as_str(), port)).await?;
        for addr in addrs {
            match tokio::net::TcpListener::bind(addr).await {
                Ok(listener) => drop(listener),
                Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
                    return Err(AnnotateError::PortInUseError {
                        host: self.server.host.clone(),
                        port,
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AddrNotAvailable => {
                    tracing::debug!("Skipping unavailable address {}: {}", addr, e);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    pub async fn launch(&self, target: &AnnotationTarget, options: &LaunchOptions) -> Result<LaunchOutcome> {
        let port = options.port.unwrap_or(target.port);
        let command = self.command_line(target, port);
        let url = self.url(port);

        if options.dry_run {
            return Ok(LaunchOutcome::DryRun { command, url });
        }

        self.preflight(target, port).await?;

        tracing::info!("🚀 Starting annotation server for '{}': {}", target.name, command.join(" "));
        tracing::info!("🌐 Annotation UI will be available at {}", url);
        tracing::info!("📁 Annotations are written to {}", target.output_dir.display());

        let mut child = Command::new(&command[0])
            .args(&command[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| AnnotateError::SpawnError {
                program: command[0].clone(),
                source,
            })?;

        let probe = options
            .wait_ready
            .then(|| ReadinessProbe::new(Duration::from_secs(self.server.ready_timeout_seconds)));

        supervise(&mut child, &url, probe.as_ref(), tokio::signal::ctrl_c()).await
    }
}

/// Waits for the server to exit. When `shutdown` resolves first, including
/// while the readiness probe is still polling, the child is killed.
async fn supervise<F>(
    child: &mut Child,
    url: &str,
    probe: Option<&ReadinessProbe>,
    shutdown: F,
) -> Result<LaunchOutcome>
where
    F: Future<Output = std::io::Result<()>>,
{
    tokio::pin!(shutdown);

    if let Some(probe) = probe {
        tokio::select! {
            ready = probe.wait_until_ready(url) => {
                if let Err(e) = ready {
                    child.kill().await?;
                    return Err(e);
                }
                tracing::info!("✅ Annotation server is ready at {}", url);
            }
            status = child.wait() => return exit_outcome(status?),
            signal = &mut shutdown => return interrupt(child, signal).await,
        }
    }

    tokio::select! {
        status = child.wait() => exit_outcome(status?),
        signal = &mut shutdown => interrupt(child, signal).await,
    }
}

async fn interrupt(child: &mut Child, signal: std::io::Result<()>) -> Result<LaunchOutcome> {
    signal?;
    tracing::info!("🛑 Interrupted, stopping annotation server");
    child.kill().await?;
    Ok(LaunchOutcome::Interrupted)
}

fn exit_outcome(status: std::process::ExitStatus) -> Result<LaunchOutcome> {
    if status.success() {
        tracing::info!("Annotation server exited");
        Ok(LaunchOutcome::Exited)
    } else {
        Err(AnnotateError::ServerExitedError {
            code: status.code(),
        })
    }
}
