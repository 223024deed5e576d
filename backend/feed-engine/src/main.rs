use feed_engine::config::LogFormat;
use feed_engine::{EngineConfig, EngineFacade, EngineRequest, EngineResponse};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// One line of output per request line.
#[derive(Serialize)]
#[serde(untagged)]
enum WorkerReply {
    Ok { ok: EngineResponse },
    Error { error: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = EngineConfig::from_env()?;
    init_tracing(config.log_format);

    info!(
        acceleration = config.acceleration,
        init_retries = config.init_retries,
        max_clusters = config.max_clusters,
        "Starting feed-engine worker"
    );

    let facade = EngineFacade::new(config);
    let handle = facade.handle().await.clone();
    info!(backend = %handle.backend_kind(), "Engine ready, reading requests from stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut served: u64 = 0;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let worker = handle.clone();
        let result = tokio::task::spawn_blocking(move || {
            EngineRequest::parse(&line).and_then(|request| worker.execute(request))
        })
        .await?;

        let reply = match result {
            Ok(response) => WorkerReply::Ok { ok: response },
            Err(e) => {
                warn!(error = %e, caller_error = e.is_caller_error(), "Request failed");
                WorkerReply::Error {
                    error: e.to_string(),
                }
            }
        };

        let mut out = serde_json::to_string(&reply)?;
        out.push('\n');
        stdout.write_all(out.as_bytes()).await?;
        stdout.flush().await?;
        served += 1;
    }

    info!(served = served, "stdin closed, shutting down");
    Ok(())
}

/// Logs go to stderr; stdout carries the response stream.
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}
