use std::{
    path::{Path, PathBuf},
    sync::{Arc, LazyLock},
};

use herald_checkpoint::{Checkpoint, CheckpointConfig, CheckpointStore, ListKey};
use herald_common::{ChatRef, ItemList, Signal, internal};
use herald_delivery::{
    DeliveryEngine, DispatchConfig, DispatchProcessor, EngineConfig, FanoutReporter, Reporter,
    RunStatus, RunSummary, TracingReporter,
};
use herald_telegram::{BotClient, TelegramConfig, TelegramReporter};
use serde::Deserialize;
use tokio::sync::broadcast;

use crate::source::{Source, SourceError};

const CONFIG_ENV: &str = "HERALD_CONFIG";
const DEFAULT_CONFIG_PATHS: [&str; 2] = ["./herald.config.ron", "/etc/herald/herald.config.ron"];

/// Everything one dispatch job needs
///
/// ```ron
/// Herald (
///     source: Questions(path: "questions.json"),
///     engine: (destination: "@my_channel"),
///     telegram: (scratch_chat: Some(-1001234567890)),
///     log_chat: Some(-1009876543210),
/// )
/// ```
#[derive(Debug, Deserialize)]
pub struct Herald {
    pub source: Source,
    pub engine: EngineConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub checkpoint: CheckpointConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    /// Chat to post progress reports to, in addition to the log
    #[serde(default)]
    pub log_chat: Option<ChatRef>,
}

pub static SHUTDOWN_BROADCAST: LazyLock<broadcast::Sender<Signal>> = LazyLock::new(|| {
    let (sender, _receiver) = broadcast::channel(64);
    sender
});

/// Wait for SIGINT or SIGTERM, then ask the run to stop
#[tracing::instrument(level = tracing::Level::TRACE)]
async fn shutdown() -> anyhow::Result<()> {
    let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            internal!(level = WARN, "CTRL+C entered, stopping at the next pause");
        }
        _ = terminate.recv() => {
            internal!(level = WARN, "Terminate signal received, stopping at the next pause");
        }
    };

    SHUTDOWN_BROADCAST
        .send(Signal::Shutdown)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Interrupted, e.to_string()))?;

    Ok(())
}

/// Process exit status for a finished run
#[must_use]
pub const fn exit_code(status: &RunStatus) -> u8 {
    match status {
        RunStatus::Completed => 0,
        RunStatus::Halted { .. } => 1,
        RunStatus::Interrupted => 130,
    }
}

/// Find the configuration file using the following precedence:
/// 1. `explicit`, from the command line
/// 2. `HERALD_CONFIG` environment variable
/// 3. ./herald.config.ron (current working directory)
/// 4. /etc/herald/herald.config.ron (system-wide config)
///
/// # Errors
/// If the chosen file does not exist, or none of the defaults do
pub fn find_config_file(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        anyhow::bail!("Config file does not exist: {}", path.display());
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        anyhow::bail!(
            "{CONFIG_ENV} points to non-existent file: {}",
            path.display()
        );
    }

    if let Some(path) = DEFAULT_CONFIG_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
    {
        return Ok(path);
    }

    let paths_tried = DEFAULT_CONFIG_PATHS
        .iter()
        .map(|p| format!("  - {p}"))
        .collect::<Vec<_>>()
        .join("\n");

    anyhow::bail!(
        "No configuration file found. Tried:\n  - --config\n  - {CONFIG_ENV} environment variable\n{paths_tried}"
    )
}

impl Herald {
    /// Read a RON configuration file
    ///
    /// # Errors
    /// If the file cannot be read or is not a valid configuration
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read config from {}: {}", path.display(), e)
        })?;

        ron::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config in {}: {}", path.display(), e))
    }

    /// Load and validate the configured item list
    ///
    /// # Errors
    /// If the source cannot be read or any item is invalid
    pub fn load(&self) -> Result<ItemList, SourceError> {
        let list = self.source.load()?;
        list.validate(&self.engine.limits)?;
        Ok(list)
    }

    /// Checkpoint identity and current state of the configured list
    ///
    /// # Errors
    /// If the list cannot be loaded or the store cannot be opened
    pub async fn status(&self) -> anyhow::Result<(ItemList, ListKey, Checkpoint)> {
        let list = self.source.load()?;
        let key = ListKey::derive(&list);
        let store = self.checkpoint.clone().into_store().await?;
        let checkpoint = store.load(&key).await;

        Ok((list, key, checkpoint))
    }

    /// Forget all progress on the configured list
    ///
    /// # Errors
    /// If the list cannot be loaded or the checkpoint cannot be removed
    pub async fn reset(&self) -> anyhow::Result<ListKey> {
        let list = self.source.load()?;
        let key = ListKey::derive(&list);
        self.checkpoint.clone().into_store().await?.clear(&key).await?;

        internal!(level = INFO, "Cleared checkpoint {key}");
        Ok(key)
    }

    fn reporter(&self, client: &BotClient) -> Arc<dyn Reporter> {
        let Some(chat) = &self.log_chat else {
            return Arc::new(TracingReporter);
        };

        Arc::new(FanoutReporter::new(vec![
            Arc::new(TracingReporter),
            Arc::new(TelegramReporter::new(
                client.clone(),
                chat.clone(),
                self.telegram.report_timeout(),
            )),
        ]))
    }

    /// Run the configured job until it completes, halts or is interrupted
    ///
    /// # Errors
    /// If the configuration is unusable or the list fails validation
    #[tracing::instrument(level = tracing::Level::TRACE, skip_all, err)]
    pub async fn run(self) -> anyhow::Result<RunSummary> {
        let client = BotClient::new(&self.telegram)?;
        let reporter = self.reporter(&client);

        let list = match self.load() {
            Ok(list) => list,
            Err(err) => {
                reporter
                    .report(&herald_delivery::ProgressEvent::ValidationFailed {
                        label: self.source.label(),
                        index: match &err {
                            SourceError::Validation(inner) => inner.index(),
                            _ => None,
                        },
                        reason: err.to_string(),
                    })
                    .await;
                return Err(err.into());
            }
        };

        let store: Arc<dyn CheckpointStore> = self.checkpoint.into_store().await?;
        let engine = DeliveryEngine::new(Arc::new(client), self.engine);
        let processor = DispatchProcessor::new(self.dispatch, engine, store, reporter);

        internal!("Controller running");

        let receiver = SHUTDOWN_BROADCAST.subscribe();
        let signals = tokio::spawn(shutdown());
        let summary = processor.run(&list, receiver).await;
        signals.abort();

        internal!("Shutting down...");

        Ok(summary?)
    }
}
