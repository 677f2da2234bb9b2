//! Adding inventory records on behalf of the web form
//!
//! Either hands the record to an external `larder` executable
//! (`<path> add <name> <quantity> <unit> <expires_in>`) or writes it through
//! the pantry in-process.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use larder_common::config::ROOT_FOLDER_ENV;
use larder_common::model::format_quantity;
use larder_common::pantry::AddOutcome;
use larder_common::{time, NewIngredient, Pantry};
use thiserror::Error;
use tokio::process::Command;
use tracing::{info, warn};

/// Add delegate errors
#[derive(Debug, Error)]
pub enum DelegateError {
    /// Executable missing at the configured path
    #[error("Executable not found: {0}")]
    NotFound(PathBuf),

    /// Executable ran and reported failure
    #[error("{0}")]
    Failed(String),

    /// Name already stocked
    #[error("Ingredient exists: {0}")]
    Duplicate(String),

    /// Pantry read or write failed
    #[error(transparent)]
    Store(#[from] larder_common::Error),

    /// Blocking task panicked or was cancelled
    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Accepts validated additions to the inventory
#[async_trait]
pub trait AddDelegate: Send + Sync {
    async fn submit_add(&self, item: &NewIngredient) -> Result<(), DelegateError>;
}

/// Delegates to an external executable
pub struct ExternalAddCommand {
    executable: PathBuf,
    root_folder: Option<PathBuf>,
}

impl ExternalAddCommand {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            root_folder: None,
        }
    }

    /// Export `LARDER_ROOT_FOLDER` to the child so it edits the same files
    pub fn with_root_folder(mut self, root_folder: impl Into<PathBuf>) -> Self {
        self.root_folder = Some(root_folder.into());
        self
    }

    fn args(item: &NewIngredient) -> [String; 5] {
        [
            "add".to_string(),
            item.name.clone(),
            format_quantity(item.quantity),
            item.unit.clone(),
            item.expires_in.to_string(),
        ]
    }
}

#[async_trait]
impl AddDelegate for ExternalAddCommand {
    async fn submit_add(&self, item: &NewIngredient) -> Result<(), DelegateError> {
        let mut command = Command::new(&self.executable);
        command.args(Self::args(item));
        if let Some(root) = &self.root_folder {
            command.env(ROOT_FOLDER_ENV, root);
        }

        let output = match command.output().await {
            Ok(output) => output,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Add executable {} not found", self.executable.display());
                return Err(DelegateError::NotFound(self.executable.clone()));
            }
            Err(e) => {
                warn!("Failed to run {}: {}", self.executable.display(), e);
                return Err(DelegateError::Failed(e.to_string()));
            }
        };

        if output.status.success() {
            info!(name = %item.name, "Add delegated to {}", self.executable.display());
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let captured = if stderr.trim().is_empty() {
            stdout.trim()
        } else {
            stderr.trim()
        };
        warn!(
            name = %item.name,
            status = %output.status,
            "Add executable reported failure"
        );
        Err(DelegateError::Failed(if captured.is_empty() {
            output.status.to_string()
        } else {
            format!("{} ({})", captured, output.status)
        }))
    }
}

/// Writes through the pantry in this process
pub struct InProcessAdd {
    pantry: Arc<Pantry>,
}

impl InProcessAdd {
    pub fn new(pantry: Arc<Pantry>) -> Self {
        Self { pantry }
    }
}

#[async_trait]
impl AddDelegate for InProcessAdd {
    async fn submit_add(&self, item: &NewIngredient) -> Result<(), DelegateError> {
        let pantry = Arc::clone(&self.pantry);
        let item = item.clone();
        let outcome =
            tokio::task::spawn_blocking(move || pantry.add_ingredient(item, time::today()))
                .await??;

        match outcome {
            AddOutcome::Added(_) => Ok(()),
            AddOutcome::Duplicate(existing) => Err(DelegateError::Duplicate(existing.name)),
        }
    }
}
