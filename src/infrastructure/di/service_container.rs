//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use tracing::debug;

use crate::application::services::{NodeService, SequenceService};
use crate::config::Settings;
use crate::infrastructure::store::FileStore;
use crate::infrastructure::traits::Store;
use crate::infrastructure::{InfraError, InfraResult};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Backing store shared by all services
    pub store: Arc<dyn Store>,

    pub nodes: NodeService,
    pub sequences: SequenceService,
}

impl ServiceContainer {
    /// Create a container backed by the data file named in `settings`.
    pub fn new(settings: Settings) -> InfraResult<Self> {
        let store = FileStore::open(&settings.data_file).map_err(|e| {
            InfraError::store(settings.data_file.display().to_string(), e)
        })?;
        debug!("using data file {}", store.path().display());
        Ok(Self::with_store(settings, Arc::new(store)))
    }

    /// Create a service container with a custom store (for testing).
    pub fn with_store(settings: Settings, store: Arc<dyn Store>) -> Self {
        let settings = Arc::new(settings);
        let nodes = NodeService::new(store.clone(), settings.delete_policy);
        let sequences = SequenceService::new(store.clone(), settings.renumber_on_reorder);

        Self {
            settings,
            store,
            nodes,
            sequences,
        }
    }
}
