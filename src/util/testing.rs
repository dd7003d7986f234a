//! Test support: one-time tracing setup and in-memory service fixtures

use std::env;
use std::path::PathBuf;
use std::sync::{Arc, Once};

use tracing::{debug, info};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::config::Settings;
use crate::domain::DeletePolicy;
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::MemoryStore;

static TEST_SETUP: Once = Once::new();

pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        if env::var("RUST_LOG").is_err() {
            env::set_var("RUST_LOG", "ordtree=debug");
        }
        setup_test_logging();
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_test_writer()
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(env_filter),
    );

    // Only set if we haven't already set a global subscriber
    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
}

/// Settings for tests; the data file is never touched by in-memory stores.
pub fn test_settings(delete_policy: DeletePolicy, renumber_on_reorder: bool) -> Settings {
    Settings {
        data_file: PathBuf::from("/nonexistent/ordtree.json"),
        delete_policy,
        renumber_on_reorder,
    }
}

/// Services over a fresh in-memory store.
pub fn memory_container(delete_policy: DeletePolicy, renumber_on_reorder: bool) -> ServiceContainer {
    ServiceContainer::with_store(
        test_settings(delete_policy, renumber_on_reorder),
        Arc::new(MemoryStore::new()),
    )
}
