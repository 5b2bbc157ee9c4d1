use chrono::{NaiveDate, NaiveDateTime};
use metrics_exporter_prometheus::PrometheusHandle;
use realty_analytics::analytics;
use realty_analytics::seed::seed_demo;
use realty_analytics::store::{InMemoryCrmStore, SqliteCrmStore, StoreError};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Store selected at startup. Handlers are generic over the store, so each
/// arm is dispatched separately.
pub(crate) enum Backend {
    Sqlite(Arc<SqliteCrmStore>),
    Memory(Arc<InMemoryCrmStore>),
}

impl Backend {
    /// Opens the SQLite file when given, otherwise seeds an in-memory team
    /// relative to `now`.
    pub(crate) fn open(database: Option<&Path>, now: NaiveDateTime) -> Result<Self, StoreError> {
        match database {
            Some(path) => {
                let store = SqliteCrmStore::open(path)?;
                info!(path = %path.display(), "using sqlite store");
                Ok(Self::Sqlite(Arc::new(store)))
            }
            None => Ok(Self::Memory(seeded_memory_store(now)?)),
        }
    }
}

pub(crate) fn seeded_memory_store(now: NaiveDateTime) -> Result<Arc<InMemoryCrmStore>, StoreError> {
    let store = Arc::new(InMemoryCrmStore::new());
    seed_demo(store.as_ref(), now)?;
    info!("using seeded in-memory store");
    Ok(store)
}

/// Clap value parser for `YYYY-MM-DD` arguments.
pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    analytics::parse_date(raw).map_err(|err| err.to_string())
}
