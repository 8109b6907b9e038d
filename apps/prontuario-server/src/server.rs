use std::sync::Arc;

use prontuario_reports::{JsonReportRenderer, ReportLog, ReportRenderer};
use prontuario_storage::{Principal, Store};
use prontuario_store_sqlite::SqliteStore;

use crate::clock::{Clock, SystemClock};
use crate::config::ServerConfig;
use crate::credentials::CredentialStore;
use crate::error::{AuthFailure, ServiceError};

/// Everything a request needs: storage, the report sinks, the clock and
/// configuration. Cheap to clone.
#[derive(Clone)]
pub struct ProntuarioServer {
    pub store: Arc<dyn Store>,
    pub report_log: Arc<dyn ReportLog>,
    pub renderer: Arc<dyn ReportRenderer>,
    pub clock: Arc<dyn Clock>,
    pub config: ServerConfig,
    credentials: CredentialStore,
}

impl ProntuarioServer {
    pub fn new(
        store: Arc<dyn Store>,
        report_log: Arc<dyn ReportLog>,
        renderer: Arc<dyn ReportRenderer>,
        clock: Arc<dyn Clock>,
        config: ServerConfig,
    ) -> Self {
        let credentials =
            CredentialStore::new(store.clone(), clock.clone(), config.credential_lifetime);
        Self {
            store,
            report_log,
            renderer,
            clock,
            config,
            credentials,
        }
    }

    /// SQLite for both records and the report log, JSON reports, wall clock.
    pub fn new_sqlite(store: Arc<SqliteStore>, config: ServerConfig) -> Self {
        Self::new(
            store.clone(),
            store,
            Arc::new(JsonReportRenderer),
            Arc::new(SystemClock),
            config,
        )
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Resolve the caller behind a bearer key. Runs on every request; the
    /// result reflects the principal's role and profile as stored right now.
    pub async fn authenticate(&self, key: &str) -> Result<Principal, ServiceError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(AuthFailure::Missing.into());
        }
        self.credentials.validate(key).await
    }
}
