use std::net::SocketAddr;
use std::sync::Arc;

use redb::Database;

use toner_core::{Catalog, Clock, SystemClock, Tracker, TransitionPolicy};
use toner_db::{RedbConsumableStore, RedbOperationLedger, RedbReferenceStore};

use crate::error::ApiError;
use crate::middleware::WriteLimiter;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<Tracker>,
    pub catalog: Arc<Catalog>,
    pub write_limiter: Arc<WriteLimiter>,
}

impl AppState {
    pub fn new(tracker: Arc<Tracker>, catalog: Arc<Catalog>, write_rate_per_sec: u32) -> Self {
        Self {
            tracker,
            catalog,
            write_limiter: Arc::new(WriteLimiter::per_second(write_rate_per_sec)),
        }
    }

    /// Wire redb-backed stores into a tracker and catalog.
    pub fn with_database(db: Arc<Database>, policy: TransitionPolicy, write_rate_per_sec: u32) -> Self {
        let references = Arc::new(RedbReferenceStore::new(db.clone()));
        let consumables = Arc::new(RedbConsumableStore::new(db.clone()));
        let ledger = Arc::new(RedbOperationLedger::new(db));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let tracker = Tracker::new(consumables, ledger, references.clone(), clock, policy);
        let catalog = Catalog::new(references.clone(), references);
        Self::new(Arc::new(tracker), Arc::new(catalog), write_rate_per_sec)
    }

    /// Reject the request if this client exceeded its write budget.
    pub fn check_write(&self, addr: SocketAddr) -> Result<(), ApiError> {
        self.write_limiter
            .check(addr.ip())
            .map_err(ApiError::RateLimited)
    }
}
