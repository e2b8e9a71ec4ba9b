//! Service wiring shared by every handler.

use std::sync::Arc;

use stockroom_infra::services::{Catalog, HistoryReader, MovementLedger, WorkOrderEngine};
use stockroom_infra::store::Store;

/// Application services over one store, injected into handlers via `Extension`.
pub struct AppServices<S> {
    pub catalog: Catalog<S>,
    pub ledger: MovementLedger<S>,
    pub history: HistoryReader<S>,
    pub orders: WorkOrderEngine<S>,
}

impl<S: Store> AppServices<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            catalog: Catalog::new(Arc::clone(&store)),
            ledger: MovementLedger::new(Arc::clone(&store)),
            history: HistoryReader::new(Arc::clone(&store)),
            orders: WorkOrderEngine::new(store),
        }
    }
}
