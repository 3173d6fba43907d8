//! Atomically swappable route table.
//!
//! [`DispatchTable`] keeps the active [`RouteTable`] behind a Tokio
//! `RwLock<Arc<_>>`. Readers take the shared lock just long enough to
//! clone the `Arc`, so any number of requests resolve concurrently and a
//! request keeps serving from the table it started with even while a
//! reload installs a new one. [`DispatchTable::swap`] holds the exclusive
//! lock only for the pointer replacement; the new table is built before
//! the lock is taken.

use std::sync::Arc;

use tokio::sync::RwLock;

use super::table::RouteTable;

#[derive(Debug)]
pub struct DispatchTable {
    active: RwLock<Arc<RouteTable>>,
}

impl DispatchTable {
    #[must_use]
    pub fn new(table: RouteTable) -> Self {
        Self {
            active: RwLock::new(Arc::new(table)),
        }
    }

    /// The table currently installed. Serve a whole request from one
    /// snapshot.
    pub async fn snapshot(&self) -> Arc<RouteTable> {
        Arc::clone(&*self.active.read().await)
    }

    /// Install `table`, returning the one it replaced.
    pub async fn swap(&self, table: RouteTable) -> Arc<RouteTable> {
        let table = Arc::new(table);
        let mut active = self.active.write().await;
        std::mem::replace(&mut *active, table)
    }
}
