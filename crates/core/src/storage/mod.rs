pub mod lock;
pub mod snapshot;

use crate::domain::fare::FareSnapshot;
use uuid::Uuid;

/// Persistence for the most recently accepted fare snapshot.
pub trait SnapshotStore: Send + Sync {
    /// Returns the last saved snapshot, or an empty one when nothing usable is stored.
    fn load(&self) -> FareSnapshot;

    /// Replaces the stored snapshot atomically.
    fn save(&self, snapshot: &FareSnapshot, run_id: Uuid) -> anyhow::Result<()>;
}
