mod memory;

#[cfg(test)]
mod tests;

pub use memory::MemoryUsageStore;

use crate::core::session::Session;

/// Key-value store for per-session usage rows.
///
/// `upsert` is the only write path: it must run `create` (when the row is
/// absent) and `apply` while holding that row exclusively, and return a copy
/// of the row as `apply` left it. Rows under different keys must not wait on
/// each other beyond locating the row.
pub trait UsageStore: Send + Sync {
    fn upsert(
        &self,
        id: &str,
        create: &dyn Fn() -> Session,
        apply: &mut dyn FnMut(&mut Session),
    ) -> Session;

    /// Consistent snapshot of the row, if any.
    fn get(&self, id: &str) -> Option<Session>;

    /// Returns whether a row was removed.
    fn remove(&self, id: &str) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
