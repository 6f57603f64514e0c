use dashmap::DashMap;

use super::UsageStore;
use crate::core::session::Session;

/// Process-local store. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryUsageStore {
    sessions: DashMap<String, Session>,
}

impl MemoryUsageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UsageStore for MemoryUsageStore {
    fn upsert(
        &self,
        id: &str,
        create: &dyn Fn() -> Session,
        apply: &mut dyn FnMut(&mut Session),
    ) -> Session {
        // The entry guard holds the shard's write lock until dropped.
        let mut row = self.sessions.entry(id.to_string()).or_insert_with(create);
        apply(row.value_mut());
        row.value().clone()
    }

    fn get(&self, id: &str) -> Option<Session> {
        self.sessions.get(id).map(|row| row.value().clone())
    }

    fn remove(&self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }
}
