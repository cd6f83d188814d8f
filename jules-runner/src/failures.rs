//! Shared per-project error registry.
//!
//! Workers write at most one error each; the orchestrator drains the registry
//! once the status board has settled. The map is never handed out, only
//! lock-scoped operations are exposed.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use jules_core::ProjectName;

use crate::error::WorkerError;

#[derive(Debug, Default)]
pub struct ErrorRegistry {
    inner: Mutex<HashMap<ProjectName, WorkerError>>,
}

impl ErrorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave the map half-written:
    // every critical section is a single map operation.
    fn map(&self) -> MutexGuard<'_, HashMap<ProjectName, WorkerError>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record `err` for `project` unless it already has one.
    ///
    /// Returns `false` (and drops `err`) when an entry already existed.
    pub fn insert_if_absent(&self, project: ProjectName, err: WorkerError) -> bool {
        let mut map = self.map();
        if map.contains_key(&project) {
            tracing::debug!(project = %project, "duplicate error ignored: {err}");
            return false;
        }
        map.insert(project, err);
        true
    }

    pub fn contains(&self, project: &ProjectName) -> bool {
        self.map().contains_key(project)
    }

    pub fn len(&self) -> usize {
        self.map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map().is_empty()
    }

    /// Take every recorded error, ordered by project name.
    pub fn drain(&self) -> BTreeMap<ProjectName, WorkerError> {
        self.map().drain().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn first_error_wins() {
        let registry = ErrorRegistry::new();
        assert!(registry.insert_if_absent("a".into(), WorkerError::Panicked("first".into())));
        assert!(!registry.insert_if_absent("a".into(), WorkerError::Panicked("second".into())));
        assert_eq!(registry.len(), 1);

        let drained = registry.drain();
        assert_eq!(drained[&ProjectName::from("a")].to_string(), "worker panicked: first");
        assert!(registry.is_empty());
    }

    #[test]
    fn concurrent_inserts_are_all_kept() {
        let registry = ErrorRegistry::new();
        thread::scope(|s| {
            for i in 0..32 {
                let registry = &registry;
                s.spawn(move || {
                    registry.insert_if_absent(
                        ProjectName::from(format!("p{i:02}")),
                        WorkerError::Panicked(i.to_string()),
                    );
                });
            }
        });
        assert_eq!(registry.len(), 32);
        assert!(registry.contains(&ProjectName::from("p07")));
        let keys: Vec<_> = registry.drain().into_keys().collect();
        assert_eq!(keys.first(), Some(&ProjectName::from("p00")));
        assert_eq!(keys.last(), Some(&ProjectName::from("p31")));
    }
}
