use crate::store::CollectionSnapshot;

/// Keys that changed between two consecutive snapshots of one collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionDelta {
    pub added: Vec<String>,
    pub changed: Vec<String>,
    pub removed: Vec<String>,
}

impl CollectionDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }
}

/// Compare two snapshots of the same collection.
///
/// The store pushes the whole collection on every change; feeds keep the
/// previous snapshot and diff against it so a delivery that changed nothing
/// is not treated as a full reload.
pub fn diff_snapshots(prev: &CollectionSnapshot, next: &CollectionSnapshot) -> CollectionDelta {
    let mut delta = CollectionDelta::default();
    for (key, value) in next {
        match prev.get(key) {
            None => delta.added.push(key.clone()),
            Some(old) if old != value => delta.changed.push(key.clone()),
            Some(_) => {}
        }
    }
    for key in prev.keys() {
        if !next.contains_key(key) {
            delta.removed.push(key.clone());
        }
    }
    delta
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(entries: &[(&str, serde_json::Value)]) -> CollectionSnapshot {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_identical_snapshots_yield_empty_delta() {
        let snap = snapshot(&[("a", json!({"x": 1})), ("b", json!({"x": 2}))]);
        let delta = diff_snapshots(&snap, &snap);
        assert!(delta.is_empty());
    }

    #[test]
    fn test_added_changed_removed() {
        let prev = snapshot(&[("a", json!({"x": 1})), ("b", json!({"x": 2}))]);
        let next = snapshot(&[("b", json!({"x": 3})), ("c", json!({"x": 4}))]);

        let delta = diff_snapshots(&prev, &next);
        assert_eq!(delta.added, vec!["c".to_string()]);
        assert_eq!(delta.changed, vec!["b".to_string()]);
        assert_eq!(delta.removed, vec!["a".to_string()]);
    }

    #[test]
    fn test_delta_from_empty_is_all_added() {
        let next = snapshot(&[("a", json!({"x": 1}))]);
        let delta = diff_snapshots(&CollectionSnapshot::new(), &next);
        assert_eq!(delta.added, vec!["a".to_string()]);
        assert!(delta.changed.is_empty());
        assert!(delta.removed.is_empty());
    }
}
