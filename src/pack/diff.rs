//! Entry diffing between the incoming and the previously installed pack
//!
//! Entries are matched by content fingerprint, not by path: a resource that
//! moved or was renamed without changing bytes is still reused.

use crate::pack::manifest::{Manifest, PackEntry};
use std::collections::HashMap;
use std::fmt;

/// What install does for one incoming entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryDecision {
    /// Copy the object stored under the old entry's path in the previous pack
    Reuse(PackEntry),
    /// Retrieve fresh bytes for this logical path
    Fetch(String),
}

impl EntryDecision {
    /// Whether the entry is copied from the previous pack
    pub fn is_reuse(&self) -> bool {
        matches!(self, Self::Reuse(_))
    }
}

impl fmt::Display for EntryDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reuse(old) => write!(f, "reuse {}", old.path),
            Self::Fetch(path) => write!(f, "fetch {}", path),
        }
    }
}

/// Decide, for every incoming entry in order, whether to reuse or fetch
pub fn diff_entries(
    incoming: &Manifest,
    previous: Option<&Manifest>,
) -> Vec<(PackEntry, EntryDecision)> {
    // First entry wins when the previous pack stored the same bytes twice
    let mut by_hash: HashMap<&str, &PackEntry> = HashMap::new();
    if let Some(previous) = previous {
        for entry in previous.entries() {
            by_hash.entry(entry.hash.as_str()).or_insert(entry);
        }
    }

    incoming
        .entries()
        .iter()
        .map(|entry| {
            let decision = match by_hash.get(entry.hash.as_str()) {
                Some(old) => EntryDecision::Reuse((*old).clone()),
                None => EntryDecision::Fetch(entry.path.clone()),
            };
            (entry.clone(), decision)
        })
        .collect()
}

/// Count of reuse and fetch decisions, in that order
pub fn summarize(decisions: &[(PackEntry, EntryDecision)]) -> (usize, usize) {
    let reused = decisions.iter().filter(|(_, d)| d.is_reuse()).count();
    (reused, decisions.len() - reused)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pack(entries: &[(&str, &str)]) -> Manifest {
        Manifest::new(
            entries.iter().map(|(p, h)| PackEntry::new(*p, *h)).collect(),
            1,
        )
        .unwrap()
    }

    #[test]
    fn absent_previous_fetches_everything() {
        let incoming = pack(&[("x", "1"), ("y", "2")]);
        let decisions = diff_entries(&incoming, None);
        assert_eq!(
            decisions.iter().map(|(_, d)| d.clone()).collect::<Vec<_>>(),
            vec![
                EntryDecision::Fetch("x".into()),
                EntryDecision::Fetch("y".into())
            ]
        );
    }

    #[test]
    fn unchanged_entry_is_reused() {
        let old = pack(&[("x", "1")]);
        let incoming = pack(&[("x", "1"), ("y", "2")]);
        let decisions = diff_entries(&incoming, Some(&old));

        assert_eq!(decisions[0].1, EntryDecision::Reuse(PackEntry::new("x", "1")));
        assert_eq!(decisions[1].1, EntryDecision::Fetch("y".into()));
        assert_eq!(summarize(&decisions), (1, 1));
    }

    #[test]
    fn renamed_entry_is_reused_by_hash() {
        let old = pack(&[("css/old.css", "abc")]);
        let incoming = pack(&[("css/new.css", "abc")]);
        let decisions = diff_entries(&incoming, Some(&old));

        assert_eq!(decisions[0].0.path, "css/new.css");
        assert_eq!(
            decisions[0].1,
            EntryDecision::Reuse(PackEntry::new("css/old.css", "abc"))
        );
    }

    #[test]
    fn changed_content_at_same_path_is_fetched() {
        let old = pack(&[("x", "1")]);
        let incoming = pack(&[("x", "2")]);
        let decisions = diff_entries(&incoming, Some(&old));
        assert_eq!(decisions[0].1, EntryDecision::Fetch("x".into()));
    }

    #[test]
    fn decisions_follow_incoming_order() {
        let old = pack(&[("b", "2"), ("a", "1")]);
        let incoming = pack(&[("a", "1"), ("c", "3"), ("b", "2")]);
        let paths: Vec<_> = diff_entries(&incoming, Some(&old))
            .into_iter()
            .map(|(e, _)| e.path)
            .collect();
        assert_eq!(paths, vec!["a", "c", "b"]);
    }

    #[test]
    fn duplicate_hashes_reuse_first_old_entry() {
        let old = pack(&[("first", "same"), ("second", "same")]);
        let incoming = pack(&[("third", "same")]);
        let decisions = diff_entries(&incoming, Some(&old));
        assert_eq!(
            decisions[0].1,
            EntryDecision::Reuse(PackEntry::new("first", "same"))
        );
    }

    #[test]
    fn decision_display() {
        assert_eq!(EntryDecision::Fetch("y".into()).to_string(), "fetch y");
        assert_eq!(
            EntryDecision::Reuse(PackEntry::new("x", "1")).to_string(),
            "reuse x"
        );
    }
}
