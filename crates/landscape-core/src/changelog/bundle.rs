// ── Create-bundle detection ──
//
// A bundle is the contiguous run of CREATE entries that depend on each
// other through parent or endpoint ids. Undoing one member without the
// rest would leave a child whose creation is still logged under a parent
// whose creation is not.

use super::entry::{ChangeAction, ChangeLogEntry};

/// Entries to undo together with `entries[index]`, in creation order.
///
/// Returns `None` when the entry is missing or is not a CREATE. A lone
/// CREATE yields a one-element bundle.
///
/// The run grows in both directions until it stops changing:
/// - forward, over CREATE entries whose parent or endpoints are already
///   in the run;
/// - backward, over a CREATE entry that a run member depends on, as
///   long as nothing outside the run also depends on it.
pub fn detect_bundle(entries: &[ChangeLogEntry], index: usize) -> Option<Vec<ChangeLogEntry>> {
    let target = entries.get(index)?;
    if target.action() != ChangeAction::Create {
        return None;
    }

    let mut start = index;
    let mut end = index;
    loop {
        let mut grew = false;

        while let Some(next) = entries.get(end + 1) {
            let depends_on_run = run(entries, start, end)
                .iter()
                .any(|member| next.references_entity(&member.entity_id));
            if next.action() != ChangeAction::Create || !depends_on_run {
                break;
            }
            end += 1;
            grew = true;
        }

        if let Some(prev_index) = start.checked_sub(1) {
            if let Some(prev) = entries.get(prev_index) {
                let needed = run(entries, start, end)
                    .iter()
                    .any(|member| member.references_entity(&prev.entity_id));
                let used_elsewhere = entries
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i < prev_index || *i > end)
                    .any(|(_, other)| other.references_entity(&prev.entity_id));
                if prev.action() == ChangeAction::Create && needed && !used_elsewhere {
                    start = prev_index;
                    grew = true;
                }
            }
        }

        if !grew {
            break;
        }
    }

    Some(run(entries, start, end).to_vec())
}

fn run(entries: &[ChangeLogEntry], start: usize, end: usize) -> &[ChangeLogEntry] {
    entries.get(start..=end).unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::changelog::entry::Change;
    use crate::model::{EntityId, EntityKind, EntryId};

    fn create(kind: EntityKind, id: &str, parent: &str) -> ChangeLogEntry {
        ChangeLogEntry::new(
            EntryId::fresh(),
            kind,
            EntityId::from(id),
            None,
            Change::Create {
                name: id.into(),
                parent_id: Some(EntityId::from(parent)),
                endpoints: None,
            },
        )
    }

    fn rename(id: &str) -> ChangeLogEntry {
        ChangeLogEntry::new(
            EntryId::fresh(),
            EntityKind::Package,
            EntityId::from(id),
            None,
            Change::Rename {
                original_name: "a".into(),
                new_name: "b".into(),
            },
        )
    }

    fn ids(bundle: &[ChangeLogEntry]) -> Vec<&str> {
        bundle.iter().map(|e| e.entity_id.as_str()).collect()
    }

    #[test]
    fn non_create_is_not_bundlable() {
        let entries = vec![rename("p")];
        assert!(detect_bundle(&entries, 0).is_none());
        assert!(detect_bundle(&entries, 3).is_none());
    }

    #[test]
    fn class_bundles_with_package_it_lives_in() {
        let entries = vec![
            create(EntityKind::Package, "p", "app"),
            create(EntityKind::Class, "c", "p"),
        ];
        assert_eq!(ids(&detect_bundle(&entries, 1).unwrap()), ["p", "c"]);
        assert_eq!(ids(&detect_bundle(&entries, 0).unwrap()), ["p", "c"]);
    }

    #[test]
    fn unrelated_create_stands_alone() {
        let entries = vec![
            create(EntityKind::Package, "p", "app"),
            create(EntityKind::Class, "c", "other"),
        ];
        assert_eq!(ids(&detect_bundle(&entries, 1).unwrap()), ["c"]);
    }

    #[test]
    fn interrupted_run_does_not_bundle() {
        let entries = vec![
            create(EntityKind::Package, "p", "app"),
            rename("x"),
            create(EntityKind::Class, "c", "p"),
        ];
        assert_eq!(ids(&detect_bundle(&entries, 2).unwrap()), ["c"]);
    }

    #[test]
    fn parent_shared_with_a_later_child_is_not_pulled_in() {
        let entries = vec![
            create(EntityKind::Package, "p", "app"),
            create(EntityKind::Class, "c1", "p"),
            rename("x"),
            create(EntityKind::Class, "c2", "p"),
        ];
        assert_eq!(ids(&detect_bundle(&entries, 1).unwrap()), ["c1"]);
        assert_eq!(ids(&detect_bundle(&entries, 0).unwrap()), ["p", "c1"]);
    }

    #[test]
    fn nested_creates_chain_forward() {
        let entries = vec![
            create(EntityKind::Package, "p", "app"),
            create(EntityKind::Package, "sub", "p"),
            create(EntityKind::Class, "c", "sub"),
        ];
        assert_eq!(ids(&detect_bundle(&entries, 0).unwrap()), ["p", "sub", "c"]);
        assert_eq!(ids(&detect_bundle(&entries, 2).unwrap()), ["p", "sub", "c"]);
    }
}
