//! Flat records → manager/report forest.
//!
//! Records are joined on email only: each record's `manager_email` is
//! looked up, case-insensitively, among every record's `email`. A record
//! with no resolvable manager, or whose manager resolves to itself, is a
//! root. Both passes are linear in the number of records, and the forest is
//! assembled with an explicit stack so chain length never touches the call
//! stack.

use crate::schema::Record;
use indextree::{Arena, NodeId};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Result of linking one batch of records.
#[derive(Debug, Clone, Default)]
pub struct Forest {
    arena: Arena<Record>,
    roots: Vec<NodeId>,
    /// Records whose manager chain loops without reaching a root.
    pub unreachable: Vec<Record>,
    /// Index entries overwritten by a later record with the same email.
    pub duplicate_emails: usize,
}

impl Forest {
    /// Top-level nodes in input order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn record(&self, id: NodeId) -> Option<&Record> {
        self.arena.get(id).map(|node| node.get())
    }

    pub fn manager(&self, id: NodeId) -> Option<NodeId> {
        self.arena.get(id).and_then(|node| node.parent())
    }

    /// Direct reports of `id`, in input order.
    pub fn reports(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.children(&self.arena)
    }

    /// `id` and everyone below it, managers before their reports.
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.descendants(&self.arena)
    }

    /// Number of linked records (unreachable ones excluded).
    pub fn len(&self) -> usize {
        self.arena.count()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }
}

/// Lowercased join key. Empty emails never match anything.
fn email_key(email: &str) -> Option<String> {
    if email.is_empty() {
        None
    } else {
        Some(email.to_lowercase())
    }
}

pub fn link(records: Vec<Record>) -> Forest {
    // Last write wins on duplicate emails.
    let mut index: HashMap<String, usize> = HashMap::with_capacity(records.len());
    let mut duplicate_emails = 0;
    for (position, record) in records.iter().enumerate() {
        if let Some(key) = email_key(&record.email) {
            if index.insert(key, position).is_some() {
                duplicate_emails += 1;
            }
        }
    }
    if duplicate_emails > 0 {
        debug!("{} duplicate emails, later records win", duplicate_emails);
    }

    let mut reports: Vec<Vec<usize>> = vec![Vec::new(); records.len()];
    let mut root_positions = Vec::new();
    for (position, record) in records.iter().enumerate() {
        let manager = email_key(&record.manager_email).and_then(|key| index.get(&key).copied());
        match manager {
            Some(manager) if manager != position => reports[manager].push(position),
            _ => root_positions.push(position),
        }
    }

    let mut slots: Vec<Option<Record>> = records.into_iter().map(Some).collect();
    let mut arena = Arena::with_capacity(slots.len());
    let mut roots = Vec::with_capacity(root_positions.len());

    // Depth-first from each root; reversed pushes keep input order.
    let mut stack: Vec<(usize, Option<NodeId>)> =
        root_positions.iter().rev().map(|&position| (position, None)).collect();
    while let Some((position, manager)) = stack.pop() {
        let Some(record) = slots[position].take() else {
            continue;
        };
        let id = arena.new_node(record);
        match manager {
            Some(manager) => manager.append(id, &mut arena),
            None => roots.push(id),
        }
        stack.extend(reports[position].iter().rev().map(|&report| (report, Some(id))));
    }

    // Every record reachable from a root was taken above.
    let unreachable: Vec<Record> = slots.into_iter().flatten().collect();
    if !unreachable.is_empty() {
        warn!(
            "{} records are in a manager cycle and have no root: {:?}",
            unreachable.len(),
            unreachable.iter().map(|r| r.id).collect::<Vec<_>>()
        );
    }

    Forest {
        arena,
        roots,
        unreachable,
        duplicate_emails,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, email: &str, manager_email: &str) -> Record {
        Record {
            id,
            last_name: format!("N{}", id),
            email: email.to_string(),
            manager_email: manager_email.to_string(),
            ..Record::default()
        }
    }

    fn ids(forest: &Forest, nodes: impl IntoIterator<Item = NodeId>) -> Vec<i64> {
        nodes
            .into_iter()
            .filter_map(|id| forest.record(id))
            .map(|r| r.id)
            .collect()
    }

    fn root_ids(forest: &Forest) -> Vec<i64> {
        ids(forest, forest.roots().iter().copied())
    }

    fn report_ids(forest: &Forest, root: usize) -> Vec<i64> {
        ids(forest, forest.reports(forest.roots()[root]))
    }

    #[test]
    fn test_single_manager_single_report() {
        let forest = link(vec![record(1, "a@x", ""), record(2, "b@x", "a@x")]);
        assert_eq!(root_ids(&forest), vec![1]);
        assert_eq!(report_ids(&forest, 0), vec![2]);
        assert!(forest.unreachable.is_empty());
    }

    #[test]
    fn test_case_insensitive_match() {
        let forest = link(vec![record(1, "a@x.com", ""), record(2, "b@x.com", "A@X.com")]);
        assert_eq!(forest.roots().len(), 1);
        assert_eq!(report_ids(&forest, 0), vec![2]);
    }

    #[test]
    fn test_children_keep_input_order() {
        let forest = link(vec![
            record(3, "c@x", "a@x"),
            record(1, "a@x", ""),
            record(4, "d@x", "a@x"),
            record(2, "b@x", "a@x"),
        ]);
        assert_eq!(root_ids(&forest), vec![1]);
        assert_eq!(report_ids(&forest, 0), vec![3, 4, 2]);
    }

    #[test]
    fn test_unresolved_and_self_managed_are_roots() {
        let forest = link(vec![
            record(1, "a@x", "nobody@x"),
            record(2, "b@x", "B@x"),
            record(3, "c@x", ""),
            record(4, "", "a@x"),
        ]);
        assert_eq!(root_ids(&forest), vec![1, 2, 3]);
        assert_eq!(report_ids(&forest, 0), vec![4]);
    }

    #[test]
    fn test_duplicate_email_last_wins() {
        let forest = link(vec![
            record(1, "boss@x", ""),
            record(2, "boss@x", ""),
            record(3, "e@x", "boss@x"),
        ]);
        assert_eq!(forest.duplicate_emails, 1);
        assert_eq!(root_ids(&forest), vec![1, 2]);
        assert!(report_ids(&forest, 0).is_empty());
        assert_eq!(report_ids(&forest, 1), vec![3]);
    }

    #[test]
    fn test_duplicate_email_can_attach_to_twin() {
        // Record 1 names itself as manager, but the index points at record 2.
        let forest = link(vec![record(1, "a@x", "a@x"), record(2, "a@x", "")]);
        assert_eq!(root_ids(&forest), vec![2]);
        assert_eq!(report_ids(&forest, 0), vec![1]);
    }

    #[test]
    fn test_cycle_members_are_unreachable() {
        let forest = link(vec![
            record(1, "a@x", "b@x"),
            record(2, "b@x", "a@x"),
            record(3, "c@x", ""),
        ]);
        assert_eq!(root_ids(&forest), vec![3]);
        let lost: Vec<i64> = forest.unreachable.iter().map(|r| r.id).collect();
        assert_eq!(lost, vec![1, 2]);
        assert_eq!(forest.len(), 1);
    }

    #[test]
    fn test_every_record_placed_once() {
        let records: Vec<Record> = (0..50)
            .map(|i| {
                let manager = if i == 0 { String::new() } else { format!("p{}@x", i / 3) };
                record(i, &format!("p{}@x", i), &manager)
            })
            .collect();
        let forest = link(records);
        assert_eq!(forest.roots().len(), 1);
        assert_eq!(forest.descendants(forest.roots()[0]).count(), 50);
        let manager = forest.reports(forest.roots()[0]).next().unwrap();
        assert_eq!(forest.manager(manager), Some(forest.roots()[0]));
    }

    #[test]
    fn test_long_chain_on_small_stack() {
        let handle = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(|| {
                let records: Vec<Record> = (0..20_000)
                    .map(|i| {
                        let manager = match i {
                            0 => String::new(),
                            _ => format!("p{}@x", i - 1),
                        };
                        record(i, &format!("p{}@x", i), &manager)
                    })
                    .collect();
                let forest = link(records);
                let depth = forest.descendants(forest.roots()[0]).count();
                (forest.roots().len(), depth)
            })
            .unwrap();
        assert_eq!(handle.join().unwrap(), (1, 20_000));
    }

    #[test]
    fn test_empty_input() {
        let forest = link(Vec::new());
        assert!(forest.is_empty());
        assert!(forest.roots().is_empty());
        assert!(forest.unreachable.is_empty());
    }
}
