// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::Connection;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

/// Parent-pointer view of the `categories` table.
#[derive(Debug, Clone, Default)]
pub struct CategoryTree {
    parents: HashMap<i64, Option<i64>>,
    children: HashMap<i64, Vec<i64>>,
}

impl CategoryTree {
    pub fn from_edges(edges: impl IntoIterator<Item = (i64, Option<i64>)>) -> Self {
        let mut tree = CategoryTree::default();
        for (id, parent) in edges {
            tree.parents.insert(id, parent);
            if let Some(p) = parent {
                tree.children.entry(p).or_default().push(id);
            }
        }
        for kids in tree.children.values_mut() {
            kids.sort_unstable();
        }
        tree
    }

    pub fn load(conn: &Connection) -> rusqlite::Result<Self> {
        let mut stmt = conn.prepare_cached("SELECT id, parent_id FROM categories")?;
        let rows = stmt.query_map([], |r| Ok((r.get::<_, i64>(0)?, r.get::<_, Option<i64>>(1)?)))?;
        let mut edges = Vec::new();
        for row in rows {
            edges.push(row?);
        }
        Ok(CategoryTree::from_edges(edges))
    }

    pub fn contains(&self, id: i64) -> bool {
        self.parents.contains_key(&id)
    }

    pub fn parent(&self, id: i64) -> Option<i64> {
        self.parents.get(&id).copied().flatten()
    }

    /// `root` followed by all of its transitive descendants, breadth first.
    /// Unknown ids have no children. Cyclic parent pointers are visited once.
    pub fn expand(&self, root: i64) -> Vec<i64> {
        let mut out = vec![root];
        let mut seen = HashSet::from([root]);
        let mut queue = VecDeque::from([root]);
        let mut cycle_logged = false;
        while let Some(id) = queue.pop_front() {
            for &child in self.children.get(&id).map(Vec::as_slice).unwrap_or_default() {
                if seen.insert(child) {
                    out.push(child);
                    queue.push_back(child);
                } else if !cycle_logged {
                    tracing::warn!(root, category = child, "cycle in category parents");
                    cycle_logged = true;
                }
            }
        }
        out
    }

    /// Whether giving `id` the parent `new_parent` would close a loop.
    pub fn would_cycle(&self, id: i64, new_parent: i64) -> bool {
        new_parent == id || self.expand(id).contains(&new_parent)
    }

    /// Ids whose parent chain leads back to themselves.
    pub fn cycles(&self) -> BTreeSet<i64> {
        let mut on_cycle = BTreeSet::new();
        for &start in self.parents.keys() {
            let mut seen = HashSet::new();
            let mut cur = self.parent(start);
            while let Some(id) = cur {
                if id == start {
                    on_cycle.insert(start);
                    break;
                }
                if !seen.insert(id) {
                    break;
                }
                cur = self.parent(id);
            }
        }
        on_cycle
    }

    /// Ancestors first, ending with `id`; stops if the chain loops.
    pub fn lineage(&self, id: i64) -> Vec<i64> {
        let mut chain = vec![id];
        let mut seen = HashSet::from([id]);
        let mut cur = self.parent(id);
        while let Some(p) = cur {
            if !seen.insert(p) {
                break;
            }
            chain.push(p);
            cur = self.parent(p);
        }
        chain.reverse();
        chain
    }
}

/// Category ids a category filter should match. No filter, no ids.
pub fn resolve_category_filter(
    conn: &Connection,
    category: Option<i64>,
) -> rusqlite::Result<Vec<i64>> {
    match category {
        None => Ok(Vec::new()),
        Some(root) => Ok(CategoryTree::load(conn)?.expand(root)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut v: Vec<i64>) -> Vec<i64> {
        v.sort_unstable();
        v
    }

    #[test]
    fn expansion_is_reflexive_and_transitive() {
        // 1 <- 2 <- 3, 1 <- 4, 5 standalone
        let tree = CategoryTree::from_edges([(1, None), (2, Some(1)), (3, Some(2)), (4, Some(1)), (5, None)]);
        assert_eq!(sorted(tree.expand(1)), vec![1, 2, 3, 4]);
        assert_eq!(sorted(tree.expand(2)), vec![2, 3]);
        assert_eq!(tree.expand(5), vec![5]);
    }

    #[test]
    fn unknown_id_has_no_children() {
        let tree = CategoryTree::from_edges([(1, None)]);
        assert_eq!(tree.expand(42), vec![42]);
    }

    #[test]
    fn cyclic_parents_terminate() {
        let tree = CategoryTree::from_edges([(1, Some(3)), (2, Some(1)), (3, Some(2)), (4, Some(3))]);
        assert_eq!(sorted(tree.expand(1)), vec![1, 2, 3, 4]);
        assert_eq!(tree.cycles().into_iter().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(tree.lineage(4).len(), 4);
    }

    #[test]
    fn would_cycle_detects_descendant_parent() {
        let tree = CategoryTree::from_edges([(1, None), (2, Some(1)), (3, Some(2))]);
        assert!(tree.would_cycle(1, 3));
        assert!(tree.would_cycle(2, 2));
        assert!(!tree.would_cycle(3, 1));
    }

    #[test]
    fn lineage_lists_ancestors_first() {
        let tree = CategoryTree::from_edges([(1, None), (2, Some(1)), (3, Some(2))]);
        assert_eq!(tree.lineage(3), vec![1, 2, 3]);
    }

    #[test]
    fn resolves_from_database() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE categories(id INTEGER PRIMARY KEY, name TEXT NOT NULL, parent_id INTEGER);
            INSERT INTO categories(id, name, parent_id) VALUES (1, 'Renda Fixa', NULL);
            INSERT INTO categories(id, name, parent_id) VALUES (2, 'CDB', 1);
            INSERT INTO categories(id, name, parent_id) VALUES (3, 'CDB Pos', 2);
            "#,
        )
        .unwrap();
        assert!(resolve_category_filter(&conn, None).unwrap().is_empty());
        assert_eq!(sorted(resolve_category_filter(&conn, Some(1)).unwrap()), vec![1, 2, 3]);
    }
}
