use std::hash::Hash;

use ahash::AHashMap;

/// Disjoint-set forest over arbitrary identifiers.
///
/// Identifiers are registered lazily: the first `find` or `union` touching an
/// identifier makes it its own root with rank 0. `union` links by rank and
/// `find` compresses paths with a loop, so long chains never grow the stack.
/// A forest lives for a single dedup run.
#[derive(Clone, Debug)]
pub struct UnionFind<Id> {
    index: AHashMap<Id, usize>,
    ids: Vec<Id>,
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl<Id> Default for UnionFind<Id>
where
    Id: Hash + Eq + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<Id> UnionFind<Id>
where
    Id: Hash + Eq + Clone,
{
    pub fn new() -> Self {
        UnionFind {
            index: AHashMap::new(),
            ids: Vec::new(),
            parent: Vec::new(),
            rank: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        UnionFind {
            index: AHashMap::with_capacity(capacity),
            ids: Vec::with_capacity(capacity),
            parent: Vec::with_capacity(capacity),
            rank: Vec::with_capacity(capacity),
        }
    }

    /// Number of identifiers touched so far.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn slot(&mut self, id: &Id) -> usize {
        if let Some(slot) = self.index.get(id) {
            return *slot;
        }
        let slot = self.ids.len();
        self.index.insert(id.clone(), slot);
        self.ids.push(id.clone());
        self.parent.push(slot);
        self.rank.push(0);
        slot
    }

    fn find_root(&mut self, slot: usize) -> usize {
        let mut root = slot;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut current = slot;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }

    /// Returns the root identifier of the set containing `id`.
    pub fn find(&mut self, id: &Id) -> Id {
        let slot = self.slot(id);
        let root = self.find_root(slot);
        self.ids[root].clone()
    }

    /// Merges the sets of `a` and `b`. Returns false when they were already joined.
    pub fn union(&mut self, a: &Id, b: &Id) -> bool {
        let slot_a = self.slot(a);
        let slot_b = self.slot(b);
        let root_a = self.find_root(slot_a);
        let root_b = self.find_root(slot_b);
        if root_a == root_b {
            return false;
        }
        match self.rank[root_a].cmp(&self.rank[root_b]) {
            std::cmp::Ordering::Less => self.parent[root_a] = root_b,
            std::cmp::Ordering::Greater => self.parent[root_b] = root_a,
            std::cmp::Ordering::Equal => {
                self.parent[root_b] = root_a;
                self.rank[root_a] = self.rank[root_a].saturating_add(1);
            }
        }
        true
    }

    pub fn connected(&mut self, a: &Id, b: &Id) -> bool {
        self.find(a) == self.find(b)
    }

    /// Groups every touched identifier by root and returns the groups of two
    /// or more members. Members keep their first-touch order and clusters are
    /// ordered by their first member.
    pub fn extract_clusters(mut self) -> Vec<Vec<Id>> {
        let mut root_cluster: AHashMap<usize, usize> = AHashMap::new();
        let mut clusters: Vec<Vec<Id>> = Vec::new();
        for slot in 0..self.ids.len() {
            let root = self.find_root(slot);
            let cluster = *root_cluster.entry(root).or_insert_with(|| {
                clusters.push(Vec::new());
                clusters.len() - 1
            });
            clusters[cluster].push(self.ids[slot].clone());
        }
        clusters.retain(|members| members.len() >= 2);
        clusters
    }
}

#[cfg(test)]
mod tests {
    use super::UnionFind;
    use ahash::AHashSet;

    #[test]
    fn test_transitive_union() {
        let mut uf = UnionFind::new();
        uf.union(&"a", &"b");
        uf.union(&"b", &"c");
        assert_eq!(uf.find(&"a"), uf.find(&"c"));
        assert!(uf.connected(&"a", &"c"));
    }

    #[test]
    fn test_find_registers_singletons_and_is_idempotent() {
        let mut uf = UnionFind::new();
        assert_eq!(uf.find(&7u32), 7);
        assert_eq!(uf.find(&7u32), 7);
        assert_eq!(uf.len(), 1);
        uf.union(&7, &8);
        let root = uf.find(&8);
        assert_eq!(uf.find(&root), root);
        assert_eq!(uf.find(&8), root);
    }

    #[test]
    fn test_union_reports_merges() {
        let mut uf = UnionFind::new();
        assert!(uf.union(&1, &2));
        assert!(!uf.union(&2, &1));
        assert!(uf.union(&3, &2));
    }

    #[test]
    fn test_long_chain_does_not_overflow() {
        let mut uf = UnionFind::with_capacity(200_000);
        for i in 0..200_000u32 {
            uf.union(&i, &(i + 1));
        }
        assert_eq!(uf.find(&0), uf.find(&200_000));
    }

    #[test]
    fn test_clusters_partition_touched_ids() {
        let mut uf = UnionFind::new();
        uf.union(&1, &2);
        uf.union(&3, &4);
        uf.union(&4, &5);
        uf.find(&9);
        let clusters = uf.extract_clusters();
        assert_eq!(clusters, vec![vec![1, 2], vec![3, 4, 5]]);

        let mut seen = AHashSet::new();
        for member in clusters.iter().flatten() {
            assert!(seen.insert(*member));
        }
        assert!(!seen.contains(&9));
    }
}
