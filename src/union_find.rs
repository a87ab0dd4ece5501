use std::collections::BTreeMap;

/// Union-Find (Disjoint Sets) over genome-support classes
///
/// Absorption is directed: the absorbing class always stays the root, so the
/// root of every set is the class whose support the merged clique keeps.
pub struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    /// Create a new UnionFind with n elements
    pub fn new(n: usize) -> Self {
        let parent = (0..n).collect();
        UnionFind { parent }
    }

    /// Find the root of element x with path compression
    pub fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    /// Merge the set of `child` into the set of `parent`; parent's root stays root
    pub fn absorb(&mut self, child: usize, parent: usize) {
        let root_child = self.find(child);
        let root_parent = self.find(parent);

        if root_child != root_parent {
            self.parent[root_child] = root_parent;
        }
    }

    pub fn is_root(&mut self, x: usize) -> bool {
        self.find(x) == x
    }

    /// All sets keyed by root, members ascending
    pub fn get_sets(&mut self) -> BTreeMap<usize, Vec<usize>> {
        let n = self.parent.len();
        let mut root_to_group: BTreeMap<usize, Vec<usize>> = BTreeMap::new();

        for i in 0..n {
            let root = self.find(i);
            root_to_group.entry(root).or_default().push(i);
        }

        root_to_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absorb_keeps_parent_root() {
        let mut uf = UnionFind::new(5);
        uf.absorb(3, 1);
        uf.absorb(4, 3);

        assert!(uf.is_root(1));
        assert!(!uf.is_root(3));
        assert_eq!(uf.find(4), 1);
        assert_eq!(uf.find(0), 0);

        let sets = uf.get_sets();
        assert_eq!(sets.len(), 3);
        assert_eq!(sets[&1], vec![1, 3, 4]);
        assert_eq!(sets[&0], vec![0]);
        assert_eq!(sets[&2], vec![2]);
    }

    #[test]
    fn test_absorb_same_set_is_noop() {
        let mut uf = UnionFind::new(2);
        uf.absorb(1, 0);
        uf.absorb(0, 1);
        assert!(uf.is_root(0));
        assert_eq!(uf.get_sets().len(), 1);
    }
}
