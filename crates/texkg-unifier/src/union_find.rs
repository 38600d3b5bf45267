//! Arena union-find over string ids

use std::collections::HashMap;

/// Disjoint sets of node ids
///
/// Ids are interned into dense handles on first sight, so handle order is
/// first-seen order. `find` uses path halving and `union` unions by rank.
#[derive(Debug, Default)]
pub(crate) struct IdArena {
    ids: Vec<String>,
    index: HashMap<String, usize>,
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl IdArena {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Handle for `id`, interning it as a singleton set when unseen
    pub(crate) fn intern(&mut self, id: &str) -> usize {
        if let Some(&h) = self.index.get(id) {
            return h;
        }
        let h = self.ids.len();
        self.ids.push(id.to_string());
        self.index.insert(id.to_string(), h);
        self.parent.push(h);
        self.rank.push(0);
        h
    }

    pub(crate) fn get(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub(crate) fn id(&self, handle: usize) -> &str {
        &self.ids[handle]
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }

    pub(crate) fn find(&mut self, mut h: usize) -> usize {
        while self.parent[h] != h {
            self.parent[h] = self.parent[self.parent[h]];
            h = self.parent[h];
        }
        h
    }

    /// Merge the sets of `a` and `b`; returns whether they were distinct
    pub(crate) fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
        true
    }

    /// Members of every set, each in first-seen order, sets ordered by
    /// their first member
    pub(crate) fn classes(&mut self) -> Vec<Vec<usize>> {
        let mut slot: HashMap<usize, usize> = HashMap::new();
        let mut classes: Vec<Vec<usize>> = Vec::new();
        for h in 0..self.len() {
            let root = self.find(h);
            let i = *slot.entry(root).or_insert_with(|| {
                classes.push(Vec::new());
                classes.len() - 1
            });
            classes[i].push(h);
        }
        classes
    }
}
