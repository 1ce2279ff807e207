//! Recency List Module
//!
//! Global most-recently-used ordering for the exact LRU policy.

/// Sentinel indices in the `nodes` arena.
const HEAD: usize = 0; // most-recently-used end
const TAIL: usize = 1; // least-recently-used end
const NULL: usize = usize::MAX;

// == Node Handle ==
/// Stable reference to a node in a [`RecencyList`].
///
/// Slots are reused after removal; the generation tells a live node apart
/// from a stale handle to a slot that has since been recycled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NodeHandle {
    index: usize,
    generation: u64,
}

struct RecencyNode<K> {
    /// `None` for the sentinels and for free slots.
    key: Option<K>,
    /// Shard that owns `key`, so eviction never rehashes.
    shard: usize,
    /// Bumped every time the slot is freed.
    generation: u64,
    /// Index toward HEAD (more recently used).
    prev: usize,
    /// Index toward TAIL (less recently used).
    next: usize,
}

impl<K> RecencyNode<K> {
    fn sentinel(prev: usize, next: usize) -> Self {
        Self {
            key: None,
            shard: 0,
            generation: 0,
            prev,
            next,
        }
    }
}

// == Recency List ==
/// Doubly-linked list of keys held in an index arena.
///
/// - Front (after HEAD) = most recently used
/// - Back (before TAIL) = least recently used
///
/// Every operation is O(1). The list is not synchronised; the exact policy
/// keeps it behind its global recency lock.
pub(crate) struct RecencyList<K> {
    /// Index 0 = HEAD sentinel, 1 = TAIL sentinel, 2+ = entries.
    nodes: Vec<RecencyNode<K>>,
    /// Indices of freed (reusable) slots.
    free_list: Vec<usize>,
    len: usize,
}

impl<K> RecencyList<K> {
    // == Constructor ==
    /// Creates an empty list with room for `capacity` entries.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let mut nodes = Vec::with_capacity(capacity.saturating_add(2));
        nodes.push(RecencyNode::sentinel(NULL, TAIL));
        nodes.push(RecencyNode::sentinel(HEAD, NULL));

        Self {
            nodes,
            free_list: Vec::new(),
            len: 0,
        }
    }

    fn link_after_head(&mut self, idx: usize) {
        let old_first = self.nodes[HEAD].next;
        self.nodes[idx].prev = HEAD;
        self.nodes[idx].next = old_first;
        self.nodes[HEAD].next = idx;
        self.nodes[old_first].prev = idx;
    }

    fn unlink(&mut self, idx: usize) {
        let prev = self.nodes[idx].prev;
        let next = self.nodes[idx].next;
        self.nodes[prev].next = next;
        self.nodes[next].prev = prev;
        self.nodes[idx].prev = NULL;
        self.nodes[idx].next = NULL;
    }

    fn release(&mut self, idx: usize) -> Option<K> {
        self.unlink(idx);
        let node = &mut self.nodes[idx];
        node.generation = node.generation.wrapping_add(1);
        let key = node.key.take();
        self.free_list.push(idx);
        self.len -= 1;
        key
    }

    // == Push Front ==
    /// Adds `key` as the most recently used entry and returns its handle.
    pub(crate) fn push_front(&mut self, key: K, shard: usize) -> NodeHandle {
        let idx = match self.free_list.pop() {
            Some(idx) => {
                let node = &mut self.nodes[idx];
                node.key = Some(key);
                node.shard = shard;
                idx
            }
            None => {
                self.nodes.push(RecencyNode {
                    key: Some(key),
                    shard,
                    generation: 0,
                    prev: NULL,
                    next: NULL,
                });
                self.nodes.len() - 1
            }
        };
        self.link_after_head(idx);
        self.len += 1;

        NodeHandle {
            index: idx,
            generation: self.nodes[idx].generation,
        }
    }

    // == Is Live ==
    /// Returns true if `handle` still refers to the node it was issued for.
    pub(crate) fn is_live(&self, handle: NodeHandle) -> bool {
        handle.index > TAIL
            && self
                .nodes
                .get(handle.index)
                .is_some_and(|n| n.key.is_some() && n.generation == handle.generation)
    }

    // == Touch ==
    /// Marks the node as most recently used.
    ///
    /// Returns false (and does nothing) for a stale handle.
    pub(crate) fn touch(&mut self, handle: NodeHandle) -> bool {
        if !self.is_live(handle) {
            return false;
        }
        self.unlink(handle.index);
        self.link_after_head(handle.index);
        true
    }

    // == Remove ==
    /// Removes the node and returns its key; `None` for a stale handle.
    pub(crate) fn remove(&mut self, handle: NodeHandle) -> Option<K> {
        if !self.is_live(handle) {
            return None;
        }
        self.release(handle.index)
    }

    // == Peek Oldest ==
    /// Returns the least recently used node without removing it.
    pub(crate) fn peek_oldest(&self) -> Option<(NodeHandle, &K, usize)> {
        let idx = self.nodes[TAIL].prev;
        if idx == HEAD {
            return None;
        }
        let node = &self.nodes[idx];
        let key = node.key.as_ref()?;
        Some((
            NodeHandle {
                index: idx,
                generation: node.generation,
            },
            key,
            node.shard,
        ))
    }

    // == Length ==
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[allow(dead_code)]
    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    // == Clear ==
    /// Drops every node. Handles issued before the call all become stale.
    pub(crate) fn clear(&mut self) {
        for idx in (TAIL + 1)..self.nodes.len() {
            let node = &mut self.nodes[idx];
            if node.key.take().is_some() {
                node.generation = node.generation.wrapping_add(1);
                node.prev = NULL;
                node.next = NULL;
                self.free_list.push(idx);
            }
        }
        self.nodes[HEAD].next = TAIL;
        self.nodes[TAIL].prev = HEAD;
        self.len = 0;
    }
}
