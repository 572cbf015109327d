//! LRU Tracker Module
//!
//! Implements Least Recently Used tracking for cache eviction.
//!
//! Nodes live in an arena (`Vec`) and are threaded into an intrusive
//! doubly-linked list by index, with a key index for O(1) lookup. Touch,
//! remove and pop are all O(1).

use std::collections::HashMap;

use bytes::Bytes;

/// Sentinel index for "no node".
const NIL: usize = usize::MAX;

#[derive(Debug)]
struct Node {
    key: Bytes,
    prev: usize,
    next: usize,
}

// == LRU Tracker ==
/// Tracks access order for LRU eviction strategy.
///
/// - Head = Most recently used
/// - Tail = Least recently used
#[derive(Debug)]
pub struct LruTracker {
    /// Arena of list nodes, indexed by slot
    nodes: Vec<Node>,
    /// Vacant arena slots available for reuse
    free: Vec<usize>,
    /// Key to arena slot
    index: HashMap<Bytes, usize>,
    head: usize,
    tail: usize,
}

impl Default for LruTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl LruTracker {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            index: HashMap::new(),
            head: NIL,
            tail: NIL,
        }
    }

    // == Touch ==
    /// Marks a key as most recently used.
    ///
    /// Existing keys are moved to the head, new keys are inserted there.
    pub fn touch(&mut self, key: &Bytes) {
        if let Some(&slot) = self.index.get(key) {
            if self.head != slot {
                self.unlink(slot);
                self.push_front(slot);
            }
            return;
        }

        let slot = self.alloc(key.clone());
        self.index.insert(key.clone(), slot);
        self.push_front(slot);
    }

    // == Remove ==
    /// Removes a key from the tracker. Returns false if it was not tracked.
    pub fn remove(&mut self, key: &[u8]) -> bool {
        match self.index.remove(key) {
            Some(slot) => {
                self.unlink(slot);
                self.release(slot);
                true
            }
            None => false,
        }
    }

    // == Pop LRU ==
    /// Returns and removes the least recently used key.
    pub fn pop_lru(&mut self) -> Option<Bytes> {
        if self.tail == NIL {
            return None;
        }

        let slot = self.tail;
        self.unlink(slot);
        let key = std::mem::take(&mut self.nodes[slot].key);
        self.index.remove(&key);
        self.free.push(slot);
        Some(key)
    }

    // == Peek LRU ==
    /// Returns the least recently used key without removing it.
    pub fn peek_lru(&self) -> Option<&Bytes> {
        (self.tail != NIL).then(|| &self.nodes[self.tail].key)
    }

    // == Iterate ==
    /// Iterates keys from least to most recently used.
    pub fn iter_lru(&self) -> LruIter<'_> {
        LruIter {
            tracker: self,
            cursor: self.tail,
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.index.contains_key(key)
    }

    // == List Plumbing ==
    fn alloc(&mut self, key: Bytes) -> usize {
        let node = Node {
            key,
            prev: NIL,
            next: NIL,
        };

        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = node;
                slot
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn release(&mut self, slot: usize) {
        // drop the key's reference count now rather than on slot reuse
        self.nodes[slot].key = Bytes::new();
        self.free.push(slot);
    }

    fn unlink(&mut self, slot: usize) {
        let (prev, next) = {
            let node = &self.nodes[slot];
            (node.prev, node.next)
        };

        if prev != NIL {
            self.nodes[prev].next = next;
        } else {
            self.head = next;
        }

        if next != NIL {
            self.nodes[next].prev = prev;
        } else {
            self.tail = prev;
        }

        let node = &mut self.nodes[slot];
        node.prev = NIL;
        node.next = NIL;
    }

    fn push_front(&mut self, slot: usize) {
        self.nodes[slot].prev = NIL;
        self.nodes[slot].next = self.head;

        if self.head != NIL {
            self.nodes[self.head].prev = slot;
        } else {
            self.tail = slot;
        }

        self.head = slot;
    }
}

// == Iterator ==
/// Walks the tracker from the least recently used end.
pub struct LruIter<'a> {
    tracker: &'a LruTracker,
    cursor: usize,
}

impl<'a> Iterator for LruIter<'a> {
    type Item = &'a Bytes;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NIL {
            return None;
        }

        let node = &self.tracker.nodes[self.cursor];
        self.cursor = node.prev;
        Some(&node.key)
    }
}
