use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use super::{Algorithm, SearchError};

/// Pops between deadline checks.
const DEADLINE_STRIDE: u32 = 1024;

/// Node positions and edge indices of a found path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct PathIndices {
    pub nodes: Vec<usize>,
    pub edges: Vec<usize>,
}

impl PathIndices {
    pub(crate) fn single(node: usize) -> Self {
        Self {
            nodes: vec![node],
            edges: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    priority: f64,
    seq: u64,
    node: usize,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for a min-heap; earlier insertions win ties.
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-priority queue breaking ties by insertion order.
#[derive(Debug, Default)]
pub(crate) struct Frontier {
    heap: BinaryHeap<Entry>,
    next_seq: u64,
}

impl Frontier {
    pub(crate) fn push(&mut self, priority: f64, node: usize) {
        self.heap.push(Entry {
            priority,
            seq: self.next_seq,
            node,
        });
        self.next_seq += 1;
    }

    pub(crate) fn pop(&mut self) -> Option<(f64, usize)> {
        self.heap.pop().map(|e| (e.priority, e.node))
    }
}

/// Back-pointer: previous node position and the edge taken from it.
pub(crate) type CameFrom = Option<(usize, usize)>;

/// Walk back-pointers from `goal` to `start`.
pub(crate) fn reconstruct(came_from: &[CameFrom], start: usize, goal: usize) -> PathIndices {
    let mut nodes = vec![goal];
    let mut edges = Vec::new();
    let mut current = goal;
    while current != start {
        let Some((prev, edge)) = came_from[current] else {
            break;
        };
        nodes.push(prev);
        edges.push(edge);
        current = prev;
    }
    nodes.reverse();
    edges.reverse();
    PathIndices { nodes, edges }
}

/// Wall-clock budget checked every [`DEADLINE_STRIDE`] ticks.
#[derive(Debug)]
pub(crate) struct Deadline {
    algorithm: Algorithm,
    limit: Option<Duration>,
    expires: Option<Instant>,
    ticks: u32,
}

impl Deadline {
    pub(crate) fn new(algorithm: Algorithm, limit: Option<Duration>) -> Self {
        Self {
            algorithm,
            limit,
            expires: limit.and_then(|l| Instant::now().checked_add(l)),
            ticks: 0,
        }
    }

    /// Count one unit of work, failing once the budget is spent.
    pub(crate) fn tick(&mut self) -> Result<(), SearchError> {
        let due = self.ticks % DEADLINE_STRIDE == 0;
        self.ticks = self.ticks.wrapping_add(1);
        if due {
            self.check()
        } else {
            Ok(())
        }
    }

    /// Check the budget immediately.
    pub(crate) fn check(&self) -> Result<(), SearchError> {
        match (self.expires, self.limit) {
            (Some(at), Some(limit)) if Instant::now() >= at => Err(SearchError::Timeout {
                algorithm: self.algorithm,
                limit,
            }),
            _ => Ok(()),
        }
    }
}
