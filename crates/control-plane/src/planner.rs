//! Multi-target shortest-path planner with a time-bounded cache
//!
//! Runs Dijkstra over the live, active-only graph, treating any member of
//! the sink set as an acceptable terminal. The search stops at the first
//! popped terminal, which is correct because Dijkstra pops nodes in
//! nondecreasing distance order. Ties break by insertion order into the
//! priority queue, so results are deterministic for a given topology.
//!
//! Results are cached per (start, sink signature, intent, priority class)
//! and reused until the TTL elapses. Any topology or intent mutation clears
//! the whole cache rather than selectively invalidating; at this graph size
//! the recompute cost is noise and the simplicity is worth it.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::time::{Duration, Instant};

use crate::cost;
use crate::topology::TopologyStore;
use crate::types::{Intent, LinkId, PriorityClass, SwitchId};

/// Default lifetime of a cached path
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5);

/// A computed path from a start switch to one sink switch
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedPath {
    /// Switch hops, start first, sink last
    pub hops: Vec<SwitchId>,
    /// Sum of edge weights along the hops
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    start: SwitchId,
    sink_signature: String,
    intent: Intent,
    priority: PriorityClass,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    path: PlannedPath,
    computed_at: Instant,
}

/// Queue entry ordered by cost, then by insertion sequence for stable ties
#[derive(Debug)]
struct QueueEntry {
    cost: f64,
    seq: u64,
    node: SwitchId,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cost.total_cmp(&other.cost) == Ordering::Equal && self.seq == other.seq
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost
            .total_cmp(&other.cost)
            .then(self.seq.cmp(&other.seq))
    }
}

/// Shortest-path planner with TTL-bounded memoization
#[derive(Debug)]
pub struct PathPlanner {
    cache: HashMap<CacheKey, CacheEntry>,
    ttl: Duration,
}

impl Default for PathPlanner {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl PathPlanner {
    /// Create a planner with the given cache TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: HashMap::new(),
            ttl,
        }
    }

    /// Cheapest path from `start` to any switch in `sinks`, or `None` if no
    /// sink is reachable in the filtered graph. A `None` is a normal
    /// negative result, not an error.
    ///
    /// `congestion` maps link id to the number of committed routes already
    /// traversing it.
    pub fn shortest_path(
        &mut self,
        store: &TopologyStore,
        start: &str,
        sinks: &[SwitchId],
        intent: Intent,
        priority: PriorityClass,
        congestion: &HashMap<LinkId, usize>,
    ) -> Option<PlannedPath> {
        let key = CacheKey {
            start: start.to_string(),
            sink_signature: sink_signature(sinks),
            intent,
            priority,
        };

        if let Some(entry) = self.cache.get(&key) {
            if entry.computed_at.elapsed() < self.ttl {
                return Some(entry.path.clone());
            }
        }

        let path = dijkstra(store, start, sinks, intent, congestion)?;
        self.cache.insert(
            key,
            CacheEntry {
                path: path.clone(),
                computed_at: Instant::now(),
            },
        );
        Some(path)
    }

    /// Drop every cached path. Called on any route-affecting mutation.
    pub fn invalidate(&mut self) {
        self.cache.clear();
    }

    /// Number of live cache entries (for tests and stats)
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }
}

/// Canonical signature for a sink set, independent of ordering
fn sink_signature(sinks: &[SwitchId]) -> String {
    let mut sorted: Vec<&str> = sinks.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.join("+")
}

fn dijkstra(
    store: &TopologyStore,
    start: &str,
    sinks: &[SwitchId],
    intent: Intent,
    congestion: &HashMap<LinkId, usize>,
) -> Option<PlannedPath> {
    let sink_set: HashSet<&str> = sinks.iter().map(String::as_str).collect();
    if sink_set.is_empty() {
        return None;
    }
    store.switch(start)?;

    // Adjacency over usable links only, built in sorted link-id order so
    // queue insertion order (and therefore tie-breaking) is deterministic.
    let mut adjacency: HashMap<&str, Vec<(&str, f64)>> = HashMap::new();
    let mut links: Vec<_> = store.links().collect();
    links.sort_by(|a, b| a.id.cmp(&b.id));
    for link in links {
        if !store.is_link_usable(link) {
            continue;
        }
        let (Some(source), Some(target)) = (store.switch(&link.source), store.switch(&link.target))
        else {
            continue;
        };
        let routes_on_link = congestion.get(&link.id).copied().unwrap_or(0);
        let weight = cost::edge_weight(link, source, target, intent, routes_on_link);
        adjacency
            .entry(link.source.as_str())
            .or_default()
            .push((link.target.as_str(), weight));
        adjacency
            .entry(link.target.as_str())
            .or_default()
            .push((link.source.as_str(), weight));
    }

    let mut dist: HashMap<&str, f64> = HashMap::new();
    let mut prev: HashMap<&str, &str> = HashMap::new();
    let mut visited: HashSet<&str> = HashSet::new();
    let mut heap: BinaryHeap<Reverse<QueueEntry>> = BinaryHeap::new();
    let mut seq = 0u64;

    dist.insert(start, 0.0);
    heap.push(Reverse(QueueEntry {
        cost: 0.0,
        seq,
        node: start.to_string(),
    }));

    while let Some(Reverse(entry)) = heap.pop() {
        // Borrow the store's canonical id string so the bookkeeping maps
        // outlive this queue entry.
        let node: &str = store.switch(&entry.node)?.id.as_str();
        if !visited.insert(node) {
            continue;
        }
        if sink_set.contains(node) {
            // First popped terminal is the cheapest one
            let mut hops = vec![node.to_string()];
            let mut cursor = node;
            while let Some(&parent) = prev.get(cursor) {
                hops.push(parent.to_string());
                cursor = parent;
            }
            hops.reverse();
            return Some(PlannedPath {
                hops,
                cost: entry.cost,
            });
        }

        for &(neighbor, weight) in adjacency.get(node).into_iter().flatten() {
            if visited.contains(neighbor) {
                continue;
            }
            let candidate = entry.cost + weight;
            if candidate < dist.get(neighbor).copied().unwrap_or(f64::INFINITY) {
                dist.insert(neighbor, candidate);
                prev.insert(neighbor, node);
                seq += 1;
                heap.push(Reverse(QueueEntry {
                    cost: candidate,
                    seq,
                    node: neighbor.to_string(),
                }));
            }
        }
    }

    None
}
