//! Recursion guard for re-entrant event chains.
//!
//! Actions may raise new events while a dispatch is still running, and those
//! events may match the very event node that started the chain. The
//! [`ExecutionHistory`] records every `(graph, event node)` pair the envelope
//! has dispatched during one top-level `process` call, and
//! [`exceeds_threshold`] tells the envelope when a pair has repeated often
//! enough to stop.
//!
//! Entries are never evicted while the call is running. A history that has
//! reached its capacity refuses every further dispatch, so a cycle through
//! many event nodes is bounded even when each pair stays below the
//! threshold.

/// Default maximum number of dispatches recorded in one history.
pub const DEFAULT_HISTORY_CAPACITY: usize = 256;

/// One dispatched `(graph, event node)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HistoryEntry {
    /// Graph identifier.
    pub graph_id: String,
    /// Event node identifier within the graph.
    pub event_node_id: String,
}

impl HistoryEntry {
    fn is(&self, graph_id: &str, event_node_id: &str) -> bool {
        self.graph_id == graph_id && self.event_node_id == event_node_id
    }
}

/// Bounded, append-only log of dispatched pairs.
#[derive(Debug, Clone)]
pub struct ExecutionHistory {
    entries: Vec<HistoryEntry>,
    capacity: usize,
}

impl Default for ExecutionHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl ExecutionHistory {
    /// Creates a history with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a history holding at most `capacity` entries.
    ///
    /// A capacity of zero is raised to one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Vec::with_capacity(capacity.min(DEFAULT_HISTORY_CAPACITY)),
            capacity,
        }
    }

    /// Appends a pair. Returns `false` and records nothing when the history
    /// is full.
    pub fn push(&mut self, graph_id: &str, event_node_id: &str) -> bool {
        if self.is_full() {
            return false;
        }
        self.entries.push(HistoryEntry {
            graph_id: graph_id.to_owned(),
            event_node_id: event_node_id.to_owned(),
        });
        true
    }

    /// Counts the entries equal to the given pair.
    #[must_use]
    pub fn occurrences(&self, graph_id: &str, event_node_id: &str) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.is(graph_id, event_node_id))
            .count()
    }

    /// Iterates over the entries, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Returns the number of recorded entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been dispatched yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the maximum number of entries recorded.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns true once `capacity` dispatches have been recorded.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }
}

/// Returns true if the pair already occurs `limit` or more times in
/// `history`, or if `history` is full.
///
/// A `limit` of zero blocks every dispatch.
#[must_use]
pub fn exceeds_threshold(
    graph_id: &str,
    event_node_id: &str,
    history: &ExecutionHistory,
    limit: usize,
) -> bool {
    history.is_full() || history.occurrences(graph_id, event_node_id) >= limit
}
