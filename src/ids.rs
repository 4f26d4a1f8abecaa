//! Node identifier allocation.
//!
//! Every node the editor creates is named `dndnode_<n>` with a monotonically
//! increasing counter. The counter is owned by the controller (there is no
//! hidden global) and is reconciled against every node ID the client has seen
//! — across all loaded and listed workflows, not just the open one — so that
//! no two nodes created in one session ever collide, even across
//! independently persisted workflows.
//!
//! # Examples
//!
//! ```rust
//! use weaveboard::ids::IdAllocator;
//!
//! let mut ids = IdAllocator::new();
//! assert_eq!(ids.next(), "dndnode_0");
//!
//! // A loaded workflow already uses dndnode_7; never hand that out again.
//! ids.reconcile(["dndnode_3", "dndnode_7"]);
//! assert_eq!(ids.next(), "dndnode_8");
//! ```

/// Textual prefix every allocator-issued node ID carries.
///
/// Part of the persistence contract: IDs must keep this pattern across
/// save/load round trips for reconciliation to work.
pub const NODE_ID_PREFIX: &str = "dndnode_";

/// Monotonic, collision-free node ID source.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdAllocator {
    counter: u64,
}

impl IdAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next fresh node ID and advances the counter.
    pub fn next(&mut self) -> String {
        let id = format!("{NODE_ID_PREFIX}{}", self.counter);
        self.counter += 1;
        id
    }

    /// Raises the counter above every `dndnode_<n>` suffix in `ids`.
    ///
    /// Must run whenever a workflow (or the full workflow list) is loaded,
    /// before any new node is created. Monotonic only: IDs below the current
    /// counter never lower it.
    pub fn reconcile<I>(&mut self, ids: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for id in ids {
            if let Some(n) = parse_suffix(id.as_ref())
                && n >= self.counter
            {
                self.counter = n + 1;
            }
        }
    }

    /// The counter value the next allocation will use.
    #[must_use]
    pub fn peek(&self) -> u64 {
        self.counter
    }
}

/// Parses the numeric suffix of an allocator-pattern ID.
///
/// IDs not matching `dndnode_<non-negative integer>` yield `None` and are
/// ignored by reconciliation.
#[must_use]
pub fn parse_suffix(id: &str) -> Option<u64> {
    id.strip_prefix(NODE_ID_PREFIX)?.parse().ok()
}
