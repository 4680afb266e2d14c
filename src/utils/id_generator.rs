//! Prefix-counter identifier allocation, grounded on
//! `weavegraph::utils::message_id_helpers`'s documented
//! `MessageIdGenerator`/`ToolCallIdGenerator` design — generalized from a
//! single hardcoded prefix to any `PREFIX-INT` artifact kind.

use rustc_hash::FxHashMap;

use crate::types::ArtifactId;

/// Allocates the next `PREFIX-INT` identifier per prefix, starting at 1.
/// Not `Sync` on its own; callers guard it the same way the Component
/// Registry guards its maps (a single `parking_lot::Mutex` around the
/// generator held by the coordinator).
#[derive(Debug, Default)]
pub struct IdGenerator {
    counters: FxHashMap<String, u32>,
}

impl IdGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self, prefix: &str) -> ArtifactId {
        let counter = self.counters.entry(prefix.to_string()).or_insert(0);
        *counter += 1;
        ArtifactId::new(prefix, *counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_sequential_ids_per_prefix() {
        let mut r#gen = IdGenerator::new();
        assert_eq!(r#gen.next("L").to_string(), "L-1");
        assert_eq!(r#gen.next("L").to_string(), "L-2");
        assert_eq!(r#gen.next("H").to_string(), "H-1");
    }
}
