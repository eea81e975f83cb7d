//! Opaque ID newtypes for routing-resource-graph entities.
//!
//! [`RrNodeId`] is a thin `u32` wrapper used as an arena index into the
//! node store. It is `Copy`, `Hash`, and `Serialize`/`Deserialize`.

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Opaque, copyable ID for a node in the routing-resource graph.
    RrNodeId
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn id_roundtrip() {
        let id = RrNodeId::from_raw(42);
        assert_eq!(id.as_raw(), 42);
    }

    #[test]
    fn id_equality() {
        assert_eq!(RrNodeId::from_raw(3), RrNodeId::from_raw(3));
        assert_ne!(RrNodeId::from_raw(3), RrNodeId::from_raw(4));
    }

    #[test]
    fn id_ordering() {
        assert!(RrNodeId::from_raw(1) < RrNodeId::from_raw(2));
    }

    #[test]
    fn id_hash_in_set() {
        let mut set = HashSet::new();
        set.insert(RrNodeId::from_raw(1));
        set.insert(RrNodeId::from_raw(2));
        set.insert(RrNodeId::from_raw(1));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn id_display() {
        assert_eq!(format!("{}", RrNodeId::from_raw(9)), "9");
    }

    #[test]
    fn id_serde_roundtrip() {
        let id = RrNodeId::from_raw(55);
        let json = serde_json::to_string(&id).unwrap();
        let restored: RrNodeId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, restored);
    }
}
