//! The node store and edge builder.
//!
//! [`RrGraph`] owns the flat array of all routing-resource nodes. It is
//! pre-sized once from the device layout ([`RrGraph::allocate`]) and never
//! grows afterwards; topology construction fills the pre-allocated slots
//! and appends edges through [`RrGraph::add_edge`] and
//! [`RrGraph::add_edges`].

use crate::error::RrgError;
use crate::ids::RrNodeId;
use crate::node::RrNode;
use serde::{Deserialize, Serialize};
use tessera_arch::SwitchId;

/// The flat store of all routing-resource nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RrGraph {
    nodes: Vec<RrNode>,
}

impl RrGraph {
    /// Allocates `n` sentinel-initialized nodes.
    ///
    /// Callers must pre-size the store from a deterministic node-count
    /// formula; there is no way to grow the store afterwards.
    pub fn allocate(n: usize) -> Self {
        Self {
            nodes: vec![RrNode::unset(); n],
        }
    }

    /// Returns the number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether the store holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the node with the given ID.
    pub fn node(&self, id: RrNodeId) -> &RrNode {
        &self.nodes[id.as_raw() as usize]
    }

    /// Returns a mutable reference to the node with the given ID.
    pub fn node_mut(&mut self, id: RrNodeId) -> &mut RrNode {
        &mut self.nodes[id.as_raw() as usize]
    }

    /// Returns the nodes as a slice.
    pub fn nodes(&self) -> &[RrNode] {
        &self.nodes
    }

    /// Returns an iterator over `(id, node)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (RrNodeId, &RrNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (RrNodeId::from_raw(i as u32), n))
    }

    fn check_id(&self, id: RrNodeId) -> Result<(), RrgError> {
        if (id.as_raw() as usize) < self.nodes.len() {
            Ok(())
        } else {
            Err(RrgError::InvalidNodeIndex {
                index: id.as_raw(),
                num_nodes: self.nodes.len(),
            })
        }
    }

    /// Adds one edge from `src` to `dst` through `switch`.
    ///
    /// Appends to the source's edge and switch lists and increments the
    /// destination's fan-in. No redundancy check is performed; use
    /// [`RrGraph::add_edges`] when the same connection may be derived more
    /// than once.
    pub fn add_edge(
        &mut self,
        src: RrNodeId,
        dst: RrNodeId,
        switch: SwitchId,
    ) -> Result<(), RrgError> {
        self.check_id(src)?;
        self.check_id(dst)?;
        let src_node = self.node_mut(src);
        src_node.edges.push(dst);
        src_node.switches.push(switch);
        self.node_mut(dst).fan_in += 1;
        Ok(())
    }

    /// Adds a batch of edges from `src`, skipping destinations already
    /// present in the source's edge list.
    ///
    /// The destination and switch lists must have equal length. The
    /// search-then-append dedup makes repeated calls with overlapping
    /// destination lists idempotent with respect to which edges exist, so
    /// switch-block construction may re-derive the same connection from
    /// several sides without double-counting fan-in.
    pub fn add_edges(
        &mut self,
        src: RrNodeId,
        dsts: &[RrNodeId],
        switches: &[SwitchId],
    ) -> Result<(), RrgError> {
        self.check_id(src)?;
        if dsts.len() != switches.len() {
            return Err(RrgError::EdgeListMismatch {
                dsts: dsts.len(),
                switches: switches.len(),
            });
        }

        // Filter against the existing edge list before appending anything,
        // so redundancy is judged against the state at call entry.
        let mut dsts_to_add = Vec::new();
        let mut switches_to_add = Vec::new();
        {
            let src_node = self.node(src);
            for (&dst, &switch) in dsts.iter().zip(switches.iter()) {
                if src_node.edges.contains(&dst) {
                    continue;
                }
                dsts_to_add.push(dst);
                switches_to_add.push(switch);
            }
        }

        for &dst in &dsts_to_add {
            self.check_id(dst)?;
        }

        let src_node = self.node_mut(src);
        src_node.edges.extend_from_slice(&dsts_to_add);
        src_node.switches.extend_from_slice(&switches_to_add);
        for &dst in &dsts_to_add {
            self.node_mut(dst).fan_in += 1;
        }
        Ok(())
    }

    /// Returns the total number of edges in the graph.
    pub fn num_edges(&self) -> usize {
        self.nodes.iter().map(|n| n.edges.len()).sum()
    }

    /// Verifies that every node's stored fan-in matches a recount over all
    /// edge lists.
    pub fn verify_fan_in(&self) -> Result<(), RrgError> {
        let mut recomputed = vec![0u32; self.nodes.len()];
        for node in &self.nodes {
            for &dst in &node.edges {
                recomputed[dst.as_raw() as usize] += 1;
            }
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if node.fan_in != recomputed[i] {
                return Err(RrgError::FanInMismatch {
                    node: RrNodeId::from_raw(i as u32),
                    stored: node.fan_in,
                    recomputed: recomputed[i],
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sw(raw: u32) -> SwitchId {
        SwitchId::from_raw(raw)
    }

    fn id(raw: u32) -> RrNodeId {
        RrNodeId::from_raw(raw)
    }

    #[test]
    fn allocate_sentinel_nodes() {
        let g = RrGraph::allocate(4);
        assert_eq!(g.len(), 4);
        for (_, n) in g.iter() {
            assert_eq!(n.ty, None);
            assert_eq!(n.num_edges(), 0);
        }
    }

    #[test]
    fn add_edge_updates_both_sides() {
        let mut g = RrGraph::allocate(3);
        g.add_edge(id(0), id(1), sw(7)).unwrap();
        assert_eq!(g.node(id(0)).edges, vec![id(1)]);
        assert_eq!(g.node(id(0)).switches, vec![sw(7)]);
        assert_eq!(g.node(id(1)).fan_in, 1);
        assert_eq!(g.node(id(0)).fan_in, 0);
    }

    #[test]
    fn add_edge_rejects_bad_src() {
        let mut g = RrGraph::allocate(2);
        let err = g.add_edge(id(5), id(0), sw(0)).unwrap_err();
        assert!(matches!(
            err,
            RrgError::InvalidNodeIndex {
                index: 5,
                num_nodes: 2
            }
        ));
    }

    #[test]
    fn add_edge_rejects_bad_dst() {
        let mut g = RrGraph::allocate(2);
        let err = g.add_edge(id(0), id(9), sw(0)).unwrap_err();
        assert!(matches!(err, RrgError::InvalidNodeIndex { index: 9, .. }));
    }

    #[test]
    fn add_edge_allows_parallel_edges() {
        // The singular form performs no dedup.
        let mut g = RrGraph::allocate(2);
        g.add_edge(id(0), id(1), sw(0)).unwrap();
        g.add_edge(id(0), id(1), sw(0)).unwrap();
        assert_eq!(g.node(id(0)).num_edges(), 2);
        assert_eq!(g.node(id(1)).fan_in, 2);
    }

    #[test]
    fn add_edges_batch() {
        let mut g = RrGraph::allocate(4);
        g.add_edges(id(0), &[id(1), id(2), id(3)], &[sw(0), sw(1), sw(2)])
            .unwrap();
        assert_eq!(g.node(id(0)).edges, vec![id(1), id(2), id(3)]);
        assert_eq!(g.node(id(0)).switches, vec![sw(0), sw(1), sw(2)]);
        for i in 1..4 {
            assert_eq!(g.node(id(i)).fan_in, 1);
        }
    }

    #[test]
    fn add_edges_length_mismatch() {
        let mut g = RrGraph::allocate(3);
        let err = g
            .add_edges(id(0), &[id(1), id(2)], &[sw(0)])
            .unwrap_err();
        assert!(matches!(
            err,
            RrgError::EdgeListMismatch {
                dsts: 2,
                switches: 1
            }
        ));
    }

    #[test]
    fn add_edges_dedups_against_existing() {
        let mut g = RrGraph::allocate(4);
        g.add_edges(id(0), &[id(1), id(2)], &[sw(0), sw(0)]).unwrap();
        // Overlapping second call: only the new destination lands.
        g.add_edges(id(0), &[id(2), id(3)], &[sw(0), sw(0)]).unwrap();
        assert_eq!(g.node(id(0)).edges, vec![id(1), id(2), id(3)]);
        assert_eq!(g.node(id(2)).fan_in, 1);
        assert_eq!(g.node(id(3)).fan_in, 1);
    }

    #[test]
    fn add_edges_idempotent_union() {
        // Two overlapping calls end up equal to one call with the union.
        let mut a = RrGraph::allocate(5);
        a.add_edges(id(0), &[id(1), id(2), id(3)], &[sw(0); 3]).unwrap();
        a.add_edges(id(0), &[id(2), id(3), id(4)], &[sw(0); 3]).unwrap();

        let mut b = RrGraph::allocate(5);
        b.add_edges(id(0), &[id(1), id(2), id(3), id(4)], &[sw(0); 4])
            .unwrap();

        assert_eq!(a.node(id(0)).edges, b.node(id(0)).edges);
        for i in 1..5 {
            assert_eq!(a.node(id(i)).fan_in, b.node(id(i)).fan_in);
        }
    }

    #[test]
    fn add_edges_rejects_bad_dst_in_batch() {
        let mut g = RrGraph::allocate(2);
        let err = g.add_edges(id(0), &[id(1), id(7)], &[sw(0), sw(0)]).unwrap_err();
        assert!(matches!(err, RrgError::InvalidNodeIndex { index: 7, .. }));
    }

    #[test]
    fn verify_fan_in_passes_on_consistent_graph() {
        let mut g = RrGraph::allocate(3);
        g.add_edge(id(0), id(1), sw(0)).unwrap();
        g.add_edge(id(2), id(1), sw(0)).unwrap();
        g.verify_fan_in().unwrap();
    }

    #[test]
    fn verify_fan_in_detects_corruption() {
        let mut g = RrGraph::allocate(2);
        g.add_edge(id(0), id(1), sw(0)).unwrap();
        g.node_mut(id(1)).fan_in = 5;
        let err = g.verify_fan_in().unwrap_err();
        assert!(matches!(
            err,
            RrgError::FanInMismatch {
                stored: 5,
                recomputed: 1,
                ..
            }
        ));
    }

    #[test]
    fn num_edges_totals() {
        let mut g = RrGraph::allocate(3);
        g.add_edge(id(0), id(1), sw(0)).unwrap();
        g.add_edge(id(1), id(2), sw(0)).unwrap();
        assert_eq!(g.num_edges(), 2);
    }

    #[test]
    fn serde_roundtrip() {
        let mut g = RrGraph::allocate(2);
        g.add_edge(id(0), id(1), sw(3)).unwrap();
        let json = serde_json::to_string(&g).unwrap();
        let restored: RrGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(g, restored);
    }
}
