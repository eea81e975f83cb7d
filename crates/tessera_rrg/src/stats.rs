//! Graph statistics.
//!
//! [`RrgStats`] summarizes a finished graph: node and edge counts by node
//! type, and the multiplexer-size distribution of the switch blocks
//! (fan-in of channel wires) and connection blocks (fan-in of input
//! pins). The summary is a plain value with a `Display` rendering, so
//! callers and tests can assert on it instead of scraping log output.

use crate::graph::RrGraph;
use crate::node::RrType;
use serde::{Deserialize, Serialize};

/// Node and edge counts for one node type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeStats {
    /// Number of nodes of the type.
    pub nodes: usize,
    /// Number of edges leaving nodes of the type.
    pub edges: usize,
}

/// Multiplexer-size distribution over one class of nodes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MuxStats {
    /// Number of multiplexers surveyed.
    pub count: usize,
    /// Smallest fan-in.
    pub min: u32,
    /// Largest fan-in.
    pub max: u32,
    /// Mean fan-in.
    pub avg: f64,
}

/// Summary statistics of a routing-resource graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RrgStats {
    /// Per-type counts, ordered as [`RrType::ALL`].
    pub per_type: Vec<TypeStats>,
    /// Total node count.
    pub total_nodes: usize,
    /// Total edge count.
    pub total_edges: usize,
    /// Switch-block multiplexer sizes (channel-wire fan-in).
    pub sb_mux: Option<MuxStats>,
    /// Connection-block multiplexer sizes (input-pin fan-in).
    pub cb_mux: Option<MuxStats>,
}

fn mux_stats(fan_ins: &[u32]) -> Option<MuxStats> {
    if fan_ins.is_empty() {
        return None;
    }
    let mut min = u32::MAX;
    let mut max = 0u32;
    let mut sum = 0u64;
    for &f in fan_ins {
        min = min.min(f);
        max = max.max(f);
        sum += u64::from(f);
    }
    Some(MuxStats {
        count: fan_ins.len(),
        min,
        max,
        avg: sum as f64 / fan_ins.len() as f64,
    })
}

impl RrgStats {
    /// Collects statistics over a finished graph.
    pub fn collect(graph: &RrGraph) -> Self {
        let mut per_type = vec![TypeStats::default(); RrType::COUNT];
        let mut sb_fan_ins = Vec::new();
        let mut cb_fan_ins = Vec::new();
        for (_, node) in graph.iter() {
            let Some(ty) = node.ty else { continue };
            per_type[ty.index()].nodes += 1;
            per_type[ty.index()].edges += node.num_edges();
            match ty {
                RrType::Chanx | RrType::Chany => sb_fan_ins.push(node.fan_in),
                RrType::Ipin => cb_fan_ins.push(node.fan_in),
                _ => {}
            }
        }
        RrgStats {
            per_type,
            total_nodes: graph.len(),
            total_edges: graph.num_edges(),
            sb_mux: mux_stats(&sb_fan_ins),
            cb_mux: mux_stats(&cb_fan_ins),
        }
    }

    /// Counts for one node type.
    pub fn of_type(&self, ty: RrType) -> TypeStats {
        self.per_type[ty.index()]
    }
}

impl std::fmt::Display for RrgStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "routing-resource graph statistics:")?;
        writeln!(f, "  {:<8} {:>10} {:>10}", "type", "nodes", "edges")?;
        for ty in RrType::ALL {
            let t = self.of_type(ty);
            writeln!(f, "  {:<8} {:>10} {:>10}", ty.name(), t.nodes, t.edges)?;
        }
        writeln!(
            f,
            "  {:<8} {:>10} {:>10}",
            "total", self.total_nodes, self.total_edges
        )?;
        if let Some(m) = self.sb_mux {
            writeln!(
                f,
                "  switch-block muxes: {} (min {}, max {}, avg {:.2})",
                m.count, m.min, m.max, m.avg
            )?;
        }
        if let Some(m) = self.cb_mux {
            writeln!(
                f,
                "  connection-block muxes: {} (min {}, max {}, avg {:.2})",
                m.count, m.min, m.max, m.avg
            )?;
        }
        Ok(())
    }
}
