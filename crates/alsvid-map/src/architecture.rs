//! Target architecture: coupling graph, distances, calibration.

use petgraph::algo::dijkstra;
use petgraph::graph::{NodeIndex, UnGraph};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::error::{MapError, MapResult};

/// Gate cost of one inserted SWAP (three CNOTs).
pub const SWAP_COST: f64 = 3.0;

/// Gate cost of one teleportation (two CNOTs, measurement, corrections).
pub const TELEPORT_COST: f64 = 7.0;

/// Per-qubit and per-edge calibration data.
///
/// Error rates are probabilities in `[0, 1)`. Edge keys are stored with the
/// smaller qubit first; lookups normalize automatically.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Calibration {
    /// Single-qubit gate error rate per physical qubit.
    pub single_qubit_error: Vec<f64>,
    /// Two-qubit gate error rate per coupling edge.
    pub two_qubit_error: FxHashMap<(u32, u32), f64>,
    /// Readout error rate per physical qubit.
    pub readout_error: Vec<f64>,
}

impl Calibration {
    /// Two-qubit error rate for an edge, in either orientation.
    pub fn edge_error(&self, p1: u32, p2: u32) -> Option<f64> {
        let key = if p1 <= p2 { (p1, p2) } else { (p2, p1) };
        self.two_qubit_error.get(&key).copied()
    }
}

/// The coupling graph of a physical quantum processor.
///
/// Holds the set of physical qubits, the allowed couplings between them,
/// and precomputed all-pairs distances: an unweighted hop table (BFS per
/// source) plus, when calibration is attached, a fidelity-weighted cost
/// table (Dijkstra per source over `-ln(1 - error)` edge weights).
///
/// Immutable after construction; a mapping run only reads it.
#[derive(Debug, Clone)]
pub struct Architecture {
    /// Number of physical qubits.
    num_qubits: u32,
    /// Coupling edges, normalized (small, large) and sorted.
    edges: Vec<(u32, u32)>,
    /// Backing graph for path algorithms.
    graph: UnGraph<(), f64>,
    /// Sorted adjacency lists, one per physical qubit.
    adjacency: Vec<Vec<u32>>,
    /// `hop_matrix[p1][p2]`: shortest-path hop count, `u32::MAX` if
    /// unreachable.
    hop_matrix: Vec<Vec<u32>>,
    /// `cost_matrix[p1][p2]`: fidelity-weighted shortest-path cost.
    /// Equals the hop count when no calibration is attached.
    cost_matrix: Vec<Vec<f64>>,
    /// Attached calibration data, if any.
    calibration: Option<Calibration>,
    /// Cheapest single-swap cost over all edges (for admissible bounds).
    min_swap_cost: f64,
}

impl Architecture {
    /// Construct an architecture from a qubit count and an edge list.
    ///
    /// Fails with [`MapError::InvalidArchitecture`] if an edge references a
    /// qubit outside `0..num_qubits` or couples a qubit to itself.
    /// Duplicate edges (in either orientation) are ignored.
    pub fn new(num_qubits: u32, edge_list: impl IntoIterator<Item = (u32, u32)>) -> MapResult<Self> {
        let mut edges: Vec<(u32, u32)> = vec![];
        for (a, b) in edge_list {
            if a >= num_qubits || b >= num_qubits {
                return Err(MapError::InvalidArchitecture(format!(
                    "edge ({a}, {b}) references a qubit outside 0..{num_qubits}"
                )));
            }
            if a == b {
                return Err(MapError::InvalidArchitecture(format!(
                    "edge ({a}, {b}) couples a qubit to itself"
                )));
            }
            let edge = if a <= b { (a, b) } else { (b, a) };
            if !edges.contains(&edge) {
                edges.push(edge);
            }
        }
        edges.sort_unstable();

        let mut arch = Self {
            num_qubits,
            edges,
            graph: UnGraph::default(),
            adjacency: vec![],
            hop_matrix: vec![],
            cost_matrix: vec![],
            calibration: None,
            min_swap_cost: SWAP_COST,
        };
        arch.rebuild();
        Ok(arch)
    }

    /// Attach calibration data and recompute the weighted distance table.
    ///
    /// Fails if the calibration references an edge that is not in the
    /// coupling graph or carries an error rate outside `[0, 1)`.
    pub fn with_calibration(mut self, calibration: Calibration) -> MapResult<Self> {
        for (&(a, b), &err) in &calibration.two_qubit_error {
            if !self.is_coupled(a, b) {
                return Err(MapError::InvalidArchitecture(format!(
                    "calibration references uncoupled pair ({a}, {b})"
                )));
            }
            if !(0.0..1.0).contains(&err) {
                return Err(MapError::InvalidArchitecture(format!(
                    "two-qubit error rate {err} for ({a}, {b}) outside [0, 1)"
                )));
            }
        }
        self.calibration = Some(calibration);
        self.rebuild();
        Ok(self)
    }

    /// Rebuild the backing graph, adjacency lists, and distance tables.
    fn rebuild(&mut self) {
        let n = self.num_qubits as usize;

        self.graph = UnGraph::default();
        for _ in 0..n {
            self.graph.add_node(());
        }
        for &(a, b) in &self.edges {
            let w = self.edge_weight(a, b);
            self.graph
                .add_edge(NodeIndex::new(a as usize), NodeIndex::new(b as usize), w);
        }

        self.adjacency = vec![vec![]; n];
        for &(a, b) in &self.edges {
            self.adjacency[a as usize].push(b);
            self.adjacency[b as usize].push(a);
        }
        for list in &mut self.adjacency {
            list.sort_unstable();
        }

        self.hop_matrix = (0..n).map(|src| self.bfs_hops(src)).collect();

        self.cost_matrix = (0..n)
            .map(|src| {
                let reached = dijkstra(&self.graph, NodeIndex::new(src), None, |e| *e.weight());
                let mut row = vec![f64::INFINITY; n];
                for (node, cost) in reached {
                    row[node.index()] = cost;
                }
                row
            })
            .collect();

        self.min_swap_cost = self
            .edges
            .iter()
            .map(|&(a, b)| self.swap_cost(a, b))
            .fold(f64::INFINITY, f64::min);
        if !self.min_swap_cost.is_finite() {
            self.min_swap_cost = SWAP_COST;
        }
    }

    /// Traversal weight of one coupling edge: 1.0 unweighted, or the
    /// fidelity cost `-ln(1 - error)` normalized so a perfect edge costs 1.
    fn edge_weight(&self, a: u32, b: u32) -> f64 {
        match self
            .calibration
            .as_ref()
            .and_then(|c| c.edge_error(a, b))
        {
            Some(err) => 1.0 - (1.0 - err).ln(),
            None => 1.0,
        }
    }

    /// BFS hop distances from one source.
    fn bfs_hops(&self, src: usize) -> Vec<u32> {
        let n = self.num_qubits as usize;
        let mut dist = vec![u32::MAX; n];
        dist[src] = 0;
        let mut queue = VecDeque::new();
        queue.push_back(src as u32);
        while let Some(current) = queue.pop_front() {
            for &neighbor in &self.adjacency[current as usize] {
                if dist[neighbor as usize] == u32::MAX {
                    dist[neighbor as usize] = dist[current as usize] + 1;
                    queue.push_back(neighbor);
                }
            }
        }
        dist
    }

    /// Number of physical qubits.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// The coupling edges, normalized and sorted.
    pub fn edges(&self) -> &[(u32, u32)] {
        &self.edges
    }

    /// Neighbors of a physical qubit, in ascending order.
    pub fn neighbors(&self, p: u32) -> &[u32] {
        &self.adjacency[p as usize]
    }

    /// Check if two physical qubits are directly coupled.
    #[inline]
    pub fn is_coupled(&self, p1: u32, p2: u32) -> bool {
        self.adjacency[p1 as usize].binary_search(&p2).is_ok()
    }

    /// Shortest-path hop count, `u32::MAX` if unreachable.
    #[inline]
    pub fn hops(&self, p1: u32, p2: u32) -> u32 {
        self.hop_matrix[p1 as usize][p2 as usize]
    }

    /// Shortest-path cost between two physical qubits.
    ///
    /// Hop count when unweighted, fidelity-weighted cost when calibration
    /// is attached; `f64::INFINITY` if unreachable.
    #[inline]
    pub fn distance(&self, p1: u32, p2: u32) -> f64 {
        self.cost_matrix[p1 as usize][p2 as usize]
    }

    /// Cost of inserting one SWAP on a coupling edge.
    pub fn swap_cost(&self, p1: u32, p2: u32) -> f64 {
        SWAP_COST * self.edge_weight(p1.min(p2), p1.max(p2))
    }

    /// Cost of one teleportation across a coupling edge.
    pub fn teleport_cost(&self, p1: u32, p2: u32) -> f64 {
        TELEPORT_COST * self.edge_weight(p1.min(p2), p1.max(p2))
    }

    /// Cheapest single-swap cost over all edges.
    #[inline]
    pub fn min_swap_cost(&self) -> f64 {
        self.min_swap_cost
    }

    /// Attached calibration data, if any.
    pub fn calibration(&self) -> Option<&Calibration> {
        self.calibration.as_ref()
    }

    /// Check that every physical qubit can reach every other.
    pub fn is_connected(&self) -> bool {
        if self.num_qubits == 0 {
            return true;
        }
        self.hop_matrix[0].iter().all(|&d| d != u32::MAX)
    }

    /// Size of the largest connected component.
    ///
    /// A circuit is routable only if all its qubits fit in one component;
    /// the mapper reports `MappingInfeasible` when they do not.
    pub fn largest_component_size(&self) -> u32 {
        let n = self.num_qubits as usize;
        let mut assigned = vec![false; n];
        let mut largest = 0u32;
        for root in 0..n {
            if assigned[root] {
                continue;
            }
            let mut size = 0u32;
            for p in 0..n {
                if self.hop_matrix[root][p] != u32::MAX {
                    assigned[p] = true;
                    size += 1;
                }
            }
            largest = largest.max(size);
        }
        largest
    }

    /// Validate this architecture as a target for a circuit with
    /// `num_logical` qubits: the circuit must fit on the device.
    pub fn validate_for_circuit(&self, num_logical: u32) -> MapResult<()> {
        if num_logical > self.num_qubits {
            return Err(MapError::CircuitTooLarge {
                required: num_logical,
                available: self.num_qubits,
            });
        }
        Ok(())
    }

    // =========================================================================
    // Factory topologies
    // =========================================================================

    /// Linear chain 0-1-2-...-(n-1).
    pub fn linear(n: u32) -> Self {
        let edges = (0..n.saturating_sub(1)).map(|i| (i, i + 1));
        Self::new(n, edges).expect("linear edges are always in range")
    }

    /// Ring: linear chain plus the closing edge.
    pub fn ring(n: u32) -> Self {
        let mut edges: Vec<_> = (0..n.saturating_sub(1)).map(|i| (i, i + 1)).collect();
        if n > 2 {
            edges.push((n - 1, 0));
        }
        Self::new(n, edges).expect("ring edges are always in range")
    }

    /// Rectangular grid with nearest-neighbor couplings.
    pub fn grid(rows: u32, cols: u32) -> Self {
        let mut edges = vec![];
        for r in 0..rows {
            for c in 0..cols {
                let q = r * cols + c;
                if c + 1 < cols {
                    edges.push((q, q + 1));
                }
                if r + 1 < rows {
                    edges.push((q, q + cols));
                }
            }
        }
        Self::new(rows * cols, edges).expect("grid edges are always in range")
    }

    /// Fully connected architecture.
    pub fn full(n: u32) -> Self {
        let mut edges = vec![];
        for i in 0..n {
            for j in (i + 1)..n {
                edges.push((i, j));
            }
        }
        Self::new(n, edges).expect("full edges are always in range")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_distances() {
        let arch = Architecture::linear(5);
        assert!(arch.is_coupled(0, 1));
        assert!(arch.is_coupled(1, 0));
        assert!(!arch.is_coupled(0, 2));
        assert_eq!(arch.hops(0, 4), 4);
        assert_eq!(arch.distance(0, 4), 4.0);
        assert_eq!(arch.hops(2, 2), 0);
    }

    #[test]
    fn test_grid_neighbors() {
        let arch = Architecture::grid(2, 3);
        // qubit 1 sits between 0 and 2, above 4
        assert_eq!(arch.neighbors(1), &[0, 2, 4]);
        assert_eq!(arch.hops(0, 5), 3);
    }

    #[test]
    fn test_edge_out_of_range() {
        let err = Architecture::new(3, [(0, 1), (1, 7)]).unwrap_err();
        assert!(matches!(err, MapError::InvalidArchitecture(_)));
    }

    #[test]
    fn test_self_loop_rejected() {
        let err = Architecture::new(3, [(1, 1)]).unwrap_err();
        assert!(matches!(err, MapError::InvalidArchitecture(_)));
    }

    #[test]
    fn test_disconnected() {
        let arch = Architecture::new(4, [(0, 1), (2, 3)]).unwrap();
        assert!(!arch.is_connected());
        assert_eq!(arch.hops(0, 2), u32::MAX);
        assert!(arch.distance(0, 2).is_infinite());
        assert_eq!(arch.largest_component_size(), 2);
        // Fitting on the device is not the same as being routable.
        assert!(arch.validate_for_circuit(3).is_ok());
    }

    #[test]
    fn test_validate_too_large() {
        let arch = Architecture::linear(3);
        let err = arch.validate_for_circuit(5).unwrap_err();
        assert!(matches!(err, MapError::CircuitTooLarge { .. }));
    }

    #[test]
    fn test_calibration_weights() {
        let mut two_qubit_error = FxHashMap::default();
        two_qubit_error.insert((0u32, 1u32), 0.05f64);
        two_qubit_error.insert((1u32, 2u32), 0.005f64);
        let cal = Calibration {
            two_qubit_error,
            ..Calibration::default()
        };

        let arch = Architecture::linear(3).with_calibration(cal).unwrap();
        // Noisier edge costs more to traverse and to swap across.
        assert!(arch.distance(0, 1) > arch.distance(1, 2));
        assert!(arch.swap_cost(0, 1) > arch.swap_cost(1, 2));
        assert!(arch.min_swap_cost() <= arch.swap_cost(1, 2));
        // Hop counts stay unweighted.
        assert_eq!(arch.hops(0, 2), 2);
    }

    #[test]
    fn test_calibration_uncoupled_pair_rejected() {
        let mut two_qubit_error = FxHashMap::default();
        two_qubit_error.insert((0u32, 2u32), 0.01f64);
        let cal = Calibration {
            two_qubit_error,
            ..Calibration::default()
        };
        let err = Architecture::linear(3).with_calibration(cal).unwrap_err();
        assert!(matches!(err, MapError::InvalidArchitecture(_)));
    }
}
