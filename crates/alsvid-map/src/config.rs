//! Mapper configuration.
//!
//! [`MapperConfig`] mirrors the language-neutral options record consumed by
//! host wrappers, including its mixed camel/snake key spelling, so a JSON
//! options object deserializes directly.

use serde::{Deserialize, Serialize};

/// Mapping technique to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// A*-style bounded-lookahead search (fast, near-optimal).
    #[default]
    Heuristic,
    /// Per-layer optimal search (exponential worst case).
    Exact,
}

/// Strategy for determining the initial logical-to-physical layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InitialLayoutStrategy {
    /// Logical qubit i starts on physical qubit i.
    Identity,
    /// Most-interacting logical qubits on most-connected physical qubits.
    Static,
    /// Incremental placement driven by the first layers of the circuit.
    #[default]
    Dynamic,
}

/// Circuit layering strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayeringStrategy {
    /// Each gate forms its own layer.
    #[default]
    IndividualGates,
    /// Greedy accumulation while operand sets stay disjoint.
    DisjointQubits,
    /// Two two-qubit gates per layer.
    OddQubits,
    /// Admit gates while the layer spans at most three qubit lines.
    QubitTriangle,
}

/// Options record for a mapping run.
///
/// Field names follow the external options record: `initialLayout` and
/// `saveMappedCircuit` are camelCase, the teleportation flags snake_case.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Mapping technique (`heuristic` | `exact`).
    pub method: Method,

    /// Initial layout strategy (only relevant for the heuristic mapper).
    #[serde(rename = "initialLayout")]
    pub initial_layout: InitialLayoutStrategy,

    /// Circuit layering strategy.
    pub layering: LayeringStrategy,

    /// Use teleportation in addition to swaps.
    pub use_teleportation: bool,

    /// Reserve ancilla qubits for teleportation but never use them
    /// (for comparative benchmarking).
    pub teleportation_fake: bool,

    /// Seed for the ancilla-placement RNG. Zero seeds from OS entropy;
    /// such runs are not byte-for-byte reproducible.
    pub teleportation_seed: u64,

    /// Include the mapped gate sequence in the result.
    #[serde(rename = "saveMappedCircuit")]
    pub save_mapped_circuit: bool,

    /// Include a single-line CSV summary of the statistics in the result.
    pub csv: bool,

    /// Log the final statistics record.
    pub statistics: bool,

    /// Emit per-layer debug events during the mapping process.
    pub verbose: bool,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            method: Method::Heuristic,
            initial_layout: InitialLayoutStrategy::Dynamic,
            layering: LayeringStrategy::IndividualGates,
            use_teleportation: false,
            teleportation_fake: false,
            teleportation_seed: 0,
            save_mapped_circuit: true,
            csv: false,
            statistics: false,
            verbose: false,
        }
    }
}

impl MapperConfig {
    /// Config preset for the exact mapper.
    #[must_use]
    pub fn exact() -> Self {
        Self {
            method: Method::Exact,
            ..Self::default()
        }
    }

    /// Set the layering strategy.
    #[must_use]
    pub fn with_layering(mut self, layering: LayeringStrategy) -> Self {
        self.layering = layering;
        self
    }

    /// Set the initial layout strategy.
    #[must_use]
    pub fn with_initial_layout(mut self, strategy: InitialLayoutStrategy) -> Self {
        self.initial_layout = strategy;
        self
    }

    /// Enable teleportation with a fixed seed.
    #[must_use]
    pub fn with_teleportation(mut self, seed: u64) -> Self {
        self.use_teleportation = true;
        self.teleportation_seed = seed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_wrapper() {
        let config = MapperConfig::default();
        assert_eq!(config.method, Method::Heuristic);
        assert_eq!(config.initial_layout, InitialLayoutStrategy::Dynamic);
        assert_eq!(config.layering, LayeringStrategy::IndividualGates);
        assert!(config.save_mapped_circuit);
        assert!(!config.use_teleportation);
    }

    #[test]
    fn test_options_record_keys() {
        let json = r#"{
            "method": "exact",
            "initialLayout": "static",
            "layering": "disjoint_qubits",
            "use_teleportation": true,
            "teleportation_seed": 42,
            "saveMappedCircuit": false
        }"#;
        let config: MapperConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.method, Method::Exact);
        assert_eq!(config.initial_layout, InitialLayoutStrategy::Static);
        assert_eq!(config.layering, LayeringStrategy::DisjointQubits);
        assert!(config.use_teleportation);
        assert_eq!(config.teleportation_seed, 42);
        assert!(!config.save_mapped_circuit);
    }
}
