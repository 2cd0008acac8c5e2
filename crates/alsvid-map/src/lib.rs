//! Alsvid Qubit Mapping Engine
//!
//! This crate maps quantum circuits onto the restricted connectivity of a
//! physical quantum processor: it inserts SWAP (and optionally
//! teleportation) operations so every two-qubit interaction of the output
//! acts on coupled physical qubits, while minimizing the added gate cost.
//!
//! # Architecture
//!
//! ```text
//! Circuit + Architecture + MapperConfig
//!       │
//!       ▼
//! ┌─────────────────┐
//! │   map_circuit   │
//! └─────────────────┘
//!       │
//!       ├── Layering Engine  (individual_gates / disjoint_qubits / ...)
//!       ├── Initial Layout   (identity / static / dynamic, ancillas)
//!       ├── Layer Router     (HeuristicMapper A* │ ExactMapper optimal)
//!       └── Result Aggregator
//!       │
//!       ▼
//! MappingResult (mapped sequence, final layout, statistics)
//! ```
//!
//! Layers are committed strictly in order: the layout after one layer is
//! the precondition for the next layer's search. All tie-breaks are
//! explicit (insertion counters, lexicographic swap order), so a run with
//! a fixed `teleportation_seed` is byte-for-byte reproducible.
//!
//! # Example
//!
//! ```rust
//! use alsvid_ir::{Circuit, QubitId};
//! use alsvid_map::{map_circuit, Architecture, InitialLayoutStrategy, MapperConfig};
//!
//! // Starting from the identity placement, a gate between the ends of a
//! // 3-qubit chain needs one SWAP. (The default dynamic layout would
//! // instead place the pair adjacently and insert none.)
//! let mut circuit = Circuit::with_size("demo", 3, 0);
//! circuit.cx(QubitId(0), QubitId(2)).unwrap();
//!
//! let arch = Architecture::linear(3);
//! let config = MapperConfig::default().with_initial_layout(InitialLayoutStrategy::Identity);
//!
//! let result = map_circuit(&circuit, &arch, &config).unwrap();
//! assert!(result.is_success());
//! assert_eq!(result.statistics.swaps, 1);
//! ```
//!
//! # Error model
//!
//! Malformed inputs (`InvalidArchitecture`, `InvalidCircuit`, circuit
//! larger than the device) fail fast with `Err` before any search runs.
//! Infeasibility discovered during search — disconnected required qubits
//! or an exhausted node/time budget — is captured in the result record's
//! `error` field; the host decides whether to retry with another
//! strategy.

pub mod architecture;
pub mod config;
pub mod ecc;
pub mod error;
pub mod exact;
pub mod heuristic;
pub mod layering;
pub mod layout;
pub mod mapper;
pub mod result;
pub mod search;

pub use architecture::{Architecture, Calibration, SWAP_COST, TELEPORT_COST};
pub use config::{InitialLayoutStrategy, LayeringStrategy, MapperConfig, Method};
pub use ecc::{encode_circuit, EccScheme};
pub use error::{MapError, MapResult};
pub use exact::{BranchAndBoundSolver, ExactMapper, PermutationProblem, PermutationSolution, PermutationSolver};
pub use heuristic::HeuristicMapper;
pub use layering::{build_layers, Layer};
pub use layout::{build_initial_layout, reserve_ancillas, Layout, LayoutFingerprint};
pub use mapper::map_circuit;
pub use result::{LayerStats, MappedOp, MappingResult, MappingStats};
pub use search::{Exchange, LayerRoute};
