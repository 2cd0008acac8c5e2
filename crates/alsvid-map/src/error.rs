//! Error types for the mapping crate.

use thiserror::Error;

/// Errors that can occur during qubit mapping.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MapError {
    /// Malformed architecture input. Fatal, detected before any search
    /// begins.
    #[error("Invalid architecture: {0}")]
    InvalidArchitecture(String),

    /// Circuit references a qubit outside the declared range, or the
    /// circuit does not fit the architecture. Fatal.
    #[error("Invalid circuit: {0}")]
    InvalidCircuit(#[from] alsvid_ir::IrError),

    /// Circuit needs more qubits than the architecture provides.
    #[error("Circuit requires {required} qubits but architecture only has {available}")]
    CircuitTooLarge { required: u32, available: u32 },

    /// Gate the error-correcting encoding cannot express. Fatal.
    #[error("Gate '{gate}' cannot be encoded with the {scheme} code")]
    UnencodableGate {
        /// Name of the offending gate.
        gate: &'static str,
        /// Name of the encoding scheme.
        scheme: &'static str,
    },

    /// Search could not find a solution within the configured bounds.
    /// Reported in the result record, not fatal to the host.
    #[error("Mapping infeasible: {reason}")]
    MappingInfeasible { reason: String },

    /// Invariant violation inside the search. Indicates an engine bug.
    #[error("Internal search error: {0}")]
    InternalSearchError(String),
}

impl MapError {
    /// Construct a `MappingInfeasible` with a formatted reason.
    pub fn infeasible(reason: impl Into<String>) -> Self {
        MapError::MappingInfeasible {
            reason: reason.into(),
        }
    }

    /// Construct a `MappingInfeasible` caused by a search cutoff (node or
    /// time budget), which the aggregator surfaces as a timeout statistic.
    pub fn cutoff(reason: impl Into<String>) -> Self {
        MapError::MappingInfeasible {
            reason: format!("cutoff: {}", reason.into()),
        }
    }

    /// Whether this infeasibility came from a search cutoff.
    pub fn is_cutoff(&self) -> bool {
        matches!(self, MapError::MappingInfeasible { reason } if reason.starts_with("cutoff:"))
    }

    /// Whether this error is fatal (should abort before/without a result
    /// record) as opposed to being captured into the result.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, MapError::MappingInfeasible { .. })
    }
}

/// Result type for mapping operations.
pub type MapResult<T> = Result<T, MapError>;
