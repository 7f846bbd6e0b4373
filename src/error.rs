// ============================================================
// Library Error Type
// ============================================================
// Every failure in the segment pipeline is raised at the point
// of detection and returned to the caller. Nothing here retries
// or downgrades an error into a partial result.
//
//   Validation        — malformed property, or a token-level
//                       property whose offset lands in no segment
//   NotImplemented    — a split or pack mode that is not supported
//   CapacityExceeded  — an export or packed group larger than the
//                       capacity limit
//   ContractViolation — a broken precondition (sampling more than
//                       available, destination arrays too small, ...)
//
// The application and CLI layers wrap this in anyhow::Error.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackError {
    /// A property tuple or offset failed validation during segmentation.
    #[error("invalid property: {0}")]
    Validation(String),

    /// The requested split or pack mode is not supported.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    /// A layout or packed group needs more slots than the capacity allows.
    #[error("{required} tokens exceed capacity {capacity}")]
    CapacityExceeded {
        /// Number of output slots the operation needed
        required: usize,
        /// The configured capacity limit
        capacity: usize,
    },

    /// A caller-side precondition was not met.
    #[error("contract violation: {0}")]
    ContractViolation(String),
}

pub type Result<T> = std::result::Result<T, PackError>;
