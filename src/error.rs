use thiserror::Error;

/// Top-level error type for the contour geometry kernel.
#[derive(Debug, Error)]
pub enum ContourError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Operation(#[from] OperationError),
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("polynomial of degree {0} cannot be solved in closed form")]
    UnsupportedDegree(usize),
}

/// Errors related to path access and structure.
#[derive(Debug, Error)]
pub enum PathError {
    #[error("{kind} index {index} is out of bounds (length {len})")]
    IndexOutOfBounds {
        kind: &'static str,
        index: usize,
        len: usize,
    },

    #[error("path has no current point")]
    NoCurrentPoint,

    #[error("malformed path record: {0}")]
    MalformedRecord(String),
}

/// Errors related to path operations (fitting, offsetting, extrusion).
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Convenience type alias for results using [`ContourError`].
pub type Result<T> = std::result::Result<T, ContourError>;
