use thiserror::Error;

/// Result alias for `zlattice`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the codecs, lattices and the beam expander.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// An address is not below `size(resl)` of the lattice it was handed to.
    #[error("index {index} out of bounds at resolution {resl} (size {size})")]
    IndexOutOfBounds {
        /// Offending address.
        index: u64,
        /// Lattice size at `resl`.
        size: u64,
        /// Resolution the address was interpreted at.
        resl: u32,
    },

    /// `dim * resl` hierarchy bits plus the cell id bits do not fit in the address word.
    #[error(
        "{dim}-dimensional address at resolution {resl} needs {} bits with {cell_bits} cell bits, word has {width}",
        needed_bits(.dim, .resl, .cell_bits)
    )]
    AddressWidthExceeded {
        /// Number of interleaved axes.
        dim: u32,
        /// Requested resolution.
        resl: u32,
        /// Bits reserved for the coarse cell id.
        cell_bits: u32,
        /// Address word width.
        width: u32,
    },

    /// Requested resolution is deeper than the lattice was built for.
    #[error("resolution {resl} exceeds lattice maximum {max_resl}")]
    ResolutionOutOfRange {
        /// Requested resolution.
        resl: u32,
        /// Deepest resolution the lattice supports.
        max_resl: u32,
    },

    /// Invalid construction parameter.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: String,
    },

    /// Length mismatch between aligned inputs.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected length.
        expected: usize,
        /// Found length.
        found: usize,
    },

    /// Shape mismatch (string description).
    #[error("shape mismatch: expected {expected}, actual {actual}")]
    ShapeMismatch {
        /// Expected shape description.
        expected: String,
        /// Actual shape description.
        actual: String,
    },

    /// No catalog entry under this name.
    #[error("unknown lattice '{0}'")]
    UnknownLattice(String),

    /// Input was empty.
    #[error("empty input provided")]
    EmptyInput,
}

/// Address bits an `AddressWidthExceeded` request asks for, without overflow.
fn needed_bits(dim: &u32, resl: &u32, cell_bits: &u32) -> u64 {
    u64::from(*dim) * u64::from(*resl) + u64::from(*cell_bits)
}
