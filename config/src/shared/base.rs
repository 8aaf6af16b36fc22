use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// TLS is enabled but no trusted root certificates are provided.
    #[error("Invalid TLS config: `trusted_root_certs` must be set when `enabled` is true")]
    MissingTrustedRootCerts,
    /// A field holds a value outside of its allowed domain.
    #[error("Invalid value for `{field}`: {constraint}")]
    InvalidFieldValue { field: String, constraint: String },
    /// The input range ends before it starts.
    #[error("Input range `{start}..{end}` ends before it starts")]
    InvertedRange { start: i64, end: i64 },
    /// More identifiers were requested than the input range contains.
    #[error("Cannot sample {sample_size} identifiers from a range of {available}")]
    SampleTooLarge { sample_size: usize, available: u64 },
    /// The lookup query has no placeholder for the item identifier.
    #[error("Lookup query must reference the item identifier as `$1`: {0}")]
    MissingQueryParameter(String),
}
