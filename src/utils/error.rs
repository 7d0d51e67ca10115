use thiserror::Error;

/// Errors surfaced by the outer tooling around the pipeline. Extraction
/// itself never fails: malformed input degrades to absent fields, so these
/// variants only cover the boundary where inputs are obtained.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to read input: {0}")]
    InputRead(#[from] std::io::Error),
    #[error("no input provided: {0}")]
    MissingInput(String),
}
