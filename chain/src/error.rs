//! Chain-orchestration error types

use thiserror::Error;

/// Error surfaced by a relayer implementation.
#[derive(Error, Debug)]
pub enum RelayerError {
    #[error("relayer command failed: {message}")]
    Command { message: String },

    #[error("relayer I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error surfaced by a chain-node implementation.
#[derive(Error, Debug)]
pub enum NodeError {
    #[error("query failed: {message}")]
    Query { message: String },

    #[error("transaction failed: {message}")]
    Tx { message: String },

    #[error("node I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error returned by the channel bring-up orchestration. Every variant
/// carries the step that failed so the test log points at the right seam.
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("failed to stop relayer: {0}")]
    StopRelayer(#[source] RelayerError),

    #[error("failed to start relayer: {0}")]
    StartRelayer(#[source] RelayerError),

    #[error("failed to query validators: {0}")]
    QueryValidators(#[source] NodeError),

    #[error("no bonded validators on provider chain")]
    NoBondedValidators,

    #[error("failed to delegate to validator: {0}")]
    Delegate(#[source] NodeError),

    #[error("failed to find provider validator after delegation")]
    MissingValidator,

    #[error("delegation failed; before: {before}, after: {after}")]
    DelegationNotApplied { before: u128, after: u128 },

    #[error("failed to get channels: {0}")]
    ListChannels(#[source] RelayerError),

    #[error("failed to flush packets: {0}")]
    Flush(#[source] RelayerError),
}

pub type ChainResult<T> = Result<T, ChainError>;
