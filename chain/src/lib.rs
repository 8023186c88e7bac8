//! Provider/consumer channel bring-up orchestration
//!
//! After a provider and consumer chain come up with a relayer between them,
//! the token-transfer channel handshake is left partially complete. This
//! crate drives it to completion: restart the relayer, bump a validator's
//! voting power so the consensus engine emits a validator-set update, and
//! flush the pending packets on the provider port.
//!
//! The crate consumes only the [`Relayer`] and [`ProviderChain`] seams — it
//! never touches Docker.

pub mod error;
pub mod finalizer;
pub mod traits;

// Re-export commonly used types
pub use error::{ChainError, ChainResult, NodeError, RelayerError};
pub use finalizer::{finish_provider_setup, flush_pending_packets};
pub use traits::{
    BondedValidator, ChannelSummary, MockProviderChain, MockRelayer, ProviderChain, Relayer,
};
