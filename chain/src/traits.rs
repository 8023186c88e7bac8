//! Relayer and chain seams consumed by the channel finalizer
//!
//! Implementations live outside this crate (the relayer binary driver and
//! the chain RPC client); the finalizer and the test suites only ever see
//! these traits.

use async_trait::async_trait;

use crate::error::{NodeError, RelayerError};

/// One channel as reported by the relayer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSummary {
    pub port_id: String,
    pub channel_id: String,
}

/// A bonded validator as reported by the staking query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BondedValidator {
    pub operator_address: String,
    /// Staked tokens backing the validator's voting power.
    pub tokens: u128,
}

/// Driver for the relayer process linking the provider and consumer chains.
#[mockall::automock]
#[async_trait]
pub trait Relayer: Send + Sync {
    async fn stop_relayer(&self) -> Result<(), RelayerError>;

    async fn start_relayer(&self) -> Result<(), RelayerError>;

    /// Channels visible to the relayer on the given chain.
    async fn channels(&self, chain_id: &str) -> Result<Vec<ChannelSummary>, RelayerError>;

    /// Forward any packets queued on `channel_id` along `path`.
    async fn flush(&self, path: &str, channel_id: &str) -> Result<(), RelayerError>;
}

/// Handle to the provider chain's query and transaction surface.
#[mockall::automock]
#[async_trait]
pub trait ProviderChain: Send + Sync {
    fn chain_id(&self) -> String;

    /// Native staking denom, e.g. `ustake`.
    fn denom(&self) -> String;

    /// Validators currently in the bonded set.
    async fn bonded_validators(&self) -> Result<Vec<BondedValidator>, NodeError>;

    /// Delegate `amount` (amount-with-denom, e.g. `1000000ustake`) from the
    /// key named `from_key` to the validator at `operator_address`.
    async fn delegate(
        &self,
        from_key: &str,
        operator_address: &str,
        amount: &str,
    ) -> Result<(), NodeError>;
}
