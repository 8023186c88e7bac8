//! Provider/consumer channel finalization
//!
//! The bring-up sequence leaves the transfer channel handshake pending and
//! the first validator-set-update packet unsent. [`finish_provider_setup`]
//! completes both deterministically:
//!
//! 1. Restart the relayer, which picks up and completes the pending
//!    handshake.
//! 2. Delegate a fixed quantum to the first bonded validator. The consensus
//!    engine only emits a validator-set update when voting power changes, so
//!    a non-zero delegation forces the packet that needs to flow.
//! 3. Flush whatever is queued on the provider port.
//!
//! Nothing here retries; callers own retry policy.

use shared::TestSink;

use crate::error::{ChainError, ChainResult};
use crate::traits::{ProviderChain, Relayer};

/// Fixed delegation amount, in base denom units.
const DELEGATION_QUANTUM: u64 = 1_000_000;

/// Key name the delegation is sent from.
const DELEGATOR_KEY: &str = "validator";

/// Port carrying validator-set-update packets to the consumer.
const PROVIDER_PORT: &str = "provider";

/// Complete the provider↔consumer channel bring-up.
///
/// Always targets index 0 of the bonded set; deterministic ordering of that
/// query is the chain client's contract.
pub async fn finish_provider_setup(
    provider: &dyn ProviderChain,
    relayer: &dyn Relayer,
    sink: &dyn TestSink,
    ibc_path: &str,
) -> ChainResult<()> {
    // Restart the relayer to finish the transfer channel handshake.
    relayer.stop_relayer().await.map_err(ChainError::StopRelayer)?;
    relayer.start_relayer().await.map_err(ChainError::StartRelayer)?;

    let validators = provider
        .bonded_validators()
        .await
        .map_err(ChainError::QueryValidators)?;
    let target = validators
        .into_iter()
        .next()
        .ok_or(ChainError::NoBondedValidators)?;

    let amount = format!("{}{}", DELEGATION_QUANTUM, provider.denom());
    sink.log(&format!(
        "Delegating {} to provider validator {}",
        amount, target.operator_address
    ));
    provider
        .delegate(DELEGATOR_KEY, &target.operator_address, &amount)
        .await
        .map_err(ChainError::Delegate)?;

    let after = provider
        .bonded_validators()
        .await
        .map_err(ChainError::QueryValidators)?
        .into_iter()
        .find(|v| v.operator_address == target.operator_address)
        .ok_or(ChainError::MissingValidator)?;
    if after.tokens < target.tokens {
        return Err(ChainError::DelegationNotApplied {
            before: target.tokens,
            after: after.tokens,
        });
    }

    flush_pending_packets(provider, relayer, sink, ibc_path).await
}

/// Flush pending packets to the consumer chain from the provider port.
///
/// When several channels sit on the provider port the last one reported
/// wins; when none does, the empty channel id is passed through and the
/// relayer decides what that means.
pub async fn flush_pending_packets(
    provider: &dyn ProviderChain,
    relayer: &dyn Relayer,
    sink: &dyn TestSink,
    ibc_path: &str,
) -> ChainResult<()> {
    let channels = relayer
        .channels(&provider.chain_id())
        .await
        .map_err(ChainError::ListChannels)?;

    let mut provider_channel = String::new();
    for channel in &channels {
        if channel.port_id == PROVIDER_PORT {
            provider_channel = channel.channel_id.clone();
        }
    }

    sink.log(&format!(
        "Flushing pending packets on path {} channel {:?}",
        ibc_path, provider_channel
    ));
    relayer
        .flush(ibc_path, &provider_channel)
        .await
        .map_err(ChainError::Flush)
}
