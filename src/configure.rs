//! Applying fee parameters to a freshly deployed child chain.

use alloy::primitives::U256;
use tracing::info;

use crate::{
    chain::{ChildChain, ConfigCall, ParentChain},
    config::SetupConfig,
    error::{Result, SetupError},
};

/// Issues the four `ArbOwner` calls in order, each confirmed before the next.
///
/// Progress inside this function is not checkpointed: if the third call fails,
/// a later run sends all four again. Each call only sets a value, so repeating
/// one is harmless.
pub async fn configure_child_chain<P, C>(parent: &P, child: &C, setup: &SetupConfig) -> Result<()>
where
    P: ParentChain,
    C: ChildChain,
{
    let signer = child.signer();
    if signer != setup.chain_owner {
        return Err(SetupError::Authorization(format!(
            "signer {signer} is not the configured chain owner {}",
            setup.chain_owner
        )));
    }
    if !child.is_chain_owner(signer).await? {
        return Err(SetupError::Authorization(format!(
            "{signer} is not a chain owner on the child chain"
        )));
    }

    apply(child, ConfigCall::MinimumBaseFee(setup.min_base_fee)).await?;
    apply(child, ConfigCall::NetworkFeeAccount(setup.network_fee_receiver)).await?;
    apply(child, ConfigCall::InfraFeeAccount(setup.infrastructure_fee_collector)).await?;

    // sampled live, not configured
    let gas_price = parent.gas_price().await?;
    info!(gas_price, "sampled parent chain gas price");
    apply(child, ConfigCall::ParentPricePerUnit(U256::from(gas_price))).await?;

    Ok(())
}

async fn apply<C: ChildChain>(child: &C, call: ConfigCall) -> Result<()> {
    info!("{call}");
    let outcome = child.configure(call).await?.ensure_success(call.to_string())?;
    info!(block = ?outcome.block_number, "{call}: done");
    Ok(())
}
