//! Seeding the chain owner's account on the child chain.

use alloy::primitives::U256;
use tracing::info;

use crate::{
    chain::ParentChain,
    config::{Amount, SetupConfig},
    error::{Result, SetupError},
};

/// Only 18-decimal fee tokens map one-to-one onto child chain balances.
pub const SUPPORTED_TOKEN_DECIMALS: u8 = 18;

/// Sends `amount` through the inbox, as native ETH or as the chain's ERC-20
/// fee token depending on `setup.native_token`. Returns the amount the child
/// chain balance is expected to grow by.
pub async fn deposit<P: ParentChain>(
    parent: &P,
    setup: &SetupConfig,
    amount: &Amount,
) -> Result<U256> {
    if setup.uses_native_eth() {
        info!(inbox = %setup.inbox, amount = %amount.display, "depositing ETH to the child chain");
        parent
            .deposit_eth(setup.inbox, amount.wei)
            .await?
            .ensure_success("deposit ETH to the child chain")?;
        return Ok(amount.wei);
    }

    let token = setup.native_token;
    let decimals = parent.token_decimals(token).await?;
    if decimals != SUPPORTED_TOKEN_DECIMALS {
        return Err(SetupError::config(format!(
            "native token {token} has {decimals} decimals, only {SUPPORTED_TOKEN_DECIMALS} are supported"
        )));
    }
    let units = amount.in_units(decimals)?;

    let allowance = parent.token_allowance(token, setup.inbox).await?;
    if allowance < units {
        info!(%token, spender = %setup.inbox, "approving the inbox to pull the native token");
        parent
            .approve_token(token, setup.inbox, units)
            .await?
            .ensure_success("approve the inbox for the native token")?;
    }

    info!(
        inbox = %setup.inbox,
        %token,
        amount = %amount.display,
        "depositing native token to the child chain"
    );
    parent
        .deposit_erc20(setup.inbox, units)
        .await?
        .ensure_success("deposit native token to the child chain")?;
    Ok(units)
}
