//! The units of work a setup run is made of.
//!
//! Every step answers "already done?" from exactly one field of the
//! [`RuntimeState`] and never looks at another step's flag.

use std::fmt;

use tracing::info;

use crate::{
    chain::{ChainClients, ChildChain, ParentChain},
    config::Settings,
    configure::configure_child_chain,
    deposit::deposit,
    error::Result,
    poller::{increased_by_at_least, wait_until},
    state::{FundingRole, RuntimeState},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Send the funding amount to a role's address on the parent chain.
    Fund(FundingRole),
    /// Deposit through the inbox and wait for the child chain to credit it.
    DepositNative,
    /// Apply fee parameters through the `ArbOwner` precompile.
    ConfigureChildChain,
}

impl Step {
    /// The full setup, in the order it has to happen.
    pub fn all() -> Vec<Step> {
        FundingRole::ALL
            .into_iter()
            .map(Step::Fund)
            .chain([Step::DepositNative, Step::ConfigureChildChain])
            .collect()
    }

    pub fn is_done(&self, state: &RuntimeState) -> bool {
        match self {
            Step::Fund(role) => state.funded(*role),
            Step::DepositNative => state.native_token_deposit_done,
            Step::ConfigureChildChain => state.chain_config_done,
        }
    }

    pub fn mark_done(&self, state: &mut RuntimeState) {
        match self {
            Step::Fund(role) => state.mark_funded(*role),
            Step::DepositNative => state.native_token_deposit_done = true,
            Step::ConfigureChildChain => state.chain_config_done = true,
        }
    }

    /// Performs the step's side effects. Does not touch the state; the caller
    /// marks the step done once this returns `Ok`.
    pub async fn run<P, C>(&self, clients: &ChainClients<P, C>, settings: &Settings) -> Result<()>
    where
        P: ParentChain,
        C: ChildChain,
    {
        match self {
            Step::Fund(role) => fund(&clients.parent, *role, settings).await,
            Step::DepositNative => deposit_native(clients, settings).await,
            Step::ConfigureChildChain => {
                configure_child_chain(&clients.parent, &clients.child, &settings.setup).await
            }
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Fund(role) => write!(f, "fund {role}"),
            Step::DepositNative => f.write_str("deposit native funds to child chain"),
            Step::ConfigureChildChain => f.write_str("configure child chain"),
        }
    }
}

async fn fund<P: ParentChain>(parent: &P, role: FundingRole, settings: &Settings) -> Result<()> {
    let to = settings.setup.funding_address(role);
    let amount = &settings.funding_amount;
    info!(%role, %to, amount = %amount.display, "funding account on parent chain");

    let outcome = parent
        .transfer(to, amount.wei)
        .await?
        .ensure_success(format!("fund {role}"))?;
    info!(%role, block = ?outcome.block_number, "funding transaction mined on parent chain");
    Ok(())
}

async fn deposit_native<P, C>(clients: &ChainClients<P, C>, settings: &Settings) -> Result<()>
where
    P: ParentChain,
    C: ChildChain,
{
    let owner = settings.setup.chain_owner;
    let baseline = clients.child.balance(owner).await?;

    let credited = deposit(&clients.parent, &settings.setup, &settings.deposit_amount).await?;

    let balance = wait_until(
        || clients.child.balance(owner),
        increased_by_at_least(baseline, credited),
        settings.poll.interval,
        settings.poll.reporter("deposit on the child chain"),
    )
    .await?;
    info!(%owner, %balance, "child chain balance increased by the deposited amount");
    Ok(())
}
