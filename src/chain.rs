use std::{fmt, future::Future, marker::PhantomData};

use alloy::{
    network::{Ethereum, ReceiptResponse, TransactionBuilder},
    primitives::{Address, TxHash, U256},
    providers::Provider,
    rpc::types::TransactionRequest,
    transports::Transport,
};
use tracing::info;

use crate::{
    bindings::{ArbOwner, IERC20Inbox, IInbox, ARB_OWNER, IERC20},
    error::{Result, SetupError},
};

/// A mined transaction as seen through its receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxOutcome {
    pub hash: TxHash,
    pub block_number: Option<u64>,
    pub success: bool,
}

impl TxOutcome {
    pub fn ensure_success(self, action: impl Into<String>) -> Result<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(SetupError::TransactionFailure {
                action: action.into(),
                hash: self.hash,
            })
        }
    }
}

/// Privileged call on the child chain's `ArbOwner` precompile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigCall {
    MinimumBaseFee(U256),
    NetworkFeeAccount(Address),
    InfraFeeAccount(Address),
    /// Parent chain gas price estimate, in wei per unit.
    ParentPricePerUnit(U256),
}

impl fmt::Display for ConfigCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigCall::MinimumBaseFee(fee) => write!(f, "set minimum base fee to {fee}"),
            ConfigCall::NetworkFeeAccount(account) => {
                write!(f, "set network fee receiver to {account}")
            }
            ConfigCall::InfraFeeAccount(account) => {
                write!(f, "set infrastructure fee collector to {account}")
            }
            ConfigCall::ParentPricePerUnit(price) => {
                write!(f, "set parent chain price per unit to {price}")
            }
        }
    }
}

/// Operations the setup needs on the parent chain. Every transaction method
/// submits and then waits for the receipt.
pub trait ParentChain: Send + Sync {
    fn chain_id(&self) -> impl Future<Output = Result<u64>> + Send;

    fn gas_price(&self) -> impl Future<Output = Result<u128>> + Send;

    fn transfer(&self, to: Address, value: U256) -> impl Future<Output = Result<TxOutcome>> + Send;

    fn deposit_eth(
        &self,
        inbox: Address,
        value: U256,
    ) -> impl Future<Output = Result<TxOutcome>> + Send;

    fn token_decimals(&self, token: Address) -> impl Future<Output = Result<u8>> + Send;

    fn token_allowance(
        &self,
        token: Address,
        spender: Address,
    ) -> impl Future<Output = Result<U256>> + Send;

    fn approve_token(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> impl Future<Output = Result<TxOutcome>> + Send;

    fn deposit_erc20(
        &self,
        inbox: Address,
        amount: U256,
    ) -> impl Future<Output = Result<TxOutcome>> + Send;
}

/// Operations the setup needs on the child chain.
pub trait ChildChain: Send + Sync {
    fn signer(&self) -> Address;

    fn chain_id(&self) -> impl Future<Output = Result<u64>> + Send;

    fn balance(&self, account: Address) -> impl Future<Output = Result<U256>> + Send;

    fn is_chain_owner(&self, account: Address) -> impl Future<Output = Result<bool>> + Send;

    fn configure(&self, call: ConfigCall) -> impl Future<Output = Result<TxOutcome>> + Send;
}

pub struct ChainClients<P, C> {
    pub parent: P,
    pub child: C,
}

/// JSON-RPC backed chain. The provider must carry a wallet for `signer`.
pub struct RpcChain<P, T> {
    name: &'static str,
    provider: P,
    signer: Address,
    _phantom: PhantomData<T>,
}

impl<P, T> RpcChain<P, T>
where
    P: Provider<T, Ethereum>,
    T: Transport + Clone,
{
    pub fn new(name: &'static str, provider: P, signer: Address) -> Self {
        Self {
            name,
            provider,
            signer,
            _phantom: PhantomData,
        }
    }

    fn outcome<R: ReceiptResponse>(&self, action: &str, receipt: &R) -> TxOutcome {
        let outcome = TxOutcome {
            hash: receipt.transaction_hash(),
            block_number: receipt.block_number(),
            success: receipt.status(),
        };
        info!(
            chain = self.name,
            hash = %outcome.hash,
            block = ?outcome.block_number,
            success = outcome.success,
            "{action}: transaction mined"
        );
        outcome
    }

    fn sent(&self, action: &str, hash: &TxHash) {
        info!(chain = self.name, %hash, "{action}: transaction sent");
    }
}

impl<P, T> ParentChain for RpcChain<P, T>
where
    P: Provider<T, Ethereum>,
    T: Transport + Clone,
{
    async fn chain_id(&self) -> Result<u64> {
        Ok(self.provider.get_chain_id().await?)
    }

    async fn gas_price(&self) -> Result<u128> {
        Ok(self.provider.get_gas_price().await?)
    }

    async fn transfer(&self, to: Address, value: U256) -> Result<TxOutcome> {
        let tx = TransactionRequest::default().with_to(to).with_value(value);
        let pending = self.provider.send_transaction(tx).await?;
        self.sent("transfer", pending.tx_hash());
        let receipt = pending.get_receipt().await?;
        Ok(self.outcome("transfer", &receipt))
    }

    async fn deposit_eth(&self, inbox: Address, value: U256) -> Result<TxOutcome> {
        let inbox = IInbox::new(inbox, &self.provider);
        let pending = inbox.depositEth().value(value).send().await?;
        self.sent("depositEth", pending.tx_hash());
        let receipt = pending.get_receipt().await?;
        Ok(self.outcome("depositEth", &receipt))
    }

    async fn token_decimals(&self, token: Address) -> Result<u8> {
        let token = IERC20::new(token, &self.provider);
        Ok(token.decimals().call().await?._0)
    }

    async fn token_allowance(&self, token: Address, spender: Address) -> Result<U256> {
        let token = IERC20::new(token, &self.provider);
        Ok(token.allowance(self.signer, spender).call().await?._0)
    }

    async fn approve_token(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TxOutcome> {
        let token = IERC20::new(token, &self.provider);
        let pending = token.approve(spender, amount).send().await?;
        self.sent("approve", pending.tx_hash());
        let receipt = pending.get_receipt().await?;
        Ok(self.outcome("approve", &receipt))
    }

    async fn deposit_erc20(&self, inbox: Address, amount: U256) -> Result<TxOutcome> {
        let inbox = IERC20Inbox::new(inbox, &self.provider);
        let pending = inbox.depositERC20(amount).send().await?;
        self.sent("depositERC20", pending.tx_hash());
        let receipt = pending.get_receipt().await?;
        Ok(self.outcome("depositERC20", &receipt))
    }
}

impl<P, T> ChildChain for RpcChain<P, T>
where
    P: Provider<T, Ethereum>,
    T: Transport + Clone,
{
    fn signer(&self) -> Address {
        self.signer
    }

    async fn chain_id(&self) -> Result<u64> {
        Ok(self.provider.get_chain_id().await?)
    }

    async fn balance(&self, account: Address) -> Result<U256> {
        Ok(self.provider.get_balance(account).await?)
    }

    async fn is_chain_owner(&self, account: Address) -> Result<bool> {
        let arb_owner = ArbOwner::new(ARB_OWNER, &self.provider);
        Ok(arb_owner.isChainOwner(account).call().await?._0)
    }

    async fn configure(&self, call: ConfigCall) -> Result<TxOutcome> {
        let arb_owner = ArbOwner::new(ARB_OWNER, &self.provider);
        let pending = match call {
            ConfigCall::MinimumBaseFee(fee) => arb_owner.setMinimumL2BaseFee(fee).send().await?,
            ConfigCall::NetworkFeeAccount(account) => {
                arb_owner.setNetworkFeeAccount(account).send().await?
            }
            ConfigCall::InfraFeeAccount(account) => {
                arb_owner.setInfraFeeAccount(account).send().await?
            }
            ConfigCall::ParentPricePerUnit(price) => {
                arb_owner.setL1PricePerUnit(price).send().await?
            }
        };
        let action = call.to_string();
        self.sent(&action, pending.tx_hash());
        let receipt = pending.get_receipt().await?;
        Ok(self.outcome(&action, &receipt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, b256};

    #[test]
    fn failed_receipt_becomes_transaction_failure() {
        let hash = b256!("00000000000000000000000000000000000000000000000000000000000000aa");
        let outcome = TxOutcome {
            hash,
            block_number: Some(12),
            success: false,
        };

        let err = outcome.ensure_success("fund staker").unwrap_err();
        match err {
            SetupError::TransactionFailure { action, hash: failed } => {
                assert_eq!(action, "fund staker");
                assert_eq!(failed, hash);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn config_calls_describe_themselves() {
        let account = address!("5555555555555555555555555555555555555555");
        assert_eq!(
            ConfigCall::NetworkFeeAccount(account).to_string(),
            format!("set network fee receiver to {account}")
        );
        assert_eq!(
            ConfigCall::MinimumBaseFee(U256::from(100)).to_string(),
            "set minimum base fee to 100"
        );
    }
}
