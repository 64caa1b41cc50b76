#![allow(dead_code)]

use std::{
    collections::HashSet,
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use alloy::{
    primitives::{address, Address, B256, U256},
    transports::TransportErrorKind,
};
use orbit_setup::{
    ChainClients, ChildChain, ConfigCall, ParentChain, Result, Settings, SetupConfig, TxOutcome,
};

pub const OWNER: Address = address!("1111111111111111111111111111111111111111");
pub const BATCH_POSTER: Address = address!("2222222222222222222222222222222222222222");
pub const STAKER: Address = address!("3333333333333333333333333333333333333333");
pub const INBOX: Address = address!("4444444444444444444444444444444444444444");
pub const NETWORK_FEE: Address = address!("5555555555555555555555555555555555555555");
pub const INFRA_FEE: Address = address!("6666666666666666666666666666666666666666");
pub const FEE_TOKEN: Address = address!("7777777777777777777777777777777777777777");

pub const CHILD_CHAIN_ID: u64 = 412346;
pub const PARENT_CHAIN_ID: u64 = 421614;
pub const GAS_PRICE: u128 = 20_000_000;

pub fn setup_json(native_token: Address) -> String {
    format!(
        r#"{{
            "chainId": {CHILD_CHAIN_ID},
            "parentChainId": {PARENT_CHAIN_ID},
            "chainOwner": "{OWNER}",
            "batchPoster": "{BATCH_POSTER}",
            "staker": "{STAKER}",
            "inbox": "{INBOX}",
            "nativeToken": "{native_token}",
            "minL2BaseFee": 100000000,
            "networkFeeReceiver": "{NETWORK_FEE}",
            "infrastructureFeeCollector": "{INFRA_FEE}"
        }}"#
    )
}

pub fn settings(dir: &Path) -> Settings {
    settings_with_token(dir, Address::ZERO)
}

pub fn settings_with_token(dir: &Path, native_token: Address) -> Settings {
    let setup = SetupConfig::from_json(&setup_json(native_token)).unwrap();
    let mut settings = Settings::new(setup, dir.join("resumeState.json")).unwrap();
    settings.poll.interval = Duration::ZERO;
    settings
}

pub fn ether(display: &str) -> U256 {
    alloy::primitives::utils::parse_ether(display).unwrap()
}

/// What the fakes were asked to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Transfer(Address, U256),
    DepositEth(U256),
    Approve(U256),
    DepositErc20(U256),
    Configure(ConfigCall),
}

#[derive(Debug)]
pub struct Ledger {
    pub calls: Vec<Call>,
    pub parent_chain_id: u64,
    pub child_chain_id: u64,
    pub child_signer: Address,
    pub chain_owners: HashSet<Address>,
    pub owner_balance: U256,
    /// Deposit not yet visible on the child chain, and how many balance
    /// queries it stays invisible for.
    pub in_flight: Option<(U256, u32)>,
    pub credit_delay: u32,
    pub balance_queries: u32,
    pub token_decimals: u8,
    pub allowance: U256,
    /// Operations whose transaction is mined with failure status.
    pub reverts: HashSet<&'static str>,
    /// Operations whose RPC call fails outright.
    pub unreachable: HashSet<&'static str>,
    next_tx: u8,
}

impl Default for Ledger {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            parent_chain_id: PARENT_CHAIN_ID,
            child_chain_id: CHILD_CHAIN_ID,
            child_signer: OWNER,
            chain_owners: HashSet::from([OWNER]),
            owner_balance: ether("1"),
            in_flight: None,
            credit_delay: 2,
            balance_queries: 0,
            token_decimals: 18,
            allowance: U256::ZERO,
            reverts: HashSet::new(),
            unreachable: HashSet::new(),
            next_tx: 0,
        }
    }
}

impl Ledger {
    fn check(&self, op: &'static str) -> Result<()> {
        if self.unreachable.contains(op) {
            return Err(TransportErrorKind::custom_str(&format!("{op}: connection refused")).into());
        }
        Ok(())
    }

    fn mine(&mut self, op: &'static str, call: Call) -> Result<TxOutcome> {
        self.check(op)?;
        self.calls.push(call);
        self.next_tx += 1;
        Ok(TxOutcome {
            hash: B256::with_last_byte(self.next_tx),
            block_number: Some(100 + u64::from(self.next_tx)),
            success: !self.reverts.contains(op),
        })
    }
}

#[derive(Clone, Default)]
pub struct Chains {
    ledger: Arc<Mutex<Ledger>>,
}

impl Chains {
    pub fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.ledger().calls.clone()
    }

    pub fn clients(&self) -> ChainClients<FakeParent, FakeChild> {
        ChainClients {
            parent: FakeParent(self.clone()),
            child: FakeChild(self.clone()),
        }
    }
}

pub struct FakeParent(Chains);

pub struct FakeChild(Chains);

impl ParentChain for FakeParent {
    async fn chain_id(&self) -> Result<u64> {
        let ledger = self.0.ledger();
        ledger.check("parent_chain_id")?;
        Ok(ledger.parent_chain_id)
    }

    async fn gas_price(&self) -> Result<u128> {
        self.0.ledger().check("gas_price")?;
        Ok(GAS_PRICE)
    }

    async fn transfer(&self, to: Address, value: U256) -> Result<TxOutcome> {
        self.0.ledger().mine("transfer", Call::Transfer(to, value))
    }

    async fn deposit_eth(&self, inbox: Address, value: U256) -> Result<TxOutcome> {
        assert_eq!(inbox, INBOX);
        let mut ledger = self.0.ledger();
        let outcome = ledger.mine("deposit_eth", Call::DepositEth(value))?;
        if outcome.success {
            let delay = ledger.credit_delay;
            ledger.in_flight = Some((value, delay));
        }
        Ok(outcome)
    }

    async fn token_decimals(&self, token: Address) -> Result<u8> {
        assert_eq!(token, FEE_TOKEN);
        Ok(self.0.ledger().token_decimals)
    }

    async fn token_allowance(&self, token: Address, spender: Address) -> Result<U256> {
        assert_eq!((token, spender), (FEE_TOKEN, INBOX));
        Ok(self.0.ledger().allowance)
    }

    async fn approve_token(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TxOutcome> {
        assert_eq!((token, spender), (FEE_TOKEN, INBOX));
        let mut ledger = self.0.ledger();
        let outcome = ledger.mine("approve", Call::Approve(amount))?;
        if outcome.success {
            ledger.allowance = amount;
        }
        Ok(outcome)
    }

    async fn deposit_erc20(&self, inbox: Address, amount: U256) -> Result<TxOutcome> {
        assert_eq!(inbox, INBOX);
        let mut ledger = self.0.ledger();
        let outcome = ledger.mine("deposit_erc20", Call::DepositErc20(amount))?;
        if outcome.success {
            let delay = ledger.credit_delay;
            ledger.in_flight = Some((amount, delay));
        }
        Ok(outcome)
    }
}

impl ChildChain for FakeChild {
    fn signer(&self) -> Address {
        self.0.ledger().child_signer
    }

    async fn chain_id(&self) -> Result<u64> {
        let ledger = self.0.ledger();
        ledger.check("child_chain_id")?;
        Ok(ledger.child_chain_id)
    }

    async fn balance(&self, account: Address) -> Result<U256> {
        assert_eq!(account, OWNER);
        let mut ledger = self.0.ledger();
        ledger.check("balance")?;
        ledger.balance_queries += 1;
        match ledger.in_flight.take() {
            Some((amount, 0)) => ledger.owner_balance += amount,
            Some((amount, remaining)) => ledger.in_flight = Some((amount, remaining - 1)),
            None => {}
        }
        Ok(ledger.owner_balance)
    }

    async fn is_chain_owner(&self, account: Address) -> Result<bool> {
        let ledger = self.0.ledger();
        ledger.check("is_chain_owner")?;
        Ok(ledger.chain_owners.contains(&account))
    }

    async fn configure(&self, call: ConfigCall) -> Result<TxOutcome> {
        let op = match call {
            ConfigCall::MinimumBaseFee(_) => "min_base_fee",
            ConfigCall::NetworkFeeAccount(_) => "network_fee",
            ConfigCall::InfraFeeAccount(_) => "infra_fee",
            ConfigCall::ParentPricePerUnit(_) => "price_per_unit",
        };
        self.0.ledger().mine(op, Call::Configure(call))
    }
}

pub fn configuration_calls() -> Vec<Call> {
    vec![
        Call::Configure(ConfigCall::MinimumBaseFee(U256::from(100_000_000u64))),
        Call::Configure(ConfigCall::NetworkFeeAccount(NETWORK_FEE)),
        Call::Configure(ConfigCall::InfraFeeAccount(INFRA_FEE)),
        Call::Configure(ConfigCall::ParentPricePerUnit(U256::from(GAS_PRICE))),
    ]
}
