//! Setup configuration and per-run settings.
//!
//! Nothing in here reads the environment: the binary resolves flags and
//! environment variables into a [`Settings`] and hands it down.

use std::{fs, path::Path, path::PathBuf};

use alloy::primitives::{
    utils::{parse_ether, parse_units},
    Address, U256,
};
use serde::Deserialize;

use crate::{
    error::{Result, SetupError},
    poller::PollSettings,
    state::FundingRole,
};

/// The chain description written by the deployment tooling
/// (`orbitSetupScriptConfig.json`). Fields this crate has no use for are
/// ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupConfig {
    pub chain_id: u64,
    pub parent_chain_id: u64,
    pub chain_owner: Address,
    pub batch_poster: Address,
    pub staker: Address,
    pub inbox: Address,
    /// Zero when the child chain uses the parent's native asset.
    #[serde(default)]
    pub native_token: Address,
    #[serde(rename = "minL2BaseFee", deserialize_with = "number_or_string")]
    pub min_base_fee: U256,
    pub network_fee_receiver: Address,
    pub infrastructure_fee_collector: Address,
}

impl SetupConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|err| {
            SetupError::config(format!("cannot read {}: {err}", path.display()))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|err| SetupError::config(format!("invalid setup configuration: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chain_id == 0 {
            return Err(SetupError::config("chainId must be set"));
        }
        if self.parent_chain_id == 0 {
            return Err(SetupError::config("parentChainId must be set"));
        }
        if self.chain_id == self.parent_chain_id {
            return Err(SetupError::config("chainId and parentChainId must differ"));
        }
        for (name, address) in [
            ("chainOwner", self.chain_owner),
            ("batchPoster", self.batch_poster),
            ("staker", self.staker),
            ("inbox", self.inbox),
        ] {
            if address.is_zero() {
                return Err(SetupError::config(format!("{name} must not be the zero address")));
            }
        }
        Ok(())
    }

    pub fn funding_address(&self, role: FundingRole) -> Address {
        match role {
            FundingRole::BatchPoster => self.batch_poster,
            FundingRole::Staker => self.staker,
        }
    }

    pub fn uses_native_eth(&self) -> bool {
        self.native_token.is_zero()
    }
}

/// The deployment tooling writes fees as JSON numbers; large values may come
/// through as decimal or hex strings.
fn number_or_string<'de, D>(deserializer: D) -> std::result::Result<U256, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(value) => Ok(U256::from(value)),
        Raw::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Amount written as a decimal string ("0.4") and kept alongside its value
/// in 18-decimal base units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Amount {
    pub display: String,
    pub wei: U256,
}

impl Amount {
    pub fn parse(display: &str) -> Result<Self> {
        let wei = parse_ether(display)
            .map_err(|err| SetupError::config(format!("invalid amount {display:?}: {err}")))?;
        if wei.is_zero() {
            return Err(SetupError::config(format!("amount {display:?} must be positive")));
        }
        Ok(Self {
            display: display.to_owned(),
            wei,
        })
    }

    /// Value in base units of a token with `decimals` decimals.
    pub fn in_units(&self, decimals: u8) -> Result<U256> {
        parse_units(&self.display, decimals)
            .map(Into::into)
            .map_err(|err| SetupError::config(format!("invalid amount {:?}: {err}", self.display)))
    }
}

/// Everything a run needs besides the chain clients.
#[derive(Debug, Clone)]
pub struct Settings {
    pub setup: SetupConfig,
    pub checkpoint_path: PathBuf,
    /// Sent to every funding role on the parent chain.
    pub funding_amount: Amount,
    /// Seeded into the chain owner's account on the child chain.
    pub deposit_amount: Amount,
    pub poll: PollSettings,
}

impl Settings {
    pub fn new(setup: SetupConfig, checkpoint_path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            setup,
            checkpoint_path: checkpoint_path.into(),
            funding_amount: Amount::parse("0.3")?,
            deposit_amount: Amount::parse("0.4")?,
            poll: PollSettings::default(),
        })
    }
}
