//! Resume state persisted between runs.
//!
//! The record is small JSON keyed by the child chain id. It only ever moves
//! forward: a flag flips to `true` once its step is confirmed and stays there
//! until the whole record is discarded because the target chain changed.

use std::{
    collections::BTreeMap,
    fmt, fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, SetupError};

/// Account funded on the parent chain before the child chain can operate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FundingRole {
    BatchPoster,
    Staker,
}

impl FundingRole {
    pub const ALL: [FundingRole; 2] = [FundingRole::BatchPoster, FundingRole::Staker];

    /// Key under `fundingDone` in the persisted record.
    pub fn key(self) -> &'static str {
        match self {
            FundingRole::BatchPoster => "batchPoster",
            FundingRole::Staker => "staker",
        }
    }
}

impl fmt::Display for FundingRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeState {
    #[serde(default, deserialize_with = "null_as_default")]
    pub chain_id: u64,
    /// Keyed by role name rather than [`FundingRole`] so that records written
    /// with roles this build does not know survive a load/save cycle.
    #[serde(default, alias = "etherSent", deserialize_with = "null_flags_as_false")]
    pub funding_done: BTreeMap<String, bool>,
    #[serde(
        default,
        alias = "nativeTokenDeposit",
        deserialize_with = "null_as_default"
    )]
    pub native_token_deposit_done: bool,
    #[serde(default, alias = "orbitConfig", deserialize_with = "null_as_default")]
    pub chain_config_done: bool,
}

impl RuntimeState {
    pub fn fresh(chain_id: u64) -> Self {
        let mut state = Self {
            chain_id,
            funding_done: BTreeMap::new(),
            native_token_deposit_done: false,
            chain_config_done: false,
        };
        state.repair();
        state
    }

    /// Fill in anything an older or partial record left out.
    pub fn repair(&mut self) {
        for role in FundingRole::ALL {
            self.funding_done.entry(role.key().to_owned()).or_insert(false);
        }
    }

    pub fn funded(&self, role: FundingRole) -> bool {
        self.funding_done.get(role.key()).copied().unwrap_or(false)
    }

    pub fn mark_funded(&mut self, role: FundingRole) {
        self.funding_done.insert(role.key().to_owned(), true);
    }

    pub fn is_complete(&self) -> bool {
        FundingRole::ALL.iter().all(|role| self.funded(*role))
            && self.native_token_deposit_done
            && self.chain_config_done
    }
}

/// JSON `null` reads the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Like [`null_as_default`], applied to the whole map and to each of its flags.
fn null_flags_as_false<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<String, bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let flags = Option::<BTreeMap<String, Option<bool>>>::deserialize(deserializer)?;
    Ok(flags
        .unwrap_or_default()
        .into_iter()
        .map(|(role, done)| (role, done.unwrap_or(false)))
        .collect())
}

/// Loads and saves [`RuntimeState`] at a fixed path.
///
/// One run at a time: nothing guards against two processes sharing a file.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the record for `target_chain_id`, or a fresh one when nothing
    /// usable is on disk.
    pub fn load(&self, target_chain_id: u64) -> Result<RuntimeState> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no resume state, starting fresh");
                return Ok(RuntimeState::fresh(target_chain_id));
            }
            Err(err) => return Err(SetupError::checkpoint_io(&self.path, err)),
        };

        let mut state: RuntimeState =
            serde_json::from_str(&raw).map_err(|source| SetupError::CheckpointFormat {
                path: self.path.clone(),
                source,
            })?;
        state.repair();

        if state.chain_id != target_chain_id {
            warn!(
                recorded = state.chain_id,
                target = target_chain_id,
                "a different chain configuration than last time was detected, discarding resume state"
            );
            return Ok(RuntimeState::fresh(target_chain_id));
        }

        info!(
            path = %self.path.display(),
            "resume state found, continuing from where the last run stopped"
        );
        Ok(state)
    }

    /// Overwrites the record. Goes through a temporary sibling file so an
    /// interrupted write leaves the previous record intact.
    pub fn save(&self, state: &RuntimeState) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|err| SetupError::checkpoint_io(dir, err))?;
        }

        let json = serde_json::to_string_pretty(state).map_err(|source| {
            SetupError::CheckpointFormat {
                path: self.path.clone(),
                source,
            }
        })?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|err| SetupError::checkpoint_io(&tmp, err))?;
        fs::rename(&tmp, &self.path).map_err(|err| SetupError::checkpoint_io(&self.path, err))?;

        debug!(path = %self.path.display(), "resume state saved");
        Ok(())
    }
}
