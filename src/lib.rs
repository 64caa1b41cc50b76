//! Resumable setup of a freshly deployed Arbitrum Orbit child chain.
//!
//! A run funds the batch poster and staker on the parent chain, seeds the
//! chain owner's account on the child chain through the inbox, then applies
//! the fee configuration through the `ArbOwner` precompile. Progress is
//! checkpointed after every step so an interrupted run can simply be started
//! again.

pub mod bindings;
pub mod chain;
pub mod config;
pub mod configure;
pub mod deposit;
pub mod error;
pub mod poller;
pub mod state;
pub mod step;
pub mod workflow;

pub use chain::{ChainClients, ChildChain, ConfigCall, ParentChain, RpcChain, TxOutcome};
pub use config::{Amount, Settings, SetupConfig};
pub use error::{Result, SetupError};
pub use poller::{increased_by_at_least, strictly_above, wait_until, PollSettings};
pub use state::{CheckpointStore, FundingRole, RuntimeState};
pub use step::Step;
pub use workflow::{preflight, RunReport, StepReport, StepStatus, Workflow, WorkflowAbort};
