use std::path::PathBuf;

use alloy::{
    primitives::TxHash,
    providers::PendingTransactionError,
    transports::TransportError,
};
use thiserror::Error;

/// Everything that can stop a setup run.
#[derive(Debug, Error)]
pub enum SetupError {
    /// Missing or invalid input. Raised before any step runs.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("{chain} chain RPC reports chain id {actual}, configuration expects {expected}")]
    NetworkMismatch {
        chain: &'static str,
        expected: u64,
        actual: u64,
    },

    /// The signer may not perform a privileged action.
    #[error("authorization error: {0}")]
    Authorization(String),

    /// A transaction was mined but its receipt reports failure.
    #[error("transaction {hash} failed: {action}")]
    TransactionFailure { action: String, hash: TxHash },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Contract(#[from] alloy::contract::Error),

    #[error(transparent)]
    PendingTransaction(#[from] PendingTransactionError),

    #[error("checkpoint I/O error at {}", path.display())]
    CheckpointIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("checkpoint at {} is not a valid resume state", path.display())]
    CheckpointFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("gave up waiting for confirmation after {0} unconfirmed observations")]
    PollAborted(u32),
}

impl SetupError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn checkpoint_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CheckpointIo {
            path: path.into(),
            source,
        }
    }

    /// Whether the failure came from the RPC layer rather than the chain itself.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Contract(_) | Self::PendingTransaction(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SetupError>;
