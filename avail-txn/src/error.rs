use std::fmt;

use serde::{Deserialize, Serialize};

use avail_base::{Resource, SiteId, TxnId};

// Why a transaction cannot take part in a request. Each cause gets its own
// message since they mean quite different things to whoever wrote the
// command stream.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum NotLiving {
    Aborted,
    Committed,
    NotBegun,
}

/// Validation failures. These are terminal for the one request that caused
/// them: it is reported and dropped, and nothing is queued.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum TxnError {
    DuplicateTransaction(TxnId),
    TransactionNotFound(TxnId),
    TransactionNotLiving(TxnId, NotLiving),
    ResourceNotFound(Resource),
    SiteNotFound(SiteId),
    SiteAlreadyFailed(SiteId),
    SiteRunning(SiteId),
}

impl TxnError {
    /// Warnings are reported but are not mistakes in the command stream:
    /// failing a site twice changes nothing.
    pub fn is_warning(&self) -> bool {
        matches!(self, TxnError::SiteAlreadyFailed(_))
    }
}

impl fmt::Display for TxnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxnError::DuplicateTransaction(t) => write!(f, "transaction {} already exists", t),
            TxnError::TransactionNotFound(t) => write!(f, "transaction {} does not exist", t),
            TxnError::TransactionNotLiving(t, NotLiving::Aborted) => {
                write!(f, "transaction {} has been aborted", t)
            }
            TxnError::TransactionNotLiving(t, NotLiving::Committed) => {
                write!(f, "transaction {} has been committed", t)
            }
            TxnError::TransactionNotLiving(t, NotLiving::NotBegun) => {
                write!(f, "transaction {} has not begun", t)
            }
            TxnError::ResourceNotFound(r) => write!(f, "no site holds resource {}", r),
            TxnError::SiteNotFound(s) => write!(f, "site {} does not exist", s),
            TxnError::SiteAlreadyFailed(s) => write!(f, "site {} has already failed", s),
            TxnError::SiteRunning(s) => write!(f, "site {} is running, nothing to recover", s),
        }
    }
}

impl std::error::Error for TxnError {}
