use std::collections::BTreeSet;
use std::fmt;

use avail_base::{Request, TxnId};

use crate::TxnError;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum QueueReason {
    /// An earlier queued request is in the way.
    BehindQueued(Request),
    /// Some replica has the resource locked by an older transaction.
    LockConflict(BTreeSet<TxnId>),
    /// No replica is up (or, for reads, up and not recovering).
    NoSiteAvailable,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AbortReason {
    /// Wait-die: the requester was younger than every lock holder.
    WaitDie { holders: BTreeSet<TxnId> },
}

/// What became of one request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// Handled. The lines are whatever the request produced to report.
    Done(Vec<String>),
    Queued(QueueReason),
    /// The request's transaction was aborted because of it.
    Aborted(AbortReason),
    Rejected(TxnError),
}

impl Outcome {
    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Done(_))
    }
    pub fn is_queued(&self) -> bool {
        matches!(self, Outcome::Queued(_))
    }
    pub fn is_aborted(&self) -> bool {
        matches!(self, Outcome::Aborted(_))
    }
    pub fn is_rejected(&self) -> bool {
        matches!(self, Outcome::Rejected(_))
    }
}

/// One line of the trace: a request, where it came from, and what happened.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Event {
    pub request: Request,
    pub outcome: Outcome,
    /// True if the request was replayed from the waiting list.
    pub replayed: bool,
}

fn join_txns(txns: &BTreeSet<TxnId>) -> String {
    txns.iter().map(|t| t.as_str()).collect::<Vec<_>>().join(", ")
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Done(lines) if lines.is_empty() => write!(f, "ok"),
            Outcome::Done(lines) => write!(f, "{}", lines.join("; ")),
            Outcome::Queued(QueueReason::BehindQueued(r)) => {
                write!(f, "waiting behind queued {}", r)
            }
            Outcome::Queued(QueueReason::LockConflict(holders)) => {
                write!(f, "waiting for locks held by [{}]", join_txns(holders))
            }
            Outcome::Queued(QueueReason::NoSiteAvailable) => {
                write!(f, "waiting: no site has the data available")
            }
            Outcome::Aborted(AbortReason::WaitDie { holders }) => {
                write!(f, "aborted: younger than lock holders [{}]", join_txns(holders))
            }
            Outcome::Rejected(e) if e.is_warning() => write!(f, "warning: {}", e),
            Outcome::Rejected(e) => write!(f, "error: {}", e),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let from = if self.replayed { "retry " } else { "" };
        write!(f, "{}{} => {}", from, self.request, self.outcome)
    }
}
