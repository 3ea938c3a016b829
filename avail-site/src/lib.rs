// A site is one independently failing replica holder. The transaction manager
// talks to sites only through the Site trait: it asks questions (is a copy
// recovering? who would this request conflict with?) and hands over requests
// to execute. All lock and version state lives behind the trait and is only
// ever mutated by execute, fail and recover.
//
// The contract between check_conflict and execute is the one the manager
// relies on for available copies: the manager asks every replica first and
// executes only once all of them have come back empty, so execute may assume
// the request does not conflict.

use std::collections::BTreeSet;

use avail_base::{Request, Resource, Result, SiteId, TxnId};

mod mem;

#[cfg(test)]
mod test;

pub use mem::{MemSite, ResourceSpec};

pub trait Site {
    fn site_id(&self) -> SiteId;

    /// Transactions currently holding locks that `request` would conflict
    /// with. Empty means no conflict. Never includes the requester itself.
    fn check_conflict(&self, request: &Request) -> BTreeSet<TxnId>;

    /// Execute a request previously cleared by check_conflict. Returns the
    /// text of the response, if the request has one.
    fn execute(&mut self, request: &Request) -> Result<Option<String>>;

    /// Go down: volatile state (locks, buffered writes) is lost.
    fn fail(&mut self);

    /// Come back up. Replicated copies stay unreadable until they see a
    /// fresh committed write.
    fn recover(&mut self);

    fn is_running(&self) -> bool;
    fn contains_resource(&self, resource: &Resource) -> bool;
    fn is_recovering(&self, resource: &Resource) -> bool;

    /// Remember the current committed state for a read-only transaction.
    fn create_snapshot(&mut self, txn: &TxnId);

    /// Whether `txn` holds a snapshot here that can answer reads of
    /// `resource`. A copy that was recovering when the snapshot was taken
    /// is never covered.
    fn snapshot_covers(&self, txn: &TxnId, resource: &Resource) -> bool;
}

pub type BoxSite = Box<dyn Site>;
