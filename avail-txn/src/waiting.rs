use std::collections::VecDeque;

use avail_base::{Request, Resource, TxnId};

/// Blocked requests in arrival order.
///
/// A drain pass moves the whole queue aside into `pass` and replays it from
/// the front; anything still blocked is pushed back onto the (now fresh)
/// queue. Removing a transaction's requests removes them from both, so an
/// abort part-way through a pass also cancels that transaction's entries
/// that have not been replayed yet.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WaitingList {
    queue: VecDeque<Request>,
    pass: VecDeque<Request>,
}

impl WaitingList {
    pub fn new() -> Self {
        WaitingList::default()
    }

    pub fn push(&mut self, request: Request) {
        self.queue.push_back(request);
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Request> {
        self.queue.iter()
    }

    /// Starts a drain pass. Any leftovers of an unfinished pass go first.
    pub fn begin_pass(&mut self) {
        let queued = std::mem::take(&mut self.queue);
        self.pass.extend(queued);
    }

    pub fn next_in_pass(&mut self) -> Option<Request> {
        self.pass.pop_front()
    }

    /// Drops every queued or not-yet-replayed request of `txn` and returns
    /// them, earliest arrival first.
    pub fn remove_txn(&mut self, txn: &TxnId) -> Vec<Request> {
        let mut dropped = Vec::new();
        // Anything re-queued during a pass arrived before what the pass has
        // not reached yet.
        for list in [&mut self.queue, &mut self.pass] {
            let (gone, kept): (VecDeque<Request>, VecDeque<Request>) =
                list.drain(..).partition(|r| r.txn() == Some(txn));
            *list = kept;
            dropped.extend(gone);
        }
        dropped
    }

    /// The first queued data request on `resource` that a new read
    /// (`is_write == false`) or write would have to line up behind.
    pub fn first_data_conflict(&self, resource: &Resource, is_write: bool) -> Option<&Request> {
        self.queue.iter().find(|queued| {
            queued.resource() == Some(resource) && (is_write || queued.is_write())
        })
    }

    /// The first queued request belonging to `txn`.
    pub fn first_of_txn(&self, txn: &TxnId) -> Option<&Request> {
        self.queue.iter().find(|queued| queued.txn() == Some(txn))
    }
}
