// The transaction manager of a replicated database, as a simulation.
//
// A stream of ticks arrives, each a batch of requests: begin, read, write,
// end, abort, fail a site, recover a site, dump. Sites hold full or partial
// replicas of a set of named resources and fail independently. The manager
// decides, per request, whether it runs now, waits, kills its transaction,
// or is rejected.
//
// The protocols:
//
//  - Wait-die for deadlock avoidance. Transactions are ordered by the
//    logical timestamp handed out at begin. A requester that is younger than
//    every lock holder it conflicts with is aborted; otherwise it waits.
//
//  - Available copies for replication. A read is served by any one running
//    replica whose copy is not recovering. A write must be granted by every
//    running, non-recovering replica and is then applied at every running
//    replica.
//
//  - Snapshot reads for read-only transactions. At begin, every running
//    site takes a snapshot; reads go only to those sites and never lock.
//
//  - Failure and recovery. A failed site loses its locks and buffered
//    writes, so every transaction visiting it is aborted. A recovered site
//    accepts writes straight away but serves reads of a replicated resource
//    only once a write to it has committed there.
//
// Waiting is not blocking: a request that cannot run is queued and replayed
// at the start of the next tick, in arrival order. Nothing here is
// concurrent; one request is fully processed before the next begins.

mod coordinator;
mod dispatch;
mod error;
mod lifecycle;
mod manager;
mod outcome;
mod registry;
mod resolver;
mod topology;
mod waiting;


pub use error::{NotLiving, TxnError};
pub use manager::TransactionManager;
pub use outcome::{AbortReason, Event, Outcome, QueueReason};
pub use registry::{Registry, TxnRecord, TxnStatus};
pub use topology::Topology;
pub use waiting::WaitingList;
