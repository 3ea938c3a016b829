mod clock;
mod error;
mod ids;
mod request;
mod siteset;

#[cfg(test)]
mod test;

pub use clock::LogicalClock;
pub use error::{err, Error, Result};
pub use ids::{Resource, SiteId, Timestamp, TxnId};
pub use request::{DumpTarget, Request, RequestKind};
pub use siteset::SiteSet;
