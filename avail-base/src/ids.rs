use std::fmt;

use serde::{Deserialize, Serialize};

// A transaction is named by the client that begins it. Names are unique for
// the lifetime of a simulation: a name once begun can never be begun again,
// even after the transaction has committed or aborted.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct TxnId(pub String);

// Resources are opaque keys. The simulation never looks inside them; sites
// decide which ones they hold.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Resource(pub String);

// Sites are numbered from 1. The number doubles as the site's bit position in
// a SiteSet, so it fits in a byte.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct SiteId(pub u8);

// A logical timestamp. Smaller is older.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub u64);

impl TxnId {
    pub fn new(name: impl Into<String>) -> Self {
        TxnId(name.into())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Resource {
    pub fn new(name: impl Into<String>) -> Self {
        Resource(name.into())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Timestamp {
    pub fn is_older_than(&self, other: Timestamp) -> bool {
        self.0 < other.0
    }
}

impl fmt::Display for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}
