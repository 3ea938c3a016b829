use crate::Timestamp;

/// Hands out strictly increasing timestamps. There is one clock per
/// transaction manager; nothing else is allowed to mint a Timestamp for a
/// transaction, which is what makes every wait-die comparison decisive.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct LogicalClock {
    next: u64,
}

impl LogicalClock {
    pub fn new() -> Self {
        LogicalClock { next: 0 }
    }

    pub fn tick(&mut self) -> Timestamp {
        let ts = Timestamp(self.next);
        self.next += 1;
        ts
    }
}
