use std::io::Write;

use tracing::{info, warn};

use avail_base::{err, Result};
use avail_lang::{parse_script, Tick};
use avail_txn::{Event, Outcome, TransactionManager, TxnStatus};

use crate::{build_manager, SimConfig};

/// Running counts over everything a simulation has reported.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Tally {
    pub ticks: usize,
    pub done: usize,
    pub queued: usize,
    pub aborted: usize,
    pub rejected: usize,
    pub replayed: usize,
}

impl Tally {
    fn count(&mut self, event: &Event) {
        if event.replayed {
            self.replayed += 1;
        }
        match event.outcome {
            Outcome::Done(_) => self.done += 1,
            Outcome::Queued(_) => self.queued += 1,
            Outcome::Aborted(_) => self.aborted += 1,
            Outcome::Rejected(_) => self.rejected += 1,
        }
    }
}

pub struct Simulation {
    tm: TransactionManager,
    config: SimConfig,
    tally: Tally,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Result<Simulation> {
        let tm = build_manager(&config)?;
        Ok(Simulation {
            tm,
            config,
            tally: Tally::default(),
        })
    }

    pub fn manager(&self) -> &TransactionManager {
        &self.tm
    }

    pub fn tally(&self) -> Tally {
        self.tally
    }

    /// Feeds one tick to the manager and prints what happened, one line per
    /// event, prefixed with the tick's line number.
    pub fn run_tick(&mut self, tick: &Tick, out: &mut impl Write) -> Result<Vec<Event>> {
        let events = self.tm.handle_requests(tick.requests.iter().cloned())?;
        self.tally.ticks += 1;
        for event in events.iter() {
            self.tally.count(event);
            if event.replayed && event.outcome.is_queued() && !self.config.show_retries {
                continue;
            }
            writeln!(out, "{:>4}: {}", tick.line, event)?;
            if let Outcome::Rejected(e) = &event.outcome {
                if self.config.strict && !event.replayed && !e.is_warning() {
                    return Err(err(format!("line {}: {}: {}", tick.line, event.request, e)));
                }
            }
        }
        Ok(events)
    }

    pub fn run_script(&mut self, src: &str, out: &mut impl Write) -> Result<Tally> {
        let ticks = parse_script(src)?;
        info!(target: "avail::runner", ticks = ticks.len(), "running script");
        for tick in ticks.iter() {
            self.run_tick(tick, out)?;
        }
        self.summarize(out)?;
        Ok(self.tally)
    }

    /// Reports what is left over: requests still waiting and transactions
    /// that never finished.
    pub fn summarize(&self, out: &mut impl Write) -> Result<()> {
        let t = self.tally;
        writeln!(
            out,
            "{} ticks: {} done, {} queued, {} aborted, {} rejected ({} retries)",
            t.ticks, t.done, t.queued, t.aborted, t.rejected, t.replayed
        )?;
        for request in self.tm.waiting().iter() {
            writeln!(out, "still waiting: {}", request)?;
        }
        let unfinished: Vec<String> = self
            .tm
            .registry()
            .iter()
            .filter(|r| r.status == TxnStatus::Running)
            .map(|r| r.id.to_string())
            .collect();
        if !unfinished.is_empty() {
            warn!(target: "avail::runner", count = unfinished.len(), "transactions left running");
            writeln!(out, "still running: {}", unfinished.join(", "))?;
        }
        Ok(())
    }
}
