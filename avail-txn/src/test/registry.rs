use avail_base::{SiteId, TxnId};
use test_log::test;

use crate::{NotLiving, Registry, TxnError, TxnStatus};

fn t(name: &str) -> TxnId {
    TxnId::new(name)
}

#[test]
fn test_begin_assigns_increasing_timestamps() {
    let mut reg = Registry::new();
    let a = reg.begin(&t("T1"), false).expect("begin").timestamp;
    let b = reg.begin(&t("T2"), true).expect("begin").timestamp;
    assert!(a.is_older_than(b));
    assert!(reg.get(&t("T2")).expect("get").read_only);
    assert_eq!(reg.len(), 2);
}

#[test]
fn test_duplicate_begin_is_rejected() {
    let mut reg = Registry::new();
    reg.begin(&t("T1"), false).expect("begin");
    assert_eq!(
        reg.begin(&t("T1"), true).err(),
        Some(TxnError::DuplicateTransaction(t("T1")))
    );
    // Even after it finishes, the name stays taken.
    reg.set_status(&t("T1"), TxnStatus::Committed).expect("commit");
    assert!(reg.begin(&t("T1"), false).is_err());
}

#[test]
fn test_require_living_distinguishes_causes() {
    let mut reg = Registry::new();
    reg.begin(&t("T1"), false).expect("begin");
    reg.begin(&t("T2"), false).expect("begin");
    reg.set_status(&t("T1"), TxnStatus::Aborted).expect("abort");
    reg.set_status(&t("T2"), TxnStatus::Committed).expect("commit");
    assert_eq!(
        reg.require_living(&t("T1")).err(),
        Some(TxnError::TransactionNotLiving(t("T1"), NotLiving::Aborted))
    );
    assert_eq!(
        reg.require_living(&t("T2")).err(),
        Some(TxnError::TransactionNotLiving(t("T2"), NotLiving::Committed))
    );
    assert_eq!(
        reg.require_living(&t("T3")).err(),
        Some(TxnError::TransactionNotLiving(t("T3"), NotLiving::NotBegun))
    );
    assert_eq!(
        reg.get(&t("T3")).err(),
        Some(TxnError::TransactionNotFound(t("T3")))
    );
}

#[test]
fn test_visiting_mirrors_visited() {
    let mut reg = Registry::new();
    reg.begin(&t("T1"), false).expect("begin");
    reg.begin(&t("T2"), false).expect("begin");
    reg.add_visited_site(&t("T1"), SiteId(1)).expect("visit");
    reg.add_visited_site(&t("T1"), SiteId(3)).expect("visit");
    reg.add_visited_site(&t("T2"), SiteId(3)).expect("visit");
    assert!(reg.is_consistent());
    assert_eq!(reg.visiting(SiteId(3)), vec![t("T1"), t("T2")]);
    assert_eq!(reg.visiting(SiteId(1)), vec![t("T1")]);
    assert!(reg.visiting(SiteId(2)).is_empty());

    reg.set_status(&t("T1"), TxnStatus::Committed).expect("commit");
    assert!(reg.is_consistent());
    assert!(reg.visiting(SiteId(1)).is_empty());
    assert_eq!(reg.visiting(SiteId(3)), vec![t("T2")]);
    // The visited set is kept, frozen.
    assert_eq!(reg.get(&t("T1")).expect("get").visited.len(), 2);
}

#[test]
fn test_finished_transactions_are_frozen() {
    let mut reg = Registry::new();
    reg.begin(&t("T1"), false).expect("begin");
    reg.add_visited_site(&t("T1"), SiteId(1)).expect("visit");
    reg.set_status(&t("T1"), TxnStatus::Aborted).expect("abort");
    assert!(reg.add_visited_site(&t("T1"), SiteId(2)).is_err());
    assert!(reg.record_snapshot(&t("T1"), SiteId(2)).is_err());
    // Status never reverses.
    assert!(reg.set_status(&t("T1"), TxnStatus::Committed).is_err());
    let record = reg.get(&t("T1")).expect("get");
    assert_eq!(record.status, TxnStatus::Aborted);
    assert_eq!(record.visited.iter().collect::<Vec<_>>(), vec![SiteId(1)]);
}

#[test]
fn test_snapshot_sites_are_not_visits() {
    let mut reg = Registry::new();
    reg.begin(&t("R1"), true).expect("begin");
    reg.record_snapshot(&t("R1"), SiteId(4)).expect("snapshot");
    let record = reg.get(&t("R1")).expect("get");
    assert!(record.visited.is_empty());
    assert!(record.touched_sites().contains(SiteId(4)));
    assert!(reg.visiting(SiteId(4)).is_empty());
    assert!(reg.is_consistent());
}

#[test]
fn test_deferred_releases_are_taken_once() {
    let mut reg = Registry::new();
    reg.defer_release(SiteId(3), &t("R2"));
    reg.defer_release(SiteId(3), &t("R1"));
    reg.defer_release(SiteId(3), &t("R1"));
    reg.defer_release(SiteId(5), &t("R1"));
    assert_eq!(reg.take_unreleased(SiteId(3)), vec![t("R1"), t("R2")]);
    assert!(reg.take_unreleased(SiteId(3)).is_empty());
    assert_eq!(reg.take_unreleased(SiteId(5)), vec![t("R1")]);
    assert!(reg.take_unreleased(SiteId(1)).is_empty());
}
