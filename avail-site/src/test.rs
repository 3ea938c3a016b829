use crate::{MemSite, ResourceSpec, Site};
use avail_base::{DumpTarget, Request, Resource, Result, SiteId, TxnId};
use test_log::test;

fn spec(name: &str, initial: i64, replicated: bool) -> ResourceSpec {
    ResourceSpec {
        resource: Resource::new(name),
        initial,
        replicated,
    }
}

fn site() -> MemSite {
    MemSite::new(
        SiteId(2),
        vec![spec("x1", 10, false), spec("x2", 20, true), spec("x4", 40, true)],
    )
}

fn commit(txn: &str) -> Request {
    Request::Commit { txn: TxnId::new(txn) }
}

#[test]
fn test_membership() {
    let s = site();
    assert_eq!(s.site_id(), SiteId(2));
    assert!(s.is_running());
    assert!(s.contains_resource(&Resource::new("x1")));
    assert!(!s.contains_resource(&Resource::new("x3")));
    assert!(!s.is_recovering(&Resource::new("x2")));
}

#[test]
fn test_read_locks_share_write_locks_exclude() -> Result<()> {
    let mut s = site();
    let r1 = Request::read("T1", "x2");
    let r2 = Request::read("T2", "x2");
    assert!(s.check_conflict(&r1).is_empty());
    assert_eq!(s.execute(&r1)?, Some("x2: 20 (site 2)".to_string()));
    assert!(s.check_conflict(&r2).is_empty());
    s.execute(&r2)?;

    let w3 = Request::write("T3", "x2", 5);
    let conflicts = s.check_conflict(&w3);
    assert_eq!(
        conflicts.into_iter().collect::<Vec<_>>(),
        vec![TxnId::new("T1"), TxnId::new("T2")]
    );
    Ok(())
}

#[test]
fn test_sole_reader_upgrades() -> Result<()> {
    let mut s = site();
    s.execute(&Request::read("T1", "x1"))?;
    let w = Request::write("T1", "x1", 11);
    assert!(s.check_conflict(&w).is_empty());
    s.execute(&w)?;
    // Reads its own buffered write; others see the writer.
    assert_eq!(s.execute(&Request::read("T1", "x1"))?, Some("x1: 11 (site 2)".to_string()));
    let conflicts = s.check_conflict(&Request::read("T2", "x1"));
    assert!(conflicts.contains(&TxnId::new("T1")));
    Ok(())
}

#[test]
fn test_commit_installs_version_and_releases() -> Result<()> {
    let mut s = site();
    s.execute(&Request::write("T1", "x4", 44))?;
    assert_eq!(s.committed_value(&Resource::new("x4")), Some(40));
    s.execute(&commit("T1"))?;
    assert_eq!(s.committed_value(&Resource::new("x4")), Some(44));
    assert!(!s.holds_any_lock(&TxnId::new("T1")));
    assert!(s.check_conflict(&Request::write("T2", "x4", 1)).is_empty());
    Ok(())
}

#[test]
fn test_abort_discards_buffered_writes() -> Result<()> {
    let mut s = site();
    s.execute(&Request::write("T1", "x4", 44))?;
    s.execute(&Request::abort("T1"))?;
    s.execute(&commit("T1"))?;
    assert_eq!(s.committed_value(&Resource::new("x4")), Some(40));
    assert!(!s.holds_any_lock(&TxnId::new("T1")));
    Ok(())
}

#[test]
fn test_snapshot_reads_see_begin_state() -> Result<()> {
    let mut s = site();
    s.create_snapshot(&TxnId::new("R1"));
    s.execute(&Request::write("T1", "x2", 99))?;
    s.execute(&commit("T1"))?;
    let ro = Request::ReadOnlyRead {
        txn: TxnId::new("R1"),
        resource: Resource::new("x2"),
    };
    assert_eq!(s.execute(&ro)?, Some("x2: 20 (site 2, snapshot)".to_string()));
    // A read-only read takes no lock.
    assert!(s.check_conflict(&Request::write("T2", "x2", 1)).is_empty());
    Ok(())
}

#[test]
fn test_read_only_read_without_snapshot_is_an_error() {
    let mut s = site();
    let ro = Request::ReadOnlyRead {
        txn: TxnId::new("R9"),
        resource: Resource::new("x2"),
    };
    assert!(s.execute(&ro).is_err());
}

#[test]
fn test_fail_drops_locks_and_buffers() -> Result<()> {
    let mut s = site();
    s.execute(&Request::write("T1", "x2", 7))?;
    s.fail();
    assert!(!s.is_running());
    assert!(s.execute(&Request::read("T2", "x2")).is_err());
    s.recover();
    assert!(s.is_running());
    assert!(!s.holds_any_lock(&TxnId::new("T1")));
    // The buffered write is gone: committing it installs nothing.
    s.execute(&commit("T1"))?;
    assert_eq!(s.committed_value(&Resource::new("x2")), Some(20));
    Ok(())
}

#[test]
fn test_recovery_marks_only_replicated_copies() -> Result<()> {
    let mut s = site();
    s.fail();
    s.recover();
    assert!(!s.is_recovering(&Resource::new("x1")));
    assert!(s.is_recovering(&Resource::new("x2")));
    assert!(s.is_recovering(&Resource::new("x4")));
    s.execute(&Request::write("T1", "x2", 21))?;
    s.execute(&commit("T1"))?;
    assert!(!s.is_recovering(&Resource::new("x2")));
    assert!(s.is_recovering(&Resource::new("x4")));
    Ok(())
}

#[test]
fn test_snapshot_leaves_out_recovering_copies() -> Result<()> {
    let mut s = site();
    s.fail();
    s.recover();
    let r1 = TxnId::new("R1");
    s.create_snapshot(&r1);
    assert!(s.snapshot_covers(&r1, &Resource::new("x1")));
    assert!(!s.snapshot_covers(&r1, &Resource::new("x2")));
    assert!(!s.snapshot_covers(&r1, &Resource::new("x3")));
    assert!(!s.snapshot_covers(&TxnId::new("R2"), &Resource::new("x1")));

    // Still left out after a write makes the copy current again.
    s.execute(&Request::write("T1", "x2", 21))?;
    s.execute(&commit("T1"))?;
    assert!(!s.is_recovering(&Resource::new("x2")));
    assert!(!s.snapshot_covers(&r1, &Resource::new("x2")));
    let ro = Request::ReadOnlyRead {
        txn: r1.clone(),
        resource: Resource::new("x2"),
    };
    assert!(s.execute(&ro).is_err());

    s.execute(&commit("R1"))?;
    assert!(!s.snapshot_covers(&r1, &Resource::new("x1")));
    Ok(())
}

#[test]
fn test_unchecked_second_writer_keeps_both_locks() -> Result<()> {
    let mut s = site();
    s.execute(&Request::write("T1", "x2", 1))?;
    s.execute(&Request::write("T2", "x2", 2))?;
    let conflicts = s.check_conflict(&Request::write("T3", "x2", 3));
    assert_eq!(
        conflicts.into_iter().collect::<Vec<_>>(),
        vec![TxnId::new("T1"), TxnId::new("T2")]
    );
    assert_eq!(
        s.check_conflict(&Request::read("T1", "x2")).into_iter().collect::<Vec<_>>(),
        vec![TxnId::new("T2")]
    );

    s.execute(&commit("T1"))?;
    assert_eq!(s.committed_value(&Resource::new("x2")), Some(1));
    assert!(s.holds_any_lock(&TxnId::new("T2")));
    s.execute(&commit("T2"))?;
    assert_eq!(s.committed_value(&Resource::new("x2")), Some(2));
    assert!(s.check_conflict(&Request::write("T3", "x2", 3)).is_empty());
    Ok(())
}

#[test]
fn test_dump() -> Result<()> {
    let mut s = site();
    assert_eq!(
        s.execute(&Request::Dump(DumpTarget::All))?,
        Some("site 2 - x1: 10, x2: 20, x4: 40".to_string())
    );
    assert_eq!(
        s.execute(&Request::Dump(DumpTarget::Resource(Resource::new("x4"))))?,
        Some("site 2 - x4: 40".to_string())
    );
    assert_eq!(s.execute(&Request::Dump(DumpTarget::Resource(Resource::new("x3"))))?, None);
    Ok(())
}

#[test]
fn test_manager_only_requests_are_refused() {
    let mut s = site();
    assert!(s.execute(&Request::begin("T1")).is_err());
    assert!(s.execute(&Request::end("T1")).is_err());
    assert!(s.execute(&Request::fail(2)).is_err());
}
