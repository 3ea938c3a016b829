use crate::{err, LogicalClock, Request, RequestKind, SiteId, SiteSet, Timestamp};
use test_log::test;

#[test]
fn test_error() {
    let e = err("test error");
    assert_eq!(e.message(), "test error");
    assert_eq!(e.to_string(), "test error");
}

#[test]
fn test_clock_strictly_increases() {
    let mut clock = LogicalClock::new();
    let a = clock.tick();
    let b = clock.tick();
    assert!(a.is_older_than(b));
    assert!(!b.is_older_than(a));
    assert_eq!(clock.tick(), Timestamp(2));
}

#[test]
fn test_siteset_basics() {
    let mut set = SiteSet::new();
    assert!(set.is_empty());
    assert!(set.insert(SiteId(3)));
    assert!(!set.insert(SiteId(3)));
    assert!(set.insert(SiteId(64)));
    assert!(set.insert(SiteId(255)));
    assert!(set.insert(SiteId(1)));
    assert_eq!(set.len(), 4);
    assert!(set.contains(SiteId(64)));
    assert!(!set.contains(SiteId(65)));
    let order: Vec<u8> = set.iter().map(|s| s.0).collect();
    assert_eq!(order, vec![1, 3, 64, 255]);
    assert!(set.remove(SiteId(3)));
    assert!(!set.remove(SiteId(3)));
    assert_eq!(set.len(), 3);
}

#[test]
fn test_siteset_algebra() {
    let a: SiteSet = [1, 2, 3].into_iter().map(SiteId).collect();
    let b: SiteSet = [2, 3, 4].into_iter().map(SiteId).collect();
    let mut u = a;
    u.union(&b);
    assert_eq!(u.len(), 4);
    let mut i = a;
    i.intersect(&b);
    assert_eq!(i.iter().collect::<Vec<_>>(), vec![SiteId(2), SiteId(3)]);
    let mut s = a;
    s.subtract(&b);
    assert_eq!(s.iter().collect::<Vec<_>>(), vec![SiteId(1)]);
}

#[test]
fn test_request_accessors() {
    let w = Request::write("T1", "x2", 7);
    assert_eq!(w.kind(), RequestKind::Write);
    assert!(w.is_write());
    assert_eq!(w.txn().map(|t| t.as_str()), Some("T1"));
    assert_eq!(w.resource().map(|r| r.as_str()), Some("x2"));
    assert_eq!(w.to_string(), "W(T1,x2,7)");

    let f = Request::fail(4);
    assert_eq!(f.site(), Some(SiteId(4)));
    assert!(f.txn().is_none());
    assert!(!f.kind().is_site_directed());

    let c = Request::Commit {
        txn: crate::TxnId::new("T1"),
    };
    assert!(c.kind().is_site_directed());
}
