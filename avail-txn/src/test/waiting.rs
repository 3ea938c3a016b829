use avail_base::{Request, Resource, TxnId};
use test_log::test;

use crate::WaitingList;

#[test]
fn test_reads_share_writes_exclude() {
    let mut w = WaitingList::new();
    w.push(Request::read("T1", "x2"));
    let x2 = Resource::new("x2");
    assert!(w.first_data_conflict(&x2, false).is_none());
    assert_eq!(w.first_data_conflict(&x2, true), Some(&Request::read("T1", "x2")));
    assert!(w.first_data_conflict(&Resource::new("x4"), true).is_none());

    w.push(Request::write("T2", "x4", 1));
    assert_eq!(
        w.first_data_conflict(&Resource::new("x4"), false),
        Some(&Request::write("T2", "x4", 1))
    );
}

#[test]
fn test_first_of_txn() {
    let mut w = WaitingList::new();
    w.push(Request::read("T1", "x2"));
    w.push(Request::write("T2", "x2", 3));
    w.push(Request::end("T2"));
    assert_eq!(w.first_of_txn(&TxnId::new("T2")), Some(&Request::write("T2", "x2", 3)));
    assert!(w.first_of_txn(&TxnId::new("T3")).is_none());
}

#[test]
fn test_pass_preserves_order_and_requeues() {
    let mut w = WaitingList::new();
    w.push(Request::read("T1", "x2"));
    w.push(Request::read("T2", "x4"));
    w.begin_pass();
    assert!(w.is_empty());
    let first = w.next_in_pass().expect("first");
    assert_eq!(first, Request::read("T1", "x2"));
    w.push(first);
    assert_eq!(w.next_in_pass(), Some(Request::read("T2", "x4")));
    assert_eq!(w.next_in_pass(), None);
    assert_eq!(w.len(), 1);
}

#[test]
fn test_remove_txn_reaches_into_the_pass() {
    let mut w = WaitingList::new();
    w.push(Request::read("T1", "x2"));
    w.push(Request::write("T2", "x4", 1));
    w.push(Request::end("T1"));
    w.begin_pass();
    w.push(Request::write("T1", "x6", 9));
    assert_eq!(
        w.remove_txn(&TxnId::new("T1")),
        vec![
            Request::write("T1", "x6", 9),
            Request::read("T1", "x2"),
            Request::end("T1"),
        ]
    );
    assert!(w.remove_txn(&TxnId::new("T1")).is_empty());
    assert!(w.is_empty());
    assert_eq!(w.next_in_pass(), Some(Request::write("T2", "x4", 1)));
    assert_eq!(w.next_in_pass(), None);
}
