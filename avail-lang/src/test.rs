use avail_base::{DumpTarget, Request, Resource, SiteId};
use test_log::test;

use crate::{parse_line, parse_op, parse_script, ParseError, Tick};

#[test]
fn test_every_form() {
    let line = "begin(T1); beginRO(T2); R(T1,x1); W(T1, x2, -7); end(T1); abort(T2); \
                fail(3); recover(3); dump(); dump(4); dump(x2)";
    assert_eq!(
        parse_line(line),
        Ok(vec![
            Request::begin("T1"),
            Request::begin_ro("T2"),
            Request::read("T1", "x1"),
            Request::write("T1", "x2", -7),
            Request::end("T1"),
            Request::abort("T2"),
            Request::fail(3),
            Request::recover(3),
            Request::Dump(DumpTarget::All),
            Request::Dump(DumpTarget::Site(SiteId(4))),
            Request::Dump(DumpTarget::Resource(Resource::new("x2"))),
        ])
    );
}

#[test]
fn test_keywords_ignore_case_names_do_not() {
    assert_eq!(parse_op("BEGINro(t1)"), Ok(Request::begin_ro("t1")));
    assert_eq!(parse_op("r(T1,X3)"), Ok(Request::read("T1", "X3")));
    assert_eq!(parse_op("  Dump ( ) "), Ok(Request::Dump(DumpTarget::All)));
}

#[test]
fn test_display_parses_back() {
    for request in [
        Request::begin_ro("T2"),
        Request::write("T1", "x2", 7),
        Request::Dump(DumpTarget::Site(SiteId(9))),
    ] {
        assert_eq!(parse_op(&request.to_string()), Ok(request));
    }
}

#[test]
fn test_comments_and_blank_lines() {
    let src = "// a scenario\n\
               begin(T1); begin(T2)\n\
               \n\
               W(T1,x1,101) // T1 writes\n\
               R(T2,x1);;\n";
    let ticks = parse_script(src).expect("parse");
    assert_eq!(
        ticks,
        vec![
            Tick {
                line: 2,
                requests: vec![Request::begin("T1"), Request::begin("T2")],
            },
            Tick {
                line: 4,
                requests: vec![Request::write("T1", "x1", 101)],
            },
            Tick {
                line: 5,
                requests: vec![Request::read("T2", "x1")],
            },
        ]
    );
}

#[test]
fn test_errors_carry_line_numbers() {
    let e = parse_script("begin(T1)\n\nW(T1,x1)\n").unwrap_err();
    assert_eq!(e.line, 3);
    assert_eq!(e.to_string(), "line 3: W takes 3 arguments, got 2");

    let e = parse_script("begin(T1)\nfrob(T1)").unwrap_err();
    assert_eq!(
        e,
        ParseError {
            line: 2,
            message: "unknown operation 'frob'".to_string(),
        }
    );
}

#[test]
fn test_malformed_operations() {
    assert!(parse_op("begin T1").is_err());
    assert!(parse_op("begin(T1").is_err());
    assert!(parse_op("(T1)").is_err());
    assert!(parse_op("begin()").is_err());
    assert!(parse_op("begin(T 1)").is_err());
    assert!(parse_op("W(T1,x1,ten)").is_err());
    assert!(parse_op("fail(300)").is_err());
    assert!(parse_op("fail(-1)").is_err());
    assert!(parse_op("dump(1,2)").is_err());
    assert!(parse_op("R(T1,f(x))").is_err());
}

#[test]
fn test_parse_error_converts_to_base_error() {
    let e: avail_base::Error = parse_script("end(").unwrap_err().into();
    assert!(e.message().starts_with("line 1:"));
}
