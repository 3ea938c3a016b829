// The command stream. One line is one tick; the operations on a line are
// separated by ';' and are handed to the manager together, in order. A '//'
// starts a comment that runs to the end of the line. Lines with no operations
// on them (blank, or only a comment) are not ticks at all.
//
//   begin(T1); beginRO(T2)
//   W(T1,x2,7); R(T2,x2)      // T2 sees its snapshot
//   fail(3)
//   end(T1); dump(); dump(3); dump(x2)
//
// Keywords are case-insensitive. Transaction and resource names are taken
// as written.

use std::fmt;

use tracing::trace;

use avail_base::{DumpTarget, Request, Resource, SiteId, TxnId};

#[cfg(test)]
mod test;

/// A parse failure, located by its 1-based line number.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ParseError {}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Tick {
    pub line: usize,
    pub requests: Vec<Request>,
}

/// Parses a whole script into its ticks. Stops at the first bad line.
pub fn parse_script(src: &str) -> Result<Vec<Tick>, ParseError> {
    let mut ticks = Vec::new();
    for (i, text) in src.lines().enumerate() {
        let line = i + 1;
        let requests = parse_line(text).map_err(|message| ParseError { line, message })?;
        if requests.is_empty() {
            continue;
        }
        trace!(target: "avail::lang", line, ops = requests.len(), "tick");
        ticks.push(Tick { line, requests });
    }
    Ok(ticks)
}

/// Parses the operations on one line, without its line number.
pub fn parse_line(text: &str) -> Result<Vec<Request>, String> {
    let code = match text.split_once("//") {
        Some((code, _)) => code,
        None => text,
    };
    code.split(';')
        .map(str::trim)
        .filter(|op| !op.is_empty())
        .map(parse_op)
        .collect()
}

/// Parses a single operation such as `W(T1,x2,7)`.
pub fn parse_op(text: &str) -> Result<Request, String> {
    let (keyword, args) = split_call(text)?;
    let arity = |n: usize| -> Result<(), String> {
        if args.len() == n {
            Ok(())
        } else {
            Err(format!(
                "{} takes {} argument{}, got {}",
                keyword,
                n,
                if n == 1 { "" } else { "s" },
                args.len()
            ))
        }
    };
    let request = match keyword.to_ascii_lowercase().as_str() {
        "begin" => {
            arity(1)?;
            Request::Begin { txn: txn(args[0])? }
        }
        "beginro" => {
            arity(1)?;
            Request::BeginReadOnly { txn: txn(args[0])? }
        }
        "r" => {
            arity(2)?;
            Request::Read {
                txn: txn(args[0])?,
                resource: resource(args[1])?,
            }
        }
        "w" => {
            arity(3)?;
            Request::Write {
                txn: txn(args[0])?,
                resource: resource(args[1])?,
                value: args[2]
                    .parse()
                    .map_err(|_| format!("bad value '{}' in {}", args[2], text))?,
            }
        }
        "end" => {
            arity(1)?;
            Request::End { txn: txn(args[0])? }
        }
        "abort" => {
            arity(1)?;
            Request::Abort { txn: txn(args[0])? }
        }
        "fail" => {
            arity(1)?;
            Request::Fail { site: site(args[0])? }
        }
        "recover" => {
            arity(1)?;
            Request::Recover { site: site(args[0])? }
        }
        "dump" => match args.as_slice() {
            [] => Request::Dump(DumpTarget::All),
            [arg] if arg.bytes().all(|b| b.is_ascii_digit()) => {
                Request::Dump(DumpTarget::Site(site(arg)?))
            }
            [arg] => Request::Dump(DumpTarget::Resource(resource(arg)?)),
            _ => return Err(format!("dump takes at most 1 argument, got {}", args.len())),
        },
        _ => return Err(format!("unknown operation '{}'", keyword)),
    };
    Ok(request)
}

// Splits `name(a, b, c)` into its name and trimmed arguments. `name()` has
// no arguments.
fn split_call(text: &str) -> Result<(&str, Vec<&str>), String> {
    let text = text.trim();
    let open = text
        .find('(')
        .ok_or_else(|| format!("expected '(' in '{}'", text))?;
    let inner = text[open + 1..]
        .strip_suffix(')')
        .ok_or_else(|| format!("expected ')' at end of '{}'", text))?;
    let keyword = text[..open].trim();
    if keyword.is_empty() {
        return Err(format!("missing operation name in '{}'", text));
    }
    if inner.contains(['(', ')']) {
        return Err(format!("nested parentheses in '{}'", text));
    }
    let args = if inner.trim().is_empty() {
        Vec::new()
    } else {
        inner.split(',').map(str::trim).collect()
    };
    Ok((keyword, args))
}

fn name(arg: &str, what: &str) -> Result<String, String> {
    if arg.is_empty() {
        return Err(format!("empty {} name", what));
    }
    if arg.chars().any(char::is_whitespace) {
        return Err(format!("{} name '{}' contains whitespace", what, arg));
    }
    Ok(arg.to_string())
}

fn txn(arg: &str) -> Result<TxnId, String> {
    name(arg, "transaction").map(TxnId)
}

fn resource(arg: &str) -> Result<Resource, String> {
    name(arg, "resource").map(Resource)
}

fn site(arg: &str) -> Result<SiteId, String> {
    arg.parse::<u8>()
        .map(SiteId)
        .map_err(|_| format!("bad site number '{}'", arg))
}
