// Errors here are for things that should not happen: a site-directed request
// handed to the dispatcher, a site refusing work it was told it could do, a
// registry lookup failing after validation passed, a malformed command file.
//
// Expected control flow (a request queued, a transaction dying under wait-die,
// a request naming an unknown transaction) never goes through here: those are
// reported outcomes, not errors.
//
// Every Error is logged once, at construction, and carries a backtrace so that
// a breakpoint on Error::new traps any defect close to where it was created.

use std::borrow::Cow;
use std::fmt;

use backtrace_error::DynBacktraceError;
use tracing::error;

pub struct Error {
    what: String,
    trace: DynBacktraceError,
}
pub type Result<T> = std::result::Result<T, Error>;

struct SimpleErr(Cow<'static, str>);
impl fmt::Debug for SimpleErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl fmt::Display for SimpleErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::error::Error for SimpleErr {}

impl<E: std::error::Error + Send + Sync + 'static> From<E> for Error {
    fn from(err: E) -> Error {
        Error::new(err)
    }
}

impl Error {
    pub fn new<E: std::error::Error + Send + Sync + 'static>(err: E) -> Error {
        let what = err.to_string();
        error!(target: "avail", "{}", what);
        Error {
            what,
            trace: DynBacktraceError::from(err),
        }
    }

    pub fn message(&self) -> &str {
        &self.what
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.what)
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.trace)
    }
}

pub fn err(msg: impl Into<Cow<'static, str>>) -> Error {
    let err = SimpleErr(msg.into());
    Error::new(err)
}
