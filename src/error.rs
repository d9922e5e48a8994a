//! Error taxonomy for the resolver.
//!
//! [`ErrorKind`] is the single enumerated outcome delivered to a
//! [`crate::Handler`] on failure. [`Error`] covers construction and
//! configuration failures that never reach a handler at all.

use thiserror::Error;

/// The outcome classification handed to [`crate::handler::Handler::on_failure`].
///
/// Exactly one of these reaches the user per request, never a raw
/// [`std::io::Error`] or parse error — those are folded into one of these
/// variants at the point they occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// No reply within the expire window, every nameserver socket errored,
    /// or a TCP connect/read failure.
    #[error("no usable response from any nameserver")]
    Network,
    /// SERVFAIL / REFUSED / NOTIMPL.
    #[error("nameserver reported a temporary failure")]
    Temporary,
    /// Authoritative NXDOMAIN.
    #[error("domain does not exist")]
    Nxdomain,
    /// Wire parse failed, or the response did not match its claimed
    /// structure.
    #[error("response was malformed")]
    Malformed,
    /// NOERROR with no answer records of the requested type. Only ever
    /// produced by the typed convenience layer, never by the raw engine.
    #[error("no records of the requested type")]
    Nodata,
    /// Any rcode not otherwise classified, or an internal state that
    /// should not occur.
    #[error("unclassified resolution failure")]
    Other,
}

impl ErrorKind {
    /// Translate a DNS response code into the taxonomy above.
    ///
    /// `FORMERR -> malformed`, `SERVFAIL/NOTIMPL/REFUSED -> temporary`,
    /// `NXDOMAIN -> nxdomain`, anything else not `NOERROR -> other`.
    /// Returns `None` for `NOERROR`, since that is not itself a failure.
    pub(crate) fn from_rcode(rcode: crate::dns::enums::ResponseCode) -> Option<Self> {
        use crate::dns::enums::ResponseCode::*;
        match rcode {
            NoError => None,
            FormErr => Some(ErrorKind::Malformed),
            ServFail | NotImp | Refused => Some(ErrorKind::Temporary),
            NxDomain => Some(ErrorKind::Nxdomain),
            _ => Some(ErrorKind::Other),
        }
    }
}

/// Errors raised at construction or configuration time. These never reach
/// a [`crate::Handler`]; they are returned directly to the caller that
/// misused the API.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error binding a socket: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
