//! The inbound response view handed to [`crate::request::Request`] after a
//! [`super::query::Query::matches`] check has already passed.

use std::net::SocketAddr;

use bytes::Bytes;

use super::enums::RecordType;
use super::packet::Message;
use super::records::Records;
use crate::error::ErrorKind;

/// A parsed, correlated response. Cheap to clone (the backing buffer is a
/// [`Bytes`]), so the same response can fan out to every subscriber of a
/// query ID without copying.
#[derive(Clone, Debug)]
pub struct Response {
    message: Message,
    source: Option<SocketAddr>,
}

impl Response {
    /// Parse a raw datagram or de-framed TCP payload. Returns
    /// [`ErrorKind::Malformed`] on any structural wire violation.
    pub fn parse(buf: Bytes) -> Result<Self, ErrorKind> {
        Ok(Response {
            message: Message::parse(buf)?,
            source: None,
        })
    }

    /// Attach the address of the nameserver this datagram arrived from.
    /// Used so a truncated UDP reply escalates to TCP against the same
    /// nameserver that sent it, rather than an arbitrary configured one.
    pub fn with_source(mut self, source: SocketAddr) -> Self {
        self.source = Some(source);
        self
    }

    /// The nameserver this response arrived from, if known. `None` for a
    /// response parsed outside the nameserver read loop (e.g. in tests).
    pub fn source(&self) -> Option<SocketAddr> {
        self.source
    }

    pub fn id(&self) -> u16 {
        self.message.header.id
    }

    pub fn truncated(&self) -> bool {
        self.message.header.tc
    }

    pub fn rcode(&self) -> super::enums::ResponseCode {
        self.message.header.rcode
    }

    /// The underlying parsed message, for [`super::query::Query::matches`]
    /// and for building a [`Records`] iterator.
    pub fn message(&self) -> &Message {
        &self.message
    }

    /// A lazily-decoded, type-filtered view over the answer section.
    pub fn records<T: super::records::RecordData>(&self) -> Records<'_, T> {
        Records::new(&self.message.answers)
    }

    /// Whether the answer section carries at least one record of `rtype`,
    /// checked against the raw wire type rather than a successful typed
    /// decode. Used by the typed convenience layer to tell a genuine
    /// zero-answer `NOERROR` apart from a non-empty one.
    pub fn has_any(&self, rtype: RecordType) -> bool {
        self.message.answers.iter().any(|r| r.rtype == rtype)
    }
}
