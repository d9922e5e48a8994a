//! The outbound query a [`crate::Request`] sends to each nameserver.

use bytes::Bytes;
use rand::Rng;

use super::edns::EdnsOpt;
use super::enums::{Opcode, RecordClass, RecordType};
use super::header::Header;
use super::name::Name;
use super::packet::{Message, write_query};
use super::question::Question;

/// A single outbound query, built once per request and resent unchanged
/// to every nameserver on each retry: the same query ID and question is
/// reused across retries and across nameservers.
#[derive(Clone, Debug)]
pub struct Query {
    pub id: u16,
    pub question: Question,
    pub edns: Option<EdnsOpt>,
    wire: Bytes,
}

impl Query {
    /// Build a new query for `name`/`qtype`/`IN`, with a random 16-bit ID.
    /// `edns` advertises a UDP buffer size and optionally the DO bit; no
    /// other EDNS0 options are supported.
    pub fn new(name: Name, qtype: RecordType, edns: Option<EdnsOpt>) -> Self {
        let id = rand::rng().random::<u16>();
        let question = Question::new(name, qtype, RecordClass::In);
        let header = Header {
            id,
            qr: false,
            opcode: Opcode::Query,
            rd: true, // ask the configured nameserver to recurse on our behalf
            qdcount: 1,
            arcount: edns.is_some() as u16,
            ..Default::default()
        };
        let wire = Bytes::from(write_query(&header, &question, edns.as_ref()));
        Query {
            id,
            question,
            edns,
            wire,
        }
    }

    /// The serialized query, identical on every send. Safe to send over
    /// UDP or prefix with a 2-byte length for TCP.
    pub fn wire(&self) -> &Bytes {
        &self.wire
    }

    /// Whether `message` is a legitimate response to this query: same ID,
    /// QR bit set, same opcode, and an echoed question section equal to
    /// (case-insensitively) the one sent. This is the entire correlation
    /// rule; truncation and rcode are judged separately by the caller,
    /// not folded into matching.
    pub fn matches(&self, message: &Message) -> bool {
        if message.header.id != self.id {
            return false;
        }
        if !message.header.qr {
            return false;
        }
        if message.header.opcode != Opcode::Query {
            return false;
        }
        match message.questions.first() {
            Some(q) if message.questions.len() == 1 => q.matches(&self.question),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_own_wire(query: &Query) -> Message {
        Message::parse(query.wire().clone()).unwrap()
    }

    #[test]
    fn own_serialized_wire_parses_back_to_the_same_question() {
        let query = Query::new(Name::from_str("example.com").unwrap(), RecordType::A, None);
        let message = parse_own_wire(&query);
        assert_eq!(message.header.id, query.id);
        assert_eq!(message.questions[0], query.question);
    }

    #[test]
    fn matches_requires_same_id() {
        let query = Query::new(Name::from_str("example.com").unwrap(), RecordType::A, None);
        let mut response = parse_own_wire(&query);
        response.header.qr = true;
        response.header.id = query.id.wrapping_add(1);
        assert!(!query.matches(&response));
    }

    #[test]
    fn matches_requires_qr_bit() {
        let query = Query::new(Name::from_str("example.com").unwrap(), RecordType::A, None);
        let response = parse_own_wire(&query);
        assert!(!query.matches(&response));
    }

    #[test]
    fn matches_accepts_case_insensitive_echoed_question() {
        let query = Query::new(Name::from_str("Example.COM").unwrap(), RecordType::A, None);
        let mut response = parse_own_wire(&query);
        response.header.qr = true;
        assert!(query.matches(&response));
    }

    #[test]
    fn matches_rejects_different_opcode() {
        let query = Query::new(Name::from_str("example.com").unwrap(), RecordType::A, None);
        let mut response = parse_own_wire(&query);
        response.header.qr = true;
        response.header.opcode = Opcode::Status;
        assert!(!query.matches(&response));
    }
}
