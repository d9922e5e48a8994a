//! Whole-message parse/serialize, shared by the outbound [`super::query::Query`]
//! and inbound [`super::response::Response`] wrappers.

use bitstream_io::{BigEndian, BitReader, BitWriter};
use bytes::Bytes;

use super::edns::EdnsOpt;
use super::enums::{RecordClass, RecordType};
use super::header::Header;
use super::name::Name;
use super::question::{Question, read_u16, read_u32};
use crate::error::ErrorKind;

/// A resource record with its RDATA left undecoded, the shape every
/// section other than the question carries on the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawRecord {
    pub name: Name,
    pub rtype: RecordType,
    pub rclass: RecordClass,
    pub ttl: u32,
    pub rdata: Bytes,
}

/// A fully parsed message: header, question, and the three RR sections
/// with RDATA left opaque. [`super::records::Records`] decodes RDATA
/// lazily from this on demand.
#[derive(Clone, Debug)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<RawRecord>,
    pub authority: Vec<RawRecord>,
    pub additional: Vec<RawRecord>,
}

impl Message {
    /// Parse a complete message from a buffer received off the wire.
    /// `buf` is retained as the backing store for every [`Bytes`] slice
    /// handed out, so cloning an RDATA slice never copies.
    pub fn parse(buf: Bytes) -> Result<Self, ErrorKind> {
        let header = {
            let header_bytes = buf.get(0..12).ok_or(ErrorKind::Malformed)?;
            let mut reader = BitReader::endian(header_bytes, BigEndian);
            Header::read(&mut reader).map_err(|_| ErrorKind::Malformed)?
        };

        let mut offset = 12;
        let mut questions = Vec::with_capacity(header.qdcount as usize);
        for _ in 0..header.qdcount {
            let (question, next) = Question::read(&buf, offset)?;
            questions.push(question);
            offset = next;
        }

        let mut answers = Vec::with_capacity(header.ancount as usize);
        for _ in 0..header.ancount {
            let (record, next) = read_record(&buf, offset)?;
            answers.push(record);
            offset = next;
        }

        let mut authority = Vec::with_capacity(header.nscount as usize);
        for _ in 0..header.nscount {
            let (record, next) = read_record(&buf, offset)?;
            authority.push(record);
            offset = next;
        }

        let mut additional = Vec::with_capacity(header.arcount as usize);
        for _ in 0..header.arcount {
            let (record, next) = read_record(&buf, offset)?;
            additional.push(record);
            offset = next;
        }

        Ok(Message {
            header,
            questions,
            answers,
            authority,
            additional,
        })
    }

    /// The EDNS OPT record in the additional section, if present. There
    /// should be at most one; a second is ignored rather than rejected,
    /// matching how most resolvers tolerate minor server bugs.
    pub fn edns(&self) -> Option<EdnsOpt> {
        self.additional
            .iter()
            .find(|r| r.rtype == RecordType::Opt)
            .map(|r| EdnsOpt::from_class_and_ttl(u16::from(r.rclass), r.ttl))
    }
}

fn read_record(buf: &Bytes, offset: usize) -> Result<(RawRecord, usize), ErrorKind> {
    let (name, offset) = Name::read(buf, offset)?;
    let rtype = RecordType::from(read_u16(buf, offset)?);
    let rclass = RecordClass::from(read_u16(buf, offset + 2)?);
    let ttl = read_u32(buf, offset + 4)?;
    let rdlength = read_u16(buf, offset + 8)? as usize;
    let rdata_start = offset + 10;
    let rdata_end = rdata_start + rdlength;
    if rdata_end > buf.len() {
        return Err(ErrorKind::Malformed);
    }
    let rdata = buf.slice(rdata_start..rdata_end);
    Ok((
        RawRecord {
            name,
            rtype,
            rclass,
            ttl,
            rdata,
        },
        rdata_end,
    ))
}

/// Serialize a single-question outbound query with an optional EDNS OPT
/// record in the additional section. This is the only message shape the
/// crate ever emits: exactly one question, no answer/authority sections
/// on the wire.
pub fn write_query(header: &Header, question: &Question, edns: Option<&EdnsOpt>) -> Vec<u8> {
    let mut buf = Vec::with_capacity(64);
    {
        let mut writer = BitWriter::endian(&mut buf, BigEndian);
        header.write(&mut writer).expect("write to Vec<u8> cannot fail");
    }
    question.write(&mut buf);
    if let Some(opt) = edns {
        write_opt_record(&mut buf, opt);
    }
    buf
}

fn write_opt_record(buf: &mut Vec<u8>, opt: &EdnsOpt) {
    buf.push(0); // root name
    buf.extend_from_slice(&u16::from(RecordType::Opt).to_be_bytes());
    let (class, ttl) = opt.to_class_and_ttl();
    buf.extend_from_slice(&class.to_be_bytes());
    buf.extend_from_slice(&ttl.to_be_bytes());
    buf.extend_from_slice(&0u16.to_be_bytes()); // RDLENGTH: no options carried
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::enums::Opcode;

    fn sample_question() -> Question {
        Question::new(
            Name::from_str("example.com").unwrap(),
            RecordType::A,
            RecordClass::In,
        )
    }

    #[test]
    fn writes_header_and_question_with_arcount_for_edns() {
        let header = Header {
            id: 42,
            qr: false,
            opcode: Opcode::Query,
            rd: true,
            qdcount: 1,
            arcount: 1,
            ..Default::default()
        };
        let opt = EdnsOpt::new(1232, false);
        let bytes = write_query(&header, &sample_question(), Some(&opt));

        let parsed = Message::parse(Bytes::from(bytes)).unwrap();
        assert_eq!(parsed.header.id, 42);
        assert_eq!(parsed.questions.len(), 1);
        assert_eq!(parsed.questions[0], sample_question());
        assert!(parsed.edns().is_some());
        assert_eq!(parsed.edns().unwrap().udp_payload_size, 1232);
    }

    #[test]
    fn rejects_truncated_buffer() {
        let bytes = vec![0u8; 5];
        assert!(Message::parse(Bytes::from(bytes)).is_err());
    }
}
