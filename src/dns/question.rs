//! The question section: the single QNAME/QTYPE/QCLASS triple this crate
//! ever emits or expects back. Multi-question messages are not supported.

use super::enums::{RecordClass, RecordType};
use super::name::Name;
use crate::error::ErrorKind;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Question {
    pub name: Name,
    pub qtype: RecordType,
    pub qclass: RecordClass,
}

impl Question {
    pub fn new(name: Name, qtype: RecordType, qclass: RecordClass) -> Self {
        Question {
            name,
            qtype,
            qclass,
        }
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        self.name.write(out);
        out.extend_from_slice(&u16::from(self.qtype).to_be_bytes());
        out.extend_from_slice(&u16::from(self.qclass).to_be_bytes());
    }

    pub fn read(buf: &[u8], offset: usize) -> Result<(Self, usize), ErrorKind> {
        let (name, offset) = Name::read(buf, offset)?;
        let qtype = RecordType::from(read_u16(buf, offset)?);
        let qclass = RecordClass::from(read_u16(buf, offset + 2)?);
        Ok((
            Question {
                name,
                qtype,
                qclass,
            },
            offset + 4,
        ))
    }

    /// QNAME (case-insensitive) + QTYPE + QCLASS equality, the comparison
    /// [`crate::dns::query::Query::matches`] uses on the echoed question.
    pub fn matches(&self, other: &Question) -> bool {
        self.name == other.name && self.qtype == other.qtype && self.qclass == other.qclass
    }
}

pub(crate) fn read_u16(buf: &[u8], offset: usize) -> Result<u16, ErrorKind> {
    let bytes = buf
        .get(offset..offset + 2)
        .ok_or(ErrorKind::Malformed)?;
    Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
}

pub(crate) fn read_u32(buf: &[u8], offset: usize) -> Result<u32, ErrorKind> {
    let bytes = buf
        .get(offset..offset + 4)
        .ok_or(ErrorKind::Malformed)?;
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}
