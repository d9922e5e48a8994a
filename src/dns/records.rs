//! Typed RDATA decoding and the lazy [`Records`] iterator.

use std::marker::PhantomData;
use std::net::{Ipv4Addr, Ipv6Addr};

use super::enums::RecordType;
use super::name::Name;
use super::packet::RawRecord;
use super::question::{read_u16, read_u32};
use crate::error::ErrorKind;

/// An answer with its RDATA decoded into `T`.
#[derive(Clone, Debug)]
pub struct Answer<T> {
    pub name: Name,
    pub ttl: u32,
    pub data: T,
}

/// Implemented by every typed RDATA payload this crate decodes. Bound to
/// [`RecordType::A`]-style wire type so [`Records`] can filter the answer
/// section before attempting to decode anything.
pub trait RecordData: Sized {
    const TYPE: RecordType;
    fn decode(record: &RawRecord) -> Result<Self, ErrorKind>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct A(pub Ipv4Addr);

impl RecordData for A {
    const TYPE: RecordType = RecordType::A;
    fn decode(record: &RawRecord) -> Result<Self, ErrorKind> {
        let b = &record.rdata;
        if b.len() != 4 {
            return Err(ErrorKind::Malformed);
        }
        Ok(A(Ipv4Addr::new(b[0], b[1], b[2], b[3])))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Aaaa(pub Ipv6Addr);

impl RecordData for Aaaa {
    const TYPE: RecordType = RecordType::Aaaa;
    fn decode(record: &RawRecord) -> Result<Self, ErrorKind> {
        let b = &record.rdata;
        if b.len() != 16 {
            return Err(ErrorKind::Malformed);
        }
        let mut octets = [0u8; 16];
        octets.copy_from_slice(b);
        Ok(Aaaa(Ipv6Addr::from(octets)))
    }
}

/// `TXT` RDATA: a sequence of one or more length-prefixed character
/// strings, concatenated here since this crate has no user needing the
/// individual-string boundaries back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Txt(pub Vec<u8>);

impl RecordData for Txt {
    const TYPE: RecordType = RecordType::Txt;
    fn decode(record: &RawRecord) -> Result<Self, ErrorKind> {
        let mut out = Vec::with_capacity(record.rdata.len());
        let mut pos = 0;
        while pos < record.rdata.len() {
            let len = *record.rdata.get(pos).ok_or(ErrorKind::Malformed)? as usize;
            let start = pos + 1;
            let end = start + len;
            let chunk = record.rdata.get(start..end).ok_or(ErrorKind::Malformed)?;
            out.extend_from_slice(chunk);
            pos = end;
        }
        Ok(Txt(out))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mx {
    pub preference: u16,
    pub exchange: Name,
}

impl RecordData for Mx {
    const TYPE: RecordType = RecordType::Mx;
    fn decode(record: &RawRecord) -> Result<Self, ErrorKind> {
        let preference = read_u16(&record.rdata, 0)?;
        let (exchange, _) = Name::read(&record.rdata, 2)?;
        Ok(Mx {
            preference,
            exchange,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cname(pub Name);

impl RecordData for Cname {
    const TYPE: RecordType = RecordType::Cname;
    fn decode(record: &RawRecord) -> Result<Self, ErrorKind> {
        let (name, _) = Name::read(&record.rdata, 0)?;
        Ok(Cname(name))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ptr(pub Name);

impl RecordData for Ptr {
    const TYPE: RecordType = RecordType::Ptr;
    fn decode(record: &RawRecord) -> Result<Self, ErrorKind> {
        let (name, _) = Name::read(&record.rdata, 0)?;
        Ok(Ptr(name))
    }
}

/// `SOA` RDATA, decoded for the `minimum` field's use in negative-caching
/// calculations by a caller that wants to; this crate itself performs no
/// caching.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Soa {
    pub mname: Name,
    pub rname: Name,
    pub serial: u32,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub minimum: u32,
}

impl RecordData for Soa {
    const TYPE: RecordType = RecordType::Soa;
    fn decode(record: &RawRecord) -> Result<Self, ErrorKind> {
        let (mname, offset) = Name::read(&record.rdata, 0)?;
        let (rname, offset) = Name::read(&record.rdata, offset)?;
        Ok(Soa {
            mname,
            rname,
            serial: read_u32(&record.rdata, offset)?,
            refresh: read_u32(&record.rdata, offset + 4)?,
            retry: read_u32(&record.rdata, offset + 8)?,
            expire: read_u32(&record.rdata, offset + 12)?,
            minimum: read_u32(&record.rdata, offset + 16)?,
        })
    }
}

/// A lazy, type-filtered view over an answer section: iterating decodes
/// RDATA only for records whose wire type matches `T`, skipping (not
/// erroring on) every other record, and surfacing a decode failure on a
/// matching record as an `Err` item rather than aborting the whole
/// iteration.
pub struct Records<'r, T> {
    answers: &'r [RawRecord],
    index: usize,
    _marker: PhantomData<T>,
}

impl<'r, T: RecordData> Records<'r, T> {
    pub(crate) fn new(answers: &'r [RawRecord]) -> Self {
        Records {
            answers,
            index: 0,
            _marker: PhantomData,
        }
    }
}

impl<'r, T: RecordData> Iterator for Records<'r, T> {
    type Item = Result<Answer<T>, ErrorKind>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(record) = self.answers.get(self.index) {
            self.index += 1;
            if record.rtype != T::TYPE {
                continue;
            }
            return Some(T::decode(record).map(|data| Answer {
                name: record.name.clone(),
                ttl: record.ttl,
                data,
            }));
        }
        None
    }
}
