//! The 12-byte DNS message header (RFC 1035 §4.1.1).

use bitstream_io::{BigEndian, BitRead, BitReader, BitWrite, BitWriter};
use std::io;

use super::enums::{Opcode, ResponseCode};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Header {
    pub id: u16,
    pub qr: bool,
    pub opcode: Opcode,
    pub aa: bool,
    pub tc: bool,
    pub rd: bool,
    pub ra: bool,
    pub z: u8,
    /// Set when an OPT pseudo-RR is present and carries the DO bit.
    pub ad: bool,
    pub cd: bool,
    pub rcode: ResponseCode,
    pub qdcount: u16,
    pub ancount: u16,
    pub nscount: u16,
    pub arcount: u16,
}

impl Header {
    pub fn write(&self, writer: &mut BitWriter<&mut Vec<u8>, BigEndian>) -> io::Result<()> {
        writer.write_var::<u16>(16, self.id)?;
        writer.write_var::<u8>(1, self.qr as u8)?;
        writer.write_var::<u8>(4, u8::from(self.opcode))?;
        writer.write_var::<u8>(1, self.aa as u8)?;
        writer.write_var::<u8>(1, self.tc as u8)?;
        writer.write_var::<u8>(1, self.rd as u8)?;
        writer.write_var::<u8>(1, self.ra as u8)?;
        writer.write_var::<u8>(1, self.z)?;
        writer.write_var::<u8>(1, self.ad as u8)?;
        writer.write_var::<u8>(1, self.cd as u8)?;
        writer.write_var::<u8>(4, u8::from(self.rcode))?;
        writer.write_var::<u16>(16, self.qdcount)?;
        writer.write_var::<u16>(16, self.ancount)?;
        writer.write_var::<u16>(16, self.nscount)?;
        writer.write_var::<u16>(16, self.arcount)?;
        Ok(())
    }

    pub fn read(reader: &mut BitReader<&[u8], BigEndian>) -> io::Result<Self> {
        let id = reader.read_var::<u16>(16)?;
        let qr = reader.read_var::<u8>(1)? == 1;
        let opcode = Opcode::from(reader.read_var::<u8>(4)?);
        let aa = reader.read_var::<u8>(1)? == 1;
        let tc = reader.read_var::<u8>(1)? == 1;
        let rd = reader.read_var::<u8>(1)? == 1;
        let ra = reader.read_var::<u8>(1)? == 1;
        let z = reader.read_var::<u8>(1)?;
        let ad = reader.read_var::<u8>(1)? == 1;
        let cd = reader.read_var::<u8>(1)? == 1;
        let rcode = ResponseCode::from(reader.read_var::<u8>(4)?);
        let qdcount = reader.read_var::<u16>(16)?;
        let ancount = reader.read_var::<u16>(16)?;
        let nscount = reader.read_var::<u16>(16)?;
        let arcount = reader.read_var::<u16>(16)?;
        Ok(Header {
            id,
            qr,
            opcode,
            aa,
            tc,
            rd,
            ra,
            z,
            ad,
            cd,
            rcode,
            qdcount,
            ancount,
            nscount,
            arcount,
        })
    }
}
