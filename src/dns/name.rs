//! Domain name wire encoding: label sequences with compression-pointer
//! decoding.
//!
//! Names are encoded as a sequence of length-prefixed labels terminated by
//! a zero-length label, optionally ending in a compression pointer (the top
//! two bits of the length byte set) that redirects parsing to an earlier
//! offset in the same message. Decoding never follows a pointer forward or
//! back onto itself, which would otherwise hang the parser on a malicious
//! or corrupt reply.

use std::net::IpAddr;

use crate::error::ErrorKind;

const MAX_NAME_LEN: usize = 255;
const MAX_LABEL_LEN: usize = 63;
const POINTER_MASK: u8 = 0b1100_0000;

/// A decoded domain name, stored as lowercase-normalized labels joined by
/// dots for comparison and display, e.g. `"www.example.com."`.
///
/// Comparison via [`PartialEq`] is case-insensitive, matching the DNS
/// QNAME-matching rule used by [`crate::dns::query::Query::matches`].
#[derive(Clone, Debug, Eq)]
pub struct Name {
    labels: Vec<Vec<u8>>,
}

impl Name {
    /// Parse a presentation-format name such as `"example.com"` or
    /// `"example.com."`. Rejects empty labels, labels over 63 bytes, and
    /// names whose wire encoding would exceed 255 bytes.
    pub fn from_str(s: &str) -> Result<Self, ErrorKind> {
        let trimmed = s.strip_suffix('.').unwrap_or(s);
        if trimmed.is_empty() {
            return Ok(Name { labels: Vec::new() });
        }
        let mut labels = Vec::new();
        let mut wire_len = 1; // trailing root label
        for part in trimmed.split('.') {
            if part.is_empty() || part.len() > MAX_LABEL_LEN {
                return Err(ErrorKind::Malformed);
            }
            wire_len += part.len() + 1;
            labels.push(part.as_bytes().to_ascii_lowercase());
        }
        if wire_len > MAX_NAME_LEN {
            return Err(ErrorKind::Malformed);
        }
        Ok(Name { labels })
    }

    /// Build the reverse-lookup owner name for a PTR query against `addr`:
    /// dotted octets under `in-addr.arpa` for IPv4, nibbles under
    /// `ip6.arpa` for IPv6, per RFC 1035 §3.5 / RFC 3596 §2.5.
    pub fn from_addr(addr: IpAddr) -> Self {
        let mut labels = Vec::new();
        match addr {
            IpAddr::V4(v4) => {
                for octet in v4.octets().iter().rev() {
                    labels.push(octet.to_string().into_bytes());
                }
                labels.push(b"in-addr".to_vec());
                labels.push(b"arpa".to_vec());
            }
            IpAddr::V6(v6) => {
                for byte in v6.octets().iter().rev() {
                    labels.push(format!("{:x}", byte & 0x0f).into_bytes());
                    labels.push(format!("{:x}", byte >> 4).into_bytes());
                }
                labels.push(b"ip6".to_vec());
                labels.push(b"arpa".to_vec());
            }
        }
        Name { labels }
    }

    /// Decode a name starting at `offset` within `buf`, following at most
    /// one level of compression-pointer chasing per hop and refusing to
    /// revisit an offset already seen, which bounds both cyclic pointers
    /// and forward jumps past the end of the buffer.
    ///
    /// Returns the decoded name and the offset immediately following the
    /// name as it appears in the caller's frame (i.e. past the pointer
    /// itself if one was followed, not past the jumped-to data).
    pub fn read(buf: &[u8], offset: usize) -> Result<(Self, usize), ErrorKind> {
        let mut labels = Vec::new();
        let mut cursor = offset;
        let mut end_of_caller_frame: Option<usize> = None;
        let mut visited = std::collections::HashSet::new();
        let mut wire_len = 0usize;

        loop {
            let len_byte = *buf.get(cursor).ok_or(ErrorKind::Malformed)?;

            if len_byte & POINTER_MASK == POINTER_MASK {
                let hi = (len_byte & !POINTER_MASK) as usize;
                let lo = *buf.get(cursor + 1).ok_or(ErrorKind::Malformed)? as usize;
                let pointer = (hi << 8) | lo;

                if end_of_caller_frame.is_none() {
                    end_of_caller_frame = Some(cursor + 2);
                }
                if pointer >= cursor || !visited.insert(pointer) {
                    // only backward jumps are legal; refuse cycles/forward jumps
                    return Err(ErrorKind::Malformed);
                }
                cursor = pointer;
                continue;
            }

            if len_byte & POINTER_MASK != 0 {
                return Err(ErrorKind::Malformed);
            }

            let label_len = len_byte as usize;
            if label_len == 0 {
                cursor += 1;
                break;
            }
            if label_len > MAX_LABEL_LEN {
                return Err(ErrorKind::Malformed);
            }
            let start = cursor + 1;
            let end = start + label_len;
            let label = buf.get(start..end).ok_or(ErrorKind::Malformed)?;
            wire_len += label_len + 1;
            if wire_len + 1 > MAX_NAME_LEN {
                return Err(ErrorKind::Malformed);
            }
            labels.push(label.to_ascii_lowercase());
            cursor = end;
        }

        let next = end_of_caller_frame.unwrap_or(cursor);
        Ok((Name { labels }, next))
    }

    /// Encode without compression: a flat sequence of length-prefixed
    /// labels terminated by a zero byte. Outbound queries never need
    /// compression since they contain a single question.
    pub fn write(&self, out: &mut Vec<u8>) {
        for label in &self.labels {
            out.push(label.len() as u8);
            out.extend_from_slice(label);
        }
        out.push(0);
    }

    /// The labels as lowercase byte strings, root-to-leaf order matching
    /// wire order (`www.example.com.` -> `["www", "example", "com"]`).
    pub fn labels(&self) -> &[Vec<u8>] {
        &self.labels
    }

    pub fn is_root(&self) -> bool {
        self.labels.is_empty()
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.labels == other.labels
    }
}

impl std::hash::Hash for Name {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.labels.hash(state);
    }
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.labels.is_empty() {
            return write!(f, ".");
        }
        for label in &self.labels {
            write!(f, "{}.", String::from_utf8_lossy(label))?;
        }
        Ok(())
    }
}
