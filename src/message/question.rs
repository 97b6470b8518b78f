use crate::dns_types::{Class, RecordType};
use anyhow::Result as AResult;
use ascii::AsciiString;
use bitvec::prelude::*;
use std::fmt;

/// Defined by RFC 1035
/// labels          63 octets or less
pub const MAX_LABEL_BYTES: usize = 63;

/// Defined by RFC 1035
/// names           255 octets or less
pub const MAX_NAME_BYTES: usize = 255;

/// The single question carried by an outgoing query.
#[derive(Debug)]
pub struct Entry {
    labels: Vec<AsciiString>,
    record_type: RecordType,
    record_qclass: Class,
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name: Vec<_> = self.labels.iter().map(|l| l.as_str()).collect();
        write!(f, "{}: {}", self.record_type, name.join("."))
    }
}

impl Entry {
    /// Splits a dotted name into labels, checking the RFC 1035 size limits.
    /// One trailing dot is allowed; an empty name (or ".") is the root.
    pub fn new(domain_name: &str, record_type: RecordType) -> AResult<Self> {
        let dn = AsciiString::from_ascii(domain_name.strip_suffix('.').unwrap_or(domain_name))
            .map_err(|_| anyhow::anyhow!("Domain name {domain_name} is not ASCII"))?;
        let labels: Vec<AsciiString> = if dn.is_empty() {
            Vec::new()
        } else {
            dn.split(ascii::AsciiChar::Dot).map(|a| a.to_owned()).collect()
        };
        for label in &labels {
            if label.is_empty() {
                anyhow::bail!("Domain name {domain_name} has an empty label");
            }
            if label.len() > MAX_LABEL_BYTES {
                anyhow::bail!("Label {label} is over the max of {MAX_LABEL_BYTES} bytes");
            }
        }
        // Every label costs its length plus a length byte, then the root byte.
        let encoded_len: usize = labels.iter().map(|l| l.len() + 1).sum::<usize>() + 1;
        if encoded_len > MAX_NAME_BYTES {
            anyhow::bail!(
                "Domain name is {encoded_len} bytes encoded, which is over the max of {MAX_NAME_BYTES}"
            );
        }
        Ok(Self {
            labels,
            record_type,
            record_qclass: Class::IN,
        })
    }

    pub fn serialize<T: BitStore>(&self, bv: &mut BitVec<T, Msb0>) {
        self.serialize_qname(bv);
        self.record_type.serialize(bv);
        self.record_qclass.serialize(bv);
    }

    fn serialize_qname<T: BitStore>(&self, bv: &mut BitVec<T, Msb0>) {
        // QNAME   a domain name represented as a sequence of labels, where
        //         each label consists of a length octet followed by that
        //         number of octets.
        for label in &self.labels {
            // Lengths were checked in `new`.
            let len = label.len() as u8;
            bv.extend_from_bitslice(len.view_bits::<Msb0>());
            for byte in label.as_bytes() {
                bv.extend_from_bitslice(byte.view_bits::<Msb0>());
            }
        }
        bv.extend_from_bitslice(0u8.view_bits::<Msb0>());
    }
}
