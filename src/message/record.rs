use crate::dns_types::RecordType;
use std::{
    fmt,
    net::{Ipv4Addr, Ipv6Addr},
};

/// One resource record from the answer, authority or additional section.
/// Everything in it is decoded; nothing points back into the message.
#[derive(Debug, Clone)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub struct Record {
    pub name: String,
    pub record_type: RecordType,
    /// Read but never checked, only IN is expected.
    pub class: u16,
    /// RFC 1035 says "positive values of a signed 32 bit number", servers don't always agree.
    pub ttl: i32,
    pub data: RecordData,
}

impl Record {
    pub fn is_ipv6(&self) -> bool {
        self.record_type == RecordType::Aaaa
    }

    /// The record's value as text: an address, a domain name, or "----".
    pub fn value(&self) -> String {
        self.data.to_string()
    }
}

impl fmt::Display for Record {
    /// The column layout used by the response dump.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "       {:<30} {:<10} {:<4} {}",
            self.name, self.ttl, self.record_type, self.data
        )
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub enum RecordData {
    A(Ipv4Addr),
    Aaaa(Ipv6Addr),
    Ns(String),
    Cname(String),
    /// RDATA of a type this client doesn't interpret. It was skipped.
    Unsupported,
}

impl fmt::Display for RecordData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A(ipv4) => write!(f, "{ipv4}"),
            Self::Aaaa(ipv6) => write!(f, "{ipv6}"),
            Self::Ns(name) | Self::Cname(name) => f.write_str(name),
            Self::Unsupported => f.write_str("----"),
        }
    }
}
