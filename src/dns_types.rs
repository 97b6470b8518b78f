use bitvec::prelude::*;
use std::fmt;

/// The record types this client knows how to interpret.
/// Anything else is carried through by its numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    A,
    Ns,
    Cname,
    Aaaa,
    Other(u16),
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // These are the mnemonics the lookup output uses, so CNAME is "CN".
        match self {
            Self::A => f.pad("A"),
            Self::Ns => f.pad("NS"),
            Self::Cname => f.pad("CN"),
            Self::Aaaa => f.pad("AAAA"),
            Self::Other(n) => f.pad(&n.to_string()),
        }
    }
}

impl RecordType {
    pub fn serialize<T: BitStore>(&self, bv: &mut BitVec<T, Msb0>) {
        let type_num = u16::from(*self);
        bv.extend_from_bitslice(type_num.view_bits::<Msb0>())
    }
}

impl From<u16> for RecordType {
    fn from(value: u16) -> Self {
        match value {
            1 => Self::A,
            2 => Self::Ns,
            5 => Self::Cname,
            28 => Self::Aaaa,
            other => Self::Other(other),
        }
    }
}

impl From<RecordType> for u16 {
    fn from(rt: RecordType) -> Self {
        match rt {
            RecordType::A => 1,
            RecordType::Ns => 2,
            RecordType::Cname => 5,
            RecordType::Aaaa => 28,
            RecordType::Other(n) => n,
        }
    }
}

/// Only the Internet class is ever asked for.
#[derive(Debug, Clone, Copy)]
pub enum Class {
    IN,
}

impl Class {
    pub fn serialize<T: BitStore>(&self, bv: &mut BitVec<T, Msb0>) {
        let type_num: u16 = match self {
            Self::IN => 1,
        };
        bv.extend_from_bitslice(type_num.view_bits::<Msb0>())
    }
}
