use crate::message::parser_utils::*;
use bitvec::prelude::*;
use nom::{combinator::map, IResult};
use std::fmt;

/// RFC 1035 defines DNS headers as 12 bytes long.
pub const EXPECTED_SIZE_BYTES: usize = 12;

/// All DNS messages start with a Header (both queries and responses!)
/// Structure is defined at <https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.1>
#[derive(Debug, Clone)]
pub struct Header {
    /// Assigned by whoever sends the query and copied into the reply, so replies can be
    /// matched up with outstanding queries.
    pub id: u16,
    /// False for a query, true for a response.
    pub is_response: bool,
    pub opcode: Opcode,
    /// Set when the responding server is an authority for the zone of the question.
    pub authoritative_answer: bool,
    pub truncation: bool,
    pub recursion_desired: bool,
    pub recursion_available: bool,
    /// The three Z bits. Zero in practice, but kept as received.
    pub reserved: u8,
    pub resp_code: ResponseCode,
    pub question_count: u16,
    pub answer_count: u16,
    pub name_server_count: u16,
    pub additional_records_count: u16,
}

impl Header {
    /// Header for a query with one question and every flag cleared.
    pub fn new_query(id: u16) -> Self {
        Self {
            id,
            is_response: false,
            opcode: Opcode::Query,
            authoritative_answer: false,
            truncation: false,
            recursion_desired: false,
            recursion_available: false,
            reserved: 0,
            resp_code: ResponseCode::NoError,
            question_count: 1,
            answer_count: 0,
            name_server_count: 0,
            additional_records_count: 0,
        }
    }

    /// Serialize the Header and write it into the stream of bits.
    pub fn serialize<T: BitStore>(&self, bv: &mut BitVec<T, Msb0>) {
        let initial_length_bits = bv.len();
        bv.extend_from_bitslice(self.id.view_bits::<Msb0>());
        bv.push(self.is_response);
        bv.extend_from_bitslice(&u8::from(self.opcode).view_bits::<Msb0>()[4..]);
        bv.push(self.authoritative_answer);
        bv.push(self.truncation);
        bv.push(self.recursion_desired);
        bv.push(self.recursion_available);
        bv.extend_from_bitslice(&self.reserved.view_bits::<Msb0>()[5..]);
        bv.extend_from_bitslice(&u8::from(self.resp_code).view_bits::<Msb0>()[4..]);
        bv.extend_from_bitslice(self.question_count.view_bits::<Msb0>());
        bv.extend_from_bitslice(self.answer_count.view_bits::<Msb0>());
        bv.extend_from_bitslice(self.name_server_count.view_bits::<Msb0>());
        bv.extend_from_bitslice(self.additional_records_count.view_bits::<Msb0>());
        debug_assert_eq!(bv.len() - initial_length_bits, 8 * EXPECTED_SIZE_BYTES);
    }

    /// Parses the header off the front of a whole message.
    pub fn parse(i: &[u8]) -> IResult<&[u8], Self> {
        nom::bits::bits(Self::deserialize)(i)
    }

    pub fn deserialize(i: BitInput) -> IResult<BitInput, Self> {
        // From RFC 1035, section 4.1.1
        //
        //                               1  1  1  1  1  1
        // 0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
        // +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
        // |                      ID                       |
        // +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
        // |QR|   Opcode  |AA|TC|RD|RA|   Z    |   RCODE   |
        // +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
        // |                    QDCOUNT                    |
        // +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
        // |                    ANCOUNT                    |
        // +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
        // |                    NSCOUNT                    |
        // +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
        // |                    ARCOUNT                    |
        // +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
        let (i, id) = take_u16(i)?;
        let (i, qr) = take_bit(i)?;
        let (i, opcode) = map(take_nibble, Opcode::from)(i)?;
        let (i, aa) = take_bit(i)?;
        let (i, tc) = take_bit(i)?;
        let (i, rd) = take_bit(i)?;
        let (i, ra) = take_bit(i)?;
        let (i, z) = take_bits(i, 3)?;
        let (i, rcode) = map(take_nibble, ResponseCode::from)(i)?;
        let (i, qdcount) = take_u16(i)?;
        let (i, ancount) = take_u16(i)?;
        let (i, nscount) = take_u16(i)?;
        let (i, arcount) = take_u16(i)?;
        let header = Header {
            id,
            is_response: qr,
            opcode,
            authoritative_answer: aa,
            truncation: tc,
            recursion_desired: rd,
            recursion_available: ra,
            reserved: z as u8,
            resp_code: rcode,
            question_count: qdcount,
            answer_count: ancount,
            name_server_count: nscount,
            additional_records_count: arcount,
        };
        Ok((i, header))
    }
}

/// A four bit field that specifies kind of query in this message.
/// This value is set by the originator of a query and copied into the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// 0: a standard query (QUERY)
    Query,
    /// 1: an inverse query (IQUERY)
    InverseQuery,
    /// 2: a server status request (STATUS)
    Status,
    Other(u8),
}

impl From<u8> for Opcode {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Query,
            1 => Self::InverseQuery,
            2 => Self::Status,
            other => Self::Other(other),
        }
    }
}

impl From<Opcode> for u8 {
    fn from(op: Opcode) -> Self {
        match op {
            Opcode::Query => 0,
            Opcode::InverseQuery => 1,
            Opcode::Status => 2,
            Opcode::Other(n) => n,
        }
    }
}

/// This field is set by the name server and indicates if the query was successful or erroneous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCode {
    NoError,
    /// The name server was unable to interpret the query
    FormatError,
    /// The name server was unable to process this query due to a problem with the name server.
    ServerFailure,
    /// Meaningful only for responses from an authoritative name server, this code signifies
    /// that the domain name referenced in the query does not exist.
    NameError,
    /// The name server does not support the requested kind of query.
    NotImplemented,
    /// The name server refuses to perform the specified operation for policy reasons.
    Refused,
    /// Codes 6-15 are reserved in RFC 1035 and assigned by later RFCs.
    Other(u8),
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoError => f.write_str("no error"),
            Self::FormatError => f.write_str("format error"),
            Self::ServerFailure => f.write_str("server failure"),
            Self::NameError => f.write_str("name error (NXDOMAIN)"),
            Self::NotImplemented => f.write_str("not implemented"),
            Self::Refused => f.write_str("refused"),
            Self::Other(n) => write!(f, "response code {n}"),
        }
    }
}

impl From<u8> for ResponseCode {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::NoError,
            1 => Self::FormatError,
            2 => Self::ServerFailure,
            3 => Self::NameError,
            4 => Self::NotImplemented,
            5 => Self::Refused,
            other => Self::Other(other),
        }
    }
}

impl From<ResponseCode> for u8 {
    fn from(rcode: ResponseCode) -> Self {
        match rcode {
            ResponseCode::NoError => 0,
            ResponseCode::FormatError => 1,
            ResponseCode::ServerFailure => 2,
            ResponseCode::NameError => 3,
            ResponseCode::NotImplemented => 4,
            ResponseCode::Refused => 5,
            ResponseCode::Other(n) => n,
        }
    }
}
