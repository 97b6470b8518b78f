pub mod header;
mod parser_utils;
mod question;
pub mod record;

use crate::{dns_types::RecordType, error::DecodeError};
use anyhow::Result as AResult;
use bitvec::prelude::*;
use header::{Header, ResponseCode};
use nom::{
    bytes::complete::take,
    combinator::map,
    error::{Error, ErrorKind},
    multi::count,
    number::complete::{be_i32, be_u16, be_u8},
    IResult,
};
use question::{Entry, MAX_NAME_BYTES};
use record::{Record, RecordData};
use std::{
    fmt,
    net::{Ipv4Addr, Ipv6Addr},
};

/// Defined by RFC 1035
/// UDP messages    512 octets or less
pub const MAX_UDP_BYTES: usize = 512;

/// A name needs at most one pointer per label, and a 255 byte name has
/// fewer than 128 labels. Anything longer is a loop.
const MAX_POINTER_HOPS: usize = 128;

/// The top two bits of a length byte mark a compression pointer.
const POINTER_MASK: u8 = 0b1100_0000;

/// An outgoing query: a header and exactly one question.
#[derive(Debug)]
pub struct Message {
    pub header: Header,
    pub question: Entry,
}

impl Message {
    pub fn new_query(id: u16, domain_name: &str, record_type: RecordType) -> AResult<Self> {
        Ok(Message {
            header: Header::new_query(id),
            question: Entry::new(domain_name, record_type)?,
        })
    }

    pub fn serialize_bytes(&self) -> AResult<Vec<u8>> {
        let mut bv = BitVec::<u8, Msb0>::with_capacity(8 * MAX_UDP_BYTES);
        self.header.serialize(&mut bv);
        self.question.serialize(&mut bv);
        let msg_bytes = bv.into_vec();
        if msg_bytes.len() > MAX_UDP_BYTES {
            anyhow::bail!(
                "Query is {} bytes, which is over the UDP max of {MAX_UDP_BYTES}",
                msg_bytes.len()
            );
        }
        Ok(msg_bytes)
    }
}

/// A question read back out of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub name: String,
    pub record_type: RecordType,
}

/// A decoded response. The three record sections keep the order the server sent them in.
#[derive(Debug)]
pub struct Response {
    pub header: Header,
    pub question: Vec<Question>,
    /// The answer section contains RRs that answer the question
    pub answer: Vec<Record>,
    /// The authority section contains RRs that point toward an authoritative name server
    pub authority: Vec<Record>,
    /// The additional records section contains RRs which relate to the query,
    /// but are not strictly answers for the question, e.g. glue addresses.
    pub additional: Vec<Record>,
    raw: Vec<u8>,
}

impl Response {
    /// Decodes a whole response. A non-zero RCODE stops decoding right after the header.
    pub fn deserialize(raw: Vec<u8>) -> Result<Self, DecodeError> {
        let parser = MessageParser { msg: &raw };
        let (header, sections) = parser.parse()?;
        let Sections {
            question,
            answer,
            authority,
            additional,
        } = sections;
        Ok(Self {
            header,
            question,
            answer,
            authority,
            additional,
            raw,
        })
    }

    pub fn id(&self) -> u16 {
        self.header.id
    }

    pub fn is_authoritative(&self) -> bool {
        self.header.authoritative_answer
    }

    /// The bytes this response was decoded from.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Picks the record that says where the lookup goes next. In order of preference:
    /// the first non-IPv6 answer; the first authority record, swapped for its glue address
    /// if the additional section has one; the first non-IPv6 additional record.
    pub fn next_server_record(&self) -> Option<&Record> {
        if let Some(answer) = self.answer.iter().find(|r| !r.is_ipv6()) {
            return Some(answer);
        }
        if let Some(ns) = self.authority.first() {
            let ns_name = ns.value();
            let glue = self
                .additional
                .iter()
                .find(|r| !r.is_ipv6() && r.name.eq_ignore_ascii_case(&ns_name));
            return Some(glue.unwrap_or(ns));
        }
        self.additional.iter().find(|r| !r.is_ipv6())
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Response ID: {} Authoritative {}",
            self.header.id,
            self.is_authoritative()
        )?;
        let sections = [
            ("Answers", &self.answer),
            ("Nameservers", &self.authority),
            ("Additional Information", &self.additional),
        ];
        for (title, records) in sections {
            write!(f, "\n  {title} {}", records.len())?;
            for record in records {
                write!(f, "\n{record}")?;
            }
        }
        Ok(())
    }
}

struct Sections {
    question: Vec<Question>,
    answer: Vec<Record>,
    authority: Vec<Record>,
    additional: Vec<Record>,
}

/// Parses a response while holding on to the whole message, which compression pointers
/// index into. Parsers take and return suffixes of `msg`, so the absolute position of
/// any input is `msg.len() - input.len()`.
struct MessageParser<'m> {
    msg: &'m [u8],
}

impl<'m> MessageParser<'m> {
    fn parse(&self) -> Result<(Header, Sections), DecodeError> {
        let (i, header) = Header::parse(self.msg).map_err(|e| self.decode_error(e))?;
        if header.resp_code != ResponseCode::NoError {
            return Err(DecodeError::ResponseCode(header.resp_code));
        }
        let (_, sections) = self
            .parse_sections(i, &header)
            .map_err(|e| self.decode_error(e))?;
        Ok((header, sections))
    }

    fn parse_sections(&self, i: &'m [u8], header: &Header) -> IResult<&'m [u8], Sections> {
        let (i, question) = count(|i| self.parse_question(i), header.question_count.into())(i)?;
        let (i, answer) = count(|i| self.parse_record(i), header.answer_count.into())(i)?;
        let (i, authority) = count(|i| self.parse_record(i), header.name_server_count.into())(i)?;
        let (i, additional) =
            count(|i| self.parse_record(i), header.additional_records_count.into())(i)?;
        Ok((
            i,
            Sections {
                question,
                answer,
                authority,
                additional,
            },
        ))
    }

    fn parse_question(&self, i: &'m [u8]) -> IResult<&'m [u8], Question> {
        let (i, name) = self.parse_name(i)?;
        let (i, record_type) = map(be_u16, RecordType::from)(i)?;
        // QCLASS
        let (i, _) = be_u16(i)?;
        Ok((i, Question { name, record_type }))
    }

    fn parse_record(&self, input: &'m [u8]) -> IResult<&'m [u8], Record> {
        let (i, name) = self.parse_name(input)?;
        let (i, record_type) = map(be_u16, RecordType::from)(i)?;
        let (i, class) = be_u16(i)?;
        let (i, ttl) = be_i32(i)?;
        let (rdata_start, rdlength) = be_u16(i)?;
        let (rest, rdata) = take(rdlength)(rdata_start)?;
        let data = match record_type {
            RecordType::A => {
                let octets: [u8; 4] = rdata
                    .try_into()
                    .map_err(|_| failure(rdata_start, ErrorKind::LengthValue))?;
                RecordData::A(Ipv4Addr::from(octets))
            }
            RecordType::Aaaa => {
                let octets: [u8; 16] = rdata
                    .try_into()
                    .map_err(|_| failure(rdata_start, ErrorKind::LengthValue))?;
                RecordData::Aaaa(Ipv6Addr::from(octets))
            }
            // The name is read in place rather than from `rdata` so its pointers still resolve.
            RecordType::Ns => RecordData::Ns(self.parse_name(rdata_start)?.1),
            RecordType::Cname => RecordData::Cname(self.parse_name(rdata_start)?.1),
            RecordType::Other(_) => RecordData::Unsupported,
        };
        Ok((
            rest,
            Record {
                name,
                record_type,
                class,
                ttl,
                data,
            },
        ))
    }

    /// Reads a possibly compressed domain name, see RFC 1035 section 4.1.4.
    ///
    /// Following a pointer moves the read position anywhere in the message, but the
    /// returned input only skips the bytes of the name as it appears at `input`: its
    /// literal labels and the first pointer, if any. The number of pointers followed is
    /// capped so a pointer loop fails instead of spinning.
    fn parse_name(&self, input: &'m [u8]) -> IResult<&'m [u8], String> {
        let mut labels: Vec<String> = Vec::new();
        let mut cursor = input;
        let mut resume_at = None;
        let mut hops = 0;
        let mut name_bytes = 1;
        loop {
            let (i, len) = be_u8(cursor)?;
            if len & POINTER_MASK == POINTER_MASK {
                let (i, low) = be_u8(i)?;
                hops += 1;
                if hops > MAX_POINTER_HOPS {
                    return Err(failure(cursor, ErrorKind::TooLarge));
                }
                resume_at.get_or_insert(i);
                let target = usize::from(len & !POINTER_MASK) << 8 | usize::from(low);
                cursor = match self.msg.get(target..) {
                    Some(jumped) => jumped,
                    None => return Err(failure(cursor, ErrorKind::Verify)),
                };
            } else if len == 0 {
                return Ok((resume_at.unwrap_or(i), labels.join(".")));
            } else {
                let (i, label) = take(len)(i)?;
                name_bytes += label.len() + 1;
                if name_bytes > MAX_NAME_BYTES {
                    return Err(failure(cursor, ErrorKind::TooLarge));
                }
                labels.push(String::from_utf8_lossy(label).into_owned());
                cursor = i;
            }
        }
    }

    fn decode_error(&self, e: nom::Err<Error<&'m [u8]>>) -> DecodeError {
        match e {
            nom::Err::Error(e) | nom::Err::Failure(e) => DecodeError::Malformed {
                offset: self.msg.len() - e.input.len(),
                kind: e.code,
            },
            nom::Err::Incomplete(_) => DecodeError::Malformed {
                offset: self.msg.len(),
                kind: ErrorKind::Eof,
            },
        }
    }
}

fn failure(input: &[u8], kind: ErrorKind) -> nom::Err<Error<&[u8]>> {
    nom::Err::Failure(Error::new(input, kind))
}
