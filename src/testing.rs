//! Fixtures for tests: a builder for response messages and a scripted transport.
use crate::{dns_types::RecordType, io::Transport, message::Response};
use std::{
    collections::{HashMap, VecDeque},
    io,
    net::{IpAddr, Ipv4Addr, Ipv6Addr},
    time::Duration,
};

enum RData {
    Bytes(Vec<u8>),
    Name(String),
}

struct RawRecord {
    name: String,
    record_type: u16,
    ttl: i32,
    rdata: RData,
}

impl RawRecord {
    fn new(name: &str, record_type: RecordType, ttl: i32, value: &str) -> Self {
        let rdata = match record_type {
            RecordType::A => RData::Bytes(value.parse::<Ipv4Addr>().unwrap().octets().to_vec()),
            RecordType::Aaaa => RData::Bytes(value.parse::<Ipv6Addr>().unwrap().octets().to_vec()),
            RecordType::Ns | RecordType::Cname => RData::Name(value.to_owned()),
            RecordType::Other(n) => panic!("use the _raw methods for type {n}"),
        };
        Self {
            name: name.to_owned(),
            record_type: record_type.into(),
            ttl,
            rdata,
        }
    }
}

/// Builds response messages byte by byte, optionally compressing names the way
/// real servers do.
pub struct ResponseBuilder {
    id: u16,
    authoritative: bool,
    rcode: u8,
    question: String,
    question_type: RecordType,
    compress: bool,
    answer: Vec<RawRecord>,
    authority: Vec<RawRecord>,
    additional: Vec<RawRecord>,
}

impl ResponseBuilder {
    pub fn new(id: u16, question: &str) -> Self {
        Self {
            id,
            authoritative: false,
            rcode: 0,
            question: question.to_owned(),
            question_type: RecordType::A,
            compress: true,
            answer: Vec::new(),
            authority: Vec::new(),
            additional: Vec::new(),
        }
    }

    pub fn authoritative(mut self) -> Self {
        self.authoritative = true;
        self
    }

    pub fn rcode(mut self, rcode: u8) -> Self {
        self.rcode = rcode;
        self
    }

    pub fn question_type(mut self, record_type: RecordType) -> Self {
        self.question_type = record_type;
        self
    }

    pub fn compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    pub fn answer(mut self, name: &str, rt: RecordType, ttl: i32, value: &str) -> Self {
        self.answer.push(RawRecord::new(name, rt, ttl, value));
        self
    }

    pub fn authority(mut self, name: &str, rt: RecordType, ttl: i32, value: &str) -> Self {
        self.authority.push(RawRecord::new(name, rt, ttl, value));
        self
    }

    pub fn additional(mut self, name: &str, rt: RecordType, ttl: i32, value: &str) -> Self {
        self.additional.push(RawRecord::new(name, rt, ttl, value));
        self
    }

    pub fn answer_raw(mut self, name: &str, record_type: u16, ttl: i32, rdata: &[u8]) -> Self {
        self.answer.push(RawRecord {
            name: name.to_owned(),
            record_type,
            ttl,
            rdata: RData::Bytes(rdata.to_vec()),
        });
        self
    }

    pub fn authority_raw(mut self, name: &str, record_type: u16, ttl: i32, rdata: &[u8]) -> Self {
        self.authority.push(RawRecord {
            name: name.to_owned(),
            record_type,
            ttl,
            rdata: RData::Bytes(rdata.to_vec()),
        });
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.id.to_be_bytes());
        let aa = if self.authoritative { 0b0000_0100 } else { 0 };
        out.push(0b1000_0000 | aa);
        out.push(self.rcode & 0x0f);
        for n in [
            1,
            self.answer.len(),
            self.authority.len(),
            self.additional.len(),
        ] {
            out.extend_from_slice(&(n as u16).to_be_bytes());
        }
        let mut names = NameWriter {
            compress: self.compress,
            seen: HashMap::new(),
        };
        names.write(&mut out, &self.question);
        out.extend_from_slice(&u16::from(self.question_type).to_be_bytes());
        out.extend_from_slice(&1u16.to_be_bytes());
        let sections = [&self.answer, &self.authority, &self.additional];
        for record in sections.into_iter().flatten() {
            names.write(&mut out, &record.name);
            out.extend_from_slice(&record.record_type.to_be_bytes());
            out.extend_from_slice(&1u16.to_be_bytes());
            out.extend_from_slice(&record.ttl.to_be_bytes());
            let len_at = out.len();
            out.extend_from_slice(&[0, 0]);
            match &record.rdata {
                RData::Bytes(bytes) => out.extend_from_slice(bytes),
                RData::Name(name) => names.write(&mut out, name),
            }
            let rdlength = (out.len() - len_at - 2) as u16;
            out[len_at..len_at + 2].copy_from_slice(&rdlength.to_be_bytes());
        }
        out
    }
}

struct NameWriter {
    compress: bool,
    seen: HashMap<String, usize>,
}

impl NameWriter {
    fn write(&mut self, out: &mut Vec<u8>, name: &str) {
        let labels: Vec<&str> = name.split('.').filter(|l| !l.is_empty()).collect();
        for start in 0..labels.len() {
            let suffix = labels[start..].join(".").to_ascii_lowercase();
            if self.compress {
                if let Some(&offset) = self.seen.get(&suffix) {
                    out.extend_from_slice(&(0xc000 | offset as u16).to_be_bytes());
                    return;
                }
                self.seen.insert(suffix, out.len());
            }
            out.push(labels[start].len() as u8);
            out.extend_from_slice(labels[start].as_bytes());
        }
        out.push(0);
    }
}

/// The parts of a query the scripted server gets to see.
#[derive(Debug, Clone)]
pub struct SentQuery {
    pub server: IpAddr,
    pub id: u16,
    pub name: String,
    pub record_type: RecordType,
}

pub enum Reply {
    Bytes(Vec<u8>),
    Timeout,
}

type Handler = Box<dyn FnMut(&SentQuery) -> Vec<Reply>>;

/// An in-memory transport. Each send asks the handler for the replies that
/// query gets; each receive hands out the next one, or times out when none are left.
pub struct ScriptedTransport {
    handler: Handler,
    pending: VecDeque<Reply>,
    pub sent: Vec<SentQuery>,
}

impl ScriptedTransport {
    pub fn new(handler: impl FnMut(&SentQuery) -> Vec<Reply> + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            pending: VecDeque::new(),
            sent: Vec::new(),
        }
    }
}

impl Transport for ScriptedTransport {
    fn send(&mut self, server: IpAddr, msg: &[u8]) -> io::Result<()> {
        // Queries decode like responses with no records.
        let query = Response::deserialize(msg.to_vec())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let question = &query.question[0];
        let sent = SentQuery {
            server,
            id: query.id(),
            name: question.name.clone(),
            record_type: question.record_type,
        };
        self.pending.extend((self.handler)(&sent));
        self.sent.push(sent);
        Ok(())
    }

    fn recv(&mut self, _timeout: Duration) -> io::Result<Vec<u8>> {
        match self.pending.pop_front() {
            Some(Reply::Bytes(bytes)) => Ok(bytes),
            Some(Reply::Timeout) | None => Err(io::ErrorKind::TimedOut.into()),
        }
    }
}
