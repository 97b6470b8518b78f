//! Walks the referral chain from a root server down to an answer.
use crate::{
    dns_types::RecordType,
    error::ResolveError,
    io::{self, Transport},
    message::{
        record::{Record, RecordData},
        Message, Response,
    },
};
use std::{
    net::IpAddr,
    time::{Duration, Instant},
};
use tracing::{debug, warn};

/// Knobs for one lookup session.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// How long to wait for a reply to each send.
    pub timeout: Duration,
    /// Sends per query before giving up on the server. 2 means one retry.
    pub attempts: u8,
    /// Queries allowed per session, nested lookups included.
    pub max_queries: u32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            attempts: 2,
            max_queries: 30,
        }
    }
}

/// One name being looked up, and the server it will be asked next.
#[derive(Debug)]
struct Lookup {
    name: String,
    record_type: RecordType,
    server: IpAddr,
}

/// What a response tells the lookup to do next.
#[derive(Debug)]
enum Step {
    /// The lookup is over, with these answers (possibly none).
    Finished(Vec<Record>),
    /// Ask the same question of another server.
    Referral(IpAddr),
    /// The name is an alias: start over from the root with its target.
    Restart(String),
    /// The next server is only known by name, so look up its address first.
    ResolveNameServer(String),
}

impl Step {
    fn from_response(response: Response) -> Result<Self, ResolveError> {
        let authoritative = response.is_authoritative();
        let Some(next) = response.next_server_record() else {
            return Ok(Self::Finished(response.answer));
        };
        let step = match (&next.data, authoritative) {
            (RecordData::Cname(target), _) => Self::Restart(target.clone()),
            (_, true) => Self::Finished(response.answer),
            (RecordData::Ns(name), false) => Self::ResolveNameServer(name.clone()),
            (RecordData::A(ip), false) => Self::Referral(IpAddr::V4(*ip)),
            (_, false) => {
                let described = format!("{} {} {}", next.name, next.record_type, next.data);
                return Err(ResolveError::UnusableReferral(described));
            }
        };
        Ok(step)
    }
}

/// A lookup session: the root to restart from, the transport every query goes
/// through, and the count of queries sent so far.
pub struct Resolver<T> {
    transport: T,
    root: IpAddr,
    config: ResolverConfig,
    trace: bool,
    queries_sent: u32,
}

impl<T: Transport> Resolver<T> {
    pub fn new(transport: T, root: IpAddr, config: ResolverConfig) -> Self {
        Self {
            transport,
            root,
            config,
            trace: false,
            queries_sent: 0,
        }
    }

    /// Print every query and response as the lookup goes.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn queries_sent(&self) -> u32 {
        self.queries_sent
    }

    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Looks up the addresses of `name`, keeping only records of `record_type`.
    pub fn lookup(
        &mut self,
        name: &str,
        record_type: RecordType,
    ) -> Result<Vec<Record>, ResolveError> {
        let answers: Vec<_> = self
            .resolve(name, record_type)?
            .into_iter()
            .filter(|r| r.record_type == record_type)
            .collect();
        if answers.is_empty() {
            return Err(ResolveError::NoAnswer);
        }
        Ok(answers)
    }

    /// Follows referrals, aliases and name server lookups starting from the root, and
    /// returns the answer section that ended the walk.
    ///
    /// Looking up a name server's address suspends the current lookup on a stack and
    /// resumes it, pointed at that address, once the nested one finishes.
    pub fn resolve(
        &mut self,
        name: &str,
        record_type: RecordType,
    ) -> Result<Vec<Record>, ResolveError> {
        let mut current = Lookup {
            name: name.to_owned(),
            record_type,
            server: self.root,
        };
        let mut suspended: Vec<Lookup> = Vec::new();
        loop {
            let response = self.query(&current)?;
            match Step::from_response(response)? {
                Step::Referral(server) => {
                    debug!(name = %current.name, %server, "following referral");
                    current.server = server;
                }
                Step::Restart(target) => {
                    debug!(alias = %current.name, %target, "following CNAME from the root");
                    current = Lookup {
                        name: target,
                        record_type: current.record_type,
                        server: self.root,
                    };
                }
                Step::ResolveNameServer(ns) => {
                    debug!(name = %current.name, name_server = %ns, "no glue, resolving name server");
                    let ns_lookup = Lookup {
                        name: ns,
                        record_type: RecordType::A,
                        server: self.root,
                    };
                    suspended.push(std::mem::replace(&mut current, ns_lookup));
                }
                Step::Finished(answers) => {
                    let Some(mut parent) = suspended.pop() else {
                        return Ok(answers);
                    };
                    let server = answers.iter().find_map(|r| match r.data {
                        RecordData::A(ip) => Some(IpAddr::V4(ip)),
                        _ => None,
                    });
                    let Some(server) = server else {
                        debug!(name_server = %current.name, "name server has no address");
                        return Err(ResolveError::NoAnswer);
                    };
                    debug!(name = %parent.name, %server, "resuming with name server address");
                    parent.server = server;
                    current = parent;
                }
            }
        }
    }

    /// Sends one query, retrying on timeout, and returns the decoded response with a
    /// matching ID. Counts against the session's query budget.
    fn query(&mut self, lookup: &Lookup) -> Result<Response, ResolveError> {
        self.queries_sent += 1;
        if self.queries_sent > self.config.max_queries {
            warn!(max = self.config.max_queries, "query budget exhausted");
            return Err(ResolveError::QueryBudgetExceeded(self.config.max_queries));
        }
        let id: u16 = rand::random();
        let msg = Message::new_query(id, &lookup.name, lookup.record_type)?;
        debug!(id, question = %msg.question, server = %lookup.server, "sending query");
        let body = msg.serialize_bytes()?;

        for attempt in 1..=self.config.attempts {
            if self.trace {
                io::print_query(id, &lookup.name, lookup.record_type, lookup.server);
            }
            self.transport.send(lookup.server, &body)?;
            let Some(bytes) = self.receive_matching(id)? else {
                warn!(server = %lookup.server, attempt, "timed out waiting for a response");
                continue;
            };
            let response = Response::deserialize(bytes)?;
            let h = &response.header;
            debug!(
                id,
                qr = h.is_response,
                opcode = ?h.opcode,
                aa = h.authoritative_answer,
                rd = h.recursion_desired,
                ra = h.recursion_available,
                z = h.reserved,
                question = ?response.question.first().map(|q| (&q.name, q.record_type)),
                answers = h.answer_count,
                authority = h.name_server_count,
                additional = h.additional_records_count,
                bytes = response.raw().len(),
                "received response"
            );
            if h.truncation {
                warn!(id, "response is truncated, using what arrived");
            }
            if self.trace {
                io::print_response(&response);
            }
            return Ok(response);
        }
        Err(ResolveError::Timeout {
            server: lookup.server,
            attempts: self.config.attempts,
        })
    }

    /// Waits up to the configured timeout for a datagram carrying `id`, dropping any others.
    /// `None` means the time ran out.
    fn receive_matching(&mut self, id: u16) -> Result<Option<Vec<u8>>, ResolveError> {
        let deadline = Instant::now() + self.config.timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let bytes = match self.transport.recv(remaining) {
                Ok(bytes) => bytes,
                Err(e) if io::is_timeout(&e) => return Ok(None),
                Err(e) => return Err(e.into()),
            };
            match bytes.get(..2) {
                Some(got) if got == id.to_be_bytes() => return Ok(Some(bytes)),
                _ => debug!(expected = id, len = bytes.len(), "discarding response with wrong ID"),
            }
        }
    }
}
