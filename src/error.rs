use crate::message::header::ResponseCode;
use nom::error::ErrorKind;
use std::{io, net::IpAddr};
use thiserror::Error;

/// Why a response buffer could not be turned into a `Response`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed message at byte {offset}: {kind:?}")]
    Malformed { offset: usize, kind: ErrorKind },

    #[error("server answered with {0}")]
    ResponseCode(ResponseCode),
}

/// Every way a lookup can end without an answer.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("domain name does not exist")]
    NameNotFound,

    #[error("no response from {server} after {attempts} attempts")]
    Timeout { server: IpAddr, attempts: u8 },

    #[error("query budget of {0} queries exhausted")]
    QueryBudgetExceeded(u32),

    #[error("server failure: {0}")]
    ServerFailure(ResponseCode),

    #[error("malformed response: {0}")]
    Malformed(DecodeError),

    #[error("no answer of the requested type")]
    NoAnswer,

    #[error("record {0} can't be used as a name server address")]
    UnusableReferral(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ResolveError {
    /// The code printed in place of a TTL on the failure line.
    pub fn code(&self) -> i32 {
        match self {
            Self::NameNotFound => -1,
            Self::Timeout { .. } => -2,
            Self::QueryBudgetExceeded(_) => -3,
            Self::NoAnswer => -6,
            Self::ServerFailure(_)
            | Self::Malformed(_)
            | Self::UnusableReferral(_)
            | Self::Io(_)
            | Self::Other(_) => -4,
        }
    }
}

impl From<DecodeError> for ResolveError {
    fn from(e: DecodeError) -> Self {
        match e {
            DecodeError::ResponseCode(ResponseCode::NameError) => Self::NameNotFound,
            DecodeError::ResponseCode(rcode) => Self::ServerFailure(rcode),
            malformed => Self::Malformed(malformed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        let nx: ResolveError = DecodeError::ResponseCode(ResponseCode::NameError).into();
        assert_eq!(nx.code(), -1);
        let refused: ResolveError = DecodeError::ResponseCode(ResponseCode::Refused).into();
        assert_eq!(refused.code(), -4);
        let malformed: ResolveError = DecodeError::Malformed {
            offset: 12,
            kind: ErrorKind::Eof,
        }
        .into();
        assert_eq!(malformed.code(), -4);
        let timeout = ResolveError::Timeout {
            server: "192.0.2.1".parse().unwrap(),
            attempts: 2,
        };
        assert_eq!(timeout.code(), -2);
        assert_eq!(ResolveError::QueryBudgetExceeded(30).code(), -3);
        assert_eq!(ResolveError::NoAnswer.code(), -6);
        assert_eq!(ResolveError::from(anyhow::anyhow!("bad name")).code(), -4);
    }
}
