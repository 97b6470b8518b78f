use crate::dns_types::RecordType;
use std::{ffi::OsString, net::IpAddr, str::FromStr};

pub const HELP: &str = "\
dnslookup -- iterative DNS lookup, starting from a root server
USAGE:
  dnslookup rootDNS name [-6|-t|-t6]
FLAGS:
  -h, --help   Prints help information
ARGS:
  rootDNS      The IP address (in dotted form) of the root DNS server to start the search at
  name         Fully qualified domain name to look up. Remember, these must be ASCII.
OPTIONS:
  -6           Return an IPv6 address
  -t           Trace the queries made and responses received
  -t6          Trace, and return an IPv6 address
";

/// Values derived from the CLI arguments.
#[derive(Debug, PartialEq, Eq)]
pub struct AppArgs {
    pub root_server: IpAddr,
    pub name: String,
    pub trace: bool,
    pub ipv6: bool,
}

/// The optional third argument.
#[derive(Debug, Clone, Copy)]
struct LookupOption {
    trace: bool,
    ipv6: bool,
}

impl FromStr for LookupOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (trace, ipv6) = match s {
            "-t" => (true, false),
            "-6" => (false, true),
            "-t6" => (true, true),
            other => return Err(format!("{other} is not a valid option")),
        };
        Ok(Self { trace, ipv6 })
    }
}

impl AppArgs {
    /// Parses the process arguments. `Ok(None)` means help was asked for.
    pub fn parse() -> Result<Option<Self>, pico_args::Error> {
        Self::parse_from(std::env::args_os().skip(1).collect())
    }

    pub fn parse_from(args: Vec<OsString>) -> Result<Option<Self>, pico_args::Error> {
        let mut pargs = pico_args::Arguments::from_vec(args);

        // Help has a higher priority and should be handled separately.
        if pargs.contains(["-h", "--help"]) {
            return Ok(None);
        }

        let root_server: IpAddr = pargs.free_from_str()?;
        let name: String = pargs.free_from_str()?;
        let option: Option<LookupOption> = pargs.opt_free_from_str()?;

        let remaining = pargs.finish();
        if !remaining.is_empty() {
            return Err(pico_args::Error::ArgumentParsingFailed {
                cause: format!("unexpected arguments: {remaining:?}"),
            });
        }

        let LookupOption { trace, ipv6 } = option.unwrap_or(LookupOption {
            trace: false,
            ipv6: false,
        });
        Ok(Some(AppArgs {
            root_server,
            name,
            trace,
            ipv6,
        }))
    }

    pub fn record_type(&self) -> RecordType {
        if self.ipv6 {
            RecordType::Aaaa
        } else {
            RecordType::A
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Option<AppArgs>, pico_args::Error> {
        AppArgs::parse_from(args.iter().map(OsString::from).collect())
    }

    #[test]
    fn test_plain_lookup() {
        let args = parse(&["198.41.0.4", "www.example.com"]).unwrap().unwrap();
        assert_eq!(
            args,
            AppArgs {
                root_server: "198.41.0.4".parse().unwrap(),
                name: "www.example.com".to_owned(),
                trace: false,
                ipv6: false,
            }
        );
        assert_eq!(args.record_type(), RecordType::A);
    }

    #[test]
    fn test_options() {
        let args = parse(&["198.41.0.4", "example.com", "-t6"]).unwrap().unwrap();
        assert!(args.trace && args.ipv6);
        assert_eq!(args.record_type(), RecordType::Aaaa);
        let args = parse(&["198.41.0.4", "example.com", "-6"]).unwrap().unwrap();
        assert!(!args.trace && args.ipv6);
        let args = parse(&["198.41.0.4", "example.com", "-t"]).unwrap().unwrap();
        assert!(args.trace && !args.ipv6);
    }

    #[test]
    fn test_bad_arguments() {
        assert!(parse(&["198.41.0.4"]).is_err());
        assert!(parse(&["not-an-ip", "example.com"]).is_err());
        assert!(parse(&["198.41.0.4", "example.com", "-x"]).is_err());
        assert!(parse(&["198.41.0.4", "example.com", "-t", "extra"]).is_err());
    }

    #[test]
    fn test_help() {
        assert_eq!(parse(&["--help"]).unwrap(), None);
    }
}
