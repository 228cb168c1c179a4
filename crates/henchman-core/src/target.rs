use crate::auth::ConnectionConfig;
use crate::error::PlanError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub const DEFAULT_SSH_PORT: u16 = 22;

/// Loopback identity used for local actions.
pub const LOCAL_ADDRESS: &str = "127.0.0.1";

/// A remote machine from the plan's host list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Host {
    pub address: String,
    pub port: u16,
}

impl Host {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }

    /// Parse `address[:port]`, falling back to `default_port`.
    /// IPv6 addresses with a port must be bracketed: `[::1]:2222`.
    pub fn parse_with_port(s: &str, default_port: u16) -> Result<Self, PlanError> {
        let s = s.trim();
        let invalid = || PlanError::InvalidHost(s.to_string());

        if let Some(rest) = s.strip_prefix('[') {
            let (address, tail) = rest.split_once(']').ok_or_else(invalid)?;
            let port = match tail.strip_prefix(':') {
                Some(p) => p.parse().map_err(|_| invalid())?,
                None if tail.is_empty() => default_port,
                None => return Err(invalid()),
            };
            if address.is_empty() {
                return Err(invalid());
            }
            return Ok(Self::new(address, port));
        }

        let (address, port) = match s.matches(':').count() {
            0 => (s, default_port),
            1 => {
                let (a, p) = s.split_once(':').ok_or_else(invalid)?;
                (a, p.parse().map_err(|_| invalid())?)
            }
            // Bare IPv6 address, no port.
            _ => (s, default_port),
        };
        if address.is_empty() || address.contains(char::is_whitespace) {
            return Err(invalid());
        }
        Ok(Self::new(address, port))
    }
}

impl FromStr for Host {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_with_port(s, DEFAULT_SSH_PORT)
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.address.contains(':') {
            write!(f, "[{}]:{}", self.address, self.port)
        } else {
            write!(f, "{}:{}", self.address, self.port)
        }
    }
}

/// Where a task runs. One remote target is bound to each worker; local
/// actions run against `Local` instead.
#[derive(Debug, Clone)]
pub enum Target {
    Remote {
        host: Host,
        connection: Arc<ConnectionConfig>,
    },
    Local,
}

impl Target {
    pub fn remote(host: Host, connection: Arc<ConnectionConfig>) -> Self {
        Target::Remote { host, connection }
    }

    pub fn address(&self) -> &str {
        match self {
            Target::Remote { host, .. } => &host.address,
            Target::Local => LOCAL_ADDRESS,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Remote { host, .. } => write!(f, "{}", host),
            Target::Local => write!(f, "local"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_address_and_port() {
        let host: Host = "10.0.0.2:2222".parse().unwrap();
        assert_eq!(host, Host::new("10.0.0.2", 2222));
    }

    #[test]
    fn falls_back_to_default_port() {
        assert_eq!(
            Host::parse_with_port("web1", 2200).unwrap(),
            Host::new("web1", 2200)
        );
        assert_eq!("web1".parse::<Host>().unwrap().port, DEFAULT_SSH_PORT);
    }

    #[test]
    fn parses_ipv6_forms() {
        assert_eq!("::1".parse::<Host>().unwrap(), Host::new("::1", 22));
        assert_eq!("[::1]:2222".parse::<Host>().unwrap(), Host::new("::1", 2222));
        assert_eq!(Host::new("::1", 2222).to_string(), "[::1]:2222");
    }

    #[test]
    fn rejects_bad_hosts() {
        for bad in ["", ":22", "web1:ssh", "web1:99999", "[::1", "[]:22", "a b"] {
            assert!(bad.parse::<Host>().is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn local_target_uses_loopback() {
        assert_eq!(Target::Local.address(), LOCAL_ADDRESS);
        assert_eq!(Target::Local.to_string(), "local");
    }
}
