//! Core addressing types for the connection layer.
//!
//! - [`Endpoint`]: host + port of one remote service instance
//! - [`PoolName`]: opaque identifier scoping a group of endpoints that share
//!   connection policy
//!
//! Endpoints are compared structurally, never by identity: two endpoints with
//! the same host and port are the same registry key.

use serde::{Deserialize, Serialize};

/// Host and port of one remote service instance.
///
/// Immutable once created. Used as part of the registry key together with a
/// [`PoolName`]; equality and hashing are structural over (host, port).
///
/// # Examples
///
/// ```
/// use muxpool::Endpoint;
///
/// let endpoint = Endpoint::parse("10.0.0.1:9090").unwrap();
/// assert_eq!(endpoint.to_string(), "10.0.0.1:9090");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    /// Hostname or IP address literal.
    pub host: String,
    /// Port number.
    pub port: u16,
}

impl Endpoint {
    /// Create a new endpoint.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parse from `host:port` form.
    ///
    /// Supports hostnames (`svc.internal:9090`), IPv4 literals
    /// (`127.0.0.1:9090`) and bracketed IPv6 literals (`[::1]:9090`).
    ///
    /// # Errors
    ///
    /// Returns error if the host is empty or the port cannot be parsed.
    pub fn parse(s: &str) -> Result<Self, EndpointParseError> {
        // Bracketed IPv6 notation [::1]:port
        if let Some(bracket_end) = s.rfind(']') {
            if !s.starts_with('[') {
                return Err(EndpointParseError::InvalidHost);
            }
            let host = &s[1..bracket_end];
            let port_str = s
                .get(bracket_end + 2..)
                .ok_or(EndpointParseError::MissingPort)?;
            if host.is_empty() {
                return Err(EndpointParseError::InvalidHost);
            }
            let port: u16 = port_str
                .parse()
                .map_err(|_| EndpointParseError::InvalidPort)?;
            Ok(Self::new(host, port))
        } else {
            let (host, port_str) = s
                .rsplit_once(':')
                .ok_or(EndpointParseError::MissingPort)?;
            if host.is_empty() {
                return Err(EndpointParseError::InvalidHost);
            }
            let port: u16 = port_str
                .parse()
                .map_err(|_| EndpointParseError::InvalidPort)?;
            Ok(Self::new(host, port))
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Error parsing an endpoint or target list from string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointParseError {
    /// The host part is empty or malformed.
    #[error("invalid host")]
    InvalidHost,
    /// The port number could not be parsed.
    #[error("invalid port number")]
    InvalidPort,
    /// No port separator (`:`) found in the input.
    #[error("missing port separator")]
    MissingPort,
    /// The target URI carries a scheme this layer does not resolve.
    #[error("unsupported scheme: {scheme}")]
    UnsupportedScheme {
        /// The offending scheme.
        scheme: String,
    },
    /// The target list contains no endpoints.
    #[error("empty target list")]
    EmptyTargetList,
}

/// Opaque identifier scoping a group of endpoints sharing connection policy.
///
/// Two pools pointing at the same physical endpoint keep separate connections,
/// so independent timeout or retry configurations never share a sink.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolName(String);

impl PoolName {
    /// Create a new pool name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The pool name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PoolName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl std::fmt::Display for PoolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse a target URI into its endpoint list.
///
/// Accepts `tcp://host:port,host:port,...` or a bare comma-separated
/// `host:port` list. Other schemes (service-discovery URIs and the like) are
/// resolved by external collaborators, not this layer.
///
/// # Errors
///
/// Returns error on an unsupported scheme, an empty list, or any endpoint
/// that fails to parse.
pub fn parse_target_uri(uri: &str) -> Result<Vec<Endpoint>, EndpointParseError> {
    let targets = match uri.split_once("://") {
        Some(("tcp", rest)) => rest,
        Some((scheme, _)) => {
            return Err(EndpointParseError::UnsupportedScheme {
                scheme: scheme.to_string(),
            })
        }
        None => uri,
    };

    let endpoints = targets
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Endpoint::parse)
        .collect::<Result<Vec<_>, _>>()?;

    if endpoints.is_empty() {
        return Err(EndpointParseError::EmptyTargetList);
    }
    Ok(endpoints)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_parse_hostname() {
        let endpoint = Endpoint::parse("svc.internal:9090").expect("parse");
        assert_eq!(endpoint.host, "svc.internal");
        assert_eq!(endpoint.port, 9090);
    }

    #[test]
    fn test_endpoint_parse_ipv6() {
        let endpoint = Endpoint::parse("[::1]:9090").expect("parse");
        assert_eq!(endpoint.host, "::1");
        assert_eq!(endpoint.port, 9090);
        assert_eq!(endpoint.to_string(), "[::1]:9090");
    }

    #[test]
    fn test_endpoint_parse_errors() {
        assert_eq!(
            Endpoint::parse("nohost"),
            Err(EndpointParseError::MissingPort)
        );
        assert_eq!(
            Endpoint::parse(":9090"),
            Err(EndpointParseError::InvalidHost)
        );
        assert_eq!(
            Endpoint::parse("host:abc"),
            Err(EndpointParseError::InvalidPort)
        );
        assert_eq!(
            Endpoint::parse("host:99999"),
            Err(EndpointParseError::InvalidPort)
        );
    }

    #[test]
    fn test_endpoint_structural_equality() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(Endpoint::new("10.0.0.1", 9090));
        set.insert(Endpoint::new("10.0.0.1", 9090)); // duplicate
        set.insert(Endpoint::new("10.0.0.1", 9091));
        set.insert(Endpoint::new("10.0.0.2", 9090));

        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_endpoint_display() {
        assert_eq!(Endpoint::new("10.0.0.1", 9090).to_string(), "10.0.0.1:9090");
    }

    #[test]
    fn test_endpoint_serde_roundtrip() {
        let endpoint = Endpoint::new("svc.internal", 9090);
        let json = serde_json::to_string(&endpoint).expect("serialize");
        let decoded: Endpoint = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(endpoint, decoded);
    }

    #[test]
    fn test_pool_name() {
        let pool = PoolName::from("billing");
        assert_eq!(pool.as_str(), "billing");
        assert_eq!(pool.to_string(), "billing");
        assert_eq!(pool, PoolName::new("billing"));
        assert_ne!(pool, PoolName::new("reporting"));
    }

    #[test]
    fn test_parse_target_uri_tcp_scheme() {
        let targets = parse_target_uri("tcp://10.0.0.1:9090,10.0.0.2:9090").expect("parse");
        assert_eq!(
            targets,
            vec![Endpoint::new("10.0.0.1", 9090), Endpoint::new("10.0.0.2", 9090)]
        );
    }

    #[test]
    fn test_parse_target_uri_bare_list() {
        let targets = parse_target_uri("10.0.0.1:9090").expect("parse");
        assert_eq!(targets, vec![Endpoint::new("10.0.0.1", 9090)]);
    }

    #[test]
    fn test_parse_target_uri_unsupported_scheme() {
        let err = parse_target_uri("zk://zkhost:2181/service/path");
        assert_eq!(
            err,
            Err(EndpointParseError::UnsupportedScheme {
                scheme: "zk".to_string()
            })
        );
    }

    #[test]
    fn test_parse_target_uri_empty() {
        assert_eq!(
            parse_target_uri("tcp://"),
            Err(EndpointParseError::EmptyTargetList)
        );
    }

    #[test]
    fn test_parse_target_uri_bad_member() {
        assert!(parse_target_uri("tcp://10.0.0.1:9090,bad").is_err());
    }
}
