//! Web origins (scheme + host + port).
//!
//! Element lookups are only valid within one origin at a time; see
//! [`crate::session::OriginScope`] for the execution context built on this.

use crate::result::{ProbeError, ProbeResult};
use std::fmt;
use url::Url;

/// A web security origin
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin {
    scheme: String,
    host: String,
    port: Option<u16>,
}

impl Origin {
    /// Parse the origin of any absolute URL
    pub fn parse(input: &str) -> ProbeResult<Self> {
        let url = parse_url(input)?;
        Self::of(&url).ok_or_else(|| ProbeError::InvalidUrl {
            url: input.to_string(),
            message: "URL has no host".to_string(),
        })
    }

    /// Parse a bare origin; rejects URLs carrying a path, query or fragment
    pub fn parse_exact(input: &str) -> ProbeResult<Self> {
        let url = parse_url(input)?;
        if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
            return Err(ProbeError::InvalidUrl {
                url: input.to_string(),
                message: "expected an origin without path, query or fragment".to_string(),
            });
        }
        Self::parse(input)
    }

    /// Origin of a parsed URL, if it has a host
    #[must_use]
    pub fn of(url: &Url) -> Option<Self> {
        let host = url.host_str()?;
        Some(Self {
            scheme: url.scheme().to_ascii_lowercase(),
            host: host.to_ascii_lowercase(),
            port: url.port_or_known_default(),
        })
    }

    /// Whether `url` belongs to this origin; unparsable URLs never do
    #[must_use]
    pub fn contains(&self, url: &str) -> bool {
        Url::parse(url)
            .ok()
            .and_then(|u| Self::of(&u))
            .is_some_and(|o| &o == self)
    }

    /// Join a path onto this origin
    pub fn join(&self, path: &str) -> ProbeResult<String> {
        let base = parse_url(&self.to_string())?;
        base.join(path)
            .map(String::from)
            .map_err(|e| ProbeError::InvalidUrl {
                url: path.to_string(),
                message: e.to_string(),
            })
    }

    /// Host name
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let default_port = match self.scheme.as_str() {
            "http" => Some(80),
            "https" => Some(443),
            _ => None,
        };
        match self.port {
            Some(port) if Some(port) != default_port => {
                write!(f, "{}://{}:{port}", self.scheme, self.host)
            }
            _ => write!(f, "{}://{}", self.scheme, self.host),
        }
    }
}

fn parse_url(input: &str) -> ProbeResult<Url> {
    Url::parse(input).map_err(|e| ProbeError::InvalidUrl {
        url: input.to_string(),
        message: e.to_string(),
    })
}
