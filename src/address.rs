//! Advertised address — the host/port peers and clients use to reach a node.
//!
//! Computed from the node id and a cluster-wide DNS template on every start;
//! never persisted. No DNS lookup happens here.

use std::fmt;

use crate::error::AppError;

/// Placeholder substituted with the node id.
pub const ID_PLACEHOLDER: &str = "{id}";

/// Host-name template with exactly one `{id}` placeholder,
/// e.g. `kafka-{id}.kafka.svc.cluster.local`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsTemplate {
    prefix: String,
    suffix: String,
}

impl DnsTemplate {
    pub fn parse(template: &str) -> Result<Self, AppError> {
        let invalid = |reason: &str| {
            AppError::Config(format!("invalid dns_template {template:?}: {reason}"))
        };

        if template.chars().any(char::is_whitespace) {
            return Err(invalid("must not contain whitespace"));
        }
        let (prefix, suffix) = template
            .split_once(ID_PLACEHOLDER)
            .ok_or_else(|| invalid("missing {id} placeholder"))?;
        if suffix.contains(ID_PLACEHOLDER) {
            return Err(invalid("more than one {id} placeholder"));
        }
        if [prefix, suffix].iter().any(|part| part.contains(['{', '}'])) {
            return Err(invalid("unknown placeholder"));
        }

        Ok(Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        })
    }

    pub fn render(&self, node_id: u32) -> String {
        format!("{}{node_id}{}", self.prefix, self.suffix)
    }
}

impl fmt::Display for DnsTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{ID_PLACEHOLDER}{}", self.prefix, self.suffix)
    }
}

/// `host:port` a node publishes to peers and clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisedAddress {
    pub host: String,
    pub port: u16,
}

impl AdvertisedAddress {
    /// `{scheme}://{host}:{port}`, the form Kafka's `advertised.listeners` takes.
    pub fn listener_spec(&self, scheme: &str) -> String {
        format!("{scheme}://{self}")
    }
}

impl fmt::Display for AdvertisedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

pub fn compute_advertised_address(
    node_id: u32,
    dns_template: &DnsTemplate,
    port: u16,
) -> AdvertisedAddress {
    AdvertisedAddress {
        host: dns_template.render(node_id),
        port,
    }
}
