//! Controller quorum voters and node roles.
//!
//! The voter set is static configuration shared by every node. It is written
//! in Kafka's `controller.quorum.voters` syntax, `id@host:port,...`, or as a
//! TOML array of `{ node_id, host, port }` tables.

use std::{collections::HashSet, fmt, str::FromStr};

use crate::{error::AppError, identity::NodeIdentity};

// ── roles ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Broker,
    Controller,
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "broker" => Ok(Role::Broker),
            "controller" => Ok(Role::Controller),
            other => Err(AppError::Config(format!(
                "unknown node role '{other}' (expected 'broker' or 'controller')"
            ))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Broker => "broker",
            Role::Controller => "controller",
        })
    }
}

/// Roles this process runs, Kafka's `process.roles`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeRoles {
    broker: bool,
    controller: bool,
}

impl NodeRoles {
    pub const COMBINED: NodeRoles = NodeRoles {
        broker: true,
        controller: true,
    };
    pub const BROKER_ONLY: NodeRoles = NodeRoles {
        broker: true,
        controller: false,
    };
    pub const CONTROLLER_ONLY: NodeRoles = NodeRoles {
        broker: false,
        controller: true,
    };

    pub fn from_roles<I>(roles: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = Role>,
    {
        let mut out = NodeRoles {
            broker: false,
            controller: false,
        };
        for role in roles {
            match role {
                Role::Broker => out.broker = true,
                Role::Controller => out.controller = true,
            }
        }
        if !out.broker && !out.controller {
            return Err(AppError::Config("node.roles must name at least one role".into()));
        }
        Ok(out)
    }

    pub fn is_broker(&self) -> bool {
        self.broker
    }

    pub fn is_controller(&self) -> bool {
        self.controller
    }
}

impl FromStr for NodeRoles {
    type Err = AppError;

    /// Comma-separated, e.g. `broker,controller`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let roles = s
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(Role::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_roles(roles)
    }
}

impl fmt::Display for NodeRoles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.broker, self.controller) {
            (true, true) => f.write_str("broker,controller"),
            (true, false) => f.write_str("broker"),
            (false, true) => f.write_str("controller"),
            (false, false) => Ok(()),
        }
    }
}

// ── voters ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuorumVoter {
    pub node_id: u32,
    pub host: String,
    pub port: u16,
}

impl fmt::Display for QuorumVoter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.node_id, self.host, self.port)
    }
}

impl FromStr for QuorumVoter {
    type Err = AppError;

    /// `id@host:port`. The port is split at the last `:` so bracketed IPv6
    /// hosts (`[::1]:9093`) parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid =
            |reason: &str| AppError::Config(format!("invalid quorum voter '{s}': {reason}"));

        let (id, endpoint) = s.trim().split_once('@').ok_or_else(|| invalid("missing '@'"))?;
        let (host, port) = endpoint
            .rsplit_once(':')
            .ok_or_else(|| invalid("missing ':port'"))?;
        let node_id = id
            .parse::<u32>()
            .map_err(|_| invalid("node id is not a non-negative integer"))?;
        let port = port
            .parse::<u16>()
            .map_err(|_| invalid("port is not a valid u16"))?;

        Ok(QuorumVoter {
            node_id,
            host: host.to_string(),
            port,
        })
    }
}

/// Ordered voter list with unique node ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuorumVoterSet {
    voters: Vec<QuorumVoter>,
}

impl QuorumVoterSet {
    pub fn new(voters: Vec<QuorumVoter>) -> Result<Self, AppError> {
        let mut seen = HashSet::new();
        for voter in &voters {
            if voter.host.is_empty() {
                return Err(AppError::Config(format!(
                    "quorum voter {} has an empty host",
                    voter.node_id
                )));
            }
            if voter.host.chars().any(char::is_whitespace) {
                return Err(AppError::Config(format!(
                    "quorum voter {} host {:?} must not contain whitespace",
                    voter.node_id, voter.host
                )));
            }
            if voter.port == 0 {
                return Err(AppError::Config(format!(
                    "quorum voter {} has port 0",
                    voter.node_id
                )));
            }
            if !seen.insert(voter.node_id) {
                return Err(AppError::Config(format!(
                    "quorum voter node_id {} is listed more than once",
                    voter.node_id
                )));
            }
        }
        Ok(Self { voters })
    }

    pub fn is_empty(&self) -> bool {
        self.voters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.voters.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QuorumVoter> {
        self.voters.iter()
    }

    pub fn get(&self, node_id: u32) -> Option<&QuorumVoter> {
        self.voters.iter().find(|v| v.node_id == node_id)
    }

    pub fn contains(&self, node_id: u32) -> bool {
        self.get(node_id).is_some()
    }
}

impl FromStr for QuorumVoterSet {
    type Err = AppError;

    /// Kafka syntax; a blank string is an empty set.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let voters = s
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(QuorumVoter::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(voters)
    }
}

impl fmt::Display for QuorumVoterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, voter) in self.voters.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{voter}")?;
        }
        Ok(())
    }
}

// ── validation ───────────────────────────────────────────────────────────────

/// Voter set that has been checked against this node's identity and roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuorumVoters {
    voters: QuorumVoterSet,
    self_node_id: u32,
}

impl ValidatedQuorumVoters {
    pub fn voters(&self) -> &QuorumVoterSet {
        &self.voters
    }

    /// This node's own voter entry; `None` for a pure broker.
    pub fn self_voter(&self) -> Option<&QuorumVoter> {
        self.voters.get(self.self_node_id)
    }
}

/// A controller must be a voter; a pure broker must not be.
pub fn build_quorum_voters(
    voter_config: &QuorumVoterSet,
    self_identity: &NodeIdentity,
    roles: NodeRoles,
) -> Result<ValidatedQuorumVoters, AppError> {
    let node_id = self_identity.node_id;
    let listed = voter_config.contains(node_id);

    let reason = if roles.is_controller() && voter_config.is_empty() {
        Some("node has the controller role but the voter set is empty")
    } else if roles.is_controller() && !listed {
        Some("node has the controller role but is not listed as a voter")
    } else if !roles.is_controller() && listed {
        Some("node is listed as a voter but does not have the controller role")
    } else {
        None
    };

    if let Some(reason) = reason {
        return Err(AppError::VoterSetInconsistency {
            node_id,
            reason: reason.to_string(),
            voters: voter_config.to_string(),
        });
    }

    Ok(ValidatedQuorumVoters {
        voters: voter_config.clone(),
        self_node_id: node_id,
    })
}
