//! Identity & address resolution — runs once, before the broker starts.
//!
//! ordinal → validated voters and advertised address → durable identity.
//! The result is returned by value; nothing here touches the process
//! environment.

use std::env;

use tracing::{info, warn};

use crate::{
    address::{AdvertisedAddress, compute_advertised_address},
    config::Config,
    error::AppError,
    identity::{self, NodeIdentity, Provenance},
    ordinal::resolve_ordinal,
    quorum::{NodeRoles, ValidatedQuorumVoters, build_quorum_voters},
};

/// Env vars consulted for the assigned name, in order.
pub const ASSIGNED_NAME_VARS: [&str; 2] = ["POD_NAME", "HOSTNAME"];

/// Everything the broker needs to know about itself.
#[derive(Debug, Clone)]
pub struct ResolvedNode {
    pub identity: NodeIdentity,
    pub provenance: Provenance,
    pub listener_name: String,
    pub advertised: AdvertisedAddress,
    pub roles: NodeRoles,
    pub voters: ValidatedQuorumVoters,
}

impl ResolvedNode {
    /// Broker configuration overrides, named like the Kafka container's
    /// environment (`{prefix}NODE_ID`, `{prefix}ADVERTISED_LISTENERS`, ...).
    pub fn overrides(&self, env_prefix: &str) -> RuntimeOverrides {
        let mut vars = vec![
            (
                format!("{env_prefix}NODE_ID"),
                self.identity.node_id.to_string(),
            ),
            (
                format!("{env_prefix}ADVERTISED_LISTENERS"),
                self.advertised.listener_spec(&self.listener_name),
            ),
            (format!("{env_prefix}PROCESS_ROLES"), self.roles.to_string()),
        ];
        if !self.voters.voters().is_empty() {
            vars.push((
                format!("{env_prefix}CONTROLLER_QUORUM_VOTERS"),
                self.voters.voters().to_string(),
            ));
        }
        // The Kafka image reads the cluster id without the prefix.
        vars.push(("CLUSTER_ID".to_string(), self.identity.cluster_id.clone()));
        RuntimeOverrides { vars }
    }
}

/// Ordered `(name, value)` pairs handed to the broker launcher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeOverrides {
    vars: Vec<(String, String)>,
}

impl RuntimeOverrides {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.iter().find(|(k, _)| *k == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Resolve this node's identity and address from `config`.
pub fn resolve(config: &Config, assigned_name: &str) -> Result<ResolvedNode, AppError> {
    let ordinal = resolve_ordinal(assigned_name)?;
    info!(assigned_name, %ordinal, "ordinal resolved");

    // Everything that can be checked without the volume is checked first, so
    // a misconfigured node never writes a record.
    let expected = NodeIdentity {
        node_id: ordinal.as_u32(),
        cluster_id: config.cluster_id.clone(),
    };
    let voters = build_quorum_voters(&config.voters, &expected, config.roles)?;
    let advertised = compute_advertised_address(
        expected.node_id,
        &config.listener.dns_template,
        config.listener.port,
    );
    if let Some(me) = voters.self_voter() {
        if me.host != advertised.host {
            warn!(
                voter_host = %me.host,
                advertised_host = %advertised.host,
                "own voter entry uses a different host than the advertised listener"
            );
        }
    }

    let (identity, provenance) = identity::load_or_init(
        &config.data_dir,
        &config.identity_file,
        ordinal,
        &config.cluster_id,
    )?;
    info!(
        node_id = identity.node_id,
        cluster_id = %identity.cluster_id,
        provenance = ?provenance,
        "identity ready"
    );

    info!(
        advertised = %advertised,
        listener = %config.listener.name,
        roles = %config.roles,
        voters = voters.voters().len(),
        "node resolved"
    );

    Ok(ResolvedNode {
        identity,
        provenance,
        listener_name: config.listener.name.clone(),
        advertised,
        roles: config.roles,
        voters,
    })
}

/// Assigned name from the first non-empty of `POD_NAME`, `HOSTNAME`.
pub fn assigned_name_from_env() -> Result<String, AppError> {
    ASSIGNED_NAME_VARS
        .iter()
        .filter_map(|var| env::var(var).ok())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
        .ok_or_else(|| {
            AppError::Config(format!(
                "no assigned name: pass --name or set one of {}",
                ASSIGNED_NAME_VARS.join(", ")
            ))
        })
}
