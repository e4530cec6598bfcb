//! Node identity — persistence and validation of `{node_id, cluster_id}`.
//!
//! Layout on the durable volume:
//! ```text
//! {volume_path}/
//! ├── meta.identity       (TOML record, written once)
//! └── meta.identity.tmp   (only present if a write was interrupted)
//! ```
//!
//! Record body:
//! ```toml
//! version = 1
//! node_id = 2
//! cluster_id = "MkU3OEVBNTcwNTJENDM2Qk"
//! checksum = "<hex sha256 of \"1:2:MkU3OEVBNTcwNTJENDM2Qk\">"
//! ```
//!
//! Precondition: at most one process holds the volume at a time. The
//! orchestrator's exclusive attach provides this; nothing here locks.

use std::{
    fs::{self, File},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::{cluster_id, error::AppError, ordinal::NodeOrdinal};

/// File name used by [`load_or_init_identity`].
pub const DEFAULT_IDENTITY_FILE: &str = "meta.identity";

/// Newest record schema this build reads and the one it writes.
pub const SCHEMA_VERSION: u32 = 1;

const RECORD_HEADER: &str = "# Node identity record. Written once per volume; do not edit.\n";

/// Durable identity of this node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdentity {
    pub node_id: u32,
    pub cluster_id: String,
}

/// Whether [`load_or_init`] wrote a fresh record or read an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Created,
    Loaded,
}

/// Load or create the identity record at `volume_path/meta.identity`.
pub fn load_or_init_identity(
    volume_path: &Path,
    ordinal: NodeOrdinal,
    cluster_id: &str,
) -> Result<NodeIdentity, AppError> {
    load_or_init(volume_path, DEFAULT_IDENTITY_FILE, ordinal, cluster_id).map(|(id, _)| id)
}

/// Same as [`load_or_init_identity`] with an explicit file name, also
/// reporting whether the record was created by this call.
pub fn load_or_init(
    volume_path: &Path,
    file_name: &str,
    ordinal: NodeOrdinal,
    cluster_id: &str,
) -> Result<(NodeIdentity, Provenance), AppError> {
    cluster_id::validate(cluster_id)?;
    let path = volume_path.join(file_name);

    match read_record(&path)? {
        Some(stored) => {
            if stored.cluster_id != cluster_id {
                return Err(AppError::ClusterMismatch {
                    expected: cluster_id.to_string(),
                    found: stored.cluster_id,
                });
            }
            if stored.node_id != ordinal.as_u32() {
                return Err(AppError::IdentityConflict {
                    expected: ordinal.as_u32(),
                    found: stored.node_id,
                });
            }
            debug!(path = %path.display(), node_id = stored.node_id, "identity record matches");
            Ok((stored, Provenance::Loaded))
        }
        None => {
            let identity = NodeIdentity {
                node_id: ordinal.as_u32(),
                cluster_id: cluster_id.to_string(),
            };
            fs::create_dir_all(volume_path).map_err(|e| {
                AppError::persistence(volume_path, format!("cannot create volume dir: {e}"))
            })?;
            write_record(&path, &identity)?;
            info!(
                path = %path.display(),
                node_id = identity.node_id,
                cluster_id = %identity.cluster_id,
                "identity record created"
            );
            Ok((identity, Provenance::Created))
        }
    }
}

// ── internals ────────────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
struct IdentityRecord {
    version: u32,
    node_id: u32,
    cluster_id: String,
    checksum: String,
}

/// Only `version` is read first so a newer schema is reported as such
/// instead of as a parse failure.
#[derive(Deserialize)]
struct RecordHeader {
    version: u32,
}

fn checksum(version: u32, node_id: u32, cluster_id: &str) -> String {
    let digest = Sha256::digest(format!("{version}:{node_id}:{cluster_id}").as_bytes());
    hex::encode(digest)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Read and verify the record at `path`. `Ok(None)` when no record exists.
fn read_record(path: &Path) -> Result<Option<NodeIdentity>, AppError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(AppError::persistence(path, format!("cannot read record: {e}"))),
    };

    let header: RecordHeader = toml::from_str(&raw)
        .map_err(|e| AppError::persistence(path, format!("unreadable record: {e}")))?;
    if header.version == 0 || header.version > SCHEMA_VERSION {
        return Err(AppError::persistence(
            path,
            format!(
                "record schema version {} is not supported (newest known: {SCHEMA_VERSION})",
                header.version
            ),
        ));
    }

    let record: IdentityRecord = toml::from_str(&raw)
        .map_err(|e| AppError::persistence(path, format!("unreadable record: {e}")))?;
    let expected = checksum(record.version, record.node_id, &record.cluster_id);
    if !record.checksum.eq_ignore_ascii_case(&expected) {
        return Err(AppError::persistence(path, "record checksum mismatch"));
    }

    Ok(Some(NodeIdentity {
        node_id: record.node_id,
        cluster_id: record.cluster_id,
    }))
}

/// Write `identity` to a temp file, fsync, then rename over `path`.
fn write_record(path: &Path, identity: &NodeIdentity) -> Result<(), AppError> {
    let record = IdentityRecord {
        version: SCHEMA_VERSION,
        node_id: identity.node_id,
        cluster_id: identity.cluster_id.clone(),
        checksum: checksum(SCHEMA_VERSION, identity.node_id, &identity.cluster_id),
    };
    let body = toml::to_string(&record)
        .map_err(|e| AppError::persistence(path, format!("cannot encode record: {e}")))?;

    let tmp = temp_path(path);
    let mut file = File::create(&tmp)
        .map_err(|e| AppError::persistence(&tmp, format!("cannot create temp record: {e}")))?;
    file.write_all(RECORD_HEADER.as_bytes())
        .and_then(|_| file.write_all(body.as_bytes()))
        .and_then(|_| file.sync_all())
        .map_err(|e| AppError::persistence(&tmp, format!("cannot write temp record: {e}")))?;
    drop(file);

    fs::rename(&tmp, path).map_err(|e| {
        AppError::persistence(path, format!("cannot rename {} into place: {e}", tmp.display()))
    })?;

    #[cfg(unix)]
    {
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        File::open(dir)
            .and_then(|d| d.sync_all())
            .map_err(|e| AppError::persistence(dir, format!("cannot sync volume dir: {e}")))?;
    }

    Ok(())
}

// ── tests ─────────────────────────────────────────────────────────────────────
