//! Cluster id helpers.
//!
//! Kafka formats storage with a cluster id that is the unpadded base64url
//! encoding of a random UUID (22 characters). Any other non-blank id without
//! whitespace is accepted as well, since it only needs to match across nodes.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use uuid::Uuid;

use crate::error::AppError;

/// Generate a fresh Kafka-style cluster id.
pub fn generate() -> String {
    URL_SAFE_NO_PAD.encode(Uuid::new_v4().as_bytes())
}

/// Reject ids that cannot round-trip through the identity record and the
/// broker environment unchanged.
pub fn validate(cluster_id: &str) -> Result<(), AppError> {
    if cluster_id.is_empty() {
        return Err(AppError::Config("cluster_id must not be empty".into()));
    }
    if cluster_id.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(AppError::Config(format!(
            "cluster_id {cluster_id:?} must not contain whitespace or control characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_id_is_22_url_safe_chars() {
        let id = generate();
        assert_eq!(id.len(), 22);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert!(validate(&id).is_ok());
    }

    #[test]
    fn generate_produces_unique_ids() {
        assert_ne!(generate(), generate());
    }

    #[test]
    fn generated_id_decodes_to_uuid_bytes() {
        let bytes = URL_SAFE_NO_PAD.decode(generate()).unwrap();
        assert_eq!(bytes.len(), 16);
    }

    #[test]
    fn validate_rejects_blank_and_whitespace() {
        assert!(validate("").is_err());
        assert!(validate("abc def").is_err());
        assert!(validate("abc\n").is_err());
        assert!(validate("1984e4f7-7d4b-4c1e").is_ok());
    }
}
