use mcp_types::ProtocolVersion;

use crate::error::ProtocolError;

/// Initialize-time version negotiation (spec §8 scenario 2). The coordinator
/// only ever compares against the single version it was built against — no
/// range negotiation, per spec §3's note on `ProtocolVersion`.
pub fn check_protocol_version(requested: &ProtocolVersion) -> Result<(), ProtocolError> {
    let supported = ProtocolVersion::latest();
    if requested == &supported {
        Ok(())
    } else {
        Err(ProtocolError::ProtocolVersionMismatch {
            expected: supported.0,
            actual: requested.0.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_version_is_accepted() {
        assert!(check_protocol_version(&ProtocolVersion::latest()).is_ok());
    }

    #[test]
    fn mismatched_version_is_rejected() {
        let requested = ProtocolVersion("2024-01-01".to_string());
        assert_matches::assert_matches!(
            check_protocol_version(&requested),
            Err(ProtocolError::ProtocolVersionMismatch { .. })
        );
    }
}
