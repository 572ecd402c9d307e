use thiserror::Error;

use crate::OracleError;

/// Reasons an attack can fail.
///
/// None of these carry partial plaintext: every recovered byte depends on
/// the ones recovered before it, so a partial result cannot be trusted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttackError {
    /// Ciphertext is not a whole number of blocks, or has no block after the IV.
    #[error("malformed ciphertext: {len} bytes is not at least two whole {block_size} byte blocks")]
    MalformedCiphertext { len: usize, block_size: usize },
    /// No guess produced accepted padding at this byte.
    #[error("no guess accepted for byte {position} of block {block}")]
    OracleExhausted { block: usize, position: usize },
    /// The oracle could not be reached, even after retrying.
    #[error("oracle unavailable after {attempts} attempts at byte {position} of block {block}: {source}")]
    OracleUnavailable {
        block: usize,
        position: usize,
        attempts: u32,
        #[source]
        source: OracleError,
    },
    /// The reconstructed plaintext does not end in valid padding.
    #[error("recovered plaintext has invalid padding")]
    PaddingInvalidAfterRecovery,
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::error::Error;

    #[test]
    fn display_names_block_and_position() {
        let err = AttackError::OracleExhausted {
            block: 3,
            position: 14,
        };

        assert_eq!(err.to_string(), "no guess accepted for byte 14 of block 3");
    }

    #[test]
    fn oracle_unavailable_exposes_transport_source() {
        let err = AttackError::OracleUnavailable {
            block: 1,
            position: 15,
            attempts: 4,
            source: OracleError::Transport("connection refused".to_string()),
        };

        let source = err.source().map(|s| s.to_string());

        assert_eq!(
            source,
            Some("oracle transport failure: connection refused".to_string())
        );
    }

    #[test]
    fn malformed_ciphertext_has_no_source() {
        let err = AttackError::MalformedCiphertext {
            len: 24,
            block_size: 16,
        };

        assert_eq!(
            err.to_string(),
            "malformed ciphertext: 24 bytes is not at least two whole 16 byte blocks"
        );
        assert!(err.source().is_none());
    }
}
