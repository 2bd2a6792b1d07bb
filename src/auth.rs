use hmac::{Hmac, Mac};
use rand_core::{OsRng, RngCore};
use sha2::Sha256;

pub const NONCE_LEN: usize = 16;
pub const MAC_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("authentication key must not be empty")]
    InvalidKeyLength,
}

type HmacSha256 = Hmac<Sha256>;

pub fn generate_challenge() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

pub fn respond(key: &[u8], nonce: &[u8]) -> Result<[u8; MAC_LEN], AuthError> {
    let mut mac = keyed(key)?;
    mac.update(nonce);
    let mut response = [0u8; MAC_LEN];
    response.copy_from_slice(&mac.finalize().into_bytes());
    Ok(response)
}

/// Constant-time comparison of a challenge response.
pub fn verify(key: &[u8], nonce: &[u8], response: &[u8]) -> Result<bool, AuthError> {
    let mut mac = keyed(key)?;
    mac.update(nonce);
    Ok(mac.verify_slice(response).is_ok())
}

fn keyed(key: &[u8]) -> Result<HmacSha256, AuthError> {
    if key.is_empty() {
        return Err(AuthError::InvalidKeyLength);
    }
    <HmacSha256 as Mac>::new_from_slice(key).map_err(|_| AuthError::InvalidKeyLength)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_verifies_with_same_key() {
        let nonce = generate_challenge();
        let response = respond(b"shared-secret", &nonce).unwrap();
        assert!(verify(b"shared-secret", &nonce, &response).unwrap());
        assert!(!verify(b"other-secret", &nonce, &response).unwrap());
    }

    #[test]
    fn test_response_depends_on_nonce() {
        let first = respond(b"key", &[1u8; NONCE_LEN]).unwrap();
        let second = respond(b"key", &[2u8; NONCE_LEN]).unwrap();
        assert_ne!(first, second);
        assert!(!verify(b"key", &[2u8; NONCE_LEN], &first).unwrap());
    }

    #[test]
    fn test_challenges_differ() {
        assert_ne!(generate_challenge(), generate_challenge());
    }

    #[test]
    fn test_empty_key_is_refused() {
        assert!(matches!(
            respond(b"", &[0u8; NONCE_LEN]),
            Err(AuthError::InvalidKeyLength)
        ));
    }
}
