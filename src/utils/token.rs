use base64::{engine::general_purpose, Engine as _};
use rand::{thread_rng, RngCore};
use sha2::{Digest, Sha256};

pub const INVITE_TOKEN_LEN: usize = 12;

/// Lowercase hex SHA-256 digest. Secrets (invite tokens) are only ever
/// persisted through this; the plaintext is shown once and never stored.
pub fn hash_token(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Random invite token: 12 uppercase alphanumerics. Random bytes are base64
/// encoded, punctuation and padding stripped, then uppercased, looping until
/// enough characters survive the stripping.
pub fn generate_invite_token() -> String {
    let mut rng = thread_rng();
    let mut token = String::with_capacity(INVITE_TOKEN_LEN);

    while token.len() < INVITE_TOKEN_LEN {
        let mut bytes = [0u8; 9];
        rng.fill_bytes(&mut bytes);
        let encoded = general_purpose::URL_SAFE_NO_PAD.encode(bytes);
        for c in encoded.chars() {
            if c.is_ascii_alphanumeric() {
                token.push(c.to_ascii_uppercase());
                if token.len() == INVITE_TOKEN_LEN {
                    break;
                }
            }
        }
    }

    token
}
