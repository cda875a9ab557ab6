//! The salted-HMAC envelope.

use std::fmt::Write as _;

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const SALT_BYTES: usize = 8;

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

/// MACs `message` under `secret` with a fresh random salt. Returns the hex
/// hash and hex salt.
pub(crate) fn hmac_salted(secret: &str, message: &str) -> (String, String) {
    let mut salt = [0u8; SALT_BYTES];
    for b in &mut salt {
        *b = fastrand::u8(..);
    }
    let salt = hex(&salt);
    (hmac_with_salt(secret, &salt, message), salt)
}

/// MACs `message` keyed by `secret` with the hex-encoded `salt` appended.
fn hmac_with_salt(secret: &str, salt: &str, message: &str) -> String {
    let mut key = Vec::with_capacity(secret.len() + salt.len());
    key.extend_from_slice(secret.as_bytes());
    key.extend_from_slice(salt.as_bytes());
    let mut mac = HmacSha256::new_from_slice(&key).expect("HMAC takes keys of any length");
    mac.update(message.as_bytes());
    hex(&mac.finalize().into_bytes())
}

/// Checks a secure envelope line against `secret` by re-deriving the HMAC
/// from the embedded salt and payload.
pub fn verify(secret: &str, line: &str) -> bool {
    let line = line.trim_end_matches('\n');
    let Some(body) = line.strip_prefix('(').and_then(|l| l.strip_suffix(')')) else {
        return false;
    };

    // (name, hash, salt, name: message): split on the first three commas
    let mut parts = body.splitn(4, ", ");
    let (Some(name), Some(hash), Some(salt), Some(payload)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    if !payload.starts_with(name) {
        return false;
    }

    hmac_with_salt(secret, salt, payload) == hash
}
