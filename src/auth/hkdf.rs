//! HKDF-SHA256 (RFC 5869) extract-then-expand key derivation.
//!
//! The service namespaces its derivation info strings, so `kw("sessionToken")`
//! yields the full info value used when splitting a session token into Hawk
//! credentials.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const HASH_LEN: usize = 32;

/// Namespace prefixed to every derivation info string.
const NAMESPACE: &str = "identity.mozilla.com/picl/v1/";

/// Build the namespaced info bytes for a derivation name.
pub fn kw(name: &str) -> Vec<u8> {
    format!("{}{}", NAMESPACE, name).into_bytes()
}

/// Derive `len` bytes of key material from `ikm` via extract-then-expand.
///
/// An empty `salt` is treated as a zero-filled block of hash length, per the
/// RFC. `len` must not exceed 255 output blocks (8160 bytes); callers here
/// only ever ask for 64.
pub fn derive(ikm: &[u8], info: &[u8], salt: &[u8], len: usize) -> Vec<u8> {
    let zeros = [0u8; HASH_LEN];
    let salt = if salt.is_empty() { &zeros[..] } else { salt };

    // Extract
    let mut mac = HmacSha256::new_from_slice(salt).expect("HMAC accepts any key length");
    mac.update(ikm);
    let prk = mac.finalize().into_bytes();

    // Expand
    let mut okm = Vec::with_capacity(len);
    let mut previous: Vec<u8> = Vec::new();
    let mut counter = 1u8;
    while okm.len() < len {
        let mut mac = HmacSha256::new_from_slice(&prk).expect("HMAC accepts any key length");
        mac.update(&previous);
        mac.update(info);
        mac.update(&[counter]);
        previous = mac.finalize().into_bytes().to_vec();
        okm.extend_from_slice(&previous);
        counter += 1;
    }
    okm.truncate(len);
    okm
}
