//! Password hashing and verification.
//!
//! Stored form: `pbkdf2-sha256$<iterations>$<salt hex>$<key hex>`, a
//! PBKDF2-HMAC-SHA256 derived key over a random salt.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;

const SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;

/// Work factor for newly hashed passwords.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// How stored values that are not in the hashed form are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyPolicy {
    Reject,
    /// Compare verbatim (databases seeded with plaintext).
    AllowPlaintext,
}

/// Hash `password` with a fresh random salt and the default work factor.
pub fn hash_password(password: &str) -> String {
    hash_password_with(password, DEFAULT_ITERATIONS)
}

/// Hash `password` with a fresh random salt and `iterations` rounds.
pub fn hash_password_with(password: &str, iterations: u32) -> String {
    let salt: [u8; SALT_LEN] = rand::random();
    encode(password, &salt, iterations.max(1))
}

fn encode(password: &str, salt: &[u8], iterations: u32) -> String {
    format!(
        "{}${}${}${}",
        SCHEME,
        iterations,
        hex::encode(salt),
        hex::encode(derive(password, salt, iterations))
    )
}

fn derive(password: &str, salt: &[u8], iterations: u32) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key);
    key
}

/// Check `password` against a stored value.
pub fn verify_password(password: &str, stored: &str, policy: LegacyPolicy) -> bool {
    match parse(stored) {
        Some(hash) => {
            let key = derive(password, &hash.salt, hash.iterations);
            key.as_slice().ct_eq(hash.key.as_slice()).into()
        }
        None => match policy {
            LegacyPolicy::AllowPlaintext => password.as_bytes().ct_eq(stored.as_bytes()).into(),
            LegacyPolicy::Reject => {
                tracing::warn!("Stored password is not hashed and plaintext is disabled");
                false
            }
        },
    }
}

struct StoredHash {
    iterations: u32,
    salt: Vec<u8>,
    key: Vec<u8>,
}

fn parse(stored: &str) -> Option<StoredHash> {
    let mut parts = stored.split('$');
    if parts.next()? != SCHEME {
        return None;
    }
    let iterations: u32 = parts.next()?.parse().ok().filter(|n| *n > 0)?;
    let salt = hex::decode(parts.next()?).ok()?;
    let key = hex::decode(parts.next()?).ok()?;
    if parts.next().is_some() || key.len() != KEY_LEN {
        return None;
    }
    Some(StoredHash {
        iterations,
        salt,
        key,
    })
}
