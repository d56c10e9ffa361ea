//! Credential material generation.

use issuer_core::NewCredential;
use rand::rngs::OsRng;
use rand::RngCore;
use uuid::Uuid;

/// Bytes of entropy in a generated signing secret.
pub const SECRET_BYTES: usize = 32;

/// Fresh `{key, secret}` pair for a new JWT credential.
///
/// The secret is 32 bytes from the operating system CSPRNG, hex encoded.
/// The key is a random UUID in simple form.
#[must_use]
pub fn generate_credential() -> NewCredential {
    let mut bytes = [0u8; SECRET_BYTES];
    OsRng.fill_bytes(&mut bytes);

    NewCredential {
        key: Uuid::new_v4().simple().to_string(),
        secret: hex::encode(bytes),
    }
}
