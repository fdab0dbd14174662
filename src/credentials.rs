// Password encoding. The server never sees the plain password: the client
// sends a hex digest of username + password instead.

use sha2::{Digest, Sha512};

/// Turns a (username, password) pair into the credential string that is
/// transmitted in place of the password.
pub trait CredentialEncoder {
    fn encode(&self, username: &str, password: &str) -> String;
}

/// SHA-512 over `username || password`, lowercase hex (128 characters).
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha512Encoder;

impl CredentialEncoder for Sha512Encoder {
    fn encode(&self, username: &str, password: &str) -> String {
        let mut hasher = Sha512::new();
        hasher.update(username.as_bytes());
        hasher.update(password.as_bytes());
        hex::encode(hasher.finalize())
    }
}
