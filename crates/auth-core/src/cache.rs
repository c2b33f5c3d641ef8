use serde::{Deserialize, Serialize};

/// The Authorization header cached on a UE after a successful
/// registration challenge, reused on subsequent non-REGISTER requests
/// within the same registration lifetime (spec.md §4.7).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthorizationCache {
    pub header_value: Option<String>,
    pub realm: Option<String>,
    pub nonce_count: u32,
}

impl AuthorizationCache {
    pub fn store(&mut self, header_value: String, realm: String) {
        self.header_value = Some(header_value);
        self.realm = Some(realm);
        self.nonce_count += 1;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
