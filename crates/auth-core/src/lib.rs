//! IMS Digest authentication: challenge parsing (respecting quoted
//! commas), HA1/HA2/response computation, Authorization header
//! construction, and the per-UE cache that lets subsequent requests
//! reuse a registration's challenge.

pub mod cache;
pub mod digest;
pub mod error;

pub use cache::AuthorizationCache;
pub use digest::{build_authorization_header, compute_response, AuthScheme, DigestChallenge};
pub use error::{AuthError, Result};
