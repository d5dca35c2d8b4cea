//! Request authentication.
//!
//! - [`RequestSigner`]: hash-chain signatures for gateways that authenticate
//!   inside the request body
//! - [`AuthScheme`]: `Authorization` header schemes (Basic and Bearer)

mod auth;
mod signer;

pub use auth::AuthScheme;
pub use signer::{DEFAULT_SEPARATOR, HashAlgorithm, RequestSigner};
