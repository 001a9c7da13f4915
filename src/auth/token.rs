//! Token secrets, per-audience records, and access token claim decoding.

pub mod claims;
pub mod record;
pub mod secret;
