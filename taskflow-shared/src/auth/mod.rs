//! Authentication and authorization
//!
//! - [`password`]: Argon2id hashing
//! - [`jwt`]: session token issuance and validation
//! - [`middleware`]: bearer-token extraction into [`middleware::AuthContext`]
//! - [`authorization`]: role checks

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
