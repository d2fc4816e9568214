//! Business services behind the HTTP handlers.

pub mod auth;
