//! # intake-http
//!
//! [`HttpEmailVerifier`] implements
//! [`EmailVerifier`](intake_forms::EmailVerifier) against the remote
//! validation endpoint: a `GET` with the address as a query parameter,
//! answered by a JSON body carrying a validation flag and a status code.

pub mod client;

pub use client::HttpEmailVerifier;
