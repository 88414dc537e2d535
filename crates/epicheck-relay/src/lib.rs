//! epicheck-relay
//!
//! Stateless CORS pass-through forwarder for the EpiCheck web build.
//!
//! Browsers cannot call the intranet directly (no CORS headers on the
//! third-party side), so the web build points at this relay instead. The
//! relay forwards method, path, query, headers, and body verbatim to the
//! configured upstream and returns the upstream response with permissive
//! CORS. It holds no state, performs no auth of its own, and never retries.

pub mod routes;
pub mod state;
