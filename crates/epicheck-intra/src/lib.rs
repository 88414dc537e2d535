//! epicheck-intra
//!
//! REST client for the school intranet. Implements the `RosterSource`
//! boundary from `epicheck-roster` over HTTP and adds the surfaces the core
//! does not own: token verification, the day's planning, and the single
//! cached token file.
//!
//! Wire formats are dictated entirely by the third-party system; this crate
//! only decodes them into the core types and classifies every remote
//! response into the `RosterSourceError` taxonomy. No retry or backoff:
//! a failure is terminal for that call, timeouts come from the underlying
//! reqwest client.

pub mod client;
pub mod token_store;
pub mod wire;

pub use client::{IntraClient, IntraConfig};
pub use token_store::{FileSession, TokenStore};
pub use wire::ScheduledActivity;
