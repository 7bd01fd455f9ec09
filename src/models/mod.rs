//! Data models for the sales race backend.
//!
//! API-facing types serialize in camelCase to match the dashboard front-end;
//! row types mirror the remote table.

mod division;
mod member;

pub use division::*;
pub use member::*;
