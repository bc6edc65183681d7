//! Service plumbing shared by the conference-line service and its batch jobs.
//!
//! Nothing in here knows about phone numbers or conferences.

pub mod health;
pub mod middleware;
pub mod serde;
pub mod tracing;
