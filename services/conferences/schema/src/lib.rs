//! sea-orm entities for the conference-line store.

pub mod call_stats;
pub mod conferences;
pub mod login_tokens;
pub mod phone_numbers;
pub mod stats;
