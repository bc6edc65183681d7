pub mod allocation;
pub mod call_stats;
pub mod conference;
pub mod login_token;
pub mod number_sync;
pub mod provision;
pub mod stats;
