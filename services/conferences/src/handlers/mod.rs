pub mod conference;
pub mod health;
pub mod login_token;
pub mod stats;
