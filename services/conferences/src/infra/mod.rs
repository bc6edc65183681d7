pub mod db;
pub mod provider;
