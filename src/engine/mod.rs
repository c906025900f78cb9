pub mod cancel;
pub mod client;
pub mod download;
pub mod error;
pub mod latency;
pub mod ping;
pub mod runner;
pub mod servers;
pub mod types;
pub mod upload;
