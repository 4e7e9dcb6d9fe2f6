pub mod client;
pub mod config;
pub mod harness;

pub use client::{ApiError, PaiClient};
pub use config::ClusterConfig;
pub use harness::{CaseRunner, ClientInvoker, TestContext};
