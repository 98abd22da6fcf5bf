//! AgentProvisioner implementations.

pub mod http;

pub use http::{HttpAgentProvisioner, ProvisionerConfig};
