//! Built-in credential types.

pub mod atoma_network_api;

pub use atoma_network_api::AtomaNetworkApi;
