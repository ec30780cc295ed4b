//! Image registry adapters

pub mod docker_hub;

pub use docker_hub::DockerHubRegistry;
