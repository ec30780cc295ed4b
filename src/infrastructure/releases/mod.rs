//! Release metadata adapters

pub mod github;

pub use github::GithubReleases;
