//! GitHub releases adapter for the panel tooling package

use async_trait::async_trait;
use serde::Deserialize;

use crate::application::ports::{Release, ReleaseError, ReleaseSource};

/// GitHub rejects API requests without a User-Agent
const USER_AGENT: &str = concat!("poabot-panel/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct GithubRelease {
    tag_name: String,
    #[serde(default)]
    draft: bool,
    #[serde(default)]
    assets: Vec<Asset>,
}

#[derive(Debug, Deserialize)]
struct Asset {
    name: String,
    browser_download_url: String,
}

/// GitHub releases client
pub struct GithubReleases {
    url: String,
    client: reqwest::Client,
}

impl GithubReleases {
    /// `url` is the repository's releases endpoint
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// First `.deb` asset of a release
    fn package_url(release: &GithubRelease) -> Option<String> {
        release
            .assets
            .iter()
            .find(|a| a.name.ends_with(".deb"))
            .map(|a| a.browser_download_url.clone())
    }
}

#[async_trait]
impl ReleaseSource for GithubReleases {
    async fn list_releases(&self) -> Result<Vec<Release>, ReleaseError> {
        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| ReleaseError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReleaseError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let releases: Vec<GithubRelease> = response
            .json()
            .await
            .map_err(|e| ReleaseError::ParseError(e.to_string()))?;

        Ok(releases
            .iter()
            .filter(|r| !r.draft)
            .map(|r| Release {
                tag: r.tag_name.clone(),
                package_url: Self::package_url(r),
            })
            .collect())
    }
}
