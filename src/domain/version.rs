//! Image version tags and ordering

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;

/// The floating tag every update retags to
pub const LATEST_TAG: &str = "latest";

static RELEASE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+\.\d+$").expect("valid version regex"));

/// Whether `tag` is a strict `MAJOR.MINOR.PATCH` tag
pub fn is_release_tag(tag: &str) -> bool {
    RELEASE_TAG.is_match(tag)
}

/// Numeric components of a version; a leading `v` is ignored and
/// non-numeric components count as 0
fn components(version: &str) -> Vec<u64> {
    version
        .trim()
        .trim_start_matches('v')
        .split('.')
        .map(|part| {
            let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
            digits.parse().unwrap_or(0)
        })
        .collect()
}

/// Component-wise numeric comparison, missing components treated as 0
pub fn compare(a: &str, b: &str) -> Ordering {
    let a = components(a);
    let b = components(b);
    let len = a.len().max(b.len());

    for i in 0..len {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// Sort newest first
pub fn sort_descending(versions: &mut [String]) {
    versions.sort_by(|a, b| compare(b, a));
}

/// `(major, minor)` of a version string
pub fn major_minor(version: &str) -> (u64, u64) {
    let parts = components(version);
    (
        parts.first().copied().unwrap_or(0),
        parts.get(1).copied().unwrap_or(0),
    )
}

/// Pick the first release tag attached to an image.
///
/// `repo_tags` are full references such as `docker.io/org/bot:1.2.3`.
pub fn version_from_repo_tags(repo_tags: &[String]) -> Option<String> {
    repo_tags
        .iter()
        .filter_map(|reference| reference.rsplit_once(':').map(|(_, tag)| tag.trim()))
        .find(|tag| *tag != LATEST_TAG && is_release_tag(tag))
        .map(str::to_string)
}

/// Choose the tooling release for a bot version: same major.minor if one exists,
/// otherwise the newest release
pub fn select_compatible<'a>(releases: &'a [String], version: &str) -> Option<&'a str> {
    let wanted = major_minor(version);

    let exact = releases
        .iter()
        .filter(|r| major_minor(r) == wanted)
        .max_by(|a, b| compare(a, b));

    exact
        .or_else(|| releases.iter().max_by(|a, b| compare(a, b)))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn sorts_numerically_not_lexicographically() {
        let mut versions = strings(&["1.2.0", "1.10.0", "1.2.10"]);
        sort_descending(&mut versions);
        assert_eq!(versions, vec!["1.10.0", "1.2.10", "1.2.0"]);
    }

    #[test]
    fn missing_components_are_zero() {
        assert_eq!(compare("1.2", "1.2.0"), Ordering::Equal);
        assert_eq!(compare("2", "1.9.9"), Ordering::Greater);
    }

    #[test]
    fn non_numeric_tags_sort_last() {
        let mut versions = strings(&["latest", "0.1.0", "1.0.0"]);
        sort_descending(&mut versions);
        assert_eq!(versions, vec!["1.0.0", "0.1.0", "latest"]);
    }

    #[test]
    fn release_tag_is_strict() {
        assert!(is_release_tag("1.2.3"));
        assert!(!is_release_tag("latest"));
        assert!(!is_release_tag("1.2"));
        assert!(!is_release_tag("v1.2.3"));
        assert!(!is_release_tag("1.2.3-rc1"));
    }

    #[test]
    fn version_from_repo_tags_skips_latest() {
        let tags = strings(&[
            "docker.io/jangdokang/poabot:latest",
            "docker.io/jangdokang/poabot:1.4.2",
        ]);
        assert_eq!(version_from_repo_tags(&tags), Some("1.4.2".to_string()));
    }

    #[test]
    fn version_from_repo_tags_handles_registry_port() {
        let tags = strings(&["localhost:5000/poabot:2.0.1"]);
        assert_eq!(version_from_repo_tags(&tags), Some("2.0.1".to_string()));
    }

    #[test]
    fn version_from_repo_tags_without_release_is_none() {
        let tags = strings(&["docker.io/jangdokang/poabot:latest", "poabot:dev"]);
        assert_eq!(version_from_repo_tags(&tags), None);
    }

    #[test]
    fn select_compatible_prefers_same_major_minor() {
        let releases = strings(&["v1.3.0", "v1.2.1", "v1.2.4", "v2.0.0"]);
        assert_eq!(select_compatible(&releases, "1.2.9"), Some("v1.2.4"));
    }

    #[test]
    fn select_compatible_falls_back_to_newest() {
        let releases = strings(&["v1.3.0", "v2.0.0", "v1.2.1"]);
        assert_eq!(select_compatible(&releases, "3.1.0"), Some("v2.0.0"));
    }

    #[test]
    fn select_compatible_empty_is_none() {
        assert_eq!(select_compatible(&[], "1.0.0"), None);
    }
}
