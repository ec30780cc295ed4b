//! In-memory port implementations for use case tests

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use super::ports::{
    CommandError, CommandOutput, CommandRunner, FileError, ImageRegistry, PrivilegedFs,
    RegistryError, Release, ReleaseError, ReleaseSource,
};

fn ok(stdout: &str) -> CommandOutput {
    CommandOutput {
        code: Some(0),
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

/// Command runner that answers by command-line prefix and records every call.
///
/// Unscripted commands succeed with empty output.
#[derive(Default)]
pub struct MockRunner {
    rules: Mutex<Vec<(String, Result<CommandOutput, CommandError>)>>,
    calls: Mutex<Vec<String>>,
    inputs: Mutex<Vec<(String, String)>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands starting with `prefix` with `stdout` and exit 0
    pub fn reply(self, prefix: &str, stdout: &str) -> Self {
        self.push(prefix, Ok(ok(stdout)))
    }

    /// Answer commands starting with `prefix` with a non-zero exit
    pub fn fail(self, prefix: &str, code: i32, stderr: &str) -> Self {
        self.push(
            prefix,
            Ok(CommandOutput {
                code: Some(code),
                stdout: String::new(),
                stderr: stderr.to_string(),
            }),
        )
    }

    /// Commands starting with `prefix` cannot be spawned
    pub fn missing(self, prefix: &str) -> Self {
        let program = prefix.split_whitespace().next().unwrap_or(prefix).to_string();
        self.push(prefix, Err(CommandError::NotFound(program)))
    }

    fn push(self, prefix: &str, response: Result<CommandOutput, CommandError>) -> Self {
        self.rules
            .lock()
            .unwrap()
            .push((prefix.to_string(), response));
        self
    }

    /// Every command line run so far, space-joined
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called(&self, prefix: &str) -> bool {
        self.calls().iter().any(|c| c.starts_with(prefix))
    }

    /// Stdin fed to the first command starting with `prefix`
    pub fn input_for(&self, prefix: &str) -> Option<String> {
        self.inputs
            .lock()
            .unwrap()
            .iter()
            .find(|(line, _)| line.starts_with(prefix))
            .map(|(_, input)| input.clone())
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn output_with_input(
        &self,
        argv: &[&str],
        input: Option<&str>,
    ) -> Result<CommandOutput, CommandError> {
        let line = argv.join(" ");
        self.calls.lock().unwrap().push(line.clone());
        if let Some(input) = input {
            self.inputs
                .lock()
                .unwrap()
                .push((line.clone(), input.to_string()));
        }

        let rules = self.rules.lock().unwrap();
        rules
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| Ok(ok("")))
    }
}

/// File system held in memory; selected paths refuse writes
#[derive(Default)]
pub struct MemoryFs {
    files: Mutex<HashMap<PathBuf, String>>,
    read_only: Mutex<HashSet<PathBuf>>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.files
            .lock()
            .unwrap()
            .insert(PathBuf::from(path), content.to_string());
        self
    }

    pub fn read_only(self, path: &str) -> Self {
        self.read_only.lock().unwrap().insert(PathBuf::from(path));
        self
    }

    pub fn content(&self, path: &str) -> Option<String> {
        self.files.lock().unwrap().get(Path::new(path)).cloned()
    }
}

#[async_trait]
impl PrivilegedFs for MemoryFs {
    async fn read(&self, path: &Path) -> Result<Option<String>, FileError> {
        Ok(self.files.lock().unwrap().get(path).cloned())
    }

    async fn replace(&self, path: &Path, content: &str) -> Result<(), FileError> {
        if self.read_only.lock().unwrap().contains(path) {
            return Err(FileError::PermissionDenied(path.display().to_string()));
        }
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), content.to_string());
        Ok(())
    }
}

/// Registry with a fixed answer
pub struct StaticRegistry(pub Result<Vec<String>, RegistryError>);

impl StaticRegistry {
    pub fn tags(tags: &[&str]) -> Self {
        Self(Ok(tags.iter().map(|t| t.to_string()).collect()))
    }
}

#[async_trait]
impl ImageRegistry for StaticRegistry {
    async fn list_tags(&self) -> Result<Vec<String>, RegistryError> {
        self.0.clone()
    }
}

/// Release source with a fixed answer
pub struct StaticReleases(pub Result<Vec<Release>, ReleaseError>);

impl StaticReleases {
    pub fn tags(tags: &[&str]) -> Self {
        Self(Ok(tags
            .iter()
            .map(|t| Release {
                tag: t.to_string(),
                package_url: Some(format!("https://example.test/{t}/poabot-panel.deb")),
            })
            .collect()))
    }
}

#[async_trait]
impl ReleaseSource for StaticReleases {
    async fn list_releases(&self) -> Result<Vec<Release>, ReleaseError> {
        self.0.clone()
    }
}
