//! CLI integration tests
//!
//! Only commands that stay off the container runtime and the network are exercised here.

use std::fs;
use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

fn panel_bin(settings: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_poabot-panel"));
    cmd.env("POABOT_PANEL_SETTINGS", settings)
        .env_remove("POABOT_PANEL_ENV_FILE")
        .env_remove("POABOT_PANEL_LOG")
        .env("NO_COLOR", "1");
    cmd
}

/// Settings file pointing every managed path into `dir`
fn write_settings(dir: &TempDir) -> std::path::PathBuf {
    let settings = dir.path().join("settings.toml");
    fs::write(
        &settings,
        format!(
            "env_file = \"{}\"\n\n[proxy]\nconfig_path = \"{}\"\norigin_config_path = \"{}\"\n",
            dir.path().join("poabot.env").display(),
            dir.path().join("Caddyfile").display(),
            dir.path().join("cockpit.conf").display(),
        ),
    )
    .unwrap();
    settings
}

#[test]
fn help_output() {
    let dir = TempDir::new().unwrap();
    let output = panel_bin(&dir.path().join("settings.toml"))
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["config", "save", "bot", "domain", "trigger", "settings"] {
        assert!(stdout.contains(command), "missing {command} in help");
    }
    assert!(stdout.contains("--settings"));
}

#[test]
fn version_output() {
    let dir = TempDir::new().unwrap();
    let output = panel_bin(&dir.path().join("settings.toml"))
        .arg("--version")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("poabot-panel"));
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn settings_path_follows_override() {
    let dir = TempDir::new().unwrap();
    let settings = dir.path().join("custom.toml");
    let output = panel_bin(&settings)
        .args(["settings", "path"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), settings.to_string_lossy());
}

#[test]
fn settings_init_then_show() {
    let dir = TempDir::new().unwrap();
    let settings = dir.path().join("nested").join("settings.toml");

    let output = panel_bin(&settings)
        .args(["settings", "init"])
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());
    assert!(settings.exists());

    let output = panel_bin(&settings)
        .args(["settings", "show"])
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("container_name"));
    assert!(stdout.contains("poabot"));
    assert!(stdout.contains("proxy.service"));
}

#[test]
fn config_keys_lists_known_keys() {
    let dir = TempDir::new().unwrap();
    let output = panel_bin(&dir.path().join("settings.toml"))
        .args(["config", "keys"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.lines().any(|l| l == "PASSWORD"));
    assert!(stdout.lines().any(|l| l == "DISCORD_WEBHOOK_URL"));
    assert!(stdout.lines().any(|l| l == "DOMAIN"));
}

#[test]
fn check_whitelist_normalizes_valid_input() {
    let dir = TempDir::new().unwrap();
    let output = panel_bin(&dir.path().join("settings.toml"))
        .args(["config", "check-whitelist", "1.2.3.4;  10.0.0.1\t8.8.8.8"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), "1.2.3.4, 10.0.0.1, 8.8.8.8");
}

#[test]
fn config_show_masks_secrets() {
    let dir = TempDir::new().unwrap();
    let settings = write_settings(&dir);
    fs::write(
        dir.path().join("poabot.env"),
        "PASSWORD=\"abcdefghijkl\"\nDOMAIN=\"bot.example.com\"\nWHITELIST=\"[\"10.0.0.1\"]\"\n",
    )
    .unwrap();

    let output = panel_bin(&settings)
        .args(["config", "show"])
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("abcd...ijkl"));
    assert!(!stdout.contains("abcdefghijkl"));
    assert!(stdout.contains("bot.example.com"));
    assert!(stdout.contains("10.0.0.1"));

    let output = panel_bin(&settings)
        .args(["config", "show", "--reveal"])
        .output()
        .expect("Failed to execute command");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("abcdefghijkl"));
}

#[test]
fn config_set_persists_to_env_file() {
    let dir = TempDir::new().unwrap();
    let settings = write_settings(&dir);
    let env_file = dir.path().join("poabot.env");
    fs::write(
        &env_file,
        "# poabot\nPASSWORD=\"pw\"\nWHITELIST=\"[\"10.0.0.1\"]\"\nEXTRA_FLAG=\"on\"\n",
    )
    .unwrap();

    let output = panel_bin(&settings)
        .args(["config", "set", "DOMAIN", "  bot.example.com "])
        .output()
        .expect("Failed to execute command");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let content = fs::read_to_string(&env_file).unwrap();
    assert!(content.contains("DOMAIN=\"bot.example.com\""));
    assert!(content.contains("PASSWORD=\"pw\""));
    assert!(content.contains("EXTRA_FLAG=\"on\""));
    assert!(content.contains("10.0.0.1"));
}

#[test]
fn config_get_reads_env_file_override() {
    let dir = TempDir::new().unwrap();
    let env_file = dir.path().join("other.env");
    fs::write(&env_file, "DOMAIN=bot.example.com\n").unwrap();

    let output = panel_bin(&dir.path().join("settings.toml"))
        .env("POABOT_PANEL_ENV_FILE", &env_file)
        .args(["config", "get", "DOMAIN"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "bot.example.com");
}
