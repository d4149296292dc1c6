//! Layered configuration loading.
//!
//! Priority: CLI flags > `DRAY_*` environment variables > config file >
//! built-in defaults. The file itself is required; everything above it is
//! an overlay.

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format as _, Serialized, Toml},
};

use dray_config::{ConfigDiscovery, DrayConfig};

use crate::cli::BuildArgs;
use crate::error::{CliError, Result};

/// Resolve the config file for a project directory: an explicit path wins,
/// otherwise discovery under the directory.
pub fn resolve_config_path(dir: &Path, explicit: Option<&PathBuf>) -> Result<PathBuf> {
    explicit
        .cloned()
        .or_else(|| ConfigDiscovery::new(dir).find())
        .ok_or_else(|| CliError::ConfigMissing(dir.to_path_buf()))
}

/// Assemble the effective build configuration for `dray build`.
pub fn load_build_config(args: &BuildArgs) -> Result<DrayConfig> {
    let path = resolve_config_path(&args.dir, args.config.as_ref())?;

    let figment = Figment::new()
        .merge(Serialized::defaults(DrayConfig::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("DRAY_"));

    let mut config: DrayConfig = figment
        .extract()
        .map_err(|e| CliError::ConfigInvalid(e.to_string()))?;

    if let Some(environment) = &args.environment {
        config.environment = environment.clone();
    }
    if let Some(target) = &args.target {
        // The first target is the primary one every bundle writes against.
        config.targets.insert(0, target.clone());
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn project_with(toml: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("dray.toml"), toml).unwrap();
        dir
    }

    fn build_args(dir: &TempDir) -> BuildArgs {
        BuildArgs {
            dir: dir.path().to_path_buf(),
            config: None,
            environment: None,
            target: None,
            packages: PathBuf::from("lib"),
            emit_trace: false,
        }
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = project_with(
            r#"
            environment = "stage"

            [[bundles]]
            name = "main"
            "#,
        );

        let config = load_build_config(&build_args(&dir)).unwrap();
        assert_eq!(config.environment, "stage");
        assert_eq!(config.config_target, "main");
    }

    #[test]
    fn cli_flags_override_the_file() {
        let dir = project_with(
            r#"
            environment = "stage"
            targets = ["build/out"]

            [[bundles]]
            name = "main"
            "#,
        );

        let mut args = build_args(&dir);
        args.environment = Some("prod".into());
        args.target = Some(PathBuf::from("elsewhere"));

        let config = load_build_config(&args).unwrap();
        assert_eq!(config.environment, "prod");
        assert_eq!(config.targets[0], PathBuf::from("elsewhere"));
        assert_eq!(config.targets[1], PathBuf::from("build/out"));
    }

    #[test]
    fn missing_config_file_is_reported_with_the_directory() {
        let dir = TempDir::new().unwrap();
        let err = load_build_config(&build_args(&dir)).unwrap_err();
        assert!(matches!(err, CliError::ConfigMissing(path) if path == dir.path()));
    }

    #[test]
    fn explicit_config_path_skips_discovery() {
        let dir = TempDir::new().unwrap();
        let custom = dir.path().join("custom.toml");
        fs::write(&custom, "[[bundles]]\nname = \"main\"\n").unwrap();

        let mut args = build_args(&dir);
        args.config = Some(custom);

        let config = load_build_config(&args).unwrap();
        assert_eq!(config.bundles[0].name, "main");
    }
}
