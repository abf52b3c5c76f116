//! Loading and validation of the project file.

use crate::error::ConfigError;
use crate::types::ProjectConfig;
use std::path::Path;

/// File name looked up inside a project directory.
pub const CONFIG_FILE_NAME: &str = "asterics.toml";

/// Reads and validates `<project_dir>/asterics.toml`.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    let content = std::fs::read_to_string(project_dir.join(CONFIG_FILE_NAME))?;
    load_config_from_str(&content)
}

/// Parses and validates project file text.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.project.name.trim().is_empty() {
        return Err(ConfigError::MissingField("project.name".to_string()));
    }
    for (name, repo) in &config.repositories {
        if name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "repository name must not be empty".to_string(),
            ));
        }
        if repo.path.as_os_str().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "repositories.{name}.path"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BuildConfig;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = load_config_from_str("[project]\nname = \"camera\"\n").unwrap();
        assert_eq!(config.project.name, "camera");
        assert!(config.repositories.is_empty());
        assert_eq!(config.build, BuildConfig::default());
        assert!(config.build.abort_on_fatal);
    }

    #[test]
    fn full_config() {
        let toml = r#"
[project]
name = "camera_pipeline"
description = "OV7670 to memory writer"

[repositories.default]
path = "modules"

[repositories.user]
path = "user_modules"

[build]
abort_on_fatal = false
auto_propagate_generics = false
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.repositories.len(), 2);
        assert_eq!(
            config.repositories["user"].path,
            std::path::PathBuf::from("user_modules")
        );
        assert!(!config.build.abort_on_fatal);
        assert!(!config.build.auto_propagate_generics);
        assert!(config.build.auto_instantiate);
    }

    #[test]
    fn empty_name_rejected() {
        let err = load_config_from_str("[project]\nname = \"  \"\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(f) if f == "project.name"));
    }

    #[test]
    fn empty_repository_path_rejected() {
        let toml = "[project]\nname = \"x\"\n[repositories.default]\npath = \"\"\n";
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(f) if f == "repositories.default.path"));
    }

    #[test]
    fn unknown_field_rejected() {
        let err = load_config_from_str("[project]\nname = \"x\"\ntop = \"a\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[project]\nname = \"from_disk\"\n",
        )
        .unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.project.name, "from_disk");
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_config(dir.path()).unwrap_err(),
            ConfigError::IoError(_)
        ));
    }
}
