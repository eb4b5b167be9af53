use std::fs;

use camino::Utf8Path;
use camino::Utf8PathBuf;
use config::Config;
use config::ConfigError as ExternalConfigError;
use config::File;
use config::FileFormat;
use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration build/deserialize error")]
    Config(#[from] ExternalConfigError),
    #[error("Failed to read Cargo.toml")]
    ManifestIo(#[from] std::io::Error),
    #[error("Failed to parse Cargo.toml TOML")]
    ManifestParse(#[from] toml::de::Error),
    #[error("Failed to serialize extracted Cargo.toml metadata")]
    ManifestSerialize(#[from] toml::ser::Error),
}

/// Naming and layout settings shared by the compiler and the CLI.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone)]
#[serde(default)]
pub struct Settings {
    /// Module every generated unit lives under, e.g. `rtpl` gives
    /// `crate::rtpl::tags::card_rtpl`.
    pub root_module: String,
    /// Appended to the last segment of every generated module name.
    pub unit_suffix: String,
    pub tag_extension: String,
    pub layout_extension: String,
    /// Directory template names are resolved against, relative to the project root.
    pub template_dir: Utf8PathBuf,
    /// Dump every generated unit once it is finalized.
    pub debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root_module: "rtpl".to_string(),
            unit_suffix: "_rtpl".to_string(),
            tag_extension: ".rtag".to_string(),
            layout_extension: ".rlayout".to_string(),
            template_dir: Utf8PathBuf::from("templates"),
            debug: false,
        }
    }
}

impl Settings {
    pub fn new(project_root: &Utf8Path) -> Result<Self, ConfigError> {
        let user_config_file = ProjectDirs::from("com.github", "rtpl", "rtpl")
            .map(|proj_dirs| proj_dirs.config_dir().join("rtpl.toml"))
            .and_then(|path| Utf8PathBuf::from_path_buf(path).ok());

        Self::load_from_paths(project_root, user_config_file.as_deref())
    }

    fn load_from_paths(
        project_root: &Utf8Path,
        user_config_path: Option<&Utf8Path>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = user_config_path {
            builder = builder.add_source(
                File::from(path.as_std_path())
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        let manifest_path = project_root.join("Cargo.toml");
        if manifest_path.exists() {
            let content = fs::read_to_string(&manifest_path)?;
            let full_toml_value: toml::Value = toml::from_str(&content)?;

            let table_path = ["package", "metadata", "rtpl"];

            let rtpl_value_opt: Option<&toml::Value> = table_path
                .iter()
                .try_fold(&full_toml_value, |current_val, &key| current_val.get(key));

            if let Some(rtpl_table) = rtpl_value_opt.and_then(|v| v.as_table()) {
                let rtpl_toml_string = toml::to_string(rtpl_table)?;
                builder = builder.add_source(File::from_str(&rtpl_toml_string, FileFormat::Toml));
            } else {
                tracing::trace!("No [package.metadata.rtpl] table in {}", manifest_path);
            }
        }

        builder = builder.add_source(
            File::from(project_root.join(".rtpl.toml").as_std_path())
                .format(FileFormat::Toml)
                .required(false),
        );

        builder = builder.add_source(
            File::from(project_root.join("rtpl.toml").as_std_path())
                .format(FileFormat::Toml)
                .required(false),
        );

        let config = builder.build()?;
        let settings = config.try_deserialize()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;
    use tempfile::TempDir;

    use super::*;

    fn utf8(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }

    mod defaults {
        use super::*;

        #[test]
        fn test_load_no_files() {
            let dir = tempdir().unwrap();
            let settings = Settings::load_from_paths(&utf8(&dir), None).unwrap();
            assert_eq!(settings, Settings::default());
            assert_eq!(settings.root_module, "rtpl");
            assert_eq!(settings.tag_extension, ".rtag");
        }
    }

    mod project_files {
        use super::*;

        #[test]
        fn test_load_rtpl_toml_only() {
            let dir = tempdir().unwrap();
            fs::write(dir.path().join("rtpl.toml"), "debug = true").unwrap();
            let settings = Settings::load_from_paths(&utf8(&dir), None).unwrap();
            assert!(settings.debug);
            assert_eq!(settings.unit_suffix, "_rtpl");
        }

        #[test]
        fn test_load_dot_rtpl_toml_only() {
            let dir = tempdir().unwrap();
            fs::write(dir.path().join(".rtpl.toml"), "root_module = \"views\"").unwrap();
            let settings = Settings::load_from_paths(&utf8(&dir), None).unwrap();
            assert_eq!(settings.root_module, "views");
        }

        #[test]
        fn test_load_cargo_metadata_only() {
            let dir = tempdir().unwrap();
            let content = "[package]\nname = \"app\"\n\n[package.metadata.rtpl]\ntag_extension = \".tag\"\n";
            fs::write(dir.path().join("Cargo.toml"), content).unwrap();
            let settings = Settings::load_from_paths(&utf8(&dir), None).unwrap();
            assert_eq!(settings.tag_extension, ".tag");
        }

        #[test]
        fn test_cargo_manifest_without_metadata() {
            let dir = tempdir().unwrap();
            fs::write(dir.path().join("Cargo.toml"), "[package]\nname = \"app\"\n").unwrap();
            let settings = Settings::load_from_paths(&utf8(&dir), None).unwrap();
            assert_eq!(settings, Settings::default());
        }
    }

    mod priority {
        use super::*;

        #[test]
        fn test_rtpl_overrides_dot_rtpl() {
            let dir = tempdir().unwrap();
            fs::write(dir.path().join(".rtpl.toml"), "debug = false").unwrap();
            fs::write(dir.path().join("rtpl.toml"), "debug = true").unwrap();
            let settings = Settings::load_from_paths(&utf8(&dir), None).unwrap();
            assert!(settings.debug);
        }

        #[test]
        fn test_dot_rtpl_overrides_cargo_metadata() {
            let dir = tempdir().unwrap();
            let manifest = "[package]\nname = \"app\"\n\n[package.metadata.rtpl]\nroot_module = \"meta\"\n";
            fs::write(dir.path().join("Cargo.toml"), manifest).unwrap();
            fs::write(dir.path().join(".rtpl.toml"), "root_module = \"dot\"").unwrap();
            let settings = Settings::load_from_paths(&utf8(&dir), None).unwrap();
            assert_eq!(settings.root_module, "dot");
        }

        #[test]
        fn test_project_overrides_user() {
            let user_dir = tempdir().unwrap();
            let project_dir = tempdir().unwrap();
            let user_conf_path = utf8(&user_dir).join("rtpl.toml");
            fs::write(&user_conf_path, "unit_suffix = \"_user\"\ndebug = true").unwrap();
            fs::write(project_dir.path().join("rtpl.toml"), "unit_suffix = \"_gen\"").unwrap();

            let settings =
                Settings::load_from_paths(&utf8(&project_dir), Some(&user_conf_path)).unwrap();
            assert_eq!(settings.unit_suffix, "_gen");
            assert!(settings.debug);
        }
    }

    mod errors {
        use super::*;

        #[test]
        fn test_invalid_toml_content() {
            let dir = tempdir().unwrap();
            fs::write(dir.path().join("rtpl.toml"), "debug = not_a_boolean").unwrap();
            let result = Settings::load_from_paths(&utf8(&dir), None);
            assert!(matches!(result.unwrap_err(), ConfigError::Config(_)));
        }

        #[test]
        fn test_invalid_cargo_manifest() {
            let dir = tempdir().unwrap();
            fs::write(dir.path().join("Cargo.toml"), "[package").unwrap();
            let result = Settings::load_from_paths(&utf8(&dir), None);
            assert!(matches!(result.unwrap_err(), ConfigError::ManifestParse(_)));
        }
    }
}
