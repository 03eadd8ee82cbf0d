use super::types::{
    CurriculumConfig, DEFAULT_MAX_TOKENS, DEFAULT_PROVIDER, DEFAULT_TEMPERATURE,
    DEFAULT_TIMEOUT_SECS, OcrConfig, ProviderConfig, RawCurriculumConfig, RawOcrConfig,
    RawProviderConfig, RawSessionConfig, RawTutorConfig, SessionConfig, TutorConfig,
};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tutor_core::catalog::DEFAULT_GRADE;
use tutor_core::curriculum::DEFAULT_MAX_CHARS;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project)
    pub fn load() -> Result<TutorConfig> {
        Self::load_from(&Self::user_config_path(), &Self::project_config_path())
    }

    /// Load and merge two config files; either may be missing
    pub fn load_from(user_path: &Path, project_path: &Path) -> Result<TutorConfig> {
        let mut raw = RawTutorConfig::default();

        // Layer 1: User config
        if let Some(user_config) = Self::read_raw(user_path)? {
            raw = Self::merge_raw(raw, user_config);
        }

        // Layer 2: Project config
        if let Some(project_config) = Self::read_raw(project_path)? {
            raw = Self::merge_raw(raw, project_config);
        }

        Ok(Self::finalize(raw))
    }

    /// Get user config path
    pub fn user_config_path() -> PathBuf {
        tutor_paths::config_dir().join("config.toml")
    }

    /// Get project config path
    /// Can be overridden with TUTOR_PROJECT_CONFIG_DIR env var (useful for isolated tests)
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("TUTOR_PROJECT_CONFIG_DIR") {
            PathBuf::from(dir).join("config.toml")
        } else {
            PathBuf::from(".tutor/config.toml")
        }
    }

    fn read_raw(path: &Path) -> Result<Option<RawTutorConfig>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let raw = toml::from_str(&contents)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(Some(raw))
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawTutorConfig, overlay: RawTutorConfig) -> RawTutorConfig {
        RawTutorConfig {
            provider: RawProviderConfig {
                name: overlay.provider.name.or(base.provider.name),
                model: overlay.provider.model.or(base.provider.model),
                base_url: overlay.provider.base_url.or(base.provider.base_url),
                max_tokens: overlay.provider.max_tokens.or(base.provider.max_tokens),
                temperature: overlay.provider.temperature.or(base.provider.temperature),
                timeout_secs: overlay.provider.timeout_secs.or(base.provider.timeout_secs),
            },
            session: RawSessionConfig {
                student_name: overlay.session.student_name.or(base.session.student_name),
                grade: overlay.session.grade.or(base.session.grade),
            },
            curriculum: RawCurriculumConfig {
                path: overlay.curriculum.path.or(base.curriculum.path),
                max_chars: overlay.curriculum.max_chars.or(base.curriculum.max_chars),
            },
            ocr: RawOcrConfig {
                model: overlay.ocr.model.or(base.ocr.model),
                base_url: overlay.ocr.base_url.or(base.ocr.base_url),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawTutorConfig) -> TutorConfig {
        TutorConfig {
            provider: ProviderConfig {
                name: raw
                    .provider
                    .name
                    .unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
                model: raw.provider.model,
                base_url: raw.provider.base_url,
                max_tokens: raw.provider.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
                temperature: raw.provider.temperature.unwrap_or(DEFAULT_TEMPERATURE),
                timeout_secs: raw.provider.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            },
            session: SessionConfig {
                student_name: raw.session.student_name,
                grade: raw.session.grade.unwrap_or(DEFAULT_GRADE),
            },
            curriculum: CurriculumConfig {
                path: raw
                    .curriculum
                    .path
                    .unwrap_or_else(tutor_paths::curriculum_file),
                max_chars: raw.curriculum.max_chars.unwrap_or(DEFAULT_MAX_CHARS),
            },
            ocr: OcrConfig {
                model: raw
                    .ocr
                    .model
                    .unwrap_or_else(|| OcrConfig::default().model),
                base_url: raw.ocr.base_url,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_missing_files_give_defaults() {
        let dir = TempDir::new().unwrap();
        let config =
            ConfigLoader::load_from(&dir.path().join("a.toml"), &dir.path().join("b.toml"))
                .unwrap();

        assert_eq!(config.provider.name, DEFAULT_PROVIDER);
        assert_eq!(config.session.grade, DEFAULT_GRADE);
        assert_eq!(config.curriculum.max_chars, DEFAULT_MAX_CHARS);
    }

    #[test]
    fn test_project_overrides_user_only_where_set() {
        let dir = TempDir::new().unwrap();
        let user = write(
            &dir,
            "user.toml",
            r#"
[provider]
name = "openai"
model = "gpt-4o"
max_tokens = 2048

[session]
student_name = "Maya"
"#,
        );
        let project = write(
            &dir,
            "project.toml",
            r#"
[provider]
model = "gpt-4o-mini"

[session]
grade = 6

[curriculum]
max_chars = 2000
"#,
        );

        let config = ConfigLoader::load_from(&user, &project).unwrap();

        assert_eq!(config.provider.name, "openai");
        assert_eq!(config.provider.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(config.provider.max_tokens, 2048);
        assert_eq!(config.session.student_name.as_deref(), Some("Maya"));
        assert_eq!(config.session.grade, 6);
        assert_eq!(config.curriculum.max_chars, 2000);
        assert_eq!(config.ocr.model, "mistral-ocr-latest");
    }

    #[test]
    fn test_invalid_toml_names_the_file() {
        let dir = TempDir::new().unwrap();
        let bad = write(&dir, "bad.toml", "[provider\nname = ");

        let err = ConfigLoader::load_from(&bad, &dir.path().join("none.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("bad.toml"));
    }

    #[test]
    #[serial]
    fn test_project_config_dir_override() {
        // SAFETY: serialized with other env-mutating tests
        unsafe { std::env::set_var("TUTOR_PROJECT_CONFIG_DIR", "/tmp/tutor-test") };
        let path = ConfigLoader::project_config_path();
        unsafe { std::env::remove_var("TUTOR_PROJECT_CONFIG_DIR") };

        assert_eq!(path, PathBuf::from("/tmp/tutor-test/config.toml"));
        assert_eq!(
            ConfigLoader::project_config_path(),
            PathBuf::from(".tutor/config.toml")
        );
    }
}
