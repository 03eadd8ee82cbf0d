use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use tutor_core::catalog::DEFAULT_GRADE;
use tutor_core::curriculum::DEFAULT_MAX_CHARS;
use tutor_models::ocr::DEFAULT_OCR_MODEL;

/// Provider used when no config names one
pub const DEFAULT_PROVIDER: &str = "anthropic";
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawTutorConfig {
    #[serde(default)]
    pub provider: RawProviderConfig,

    #[serde(default)]
    pub session: RawSessionConfig,

    #[serde(default)]
    pub curriculum: RawCurriculumConfig,

    #[serde(default)]
    pub ocr: RawOcrConfig,
}

/// Provider config as stored in TOML (optional fields for proper merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawProviderConfig {
    /// `anthropic` or `openai`
    pub name: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawSessionConfig {
    pub student_name: Option<String>,
    pub grade: Option<u8>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawCurriculumConfig {
    pub path: Option<PathBuf>,
    pub max_chars: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawOcrConfig {
    pub model: Option<String>,
    pub base_url: Option<String>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TutorConfig {
    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub curriculum: CurriculumConfig,

    #[serde(default)]
    pub ocr: OcrConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// `anthropic` or `openai`
    pub name: String,

    /// Model override; the provider's default when unset
    pub model: Option<String>,

    /// API base URL override
    pub base_url: Option<String>,

    pub max_tokens: u32,

    pub temperature: f32,

    /// Per-request HTTP timeout
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_PROVIDER.to_string(),
            model: None,
            base_url: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Student name used when `tutor learn` is run without `--name`
    pub student_name: Option<String>,

    /// Grade used when `tutor learn` is run without `--grade`
    pub grade: u8,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            student_name: None,
            grade: DEFAULT_GRADE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurriculumConfig {
    /// Curriculum store file
    pub path: PathBuf,

    /// Longest curriculum block embedded in a prompt, in characters
    pub max_chars: usize,
}

impl Default for CurriculumConfig {
    fn default() -> Self {
        Self {
            path: tutor_paths::curriculum_file(),
            max_chars: DEFAULT_MAX_CHARS,
        }
    }
}

/// OCR settings for `tutor curriculum add --pdf`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OcrConfig {
    pub model: String,

    /// OCR API base URL override
    pub base_url: Option<String>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_OCR_MODEL.to_string(),
            base_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = TutorConfig::default();
        assert_eq!(config.provider.name, "anthropic");
        assert!(config.provider.model.is_none());
        assert_eq!(config.provider.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(config.session.grade, DEFAULT_GRADE);
        assert_eq!(config.curriculum.max_chars, 8000);
        assert!(config.curriculum.path.ends_with("curriculum.json"));
        assert_eq!(config.ocr.model, "mistral-ocr-latest");
    }

    #[test]
    fn test_toml_round_trip() {
        let config = TutorConfig {
            provider: ProviderConfig {
                name: "openai".to_string(),
                model: Some("gpt-4o-mini".to_string()),
                base_url: None,
                max_tokens: 512,
                temperature: 0.3,
                timeout_secs: 30,
            },
            session: SessionConfig {
                student_name: Some("Maya".to_string()),
                grade: 6,
            },
            curriculum: CurriculumConfig {
                path: PathBuf::from("/tmp/curriculum.json"),
                max_chars: 4000,
            },
            ocr: OcrConfig::default(),
        };

        let toml_str = toml::to_string(&config).unwrap();
        let parsed: TutorConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.provider.name, "openai");
        assert_eq!(parsed.provider.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(parsed.session.student_name.as_deref(), Some("Maya"));
        assert_eq!(parsed.curriculum.path, PathBuf::from("/tmp/curriculum.json"));
        assert_eq!(parsed.ocr, OcrConfig::default());
    }

    #[test]
    fn test_raw_config_partial_parsing() {
        let toml_str = r#"
[provider]
model = "claude-3-5-haiku-latest"

[session]
grade = 8
"#;
        let raw: RawTutorConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(raw.provider.model.as_deref(), Some("claude-3-5-haiku-latest"));
        assert!(raw.provider.name.is_none());
        assert_eq!(raw.session.grade, Some(8));
        assert!(raw.curriculum.path.is_none());
    }

    #[test]
    fn test_raw_config_empty_uses_none() {
        let raw: RawTutorConfig = toml::from_str("").unwrap();
        assert!(raw.provider.name.is_none());
        assert!(raw.session.student_name.is_none());
        assert!(raw.curriculum.max_chars.is_none());
        assert!(raw.ocr.model.is_none());
    }
}
