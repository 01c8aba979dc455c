use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CodemetryError;

/// Top-level configuration loaded from `.codemetry.toml`.
///
/// Supports layered resolution: CLI flags > env vars > local config > defaults.
/// The resolution itself happens in the binary; the engine only ever sees the
/// fully-resolved [`ExternalConfig`] and an `AnalysisRequest`.
///
/// # Examples
///
/// ```
/// use codemetry_core::CodemetryConfig;
///
/// let config = CodemetryConfig::default();
/// assert_eq!(config.analysis.baseline_days, 56);
/// assert_eq!(config.analysis.follow_up_horizon_days, 3);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodemetryConfig {
    /// Window and baseline sizing.
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Commit-message classification patterns.
    #[serde(default)]
    pub keywords: KeywordConfig,
    /// Signal extraction knobs.
    #[serde(default)]
    pub signals: SignalConfig,
    /// AI explanation layer settings.
    #[serde(default)]
    pub ai: AiConfig,
}

impl CodemetryConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CodemetryError::Io`] if the file cannot be read, or
    /// [`CodemetryError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::path::Path;
    /// use codemetry_core::CodemetryConfig;
    ///
    /// let config = CodemetryConfig::from_file(Path::new(".codemetry.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, CodemetryError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`CodemetryError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use codemetry_core::CodemetryConfig;
    ///
    /// let toml = r#"
    /// [analysis]
    /// baseline_days = 28
    /// "#;
    /// let config = CodemetryConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.analysis.baseline_days, 28);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, CodemetryError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Compile the keyword patterns and bundle everything the engine consumes.
    ///
    /// # Errors
    ///
    /// Returns [`CodemetryError::Config`] if a keyword pattern is not a valid
    /// regular expression.
    pub fn to_external(&self) -> Result<ExternalConfig, CodemetryError> {
        Ok(ExternalConfig {
            patterns: self.keywords.compile()?,
            normal_hours: NormalHours {
                start: self.signals.normal_hours_start,
                end: self.signals.normal_hours_end,
            },
            ai: self.ai.clone(),
        })
    }
}

/// Window and baseline sizing.
///
/// # Examples
///
/// ```
/// use codemetry_core::AnalysisConfig;
///
/// let config = AnalysisConfig::default();
/// assert_eq!(config.baseline_days, 56);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Days of prior history used for baselines (default: 56).
    #[serde(default = "default_baseline_days")]
    pub baseline_days: u32,
    /// Days scanned past each window for follow-up fixes (default: 3).
    #[serde(default = "default_follow_up_horizon_days")]
    pub follow_up_horizon_days: u32,
}

fn default_baseline_days() -> u32 {
    56
}

fn default_follow_up_horizon_days() -> u32 {
    3
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            baseline_days: default_baseline_days(),
            follow_up_horizon_days: default_follow_up_horizon_days(),
        }
    }
}

/// Regex patterns used to classify commit messages.
///
/// Patterns are configurable data, not hard-coded logic, so teams can match
/// their own commit conventions.
///
/// # Examples
///
/// ```
/// use codemetry_core::KeywordConfig;
///
/// let config = KeywordConfig::default();
/// let patterns = config.compile().unwrap();
/// assert!(patterns.fix.is_match("fix: null deref in parser"));
/// assert!(!patterns.fix.is_match("add fixtures directory"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordConfig {
    /// Pattern marking corrective commits.
    #[serde(default = "default_fix_pattern")]
    pub fix_pattern: String,
    /// Pattern marking reverts.
    #[serde(default = "default_revert_pattern")]
    pub revert_pattern: String,
    /// Pattern marking work-in-progress commits.
    #[serde(default = "default_wip_pattern")]
    pub wip_pattern: String,
}

fn default_fix_pattern() -> String {
    r"(?i)\b(fix|bug|hotfix|patch|typo|oops)\b".into()
}

fn default_revert_pattern() -> String {
    r"(?i)\b(revert)\b".into()
}

fn default_wip_pattern() -> String {
    r"(?i)\b(wip|tmp|debug|hack)\b".into()
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            fix_pattern: default_fix_pattern(),
            revert_pattern: default_revert_pattern(),
            wip_pattern: default_wip_pattern(),
        }
    }
}

impl KeywordConfig {
    /// Compile all patterns into matchers.
    ///
    /// # Errors
    ///
    /// Returns [`CodemetryError::Config`] naming the offending pattern if one
    /// fails to compile.
    pub fn compile(&self) -> Result<KeywordPatterns, CodemetryError> {
        Ok(KeywordPatterns {
            fix: compile_one("fix_pattern", &self.fix_pattern)?,
            revert: compile_one("revert_pattern", &self.revert_pattern)?,
            wip: compile_one("wip_pattern", &self.wip_pattern)?,
        })
    }
}

fn compile_one(name: &str, pattern: &str) -> Result<Regex, CodemetryError> {
    Regex::new(pattern)
        .map_err(|e| CodemetryError::Config(format!("invalid {name} '{pattern}': {e}")))
}

/// Compiled commit-message matchers.
#[derive(Debug, Clone)]
pub struct KeywordPatterns {
    /// Matches corrective commits.
    pub fix: Regex,
    /// Matches reverts.
    pub revert: Regex,
    /// Matches work-in-progress commits.
    pub wip: Regex,
}

/// Signal extraction knobs.
///
/// # Examples
///
/// ```
/// use codemetry_core::SignalConfig;
///
/// let config = SignalConfig::default();
/// assert_eq!(config.normal_hours_start, 8);
/// assert_eq!(config.normal_hours_end, 20);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalConfig {
    /// First hour (UTC, inclusive) of the normal working band (default: 8).
    #[serde(default = "default_normal_hours_start")]
    pub normal_hours_start: u32,
    /// First hour (UTC, exclusive) past the normal working band (default: 20).
    #[serde(default = "default_normal_hours_end")]
    pub normal_hours_end: u32,
}

fn default_normal_hours_start() -> u32 {
    8
}

fn default_normal_hours_end() -> u32 {
    20
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            normal_hours_start: default_normal_hours_start(),
            normal_hours_end: default_normal_hours_end(),
        }
    }
}

/// The "normal hours" band; commits outside it count as late-night.
///
/// # Examples
///
/// ```
/// use codemetry_core::NormalHours;
///
/// let hours = NormalHours { start: 8, end: 20 };
/// assert!(hours.is_late(23));
/// assert!(hours.is_late(3));
/// assert!(!hours.is_late(12));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct NormalHours {
    /// Inclusive start hour.
    pub start: u32,
    /// Exclusive end hour.
    pub end: u32,
}

impl NormalHours {
    /// Whether `hour` falls outside the band.
    pub fn is_late(&self, hour: u32) -> bool {
        hour < self.start || hour >= self.end
    }
}

/// AI explanation layer settings.
///
/// Disabled by default. Engines: openai, anthropic, deepseek, google.
///
/// # Examples
///
/// ```
/// use codemetry_core::AiConfig;
///
/// let config = AiConfig::default();
/// assert!(!config.enabled);
/// assert_eq!(config.engine, "openai");
/// assert_eq!(config.timeout_secs, 30);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Whether AI explanations are requested.
    #[serde(default)]
    pub enabled: bool,
    /// Engine name (default: `"openai"`).
    #[serde(default = "default_ai_engine")]
    pub engine: String,
    /// API credential; missing credential makes the explainer unavailable.
    pub api_key: Option<String>,
    /// Model override; each engine has a documented default.
    pub model: Option<String>,
    /// Custom API endpoint for self-hosted models or proxies.
    pub base_url: Option<String>,
    /// Per-call timeout budget in seconds (default: 30).
    #[serde(default = "default_ai_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_ai_engine() -> String {
    "openai".into()
}

fn default_ai_timeout_secs() -> u64 {
    30
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            engine: default_ai_engine(),
            api_key: None,
            model: None,
            base_url: None,
            timeout_secs: default_ai_timeout_secs(),
        }
    }
}

/// Everything the engine consumes besides the request itself.
///
/// Built once by the adapter via [`CodemetryConfig::to_external`]; the engine
/// never reaches into ambient configuration.
#[derive(Debug, Clone)]
pub struct ExternalConfig {
    /// Compiled commit-message matchers.
    pub patterns: KeywordPatterns,
    /// Normal working-hours band.
    pub normal_hours: NormalHours,
    /// AI explainer settings.
    pub ai: AiConfig,
}

impl Default for ExternalConfig {
    fn default() -> Self {
        // Built-in patterns always compile.
        CodemetryConfig::default()
            .to_external()
            .expect("default keyword patterns compile")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = CodemetryConfig::default();
        assert_eq!(config.analysis.baseline_days, 56);
        assert_eq!(config.analysis.follow_up_horizon_days, 3);
        assert_eq!(config.signals.normal_hours_start, 8);
        assert_eq!(config.signals.normal_hours_end, 20);
        assert!(!config.ai.enabled);
        assert_eq!(config.ai.engine, "openai");
        assert_eq!(config.ai.timeout_secs, 30);
        assert!(config.ai.api_key.is_none());
    }

    #[test]
    fn parse_minimal_toml() {
        let toml = r#"
[analysis]
baseline_days = 28
follow_up_horizon_days = 5
"#;
        let config = CodemetryConfig::from_toml(toml).unwrap();
        assert_eq!(config.analysis.baseline_days, 28);
        assert_eq!(config.analysis.follow_up_horizon_days, 5);
        // Untouched sections keep defaults
        assert_eq!(config.ai.engine, "openai");
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
[analysis]
baseline_days = 14

[keywords]
fix_pattern = '(?i)\b(fix|bugfix)\b'

[signals]
normal_hours_start = 9
normal_hours_end = 18

[ai]
enabled = true
engine = "deepseek"
api_key = "sk-test"
model = "deepseek-chat"
base_url = "https://proxy.internal/v1"
timeout_secs = 10
"#;
        let config = CodemetryConfig::from_toml(toml).unwrap();
        assert_eq!(config.analysis.baseline_days, 14);
        assert_eq!(config.keywords.fix_pattern, r"(?i)\b(fix|bugfix)\b");
        assert_eq!(config.signals.normal_hours_start, 9);
        assert!(config.ai.enabled);
        assert_eq!(config.ai.engine, "deepseek");
        assert_eq!(config.ai.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.ai.timeout_secs, 10);
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = CodemetryConfig::from_toml("").unwrap();
        assert_eq!(config.analysis.baseline_days, 56);
        assert_eq!(config.keywords.fix_pattern, default_fix_pattern());
    }

    #[test]
    fn invalid_toml_returns_error() {
        let result = CodemetryConfig::from_toml("{{invalid}}");
        assert!(result.is_err());
    }

    #[test]
    fn default_patterns_classify_messages() {
        let patterns = KeywordConfig::default().compile().unwrap();
        assert!(patterns.fix.is_match("Fix crash on empty input"));
        assert!(patterns.fix.is_match("hotfix for prod"));
        assert!(patterns.revert.is_match("Revert \"add cache\""));
        assert!(patterns.wip.is_match("WIP: do not merge"));
        assert!(!patterns.fix.is_match("add new feature"));
        assert!(!patterns.wip.is_match("update dependencies"));
    }

    #[test]
    fn invalid_pattern_is_a_config_error() {
        let config = KeywordConfig {
            fix_pattern: "(unclosed".into(),
            ..KeywordConfig::default()
        };
        let err = config.compile().unwrap_err();
        assert!(err.to_string().contains("fix_pattern"));
    }

    #[test]
    fn normal_hours_band_is_half_open() {
        let hours = NormalHours { start: 8, end: 20 };
        assert!(hours.is_late(7));
        assert!(!hours.is_late(8));
        assert!(!hours.is_late(19));
        assert!(hours.is_late(20));
    }

    #[test]
    fn to_external_compiles_patterns() {
        let external = CodemetryConfig::default().to_external().unwrap();
        assert!(external.patterns.fix.is_match("fix typo"));
        assert_eq!(external.normal_hours.start, 8);
        assert!(!external.ai.enabled);
    }
}
