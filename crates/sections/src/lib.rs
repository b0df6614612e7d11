//! Section palette table for the aurora background.
//!
//! A page is split into named sections; each picks the palette and speed the
//! background eases toward while it is visible. The table is plain TOML:
//!
//! ```toml
//! version = 1
//!
//! [defaults]
//! section = "hero"
//! speed = 2.0
//! pointer_throttle = "30ms"
//!
//! [[sections]]
//! name = "hero"
//! primary = [1.0, 0.42, 0.22]
//! ```

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Speed used when neither a section nor the defaults set one.
pub const FALLBACK_SPEED: f32 = 2.0;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

pub type Rgb = [f32; 3];

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SectionsConfig {
    pub version: u32,
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Defaults {
    pub section: Option<String>,
    pub speed: Option<f32>,
    pub smoothing: Option<f32>,
    pub dpr_cap: Option<f64>,
    #[serde(
        default,
        deserialize_with = "deserialize_duration_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub frame_interval: Option<Duration>,
    #[serde(
        default,
        deserialize_with = "deserialize_duration_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub pointer_throttle: Option<Duration>,
    /// Auto-advance interval between sections.
    #[serde(
        default,
        deserialize_with = "deserialize_duration_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub cycle: Option<Duration>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Section {
    pub name: String,
    #[serde(default)]
    pub speed: Option<f32>,
    #[serde(default)]
    pub primary: Option<Rgb>,
    #[serde(default)]
    pub secondary: Option<Rgb>,
    #[serde(default)]
    pub base: Option<Rgb>,
}

/// A section with defaults applied. Colour roles stay optional; the renderer
/// fills missing ones from its built-in palette.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedSection {
    pub name: String,
    pub speed: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<Rgb>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary: Option<Rgb>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<Rgb>,
}

fn deserialize_duration_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Option<Duration>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map(Some)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(Duration::from_secs(v)))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs(v as u64)))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if !v.is_finite() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs_f64(v)))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(Visitor)
}

impl SectionsConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: SectionsConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.name == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.sections.iter().position(|section| section.name == name)
    }

    /// Index of `defaults.section`, or the first section.
    pub fn default_index(&self) -> usize {
        self.defaults
            .section
            .as_deref()
            .and_then(|name| self.position(name))
            .unwrap_or(0)
    }

    pub fn resolved(&self) -> Vec<ResolvedSection> {
        self.sections
            .iter()
            .map(|section| section.resolve(&self.defaults))
            .collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        if self.sections.is_empty() {
            return Err(ConfigError::Invalid(
                "config must define at least one section".into(),
            ));
        }

        let mut seen = HashSet::new();
        for section in &self.sections {
            let name = section.name.as_str();
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid("section name may not be empty".into()));
            }
            if name.trim() != name {
                return Err(ConfigError::Invalid(format!(
                    "section name '{name}' has leading or trailing whitespace"
                )));
            }
            if !seen.insert(name) {
                return Err(ConfigError::Invalid(format!(
                    "section '{name}' is defined more than once"
                )));
            }
            if let Some(speed) = section.speed {
                validate_speed(&format!("section '{name}' speed"), speed)?;
            }
            for (role, color) in [
                ("primary", section.primary),
                ("secondary", section.secondary),
                ("base", section.base),
            ] {
                if let Some(color) = color {
                    if color.iter().any(|channel| !channel.is_finite()) {
                        return Err(ConfigError::Invalid(format!(
                            "section '{name}' {role} colour must have finite channels"
                        )));
                    }
                }
            }
        }

        if let Some(speed) = self.defaults.speed {
            validate_speed("defaults.speed", speed)?;
        }

        if let Some(smoothing) = self.defaults.smoothing {
            if !(smoothing > 0.0 && smoothing <= 1.0) {
                return Err(ConfigError::Invalid(format!(
                    "defaults.smoothing must be in (0, 1], got {smoothing}"
                )));
            }
        }

        if let Some(cap) = self.defaults.dpr_cap {
            if !cap.is_finite() || cap < 1.0 {
                return Err(ConfigError::Invalid(format!(
                    "defaults.dpr_cap must be >= 1, got {cap}"
                )));
            }
        }

        if let Some(default_section) = &self.defaults.section {
            if self.section(default_section).is_none() {
                return Err(ConfigError::Invalid(format!(
                    "defaults.section references unknown section '{default_section}'"
                )));
            }
        }

        Ok(())
    }
}

fn validate_speed(label: &str, speed: f32) -> Result<(), ConfigError> {
    if !speed.is_finite() || speed <= 0.0 {
        return Err(ConfigError::Invalid(format!(
            "{label} must be a positive number, got {speed}"
        )));
    }
    Ok(())
}

impl Section {
    pub fn resolve(&self, defaults: &Defaults) -> ResolvedSection {
        ResolvedSection {
            name: self.name.clone(),
            speed: self.speed.or(defaults.speed).unwrap_or(FALLBACK_SPEED),
            primary: self.primary,
            secondary: self.secondary,
            base: self.base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
version = 1

[defaults]
section = "about"
speed = 1.8
smoothing = 0.08
pointer_throttle = "30ms"
cycle = "12s"

[[sections]]
name = "hero"
speed = 2.3
primary = [1.0, 0.42, 0.22]

[[sections]]
name = "about"
secondary = [0.7, 0.4, 1.0]
base = [0.02, 0.03, 0.05]
"#;

    #[test]
    fn parses_sample_config() {
        let config = SectionsConfig::from_toml_str(SAMPLE).expect("parse config");
        assert_eq!(config.sections.len(), 2);
        assert_eq!(config.default_index(), 1);
        assert_eq!(
            config.defaults.pointer_throttle,
            Some(Duration::from_millis(30))
        );
        assert_eq!(config.defaults.cycle, Some(Duration::from_secs(12)));
        assert_eq!(config.defaults.frame_interval, None);
    }

    #[test]
    fn resolution_applies_default_speed() {
        let config = SectionsConfig::from_toml_str(SAMPLE).unwrap();
        let resolved = config.resolved();
        assert_eq!(resolved[0].speed, 2.3);
        assert_eq!(resolved[1].speed, 1.8);
        assert_eq!(resolved[1].primary, None);
        assert_eq!(resolved[1].secondary, Some([0.7, 0.4, 1.0]));
    }

    #[test]
    fn speed_falls_back_without_defaults() {
        let config = SectionsConfig::from_toml_str(
            r#"
version = 1

[[sections]]
name = "only"
"#,
        )
        .unwrap();
        assert_eq!(config.resolved()[0].speed, FALLBACK_SPEED);
        assert_eq!(config.default_index(), 0);
    }

    #[test]
    fn rejects_duplicate_names() {
        let config = r#"
version = 1

[[sections]]
name = "hero"

[[sections]]
name = "hero"
"#;
        let err = SectionsConfig::from_toml_str(config).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn rejects_padded_names() {
        let config = r#"
version = 1

[defaults]
section = "hero"

[[sections]]
name = "hero "
"#;
        let err = SectionsConfig::from_toml_str(config).unwrap_err();
        assert!(err.to_string().contains("whitespace"), "{err}");
    }

    #[test]
    fn rejects_unknown_default_section() {
        let config = r#"
version = 1

[defaults]
section = "missing"

[[sections]]
name = "hero"
"#;
        let err = SectionsConfig::from_toml_str(config).unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn rejects_bad_tuning_values() {
        for body in [
            "[defaults]\nsmoothing = 0.0",
            "[defaults]\nsmoothing = 1.5",
            "[defaults]\ndpr_cap = 0.5",
            "[defaults]\nspeed = -1.0",
        ] {
            let config = format!("version = 1\n{body}\n\n[[sections]]\nname = \"hero\"\n");
            assert!(
                SectionsConfig::from_toml_str(&config).is_err(),
                "accepted: {body}"
            );
        }
    }

    #[test]
    fn rejects_empty_and_wrong_version() {
        assert!(SectionsConfig::from_toml_str("version = 1\n").is_err());
        let err = SectionsConfig::from_toml_str("version = 2\n[[sections]]\nname = \"a\"\n")
            .unwrap_err();
        assert!(err.to_string().contains("version"));
    }

    #[test]
    fn rejects_negative_duration() {
        let config = r#"
version = 1

[defaults]
cycle = -5

[[sections]]
name = "hero"
"#;
        assert!(matches!(
            SectionsConfig::from_toml_str(config),
            Err(ConfigError::Parse(_))
        ));
    }
}
