use anyhow::{Context, Result};
use sections::SectionsConfig;

/// Section table used when no `sections.toml` is found. Palettes mirror the
/// portfolio page the background was built for.
pub const BUNDLED_SECTIONS: &str = r#"
version = 1

[defaults]
section = "hero"
speed = 2.0
pointer_throttle = "30ms"

[[sections]]
name = "hero"
speed = 2.3
primary = [1.0, 0.42, 0.22]
secondary = [0.28, 0.45, 1.0]
base = [0.02, 0.02, 0.05]

[[sections]]
name = "about"
speed = 1.8
primary = [0.0, 0.8, 0.8]
secondary = [0.7, 0.4, 1.0]
base = [0.01, 0.03, 0.05]

[[sections]]
name = "projects"
primary = [0.2, 1.0, 0.5]
secondary = [0.0, 0.8, 0.8]
base = [0.01, 0.04, 0.03]

[[sections]]
name = "skills"
speed = 1.6
primary = [0.7, 0.4, 1.0]
secondary = [1.0, 0.42, 0.22]
base = [0.04, 0.02, 0.06]

[[sections]]
name = "contact"
speed = 1.4
primary = [1.0, 0.55, 0.3]
secondary = [0.2, 1.0, 0.5]
"#;

pub fn bundled() -> Result<SectionsConfig> {
    SectionsConfig::from_toml_str(BUNDLED_SECTIONS).context("bundled section table is invalid")
}
