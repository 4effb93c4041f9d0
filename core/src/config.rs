use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// File name looked up at a project root.
pub const CONFIG_FILE: &str = "gml.toml";

/// Settings for one analysis session.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Native library JSON files. Empty means the bundled library.
    pub native_libraries: Vec<PathBuf>,
    pub diagnostics: DiagnosticsConfig,
    /// Source file extensions, without the dot.
    pub include: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticsConfig {
    pub undeclared: bool,
    pub unused: bool,
    pub missing_event_inherited: bool,
    pub jsdoc: bool,
    pub max_per_file: usize,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            undeclared: true,
            unused: true,
            missing_event_inherited: true,
            jsdoc: true,
            max_per_file: 500,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            native_libraries: Vec::new(),
            diagnostics: DiagnosticsConfig::default(),
            include: vec!["gml".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigSection {
    #[serde(default)]
    native_libraries: Option<Vec<PathBuf>>,
    #[serde(default)]
    diagnostics: DiagnosticsSection,
    #[serde(default)]
    include: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct DiagnosticsSection {
    #[serde(default)]
    undeclared: Option<bool>,
    #[serde(default)]
    unused: Option<bool>,
    #[serde(default)]
    missing_event_inherited: Option<bool>,
    #[serde(default)]
    jsdoc: Option<bool>,
    #[serde(default)]
    max_per_file: Option<usize>,
}

impl AnalysisConfig {
    /// Parse TOML text. Relative native library paths resolve against `base`.
    pub fn from_toml_str(text: &str, base: Option<&Path>) -> Result<Self> {
        let section: ConfigSection = toml::from_str(text).context("invalid analysis config")?;
        let defaults = DiagnosticsConfig::default();
        let diagnostics = DiagnosticsConfig {
            undeclared: section.diagnostics.undeclared.unwrap_or(defaults.undeclared),
            unused: section.diagnostics.unused.unwrap_or(defaults.unused),
            missing_event_inherited: section
                .diagnostics
                .missing_event_inherited
                .unwrap_or(defaults.missing_event_inherited),
            jsdoc: section.diagnostics.jsdoc.unwrap_or(defaults.jsdoc),
            max_per_file: section
                .diagnostics
                .max_per_file
                .filter(|v| *v > 0)
                .unwrap_or(defaults.max_per_file),
        };
        let native_libraries = section
            .native_libraries
            .unwrap_or_default()
            .into_iter()
            .map(|p| match base {
                Some(base) if p.is_relative() => base.join(p),
                _ => p,
            })
            .collect();
        let include = section
            .include
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| AnalysisConfig::default().include);
        Ok(Self {
            native_libraries,
            diagnostics,
            include,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&text, path.parent())
    }

    /// `gml.toml` under `root` if present, defaults otherwise.
    pub fn discover(root: &Path) -> Result<Self> {
        let candidate = root.join(CONFIG_FILE);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    pub fn includes(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.include.iter().any(|i| i.eq_ignore_ascii_case(ext)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_empty() {
        let cfg = AnalysisConfig::from_toml_str("", None).unwrap();
        assert_eq!(cfg, AnalysisConfig::default());
    }

    #[test]
    fn test_camel_case_sections() {
        let text = r#"
            nativeLibraries = ["lib/extra.json"]
            include = ["gml", "GMLX"]

            [diagnostics]
            unused = false
            missingEventInherited = false
            maxPerFile = 10
        "#;
        let cfg = AnalysisConfig::from_toml_str(text, Some(Path::new("/proj"))).unwrap();
        assert_eq!(cfg.native_libraries, vec![PathBuf::from("/proj/lib/extra.json")]);
        assert!(!cfg.diagnostics.unused);
        assert!(!cfg.diagnostics.missing_event_inherited);
        assert!(cfg.diagnostics.undeclared);
        assert_eq!(cfg.diagnostics.max_per_file, 10);
        assert!(cfg.includes(Path::new("a/b.gmlx")));
        assert!(!cfg.includes(Path::new("a/b.txt")));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let err = AnalysisConfig::from_toml_str("include = 3", None).unwrap_err();
        assert!(err.to_string().contains("invalid analysis config"));
    }
}
