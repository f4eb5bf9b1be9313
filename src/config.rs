use anyhow::Context;
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::palette::{parse_color, Color, Palette};

const DEFAULT_SEEK_STEP_SECS: f64 = 10.0;
const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub palette: Palette,
    pub controls: ControlsConfig,
    /// Problems found while resolving the file; defaults were used instead.
    pub warnings: Vec<String>,
}

impl Config {
    /// Loads the first config file found next to the working directory or
    /// the executable, or the defaults when there is none.
    pub fn load() -> anyhow::Result<Self> {
        for path in candidate_paths() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        Ok(Config::default())
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&data)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    pub fn from_toml_str(data: &str) -> anyhow::Result<Self> {
        let doc: ConfigDocument = toml::from_str(data)?;
        Ok(doc.into())
    }
}

fn candidate_paths() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(current_dir) = env::current_dir() {
        candidates.push(current_dir.join("config.toml"));
        candidates.push(current_dir.join("config").join("config.toml"));
        candidates.push(current_dir.join("config").join("nowplaying-dial.toml"));
    }

    if let Ok(exe) = env::current_exe() {
        if let Some(dir) = exe.parent() {
            candidates.push(dir.join("config.toml"));
            candidates.push(dir.join("config").join("config.toml"));
            candidates.push(dir.join("config").join("nowplaying-dial.toml"));
        }
    }

    candidates
}

#[derive(Debug, Clone, PartialEq)]
pub struct ControlsConfig {
    /// Seconds skipped per dial detent.
    pub seek_step_secs: f64,
    pub poll_interval: Duration,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            seek_step_secs: DEFAULT_SEEK_STEP_SECS,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    display: DisplaySection,
    #[serde(default)]
    controls: ControlsSection,
}

#[derive(Debug, Default, Deserialize)]
struct DisplaySection {
    background: Option<String>,
    text_primary: Option<String>,
    text_secondary: Option<String>,
    accent: Option<String>,
    progress_fill: Option<String>,
    progress_track: Option<String>,
    placeholder_background: Option<String>,
    placeholder_glyph: Option<String>,
    font_family: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ControlsSection {
    seek_step_secs: Option<f64>,
    poll_interval_ms: Option<u64>,
}

impl From<ConfigDocument> for Config {
    fn from(value: ConfigDocument) -> Self {
        let mut warnings = Vec::new();
        let defaults = Palette::default();
        let display = value.display;

        let mut color = |field: &str, raw: Option<String>, fallback: Color| match raw {
            None => fallback,
            Some(raw) => parse_color(&raw).unwrap_or_else(|err| {
                warnings.push(format!("display.{field}: {err}; using default"));
                fallback
            }),
        };

        let background = color("background", display.background, defaults.background);
        let mut palette = Palette {
            background,
            text_primary: color("text_primary", display.text_primary, defaults.text_primary),
            text_secondary: color(
                "text_secondary",
                display.text_secondary,
                defaults.text_secondary,
            ),
            accent: color("accent", display.accent, defaults.accent),
            progress_fill: color("progress_fill", display.progress_fill, defaults.progress_fill),
            progress_track: color(
                "progress_track",
                display.progress_track,
                defaults.progress_track,
            ),
            placeholder_background: color(
                "placeholder_background",
                display.placeholder_background,
                defaults.placeholder_background,
            ),
            placeholder_glyph: color(
                "placeholder_glyph",
                display.placeholder_glyph,
                defaults.placeholder_glyph,
            ),
            font_family: display
                .font_family
                .map(|family| family.trim().to_string())
                .filter(|family| !family.is_empty())
                .unwrap_or(defaults.font_family),
        };

        if palette.background.a != 255 {
            warnings.push("display.background must be opaque; alpha ignored".to_string());
            palette.background = palette.background.opaque();
        }

        let controls = ControlsConfig {
            seek_step_secs: value
                .controls
                .seek_step_secs
                .filter(|secs| secs.is_finite())
                .unwrap_or(DEFAULT_SEEK_STEP_SECS)
                .clamp(1.0, 120.0),
            poll_interval: Duration::from_millis(
                value
                    .controls
                    .poll_interval_ms
                    .unwrap_or(DEFAULT_POLL_INTERVAL_MS)
                    .clamp(100, 10_000),
            ),
        };

        Config {
            palette,
            controls,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_yields_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.palette, Palette::default());
        assert_eq!(config.controls, ControlsConfig::default());
        assert!(config.warnings.is_empty());
    }

    #[test]
    fn display_and_controls_sections_are_resolved() {
        let config = Config::from_toml_str(
            r##"
            [display]
            progress_fill = "#ff5500"
            font_family = "Inter"

            [controls]
            seek_step_secs = 5.0
            poll_interval_ms = 250
            "##,
        )
        .unwrap();
        assert_eq!(config.palette.progress_fill, Color::rgb(0xff, 0x55, 0x00));
        assert_eq!(config.palette.font_family, "Inter");
        assert_eq!(config.controls.seek_step_secs, 5.0);
        assert_eq!(config.controls.poll_interval, Duration::from_millis(250));
    }

    #[test]
    fn invalid_values_fall_back_with_warnings() {
        let config = Config::from_toml_str(
            r##"
            [display]
            accent = "chartreuse-ish"
            background = "#00000080"

            [controls]
            seek_step_secs = 900.0
            "##,
        )
        .unwrap();
        assert_eq!(config.palette.accent, Palette::default().accent);
        assert_eq!(config.palette.background, Color::BLACK);
        assert_eq!(config.controls.seek_step_secs, 120.0);
        assert_eq!(config.warnings.len(), 2);
    }

    #[test]
    fn load_from_reports_the_offending_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[display\nbroken").unwrap();
        let err = Config::load_from(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config"));
    }

    #[test]
    fn load_from_reads_a_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[display]\ntext_primary = \"rgb(1, 2, 3)\"").unwrap();
        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.palette.text_primary, Color::rgb(1, 2, 3));
    }
}
