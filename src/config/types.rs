use nalmux_mp4::Mp4MuxConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub mux: MuxConfig,

    #[serde(default)]
    pub mp4: Mp4Config,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MuxConfig {
    /// Frames per second used to pace every unit
    #[serde(default = "default_fps")]
    pub fps: i64,

    /// Track width; probed from the SPS when unset
    #[serde(default)]
    pub width: Option<u32>,

    /// Track height; probed from the SPS when unset
    #[serde(default)]
    pub height: Option<u32>,

    /// Replace existing output files
    #[serde(default)]
    pub overwrite: bool,
}

fn default_fps() -> i64 {
    4
}

impl Default for MuxConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            width: None,
            height: None,
            overwrite: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Mp4Config {
    #[serde(default = "default_major_brand")]
    pub major_brand: String,

    #[serde(default = "default_minor_version")]
    pub minor_version: u32,

    #[serde(default = "default_compatible_brands")]
    pub compatible_brands: Vec<String>,

    /// ISO 639-2 code written to the video track
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_major_brand() -> String {
    Mp4MuxConfig::default().major_brand
}

fn default_minor_version() -> u32 {
    Mp4MuxConfig::default().minor_version
}

fn default_compatible_brands() -> Vec<String> {
    Mp4MuxConfig::default().compatible_brands
}

fn default_language() -> String {
    Mp4MuxConfig::default().language
}

impl Default for Mp4Config {
    fn default() -> Self {
        Self {
            major_brand: default_major_brand(),
            minor_version: default_minor_version(),
            compatible_brands: default_compatible_brands(),
            language: default_language(),
        }
    }
}

impl From<&Mp4Config> for Mp4MuxConfig {
    fn from(config: &Mp4Config) -> Self {
        Self {
            major_brand: config.major_brand.clone(),
            minor_version: config.minor_version,
            compatible_brands: config.compatible_brands.clone(),
            language: config.language.clone(),
            ..Default::default()
        }
    }
}
