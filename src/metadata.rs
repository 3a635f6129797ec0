//! Container metadata as reported by `ffprobe -show_streams`.

use serde::Deserializer;
use serde_derive::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::Error;

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ProbeOutput {
    #[serde(default)]
    pub streams: Vec<StreamInfo>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct StreamInfo {
    #[serde(default)]
    pub codec_type: Option<String>,
    #[serde(default)]
    pub tags: HashMap<String, Value>,
    #[serde(default, deserialize_with = "side_data_entries")]
    pub side_data_list: Vec<SideData>,
}

/// One tagged side-data entry, e.g. `{"side_data_type": "Display Matrix", "rotation": -90}`.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct SideData {
    #[serde(default)]
    pub side_data_type: Option<String>,
    #[serde(default)]
    pub rotation: Option<Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SideDataShape {
    List(Vec<SideData>),
    Single(SideData),
}

// Older ffprobe builds emit a bare mapping instead of a list.
fn side_data_entries<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<SideData>, D::Error> {
    Ok(match <SideDataShape as serde::Deserialize>::deserialize(de)? {
        SideDataShape::List(entries) => entries,
        SideDataShape::Single(entry) => vec![entry],
    })
}

const MAX_ROTATION_DEG: i64 = 360;

/// Reads an integral degree value stored either as a JSON number or a
/// string. Values beyond one full turn either way are treated as garbage.
fn degrees(value: &Value) -> Option<i64> {
    let deg = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(round_finite)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(round_finite))
        }
        _ => None,
    }?;

    if (-MAX_ROTATION_DEG..=MAX_ROTATION_DEG).contains(&deg) {
        Some(deg)
    } else {
        None
    }
}

fn round_finite(f: f64) -> Option<i64> {
    if f.is_finite() && f.abs() <= MAX_ROTATION_DEG as f64 {
        Some(f.round() as i64)
    } else {
        None
    }
}

impl StreamInfo {
    #[inline]
    pub fn is_video(&self) -> bool {
        self.codec_type.as_deref() == Some("video")
    }

    pub fn rotate_tag(&self) -> Option<i64> {
        self.tags.get("rotate").and_then(degrees)
    }

    pub fn side_data_rotation(&self) -> Option<i64> {
        self.side_data_list
            .iter()
            .find_map(|entry| entry.rotation.as_ref().and_then(degrees))
    }
}

impl ProbeOutput {
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    #[inline]
    pub fn video_streams(&self) -> impl Iterator<Item = &StreamInfo> {
        self.streams.iter().filter(|s| s.is_video())
    }

    /// `tags.rotate` of the first video stream.
    pub fn rotate_tag(&self) -> Option<i64> {
        self.video_streams().next()?.rotate_tag()
    }

    /// First side-data rotation found on any video stream.
    pub fn side_data_rotation(&self) -> Option<i64> {
        self.video_streams().find_map(StreamInfo::side_data_rotation)
    }
}

pub trait MetadataSource {
    fn probe(&self, path: &Path) -> Result<ProbeOutput, Error>;
}

pub struct Ffprobe {
    program: String,
}

impl Ffprobe {
    pub fn new<S: ToString>(program: S) -> Self {
        Self {
            program: program.to_string(),
        }
    }
}

impl Default for Ffprobe {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl MetadataSource for Ffprobe {
    fn probe(&self, path: &Path) -> Result<ProbeOutput, Error> {
        let output = Command::new(&self.program)
            .args(["-v", "quiet", "-print_format", "json", "-show_streams"])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;

        if !output.status.success() {
            return Err(Error::Probe(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }
}
