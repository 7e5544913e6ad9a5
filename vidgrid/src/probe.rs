use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;

use crate::GridError;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct VideoMetadata {
    // seconds
    pub duration: f64,
    // frames per second
    pub fps: f64,
    pub width: u32,
    pub height: u32,
}

impl VideoMetadata {
    pub fn frame_interval(&self) -> f64 {
        1.0 / self.fps
    }
}

// Anything that can tell us duration / rate / size of a video
pub trait MetadataProvider {
    fn probe(&self, path: &Path) -> Result<VideoMetadata, GridError>;
}

// Raw ffprobe `-of json` output; only the fields we ask for
#[derive(Debug, Deserialize)]
struct ProbeJson {
    #[serde(default)]
    streams: Vec<StreamJson>,
    format: Option<FormatJson>,
}

#[derive(Debug, Deserialize)]
struct StreamJson {
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FormatJson {
    duration: Option<String>,
}

impl TryFrom<ProbeJson> for VideoMetadata {
    type Error = String;

    fn try_from(json: ProbeJson) -> Result<Self, String> {
        let stream = json
            .streams
            .into_iter()
            .next()
            .ok_or_else(|| String::from("no video stream"))?;
        let duration = json
            .format
            .and_then(|f| f.duration)
            .ok_or_else(|| String::from("missing duration"))?;
        let duration: f64 = duration
            .trim()
            .parse()
            .map_err(|_| format!("unparseable duration '{duration}'"))?;
        if !duration.is_finite() || duration < 0.0 {
            return Err(format!("invalid duration {duration}"));
        }
        let rate = stream
            .r_frame_rate
            .ok_or_else(|| String::from("missing frame rate"))?;
        let fps = parse_frame_rate(&rate).ok_or_else(|| format!("unparseable frame rate '{rate}'"))?;
        let width = stream
            .width
            .filter(|w| *w > 0)
            .ok_or_else(|| String::from("missing width"))?;
        let height = stream
            .height
            .filter(|h| *h > 0)
            .ok_or_else(|| String::from("missing height"))?;
        Ok(VideoMetadata {
            duration,
            fps,
            width,
            height,
        })
    }
}

// Accepts `30000/1001` or `29.97`; rejects zero / negative / non-finite rates
pub fn parse_frame_rate(s: &str) -> Option<f64> {
    let s = s.trim();
    let fps = match s.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => s.parse().ok()?,
    };
    if fps.is_finite() && fps > 0.0 {
        Some(fps)
    } else {
        None
    }
}

pub fn parse_probe_output(path: &Path, stdout: &[u8]) -> Result<VideoMetadata, GridError> {
    let unavailable = |reason: String| GridError::MetadataUnavailable {
        path: path.to_path_buf(),
        reason,
    };
    let json: ProbeJson = serde_json::from_slice(stdout).map_err(|e| unavailable(e.to_string()))?;
    VideoMetadata::try_from(json).map_err(unavailable)
}

// Real provider: shells out to ffprobe once per file
#[derive(Debug, Clone)]
pub struct FfprobeProvider {
    pub binary: PathBuf,
}

impl FfprobeProvider {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl MetadataProvider for FfprobeProvider {
    fn probe(&self, path: &Path) -> Result<VideoMetadata, GridError> {
        let unavailable = |reason: String| GridError::MetadataUnavailable {
            path: path.to_path_buf(),
            reason,
        };
        if !path.exists() {
            return Err(unavailable(String::from("file not found")));
        }
        tracing::debug!("Probing {}", path.display());

        let output = Command::new(&self.binary)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "format=duration:stream=width,height,r_frame_rate",
                "-of",
                "json",
            ])
            .arg(path)
            .output()
            .map_err(|e| unavailable(format!("failed to run {}: {e}", self.binary.display())))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(unavailable(format!(
                "{} exited with {:?}: {}",
                self.binary.display(),
                output.status.code(),
                stderr.trim()
            )));
        }
        parse_probe_output(path, &output.stdout)
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::*;

    // Canned metadata keyed by file name; records every probed path
    #[derive(Default)]
    pub(crate) struct FakeProvider {
        pub(crate) by_name: HashMap<String, VideoMetadata>,
        pub(crate) fallback: Option<VideoMetadata>,
        pub(crate) probed: RefCell<Vec<PathBuf>>,
    }

    impl FakeProvider {
        pub(crate) fn uniform(md: VideoMetadata) -> Self {
            Self {
                fallback: Some(md),
                ..Default::default()
            }
        }

        pub(crate) fn with(mut self, name: &str, md: VideoMetadata) -> Self {
            self.by_name.insert(name.to_string(), md);
            self
        }
    }

    impl MetadataProvider for FakeProvider {
        fn probe(&self, path: &Path) -> Result<VideoMetadata, GridError> {
            self.probed.borrow_mut().push(path.to_path_buf());
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            self.by_name
                .get(&name)
                .copied()
                .or(self.fallback)
                .ok_or_else(|| GridError::MetadataUnavailable {
                    path: path.to_path_buf(),
                    reason: String::from("no canned metadata"),
                })
        }
    }
}
