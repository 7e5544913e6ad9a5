use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::GridError;

pub const VERBOSE_ENV: &str = "FFMPEG_VERBOSE";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum LabelPosition {
    Top,
    #[default]
    Bottom,
}

impl LabelPosition {
    pub const VARIANTS: [&'static str; 2] = ["bottom", "top"];

    // drawtext y expression for the label baseline
    pub fn y_expr(&self) -> &'static str {
        match self {
            LabelPosition::Top => "40",
            LabelPosition::Bottom => "h-40",
        }
    }
}

impl FromStr for LabelPosition {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top" => Ok(LabelPosition::Top),
            "bottom" => Ok(LabelPosition::Bottom),
            other => Err(GridError::InvalidOption(format!(
                "label position must be top or bottom, got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for LabelPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelPosition::Top => f.write_str("top"),
            LabelPosition::Bottom => f.write_str("bottom"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelStyle {
    pub show: bool,
    pub size: u32,
    pub color: String,
    pub position: LabelPosition,
    pub format: String,
    pub boxed: bool,
    pub box_color: String,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            show: true,
            size: 24,
            color: String::from("white"),
            position: LabelPosition::Bottom,
            format: String::from("%s"),
            boxed: true,
            box_color: String::from("black@0.5"),
        }
    }
}

impl LabelStyle {
    // Apply the printf-like label format: every `%s` becomes the label, `%%` a
    // literal percent sign
    pub fn format_label(&self, label: &str) -> String {
        let mut out = String::with_capacity(self.format.len() + label.len());
        let mut chars = self.format.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '%' {
                out.push(c);
                continue;
            }
            match chars.peek() {
                Some('s') => {
                    chars.next();
                    out.push_str(label);
                }
                Some('%') => {
                    chars.next();
                    out.push('%');
                }
                _ => out.push('%'),
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TitleStyle {
    pub show: bool,
    // height of the black band above the picture
    pub padding: u32,
    // explicit text; otherwise the detected common name is used
    pub text: Option<String>,
}

impl Default for TitleStyle {
    fn default() -> Self {
        Self {
            show: true,
            padding: 80,
            text: None,
        }
    }
}

impl TitleStyle {
    // The title actually drawn, if any
    pub fn resolve(&self, common_name: Option<&str>) -> Option<String> {
        if !self.show {
            return None;
        }
        self.text
            .clone()
            .or_else(|| common_name.map(String::from))
            .filter(|t| !t.is_empty())
    }
}

// How a clip that ends early is held on its last good frame
#[derive(Debug, Clone, PartialEq)]
pub struct FreezePolicy {
    // freeze on the Nth-to-last frame
    pub offset: u32,
    // seconds a clip may be shorter than the longest before it counts as frozen
    pub threshold: f64,
    // appended to the label of frozen clips
    pub glyph: String,
}

impl Default for FreezePolicy {
    fn default() -> Self {
        Self {
            offset: 3,
            threshold: 0.01,
            glyph: String::from("✓"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Verbosity {
    pub verbose: bool,
}

impl Verbosity {
    pub fn from_env() -> Self {
        Self::from_value(std::env::var(VERBOSE_ENV).ok().as_deref())
    }

    // only a case-insensitive "true" turns verbosity on
    pub fn from_value(value: Option<&str>) -> Self {
        let verbose = value
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        Self { verbose }
    }

    pub fn loglevel(&self) -> &'static str {
        if self.verbose {
            "info"
        } else {
            "error"
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tools {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

// Everything the grid composer needs for one run
#[derive(Debug, Clone, PartialEq)]
pub struct GridOptions {
    pub title: TitleStyle,
    pub label: LabelStyle,
    pub max_width: u32,
    pub padding_percent: f64,
    pub freeze: FreezePolicy,
    pub output: Option<PathBuf>,
    pub verbosity: Verbosity,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            title: TitleStyle::default(),
            label: LabelStyle::default(),
            max_width: 640,
            padding_percent: 2.0,
            freeze: FreezePolicy::default(),
            output: None,
            verbosity: Verbosity::default(),
        }
    }
}

impl GridOptions {
    pub fn validate(self) -> Result<Self, GridError> {
        if self.max_width == 0 {
            return Err(GridError::InvalidOption(String::from(
                "width must be greater than 0",
            )));
        }
        if !self.padding_percent.is_finite() || self.padding_percent < 0.0 {
            return Err(GridError::InvalidOption(format!(
                "padding must be a non-negative percentage, got {}",
                self.padding_percent
            )));
        }
        if self.freeze.offset == 0 {
            return Err(GridError::InvalidOption(String::from(
                "freeze offset must be at least 1",
            )));
        }
        if !self.freeze.threshold.is_finite() || self.freeze.threshold < 0.0 {
            return Err(GridError::InvalidOption(String::from(
                "freeze threshold must be a non-negative number of seconds",
            )));
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputSelection {
    // glob inside a directory
    Discover { directory: PathBuf, pattern: String },
    // explicit ordered list, optionally with one caption per video
    Explicit {
        videos: Vec<PathBuf>,
        captions: Option<Vec<String>>,
    },
}

// Everything the frame gif assembler needs for one run
#[derive(Debug, Clone, PartialEq)]
pub struct GifOptions {
    pub input: InputSelection,
    pub frame_number: u32,
    // seconds each frame stays on screen
    pub frame_duration: f64,
    pub title: TitleStyle,
    pub label: LabelStyle,
    pub max_width: u32,
    pub output: Option<PathBuf>,
    pub verbosity: Verbosity,
}

impl Default for GifOptions {
    fn default() -> Self {
        Self {
            input: InputSelection::Discover {
                directory: PathBuf::from("."),
                pattern: String::from(crate::DEFAULT_PATTERN),
            },
            frame_number: 0,
            frame_duration: 0.2,
            title: TitleStyle::default(),
            label: LabelStyle::default(),
            max_width: 640,
            output: None,
            verbosity: Verbosity::default(),
        }
    }
}

impl GifOptions {
    pub fn validate(self) -> Result<Self, GridError> {
        if self.max_width == 0 {
            return Err(GridError::InvalidOption(String::from(
                "width must be greater than 0",
            )));
        }
        if !self.frame_duration.is_finite() || self.frame_duration <= 0.0 {
            return Err(GridError::InvalidOption(format!(
                "frame duration must be positive, got {}",
                self.frame_duration
            )));
        }
        Ok(self)
    }
}
