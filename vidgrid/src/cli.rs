// Command-line surfaces of the three programs, and their conversion into the
// immutable option records the library works with.

use std::convert::TryFrom;
use std::path::PathBuf;

use structopt::StructOpt;

use crate::opts::{
    FreezePolicy, GifOptions, GridOptions, InputSelection, LabelPosition, LabelStyle, TitleStyle,
    Tools, Verbosity,
};
use crate::GridError;

#[derive(Debug, StructOpt, Clone)]
pub struct LabelArgs {
    // Hide the per-video labels
    #[structopt(long = "no-labels")]
    no_labels: bool,

    // Label font size
    #[structopt(long = "label-size", default_value = "24")]
    label_size: u32,

    // Label font color (any ffmpeg color)
    #[structopt(long = "label-color", default_value = "white")]
    label_color: String,

    // Where labels sit inside each cell
    #[structopt(long = "label-position", default_value = "bottom", possible_values = &LabelPosition::VARIANTS)]
    label_position: LabelPosition,

    // Printf-like label format; %s is replaced by the label
    #[structopt(long = "label-format", default_value = "%s")]
    label_format: String,

    // Draw labels without a background box
    #[structopt(long = "no-label-box")]
    no_label_box: bool,

    // Background box color for labels
    #[structopt(long = "label-box-color", default_value = "black@0.5")]
    label_box_color: String,
}

impl From<LabelArgs> for LabelStyle {
    fn from(args: LabelArgs) -> Self {
        LabelStyle {
            show: !args.no_labels,
            size: args.label_size,
            color: args.label_color,
            position: args.label_position,
            format: args.label_format,
            boxed: !args.no_label_box,
            box_color: args.label_box_color,
        }
    }
}

#[derive(Debug, StructOpt, Clone)]
pub struct ToolArgs {
    // ffmpeg executable
    #[structopt(long, env = "FFMPEG_BIN", default_value = "ffmpeg", parse(from_os_str))]
    ffmpeg: PathBuf,

    // ffprobe executable
    #[structopt(long, env = "FFPROBE_BIN", default_value = "ffprobe", parse(from_os_str))]
    ffprobe: PathBuf,
}

impl From<ToolArgs> for Tools {
    fn from(args: ToolArgs) -> Self {
        Tools {
            ffmpeg: args.ffmpeg,
            ffprobe: args.ffprobe,
        }
    }
}

#[derive(Debug, StructOpt, Clone)]
#[structopt(
    name = "make-video-grid",
    about = "Stack every MP4 in the current directory into one labelled grid video"
)]
pub struct GridOpt {
    // Do not draw the title band
    #[structopt(long = "no-title")]
    no_title: bool,

    // Height of the title band in pixels
    #[structopt(long = "title-padding", default_value = "80")]
    title_padding: u32,

    // Width of each grid cell
    #[structopt(long, default_value = "640")]
    width: u32,

    // Vertical padding around each cell, as a percentage of its height
    #[structopt(long, default_value = "2.0")]
    padding: f64,

    // Freeze on the Nth-to-last frame of shorter clips
    #[structopt(long = "freeze-offset", default_value = "3")]
    freeze_offset: u32,

    // Seconds a clip may fall short of the longest before it is marked frozen
    #[structopt(long = "freeze-threshold", default_value = "0.01")]
    freeze_threshold: f64,

    // Appended to the label of frozen clips
    #[structopt(long = "freeze-glyph", default_value = "✓")]
    freeze_glyph: String,

    #[structopt(flatten)]
    label: LabelArgs,

    #[structopt(flatten)]
    tools: ToolArgs,

    // Output file; defaults to <common name>_GRID.mp4
    #[structopt(short = "o", long, parse(from_os_str))]
    output: Option<PathBuf>,
}

impl GridOpt {
    pub fn into_parts(self, verbosity: Verbosity) -> Result<(GridOptions, Tools), GridError> {
        let tools = Tools::from(self.tools);
        let opts = GridOptions {
            title: TitleStyle {
                show: !self.no_title,
                padding: self.title_padding,
                text: None,
            },
            label: self.label.into(),
            max_width: self.width,
            padding_percent: self.padding,
            freeze: FreezePolicy {
                offset: self.freeze_offset,
                threshold: self.freeze_threshold,
                glyph: self.freeze_glyph,
            },
            output: self.output,
            verbosity,
        };
        Ok((opts.validate()?, tools))
    }
}

#[derive(Debug, StructOpt, Clone)]
#[structopt(
    name = "make-gif-of-frames",
    about = "Create an animated GIF from the same frame of several videos"
)]
pub struct GifOpt {
    // Frame number to extract from each video (0-based)
    #[structopt(short = "f", long = "frame", default_value = "0")]
    frame: u32,

    // Seconds each frame is shown
    #[structopt(short = "d", long, default_value = "0.2")]
    duration: f64,

    // Directory to search for videos
    #[structopt(short = "D", long, default_value = ".", parse(from_os_str))]
    directory: PathBuf,

    // Glob pattern for video files
    #[structopt(short = "p", long, default_value = "*.mp4")]
    pattern: String,

    // Explicit list of videos, in order; overrides directory search
    #[structopt(long, parse(from_os_str))]
    videos: Option<Vec<PathBuf>>,

    // One caption per video given with --videos
    #[structopt(long)]
    captions: Option<Vec<String>>,

    // Title drawn above every frame; defaults to the common name
    #[structopt(long)]
    title: Option<String>,

    // Do not draw a title
    #[structopt(long = "no-title")]
    no_title: bool,

    // Height of the title band in pixels
    #[structopt(long = "title-padding", default_value = "80")]
    title_padding: u32,

    #[structopt(flatten)]
    label: LabelArgs,

    // Output file; defaults to <title>_frame<N>.gif
    #[structopt(short = "o", long, parse(from_os_str))]
    output: Option<PathBuf>,

    // Maximum frame width; never upscaled
    #[structopt(long, default_value = "640")]
    width: u32,

    #[structopt(flatten)]
    tools: ToolArgs,
}

impl GifOpt {
    pub fn into_parts(self, verbosity: Verbosity) -> Result<(GifOptions, Tools), GridError> {
        let tools = Tools::from(self.tools.clone());
        let opts = GifOptions {
            verbosity,
            ..GifOptions::try_from(self)?
        };
        Ok((opts, tools))
    }
}

impl TryFrom<GifOpt> for GifOptions {
    type Error = GridError;

    fn try_from(opt: GifOpt) -> Result<Self, Self::Error> {
        let input = match opt.videos {
            Some(videos) => InputSelection::Explicit {
                videos,
                captions: opt.captions,
            },
            None if opt.captions.is_some() => {
                return Err(GridError::InvalidOption(String::from(
                    "--captions requires --videos",
                )))
            }
            None => InputSelection::Discover {
                directory: opt.directory,
                pattern: opt.pattern,
            },
        };
        GifOptions {
            input,
            frame_number: opt.frame,
            frame_duration: opt.duration,
            title: TitleStyle {
                show: !opt.no_title,
                padding: opt.title_padding,
                text: opt.title,
            },
            label: opt.label.into(),
            max_width: opt.width,
            output: opt.output,
            verbosity: Verbosity::default(),
        }
        .validate()
    }
}

#[derive(Debug, StructOpt, Clone)]
#[structopt(
    name = "make-video-grid-recursive",
    about = "Run make-video-grid in every subdirectory that holds MP4 files; \
             any other argument is passed through"
)]
pub struct RecursiveOpt {
    // Directory to start searching from
    #[structopt(long = "start-dir", default_value = ".", parse(from_os_str))]
    pub start_dir: PathBuf,
}

#[cfg(test)]
mod test {
    use super::*;

    fn grid(args: &[&str]) -> GridOpt {
        GridOpt::from_iter_safe(std::iter::once("make-video-grid").chain(args.iter().copied()))
            .unwrap()
    }

    fn gif(args: &[&str]) -> Result<GifOptions, GridError> {
        let opt =
            GifOpt::from_iter_safe(std::iter::once("make-gif-of-frames").chain(args.iter().copied()))
                .unwrap();
        GifOptions::try_from(opt)
    }

    #[test]
    fn grid_defaults_match_library_defaults() {
        let (opts, _) = grid(&[]).into_parts(Verbosity::default()).unwrap();
        assert_eq!(opts, GridOptions::default());
    }

    #[test]
    fn grid_flags_are_applied() {
        let (opts, tools) = grid(&[
            "--no-title",
            "--width",
            "800",
            "--padding",
            "3",
            "--freeze-offset",
            "5",
            "--freeze-glyph",
            "*",
            "--label-position",
            "top",
            "--label-format",
            "Camera %s",
            "--no-label-box",
            "--ffmpeg",
            "/opt/ff/ffmpeg",
            "-o",
            "all.mp4",
        ])
        .into_parts(Verbosity { verbose: true })
        .unwrap();
        assert!(!opts.title.show);
        assert_eq!(opts.max_width, 800);
        assert_eq!(opts.padding_percent, 3.0);
        assert_eq!(opts.freeze.offset, 5);
        assert_eq!(opts.freeze.glyph, "*");
        assert_eq!(opts.label.position, LabelPosition::Top);
        assert_eq!(opts.label.format_label("2"), "Camera 2");
        assert!(!opts.label.boxed);
        assert_eq!(opts.output, Some(PathBuf::from("all.mp4")));
        assert!(opts.verbosity.verbose);
        assert_eq!(tools.ffmpeg, PathBuf::from("/opt/ff/ffmpeg"));
    }

    #[test]
    fn grid_rejects_bad_values() {
        assert!(GridOpt::from_iter_safe(["make-video-grid", "--label-position", "left"]).is_err());
        assert!(matches!(
            grid(&["--width", "0"]).into_parts(Verbosity::default()),
            Err(GridError::InvalidOption(_))
        ));
    }

    #[test]
    fn gif_discovery_by_default() {
        let opts = gif(&["-f", "12", "-d", "0.5", "-D", "runs", "-p", "*.mov"]).unwrap();
        assert_eq!(
            opts.input,
            InputSelection::Discover {
                directory: PathBuf::from("runs"),
                pattern: String::from("*.mov")
            }
        );
        assert_eq!(opts.frame_number, 12);
        assert_eq!(opts.frame_duration, 0.5);
    }

    #[test]
    fn gif_explicit_videos_and_captions() {
        let opts = gif(&[
            "--videos", "a.mp4", "b.mp4", "--captions", "first", "second", "--title", "Demo",
        ])
        .unwrap();
        assert_eq!(
            opts.input,
            InputSelection::Explicit {
                videos: vec![PathBuf::from("a.mp4"), PathBuf::from("b.mp4")],
                captions: Some(vec![String::from("first"), String::from("second")]),
            }
        );
        assert_eq!(opts.title.text.as_deref(), Some("Demo"));
    }

    #[test]
    fn gif_captions_without_videos() {
        assert!(matches!(
            gif(&["--captions", "x"]),
            Err(GridError::InvalidOption(_))
        ));
        assert!(matches!(
            gif(&["-d", "0"]),
            Err(GridError::InvalidOption(_))
        ));
    }

    #[test]
    fn recursive_start_dir() {
        let opt = RecursiveOpt::from_iter_safe(["make-video-grid-recursive", "--start-dir=exp"])
            .unwrap();
        assert_eq!(opt.start_dir, PathBuf::from("exp"));
        let opt = RecursiveOpt::from_iter_safe(["make-video-grid-recursive"]).unwrap();
        assert_eq!(opt.start_dir, PathBuf::from("."));
    }
}
