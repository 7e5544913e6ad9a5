// Frame gif assembler.
// Pulls one frame out of every video, optionally stamps a label and a title
// band on it, then strings the stills together into an animated gif using a
// generated palette.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::discover::{find_videos, from_explicit, VideoRef};
use crate::filter::{label_filter, title_text, Extent, Filter, FilterChain};
use crate::opts::{GifOptions, InputSelection};
use crate::probe::MetadataProvider;
use crate::render::{FfmpegArgs, MediaRenderer};
use crate::GridError;

const MANIFEST_NAME: &str = "frames.txt";
const PALETTE_NAME: &str = "palette.png";

// Resolved inputs for one run
#[derive(Debug, Clone)]
pub struct GifInputs {
    pub videos: Vec<VideoRef>,
    pub title: Option<String>,
}

// Path quoting understood by the concat demuxer
fn quote_concat_path(path: &Path) -> String {
    format!("'{}'", path.to_string_lossy().replace('\'', r"'\''"))
}

// Write a concat manifest showing each frame for `duration` seconds.
// The demuxer ignores the duration of the final entry, so the last frame is
// listed once more.
pub fn write_manifest<W: Write>(
    mut writer: W,
    frames: &[PathBuf],
    duration: f64,
) -> Result<(), GridError> {
    for frame in frames.iter() {
        writeln!(writer, "file {}", quote_concat_path(frame))?;
        writeln!(writer, "duration {duration}")?;
    }
    if let Some(last) = frames.last() {
        writeln!(writer, "file {}", quote_concat_path(last))?;
    }
    writer.flush()?;
    Ok(())
}

pub struct GifAssembler<'a, P, R> {
    opts: &'a GifOptions,
    probe: &'a P,
    renderer: &'a R,
}

impl<'a, P, R> GifAssembler<'a, P, R>
where
    P: MetadataProvider,
    R: MediaRenderer,
{
    pub fn new(opts: &'a GifOptions, probe: &'a P, renderer: &'a R) -> Self {
        Self {
            opts,
            probe,
            renderer,
        }
    }

    pub fn resolve_inputs(&self) -> Result<GifInputs, GridError> {
        match self.opts.input {
            InputSelection::Explicit {
                ref videos,
                ref captions,
            } => {
                let videos = from_explicit(videos, captions.as_deref())?;
                tracing::info!("Using {} user-provided videos", videos.len());
                Ok(GifInputs {
                    videos,
                    title: self.opts.title.resolve(None),
                })
            }
            InputSelection::Discover {
                ref directory,
                ref pattern,
            } => {
                let found = find_videos(directory, pattern)?;
                tracing::info!("Found {} videos", found.videos.len());
                Ok(GifInputs {
                    videos: found.videos,
                    title: self.opts.title.resolve(found.common_name.as_deref()),
                })
            }
        }
    }

    pub fn default_output(&self, title: Option<&str>) -> PathBuf {
        PathBuf::from(format!(
            "{}_frame{}.gif",
            title.unwrap_or("output"),
            self.opts.frame_number
        ))
    }

    fn extract_command(&self, video: &VideoRef, width: u32, out: &Path) -> FfmpegArgs {
        let label = self.opts.label.format_label(&video.label);
        let chain = FilterChain::new()
            .then(Filter::SelectFrame(self.opts.frame_number))
            .then(Filter::scale_width(width))
            .then_opt(label_filter(&self.opts.label, &label));
        FfmpegArgs::new(self.opts.verbosity)
            .input(&video.path)
            .opt("-vf", chain.to_string())
            .opt("-vframes", "1")
            .output(out)
    }

    fn title_command(&self, frame: &Path, title: &str, out: &Path) -> FfmpegArgs {
        let padding = self.opts.title.padding;
        let chain = FilterChain::new()
            .then(Filter::pad_black(
                Extent::expr("iw"),
                Extent::expr(format!("ih+{padding}")),
                Extent::Px(0),
                Extent::Px(padding),
            ))
            .then(title_text(title, padding, None));
        FfmpegArgs::new(self.opts.verbosity)
            .input(frame)
            .opt("-vf", chain.to_string())
            .output(out)
    }

    fn extract_frames(
        &self,
        inputs: &GifInputs,
        width: u32,
        scratch: &Path,
    ) -> Result<Vec<PathBuf>, GridError> {
        let total = inputs.videos.len();
        let mut frames = Vec::with_capacity(total);
        for (idx, video) in inputs.videos.iter().enumerate() {
            let frame = scratch.join(format!("frame_{idx:04}.png"));
            tracing::debug!(
                "Extracting frame {} from {}",
                self.opts.frame_number,
                video.path.display()
            );
            let status = self
                .renderer
                .run(&self.extract_command(video, width, &frame))?;
            // a frame index past the end exits cleanly but writes nothing
            if !status.success() || !frame.is_file() {
                return Err(GridError::ExtractionFailed(video.path.clone()));
            }

            let frame = match inputs.title.as_deref() {
                Some(title) => {
                    let titled = scratch.join(format!("titled_{idx:04}.png"));
                    let cmd = self.title_command(&frame, title, &titled);
                    match self.renderer.run(&cmd) {
                        Ok(s) if s.success() && titled.is_file() => titled,
                        Ok(_) => {
                            tracing::warn!("Could not add title to frame {idx}, using it untitled");
                            frame
                        }
                        Err(e) => {
                            tracing::warn!("Could not add title to frame {idx} ({e}), using it untitled");
                            frame
                        }
                    }
                }
                None => frame,
            };
            frames.push(frame);
            tracing::info!(
                "  [{}/{total}] Extracted from {}",
                idx + 1,
                video
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy())
                    .unwrap_or_default()
            );
        }
        Ok(frames)
    }

    // Two-pass palette encode; falls back to the default palette when the
    // first pass fails
    fn encode(&self, manifest: &Path, palette: &Path, output: &Path) -> Result<(), GridError> {
        tracing::debug!("Generating color palette...");
        let palette_cmd = FfmpegArgs::new(self.opts.verbosity)
            .concat_input(manifest)
            .opt(
                "-vf",
                Filter::PaletteGen {
                    stats_mode: String::from("diff"),
                }
                .to_string(),
            )
            .output(palette);
        let palette_ok = match self.renderer.run(&palette_cmd) {
            Ok(s) => s.success(),
            Err(e) => {
                tracing::warn!("Palette generation could not run: {e}");
                false
            }
        };

        let gif_cmd = if palette_ok {
            FfmpegArgs::new(self.opts.verbosity)
                .concat_input(manifest)
                .input(palette)
                .opt("-lavfi", Filter::PaletteUse { bayer_scale: 5 }.to_string())
                .opt("-loop", "0")
                .output(output)
        } else {
            tracing::warn!("Palette generation failed, using default palette");
            FfmpegArgs::new(self.opts.verbosity)
                .concat_input(manifest)
                .opt("-loop", "0")
                .output(output)
        };
        tracing::debug!("Creating GIF...");
        let status = self.renderer.run(&gif_cmd)?;
        if status.success() {
            Ok(())
        } else {
            Err(GridError::EncodeFailed {
                output: output.to_path_buf(),
                code: status.code,
            })
        }
    }

    // Full run; scratch files live in a temp dir removed on every exit path
    pub fn assemble(&self) -> Result<PathBuf, GridError> {
        let inputs = self.resolve_inputs()?;
        let first = inputs
            .videos
            .first()
            .ok_or_else(|| GridError::InvalidOption(String::from("no videos to process")))?;
        tracing::info!(
            "Extracting frame {} from each video...",
            self.opts.frame_number
        );
        let md = self.probe.probe(&first.path)?;
        tracing::info!("Original video size: {}x{}", md.width, md.height);
        let width = self.opts.max_width.min(md.width);
        tracing::info!("Output frame width: {width}");

        let scratch: TempDir = tempfile::Builder::new().prefix("frame-gif").tempdir()?;
        let frames = self.extract_frames(&inputs, width, scratch.path())?;

        let output = self
            .opts
            .output
            .clone()
            .unwrap_or_else(|| self.default_output(inputs.title.as_deref()));
        let n = frames.len();
        tracing::info!("Creating GIF: {}", output.display());
        tracing::info!(
            "  - {n} frames at {}s each = {:.1}s total",
            self.opts.frame_duration,
            n as f64 * self.opts.frame_duration
        );

        let manifest = scratch.path().join(MANIFEST_NAME);
        write_manifest(
            BufWriter::new(File::create(&manifest)?),
            &frames,
            self.opts.frame_duration,
        )?;
        self.encode(&manifest, &scratch.path().join(PALETTE_NAME), &output)?;
        tracing::info!("✓ GIF created successfully: {}", output.display());
        Ok(output)
    }
}
