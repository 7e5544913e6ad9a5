// Grid video composer.
// Probes every clip, works out a common cell size plus per-clip freeze timing,
// and renders the whole grid with a single ffmpeg `-filter_complex` run.

use std::path::{Path, PathBuf};

use crate::discover::{find_videos, Discovery, VideoRef};
use crate::filter::{label_filter, title_text, Extent, Filter, FilterChain, FilterGraph};
use crate::layout::{CellDim, FreezePlan, GridLayout};
use crate::opts::GridOptions;
use crate::probe::{MetadataProvider, VideoMetadata};
use crate::render::{FfmpegArgs, MediaRenderer};
use crate::{GridError, DEFAULT_PATTERN};

const FINAL_PAD: &str = "final";
const TITLE_FONT: &str = "Arial";

#[derive(Debug, Clone)]
pub struct GridCell {
    pub video: VideoRef,
    pub metadata: VideoMetadata,
    pub freeze: FreezePlan,
    // final label text, frozen marker included
    pub label: String,
}

// Everything derived for one composer run; rendering is a separate step
#[derive(Debug, Clone)]
pub struct GridPlan {
    pub cells: Vec<GridCell>,
    pub layout: GridLayout,
    pub max_duration: f64,
    pub title: Option<String>,
    pub graph: FilterGraph,
    pub output: PathBuf,
}

impl GridPlan {
    pub fn command(&self, opts: &GridOptions) -> FfmpegArgs {
        let mut cmd = FfmpegArgs::new(opts.verbosity);
        cmd.opt("-vsync", "cfr");
        for cell in self.cells.iter() {
            cmd.input(&cell.video.path);
        }
        cmd.opt("-filter_complex", self.graph.to_string())
            .opt("-map", format!("[{FINAL_PAD}]"))
            .opt("-c:v", "libx264")
            .opt("-crf", "23")
            .opt("-pix_fmt", "yuv420p")
            .output(&self.output)
    }
}

pub struct GridComposer<'a, P, R> {
    opts: &'a GridOptions,
    probe: &'a P,
    renderer: &'a R,
}

impl<'a, P, R> GridComposer<'a, P, R>
where
    P: MetadataProvider,
    R: MediaRenderer,
{
    pub fn new(opts: &'a GridOptions, probe: &'a P, renderer: &'a R) -> Self {
        Self {
            opts,
            probe,
            renderer,
        }
    }

    // Discover, probe and plan the grid for the videos in `dir`
    pub fn plan(&self, dir: &Path) -> Result<GridPlan, GridError> {
        let discovery = find_videos(dir, DEFAULT_PATTERN)?;
        tracing::info!("Found {} videos", discovery.videos.len());
        let default_output = dir.join(format!(
            "{}_GRID.mp4",
            discovery.common_name.as_deref().unwrap_or("output")
        ));
        let output = self.opts.output.clone().unwrap_or(default_output);
        self.plan_videos(discovery, output)
    }

    pub fn plan_videos(&self, discovery: Discovery, output: PathBuf) -> Result<GridPlan, GridError> {
        let Discovery {
            videos,
            common_name,
        } = discovery;
        tracing::info!("Detecting video durations and framerates...");
        let metadata = videos
            .iter()
            .map(|v| self.probe.probe(&v.path))
            .collect::<Result<Vec<_>, _>>()?;
        let max_duration = metadata
            .iter()
            .map(|m| m.duration)
            .fold(0.0_f64, f64::max);
        tracing::info!("Longest video duration: {max_duration}s");

        let reference = metadata.first().ok_or_else(|| GridError::NoInputsFound {
            dir: PathBuf::from("."),
            pattern: String::from(DEFAULT_PATTERN),
        })?;
        tracing::info!(
            "Original video size: {}x{}",
            reference.width,
            reference.height
        );
        let cell = CellDim::compute(reference, self.opts.max_width, self.opts.padding_percent);
        tracing::info!(
            "Cell size with padding: {}x{} (padding: {}px = {}% top/bottom)",
            cell.width,
            cell.height,
            cell.padding,
            self.opts.padding_percent
        );
        let layout = GridLayout::new(videos.len(), cell)?;

        let freeze = &self.opts.freeze;
        let cells: Vec<GridCell> = videos
            .into_iter()
            .zip(metadata)
            .map(|(video, metadata)| {
                let plan = freeze.plan(&metadata, max_duration);
                let label = freeze.decorate(self.opts.label.format_label(&video.label), &plan);
                GridCell {
                    video,
                    metadata,
                    freeze: plan,
                    label,
                }
            })
            .collect();

        let title = self.opts.title.resolve(common_name.as_deref());
        let graph = self.build_graph(&cells, &layout, title.as_deref());
        Ok(GridPlan {
            cells,
            layout,
            max_duration,
            title,
            graph,
            output,
        })
    }

    fn build_graph(&self, cells: &[GridCell], layout: &GridLayout, title: Option<&str>) -> FilterGraph {
        let cell = layout.cell;
        let mut graph = FilterGraph::default();
        for (idx, c) in cells.iter().enumerate() {
            graph.push(
                FilterChain::new()
                    .input(format!("{idx}:v"))
                    .then(Filter::Fps(c.metadata.fps))
                    .then(Filter::scale_width(cell.width))
                    .then(Filter::pad_black(
                        Extent::Px(cell.width),
                        Extent::Px(cell.height),
                        Extent::Px(0),
                        Extent::Px(cell.padding),
                    ))
                    .then(Filter::Trim {
                        start: 0.0,
                        end: c.freeze.trim_end,
                    })
                    .then(Filter::ResetPts)
                    .then(Filter::CloneTail {
                        duration: c.freeze.freeze_duration,
                    })
                    .then(Filter::ResetPts)
                    .then_opt(label_filter(&self.opts.label, &c.label))
                    .output(format!("v{idx}")),
            );
        }

        // xstack refuses a single input
        let mut composite = (0..cells.len()).fold(FilterChain::new(), |chain, idx| {
            chain.input(format!("v{idx}"))
        });
        composite = if cells.len() > 1 {
            composite.then(Filter::XStack {
                layout: layout.positions(),
            })
        } else {
            composite.then(Filter::Null)
        };
        graph.push(composite.output("outv"));

        match title {
            Some(text) => {
                // band height rounded up to even so the frame stays yuv420p friendly
                let padding = self.opts.title.padding + self.opts.title.padding % 2;
                graph.push(
                    FilterChain::new()
                        .input("outv")
                        .then(Filter::scale_even())
                        .output("scaled"),
                );
                graph.push(
                    FilterChain::new()
                        .input("scaled")
                        .then(Filter::pad_black(
                            Extent::expr("iw"),
                            Extent::expr(format!("ih+{padding}")),
                            Extent::Px(0),
                            Extent::Px(padding),
                        ))
                        .output("padded"),
                );
                graph.push(
                    FilterChain::new()
                        .input("padded")
                        .then(title_text(text, padding, Some(TITLE_FONT)))
                        .output(FINAL_PAD),
                );
            }
            None => {
                graph.push(
                    FilterChain::new()
                        .input("outv")
                        .then(Filter::scale_even())
                        .output(FINAL_PAD),
                );
            }
        }
        graph
    }

    // Plan and render; returns the written file
    pub fn compose(&self, dir: &Path) -> Result<PathBuf, GridError> {
        let plan = self.plan(dir)?;
        self.render(&plan)?;
        Ok(plan.output)
    }

    pub fn render(&self, plan: &GridPlan) -> Result<(), GridError> {
        let cmd = plan.command(self.opts);
        tracing::info!("Creating grid video: {}", plan.output.display());
        tracing::info!(
            "Processing {} input videos, command built with {} arguments",
            plan.cells.len(),
            cmd.args().len() + 1
        );
        tracing::debug!("Filter graph: {}", plan.graph);

        let status = self.renderer.run(&cmd)?;
        if status.success() {
            tracing::info!("✓ Grid video created successfully");
            Ok(())
        } else {
            Err(GridError::EncodeFailed {
                output: plan.output.clone(),
                code: status.code,
            })
        }
    }
}
