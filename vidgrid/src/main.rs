use std::path::Path;

use structopt::StructOpt;

use vidgrid_tools::cli::GridOpt;
use vidgrid_tools::grid::GridComposer;
use vidgrid_tools::opts::Verbosity;
use vidgrid_tools::probe::FfprobeProvider;
use vidgrid_tools::render::FfmpegRenderer;
use vidgrid_tools::{logging, GridError};

fn run(opt: GridOpt, verbosity: Verbosity) -> Result<(), GridError> {
    let (opts, tools) = opt.into_parts(verbosity)?;
    let probe = FfprobeProvider::new(tools.ffprobe);
    let renderer = FfmpegRenderer::new(tools.ffmpeg, verbosity);
    let output = GridComposer::new(&opts, &probe, &renderer).compose(Path::new("."))?;
    tracing::info!("Output: {}", output.display());
    Ok(())
}

fn main() {
    let opt = GridOpt::from_args();
    let verbosity = Verbosity::from_env();
    logging::init(verbosity);

    if let Err(err) = run(opt, verbosity) {
        tracing::error!("{err}");
        std::process::exit(err.exit_code());
    }
}
