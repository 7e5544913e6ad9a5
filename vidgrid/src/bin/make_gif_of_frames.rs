use structopt::StructOpt;

use vidgrid_tools::cli::GifOpt;
use vidgrid_tools::gif::GifAssembler;
use vidgrid_tools::opts::Verbosity;
use vidgrid_tools::probe::FfprobeProvider;
use vidgrid_tools::render::FfmpegRenderer;
use vidgrid_tools::{logging, GridError};

fn run(opt: GifOpt, verbosity: Verbosity) -> Result<(), GridError> {
    let (opts, tools) = opt.into_parts(verbosity)?;
    let probe = FfprobeProvider::new(tools.ffprobe);
    let renderer = FfmpegRenderer::new(tools.ffmpeg, verbosity);
    let output = GifAssembler::new(&opts, &probe, &renderer).assemble()?;
    tracing::info!("GIF created successfully: {}", output.display());
    Ok(())
}

fn main() {
    let opt = GifOpt::from_args();
    let verbosity = Verbosity::from_env();
    logging::init(verbosity);

    if let Err(err) = run(opt, verbosity) {
        tracing::error!("{err}");
        std::process::exit(1);
    }
}
