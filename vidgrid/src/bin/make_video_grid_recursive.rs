use structopt::StructOpt;

use vidgrid_tools::cli::RecursiveOpt;
use vidgrid_tools::logging;
use vidgrid_tools::opts::Verbosity;
use vidgrid_tools::recurse::{display_args, run_recursive, split_passthrough, ProcessLauncher};

fn main() {
    let (own, forwarded) = split_passthrough(std::env::args_os());
    let opt = RecursiveOpt::from_iter(own);
    logging::init(Verbosity::from_env());

    let launcher = ProcessLauncher::sibling();
    tracing::debug!(
        "Launching {} with: {}",
        launcher.program.display(),
        display_args(&forwarded)
    );

    match run_recursive(&launcher, &opt.start_dir, &forwarded) {
        Ok(summary) => {
            tracing::info!(
                "Done: {} processed, {} failed, {} skipped",
                summary.processed,
                summary.failed,
                summary.skipped
            );
            std::process::exit(summary.exit_code());
        }
        Err(err) => {
            tracing::error!("{err}");
            std::process::exit(1);
        }
    }
}
