use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::opts::Verbosity;

// RUST_LOG wins; otherwise FFMPEG_VERBOSE decides between info and debug
fn default_filter(verbosity: Verbosity) -> EnvFilter {
    let level = if verbosity.verbose { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

// Install the process-wide subscriber; a second call is a no-op
pub fn init(verbosity: Verbosity) {
    let _ = tracing_subscriber::registry()
        .with(default_filter(verbosity))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn init_twice_is_harmless() {
        init(Verbosity::default());
        init(Verbosity { verbose: true });
        tracing::info!("still logging");
    }
}
