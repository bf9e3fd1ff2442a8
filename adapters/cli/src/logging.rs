use env_logger::{Builder, Env};
use log::LevelFilter;

/// Level used when `RUST_LOG` is unset.
pub(crate) const fn default_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Installs the global logger for a headless run.
///
/// Timestamps are dropped since runs are short; module targets are only shown
/// in verbose mode, where per-system debug lines interleave.
pub(crate) fn init(verbose: bool) {
    let env = Env::default().default_filter_or(default_level(verbose).as_str());
    let mut builder = Builder::from_env(env);
    let _ = builder
        .format_timestamp(None)
        .format_target(verbose)
        .try_init();
}
