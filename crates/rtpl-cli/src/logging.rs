//! Logging setup for the `rtpl` binary.
//!
//! Library crates only emit `tracing` events; this is the one place a
//! subscriber is installed. Events go to stderr so generated output on stdout
//! stays clean.

use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::Registry;

use crate::args::GlobalArgs;

/// Environment variable holding an `EnvFilter` directive, e.g. `RTPL_LOG=debug`.
pub const LOG_ENV: &str = "RTPL_LOG";

/// Initialize the stderr subscriber.
///
/// `RTPL_LOG` wins when set. Otherwise the level follows `-q`/`-v`, and the
/// `debug` setting adds a TRACE-level dump of every generated unit.
pub fn init_tracing(args: &GlobalArgs, debug: bool) {
    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directives(args, debug)));

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .without_time()
        .with_filter(env_filter);

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = Registry::default().with(layer).try_init();
}

fn default_directives(args: &GlobalArgs, debug: bool) -> String {
    let level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    if debug {
        format!("{level},rtpl_compiler=trace")
    } else {
        level.to_string()
    }
}
