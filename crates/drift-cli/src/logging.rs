//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

/// Install the global subscriber, writing to stderr.
///
/// `RUST_LOG` wins when set; otherwise every `drift*` target logs at info
/// (debug with `verbose`).
pub fn init(verbose: bool, json: bool) {
    let default = if verbose { "drift=debug" } else { "drift=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose);

    let installed = if json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
    if let Err(e) = installed {
        eprintln!("Failed to install log subscriber: {}", e);
    }
}
