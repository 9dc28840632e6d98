use tracing_subscriber::{prelude::*, EnvFilter};

/// `RUST_LOG` wins; otherwise each `-v` raises the level. Logs go to stderr
/// so stdout stays parseable.
pub(crate) fn init_logging(verbosity: u8) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directive(verbosity))?,
    };
    let format_json = std::env::var("LOG_FORMAT").unwrap_or_default() == "json";

    let registry = tracing_subscriber::registry().with(filter);
    if format_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    }
    Ok(())
}

fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug,mongodb=info",
    }
}
