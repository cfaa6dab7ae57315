use anyhow::Context as _;

const DEFAULT_DIRECTIVES: &str = "info";

/// Installs the stderr fmt subscriber. `RUST_LOG` wins over the default
/// `info` filter.
pub fn init() -> anyhow::Result<()> {
    init_with_default(DEFAULT_DIRECTIVES)
}

pub fn init_with_default(directives: &str) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(directives))
        .with_context(|| format!("build log filter from {directives:?}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("initialize tracing subscriber: {err}"))?;

    Ok(())
}
