use tracing_subscriber::{EnvFilter, FmtSubscriber};

const LOG_ENV: &str = "RATEFIRE_LOG";

pub fn init_logging(verbose: bool, no_color: bool) {
    let directive = std::env::var(LOG_ENV)
        .or_else(|_err| std::env::var("RUST_LOG"))
        .ok();
    let filter = resolve_filter(directive.as_deref(), verbose);

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_ansi(!no_color)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set global default subscriber: {}", err);
    }
}

fn resolve_filter(directive: Option<&str>, verbose: bool) -> EnvFilter {
    let fallback = if verbose { "debug" } else { "info" };
    directive.map_or_else(
        || EnvFilter::new(fallback),
        |value| EnvFilter::try_new(value).unwrap_or_else(|_err| EnvFilter::new(fallback)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_logging_is_idempotent() {
        init_logging(false, true);
        init_logging(true, true);
    }

    #[test]
    fn verbose_falls_back_to_debug() -> Result<(), String> {
        let filter = resolve_filter(None, true).to_string();
        if filter != "debug" {
            return Err(format!("Unexpected filter: {}", filter));
        }
        Ok(())
    }

    #[test]
    fn explicit_directive_wins() -> Result<(), String> {
        let filter = resolve_filter(Some("ratefire=trace"), false).to_string();
        if filter != "ratefire=trace" {
            return Err(format!("Unexpected filter: {}", filter));
        }
        Ok(())
    }

    #[test]
    fn invalid_directive_uses_default() -> Result<(), String> {
        let filter = resolve_filter(Some("[[not a filter"), false).to_string();
        if filter != "info" {
            return Err(format!("Unexpected filter: {}", filter));
        }
        Ok(())
    }
}
