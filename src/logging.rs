use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable that overrides the CLI-derived filter.
pub const LOG_ENV: &str = "GRADEBOOK_LOG";

/// Initialize structured logging on stderr based on CLI arguments.
///
/// `log_level` wins over `verbose`; a bare level such as `info` is scoped to
/// this crate, while a full directive (`gradebook=trace,rusqlite=debug`) is
/// used as-is. `RUST_LOG` or `GRADEBOOK_LOG` override both.
pub fn init_tracing(
    verbose: bool,
    log_level: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let level = match (verbose, log_level) {
        (_, Some(level)) => level,
        (true, None) => "debug",
        (false, None) => "warn",
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_from_env(LOG_ENV))
        .unwrap_or_else(|_| EnvFilter::new(directive_for(level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .try_init()?;

    Ok(())
}

fn directive_for(level: &str) -> String {
    if level.contains('=') {
        level.to_string()
    } else {
        format!("gradebook={level}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_levels_are_scoped_to_the_crate() {
        assert_eq!(directive_for("debug"), "gradebook=debug");
        assert_eq!(
            directive_for("gradebook=trace,rusqlite=info"),
            "gradebook=trace,rusqlite=info"
        );
    }
}
