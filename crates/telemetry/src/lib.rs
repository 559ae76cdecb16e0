//! Logging pipeline bootstrap.

use anyhow::anyhow;
use comic_back_kernel::settings::{LogFormat, TelemetrySettings};
use tracing_subscriber::EnvFilter;

/// Level variable honoured by the comic-back service as well.
const LOGLEVEL_ENV: &str = "LOGLEVEL";

/// Install the global subscriber. Logs go to stderr so stdout stays free
/// for command output.
pub fn init(settings: &TelemetrySettings) -> anyhow::Result<()> {
    let filter = resolve_filter(settings, std::env::var(LOGLEVEL_ENV).ok());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let result = match settings.log_format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|err| anyhow!("failed to install tracing subscriber: {err}"))?;

    tracing::debug!(
        target: "comic-back-telemetry",
        format = ?settings.log_format,
        "telemetry initialized"
    );
    Ok(())
}

/// `RUST_LOG` wins, then `LOGLEVEL`, then the configured level.
fn resolve_filter(settings: &TelemetrySettings, loglevel: Option<String>) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = loglevel
            .filter(|level| !level.trim().is_empty())
            .unwrap_or_else(|| settings.level.clone());
        EnvFilter::try_new(level.to_lowercase()).unwrap_or_else(|_| EnvFilter::new("info"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // Only meaningful when RUST_LOG is unset, which is the case under `cargo test`
    // unless the caller exports it.
    #[test]
    fn loglevel_overrides_configured_level() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let settings = TelemetrySettings::default();
        let filter = resolve_filter(&settings, Some("DEBUG".to_string()));
        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    fn falls_back_to_configured_level() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let settings = TelemetrySettings {
            level: "warn".to_string(),
            ..TelemetrySettings::default()
        };
        assert_eq!(resolve_filter(&settings, None).to_string(), "warn");
        assert_eq!(
            resolve_filter(&settings, Some("  ".to_string())).to_string(),
            "warn"
        );
    }
}
