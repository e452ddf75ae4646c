use anyhow::Result;
use std::io;
use std::io::IsTerminal;
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::{self, time::ChronoUtc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

// 0 = info, 1 = debug with noisy HTTP internals held at warn, 2+ = trace
fn filter_directive(verbose_level: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose_level {
        0 => "info",
        1 => "debug,hyper::proto::h1=warn,hyper::client::pool=warn,reqwest=info",
        _ => "trace",
    }
}

/// Split `dir/traktarr.log` into the directory and the rotation prefix `traktarr`.
fn rotation_target(log_path: &Path) -> Result<(&Path, &str)> {
    let log_dir = match log_path.parent() {
        Some(dir) if dir.as_os_str().is_empty() => Path::new("."),
        Some(dir) => dir,
        None => anyhow::bail!("Log file path has no parent directory"),
    };
    let log_filename = log_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid log filename"))?;
    let prefix = log_filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .filter(|stem| !stem.is_empty())
        .unwrap_or(log_filename);
    Ok((log_dir, prefix))
}

pub fn init_logging(verbose_level: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    // Quiet always wins; otherwise RUST_LOG overrides the verbosity flags
    let filter = if quiet {
        EnvFilter::new(filter_directive(0, true))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(filter_directive(verbose_level, false)))
    };

    let json = std::env::var("RUST_LOG_JSON")
        .map(|v| v == "true")
        .unwrap_or_else(|_| !io::stdout().is_terminal());

    let registry = Registry::default().with(filter);

    if let Some(log_path) = log_file {
        let (log_dir, log_prefix) = rotation_target(log_path)?;
        std::fs::create_dir_all(log_dir)?;
        // traktarr.2026-01-17, traktarr.2026-01-18, ...
        let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, log_prefix);

        if json {
            let json_layer = fmt::layer()
                .json()
                .with_timer(ChronoUtc::rfc_3339())
                .with_writer(file_appender);
            registry.with(json_layer).try_init()?;
        } else {
            let fmt_layer = fmt::layer()
                .with_timer(ChronoUtc::rfc_3339())
                .with_ansi(false)
                .with_writer(file_appender);
            registry.with(fmt_layer).try_init()?;
        }
    } else if json {
        let json_layer = fmt::layer()
            .json()
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(io::stderr);
        registry.with(json_layer).try_init()?;
    } else {
        let fmt_layer = fmt::layer()
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(io::stderr);
        registry.with(fmt_layer).try_init()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive_levels() {
        assert_eq!(filter_directive(0, false), "info");
        assert!(filter_directive(1, false).starts_with("debug"));
        assert_eq!(filter_directive(3, false), "trace");
        assert_eq!(filter_directive(2, true), "error");
    }

    #[test]
    fn test_rotation_target() {
        let (dir, prefix) = rotation_target(Path::new("/var/log/traktarr/traktarr.log")).unwrap();
        assert_eq!(dir, Path::new("/var/log/traktarr"));
        assert_eq!(prefix, "traktarr");

        let (_, prefix) = rotation_target(Path::new("logs/plain")).unwrap();
        assert_eq!(prefix, "plain");

        let (dir, _) = rotation_target(Path::new("traktarr.log")).unwrap();
        assert_eq!(dir, Path::new("."));
    }
}
