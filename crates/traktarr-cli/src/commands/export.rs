use super::progress::Spinner;
use super::Session;
use crate::output::Output;
use chrono::{DateTime, Utc};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use owo_colors::OwoColorize;
use serde_json::json;
use std::path::PathBuf;
use traktarr_config::ExportConfig;
use traktarr_core::{
    collect_bundle, default_filename_base, export_data, DirectorySink, ExportFormat, ExportOptions,
};

/// Command line overrides for an export run. `include_*` are false only when
/// the matching `--no-*` flag was passed.
#[derive(Debug, Clone)]
pub struct ExportArgs {
    pub format: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub filename: Option<String>,
    pub include_history: bool,
    pub include_watched: bool,
    pub include_ratings: bool,
    pub include_collection: bool,
    pub include_stats: bool,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

fn resolve_options(config: &ExportConfig, args: &ExportArgs) -> Result<ExportOptions> {
    let mut options =
        ExportOptions::from_config(config).map_err(|e| eyre!("Invalid [export] settings: {}", e))?;
    if let Some(format) = &args.format {
        options.format = format.parse::<ExportFormat>()?;
    }
    options.include_history &= args.include_history;
    options.include_watched &= args.include_watched;
    options.include_ratings &= args.include_ratings;
    options.include_collection &= args.include_collection;
    options.include_stats &= args.include_stats;
    options.start_date = args.start;
    options.end_date = args.end;
    Ok(options)
}

pub async fn run_export(args: ExportArgs, output: &Output) -> Result<()> {
    let session = Session::load()?;
    let export_config = &session.config.export;
    let options = resolve_options(export_config, &args)?;

    let output_dir = args
        .output_dir
        .clone()
        .or_else(|| export_config.output_dir.clone())
        .unwrap_or_else(|| session.paths.export_dir());
    let filename = args.filename.clone().unwrap_or_else(|| {
        default_filename_base(&export_config.filename_prefix, Utc::now().date_naive())
    });

    let service = session.service()?;
    let spinner = Spinner::start(format!("Collecting Trakt data for {} export...", options.format));
    let collected = collect_bundle(&service, &options).await;
    spinner.finish();
    let bundle = collected.map_err(|e| eyre!("Failed to collect Trakt data: {}", e))?;

    if bundle.is_empty() {
        output.warn("Nothing selected for export");
        return Ok(());
    }

    let sink = DirectorySink::new(&output_dir);
    let written = export_data(&bundle, options.format, &filename, &sink)?;

    if !output.is_human() {
        output.json(&json!({
            "format": options.format.as_str(),
            "directory": output_dir.display().to_string(),
            "files": written,
        }));
        return Ok(());
    }

    if written.is_empty() {
        output.warn("Every selected category was empty; no files written");
        return Ok(());
    }
    output.success(format!(
        "Exported {} file(s) to {}",
        written.len(),
        output_dir.display()
    ));
    for file in &written {
        output.println(format!("  {} {}", "•".bright_blue(), file));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> ExportArgs {
        ExportArgs {
            format: None,
            output_dir: None,
            filename: None,
            include_history: true,
            include_watched: true,
            include_ratings: true,
            include_collection: true,
            include_stats: true,
            start: None,
            end: None,
        }
    }

    #[test]
    fn test_resolve_options_layers_flags_over_config() {
        let config = ExportConfig {
            include_stats: false,
            ..ExportConfig::default()
        };
        let overrides = ExportArgs {
            format: Some("csv".to_string()),
            include_ratings: false,
            start: traktarr_models::parse_timestamp("2024-01-01"),
            ..args()
        };

        let options = resolve_options(&config, &overrides).unwrap();
        assert_eq!(options.format, ExportFormat::Csv);
        assert!(options.include_history);
        assert!(!options.include_ratings);
        assert!(!options.include_stats);
        assert!(options.start_date.is_some());
        assert!(options.end_date.is_none());
    }

    #[test]
    fn test_resolve_options_rejects_unknown_format() {
        let overrides = ExportArgs {
            format: Some("xml".to_string()),
            ..args()
        };
        assert!(resolve_options(&ExportConfig::default(), &overrides).is_err());
    }
}
