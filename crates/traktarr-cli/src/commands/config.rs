use super::{auth, load_config, prompts, Session};
use crate::output::Output;
use crate::ConfigCommands;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Attribute, Cell, Color, Table};
use owo_colors::OwoColorize;
use serde_json::json;
use traktarr_config::{PathManager, TraktConfig};

pub async fn run_config(cmd: ConfigCommands, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show { full } => show_config(full, output),
        ConfigCommands::Trakt {
            client_id,
            client_secret,
            redirect_uri,
        } => configure_trakt(client_id, client_secret, redirect_uri, output).await,
    }
}

fn paths() -> Result<PathManager> {
    PathManager::new().map_err(|e| eyre!("Failed to determine configuration directories: {}", e))
}

fn section(title: &str) -> Table {
    let mut table = Table::new();
    table.set_header(vec![Cell::new(title)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)]);
    table
}

fn flag(enabled: bool) -> String {
    if enabled {
        "✓".green().to_string()
    } else {
        "✗".red().to_string()
    }
}

fn show_config(full: bool, output: &Output) -> Result<()> {
    let paths = paths()?;
    let config_file = paths.config_file();
    if !config_file.exists() {
        output.warn(format!(
            "Configuration file not found at: {}",
            config_file.display()
        ));
        output.info("Run 'traktarr config trakt' to create it.");
        return Ok(());
    }
    let config = load_config(&paths)?;

    if !output.is_human() {
        let trakt = config.trakt.as_ref().map(|t| {
            let (client_id, client_secret) = if full {
                (t.client_id.clone(), t.client_secret.clone())
            } else {
                (mask_string(&t.client_id), mask_string(&t.client_secret))
            };
            json!({
                "client_id": client_id,
                "client_secret": client_secret,
                "redirect_uri": t.redirect_uri,
                "api_url": t.api_url,
            })
        });
        output.json(&json!({
            "config_file": config_file.display().to_string(),
            "trakt": trakt,
            "fetch": {
                "page_limit": config.fetch.page_limit,
                "bulk_page_limit": config.fetch.bulk_page_limit,
                "extended_info": config.fetch.extended_info,
            },
            "export": {
                "format": config.export.format,
                "output_dir": config.export.output_dir.as_ref().map(|p| p.display().to_string()),
                "filename_prefix": config.export.filename_prefix,
            },
        }));
        return Ok(());
    }

    output.println(format!("\n{}", "Configuration".bright_cyan().bold()));
    let mut info = Table::new();
    info.set_header(vec![
        Cell::new("Config File").add_attribute(Attribute::Bold),
        Cell::new(config_file.display().to_string()),
    ]);
    output.table(info);

    match &config.trakt {
        Some(trakt) => {
            let mut table = section("Trakt");
            let client_id = if full { trakt.client_id.clone() } else { mask_string(&trakt.client_id) };
            let client_secret = if full {
                trakt.client_secret.clone()
            } else {
                mask_string(&trakt.client_secret)
            };
            table.add_row(vec![Cell::new("Client ID"), Cell::new(client_id)]);
            table.add_row(vec![Cell::new("Client Secret"), Cell::new(client_secret)]);
            table.add_row(vec![Cell::new("Redirect URI"), Cell::new(&trakt.redirect_uri)]);
            table.add_row(vec![Cell::new("API URL"), Cell::new(&trakt.api_url)]);
            output.table(table);
        }
        None => output.println(format!("{}", "Trakt: Not configured".bright_black())),
    }

    let mut fetch = section("Fetching");
    fetch.add_row(vec![Cell::new("Page Limit"), Cell::new(config.fetch.page_limit)]);
    fetch.add_row(vec![
        Cell::new("Bulk Page Limit"),
        Cell::new(config.fetch.bulk_page_limit),
    ]);
    fetch.add_row(vec![
        Cell::new("Extended Info"),
        Cell::new(flag(config.fetch.extended_info)),
    ]);
    output.table(fetch);

    let export_dir = config
        .export
        .output_dir
        .clone()
        .unwrap_or_else(|| paths.export_dir());
    let mut export = section("Export");
    export.add_row(vec![Cell::new("Format"), Cell::new(&config.export.format)]);
    export.add_row(vec![
        Cell::new("Output Directory"),
        Cell::new(export_dir.display().to_string()),
    ]);
    export.add_row(vec![
        Cell::new("Filename Prefix"),
        Cell::new(&config.export.filename_prefix),
    ]);
    for (name, enabled) in [
        ("History", config.export.include_history),
        ("Watched", config.export.include_watched),
        ("Ratings", config.export.include_ratings),
        ("Collection", config.export.include_collection),
        ("Stats", config.export.include_stats),
    ] {
        export.add_row(vec![Cell::new(name), Cell::new(flag(enabled))]);
    }
    output.table(export);

    Ok(())
}

async fn configure_trakt(
    client_id_arg: Option<String>,
    client_secret_arg: Option<String>,
    redirect_uri_arg: Option<String>,
    output: &Output,
) -> Result<()> {
    let paths = paths()?;
    paths
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create configuration directories: {}", e))?;
    let config_file = paths.config_file();
    let mut config = load_config(&paths)?;

    print_section_header("Trakt API Setup", output);
    print_instruction_list(
        &[
            "Login to Trakt and open your API apps page: https://trakt.tv/oauth/applications",
            "Create a new API application named 'traktarr'",
            "Use 'urn:ietf:wg:oauth:2.0:oob' as the Redirect URI",
        ],
        output,
    );
    output.println("");

    let existing = config.trakt.clone();
    let client_id = match client_id_arg {
        Some(id) => id,
        None => loop {
            let current = existing
                .as_ref()
                .map(|t| t.client_id.as_str())
                .filter(|id| !id.is_empty() && *id != "YOUR_CLIENT_ID");
            let input = prompts::prompt_string("Trakt Client ID", current)?;
            match validate_client_id(&input) {
                Ok(()) => break input,
                Err(e) => output.error(format!("Validation error: {}", e)),
            }
        },
    };

    let client_secret = match client_secret_arg {
        Some(secret) => secret,
        None => {
            let first_setup = existing
                .as_ref()
                .map(|t| t.client_secret.is_empty() || t.client_secret == "YOUR_CLIENT_SECRET")
                .unwrap_or(true);
            prompts::prompt_secret("Trakt Client Secret", first_setup)?
        }
    };

    if client_id.is_empty() || client_secret.is_empty() {
        return Err(eyre!("Client ID and Client Secret are required"));
    }

    let mut trakt = existing.unwrap_or_else(|| TraktConfig::new("", ""));
    trakt.client_id = client_id;
    trakt.client_secret = client_secret;
    if let Some(redirect_uri) = redirect_uri_arg {
        trakt.redirect_uri = redirect_uri;
    }
    config.trakt = Some(trakt);
    config
        .validate()
        .map_err(|e| eyre!("Invalid configuration: {}", e))?;
    config
        .save_to_file(&config_file)
        .map_err(|e| eyre!("Failed to save config to {}: {}", config_file.display(), e))?;
    output.success(format!("Saved Trakt settings to {}", config_file.display()));

    if output.is_human() && prompts::prompt_yes_no("Sign in to Trakt now?", true)? {
        let session = Session::load()?;
        auth::login(&session, None, output).await?;
    }

    Ok(())
}

fn mask_string(s: &str) -> String {
    if s.is_empty() || s == "YOUR_CLIENT_ID" || s == "YOUR_CLIENT_SECRET" {
        return "<not set>".to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}

fn validate_client_id(input: &str) -> Result<(), &'static str> {
    if input.is_empty() {
        return Err("Client ID cannot be empty");
    }
    if input.len() < 10 {
        return Err("Client ID seems too short. Please verify it's correct.");
    }
    Ok(())
}

fn print_section_header(title: &str, output: &Output) {
    output.println("");
    output.println(format!("{}", title.bold().bright_cyan()));
    output.println(format!("{}", "─".repeat(title.len()).bright_cyan()));
}

fn print_instruction_list(items: &[&str], output: &Output) {
    for (idx, item) in items.iter().enumerate() {
        output.println(format!("  {}. {}", idx + 1, item));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_string() {
        assert_eq!(mask_string(""), "<not set>");
        assert_eq!(mask_string("YOUR_CLIENT_ID"), "<not set>");
        assert_eq!(mask_string("abcd"), "****");
        assert_eq!(mask_string("abcdef123456"), "ab***56");
    }

    #[test]
    fn test_validate_client_id() {
        assert!(validate_client_id("").is_err());
        assert!(validate_client_id("short").is_err());
        assert!(validate_client_id("0123456789abcdef").is_ok());
    }
}
