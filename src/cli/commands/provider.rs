//! Provider command implementation.
//!
//! - `status` - Show resolved endpoints and whether the gacha API answers
//! - `configure` - Save endpoint, language, and page size settings

use crate::cli::ProviderCommands;
use crate::error::{Error, Result};
use crate::provider::config::DEFAULT_PAGE_SIZE;
use crate::provider::{get_provider_settings, save_provider_settings, MihoyoClient, ProviderSettings};
use colored::Colorize;
use serde::Serialize;

/// Output for provider status.
#[derive(Serialize)]
struct StatusOutput {
    gacha_endpoint: String,
    identity_endpoint: String,
    lang: String,
    page_size: u32,
    reachable: bool,
    configured: Option<ProviderSettings>,
}

/// Output for provider configure.
#[derive(Serialize)]
struct ConfigureOutput {
    success: bool,
    settings: ProviderSettings,
}

/// Execute provider commands.
pub fn execute(command: &ProviderCommands, json: bool) -> Result<()> {
    match command {
        ProviderCommands::Status => {
            let rt = tokio::runtime::Runtime::new()
                .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))?;
            rt.block_on(execute_status(json))
        }
        ProviderCommands::Configure {
            gacha_endpoint,
            identity_endpoint,
            lang,
            page_size,
        } => execute_configure(
            ProviderSettings {
                gacha_endpoint: gacha_endpoint.clone(),
                identity_endpoint: identity_endpoint.clone(),
                lang: lang.clone(),
                page_size: *page_size,
            },
            json,
        ),
    }
}

async fn execute_status(json: bool) -> Result<()> {
    let client = MihoyoClient::new();
    let reachable = client.is_reachable().await;
    let configured = get_provider_settings().unwrap_or_default();

    if json {
        let output = StatusOutput {
            gacha_endpoint: client.gacha_endpoint().to_string(),
            identity_endpoint: client.identity_endpoint().to_string(),
            lang: client.lang().to_string(),
            page_size: client.page_size(),
            reachable,
            configured,
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    println!("Provider Status");
    println!("===============");
    println!();
    let status = if reachable {
        "✓ reachable".green()
    } else {
        "✗ unreachable".red()
    };
    println!("Gacha log:  {} {status}", client.gacha_endpoint());
    println!("Identity:   {}", client.identity_endpoint());
    println!("Language:   {}", client.lang());
    println!("Page size:  {}", client.page_size());
    if configured.is_none() {
        println!();
        println!("Using built-in defaults. Run 'wishsync provider configure' to override.");
    }

    Ok(())
}

fn execute_configure(update: ProviderSettings, json: bool) -> Result<()> {
    if update == ProviderSettings::default() {
        return Err(Error::InvalidArgument(
            "nothing to configure; pass at least one setting".to_string(),
        ));
    }
    if let Some(size) = update.page_size {
        if size == 0 || size > DEFAULT_PAGE_SIZE {
            return Err(Error::InvalidArgument(format!(
                "page size must be between 1 and {DEFAULT_PAGE_SIZE}"
            )));
        }
    }
    for url in [&update.gacha_endpoint, &update.identity_endpoint]
        .into_iter()
        .flatten()
    {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(Error::InvalidArgument(format!("not an http(s) URL: {url}")));
        }
    }

    let settings = save_provider_settings(&update)?;

    if json {
        let output = ConfigureOutput {
            success: true,
            settings,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Provider settings saved.");
        if let Some(ref url) = settings.gacha_endpoint {
            println!("  Gacha log: {url}");
        }
        if let Some(ref url) = settings.identity_endpoint {
            println!("  Identity:  {url}");
        }
        if let Some(ref lang) = settings.lang {
            println!("  Language:  {lang}");
        }
        if let Some(size) = settings.page_size {
            println!("  Page size: {size}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configure_rejects_empty_update() {
        let result = execute_configure(ProviderSettings::default(), true);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_configure_rejects_bad_values() {
        let oversized = ProviderSettings {
            page_size: Some(50),
            ..ProviderSettings::default()
        };
        assert!(matches!(
            execute_configure(oversized, true),
            Err(Error::InvalidArgument(_))
        ));

        let not_http = ProviderSettings {
            gacha_endpoint: Some("ftp://example.com".to_string()),
            ..ProviderSettings::default()
        };
        assert!(matches!(
            execute_configure(not_http, true),
            Err(Error::InvalidArgument(_))
        ));
    }
}
