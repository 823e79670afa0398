use std::path::Path;
use std::time::Duration;

use fex_lib::{Config, ExportError, ExportSettings, FigmaAuth};

use crate::cli::{Cli, FlagSources};

/// Load config from a TOML file, central config, or return defaults.
/// Priority: explicit path > ~/.config/fex/config.toml > defaults
pub fn load_config(path: Option<&Path>) -> Result<Config, ExportError> {
    let cfg = Config::load(path).map_err(|e| ExportError::Config(format!("Failed to read config: {e}")))?;

    cfg.validate().map_err(|e| {
        let prefix = path
            .map(|p| format!("Invalid config ({}): {}", p.display(), e))
            .unwrap_or_else(|| format!("Invalid config: {}", e));
        ExportError::Config(prefix)
    })?;
    Ok(cfg)
}

/// Token precedence: --access-token > config file > environment.
fn resolve_auth(cli_token: Option<&str>, config: &Config) -> Option<FigmaAuth> {
    cli_token
        .or(config.access_token.as_deref())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| FigmaAuth::PersonalAccessToken(t.to_string()))
        .or_else(FigmaAuth::from_env)
}

/// Merge CLI arguments with config file, preferring CLI when flags are present.
pub fn resolve_export_settings(
    cli: &Cli,
    flags: &FlagSources,
    config: &Config,
) -> Result<ExportSettings, ExportError> {
    let auth = resolve_auth(cli.access_token.as_deref(), config).ok_or_else(|| {
        ExportError::Config(
            "A Figma access token is required (--access-token or FIGMA_TOKEN)".to_string(),
        )
    })?;

    let settings = ExportSettings {
        url: cli.url.clone(),
        auth,
        image_save_path: if flags.image_save_path {
            cli.image_save_path.clone()
        } else {
            config.image_save_path.clone()
        },
        node_types: if flags.node_types {
            cli.node_types.clone()
        } else {
            config.node_types.clone()
        },
        ignore_node_name: cli
            .ignore_node_name
            .clone()
            .or_else(|| config.ignore_node_name.clone()),
        scale: if flags.scale { cli.scale } else { config.scale },
        format: if flags.format {
            cli.format.into()
        } else {
            config.format
        },
        concurrency: if flags.concurrency {
            usize::from(cli.concurrency)
        } else {
            config.concurrency
        },
        timeout: if flags.timeout {
            Duration::from_secs(cli.timeout)
        } else {
            config.timeout
        },
        api_base_url: config.api_base_url.clone(),
    };
    settings.validate()?;
    Ok(settings)
}

/// Format effective settings as a single-line string (token omitted).
pub fn format_effective_settings(settings: &ExportSettings, config_source: Option<&Path>) -> String {
    let source = config_source
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults".to_string());
    format!(
        "Effective config [{source}]: save_path={}, node_types={}, ignore={}, scale={}, format={}, concurrency={}, timeout={}s, api={}",
        settings.image_save_path.display(),
        settings.node_types,
        settings.ignore_node_name.as_deref().unwrap_or("-"),
        settings.scale,
        settings.format,
        settings.concurrency,
        settings.timeout.as_secs(),
        settings.api_base_url,
    )
}
