use crate::*;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument};

#[instrument(skip(path))]
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<StratifyConfig> {
    let path = path.as_ref();
    info!("Loading configuration from: {:?}", path);

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    debug!("Config file content length: {} bytes", content.len());
    parse_config(&content)
}

/// Parse configuration from YAML text, substituting environment variables first
pub fn parse_config(content: &str) -> Result<StratifyConfig> {
    let substituted = substitution::substitute_env_vars(content)?;
    debug!("Environment variable substitution completed");

    // An empty document yields every section at its defaults
    if substituted.trim().is_empty() {
        return Ok(StratifyConfig::default());
    }

    let config: StratifyConfig = serde_yaml::from_str(&substituted)
        .with_context(|| "Failed to parse YAML configuration")?;

    info!("Configuration loaded successfully");
    Ok(config)
}

#[instrument]
pub fn generate_default_config() -> StratifyConfig {
    StratifyConfig {
        provider: ProviderConfig {
            kind: ProviderKind::Yahoo,
            ..ProviderConfig::default()
        },
        ..StratifyConfig::default()
    }
}

#[instrument]
pub fn save_config<P: AsRef<Path> + std::fmt::Debug>(config: &StratifyConfig, path: P) -> Result<()> {
    let path = path.as_ref();
    info!("Saving configuration to: {:?}", path);

    let yaml = serde_yaml::to_string(config)
        .with_context(|| "Failed to serialize configuration to YAML")?;

    fs::write(path, yaml)
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    info!("Configuration saved successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = parse_config("").unwrap();
        assert_eq!(config.engine.max_days, 21);
        assert_eq!(config.scoring.roi_scale, 1.5);
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("stratify-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("stratify.yaml");

        let mut config = generate_default_config();
        config.engine.top_n = 7;
        save_config(&config, &path).unwrap();

        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.engine.top_n, 7);
        assert_eq!(loaded.provider.kind, ProviderKind::Yahoo);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = load_config("/definitely/not/here.yaml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
