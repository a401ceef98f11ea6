use anyhow::{Context, Result};
use hashledger_core::LedgerConfig;
use std::path::Path;

/// Defaults for new chains: the TOML file if given, then command-line overrides.
pub fn ledger_config(
    path: Option<&Path>,
    difficulty: Option<u32>,
    max_mining_attempts: Option<u64>,
) -> Result<LedgerConfig> {
    let mut config = match path {
        Some(path) => LedgerConfig::from_file(path)
            .with_context(|| format!("loading ledger config from {}", path.display()))?,
        None => LedgerConfig::default(),
    };
    if let Some(difficulty) = difficulty {
        config.difficulty = difficulty;
    }
    if max_mining_attempts.is_some() {
        config.max_mining_attempts = max_mining_attempts;
    }
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn flags_override_file() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "difficulty = 3")?;
        writeln!(file, "mining_reward = 7")?;
        let config = ledger_config(Some(file.path()), Some(1), Some(500))?;
        assert_eq!(config.difficulty, 1);
        assert_eq!(config.mining_reward, 7);
        assert_eq!(config.max_mining_attempts, Some(500));
        Ok(())
    }

    #[test]
    fn defaults_without_file() -> Result<()> {
        assert_eq!(ledger_config(None, None, None)?, LedgerConfig::default());
        Ok(())
    }

    #[test]
    fn invalid_override_is_rejected() {
        assert!(ledger_config(None, Some(99), None).is_err());
    }
}
