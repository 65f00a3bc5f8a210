use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Trello API credentials, constructed once at startup and passed by value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub app_key: String,
    pub token: String,
}

impl Credentials {
    /// Load credentials, in precedence order: environment variables, the
    /// TOML credentials file, then a one-time interactive bootstrap that
    /// persists the file for later unattended runs.
    pub fn obtain(path: &Path) -> Result<Self> {
        if let (Ok(app_key), Ok(token)) = (
            std::env::var("TRELLO_APP_KEY"),
            std::env::var("TRELLO_TOKEN"),
        ) {
            return Ok(Self { app_key, token });
        }

        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            return toml::from_str(&content)
                .with_context(|| format!("Malformed credentials file {}", path.display()));
        }

        Self::bootstrap(path)
    }

    fn bootstrap(path: &Path) -> Result<Self> {
        let app_key = prompt("Enter Trello app key (see https://trello.com/app-key): ")?;

        println!("Open the following URL in your browser and approve access:");
        println!("{}", token_url(&app_key));
        let token = prompt("Enter the generated token: ")?;

        let credentials = Self { app_key, token };
        let content =
            toml::to_string_pretty(&credentials).context("Failed to serialize credentials")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!("Saved Trello credentials to {}", path.display());

        Ok(credentials)
    }
}

fn token_url(app_key: &str) -> String {
    format!(
        "https://trello.com/1/authorize?key={app_key}&name=trello-sync\
         &expiration=never&response_type=token&scope=read,write"
    )
}

fn prompt(message: &str) -> Result<String> {
    print!("{message}");
    std::io::stdout().flush().context("Failed to flush stdout")?;
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_url_carries_key_and_scopes() {
        let url = token_url("abc123");
        assert!(url.starts_with("https://trello.com/1/authorize?key=abc123"));
        assert!(url.contains("scope=read,write"));
        assert!(url.contains("expiration=never"));
    }
}
