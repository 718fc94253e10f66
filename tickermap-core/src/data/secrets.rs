use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SecretError {
    #[error("secret '{name}' not found (expected environment variable {env_var})")]
    NotFound { name: String, env_var: String },
}

/// Named secrets (API tokens).
pub trait SecretSource {
    fn get_secret_value(&self, name: &str) -> Result<String, SecretError>;
}

/// Secrets from environment variables: `slack-token-alert-bot` is read from
/// `SLACK_TOKEN_ALERT_BOT`.
pub struct EnvSecrets;

impl EnvSecrets {
    pub fn env_var_name(name: &str) -> String {
        name.chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
            .collect()
    }
}

impl SecretSource for EnvSecrets {
    fn get_secret_value(&self, name: &str) -> Result<String, SecretError> {
        let env_var = Self::env_var_name(name);
        match std::env::var(&env_var) {
            Ok(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
            _ => Err(SecretError::NotFound {
                name: name.to_string(),
                env_var,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_var_naming() {
        assert_eq!(EnvSecrets::env_var_name("slack-token-alert-bot"), "SLACK_TOKEN_ALERT_BOT");
        assert_eq!(EnvSecrets::env_var_name("eodhd.api"), "EODHD_API");
    }

    #[test]
    fn missing_secret_names_the_variable() {
        let err = EnvSecrets
            .get_secret_value("tickermap-test-secret-that-is-never-set")
            .unwrap_err();
        assert_eq!(
            err,
            SecretError::NotFound {
                name: "tickermap-test-secret-that-is-never-set".into(),
                env_var: "TICKERMAP_TEST_SECRET_THAT_IS_NEVER_SET".into(),
            }
        );
    }
}
