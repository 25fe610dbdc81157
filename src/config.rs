//! Settings for talking to the Jazz RTC command line client.

use std::fmt;
use std::time::Duration;

/// Default bound on a single `lscm annotate` run.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_millis(60_000);

/// Executable used when nothing else is configured.
pub const DEFAULT_LSCM: &str = "lscm";

/// A password that never shows up in logs or debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(********)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("********")
    }
}

#[derive(Debug, Clone)]
pub struct BlameConfig {
    pub username: Option<String>,
    pub password: Option<Secret>,
    pub command_timeout: Duration,
    pub executable: String,
}

impl Default for BlameConfig {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            executable: DEFAULT_LSCM.to_string(),
        }
    }
}

impl BlameConfig {
    pub fn with_credentials(mut self, username: Option<String>, password: Option<String>) -> Self {
        self.username = username.filter(|u| !u.is_empty());
        self.password = password.filter(|p| !p.is_empty()).map(Secret::new);
        self
    }

    /// Zero falls back to [`DEFAULT_COMMAND_TIMEOUT`].
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.command_timeout = if timeout_ms > 0 {
            Duration::from_millis(timeout_ms)
        } else {
            DEFAULT_COMMAND_TIMEOUT
        };
        self
    }

    pub fn with_executable(mut self, executable: impl Into<String>) -> Self {
        self.executable = executable.into();
        self
    }

    /// Both a username and a password are set.
    pub fn has_credentials(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_timeout_uses_default() {
        let config = BlameConfig::default().with_timeout_ms(0);
        assert_eq!(config.command_timeout, DEFAULT_COMMAND_TIMEOUT);

        let config = BlameConfig::default().with_timeout_ms(1500);
        assert_eq!(config.command_timeout, Duration::from_millis(1500));
    }

    #[test]
    fn password_is_never_printed() {
        let config = BlameConfig::default()
            .with_credentials(Some("julien".into()), Some("hunter2".into()));
        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("julien"));
        assert_eq!(config.password.as_ref().map(Secret::expose), Some("hunter2"));
    }

    #[test]
    fn credentials_need_both_parts() {
        let config = BlameConfig::default().with_credentials(Some("julien".into()), None);
        assert!(!config.has_credentials());

        let config = BlameConfig::default().with_credentials(Some("julien".into()), Some(String::new()));
        assert!(!config.has_credentials());

        let config = BlameConfig::default().with_credentials(Some("julien".into()), Some("pw".into()));
        assert!(config.has_credentials());
    }
}
