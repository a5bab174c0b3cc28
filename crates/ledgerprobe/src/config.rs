//! Engine configuration.
//!
//! Loaded from YAML; every field has a default matching the timing the
//! XYZ Bank demo needs. Environment overrides are applied last.

use crate::app::AppProfile;
use crate::browser::BrowserConfig;
use crate::result::{ProbeError, ProbeResult};
use crate::session::Timeouts;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable forcing headless mode
pub const HEADLESS_ENV: &str = "LEDGERPROBE_HEADLESS";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Element readiness timeout
    pub element_timeout_ms: u64,
    /// Dialog probe timeout after submit
    pub dialog_timeout_ms: u64,
    /// Settle time before reading inline validation
    pub inline_settle_ms: u64,
    /// Wait used when an element's absence is the expected answer
    pub absence_probe_ms: u64,
    /// Interval of time-bounded polls
    pub poll_interval_ms: u64,
    /// Cross-view fetches per verification
    pub verification_attempts: u32,
    /// Pause between cross-view fetches
    pub verification_interval_ms: u64,
    /// Where snapshots are written (none = keep references only)
    pub artifacts_dir: Option<PathBuf>,
    /// Browser launch options
    pub browser: BrowserConfig,
    /// Application under test
    pub app: AppProfile,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            element_timeout_ms: 10_000,
            dialog_timeout_ms: 5_000,
            inline_settle_ms: 1_000,
            absence_probe_ms: 2_000,
            poll_interval_ms: 250,
            verification_attempts: 3,
            verification_interval_ms: 1_000,
            artifacts_dir: None,
            browser: BrowserConfig::default(),
            app: AppProfile::default(),
        }
    }
}

impl ProbeConfig {
    /// Parse YAML text
    pub fn from_yaml(yaml: &str) -> ProbeResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a YAML file
    pub fn load(path: &Path) -> ProbeResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ProbeError::configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml(&text)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> ProbeResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Apply `CI` / `LEDGERPROBE_HEADLESS`
    #[must_use]
    pub fn apply_env(self) -> Self {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply environment overrides from an arbitrary lookup
    #[must_use]
    pub fn apply_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let truthy = |v: Option<String>| {
            v.is_some_and(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        };
        if truthy(lookup("CI")) || truthy(lookup(HEADLESS_ENV)) {
            self.browser.headless = true;
        }
        self
    }

    /// Reject values that would make every wait meaningless
    pub fn validate(&self) -> ProbeResult<()> {
        if self.element_timeout_ms == 0 {
            return Err(ProbeError::configuration("element_timeout_ms must be > 0"));
        }
        if self.verification_attempts == 0 {
            return Err(ProbeError::configuration("verification_attempts must be >= 1"));
        }
        if self.app.signals.account_number_delimiter.is_empty() {
            return Err(ProbeError::configuration(
                "signals.account_number_delimiter must not be empty",
            ));
        }
        Ok(())
    }

    /// Session timeouts
    #[must_use]
    pub const fn timeouts(&self) -> Timeouts {
        Timeouts {
            element: Duration::from_millis(self.element_timeout_ms),
            dialog: Duration::from_millis(self.dialog_timeout_ms),
            inline_settle: Duration::from_millis(self.inline_settle_ms),
            absence_probe: Duration::from_millis(self.absence_probe_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }

    /// Pause between cross-view fetches
    #[must_use]
    pub const fn verification_interval(&self) -> Duration {
        Duration::from_millis(self.verification_interval_ms)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = ProbeConfig::default();
        assert_eq!(c.timeouts(), Timeouts::default());
        assert_eq!(c.verification_attempts, 3);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml() {
        let c = ProbeConfig::from_yaml("dialog_timeout_ms: 800\nbrowser:\n  headless: false\n").unwrap();
        assert_eq!(c.timeouts().dialog, Duration::from_millis(800));
        assert!(!c.browser.headless);
        assert_eq!(c.element_timeout_ms, 10_000);
    }

    #[test]
    fn test_invalid_attempts_rejected() {
        let err = ProbeConfig::from_yaml("verification_attempts: 0").unwrap_err();
        assert!(matches!(err, ProbeError::Configuration { .. }));
    }

    #[test]
    fn test_env_ci_forces_headless() {
        let mut c = ProbeConfig::default();
        c.browser.headless = false;
        let c = c.apply_env_from(|k| (k == "CI").then(|| "true".to_string()));
        assert!(c.browser.headless);
    }

    #[test]
    fn test_env_ci_false_keeps_headed() {
        let mut c = ProbeConfig::default();
        c.browser.headless = false;
        let c = c.apply_env_from(|k| (k == "CI").then(|| "false".to_string()));
        assert!(!c.browser.headless);
    }

    #[test]
    fn test_env_headless_flag_values() {
        let mut base = ProbeConfig::default();
        base.browser.headless = false;
        let on = base
            .clone()
            .apply_env_from(|k| (k == HEADLESS_ENV).then(|| "TRUE".to_string()));
        assert!(on.browser.headless);
        let off = base.apply_env_from(|k| (k == HEADLESS_ENV).then(|| "0".to_string()));
        assert!(!off.browser.headless);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probe.yaml");
        std::fs::write(&path, ProbeConfig::default().to_yaml().unwrap()).unwrap();
        assert_eq!(ProbeConfig::load(&path).unwrap(), ProbeConfig::default());
        assert!(ProbeConfig::load(&dir.path().join("missing.yaml")).is_err());
    }
}
