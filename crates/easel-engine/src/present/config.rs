use std::path::PathBuf;

/// Environment variable enabling per-request tracing (value starting with `prt`).
pub const ENV_VERBOSE: &str = "EASEL_VERBOSE";

/// Environment variable naming the JSON file every submitted batch is exported to.
pub const ENV_EXPORT: &str = "EASEL_EXPORT";

/// Presenter configuration.
#[derive(Debug, Clone, Default)]
pub struct PresenterConfig {
    pub diagnostics: DiagnosticsConfig,
}

impl PresenterConfig {
    /// Configuration read from the process environment.
    pub fn from_env() -> Self {
        Self {
            diagnostics: DiagnosticsConfig::from_env(),
        }
    }
}

/// Opt-in request diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticsConfig {
    /// Log every request of every submitted batch.
    pub verbose: bool,

    /// Append every submitted batch to this file (JSON lines).
    pub export_path: Option<PathBuf>,
}

impl DiagnosticsConfig {
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var(ENV_VERBOSE).ok().as_deref(),
            std::env::var_os(ENV_EXPORT).map(PathBuf::from),
        )
    }

    pub fn from_vars(verbose: Option<&str>, export_path: Option<PathBuf>) -> Self {
        Self {
            verbose: verbose.is_some_and(|v| v.starts_with("prt")),
            export_path: export_path.filter(|p| !p.as_os_str().is_empty()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.verbose || self.export_path.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_needs_prt_prefix() {
        assert!(DiagnosticsConfig::from_vars(Some("prt"), None).verbose);
        assert!(DiagnosticsConfig::from_vars(Some("prt,json"), None).verbose);
        assert!(!DiagnosticsConfig::from_vars(Some("1"), None).verbose);
        assert!(!DiagnosticsConfig::from_vars(None, None).verbose);
    }

    #[test]
    fn empty_export_path_is_ignored() {
        let cfg = DiagnosticsConfig::from_vars(None, Some(PathBuf::new()));
        assert_eq!(cfg.export_path, None);
        assert!(!cfg.is_enabled());

        let cfg = DiagnosticsConfig::from_vars(None, Some("batches.json".into()));
        assert_eq!(cfg.export_path, Some(PathBuf::from("batches.json")));
        assert!(cfg.is_enabled());
    }
}
