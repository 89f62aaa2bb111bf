//! Configuration management for acton-views
//!
//! Configuration is loaded from multiple sources with clear precedence:
//!
//! 1. Environment variables (highest priority, `ACTON_` prefix, `__` for nesting)
//! 2. `./config.toml` (development)
//! 3. `~/.config/acton-views/{service}/config.toml` (user config, XDG)
//! 4. `/etc/acton-views/{service}/config.toml` (system config)
//! 5. Hardcoded defaults (fallback)
//!
//! Environment variable format: `ACTON_SECTION__FIELD_NAME`, for example
//! `ACTON_VIEWS__ENVIRONMENT=dev`.
//!
//! # Example Configuration
//!
//! ```toml
//! # config.toml
//! [views]
//! environment = "dev"
//! template_dirs = ["./templates"]
//! webapp_dir = "./WEB-INF"
//! ```
//!
//! # Usage
//!
//! ```rust
//! use acton_views::config::{AppEnvironment, ViewsConfig};
//!
//! let config = ViewsConfig::default();
//! assert_eq!(config.views.environment, AppEnvironment::Production);
//! ```

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::engine::{CacheMode, TemplateSource};

/// Deployment environment the application runs in
///
/// Only `dev` (in any case) selects development; every other name, such as
/// `staging` or `test`, behaves like production.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum AppEnvironment {
    /// Local development: templates are re-read on every render
    Dev,
    /// Any other environment: compiled templates are cached
    #[default]
    Production,
}

impl From<String> for AppEnvironment {
    fn from(name: String) -> Self {
        if name.trim().eq_ignore_ascii_case("dev") {
            Self::Dev
        } else {
            Self::Production
        }
    }
}

/// Template view settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewsSettings {
    /// Deployment environment, read once at startup
    pub environment: AppEnvironment,

    /// Directories searched for templates, in order
    pub template_dirs: Vec<PathBuf>,

    /// Webapp directory searched after `template_dirs`
    pub webapp_dir: Option<PathBuf>,
}

impl Default for ViewsSettings {
    fn default() -> Self {
        Self {
            environment: AppEnvironment::Production,
            template_dirs: vec![PathBuf::from("./templates")],
            webapp_dir: None,
        }
    }
}

impl ViewsSettings {
    /// Cache mode implied by the environment
    #[must_use]
    pub const fn cache_mode(&self) -> CacheMode {
        CacheMode::for_environment(self.environment)
    }

    /// Directory template sources, in search order
    #[must_use]
    pub fn directory_sources(&self) -> Vec<TemplateSource> {
        self.template_dirs
            .iter()
            .chain(self.webapp_dir.as_ref())
            .map(TemplateSource::directory)
            .collect()
    }
}

/// Complete acton-views configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewsConfig {
    /// Template view settings
    #[serde(default)]
    pub views: ViewsSettings,
}

impl ViewsConfig {
    /// Load configuration for a specific service
    ///
    /// Searches for configuration in XDG-compliant locations with precedence:
    /// 1. Environment variables (`ACTON_*`, use `__` for nesting)
    /// 2. `./config.toml`
    /// 3. `~/.config/acton-views/{service_name}/config.toml`
    /// 4. `/etc/acton-views/{service_name}/config.toml`
    /// 5. Defaults
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Default configuration cannot be serialized to TOML
    /// - A configuration file cannot be read or parsed
    /// - Configuration values fail type conversion
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use acton_views::config::ViewsConfig;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let config = ViewsConfig::load_for_service("my-app")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn load_for_service(service_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::new()
            // 5. Start with defaults (lowest priority)
            .merge(Toml::string(&toml::to_string(&Self::default())?));

        // 4. System config: /etc/acton-views/{service_name}/config.toml
        let system_config = PathBuf::from("/etc/acton-views")
            .join(service_name)
            .join("config.toml");
        if system_config.exists() {
            figment = figment.merge(Toml::file(&system_config));
        }

        // 3. User config: ~/.config/acton-views/{service_name}/config.toml
        let user_config = Self::recommended_path(service_name);
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }

        // 2. Local config: ./config.toml
        let local_config = PathBuf::from("./config.toml");
        if local_config.exists() {
            figment = figment.merge(Toml::file(&local_config));
        }

        // 1. Environment variables (highest priority, double underscore for nesting)
        figment = figment.merge(Env::prefixed("ACTON_").split("__").lowercase(true));

        let config = figment.extract()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    ///
    /// A missing file is not an error; defaults and environment variables
    /// still apply.
    ///
    /// # Errors
    ///
    /// Returns an error if the file contains invalid TOML or values of the
    /// wrong type.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use acton_views::config::ViewsConfig;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let config = ViewsConfig::load_from("./config/production.toml")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn load_from(path: &str) -> anyhow::Result<Self> {
        let config = Figment::new()
            .merge(Toml::string(&toml::to_string(&Self::default())?))
            .merge(Toml::file(path))
            .merge(Env::prefixed("ACTON_").split("__").lowercase(true))
            .extract()?;

        Ok(config)
    }

    /// Get the recommended XDG config path for a service
    ///
    /// ```rust
    /// use acton_views::config::ViewsConfig;
    ///
    /// let path = ViewsConfig::recommended_path("my-app");
    /// assert!(path.ends_with("config.toml"));
    /// ```
    #[must_use]
    pub fn recommended_path(service_name: &str) -> PathBuf {
        dirs::config_dir().map_or_else(
            || PathBuf::from("./config.toml"),
            |config_dir| {
                config_dir
                    .join("acton-views")
                    .join(service_name)
                    .join("config.toml")
            },
        )
    }
}
