//! Site configuration (branding)
//!
//! The singleton row is the source of truth. A JSON copy in the data folder
//! is rewritten on every save and read when the database cannot be.

use std::fs;
use std::path::Path;
use serde::Deserialize;
use tracing::{debug, info, warn};
use crate::error::{Result, ValidationErrors};
use crate::database::{SiteConfig, SiteConfigUpdate, queries};
use super::registry::Registry;

/// Smallest logo height accepted by the settings form
pub const MIN_LOGO_HEIGHT: u32 = 20;

/// Largest logo height accepted by the settings form
pub const MAX_LOGO_HEIGHT: u32 = 200;

/// Cache file shape; every field optional, blanks fall back to defaults
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CachedSiteConfig {
    logo_url: Option<String>,
    logo_height: Option<u32>,
    login_background_url: Option<String>,
}

impl From<CachedSiteConfig> for SiteConfig {
    fn from(cached: CachedSiteConfig) -> Self {
        let defaults = SiteConfig::default();
        SiteConfig {
            logo_url: cached.logo_url.filter(|s| !s.is_empty()).unwrap_or(defaults.logo_url),
            logo_height: cached.logo_height.filter(|h| *h > 0).unwrap_or(defaults.logo_height),
            login_background_url: cached.login_background_url.unwrap_or(defaults.login_background_url),
        }
    }
}

fn read_cache(path: &Path) -> Result<Option<SiteConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(path)?;
    let cached: CachedSiteConfig = serde_json::from_str(&text)?;
    Ok(Some(cached.into()))
}

fn write_cache(path: &Path, config: &SiteConfig) -> Result<()> {
    let text = serde_json::to_string_pretty(config)?;
    fs::write(path, text)?;
    Ok(())
}

impl SiteConfigUpdate {
    pub fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(height) = self.logo_height {
            if !(MIN_LOGO_HEIGHT..=MAX_LOGO_HEIGHT).contains(&height) {
                errors.push("logo_height", format!(
                    "Chiều cao logo phải trong khoảng {} đến {} px",
                    MIN_LOGO_HEIGHT, MAX_LOGO_HEIGHT
                ));
            }
        }
        errors.into_result()
    }
}

impl Registry {
    /// Current site configuration
    ///
    /// Needs no session: the login screen shows the branding. Falls back to
    /// the local cache, then to built-in defaults.
    pub fn site_config(&self) -> SiteConfig {
        let stored = self.conn().and_then(queries::get_site_config);
        match stored {
            Ok(Some(config)) => return config,
            Ok(None) => debug!("no site config row"),
            Err(e) => warn!(error = %e, "site config unavailable, using local cache"),
        }

        let cache_path = self.config.site_config_cache_path();
        match read_cache(&cache_path) {
            Ok(Some(config)) => config,
            Ok(None) => SiteConfig::default(),
            Err(e) => {
                warn!(path = %cache_path.display(), error = %e, "unreadable site config cache");
                SiteConfig::default()
            }
        }
    }

    /// Merge a partial update into the site configuration (admin only)
    pub fn save_site_config(&mut self, update: SiteConfigUpdate) -> Result<SiteConfig> {
        self.ensure_admin()?;
        update.validate()?;

        let config = self.site_config().merged(&update);
        queries::upsert_site_config(self.conn()?, &config)?;
        info!("saved site config");

        let cache_path = self.config.site_config_cache_path();
        if let Err(e) = write_cache(&cache_path, &config) {
            warn!(path = %cache_path.display(), error = %e, "could not write site config cache");
        }
        Ok(config)
    }

    /// Restore the default logo and its height (admin only)
    pub fn reset_logo(&mut self) -> Result<SiteConfig> {
        let defaults = SiteConfig::default();
        self.save_site_config(SiteConfigUpdate {
            logo_url: Some(defaults.logo_url),
            logo_height: Some(defaults.logo_height),
            login_background_url: None,
        })
    }

    /// Remove the login background (admin only)
    pub fn reset_background(&mut self) -> Result<SiteConfig> {
        self.save_site_config(SiteConfigUpdate {
            login_background_url: Some(String::new()),
            ..Default::default()
        })
    }
}
