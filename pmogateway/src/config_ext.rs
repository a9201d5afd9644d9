//! Extension pour lire la configuration des fournisseurs amont dans pmoconfig
//!
//! Toutes les clés vivent sous `upstream` :
//!
//! ```yaml
//! upstream:
//!   provider: piped
//!   request_timeout_secs: 30
//!   piped:
//!     base_url: https://pipedapi.in.projectsegfau.lt
//!     origin: https://piped.video
//!   invidious:
//!     base_url: https://yewtu.be
//! ```
//!
//! Comme pour les autres extensions, les getters persistent la valeur par
//! défaut quand la clé est absente ou invalide.

use crate::invidious::DEFAULT_INVIDIOUS_BASE_URL;
use crate::piped::{DEFAULT_PIPED_BASE_URL, DEFAULT_PIPED_ORIGIN};
use crate::provider::{ProviderKind, ProviderSettings};
use anyhow::Result;
use pmoconfig::Config;
use serde_yaml::Value;

/// Default upstream provider
pub const DEFAULT_PROVIDER: ProviderKind = ProviderKind::Piped;

/// Default timeout for upstream HTTP requests
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Trait d'extension pour la section `upstream` de la configuration
pub trait GatewayConfigExt {
    /// Fournisseur actif (`piped` ou `invidious`)
    fn get_upstream_provider(&self) -> Result<ProviderKind>;

    fn set_upstream_provider(&self, kind: ProviderKind) -> Result<()>;

    /// URL de base de l'instance configurée pour `kind`
    fn get_upstream_base_url(&self, kind: ProviderKind) -> Result<String>;

    fn set_upstream_base_url(&self, kind: ProviderKind, base_url: &str) -> Result<()>;

    /// Valeur de l'en-tête `Origin` envoyée aux instances Piped
    fn get_piped_origin(&self) -> Result<String>;

    /// Timeout des requêtes amont (en secondes)
    fn get_upstream_request_timeout_secs(&self) -> Result<u64>;

    fn set_upstream_request_timeout_secs(&self, secs: u64) -> Result<()>;

    /// Tous les réglages nécessaires à `build_provider`
    fn get_provider_settings(&self) -> Result<ProviderSettings> {
        let kind = self.get_upstream_provider()?;
        let settings = ProviderSettings::new(kind, self.get_upstream_base_url(kind)?);
        Ok(match kind {
            ProviderKind::Piped => settings.with_origin(self.get_piped_origin()?),
            ProviderKind::Invidious => settings,
        })
    }
}

fn default_base_url(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::Piped => DEFAULT_PIPED_BASE_URL,
        ProviderKind::Invidious => DEFAULT_INVIDIOUS_BASE_URL,
    }
}

impl GatewayConfigExt for Config {
    fn get_upstream_provider(&self) -> Result<ProviderKind> {
        match self.get_value(&["upstream", "provider"]) {
            Ok(Value::String(s)) => match s.parse::<ProviderKind>() {
                Ok(kind) => Ok(kind),
                Err(e) => {
                    // Une faute de frappe ne doit pas empêcher le démarrage
                    tracing::warn!("{}, falling back to {}", e, DEFAULT_PROVIDER);
                    Ok(DEFAULT_PROVIDER)
                }
            },
            _ => {
                self.set_upstream_provider(DEFAULT_PROVIDER)?;
                Ok(DEFAULT_PROVIDER)
            }
        }
    }

    fn set_upstream_provider(&self, kind: ProviderKind) -> Result<()> {
        self.set_value(
            &["upstream", "provider"],
            Value::String(kind.as_str().to_string()),
        )
    }

    fn get_upstream_base_url(&self, kind: ProviderKind) -> Result<String> {
        self.get_string_or_init(
            &["upstream", kind.as_str(), "base_url"],
            default_base_url(kind),
        )
    }

    fn set_upstream_base_url(&self, kind: ProviderKind, base_url: &str) -> Result<()> {
        self.set_value(
            &["upstream", kind.as_str(), "base_url"],
            Value::String(base_url.to_string()),
        )
    }

    fn get_piped_origin(&self) -> Result<String> {
        self.get_string_or_init(&["upstream", "piped", "origin"], DEFAULT_PIPED_ORIGIN)
    }

    fn get_upstream_request_timeout_secs(&self) -> Result<u64> {
        match self.get_value(&["upstream", "request_timeout_secs"]) {
            Ok(Value::Number(n)) if n.as_u64().is_some_and(|secs| secs > 0) => {
                Ok(n.as_u64().unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS))
            }
            _ => {
                self.set_upstream_request_timeout_secs(DEFAULT_REQUEST_TIMEOUT_SECS)?;
                Ok(DEFAULT_REQUEST_TIMEOUT_SECS)
            }
        }
    }

    fn set_upstream_request_timeout_secs(&self, secs: u64) -> Result<()> {
        self.set_value(
            &["upstream", "request_timeout_secs"],
            Value::Number(serde_yaml::Number::from(secs)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &tempfile::TempDir) -> Config {
        Config::load_config(&dir.path().to_string_lossy()).unwrap()
    }

    #[test]
    fn test_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);

        let settings = config.get_provider_settings().unwrap();
        assert_eq!(settings.kind, ProviderKind::Piped);
        assert_eq!(settings.base_url, DEFAULT_PIPED_BASE_URL);
        assert_eq!(settings.origin.as_deref(), Some(DEFAULT_PIPED_ORIGIN));
        assert_eq!(
            config.get_upstream_request_timeout_secs().unwrap(),
            DEFAULT_REQUEST_TIMEOUT_SECS
        );
    }

    #[test]
    fn test_switch_to_invidious() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        config.set_upstream_provider(ProviderKind::Invidious).unwrap();
        config
            .set_upstream_base_url(ProviderKind::Invidious, "https://inv.example.org")
            .unwrap();

        let settings = config.get_provider_settings().unwrap();
        assert_eq!(settings.kind, ProviderKind::Invidious);
        assert_eq!(settings.base_url, "https://inv.example.org");
        assert_eq!(settings.origin, None);
    }

    #[test]
    fn test_unknown_provider_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.yaml"),
            "upstream:\n  provider: youtube\n",
        )
        .unwrap();

        let config = config_in(&dir);
        assert_eq!(config.get_upstream_provider().unwrap(), DEFAULT_PROVIDER);
    }
}
