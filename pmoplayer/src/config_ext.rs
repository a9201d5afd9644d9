//! Extension pour lire la configuration du lecteur dans pmoconfig
//!
//! ```yaml
//! player:
//!   proxy_url: http://localhost:8080
//!   max_consecutive_skips: 25   # sauts après échec, 0 = pas de limite
//!   allowed_containers:
//!     - mp4
//! ```

use crate::controller::{DEFAULT_MAX_CONSECUTIVE_SKIPS, PlayerSettings};
use crate::resolver::DEFAULT_ALLOWED_CONTAINERS;
use anyhow::Result;
use pmoconfig::Config;
use serde_yaml::Value;

/// Default proxy location (the PMOTube server itself)
pub const DEFAULT_PROXY_URL: &str = "http://localhost:8080";

/// Trait d'extension pour la section `player` de la configuration
///
/// Les getters persistent la valeur par défaut si la clé est absente ou
/// invalide.
pub trait PlayerConfigExt {
    /// URL de base du proxy (sans `/api/proxy`)
    fn get_player_proxy_url(&self) -> Result<String>;

    fn set_player_proxy_url(&self, url: &str) -> Result<()>;

    fn get_max_consecutive_skips(&self) -> Result<u32>;

    fn set_max_consecutive_skips(&self, max: u32) -> Result<()>;

    /// Conteneurs acceptés, en minuscules
    fn get_allowed_containers(&self) -> Result<Vec<String>>;

    fn set_allowed_containers(&self, containers: &[String]) -> Result<()>;

    fn get_player_settings(&self) -> Result<PlayerSettings> {
        Ok(PlayerSettings {
            allowed_containers: self.get_allowed_containers()?,
            max_consecutive_skips: self.get_max_consecutive_skips()?,
        })
    }
}

impl PlayerConfigExt for Config {
    fn get_player_proxy_url(&self) -> Result<String> {
        self.get_string_or_init(&["player", "proxy_url"], DEFAULT_PROXY_URL)
    }

    fn set_player_proxy_url(&self, url: &str) -> Result<()> {
        self.set_value(&["player", "proxy_url"], Value::String(url.to_string()))
    }

    fn get_max_consecutive_skips(&self) -> Result<u32> {
        match self.get_value(&["player", "max_consecutive_skips"]) {
            Ok(Value::Number(n)) if n.as_u64().is_some_and(|v| v <= u32::MAX as u64) => {
                Ok(n.as_u64().unwrap_or_default() as u32)
            }
            _ => {
                self.set_max_consecutive_skips(DEFAULT_MAX_CONSECUTIVE_SKIPS)?;
                Ok(DEFAULT_MAX_CONSECUTIVE_SKIPS)
            }
        }
    }

    fn set_max_consecutive_skips(&self, max: u32) -> Result<()> {
        self.set_value(
            &["player", "max_consecutive_skips"],
            Value::Number(serde_yaml::Number::from(max)),
        )
    }

    fn get_allowed_containers(&self) -> Result<Vec<String>> {
        let containers: Vec<String> = match self.get_value(&["player", "allowed_containers"]) {
            Ok(Value::Sequence(seq)) => seq
                .iter()
                .filter_map(Value::as_str)
                .map(|c| c.trim().to_ascii_lowercase())
                .filter(|c| !c.is_empty())
                .collect(),
            _ => Vec::new(),
        };

        if containers.is_empty() {
            let defaults: Vec<String> = DEFAULT_ALLOWED_CONTAINERS
                .iter()
                .map(|c| c.to_string())
                .collect();
            self.set_allowed_containers(&defaults)?;
            return Ok(defaults);
        }
        Ok(containers)
    }

    fn set_allowed_containers(&self, containers: &[String]) -> Result<()> {
        let seq = containers
            .iter()
            .map(|c| Value::String(c.clone()))
            .collect();
        self.set_value(&["player", "allowed_containers"], Value::Sequence(seq))
    }
}
