//! Configuration and bootstrap.
//!
//! ```toml
//! secret_key = "change-me"
//! system_salt = "per-install-salt"
//! encrypted_prefix = "_ENC_"
//! db_driver = ["orm", "odm"]
//! ```

use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};
use crate::handler::HandlerRegistry;
use crate::interceptor::{Interceptor, Subscribers};
use crate::paradigm::Direction;
use fieldcrypt_crypto::EncryptorConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Persistence driver an engine is wired into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    /// Relational mapper.
    Orm,
    /// Document mapper.
    Odm,
}

fn all_drivers() -> Vec<Driver> {
    vec![Driver::Orm, Driver::Odm]
}

/// Top-level settings.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldCryptConfig {
    #[serde(flatten)]
    pub encryptor: EncryptorConfig,

    /// Drivers to subscribe to. Absent means all of them.
    #[serde(default = "all_drivers")]
    pub db_driver: Vec<Driver>,
}

impl FieldCryptConfig {
    pub fn new(encryptor: EncryptorConfig) -> Self {
        Self {
            encryptor,
            db_driver: all_drivers(),
        }
    }

    pub fn with_drivers(mut self, drivers: Vec<Driver>) -> Self {
        self.db_driver = drivers;
        self
    }

    /// Parses and validates TOML text.
    pub fn from_toml_str(text: &str) -> EngineResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: &Path) -> EngineResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> EngineResult<()> {
        self.encryptor
            .validate()
            .map_err(|e| EngineError::Config(e.to_string()))?;
        if self.db_driver.is_empty() {
            return Err(EngineError::Config("db_driver must name at least one driver".into()));
        }
        Ok(())
    }

    /// Builds one shared engine plus encrypt and decrypt interceptors for
    /// every configured driver.
    pub fn build(&self, handlers: HandlerRegistry) -> EngineResult<Bootstrap> {
        self.validate()?;
        let encryptor = self
            .encryptor
            .build()
            .map_err(|e| EngineError::Config(e.to_string()))?;
        let engine = Arc::new(Engine::new(Arc::new(encryptor), handlers));

        let mut subscribers = BTreeMap::new();
        for driver in &self.db_driver {
            let interceptor = |direction| match driver {
                Driver::Orm => Interceptor::relational(Arc::clone(&engine), direction),
                Driver::Odm => Interceptor::document(Arc::clone(&engine), direction),
            };
            subscribers.insert(
                *driver,
                Subscribers::new(vec![
                    interceptor(Direction::Encrypt),
                    interceptor(Direction::Decrypt),
                ]),
            );
        }

        info!(
            drivers = ?self.db_driver,
            handlers = engine.transformer().handlers().len(),
            "Field encryption engine ready"
        );
        Ok(Bootstrap {
            engine,
            subscribers,
        })
    }
}

/// The wired engine and its interceptors.
#[derive(Debug)]
pub struct Bootstrap {
    engine: Arc<Engine>,
    subscribers: BTreeMap<Driver, Subscribers>,
}

impl Bootstrap {
    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Interceptors for `driver`, if it was configured.
    pub fn subscribers(&self, driver: Driver) -> Option<&Subscribers> {
        self.subscribers.get(&driver)
    }

    pub fn drivers(&self) -> impl Iterator<Item = Driver> + '_ {
        self.subscribers.keys().copied()
    }
}
