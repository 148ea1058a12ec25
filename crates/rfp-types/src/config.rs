//! Engine configuration, fixed for the lifetime of an engine instance.

use serde::{Deserialize, Serialize};

use crate::{Address, RfpError, constants};

/// Construction-time configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Address under which the engine holds escrowed funds on the ledger.
    pub custody: Address,
    /// Address of the fungible-token ledger.
    pub token_ledger: Address,
    /// Address of the external proposal factory.
    pub factory: Address,
    /// Minimum lead time between RFP creation and expiry, in heights.
    #[serde(default = "default_min_duration")]
    pub min_duration: u64,
}

fn default_min_duration() -> u64 {
    constants::DEFAULT_MIN_DURATION
}

impl EngineConfig {
    /// Config with the default `min_duration`.
    #[must_use]
    pub fn new(custody: Address, token_ledger: Address, factory: Address) -> Self {
        Self {
            custody,
            token_ledger,
            factory,
            min_duration: constants::DEFAULT_MIN_DURATION,
        }
    }

    #[must_use]
    pub fn with_min_duration(mut self, min_duration: u64) -> Self {
        self.min_duration = min_duration;
        self
    }

    /// Parse and validate a JSON config document.
    ///
    /// # Errors
    /// `Serialization` for malformed JSON, `Configuration` for invalid values.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// Returns [`RfpError::Configuration`] describing the first problem.
    pub fn validate(&self) -> crate::Result<()> {
        if self.min_duration == 0 {
            return Err(RfpError::Configuration("min_duration must be > 0".into()));
        }
        let addresses = [
            ("custody", self.custody),
            ("token_ledger", self.token_ledger),
            ("factory", self.factory),
        ];
        for (name, addr) in addresses {
            if addr == Address::ZERO {
                return Err(RfpError::Configuration(format!("{name} address is zero")));
            }
        }
        if self.custody == self.token_ledger
            || self.custody == self.factory
            || self.token_ledger == self.factory
        {
            return Err(RfpError::Configuration(
                "custody, token_ledger and factory must be distinct".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EngineConfig {
        EngineConfig::new(Address::random(), Address::random(), Address::random())
    }

    #[test]
    fn defaults_validate() {
        let cfg = config();
        assert_eq!(cfg.min_duration, constants::DEFAULT_MIN_DURATION);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_min_duration_rejected() {
        let err = config().with_min_duration(0).validate().unwrap_err();
        assert!(matches!(err, RfpError::Configuration(_)));
    }

    #[test]
    fn shared_addresses_rejected() {
        let mut cfg = config();
        cfg.factory = cfg.custody;
        assert!(cfg.validate().is_err());

        let mut cfg = config();
        cfg.token_ledger = Address::ZERO;
        assert!(cfg.validate().unwrap_err().to_string().contains("token_ledger"));
    }

    #[test]
    fn from_json_applies_default_duration() {
        let cfg = config();
        let json = format!(
            r#"{{"custody":"{}","token_ledger":"{}","factory":"{}"}}"#,
            cfg.custody, cfg.token_ledger, cfg.factory
        );
        let parsed = EngineConfig::from_json(&json).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn from_json_rejects_garbage() {
        let err = EngineConfig::from_json("{").unwrap_err();
        assert!(matches!(err, RfpError::Serialization(_)));
    }

    #[test]
    fn serde_roundtrip() {
        let cfg = config().with_min_duration(7);
        let json = serde_json::to_string(&cfg).unwrap();
        assert_eq!(EngineConfig::from_json(&json).unwrap(), cfg);
    }
}
