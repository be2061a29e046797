//! Public parameters shared by the dealer, the servers and every user.
//!
//! ```rust
//! use blsdisco::Parameters;
//!
//! // 3-of-9, the deployment used by the demo
//! let params = Parameters::new(9, 3).expect("valid params");
//! assert_eq!(params.threshold, 3);
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Largest roster a two-byte share index can address.
pub const MAX_SERVERS: usize = u16::MAX as usize;

/// How identifiers are mapped onto G2.
///
/// - `SeededPick`: the identifier seeds a pseudorandom point picker. This is
///   NOT a secure hash to curve; the discrete log of every output is public.
/// - `HashToCurve`: the `XMD:SHA-256_SSWU_RO` suite through blst.
///
/// Every party of a deployment must use the same mode, otherwise the pairings
/// of two users never agree.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum G2Hashing {
    #[default]
    SeededPick,
    HashToCurve,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    /// Number of threshold servers (n).
    pub total_servers: usize,
    /// Signature shares needed to recover a signature (t).
    pub threshold: usize,
    /// Bound on a single server exchange, in milliseconds.
    pub request_timeout_ms: u64,
    pub g2_hashing: G2Hashing,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            total_servers: 9,
            threshold: 3,
            request_timeout_ms: 2_000,
            g2_hashing: G2Hashing::default(),
        }
    }
}

impl Parameters {
    pub fn new(total_servers: usize, threshold: usize) -> Result<Self> {
        let params = Self {
            total_servers,
            threshold,
            ..Self::default()
        };
        params.validate()?;
        Ok(params)
    }

    pub fn with_g2_hashing(mut self, g2_hashing: G2Hashing) -> Self {
        self.g2_hashing = g2_hashing;
        self
    }

    /// Saturates at `u64::MAX` milliseconds.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.threshold == 0 {
            return Err(Error::InvalidConfig("threshold must be at least 1".into()));
        }
        if self.threshold > self.total_servers {
            return Err(Error::InvalidConfig(format!(
                "threshold {} exceeds the number of servers {}",
                self.threshold, self.total_servers
            )));
        }
        if self.total_servers > MAX_SERVERS {
            return Err(Error::InvalidConfig(format!(
                "at most {} servers are supported, got {}",
                MAX_SERVERS, self.total_servers
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(Error::InvalidConfig("request timeout must be positive".into()));
        }
        Ok(())
    }

    /// Loads parameters from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let params: Self = serde_json::from_str(&json)?;
        params.validate()?;
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_thresholds() {
        assert!(matches!(Parameters::new(9, 0), Err(Error::InvalidConfig(_))));
        assert!(matches!(Parameters::new(3, 4), Err(Error::InvalidConfig(_))));
        assert!(matches!(
            Parameters::new(MAX_SERVERS + 1, 3),
            Err(Error::InvalidConfig(_))
        ));
        assert!(Parameters::new(1, 1).is_ok());
    }

    #[test]
    fn request_timeout_saturates() {
        let params = Parameters::default().with_request_timeout(Duration::MAX);
        assert_eq!(params.request_timeout_ms, u64::MAX);

        let params = Parameters::default().with_request_timeout(Duration::from_millis(250));
        assert_eq!(params.request_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn loads_partial_json() -> Result<()> {
        let path = std::env::temp_dir().join(format!("blsdisco-params-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{ "total_servers": 5, "threshold": 2, "g2_hashing": "hash_to_curve" }"#,
        )?;

        let params = Parameters::from_json_file(&path);
        std::fs::remove_file(&path)?;
        let params = params?;

        assert_eq!(params.total_servers, 5);
        assert_eq!(params.threshold, 2);
        assert_eq!(params.g2_hashing, G2Hashing::HashToCurve);
        assert_eq!(params.request_timeout(), Duration::from_millis(2_000));
        Ok(())
    }

    #[test]
    fn invalid_json_file_is_rejected() -> Result<()> {
        let path = std::env::temp_dir().join(format!("blsdisco-bad-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "total_servers": 2, "threshold": 3 }"#)?;

        let result = Parameters::from_json_file(&path);
        std::fs::remove_file(&path)?;

        assert!(matches!(result, Err(Error::InvalidConfig(_))));
        Ok(())
    }
}
