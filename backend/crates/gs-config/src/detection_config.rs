use crate::{
    ConfigError, ConfigErrorResult, DEFAULT_DETECTION_ENABLED,
    DEFAULT_DETECTION_POLL_INTERVAL_SECS, DEFAULT_DETECTION_SIGNATURE,
};

use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Start the server when a client connection attempt is sniffed
    pub enabled: bool,
    /// Hex-encoded byte prefix of a client's first packet (whitespace allowed).
    /// Empty matches every datagram.
    pub signature: String,
    /// Receive timeout between cancellation checks
    pub poll_interval_secs: u64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            enabled: DEFAULT_DETECTION_ENABLED,
            signature: String::from(DEFAULT_DETECTION_SIGNATURE),
            poll_interval_secs: DEFAULT_DETECTION_POLL_INTERVAL_SECS,
        }
    }
}

impl DetectionConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::detection(
                "detection.poll_interval_secs must be > 0",
            ));
        }

        self.signature_bytes()?;

        Ok(())
    }

    /// Decode the configured signature, e.g. `"00 0a FF"` -> `[0x00, 0x0a, 0xff]`.
    pub fn signature_bytes(&self) -> ConfigErrorResult<Vec<u8>> {
        let digits: Vec<char> = self
            .signature
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        if digits.len() % 2 != 0 {
            return Err(ConfigError::detection(format!(
                "detection.signature must contain whole bytes, got {} hex digits",
                digits.len()
            )));
        }

        digits
            .chunks(2)
            .map(|pair| {
                let byte: String = pair.iter().collect();
                u8::from_str_radix(&byte, 16).map_err(|_| {
                    ConfigError::detection(format!(
                        "detection.signature contains invalid hex byte '{byte}'"
                    ))
                })
            })
            .collect()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
