//! Push configuration.
//!
//! Options carry a version tag so that a caller built against a different
//! layout is refused instead of half-understood. In TOML:
//!
//! ```toml
//! version = 1
//! pb_parallelism = 4
//! report_status = true
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{PushError, PushResult};

/// The only options layout this crate understands.
pub const PUSH_OPTIONS_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PushOptions {
    pub version: u32,
    /// Worker-count hint for pack compression; `0` uses every CPU.
    pub pb_parallelism: usize,
    /// Ask the remote to report a status for each ref.
    pub report_status: bool,
}

impl Default for PushOptions {
    fn default() -> Self {
        Self {
            version: PUSH_OPTIONS_VERSION,
            pb_parallelism: 1,
            report_status: true,
        }
    }
}

impl PushOptions {
    /// Parse and validate options from TOML. Unknown keys are an error.
    pub fn from_toml_str(text: &str) -> PushResult<Self> {
        let options: Self =
            toml::from_str(text).map_err(|e| PushError::InvalidOptions(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> PushResult<()> {
        if self.version != PUSH_OPTIONS_VERSION {
            return Err(PushError::InvalidOptions(format!(
                "unsupported options version {} (expected {PUSH_OPTIONS_VERSION})",
                self.version
            )));
        }
        Ok(())
    }
}
