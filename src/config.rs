use crate::{align::ALIGNMENT, error::ConfigError};

/// Smallest remainder worth carving into its own free block. Anything not
/// larger than this stays attached to the allocated block.
pub const MIN_SPLIT: usize = 32;

/// Default number of payload bytes requested from the host per growth.
pub const EXPAND_UNIT: usize = 8192;

/// Tunables of a [`crate::FreeListAllocator`].
///
/// ```rust
/// use flist::Config;
///
/// let config = Config::default().with_expand_unit(4096).with_min_split(64);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
  pub min_split: usize,
  pub expand_unit: usize,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      min_split: MIN_SPLIT,
      expand_unit: EXPAND_UNIT,
    }
  }
}

impl Config {
  pub fn with_min_split(
    mut self,
    min_split: usize,
  ) -> Self {
    self.min_split = min_split;
    self
  }

  pub fn with_expand_unit(
    mut self,
    expand_unit: usize,
  ) -> Self {
    self.expand_unit = expand_unit;
    self
  }

  /// Both values feed address arithmetic, so they have to keep every header
  /// on a 16 byte boundary.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.expand_unit == 0 {
      return Err(ConfigError::ZeroExpandUnit);
    }
    if self.expand_unit % ALIGNMENT != 0 {
      return Err(ConfigError::UnalignedExpandUnit(self.expand_unit));
    }
    if self.min_split % ALIGNMENT != 0 {
      return Err(ConfigError::UnalignedMinSplit(self.min_split));
    }

    Ok(())
  }
}
