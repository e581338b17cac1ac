use serde::Deserialize;

use crate::code::{CodeFormat, DEFAULT_PREFIX, DEFAULT_WIDTH};
use crate::error::CatalogError;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Settings for a [`Catalog`](crate::Catalog).
///
/// Built in code with the `with_*` methods, or deserialized from JSON where
/// every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Code prefix, e.g. `PRD`.
    pub prefix: String,
    /// Zero-pad width of the numeric part.
    pub width: usize,
    /// How many times creation recomputes a code after losing a race.
    pub max_attempts: u32,
    /// Serialize allocate-then-insert within this process.
    pub serialize_allocations: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            prefix: DEFAULT_PREFIX.to_string(),
            width: DEFAULT_WIDTH,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            serialize_allocations: true,
        }
    }
}

impl CatalogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON document, then validate it.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let config: CatalogConfig =
            serde_json::from_str(json).map_err(|e| CatalogError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_serialized_allocations(mut self, serialize: bool) -> Self {
        self.serialize_allocations = serialize;
        self
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        let prefix = self.prefix.trim();
        if prefix.is_empty() {
            return Err(CatalogError::Config("prefix must not be empty".into()));
        }
        // A trailing digit would be indistinguishable from the number.
        if prefix.ends_with(|c: char| c.is_ascii_digit()) {
            return Err(CatalogError::Config(format!(
                "prefix {:?} must not end with a digit",
                prefix
            )));
        }
        if self.width == 0 {
            return Err(CatalogError::Config("width must be at least 1".into()));
        }
        if self.max_attempts == 0 {
            return Err(CatalogError::Config("max_attempts must be at least 1".into()));
        }
        Ok(())
    }

    pub fn codec(&self) -> CodeFormat {
        CodeFormat::new(&self.prefix, self.width)
    }
}
