/// Emitter bindings — logical emitter names to physical output paths.
///
/// Bindings only affect reporting; scheduling never consults them.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum BindingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Lookup from an emitter name to the physical output it drives.
pub trait EmitterResolver {
    fn resolve(&self, emitter: &str) -> Option<&str>;
}

/// Bindings loaded from a JSON object of `{ "emitter": "path" }` pairs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmitterBindings {
    bindings: FxHashMap<String, String>,
}

impl EmitterBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, emitter: &str, path: &str) {
        self.bindings.insert(emitter.to_string(), path.to_string());
    }

    /// Load bindings from a JSON file. A leading byte-order mark is ignored.
    pub fn load_from_json(path: &Path) -> Result<EmitterBindings, BindingError> {
        let contents = std::fs::read_to_string(path)?;
        let bindings = Self::parse_json(&contents)?;
        info!(path = %path.display(), bindings = bindings.len(), "emitter bindings loaded");
        Ok(bindings)
    }

    pub fn parse_json(input: &str) -> Result<EmitterBindings, BindingError> {
        let input = input.strip_prefix('\u{feff}').unwrap_or(input);
        Ok(serde_json::from_str(input)?)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Emitter names, sorted.
    pub fn emitters(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.bindings.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl EmitterResolver for EmitterBindings {
    fn resolve(&self, emitter: &str) -> Option<&str> {
        self.bindings.get(emitter).map(String::as_str)
    }
}

/// Final segment of a physical path, split on either separator.
pub fn display_name(path: &str) -> &str {
    path.rsplit(['\\', '/']).next().unwrap_or(path)
}
