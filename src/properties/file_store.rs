use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use log::debug;

use super::PropertyStore;

/// Property store backed by a `key=value` file in build.prop syntax.
///
/// Every read re-parses the file so values written by another process are
/// picked up. `set` rewrites the whole file; comments are not preserved.
#[derive(Debug)]
pub struct FilePropertyStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FilePropertyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(&self.path)
            .context(format!("Failed to read property file: {}", self.path.display()))?;

        Ok(parse_properties(&content))
    }
}

/// Parse build.prop style content. Later assignments override earlier ones.
pub fn parse_properties(content: &str) -> BTreeMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

impl PropertyStore for FilePropertyStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.load() {
            Ok(values) => values.get(key).cloned(),
            Err(e) => {
                debug!("{:#}", e);
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| anyhow!("Property file lock poisoned"))?;

        let mut values = self.load()?;
        values.insert(key.to_string(), value.to_string());

        let rendered: String = values
            .iter()
            .map(|(k, v)| format!("{}={}\n", k, v))
            .collect();

        fs::write(&self.path, rendered)
            .context(format!("Failed to write property file: {}", self.path.display()))?;

        debug!("Set property {}={}", key, value);
        Ok(())
    }
}
