//! Persisted cheat sheet of machine-specific facts.
//!
//! A free-form JSON object. The assistant treats it as an opaque blob that
//! can be appended to the command-generation prompt.

use anyhow::{anyhow, Context, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

const DEFAULT_CATEGORIES: [&str; 7] = [
    "installed_apps",
    "common_paths",
    "custom_aliases",
    "common_commands",
    "error_handling",
    "context_specific",
    "shortcuts",
];

const DEFAULT_FIELDS: [&str; 3] = ["os", "shell", "package_manager"];

pub struct CheatSheet {
    path: PathBuf,
    data: Map<String, Value>,
}

impl CheatSheet {
    /// Load from `path`, or start from the default layout if it does not exist.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read cheat sheet: {}", path.display()))?;
            match serde_json::from_str::<Value>(&contents)
                .with_context(|| format!("Failed to parse cheat sheet: {}", path.display()))?
            {
                Value::Object(map) => map,
                _ => return Err(anyhow!("Cheat sheet {} is not a JSON object", path.display())),
            }
        } else {
            default_data()
        };

        Ok(Self { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the sheet back as pretty-printed JSON.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(&self.data)?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write cheat sheet: {}", self.path.display()))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }

    /// Add an empty category. Returns false if the key already exists.
    pub fn add_category(&mut self, name: &str) -> bool {
        if self.data.contains_key(name) {
            return false;
        }
        self.data.insert(name.to_string(), Value::Object(Map::new()));
        true
    }

    /// The whole sheet as pretty JSON, for prompts and display.
    pub fn context_blob(&self) -> String {
        serde_json::to_string_pretty(&self.data).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Parse a value typed on the command line: JSON if it parses, else a string.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn default_data() -> Map<String, Value> {
    let mut data = Map::new();
    for field in DEFAULT_FIELDS {
        data.insert(field.to_string(), Value::String(String::new()));
    }
    for category in DEFAULT_CATEGORIES {
        data.insert(category.to_string(), Value::Object(Map::new()));
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = CheatSheet::load(dir.path().join("sheet.json")).unwrap();
        assert_eq!(sheet.get("shell"), Some(&json!("")));
        assert_eq!(sheet.get("shortcuts"), Some(&json!({})));
        assert!(sheet.get("missing").is_none());
    }

    #[test]
    fn test_set_save_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.json");

        let mut sheet = CheatSheet::load(&path).unwrap();
        sheet.set("package_manager", json!("brew"));
        assert!(sheet.add_category("favorite_directories"));
        assert!(!sheet.add_category("favorite_directories"));
        sheet.save().unwrap();

        let reloaded = CheatSheet::load(&path).unwrap();
        assert_eq!(reloaded.get("package_manager"), Some(&json!("brew")));
        assert_eq!(reloaded.get("favorite_directories"), Some(&json!({})));
    }

    #[test]
    fn test_rejects_non_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(CheatSheet::load(&path).is_err());
    }

    #[test]
    fn test_context_blob_is_json() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = CheatSheet::load(dir.path().join("s.json")).unwrap();
        let parsed: Value = serde_json::from_str(&sheet.context_blob()).unwrap();
        assert!(parsed.is_object());
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("42"), json!(42));
        assert_eq!(parse_value(r#"["a"]"#), json!(["a"]));
        assert_eq!(parse_value("zsh"), json!("zsh"));
    }
}
