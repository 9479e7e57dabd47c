// Configuration module
// Reads INI-style configuration files with environment variable overrides.
// Each tool owns its Config instance; there is no process-wide singleton.

use std::collections::HashMap;
use std::path::Path;

/// Configuration file parser
/// Supports INI-style files with environment variable override
#[derive(Debug, Clone, Default)]
pub struct Config {
    values: HashMap<String, String>,
    filename: String,
    env_prefix: String,
}

impl Config {
    pub fn new() -> Self {
        Config {
            values: HashMap::new(),
            filename: String::new(),
            env_prefix: String::new(),
        }
    }

    /// Build a config from in-memory text, without a backing file
    pub fn from_text(content: &str, env_prefix: &str) -> Self {
        let mut config = Config {
            env_prefix: env_prefix.to_string(),
            ..Config::new()
        };
        config.parse(content);
        config
    }

    /// Load configuration from a file
    /// env_prefix is used to check environment variables (e.g., "NavTool_")
    pub fn set_source(&mut self, filename: &str, env_prefix: &str) -> bool {
        self.filename = filename.to_string();
        self.env_prefix = env_prefix.to_string();
        self.reload()
    }

    /// Reload the configuration file
    pub fn reload(&mut self) -> bool {
        self.values.clear();

        let path = Path::new(&self.filename);
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return false,
        };

        self.parse(&content);
        true
    }

    /// Name of the file this config was loaded from (empty when in-memory)
    pub fn filename(&self) -> &str {
        &self.filename
    }

    fn parse(&mut self, content: &str) {
        for line in content.lines() {
            let trimmed = line.trim();

            // Skip empty lines and comments
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }

            // Skip section headers [Section]
            if trimmed.starts_with('[') {
                continue;
            }

            if let Some((key, value)) = trimmed.split_once('=') {
                let key = key.trim().to_string();
                let mut value = value.trim();

                if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
                    value = &value[1..value.len() - 1];
                }

                self.values.insert(key, value.to_string());
            }
        }
    }

    /// Check if a key is set
    pub fn is_set(&self, key: &str) -> bool {
        self.get_env_or_config(key).is_some()
    }

    /// Get a string value with a default
    pub fn get_string_default(&self, key: &str, default: &str) -> String {
        self.get_env_or_config(key)
            .unwrap_or_else(|| default.to_string())
    }

    /// Get a string value (empty string default)
    pub fn get_string(&self, key: &str) -> String {
        self.get_string_default(key, "")
    }

    /// Get a boolean value with a default
    pub fn get_bool_default(&self, key: &str, default: bool) -> bool {
        match self.get_env_or_config(key) {
            Some(val) => {
                let lower = val.to_lowercase();
                matches!(lower.as_str(), "1" | "true" | "yes")
            }
            None => default,
        }
    }

    /// Get an integer value with a default
    pub fn get_int_default(&self, key: &str, default: i32) -> i32 {
        match self.get_env_or_config(key) {
            Some(val) => val.parse().unwrap_or(default),
            None => default,
        }
    }

    /// Get an unsigned value with a default; negative or malformed values fall back
    pub fn get_uint_default(&self, key: &str, default: u32) -> u32 {
        match self.get_env_or_config(key) {
            Some(val) => val.parse().unwrap_or(default),
            None => default,
        }
    }

    /// Get a float value with a default
    pub fn get_float_default(&self, key: &str, default: f32) -> f32 {
        match self.get_env_or_config(key) {
            Some(val) => val.parse().unwrap_or(default),
            None => default,
        }
    }

    /// Try environment variable first, then config file
    fn get_env_or_config(&self, key: &str) -> Option<String> {
        // Convert key to env var name: replace '.' with '_', add prefix
        if !self.env_prefix.is_empty() {
            let env_key = format!("{}{}", self.env_prefix, key.replace('.', "_"));
            if let Ok(val) = std::env::var(&env_key) {
                return Some(val);
            }
        }

        self.values.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::new();
        assert_eq!(config.get_int_default("nonexistent", 42), 42);
        assert_eq!(config.get_string_default("nonexistent", "hello"), "hello");
        assert!(config.get_bool_default("nonexistent", true));
    }

    #[test]
    fn test_parse_text() {
        let config = Config::from_text(
            "# navmesh\n[NavMesh]\nNavMesh.CellSize = 0.25\nNavMesh.TileSize=40\n; old\nLogsDir = \"logs\"\nbogus line\n",
            "",
        );
        assert_eq!(config.get_float_default("NavMesh.CellSize", 1.0), 0.25);
        assert_eq!(config.get_uint_default("NavMesh.TileSize", 25), 40);
        assert_eq!(config.get_string("LogsDir"), "logs");
        assert!(!config.is_set("bogus line"));
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let config = Config::from_text("A = abc\nB = -3\n", "");
        assert_eq!(config.get_float_default("A", 1.5), 1.5);
        assert_eq!(config.get_uint_default("B", 7), 7);
        assert_eq!(config.get_int_default("B", 7), -3);
    }

    #[test]
    fn test_env_override() {
        // Unique prefix so parallel tests never observe this variable
        let prefix = "NavViewConfigTest_";
        unsafe { std::env::set_var("NavViewConfigTest_NavMesh_TileSize", "12") };
        let config = Config::from_text("NavMesh.TileSize = 30\n", prefix);
        assert_eq!(config.get_uint_default("NavMesh.TileSize", 25), 12);
        unsafe { std::env::remove_var("NavViewConfigTest_NavMesh_TileSize") };
    }

    #[test]
    fn test_set_source_and_reload() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "LogLevel = 3").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let mut config = Config::new();
        assert!(config.set_source(&path, ""));
        assert_eq!(config.get_int_default("LogLevel", 2), 3);
        assert_eq!(config.filename(), path);

        assert!(!config.set_source("/nonexistent/navtool.conf", ""));
        assert!(!config.is_set("LogLevel"));
    }
}
