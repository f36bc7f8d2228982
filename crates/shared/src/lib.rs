pub mod chat;
pub mod errors;

pub mod settings {
    use serde::{Deserialize, Serialize};
    use std::env;
    use std::path::Path;

    pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-pro-preview";
    pub const DEFAULT_THINKING_BUDGET: u32 = 32768;

    fn default_timeout_secs() -> u64 {
        120
    }

    fn default_max_retries() -> u32 {
        1
    }

    fn default_thinking_budget() -> u32 {
        DEFAULT_THINKING_BUDGET
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct ProviderAuth {
        pub api_key: Option<String>,
    }

    impl ProviderAuth {
        /// Configured key, then `GEMINI_API_KEY`, then `API_KEY`.
        pub fn resolve_api_key(&self) -> Option<String> {
            let usable = |k: &String| !k.trim().is_empty();
            self.api_key
                .clone()
                .filter(usable)
                .or_else(|| env::var("GEMINI_API_KEY").ok().filter(usable))
                .or_else(|| env::var("API_KEY").ok().filter(usable))
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ModelProvider {
        pub gemini_model: String, // e.g., "gemini-3-pro-preview"
        #[serde(default)]
        pub gemini_auth: ProviderAuth,
        /// Reasoning budget requested when thinking mode is on
        #[serde(default = "default_thinking_budget")]
        pub thinking_budget: u32,
        /// Output cap for regular answers; never sent together with a thinking budget
        #[serde(default)]
        pub max_output_tokens: Option<u32>,
        #[serde(default = "default_timeout_secs")]
        pub request_timeout_secs: u64,
        /// Extra attempts after a transient failure
        #[serde(default = "default_max_retries")]
        pub max_retries: u32,
    }

    impl Default for ModelProvider {
        fn default() -> Self {
            Self {
                gemini_model: DEFAULT_GEMINI_MODEL.into(),
                gemini_auth: ProviderAuth::default(),
                thinking_budget: DEFAULT_THINKING_BUDGET,
                max_output_tokens: None,
                request_timeout_secs: default_timeout_secs(),
                max_retries: default_max_retries(),
            }
        }
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct AppSettings {
        #[serde(default)]
        pub model: ModelProvider,
        #[serde(default)]
        pub dark_mode: bool,
    }

    impl AppSettings {
        /// Read settings from `path`, falling back to defaults when the file is
        /// missing or unreadable.
        pub fn load_or_default(path: &Path) -> Self {
            std::fs::read(path)
                .ok()
                .and_then(|bytes| serde_json::from_slice(&bytes).ok())
                .unwrap_or_default()
        }

        pub fn save(&self, path: &Path) -> std::io::Result<()> {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let json = serde_json::to_string_pretty(self)?;
            std::fs::write(path, json)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_missing_file_gives_defaults() {
            let dir = tempfile::tempdir().unwrap();
            let settings = AppSettings::load_or_default(&dir.path().join("nope.json"));
            assert_eq!(settings.model.gemini_model, DEFAULT_GEMINI_MODEL);
            assert_eq!(settings.model.thinking_budget, 32768);
            assert_eq!(settings.model.max_retries, 1);
            assert!(settings.model.max_output_tokens.is_none());
        }

        #[test]
        fn test_save_then_load() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("config").join("settings.json");

            let mut settings = AppSettings::default();
            settings.model.gemini_auth.api_key = Some("abc".into());
            settings.model.request_timeout_secs = 30;
            settings.dark_mode = true;
            settings.save(&path).unwrap();

            let loaded = AppSettings::load_or_default(&path);
            assert_eq!(loaded.model.gemini_auth.api_key.as_deref(), Some("abc"));
            assert_eq!(loaded.model.request_timeout_secs, 30);
            assert!(loaded.dark_mode);
        }

        #[test]
        fn test_partial_file_fills_defaults() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("settings.json");
            std::fs::write(&path, r#"{"model":{"gemini_model":"gemini-2.5-flash"}}"#).unwrap();

            let loaded = AppSettings::load_or_default(&path);
            assert_eq!(loaded.model.gemini_model, "gemini-2.5-flash");
            assert_eq!(loaded.model.request_timeout_secs, 120);
            assert!(!loaded.dark_mode);
        }

        #[test]
        fn test_configured_key_wins() {
            let auth = ProviderAuth {
                api_key: Some("from-settings".into()),
            };
            assert_eq!(auth.resolve_api_key().as_deref(), Some("from-settings"));
        }

        // The environment is process-wide, so every env-dependent case lives
        // in this one test.
        #[test]
        fn test_env_key_fallbacks() {
            let saved: Vec<_> = ["GEMINI_API_KEY", "API_KEY"]
                .iter()
                .map(|name| (*name, env::var(name).ok()))
                .collect();

            let blank = ProviderAuth {
                api_key: Some("   ".into()),
            };
            let unset = ProviderAuth::default();

            env::set_var("GEMINI_API_KEY", "gemini-env");
            env::set_var("API_KEY", "generic-env");
            assert_eq!(blank.resolve_api_key().as_deref(), Some("gemini-env"));
            assert_eq!(unset.resolve_api_key().as_deref(), Some("gemini-env"));

            env::remove_var("GEMINI_API_KEY");
            assert_eq!(blank.resolve_api_key().as_deref(), Some("generic-env"));

            env::set_var("GEMINI_API_KEY", "");
            assert_eq!(unset.resolve_api_key().as_deref(), Some("generic-env"));

            env::remove_var("GEMINI_API_KEY");
            env::remove_var("API_KEY");
            assert_eq!(blank.resolve_api_key(), None);
            assert_eq!(unset.resolve_api_key(), None);

            for (name, value) in saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }
}
