//! Configuration handling: webhook endpoints, command line, remembered profile

use crate::state::DefinitionKind;
use anyhow::Result;
use clap::Parser;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_FORM_FETCH_URL: &str = "https://n8n.example.com/webhook/get-form";
pub const DEFAULT_FORM_SUBMIT_URL: &str = "https://n8n.example.com/webhook/submit-form";
pub const DEFAULT_QUIZ_FETCH_URL: &str = "https://n8n.example.com/webhook/get-quiz";
pub const DEFAULT_QUIZ_SUBMIT_URL: &str = "https://n8n.example.com/webhook/submit-quiz";

/// Fetch and submit webhook URLs for both definition kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub form_fetch: String,
    pub form_submit: String,
    pub quiz_fetch: String,
    pub quiz_submit: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            form_fetch: DEFAULT_FORM_FETCH_URL.to_string(),
            form_submit: DEFAULT_FORM_SUBMIT_URL.to_string(),
            quiz_fetch: DEFAULT_QUIZ_FETCH_URL.to_string(),
            quiz_submit: DEFAULT_QUIZ_SUBMIT_URL.to_string(),
        }
    }
}

impl Endpoints {
    pub fn fetch_url(&self, kind: DefinitionKind) -> &str {
        match kind {
            DefinitionKind::Form => &self.form_fetch,
            DefinitionKind::Quiz => &self.quiz_fetch,
        }
    }

    pub fn submit_url(&self, kind: DefinitionKind) -> &str {
        match kind {
            DefinitionKind::Form => &self.form_submit,
            DefinitionKind::Quiz => &self.quiz_submit,
        }
    }
}

/// Command line, with endpoint overrides read from the environment
#[derive(Debug, Parser)]
#[command(name = "hookform-tui", version, about)]
pub struct Cli {
    /// Form identifier to open
    #[arg(long, conflicts_with = "quiz")]
    pub form: Option<String>,

    /// Quiz identifier to open
    #[arg(long)]
    pub quiz: Option<String>,

    #[arg(long, env = "HOOKFORM_FORM_FETCH_URL", default_value = DEFAULT_FORM_FETCH_URL)]
    pub form_fetch_url: String,

    #[arg(long, env = "HOOKFORM_FORM_SUBMIT_URL", default_value = DEFAULT_FORM_SUBMIT_URL)]
    pub form_submit_url: String,

    #[arg(long, env = "HOOKFORM_QUIZ_FETCH_URL", default_value = DEFAULT_QUIZ_FETCH_URL)]
    pub quiz_fetch_url: String,

    #[arg(long, env = "HOOKFORM_QUIZ_SUBMIT_URL", default_value = DEFAULT_QUIZ_SUBMIT_URL)]
    pub quiz_submit_url: String,

    /// Request timeout in seconds
    #[arg(long, env = "HOOKFORM_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Do not remember or prefill name and email
    #[arg(long)]
    pub no_profile: bool,
}

impl Cli {
    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            form_fetch: self.form_fetch_url.clone(),
            form_submit: self.form_submit_url.clone(),
            quiz_fetch: self.quiz_fetch_url.clone(),
            quiz_submit: self.quiz_submit_url.clone(),
        }
    }

    /// The definition to open at startup, if an identifier was given
    pub fn target(&self) -> Option<(DefinitionKind, String)> {
        let non_empty = |id: &Option<String>| {
            id.as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
        };
        non_empty(&self.quiz)
            .map(|id| (DefinitionKind::Quiz, id))
            .or_else(|| non_empty(&self.form).map(|id| (DefinitionKind::Form, id)))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("io", "hookform", "hookform-tui")
}

/// Log file location; the terminal is busy with the UI
pub fn log_file_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_local_dir().join("hookform-tui.log"))
}

/// Name and email remembered across sessions
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Profile {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl Profile {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}

/// Where the profile lives on disk
#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    /// Store in the platform config directory
    pub fn default_location() -> Option<Self> {
        project_dirs().map(|dirs| Self::at(dirs.config_dir().join("profile.json")))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the profile; a missing file is an empty profile
    pub fn load(&self) -> Result<Profile> {
        if !self.path.exists() {
            return Ok(Profile::default());
        }
        let content = fs::read_to_string(&self.path)?;
        let profile: Profile = serde_json::from_str(&content)?;
        Ok(profile)
    }

    /// Save, keeping previously remembered values the new profile lacks
    pub fn save(&self, profile: &Profile) -> Result<()> {
        let previous = self.load().unwrap_or_default();
        let merged = Profile {
            name: profile.name.clone().or(previous.name),
            email: profile.email.clone().or(previous.email),
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&merged)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("hookform-tui").chain(args.iter().copied()))
            .unwrap()
    }

    mod endpoints {
        use super::*;

        #[test]
        fn test_defaults() {
            let endpoints = Endpoints::default();
            assert_eq!(endpoints.fetch_url(DefinitionKind::Form), DEFAULT_FORM_FETCH_URL);
            assert_eq!(endpoints.submit_url(DefinitionKind::Quiz), DEFAULT_QUIZ_SUBMIT_URL);
        }

        #[test]
        fn test_cli_override() {
            let cli = parse(&["--form-fetch-url", "http://localhost:5678/webhook/f"]);
            assert_eq!(
                cli.endpoints().fetch_url(DefinitionKind::Form),
                "http://localhost:5678/webhook/f"
            );
        }
    }

    mod cli {
        use super::*;

        #[test]
        fn test_form_target() {
            let cli = parse(&["--form", "abc"]);
            assert_eq!(cli.target(), Some((DefinitionKind::Form, "abc".to_string())));
        }

        #[test]
        fn test_quiz_target() {
            let cli = parse(&["--quiz", " q-1 "]);
            assert_eq!(cli.target(), Some((DefinitionKind::Quiz, "q-1".to_string())));
        }

        #[test]
        fn test_blank_identifier_means_prompt() {
            assert!(parse(&["--form", "  "]).target().is_none());
            assert!(parse(&[]).target().is_none());
        }

        #[test]
        fn test_form_and_quiz_conflict() {
            let result =
                Cli::try_parse_from(["hookform-tui", "--form", "a", "--quiz", "b"]);
            assert!(result.is_err());
        }

        #[test]
        fn test_timeout_is_at_least_one_second() {
            assert_eq!(parse(&["--timeout-secs", "0"]).timeout(), Duration::from_secs(1));
        }
    }

    mod profile {
        use super::*;

        #[test]
        fn test_load_missing_file_is_default() {
            let dir = tempfile::tempdir().unwrap();
            let store = ProfileStore::at(dir.path().join("profile.json"));
            assert_eq!(store.load().unwrap(), Profile::default());
        }

        #[test]
        fn test_save_and_load() {
            let dir = tempfile::tempdir().unwrap();
            let store = ProfileStore::at(dir.path().join("nested").join("profile.json"));
            let profile = Profile {
                name: Some("Ann".to_string()),
                email: Some("ann@x.io".to_string()),
            };
            store.save(&profile).unwrap();
            assert_eq!(store.load().unwrap(), profile);
        }

        #[test]
        fn test_save_keeps_previous_values() {
            let dir = tempfile::tempdir().unwrap();
            let store = ProfileStore::at(dir.path().join("profile.json"));
            store
                .save(&Profile {
                    name: Some("Ann".to_string()),
                    email: None,
                })
                .unwrap();
            store
                .save(&Profile {
                    name: None,
                    email: Some("ann@x.io".to_string()),
                })
                .unwrap();
            let loaded = store.load().unwrap();
            assert_eq!(loaded.name.as_deref(), Some("Ann"));
            assert_eq!(loaded.email.as_deref(), Some("ann@x.io"));
        }

        #[test]
        fn test_deserialize_with_extra_fields() {
            let json = r#"{"name": "Ann", "unknown_field": "value"}"#;
            let parsed: Profile = serde_json::from_str(json).unwrap();
            assert_eq!(parsed.name.as_deref(), Some("Ann"));
            assert!(parsed.email.is_none());
        }

        #[test]
        fn test_is_empty() {
            assert!(Profile::default().is_empty());
        }
    }
}
