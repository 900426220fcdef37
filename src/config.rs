// ABOUTME: YAML config file discovery with CLI/env overrides
// ABOUTME: --config path → XDG config → ~/.config, then flags win

use crate::api::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One tracked student and the parent login used to read their diary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StudentEntry {
    pub username: String,
    pub password: String,
    pub student_id: u64,
    #[serde(default)]
    pub student_name: Option<String>,
}

impl StudentEntry {
    pub fn display_name(&self) -> String {
        self.student_name
            .clone()
            .unwrap_or_else(|| format!("Student {}", self.student_id))
    }
}

/// On-disk shape of `config.yaml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub students: Vec<StudentEntry>,
}

/// Values given on the command line (or their env fallbacks).
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_path: Option<PathBuf>,
    pub api_base: Option<String>,
    pub timeout_secs: Option<u64>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub student_id: Option<u64>,
    pub student_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base: String,
    pub timeout: Duration,
    pub students: Vec<StudentEntry>,
}

impl Config {
    /// Resolve configuration for commands that fetch diaries.
    pub fn resolve(overrides: &Overrides) -> Result<Self> {
        let config = Self::resolve_connection(overrides)?;
        if config.students.is_empty() {
            return Err(Error::Config(
                "No students configured. Add them to config.yaml or pass --username, --password and --student-id".into(),
            ));
        }
        Ok(config)
    }

    /// Resolve configuration without requiring any student entry.
    pub fn resolve_connection(overrides: &Overrides) -> Result<Self> {
        let file = load_file_config(overrides.config_path.as_deref())?.unwrap_or_default();
        Ok(merge(file, overrides))
    }

    /// Login for account-level commands: flags first, else the first
    /// configured student's login.
    pub fn login(&self, overrides: &Overrides) -> Result<(String, String)> {
        match (&overrides.username, &overrides.password) {
            (Some(u), Some(p)) => Ok((u.clone(), p.clone())),
            _ => self
                .students
                .first()
                .map(|s| (s.username.clone(), s.password.clone()))
                .ok_or_else(|| {
                    Error::Config("No login found. Pass --username and --password".into())
                }),
        }
    }
}

fn merge(file: FileConfig, overrides: &Overrides) -> Config {
    let mut students = file.students;

    if let (Some(username), Some(password), Some(student_id)) = (
        &overrides.username,
        &overrides.password,
        overrides.student_id,
    ) {
        let entry = StudentEntry {
            username: username.clone(),
            password: password.clone(),
            student_id,
            student_name: overrides.student_name.clone(),
        };
        students.retain(|s| s.student_id != student_id);
        students.push(entry);
    } else if let Some(student_id) = overrides.student_id {
        // --student-id alone narrows the configured list
        students.retain(|s| s.student_id == student_id);
        if let Some(name) = &overrides.student_name {
            for s in &mut students {
                s.student_name = Some(name.clone());
            }
        }
    }

    Config {
        api_base: overrides
            .api_base
            .clone()
            .or(file.api_base)
            .unwrap_or_else(|| DEFAULT_BASE_URL.into()),
        timeout: overrides
            .timeout_secs
            .or(file.timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT),
        students,
    }
}

fn load_file_config(explicit: Option<&Path>) -> Result<Option<FileConfig>> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        return parse_config_file(path);
    }

    match default_config_path() {
        Some(path) => parse_config_file(&path),
        None => Ok(None),
    }
}

fn default_config_path() -> Option<PathBuf> {
    let config_home = env::var("XDG_CONFIG_HOME").ok().or_else(|| {
        env::var("HOME")
            .ok()
            .map(|home| format!("{}/.config", home))
    })?;

    Some(PathBuf::from(config_home).join("maktab/config.yaml"))
}

fn parse_config_file(path: &Path) -> Result<Option<FileConfig>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)?;
    let config: FileConfig = serde_yaml::from_str(&content)
        .map_err(|e| Error::Config(format!("Invalid config {}: {}", path.display(), e)))?;
    Ok(Some(config))
}
