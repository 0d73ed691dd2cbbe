use anyhow::{Context, Result};
use std::{collections::BTreeSet, fs::create_dir_all, path::PathBuf};

pub struct Config {
    pub data_dir: PathBuf,
    pub forms_dir: PathBuf,
    pub allowed_types: BTreeSet<String>,
    pub port: u16,
    pub threads: usize,
}

impl Config {
    pub fn ensure_dirs(&self) -> Result<()> {
        create_dir_all(&self.data_dir).with_context(|| {
            format!("Could not create data directory {}", self.data_dir.display())
        })?;
        create_dir_all(&self.forms_dir).with_context(|| {
            format!("Could not create forms directory {}", self.forms_dir.display())
        })?;

        Ok(())
    }

    pub fn allows(&self, extension: &str) -> bool {
        self.allowed_types.contains(&extension.to_lowercase())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: "data".into(),
            forms_dir: "forms".into(),
            allowed_types: parse_allowed_types("xml,jpg,png"),
            port: 80,
            threads: 4,
        }
    }
}

pub fn parse_allowed_types(list: &str) -> BTreeSet<String> {
    list.split(',')
        .map(|entry| entry.trim().trim_start_matches('.').to_lowercase())
        .filter(|entry| !entry.is_empty())
        .collect()
}
