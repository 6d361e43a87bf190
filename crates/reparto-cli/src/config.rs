// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use reparto_app::TabKind;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_VERSION: i64 = 1;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub ui: Ui,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            storage: Storage::default(),
            ui: Ui::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Storage {
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ui {
    pub start_tab: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("REPARTO_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set REPARTO_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(reparto_db::APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and move values under [storage] and [ui]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(db_path) = &self.storage.db_path {
            reparto_db::validate_db_path(db_path)
                .with_context(|| format!("invalid [storage].db_path in {}", path.display()))?;
        }
        if let Some(start_tab) = &self.ui.start_tab
            && parse_tab(start_tab).is_none()
        {
            bail!(
                "invalid [ui].start_tab {:?} in {}; expected one of visits, routes, referrers, items",
                start_tab,
                path.display()
            );
        }
        Ok(())
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.storage.db_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => reparto_db::default_db_path(),
        }
    }

    pub fn start_tab(&self) -> TabKind {
        self.ui
            .start_tab
            .as_deref()
            .and_then(parse_tab)
            .unwrap_or(TabKind::Visits)
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# reparto config ({})\nversion = 1\n\n[storage]\n# db_path = \"/path/to/reparto.db\"\n\n[ui]\n# start_tab = \"visits\"\n",
            path.display()
        )
    }
}

fn parse_tab(value: &str) -> Option<TabKind> {
    TabKind::ALL
        .into_iter()
        .find(|tab| tab.label() == value.trim().to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::Config;
    use anyhow::Result;
    use reparto_app::TabKind;
    use std::fs;

    fn write_config(contents: &str) -> Result<(tempfile::TempDir, std::path::PathBuf)> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(&path, contents)?;
        Ok((dir, path))
    }

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = Config::load(&dir.path().join("nope.toml"))?;
        assert_eq!(config.version, 1);
        assert_eq!(config.start_tab(), TabKind::Visits);
        Ok(())
    }

    #[test]
    fn unversioned_config_is_rejected() -> Result<()> {
        let (_dir, path) = write_config("[storage]\ndb_path = \"/tmp/r.db\"\n")?;
        let error = Config::load(&path).expect_err("unversioned");
        assert!(error.to_string().contains("not versioned"));
        Ok(())
    }

    #[test]
    fn wrong_version_is_rejected() -> Result<()> {
        let (_dir, path) = write_config("version = 9\n")?;
        let error = Config::load(&path).expect_err("wrong version");
        assert!(error.to_string().contains("unsupported config version 9"));
        Ok(())
    }

    #[test]
    fn db_path_is_validated() -> Result<()> {
        let (_dir, path) =
            write_config("version = 1\n[storage]\ndb_path = \"file:bad.db\"\n")?;
        assert!(Config::load(&path).is_err());
        Ok(())
    }

    #[test]
    fn start_tab_parses_known_tabs() -> Result<()> {
        let (_dir, path) = write_config("version = 1\n[ui]\nstart_tab = \"referrers\"\n")?;
        let config = Config::load(&path)?;
        assert_eq!(config.start_tab(), TabKind::Referrers);

        let (_dir, path) = write_config("version = 1\n[ui]\nstart_tab = \"inbox\"\n")?;
        assert!(Config::load(&path).is_err());
        Ok(())
    }
}
