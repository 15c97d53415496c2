use std::fs;
use std::path::{Path, PathBuf};

use crate::settings::{Settings, SettingsError};

/// JSON-backed [`Settings`] file.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    data: Settings,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>, settings: Settings) -> Self {
        Self {
            path: path.into(),
            data: settings,
        }
    }

    /// Loads the settings file; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            log::debug!("{} not found, using default settings", path.display());
            let mut data = Settings::default();
            data.sanitize();
            return Ok(Self { path, data });
        }

        let data = read_settings(&path)?;
        Ok(Self { path, data })
    }

    pub fn settings(&self) -> &Settings {
        &self.data
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.data
    }

    pub fn update<F>(&mut self, mut op: F) -> Result<(), SettingsError>
    where
        F: FnMut(&mut Settings),
    {
        op(&mut self.data);
        self.data.sanitize();
        self.save()
    }

    pub fn overwrite(&mut self, settings: Settings) -> Result<(), SettingsError> {
        self.data = settings;
        self.data.sanitize();
        self.save()
    }

    /// Writes to a sibling `.tmp` file, then renames it over the target.
    pub fn save(&self) -> Result<(), SettingsError> {
        create_parent(&self.path)?;
        let payload = serialize(&self.data, &self.path)?;

        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, payload.as_bytes()).map_err(|source| SettingsError::Write {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|source| SettingsError::Write {
            path: self.path.clone(),
            source,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn export_to(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref().to_path_buf();
        create_parent(&path)?;
        let payload = serialize(&self.data, &path)?;
        fs::write(&path, payload.as_bytes()).map_err(|source| SettingsError::Write { path, source })
    }

    /// Replaces the current settings with `source`, keeping the previous file
    /// as `.bak`.
    pub fn import_from(&mut self, source: impl AsRef<Path>) -> Result<(), SettingsError> {
        let data = read_settings(source.as_ref())?;
        self.backup_existing()?;
        self.data = data;
        self.save()?;
        log::info!(
            "imported settings from {} into {}",
            source.as_ref().display(),
            self.path.display()
        );
        Ok(())
    }

    fn backup_existing(&self) -> Result<(), SettingsError> {
        if self.path.exists() {
            let backup = self.path.with_extension("bak");
            fs::copy(&self.path, &backup).map_err(|source| SettingsError::Write {
                path: backup,
                source,
            })?;
        }
        Ok(())
    }
}

fn read_settings(path: &Path) -> Result<Settings, SettingsError> {
    let contents = fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut data: Settings =
        serde_json::from_str(&contents).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    data.sanitize();
    Ok(data)
}

fn serialize(settings: &Settings, path: &Path) -> Result<String, SettingsError> {
    serde_json::to_string_pretty(settings).map_err(|source| SettingsError::Serialize {
        path: path.to_path_buf(),
        source,
    })
}

fn create_parent(path: &Path) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| SettingsError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}
