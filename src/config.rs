use crate::error::PetResult;
use crate::model::Rules;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use tracing::warn;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// 0 = seed from OS entropy.
    pub seed: u64,
    /// Apply decay for time spent away when a save is loaded.
    pub catch_up: bool,
    /// Overrides for the simulation tunables.
    pub rules: Option<Rules>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: 0,
            catch_up: true,
            rules: None,
        }
    }
}

impl Settings {
    pub fn rules(&self) -> Rules {
        self.rules.clone().unwrap_or_default()
    }
}

pub struct Paths {
    pub save_path: PathBuf,
    pub settings_path: PathBuf,
}

impl Paths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            save_path: dir.join("save.json"),
            settings_path: dir.join("settings.json"),
        }
    }
}

pub fn project_paths() -> PetResult<Paths> {
    let proj = ProjectDirs::from("com", "pupcare", "Pupcare").ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            "could not resolve project directories",
        )
    })?;
    let dir = proj.data_local_dir().to_path_buf();
    fs::create_dir_all(&dir)?;
    Ok(Paths::in_dir(&dir))
}

/// Missing or unreadable settings fall back to defaults.
pub fn load_settings(path: &Path) -> Settings {
    match fs::read_to_string(path) {
        Ok(s) => match serde_json::from_str::<Settings>(&s) {
            Ok(v) => v,
            Err(e) => {
                warn!(path = %path.display(), "ignoring unreadable settings: {e}");
                Settings::default()
            }
        },
        Err(_) => Settings::default(),
    }
}

pub fn save_settings_atomic(path: &Path, s: &Settings) -> PetResult<()> {
    write_json_atomic(path, s)
}

pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> PetResult<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(value)?;
    fs::write(&tmp, data)?;
    atomic_rename(&tmp, path)?;
    Ok(())
}

pub(crate) fn atomic_rename(from: &Path, to: &Path) -> PetResult<()> {
    // rename() replaces atomically on Unix; Windows refuses to overwrite.
    if cfg!(windows) && to.exists() {
        let _ = fs::remove_file(to);
    }
    fs::rename(from, to)?;
    Ok(())
}
