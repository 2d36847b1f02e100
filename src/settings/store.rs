//! Durable key/value persistence for [`Settings`].
//!
//! The on-medium layout is a flat namespace of named entries: seven integers
//! (`offset`, `minA`, `maxA`, `cropL`, `cropR`, `cropT`, `cropB`) and one
//! boolean (`auto`). Absent keys fall back to the compiled-in defaults, and
//! so do entries of the wrong type or a file that no longer parses.
use super::{DisplaySize, Settings};
use crate::error::SettingsError;
use crate::image::io::ensure_parent_dir;
use log::{debug, info, warn};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const KEY_OFFSET: &str = "offset";
const KEY_MIN_AREA: &str = "minA";
const KEY_MAX_AREA: &str = "maxA";
const KEY_CROP_LEFT: &str = "cropL";
const KEY_CROP_RIGHT: &str = "cropR";
const KEY_CROP_TOP: &str = "cropT";
const KEY_CROP_BOTTOM: &str = "cropB";
const KEY_AUTO_SAVE: &str = "auto";

/// Minimal typed key/value medium.
pub trait KeyValueStore {
    fn get_i32(&self, key: &str) -> Option<i32>;
    fn get_bool(&self, key: &str) -> Option<bool>;
    fn put_i32(&mut self, key: &str, value: i32);
    fn put_bool(&mut self, key: &str, value: bool);
    /// Make every `put` since the last commit durable.
    fn commit(&mut self) -> Result<(), SettingsError>;
}

type Entries = BTreeMap<String, Value>;

fn lookup_i32(entries: &Entries, key: &str) -> Option<i32> {
    let value = entries.get(key)?;
    let parsed = value.as_i64().and_then(|v| i32::try_from(v).ok());
    if parsed.is_none() {
        warn!("settings entry {key}={value} is not an integer, using default");
    }
    parsed
}

fn lookup_bool(entries: &Entries, key: &str) -> Option<bool> {
    let value = entries.get(key)?;
    let parsed = value.as_bool();
    if parsed.is_none() {
        warn!("settings entry {key}={value} is not a boolean, using default");
    }
    parsed
}

/// Volatile store, mostly for tests and dry runs.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Entries,
    commits: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful commits so far.
    pub fn commits(&self) -> usize {
        self.commits
    }

}

impl KeyValueStore for MemoryStore {
    fn get_i32(&self, key: &str) -> Option<i32> {
        lookup_i32(&self.entries, key)
    }
    fn get_bool(&self, key: &str) -> Option<bool> {
        lookup_bool(&self.entries, key)
    }
    fn put_i32(&mut self, key: &str, value: i32) {
        self.entries.insert(key.to_string(), Value::from(value));
    }
    fn put_bool(&mut self, key: &str, value: bool) {
        self.entries.insert(key.to_string(), Value::from(value));
    }
    fn commit(&mut self) -> Result<(), SettingsError> {
        self.commits += 1;
        Ok(())
    }
}

/// One JSON object per file, rewritten whole on every commit.
///
/// A commit writes a sibling `.tmp` file and renames it over the target, so
/// an interrupted write leaves the previous contents in place.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Entries,
}

impl JsonFileStore {
    /// Open `path`; a missing or unparseable file is an empty store.
    ///
    /// Only a file that exists but cannot be read is an error.
    pub fn open(path: &Path) -> Result<Self, SettingsError> {
        let entries = match fs::read_to_string(path) {
            Ok(text) if text.trim().is_empty() => Entries::new(),
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|err| {
                warn!(
                    "settings file {} is corrupt ({err}), starting from defaults",
                    path.display()
                );
                Entries::new()
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("settings file {} not found, starting empty", path.display());
                Entries::new()
            }
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }
}

impl KeyValueStore for JsonFileStore {
    fn get_i32(&self, key: &str) -> Option<i32> {
        lookup_i32(&self.entries, key)
    }
    fn get_bool(&self, key: &str) -> Option<bool> {
        lookup_bool(&self.entries, key)
    }
    fn put_i32(&mut self, key: &str, value: i32) {
        self.entries.insert(key.to_string(), Value::from(value));
    }
    fn put_bool(&mut self, key: &str, value: bool) {
        self.entries.insert(key.to_string(), Value::from(value));
    }
    fn commit(&mut self) -> Result<(), SettingsError> {
        ensure_parent_dir(&self.path)
            .map_err(|msg| std::io::Error::new(ErrorKind::Other, msg))?;
        let json = serde_json::to_string_pretty(&self.entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Current settings plus the medium they persist to.
///
/// The store owns the only mutable copy; stages borrow it read-only for the
/// duration of one cycle.
#[derive(Debug)]
pub struct SettingsStore<S: KeyValueStore> {
    settings: Settings,
    display: DisplaySize,
    backend: S,
}

impl<S: KeyValueStore> SettingsStore<S> {
    /// Start from clamped defaults without touching the medium.
    pub fn new(backend: S, display: DisplaySize) -> Self {
        let mut settings = Settings::default();
        settings.clamp(display);
        Self {
            settings,
            display,
            backend,
        }
    }

    /// Read every field, falling back to defaults for absent keys, then clamp.
    pub fn load(&mut self) {
        let defaults = Settings::default();
        let b = &self.backend;
        let mut s = Settings {
            threshold_offset: b.get_i32(KEY_OFFSET).unwrap_or(defaults.threshold_offset),
            min_area: b.get_i32(KEY_MIN_AREA).unwrap_or(defaults.min_area),
            max_area: b.get_i32(KEY_MAX_AREA).unwrap_or(defaults.max_area),
            auto_save: b.get_bool(KEY_AUTO_SAVE).unwrap_or(defaults.auto_save),
            crop_left: b.get_i32(KEY_CROP_LEFT).unwrap_or(defaults.crop_left),
            crop_right: b.get_i32(KEY_CROP_RIGHT).unwrap_or(defaults.crop_right),
            crop_top: b.get_i32(KEY_CROP_TOP).unwrap_or(defaults.crop_top),
            crop_bottom: b.get_i32(KEY_CROP_BOTTOM).unwrap_or(defaults.crop_bottom),
        };
        s.clamp(self.display);
        info!("settings loaded: {s}");
        self.settings = s;
    }

    /// Write every field unconditionally.
    pub fn save(&mut self) -> Result<(), SettingsError> {
        let s = &self.settings;
        let b = &mut self.backend;
        b.put_i32(KEY_OFFSET, s.threshold_offset);
        b.put_i32(KEY_MIN_AREA, s.min_area);
        b.put_i32(KEY_MAX_AREA, s.max_area);
        b.put_i32(KEY_CROP_LEFT, s.crop_left);
        b.put_i32(KEY_CROP_RIGHT, s.crop_right);
        b.put_i32(KEY_CROP_TOP, s.crop_top);
        b.put_i32(KEY_CROP_BOTTOM, s.crop_bottom);
        b.put_bool(KEY_AUTO_SAVE, s.auto_save);
        b.commit()?;
        debug!("settings saved");
        Ok(())
    }

    pub fn reset_to_defaults(&mut self, persist: bool) -> Result<(), SettingsError> {
        let mut s = Settings::default();
        s.clamp(self.display);
        self.settings = s;
        if persist {
            self.save()?;
        }
        Ok(())
    }

    /// Apply a validated mutation, then persist when autosave is on.
    ///
    /// Returns whether the change was written to the medium.
    pub fn update<F>(&mut self, mutate: F) -> Result<bool, SettingsError>
    where
        F: FnOnce(&mut Settings, DisplaySize),
    {
        mutate(&mut self.settings, self.display);
        self.settings.clamp(self.display);
        if self.settings.auto_save {
            self.save()?;
            return Ok(true);
        }
        Ok(false)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn display(&self) -> DisplaySize {
        self.display
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }
}
