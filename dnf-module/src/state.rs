//! Per-module persisted state and its `<name>.module` INI file.
//!
//! The format is fixed and tiny (four keys), so this is a hand-rolled
//! reader/writer rather than a pull on a general INI crate — the same call
//! `dnf_sack::cache` makes for the solv-cache, and consistent with "general
//! INI/TOML config parsing" being out of scope for the core.

use std::fs;
use std::path::{Path, PathBuf};

use dnf_common::Error;

/// A module name's persisted override state. Absence of any override is
/// [`ModuleState::Default`], not [`ModuleState::Unknown`] — `Unknown` is
/// reserved for names the container has never harvested a document for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ModuleState {
    /// No explicit override; follows the distro default stream, if any.
    Default,
    /// Explicitly enabled on [`ModuleRecord::stream`].
    Enabled,
    /// Explicitly disabled; never activated regardless of defaults.
    Disabled,
    /// Not a module the container knows about.
    Unknown,
}

impl ModuleState {
    fn as_ini_str(self) -> &'static str {
        match self {
            ModuleState::Enabled => "enabled",
            ModuleState::Disabled => "disabled",
            ModuleState::Default | ModuleState::Unknown => "",
        }
    }

    fn from_ini_str(s: &str) -> ModuleState {
        match s {
            "enabled" => ModuleState::Enabled,
            "disabled" => ModuleState::Disabled,
            _ => ModuleState::Default,
        }
    }
}

/// One module's persisted record: `[<name>]` / `name` / `stream` / `profiles` / `state`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ModuleRecord {
    /// The module name.
    pub name: String,
    /// The enabled (or otherwise relevant) stream, if any.
    pub stream: Option<String>,
    /// Installed profile names.
    pub profiles: Vec<String>,
    /// The override state.
    pub state: ModuleState,
}

impl ModuleRecord {
    /// Creates a fresh, unreferenced record in [`ModuleState::Default`].
    pub fn new(name: impl Into<String>) -> Self {
        ModuleRecord {
            name: name.into(),
            stream: None,
            profiles: Vec::new(),
            state: ModuleState::Default,
        }
    }

    fn to_ini(&self) -> String {
        format!(
            "[{name}]\nname = {name}\nstream = {stream}\nprofiles = {profiles}\nstate = {state}\n",
            name = self.name,
            stream = self.stream.as_deref().unwrap_or(""),
            profiles = self.profiles.join(","),
            state = self.state.as_ini_str(),
        )
    }

    fn from_ini(text: &str) -> Result<Self, Error> {
        let mut name = None;
        let mut stream = None;
        let mut profiles = Vec::new();
        let mut state = ModuleState::Default;

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('[') || line.starts_with(';') || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let (key, value) = (key.trim(), value.trim());
            match key {
                "name" => name = Some(value.to_string()),
                "stream" if !value.is_empty() => stream = Some(value.to_string()),
                "profiles" if !value.is_empty() => {
                    profiles = value.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect();
                }
                "state" => state = ModuleState::from_ini_str(value),
                _ => {}
            }
        }

        let name = name.ok_or_else(|| Error::FileInvalid {
            path: PathBuf::new(),
            reason: "module state file missing a name= key".to_string(),
        })?;
        Ok(ModuleRecord { name, stream, profiles, state })
    }

    /// Writes this record to `<dir>/<name>.module`, atomically (temp file + rename).
    pub fn write(&self, dir: &Path) -> Result<(), Error> {
        let final_path = dir.join(format!("{}.module", self.name));
        let tmp_path = dir.join(format!(".{}.module.tmp", self.name));
        fs::write(&tmp_path, self.to_ini()).map_err(|source| io_err("writing module state", source))?;
        fs::rename(&tmp_path, &final_path).map_err(|source| io_err("installing module state file", source))?;
        Ok(())
    }

    /// Reads a single `<name>.module` file.
    pub fn read(path: &Path) -> Result<Self, Error> {
        let text = fs::read_to_string(path).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => Error::FileNotFound { path: path.to_path_buf() },
            _ => io_err("reading module state", source),
        })?;
        ModuleRecord::from_ini(&text)
    }
}

/// Reads every `*.module` file in `dir`. A missing directory yields no records.
pub fn read_state_dir(dir: &Path) -> Result<Vec<ModuleRecord>, Error> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => return Err(io_err("listing module state directory", source)),
    };
    let mut records = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| io_err("listing module state directory", source))?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("module") {
            records.push(ModuleRecord::read(&path)?);
        }
    }
    Ok(records)
}

fn io_err(context: &str, source: std::io::Error) -> Error {
    Error::Io { context: context.to_string(), source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testresult::TestResult;

    #[test]
    fn round_trips_through_ini() -> TestResult {
        let dir = tempfile::tempdir()?;
        let mut record = ModuleRecord::new("postgresql");
        record.stream = Some("12".to_string());
        record.profiles = vec!["server".to_string(), "client".to_string()];
        record.state = ModuleState::Enabled;
        record.write(dir.path())?;

        let read_back = ModuleRecord::read(&dir.path().join("postgresql.module"))?;
        assert_eq!(read_back, record);
        Ok(())
    }

    #[test]
    fn missing_state_dir_yields_no_records() -> TestResult {
        let dir = tempfile::tempdir()?;
        let missing = dir.path().join("does-not-exist");
        assert!(read_state_dir(&missing)?.is_empty());
        Ok(())
    }

    #[test]
    fn default_state_persists_as_empty_string() {
        let record = ModuleRecord::new("nodejs");
        assert!(record.to_ini().contains("state = \n"));
    }
}
