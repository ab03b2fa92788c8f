//! Selection record kept in a file, for host runs that span processes.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use inkframe_core::state::{StateError, StateStore};

pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone().into_os_string();
        temp.push(".tmp");
        PathBuf::from(temp)
    }
}

impl StateStore for FileStateStore {
    fn read(&mut self) -> Result<Option<String>, StateError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StateError::Read(err.to_string())),
        }
    }

    /// Whole-record replacement: a crash leaves either the old or the new
    /// record, never a mix.
    fn write(&mut self, contents: &str) -> Result<(), StateError> {
        let temp = self.temp_path();
        fs::write(&temp, contents).map_err(|err| StateError::Write(err.to_string()))?;
        fs::rename(&temp, &self.path).map_err(|err| StateError::Write(err.to_string()))
    }

    fn remove(&mut self) -> Result<(), StateError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StateError::Write(err.to_string())),
        }
    }
}
