//! Per-dataset file conventions.
//!
//! A dataset named `movie` living under home `~/.quarry` is described by
//! `movie-schema.json`, its records live in `movie-data.json`, its persisted
//! index in `movie-index/`, and relative icon paths resolve against
//! `movie-icons/`.

use std::fs;
use std::path::{Path, PathBuf};

use quarry_core::record::{self, Record};
use quarry_core::schema::Schema;

use crate::error::DatasetError;

/// The default dataset home: `~/.quarry`, or `./.quarry` on platforms with
/// no resolvable home directory.
pub fn default_home() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".quarry"))
        .unwrap_or_else(|| PathBuf::from(".quarry"))
}

/// A named dataset rooted at a home directory. Index identity derives from
/// the pair, so two homes never share an index.
#[derive(Debug, Clone)]
pub struct Dataset {
    name: String,
    home: PathBuf,
}

impl Dataset {
    pub fn new(name: impl Into<String>, home: impl Into<PathBuf>) -> Self {
        Dataset {
            name: name.into(),
            home: home.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn schema_path(&self) -> PathBuf {
        self.home.join(format!("{}-schema.json", self.name))
    }

    pub fn data_path(&self) -> PathBuf {
        self.home.join(format!("{}-data.json", self.name))
    }

    pub fn index_dir(&self) -> PathBuf {
        self.home.join(format!("{}-index", self.name))
    }

    pub fn icon_dir(&self) -> PathBuf {
        self.home.join(format!("{}-icons", self.name))
    }

    /// Read and validate the dataset's schema document.
    pub fn load_schema(&self) -> Result<Schema, DatasetError> {
        let text = self.read_source(&self.schema_path())?;
        Schema::from_document(&text).map_err(|source| DatasetError::MalformedSchema {
            dataset: self.name.clone(),
            source,
        })
    }

    /// Read the dataset's record set.
    pub fn load_records(&self) -> Result<Vec<Record>, DatasetError> {
        let text = self.read_source(&self.data_path())?;
        record::parse_record_set(&text).map_err(|source| DatasetError::MalformedRecordSet {
            dataset: self.name.clone(),
            source,
        })
    }

    fn read_source(&self, path: &Path) -> Result<String, DatasetError> {
        if !path.exists() {
            return Err(DatasetError::DataUnavailable {
                dataset: self.name.clone(),
                path: path.to_path_buf(),
            });
        }
        Ok(fs::read_to_string(path)?)
    }
}
