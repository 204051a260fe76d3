//! Atomic whole-record JSON files inside a capability-scoped directory.
//!
//! File-backed adapters persist one record per file. Every write goes to a
//! uniquely named temporary file that is then renamed over the target, so a
//! reader sees either the previous record or the new one and never a torn
//! write. Records are wrapped in an envelope carrying a SHA-256 digest of the
//! payload; a digest mismatch is reported as corruption instead of being
//! deserialised.

use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8::Dir};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::io;
use thiserror::Error;
use uuid::Uuid;

const RECORD_EXTENSION: &str = ".json";

/// Errors returned while reading or writing record files.
#[derive(Debug, Error)]
pub enum RecordFileError {
    /// Filesystem access failed.
    #[error("record file I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The record could not be encoded.
    #[error("failed to encode record '{name}': {source}")]
    Encode {
        /// Record name.
        name: String,
        /// Underlying serialisation error.
        #[source]
        source: serde_json::Error,
    },

    /// The file does not contain a decodable record.
    #[error("record '{name}' could not be decoded: {source}")]
    Decode {
        /// Record name.
        name: String,
        /// Underlying deserialisation error.
        #[source]
        source: serde_json::Error,
    },

    /// The payload does not match its recorded digest.
    #[error("record '{name}' failed checksum verification")]
    Checksum {
        /// Record name.
        name: String,
    },
}

impl RecordFileError {
    /// Returns whether the error means the stored bytes are unusable.
    #[must_use]
    pub const fn is_corruption(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::Checksum { .. })
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    sha256: String,
    record: Value,
}

/// Directory of named JSON records.
#[derive(Debug)]
pub struct RecordDir {
    dir: Dir,
}

impl RecordDir {
    /// Opens `path`, creating it first when missing.
    ///
    /// # Errors
    ///
    /// Returns [`RecordFileError::Io`] when the directory cannot be created
    /// or opened.
    pub fn open(path: &Utf8Path) -> Result<Self, RecordFileError> {
        Dir::create_ambient_dir_all(path, ambient_authority())?;
        let dir = Dir::open_ambient_dir(path, ambient_authority())?;
        Ok(Self { dir })
    }

    /// Wraps an already opened directory capability.
    #[must_use]
    pub const fn from_dir(dir: Dir) -> Self {
        Self { dir }
    }

    /// Reads the record stored under `name`.
    ///
    /// Returns `None` when no record exists.
    ///
    /// # Errors
    ///
    /// Returns [`RecordFileError::Checksum`] or [`RecordFileError::Decode`]
    /// for corrupted records and [`RecordFileError::Io`] for access failures.
    pub fn read<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, RecordFileError> {
        let text = match self.dir.read_to_string(file_name(name)) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let decode = |source| RecordFileError::Decode {
            name: name.to_owned(),
            source,
        };

        let envelope: Envelope = serde_json::from_str(&text).map_err(decode)?;
        if digest(name, &envelope.record)? != envelope.sha256 {
            return Err(RecordFileError::Checksum {
                name: name.to_owned(),
            });
        }
        serde_json::from_value(envelope.record)
            .map(Some)
            .map_err(decode)
    }

    /// Atomically replaces the record stored under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordFileError`] when encoding or the filesystem fails. The
    /// previous record is left intact on failure.
    pub fn write<T: Serialize>(&self, name: &str, record: &T) -> Result<(), RecordFileError> {
        let encode = |source| RecordFileError::Encode {
            name: name.to_owned(),
            source,
        };
        let value = serde_json::to_value(record).map_err(encode)?;
        let envelope = Envelope {
            sha256: digest(name, &value)?,
            record: value,
        };
        let bytes = serde_json::to_vec_pretty(&envelope).map_err(encode)?;

        let temp_name = format!(".{name}.{}.tmp", Uuid::new_v4());
        self.dir.write(&temp_name, bytes)?;
        if let Err(err) = self.dir.rename(&temp_name, &self.dir, file_name(name)) {
            if let Err(cleanup) = self.dir.remove_file(&temp_name) {
                tracing::warn!(
                    record = name,
                    error = %cleanup,
                    "failed to remove temporary record"
                );
            }
            return Err(err.into());
        }
        Ok(())
    }

    /// Lists the names of all stored records.
    ///
    /// # Errors
    ///
    /// Returns [`RecordFileError::Io`] when the directory cannot be read.
    pub fn names(&self) -> Result<Vec<String>, RecordFileError> {
        let mut names = Vec::new();
        for entry in self.dir.entries()? {
            let file = entry?.file_name()?;
            if file.starts_with('.') {
                continue;
            }
            if let Some(name) = file.strip_suffix(RECORD_EXTENSION) {
                names.push(name.to_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

fn file_name(name: &str) -> String {
    format!("{name}{RECORD_EXTENSION}")
}

fn digest(name: &str, value: &Value) -> Result<String, RecordFileError> {
    let canonical = serde_json::to_vec(value).map_err(|source| RecordFileError::Encode {
        name: name.to_owned(),
        source,
    })?;
    Ok(hex(&Sha256::digest(canonical)))
}

/// Lower-case hexadecimal rendering of `bytes`.
pub(crate) fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut out, byte| {
            out.push_str(&format!("{byte:02x}"));
            out
        })
}

/// Runs blocking record I/O off the async executor.
///
/// Wraps the closure in [`tokio::task::spawn_blocking`] and maps join errors
/// into the caller's error type.
pub(crate) async fn run_blocking_with<F, T, E, M>(f: F, map_err: M) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
    M: FnOnce(tokio::task::JoinError) -> E,
{
    tokio::task::spawn_blocking(f).await.map_err(map_err)?
}
