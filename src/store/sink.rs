//! Persistence sinks
//!
//! A sink receives a full snapshot of the store on every flush.
//!
//! ## Snapshot File Format (FileSink)
//! ```text
//! ┌──────────┬────────────┬──────────┬──────────┬─────────────────────┐
//! │Magic (4) │Version (2) │ CRC (4)  │ Len (8)  │ bincode(entries)    │
//! └──────────┴────────────┴──────────┴──────────┴─────────────────────┘
//! ```
//! Header integers are little-endian. The CRC covers the payload only.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{Snapshot, StoreValue};
use crate::error::{KvError, Result};

/// Snapshot file magic
pub const MAGIC: &[u8; 4] = b"MKVS";

/// Snapshot format version
pub const VERSION: u16 = 1;

/// Header size: magic (4) + version (2) + crc (4) + len (8)
pub const HEADER_SIZE: usize = 18;

/// Destination for store snapshots
pub trait Sink<V>: Send + Sync {
    /// Persist a full snapshot of the store
    fn flush(&self, snapshot: &Snapshot<V>) -> Result<()>;
}

// =============================================================================
// FileSink
// =============================================================================

/// Writes each snapshot to a single file, replacing the previous one atomically
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    /// Create a sink targeting `path` (the file is created on first flush)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Snapshot file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the last snapshot written to this file
    ///
    /// Returns `Ok(None)` when no snapshot exists yet.
    pub fn load<V: DeserializeOwned>(&self) -> Result<Option<Snapshot<V>>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if bytes.len() < HEADER_SIZE {
            return Err(KvError::Corruption(format!(
                "snapshot too short: {} bytes",
                bytes.len()
            )));
        }
        if &bytes[0..4] != MAGIC {
            return Err(KvError::Corruption("bad snapshot magic".to_string()));
        }

        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != VERSION {
            return Err(KvError::Corruption(format!(
                "unsupported snapshot version {}",
                version
            )));
        }

        let crc = u32::from_le_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]);
        let mut len_bytes = [0u8; 8];
        len_bytes.copy_from_slice(&bytes[10..HEADER_SIZE]);
        let len = u64::from_le_bytes(len_bytes) as usize;

        let payload = &bytes[HEADER_SIZE..];
        if payload.len() != len {
            return Err(KvError::Corruption(format!(
                "snapshot length mismatch: header says {}, found {}",
                len,
                payload.len()
            )));
        }
        if crc32fast::hash(payload) != crc {
            return Err(KvError::Corruption("snapshot checksum mismatch".to_string()));
        }

        let entries = bincode::deserialize(payload)?;
        Ok(Some(entries))
    }

    fn tmp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}

impl<V: StoreValue + Serialize> Sink<V> for FileSink {
    fn flush(&self, snapshot: &Snapshot<V>) -> Result<()> {
        let payload = bincode::serialize(snapshot)?;
        let crc = crc32fast::hash(&payload);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Write the new snapshot beside the old one, then swap it in
        let tmp_path = self.tmp_path();
        let mut writer = BufWriter::new(File::create(&tmp_path)?);
        writer.write_all(MAGIC)?;
        writer.write_all(&VERSION.to_le_bytes())?;
        writer.write_all(&crc.to_le_bytes())?;
        writer.write_all(&(payload.len() as u64).to_le_bytes())?;
        writer.write_all(&payload)?;

        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        fs::rename(&tmp_path, &self.path)?;

        tracing::trace!(
            "Wrote snapshot of {} entries ({} bytes) to {}",
            snapshot.len(),
            payload.len(),
            self.path.display()
        );
        Ok(())
    }
}

// =============================================================================
// MemorySink
// =============================================================================

/// Keeps the most recent snapshot in memory
pub struct MemorySink<V> {
    state: Mutex<MemorySinkState<V>>,
}

struct MemorySinkState<V> {
    last: Option<Snapshot<V>>,
    flushes: usize,
}

impl<V> MemorySink<V> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemorySinkState {
                last: None,
                flushes: 0,
            }),
        }
    }

    /// Number of snapshots received
    pub fn flush_count(&self) -> usize {
        self.state.lock().flushes
    }
}

impl<V: Clone> MemorySink<V> {
    /// Most recent snapshot, if any
    pub fn last_snapshot(&self) -> Option<Snapshot<V>> {
        self.state.lock().last.clone()
    }
}

impl<V> Default for MemorySink<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: StoreValue> Sink<V> for MemorySink<V> {
    fn flush(&self, snapshot: &Snapshot<V>) -> Result<()> {
        let mut state = self.state.lock();
        state.last = Some(snapshot.clone());
        state.flushes += 1;
        Ok(())
    }
}
