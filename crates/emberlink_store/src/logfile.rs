//! # Append-Only Log File
//!
//! Shared framing for the wallet log and the event ledger. Records are CRC32
//! framed; a write is acknowledged only after `fsync`. Recovery truncates at
//! the first torn or corrupt record so the file is append-ready again.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::{StoreError, StoreResult};

/// Size of the file header (magic + version).
const HEADER_LEN: u64 = 8;

/// An append-only, CRC-framed log file.
#[derive(Debug)]
pub(crate) struct LogFile {
    /// Path, kept for error reporting.
    path: PathBuf,
    /// Write handle, serialized.
    writer: Mutex<BufWriter<File>>,
}

impl LogFile {
    /// Opens or creates a log file and replays its records.
    ///
    /// Returns the log handle plus every intact record payload, in write
    /// order. A torn or corrupt tail is truncated with a warning.
    pub(crate) fn open(
        path: &Path,
        magic: &[u8; 4],
        version: u32,
    ) -> StoreResult<(Self, Vec<Vec<u8>>)> {
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| StoreError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let len = file
            .metadata()
            .map_err(|source| StoreError::Io {
                path: path.to_path_buf(),
                source,
            })?
            .len();

        let mut payloads = Vec::new();

        if len < HEADER_LEN {
            // Nothing was ever acknowledged from this file (acks require a
            // complete header), so a torn header can be rewritten in place.
            if len > 0 {
                tracing::warn!(path = %path.display(), "rewriting torn log header");
            }
            file.set_len(0).map_err(|source| StoreError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            file.write_all(magic).map_err(|source| StoreError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            file.write_all(&version.to_le_bytes())
                .map_err(|source| StoreError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
            file.sync_all().map_err(|source| StoreError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        } else {
            let good_end = Self::replay(path, &mut file, magic, version, &mut payloads)?;

            if good_end < len {
                tracing::warn!(
                    path = %path.display(),
                    lost_bytes = len - good_end,
                    "truncating torn log tail"
                );
                file.set_len(good_end).map_err(|source| StoreError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
            }
        }

        file.seek(SeekFrom::End(0)).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Ok((
            Self {
                path: path.to_path_buf(),
                writer: Mutex::new(BufWriter::new(file)),
            },
            payloads,
        ))
    }

    /// Reads the header and all intact records, returning the offset just
    /// past the last intact record.
    fn replay(
        path: &Path,
        file: &mut File,
        magic: &[u8; 4],
        version: u32,
        payloads: &mut Vec<Vec<u8>>,
    ) -> StoreResult<u64> {
        file.seek(SeekFrom::Start(0)).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = BufReader::new(file);

        let mut file_magic = [0u8; 4];
        reader
            .read_exact(&mut file_magic)
            .map_err(|source| StoreError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        if &file_magic != magic {
            return Err(StoreError::BadMagic {
                path: path.to_path_buf(),
            });
        }

        let mut version_bytes = [0u8; 4];
        reader
            .read_exact(&mut version_bytes)
            .map_err(|source| StoreError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let file_version = u32::from_le_bytes(version_bytes);
        if file_version != version {
            return Err(StoreError::UnsupportedVersion {
                path: path.to_path_buf(),
                version: file_version,
            });
        }

        let mut good_end = HEADER_LEN;

        while let Some(payload) = Self::read_record(&mut reader) {
            good_end += 4 + payload.len() as u64 + 4;
            payloads.push(payload);
        }

        Ok(good_end)
    }

    /// Reads one record, returning `None` on a torn or corrupt record
    /// (recovery treats that as end-of-log).
    fn read_record(reader: &mut BufReader<&mut File>) -> Option<Vec<u8>> {
        let mut len_bytes = [0u8; 4];
        reader.read_exact(&mut len_bytes).ok()?;
        let payload_len = u32::from_le_bytes(len_bytes) as usize;

        let mut payload = vec![0u8; payload_len];
        reader.read_exact(&mut payload).ok()?;

        let mut crc_bytes = [0u8; 4];
        reader.read_exact(&mut crc_bytes).ok()?;
        let stored_crc = u32::from_le_bytes(crc_bytes);

        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&len_bytes);
        hasher.update(&payload);
        if hasher.finalize() != stored_crc {
            return None;
        }

        Some(payload)
    }

    /// Appends one record and syncs it to disk before returning.
    pub(crate) fn append(&self, payload: &[u8]) -> StoreResult<()> {
        let len_bytes = (payload.len() as u32).to_le_bytes();

        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&len_bytes);
        hasher.update(payload);
        let crc = hasher.finalize();

        let mut writer = self.writer.lock();

        writer.write_all(&len_bytes).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        writer.write_all(payload).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        writer
            .write_all(&crc.to_le_bytes())
            .map_err(|source| StoreError::Io {
                path: self.path.clone(),
                source,
            })?;

        writer.flush().map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        writer
            .get_ref()
            .sync_all()
            .map_err(|source| StoreError::Io {
                path: self.path.clone(),
                source,
            })?;

        Ok(())
    }

    /// Path of the underlying file.
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}
