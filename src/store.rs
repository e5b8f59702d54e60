//! Trial records and the stores that keep them between runs.
//!
//! A record is written after every completed sample, so an interrupted run
//! loses at most the sample that was in flight.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::trial::{CollisionSample, PreImageSample};
use crate::truncate::{BitWidth, Digest};
use crate::StateStore;

/// Full persisted state of one trial.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedTrial {
    pub bit_width: u32,
    #[serde(with = "hex_digest")]
    pub target_digest: Digest,
    /// Ordered by discovery; anchors are unique.
    pub collision_samples: Vec<CollisionSample>,
    pub pre_image_samples: Vec<PreImageSample>,
}

mod hex_digest {
    use serde::{de, Deserialize, Deserializer, Serializer};

    use crate::truncate::{Digest, DIGEST_LEN};

    pub fn serialize<S: Serializer>(digest: &Digest, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(digest))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Digest, D::Error> {
        let text = String::deserialize(deserializer)?;
        let mut digest = [0u8; DIGEST_LEN];
        hex::decode_to_slice(&text, &mut digest).map_err(de::Error::custom)?;
        Ok(digest)
    }
}

/// One pretty-printed JSON file per width inside a results directory.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    /// Opens `dir`, creating it when absent.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| Error::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, width: BitWidth) -> PathBuf {
        self.dir
            .join(format!("hash-attack-trial-{}bits.json", width.bits()))
    }
}

impl StateStore for JsonDirStore {
    fn load(&mut self, width: BitWidth) -> Result<Option<PersistedTrial>> {
        let path = self.path_for(width);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(Error::Io { path, source }),
        };
        let record: PersistedTrial =
            serde_json::from_slice(&bytes).map_err(|source| Error::Decode {
                path: path.clone(),
                source,
            })?;
        if record.bit_width != width.bits() {
            return Err(Error::WidthMismatch {
                expected: width.bits(),
                found: record.bit_width,
            });
        }
        debug!(path = %path.display(), "loaded trial record");
        Ok(Some(record))
    }

    fn save(&mut self, record: &PersistedTrial) -> Result<()> {
        let width = BitWidth::new(record.bit_width)?;
        let path = self.path_for(width);
        let bytes = serde_json::to_vec_pretty(record).map_err(|source| Error::Encode {
            width: record.bit_width,
            source,
        })?;
        // Write beside the target and rename so a crash never leaves a torn record.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes).map_err(|source| Error::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| Error::Io {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "saved trial record");
        Ok(())
    }
}

/// In-memory store keyed by width.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    records: BTreeMap<u32, PersistedTrial>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: PersistedTrial) {
        self.records.insert(record.bit_width, record);
    }

    pub fn get(&self, width: BitWidth) -> Option<&PersistedTrial> {
        self.records.get(&width.bits())
    }

    /// Number of `save` calls so far.
    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl StateStore for MemoryStore {
    fn load(&mut self, width: BitWidth) -> Result<Option<PersistedTrial>> {
        Ok(self.records.get(&width.bits()).cloned())
    }

    fn save(&mut self, record: &PersistedTrial) -> Result<()> {
        self.records.insert(record.bit_width, record.clone());
        self.saves += 1;
        Ok(())
    }
}
