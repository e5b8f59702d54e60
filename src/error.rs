use std::path::PathBuf;

use thiserror::Error;

use crate::truncate::MAX_WIDTH;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("truncation width {0} exceeds the {}-bit digest", MAX_WIDTH)]
    InvalidWidth(u32),
    #[error("a trial needs a positive truncation width")]
    ZeroWidth,
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot decode trial record {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("cannot encode trial record for {width} bits: {source}")]
    Encode {
        width: u32,
        #[source]
        source: serde_json::Error,
    },
    #[error("record for {expected} bits holds a trial for {found} bits")]
    WidthMismatch { expected: u32, found: u32 },
    #[error("invalid trial record: {0}")]
    InvalidRecord(String),
    #[error("anchor {message} already belongs to the {owner}-bit trial")]
    DuplicateAnchor { message: String, owner: u32 },
    #[error("target digest {digest} already belongs to the {owner}-bit trial")]
    DuplicateTarget { digest: String, owner: u32 },
    #[error("no match for {width} bits within {limit} iterations")]
    IterationCeiling { width: u32, limit: u64 },
    #[error("configuration error: {0}")]
    Config(String),
}
