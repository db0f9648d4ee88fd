//! `.seed` file round-trip: 8-byte little-endian seed
//! followed by the JSON-serialized reduction outcome, so `--remove-fixed
//! <dir>` can regenerate from the stored seed and check whether the
//! divergence it once reproduced is still present.

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredOutcome {
    pub mode: String,
    pub debug_summary: String,
    pub release_summary: String,
}

#[derive(Debug, Error)]
pub enum SeedFileError {
    #[error("I/O error reading/writing {path}: {source}")]
    Io { path: String, source: std::io::Error },
    #[error("seed file {path} is too short to contain an 8-byte seed")]
    Truncated { path: String },
    #[error("malformed outcome JSON in {path}: {source}")]
    Json { path: String, source: serde_json::Error },
}

pub fn write(path: &Path, seed: u64, outcome: &StoredOutcome) -> Result<(), SeedFileError> {
    let mut bytes = seed.to_le_bytes().to_vec();
    bytes.extend_from_slice(serde_json::to_string(outcome).map_err(|source| SeedFileError::Json {
        path: path.display().to_string(),
        source,
    })?.as_bytes());
    let mut file = std::fs::File::create(path).map_err(|source| SeedFileError::Io { path: path.display().to_string(), source })?;
    file.write_all(&bytes).map_err(|source| SeedFileError::Io { path: path.display().to_string(), source })
}

pub fn read(path: &Path) -> Result<(u64, StoredOutcome), SeedFileError> {
    let mut bytes = Vec::new();
    std::fs::File::open(path)
        .and_then(|mut f| f.read_to_end(&mut bytes))
        .map_err(|source| SeedFileError::Io { path: path.display().to_string(), source })?;
    if bytes.len() < 8 {
        return Err(SeedFileError::Truncated { path: path.display().to_string() });
    }
    let seed = u64::from_le_bytes(bytes[..8].try_into().expect("checked length"));
    let outcome: StoredOutcome = serde_json::from_slice(&bytes[8..])
        .map_err(|source| SeedFileError::Json { path: path.display().to_string(), source })?;
    Ok((seed, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_seed_and_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1019504228635510285.seed");
        let outcome = StoredOutcome { mode: "ChecksumDivergence".into(), debug_summary: "1".into(), release_summary: "2".into() };
        write(&path, 1019504228635510285, &outcome).unwrap();
        let (seed, loaded) = read(&path).unwrap();
        assert_eq!(seed, 1019504228635510285);
        assert_eq!(loaded.mode, "ChecksumDivergence");
    }

    #[test]
    fn truncated_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.seed");
        std::fs::write(&path, [1, 2, 3]).unwrap();
        assert!(matches!(read(&path), Err(SeedFileError::Truncated { .. })));
    }
}
