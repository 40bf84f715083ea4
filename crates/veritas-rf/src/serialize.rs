//! Model persistence via a versioned bincode envelope.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::error::RfError;
use crate::forest::RandomForest;

/// Current binary format version.
const FORMAT_VERSION: u32 = 1;

/// Origin reported in errors for models decoded from memory.
const IN_MEMORY: &str = "<memory>";

/// Versioned envelope for the serialized model.
#[derive(serde::Serialize, serde::Deserialize)]
struct ModelEnvelope {
    format_version: u32,
    n_trees: usize,
    n_features: usize,
    n_classes: usize,
    forest: RandomForest,
}

impl RandomForest {
    /// Encode the forest, trees and hyperparameters, into a byte blob.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::SerializeModel`] if bincode encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, RfError> {
        let envelope = ModelEnvelope {
            format_version: FORMAT_VERSION,
            n_trees: self.trees.len(),
            n_features: self.n_features,
            n_classes: self.n_classes,
            forest: self.clone(),
        };
        bincode::serialize(&envelope).map_err(|source| RfError::SerializeModel { source })
    }

    /// Decode a forest produced by [`RandomForest::to_bytes`].
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::DeserializeModel`] | bincode decoding failed |
    /// | [`RfError::IncompatibleModelVersion`] | format version mismatch |
    /// | [`RfError::CorruptModel`] | the decoded forest is inconsistent |
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RfError> {
        decode(bytes, Path::new(IN_MEMORY))
    }
}

fn decode(bytes: &[u8], origin: &Path) -> Result<RandomForest, RfError> {
    let envelope: ModelEnvelope =
        bincode::deserialize(bytes).map_err(|source| RfError::DeserializeModel {
            path: origin.to_path_buf(),
            source,
        })?;

    if envelope.format_version != FORMAT_VERSION {
        return Err(RfError::IncompatibleModelVersion {
            expected: FORMAT_VERSION,
            found: envelope.format_version,
            path: origin.to_path_buf(),
        });
    }

    validate(&envelope).map_err(|reason| RfError::CorruptModel {
        path: origin.to_path_buf(),
        reason,
    })?;

    debug!(
        n_trees = envelope.n_trees,
        n_features = envelope.n_features,
        n_classes = envelope.n_classes,
        "model decoded"
    );
    Ok(envelope.forest)
}

/// Check that the envelope header agrees with the forest and every tree is
/// internally consistent.
fn validate(envelope: &ModelEnvelope) -> Result<(), String> {
    let forest = &envelope.forest;
    if forest.trees.is_empty() {
        return Err("forest has no trees".to_string());
    }
    if envelope.n_trees != forest.trees.len()
        || envelope.n_features != forest.n_features
        || envelope.n_classes != forest.n_classes
    {
        return Err("envelope header disagrees with forest".to_string());
    }
    for (i, tree) in forest.trees.iter().enumerate() {
        if tree.n_features() != forest.n_features || tree.n_classes() != forest.n_classes {
            return Err(format!("tree {i} has a different shape than the forest"));
        }
        tree.check_structure()
            .map_err(|reason| format!("tree {i}: {reason}"))?;
    }
    Ok(())
}

/// A model file on disk.
///
/// Saves replace the file atomically: the blob is written to a temporary
/// file in the same directory and renamed over the target, so a reader sees
/// either the old model or the new one.
#[derive(Debug, Clone)]
pub struct ModelStore {
    path: PathBuf,
}

impl ModelStore {
    /// A store backed by `path`. Nothing is touched until save or load.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Return the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the stored model with `forest`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::SerializeModel`] | bincode encoding failed |
    /// | [`RfError::WriteModel`] | temp file creation, write, or rename failed |
    #[instrument(skip_all, fields(path = %self.path.display()))]
    pub fn save(&self, forest: &RandomForest) -> Result<(), RfError> {
        let bytes = forest.to_bytes()?;
        let write_err = |source| RfError::WriteModel {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(&bytes).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;

        info!(
            size_bytes = bytes.len(),
            n_trees = forest.n_trees(),
            "model saved"
        );
        Ok(())
    }

    /// Load the stored model.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::ReadModel`] | file missing or unreadable |
    /// | [`RfError::DeserializeModel`] | bincode decoding failed |
    /// | [`RfError::IncompatibleModelVersion`] | format version mismatch |
    /// | [`RfError::CorruptModel`] | the decoded forest is inconsistent |
    #[instrument(skip_all, fields(path = %self.path.display()))]
    pub fn load(&self) -> Result<RandomForest, RfError> {
        let bytes = std::fs::read(&self.path).map_err(|source| RfError::ReadModel {
            path: self.path.clone(),
            source,
        })?;
        let forest = decode(&bytes, &self.path)?;
        info!(n_trees = forest.n_trees(), "model loaded");
        Ok(forest)
    }
}
