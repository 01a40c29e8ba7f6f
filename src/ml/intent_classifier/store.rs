//! Persistence of trained intent models.
//!
//! A model is saved as three artifacts sharing one base name:
//!
//! | artifact | contents | payload |
//! |---|---|---|
//! | `<name>.model` | network parameters, metadata, training history | bincode |
//! | `<name>_words.bin` | vocabulary and analyzer configuration | JSON |
//! | `<name>_tags.bin` | tag list | JSON |
//!
//! Every artifact starts with the same little-endian header:
//!
//! ```text
//! magic "CLQY" | format version u16 | kind u8 | artifact id [u8; 16] | payload length u64 | CRC32 u32
//! ```
//!
//! The artifact id is a fresh UUID per save, so a triple assembled from
//! different saves is detected on load.

use std::io::{Cursor, Read, Write};
use std::sync::Arc;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::AnalyzerConfig;
use crate::error::{ColloquyError, Result};
use crate::ml::models::{ModelMetadata, TrainingStats};
use crate::ml::network::Sequential;
use crate::storage::{Storage, StorageError};

use super::vocabulary::{TagList, Vocabulary};

const MAGIC: [u8; 4] = *b"CLQY";
const FORMAT_VERSION: u16 = 1;
/// magic + version + kind + id + length + checksum
const HEADER_LEN: u64 = 4 + 2 + 1 + 16 + 8 + 4;

/// Everything needed to answer queries without retraining.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub network: Sequential,
    pub vocabulary: Vocabulary,
    pub tags: TagList,
    /// Analyzer that produced the vocabulary; replayed at inference.
    pub analyzer: AnalyzerConfig,
    pub metadata: ModelMetadata,
    pub stats: Option<TrainingStats>,
    /// Id of the artifact triple this model was loaded from.
    pub artifact_id: Option<Uuid>,
}

impl TrainedModel {
    /// Check that the network, vocabulary and tag list fit together.
    pub fn validate(&self) -> Result<()> {
        self.network.validate()?;
        if self.network.input_dim() != self.vocabulary.len() {
            return Err(ColloquyError::configuration(format!(
                "network expects {} inputs but the vocabulary has {} words",
                self.network.input_dim(),
                self.vocabulary.len()
            )));
        }
        if self.network.output_dim() != self.tags.len() {
            return Err(ColloquyError::configuration(format!(
                "network has {} outputs but the tag list has {} tags",
                self.network.output_dim(),
                self.tags.len()
            )));
        }
        Ok(())
    }
}

/// The three artifacts of a saved model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Model,
    Words,
    Tags,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [ArtifactKind::Model, ArtifactKind::Words, ArtifactKind::Tags];

    /// Storage file name of this artifact for model `name`.
    pub fn file_name(self, name: &str) -> String {
        match self {
            ArtifactKind::Model => format!("{name}.model"),
            ArtifactKind::Words => format!("{name}_words.bin"),
            ArtifactKind::Tags => format!("{name}_tags.bin"),
        }
    }

    fn code(self) -> u8 {
        match self {
            ArtifactKind::Model => 1,
            ArtifactKind::Words => 2,
            ArtifactKind::Tags => 3,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct ModelPayload {
    network: Sequential,
    metadata: ModelMetadata,
    stats: Option<TrainingStats>,
}

#[derive(Serialize, Deserialize)]
struct WordsPayload {
    analyzer: AnalyzerConfig,
    words: Vocabulary,
}

/// Saves and loads [`TrainedModel`]s through a [`Storage`] backend.
#[derive(Debug, Clone)]
pub struct ModelStore {
    storage: Arc<dyn Storage>,
}

impl ModelStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        ModelStore { storage }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Whether all three artifacts of `name` exist.
    pub fn exists(&self, name: &str) -> bool {
        ArtifactKind::ALL
            .iter()
            .all(|kind| self.storage.file_exists(&kind.file_name(name)))
    }

    /// Save `model` under `name` and return the new artifact id.
    ///
    /// All artifacts are written under temporary names first and only
    /// renamed into place once every one of them has been synced.
    pub fn save(&self, name: &str, model: &TrainedModel) -> Result<Uuid> {
        model.validate()?;
        let artifact_id = Uuid::new_v4();

        let model_payload = bincode::serialize(&ModelPayload {
            network: model.network.clone(),
            metadata: model.metadata.clone(),
            stats: model.stats.clone(),
        })?;
        let words_payload = serde_json::to_vec(&WordsPayload {
            analyzer: model.analyzer.clone(),
            words: model.vocabulary.clone(),
        })?;
        let tags_payload = serde_json::to_vec(&model.tags)?;

        let payloads = [
            (ArtifactKind::Model, model_payload),
            (ArtifactKind::Words, words_payload),
            (ArtifactKind::Tags, tags_payload),
        ];

        let mut written: Vec<(String, String)> = Vec::with_capacity(payloads.len());
        for (kind, payload) in &payloads {
            let final_name = kind.file_name(name);
            match self.write_temp(&final_name, *kind, artifact_id, payload) {
                Ok(temp_name) => written.push((temp_name, final_name)),
                Err(e) => {
                    self.discard(&written);
                    return Err(e);
                }
            }
        }

        for (temp_name, final_name) in &written {
            if let Err(e) = self.storage.rename_file(temp_name, final_name) {
                self.discard(&written);
                return Err(e);
            }
        }

        info!("Saved model '{name}' (artifact {artifact_id})");
        Ok(artifact_id)
    }

    fn write_temp(
        &self,
        final_name: &str,
        kind: ArtifactKind,
        artifact_id: Uuid,
        payload: &[u8],
    ) -> Result<String> {
        let (temp_name, mut output) = self.storage.create_temp_output(final_name)?;
        let expected = HEADER_LEN + payload.len() as u64;
        let result = write_artifact(&mut output, kind, artifact_id, payload)
            .and_then(|_| output.position())
            .and_then(|written| {
                if written == expected {
                    output.flush_and_sync()
                } else {
                    Err(StorageError::IoError(format!(
                        "{temp_name}: wrote {written} of {expected} bytes"
                    ))
                    .into())
                }
            });
        drop(output);

        match result {
            Ok(()) => {
                debug!("Wrote {expected} bytes to {temp_name}");
                Ok(temp_name)
            }
            Err(e) => {
                let _ = self.storage.delete_file(&temp_name);
                Err(e)
            }
        }
    }

    fn discard(&self, written: &[(String, String)]) {
        for (temp_name, _) in written {
            let _ = self.storage.delete_file(temp_name);
        }
    }

    /// Load the model saved under `name`.
    ///
    /// Fails with `NotFound` naming the first missing artifact, and with a
    /// configuration error when the artifacts come from different saves.
    pub fn load(&self, name: &str) -> Result<TrainedModel> {
        for kind in ArtifactKind::ALL {
            let file_name = kind.file_name(name);
            if !self.storage.file_exists(&file_name) {
                return Err(ColloquyError::not_found(format!(
                    "model artifact '{file_name}'"
                )));
            }
        }

        let (model_id, model_bytes) = self.read_artifact(name, ArtifactKind::Model)?;
        let (words_id, words_bytes) = self.read_artifact(name, ArtifactKind::Words)?;
        let (tags_id, tags_bytes) = self.read_artifact(name, ArtifactKind::Tags)?;

        if model_id != words_id || model_id != tags_id {
            return Err(ColloquyError::configuration(format!(
                "artifacts of model '{name}' come from different saves"
            )));
        }

        let model_payload: ModelPayload = bincode::deserialize(&model_bytes)?;
        let words_payload: WordsPayload = serde_json::from_slice(&words_bytes)?;
        let tags: TagList = serde_json::from_slice(&tags_bytes)?;

        let model = TrainedModel {
            network: model_payload.network,
            vocabulary: words_payload.words,
            tags,
            analyzer: words_payload.analyzer,
            metadata: model_payload.metadata,
            stats: model_payload.stats,
            artifact_id: Some(model_id),
        };
        model.validate()?;

        info!(
            "Loaded model '{name}' (artifact {model_id}): {} words, {} tags",
            model.vocabulary.len(),
            model.tags.len()
        );
        Ok(model)
    }

    fn read_artifact(&self, name: &str, kind: ArtifactKind) -> Result<(Uuid, Vec<u8>)> {
        let file_name = kind.file_name(name);
        let mut input = self.storage.open_input(&file_name)?;
        let size = input.size()?;
        if size < HEADER_LEN {
            return Err(StorageError::Corrupted(format!(
                "{file_name}: {size} bytes is shorter than the header"
            ))
            .into());
        }
        let mut bytes = vec![0u8; size as usize];
        input
            .read_exact(&mut bytes)
            .map_err(|e| StorageError::from_io(&file_name, e))?;
        decode_artifact(&file_name, &bytes, kind)
    }

    /// File name and size in bytes of every artifact of `name`.
    pub fn artifact_sizes(&self, name: &str) -> Result<Vec<(String, u64)>> {
        ArtifactKind::ALL
            .iter()
            .map(|kind| {
                let file_name = kind.file_name(name);
                let size = self.storage.file_size(&file_name)?;
                Ok((file_name, size))
            })
            .collect()
    }

    /// Delete every artifact of `name`.
    pub fn delete(&self, name: &str) -> Result<()> {
        for kind in ArtifactKind::ALL {
            self.storage.delete_file(&kind.file_name(name))?;
        }
        Ok(())
    }
}

fn write_artifact<W: Write + ?Sized>(
    writer: &mut W,
    kind: ArtifactKind,
    artifact_id: Uuid,
    payload: &[u8],
) -> Result<()> {
    writer.write_all(&MAGIC)?;
    writer.write_u16::<LittleEndian>(FORMAT_VERSION)?;
    writer.write_u8(kind.code())?;
    writer.write_all(artifact_id.as_bytes())?;
    writer.write_u64::<LittleEndian>(payload.len() as u64)?;
    writer.write_u32::<LittleEndian>(crc32fast::hash(payload))?;
    writer.write_all(payload)?;
    Ok(())
}

fn decode_artifact(file_name: &str, bytes: &[u8], kind: ArtifactKind) -> Result<(Uuid, Vec<u8>)> {
    let corrupted = |msg: &str| -> ColloquyError {
        StorageError::Corrupted(format!("{file_name}: {msg}")).into()
    };
    let mut cursor = Cursor::new(bytes);

    let mut magic = [0u8; 4];
    cursor
        .read_exact(&mut magic)
        .map_err(|_| corrupted("truncated header"))?;
    if magic != MAGIC {
        return Err(corrupted("not a model artifact"));
    }

    let version = cursor
        .read_u16::<LittleEndian>()
        .map_err(|_| corrupted("truncated header"))?;
    if version != FORMAT_VERSION {
        return Err(ColloquyError::configuration(format!(
            "{file_name}: unsupported format version {version}"
        )));
    }

    let code = cursor.read_u8().map_err(|_| corrupted("truncated header"))?;
    if code != kind.code() {
        return Err(ColloquyError::configuration(format!(
            "{file_name}: expected artifact kind {}, found {code}",
            kind.code()
        )));
    }

    let mut id = [0u8; 16];
    cursor
        .read_exact(&mut id)
        .map_err(|_| corrupted("truncated header"))?;
    let length = cursor
        .read_u64::<LittleEndian>()
        .map_err(|_| corrupted("truncated header"))?;
    let checksum = cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| corrupted("truncated header"))?;

    let offset = cursor.position() as usize;
    let payload = &bytes[offset..];
    if payload.len() as u64 != length {
        return Err(corrupted("payload length mismatch"));
    }
    if crc32fast::hash(payload) != checksum {
        return Err(corrupted("checksum mismatch"));
    }

    Ok((Uuid::from_bytes(id), payload.to_vec()))
}
