//! Rubric Store — the single persisted artifact in the system.
//!
//! The rubric is one JSON file: a `system` instruction plus, optionally,
//! a `checklist` array of items. It is read on every evaluation and
//! overwritten only through the admin surface. There is no versioning
//! and no history; the file is the sole source of truth.

pub mod handlers;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum RubricStoreError {
    #[error("Rubric file not found: {0}")]
    NotFound(String),

    #[error("Rubric file could not be read: {0}")]
    Read(String),

    #[error("Rubric file is not valid JSON: {0}")]
    Parse(String),

    #[error("Rubric schema error: {0}")]
    Schema(String),

    #[error("Rubric write failed: {0}")]
    Write(String),
}

/// The evaluation rubric.
///
/// `system` is the system instruction sent on every external call. When
/// `checklist` is present the orchestrator runs in per-item mode; when
/// absent it runs in single-call structured mode. Operator-defined
/// fields beyond these two are preserved verbatim across round-trips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rubric {
    pub system: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checklist: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// File-backed store for the rubric.
///
/// Writes go to a temp file in the same directory and are renamed over
/// the target, so a concurrent `load` never observes a torn file. Writes
/// within this process are additionally serialized behind a mutex;
/// across processes the last writer wins.
pub struct RubricStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl RubricStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and validates the current rubric.
    pub async fn load(&self) -> Result<Rubric, RubricStoreError> {
        let value = self.read_value().await?;
        serde_json::from_value(value).map_err(|e| RubricStoreError::Schema(e.to_string()))
    }

    /// Returns the rubric file as the admin surface stored it, validated
    /// but otherwise untouched.
    pub async fn load_raw(&self) -> Result<Value, RubricStoreError> {
        self.read_value().await
    }

    async fn read_value(&self) -> Result<Value, RubricStoreError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RubricStoreError::NotFound(self.path.display().to_string()))
            }
            Err(e) => return Err(RubricStoreError::Read(e.to_string())),
        };

        let value: Value =
            serde_json::from_str(&raw).map_err(|e| RubricStoreError::Parse(e.to_string()))?;

        let obj = value
            .as_object()
            .ok_or_else(|| RubricStoreError::Schema("rubric must be a JSON object".to_string()))?;

        if !obj.get("system").map(Value::is_string).unwrap_or(false) {
            return Err(RubricStoreError::Schema(
                "rubric is missing the 'system' string field".to_string(),
            ));
        }

        Ok(value)
    }

    /// Overwrites the rubric. The payload must be a JSON object; its
    /// shape is otherwise the caller's responsibility.
    pub async fn save(&self, new_rubric: &Value) -> Result<(), RubricStoreError> {
        if !new_rubric.is_object() {
            return Err(RubricStoreError::Schema(
                "rubric must be a JSON object".to_string(),
            ));
        }

        let pretty = serde_json::to_string_pretty(new_rubric)
            .map_err(|e| RubricStoreError::Write(e.to_string()))?;

        let _guard = self.write_lock.lock().await;

        // Write-then-rename keeps readers from seeing a partial file.
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, pretty.as_bytes())
            .await
            .map_err(|e| RubricStoreError::Write(e.to_string()))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| RubricStoreError::Write(e.to_string()))?;

        Ok(())
    }
}
