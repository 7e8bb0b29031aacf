//! Labels store.
//!
//! This module persists verdicts. It provides:
//! 1. **Run environment:** Output directory and processor name, from the process environment.
//! 2. **Label fields:** The JSON fields a verdict maps onto.
//! 3. **Store:** A read-modify-write JSON file keyed by processor name.
//!
//! The store never drops data it did not write: other processors and other keys of the
//! probed processor's entry survive every update. A missing or unreadable store is treated as
//! empty.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use crate::common::StoreError;
use crate::common::constants::UNDETECTED;
use crate::probe::{ProbeReport, Verdict};

/// Environment variable naming the output directory.
pub const OUTPUT_DIR_VAR: &str = "OUTPUT_DIR";

/// Output directory used when [`OUTPUT_DIR_VAR`] is unset.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Processor name used when the output directory has no usable last component (`.`, `..`, `/`).
pub const DEFAULT_PROCESSOR_NAME: &str = "processor";

/// Where results go and under which name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunEnvironment {
    /// Directory holding the labels file.
    pub output_dir: PathBuf,
    /// Processor name; keys the labels file and its entry.
    pub processor_name: String,
}

impl RunEnvironment {
    /// Builds an environment whose processor name is the last component of `output_dir`.
    ///
    /// Falls back to [`DEFAULT_PROCESSOR_NAME`] when that component is missing or empty.
    pub fn for_output_dir(output_dir: impl Into<PathBuf>) -> Self {
        let output_dir = output_dir.into();
        let processor_name = output_dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_PROCESSOR_NAME.to_owned());
        Self {
            output_dir,
            processor_name,
        }
    }

    /// Reads [`OUTPUT_DIR_VAR`], falling back to [`DEFAULT_OUTPUT_DIR`].
    pub fn from_env() -> Self {
        let output_dir =
            std::env::var_os(OUTPUT_DIR_VAR).map_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR), PathBuf::from);
        Self::for_output_dir(output_dir)
    }

    /// Labels store of this run; both the file and the entry are named after the processor.
    pub fn store(&self) -> LabelStore {
        LabelStore::new(&self.output_dir, &self.processor_name)
    }
}

/// Classification fields of one labels entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LabelFields {
    /// Detected data width or `"Undetected"`.
    pub bits: Value,
    /// `true`, `false` or `"Undetected"`.
    pub multicycle: Value,
    /// `{"depth": d}`, `false` or `"Undetected"`.
    pub pipeline: Value,
    /// `true`, `false` or `"Undetected"`.
    pub singlecycle: Value,
}

impl LabelFields {
    /// Maps a verdict and width onto label values.
    pub fn new(verdict: Verdict, bits: Option<u32>) -> Self {
        let undetected = || Value::from(UNDETECTED);
        let bits = bits.map_or_else(undetected, Value::from);
        let (multicycle, pipeline, singlecycle) = match verdict {
            Verdict::Multicycle => (json!(true), json!(false), json!(false)),
            Verdict::SingleCycle => (json!(false), json!(false), json!(true)),
            Verdict::Pipelined { depth } => (json!(false), json!({ "depth": depth }), json!(false)),
            Verdict::Undetermined => (undetected(), undetected(), undetected()),
        };
        Self {
            bits,
            multicycle,
            pipeline,
            singlecycle,
        }
    }

    fn merge_into(self, entry: &mut Map<String, Value>) {
        let _ = entry.insert("bits".to_owned(), self.bits);
        let _ = entry.insert("multicycle".to_owned(), self.multicycle);
        let _ = entry.insert("pipeline".to_owned(), self.pipeline);
        let _ = entry.insert("singlecycle".to_owned(), self.singlecycle);
    }
}

/// Per-processor JSON labels file, `<output_dir>/<processor>_labels.json`.
///
/// The processor name keys both the file and the entry written into it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelStore {
    path: PathBuf,
    processor: String,
}

impl LabelStore {
    /// Store for `processor` inside `output_dir`.
    pub fn new(output_dir: impl AsRef<Path>, processor: &str) -> Self {
        Self {
            path: output_dir.as_ref().join(format!("{processor}_labels.json")),
            processor: processor.to_owned(),
        }
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Key of the entry this store updates.
    pub fn processor(&self) -> &str {
        &self.processor
    }

    /// Reads the whole store.
    ///
    /// Missing, unreadable and non-object files read as an empty map.
    pub fn load(&self) -> Map<String, Value> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "labels store does not exist yet");
                return Map::new();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "cannot read labels store; starting empty");
                return Map::new();
            }
        };
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                warn!(path = %self.path.display(), "labels store is not a JSON object; starting empty");
                Map::new()
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "corrupt labels store; starting empty");
                Map::new()
            }
        }
    }

    /// Merges `report` into this store's entry and rewrites the file.
    ///
    /// The entry is keyed by the store's processor name, not by the name the core reports.
    ///
    /// # Errors
    ///
    /// [`StoreError`] if the directory cannot be created or the file cannot be written.
    pub fn record(&self, report: &ProbeReport) -> Result<(), StoreError> {
        if report.processor != self.processor {
            debug!(
                core = %report.processor,
                processor = %self.processor,
                "core name differs from labels key"
            );
        }
        self.merge(LabelFields::new(report.verdict, report.bits))
    }

    /// Merges `fields` into this store's entry, keeping every other key.
    ///
    /// # Errors
    ///
    /// [`StoreError`] if the directory cannot be created or the file cannot be written.
    pub fn merge(&self, fields: LabelFields) -> Result<(), StoreError> {
        let processor = self.processor.as_str();
        let mut data = self.load();
        let entry = data
            .entry(processor.to_owned())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            warn!(processor, "labels entry is not an object; replacing it");
            *entry = Value::Object(Map::new());
        }
        if let Value::Object(entry) = entry {
            fields.merge_into(entry);
        }
        self.write(&Value::Object(data))?;
        info!(path = %self.path.display(), processor, "labels saved");
        Ok(())
    }

    fn write(&self, data: &Value) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        data.serialize(&mut ser).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        buf.push(b'\n');
        fs::write(&self.path, buf).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}
