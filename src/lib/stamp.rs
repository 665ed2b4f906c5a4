//! The stamp file: a persisted marker recording the parameters of the last successful
//! fetch, used to decide whether a re-run can skip its work entirely.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde_json::Value;

use super::error::Error;

/// Upper bound on the bytes read before parsing, so a malformed or hostile stamp file
/// cannot balloon memory.
const MAX_STAMP_BYTES: u64 = 8192;

/// The destination directory's marker file.
///
/// All fields are persisted, but only the package identity takes part in the reuse
/// decision (see [`same_package`](Stamp::same_package)); the digest and patch fields
/// are recorded for inspection.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Stamp {
    pub package_name: String,
    pub package_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_sha256: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch_executable: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub patch_sha256s: Vec<String>,
}

/// Why a stamp file could not be decoded. Callers treat any of these as "no valid
/// stamp" rather than a hard failure.
#[derive(Debug, thiserror::Error)]
pub enum StampDecodeError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("decoded JSON should be a map, but got {found}")]
    NotAMap { found: &'static str },
    #[error("{field} key/value pair is missing")]
    MissingField { field: &'static str },
    #[error("{field} should be a {expected}, but got {found}")]
    WrongType {
        field: String,
        expected: &'static str,
        found: &'static str,
    },
}

impl Stamp {
    /// Whether `other` records a fetch of the same package. Reuse is decided by name
    /// and version alone: a stamp whose stored digest or patch list differs from the
    /// requested ones still counts as the same package, trusting the version tag.
    pub fn same_package(&self, other: &Stamp) -> bool {
        self.package_name == other.package_name
            && self.package_version == other.package_version
    }

    /// Serialize to `path`, overwriting any existing file.
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Parse the stamp file at `path`, validating each field individually so the error
    /// names exactly what was wrong.
    pub fn load(path: &Path) -> Result<Self, StampDecodeError> {
        let mut encoded = String::new();
        File::open(path)?
            .take(MAX_STAMP_BYTES)
            .read_to_string(&mut encoded)?;

        let decoded: Value = serde_json::from_str(&encoded)?;
        let map = match &decoded {
            Value::Object(map) => map,
            other => {
                return Err(StampDecodeError::NotAMap {
                    found: json_type_name(other),
                });
            }
        };

        Ok(Self {
            package_name: required_string(map, "package_name")?,
            package_version: required_string(map, "package_version")?,
            package_sha256: optional_string(map, "package_sha256")?,
            patch_executable: optional_string(map, "patch_executable")?,
            patch_sha256s: optional_string_list(map, "patch_sha256s")?,
        })
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn required_string(
    map: &serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<String, StampDecodeError> {
    match map.get(field) {
        None | Some(Value::Null) => Err(StampDecodeError::MissingField { field }),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(StampDecodeError::WrongType {
            field: field.to_owned(),
            expected: "string",
            found: json_type_name(other),
        }),
    }
}

fn optional_string(
    map: &serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, StampDecodeError> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(StampDecodeError::WrongType {
            field: field.to_owned(),
            expected: "string",
            found: json_type_name(other),
        }),
    }
}

fn optional_string_list(
    map: &serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<Vec<String>, StampDecodeError> {
    let items = match map.get(field) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(StampDecodeError::WrongType {
                field: field.to_owned(),
                expected: "list",
                found: json_type_name(other),
            });
        }
    };
    items
        .iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::String(s) => Ok(s.clone()),
            other => Err(StampDecodeError::WrongType {
                field: format!("{field}[{i}]"),
                expected: "string",
                found: json_type_name(other),
            }),
        })
        .collect()
}
