//! Wire types returned by the listing procedure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One stored audio object eligible for deletion.
///
/// The procedure may return bare path strings or full objects; both decode
/// into this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CandidateWire")]
pub struct RetentionCandidate {
    pub path: String,
    pub consultation_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl RetentionCandidate {
    pub fn from_path(path: impl Into<String>) -> Self {
        Self { path: path.into(), consultation_id: None, created_at: None }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CandidateWire {
    Path(String),
    Object {
        #[serde(alias = "name", alias = "file_path")]
        path: String,
        #[serde(default)]
        consultation_id: Option<String>,
        #[serde(default)]
        created_at: Option<DateTime<Utc>>,
    },
}

impl From<CandidateWire> for RetentionCandidate {
    fn from(wire: CandidateWire) -> Self {
        match wire {
            CandidateWire::Path(path) => Self::from_path(path),
            CandidateWire::Object { path, consultation_id, created_at } => {
                Self { path, consultation_id, created_at }
            }
        }
    }
}

/// Response of the listing procedure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiredAudioListing {
    #[serde(default, deserialize_with = "null_as_default")]
    pub deleted_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub deleted_files: Vec<RetentionCandidate>,
}

/// Aggregates over zero rows come back as `null` rather than `[]` or `0`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl ExpiredAudioListing {
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let deleted_files: Vec<RetentionCandidate> =
            paths.into_iter().map(RetentionCandidate::from_path).collect();
        Self { deleted_count: deleted_files.len() as u64, deleted_files }
    }

    /// Nothing to delete: a zero count or an empty file list.
    pub fn is_empty(&self) -> bool {
        self.deleted_count == 0 || self.deleted_files.is_empty()
    }

    /// Object paths in listing order.
    pub fn paths(&self) -> Vec<String> {
        self.deleted_files.iter().map(|c| c.path.clone()).collect()
    }
}
