use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{CoreError, CoreErrorKind, CoreResult, Snapshot, SnapshotKind};

pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Opaque, transport-safe snapshot handed from one stage to the next.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ContinuationToken(String);

#[derive(Serialize, Deserialize)]
struct SnapshotFrame {
    version: u32,
    kind: SnapshotKind,
    data: Value,
}

impl ContinuationToken {
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn encode<T: Snapshot>(snapshot: &T) -> CoreResult<Self> {
        let data = serde_json::to_value(snapshot).map_err(|error| {
            codec_error(
                CoreErrorKind::Internal,
                format!("failed to serialize {:?} snapshot: {error}", T::KIND),
            )
        })?;
        let frame = SnapshotFrame {
            version: SNAPSHOT_SCHEMA_VERSION,
            kind: T::KIND,
            data,
        };
        let bytes = serde_json::to_vec(&frame).map_err(|error| {
            codec_error(
                CoreErrorKind::Internal,
                format!("failed to serialize snapshot frame: {error}"),
            )
        })?;
        Ok(Self(URL_SAFE_NO_PAD.encode(bytes)))
    }

    /// Fails with `InvalidInput` on foreign encodings, unknown schema
    /// versions, or a snapshot of a different resource type.
    pub fn decode<T: Snapshot>(&self) -> CoreResult<T> {
        let bytes = URL_SAFE_NO_PAD.decode(self.0.as_bytes()).map_err(|error| {
            codec_error(
                CoreErrorKind::InvalidInput,
                format!("continuation token is not valid base64: {error}"),
            )
        })?;
        let frame: SnapshotFrame = serde_json::from_slice(&bytes).map_err(|error| {
            codec_error(
                CoreErrorKind::InvalidInput,
                format!("continuation token does not hold a snapshot frame: {error}"),
            )
        })?;

        if frame.version != SNAPSHOT_SCHEMA_VERSION {
            return Err(codec_error(
                CoreErrorKind::InvalidInput,
                format!(
                    "unsupported snapshot schema version {} (expected {SNAPSHOT_SCHEMA_VERSION})",
                    frame.version
                ),
            ));
        }
        if frame.kind != T::KIND {
            return Err(codec_error(
                CoreErrorKind::InvalidInput,
                format!(
                    "continuation token holds a {:?} snapshot, expected {:?}",
                    frame.kind,
                    T::KIND
                ),
            ));
        }

        serde_json::from_value(frame.data).map_err(|error| {
            codec_error(
                CoreErrorKind::InvalidInput,
                format!("{:?} snapshot does not match schema: {error}", T::KIND),
            )
        })
    }
}

fn codec_error(kind: CoreErrorKind, message: String) -> CoreError {
    CoreError::new(kind, message)
}
