use super::{Block, BlockData, ContentDocument};
use crate::errors::DecodeError;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

#[derive(Deserialize)]
struct RawDocument {
    time: Option<i64>,
    version: Option<String>,
    blocks: Vec<RawBlock>,
}

#[derive(Deserialize)]
struct RawBlock {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

/// Decodes a content schema string.
///
/// Nesting depth is bounded only by the JSON parser's recursion limit, so
/// pathological input fails with [`DecodeError::Syntax`] rather than
/// exhausting the stack.
pub fn decode(raw: &str) -> Result<ContentDocument, DecodeError> {
    let document: RawDocument = serde_json::from_str(raw)?;

    let blocks = document
        .blocks
        .into_iter()
        .map(decode_block)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ContentDocument {
        time: document.time,
        version: document.version,
        blocks,
    })
}

fn decode_block(raw: RawBlock) -> Result<Block, DecodeError> {
    let RawBlock { id, kind, data } = raw;

    let data = match kind.as_str() {
        "paragraph" => BlockData::Paragraph(payload(&id, &kind, data)?),
        "header" => BlockData::Header(payload(&id, &kind, data)?),
        "image" => BlockData::Image(payload(&id, &kind, data)?),
        "list" => BlockData::List(payload(&id, &kind, data)?),
        _ => BlockData::Unknown {
            kind: kind.clone(),
            data,
        },
    };

    Ok(Block { id, data })
}

fn payload<T: DeserializeOwned>(id: &str, kind: &str, data: Value) -> Result<T, DecodeError> {
    // A missing or null payload is a block with every field absent
    let data = match data {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other,
    };

    serde_json::from_value(data).map_err(|source| DecodeError::Block {
        id: id.to_string(),
        kind: kind.to_string(),
        source,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaStatus {
    Decoded,
    /// The schema could not be decoded and an empty document was used instead.
    Degraded { reason: String },
}

/// Result of decoding a schema with the degrade-to-empty policy.
#[derive(Debug)]
pub struct SchemaOutcome {
    pub document: ContentDocument,
    pub error: Option<DecodeError>,
}

impl SchemaOutcome {
    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }

    pub fn status(&self) -> SchemaStatus {
        match &self.error {
            None => SchemaStatus::Decoded,
            Some(e) => SchemaStatus::Degraded {
                reason: e.to_string(),
            },
        }
    }
}

/// Decodes a schema, falling back to an empty document if it is malformed.
///
/// The fallback never distinguishes partially valid documents: any error
/// discards every block.
pub fn decode_or_empty(raw: &str) -> SchemaOutcome {
    match decode(raw) {
        Ok(document) => SchemaOutcome {
            document,
            error: None,
        },
        Err(e) => SchemaOutcome {
            document: ContentDocument::empty(),
            error: Some(e),
        },
    }
}
