//! Payload schema for Qdrant points

use crate::documents::Document;
use qdrant_client::qdrant::{value::Kind, PointStruct, Value as QdrantValue};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use uuid::Uuid;

/// A point ready to be upserted to the store
#[derive(Debug, Clone, PartialEq)]
pub struct MoviePoint {
    pub id: Uuid,
    pub vector: Vec<f32>,
    pub payload: MoviePayload,
}

impl MoviePoint {
    /// Pair a document with its embedding; the point id is derived from the document id
    pub fn from_document(document: Document, vector: Vec<f32>) -> Self {
        Self {
            id: point_id_for(&document.id),
            vector,
            payload: MoviePayload {
                doc_id: document.id,
                text: document.text,
                title: document.metadata.title,
                year: document.metadata.year,
                rating: document.metadata.rating,
                watched: document.metadata.watched,
                augmented: document.metadata.augmented,
                variant: document.metadata.variant,
            },
        }
    }

    /// Convert to qdrant-client PointStruct
    pub fn to_point_struct(self) -> PointStruct {
        let payload_map = self.payload.to_qdrant_payload();
        PointStruct::new(self.id.to_string(), self.vector, payload_map)
    }
}

/// Stable point id for a document id
pub fn point_id_for(doc_id: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, doc_id.as_bytes())
}

/// Payload stored with each document in Qdrant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoviePayload {
    /// Document id (title, year and variant)
    pub doc_id: String,

    /// Embedded document text
    pub text: String,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,

    pub watched: bool,

    /// Set on paraphrased variants
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub augmented: Option<bool>,

    /// Paraphrase template index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<usize>,
}

impl MoviePayload {
    /// Convert to Qdrant payload format; unknown fields are omitted
    pub fn to_qdrant_payload(self) -> HashMap<String, QdrantValue> {
        let mut map = HashMap::new();

        map.insert("doc_id".to_string(), qdrant_value(Kind::StringValue(self.doc_id)));
        map.insert("text".to_string(), qdrant_value(Kind::StringValue(self.text)));
        map.insert("title".to_string(), qdrant_value(Kind::StringValue(self.title)));
        map.insert("watched".to_string(), qdrant_value(Kind::BoolValue(self.watched)));

        if let Some(year) = self.year {
            map.insert("year".to_string(), qdrant_value(Kind::IntegerValue(year as i64)));
        }
        if let Some(rating) = self.rating {
            map.insert("rating".to_string(), qdrant_value(Kind::DoubleValue(rating as f64)));
        }
        if let Some(augmented) = self.augmented {
            map.insert("augmented".to_string(), qdrant_value(Kind::BoolValue(augmented)));
        }
        if let Some(variant) = self.variant {
            map.insert("variant".to_string(), qdrant_value(Kind::IntegerValue(variant as i64)));
        }

        map
    }

    /// Parse a payload read back from the store
    pub fn from_json(map: Map<String, Value>) -> Option<Self> {
        serde_json::from_value(Value::Object(map)).ok()
    }
}

fn qdrant_value(kind: Kind) -> QdrantValue {
    QdrantValue { kind: Some(kind) }
}

/// Convert Qdrant value to serde_json Value
pub(crate) fn json_from_qdrant_value(v: QdrantValue) -> Value {
    match v.kind {
        Some(Kind::NullValue(_)) => Value::Null,
        Some(Kind::BoolValue(b)) => Value::Bool(b),
        Some(Kind::IntegerValue(i)) => Value::Number(i.into()),
        Some(Kind::DoubleValue(d)) => serde_json::Number::from_f64(d)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Some(Kind::StringValue(s)) => Value::String(s),
        Some(Kind::ListValue(list)) => Value::Array(
            list.values
                .into_iter()
                .map(json_from_qdrant_value)
                .collect(),
        ),
        Some(Kind::StructValue(s)) => Value::Object(
            s.fields
                .into_iter()
                .map(|(k, v)| (k, json_from_qdrant_value(v)))
                .collect(),
        ),
        None => Value::Null,
    }
}

/// Parse a Qdrant payload map
pub(crate) fn payload_from_qdrant(payload: HashMap<String, QdrantValue>) -> Option<MoviePayload> {
    let map: Map<String, Value> = payload
        .into_iter()
        .map(|(k, v)| (k, json_from_qdrant_value(v)))
        .collect();
    MoviePayload::from_json(map)
}
