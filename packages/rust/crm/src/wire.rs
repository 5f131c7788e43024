//! CRM wire formats.
//!
//! Catalog read: `{ "customFields": [{ "id", "name", "fieldKey"?, "dataType" }] }`.
//! Contact write: `{ ...contact, "customFields": [{ "key", "field_value" }] }`.
//!
//! The write side is picky: a namespaced key (`contact.foo`) or a `value`
//! property instead of `field_value` is accepted with 200 and silently
//! dropped by the CRM. Keys are always bare here.

use leadbridge_shared::{
    ExternalFieldDefinition, FieldDataType, LeadBridgeError, Result, strip_namespace,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

// ---------------------------------------------------------------------------
// Catalog read
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogResponse {
    #[serde(default)]
    custom_fields: Vec<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireField {
    id: Option<String>,
    name: Option<String>,
    field_key: Option<String>,
    data_type: Option<String>,
}

/// Decode a catalog response body into typed field definitions.
///
/// Entries missing an `id` or `name` are skipped with a warning; unknown
/// `dataType` values become [`FieldDataType::Text`].
pub fn parse_catalog(body: &str) -> Result<Vec<ExternalFieldDefinition>> {
    let response: CatalogResponse = serde_json::from_str(body)
        .map_err(|e| LeadBridgeError::parse(format!("invalid catalog response: {e}")))?;

    let mut fields = Vec::with_capacity(response.custom_fields.len());
    for (index, raw) in response.custom_fields.into_iter().enumerate() {
        let wire: WireField = match serde_json::from_value(raw) {
            Ok(w) => w,
            Err(e) => {
                warn!(index, error = %e, "skipping malformed catalog entry");
                continue;
            }
        };

        let (Some(id), Some(name)) = (non_empty(wire.id), non_empty(wire.name)) else {
            warn!(index, "skipping catalog entry without id or name");
            continue;
        };

        let data_type = wire
            .data_type
            .as_deref()
            .map(FieldDataType::from_label)
            .unwrap_or(FieldDataType::Text);

        fields.push(ExternalFieldDefinition {
            id,
            display_name: name,
            key: non_empty(wire.field_key),
            data_type,
        });
    }

    Ok(fields)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Contact write
// ---------------------------------------------------------------------------

/// One custom field value in the contact write body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomFieldValue {
    /// Field id, only sent when the field has no key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Bare field key (no namespace prefix).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub field_value: String,
}

impl CustomFieldValue {
    /// Address a field by key when it has one, by id otherwise.
    pub fn new(id: &str, key: Option<&str>, value: impl Into<String>) -> Self {
        let key = key.map(strip_namespace).filter(|k| !k.is_empty());
        Self {
            id: key.is_none().then(|| id.to_string()),
            key: key.map(str::to_string),
            field_value: value.into(),
        }
    }
}

/// Contact upsert body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPayload {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub location_id: String,
    pub source: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub custom_fields: Vec<CustomFieldValue>,
}

/// What the CRM reported after an upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub contact_id: Option<String>,
    /// `true` when a new contact was created rather than updated.
    pub created: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UpsertResponse {
    new: bool,
    contact: Option<UpsertContact>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UpsertContact {
    id: Option<String>,
}

/// Decode an upsert response. Unknown shapes yield an empty outcome rather
/// than an error, since the write already succeeded.
pub(crate) fn parse_upsert(body: &str) -> UpsertOutcome {
    let response: UpsertResponse = serde_json::from_str(body).unwrap_or_default();
    UpsertOutcome {
        contact_id: response.contact.and_then(|c| c.id),
        created: response.new,
    }
}
