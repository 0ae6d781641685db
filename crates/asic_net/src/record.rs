//! The transport record format.
//!
//! Every operation crossing the process boundary is a triple
//! `(key, field-value sequence, op)`:
//!
//! - `key` is `"<OBJECT_TYPE>:<serialized-id>"` where the id is either
//!   `oid:0x<hex>` for oid objects or the canonical JSON form of a
//!   structured entry key;
//! - each field is an attribute name paired with its canonical value
//!   string;
//! - `op` is one of the tags below.
//!
//! The two reconciliation triggers (`INIT_VIEW`, `APPLY_VIEW`) travel as
//! ordinary `notify` records with the command as the key.

use serde::{Deserialize, Serialize};

use asic_model::{EntryKey, ModelError, ObjectId, ObjectType};

use crate::error::NetError;

/// Operation tag of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordOp {
    Create,
    Remove,
    Set,
    Get,
    BulkCreate,
    BulkRemove,
    BulkSet,
    Notify,
    GetResponse,
}

impl RecordOp {
    /// The lowercase wire tag.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            RecordOp::Create => "create",
            RecordOp::Remove => "remove",
            RecordOp::Set => "set",
            RecordOp::Get => "get",
            RecordOp::BulkCreate => "bulkcreate",
            RecordOp::BulkRemove => "bulkremove",
            RecordOp::BulkSet => "bulkset",
            RecordOp::Notify => "notify",
            RecordOp::GetResponse => "getresponse",
        }
    }

    /// Parse a wire tag.
    pub fn from_tag(tag: &str) -> Result<RecordOp, NetError> {
        match tag {
            "create" => Ok(RecordOp::Create),
            "remove" => Ok(RecordOp::Remove),
            "set" => Ok(RecordOp::Set),
            "get" => Ok(RecordOp::Get),
            "bulkcreate" => Ok(RecordOp::BulkCreate),
            "bulkremove" => Ok(RecordOp::BulkRemove),
            "bulkset" => Ok(RecordOp::BulkSet),
            "notify" => Ok(RecordOp::Notify),
            "getresponse" => Ok(RecordOp::GetResponse),
            other => Err(NetError::Malformed(format!("unknown op tag {other:?}"))),
        }
    }
}

/// Key of the record requesting a view swap start.
pub const INIT_VIEW: &str = "INIT_VIEW";
/// Key of the record requesting the current/temporary diff to be applied.
pub const APPLY_VIEW: &str = "APPLY_VIEW";
/// Field name carrying the request correlation id on get/getresponse.
pub const REQUEST_ID_FIELD: &str = "request_id";
/// Field name carrying a status on responses.
pub const STATUS_FIELD: &str = "status";

/// One transport record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// `"<OBJECT_TYPE>:<serialized-id>"`, or a bare command name.
    pub key: String,
    /// Attribute name / canonical value pairs.
    pub fields: Vec<(String, String)>,
    /// Operation tag.
    pub op: RecordOp,
}

impl Record {
    /// Build a record for an oid object.
    #[must_use]
    pub fn for_oid(
        op: RecordOp,
        object_type: ObjectType,
        oid: ObjectId,
        fields: Vec<(String, String)>,
    ) -> Record {
        Record {
            key: format!("{}:{oid}", object_type.name()),
            fields,
            op,
        }
    }

    /// Build a record for a structured entry.
    #[must_use]
    pub fn for_entry(op: RecordOp, key: &EntryKey, fields: Vec<(String, String)>) -> Record {
        Record {
            key: format!("{}:{}", key.object_type().name(), key.to_canon()),
            fields,
            op,
        }
    }

    /// The `INIT_VIEW` trigger record.
    #[must_use]
    pub fn init_view() -> Record {
        Record {
            key: INIT_VIEW.to_string(),
            fields: Vec::new(),
            op: RecordOp::Notify,
        }
    }

    /// The `APPLY_VIEW` trigger record.
    #[must_use]
    pub fn apply_view() -> Record {
        Record {
            key: APPLY_VIEW.to_string(),
            fields: Vec::new(),
            op: RecordOp::Notify,
        }
    }

    /// Build a GET request with a fresh correlation id; returns the record
    /// and the id the caller should await on the response subject.
    #[must_use]
    pub fn get_request(
        object_type: ObjectType,
        oid: ObjectId,
        attr_names: &[&str],
    ) -> (Record, String) {
        let request_id = uuid::Uuid::new_v4().to_string();
        let mut fields = vec![(REQUEST_ID_FIELD.to_string(), request_id.clone())];
        fields.extend(
            attr_names
                .iter()
                .map(|n| ((*n).to_string(), String::new())),
        );
        (
            Record::for_oid(RecordOp::Get, object_type, oid, fields),
            request_id,
        )
    }

    /// Build a GET response echoing the request correlation id.
    #[must_use]
    pub fn get_response(
        request_id: &str,
        status: &str,
        values: Vec<(String, String)>,
    ) -> Record {
        let mut fields = vec![
            (REQUEST_ID_FIELD.to_string(), request_id.to_string()),
            (STATUS_FIELD.to_string(), status.to_string()),
        ];
        fields.extend(values);
        Record {
            key: String::new(),
            fields,
            op: RecordOp::GetResponse,
        }
    }

    /// Whether this record is one of the view-swap triggers.
    #[must_use]
    pub fn is_view_command(&self) -> bool {
        self.op == RecordOp::Notify && (self.key == INIT_VIEW || self.key == APPLY_VIEW)
    }

    /// Split the key into its object type and serialized id.
    pub fn parse_key(&self) -> Result<(ObjectType, &str), NetError> {
        let (type_name, id) = self
            .key
            .split_once(':')
            .ok_or_else(|| NetError::Malformed(format!("no colon in key {:?}", self.key)))?;
        let object_type = ObjectType::from_name(type_name)
            .map_err(|e: ModelError| NetError::Malformed(e.to_string()))?;
        Ok((object_type, id))
    }

    /// Value of a named field, if present.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Error handling mode of a bulk record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkErrorMode {
    /// Stop at the first failing element; later elements are not attempted.
    StopOnError,
    /// Attempt every element, reporting status per element.
    IgnoreError,
}

impl BulkErrorMode {
    const FIELD: &'static str = "error_mode";

    fn tag(self) -> &'static str {
        match self {
            BulkErrorMode::StopOnError => "stop_on_error",
            BulkErrorMode::IgnoreError => "ignore_error",
        }
    }

    fn from_tag(tag: &str) -> Result<Self, NetError> {
        match tag {
            "stop_on_error" => Ok(BulkErrorMode::StopOnError),
            "ignore_error" => Ok(BulkErrorMode::IgnoreError),
            other => Err(NetError::Malformed(format!(
                "unknown bulk error mode {other:?}"
            ))),
        }
    }
}

/// A bulk operation: several objects of one type sharing a single transport
/// record. Semantics are identical to issuing the per-object operations one
/// by one in element order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkRecord {
    pub op: RecordOp,
    pub object_type: ObjectType,
    pub mode: BulkErrorMode,
    /// Per element: serialized object id and its attribute fields.
    pub entries: Vec<(String, Vec<(String, String)>)>,
}

impl BulkRecord {
    /// Flatten into one wire record. Each element's attribute list is
    /// embedded as a JSON array so attribute values never need escaping.
    pub fn to_record(&self) -> Result<Record, NetError> {
        let mut fields = vec![(BulkErrorMode::FIELD.to_string(), self.mode.tag().to_string())];
        for (id, attrs) in &self.entries {
            let blob = serde_json::to_string(attrs)
                .map_err(|e| NetError::Malformed(e.to_string()))?;
            fields.push((id.clone(), blob));
        }
        Ok(Record {
            key: self.object_type.name().to_string(),
            fields,
            op: self.op,
        })
    }

    /// Parse a bulk wire record back into its elements.
    pub fn from_record(record: &Record) -> Result<BulkRecord, NetError> {
        if !matches!(
            record.op,
            RecordOp::BulkCreate | RecordOp::BulkRemove | RecordOp::BulkSet
        ) {
            return Err(NetError::Malformed(format!(
                "op {:?} is not a bulk operation",
                record.op
            )));
        }
        let object_type = ObjectType::from_name(&record.key)
            .map_err(|e| NetError::Malformed(e.to_string()))?;
        let mode_tag = record
            .field(BulkErrorMode::FIELD)
            .ok_or_else(|| NetError::Malformed("bulk record missing error_mode".to_string()))?;
        let mode = BulkErrorMode::from_tag(mode_tag)?;
        let mut entries = Vec::new();
        for (name, value) in &record.fields {
            if name == BulkErrorMode::FIELD {
                continue;
            }
            let attrs: Vec<(String, String)> = serde_json::from_str(value)
                .map_err(|e| NetError::Malformed(format!("bulk element {name:?}: {e}")))?;
            entries.push((name.clone(), attrs));
        }
        Ok(BulkRecord {
            op: record.op,
            object_type,
            mode,
            entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_tags_roundtrip() {
        for op in [
            RecordOp::Create,
            RecordOp::Remove,
            RecordOp::Set,
            RecordOp::Get,
            RecordOp::BulkCreate,
            RecordOp::BulkRemove,
            RecordOp::BulkSet,
            RecordOp::Notify,
            RecordOp::GetResponse,
        ] {
            assert_eq!(RecordOp::from_tag(op.tag()).unwrap(), op);
        }
        assert!(RecordOp::from_tag("flush").is_err());
    }

    #[test]
    fn test_oid_record_key() {
        let vid = ObjectId::encode(0, ObjectType::Port, 1).unwrap();
        let record = Record::for_oid(RecordOp::Create, ObjectType::Port, vid, Vec::new());
        let (ot, id) = record.parse_key().unwrap();
        assert_eq!(ot, ObjectType::Port);
        assert_eq!(id, vid.to_string());
    }

    #[test]
    fn test_entry_record_key() {
        let sw = ObjectId::encode(0, ObjectType::Switch, 1).unwrap();
        let vr = ObjectId::encode(0, ObjectType::VirtualRouter, 1).unwrap();
        let key = EntryKey::Route {
            switch_id: sw,
            vr_id: vr,
            dest: "10.0.0.0/24".parse().unwrap(),
        };
        let record = Record::for_entry(RecordOp::Create, &key, Vec::new());
        let (ot, id) = record.parse_key().unwrap();
        assert_eq!(ot, ObjectType::RouteEntry);
        assert_eq!(EntryKey::from_canon(ot, id).unwrap(), key);
    }

    #[test]
    fn test_view_commands() {
        assert!(Record::init_view().is_view_command());
        assert!(Record::apply_view().is_view_command());
        let vid = ObjectId::encode(0, ObjectType::Port, 1).unwrap();
        let plain = Record::for_oid(RecordOp::Set, ObjectType::Port, vid, Vec::new());
        assert!(!plain.is_view_command());
    }

    #[test]
    fn test_get_request_carries_correlation_id() {
        let vid = ObjectId::encode(0, ObjectType::Port, 1).unwrap();
        let (record, request_id) =
            Record::get_request(ObjectType::Port, vid, &["SAI_PORT_ATTR_SPEED"]);
        assert_eq!(record.field(REQUEST_ID_FIELD), Some(request_id.as_str()));

        let response = Record::get_response(
            &request_id,
            "SAI_STATUS_SUCCESS",
            vec![("SAI_PORT_ATTR_SPEED".to_string(), "40000".to_string())],
        );
        assert_eq!(response.field(REQUEST_ID_FIELD), Some(request_id.as_str()));
        assert_eq!(response.field("SAI_PORT_ATTR_SPEED"), Some("40000"));
    }

    #[test]
    fn test_bulk_roundtrip() {
        let bulk = BulkRecord {
            op: RecordOp::BulkCreate,
            object_type: ObjectType::RouteEntry,
            mode: BulkErrorMode::IgnoreError,
            entries: vec![
                (
                    "{\"dest\":\"10.0.0.0/24\"}".to_string(),
                    vec![(
                        "SAI_ROUTE_ENTRY_ATTR_PACKET_ACTION".to_string(),
                        "SAI_PACKET_ACTION_FORWARD".to_string(),
                    )],
                ),
                ("{\"dest\":\"10.0.1.0/24\"}".to_string(), Vec::new()),
            ],
        };
        let record = bulk.to_record().unwrap();
        assert_eq!(BulkRecord::from_record(&record).unwrap(), bulk);
    }

    #[test]
    fn test_bulk_rejects_non_bulk_op() {
        let vid = ObjectId::encode(0, ObjectType::Port, 1).unwrap();
        let record = Record::for_oid(RecordOp::Set, ObjectType::Port, vid, Vec::new());
        assert!(BulkRecord::from_record(&record).is_err());
    }
}
