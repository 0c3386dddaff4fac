use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Key under which every record carries its identifier.
pub const RECORD_ID_FIELD: &str = "id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRecordId")]
pub struct RecordId(pub i64);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRecordId {
    Int(i64),
    Text(String),
}

impl TryFrom<RawRecordId> for RecordId {
    type Error = RecordError;

    fn try_from(value: RawRecordId) -> Result<Self, Self::Error> {
        match value {
            RawRecordId::Int(id) => Ok(Self(id)),
            RawRecordId::Text(raw) => raw.parse(),
        }
    }
}

impl FromStr for RecordId {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| RecordError::InvalidId(s.to_string()))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("record is missing the `id` field")]
    MissingId,
    #[error("invalid record id: {0}")]
    InvalidId(String),
}

/// Role claim carried by the session credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Standard,
}

impl Role {
    /// Maps the raw `userRol` claim. Anything other than `Admin` is a standard user.
    pub fn from_claim(raw: &str) -> Self {
        match raw {
            "Admin" => Role::Admin,
            _ => Role::Standard,
        }
    }

    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }
}

/// Who is looking at the table. Built once per session and injected.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Identity {
    #[default]
    Anonymous,
    User {
        subject: Option<String>,
        role: Role,
    },
}

impl Identity {
    pub fn user(subject: Option<String>, role: Role) -> Self {
        Identity::User { subject, role }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            Identity::Anonymous => None,
            Identity::User { role, .. } => Some(*role),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Identity::Anonymous)
    }
}

/// A single scalar cell as delivered by the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Timestamp(DateTime<FixedOffset>),
}

impl CellValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<Value> for CellValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => CellValue::Empty,
            Value::Bool(b) => CellValue::Text(b.to_string()),
            Value::Number(n) => n
                .as_f64()
                .map(CellValue::Number)
                .unwrap_or_else(|| CellValue::Text(n.to_string())),
            Value::String(s) => {
                if let Ok(date) = NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
                    CellValue::Date(date)
                } else if let Ok(ts) = DateTime::parse_from_rfc3339(&s) {
                    CellValue::Timestamp(ts)
                } else {
                    CellValue::Text(s)
                }
            }
            other => CellValue::Text(other.to_string()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M")),
        }
    }
}

/// Immutable snapshot of one row: column id to cell.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct Record {
    id: RecordId,
    fields: BTreeMap<String, CellValue>,
}

impl Record {
    pub fn new(id: RecordId, fields: impl IntoIterator<Item = (String, CellValue)>) -> Self {
        let mut fields: BTreeMap<String, CellValue> = fields.into_iter().collect();
        fields.insert(RECORD_ID_FIELD.to_string(), CellValue::Number(id.0 as f64));
        Self { id, fields }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn get(&self, column_id: &str) -> Option<&CellValue> {
        self.fields.get(column_id)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl TryFrom<Map<String, Value>> for Record {
    type Error = RecordError;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        let raw_id = map.get(RECORD_ID_FIELD).cloned().ok_or(RecordError::MissingId)?;
        let id = match raw_id {
            Value::Number(n) => n
                .as_i64()
                .map(RecordId)
                .ok_or_else(|| RecordError::InvalidId(n.to_string()))?,
            Value::String(s) => s.parse()?,
            other => return Err(RecordError::InvalidId(other.to_string())),
        };
        let fields = map
            .into_iter()
            .map(|(k, v)| (k, CellValue::from(v)))
            .collect();
        Ok(Self { id, fields })
    }
}

/// Detail payload for one record. Opaque to the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordDetail {
    pub id: RecordId,
    pub payload: Value,
}

impl RecordDetail {
    pub fn new(id: RecordId, payload: Value) -> Self {
        Self { id, payload }
    }
}
