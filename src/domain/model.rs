use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One displayable record. Field order follows the payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    pub data: Map<String, Value>,
}

impl Row {
    pub fn new(data: Map<String, Value>) -> Self {
        Self { data }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// True when this row carries exactly the given field set, in any order.
    pub fn has_fields(&self, fields: &[String]) -> bool {
        self.data.len() == fields.len() && fields.iter().all(|f| self.data.contains_key(f))
    }
}

/// Which action and parameter produced a result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestIdentity {
    pub endpoint: String,
    pub parameter: Option<String>,
}

impl RequestIdentity {
    pub fn new(endpoint: impl Into<String>, parameter: Option<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            parameter,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub request: RequestIdentity,
    pub rows: Vec<Row>,
    /// Sibling scalar fields of a wrapper payload. Never rendered.
    pub metadata: Map<String, Value>,
}

impl ResultSet {
    pub fn new(request: RequestIdentity, rows: Vec<Row>, metadata: Map<String, Value>) -> Self {
        Self {
            request,
            rows,
            metadata,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Field names of the first row, which define the columns of the set.
    pub fn columns(&self) -> Vec<String> {
        self.rows
            .first()
            .map(|row| row.data.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Indices of rows whose field set differs from the first row.
    pub fn nonconforming_rows(&self) -> Vec<usize> {
        let columns = self.columns();
        self.rows
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, row)| !row.has_fields(&columns))
            .map(|(idx, _)| idx)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Loading,
    Success,
    Empty,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Loading => "loading",
            Severity::Success => "success",
            Severity::Empty => "empty",
            Severity::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub text: String,
    pub severity: Severity,
}

impl StatusMessage {
    pub fn new(text: impl Into<String>, severity: Severity) -> Self {
        Self {
            text: text.into(),
            severity,
        }
    }
}

/// Transport-neutral view of an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub status_text: String,
    pub content_type: Option<String>,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecodedBody {
    Json(Value),
    Text(String),
}
