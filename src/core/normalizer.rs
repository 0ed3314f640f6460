use crate::domain::model::{DecodedBody, Row};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Rows {
        rows: Vec<Row>,
        metadata: Map<String, Value>,
    },
    Empty,
}

impl Normalized {
    pub fn len(&self) -> usize {
        match self {
            Normalized::Rows { rows, .. } => rows.len(),
            Normalized::Empty => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Normalized::Empty)
    }
}

/// Maps the payload shapes the proxy returns onto a row sequence.
///
/// `array_fields` lists the wrapper fields known to hold the rows for the
/// current endpoint; they are checked in order before falling back to the
/// first array-valued field of the object.
pub fn normalize(body: Option<&DecodedBody>, array_fields: &[String]) -> Normalized {
    match body {
        None => Normalized::Empty,
        Some(DecodedBody::Text(text)) => {
            if text.trim().is_empty() {
                Normalized::Empty
            } else {
                let mut data = Map::new();
                data.insert("response".to_string(), Value::String(text.clone()));
                rows_or_empty(vec![Row::new(data)], Map::new())
            }
        }
        Some(DecodedBody::Json(value)) => normalize_json(value, array_fields),
    }
}

fn normalize_json(value: &Value, array_fields: &[String]) -> Normalized {
    match value {
        Value::Null => Normalized::Empty,
        Value::Array(items) => rows_or_empty(items.iter().map(into_row).collect(), Map::new()),
        Value::Object(obj) => {
            let array_field = array_fields
                .iter()
                .find(|name| matches!(obj.get(name.as_str()), Some(Value::Array(_))))
                .cloned()
                .or_else(|| {
                    obj.iter()
                        .find(|(_, v)| v.is_array())
                        .map(|(k, _)| k.clone())
                });

            match array_field {
                Some(field) => {
                    let items = obj.get(&field).and_then(Value::as_array).cloned().unwrap_or_default();
                    let metadata = obj
                        .iter()
                        .filter(|(k, v)| *k != &field && !v.is_array() && !v.is_object())
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect();
                    tracing::debug!("Rows taken from wrapper field '{}'", field);
                    rows_or_empty(items.iter().map(into_row).collect(), metadata)
                }
                None => rows_or_empty(vec![Row::new(obj.clone())], Map::new()),
            }
        }
        scalar => rows_or_empty(vec![into_row(scalar)], Map::new()),
    }
}

fn into_row(item: &Value) -> Row {
    match item {
        Value::Object(obj) => Row::new(obj.clone()),
        other => {
            let mut data = Map::new();
            data.insert("value".to_string(), other.clone());
            Row::new(data)
        }
    }
}

fn rows_or_empty(rows: Vec<Row>, metadata: Map<String, Value>) -> Normalized {
    // 空物件 {} 也視為沒有資料
    if rows.is_empty() || (rows.len() == 1 && rows[0].is_empty()) {
        Normalized::Empty
    } else {
        Normalized::Rows { rows, metadata }
    }
}
