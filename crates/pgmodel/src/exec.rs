//! Statement execution and result normalization.
//!
//! Assembled statements are plain SQL text with every value already escaped,
//! so execution rides the simple-query protocol. The [`Executor`] trait is
//! the seam between statement assembly and the connection collaborator:
//! repository code and tests can supply anything that runs SQL text and
//! returns a [`RawOutput`].

use crate::error::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use tokio_postgres::SimpleQueryMessage;

/// Row normalization mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowMode {
    /// Rows as JSON objects keyed by field name.
    #[default]
    Object,
    /// Rows as JSON arrays in field order.
    Array,
}

/// Raw result of running one statement: field names, string-typed cell
/// values and the server-reported affected-row count.
#[derive(Clone, Debug, Default)]
pub struct RawOutput {
    pub fields: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
    pub row_count: u64,
}

/// Normalized result: field names plus JSON rows shaped per [`RowMode`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QueryOutput {
    pub fields: Vec<String>,
    pub rows: Vec<Json>,
    pub row_count: u64,
}

/// A connection that can run assembled SQL text.
///
/// Implemented for `tokio_postgres::Client` and (with the `pool` feature)
/// for pooled clients handed out by [`PoolManager`](crate::pool::PoolManager).
pub trait Executor: Send + Sync {
    /// Submit `sql` and collect the raw result.
    fn run(&self, sql: &str) -> impl std::future::Future<Output = ModelResult<RawOutput>> + Send;
}

impl Executor for tokio_postgres::Client {
    fn run(&self, sql: &str) -> impl std::future::Future<Output = ModelResult<RawOutput>> + Send {
        async move {
            let messages = self
                .simple_query(sql)
                .await
                .map_err(ModelError::from_db_error)?;
            Ok(collect_messages(messages))
        }
    }
}

/// Fold simple-query protocol messages into a [`RawOutput`].
pub(crate) fn collect_messages(messages: Vec<SimpleQueryMessage>) -> RawOutput {
    let mut out = RawOutput::default();
    for message in messages {
        match message {
            SimpleQueryMessage::RowDescription(columns) => {
                out.fields = columns.iter().map(|c| c.name().to_string()).collect();
            }
            SimpleQueryMessage::Row(row) => {
                if out.fields.is_empty() {
                    out.fields = row
                        .columns()
                        .iter()
                        .map(|c| c.name().to_string())
                        .collect();
                }
                let cells = (0..row.len())
                    .map(|i| row.get(i).map(str::to_string))
                    .collect();
                out.rows.push(cells);
            }
            SimpleQueryMessage::CommandComplete(count) => {
                out.row_count = count;
            }
            _ => {}
        }
    }
    out
}

/// Normalize a raw result into JSON rows.
pub fn normalize(raw: RawOutput, mode: RowMode) -> QueryOutput {
    let RawOutput {
        fields,
        rows,
        row_count,
    } = raw;

    let rows = rows
        .into_iter()
        .map(|cells| match mode {
            RowMode::Object => {
                let mut obj = serde_json::Map::with_capacity(cells.len());
                for (field, cell) in fields.iter().zip(cells) {
                    obj.insert(field.clone(), cell.map_or(Json::Null, Json::String));
                }
                Json::Object(obj)
            }
            RowMode::Array => Json::Array(
                cells
                    .into_iter()
                    .map(|cell| cell.map_or(Json::Null, Json::String))
                    .collect(),
            ),
        })
        .collect();

    QueryOutput {
        fields,
        rows,
        row_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw() -> RawOutput {
        RawOutput {
            fields: vec!["id".to_string(), "email".to_string()],
            rows: vec![
                vec![Some("1".to_string()), Some("a@test.com".to_string())],
                vec![Some("2".to_string()), None],
            ],
            row_count: 2,
        }
    }

    #[test]
    fn object_mode_keys_rows_by_field() {
        let out = normalize(raw(), RowMode::Object);
        assert_eq!(out.fields, vec!["id", "email"]);
        assert_eq!(out.rows[0], json!({"id": "1", "email": "a@test.com"}));
        assert_eq!(out.rows[1], json!({"id": "2", "email": null}));
        assert_eq!(out.row_count, 2);
    }

    #[test]
    fn array_mode_keeps_field_order() {
        let out = normalize(raw(), RowMode::Array);
        assert_eq!(out.rows[0], json!(["1", "a@test.com"]));
        assert_eq!(out.rows[1], json!(["2", null]));
    }

    #[test]
    fn empty_result_normalizes_cleanly() {
        let out = normalize(RawOutput::default(), RowMode::Object);
        assert!(out.fields.is_empty());
        assert!(out.rows.is_empty());
        assert_eq!(out.row_count, 0);
    }
}
