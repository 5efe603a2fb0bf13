//! Tables (the API's `grid` entities): columns, rows and cells.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::collection::{CachedCollection, CollectionItem, ItemKey};
use crate::envelope::Record;
use crate::error::{NotebookError, Result};
use crate::models::entity::{fetch_entity, Entity, EntityAttributes};
use crate::traits::Get;
use crate::transport::{ApiPath, ApiRequest, Transport};

/// A table entity.
///
/// Rows come from `adt/{eid}` and column definitions from
/// `adt/{eid}/_column`; both are loaded on first use.
#[derive(Debug, Clone, Serialize)]
pub struct Table {
    #[serde(flatten)]
    pub attributes: EntityAttributes,
    #[serde(skip)]
    rows: CachedCollection<Row>,
    #[serde(skip)]
    columns: CachedCollection<Column>,
}

impl Table {
    pub const TYPE: &'static str = "grid";

    pub fn new(attributes: EntityAttributes) -> Self {
        let rows = CachedCollection::new(ApiRequest::get(ApiPath::segments(
            "adt",
            [attributes.eid.as_str()],
        )));
        let columns = CachedCollection::new(ApiRequest::get(ApiPath::segments(
            "adt",
            [attributes.eid.as_str(), "_column"],
        )));
        Self {
            attributes,
            rows,
            columns,
        }
    }

    pub fn eid(&self) -> &str {
        &self.attributes.eid
    }

    pub fn rows(&mut self) -> &mut CachedCollection<Row> {
        &mut self.rows
    }

    pub fn columns(&mut self) -> &mut CachedCollection<Column> {
        &mut self.columns
    }

    /// Drop cached rows and columns.
    pub fn invalidate(&mut self) {
        self.rows.invalidate();
        self.columns.invalidate();
    }

    /// The cell at `row_key` × column titled `column_title`.
    ///
    /// # Errors
    ///
    /// Returns [`NotebookError::KeyNotFound`] if the row, the column or the
    /// cell is missing, or the error of an implicit load.
    pub async fn cell(
        &mut self,
        transport: &dyn Transport,
        row_key: &str,
        column_title: &str,
    ) -> Result<&Cell> {
        let column_key = self
            .columns
            .iter(transport)
            .await?
            .find(|c| c.title == column_title)
            .map(|c| c.key.clone())
            .ok_or_else(|| NotebookError::KeyNotFound {
                key: column_title.to_string(),
            })?;

        let row = self.rows.get_by_key(transport, row_key).await?;
        row.cell(&column_key).ok_or_else(|| NotebookError::KeyNotFound {
            key: format!("{row_key}/{column_key}"),
        })
    }
}

/// A column definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    /// Column key, usually a UUID.
    pub key: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub column_type: Option<String>,
    #[serde(default)]
    pub hidden: bool,
}

impl CollectionItem for Column {
    fn key(&self) -> ItemKey {
        ItemKey::parse(&self.key)
    }
}

/// One row of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Row id; carried by the record, not the attributes.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub cells: Vec<Cell>,
}

impl Row {
    /// The cell of the column keyed `column_key`.
    pub fn cell(&self, column_key: &str) -> Option<&Cell> {
        let wanted = ItemKey::parse(column_key);
        self.cells
            .iter()
            .find(|cell| ItemKey::parse(&cell.key) == wanted)
    }
}

impl CollectionItem for Row {
    fn key(&self) -> ItemKey {
        ItemKey::parse(&self.id)
    }

    fn from_record(record: Record<Self>) -> Self {
        Row {
            id: record.id,
            cells: record.attributes.cells,
        }
    }
}

/// One cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Key of the column this cell belongs to.
    pub key: String,
    #[serde(rename = "type", default)]
    pub cell_type: Option<String>,
    #[serde(default)]
    pub content: CellContent,
}

impl Cell {
    pub fn value(&self) -> Option<&Value> {
        self.content.value.as_ref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

#[async_trait]
impl Get for Table {
    type Id = String; // eid

    #[tracing::instrument(skip(transport))]
    async fn get(transport: &dyn Transport, eid: String) -> Result<Self> {
        match fetch_entity(transport, &eid).await? {
            Entity::Table(table) => Ok(table),
            other => Err(NotebookError::InvalidResponse(format!(
                "{} is a '{}', expected '{}'",
                other.eid(),
                other.entity_type(),
                Table::TYPE
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{json_response, ScriptedTransport};
    use serde_json::json;

    const COL_MASS: &str = "9b3b4c7e-2a55-4f38-9d2e-6f0a3d3d1a01";
    const ROW_1: &str = "5e0c8a52-5d8e-4f0b-8b59-1f6f2c1c9e11";

    fn table() -> Table {
        Table::new(
            serde_json::from_value(json!({"eid": "grid:1", "type": "grid", "name": "Plate"}))
                .unwrap(),
        )
    }

    fn columns_page() -> crate::Result<crate::ApiResponse> {
        json_response(json!({
            "data": [
                {"type": "adtColumn", "id": COL_MASS, "attributes": {"key": COL_MASS, "title": "Mass", "type": "number"}}
            ]
        }))
    }

    fn rows_page() -> crate::Result<crate::ApiResponse> {
        json_response(json!({
            "links": {},
            "data": [
                {"type": "adtRow", "id": ROW_1, "attributes": {"cells": [
                    {"key": COL_MASS, "type": "number", "content": {"value": 4.2}}
                ]}}
            ]
        }))
    }

    #[tokio::test]
    async fn test_cell_lookup() {
        let transport = ScriptedTransport::new(vec![columns_page(), rows_page()]);
        let mut table = table();

        let cell = table.cell(&transport, ROW_1, "Mass").await.unwrap();
        assert_eq!(cell.value(), Some(&json!(4.2)));

        let paths: Vec<String> = transport.requests().iter().map(|r| r.path.render()).collect();
        assert_eq!(paths, vec!["adt/grid%3A1/_column", "adt/grid%3A1"]);
    }

    #[tokio::test]
    async fn test_unknown_column_is_lookup_error() {
        let transport = ScriptedTransport::new(vec![columns_page()]);
        let mut table = table();

        let err = table.cell(&transport, ROW_1, "Volume").await.unwrap_err();
        assert!(err.is_lookup());
    }

    #[tokio::test]
    async fn test_row_ids_come_from_records() {
        let transport = ScriptedTransport::new(vec![rows_page()]);
        let mut table = table();

        let row = table.rows().get_by_position(&transport, 0).await.unwrap();
        assert_eq!(row.id, ROW_1);
        assert!(row.cell(&COL_MASS.to_uppercase()).is_some());
    }
}
