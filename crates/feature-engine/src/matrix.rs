//! Feature Matrix

use crate::FeatureError;
use readout::VehicleId;
use serde::{Deserialize, Serialize};

/// Metadata reattached to every window row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowMeta {
    pub vehicle_id: VehicleId,
    /// Anchor time of the window
    pub time_step: f64,
}

/// Feature matrix: rows indexed by window id, named numeric columns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    ids: Vec<String>,
    rows: Vec<Vec<f64>>,
    metadata: Vec<Option<WindowMeta>>,
}

impl FeatureMatrix {
    /// Empty matrix with the given columns
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            ..Self::default()
        }
    }

    /// Build a matrix from ids and rows
    pub fn from_rows(
        columns: Vec<String>,
        ids: Vec<String>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self, FeatureError> {
        let mut matrix = Self::new(columns);
        for (id, row) in ids.into_iter().zip(rows) {
            matrix.push_row(id, row)?;
        }
        Ok(matrix)
    }

    /// Append a row without metadata
    pub fn push_row(&mut self, id: String, values: Vec<f64>) -> Result<(), FeatureError> {
        if values.len() != self.columns.len() {
            return Err(FeatureError::RowWidth {
                expected: self.columns.len(),
                actual: values.len(),
            });
        }
        self.ids.push(id);
        self.rows.push(values);
        self.metadata.push(None);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Row index (window ids)
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[f64]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn metadata(&self) -> &[Option<WindowMeta>] {
        &self.metadata
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All values of one column in row order
    pub fn column_values(&self, index: usize) -> Vec<f64> {
        self.rows.iter().map(|r| r[index]).collect()
    }

    /// Overwrite one cell
    pub fn set_value(&mut self, row: usize, column: usize, value: f64) {
        self.rows[row][column] = value;
    }

    pub(crate) fn set_metadata(&mut self, row: usize, meta: Option<WindowMeta>) {
        self.metadata[row] = meta;
    }

    /// Copy of a single row as a one-row matrix
    pub fn row_matrix(&self, index: usize) -> Option<FeatureMatrix> {
        let row = self.rows.get(index)?;
        Some(Self {
            columns: self.columns.clone(),
            ids: vec![self.ids[index].clone()],
            rows: vec![row.clone()],
            metadata: vec![self.metadata[index]],
        })
    }

    /// Project onto the named columns, in the given order, keeping rows and metadata
    pub fn select_columns<'a, I>(&self, names: I) -> Result<FeatureMatrix, FeatureError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut columns = Vec::new();
        let mut positions = Vec::new();
        for name in names {
            let idx = self
                .column_index(name)
                .ok_or_else(|| FeatureError::MissingSelectedFeature(name.to_string()))?;
            columns.push(name.to_string());
            positions.push(idx);
        }

        let rows = self
            .rows
            .iter()
            .map(|row| positions.iter().map(|&p| row[p]).collect())
            .collect();

        Ok(Self {
            columns,
            ids: self.ids.clone(),
            rows,
            metadata: self.metadata.clone(),
        })
    }
}
