//! Per-event records: tuples filled with explicit rows, and trees whose rows
//! are snapshots of bound field cells.

use std::collections::BTreeMap;

use hb_core::{Accumulator, ContainerKind, Error, Result, StoredObject};

/// Ordered set of named `f64` cells, one per record field.
///
/// The record owns the cells. Callers update them between fills; a fill
/// copies whatever the cells hold at that moment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldBinding {
    names: Vec<String>,
    cells: Vec<f64>,
}

impl FieldBinding {
    /// Bind one cell per field name, all starting at 0.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let cells = vec![0.0; names.len()];
        Self { names, cells }
    }

    /// Field names, in column order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether there are no fields.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn position(&self, field: &str) -> Option<usize> {
        self.names.iter().position(|n| n == field)
    }

    /// Current value of `field`.
    pub fn get(&self, field: &str) -> Option<f64> {
        self.position(field).map(|i| self.cells[i])
    }

    /// Store `value` in the cell bound to `field`. Returns `false` for unknown fields.
    pub fn set(&mut self, field: &str, value: f64) -> bool {
        match self.position(field) {
            Some(i) => {
                self.cells[i] = value;
                true
            }
            None => false,
        }
    }

    /// Mutable access to the cell bound to `field`.
    pub fn cell_mut(&mut self, field: &str) -> Option<&mut f64> {
        let i = self.position(field)?;
        Some(&mut self.cells[i])
    }

    /// Current cell values, in column order.
    pub fn values(&self) -> &[f64] {
        &self.cells
    }
}

impl From<&BTreeMap<String, f64>> for FieldBinding {
    fn from(fields: &BTreeMap<String, f64>) -> Self {
        Self {
            names: fields.keys().cloned().collect(),
            cells: fields.values().copied().collect(),
        }
    }
}

/// How rows enter a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordMode {
    /// Rows are passed explicitly (`TNtupleD`-like).
    Tuple {
        /// Requested buffer size, carried into the output.
        buffer_size: usize,
    },
    /// Rows are snapshots of the bound cells (`TTree`-like).
    Tree,
}

/// A tuple or tree record.
#[derive(Debug, Clone)]
pub struct Record {
    name: String,
    title: String,
    mode: RecordMode,
    binding: FieldBinding,
    rows: Vec<Vec<f64>>,
}

impl Record {
    /// Tuple with `:`-separated field names, e.g. `"pt:eta:phi"`.
    pub fn tuple(
        name: impl Into<String>,
        title: impl Into<String>,
        field_list: &str,
        buffer_size: usize,
    ) -> Self {
        let names = field_list.split(':').filter(|f| !f.is_empty());
        Self {
            name: name.into(),
            title: title.into(),
            mode: RecordMode::Tuple { buffer_size },
            binding: FieldBinding::from_names(names),
            rows: Vec::new(),
        }
    }

    /// Tree with one field per binding entry.
    pub fn tree(name: impl Into<String>, title: impl Into<String>, binding: FieldBinding) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            mode: RecordMode::Tree,
            binding,
            rows: Vec::new(),
        }
    }

    /// Fill mode.
    pub fn mode(&self) -> RecordMode {
        self.mode
    }

    /// Registry kind of this record.
    pub fn kind(&self) -> ContainerKind {
        match self.mode {
            RecordMode::Tuple { .. } => ContainerKind::TupleRecord,
            RecordMode::Tree => ContainerKind::TreeRecord,
        }
    }

    /// Bound cells.
    pub fn binding(&self) -> &FieldBinding {
        &self.binding
    }

    /// Bound cells, for updating before a snapshot fill.
    pub fn binding_mut(&mut self) -> &mut FieldBinding {
        &mut self.binding
    }

    /// Append a row copied from the current cell values.
    pub fn fill_snapshot(&mut self) {
        self.rows.push(self.binding.cells.clone());
    }

    /// Copy `values` into the cells, then append them as a row.
    ///
    /// The number of values must match the number of fields.
    pub fn fill_row(&mut self, values: &[f64]) -> Result<()> {
        if values.len() != self.binding.len() {
            return Err(Error::ArityMismatch {
                key: self.name.clone(),
                expected: self.binding.len(),
                got: values.len(),
            });
        }
        self.binding.cells.copy_from_slice(values);
        self.fill_snapshot();
        Ok(())
    }

    /// Stored rows.
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Number of rows.
    pub fn entries(&self) -> usize {
        self.rows.len()
    }
}

impl Accumulator for Record {
    fn name(&self) -> &str {
        &self.name
    }

    fn class_name(&self) -> &'static str {
        match self.mode {
            RecordMode::Tuple { .. } => "TNtupleD",
            RecordMode::Tree => "TTree",
        }
    }

    fn to_stored(&self) -> StoredObject {
        let name = self.name.clone();
        let title = self.title.clone();
        let fields = self.binding.names.clone();
        let rows = self.rows.clone();
        match self.mode {
            RecordMode::Tuple { buffer_size } => {
                StoredObject::Ntuple { name, title, fields, buffer_size, rows }
            }
            RecordMode::Tree => StoredObject::Tree { name, title, fields, rows },
        }
    }
}
