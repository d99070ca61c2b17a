use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(String);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellId(String);

impl RowId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl CellId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableIdentity {
    field_name: String,
    minted_rows: u64,
    minted_cells: u64,
    rows: Vec<RowId>,
    cells: BTreeMap<RowId, Vec<CellId>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifiedCell {
    pub id: CellId,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifiedRow {
    pub id: RowId,
    pub cells: Vec<IdentifiedCell>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSnapshot {
    pub identity: TableIdentity,
    pub rows: Vec<Vec<String>>,
}

impl TableIdentity {
    pub fn new(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            ..Self::default()
        }
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    #[cfg(test)]
    pub fn row_ids(&self) -> &[RowId] {
        &self.rows
    }

    pub fn cell_ids(&self, row: &RowId) -> &[CellId] {
        self.cells.get(row).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Pairs each row and cell of `rows` with its identity. `rows` must be the
    /// value this state was last reconciled against.
    pub fn annotate(&self, rows: &[Vec<String>]) -> Vec<IdentifiedRow> {
        self.rows
            .iter()
            .zip(rows)
            .map(|(row_id, row)| IdentifiedRow {
                id: row_id.clone(),
                cells: self
                    .cell_ids(row_id)
                    .iter()
                    .zip(row)
                    .map(|(cell_id, value)| IdentifiedCell {
                        id: cell_id.clone(),
                        value: value.clone(),
                    })
                    .collect(),
            })
            .collect()
    }

    fn mint_row(&mut self) -> RowId {
        self.minted_rows += 1;
        RowId(format!("{}:row:{}", self.field_name, self.minted_rows))
    }

    fn mint_cell(&mut self) -> CellId {
        self.minted_cells += 1;
        CellId(format!("{}:cell:{}", self.field_name, self.minted_cells))
    }

    fn fit_cells(&mut self, row_id: &RowId, width: usize) {
        let mut cells = self.cells.remove(row_id).unwrap_or_default();
        cells.truncate(width);
        while cells.len() < width {
            cells.push(self.mint_cell());
        }
        self.cells.insert(row_id.clone(), cells);
    }
}

pub fn reconcile(old: &TableIdentity, field_name: &str, rows: &[Vec<String>]) -> TableIdentity {
    let mut next = if old.field_name == field_name {
        old.clone()
    } else {
        TableIdentity::new(field_name)
    };

    if next.rows.len() > rows.len() {
        let dropped: Vec<RowId> = next.rows.drain(rows.len()..).collect();
        for row_id in dropped {
            next.cells.remove(&row_id);
        }
    }
    while next.rows.len() < rows.len() {
        let row_id = next.mint_row();
        next.rows.push(row_id);
    }

    let row_ids = next.rows.clone();
    for (row_id, row) in row_ids.iter().zip(rows) {
        next.fit_cells(row_id, row.len());
    }

    next
}

pub fn add_row(identity: &TableIdentity, rows: &[Vec<String>], seed_columns: usize) -> TableSnapshot {
    let width = rows
        .last()
        .map(Vec::len)
        .filter(|width| *width > 0)
        .unwrap_or(seed_columns.max(1));

    let mut next_rows = rows.to_vec();
    next_rows.push(vec![String::new(); width]);
    let identity = reconcile(identity, identity.field_name(), &next_rows);

    TableSnapshot {
        identity,
        rows: next_rows,
    }
}

pub fn remove_row(identity: &TableIdentity, rows: &[Vec<String>], index: usize) -> TableSnapshot {
    let synced = reconcile(identity, identity.field_name(), rows);
    if rows.len() <= 1 || index >= rows.len() {
        return TableSnapshot {
            identity: synced,
            rows: rows.to_vec(),
        };
    }

    let mut next = synced;
    let removed = next.rows.remove(index);
    next.cells.remove(&removed);

    let mut next_rows = rows.to_vec();
    next_rows.remove(index);

    TableSnapshot {
        identity: next,
        rows: next_rows,
    }
}
