use rusqlite::types::Value;
use rusqlite::Row;

/// One store row with column order preserved and values owned.
///
/// Every statement result crosses the store boundary through this one
/// shape, so downstream code never cares which query produced a row or
/// what its schema looked like.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreRow {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl StoreRow {
    /// Reads every column of a result row. `columns` must be the
    /// statement's own column list, captured before iteration.
    pub fn from_row(row: &Row<'_>, columns: &[String]) -> rusqlite::Result<Self> {
        let mut values = Vec::with_capacity(columns.len());
        for idx in 0..columns.len() {
            values.push(row.get::<_, Value>(idx)?);
        }
        Ok(Self {
            columns: columns.to_vec(),
            values,
        })
    }

    #[cfg(test)]
    pub fn from_pairs(pairs: Vec<(&str, Value)>) -> Self {
        let (columns, values) = pairs
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .unzip();
        Self { columns, values }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|idx| &self.values[idx])
    }

    /// Numeric read with text coercion, for price-ish columns that some
    /// schemas store as TEXT.
    pub fn as_f64(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            Value::Integer(n) => Some(*n as f64),
            Value::Real(n) => Some(*n),
            Value::Text(s) => s.trim().replace(',', "").parse().ok(),
            _ => None,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Column name/value pairs in statement order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

/// Display form for summary lines. Nulls print empty rather than "NULL"
/// so the narrative stays readable.
pub fn value_display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Integer(n) => n.to_string(),
        Value::Real(n) => {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{:.0}", n)
            } else {
                n.to_string()
            }
        }
        Value::Text(s) => s.clone(),
        Value::Blob(b) => format!("<{} bytes>", b.len()),
    }
}
