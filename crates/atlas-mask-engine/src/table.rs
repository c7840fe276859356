// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

//! Fixed-column tabular rows shared by the catalog and the fragment report

/// A row of a table with a fixed, ordered set of columns
pub trait TableRow {
    /// Column names, in output order
    fn columns() -> &'static [&'static str];

    /// Cell values rendered as text, one per column
    fn cells(&self) -> Vec<String>;
}

/// Text form used for boolean cells (matches the downstream reader)
pub fn bool_cell(value: bool) -> String {
    let text = if value { "True" } else { "False" };
    text.to_string()
}
