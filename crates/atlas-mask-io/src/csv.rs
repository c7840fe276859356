// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

//! CSV rendering of fixed-column tables (catalog, fragment report)

use std::borrow::Cow;
use std::io::Write;

use atlas_mask_engine::TableRow;

use crate::error::VolumeIoResult;

/// Quote a field when it holds a comma, a quote or a line break
pub fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains(&[',', '"', '\n', '\r'][..]) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

fn write_record<W, I, S>(writer: &mut W, fields: I) -> VolumeIoResult<()>
where
    W: Write,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let line = fields
        .into_iter()
        .map(|field| escape_field(field.as_ref()).into_owned())
        .collect::<Vec<_>>()
        .join(",");
    writeln!(writer, "{}", line)?;
    Ok(())
}

/// Header line followed by one line per row
pub fn write_table<W, R>(mut writer: W, rows: &[R]) -> VolumeIoResult<()>
where
    W: Write,
    R: TableRow,
{
    write_record(&mut writer, R::columns().iter())?;
    for row in rows {
        write_record(&mut writer, row.cells())?;
    }
    writer.flush()?;
    Ok(())
}
