use std::io::Write;

use serde::Serialize;

/// Writes `rows` as CSV with a header derived from the record fields.
pub fn write_csv<W, T>(writer: W, rows: &[T]) -> Result<(), csv::Error>
where
    W: Write,
    T: Serialize,
{
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}
