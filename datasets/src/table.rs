//! Raw delimited tables
//!
//! Cells are kept as strings until the preparation step decides how every column is typed.
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};

use crate::error::{ReadError, Result};

/// Cell spellings treated as missing: empty cells and the common NA markers
pub const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_missing(cell: &str) -> bool {
    NA_VALUES.contains(&cell)
}

fn is_gzip(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "gz")
}

/// A header and rows of string cells, every row as wide as the header
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Panics if a row does not match the width of the header
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        assert!(
            rows.iter().all(|row| row.len() == header.len()),
            "every row should have {} cells",
            header.len()
        );

        RawTable { header, rows }
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    pub fn ncols(&self) -> usize {
        self.header.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|x| x == name)
    }

    /// Iterate over the cells of a column
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows.iter().map(move |row| row[idx].as_str())
    }

    /// Keep the given rows in the given order
    pub fn select_rows(&self, indices: &[usize]) -> RawTable {
        RawTable {
            header: self.header.clone(),
            rows: indices.iter().map(|idx| self.rows[*idx].clone()).collect(),
        }
    }

    /// Remove columns by name, every name has to exist
    pub fn drop_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<RawTable> {
        let mut dropped = Vec::with_capacity(names.len());
        for name in names {
            let idx = self
                .column_index(name.as_ref())
                .ok_or_else(|| ReadError::MissingColumn(name.as_ref().to_string()))?;
            dropped.push(idx);
        }

        let keep = (0..self.ncols())
            .filter(|idx| !dropped.contains(idx))
            .collect::<Vec<_>>();

        Ok(RawTable {
            header: keep.iter().map(|idx| self.header[*idx].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| keep.iter().map(|idx| row[*idx].clone()).collect())
                .collect(),
        })
    }

    /// Remove every row holding a missing cell
    pub fn drop_missing(&self) -> RawTable {
        RawTable {
            header: self.header.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| !row.iter().any(|cell| is_missing(cell)))
                .cloned()
                .collect(),
        }
    }
}

/// Read a header-ful CSV table from any reader
pub fn read_csv_from<R: Read>(reader: R) -> Result<RawTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(b',')
        .from_reader(reader);

    let header = reader
        .headers()?
        .iter()
        .map(|x| x.to_string())
        .collect::<Vec<_>>();

    let rows = reader
        .records()
        .map(|record| record.map(|r| r.iter().map(|x| x.to_string()).collect()))
        .collect::<std::result::Result<Vec<Vec<String>>, _>>()?;

    Ok(RawTable { header, rows })
}

/// Read a CSV file, decompressing it on the fly if the name ends in `.gz`
pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<RawTable> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| ReadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let table = if is_gzip(path) {
        read_csv_from(GzDecoder::new(file))?
    } else {
        read_csv_from(file)?
    };

    tracing::debug!(
        path = %path.display(),
        rows = table.nrows(),
        columns = table.ncols(),
        "read table"
    );

    Ok(table)
}

fn write_csv_to<W: Write>(writer: W, table: &RawTable) -> Result<()> {
    let mut writer = WriterBuilder::new().delimiter(b',').from_writer(writer);

    writer.write_record(&table.header)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush().map_err(csv::Error::from)?;

    Ok(())
}

/// Write a table as CSV, compressed if the name ends in `.gz`
pub fn write_csv<P: AsRef<Path>>(path: P, table: &RawTable) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| ReadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if is_gzip(path) {
        let mut encoder = GzEncoder::new(file, Compression::default());
        write_csv_to(&mut encoder, table)?;
        encoder.finish().map_err(|source| ReadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    } else {
        write_csv_to(file, table)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = "src,dst,Protocol,rate,label\n\
                         10.0.0.1,10.0.0.2,TCP,1.5,normal\n\
                         10.0.0.3,10.0.0.2,UDP,NA,attack\n\
                         10.0.0.4,10.0.0.2,TCP,,normal\n";

    #[test]
    fn reads_cells_as_strings() {
        let table = read_csv_from(SMALL.as_bytes()).unwrap();

        assert_eq!(table.header(), &["src", "dst", "Protocol", "rate", "label"]);
        assert_eq!(table.nrows(), 3);
        assert_eq!(table.column(3).collect::<Vec<_>>(), vec!["1.5", "NA", ""]);
    }

    #[test]
    fn ragged_rows_are_an_error() {
        let data = "a,b\n1,2\n3\n";
        assert!(matches!(
            read_csv_from(data.as_bytes()),
            Err(ReadError::Csv(_))
        ));
    }

    #[test]
    fn drop_columns_and_missing_rows() {
        let table = read_csv_from(SMALL.as_bytes()).unwrap();

        let dropped = table.drop_columns(&["src", "dst", "Protocol"]).unwrap();
        assert_eq!(dropped.header(), &["rate", "label"]);

        let clean = dropped.drop_missing();
        assert_eq!(clean.nrows(), 1);
        assert_eq!(clean.rows()[0], vec!["1.5", "normal"]);

        assert!(matches!(
            table.drop_columns(&["flags"]),
            Err(ReadError::MissingColumn(name)) if name == "flags"
        ));
    }

    #[test]
    fn missing_value_spellings() {
        for cell in ["", "NA", "N/A", "NaN", "nan", "null", "NULL", "None", "<NA>", "#N/A"] {
            assert!(is_missing(cell), "{:?}", cell);
        }
        assert!(!is_missing("0"));
        assert!(!is_missing("none"));
    }

    #[test]
    fn gzip_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let table = read_csv_from(SMALL.as_bytes()).unwrap();

        for name in ["table.csv", "table.csv.gz"] {
            let path = dir.path().join(name);
            write_csv(&path, &table).unwrap();
            assert_eq!(read_csv(&path).unwrap(), table);
        }
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            read_csv("/nonexistent/dataset.csv"),
            Err(ReadError::Io { .. })
        ));
    }
}
