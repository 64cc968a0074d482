//! A minimal delimited-text driver, grounded on the source's `DbCsvFile`:
//! first line is a header, values are split on a single-character
//! delimiter and trimmed, and there is no quoting or escaping support.

use std::fs;

use super::Ingestor;
use crate::error::IngestError;

pub struct CsvIngestor {
    path: String,
    delim: char,
    fields: Vec<String>,
}

impl CsvIngestor {
    pub fn new(path: impl Into<String>, delim: char, fields: Vec<String>) -> Self {
        Self {
            path: path.into(),
            delim,
            fields,
        }
    }
}

impl Ingestor for CsvIngestor {
    fn field_names(&self) -> &[String] {
        &self.fields
    }

    fn for_each_row(
        &mut self,
        f: &mut dyn FnMut(Vec<String>) -> Result<(), IngestError>,
    ) -> Result<(), IngestError> {
        let text = fs::read_to_string(&self.path).map_err(|source| IngestError::Open {
            path: self.path.clone(),
            source,
        })?;

        let mut lines = text.lines().filter(|l| !l.trim().is_empty());

        let header_line = match lines.next() {
            Some(l) => l,
            None => return Ok(()),
        };
        let header: Vec<&str> = header_line.split(self.delim).map(str::trim).collect();

        let mut column_order = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let pos = header.iter().position(|h| h == field).ok_or_else(|| IngestError::MissingField {
                path: self.path.clone(),
                field: field.clone(),
            })?;
            column_order.push(pos);
        }

        for (line_no, line) in lines.enumerate() {
            let tokens: Vec<&str> = line.split(self.delim).map(str::trim).collect();
            if tokens.len() != header.len() {
                return Err(IngestError::FieldCountMismatch {
                    path: self.path.clone(),
                    line: line_no + 2,
                    expected: header.len(),
                    found: tokens.len(),
                });
            }
            let row: Vec<String> = column_order.iter().map(|&pos| tokens[pos].to_string()).collect();
            f(row)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{contents}").unwrap();
        file
    }

    #[test]
    fn reads_and_reorders_declared_fields() {
        let file = write_temp("gid,x,y,name\n1,10,20,alpha\n2,30,40,beta\n");
        let fields = vec!["x".to_string(), "y".to_string(), "gid".to_string()];
        let mut ingestor = CsvIngestor::new(file.path().to_str().unwrap(), ',', fields);

        let mut rows = Vec::new();
        ingestor
            .for_each_row(&mut |row| {
                rows.push(row);
                Ok(())
            })
            .unwrap();

        assert_eq!(rows, vec![
            vec!["10".to_string(), "20".to_string(), "1".to_string()],
            vec!["30".to_string(), "40".to_string(), "2".to_string()],
        ]);
    }

    #[test]
    fn missing_declared_field_is_an_ingest_error() {
        let file = write_temp("gid,x,y\n1,10,20\n");
        let fields = vec!["x".to_string(), "z".to_string()];
        let mut ingestor = CsvIngestor::new(file.path().to_str().unwrap(), ',', fields);
        let err = ingestor.for_each_row(&mut |_| Ok(())).unwrap_err();
        assert!(matches!(err, IngestError::MissingField { .. }));
    }

    #[test]
    fn row_with_wrong_column_count_is_an_ingest_error() {
        let file = write_temp("gid,x,y\n1,10,20\n2,30\n");
        let fields = vec!["gid".to_string(), "x".to_string(), "y".to_string()];
        let mut ingestor = CsvIngestor::new(file.path().to_str().unwrap(), ',', fields);
        let err = ingestor.for_each_row(&mut |_| Ok(())).unwrap_err();
        assert!(matches!(err, IngestError::FieldCountMismatch { .. }));
    }
}
