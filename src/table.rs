use std::collections::HashMap;

use tracing::{debug, warn};

/// Possible errors to occur while reading a delimited table
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("The header line could not be read")]
    Header(#[source] csv::Error),
}

/// One data line of a table, keyed by header name
///
/// Values are kept as raw, trimmed strings. A line with fewer values than
/// there are headers simply has no entry for the trailing headers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawRecord {
    fields: HashMap<String, String>,
}

impl RawRecord {
    /// The raw value of a field, if the line had one
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// The number of fields present on this line
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A parsed delimited table
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    records: Vec<RawRecord>,
}

impl Table {
    /// The header names in file order
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// The data lines in file order
    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }
}

/// Parses delimiter separated text with a header line
///
/// The whole text as well as every single field is trimmed. Quotes carry no
/// meaning, every line is split on the delimiter on its own. Lines that cannot
/// be decoded are dropped with a warning, they never abort the parse. Empty
/// input produces a table without headers and records.
pub fn parse_table(text: &str, delimiter: u8) -> Result<Table, TableError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(text.trim().as_bytes());

    let headers = reader
        .headers()
        .map_err(TableError::Header)?
        .iter()
        .map(str::to_owned)
        .collect::<Vec<_>>();

    let mut records = Vec::new();
    for (index, line) in reader.records().enumerate() {
        match line {
            Ok(line) => {
                let fields = headers
                    .iter()
                    .cloned()
                    .zip(line.iter().map(str::to_owned))
                    .collect();
                records.push(RawRecord { fields });
            }
            // + 2 for the header line and the zero based index
            Err(err) => warn!(line = index + 2, %err, "Dropping malformed line"),
        }
    }

    debug!(headers = headers.len(), records = records.len(), "Parsed table");
    Ok(Table { headers, records })
}
