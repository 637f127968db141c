use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use super::import::ImportRecord;

const LIST_SEPARATOR: char = ';';

#[derive(Debug)]
pub enum RelationCsvError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for RelationCsvError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelationCsvError::Io(err) => write!(f, "failed to read relation sheet: {}", err),
            RelationCsvError::Csv(err) => write!(f, "invalid relation CSV data: {}", err),
        }
    }
}

impl std::error::Error for RelationCsvError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RelationCsvError::Io(err) => Some(err),
            RelationCsvError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for RelationCsvError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for RelationCsvError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Reads a relation sheet with the columns `employee_name, role, leader_names,
/// project_names, attributes`. List columns are `;`-separated.
pub fn read_relation_csv<P: AsRef<Path>>(path: P) -> Result<Vec<ImportRecord>, RelationCsvError> {
    let file = std::fs::File::open(path)?;
    parse_relation_records(file)
}

pub fn parse_relation_records<R: Read>(reader: R) -> Result<Vec<ImportRecord>, RelationCsvError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();

    for row in csv_reader.deserialize::<RelationRow>() {
        let row = row?;
        if row.employee_name.is_empty() {
            continue;
        }
        records.push(ImportRecord {
            employee_name: row.employee_name,
            leader_names: split_list(row.leader_names.as_deref()),
            project_names: split_list(row.project_names.as_deref()),
            role: row.role,
            attributes: split_list(row.attributes.as_deref()),
        });
    }

    Ok(records)
}

#[derive(Debug, Deserialize)]
struct RelationRow {
    employee_name: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    role: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    leader_names: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    project_names: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    attributes: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(LIST_SEPARATOR)
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}
