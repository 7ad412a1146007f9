//! Variant store backed by a GEMINI SQLite database.

use std::path::Path;

use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use rusqlite::{types::ValueRef, Connection, OpenFlags};

use super::{project, EncodedList, Genotypes, Row, Value, VariantStore};
use crate::err::Error;
use crate::query::Query;

/// Read-only connection to a GEMINI database.
///
/// The sample order of the `gts` and `gt_types` columns is given by
/// `samples.sample_id`.
pub struct SqliteStore {
    connection: Connection,
    samples: IndexSet<String>,
}

impl SqliteStore {
    /// Open the database at `path` and load the sample names.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        tracing::debug!("opening GEMINI database {:?}", path.as_ref());
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let connection = Connection::open_with_flags(path.as_ref(), flags).map_err(|e| {
            Error::Configuration(format!(
                "could not open database {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let samples = load_samples(&connection)?;
        tracing::debug!("... found {} samples", samples.len());

        Ok(Self {
            connection,
            samples,
        })
    }
}

fn load_samples(connection: &Connection) -> Result<IndexSet<String>, Error> {
    let sql = "SELECT name FROM samples ORDER BY sample_id";
    let mut stmt = connection
        .prepare(sql)
        .map_err(|e| Error::query(sql, e))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(|e| Error::query(sql, e))?
        .collect::<Result<IndexSet<_>, _>>()
        .map_err(|e| Error::query(sql, e))?;
    Ok(names)
}

fn to_value(value: ValueRef) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(x) => Value::Real(x),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Value::Text(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

fn to_encoded_list<'a>(value: ValueRef<'a>, column: &str) -> Result<EncodedList<'a>, Error> {
    match value {
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .map(EncodedList::Text)
            .map_err(|e| Error::Decode {
                column: column.to_string(),
                message: e.to_string(),
            }),
        ValueRef::Blob(bytes) => Ok(EncodedList::Zlib(bytes)),
        ValueRef::Null => Ok(EncodedList::Text("")),
        _ => Err(Error::Decode {
            column: column.to_string(),
            message: "expected text or blob".into(),
        }),
    }
}

impl VariantStore for SqliteStore {
    fn run(&self, query: &Query) -> Result<Vec<Row>, Error> {
        let fields = query.fields();
        let needs_genotypes = query.needs_genotypes();

        let mut columns = fields.iter().map(|c| c.name()).collect::<Vec<_>>();
        if needs_genotypes {
            columns.extend(["gts", "gt_types"]);
        }
        if columns.is_empty() {
            return Err(Error::Configuration(format!(
                "query selects no columns: {}",
                query
            )));
        }
        let mut sql = format!("SELECT {} FROM {}", columns.iter().join(", "), query.table);
        if let Some(filter) = &query.filter {
            sql.push_str(&format!(" WHERE {}", filter));
        }
        tracing::debug!("running {}", &sql);

        let mut stmt = self
            .connection
            .prepare(&sql)
            .map_err(|e| Error::query(&sql, e))?;
        let mut rows = stmt.query([]).map_err(|e| Error::query(&sql, e))?;

        let mut result = Vec::new();
        while let Some(row) = rows.next().map_err(|e| Error::query(&sql, e))? {
            let mut record = IndexMap::new();
            for (i, column) in fields.iter().enumerate() {
                let value = row.get_ref(i).map_err(|e| Error::query(&sql, e))?;
                record.insert(column.name().to_string(), to_value(value));
            }
            let genotypes = if needs_genotypes {
                let gts = row
                    .get_ref(fields.len())
                    .map_err(|e| Error::query(&sql, e))?;
                let gt_types = row
                    .get_ref(fields.len() + 1)
                    .map_err(|e| Error::query(&sql, e))?;
                Some(Genotypes::decode(
                    to_encoded_list(gts, "gts")?,
                    to_encoded_list(gt_types, "gt_types")?,
                )?)
            } else {
                None
            };

            if let Some(row) = project(query, &self.samples, &record, genotypes.as_ref())? {
                result.push(row);
            }
        }

        tracing::trace!("... {} rows", result.len());
        Ok(result)
    }
}
