use std::path::Path;

use ahash::AHashMap;
use parking_lot::RwLock;
use rusqlite::{Connection, ToSql, params};

use crate::{
    errors::GraphLoomError,
    schema::ensure_schema,
    triple_query,
    value::{Binding, GraphValue, Triple},
};

/// The opaque query-execution capability the construction core consumes.
/// The core never touches the store outside `execute` and a final `merge`.
pub trait GraphSource {
    fn execute(&self, query: &str) -> Result<Vec<Binding>, GraphLoomError>;

    fn merge(&self, scratch: &ScratchGraph) -> Result<usize, GraphLoomError>;
}

/// Staging buffer for one construction command. Triples accumulate here
/// and reach the target store only through the single `merge` call.
#[derive(Debug, Clone, Default)]
pub struct ScratchGraph {
    triples: Vec<Triple>,
}

impl ScratchGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_triple(&mut self, triple: Triple) {
        self.triples.push(triple);
    }

    pub fn extend(&mut self, triples: Vec<Triple>) {
        self.triples.extend(triples);
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn triples(&self) -> &[Triple] {
        &self.triples
    }

    pub fn clear(&mut self) {
        self.triples.clear();
    }
}

#[derive(Default)]
struct FetchCache {
    inner: RwLock<AHashMap<String, Vec<Triple>>>,
}

impl FetchCache {
    fn get(&self, key: &str) -> Option<Vec<Triple>> {
        self.inner.read().get(key).cloned()
    }

    fn insert(&self, key: String, value: Vec<Triple>) {
        self.inner.write().insert(key, value);
    }

    fn clear(&self) {
        self.inner.write().clear();
    }
}

pub struct SqliteTripleStore {
    conn: Connection,
    fetch_cache: FetchCache,
}

impl SqliteTripleStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GraphLoomError> {
        let conn =
            Connection::open(path).map_err(|e| GraphLoomError::connection(e.to_string()))?;
        ensure_schema(&conn)?;
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self, GraphLoomError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| GraphLoomError::connection(e.to_string()))?;
        ensure_schema(&conn)?;
        Ok(Self::from_connection(conn))
    }

    pub fn insert_triple(&self, triple: &Triple) -> Result<i64, GraphLoomError> {
        validate_triple(triple)?;
        let (object, kind) = object_columns(&triple.object);
        self.conn
            .execute(
                "INSERT INTO triples(subject, predicate, object, object_kind) VALUES(?1, ?2, ?3, ?4)",
                params![triple.subject.as_str(), triple.predicate.as_str(), object, kind],
            )
            .map_err(|e| GraphLoomError::query(e.to_string()))?;
        self.fetch_cache.clear();
        Ok(self.conn.last_insert_rowid())
    }

    pub fn triple_count(&self) -> Result<usize, GraphLoomError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM triples", [], |row| row.get(0))
            .map_err(|e| GraphLoomError::query(e.to_string()))?;
        Ok(count as usize)
    }

    pub fn count_with_predicate(&self, predicate: &str) -> Result<usize, GraphLoomError> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM triples WHERE predicate=?1",
                params![predicate],
                |row| row.get(0),
            )
            .map_err(|e| GraphLoomError::query(e.to_string()))?;
        Ok(count as usize)
    }

    pub fn predicates(&self) -> Result<Vec<(String, usize)>, GraphLoomError> {
        let mut stmt = self
            .conn
            .prepare("SELECT predicate, COUNT(*) FROM triples GROUP BY predicate ORDER BY predicate")
            .map_err(|e| GraphLoomError::query(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| {
                let predicate: String = row.get(0)?;
                let count: i64 = row.get(1)?;
                Ok((predicate, count as usize))
            })
            .map_err(|e| GraphLoomError::query(e.to_string()))?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row.map_err(|e| GraphLoomError::query(e.to_string()))?);
        }
        Ok(result)
    }

    /// Fetches triples matching the bound columns, in deterministic order.
    /// Results are cached until the next write.
    pub(crate) fn fetch_triples(
        &self,
        subject: Option<&str>,
        predicate: Option<&str>,
        object: Option<&GraphValue>,
    ) -> Result<Vec<Triple>, GraphLoomError> {
        let key = cache_key(subject, predicate, object);
        if let Some(cached) = self.fetch_cache.get(&key) {
            return Ok(cached);
        }
        let mut sql =
            String::from("SELECT subject, predicate, object, object_kind FROM triples");
        let mut clauses: Vec<String> = Vec::new();
        let mut args: Vec<Box<dyn ToSql>> = Vec::new();
        if let Some(s) = subject {
            clauses.push(format!("subject=?{}", args.len() + 1));
            args.push(Box::new(s.to_string()));
        }
        if let Some(p) = predicate {
            clauses.push(format!("predicate=?{}", args.len() + 1));
            args.push(Box::new(p.to_string()));
        }
        if let Some(o) = object {
            let (text, kind) = object_columns(o);
            clauses.push(format!("object=?{}", args.len() + 1));
            args.push(Box::new(text.to_string()));
            clauses.push(format!("object_kind=?{}", args.len() + 1));
            args.push(Box::new(kind.to_string()));
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY subject, predicate, object, id");

        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| GraphLoomError::query(e.to_string()))?;
        let params: Vec<&dyn ToSql> = args.iter().map(|a| a.as_ref()).collect();
        let rows = stmt
            .query_map(params.as_slice(), |row| row_to_triple(row))
            .map_err(|e| GraphLoomError::query(e.to_string()))?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row.map_err(|e| GraphLoomError::query(e.to_string()))?);
        }
        self.fetch_cache.insert(key, result.clone());
        Ok(result)
    }
}

impl GraphSource for SqliteTripleStore {
    fn execute(&self, query: &str) -> Result<Vec<Binding>, GraphLoomError> {
        triple_query::execute_bgp(self, query)
    }

    /// Either every staged triple lands or none do: the inserts run in
    /// one transaction that rolls back on any failure.
    fn merge(&self, scratch: &ScratchGraph) -> Result<usize, GraphLoomError> {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| GraphLoomError::query(e.to_string()))?;
        for triple in scratch.triples() {
            validate_triple(triple)?;
            let (object, kind) = object_columns(&triple.object);
            tx.execute(
                "INSERT INTO triples(subject, predicate, object, object_kind) VALUES(?1, ?2, ?3, ?4)",
                params![triple.subject.as_str(), triple.predicate.as_str(), object, kind],
            )
            .map_err(|e| GraphLoomError::query(e.to_string()))?;
        }
        tx.commit().map_err(|e| GraphLoomError::query(e.to_string()))?;
        self.fetch_cache.clear();
        Ok(scratch.len())
    }
}

impl SqliteTripleStore {
    fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            fetch_cache: FetchCache::default(),
        }
    }
}

fn row_to_triple(row: &rusqlite::Row<'_>) -> Result<Triple, rusqlite::Error> {
    let object: String = row.get(2)?;
    let kind: String = row.get(3)?;
    let value = if kind == "resource" {
        GraphValue::Resource(object)
    } else {
        GraphValue::Literal(object)
    };
    Ok(Triple {
        subject: row.get(0)?,
        predicate: row.get(1)?,
        object: value,
    })
}

fn object_columns(object: &GraphValue) -> (&str, &'static str) {
    match object {
        GraphValue::Resource(iri) => (iri.as_str(), "resource"),
        GraphValue::Literal(text) => (text.as_str(), "literal"),
    }
}

fn cache_key(subject: Option<&str>, predicate: Option<&str>, object: Option<&GraphValue>) -> String {
    format!(
        "{}|{}|{}",
        subject.unwrap_or("*"),
        predicate.unwrap_or("*"),
        object.map(|o| o.render()).unwrap_or_else(|| "*".into()),
    )
}

fn validate_triple(triple: &Triple) -> Result<(), GraphLoomError> {
    if triple.subject.trim().is_empty() {
        return Err(GraphLoomError::invalid_input("triple subject must be set"));
    }
    if triple.predicate.trim().is_empty() {
        return Err(GraphLoomError::invalid_input(
            "triple predicate must be set",
        ));
    }
    Ok(())
}
