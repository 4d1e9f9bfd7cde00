//! Schema-driven decoding of tabular `resultSets` envelopes into typed records.
//!
//! Every upstream resource answers with an envelope of named tables, each a
//! header list plus untyped row tuples. A [`RecordSchema`] declares, once, how
//! the columns of one table bind to the fields of a record type; a type
//! implementing [`DecodeResponse`] groups several schemas into named slots.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use thiserror::Error;

pub const CRATE_NAME: &str = "hoopsync-results";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("malformed response envelope: {0}")]
    MalformedEnvelope(String),
    #[error("table `{table}` row {row} has {found} cells, headers declare {expected}")]
    RowLengthMismatch {
        table: String,
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("table `{table}` has no column `{column}` required by {record}")]
    MissingColumn {
        table: String,
        column: String,
        record: &'static str,
    },
    #[error("table `{table}` row {row}: cannot convert {found} in column `{column}` to {expected}")]
    TypeMismatch {
        table: String,
        row: usize,
        column: String,
        expected: &'static str,
        found: ScalarKind,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Null,
    Bool,
    Int,
    Float,
    Str,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Int => "integer",
            Self::Float => "float",
            Self::Str => "string",
        })
    }
}

/// One cell of a result table.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    pub fn kind(&self) -> ScalarKind {
        match self {
            Self::Null => ScalarKind::Null,
            Self::Bool(_) => ScalarKind::Bool,
            Self::Int(_) => ScalarKind::Int,
            Self::Float(_) => ScalarKind::Float,
            Self::Str(_) => ScalarKind::Str,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ScalarVisitor;

        impl<'de> Visitor<'de> for ScalarVisitor {
            type Value = Scalar;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON scalar or null")
            }

            fn visit_unit<E: de::Error>(self) -> Result<Scalar, E> {
                Ok(Scalar::Null)
            }

            fn visit_none<E: de::Error>(self) -> Result<Scalar, E> {
                Ok(Scalar::Null)
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Scalar, E> {
                Ok(Scalar::Bool(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Scalar, E> {
                Ok(Scalar::Int(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Scalar, E> {
                Ok(i64::try_from(v).map_or(Scalar::Float(v as f64), Scalar::Int))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Scalar, E> {
                Ok(Scalar::Float(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Scalar, E> {
                Ok(Scalar::Str(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Scalar, E> {
                Ok(Scalar::Str(v))
            }
        }

        deserializer.deserialize_any(ScalarVisitor)
    }
}

/// One named table of a response: ordered headers plus row tuples.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResultTable {
    pub name: String,
    #[serde(rename = "headers")]
    pub columns: Vec<String>,
    #[serde(rename = "rowSet")]
    pub rows: Vec<Vec<Scalar>>,
}

impl ResultTable {
    pub fn new(
        name: impl Into<String>,
        columns: impl IntoIterator<Item = impl Into<String>>,
        rows: Vec<Vec<Scalar>>,
    ) -> Self {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            rows,
        }
    }

    fn column_index(&self) -> HashMap<&str, usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), i))
            .collect()
    }

    fn duplicate_column(&self) -> Option<&str> {
        let mut seen = std::collections::HashSet::new();
        self.columns
            .iter()
            .find(|c| !seen.insert(c.as_str()))
            .map(String::as_str)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<ResultTable>),
    One(ResultTable),
}

#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(default)]
    resource: String,
    #[serde(default)]
    parameters: serde_json::Value,
    #[serde(rename = "resultSets", default)]
    result_sets: Option<OneOrMany>,
    #[serde(rename = "resultSet", default)]
    result_set: Option<OneOrMany>,
}

/// A decoded upstream envelope: tables keyed by name plus echoed request metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub resource: String,
    pub parameters: serde_json::Value,
    tables: HashMap<String, ResultTable>,
}

impl Response {
    /// Parse a JSON envelope. Accepts both the `resultSets` and `resultSet` spellings.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DecodeError> {
        let raw: RawEnvelope = serde_json::from_slice(bytes)
            .map_err(|e| DecodeError::MalformedEnvelope(e.to_string()))?;
        let tables = match raw.result_sets.or(raw.result_set) {
            Some(OneOrMany::Many(tables)) => tables,
            Some(OneOrMany::One(table)) => vec![table],
            None => {
                return Err(DecodeError::MalformedEnvelope(
                    "envelope carries no resultSets".to_string(),
                ))
            }
        };
        if let Some((table, column)) = tables
            .iter()
            .find_map(|t| t.duplicate_column().map(|c| (t.name.as_str(), c)))
        {
            return Err(DecodeError::MalformedEnvelope(format!(
                "table `{table}` repeats column `{column}`"
            )));
        }
        let mut response = Self::from_tables(raw.resource, tables);
        response.parameters = raw.parameters;
        Ok(response)
    }

    /// Build a response from tables; the first table with a given name wins.
    pub fn from_tables(resource: impl Into<String>, tables: impl IntoIterator<Item = ResultTable>) -> Self {
        let mut by_name = HashMap::new();
        for table in tables {
            by_name.entry(table.name.clone()).or_insert(table);
        }
        Self {
            resource: resource.into(),
            parameters: serde_json::Value::Null,
            tables: by_name,
        }
    }

    pub fn table(&self, name: &str) -> Option<&ResultTable> {
        self.tables.get(name)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Decode one named slot. An absent table is an empty slot, not an error.
    pub fn slot<T: Default + 'static>(
        &self,
        table_name: &str,
        schema: &RecordSchema<T>,
    ) -> Result<Vec<T>, DecodeError> {
        match self.tables.get(table_name) {
            Some(table) => schema.decode(table),
            None => Ok(Vec::new()),
        }
    }

    pub fn decode<R: DecodeResponse>(&self) -> Result<R, DecodeError> {
        R::decode_response(self)
    }
}

/// A multi-slot result assembled from the tables of one [`Response`].
pub trait DecodeResponse: Sized {
    fn decode_response(response: &Response) -> Result<Self, DecodeError>;
}

/// Conversion from a non-null cell into a record field type.
pub trait FromScalar: Sized {
    const EXPECTED: &'static str;

    fn from_scalar(scalar: &Scalar) -> Option<Self>;
}

fn integral(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64)
        .then_some(f as i64)
}

impl FromScalar for i64 {
    const EXPECTED: &'static str = "i64";

    fn from_scalar(scalar: &Scalar) -> Option<Self> {
        match scalar {
            Scalar::Int(v) => Some(*v),
            Scalar::Float(v) => integral(*v),
            Scalar::Str(s) => s.trim().parse().ok(),
            Scalar::Null | Scalar::Bool(_) => None,
        }
    }
}

impl FromScalar for i32 {
    const EXPECTED: &'static str = "i32";

    fn from_scalar(scalar: &Scalar) -> Option<Self> {
        i64::from_scalar(scalar).and_then(|v| i32::try_from(v).ok())
    }
}

impl FromScalar for f64 {
    const EXPECTED: &'static str = "f64";

    fn from_scalar(scalar: &Scalar) -> Option<Self> {
        match scalar {
            Scalar::Int(v) => Some(*v as f64),
            Scalar::Float(v) => Some(*v),
            Scalar::Str(s) => s.trim().parse().ok(),
            Scalar::Null | Scalar::Bool(_) => None,
        }
    }
}

impl FromScalar for String {
    const EXPECTED: &'static str = "string";

    fn from_scalar(scalar: &Scalar) -> Option<Self> {
        match scalar {
            Scalar::Str(s) => Some(s.clone()),
            Scalar::Int(v) => Some(v.to_string()),
            Scalar::Float(v) => Some(v.to_string()),
            Scalar::Null | Scalar::Bool(_) => None,
        }
    }
}

impl FromScalar for bool {
    const EXPECTED: &'static str = "bool";

    fn from_scalar(scalar: &Scalar) -> Option<Self> {
        match scalar {
            Scalar::Bool(v) => Some(*v),
            Scalar::Int(0) => Some(false),
            Scalar::Int(1) => Some(true),
            _ => None,
        }
    }
}

struct RowContext<'a> {
    table: &'a str,
    index: usize,
    cells: &'a [Scalar],
    columns: &'a HashMap<&'a str, usize>,
}

trait Binding<T>: Send + Sync {
    fn resolve(&self, table: &str, columns: &HashMap<&str, usize>) -> Result<(), DecodeError>;

    fn apply(&self, target: &mut T, row: &RowContext<'_>) -> Result<(), DecodeError>;
}

struct FieldBinding<T, V, F> {
    record: &'static str,
    column: &'static str,
    optional: bool,
    set: F,
    _marker: PhantomData<fn(&mut T, V)>,
}

impl<T, V, F> Binding<T> for FieldBinding<T, V, F>
where
    V: FromScalar,
    F: Fn(&mut T, V) + Send + Sync,
{
    fn resolve(&self, table: &str, columns: &HashMap<&str, usize>) -> Result<(), DecodeError> {
        if self.optional || columns.contains_key(self.column) {
            return Ok(());
        }
        Err(DecodeError::MissingColumn {
            table: table.to_string(),
            column: self.column.to_string(),
            record: self.record,
        })
    }

    fn apply(&self, target: &mut T, row: &RowContext<'_>) -> Result<(), DecodeError> {
        let Some(&position) = row.columns.get(self.column) else {
            // resolve() already rejected missing required columns.
            return Ok(());
        };
        let cell = &row.cells[position];
        if cell.is_null() && self.optional {
            return Ok(());
        }
        match V::from_scalar(cell) {
            Some(value) => {
                (self.set)(target, value);
                Ok(())
            }
            None => Err(DecodeError::TypeMismatch {
                table: row.table.to_string(),
                row: row.index,
                column: self.column.to_string(),
                expected: V::EXPECTED,
                found: cell.kind(),
            }),
        }
    }
}

struct NestedBinding<S, F> {
    schema: Arc<RecordSchema<S>>,
    project: F,
}

impl<T, S, F> Binding<T> for NestedBinding<S, F>
where
    S: 'static,
    F: for<'a> Fn(&'a mut T) -> &'a mut S + Send + Sync,
{
    fn resolve(&self, table: &str, columns: &HashMap<&str, usize>) -> Result<(), DecodeError> {
        self.schema.resolve(table, columns)
    }

    fn apply(&self, target: &mut T, row: &RowContext<'_>) -> Result<(), DecodeError> {
        self.schema.apply((self.project)(target), row)
    }
}

/// Ordered column bindings for one record type.
pub struct RecordSchema<T> {
    record: &'static str,
    bindings: Vec<Box<dyn Binding<T>>>,
}

impl<T> fmt::Debug for RecordSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordSchema")
            .field("record", &self.record)
            .field("bindings", &self.bindings.len())
            .finish()
    }
}

impl<T: 'static> RecordSchema<T> {
    pub fn builder(record: &'static str) -> SchemaBuilder<T> {
        SchemaBuilder {
            record,
            bindings: Vec::new(),
        }
    }

    pub fn record(&self) -> &'static str {
        self.record
    }

    fn resolve(&self, table: &str, columns: &HashMap<&str, usize>) -> Result<(), DecodeError> {
        self.bindings
            .iter()
            .try_for_each(|binding| binding.resolve(table, columns))
    }

    fn apply(&self, target: &mut T, row: &RowContext<'_>) -> Result<(), DecodeError> {
        self.bindings
            .iter()
            .try_for_each(|binding| binding.apply(target, row))
    }
}

impl<T: Default + 'static> RecordSchema<T> {
    /// Decode every row of `table`, in row order. Fails without partial output.
    pub fn decode(&self, table: &ResultTable) -> Result<Vec<T>, DecodeError> {
        let columns = table.column_index();
        self.resolve(&table.name, &columns)?;

        let mut records = Vec::with_capacity(table.rows.len());
        for (index, cells) in table.rows.iter().enumerate() {
            if cells.len() != table.columns.len() {
                return Err(DecodeError::RowLengthMismatch {
                    table: table.name.clone(),
                    row: index,
                    expected: table.columns.len(),
                    found: cells.len(),
                });
            }
            let row = RowContext {
                table: &table.name,
                index,
                cells,
                columns: &columns,
            };
            let mut record = T::default();
            self.apply(&mut record, &row)?;
            records.push(record);
        }
        Ok(records)
    }
}

pub struct SchemaBuilder<T> {
    record: &'static str,
    bindings: Vec<Box<dyn Binding<T>>>,
}

impl<T: 'static> SchemaBuilder<T> {
    /// Bind a required column: a missing column or null cell fails decoding.
    pub fn field<V, F>(self, column: &'static str, set: F) -> Self
    where
        V: FromScalar + 'static,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.bind(column, false, set)
    }

    /// Bind an optional column: when absent or null the field keeps its default.
    pub fn optional<V, F>(self, column: &'static str, set: F) -> Self
    where
        V: FromScalar + 'static,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.bind(column, true, set)
    }

    /// Decode the same row into a sub-record using a shared schema.
    pub fn nested<S, F>(mut self, schema: Arc<RecordSchema<S>>, project: F) -> Self
    where
        S: 'static,
        F: for<'a> Fn(&'a mut T) -> &'a mut S + Send + Sync + 'static,
    {
        self.bindings.push(Box::new(NestedBinding { schema, project }));
        self
    }

    pub fn build(self) -> RecordSchema<T> {
        RecordSchema {
            record: self.record,
            bindings: self.bindings,
        }
    }

    fn bind<V, F>(mut self, column: &'static str, optional: bool, set: F) -> Self
    where
        V: FromScalar + 'static,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.bindings.push(Box::new(FieldBinding {
            record: self.record,
            column,
            optional,
            set,
            _marker: PhantomData,
        }));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Default)]
    struct TeamRow {
        team_id: i64,
        city: String,
    }

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Line {
        points: i32,
        pct: f64,
    }

    #[derive(Debug, Clone, PartialEq, Default)]
    struct PlayerLine {
        player_id: i64,
        nickname: Option<String>,
        line: Line,
    }

    #[derive(Debug, Clone, PartialEq, Default)]
    struct TeamLine {
        team_id: i64,
        line: Line,
    }

    fn team_schema() -> RecordSchema<TeamRow> {
        RecordSchema::builder("TeamRow")
            .field("ID", |r: &mut TeamRow, v| r.team_id = v)
            .field("CITY", |r: &mut TeamRow, v| r.city = v)
            .build()
    }

    fn line_schema() -> Arc<RecordSchema<Line>> {
        Arc::new(
            RecordSchema::builder("Line")
                .optional("PTS", |r: &mut Line, v| r.points = v)
                .optional("PCT", |r: &mut Line, v| r.pct = v)
                .build(),
        )
    }

    fn teams_table(rows: Vec<Vec<Scalar>>) -> ResultTable {
        ResultTable::new("Teams", ["ID", "CITY"], rows)
    }

    #[test]
    fn decodes_rows_in_order() {
        let table = teams_table(vec![
            vec![1.into(), "Boston".into()],
            vec![2.into(), "Miami".into()],
        ]);
        let teams = team_schema().decode(&table).unwrap();
        assert_eq!(
            teams,
            vec![
                TeamRow { team_id: 1, city: "Boston".into() },
                TeamRow { team_id: 2, city: "Miami".into() },
            ]
        );
    }

    #[test]
    fn decoding_is_deterministic() {
        let table = teams_table(vec![
            vec![20.into(), "Atlanta".into()],
            vec![56.into(), "Toronto".into()],
            vec![295.into(), "Oakland".into()],
        ]);
        let schema = team_schema();
        let first = schema.decode(&table).unwrap();
        let second = schema.decode(&table).unwrap();
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
    }

    #[test]
    fn missing_required_column_fails_without_records() {
        let table = ResultTable::new("Teams", ["ID"], vec![vec![1.into()]]);
        let err = team_schema().decode(&table).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::MissingColumn { ref column, .. } if column == "CITY"
        ));

        let empty = ResultTable::new("Teams", ["ID"], vec![]);
        assert!(matches!(
            team_schema().decode(&empty),
            Err(DecodeError::MissingColumn { .. })
        ));
    }

    #[test]
    fn row_length_mismatch_is_reported() {
        let table = teams_table(vec![
            vec![1.into(), "Boston".into()],
            vec![2.into()],
        ]);
        let err = team_schema().decode(&table).unwrap_err();
        assert_eq!(
            err,
            DecodeError::RowLengthMismatch {
                table: "Teams".into(),
                row: 1,
                expected: 2,
                found: 1,
            }
        );
    }

    #[test]
    fn null_cells_respect_optionality() {
        let required = teams_table(vec![vec![1.into(), Scalar::Null]]);
        assert!(matches!(
            team_schema().decode(&required),
            Err(DecodeError::TypeMismatch { found: ScalarKind::Null, .. })
        ));

        let schema = RecordSchema::builder("PlayerLine")
            .field("PLAYER_ID", |r: &mut PlayerLine, v| r.player_id = v)
            .optional("NICKNAME", |r: &mut PlayerLine, v: String| r.nickname = Some(v))
            .build();
        let table = ResultTable::new(
            "Players",
            ["PLAYER_ID", "NICKNAME"],
            vec![vec![7.into(), Scalar::Null], vec![8.into(), "Chef".into()]],
        );
        let rows = schema.decode(&table).unwrap();
        assert_eq!(rows[0].nickname, None);
        assert_eq!(rows[1].nickname.as_deref(), Some("Chef"));
    }

    #[test]
    fn optional_column_may_be_absent() {
        let schema = RecordSchema::builder("PlayerLine")
            .field("PLAYER_ID", |r: &mut PlayerLine, v| r.player_id = v)
            .optional("NICKNAME", |r: &mut PlayerLine, v: String| r.nickname = Some(v))
            .build();
        let table = ResultTable::new("Players", ["PLAYER_ID"], vec![vec![3.into()]]);
        let rows = schema.decode(&table).unwrap();
        assert_eq!(rows, vec![PlayerLine { player_id: 3, ..Default::default() }]);
    }

    #[test]
    fn uncoercible_cells_are_type_mismatches() {
        let table = teams_table(vec![vec!["not-a-number".into(), "Boston".into()]]);
        let err = team_schema().decode(&table).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::TypeMismatch { ref column, expected: "i64", found: ScalarKind::Str, .. }
                if column == "ID"
        ));

        let table = teams_table(vec![vec![1.5.into(), "Boston".into()]]);
        assert!(team_schema().decode(&table).is_err());

        let table = teams_table(vec![vec![true.into(), "Boston".into()]]);
        assert!(team_schema().decode(&table).is_err());
    }

    #[test]
    fn numeric_strings_and_integral_floats_coerce() {
        let table = teams_table(vec![
            vec!["12".into(), "Denver".into()],
            vec![13.0.into(), 1999.into()],
        ]);
        let teams = team_schema().decode(&table).unwrap();
        assert_eq!(teams[0].team_id, 12);
        assert_eq!(teams[1].team_id, 13);
        assert_eq!(teams[1].city, "1999");
    }

    #[test]
    fn narrow_integers_reject_out_of_range() {
        let schema = RecordSchema::builder("Line")
            .field("PTS", |r: &mut Line, v| r.points = v)
            .build();
        let table = ResultTable::new("Line", ["PTS"], vec![vec![Scalar::Int(i64::from(i32::MAX) + 1)]]);
        assert!(matches!(
            schema.decode(&table),
            Err(DecodeError::TypeMismatch { expected: "i32", .. })
        ));
    }

    #[test]
    fn nested_schema_is_shared_between_parents() {
        let line = line_schema();
        let players = RecordSchema::builder("PlayerLine")
            .field("PLAYER_ID", |r: &mut PlayerLine, v| r.player_id = v)
            .nested(line.clone(), |r: &mut PlayerLine| &mut r.line)
            .build();
        let teams = RecordSchema::builder("TeamLine")
            .field("TEAM_ID", |r: &mut TeamLine, v| r.team_id = v)
            .nested(line, |r: &mut TeamLine| &mut r.line)
            .build();

        let player_table = ResultTable::new(
            "PlayerStats",
            ["PLAYER_ID", "PTS", "PCT"],
            vec![vec![2544.into(), 31.into(), 0.5.into()], vec![201566.into(), Scalar::Null, Scalar::Null]],
        );
        let team_table = ResultTable::new(
            "TeamStats",
            ["TEAM_ID", "PTS", "PCT"],
            vec![vec![1610612739.into(), 101.into(), 0.44.into()]],
        );

        let p = players.decode(&player_table).unwrap();
        assert_eq!(p[0].line, Line { points: 31, pct: 0.5 });
        assert_eq!(p[1].line, Line::default());
        let t = teams.decode(&team_table).unwrap();
        assert_eq!(t[0].line.points, 101);
    }

    #[test]
    fn nested_required_columns_are_checked() {
        let line = Arc::new(
            RecordSchema::builder("Line")
                .field("PTS", |r: &mut Line, v| r.points = v)
                .build(),
        );
        let teams = RecordSchema::builder("TeamLine")
            .field("TEAM_ID", |r: &mut TeamLine, v| r.team_id = v)
            .nested(line, |r: &mut TeamLine| &mut r.line)
            .build();
        let table = ResultTable::new("TeamStats", ["TEAM_ID"], vec![vec![1.into()]]);
        assert!(matches!(
            teams.decode(&table),
            Err(DecodeError::MissingColumn { record: "Line", .. })
        ));
    }

    #[derive(Debug, Default)]
    struct TeamsAndLines {
        teams: Vec<TeamRow>,
        lines: Vec<TeamLine>,
    }

    impl DecodeResponse for TeamsAndLines {
        fn decode_response(response: &Response) -> Result<Self, DecodeError> {
            let lines = RecordSchema::builder("TeamLine")
                .field("TEAM_ID", |r: &mut TeamLine, v| r.team_id = v)
                .build();
            Ok(Self {
                teams: response.slot("Teams", &team_schema())?,
                lines: response.slot("Lines", &lines)?,
            })
        }
    }

    const ENVELOPE: &str = r#"{
        "resource": "franchisehistory",
        "parameters": {"LeagueID": "00"},
        "resultSets": [
            {"name": "Teams", "headers": ["ID", "CITY"], "rowSet": [[1, "Boston"], [2, "Miami"]]},
            {"name": "Unused", "headers": ["X"], "rowSet": [[[1, 2]]]}
        ]
    }"#;

    #[test]
    fn envelope_slots_decode_and_absent_tables_are_empty() {
        let response = Response::from_slice(br#"{
            "resource": "franchisehistory",
            "parameters": {"LeagueID": "00"},
            "resultSets": [
                {"name": "Teams", "headers": ["ID", "CITY"], "rowSet": [[1, "Boston"], [2, "Miami"]]},
                {"name": "Ignored", "headers": ["X"], "rowSet": [["anything"]]}
            ]
        }"#)
        .unwrap();
        assert_eq!(response.resource, "franchisehistory");
        assert_eq!(response.parameters["LeagueID"], "00");

        let decoded: TeamsAndLines = response.decode().unwrap();
        assert_eq!(decoded.teams.len(), 2);
        assert!(decoded.lines.is_empty());
    }

    #[test]
    fn slot_error_aborts_the_envelope() {
        let response = Response::from_tables(
            "test",
            [
                teams_table(vec![vec![1.into(), "Boston".into()]]),
                ResultTable::new("Lines", ["TEAM_ID"], vec![vec!["x".into()]]),
            ],
        );
        assert!(matches!(
            response.decode::<TeamsAndLines>(),
            Err(DecodeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn nested_arrays_in_cells_are_malformed() {
        assert!(matches!(
            Response::from_slice(ENVELOPE.as_bytes()),
            Err(DecodeError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn malformed_envelopes_are_rejected() {
        for body in [
            &b"not json"[..],
            br#"{"resource": "x"}"#,
            br#"{"resultSets": [{"name": "T", "headers": ["A", "A"], "rowSet": []}]}"#,
            br#"{"resultSets": [{"name": "T", "rowSet": []}]}"#,
        ] {
            assert!(
                matches!(Response::from_slice(body), Err(DecodeError::MalformedEnvelope(_))),
                "expected malformed: {}",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[test]
    fn singular_result_set_and_first_table_wins() {
        let response = Response::from_slice(
            br#"{"resultSet": {"name": "Teams", "headers": ["ID", "CITY"], "rowSet": [[9, "Utah"]]}}"#,
        )
        .unwrap();
        assert_eq!(response.slot("Teams", &team_schema()).unwrap()[0].team_id, 9);

        let response = Response::from_tables(
            "dup",
            [
                teams_table(vec![vec![1.into(), "First".into()]]),
                teams_table(vec![vec![2.into(), "Second".into()]]),
            ],
        );
        assert_eq!(response.slot("Teams", &team_schema()).unwrap()[0].city, "First");
        assert_eq!(response.table_names().count(), 1);
    }

    #[test]
    fn large_unsigned_values_become_floats() {
        let response = Response::from_slice(
            br#"{"resultSets": [{"name": "T", "headers": ["N"], "rowSet": [[18446744073709551615], [null], [true]]}]}"#,
        )
        .unwrap();
        let table = response.table("T").unwrap();
        assert_eq!(table.rows[0][0].kind(), ScalarKind::Float);
        assert!(table.rows[1][0].is_null());
        assert_eq!(table.rows[2][0], Scalar::Bool(true));
    }
}
