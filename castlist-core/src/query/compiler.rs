//! Compiles sparse field-set records into parameterized SQL fragments.
//!
//! Column names come exclusively from the static [`Column`] tables declared
//! per record type; request data only ever reaches the statement as a bound
//! `$N` argument.

use castlist_model::{CreatePersonParams, SearchPersonParams, UpdatePersonParams};
use chrono::NaiveDate;

/// A positional statement argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Text(Option<String>),
    Date(Option<NaiveDate>),
    Int(i32),
    BigInt(i64),
    IntArray(Vec<i32>),
}

impl SqlValue {
    pub fn text(value: impl Into<String>) -> Self {
        SqlValue::Text(Some(value.into()))
    }

    pub fn date(value: NaiveDate) -> Self {
        SqlValue::Date(Some(value))
    }
}

/// Storage type of a column, used to pick the cleared value on overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Date,
}

/// Static descriptor of one record field: column name, accessor and presence
/// check (the accessor returns `None` when the field is absent).
#[derive(Debug)]
pub struct Column<T: 'static> {
    pub name: &'static str,
    pub kind: ValueKind,
    pub nullable: bool,
    /// Only written when present, even on a full overwrite.
    pub sparse_only: bool,
    pub value: fn(&T) -> Option<SqlValue>,
}

impl<T> Column<T> {
    /// Value bound when a full overwrite meets an absent field.
    pub fn cleared_value(&self) -> SqlValue {
        match (self.kind, self.nullable) {
            (ValueKind::Text, true) => SqlValue::Text(None),
            (ValueKind::Text, false) => SqlValue::Text(Some(String::new())),
            (ValueKind::Date, _) => SqlValue::Date(None),
        }
    }
}

/// Record types that can be compiled into statement fragments.
pub trait FieldSet: Sized + 'static {
    fn columns() -> &'static [Column<Self>];
}

/// `column = $N` assignments or predicates plus their arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledClause {
    pub clause: String,
    pub args: Vec<SqlValue>,
    /// Number of columns emitted into `clause`.
    pub fields: usize,
}

impl CompiledClause {
    pub fn is_empty(&self) -> bool {
        self.fields == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledInsert {
    pub args: Vec<SqlValue>,
    pub columns: String,
    pub placeholders: String,
}

impl CompiledInsert {
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

/// Build an `AND`-joined predicate from the present fields of `record`.
///
/// A record with no present field yields an empty clause; callers must treat
/// that as an invalid argument instead of running an unfiltered query.
pub fn compile_where<T: FieldSet>(record: &T) -> CompiledClause {
    let mut statements = Vec::with_capacity(T::columns().len());
    let mut args = Vec::with_capacity(T::columns().len());

    for column in T::columns() {
        if let Some(value) = (column.value)(record) {
            args.push(value);
            statements.push(format!("{} = ${}", column.name, args.len()));
        }
    }

    CompiledClause {
        fields: statements.len(),
        clause: statements.join(" AND "),
        args,
    }
}

/// Build a comma-joined assignment list, numbering after `existing_args`.
///
/// With `exclude_defaults` only present fields are assigned (partial update).
/// Without it every column is assigned and absent fields bind their cleared
/// value, except columns marked `sparse_only`.
pub fn compile_set<T: FieldSet>(
    record: &T,
    existing_args: Vec<SqlValue>,
    exclude_defaults: bool,
) -> CompiledClause {
    let mut args = existing_args;
    let mut statements = Vec::with_capacity(T::columns().len());

    for column in T::columns() {
        let value = match (column.value)(record) {
            Some(value) => value,
            None if exclude_defaults || column.sparse_only => continue,
            None => column.cleared_value(),
        };
        args.push(value);
        statements.push(format!("{} = ${}", column.name, args.len()));
    }

    CompiledClause {
        fields: statements.len(),
        clause: statements.join(", "),
        args,
    }
}

/// Build the column and placeholder lists of an `INSERT`; absent fields are
/// left out so store defaults apply.
pub fn compile_insert<T: FieldSet>(record: &T) -> CompiledInsert {
    let mut columns = Vec::with_capacity(T::columns().len());
    let mut placeholders = Vec::with_capacity(T::columns().len());
    let mut args = Vec::with_capacity(T::columns().len());

    for column in T::columns() {
        if let Some(value) = (column.value)(record) {
            args.push(value);
            columns.push(column.name);
            placeholders.push(format!("${}", args.len()));
        }
    }

    CompiledInsert {
        args,
        columns: columns.join(", "),
        placeholders: placeholders.join(", "),
    }
}

fn text(value: &Option<String>) -> Option<SqlValue> {
    value.clone().map(|v| SqlValue::Text(Some(v)))
}

fn date(value: &Option<NaiveDate>) -> Option<SqlValue> {
    value.map(SqlValue::date)
}

static SEARCH_COLUMNS: [Column<SearchPersonParams>; 4] = [
    Column {
        name: "fullname_ru",
        kind: ValueKind::Text,
        nullable: false,
        sparse_only: false,
        value: |p| text(&p.fullname_ru),
    },
    Column {
        name: "fullname_en",
        kind: ValueKind::Text,
        nullable: true,
        sparse_only: false,
        value: |p| text(&p.fullname_en),
    },
    Column {
        name: "birthday",
        kind: ValueKind::Date,
        nullable: true,
        sparse_only: false,
        value: |p| date(&p.birthday),
    },
    Column {
        name: "sex",
        kind: ValueKind::Text,
        nullable: true,
        sparse_only: false,
        value: |p| text(&p.sex),
    },
];

static CREATE_COLUMNS: [Column<CreatePersonParams>; 5] = [
    Column {
        name: "fullname_ru",
        kind: ValueKind::Text,
        nullable: false,
        sparse_only: false,
        value: |p| text(&p.fullname_ru),
    },
    Column {
        name: "fullname_en",
        kind: ValueKind::Text,
        nullable: true,
        sparse_only: false,
        value: |p| text(&p.fullname_en),
    },
    Column {
        name: "birthday",
        kind: ValueKind::Date,
        nullable: true,
        sparse_only: false,
        value: |p| date(&p.birthday),
    },
    Column {
        name: "sex",
        kind: ValueKind::Text,
        nullable: true,
        sparse_only: false,
        value: |p| text(&p.sex),
    },
    Column {
        name: "photo_id",
        kind: ValueKind::Text,
        nullable: true,
        sparse_only: true,
        value: |p| text(&p.photo_id),
    },
];

static UPDATE_COLUMNS: [Column<UpdatePersonParams>; 5] = [
    Column {
        name: "fullname_ru",
        kind: ValueKind::Text,
        nullable: false,
        sparse_only: false,
        value: |p| text(&p.fullname_ru),
    },
    Column {
        name: "fullname_en",
        kind: ValueKind::Text,
        nullable: true,
        sparse_only: false,
        value: |p| text(&p.fullname_en),
    },
    Column {
        name: "birthday",
        kind: ValueKind::Date,
        nullable: true,
        sparse_only: false,
        value: |p| date(&p.birthday),
    },
    Column {
        name: "sex",
        kind: ValueKind::Text,
        nullable: true,
        sparse_only: false,
        value: |p| text(&p.sex),
    },
    // A photo is only ever replaced by a new upload, never cleared.
    Column {
        name: "photo_id",
        kind: ValueKind::Text,
        nullable: true,
        sparse_only: true,
        value: |p| text(&p.photo_id),
    },
];

impl FieldSet for SearchPersonParams {
    fn columns() -> &'static [Column<Self>] {
        &SEARCH_COLUMNS
    }
}

impl FieldSet for CreatePersonParams {
    fn columns() -> &'static [Column<Self>] {
        &CREATE_COLUMNS
    }
}

impl FieldSet for UpdatePersonParams {
    fn columns() -> &'static [Column<Self>] {
        &UPDATE_COLUMNS
    }
}
