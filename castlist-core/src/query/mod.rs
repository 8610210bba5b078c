pub mod compiler;
pub mod pagination;

pub use compiler::{
    Column, CompiledClause, CompiledInsert, FieldSet, SqlValue, ValueKind,
    compile_insert, compile_set, compile_where,
};
pub use pagination::{MAX_PAGE_LIMIT, MIN_PAGE_LIMIT, Pagination};
