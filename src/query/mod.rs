//! Read path: filter clauses are coerced per field type, shaped by operator semantics and
//! compiled into a storage-keyed query; paging parameters become a `QueryPlan`.

mod coerce;
mod compile;
mod eval;
mod ops;
mod plan;
mod types;

pub use coerce::{coerce, coerce_id};
pub use compile::compile_filters;
pub use eval::{bson_equal, compare_bson, compare_docs, eval_predicate, matches};
pub use ops::{multi_value, single_value};
pub use plan::{ORDER_BY, ORDER_WAY, Order, PAGE_NUM, PAGE_SIZE, QueryPlan, SortSpec, UNBOUNDED};
pub use types::{Bound, CompiledQuery, FieldCondition, FilterClause, Operator, Pattern, Predicate};
