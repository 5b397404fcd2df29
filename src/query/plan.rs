use serde::{Deserialize, Serialize};

use crate::schema::CollectionSchema;

pub const ORDER_BY: &str = "orderBy";
pub const ORDER_WAY: &str = "orderWay";
pub const PAGE_SIZE: &str = "pageSize";
pub const PAGE_NUM: &str = "pageNum";

/// Page size used when none is requested.
pub const UNBOUNDED: usize = usize::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub order: Order,
}

/// Sort, limit and skip derived from the paging parameters of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryPlan {
    pub sort: Option<SortSpec>,
    pub limit: usize,
    pub skip: usize,
}

impl Default for QueryPlan {
    fn default() -> Self {
        Self { sort: None, limit: UNBOUNDED, skip: 0 }
    }
}

impl QueryPlan {
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.limit == UNBOUNDED
    }

    /// Derive a plan from request parameters. Unrecognized keys are ignored; when a key
    /// repeats, the last occurrence wins.
    pub fn from_params<'a, I>(params: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut order_by: Option<&str> = None;
        let mut order_way: Option<&str> = None;
        let mut page_size: Option<&str> = None;
        let mut page_num: Option<&str> = None;
        for (k, v) in params {
            match k {
                ORDER_BY => order_by = Some(v),
                ORDER_WAY => order_way = Some(v),
                PAGE_SIZE => page_size = Some(v),
                PAGE_NUM => page_num = Some(v),
                _ => {}
            }
        }

        let sort = order_by.map(str::trim).filter(|f| !f.is_empty()).map(|field| SortSpec {
            field: field.to_string(),
            order: match order_way {
                Some(w) if w.trim().eq_ignore_ascii_case("desc") => Order::Desc,
                _ => Order::Asc,
            },
        });

        let limit = page_size
            .and_then(|s| s.trim().parse::<i64>().ok())
            .filter(|n| *n > 0)
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(UNBOUNDED);

        let page = page_num.and_then(|s| s.trim().parse::<i64>().ok()).unwrap_or(1).max(1);
        let skip = usize::try_from(page - 1).unwrap_or(usize::MAX).saturating_mul(limit);

        Self { sort, limit, skip }
    }

    /// Rewrite the sort key from a logical field name to its storage name.
    #[must_use]
    pub fn resolve_sort(mut self, schema: &CollectionSchema) -> Self {
        if let Some(spec) = self.sort.as_mut()
            && let Some(storage) = schema.storage_name(&spec.field)
        {
            spec.field = storage.to_string();
        }
        self
    }
}
