//! Offset/limit pagination shared by every list endpoint.

use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, FromRow, QueryBuilder, Sqlite, SqliteConnection};

use crate::error::{AppError, AppResult};

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Query string of list endpoints: `?limit=&offset=&search=`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListParams {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    #[serde(default)]
    pub search: Option<String>,
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

impl Default for ListParams {
    fn default() -> Self {
        Self { limit: DEFAULT_LIMIT, offset: 0, search: None }
    }
}

/// The validated limit/offset/search triple of a list query.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationContext {
    pub limit: i64,
    pub offset: i64,
    pub search: Option<String>,
}

impl PaginationContext {
    pub fn new(limit: i64, offset: i64, search: Option<String>) -> AppResult<Self> {
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(AppError::Validation(format!("limit must be between 1 and {}, got {}", MAX_LIMIT, limit)));
        }
        if offset < 0 {
            return Err(AppError::Validation(format!("offset must be >= 0, got {}", offset)));
        }
        // An empty search term filters nothing
        let search = search.filter(|s| !s.is_empty());
        Ok(Self { limit, offset, search })
    }
}

impl Default for PaginationContext {
    fn default() -> Self {
        Self { limit: DEFAULT_LIMIT, offset: 0, search: None }
    }
}

impl TryFrom<ListParams> for PaginationContext {
    type Error = AppError;

    fn try_from(params: ListParams) -> AppResult<Self> {
        Self::new(params.limit, params.offset, params.search)
    }
}

/// One page of a collection plus the size of the whole (filtered) collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    /// Converts every item, keeping the paging metadata.
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        let items = self.items.into_iter().map(f).collect::<Result<Vec<_>, E>>()?;
        Ok(Page { total: self.total, limit: self.limit, offset: self.offset, items })
    }
}

/// Describes the collection a list query runs against.
///
/// `select` and `from` are static SQL fragments owned by the repositories; only
/// the scope id and the search term are bound as parameters.
#[derive(Debug, Clone, Copy)]
pub struct Listing {
    /// `SELECT <columns>` without the FROM clause.
    pub select: &'static str,
    /// `FROM ...` including joins.
    pub from: &'static str,
    /// Primary key column; pages are ordered by it ascending.
    pub key: &'static str,
    /// Column or SQL expression the search term is matched against.
    pub search_column: &'static str,
    /// Restricts the collection to rows whose column equals the id (children of a parent).
    pub scope: Option<(&'static str, i64)>,
}

impl Listing {
    pub fn scoped(mut self, column: &'static str, id: i64) -> Self {
        self.scope = Some((column, id));
        self
    }

    fn push_filters(&self, qb: &mut QueryBuilder<'_, Sqlite>, ctx: &PaginationContext) {
        qb.push(" WHERE 1 = 1");
        if let Some((column, id)) = self.scope {
            qb.push(" AND ").push(column).push(" = ").push_bind(id);
        }
        if let Some(search) = &ctx.search {
            // instr() is case-sensitive, LIKE is not
            qb.push(" AND instr(")
                .push(self.search_column)
                .push(", ")
                .push_bind(search.clone())
                .push(") > 0");
        }
    }
}

/// Counts the filtered collection and fetches one page of it.
pub async fn paginate<T>(conn: &mut SqliteConnection, listing: &Listing, ctx: &PaginationContext) -> AppResult<Page<T>>
where
    T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) ");
    count.push(listing.from);
    listing.push_filters(&mut count, ctx);
    let total: i64 = count.build_query_scalar().fetch_one(&mut *conn).await?;

    let mut page = QueryBuilder::<Sqlite>::new(listing.select);
    page.push(" ").push(listing.from);
    listing.push_filters(&mut page, ctx);
    page.push(" ORDER BY ")
        .push(listing.key)
        .push(" ASC LIMIT ")
        .push_bind(ctx.limit)
        .push(" OFFSET ")
        .push_bind(ctx.offset);
    let items: Vec<T> = page.build_query_as().fetch_all(&mut *conn).await?;

    Ok(Page { total, limit: ctx.limit, offset: ctx.offset, items })
}
