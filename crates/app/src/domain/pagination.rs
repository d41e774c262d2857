//! Pagination, sorting and search for list operations.

use std::fmt::Debug;

use sqlx::{FromRow, Row, postgres::PgRow};
use thiserror::Error;

/// Default page number.
pub const DEFAULT_PAGE: u32 = 1;

/// Default page size.
pub const DEFAULT_LIMIT: u32 = 10;

/// Largest accepted page size.
pub const MAX_LIMIT: u32 = 100;

/// Column a list may be ordered by.
pub trait SortField: Copy + Debug + Default + Send + Sync {
    /// Parse a client supplied field name.
    fn parse(value: &str) -> Option<Self>;

    /// SQL column expression for this field.
    fn column(self) -> &'static str;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListParamsError {
    #[error("page must be at least 1")]
    InvalidPage,

    #[error("limit must be between 1 and {MAX_LIMIT}")]
    InvalidLimit,

    #[error("unknown sort field: {0}")]
    UnknownSortField(String),

    #[error("sort order must be asc or desc, got {0}")]
    UnknownSortOrder(String),
}

/// Raw list parameters as supplied by a client.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_field: Option<String>,
    pub sort_order: Option<String>,
    pub search: Option<String>,
}

/// Validated list parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams<S> {
    page: u32,
    limit: u32,
    sort_field: S,
    sort_order: SortOrder,
    search: Option<String>,
}

impl<S: SortField> Default for ListParams<S> {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            sort_field: S::default(),
            sort_order: SortOrder::default(),
            search: None,
        }
    }
}

impl<S: SortField> TryFrom<ListQuery> for ListParams<S> {
    type Error = ListParamsError;

    fn try_from(query: ListQuery) -> Result<Self, Self::Error> {
        let page = query.page.unwrap_or(DEFAULT_PAGE);

        if page == 0 {
            return Err(ListParamsError::InvalidPage);
        }

        let limit = query.limit.unwrap_or(DEFAULT_LIMIT);

        if limit == 0 || limit > MAX_LIMIT {
            return Err(ListParamsError::InvalidLimit);
        }

        let sort_field = match query.sort_field.as_deref() {
            Some(field) => S::parse(field)
                .ok_or_else(|| ListParamsError::UnknownSortField(field.to_string()))?,
            None => S::default(),
        };

        let sort_order = match query.sort_order.as_deref() {
            Some(order) if order.eq_ignore_ascii_case("asc") => SortOrder::Asc,
            Some(order) if order.eq_ignore_ascii_case("desc") => SortOrder::Desc,
            Some(order) => return Err(ListParamsError::UnknownSortOrder(order.to_string())),
            None => SortOrder::default(),
        };

        let search = query
            .search
            .map(|search| search.trim().to_string())
            .filter(|search| !search.is_empty());

        Ok(Self {
            page,
            limit,
            sort_field,
            sort_order,
            search,
        })
    }
}

impl<S: SortField> ListParams<S> {
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    #[must_use]
    pub fn sort_field(&self) -> S {
        self.sort_field
    }

    #[must_use]
    pub const fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    #[must_use]
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// Rows to skip before the current page.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }

    /// `ORDER BY` body built from whitelisted columns only.
    #[must_use]
    pub fn order_by(&self) -> String {
        let direction = self.sort_order.as_sql();

        format!("{} {direction}, uuid {direction}", self.sort_field.column())
    }

    /// `ILIKE` pattern for the search term with wildcards escaped.
    #[must_use]
    pub fn search_pattern(&self) -> Option<String> {
        self.search.as_deref().map(|search| {
            let escaped = search
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");

            format!("%{escaped}%")
        })
    }

    /// Substitute `{order_by}` in a list query.
    #[must_use]
    pub fn render(&self, sql: &str) -> String {
        sql.replace("{order_by}", &self.order_by())
    }
}

/// A single page of results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
}

impl<T> Page<T> {
    pub(crate) fn from_counted<S: SortField>(rows: Vec<Counted<T>>, params: &ListParams<S>) -> Self {
        let total = rows.first().map_or(0, |row| row.total);

        Self {
            items: rows.into_iter().map(|row| row.item).collect(),
            page: params.page(),
            limit: params.limit(),
            total,
        }
    }

    /// Transform every item on the page.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total: self.total,
        }
    }
}

/// A row decoded together with the `total_count` window column.
#[derive(Debug)]
pub(crate) struct Counted<T> {
    total: u64,
    item: T,
}

impl<'r, T> FromRow<'r, PgRow> for Counted<T>
where
    T: FromRow<'r, PgRow>,
{
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let total: i64 = row.try_get("total_count")?;

        Ok(Self {
            total: u64::try_from(total).map_err(|error| sqlx::Error::ColumnDecode {
                index: "total_count".to_string(),
                source: Box::new(error),
            })?,
            item: T::from_row(row)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    enum WidgetSort {
        Name,
        #[default]
        CreatedAt,
    }

    impl SortField for WidgetSort {
        fn parse(value: &str) -> Option<Self> {
            match value {
                "name" => Some(Self::Name),
                "created_at" => Some(Self::CreatedAt),
                _ => None,
            }
        }

        fn column(self) -> &'static str {
            match self {
                Self::Name => "name",
                Self::CreatedAt => "created_at",
            }
        }
    }

    #[test]
    fn defaults_apply_when_query_is_empty() -> TestResult {
        let params = ListParams::<WidgetSort>::try_from(ListQuery::default())?;

        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), 10);
        assert_eq!(params.offset(), 0);
        assert_eq!(params.order_by(), "created_at DESC, uuid DESC");
        assert_eq!(params.search_pattern(), None);

        Ok(())
    }

    #[test]
    fn rejects_out_of_range_pages_and_limits() {
        let zero_page = ListQuery {
            page: Some(0),
            ..ListQuery::default()
        };

        assert_eq!(
            ListParams::<WidgetSort>::try_from(zero_page),
            Err(ListParamsError::InvalidPage)
        );

        let huge_limit = ListQuery {
            limit: Some(101),
            ..ListQuery::default()
        };

        assert_eq!(
            ListParams::<WidgetSort>::try_from(huge_limit),
            Err(ListParamsError::InvalidLimit)
        );
    }

    #[test]
    fn unknown_sort_fields_are_rejected() {
        let query = ListQuery {
            sort_field: Some("password".to_string()),
            ..ListQuery::default()
        };

        assert_eq!(
            ListParams::<WidgetSort>::try_from(query),
            Err(ListParamsError::UnknownSortField("password".to_string()))
        );
    }

    #[test]
    fn search_escapes_wildcards() -> TestResult {
        let query = ListQuery {
            page: Some(3),
            limit: Some(20),
            sort_field: Some("name".to_string()),
            sort_order: Some("ASC".to_string()),
            search: Some("  50%_off ".to_string()),
        };

        let params = ListParams::<WidgetSort>::try_from(query)?;

        assert_eq!(params.offset(), 40);
        assert_eq!(params.order_by(), "name ASC, uuid ASC");
        assert_eq!(params.search_pattern().as_deref(), Some("%50\\%\\_off%"));

        Ok(())
    }
}
