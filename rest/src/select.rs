//! Read query builder using the REST API's query-string conventions.

use std::fmt::Display;

/// Sort key for a [`Select`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// A read against one table.
///
/// ```
/// use umroh_rest::Select;
///
/// let page_two = Select::table("bookings")
///     .columns("id,status,total_price")
///     .eq("status", "pending")
///     .order("created_at", false)
///     .page(2, 10)
///     .count_exact();
/// assert_eq!(page_two.range_bounds(), Some((10, 19)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Select {
    table: String,
    columns: String,
    filters: Vec<(String, String)>,
    order: Vec<Order>,
    range: Option<(u64, u64)>,
    count: bool,
}

impl Select {
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: "*".to_string(),
            filters: Vec::new(),
            order: Vec::new(),
            range: None,
            count: false,
        }
    }

    pub fn columns(mut self, columns: impl Into<String>) -> Self {
        self.columns = columns.into();
        self
    }

    /// Keep rows where `column = value`.
    pub fn eq(mut self, column: impl Into<String>, value: impl Display) -> Self {
        self.filters.push((column.into(), format!("eq.{value}")));
        self
    }

    /// Append a sort key. Earlier keys take precedence.
    pub fn order(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order.push(Order {
            column: column.into(),
            ascending,
        });
        self
    }

    /// Inclusive row range, zero-based. `to < from` is clamped to one row.
    pub fn range(mut self, from: u64, to: u64) -> Self {
        self.range = Some((from, to.max(from)));
        self
    }

    /// One-based page of `page_size` rows. Page 0 is treated as page 1.
    pub fn page(self, page: u64, page_size: u64) -> Self {
        let size = page_size.max(1);
        let from = page.saturating_sub(1).saturating_mul(size);
        self.range(from, from.saturating_add(size - 1))
    }

    /// Ask the server for the total row count alongside the rows.
    pub fn count_exact(mut self) -> Self {
        self.count = true;
        self
    }

    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub const fn range_bounds(&self) -> Option<(u64, u64)> {
        self.range
    }

    #[must_use]
    pub const fn wants_count(&self) -> bool {
        self.count
    }

    /// Query-string pairs, in a stable order.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), self.columns.clone())];
        pairs.extend(self.filters.iter().cloned());

        if !self.order.is_empty() {
            let order = self
                .order
                .iter()
                .map(|o| {
                    let dir = if o.ascending { "asc" } else { "desc" };
                    format!("{}.{dir}", o.column)
                })
                .collect::<Vec<_>>()
                .join(",");
            pairs.push(("order".to_string(), order));
        }

        if let Some((from, to)) = self.range {
            pairs.push(("offset".to_string(), from.to_string()));
            let limit = (to - from).saturating_add(1);
            pairs.push(("limit".to_string(), limit.to_string()));
        }

        pairs
    }
}

/// Total row count from a `Content-Range` header such as `0-9/42`.
///
/// Returns `None` when the total is unknown (`*`) or the header is malformed.
#[must_use]
pub fn parse_content_range_total(value: &str) -> Option<u64> {
    let (_, total) = value.trim().rsplit_once('/')?;
    total.parse().ok()
}
