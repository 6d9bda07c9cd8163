//! PostgREST row access.
//!
//! A `Query` is a plain value describing what to read or which rows a
//! mutation targets. It only knows equality filters, one ordering column and
//! a limit, which is all this client needs.

use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};

use crate::{Result, SupabaseClient};

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";
const RETURN_REPRESENTATION: &str = "return=representation";

/// Ordering clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// A nested relation select, e.g. `profile:profiles!posts_user_id_fkey(*)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embed {
    /// Key the related row appears under
    pub alias: String,
    /// Related table
    pub table: String,
    /// Foreign key hint after `!`, if given
    pub hint: Option<String>,
    /// Columns selected from the related table
    pub columns: String,
}

/// Row query against a single table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub table: String,
    pub columns: String,
    pub filters: Vec<(String, String)>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
    pub single: bool,
}

impl Query {
    /// Start a query on `table`, selecting every column.
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: "*".to_string(),
            filters: Vec::new(),
            order: None,
            limit: None,
            single: false,
        }
    }

    /// Columns to return, including embeds.
    pub fn select(mut self, columns: impl Into<String>) -> Self {
        self.columns = columns.into();
        self
    }

    /// Add an equality filter.
    pub fn eq(mut self, column: impl Into<String>, value: impl ToString) -> Self {
        self.filters.push((column.into(), value.to_string()));
        self
    }

    /// Order by a column.
    pub fn order(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.into(),
            ascending,
        });
        self
    }

    /// Cap the number of rows.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Expect exactly one row.
    pub fn single(mut self) -> Self {
        self.single = true;
        self
    }

    /// Query-string parameters for this query.
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), compact(&self.columns))];

        for (column, value) in &self.filters {
            params.push((column.clone(), format!("eq.{}", value)));
        }

        if let Some(order) = &self.order {
            let direction = if order.ascending { "asc" } else { "desc" };
            params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
        }

        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }

        params
    }

    /// Nested relation selects named in the column list.
    pub fn embeds(&self) -> Vec<Embed> {
        parse_embeds(&self.columns)
    }
}

/// PostgREST rejects whitespace inside a select list.
fn compact(columns: &str) -> String {
    columns.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Parse embeds out of a select list such as `*,profile:profiles(*)`.
pub fn parse_embeds(columns: &str) -> Vec<Embed> {
    let columns = compact(columns);
    let mut embeds = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut items = Vec::new();

    for (i, c) in columns.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                items.push(&columns[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(&columns[start..]);

    for item in items {
        let Some(open) = item.find('(') else { continue };
        let head = &item[..open];
        let inner = item[open + 1..].trim_end_matches(')').to_string();

        let (alias, relation) = match head.split_once(':') {
            Some((alias, relation)) => (alias.to_string(), relation),
            None => (head.split('!').next().unwrap_or(head).to_string(), head),
        };
        let (table, hint) = match relation.split_once('!') {
            Some((table, hint)) => (table.to_string(), Some(hint.to_string())),
            None => (relation.to_string(), None),
        };

        embeds.push(Embed {
            alias,
            table,
            hint,
            columns: inner,
        });
    }

    embeds
}

impl SupabaseClient {
    fn table_path(table: &str) -> String {
        format!("/rest/v1/{}", table)
    }

    /// Read rows.
    pub async fn select<T: DeserializeOwned>(&self, query: &Query) -> Result<Vec<T>> {
        let request = self
            .request(Method::GET, &Self::table_path(&query.table))
            .query(&query.params());

        tracing::debug!(table = %query.table, filters = ?query.filters, "select");
        self.send_json(request).await
    }

    /// Read exactly one row; zero or many rows is a `PGRST116` API error.
    pub async fn select_single<T: DeserializeOwned>(&self, query: &Query) -> Result<T> {
        let request = self
            .request(Method::GET, &Self::table_path(&query.table))
            .header("Accept", SINGLE_OBJECT)
            .query(&query.params());

        tracing::debug!(table = %query.table, filters = ?query.filters, "select single");
        self.send_json(request).await
    }

    /// Insert one row and return it, shaped by `columns`.
    pub async fn insert<B, T>(&self, table: &str, row: &B, columns: &str) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self
            .request(Method::POST, &Self::table_path(table))
            .header("Prefer", RETURN_REPRESENTATION)
            .header("Accept", SINGLE_OBJECT)
            .query(&[("select", compact(columns))])
            .json(row);

        tracing::debug!(table, "insert");
        self.send_json(request).await
    }

    /// Patch the rows matched by `query` and return them.
    pub async fn update<B, T>(&self, query: &Query, patch: &B) -> Result<Vec<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self
            .request(Method::PATCH, &Self::table_path(&query.table))
            .header("Prefer", RETURN_REPRESENTATION)
            .query(&query.params())
            .json(patch);

        tracing::debug!(table = %query.table, filters = ?query.filters, "update");
        self.send_json(request).await
    }

    /// Delete the rows matched by `query` and return them.
    pub async fn delete<T: DeserializeOwned>(&self, query: &Query) -> Result<Vec<T>> {
        let request = self
            .request(Method::DELETE, &Self::table_path(&query.table))
            .header("Prefer", RETURN_REPRESENTATION)
            .query(&query.params());

        tracing::debug!(table = %query.table, filters = ?query.filters, "delete");
        self.send_json(request).await
    }
}
