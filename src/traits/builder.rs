use async_trait::async_trait;
use rand::seq::SliceRandom;

use crate::clauses::{QueryState, SortDirection};
use crate::error::{FmError, Result};
use crate::types::{FieldData, FieldValue, FieldValues, InsertData, Record};

/// The fluent query vocabulary shared by every driver.
///
/// Drivers supply state access and the backend operations; filters, sorting,
/// pagination, lookups and aggregates are built on top of those here.
///
/// # Example
/// ```ignore
/// let orders = driver
///     .layout("Orders")
///     .where_("status", "open")
///     .where_in("region", ["east", "west"])
///     .where_not("archived", true)
///     .take(20)
///     .get()
///     .await?;
/// ```
#[async_trait]
pub trait QueryBuilder: Send {
    fn layout_name(&self) -> Option<&str>;

    fn set_layout(&mut self, layout: String);

    fn state(&self) -> &QueryState;

    fn state_mut(&mut self) -> &mut QueryState;

    /// Runs the compiled query and normalizes the result. `only` restricts
    /// the normalized records to a single field.
    async fn fetch(&mut self, only: Option<&str>) -> Result<Vec<Record>>;

    /// Inserts each record independently and returns them as stored.
    async fn insert<D>(&mut self, data: D) -> Result<Vec<Record>>
    where
        D: Into<InsertData> + Send;

    /// Applies `data` to every record matching the current query.
    async fn update(&mut self, data: &FieldData) -> Result<Vec<Record>>;

    /// Deletes every record matching the current query. Returns false when
    /// nothing matched or a deletion failed; deletion stops at the first
    /// failure and earlier deletions stand.
    async fn delete(&mut self) -> Result<bool>;

    async fn by_record_id(&mut self, record_id: &str) -> Result<Option<Record>>;

    /// The target layout, or a configuration error when none was set.
    fn require_layout(&self) -> Result<String> {
        match self.layout_name() {
            Some(layout) if !layout.trim().is_empty() => Ok(layout.to_string()),
            _ => Err(FmError::configuration("Layout not set")),
        }
    }

    fn layout(&mut self, name: impl Into<String>) -> &mut Self {
        self.set_layout(name.into());
        self
    }

    /// Alias of `layout`.
    fn table(&mut self, name: impl Into<String>) -> &mut Self {
        self.layout(name)
    }

    /// Equality condition.
    fn where_(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> &mut Self {
        self.state_mut().add_where(field, value.into());
        self
    }

    /// Comparison condition such as `>`, `<=` or `==`. `!=` becomes `where_not`.
    fn where_op(
        &mut self,
        field: impl Into<String>,
        operator: &str,
        value: impl Into<FieldValue>,
    ) -> &mut Self {
        self.state_mut().add_where_op(field, operator, value.into());
        self
    }

    fn where_in(&mut self, field: impl Into<String>, values: impl Into<FieldValues>) -> &mut Self {
        self.state_mut().add_where_in(field, values.into());
        self
    }

    fn where_not(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> &mut Self {
        self.state_mut().add_where_not(field, value.into());
        self
    }

    fn take(&mut self, take: u64) -> &mut Self {
        self.state_mut().take = Some(take);
        self
    }

    fn limit(&mut self, limit: u64) -> &mut Self {
        self.take(limit)
    }

    fn skip(&mut self, skip: u64) -> &mut Self {
        self.state_mut().skip = Some(skip);
        self
    }

    fn offset(&mut self, offset: u64) -> &mut Self {
        self.skip(offset)
    }

    fn order_by(&mut self, field: impl Into<String>, direction: impl Into<SortDirection>) -> &mut Self {
        self.state_mut().add_sort(field, direction.into());
        self
    }

    fn order_by_ascend(&mut self, field: impl Into<String>) -> &mut Self {
        self.order_by(field, SortDirection::Ascending)
    }

    fn order_by_descend(&mut self, field: impl Into<String>) -> &mut Self {
        self.order_by(field, SortDirection::Descending)
    }

    /// Shuffles results client-side after retrieval.
    fn in_random_order(&mut self) -> &mut Self {
        self.state_mut().random_order = true;
        self
    }

    /// Clears sort rules and the random flag.
    fn reorder(&mut self) -> &mut Self {
        self.state_mut().reorder();
        self
    }

    async fn get(&mut self) -> Result<Vec<Record>> {
        let mut records = self.fetch(None).await?;
        if self.state().random_order {
            records.shuffle(&mut rand::thread_rng());
        }
        Ok(records)
    }

    async fn first(&mut self) -> Result<Option<Record>> {
        Ok(self.get().await?.into_iter().next())
    }

    /// Adds an equality condition on `primary_key` and returns the first match.
    async fn find<V>(&mut self, value: V, primary_key: &str) -> Result<Option<Record>>
    where
        V: Into<FieldValue> + Send,
    {
        if primary_key.trim().is_empty() {
            return Err(FmError::configuration("Primary key field not set"));
        }
        self.state_mut().add_where(primary_key, value.into());
        self.first().await
    }

    /// A single field of the first matching record.
    async fn value(&mut self, field: &str) -> Result<FieldValue> {
        self.first()
            .await?
            .and_then(|record| record.get(field).cloned())
            .ok_or_else(|| FmError::FieldNotFound(field.to_string()))
    }

    /// One field from every matching record; missing fields read as null.
    async fn pluck(&mut self, field: &str) -> Result<Vec<FieldValue>> {
        let records = self.fetch(Some(field)).await?;
        Ok(records.iter().map(|record| record.field(field)).collect())
    }

    async fn sum(&mut self, field: &str) -> Result<f64> {
        Ok(numeric(self.pluck(field).await?).sum())
    }

    async fn avg(&mut self, field: &str) -> Result<Option<f64>> {
        let values: Vec<f64> = numeric(self.pluck(field).await?).collect();
        if values.is_empty() {
            return Ok(None);
        }
        Ok(Some(values.iter().sum::<f64>() / values.len() as f64))
    }

    async fn min(&mut self, field: &str) -> Result<Option<f64>> {
        Ok(numeric(self.pluck(field).await?).reduce(f64::min))
    }

    async fn max(&mut self, field: &str) -> Result<Option<f64>> {
        Ok(numeric(self.pluck(field).await?).reduce(f64::max))
    }

    async fn count(&mut self) -> Result<usize> {
        Ok(self.fetch(None).await?.len())
    }

    async fn exists(&mut self) -> Result<bool> {
        Ok(self.count().await? > 0)
    }

    async fn doesnt_exist(&mut self) -> Result<bool> {
        Ok(self.count().await? == 0)
    }
}

/// Numeric values of a plucked column; nulls and non-numeric text are skipped.
fn numeric(values: Vec<FieldValue>) -> impl Iterator<Item = f64> {
    values.into_iter().filter_map(|value| value.as_f64())
}
