//! Partial updates.
//!
//! Only fields the client actually sent are written. A patch that ends up
//! with no fields is a client error.

use sqlx::{Encode, Postgres, QueryBuilder, Type};

use crate::error::ApiError;

/// Message returned when a patch carries no fields.
pub const EMPTY_PATCH: &str = "No data to update";

/// Builder for `UPDATE <table> SET ... WHERE id = $n RETURNING ...`.
pub struct Patch<'args> {
    builder: QueryBuilder<'args, Postgres>,
    fields: usize,
    touch_last_update: bool,
    scope: Option<(&'static str, i64)>,
}

impl<'args> Patch<'args> {
    /// Start a patch on `table`.
    #[must_use]
    pub fn new(table: &'static str) -> Self {
        Self {
            builder: QueryBuilder::new(format!("UPDATE {table} SET ")),
            fields: 0,
            touch_last_update: false,
            scope: None,
        }
    }

    /// Also refresh `last_update` when the patch is applied.
    #[must_use]
    pub const fn touching_last_update(mut self) -> Self {
        self.touch_last_update = true;
        self
    }

    /// Only match rows whose `column` equals `value` (bound, not inlined).
    #[must_use]
    pub const fn scoped_to(mut self, column: &'static str, value: i64) -> Self {
        self.scope = Some((column, value));
        self
    }

    /// Set `column` when `value` is present.
    pub fn set<T>(&mut self, column: &'static str, value: Option<T>) -> &mut Self
    where
        T: 'args + Encode<'args, Postgres> + Type<Postgres>,
    {
        if let Some(value) = value {
            if self.fields > 0 {
                self.builder.push(", ");
            }
            self.builder.push(column).push(" = ").push_bind(value);
            self.fields += 1;
        }
        self
    }

    /// Number of fields set so far.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.fields
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.fields == 0
    }

    /// Close the statement for row `id`.
    ///
    /// `extra_filter` is a static SQL guard appended to the `WHERE` clause
    /// verbatim (status checks); `returning` is the column list to return.
    pub fn finish(
        mut self,
        id: i64,
        extra_filter: Option<&'static str>,
        returning: &str,
    ) -> Result<QueryBuilder<'args, Postgres>, ApiError> {
        if self.is_empty() {
            return Err(ApiError::BadRequest(EMPTY_PATCH.into()));
        }
        if self.touch_last_update {
            self.builder.push(", last_update = NOW()");
        }
        self.builder.push(" WHERE id = ").push_bind(id);
        if let Some((column, value)) = self.scope {
            self.builder.push(" AND ").push(column).push(" = ").push_bind(value);
        }
        if let Some(filter) = extra_filter {
            self.builder.push(" AND ").push(filter);
        }
        self.builder.push(" RETURNING ").push(returning);
        Ok(self.builder)
    }
}
