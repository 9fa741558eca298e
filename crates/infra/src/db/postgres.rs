//! Parallel Postgres adapter sharing the criteria DSL. Not wired into the
//! running service; the Mongo repositories are the primary store.

use std::marker::PhantomData;

use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool};

use formsrv_domain::criteria::{Criteria, FilterValue, Page};
use formsrv_domain::error::DomainError;
use formsrv_domain::DomainResult;

/// Renders `" WHERE f1 op $1 AND f2 op $2 …"` with placeholders numbered in
/// filter declaration order, plus the values to bind positionally. Empty
/// criteria renders an empty clause.
pub fn build_where_clause(criteria: &Criteria) -> (String, Vec<FilterValue>) {
    if criteria.is_empty() {
        return (String::new(), Vec::new());
    }

    let mut predicates = Vec::with_capacity(criteria.filters().len());
    let mut values = Vec::with_capacity(criteria.filters().len());
    for (index, filter) in criteria.filters().iter().enumerate() {
        predicates.push(format!(
            "{} {} ${}",
            filter.field,
            filter.operator.as_sql(),
            index + 1
        ));
        values.push(filter.value.clone());
    }

    (format!(" WHERE {}", predicates.join(" AND ")), values)
}

pub struct PostgresRepository<M> {
    pool: PgPool,
    table: String,
    _model: PhantomData<fn() -> M>,
}

impl<M> PostgresRepository<M>
where
    M: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(pool: PgPool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
            _model: PhantomData,
        }
    }

    /// `SELECT * FROM <table>` with the criteria's WHERE clause and an
    /// offset/limit window. List values bind as a single array parameter.
    pub async fn matching(&self, criteria: &Criteria, page: Page) -> DomainResult<Vec<M>> {
        let (clause, values) = build_where_clause(criteria);
        let next = values.len();
        let sql = format!(
            "SELECT * FROM {}{} LIMIT ${} OFFSET ${}",
            self.table,
            clause,
            next + 1,
            next + 2
        );

        let mut query = sqlx::query_as::<_, M>(&sql);
        for value in values {
            query = match value {
                FilterValue::Text(text) => query.bind(text),
                FilterValue::Int(int) => query.bind(int),
                FilterValue::List(list) => query.bind(list),
            };
        }
        query = query.bind(page.limit as i64).bind(page.offset as i64);

        query
            .fetch_all(&self.pool)
            .await
            .map_err(|err| map_sql_error(err, "postgres.matching"))
    }
}

fn map_sql_error(err: sqlx::Error, scope: &'static str) -> DomainError {
    match &err {
        sqlx::Error::RowNotFound => DomainError::not_found(scope),
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            DomainError::conflict(scope, format!("duplicate key: {db_err}"))
        }
        _ => DomainError::persistence(scope, err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formsrv_domain::criteria::{Filter, FilterOperator};

    #[test]
    fn empty_criteria_renders_no_where_clause() {
        let (clause, values) = build_where_clause(&Criteria::default());
        assert!(clause.is_empty());
        assert!(values.is_empty());
    }

    #[test]
    fn placeholders_follow_filter_declaration_order() {
        let criteria = Criteria::new(vec![
            Filter::new("form_id", FilterOperator::Equal, "f-1"),
            Filter::new("attempts", FilterOperator::GreaterEqual, 2i64),
            Filter::new("section", FilterOperator::NotLike, "archived"),
        ]);
        let (clause, values) = build_where_clause(&criteria);
        assert_eq!(
            clause,
            " WHERE form_id = $1 AND attempts >= $2 AND section NOT LIKE $3"
        );
        assert_eq!(
            values,
            vec![
                FilterValue::Text("f-1".to_string()),
                FilterValue::Int(2),
                FilterValue::Text("archived".to_string()),
            ]
        );
    }

    #[test]
    fn one_predicate_per_filter() {
        let filters: Vec<Filter> = (0..5)
            .map(|index| {
                Filter::new(
                    format!("field_{index}"),
                    FilterOperator::Equal,
                    format!("value_{index}"),
                )
            })
            .collect();
        let (clause, values) = build_where_clause(&Criteria::new(filters));
        assert_eq!(clause.matches(" AND ").count(), 4);
        assert_eq!(values.len(), 5);
        for index in 0..5 {
            assert!(clause.contains(&format!("field_{index} = ${}", index + 1)));
        }
    }
}
