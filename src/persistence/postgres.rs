//! PostgreSQL implementation of [`RecordStore`].
//!
//! Filters are rendered with `sqlx::QueryBuilder`, so every value is a bind
//! parameter. Relation predicates become correlated `EXISTS` sub-selects;
//! each nesting level gets its own alias (`r0`, `a1`, `r2`, ...) so inner
//! filters never shadow outer columns.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::filter::{Field, Filter, Predicate};
use super::models::{AssignmentRow, OperatorLinkRow, RequestRow, UserRow};
use super::{Aggregate, FindOptions, RecordStore, RequestSelect};
use crate::domain::{AssignmentRecord, OperatorContact, RequestRecord, User};
use crate::error::StoreError;

const REQUEST_COLUMNS: &str = "r0.id, r0.title, r0.status, r0.owner_user_id, \
     r0.equipment_category, r0.job_site, r0.start_date, r0.end_date, r0.duration_type, \
     r0.duration_value, r0.total_hours::float8 AS total_hours, \
     r0.estimated_cost::float8 AS estimated_cost, r0.created_at, r0.updated_at, \
     ou.id AS owner_id, ou.name AS owner_name, ou.email AS owner_email, \
     ou.company AS owner_company";

const ASSIGNMENT_COLUMNS: &str = "a0.id, a0.service_request_id, a0.operator_id, a0.status, \
     a0.rate::float8 AS rate, a0.estimated_hours::float8 AS estimated_hours, \
     a0.actual_hours::float8 AS actual_hours, a0.assigned_at, a0.accepted_at, a0.completed_at, \
     req.title AS request_title, req.job_site AS request_job_site, \
     req.start_date AS request_start_date, req.end_date AS request_end_date, \
     req.status AS request_status";

const USER_COLUMNS: &str = "u0.id, u0.name, u0.email, u0.role, u0.company, u0.created_at, \
     u0.military_branch, u0.years_of_service, u0.certifications, u0.preferred_locations, \
     u0.is_available";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Table {
    Requests,
    Assignments,
    Users,
}

impl Table {
    const fn alias_prefix(self) -> char {
        match self {
            Self::Requests => 'r',
            Self::Assignments => 'a',
            Self::Users => 'u',
        }
    }

    const fn column(self, field: Field) -> Option<&'static str> {
        match (self, field) {
            (_, Field::Id) => Some("id"),
            (Self::Requests | Self::Assignments, Field::Status) => Some("status"),
            (Self::Requests | Self::Users, Field::CreatedAt) => Some("created_at"),
            (Self::Requests, Field::OwnerUserId) => Some("owner_user_id"),
            (Self::Requests, Field::EstimatedCost) => Some("estimated_cost"),
            (Self::Requests, Field::TotalHours) => Some("total_hours"),
            (Self::Assignments, Field::OperatorId) => Some("operator_id"),
            (Self::Assignments, Field::ServiceRequestId) => Some("service_request_id"),
            (Self::Assignments, Field::AssignedAt) => Some("assigned_at"),
            (Self::Users, Field::Role) => Some("role"),
            _ => None,
        }
    }
}

/// Where a filter is being rendered: which table, under which alias.
#[derive(Debug, Clone, Copy)]
struct Scope {
    table: Table,
    depth: usize,
}

impl Scope {
    const fn root(table: Table) -> Self {
        Self { table, depth: 0 }
    }

    const fn nested(self, table: Table) -> Self {
        Self {
            table,
            depth: self.depth + 1,
        }
    }

    fn alias(self) -> String {
        format!("{}{}", self.table.alias_prefix(), self.depth)
    }

    fn column(self, field: Field) -> Result<String, StoreError> {
        self.table
            .column(field)
            .map(|c| format!("{}.{c}", self.alias()))
            .ok_or_else(|| {
                StoreError::UnsupportedFilter(format!("{field:?} on {:?}", self.table))
            })
    }
}

fn push_filter(
    qb: &mut QueryBuilder<'_, Postgres>,
    filter: &Filter,
    scope: Scope,
) -> Result<(), StoreError> {
    if filter.is_empty() {
        qb.push("TRUE");
        return Ok(());
    }
    for (i, predicate) in filter.predicates().iter().enumerate() {
        if i > 0 {
            qb.push(" AND ");
        }
        push_predicate(qb, predicate, scope)?;
    }
    Ok(())
}

fn push_predicate(
    qb: &mut QueryBuilder<'_, Postgres>,
    predicate: &Predicate,
    scope: Scope,
) -> Result<(), StoreError> {
    match predicate {
        Predicate::Eq(field, value) => {
            qb.push(scope.column(*field)?)
                .push(" = ")
                .push_bind(value.clone());
        }
        Predicate::In(field, values) => {
            qb.push(scope.column(*field)?)
                .push(" = ANY(")
                .push_bind(values.clone())
                .push(")");
        }
        Predicate::NotIn(field, values) => {
            qb.push(scope.column(*field)?)
                .push(" <> ALL(")
                .push_bind(values.clone())
                .push(")");
        }
        Predicate::Range { field, gte, lte } => {
            let column = scope.column(*field)?;
            qb.push("(TRUE");
            if let Some(lo) = gte {
                qb.push(format!(" AND {column} >= ")).push_bind(*lo);
            }
            if let Some(hi) = lte {
                qb.push(format!(" AND {column} <= ")).push_bind(*hi);
            }
            qb.push(")");
        }
        Predicate::NotNull(field) => {
            qb.push(scope.column(*field)?).push(" IS NOT NULL");
        }
        Predicate::Or(alternatives) => {
            if alternatives.is_empty() {
                qb.push("FALSE");
                return Ok(());
            }
            qb.push("(");
            for (i, alt) in alternatives.iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                qb.push("(");
                push_filter(qb, alt, scope)?;
                qb.push(")");
            }
            qb.push(")");
        }
        Predicate::HasAssignment(inner) => {
            if scope.table != Table::Requests {
                return Err(StoreError::UnsupportedFilter(
                    "assignment relation outside service_requests".to_string(),
                ));
            }
            let sub = scope.nested(Table::Assignments);
            qb.push(format!(
                "EXISTS (SELECT 1 FROM operator_assignments {a} WHERE {a}.service_request_id = {outer}.id AND ",
                a = sub.alias(),
                outer = scope.alias(),
            ));
            push_filter(qb, inner, sub)?;
            qb.push(")");
        }
        Predicate::ForRequest(inner) => {
            if scope.table != Table::Assignments {
                return Err(StoreError::UnsupportedFilter(
                    "request relation outside operator_assignments".to_string(),
                ));
            }
            let sub = scope.nested(Table::Requests);
            qb.push(format!(
                "EXISTS (SELECT 1 FROM service_requests {r} WHERE {r}.id = {outer}.service_request_id AND ",
                r = sub.alias(),
                outer = scope.alias(),
            ));
            push_filter(qb, inner, sub)?;
            qb.push(")");
        }
    }
    Ok(())
}

fn push_page(qb: &mut QueryBuilder<'_, Postgres>, alias: &str, sort_column: &str, find: FindOptions) {
    qb.push(format!(
        " ORDER BY {alias}.{sort_column} DESC, {alias}.id LIMIT "
    ))
        .push_bind(i64::from(find.take))
        .push(" OFFSET ")
        .push_bind(i64::from(find.skip));
}

fn count_query(table_sql: &str, table: Table, filter: &Filter) -> Result<QueryBuilder<'static, Postgres>, StoreError> {
    let scope = Scope::root(table);
    let mut qb = QueryBuilder::new(format!("SELECT COUNT(*) FROM {table_sql} {} WHERE ", scope.alias()));
    push_filter(&mut qb, filter, scope)?;
    Ok(qb)
}

fn find_requests_query(
    filter: &Filter,
    find: FindOptions,
) -> Result<QueryBuilder<'static, Postgres>, StoreError> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT {REQUEST_COLUMNS} FROM service_requests r0 \
         LEFT JOIN users ou ON ou.id = r0.owner_user_id WHERE "
    ));
    push_filter(&mut qb, filter, Scope::root(Table::Requests))?;
    push_page(&mut qb, "r0", "created_at", find);
    Ok(qb)
}

fn find_assignments_query(
    filter: &Filter,
    find: FindOptions,
) -> Result<QueryBuilder<'static, Postgres>, StoreError> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT {ASSIGNMENT_COLUMNS} FROM operator_assignments a0 \
         JOIN service_requests req ON req.id = a0.service_request_id WHERE "
    ));
    push_filter(&mut qb, filter, Scope::root(Table::Assignments))?;
    push_page(&mut qb, "a0", "assigned_at", find);
    Ok(qb)
}

fn find_users_query(
    filter: &Filter,
    find: FindOptions,
) -> Result<QueryBuilder<'static, Postgres>, StoreError> {
    let mut qb = QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users u0 WHERE "));
    push_filter(&mut qb, filter, Scope::root(Table::Users))?;
    push_page(&mut qb, "u0", "created_at", find);
    Ok(qb)
}

fn aggregate_query(
    filter: &Filter,
    aggregate: Aggregate,
) -> Result<QueryBuilder<'static, Postgres>, StoreError> {
    let scope = Scope::root(Table::Requests);
    let field = aggregate.field();
    if !matches!(field, Field::EstimatedCost | Field::TotalHours) {
        return Err(StoreError::UnsupportedFilter(format!(
            "cannot aggregate {field:?}"
        )));
    }
    let column = scope.column(field)?;
    let function = match aggregate {
        Aggregate::Sum(_) => "SUM",
        Aggregate::Avg(_) => "AVG",
    };
    let mut qb = QueryBuilder::new(format!(
        "SELECT {function}({column})::float8 FROM service_requests r0 WHERE "
    ));
    push_filter(&mut qb, filter, scope)?;
    Ok(qb)
}

fn to_count(n: i64) -> Result<u64, StoreError> {
    u64::try_from(n).map_err(|_| StoreError::Decode(format!("negative count {n}")))
}

/// PostgreSQL-backed record store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresRecordStore {
    pool: PgPool,
}

impl PostgresRecordStore {
    /// Creates a store over the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn operators_for(
        &self,
        request_ids: Vec<String>,
    ) -> Result<HashMap<String, Vec<OperatorContact>>, StoreError> {
        let rows = sqlx::query_as::<_, OperatorLinkRow>(
            "SELECT a.service_request_id, u.id, u.name, u.email \
             FROM operator_assignments a JOIN users u ON u.id = a.operator_id \
             WHERE a.service_request_id = ANY($1) ORDER BY a.assigned_at ASC",
        )
        .bind(request_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_request: HashMap<String, Vec<OperatorContact>> = HashMap::new();
        for row in rows {
            by_request
                .entry(row.service_request_id.clone())
                .or_default()
                .push(OperatorContact::from(row));
        }
        Ok(by_request)
    }
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    async fn count_requests(&self, filter: &Filter) -> Result<u64, StoreError> {
        let mut qb = count_query("service_requests", Table::Requests, filter)?;
        let n: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        to_count(n)
    }

    async fn count_assignments(&self, filter: &Filter) -> Result<u64, StoreError> {
        let mut qb = count_query("operator_assignments", Table::Assignments, filter)?;
        let n: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        to_count(n)
    }

    async fn find_requests(
        &self,
        filter: &Filter,
        find: FindOptions,
        select: RequestSelect,
    ) -> Result<Vec<RequestRecord>, StoreError> {
        let mut qb = find_requests_query(filter, find)?;
        let rows: Vec<RequestRow> = qb.build_query_as().fetch_all(&self.pool).await?;

        let mut operators = if select.operators && !rows.is_empty() {
            self.operators_for(rows.iter().map(|r| r.id.clone()).collect())
                .await?
        } else {
            HashMap::new()
        };

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let owner = if select.owner {
                row.owner_contact()
            } else {
                None
            };
            let linked = select
                .operators
                .then(|| operators.remove(&row.id).unwrap_or_default());
            records.push(RequestRecord {
                request: row.into_request()?,
                owner,
                operators: linked,
            });
        }
        Ok(records)
    }

    async fn find_assignments(
        &self,
        filter: &Filter,
        find: FindOptions,
    ) -> Result<Vec<AssignmentRecord>, StoreError> {
        let mut qb = find_assignments_query(filter, find)?;
        let rows: Vec<AssignmentRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(AssignmentRecord::try_from).collect()
    }

    async fn find_users(&self, filter: &Filter, find: FindOptions) -> Result<Vec<User>, StoreError> {
        let mut qb = find_users_query(filter, find)?;
        let rows: Vec<UserRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(User::try_from).collect()
    }

    async fn aggregate_requests(
        &self,
        filter: &Filter,
        aggregate: Aggregate,
    ) -> Result<Option<f64>, StoreError> {
        let mut qb = aggregate_query(filter, aggregate)?;
        let value: Option<f64> = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(value)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::RequestStatus;

    fn sql(qb: Result<QueryBuilder<'static, Postgres>, StoreError>) -> String {
        let Ok(qb) = qb else {
            panic!("render failed");
        };
        qb.sql().to_string()
    }

    #[test]
    fn count_renders_binds() {
        let filter = Filter::all()
            .eq(Field::OwnerUserId, "u1")
            .is_in(Field::Status, RequestStatus::names(RequestStatus::ACTIVE));
        let rendered = sql(count_query("service_requests", Table::Requests, &filter));
        assert_eq!(
            rendered,
            "SELECT COUNT(*) FROM service_requests r0 WHERE r0.owner_user_id = $1 AND r0.status = ANY($2)"
        );
    }

    #[test]
    fn empty_filter_is_true() {
        let rendered = sql(count_query("users", Table::Users, &Filter::all()));
        assert_eq!(rendered, "SELECT COUNT(*) FROM users u0 WHERE TRUE");
    }

    #[test]
    fn relations_use_depth_aliases() {
        let filter = Filter::all().or(vec![
            Filter::all().eq(Field::OwnerUserId, "op1"),
            Filter::all().has_assignment(Filter::all().eq(Field::OperatorId, "op1")),
        ]);
        let rendered = sql(count_query("service_requests", Table::Requests, &filter));
        assert!(rendered.contains("((r0.owner_user_id = $1) OR (EXISTS (SELECT 1 FROM operator_assignments a1 WHERE a1.service_request_id = r0.id AND a1.operator_id = $2)))"));
    }

    #[test]
    fn for_request_nests_under_assignments() {
        let filter = Filter::all().for_request(
            Filter::all().is_in(Field::Status, RequestStatus::names(RequestStatus::OPERATOR_ENGAGED)),
        );
        let rendered = sql(find_assignments_query(&filter, FindOptions::first(5)));
        assert!(rendered.contains("EXISTS (SELECT 1 FROM service_requests r1 WHERE r1.id = a0.service_request_id AND r1.status = ANY($1))"));
        assert!(rendered.ends_with("ORDER BY a0.assigned_at DESC, a0.id LIMIT $2 OFFSET $3"));
    }

    #[test]
    fn range_renders_only_present_bounds() {
        let filter = Filter::all().range(Field::CreatedAt, None, Some(chrono::Utc::now()));
        let rendered = sql(find_users_query(&filter, FindOptions::first(5)));
        assert!(rendered.contains("(TRUE AND u0.created_at <= $1)"));
    }

    #[test]
    fn aggregate_casts_to_float() {
        let filter = Filter::all().not_null(Field::EstimatedCost);
        let rendered = sql(aggregate_query(&filter, Aggregate::Sum(Field::EstimatedCost)));
        assert_eq!(
            rendered,
            "SELECT SUM(r0.estimated_cost)::float8 FROM service_requests r0 WHERE r0.estimated_cost IS NOT NULL"
        );
    }

    #[test]
    fn foreign_fields_are_rejected() {
        let filter = Filter::all().eq(Field::OperatorId, "op1");
        assert!(matches!(
            count_query("service_requests", Table::Requests, &filter),
            Err(StoreError::UnsupportedFilter(_))
        ));
        assert!(matches!(
            aggregate_query(&Filter::all(), Aggregate::Avg(Field::Status)),
            Err(StoreError::UnsupportedFilter(_))
        ));
    }
}
