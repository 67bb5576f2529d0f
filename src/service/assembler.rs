//! Per-role query plans.
//!
//! Each role has its own fixed plan. All queries of a plan are independent
//! and are issued concurrently with `try_join!`; the first failure aborts
//! the whole assembly, so a dashboard is never returned half-built.
//!
//! | Role     | Stats scope                         | Recent requests            | Assignments      | Users |
//! |----------|-------------------------------------|----------------------------|------------------|-------|
//! | USER     | own requests                        | own                        | -                | -     |
//! | OPERATOR | own assignments + own request count | own or assigned            | own              | -     |
//! | MANAGER  | all requests in window, revenue     | all in window, with parties| live             | -     |
//! | ADMIN    | as MANAGER, average job duration    | all in window, with parties| live             | roster|

use futures_util::try_join;

use super::scope;
use crate::domain::dashboard::{round_currency, round_hours};
use crate::domain::{
    AssignmentRecord, AssignmentSummary, DashboardQuery, DashboardResult, DashboardStats,
    RequestRecord, RequestStatus, RequestSummary, UserRole,
};
use crate::error::StoreError;
use crate::persistence::{Aggregate, Field, Filter, FindOptions, RecordStore, RequestSelect};

/// Runs the plan for `query.role`.
///
/// # Errors
///
/// Returns the first [`StoreError`] raised by any query of the plan.
pub async fn assemble(
    store: &dyn RecordStore,
    query: &DashboardQuery,
) -> Result<DashboardResult, StoreError> {
    match query.role {
        UserRole::User => user_plan(store, query).await,
        UserRole::Operator => operator_plan(store, query).await,
        UserRole::Manager => manager_plan(store, query).await,
        UserRole::Admin => admin_plan(store, query).await,
    }
}

fn page(query: &DashboardQuery) -> FindOptions {
    FindOptions::page(query.limit, query.offset)
}

fn request_summaries(records: Vec<RequestRecord>) -> Vec<RequestSummary> {
    records.into_iter().map(RequestSummary::from).collect()
}

fn assignment_summaries(records: Vec<AssignmentRecord>) -> Vec<AssignmentSummary> {
    records.into_iter().map(AssignmentSummary::from).collect()
}

/// Assignments whose request currently has an operator engaged.
fn live_assignments() -> Filter {
    scope::with_request_status(&Filter::all(), RequestStatus::OPERATOR_ENGAGED)
}

async fn user_plan(
    store: &dyn RecordStore,
    query: &DashboardQuery,
) -> Result<DashboardResult, StoreError> {
    let mine = scope::owned_by(&query.user_id);
    let active = scope::with_status(&mine, RequestStatus::ACTIVE);
    let completed = scope::with_status(&mine, RequestStatus::COMPLETED);
    let pending = scope::with_status(&mine, RequestStatus::PENDING_APPROVAL);

    let (total_requests, active_requests, completed_requests, pending_approval, recent) = try_join!(
        store.count_requests(&mine),
        store.count_requests(&active),
        store.count_requests(&completed),
        store.count_requests(&pending),
        store.find_requests(&mine, page(query), RequestSelect::BARE),
    )?;

    Ok(DashboardResult {
        stats: DashboardStats {
            total_requests,
            active_requests,
            completed_requests,
            pending_approval,
            revenue: None,
            average_job_duration: None,
        },
        recent_requests: request_summaries(recent),
        assignments: None,
        users: None,
    })
}

async fn operator_plan(
    store: &dyn RecordStore,
    query: &DashboardQuery,
) -> Result<DashboardResult, StoreError> {
    let assigned = scope::operated_by(&query.user_id);
    let engaged = scope::with_request_status(&assigned, RequestStatus::OPERATOR_ENGAGED);
    let finished = scope::with_request_status(&assigned, RequestStatus::COMPLETED);
    let own = scope::owned_by(&query.user_id);
    let visible = scope::owned_or_assigned(&query.user_id);

    let (assignment_total, active_requests, completed_requests, own_total, recent, assignments) = try_join!(
        store.count_assignments(&assigned),
        store.count_assignments(&engaged),
        store.count_assignments(&finished),
        store.count_requests(&own),
        store.find_requests(&visible, page(query), RequestSelect::BARE),
        store.find_assignments(&assigned, page(query)),
    )?;

    Ok(DashboardResult {
        stats: DashboardStats {
            // A request the operator both owns and works is counted on
            // both sides.
            total_requests: assignment_total.saturating_add(own_total),
            active_requests,
            completed_requests,
            pending_approval: 0,
            revenue: None,
            average_job_duration: None,
        },
        recent_requests: request_summaries(recent),
        assignments: Some(assignment_summaries(assignments)),
        users: None,
    })
}

async fn manager_plan(
    store: &dyn RecordStore,
    query: &DashboardQuery,
) -> Result<DashboardResult, StoreError> {
    let window = scope::window(query.date_range);
    let active = scope::with_status(&window, RequestStatus::ACTIVE);
    let completed = scope::with_status(&window, RequestStatus::COMPLETED);
    let pending = scope::with_status(&window, RequestStatus::PENDING_APPROVAL);
    let paid = scope::paid(&window);
    let live = live_assignments();

    let (
        total_requests,
        active_requests,
        completed_requests,
        pending_approval,
        revenue,
        recent,
        assignments,
    ) = try_join!(
        store.count_requests(&window),
        store.count_requests(&active),
        store.count_requests(&completed),
        store.count_requests(&pending),
        store.aggregate_requests(&paid, Aggregate::Sum(Field::EstimatedCost)),
        store.find_requests(&window, page(query), RequestSelect::WITH_PARTIES),
        store.find_assignments(&live, page(query)),
    )?;

    Ok(DashboardResult {
        stats: DashboardStats {
            total_requests,
            active_requests,
            completed_requests,
            pending_approval,
            revenue: Some(revenue.map_or(0.0, round_currency)),
            average_job_duration: None,
        },
        recent_requests: request_summaries(recent),
        assignments: Some(assignment_summaries(assignments)),
        users: None,
    })
}

async fn admin_plan(
    store: &dyn RecordStore,
    query: &DashboardQuery,
) -> Result<DashboardResult, StoreError> {
    let window = scope::window(query.date_range);
    let active = scope::with_status(&window, RequestStatus::ACTIVE);
    let completed = scope::with_status(&window, RequestStatus::COMPLETED);
    let pending = scope::with_status(&window, RequestStatus::PENDING_APPROVAL);
    let paid = scope::paid(&window);
    let live = live_assignments();
    let everyone = Filter::all();

    let (
        total_requests,
        active_requests,
        completed_requests,
        pending_approval,
        revenue,
        average_hours,
        recent,
        assignments,
        users,
    ) = try_join!(
        store.count_requests(&window),
        store.count_requests(&active),
        store.count_requests(&completed),
        store.count_requests(&pending),
        store.aggregate_requests(&paid, Aggregate::Sum(Field::EstimatedCost)),
        store.aggregate_requests(&completed, Aggregate::Avg(Field::TotalHours)),
        store.find_requests(&window, page(query), RequestSelect::WITH_PARTIES),
        store.find_assignments(&live, page(query)),
        store.find_users(&everyone, FindOptions::first(query.limit)),
    )?;

    Ok(DashboardResult {
        stats: DashboardStats {
            total_requests,
            active_requests,
            completed_requests,
            pending_approval,
            revenue: Some(revenue.map_or(0.0, round_currency)),
            average_job_duration: Some(average_hours.map_or(0.0, round_hours)),
        },
        recent_requests: request_summaries(recent),
        assignments: Some(assignment_summaries(assignments)),
        users: Some(users.into_iter().map(Into::into).collect()),
    })
}
