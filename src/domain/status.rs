//! Service request and assignment workflow states.
//!
//! The dashboard never transitions states; it only buckets them. The
//! bucket constants below are the single source of truth for which
//! statuses count as active, completed, awaiting approval, and so on.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle state of a service request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    /// Not yet submitted by the customer.
    Draft,
    /// Submitted, waiting for review.
    Submitted,
    /// Being reviewed by a manager.
    UnderReview,
    /// Approved for operator matching.
    Approved,
    /// Looking for an operator.
    OperatorMatching,
    /// Operator assigned.
    OperatorAssigned,
    /// Equipment availability being checked.
    EquipmentChecking,
    /// Equipment confirmed.
    EquipmentConfirmed,
    /// Deposit requested from the customer.
    DepositRequested,
    /// Deposit in flight.
    DepositPending,
    /// Deposit received.
    DepositReceived,
    /// Job scheduled.
    JobScheduled,
    /// Job running on site.
    JobInProgress,
    /// Job finished.
    JobCompleted,
    /// Invoice issued.
    Invoiced,
    /// Waiting for payment.
    PaymentPending,
    /// Payment received.
    PaymentReceived,
    /// Request closed.
    Closed,
    /// Rejected during review.
    Rejected,
    /// Cancelled by either side.
    Cancelled,
}

impl RequestStatus {
    /// Statuses counted as "active" on every dashboard.
    pub const ACTIVE: &'static [Self] = &[
        Self::Submitted,
        Self::UnderReview,
        Self::Approved,
        Self::OperatorMatching,
        Self::OperatorAssigned,
        Self::EquipmentChecking,
        Self::EquipmentConfirmed,
        Self::DepositRequested,
        Self::DepositPending,
        Self::DepositReceived,
        Self::JobScheduled,
        Self::JobInProgress,
    ];

    /// Statuses counted as "completed".
    pub const COMPLETED: &'static [Self] = &[
        Self::JobCompleted,
        Self::Invoiced,
        Self::PaymentPending,
        Self::PaymentReceived,
        Self::Closed,
    ];

    /// Statuses still waiting on a review decision.
    pub const PENDING_APPROVAL: &'static [Self] = &[Self::Submitted, Self::UnderReview];

    /// Statuses in which an assigned operator is engaged on the job.
    pub const OPERATOR_ENGAGED: &'static [Self] = &[
        Self::OperatorAssigned,
        Self::EquipmentChecking,
        Self::EquipmentConfirmed,
        Self::DepositRequested,
        Self::DepositPending,
        Self::DepositReceived,
        Self::JobScheduled,
        Self::JobInProgress,
    ];

    /// Statuses whose estimated cost counts toward revenue.
    pub const PAID: &'static [Self] = &[Self::PaymentReceived, Self::Closed];

    /// Canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Submitted => "SUBMITTED",
            Self::UnderReview => "UNDER_REVIEW",
            Self::Approved => "APPROVED",
            Self::OperatorMatching => "OPERATOR_MATCHING",
            Self::OperatorAssigned => "OPERATOR_ASSIGNED",
            Self::EquipmentChecking => "EQUIPMENT_CHECKING",
            Self::EquipmentConfirmed => "EQUIPMENT_CONFIRMED",
            Self::DepositRequested => "DEPOSIT_REQUESTED",
            Self::DepositPending => "DEPOSIT_PENDING",
            Self::DepositReceived => "DEPOSIT_RECEIVED",
            Self::JobScheduled => "JOB_SCHEDULED",
            Self::JobInProgress => "JOB_IN_PROGRESS",
            Self::JobCompleted => "JOB_COMPLETED",
            Self::Invoiced => "INVOICED",
            Self::PaymentPending => "PAYMENT_PENDING",
            Self::PaymentReceived => "PAYMENT_RECEIVED",
            Self::Closed => "CLOSED",
            Self::Rejected => "REJECTED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Wire names of a status group, for building `IN` filters.
    #[must_use]
    pub fn names(group: &[Self]) -> Vec<String> {
        group.iter().map(|s| s.as_str().to_string()).collect()
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let status = match s {
            "DRAFT" => Self::Draft,
            "SUBMITTED" => Self::Submitted,
            "UNDER_REVIEW" => Self::UnderReview,
            "APPROVED" => Self::Approved,
            "OPERATOR_MATCHING" => Self::OperatorMatching,
            "OPERATOR_ASSIGNED" => Self::OperatorAssigned,
            "EQUIPMENT_CHECKING" => Self::EquipmentChecking,
            "EQUIPMENT_CONFIRMED" => Self::EquipmentConfirmed,
            "DEPOSIT_REQUESTED" => Self::DepositRequested,
            "DEPOSIT_PENDING" => Self::DepositPending,
            "DEPOSIT_RECEIVED" => Self::DepositReceived,
            "JOB_SCHEDULED" => Self::JobScheduled,
            "JOB_IN_PROGRESS" => Self::JobInProgress,
            "JOB_COMPLETED" => Self::JobCompleted,
            "INVOICED" => Self::Invoiced,
            "PAYMENT_PENDING" => Self::PaymentPending,
            "PAYMENT_RECEIVED" => Self::PaymentReceived,
            "CLOSED" => Self::Closed,
            "REJECTED" => Self::Rejected,
            "CANCELLED" => Self::Cancelled,
            other => return Err(format!("unknown request status: {other}")),
        };
        Ok(status)
    }
}

/// State of a single operator assignment row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStatus {
    /// Offered, not yet accepted.
    Pending,
    /// Accepted and live.
    Active,
    /// Work finished.
    Completed,
    /// Withdrawn or replaced.
    Cancelled,
}

impl AssignmentStatus {
    /// Canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Active => "ACTIVE",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssignmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "ACTIVE" => Ok(Self::Active),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(format!("unknown assignment status: {other}")),
        }
    }
}
