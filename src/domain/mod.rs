//! Domain layer: roles, workflow states, records and dashboard shapes.
//!
//! Everything here is plain data. Query planning lives in
//! [`crate::service`], storage access in [`crate::persistence`].

pub mod dashboard;
pub mod options;
pub mod records;
pub mod role;
pub mod status;

pub use dashboard::{
    AssignmentSummary, DashboardResult, DashboardStats, RequestSummary, UserSummary,
};
pub use options::{CacheOptions, DashboardOptions, DashboardQuery, DateRange};
pub use records::{
    AssignmentRecord, OperatorAssignment, OperatorContact, OperatorProfile, OwnerContact,
    RequestHeadline, RequestRecord, ServiceRequest, User,
};
pub use role::UserRole;
pub use status::{AssignmentStatus, RequestStatus};
