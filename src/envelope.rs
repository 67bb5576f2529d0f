//! Uniform success/failure envelope.
//!
//! Every public service operation returns a [`ServiceResult`] instead of a
//! bare `Result`, so callers branch on the variant and never have to
//! handle a raw store error. It serializes as
//! `{"success": true, "data": ...}` or `{"success": false, "error": ...}`.

use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::error::{ErrorCode, ServiceError};

/// Outcome of a public service operation.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceResult<T> {
    /// Operation succeeded.
    Success(T),
    /// Operation failed with a categorized error.
    Failure(ServiceError),
}

impl<T> ServiceResult<T> {
    /// Returns `true` for [`ServiceResult::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Borrows the payload, if any.
    #[must_use]
    pub const fn data(&self) -> Option<&T> {
        match self {
            Self::Success(data) => Some(data),
            Self::Failure(_) => None,
        }
    }

    /// Borrows the error, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&ServiceError> {
        match self {
            Self::Success(_) => None,
            Self::Failure(err) => Some(err),
        }
    }

    /// Error category, if this is a failure.
    #[must_use]
    pub fn error_code(&self) -> Option<ErrorCode> {
        self.error().map(|e| e.code)
    }

    /// Maps the payload, leaving a failure untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ServiceResult<U> {
        match self {
            Self::Success(data) => ServiceResult::Success(f(data)),
            Self::Failure(err) => ServiceResult::Failure(err),
        }
    }

    /// Converts into a standard `Result`.
    ///
    /// # Errors
    ///
    /// Returns the carried [`ServiceError`] for a failure.
    pub fn into_result(self) -> Result<T, ServiceError> {
        match self {
            Self::Success(data) => Ok(data),
            Self::Failure(err) => Err(err),
        }
    }
}

impl<T, E: Into<ServiceError>> From<Result<T, E>> for ServiceResult<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::Success(data),
            Err(err) => Self::Failure(err.into()),
        }
    }
}

impl<T: Serialize> Serialize for ServiceResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ServiceResult", 2)?;
        match self {
            Self::Success(data) => {
                state.serialize_field("success", &true)?;
                state.serialize_field("data", data)?;
            }
            Self::Failure(err) => {
                state.serialize_field("success", &false)?;
                state.serialize_field("error", err)?;
            }
        }
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_shape() {
        let ok: ServiceResult<u32> = ServiceResult::Success(7);
        let json = serde_json::to_value(&ok).unwrap_or_default();
        assert_eq!(json, serde_json::json!({ "success": true, "data": 7 }));
        assert!(ok.is_success());
        assert_eq!(ok.data(), Some(&7));
    }

    #[test]
    fn failure_shape() {
        let err: ServiceResult<u32> = ServiceResult::Failure(ServiceError::dashboard_data());
        let json = serde_json::to_value(&err).unwrap_or_default();
        assert_eq!(json["success"], serde_json::json!(false));
        assert_eq!(json["error"]["code"], serde_json::json!("DASHBOARD_DATA_ERROR"));
        assert_eq!(
            json["error"]["message"],
            serde_json::json!("Failed to fetch dashboard data")
        );
        assert!(json.get("data").is_none());
        assert_eq!(err.error_code(), Some(ErrorCode::DashboardDataError));
    }

    #[test]
    fn from_result() {
        let r: Result<u32, ServiceError> = Err(ServiceError::new(ErrorCode::ValidationError, "x"));
        let env = ServiceResult::from(r);
        assert!(!env.is_success());
        assert!(env.into_result().is_err());
    }
}
