//! Cache admission policy.

use pwa_core::{Response, ResponseType};

/// Whether a response may be written to the cache.
///
/// Only a status-200, same-origin (`basic`) response is ever persisted.
/// Opaque cross-origin responses hide their status, and partial or error
/// statuses must never replace a good snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Response qualifies.
    Admit,
    /// Rejected on status.
    RejectStatus(u16),
    /// Rejected on response type.
    RejectType(ResponseType),
}

impl Admission {
    /// Evaluate a response.
    pub fn check(response: &Response) -> Self {
        if response.response_type != ResponseType::Basic {
            return Self::RejectType(response.response_type);
        }
        if response.status != 200 {
            return Self::RejectStatus(response.status);
        }
        Self::Admit
    }

    /// Whether the response was admitted.
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admit)
    }
}

impl std::fmt::Display for Admission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admit => write!(f, "admitted"),
            Self::RejectStatus(status) => write!(f, "rejected: status {}", status),
            Self::RejectType(kind) => write!(f, "rejected: {:?} response", kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_200_admitted() {
        assert!(Admission::check(&Response::new(200, "x")).is_admitted());
    }

    #[test]
    fn test_non_200_rejected() {
        assert_eq!(
            Admission::check(&Response::new(206, "partial")),
            Admission::RejectStatus(206)
        );
        assert_eq!(
            Admission::check(&Response::new(404, "")),
            Admission::RejectStatus(404)
        );
        assert_eq!(
            Admission::check(&Response::new(201, "")),
            Admission::RejectStatus(201)
        );
    }

    #[test]
    fn test_opaque_and_cors_rejected() {
        assert_eq!(
            Admission::check(&Response::opaque()),
            Admission::RejectType(ResponseType::Opaque)
        );
        let cors = Response::new(200, "x").with_type(ResponseType::Cors);
        assert_eq!(Admission::check(&cors), Admission::RejectType(ResponseType::Cors));
    }

    #[test]
    fn test_synthesized_rejected() {
        let page = Response::html(503, "offline");
        assert!(!Admission::check(&page).is_admitted());
    }
}
