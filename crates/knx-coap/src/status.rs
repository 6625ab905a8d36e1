//! Response-code taxonomy used across the engine.
//!
//! Wraps [`crate::packet::CoapCode`] values the engine actually produces, so
//! callers match on an enum instead of sprinkling `(class, detail)` tuples.

use crate::packet::CoapCode;

/// The subset of CoAP response codes this stack emits or interprets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoapStatus {
    Created,
    Changed,
    Content,
    Continue,
    BadRequest,
    Unauthorized,
    BadOption,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    NotAcceptable,
    RequestEntityIncomplete,
    RequestEntityTooLarge,
    UnsupportedContentFormat,
    InternalServerError,
}

impl CoapStatus {
    pub fn code(self) -> CoapCode {
        match self {
            CoapStatus::Created => CoapCode::CREATED_2_01,
            CoapStatus::Changed => CoapCode::CHANGED_2_04,
            CoapStatus::Content => CoapCode::CONTENT_2_05,
            CoapStatus::Continue => CoapCode::CONTINUE_2_31,
            CoapStatus::BadRequest => CoapCode::BAD_REQUEST_4_00,
            CoapStatus::Unauthorized => CoapCode::UNAUTHORIZED_4_01,
            CoapStatus::BadOption => CoapCode::BAD_OPTION_4_02,
            CoapStatus::Forbidden => CoapCode::FORBIDDEN_4_03,
            CoapStatus::NotFound => CoapCode::NOT_FOUND_4_04,
            CoapStatus::MethodNotAllowed => CoapCode::METHOD_NOT_ALLOWED_4_05,
            CoapStatus::NotAcceptable => CoapCode::NOT_ACCEPTABLE_4_06,
            CoapStatus::RequestEntityIncomplete => CoapCode::REQUEST_ENTITY_INCOMPLETE_4_08,
            CoapStatus::RequestEntityTooLarge => CoapCode::REQUEST_ENTITY_TOO_LARGE_4_13,
            CoapStatus::UnsupportedContentFormat => CoapCode::UNSUPPORTED_CONTENT_FORMAT_4_15,
            CoapStatus::InternalServerError => CoapCode::INTERNAL_SERVER_ERROR_5_00,
        }
    }

    pub fn from_code(code: CoapCode) -> Option<Self> {
        Some(match (code.class, code.detail) {
            (2, 1) => CoapStatus::Created,
            (2, 4) => CoapStatus::Changed,
            (2, 5) => CoapStatus::Content,
            (2, 31) => CoapStatus::Continue,
            (4, 0) => CoapStatus::BadRequest,
            (4, 1) => CoapStatus::Unauthorized,
            (4, 2) => CoapStatus::BadOption,
            (4, 3) => CoapStatus::Forbidden,
            (4, 4) => CoapStatus::NotFound,
            (4, 5) => CoapStatus::MethodNotAllowed,
            (4, 6) => CoapStatus::NotAcceptable,
            (4, 8) => CoapStatus::RequestEntityIncomplete,
            (4, 13) => CoapStatus::RequestEntityTooLarge,
            (4, 15) => CoapStatus::UnsupportedContentFormat,
            (5, 0) => CoapStatus::InternalServerError,
            _ => return None,
        })
    }

    pub fn is_success(self) -> bool {
        self.code().class == 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_roundtrips_through_from_code() {
        for status in [
            CoapStatus::Created,
            CoapStatus::Unauthorized,
            CoapStatus::RequestEntityIncomplete,
            CoapStatus::InternalServerError,
        ] {
            assert_eq!(CoapStatus::from_code(status.code()), Some(status));
        }
    }

    #[test]
    fn unknown_code_maps_to_none() {
        assert_eq!(CoapStatus::from_code(CoapCode::new(3, 0)), None);
    }

    #[test]
    fn success_classification() {
        assert!(CoapStatus::Content.is_success());
        assert!(!CoapStatus::NotFound.is_success());
    }
}
