use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use thiserror::Error;

use crate::domain::errors::DomainError;

/// Client-facing error taxonomy. `code` is the stable machine-readable tag.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    InvalidRequest { code: &'static str, message: String },

    #[error("{message}")]
    NotFound { code: &'static str, message: String },

    #[error("{message}")]
    Conflict { code: &'static str, message: String },

    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::InvalidRequest {
            code: "INVALID",
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidRequest { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::Conflict { code, .. } => code,
            AppError::Upstream(_) => "UPSTREAM",
            AppError::Internal(_) => "INTERNAL",
        }
    }
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        let message = e.to_string();
        match e {
            DomainError::InvalidRequest(msg) => AppError::InvalidRequest {
                code: "INVALID",
                message: msg,
            },
            DomainError::MinAmountNotMet { .. } => AppError::InvalidRequest {
                code: "MIN_AMOUNT_NOT_MET",
                message,
            },
            DomainError::InvalidStatus(_) => AppError::InvalidRequest {
                code: "INVALID_STATUS",
                message: "Invalid status".to_string(),
            },
            DomainError::PaymentVerificationFailed => AppError::InvalidRequest {
                code: "PAYMENT_FAILED",
                message,
            },
            DomainError::NotFound(_) => AppError::NotFound {
                code: "NOT_FOUND",
                message,
            },
            DomainError::InvalidCode => AppError::NotFound {
                code: "INVALID",
                message,
            },
            DomainError::NotFoundOrUnauthorized => AppError::NotFound {
                code: "NOT_FOUND",
                message,
            },
            DomainError::AlreadyUsed => AppError::Conflict {
                code: "USED",
                message,
            },
            DomainError::Expired => AppError::Conflict {
                code: "EXPIRED",
                message,
            },
            DomainError::LimitReached => AppError::Conflict {
                code: "LIMIT_REACHED",
                message,
            },
            DomainError::IllegalTransition { .. } => AppError::Conflict {
                code: "ILLEGAL_TRANSITION",
                message,
            },
            DomainError::UpstreamFailure(msg) => AppError::Upstream(msg),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest { .. } | AppError::Conflict { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Upstream(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::Upstream(detail) => {
                log::error!("upstream failure: {}", detail);
                "Payment provider unavailable".to_string()
            }
            AppError::Internal(detail) => {
                log::error!("internal error: {}", detail);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.code(),
            "message": message,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::ResponseError;
    use bigdecimal::BigDecimal;

    #[test]
    fn not_found_returns_404() {
        let resp = AppError::from(DomainError::NotFound("Order".to_string())).error_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn internal_error_returns_500() {
        let err = AppError::Internal("something went wrong".to_string());
        assert_eq!(
            err.error_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn unknown_code_is_404_invalid() {
        let err: AppError = DomainError::InvalidCode.into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "INVALID");
    }

    #[test]
    fn malformed_request_is_400_invalid() {
        let err: AppError = DomainError::InvalidRequest("bad".to_string()).into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "INVALID");
    }

    #[test]
    fn coupon_conflicts_map_to_400_with_codes() {
        for (domain, code) in [
            (DomainError::AlreadyUsed, "USED"),
            (DomainError::Expired, "EXPIRED"),
            (DomainError::LimitReached, "LIMIT_REACHED"),
        ] {
            let err: AppError = domain.into();
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
            assert_eq!(err.code(), code);
        }
    }

    #[test]
    fn min_amount_message_keeps_the_minimum() {
        let err: AppError = DomainError::MinAmountNotMet {
            minimum: BigDecimal::from(1000),
        }
        .into();
        assert_eq!(err.code(), "MIN_AMOUNT_NOT_MET");
        assert!(err.to_string().contains("1000"));
    }

    #[test]
    fn unauthorized_coupon_is_indistinguishable_from_missing() {
        let err: AppError = DomainError::NotFoundOrUnauthorized.into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn invalid_status_uses_fixed_message() {
        let err: AppError = DomainError::InvalidStatus("lost".to_string()).into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Invalid status");
    }

    #[test]
    fn internal_display_keeps_detail_for_logs() {
        assert_eq!(
            AppError::Internal("msg".to_string()).to_string(),
            "Internal error: msg"
        );
    }

    #[test]
    fn upstream_maps_to_500() {
        let err: AppError = DomainError::UpstreamFailure("timeout".to_string()).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "UPSTREAM");
    }
}
