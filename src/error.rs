use axum::{
    extract::rejection::{PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::envelope::Envelope;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("invalid id")]
    InvalidId,
    #[error("not found")]
    NotFound,
    #[error("data fetch failed")]
    DataFetch(#[from] sea_orm::DbErr),
    /// The detail is logged, never sent to the client.
    #[error("relation fetch failed")]
    RelationFetch(String),
    #[error("Failed to fetch statistics")]
    StatisticsUnavailable,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidParameter(_) | Self::InvalidId => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::DataFetch(_) | Self::RelationFetch(_) | Self::StatisticsUnavailable => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn log(&self) {
        match self {
            Self::DataFetch(err) => tracing::error!(error = %err, "data fetch failed"),
            Self::RelationFetch(detail) => tracing::error!(%detail, "relation fetch failed"),
            Self::StatisticsUnavailable => tracing::error!("every statistics section failed"),
            other => tracing::debug!(error = %other, "request rejected"),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!(%rejection, "query string rejected");
        Self::InvalidParameter("query".to_string())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(%rejection, "path rejected");
        Self::InvalidId
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        Envelope::failure(self.status_code(), self.to_string()).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use sea_orm::DbErr;

    use super::*;

    #[test]
    fn taxonomy_maps_to_envelope_codes() {
        let cases = [
            (AppError::InvalidParameter("page".into()), StatusCode::BAD_REQUEST),
            (AppError::InvalidId, StatusCode::BAD_REQUEST),
            (AppError::NotFound, StatusCode::NOT_FOUND),
            (AppError::DataFetch(DbErr::Custom("boom".into())), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::RelationFetch("reviews".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::StatisticsUnavailable, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, code) in cases {
            assert_eq!(err.status_code(), code, "{err}");
        }
    }

    #[test]
    fn storage_detail_is_not_exposed() {
        let err = AppError::from(DbErr::Custom("password=hunter2".into()));
        assert_eq!(err.to_string(), "data fetch failed");
    }
}
