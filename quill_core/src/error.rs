use sea_orm::DbErr;
use thiserror::Error;

/// Failures that escape a request handler.
///
/// Everything else a handler can express is either a redirect or an inline
/// form error; only an unknown key or a broken store ends the request.
#[derive(Debug, Error)]
pub enum ViewError {
    #[error("not found")]
    NotFound,

    #[error("fatal database error")]
    Db(#[from] DbErr),
}
