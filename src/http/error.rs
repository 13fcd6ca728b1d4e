use rouille::Response;

use crate::library::error::LibraryError;

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    BadGateway(String),
    Internal(String),
}

impl From<LibraryError> for ApiError {
    fn from(err: LibraryError) -> Self {
        match err {
            LibraryError::NotFound(_) => ApiError::NotFound(err.to_string()),

            LibraryError::Parse { .. } => ApiError::BadRequest(err.to_string()),

            LibraryError::Fetch(_) => ApiError::BadGateway(err.to_string()),

            LibraryError::Write { .. } | LibraryError::Fs(_) => {
                log::error!("{err}");
                ApiError::Internal("internal server error".into())
            }
        }
    }
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::NotFound(_) => 404,
            ApiError::BadRequest(_) => 400,
            ApiError::BadGateway(_) => 502,
            ApiError::Internal(_) => 500,
        }
    }

    pub fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::BadGateway(msg)
            | ApiError::Internal(msg) => Response::text(msg).with_status_code(status),
        }
    }
}
