use std::io;
use thiserror::Error;
use tiny_http::{Response, ResponseBox, StatusCode};

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    BadRequest(String),
    #[error("Server not configured to save \"*.{0}\" files")]
    TypeNotAllowed(String),
    #[error(transparent)]
    Storage(#[from] io::Error),
}

impl RequestError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode(404),
            Self::BadRequest(_) => StatusCode(400),
            Self::TypeNotAllowed(_) => StatusCode(415),
            Self::Storage(_) => StatusCode(500),
        }
    }

    pub fn into_response(self) -> ResponseBox {
        let status = self.status();

        Response::from_string(self.to_string())
            .with_status_code(status)
            .boxed()
    }
}
