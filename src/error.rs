use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use color_eyre::Report;

use crate::error_code::ErrorCode;

pub(crate) struct Error {
    inner: color_eyre::Report,
}

impl Error {
    fn kind(&self) -> Option<&UploadError> {
        self.inner.downcast_ref()
    }

    pub(crate) fn error_code(&self) -> ErrorCode {
        self.kind()
            .map(|e| e.error_code())
            .unwrap_or(ErrorCode::UNKNOWN_ERROR)
    }

    /// The message clients see: never a tool's stderr or a parser's detail
    fn public_message(&self) -> String {
        self.kind()
            .map(ToString::to_string)
            .unwrap_or_else(|| String::from("Request failed"))
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&self.inner, f)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.inner, f)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

impl<T> From<T> for Error
where
    UploadError: From<T>,
{
    fn from(error: T) -> Self {
        Error {
            inner: Report::from(UploadError::from(error)),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum UploadError {
    #[error("Couldn't upload file")]
    Upload(#[from] actix_form_data::Error),

    #[error("Error in DB")]
    Repo(#[from] crate::repo::RepoError),

    #[error("Error interacting with filesystem")]
    Io(#[from] std::io::Error),

    #[error("Error in store")]
    Store(#[from] crate::store::StoreError),

    #[error("Error in ffmpeg")]
    FfMpeg(#[from] crate::ffmpeg::FfMpegError),

    #[error("Video id is not a valid uuid")]
    InvalidVideoId(#[source] uuid::Error),

    #[error("Only video/mp4 uploads are supported, got {0}")]
    UnsupportedContentType(String),

    #[error("No files present in upload")]
    NoFiles,

    #[error("Uploaded file is empty")]
    EmptyUpload,

    #[error("Invalid request body")]
    InvalidRequestBody(#[source] actix_web::error::JsonPayloadError),

    #[error("Missing bearer token")]
    MissingToken,

    #[error("Provided token is not valid")]
    InvalidToken(#[from] crate::auth::TokenError),

    #[error("Video belongs to another user")]
    NotOwner,

    #[error("Requested video doesn't exist")]
    MissingVideo,

    #[error("Requested asset doesn't exist")]
    MissingAsset,
}

impl UploadError {
    const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Upload(_) => ErrorCode::FILE_UPLOAD_ERROR,
            Self::Repo(e) => e.error_code(),
            Self::Io(_) => ErrorCode::IO_ERROR,
            Self::Store(e) => e.error_code(),
            Self::FfMpeg(e) => e.error_code(),
            Self::InvalidVideoId(_) => ErrorCode::INVALID_VIDEO_ID,
            Self::UnsupportedContentType(_) => ErrorCode::UNSUPPORTED_CONTENT_TYPE,
            Self::NoFiles => ErrorCode::VALIDATE_NO_FILES,
            Self::EmptyUpload => ErrorCode::VALIDATE_FILE_EMPTY,
            Self::InvalidRequestBody(_) => ErrorCode::INVALID_REQUEST_BODY,
            Self::MissingToken => ErrorCode::MISSING_TOKEN,
            Self::InvalidToken(_) => ErrorCode::INVALID_TOKEN,
            Self::NotOwner => ErrorCode::NOT_OWNER,
            Self::MissingVideo => ErrorCode::VIDEO_NOT_FOUND,
            Self::MissingAsset => ErrorCode::ASSET_NOT_FOUND,
        }
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self.kind() {
            Some(
                UploadError::Upload(_)
                | UploadError::InvalidVideoId(_)
                | UploadError::UnsupportedContentType(_)
                | UploadError::NoFiles
                | UploadError::EmptyUpload
                | UploadError::InvalidRequestBody(_),
            ) => StatusCode::BAD_REQUEST,
            Some(
                UploadError::MissingToken | UploadError::InvalidToken(_) | UploadError::NotOwner,
            ) => StatusCode::UNAUTHORIZED,
            Some(UploadError::MissingVideo | UploadError::MissingAsset) => StatusCode::NOT_FOUND,
            Some(UploadError::Store(e)) if e.is_not_found() => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .content_type("application/json")
            .body(
                serde_json::to_string(&serde_json::json!({
                    "msg": self.public_message(),
                    "code": self.error_code()
                }))
                .unwrap_or_else(|_| {
                    r#"{"msg":"Request failed","code":"unknown-error"}"#.to_string()
                }),
            )
    }
}
