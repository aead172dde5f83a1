
use actix_web::body::BoxBody;
use actix_web::http::header::{ContentType, HeaderValue, CONTENT_TYPE};
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use log::error;
use serde::Serialize;
use stock_news_endpoint_model::{ArticleSavedNotice, FetchArticlesError, FetchedArticles, SaveArticleError, SaveArticleResult};
use crate::service::rest::inner_no_leak::{ComposeInternalError, UnhandledError};

pub trait IntoPlainText {
    fn into_plain_text(self) -> String;
}

impl<T: IntoPlainText> IntoPlainText for ComposeInternalError<T> {
    fn into_plain_text(self) -> String {
        match self {
            Ok(t) => t.into_plain_text(),
            Err(e) => e.into_plain_text(),
        }
    }
}

impl IntoPlainText for UnhandledError {
    fn into_plain_text(self) -> String {
        // details stay in the log
        "Internal server error".to_string()
    }
}

pub trait HttpStatusCode {
    fn call_status_code(&self) -> StatusCode;
}

impl<K: HttpStatusCode> HttpStatusCode for ComposeInternalError<K> {
    fn call_status_code(&self) -> StatusCode {
        match self {
            Ok(x) => x.call_status_code(),
            Err(e) => e.call_status_code(),
        }
    }
}

impl HttpStatusCode for UnhandledError {
    fn call_status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

pub struct EndpointRepresentationCompiler<T>(T);

impl<T> EndpointRepresentationCompiler<T> {
    pub const fn from_value(value: T) -> Self {
        Self(value)
    }
}

impl<T: IntoPlainText + HttpStatusCode> EndpointRepresentationCompiler<T> {
    pub fn into_plain_text(self) -> HttpResponse<String> {
        let mut res = HttpResponse::new(self.0.call_status_code());
        res.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));

        res.set_body(self.0.into_plain_text())
    }
}

impl<T: Serialize + HttpStatusCode> EndpointRepresentationCompiler<T> {
    pub fn into_json(self) -> HttpResponse<BoxBody> {
        match serde_json::to_string(&self.0) {
            Ok(body) => HttpResponse::build(self.0.call_status_code())
                .insert_header(ContentType::json())
                .body(body),
            Err(e) => {
                error!("unable to serialize response: {e}");
                HttpResponse::InternalServerError().finish()
            }
        }
    }
}

// --------------------------

impl HttpStatusCode for SaveArticleResult {
    fn call_status_code(&self) -> StatusCode {
        match self {
            Ok(_) => StatusCode::CREATED,
            Err(e) => {
                match e {
                    SaveArticleError::MalformedBody(_) => StatusCode::BAD_REQUEST,
                    SaveArticleError::StorageUnavailable | SaveArticleError::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
                }
            }
        }
    }
}

impl IntoPlainText for SaveArticleResult {
    fn into_plain_text(self) -> String {
        match self {
            Ok(ArticleSavedNotice { symbol }) => format!("OK, saved an article for {symbol}."),
            Err(e) => {
                match e {
                    SaveArticleError::MalformedBody(reason) => format!("The body must be an article in JSON: {reason}"),
                    SaveArticleError::StorageUnavailable => "Article storage is unavailable. Please try again later.".to_string(),
                    SaveArticleError::ShuttingDown => "The server is shutting down.".to_string(),
                }
            }
        }
    }
}

impl HttpStatusCode for FetchedArticles {
    fn call_status_code(&self) -> StatusCode {
        StatusCode::OK
    }
}

impl HttpStatusCode for FetchArticlesError {
    fn call_status_code(&self) -> StatusCode {
        match self {
            Self::InvalidSize(_) => StatusCode::BAD_REQUEST,
            Self::StorageUnavailable | Self::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoPlainText for FetchArticlesError {
    fn into_plain_text(self) -> String {
        match self {
            Self::InvalidSize(raw) => format!("size must be an integer, got {raw:?}"),
            Self::StorageUnavailable => "Article storage is unavailable. Please try again later.".to_string(),
            Self::ShuttingDown => "The server is shutting down.".to_string(),
        }
    }
}
