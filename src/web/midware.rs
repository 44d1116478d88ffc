use std::{collections::HashSet, sync::Arc};

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::web::{log, Error, ErrorResponse, REQUEST_ID_HEADER};

const CORS_ALLOW_METHODS: &str = "POST, GET, OPTIONS, PUT, DELETE";
const CORS_ALLOW_HEADERS: &str =
    "Accept, Content-Type, Content-Length, Accept-Encoding, X-CSRF-Token, Authorization";

/// Attaches the CORS headers, but only if the `Origin` of the request is in `allowed_origins`.
/// Requests from any other origin pass through untouched.
/// Preflight (`OPTIONS`) requests from an allowed origin are answered right here with a 200.
pub async fn cors(
    State(allowed_origins): State<Arc<HashSet<HeaderValue>>>,
    req: Request,
    next: Next,
) -> Response {
    let Some(origin) = req
        .headers()
        .get(header::ORIGIN)
        .filter(|origin| allowed_origins.contains(*origin))
        .cloned()
    else {
        return next.run(req).await;
    };

    let mut res = if *req.method() == Method::OPTIONS {
        StatusCode::OK.into_response()
    } else {
        next.run(req).await
    };

    let headers = res.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(CORS_ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(CORS_ALLOW_HEADERS),
    );

    res
}

/// Turns a `web::Error` stashed in the response extensions into the JSON error body
/// and logs every request on the way out.
pub async fn response_mapper(req_method: Method, uri: Uri, resp: Response) -> Response {
    let req_id = resp.headers().get(REQUEST_ID_HEADER).cloned();

    let web_error = resp.extensions().get::<Arc<Error>>().map(|er| er.as_ref());
    let client_status_and_error = web_error.map(Error::status_code_and_client_error);

    let err_resp = client_status_and_error.as_ref().map(|(status, cl_err)| {
        let body = ErrorResponse::from(cl_err);
        let mut res = match serde_json::to_vec(&body) {
            Ok(json) => (*status, json).into_response(),
            Err(er) => {
                // Status and headers still go out, just without a body.
                error!("error marshaling error msg: {er}");
                (*status).into_response()
            }
        };

        let headers = res.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        if let Some(req_id) = &req_id {
            headers.insert(REQUEST_ID_HEADER, req_id.clone());
        }

        res
    });

    log::log_request(
        req_id.and_then(|id| id.to_str().ok().map(str::to_string)),
        &req_method,
        &uri,
        resp.status(),
        web_error,
        client_status_and_error.as_ref(),
    );

    err_resp.unwrap_or(resp)
}
