//! Test server exercising the client: status codes, redirect chains,
//! slow responses and an echo endpoint that reflects the request.

use std::collections::BTreeMap;
use std::time::Duration;

use axum::{
    extract::Path,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// What `/echo` saw.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub query: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

pub fn app() -> Router {
    Router::new()
        .route("/echo", any(echo))
        .route("/status/{code}", get(status))
        .route("/redirect/{hops}", any(redirect_chain))
        .route("/relative/start", get(relative_start))
        .route("/relative/finish", get(relative_finish))
        .route("/slow/{millis}", get(slow))
        .route("/slow-redirect/{hops}", get(slow_redirect))
        .route("/bytes/{len}", get(bytes))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: String) -> Json<Echo> {
    let headers = headers
        .iter()
        .map(|(k, v)| {
            (
                k.as_str().to_string(),
                String::from_utf8_lossy(v.as_bytes()).into_owned(),
            )
        })
        .collect();
    Json(Echo {
        method: method.as_str().to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body,
    })
}

async fn status(Path(code): Path<u16>) -> Result<(StatusCode, String), StatusCode> {
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    Ok((status, format!("status {code}")))
}

/// `/redirect/3` -> `/redirect/2` -> ... -> `/redirect/0`, which answers 200.
async fn redirect_chain(Path(hops): Path<u32>) -> impl IntoResponse {
    if hops == 0 {
        return (StatusCode::OK, [("x-final", "yes")], "done").into_response();
    }
    (
        StatusCode::FOUND,
        [(header::LOCATION, format!("/redirect/{}", hops - 1))],
        String::new(),
    )
        .into_response()
}

async fn relative_start() -> impl IntoResponse {
    (StatusCode::SEE_OTHER, [(header::LOCATION, "finish?from=start")])
}

async fn relative_finish(uri: Uri) -> String {
    format!("finished {}", uri.query().unwrap_or(""))
}

async fn slow(Path(millis): Path<u64>) -> &'static str {
    tokio::time::sleep(Duration::from_millis(millis)).await;
    "slow"
}

/// Delay before each `/slow-redirect` hop answers.
pub const SLOW_HOP: Duration = Duration::from_millis(700);

/// Like `/redirect/{hops}`, but every hop first waits `SLOW_HOP`.
async fn slow_redirect(Path(hops): Path<u32>) -> impl IntoResponse {
    tokio::time::sleep(SLOW_HOP).await;
    if hops == 0 {
        return (StatusCode::OK, "end").into_response();
    }
    (
        StatusCode::FOUND,
        [(header::LOCATION, format!("/slow-redirect/{}", hops - 1))],
    )
        .into_response()
}

async fn bytes(Path(len): Path<usize>) -> Vec<u8> {
    (0..len).map(|i| b'a' + (i % 26) as u8).collect()
}
