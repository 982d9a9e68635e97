//! Embedded SPA hosting: exact-path lookup with an index.html fallback so
//! client-side routes resolve after a hard refresh.

use axum::{
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "public/"]
struct FrontendAssets;

pub async fn serve_frontend_root() -> Response {
    serve_path("index.html")
}

pub async fn serve_frontend(uri: Uri) -> Response {
    serve_path(uri.path().trim_start_matches('/'))
}

fn serve_path(path: &str) -> Response {
    let candidate = if path.is_empty() { "index.html" } else { path };

    if let Some(asset) = FrontendAssets::get(candidate) {
        let mime = mime_guess::from_path(candidate).first_or_octet_stream();
        return (
            [(header::CONTENT_TYPE, mime.as_ref().to_string())],
            asset.data.into_owned(),
        )
            .into_response();
    }

    // SPA fallback
    match FrontendAssets::get("index.html") {
        Some(index) => (
            [(header::CONTENT_TYPE, "text/html; charset=utf-8".to_string())],
            index.data.into_owned(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "frontend bundle not found").into_response(),
    }
}
