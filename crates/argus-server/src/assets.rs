//! Static `/`, `/js/*.js`, `/css/*.css` (`spec.md` §4.7). The dashboard
//! itself is out of scope (`spec.md` §1); this module only keeps the route
//! table complete by serving a minimal bundled status page and placeholder
//! assets via `tower_http::services::ServeDir`, the way the teacher serves
//! its own static content.

use std::path::PathBuf;

use axum::Router;
use tower_http::services::{ServeDir, ServeFile};

use crate::app::AppState;

pub(crate) fn routes(static_dir: PathBuf) -> Router<AppState> {
    let index = ServeFile::new(static_dir.join("index.html"));
    let js = ServeDir::new(static_dir.join("js"));
    let css = ServeDir::new(static_dir.join("css"));

    Router::new()
        .route_service("/", index)
        .nest_service("/js", js)
        .nest_service("/css", css)
}
