//! Static file serving for the dashboard front-end.

use std::path::Path;

use tower_http::services::ServeDir;

/// Serve `dir`, answering directory requests with their `index.html`.
pub fn create_static_service(dir: impl AsRef<Path>) -> ServeDir {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        tracing::warn!(dir = %dir.display(), "Static directory not found, dashboard will return 404");
    }
    ServeDir::new(dir).append_index_html_on_directories(true)
}
