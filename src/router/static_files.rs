//! Static-asset resolution under the configured document root.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use crate::http::mime;
use crate::http::response::Response;
use crate::router::HandlerError;

/// Serves the static asset a GET path resolves to.
///
/// `/` resolves to the index document; a path whose final segment has no
/// `.` gets `.html` appended; anything else is looked up literally under
/// the root. Assets are read as UTF-8 text, matching the wire model's
/// string bodies.
pub async fn serve(root: &Path, index: &str, path: &str) -> Result<Response, HandlerError> {
    let resolved = resolve(path, index);

    let Some(file_path) = locate(root, &resolved) else {
        return Err(not_found(&resolved));
    };

    // Directories and dangling paths are both "no such asset"
    let is_file = tokio::fs::metadata(&file_path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false);
    if !is_file {
        return Err(not_found(&resolved));
    }

    match tokio::fs::read_to_string(&file_path).await {
        Ok(content) => Ok(Response::ok(content, mime::content_type_for(&file_path))),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(not_found(&resolved)),
        Err(e) => Err(HandlerError::Internal(e.into())),
    }
}

/// Applies the index and `.html` rewrite rules to a request path.
fn resolve(path: &str, index: &str) -> String {
    let path = if path == "/" {
        format!("/{index}")
    } else {
        path.to_string()
    };

    let final_segment = path.rsplit('/').next().unwrap_or("");
    if final_segment.contains('.') {
        path
    } else {
        format!("{path}.html")
    }
}

/// Maps a resolved request path into the document root.
///
/// Paths with `..` components never resolve: the document root is the
/// outermost directory a request can reach.
fn locate(root: &Path, resolved: &str) -> Option<PathBuf> {
    let relative = resolved.trim_start_matches('/');
    if Path::new(relative)
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return None;
    }
    Some(root.join(relative))
}

fn not_found(resolved: &str) -> HandlerError {
    HandlerError::NotFound(format!("File not found: {resolved}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_resolves_to_index() {
        assert_eq!(resolve("/", "index.html"), "/index.html");
    }

    #[test]
    fn extensionless_final_segment_gets_html() {
        assert_eq!(resolve("/about", "index.html"), "/about.html");
        assert_eq!(resolve("/docs/intro", "index.html"), "/docs/intro.html");
    }

    #[test]
    fn dotted_final_segment_is_literal() {
        assert_eq!(resolve("/style.css", "index.html"), "/style.css");
        // only the final segment decides
        assert_eq!(resolve("/v1.2/about", "index.html"), "/v1.2/about.html");
    }

    #[test]
    fn parent_components_never_resolve() {
        assert!(locate(Path::new("/srv/static"), "/../users.json").is_none());
        assert!(locate(Path::new("/srv/static"), "/a/../../x.html").is_none());
        assert!(locate(Path::new("/srv/static"), "/a/b.html").is_some());
    }
}
