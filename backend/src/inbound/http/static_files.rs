//! Static asset server for the browser front end.
//!
//! Files are read through a capability handle on the configured root, so no
//! request path can reach outside it, including through symlinks. Anything
//! that cannot be resolved inside the root is a plain 404.

use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use actix_web::http::header::CONTENT_TYPE;
use actix_web::{HttpRequest, HttpResponse, web};
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use tracing::{debug, error};

use crate::inbound::http::cache_control::{immutable_asset_header, nosniff_header};

const INDEX_FILE: &str = "index.html";
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Extension to content type, matched case-insensitively.
const CONTENT_TYPES: &[(&str, &str)] = &[
    ("html", "text/html; charset=utf-8"),
    ("htm", "text/html; charset=utf-8"),
    ("css", "text/css; charset=utf-8"),
    ("js", "text/javascript; charset=utf-8"),
    ("mjs", "text/javascript; charset=utf-8"),
    ("json", "application/json"),
    ("map", "application/json"),
    ("txt", "text/plain; charset=utf-8"),
    ("svg", "image/svg+xml"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("ico", "image/x-icon"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("ttf", "font/ttf"),
    ("wasm", "application/wasm"),
];

/// Guess a content type from the file extension.
pub fn content_type_for(path: &Path) -> &'static str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| {
            CONTENT_TYPES
                .iter()
                .find(|(known, _)| known.eq_ignore_ascii_case(ext))
                .map(|(_, content_type)| *content_type)
        })
        .unwrap_or(FALLBACK_CONTENT_TYPE)
}

/// Map a request path onto a path relative to the root.
///
/// Returns `None` for paths that try to climb out of the root. Empty and `.`
/// segments are dropped; a trailing slash selects the directory index.
pub fn resolve_request_path(request_path: &str) -> Option<PathBuf> {
    if request_path.contains('\\') || request_path.contains('\0') {
        return None;
    }
    let mut relative = PathBuf::new();
    for segment in request_path.split('/') {
        match segment {
            "" | "." => {}
            ".." => return None,
            other => relative.push(other),
        }
    }
    if relative
        .components()
        .any(|component| !matches!(component, Component::Normal(_)))
    {
        return None;
    }
    if relative.as_os_str().is_empty() || request_path.ends_with('/') {
        relative.push(INDEX_FILE);
    }
    Some(relative)
}

/// Capability handle on the static root directory.
#[derive(Clone)]
pub struct StaticRoot {
    dir: Arc<Dir>,
}

impl StaticRoot {
    /// Open `path` as the static root.
    ///
    /// # Errors
    /// Returns the I/O error when the directory cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let dir = Dir::open_ambient_dir(path, ambient_authority())?;
        Ok(Self { dir: Arc::new(dir) })
    }

    /// Read the file at `relative`, following directories to their index.
    ///
    /// Returns the path actually read alongside its bytes.
    pub fn read(&self, relative: &Path) -> io::Result<(PathBuf, Vec<u8>)> {
        let mut target = relative.to_path_buf();
        if self.dir.metadata(&target)?.is_dir() {
            target.push(INDEX_FILE);
        }
        let bytes = self.dir.read(&target)?;
        Ok((target, bytes))
    }
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound()
        .insert_header(nosniff_header())
        .finish()
}

/// Serve the file named by the request path. Registered as the default
/// service, so it answers every path and method not routed elsewhere.
pub async fn serve(req: HttpRequest, root: web::Data<StaticRoot>) -> HttpResponse {
    let Some(relative) = resolve_request_path(req.path()) else {
        debug!(path = req.path(), "rejected static path outside root");
        return not_found();
    };

    let root = root.get_ref().clone();
    let lookup = relative.clone();
    let read = match web::block(move || root.read(&lookup)).await {
        Ok(read) => read,
        Err(err) => {
            error!(error = %err, "static file read task failed");
            return HttpResponse::InternalServerError().finish();
        }
    };

    match read {
        Ok((served, bytes)) => HttpResponse::Ok()
            .insert_header((CONTENT_TYPE, content_type_for(&served)))
            .insert_header(immutable_asset_header())
            .insert_header(nosniff_header())
            .body(bytes),
        Err(err) => {
            debug!(path = %relative.display(), error = %err, "static file unavailable");
            not_found()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StaticSite;
    use actix_web::http::StatusCode;
    use actix_web::http::header::CACHE_CONTROL;
    use actix_web::App;
    use actix_web::test as actix_test;
    use rstest::{fixture, rstest};

    #[fixture]
    fn site() -> StaticSite {
        StaticSite::new().expect("static site")
    }

    #[rstest]
    #[case("/", Some("index.html"))]
    #[case("/static/app.js", Some("static/app.js"))]
    #[case("/static/", Some("static/index.html"))]
    #[case("/./static//app.js", Some("static/app.js"))]
    #[case("/../etc/passwd", None)]
    #[case("/static/../../secret", None)]
    #[case("/static\\..\\secret", None)]
    fn request_paths_resolve_inside_root(#[case] raw: &str, #[case] expected: Option<&str>) {
        assert_eq!(resolve_request_path(raw), expected.map(PathBuf::from));
    }

    #[rstest]
    #[case("index.html", "text/html; charset=utf-8")]
    #[case("app.JS", "text/javascript; charset=utf-8")]
    #[case("logo.svg", "image/svg+xml")]
    #[case("archive.bin", FALLBACK_CONTENT_TYPE)]
    #[case("README", FALLBACK_CONTENT_TYPE)]
    fn content_types_follow_extension(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(content_type_for(Path::new(name)), expected);
    }

    async fn get(site: &StaticSite, uri: &str) -> actix_web::dev::ServiceResponse {
        let root = site.root().expect("open root");
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(root))
                .default_service(web::to(serve)),
        )
        .await;
        actix_test::call_service(&app, actix_test::TestRequest::get().uri(uri).to_request()).await
    }

    #[rstest]
    #[actix_web::test]
    async fn root_serves_index_with_asset_headers(site: StaticSite) {
        let res = get(&site, "/").await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            res.headers().get(CACHE_CONTROL).and_then(|v| v.to_str().ok()),
            Some("max-age=31536000, immutable")
        );
        assert_eq!(
            res.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()),
            Some("text/html; charset=utf-8")
        );
        let body = actix_test::read_body(res).await;
        assert_eq!(&body[..], b"<h1>slots</h1>");
    }

    #[rstest]
    #[actix_web::test]
    async fn directory_without_slash_serves_its_index(site: StaticSite) {
        site.write("static/index.html", "nested").expect("nested index");
        let res = get(&site, "/static").await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(&actix_test::read_body(res).await[..], b"nested");
    }

    #[rstest]
    #[case("/missing.css")]
    #[case("/../outside.txt")]
    #[case("/static/%2e%2e/%2e%2e/outside.txt")]
    #[actix_web::test]
    async fn unresolvable_paths_are_not_found(site: StaticSite, #[case] uri: &str) {
        let res = get(&site, uri).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[cfg(unix)]
    #[rstest]
    #[actix_web::test]
    async fn symlinks_leaving_the_root_are_not_followed(site: StaticSite) {
        let outside = StaticSite::new().expect("outside site");
        outside.write("secret.txt", "secret").expect("secret");
        std::os::unix::fs::symlink(outside.path().join("secret.txt"), site.path().join("leak.txt"))
            .expect("symlink");
        let res = get(&site, "/leak.txt").await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
