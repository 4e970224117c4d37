//! Read-only HTTP server over the content pipeline

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::commands::list::tag_summary;
use crate::commands::show::PostPage;
use crate::content::{query, ContentError, PageMeta};
use crate::Blog;

/// Build the application router
pub fn router(blog: Arc<Blog>) -> Router {
    let assets = ServeDir::new(&blog.public_dir);

    Router::new()
        .route("/api/posts", get(list_posts))
        .route("/api/posts/:id", get(get_post))
        .route("/api/paths", get(list_paths))
        .route("/api/tags", get(list_tags))
        .route("/api/search", get(search))
        .fallback_service(assets)
        .layer(TraceLayer::new_for_http())
        .with_state(blog)
}

/// Start the server
pub async fn start(blog: Blog, ip: &str, port: u16) -> Result<()> {
    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let app = router(Arc::new(blog));

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn list_posts(State(blog): State<Arc<Blog>>) -> Response {
    match blog.pipeline().list_metadata() {
        Ok(posts) => Json(posts).into_response(),
        Err(e) => internal_error(e),
    }
}

async fn get_post(State(blog): State<Arc<Blog>>, Path(id): Path<String>) -> Response {
    match blog.pipeline().get_post(&id).await {
        Ok(post) => {
            let meta = post.page_meta(&blog.config.title);
            Json(PostPage { post, meta }).into_response()
        }
        Err(ContentError::NotFound { .. }) => not_found(&blog),
        Err(e) => internal_error(e),
    }
}

async fn list_paths(State(blog): State<Arc<Blog>>) -> Response {
    match blog.static_paths() {
        Ok(paths) => Json(paths).into_response(),
        Err(e) => internal_error(e),
    }
}

async fn list_tags(State(blog): State<Arc<Blog>>) -> Response {
    match blog.pipeline().list_metadata() {
        Ok(posts) => Json(tag_summary(&posts)).into_response(),
        Err(e) => internal_error(e),
    }
}

#[derive(Debug, Default, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

async fn search(State(blog): State<Arc<Blog>>, Query(params): Query<SearchParams>) -> Response {
    match blog.pipeline().list_metadata() {
        Ok(posts) => Json(query::search(&posts, &params.q)).into_response(),
        Err(e) => internal_error(e),
    }
}

/// Dedicated page for posts that do not exist
fn not_found(blog: &Blog) -> Response {
    let meta = PageMeta::not_found(&blog.config.title);
    let page = format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>{}</title></head>
<body>
<h1>Post Not Found</h1>
<p>Sorry, the blog post you're looking for doesn't exist or has been moved.</p>
<p><a href="{}/">Go Home</a></p>
</body>
</html>
"#,
        meta.title, blog.base_path
    );
    (StatusCode::NOT_FOUND, Html(page)).into_response()
}

fn internal_error(e: ContentError) -> Response {
    tracing::error!("Request failed: {}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
}
