//! Render a single post

use anyhow::Result;
use serde::Serialize;

use crate::content::{ContentError, PageMeta, PostData};
use crate::Blog;

/// A post together with its page metadata, as shown or served
#[derive(Debug, Serialize)]
pub struct PostPage {
    pub post: PostData,
    pub meta: PageMeta,
}

/// Load a post for display; `None` when no post has this identifier
pub async fn load(blog: &Blog, id: &str) -> Result<Option<PostPage>> {
    match blog.pipeline().get_post(id).await {
        Ok(post) => {
            let meta = post.page_meta(&blog.config.title);
            Ok(Some(PostPage { post, meta }))
        }
        Err(ContentError::NotFound { .. }) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Print a post's rendered HTML (or JSON). Returns whether the post exists.
pub async fn run(blog: &Blog, id: &str, json: bool) -> Result<bool> {
    let Some(page) = load(blog, id).await? else {
        let meta = PageMeta::not_found(&blog.config.title);
        eprintln!("{}", meta.title);
        eprintln!("{}", meta.description);
        return Ok(false);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
    } else {
        print!("{}", page.post.content_html);
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_existing_and_missing() {
        let dir = TempDir::new().unwrap();
        let blog = Blog::new(dir.path()).unwrap();
        fs::create_dir_all(&blog.posts_dir).unwrap();
        fs::write(
            blog.posts_dir.join("hello.md"),
            "---\ntitle: Hello\ndate: 2024-01-01\n---\nHi",
        )
        .unwrap();

        let page = load(&blog, "hello").await.unwrap().unwrap();
        assert_eq!(page.post.content_html, "<p>Hi</p>\n");
        assert_eq!(page.meta.title, "Hello | Tech Blog");

        assert!(load(&blog, "missing").await.unwrap().is_none());
        assert!(!run(&blog, "missing", false).await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_post_is_an_error() {
        let dir = TempDir::new().unwrap();
        let blog = Blog::new(dir.path()).unwrap();
        fs::create_dir_all(&blog.posts_dir).unwrap();
        fs::write(blog.posts_dir.join("bad.md"), "---\ntitle: [x\n---\n").unwrap();

        assert!(load(&blog, "bad").await.is_err());
    }
}
