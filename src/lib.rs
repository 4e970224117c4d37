//! petalpost: the content pipeline behind a personal static blog
//!
//! Posts are markdown files with a YAML front-matter header, kept in one flat
//! directory. This crate lists them, renders them to HTML with a small
//! in-memory cache, enumerates the static paths an exporter needs, and
//! scaffolds new posts.

pub mod cache;
pub mod commands;
pub mod config;
pub mod content;
pub mod server;

use anyhow::Result;
use std::path::{Path, PathBuf};

use content::ContentPipeline;

/// The blog application
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Content store directory
    pub posts_dir: PathBuf,
    /// Static assets served next to the API
    pub public_dir: PathBuf,
    /// Prefix for generated paths
    pub base_path: String,
    pipeline: ContentPipeline,
}

impl Blog {
    /// Create a new Blog instance from a directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        Ok(Self::with_config(base_dir, config))
    }

    /// Create a Blog from an already loaded configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let posts_dir = base_dir.join(&config.posts_dir);
        let public_dir = base_dir.join(&config.public_dir);
        let base_path = config.resolve_base_path();
        let pipeline = ContentPipeline::from_config(&posts_dir, &config);

        Self {
            config,
            base_dir,
            posts_dir,
            public_dir,
            base_path,
            pipeline,
        }
    }

    /// The content pipeline reading this blog's posts
    pub fn pipeline(&self) -> &ContentPipeline {
        &self.pipeline
    }

    /// URL path of a post page
    pub fn post_path(&self, id: &str) -> String {
        format!("{}/posts/{}", self.base_path, id)
    }

    /// Every post page path, for static export
    pub fn static_paths(&self) -> content::Result<Vec<String>> {
        Ok(self
            .pipeline
            .list_identifiers()?
            .iter()
            .map(|id| self.post_path(id))
            .collect())
    }

    /// Create a new post from a title
    pub fn new_post(&self, title: &str) -> Result<PathBuf> {
        commands::new::create_post(self, &commands::new::NewPost::titled(title))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_blog_without_config_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let blog = Blog::new(dir.path()).unwrap();
        assert_eq!(blog.posts_dir, dir.path().join("posts"));
        assert_eq!(blog.config.title, "Tech Blog");
    }

    #[test]
    fn test_blog_reads_config() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("_config.yml"),
            "title: Petals\nposts_dir: content\nbase_path: /notes\n",
        )
        .unwrap();

        let blog = Blog::new(dir.path()).unwrap();
        assert_eq!(blog.config.title, "Petals");
        assert_eq!(blog.pipeline().posts_dir(), dir.path().join("content"));
        assert_eq!(blog.post_path("hello"), "/notes/posts/hello");
    }

    #[test]
    fn test_static_paths() {
        let dir = TempDir::new().unwrap();
        let config = config::SiteConfig {
            base_path: Some(String::new()),
            ..Default::default()
        };
        let blog = Blog::with_config(dir.path(), config);
        fs::create_dir_all(&blog.posts_dir).unwrap();
        fs::write(blog.posts_dir.join("one.md"), "# one").unwrap();
        fs::write(blog.posts_dir.join("two.md"), "# two").unwrap();

        let mut paths = blog.static_paths().unwrap();
        paths.sort();
        assert_eq!(paths, vec!["/posts/one", "/posts/two"]);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("_config.yml"), "render: [oops").unwrap();
        assert!(Blog::new(dir.path()).is_err());
    }
}
