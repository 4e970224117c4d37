//! Create a new post

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::content::{sanitize_identifier, FrontMatter};
use crate::Blog;

/// Header values for a post about to be scaffolded
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub title: String,
    pub excerpt: Option<String>,
    pub tags: Vec<String>,
    pub author: Option<String>,
}

impl NewPost {
    pub fn titled(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Default::default()
        }
    }
}

/// Split a comma separated tag list, dropping blanks
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Starter body for a new post
fn scaffold(title: &str) -> String {
    format!(
        "# {}\n\nStart writing here...\n\n## Section\n\nContent...\n\n## Summary\n\nWrap up...\n",
        title
    )
}

/// Create a post file named after the sanitized title, dated today
pub fn create_post(blog: &Blog, post: &NewPost) -> Result<PathBuf> {
    let id = sanitize_identifier(&post.title);
    let today = chrono::Local::now().format("%Y-%m-%d").to_string();

    let front_matter = FrontMatter {
        title: Some(post.title.clone()),
        date: Some(today),
        excerpt: post.excerpt.clone(),
        tags: post.tags.clone(),
        author: Some(
            post.author
                .clone()
                .filter(|a| !a.trim().is_empty())
                .unwrap_or_else(|| blog.config.new_post.author.clone()),
        ),
        ..Default::default()
    };

    let path = blog
        .pipeline()
        .create_post(&id, &front_matter, &scaffold(&post.title))
        .with_context(|| format!("Cannot create post titled {:?}", post.title))?;

    println!("Created: {:?}", path);
    println!("URL: {}", blog.post_path(&id));

    Ok(path)
}
