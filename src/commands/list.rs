//! List site content

use anyhow::Result;
use serde::Serialize;
use std::fmt::Write;

use crate::content::{query, PostMetadata};
use crate::Blog;

/// A tag and how many posts use it
#[derive(Debug, Serialize)]
pub struct TagCount {
    pub name: String,
    pub count: usize,
}

/// Tag counts in listing order
pub fn tag_summary(posts: &[PostMetadata]) -> Vec<TagCount> {
    query::tag_counts(posts)
        .into_iter()
        .map(|(name, count)| TagCount { name, count })
        .collect()
}

/// List site content by type
pub fn run(blog: &Blog, content_type: &str, json: bool) -> Result<()> {
    print!("{}", render(blog, content_type, json)?);
    Ok(())
}

/// Listing text for `content_type`, as plain text or pretty JSON
pub fn render(blog: &Blog, content_type: &str, json: bool) -> Result<String> {
    let mut out = String::new();

    match content_type {
        "post" | "posts" => {
            let posts = blog.pipeline().list_metadata()?;
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&posts)?)?;
            } else {
                write_posts(&mut out, "Posts", &posts.iter().collect::<Vec<_>>())?;
            }
        }
        "tag" | "tags" => {
            let tags = tag_summary(&blog.pipeline().list_metadata()?);
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&tags)?)?;
            } else {
                writeln!(out, "Tags ({}):", tags.len())?;
                for tag in tags {
                    writeln!(out, "  {} ({})", tag.name, tag.count)?;
                }
            }
        }
        "path" | "paths" | "route" | "routes" => {
            let paths = blog.static_paths()?;
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&paths)?)?;
            } else {
                for path in paths {
                    writeln!(out, "{}", path)?;
                }
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: post, tag, path",
                content_type
            );
        }
    }

    Ok(out)
}

/// Search post titles, excerpts and tags
pub fn search(blog: &Blog, query_text: &str, json: bool) -> Result<String> {
    let posts = blog.pipeline().list_metadata()?;
    let found = query::search(&posts, query_text);

    let mut out = String::new();
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&found)?)?;
    } else {
        write_posts(&mut out, "Results", &found)?;
    }
    Ok(out)
}

/// Posts carrying `tag`, newest first
pub fn tagged(blog: &Blog, tag: &str, json: bool) -> Result<String> {
    let posts = blog.pipeline().list_metadata()?;
    let found = query::filter_by_tag(&posts, tag);

    let mut out = String::new();
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&found)?)?;
    } else {
        write_posts(&mut out, &format!("Tagged {}", tag), &found)?;
    }
    Ok(out)
}

fn write_posts(out: &mut String, heading: &str, posts: &[&PostMetadata]) -> std::fmt::Result {
    writeln!(out, "{} ({}):", heading, posts.len())?;
    for post in posts {
        // Dates may carry a time part; the day is enough here
        let day = post.date.get(..10).unwrap_or(&post.date);
        writeln!(out, "  {} - {} [{}]", day, post.title, post.id)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use std::fs;
    use tempfile::TempDir;

    fn blog_with_posts(dir: &TempDir) -> Blog {
        let config = SiteConfig {
            base_path: Some("/blog".to_string()),
            ..Default::default()
        };
        let blog = Blog::with_config(dir.path(), config);
        fs::create_dir_all(&blog.posts_dir).unwrap();
        fs::write(
            blog.posts_dir.join("first.md"),
            "---\ntitle: First\ndate: \"2024-01-01\"\ntags: [rust, intro]\n---\nOne",
        )
        .unwrap();
        fs::write(
            blog.posts_dir.join("second.md"),
            "---\ntitle: Second\ndate: \"2024-02-01T10:00:00Z\"\ntags: [rust]\nexcerpt: more notes\n---\nTwo",
        )
        .unwrap();
        blog
    }

    #[test]
    fn test_list_posts() {
        let dir = TempDir::new().unwrap();
        let out = render(&blog_with_posts(&dir), "post", false).unwrap();
        assert_eq!(
            out,
            "Posts (2):\n  2024-02-01 - Second [second]\n  2024-01-01 - First [first]\n"
        );
    }

    #[test]
    fn test_list_posts_json() {
        let dir = TempDir::new().unwrap();
        let out = render(&blog_with_posts(&dir), "posts", true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["id"], "second");
        assert_eq!(value[1]["tags"][1], "intro");
    }

    #[test]
    fn test_list_tags() {
        let dir = TempDir::new().unwrap();
        let out = render(&blog_with_posts(&dir), "tags", false).unwrap();
        assert_eq!(out, "Tags (2):\n  rust (2)\n  intro (1)\n");
    }

    #[test]
    fn test_list_paths() {
        let dir = TempDir::new().unwrap();
        let out = render(&blog_with_posts(&dir), "paths", false).unwrap();
        let mut lines: Vec<_> = out.lines().collect();
        lines.sort();
        assert_eq!(lines, vec!["/blog/posts/first", "/blog/posts/second"]);
    }

    #[test]
    fn test_unknown_type() {
        let dir = TempDir::new().unwrap();
        assert!(render(&blog_with_posts(&dir), "category", false).is_err());
    }

    #[test]
    fn test_search() {
        let dir = TempDir::new().unwrap();
        let blog = blog_with_posts(&dir);
        assert_eq!(
            search(&blog, "notes", false).unwrap(),
            "Results (1):\n  2024-02-01 - Second [second]\n"
        );
        assert_eq!(search(&blog, "", false).unwrap(), "Results (0):\n");
    }

    #[test]
    fn test_tagged() {
        let dir = TempDir::new().unwrap();
        let blog = blog_with_posts(&dir);
        assert_eq!(
            tagged(&blog, "intro", false).unwrap(),
            "Tagged intro (1):\n  2024-01-01 - First [first]\n"
        );
        assert_eq!(tagged(&blog, "Rust", false).unwrap(), "Tagged Rust (0):\n");
    }
}
