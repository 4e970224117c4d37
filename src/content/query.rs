//! Search and tag queries over already-loaded post metadata

use std::collections::HashMap;

use super::PostMetadata;

/// Posts whose title, excerpt or any tag contains `query`, ignoring case
///
/// A blank query matches nothing. Otherwise the query is matched as typed,
/// surrounding spaces included. Results keep the input order.
pub fn search<'a>(posts: &'a [PostMetadata], query: &str) -> Vec<&'a PostMetadata> {
    if query.trim().is_empty() {
        return Vec::new();
    }
    let needle = query.to_lowercase();

    posts
        .iter()
        .filter(|post| {
            post.title.to_lowercase().contains(&needle)
                || post.excerpt.to_lowercase().contains(&needle)
                || post
                    .tags
                    .iter()
                    .any(|tag| tag.to_lowercase().contains(&needle))
        })
        .collect()
}

/// Posts carrying exactly this tag
pub fn filter_by_tag<'a>(posts: &'a [PostMetadata], tag: &str) -> Vec<&'a PostMetadata> {
    posts
        .iter()
        .filter(|post| post.tags.iter().any(|t| t == tag))
        .collect()
}

/// Every tag with the number of posts using it, most used first
pub fn tag_counts(posts: &[PostMetadata]) -> Vec<(String, usize)> {
    let mut tags: HashMap<&str, usize> = HashMap::new();
    for post in posts {
        for tag in &post.tags {
            *tags.entry(tag.as_str()).or_insert(0) += 1;
        }
    }

    let mut tags: Vec<_> = tags
        .into_iter()
        .map(|(tag, count)| (tag.to_string(), count))
        .collect();
    tags.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    tags
}
