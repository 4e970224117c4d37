//! Content pipeline - discovers, parses and renders posts from the content store

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use walkdir::WalkDir;

use super::error::{ContentError, Result};
use super::markdown::Rendered;
use super::post::{is_stored_identifier, is_valid_identifier, PostData, PostMetadata};
use super::{FrontMatter, MarkdownRenderer};
use crate::cache::{CacheStats, RenderCache};
use crate::config::{MetadataDefaults, SiteConfig};

/// Extension of post files in the content store
pub const POST_EXTENSION: &str = "md";

/// Reads posts from one flat directory of markdown files
///
/// Rendered bodies are memoized in a [`RenderCache`] keyed by identifier and
/// file modification time. The cache sits behind a mutex so one pipeline can
/// serve concurrent requests.
pub struct ContentPipeline {
    posts_dir: PathBuf,
    defaults: MetadataDefaults,
    renderer: MarkdownRenderer,
    cache: Mutex<RenderCache<Arc<Rendered>>>,
}

impl ContentPipeline {
    /// Create a pipeline with an explicit renderer and cache
    pub fn new(
        posts_dir: impl Into<PathBuf>,
        renderer: MarkdownRenderer,
        cache: RenderCache<Arc<Rendered>>,
        defaults: MetadataDefaults,
    ) -> Self {
        Self {
            posts_dir: posts_dir.into(),
            defaults,
            renderer,
            cache: Mutex::new(cache),
        }
    }

    /// Create a pipeline configured from the site config
    pub fn from_config(posts_dir: impl Into<PathBuf>, config: &SiteConfig) -> Self {
        Self::new(
            posts_dir,
            MarkdownRenderer::from_config(&config.render),
            RenderCache::new(config.render.cache_capacity),
            config.defaults.clone(),
        )
    }

    pub fn posts_dir(&self) -> &Path {
        &self.posts_dir
    }

    /// Identifiers of every post, in directory enumeration order
    pub fn list_identifiers(&self) -> Result<Vec<String>> {
        Ok(self.post_files()?.into_iter().map(|(id, _)| id).collect())
    }

    /// Metadata of every post, newest first
    ///
    /// Bodies are not rendered. Files with a malformed header are logged and
    /// left out of the listing.
    pub fn list_metadata(&self) -> Result<Vec<PostMetadata>> {
        let mut posts = Vec::new();

        for (id, path) in self.post_files()? {
            let content = fs::read_to_string(&path).map_err(|e| ContentError::storage(&path, e))?;
            match FrontMatter::parse(&content) {
                Ok((fm, _)) => posts.push(PostMetadata::from_front_matter(&id, fm, &self.defaults)),
                Err(e) => {
                    tracing::warn!("Skipping post {:?}: malformed front-matter: {}", path, e);
                }
            }
        }

        sort_newest_first(&mut posts);
        tracing::debug!("Listed {} posts from {:?}", posts.len(), self.posts_dir);
        Ok(posts)
    }

    /// Load one post and its rendered body
    ///
    /// The file is read once; rendering is skipped when the cache already
    /// holds this identifier at the file's current modification time.
    pub async fn get_post(&self, id: &str) -> Result<PostData> {
        let not_found = || ContentError::NotFound { id: id.to_string() };

        if !is_stored_identifier(id) {
            return Err(not_found());
        }
        let path = self.post_path(id);

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => return Err(not_found()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(not_found()),
            Err(e) => return Err(ContentError::storage(&path, e)),
        };
        let mtime = metadata
            .modified()
            .map_err(|e| ContentError::storage(&path, e))?;

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(not_found()),
            Err(e) => return Err(ContentError::storage(&path, e)),
        };
        let (fm, body) = FrontMatter::parse(&content).map_err(|source| {
            ContentError::MalformedHeader {
                path: path.clone(),
                source,
            }
        })?;

        let cached = self.lock_cache().get(id, mtime);
        let rendered = match cached {
            Some(rendered) => {
                tracing::debug!("Render cache hit for {}", id);
                rendered
            }
            None => {
                tracing::debug!("Rendering {}", id);
                let rendered = Arc::new(self.renderer.render_document(body));
                self.lock_cache().put(id, mtime, Arc::clone(&rendered));
                rendered
            }
        };

        Ok(PostData {
            meta: PostMetadata::from_front_matter(id, fm, &self.defaults),
            raw: body.to_string(),
            content_html: rendered.html.clone(),
            headings: rendered.headings.clone(),
        })
    }

    /// Write a new post file from a header and markdown body
    ///
    /// Never overwrites: an existing file is reported as a storage error of
    /// kind `AlreadyExists`. Returns the path written.
    pub fn create_post(&self, id: &str, front_matter: &FrontMatter, body: &str) -> Result<PathBuf> {
        if !is_valid_identifier(id) {
            return Err(ContentError::InvalidIdentifier { id: id.to_string() });
        }

        fs::create_dir_all(&self.posts_dir)
            .map_err(|e| ContentError::storage(&self.posts_dir, e))?;

        let path = self.post_path(id);
        let document =
            front_matter
                .to_document(body)
                .map_err(|source| ContentError::MalformedHeader {
                    path: path.clone(),
                    source,
                })?;

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| ContentError::storage(&path, e))?;
        file.write_all(document.as_bytes())
            .map_err(|e| ContentError::storage(&path, e))?;

        tracing::info!("Created post {:?}", path);
        Ok(path)
    }

    /// Hit and miss counts of the render cache
    pub fn cache_stats(&self) -> CacheStats {
        self.lock_cache().stats()
    }

    fn post_path(&self, id: &str) -> PathBuf {
        self.posts_dir.join(format!("{}.{}", id, POST_EXTENSION))
    }

    fn lock_cache(&self) -> MutexGuard<'_, RenderCache<Arc<Rendered>>> {
        // Entries are only ever inserted whole, so a poisoned lock still
        // guards a consistent map
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// (identifier, path) of every post file directly inside the store
    fn post_files(&self) -> Result<Vec<(String, PathBuf)>> {
        if !self.posts_dir.exists() {
            tracing::debug!("Posts directory {:?} does not exist", self.posts_dir);
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.posts_dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
        {
            let entry = entry.map_err(|e| {
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| self.posts_dir.clone());
                ContentError::storage(path, e.into())
            })?;

            let path = entry.path();
            if !entry.file_type().is_file() || !is_post_file(path) {
                continue;
            }
            match path.file_stem().and_then(|s| s.to_str()) {
                Some(id) if is_stored_identifier(id) => {
                    files.push((id.to_string(), path.to_path_buf()))
                }
                Some(_) => tracing::warn!("Skipping post with unusable name: {:?}", path),
                None => tracing::warn!("Skipping post with non UTF-8 name: {:?}", path),
            }
        }

        Ok(files)
    }
}

/// Check if a file is a post file
fn is_post_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == POST_EXTENSION)
        .unwrap_or(false)
}

/// Stable sort by date string, descending. Posts sharing a date keep their
/// enumeration order.
fn sort_newest_first(posts: &mut [PostMetadata]) {
    posts.sort_by(|a, b| b.date.cmp(&a.date));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn pipeline(dir: &TempDir) -> ContentPipeline {
        ContentPipeline::from_config(dir.path(), &SiteConfig::default())
    }

    fn write_post(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn set_mtime(path: &Path, secs: u64) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
            .unwrap();
    }

    fn meta(id: &str, date: &str) -> PostMetadata {
        PostMetadata {
            id: id.to_string(),
            title: id.to_string(),
            date: date.to_string(),
            excerpt: String::new(),
            tags: Vec::new(),
            author: "Anonymous".to_string(),
            cover: None,
        }
    }

    #[test]
    fn test_list_identifiers() {
        let dir = TempDir::new().unwrap();
        write_post(&dir, "hello-world.md", "---\ntitle: Hello\n---\n");
        write_post(&dir, "second.md", "body only");
        write_post(&dir, "notes.txt", "not a post");
        fs::create_dir(dir.path().join("nested.md")).unwrap();
        fs::create_dir(dir.path().join("drafts")).unwrap();
        fs::write(dir.path().join("drafts").join("deep.md"), "skip").unwrap();

        let mut ids = pipeline(&dir).list_identifiers().unwrap();
        ids.sort();
        assert_eq!(ids, vec!["hello-world", "second"]);
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        let pipeline = ContentPipeline::from_config(dir.path().join("nope"), &SiteConfig::default());
        assert!(pipeline.list_identifiers().unwrap().is_empty());
        assert!(pipeline.list_metadata().unwrap().is_empty());
    }

    #[test]
    fn test_list_metadata_sorted_newest_first() {
        let dir = TempDir::new().unwrap();
        write_post(&dir, "old.md", "---\ntitle: Old\ndate: \"2023-05-01\"\n---\nA");
        write_post(&dir, "new.md", "---\ntitle: New\ndate: \"2024-02-10\"\n---\nB");
        write_post(&dir, "mid.md", "---\ntitle: Mid\ndate: \"2023-12-31\"\n---\nC");

        let posts = pipeline(&dir).list_metadata().unwrap();
        let ids: Vec<_> = posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
        assert!(posts.windows(2).all(|w| w[0].date >= w[1].date));
    }

    #[test]
    fn test_list_metadata_skips_malformed() {
        let dir = TempDir::new().unwrap();
        write_post(&dir, "good.md", "---\ntitle: Good\ndate: 2024-01-01\n---\nok");
        write_post(&dir, "bad.md", "---\ntitle: [broken\ndate: 2024-01-02\n---\nno");

        let posts = pipeline(&dir).list_metadata().unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, "good");
    }

    #[test]
    fn test_list_metadata_applies_defaults() {
        let dir = TempDir::new().unwrap();
        write_post(&dir, "bare.md", "---\ntitle: Bare\ndate: 2024-03-03\n---\nbody");

        let posts = pipeline(&dir).list_metadata().unwrap();
        assert_eq!(posts[0].excerpt, "");
        assert!(posts[0].tags.is_empty());
        assert_eq!(posts[0].author, "Anonymous");
    }

    #[test]
    fn test_blank_date_gets_default() {
        let dir = TempDir::new().unwrap();
        write_post(&dir, "blank.md", "---\ntitle: T\ndate: \"\"\n---\nbody");
        write_post(&dir, "old.md", "---\ntitle: Old\ndate: \"2020-01-01\"\n---\nbody");

        let posts = pipeline(&dir).list_metadata().unwrap();
        assert_eq!(posts[0].id, "blank");
        assert!(!posts[0].date.is_empty());
    }

    #[test]
    fn test_sort_is_stable_for_equal_dates() {
        let mut posts = vec![
            meta("a", "2024-01-01"),
            meta("b", "2024-06-01"),
            meta("c", "2024-01-01"),
            meta("d", "2024-01-01"),
        ];
        sort_newest_first(&mut posts);
        let ids: Vec<_> = posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c", "d"]);
    }

    #[tokio::test]
    async fn test_get_post() {
        let dir = TempDir::new().unwrap();
        write_post(
            &dir,
            "hello-world.md",
            "---\ntitle: \"Hello\"\ndate: \"2024-01-01\"\ntags: [\"intro\"]\n---\n# Hi\n\nWelcome.",
        );

        let post = pipeline(&dir).get_post("hello-world").await.unwrap();
        assert_eq!(post.meta.id, "hello-world");
        assert_eq!(post.meta.title, "Hello");
        assert_eq!(post.meta.date, "2024-01-01");
        assert_eq!(post.meta.tags, vec!["intro"]);
        assert_eq!(post.meta.author, "Anonymous");
        assert_eq!(post.content_html, "<h1>Hi</h1>\n<p>Welcome.</p>\n");
        assert_eq!(post.raw, "# Hi\n\nWelcome.");
        assert_eq!(post.headings[0].id, "heading-0-hi");
    }

    #[tokio::test]
    async fn test_get_post_twice_hits_cache() {
        let dir = TempDir::new().unwrap();
        write_post(&dir, "cached.md", "---\ntitle: C\ndate: 2024-01-01\n---\n*hi*");
        let pipeline = pipeline(&dir);

        let first = pipeline.get_post("cached").await.unwrap();
        let second = pipeline.get_post("cached").await.unwrap();

        assert_eq!(first.content_html, second.content_html);
        assert_eq!(pipeline.cache_stats(), CacheStats { hits: 1, misses: 1 });
    }

    #[tokio::test]
    async fn test_modified_file_is_rendered_again() {
        let dir = TempDir::new().unwrap();
        let path = write_post(&dir, "edit.md", "---\ntitle: E\ndate: 2024-01-01\n---\nfirst");
        set_mtime(&path, 1_000);
        let pipeline = pipeline(&dir);

        let before = pipeline.get_post("edit").await.unwrap();
        assert_eq!(before.content_html, "<p>first</p>\n");

        fs::write(&path, "---\ntitle: E\ndate: 2024-01-01\n---\nsecond").unwrap();
        set_mtime(&path, 2_000);

        let after = pipeline.get_post("edit").await.unwrap();
        assert_eq!(after.content_html, "<p>second</p>\n");
        assert_eq!(pipeline.cache_stats(), CacheStats { hits: 0, misses: 2 });
    }

    #[tokio::test]
    async fn test_get_post_not_found() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);

        let err = pipeline.get_post("does-not-exist").await.unwrap_err();
        assert!(matches!(err, ContentError::NotFound { ref id } if id == "does-not-exist"));

        let err = pipeline.get_post("../etc/passwd").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_every_listed_post_can_be_fetched() {
        let dir = TempDir::new().unwrap();
        write_post(&dir, "My Post.md", "---\ntitle: Spaced\ndate: 2024-01-01\n---\nA");
        write_post(&dir, "notes_v2.md", "---\ntitle: Notes\ndate: 2024-01-02\n---\nB");
        write_post(&dir, "café.md", "---\ntitle: Cafe\ndate: 2024-01-03\n---\nC");
        write_post(&dir, ".draft.md", "---\ntitle: Hidden\n---\nD");
        let pipeline = pipeline(&dir);

        let mut ids = pipeline.list_identifiers().unwrap();
        ids.sort();
        assert_eq!(ids, vec!["My Post", "café", "notes_v2"]);

        for id in &ids {
            let post = pipeline.get_post(id).await.unwrap();
            assert_eq!(&post.meta.id, id);
        }
        for meta in pipeline.list_metadata().unwrap() {
            assert!(pipeline.get_post(&meta.id).await.is_ok());
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reads_share_cache() {
        let dir = TempDir::new().unwrap();
        let ids = ["alpha", "beta", "gamma"];
        for (i, id) in ids.iter().enumerate() {
            write_post(
                &dir,
                &format!("{}.md", id),
                &format!("---\ntitle: {}\ndate: 2024-01-0{}\n---\n# {}\n\nBody {}", id, i + 1, id, i),
            );
        }

        let mut config = SiteConfig::default();
        config.render.cache_capacity = 2;
        let pipeline = Arc::new(ContentPipeline::from_config(dir.path(), &config));

        let mut handles = Vec::new();
        for n in 0..20 {
            let pipeline = Arc::clone(&pipeline);
            let id = ids[n % ids.len()];
            handles.push(tokio::spawn(async move {
                let post = pipeline.get_post(id).await.unwrap();
                assert!(pipeline.lock_cache().len() <= 2);
                (id, post.content_html)
            }));
        }

        let mut seen: std::collections::HashMap<&str, String> = std::collections::HashMap::new();
        for handle in handles {
            let (id, html) = handle.await.unwrap();
            let expected = seen.entry(id).or_insert_with(|| html.clone());
            assert_eq!(*expected, html);
        }

        assert_eq!(seen.len(), 3);
        let stats = pipeline.cache_stats();
        assert_eq!(stats.hits + stats.misses, 20);
        assert!(pipeline.lock_cache().len() <= 2);
    }

    #[tokio::test]
    async fn test_get_post_malformed_header_fails() {
        let dir = TempDir::new().unwrap();
        write_post(&dir, "bad.md", "---\ntitle: [broken\n---\nbody");

        let err = pipeline(&dir).get_post("bad").await.unwrap_err();
        assert!(matches!(err, ContentError::MalformedHeader { .. }));
    }

    #[tokio::test]
    async fn test_create_then_get_round_trip() {
        let dir = TempDir::new().unwrap();
        let pipeline = ContentPipeline::from_config(dir.path().join("posts"), &SiteConfig::default());

        let fm = FrontMatter {
            title: Some("Round Trip".to_string()),
            date: Some("2024-04-01".to_string()),
            tags: vec!["rust".to_string(), "blog".to_string()],
            author: Some("Mark".to_string()),
            ..Default::default()
        };
        let path = pipeline
            .create_post("round-trip", &fm, "# Hi\n\nWelcome.")
            .unwrap();
        assert!(path.ends_with("posts/round-trip.md"));

        let post = pipeline.get_post("round-trip").await.unwrap();
        assert_eq!(post.meta.title, "Round Trip");
        assert_eq!(post.meta.date, "2024-04-01");
        assert_eq!(post.meta.tags, vec!["rust", "blog"]);
        assert_eq!(post.meta.author, "Mark");
        assert_eq!(post.content_html, "<h1>Hi</h1>\n<p>Welcome.</p>\n");

        assert_eq!(pipeline.list_identifiers().unwrap(), vec!["round-trip"]);
    }

    #[test]
    fn test_create_post_does_not_overwrite() {
        let dir = TempDir::new().unwrap();
        write_post(&dir, "taken.md", "original");

        let err = pipeline(&dir)
            .create_post("taken", &FrontMatter::default(), "new")
            .unwrap_err();
        match err {
            ContentError::Storage { source, .. } => {
                assert_eq!(source.kind(), io::ErrorKind::AlreadyExists)
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(fs::read_to_string(dir.path().join("taken.md")).unwrap(), "original");
    }

    #[test]
    fn test_create_post_rejects_bad_identifier() {
        let dir = TempDir::new().unwrap();
        let err = pipeline(&dir)
            .create_post("../escape", &FrontMatter::default(), "x")
            .unwrap_err();
        assert!(matches!(err, ContentError::InvalidIdentifier { .. }));
    }
}
