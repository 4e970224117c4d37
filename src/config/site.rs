//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::cache::DEFAULT_CAPACITY;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,

    // Directory
    pub posts_dir: String,
    pub public_dir: String,

    // URL
    /// Prefix for every generated path; see [`SiteConfig::resolve_base_path`]
    pub base_path: Option<String>,

    #[serde(default)]
    pub defaults: MetadataDefaults,
    #[serde(default)]
    pub new_post: NewPostConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Tech Blog".to_string(),
            description: String::new(),

            posts_dir: "posts".to_string(),
            public_dir: "public".to_string(),

            base_path: None,

            defaults: MetadataDefaults::default(),
            new_post: NewPostConfig::default(),
            render: RenderConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// URL prefix for generated paths, without a trailing slash
    ///
    /// An explicit `base_path` wins. Otherwise a GitHub Pages build
    /// (`GITHUB_PAGES=true`) is served from `/<repo>`, taken from
    /// `GITHUB_REPOSITORY`, falling back to `/Blog`.
    pub fn resolve_base_path(&self) -> String {
        self.base_path_from(|key| std::env::var(key).ok())
    }

    fn base_path_from(&self, env: impl Fn(&str) -> Option<String>) -> String {
        if let Some(base) = &self.base_path {
            let trimmed = base.trim().trim_matches('/');
            return if trimmed.is_empty() {
                String::new()
            } else {
                format!("/{}", trimmed)
            };
        }

        if env("GITHUB_PAGES").as_deref() != Some("true") {
            return String::new();
        }

        match env("GITHUB_REPOSITORY")
            .as_deref()
            .and_then(|repo| repo.split('/').nth(1))
            .filter(|name| !name.is_empty())
        {
            Some(name) => format!("/{}", name),
            None => "/Blog".to_string(),
        }
    }
}

/// Placeholders for header fields a post leaves out
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataDefaults {
    pub title: String,
    pub author: String,
}

impl Default for MetadataDefaults {
    fn default() -> Self {
        Self {
            title: "Untitled".to_string(),
            author: "Anonymous".to_string(),
        }
    }
}

/// Values used by `petalpost new`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewPostConfig {
    pub author: String,
}

impl Default for NewPostConfig {
    fn default() -> Self {
        Self {
            author: "Tech Blogger".to_string(),
        }
    }
}

/// Markdown rendering and render cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub cache_capacity: usize,
    pub highlight: bool,
    pub highlight_theme: String,
    pub line_numbers: bool,
    pub heading_ids: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CAPACITY,
            highlight: true,
            highlight_theme: "base16-ocean.dark".to_string(),
            line_numbers: false,
            heading_ids: false,
        }
    }
}

/// Development server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub ip: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ip: "localhost".to_string(),
            port: 3000,
        }
    }
}
