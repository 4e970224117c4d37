//! Content module - front-matter, markdown rendering and the post pipeline

mod error;
mod frontmatter;
pub mod loader;
mod markdown;
mod post;
pub mod query;
pub mod toc;

pub use error::{ContentError, Result};
pub use frontmatter::FrontMatter;
pub use loader::ContentPipeline;
pub use markdown::{MarkdownRenderer, Rendered};
pub use post::{
    is_stored_identifier, is_valid_identifier, sanitize_identifier, PageMeta, PostData,
    PostMetadata,
};
pub use toc::Heading;
