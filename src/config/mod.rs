//! Configuration module

mod site;

pub use site::MetadataDefaults;
pub use site::NewPostConfig;
pub use site::RenderConfig;
pub use site::ServerConfig;
pub use site::SiteConfig;
