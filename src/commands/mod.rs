//! CLI command implementations.

mod changelog;
mod config;
mod datasources;
mod digest;
mod lookup;
mod releases;
mod source_url;

pub use changelog::ChangelogCmd;
pub use config::ConfigCmd;
pub use datasources::DatasourcesCmd;
pub use digest::DigestCmd;
pub use releases::ReleasesCmd;
pub use source_url::SourceUrlCmd;
