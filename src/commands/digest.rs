//! Digest command - print the content digest of a dependency.

use anyhow::{Context, Result};
use clap::Args;

use super::lookup::{LookupArgs, default_resolver};
use crate::config::RelnotesConfig;

#[derive(Args)]
pub struct DigestCmd {
    #[command(flatten)]
    pub lookup: LookupArgs,

    /// Version or tag to pin (default: current head)
    #[arg(long)]
    pub value: Option<String>,
}

impl DigestCmd {
    pub async fn run(&self) -> Result<()> {
        let config = RelnotesConfig::load()?;
        let query = self.lookup.to_query(&config);
        let resolver = default_resolver();

        if !resolver.supports_digests(&query.datasource) {
            println!("Datasource '{}' does not provide digests.", query.datasource);
            return Ok(());
        }

        let digest = resolver
            .get_digest(&query, self.value.as_deref())
            .await
            .with_context(|| format!("Failed to fetch digest for {}", query.dep_name))?;

        match digest {
            Some(digest) => println!("{}", digest),
            None => println!("No digest found for {}", query.dep_name),
        }
        Ok(())
    }
}
