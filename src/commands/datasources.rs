//! Datasources command - list registered datasources and version schemes.

use anyhow::Result;
use clap::Args;

use super::lookup::default_resolver;
use crate::versioning;

#[derive(Args)]
pub struct DatasourcesCmd {}

impl DatasourcesCmd {
    pub async fn run(&self) -> Result<()> {
        let resolver = default_resolver();

        println!("Datasources:");
        for id in resolver.registry().ids() {
            let digests = if resolver.supports_digests(id) {
                " (digests)"
            } else {
                ""
            };
            println!("  {}{}", id, digests);
        }

        println!();
        println!("Version schemes: {}", versioning::available().join(", "));
        Ok(())
    }
}
