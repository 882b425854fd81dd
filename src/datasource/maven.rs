//! Maven repository datasource.
//!
//! Versions come from `maven-metadata.xml`; repository and homepage from the
//! POM of the latest release.

use async_trait::async_trait;
use quick_xml::Reader;
use quick_xml::events::Event;
use reqwest::Client;
use tracing::debug;

use super::client::{Datasource, Release, ReleaseQuery, ReleaseResult, check_response, get};
use super::error::DatasourceError;
use crate::redact::redact_credentials;

pub const ID: &str = "maven";

const MAVEN_REPO: &str = "https://repo1.maven.org/maven2";

/// Maven repository datasource.
pub struct MavenDatasource {
    client: Client,
}

impl MavenDatasource {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(concat!("relnotes/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self { client }
    }

    async fn fetch_text(
        &self,
        url: &str,
        query: &ReleaseQuery,
    ) -> Result<Option<String>, DatasourceError> {
        let response = get(&self.client, url, query.credentials.as_ref()).send().await?;
        match check_response(response)? {
            Some(response) => Ok(Some(response.text().await?)),
            None => Ok(None),
        }
    }
}

impl Default for MavenDatasource {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse groupId:artifactId from package name.
fn parse_coordinates(name: &str) -> Result<(&str, &str), DatasourceError> {
    match name.split_once(':') {
        Some((group, artifact))
            if !group.is_empty() && !artifact.is_empty() && !artifact.contains(':') =>
        {
            Ok((group, artifact))
        }
        _ => Err(DatasourceError::InvalidPackage(format!(
            "Maven coordinates must be groupId:artifactId, got: {}",
            name
        ))),
    }
}

/// Convert groupId to path (com.google.guava -> com/google/guava).
fn group_to_path(group_id: &str) -> String {
    group_id.replace('.', "/")
}

/// Collect the text of every element found at exactly `path`.
fn texts_at(xml: &str, path: &[&str]) -> Result<Vec<String>, DatasourceError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<String> = Vec::new();
    let mut found = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                stack.push(String::from_utf8_lossy(e.local_name().as_ref()).to_string());
            }
            Event::End(_) => {
                stack.pop();
            }
            Event::Text(e) if stack.iter().map(String::as_str).eq(path.iter().copied()) => {
                if let Ok(text) = e.unescape() {
                    let text = text.trim();
                    if !text.is_empty() {
                        found.push(text.to_string());
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(found)
}

fn first_text_at(xml: &str, path: &[&str]) -> Result<Option<String>, DatasourceError> {
    Ok(texts_at(xml, path)?.into_iter().next())
}

#[async_trait]
impl Datasource for MavenDatasource {
    async fn fetch_releases(
        &self,
        query: &ReleaseQuery,
    ) -> Result<Option<ReleaseResult>, DatasourceError> {
        let name = query.lookup_name();
        let (group_id, artifact_id) = parse_coordinates(name)?;
        let base = format!(
            "{}/{}/{}",
            query.registry_url_or(MAVEN_REPO),
            group_to_path(group_id),
            artifact_id
        );

        let metadata_url = format!("{}/maven-metadata.xml", base);
        debug!(package = name, url = %redact_credentials(&metadata_url), "fetching maven metadata");

        let Some(metadata) = self.fetch_text(&metadata_url, query).await? else {
            return Ok(None);
        };

        let versions = texts_at(&metadata, &["metadata", "versioning", "versions", "version"])?;
        if versions.is_empty() {
            return Ok(None);
        }

        let latest = first_text_at(&metadata, &["metadata", "versioning", "release"])?
            .or_else(|| versions.last().cloned());

        let mut result = ReleaseResult {
            releases: versions.into_iter().map(Release::new).collect(),
            ..Default::default()
        };

        if let Some(latest) = latest {
            let pom_url = format!("{}/{}/{}-{}.pom", base, latest, artifact_id, latest);
            debug!(package = name, url = %redact_credentials(&pom_url), "fetching maven pom");

            if let Some(pom) = self.fetch_text(&pom_url, query).await? {
                result.source_url = first_text_at(&pom, &["project", "scm", "url"])?;
                result.homepage = first_text_at(&pom, &["project", "url"])?;
            }
        }

        Ok(Some(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const METADATA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata>
  <groupId>io.mockk</groupId>
  <artifactId>mockk</artifactId>
  <versioning>
    <latest>1.9.3</latest>
    <release>1.9.3</release>
    <versions>
      <version>1.9.1</version>
      <version>1.9.2</version>
      <version>1.9.3</version>
    </versions>
    <lastUpdated>20190401000000</lastUpdated>
  </versioning>
</metadata>"#;

    const POM: &str = r#"<project xmlns="http://maven.apache.org/POM/4.0.0">
  <url>http://mockk.io</url>
  <scm>
    <url>http://www.github.com/mockk/mockk/</url>
    <connection>scm:git:git@github.com:mockk/mockk.git</connection>
  </scm>
  <dependencies>
    <dependency><url>https://not-this-one.example.com</url></dependency>
  </dependencies>
</project>"#;

    #[test]
    fn test_parse_coordinates() {
        assert_eq!(parse_coordinates("io.mockk:mockk").unwrap(), ("io.mockk", "mockk"));
        assert!(parse_coordinates("mockk").is_err());
        assert!(parse_coordinates("a:b:c").is_err());
        assert!(parse_coordinates(":b").is_err());
    }

    #[test]
    fn test_group_to_path() {
        assert_eq!(group_to_path("com.google.guava"), "com/google/guava");
    }

    #[test]
    fn test_metadata_versions() {
        let versions =
            texts_at(METADATA, &["metadata", "versioning", "versions", "version"]).unwrap();
        assert_eq!(versions, vec!["1.9.1", "1.9.2", "1.9.3"]);
        assert_eq!(
            first_text_at(METADATA, &["metadata", "versioning", "release"]).unwrap(),
            Some("1.9.3".to_string())
        );
    }

    #[test]
    fn test_pom_urls() {
        assert_eq!(
            first_text_at(POM, &["project", "scm", "url"]).unwrap().as_deref(),
            Some("http://www.github.com/mockk/mockk/")
        );
        assert_eq!(
            first_text_at(POM, &["project", "url"]).unwrap().as_deref(),
            Some("http://mockk.io")
        );
    }

    #[tokio::test]
    #[ignore]
    async fn test_fetch_guava() {
        let ds = MavenDatasource::new();
        let result = ds
            .fetch_releases(&ReleaseQuery::new(ID, "com.google.guava:guava"))
            .await
            .unwrap()
            .unwrap();
        assert!(!result.releases.is_empty());
    }
}
