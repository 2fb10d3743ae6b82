//! `RemoteFetcher` binding used outside of tests: fetches an import target
//! of the form `owner/repo/path[@ref]` from the GitHub raw-content CDN.

use anyhow::{bail, Context};
use gh_aw_frontmatter::RemoteFetcher;

pub struct GitHubRemoteFetcher {
    client: reqwest::blocking::Client,
}

impl GitHubRemoteFetcher {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("gh-aw-compiler")
            .build()
            .context("building HTTP client for remote imports")?;
        Ok(Self { client })
    }
}

impl RemoteFetcher for GitHubRemoteFetcher {
    fn fetch(&self, owner: &str, repo: &str, path: &str, reference: Option<&str>) -> anyhow::Result<String> {
        let git_ref = reference.unwrap_or("main");
        let url = format!("https://raw.githubusercontent.com/{owner}/{repo}/{git_ref}/{path}");
        let response = self.client.get(&url).send().with_context(|| format!("fetching {url}"))?;
        if !response.status().is_success() {
            bail!("remote import {owner}/{repo}/{path}@{git_ref} returned HTTP {}", response.status());
        }
        response.text().with_context(|| format!("reading body of {url}"))
    }
}
