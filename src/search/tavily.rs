//! Tavily REST search provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::SearchError;
use crate::search::{SearchHit, SearchProvider};

const SEARCH_URL: &str = "https://api.tavily.com/search";
const EXTRACT_URL: &str = "https://api.tavily.com/extract";
const API_KEY_VAR: &str = "TAVILY_API_KEY";

/// Domains excluded from every search: paywalled, authenticated, or
/// otherwise not usefully crawlable.
const EXCLUDED_DOMAINS: &[&str] = &[
    // Authenticated / Paywalled
    "linkedin.com",
    "facebook.com",
    "instagram.com",
    "x.com",
    "twitter.com",
    "reddit.com",
    "quora.com",
    "medium.com",
    "substack.com",
    "patreon.com",
    "onlyfans.com",
    "bloomberg.com",
    "ft.com",
    "wsj.com",
    "economist.com",
    "jstor.org",
    "ieee.org",
    "sciencedirect.com",
    "springer.com",
    "nature.com",
    "lexisnexis.com",
    "westlaw.com",
    // E-commerce / Marketplaces
    "amazon.com",
    "ebay.com",
    "walmart.com",
    "target.com",
    "bestbuy.com",
    "homedepot.com",
    "lowes.com",
    "aliexpress.com",
    "etsy.com",
    "wayfair.com",
    "costco.com",
    "shopify.com",
    // Ticketing / Travel
    "ticketmaster.com",
    "livenation.com",
    "stubhub.com",
    "seatgeek.com",
    "expedia.com",
    "booking.com",
    "priceline.com",
    "kayak.com",
    "airbnb.com",
    "delta.com",
    "united.com",
    "americanairlines.com",
    // SaaS Dashboards / Cloud Consoles
    "aws.amazon.com",
    "console.aws.amazon.com",
    "azure.microsoft.com",
    "portal.azure.com",
    "cloud.google.com",
    "console.cloud.google.com",
    "stripe.com",
    "dashboard.stripe.com",
    "datadog.com",
    "newrelic.com",
    "grafana.com",
    "notion.so",
    "atlassian.net",
    "jira.com",
    // Social / Multimedia
    "tiktok.com",
    "youtube.com",
    "snapchat.com",
    "pinterest.com",
    "imgur.com",
    "flickr.com",
    "soundcloud.com",
    "spotify.com",
    "twitch.tv",
    // Government / Institutional
    "irs.gov",
    "sec.gov",
    "ssa.gov",
    "cdc.gov",
    "nih.gov",
    "who.int",
    "un.org",
    "loc.gov",
    "europa.eu",
    "gov.uk",
    // Forums / Communities
    "phpbb.com",
    "vbulletin.com",
    "invisioncommunity.com",
    "stackexchange.com",
    "stackoverflow.com",
    "superuser.com",
    "serverfault.com",
    // Media / News
    "nytimes.com",
    "washingtonpost.com",
    "cnn.com",
    "bbc.com",
    "theguardian.com",
    "forbes.com",
    "businessinsider.com",
    "vox.com",
];

pub struct TavilySearch {
    client: reqwest::Client,
    api_key: String,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    max_results: usize,
    exclude_domains: &'static [&'static str],
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Deserialize)]
struct SearchResult {
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
}

#[derive(Serialize)]
struct ExtractRequest<'a> {
    urls: Vec<&'a str>,
}

#[derive(Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    results: Vec<ExtractResult>,
}

#[derive(Deserialize)]
struct ExtractResult {
    #[serde(default)]
    raw_content: String,
}

impl TavilySearch {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
        }
    }

    /// Build a provider from `TAVILY_API_KEY`.
    pub fn from_env() -> Result<Self, SearchError> {
        let api_key =
            std::env::var(API_KEY_VAR).map_err(|_| SearchError::MissingKey(API_KEY_VAR))?;
        Ok(Self::new(api_key))
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        body: &impl Serialize,
    ) -> Result<T, SearchError> {
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl SearchProvider for TavilySearch {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        debug!(%query, max_results, "tavily search");
        let response: SearchResponse = self
            .post(
                SEARCH_URL,
                &SearchRequest {
                    query,
                    max_results,
                    exclude_domains: EXCLUDED_DOMAINS,
                },
            )
            .await?;

        Ok(response
            .results
            .into_iter()
            .map(|r| SearchHit {
                url: r.url,
                title: r.title,
                snippet: r.content,
            })
            .collect())
    }

    async fn extract(&self, url: &str) -> Result<String, SearchError> {
        debug!(%url, "tavily extract");
        let response: ExtractResponse = self
            .post(EXTRACT_URL, &ExtractRequest { urls: vec![url] })
            .await?;

        Ok(response
            .results
            .into_iter()
            .next()
            .map(|r| r.raw_content)
            .unwrap_or_default())
    }
}
