// ABOUTME: NewsAPI client for health news articles
// ABOUTME: Wraps the top-headlines and everything endpoints and classifies upstream failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! NewsAPI client
//!
//! # API Reference
//! <https://newsapi.org/docs/endpoints>

use crate::constants::{defaults, service};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

/// NewsAPI client configuration
#[derive(Debug, Clone)]
pub struct NewsApiConfig {
    /// API key; requests fail with [`NewsError::MissingKey`] without one
    pub api_key: Option<String>,
    /// Base URL (default: <https://newsapi.org/v2>)
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for NewsApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: defaults::NEWS_API_BASE_URL.to_owned(),
            timeout_secs: defaults::NEWS_API_TIMEOUT_SECS,
        }
    }
}

/// Failure talking to the news aggregator
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NewsError {
    #[error("news API key is not configured")]
    MissingKey,
    #[error("news API rejected the API key")]
    Unauthorized,
    #[error("news API rate limit exceeded")]
    RateLimited,
    #[error("news API request failed: {0}")]
    Failed(String),
}

/// Query parameters shared by both endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewsQuery {
    pub country: Option<String>,
    pub category: Option<String>,
    pub language: Option<String>,
    pub q: Option<String>,
    pub sort_by: Option<String>,
    pub page_size: Option<u32>,
}

impl NewsQuery {
    fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        let mut push = |key: &'static str, value: Option<&String>| {
            if let Some(value) = value {
                params.push((key, value.clone()));
            }
        };
        push("country", self.country.as_ref());
        push("category", self.category.as_ref());
        push("language", self.language.as_ref());
        push("q", self.q.as_ref());
        push("sortBy", self.sort_by.as_ref());
        if let Some(size) = self.page_size {
            params.push(("pageSize", size.to_string()));
        }
        params
    }
}

/// Publisher of a raw article
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewsSourceRef {
    pub name: Option<String>,
}

/// Article exactly as NewsAPI returns it
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawArticle {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub url_to_image: Option<String>,
    pub published_at: Option<String>,
    #[serde(default)]
    pub source: NewsSourceRef,
}

#[derive(Debug, Deserialize)]
struct ArticlesResponse {
    #[serde(default)]
    articles: Vec<RawArticle>,
}

/// News aggregator
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// `GET /top-headlines`
    async fn top_headlines(&self, query: &NewsQuery) -> Result<Vec<RawArticle>, NewsError>;

    /// `GET /everything`
    async fn everything(&self, query: &NewsQuery) -> Result<Vec<RawArticle>, NewsError>;
}

/// NewsAPI HTTP client
pub struct NewsApiClient {
    config: NewsApiConfig,
    http_client: reqwest::Client,
}

impl NewsApiClient {
    /// Create a client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(config: NewsApiConfig) -> Result<Self, NewsError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(format!(
                "{}/{}",
                service::SERVICE_NAME,
                service::SERVICE_VERSION
            ))
            .build()
            .map_err(|e| NewsError::Failed(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    async fn fetch(&self, endpoint: &str, query: &NewsQuery) -> Result<Vec<RawArticle>, NewsError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(NewsError::MissingKey)?;

        let url = format!("{}/{endpoint}", self.config.base_url.trim_end_matches('/'));
        let response = self
            .http_client
            .get(&url)
            .header("X-Api-Key", api_key)
            .query(&query.to_params())
            .send()
            .await
            .map_err(|e| NewsError::Failed(e.to_string()))?;

        match response.status() {
            reqwest::StatusCode::UNAUTHORIZED => return Err(NewsError::Unauthorized),
            reqwest::StatusCode::TOO_MANY_REQUESTS => return Err(NewsError::RateLimited),
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(NewsError::Failed(format!("HTTP {status}: {body}")));
            }
            _ => {}
        }

        let body: ArticlesResponse = response
            .json()
            .await
            .map_err(|e| NewsError::Failed(format!("JSON parse error: {e}")))?;
        Ok(body.articles)
    }
}

#[async_trait]
impl NewsSource for NewsApiClient {
    async fn top_headlines(&self, query: &NewsQuery) -> Result<Vec<RawArticle>, NewsError> {
        self.fetch("top-headlines", query).await
    }

    async fn everything(&self, query: &NewsQuery) -> Result<Vec<RawArticle>, NewsError> {
        self.fetch("everything", query).await
    }
}

/// Endpoint hit on a [`MockNewsSource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewsEndpoint {
    TopHeadlines,
    Everything,
}

type Scripted = Result<Vec<RawArticle>, NewsError>;

/// Scripted news source for tests
///
/// Each call pops the next queued answer; an empty queue answers with no articles.
#[derive(Default)]
pub struct MockNewsSource {
    answers: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<(NewsEndpoint, NewsQuery)>>,
}

impl MockNewsSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful answer
    #[must_use]
    pub fn then_articles(self, articles: Vec<RawArticle>) -> Self {
        self.push(Ok(articles));
        self
    }

    /// Queue a failure
    #[must_use]
    pub fn then_error(self, error: NewsError) -> Self {
        self.push(Err(error));
        self
    }

    fn push(&self, answer: Scripted) {
        if let Ok(mut answers) = self.answers.lock() {
            answers.push_back(answer);
        }
    }

    /// Calls received so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<(NewsEndpoint, NewsQuery)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn answer(&self, endpoint: NewsEndpoint, query: &NewsQuery) -> Scripted {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((endpoint, query.clone()));
        }
        self.answers
            .lock()
            .ok()
            .and_then(|mut answers| answers.pop_front())
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

#[async_trait]
impl NewsSource for MockNewsSource {
    async fn top_headlines(&self, query: &NewsQuery) -> Result<Vec<RawArticle>, NewsError> {
        self.answer(NewsEndpoint::TopHeadlines, query)
    }

    async fn everything(&self, query: &NewsQuery) -> Result<Vec<RawArticle>, NewsError> {
        self.answer(NewsEndpoint::Everything, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_params_skip_unset_fields() {
        let query = NewsQuery {
            category: Some("health".to_owned()),
            sort_by: Some("publishedAt".to_owned()),
            page_size: Some(10),
            ..NewsQuery::default()
        };
        assert_eq!(
            query.to_params(),
            vec![
                ("category", "health".to_owned()),
                ("sortBy", "publishedAt".to_owned()),
                ("pageSize", "10".to_owned()),
            ]
        );
    }

    #[test]
    fn test_raw_article_deserializes() {
        let article: RawArticle = serde_json::from_str(
            r#"{"title":"Sehat","url":"https://n.test/a","urlToImage":null,"source":{"id":null,"name":"Kompas"}}"#,
        )
        .unwrap();
        assert_eq!(article.source.name.as_deref(), Some("Kompas"));
        assert_eq!(article.description, None);
    }

    #[tokio::test]
    async fn test_missing_key() {
        let client = NewsApiClient::new(NewsApiConfig::default()).unwrap();
        let err = client.top_headlines(&NewsQuery::default()).await.unwrap_err();
        assert_eq!(err, NewsError::MissingKey);
    }
}
