// ABOUTME: Health news retrieval through a three-step NewsAPI fallback chain
// ABOUTME: Drops removed articles and maps the rest to the shape the article screen reads

use tracing::info;

use crate::constants::{limits, messages};
use crate::external::{NewsError, NewsQuery, NewsSource, RawArticle};
use crate::models::Article;

/// Title NewsAPI uses for articles taken down by the publisher
const REMOVED_TITLE: &str = "[Removed]";

/// Indonesian health headlines
fn indonesian_headlines() -> NewsQuery {
    NewsQuery {
        country: Some("id".to_owned()),
        category: Some("health".to_owned()),
        page_size: Some(limits::NEWS_PAGE_SIZE),
        ..NewsQuery::default()
    }
}

/// Indonesian keyword search, newest first
fn indonesian_keyword_search() -> NewsQuery {
    NewsQuery {
        q: Some("kesehatan OR nutrition OR diet".to_owned()),
        language: Some("id".to_owned()),
        sort_by: Some("publishedAt".to_owned()),
        page_size: Some(limits::NEWS_PAGE_SIZE),
        ..NewsQuery::default()
    }
}

/// English health headlines
fn english_headlines() -> NewsQuery {
    NewsQuery {
        category: Some("health".to_owned()),
        language: Some("en".to_owned()),
        page_size: Some(limits::NEWS_PAGE_SIZE),
        ..NewsQuery::default()
    }
}

/// Fetch health articles, moving to the next query while the previous one is empty
///
/// # Errors
///
/// Returns the first error the news source reports
pub async fn fetch_health_articles(source: &dyn NewsSource) -> Result<Vec<Article>, NewsError> {
    let mut raw = source.top_headlines(&indonesian_headlines()).await?;

    if raw.is_empty() {
        info!("No Indonesian health headlines, trying keyword search");
        raw = source.everything(&indonesian_keyword_search()).await?;
    }
    if raw.is_empty() {
        info!("No Indonesian health articles, trying English headlines");
        raw = source.top_headlines(&english_headlines()).await?;
    }

    Ok(raw.into_iter().filter_map(to_article).collect())
}

/// Map a raw article, dropping ones without a title or link
fn to_article(raw: RawArticle) -> Option<Article> {
    let title = raw.title.filter(|t| !t.is_empty() && t != REMOVED_TITLE)?;
    let url = raw.url.filter(|u| !u.is_empty())?;

    Some(Article {
        title,
        description: raw
            .description
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| messages::NO_DESCRIPTION.to_owned()),
        url,
        image_url: raw.url_to_image,
        published_at: raw.published_at,
        source: raw.source.name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::news_api::{MockNewsSource, NewsEndpoint, NewsSourceRef};

    fn raw(title: &str) -> RawArticle {
        RawArticle {
            title: Some(title.to_owned()),
            description: None,
            url: Some(format!("https://news.example/{}", title.len())),
            url_to_image: None,
            published_at: Some("2025-01-01T00:00:00Z".to_owned()),
            source: NewsSourceRef {
                name: Some("Kompas".to_owned()),
            },
        }
    }

    #[tokio::test]
    async fn test_chain_stops_at_first_non_empty_answer() {
        let source = MockNewsSource::new()
            .then_articles(Vec::new())
            .then_articles(vec![raw("Tips diet sehat"), raw(REMOVED_TITLE)]);

        let articles = fetch_health_articles(&source).await.unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].description, messages::NO_DESCRIPTION);
        assert_eq!(articles[0].source.as_deref(), Some("Kompas"));

        let calls = source.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, NewsEndpoint::TopHeadlines);
        assert_eq!(calls[0].1.country.as_deref(), Some("id"));
        assert_eq!(calls[1].0, NewsEndpoint::Everything);
        assert_eq!(calls[1].1.sort_by.as_deref(), Some("publishedAt"));
    }

    #[tokio::test]
    async fn test_chain_falls_through_to_english() {
        let source = MockNewsSource::new();
        let articles = fetch_health_articles(&source).await.unwrap();
        assert!(articles.is_empty());

        let calls = source.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[2].1.language.as_deref(), Some("en"));
    }

    #[tokio::test]
    async fn test_errors_stop_the_chain() {
        let source = MockNewsSource::new().then_error(NewsError::RateLimited);
        assert_eq!(
            fetch_health_articles(&source).await,
            Err(NewsError::RateLimited)
        );
        assert_eq!(source.calls().len(), 1);
    }
}
