use serde::{Deserialize, Serialize};

/// A normalized article from any of the aggregated sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsArticle {
    pub id: String,
    pub title: String,
    pub body: String,
    /// Authors, journal or publishing organization
    pub owner: String,
    pub created_at: String,
    /// Link to the article (DOI, PubMed or feed link)
    pub source: String,
    pub category: String,
}

/// Paginated, merged news page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsList {
    pub total_count: usize,
    pub total_pages: usize,
    pub page: usize,
    pub size: usize,
    pub has_more: bool,
    pub news: Vec<NewsArticle>,
}
