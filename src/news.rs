use crate::config::NewsConfig;
use crate::models::{NewsArticle, NewsList};
use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::time::Duration;

const BODY_LIMIT: usize = 500;
const ITEMS_PER_FEED: usize = 10;
const MAX_TOTAL_PAGES: usize = 100;

/// Search topics rotated by page so successive pages surface different
/// corners of dermatology instead of re-ranking one query.
const TOPICS: [&str; 6] = [
    "dermatology skin disease",
    "acne treatment",
    "eczema atopic dermatitis",
    "psoriasis therapy",
    "skin cancer melanoma",
    "sunscreen photoprotection",
];

/// Aggregates dermatology news from Europe PMC, WHO feeds and MedlinePlus.
pub struct NewsService {
    config: NewsConfig,
    client: reqwest::Client,
}

// ---------------------------------------------------------------------------
// Europe PMC JSON payloads

#[derive(Debug, Deserialize)]
struct PmcSearchResponse {
    #[serde(rename = "hitCount", default)]
    hit_count: usize,
    #[serde(rename = "resultList", default)]
    result_list: PmcResultList,
}

#[derive(Debug, Default, Deserialize)]
struct PmcResultList {
    #[serde(default)]
    result: Vec<PmcResult>,
}

#[derive(Debug, Deserialize)]
struct PmcResult {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(rename = "abstractText", default)]
    abstract_text: String,
    #[serde(rename = "authorString", default)]
    author_string: String,
    #[serde(rename = "journalTitle", default)]
    journal_title: String,
    #[serde(rename = "firstPublicationDate", default)]
    first_publication_date: String,
    #[serde(default)]
    doi: String,
    #[serde(default)]
    pmid: String,
}

// ---------------------------------------------------------------------------
// RSS / Atom payloads (quick-xml serde)

#[derive(Debug, Deserialize)]
struct Rss {
    channel: RssChannel,
}

#[derive(Debug, Deserialize)]
struct RssChannel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "pubDate", default)]
    pub_date: String,
    #[serde(default)]
    guid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    updated: String,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href", default)]
    href: String,
}

impl NewsService {
    pub fn new(config: &NewsConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            config: config.clone(),
            client,
        }
    }

    /// One merged page across all sources. A source failing is logged and
    /// skipped; an empty page is a valid result, not an error.
    pub async fn get_all(&self, page: usize) -> NewsList {
        let page = page.max(1);
        let size = self.config.per_page;

        let (pmc, who, medline) = tokio::join!(
            self.fetch_europe_pmc(page),
            self.fetch_who(),
            self.fetch_medlineplus(),
        );

        let mut articles = Vec::new();
        let mut pmc_total = 0usize;

        match pmc {
            Ok((total, items)) => {
                pmc_total = total;
                articles.extend(items);
            }
            Err(e) => tracing::warn!("Europe PMC fetch failed: {e}"),
        }
        match who {
            Ok(items) => articles.extend(items),
            Err(e) => tracing::warn!("WHO feed fetch failed: {e}"),
        }
        match medline {
            Ok(items) => articles.extend(items),
            Err(e) => tracing::warn!("MedlinePlus feed fetch failed: {e}"),
        }

        let total_count = pmc_total.max(articles.len());
        let total_pages = (total_count.div_ceil(size.max(1))).min(MAX_TOTAL_PAGES);
        articles.truncate(size);

        NewsList {
            total_count,
            total_pages,
            page,
            size,
            has_more: page < total_pages,
            news: articles,
        }
    }

    /// Single article lookup by Europe PMC id.
    pub async fn get_one(&self, id: &str) -> Result<Option<NewsArticle>> {
        let query = format!("EXT_ID:{}", id);
        let resp = self
            .client
            .get(&self.config.europe_pmc_url)
            .query(&[
                ("query", query.as_str()),
                ("format", "json"),
                ("resultType", "core"),
                ("pageSize", "1"),
            ])
            .send()
            .await?
            .error_for_status()?;

        let parsed: PmcSearchResponse = resp.json().await?;
        Ok(parsed
            .result_list
            .result
            .into_iter()
            .next()
            .map(pmc_to_article))
    }

    async fn fetch_europe_pmc(&self, page: usize) -> Result<(usize, Vec<NewsArticle>)> {
        let topic = TOPICS[(page - 1) % TOPICS.len()];
        let page_size = self.config.per_page.to_string();
        let page_str = page.to_string();

        let resp = self
            .client
            .get(&self.config.europe_pmc_url)
            .query(&[
                ("query", topic),
                ("format", "json"),
                ("resultType", "core"),
                ("sort", "P_PDATE_D desc"),
                ("pageSize", page_size.as_str()),
                ("page", page_str.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let parsed: PmcSearchResponse = resp.json().await?;
        let articles = parsed
            .result_list
            .result
            .into_iter()
            .map(pmc_to_article)
            .collect();

        Ok((parsed.hit_count, articles))
    }

    async fn fetch_who(&self) -> Result<Vec<NewsArticle>> {
        let mut articles = Vec::new();
        // One dead feed must not take the others down with it
        for feed_url in &self.config.who_feeds {
            match self.fetch_rss_feed(feed_url).await {
                Ok(items) => articles.extend(items),
                Err(e) => tracing::warn!("WHO feed {feed_url} failed: {e}"),
            }
        }
        Ok(articles)
    }

    async fn fetch_rss_feed(&self, feed_url: &str) -> Result<Vec<NewsArticle>> {
        let body = self
            .client
            .get(feed_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_rss(&body, "WHO")
    }

    async fn fetch_medlineplus(&self) -> Result<Vec<NewsArticle>> {
        let body = self
            .client
            .get(&self.config.medlineplus_feed)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        // MedlinePlus serves Atom; fall back to RSS if the shape changes
        parse_atom(&body, "MedlinePlus").or_else(|_| parse_rss(&body, "MedlinePlus"))
    }
}

fn pmc_to_article(result: PmcResult) -> NewsArticle {
    let source = if !result.doi.is_empty() {
        format!("https://doi.org/{}", result.doi)
    } else if !result.pmid.is_empty() {
        format!("https://pubmed.ncbi.nlm.nih.gov/{}/", result.pmid)
    } else {
        String::new()
    };

    let owner = if !result.author_string.is_empty() {
        result.author_string
    } else {
        result.journal_title
    };

    NewsArticle {
        id: result.id,
        title: result.title,
        body: truncate_chars(&strip_html_tags(&result.abstract_text), BODY_LIMIT),
        owner,
        created_at: result.first_publication_date,
        source,
        category: "research".to_string(),
    }
}

fn parse_rss(xml: &str, owner: &str) -> Result<Vec<NewsArticle>> {
    let rss: Rss = quick_xml::de::from_str(xml).map_err(|e| anyhow!("invalid RSS: {e}"))?;

    Ok(rss
        .channel
        .items
        .into_iter()
        .take(ITEMS_PER_FEED)
        .map(|item| NewsArticle {
            id: item.guid.unwrap_or_else(|| item.link.clone()),
            title: strip_html_tags(&item.title),
            body: truncate_chars(&strip_html_tags(&item.description), BODY_LIMIT),
            owner: owner.to_string(),
            created_at: item.pub_date,
            source: item.link,
            category: "news".to_string(),
        })
        .collect())
}

fn parse_atom(xml: &str, owner: &str) -> Result<Vec<NewsArticle>> {
    let feed: AtomFeed = quick_xml::de::from_str(xml).map_err(|e| anyhow!("invalid Atom: {e}"))?;

    if feed.entries.is_empty() {
        return Err(anyhow!("Atom feed has no entries"));
    }

    Ok(feed
        .entries
        .into_iter()
        .take(ITEMS_PER_FEED)
        .map(|entry| {
            let link = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .unwrap_or_default();
            NewsArticle {
                id: if entry.id.is_empty() {
                    link.clone()
                } else {
                    entry.id
                },
                title: strip_html_tags(&entry.title),
                body: truncate_chars(&strip_html_tags(&entry.summary), BODY_LIMIT),
                owner: owner.to_string(),
                created_at: entry.updated,
                source: link,
                category: "health".to_string(),
            }
        })
        .collect())
}

/// Remove markup and decode the handful of entities feeds actually use.
fn strip_html_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for c in input.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }

    let decoded = out
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ");

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate on a char boundary, with an ellipsis when anything was cut.
fn truncate_chars(input: &str, limit: usize) -> String {
    if input.chars().count() <= limit {
        return input.to_string();
    }
    let mut out: String = input.chars().take(limit).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>WHO news</title>
    <item>
      <title>New guidance on skin NTDs</title>
      <link>https://www.who.int/news/item/skin-ntds</link>
      <description>&lt;p&gt;WHO released &amp;quot;new guidance&amp;quot; today.&lt;/p&gt;</description>
      <pubDate>Mon, 18 Aug 2026 10:00:00 GMT</pubDate>
      <guid>who-001</guid>
    </item>
    <item>
      <title>Second item</title>
      <link>https://www.who.int/news/item/second</link>
      <description>Short.</description>
      <pubDate>Tue, 19 Aug 2026 10:00:00 GMT</pubDate>
    </item>
  </channel>
</rss>"#;

    const SAMPLE_ATOM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>MedlinePlus skin conditions</title>
  <entry>
    <id>tag:medlineplus,2026:skin-1</id>
    <title>Understanding eczema</title>
    <summary>Eczema is a condition that makes skin red and itchy.</summary>
    <updated>2026-08-20T00:00:00Z</updated>
    <link href="https://medlineplus.gov/eczema.html"/>
  </entry>
</feed>"#;

    #[test]
    fn rss_parsing_strips_html_and_decodes_entities() {
        let articles = parse_rss(SAMPLE_RSS, "WHO").unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].id, "who-001");
        assert_eq!(articles[0].body, "WHO released \"new guidance\" today.");
        assert_eq!(articles[0].owner, "WHO");
        // guid missing falls back to the link
        assert_eq!(articles[1].id, "https://www.who.int/news/item/second");
    }

    #[test]
    fn atom_parsing_reads_link_href() {
        let articles = parse_atom(SAMPLE_ATOM, "MedlinePlus").unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].source, "https://medlineplus.gov/eczema.html");
        assert_eq!(articles[0].title, "Understanding eczema");
    }

    #[test]
    fn atom_parser_rejects_rss() {
        assert!(parse_atom(SAMPLE_RSS, "WHO").is_err());
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let input = "é".repeat(600);
        let out = truncate_chars(&input, BODY_LIMIT);
        assert_eq!(out.chars().count(), BODY_LIMIT + 3);
        assert!(out.ends_with("..."));

        assert_eq!(truncate_chars("short", BODY_LIMIT), "short");
    }

    #[test]
    fn strip_html_collapses_whitespace() {
        assert_eq!(
            strip_html_tags("<p>Hello</p>\n   <b>world</b>"),
            "Hello world"
        );
    }

    #[tokio::test]
    async fn get_all_merges_and_caps_sources() {
        let mut server = mockito::Server::new_async().await;

        server
            .mock("GET", "/search")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"hitCount":42,"resultList":{"result":[
                    {"id":"pmc1","title":"Acne study","abstractText":"A study.","authorString":"Doe J.","journalTitle":"J Derm","firstPublicationDate":"2026-08-01","doi":"10.1/x","pmid":"1"}
                ]}}"#,
            )
            .create_async()
            .await;
        server
            .mock("GET", "/who.xml")
            .with_status(200)
            .with_body(SAMPLE_RSS)
            .create_async()
            .await;
        server
            .mock("GET", "/medline.xml")
            .with_status(200)
            .with_body(SAMPLE_ATOM)
            .create_async()
            .await;

        let config = NewsConfig {
            europe_pmc_url: format!("{}/search", server.url()),
            who_feeds: vec![format!("{}/who.xml", server.url())],
            medlineplus_feed: format!("{}/medline.xml", server.url()),
            per_page: 3,
            request_timeout_secs: 5,
        };

        let service = NewsService::new(&config);
        let list = service.get_all(1).await;

        assert_eq!(list.page, 1);
        assert_eq!(list.size, 3);
        assert_eq!(list.news.len(), 3);
        assert_eq!(list.total_count, 42);
        assert_eq!(list.total_pages, 14);
        assert!(list.has_more);
        assert_eq!(list.news[0].id, "pmc1");
        assert_eq!(list.news[0].source, "https://doi.org/10.1/x");
    }

    #[tokio::test]
    async fn all_sources_down_yields_empty_page() {
        let mut server = mockito::Server::new_async().await;
        // No mocks registered: every fetch 501s

        let config = NewsConfig {
            europe_pmc_url: format!("{}/search", server.url()),
            who_feeds: vec![format!("{}/who.xml", server.url())],
            medlineplus_feed: format!("{}/medline.xml", server.url()),
            per_page: 10,
            request_timeout_secs: 5,
        };

        let service = NewsService::new(&config);
        let list = service.get_all(1).await;

        assert_eq!(list.total_count, 0);
        assert!(list.news.is_empty());
        assert!(!list.has_more);
    }

    #[tokio::test]
    async fn dead_who_feed_does_not_drop_the_others() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/search")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"hitCount":0,"resultList":{"result":[]}}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/who-down.xml")
            .with_status(500)
            .with_body("unavailable")
            .create_async()
            .await;
        server
            .mock("GET", "/who-up.xml")
            .with_status(200)
            .with_body(SAMPLE_RSS)
            .create_async()
            .await;
        server
            .mock("GET", "/medline.xml")
            .with_status(200)
            .with_body(SAMPLE_ATOM)
            .create_async()
            .await;

        let config = NewsConfig {
            europe_pmc_url: format!("{}/search", server.url()),
            who_feeds: vec![
                format!("{}/who-down.xml", server.url()),
                format!("{}/who-up.xml", server.url()),
            ],
            medlineplus_feed: format!("{}/medline.xml", server.url()),
            per_page: 10,
            request_timeout_secs: 5,
        };

        let service = NewsService::new(&config);
        let list = service.get_all(1).await;

        // The healthy feed's items survive the dead one
        assert!(list.news.iter().any(|a| a.id == "who-001"));
        assert!(list.news.iter().any(|a| a.owner == "MedlinePlus"));
    }

    #[tokio::test]
    async fn get_one_returns_none_for_missing_id() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/search")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"hitCount":0,"resultList":{"result":[]}}"#)
            .create_async()
            .await;

        let config = NewsConfig {
            europe_pmc_url: format!("{}/search", server.url()),
            who_feeds: vec![],
            medlineplus_feed: String::new(),
            per_page: 10,
            request_timeout_secs: 5,
        };

        let service = NewsService::new(&config);
        assert!(service.get_one("nope").await.unwrap().is_none());
    }
}
