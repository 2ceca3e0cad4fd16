mod common;

use axum::http::StatusCode;
use common::{create_test_app_with, get};
use skinai_server::config::Config;

fn news_config(server: &mockito::ServerGuard) -> Config {
    let mut config = Config::default();
    config.news.europe_pmc_url = format!("{}/search", server.url());
    config.news.who_feeds = vec![format!("{}/who.xml", server.url())];
    config.news.medlineplus_feed = format!("{}/medline.xml", server.url());
    config.news.per_page = 5;
    config
}

const PMC_PAGE: &str = r#"{"hitCount":7,"resultList":{"result":[
    {"id":"art-1","title":"Melanoma screening update","abstractText":"Screening works.","authorString":"Smith A.","journalTitle":"J Derm","firstPublicationDate":"2026-08-10","doi":"10.1000/derm.1","pmid":"111"},
    {"id":"art-2","title":"Topical retinoids","abstractText":"","authorString":"","journalTitle":"Acta Derm","firstPublicationDate":"2026-08-09","doi":"","pmid":"222"}
]}}"#;

#[tokio::test]
async fn news_page_merges_sources() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/search")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(PMC_PAGE)
        .create_async()
        .await;
    // Feeds are down; the page still renders from what answered
    let app = create_test_app_with(news_config(&server)).await;

    let (status, body) = get(&app, "/api/v1/news/getall?page=1", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 1);
    assert_eq!(body["size"], 5);
    assert_eq!(body["total_count"], 7);
    assert_eq!(body["total_pages"], 2);
    assert_eq!(body["has_more"], true);

    let news = body["news"].as_array().unwrap();
    assert_eq!(news.len(), 2);
    assert_eq!(news[0]["id"], "art-1");
    assert_eq!(news[0]["source"], "https://doi.org/10.1000/derm.1");
    assert_eq!(news[0]["category"], "research");
    // no DOI falls back to the PubMed link, no authors to the journal
    assert_eq!(news[1]["source"], "https://pubmed.ncbi.nlm.nih.gov/222/");
    assert_eq!(news[1]["owner"], "Acta Derm");
}

#[tokio::test]
async fn news_page_defaults_and_clamps() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/search")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"hitCount":0,"resultList":{"result":[]}}"#)
        .expect_at_least(2)
        .create_async()
        .await;
    let app = create_test_app_with(news_config(&server)).await;

    // missing page defaults to 1
    let (status, body) = get(&app, "/api/v1/news/getall", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 1);
    assert_eq!(body["news"].as_array().unwrap().len(), 0);
    assert_eq!(body["has_more"], false);

    // page=0 clamps to 1 instead of erroring
    let (status, body) = get(&app, "/api/v1/news/getall?page=0", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 1);
}

#[tokio::test]
async fn news_getone_found_and_missing() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/search")
        .match_query(mockito::Matcher::UrlEncoded(
            "query".into(),
            "EXT_ID:art-1".into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(PMC_PAGE)
        .create_async()
        .await;
    server
        .mock("GET", "/search")
        .match_query(mockito::Matcher::UrlEncoded(
            "query".into(),
            "EXT_ID:ghost".into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"hitCount":0,"resultList":{"result":[]}}"#)
        .create_async()
        .await;
    let app = create_test_app_with(news_config(&server)).await;

    let (status, body) = get(&app, "/api/v1/news/getone?id=art-1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Melanoma screening update");

    let (status, body) = get(&app, "/api/v1/news/getone?id=ghost", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["title"].as_str().unwrap().contains("Not Found"));
}

#[tokio::test]
async fn news_getone_upstream_failure_is_bad_gateway() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/search")
        .match_query(mockito::Matcher::Any)
        .with_status(500)
        .with_body("internal")
        .create_async()
        .await;
    let app = create_test_app_with(news_config(&server)).await;

    let (status, _) = get(&app, "/api/v1/news/getone?id=art-1", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}
