//! Playback resolution against a mocked site
//!
//! Covers the ticketed happy path and every degraded or fatal branch of
//! the handshake.

use std::time::Duration;

use makovod_core::crypto::{Keyset, encrypt};
use makovod_core::{ClientConfig, MakoError, MakoScraper, entitlement_payload};
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EPISODE_PATH: &str = "/mako-vod-keshet/bb/VOD-abc123.htm";
const STREAM_URL: &str = "https://cdn.example/stream.m3u8";
const PLAYLIST_JSON: &str = r#"{"media":[{"url":"https://cdn.example/stream.m3u8"}]}"#;
const TICKET_JSON: &str = r#"{"tickets":[{"ticket":"tkt=abc123"}]}"#;

// =============================================================================
// Fixtures
// =============================================================================

fn config(server: &MockServer, entitlement_url: String) -> ClientConfig {
    ClientConfig {
        base_url: server.uri(),
        entitlement_url,
        request_delay: Duration::ZERO,
        request_jitter: Duration::ZERO,
        timeout: Duration::from_secs(5),
        max_retries: 1,
        retry_backoff: Duration::ZERO,
    }
}

fn scraper(server: &MockServer) -> MakoScraper {
    let entitlement = format!("{}/entitlement?et=egt", server.uri());
    MakoScraper::with_config(config(server, entitlement)).unwrap()
}

fn episode_page() -> String {
    r#"<html><body><script id="__NEXT_DATA__" type="application/json">
    {"props":{"pageProps":{"data":{"vod":{"itemVcmId":"vcm-1","galleryChannelId":"gal-2","channelId":"chan-3"}}}}}
    </script></body></html>"#
        .to_string()
}

async fn mount_episode(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(EPISODE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(episode_page()))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_playlist(server: &MockServer, body: String) {
    Mock::given(method("GET"))
        .and(path("/AjaxPage"))
        .and(query_param("jspName", "playlist12.jsp"))
        .and(query_param("vcmid", "vcm-1"))
        .and(query_param("videoChannelId", "chan-3"))
        .and(query_param("galleryChannelId", "gal-2"))
        .and(query_param("consumer", "responsive"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(server)
        .await;
}

fn episode_url(server: &MockServer) -> String {
    format!("{}{}", server.uri(), EPISODE_PATH)
}

// =============================================================================
// Happy path
// =============================================================================

#[tokio::test]
async fn test_resolves_ticketed_url() {
    let server = MockServer::start().await;
    mount_episode(&server).await;
    mount_playlist(&server, encrypt(PLAYLIST_JSON, Keyset::Playlist)).await;

    let expected_body = entitlement_payload(STREAM_URL).unwrap();
    Mock::given(method("POST"))
        .and(path("/entitlement"))
        .and(query_param("et", "egt"))
        .and(header("content-type", "text/plain;charset=UTF-8"))
        .and(body_string(expected_body))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(encrypt(TICKET_JSON, Keyset::Entitlement)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let playback = scraper(&server)
        .resolve_playback(&episode_url(&server))
        .await
        .unwrap();

    assert_eq!(playback.url, "https://cdn.example/stream.m3u8?tkt=abc123");
    assert!(playback.ticketed);
}

#[tokio::test]
async fn test_ticket_joins_existing_query_with_ampersand() {
    let server = MockServer::start().await;
    mount_episode(&server).await;
    mount_playlist(
        &server,
        encrypt(
            r#"{"media":[{"url":"https://cdn.example/stream.m3u8?b=100-2000"}]}"#,
            Keyset::Playlist,
        ),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/entitlement"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(encrypt(TICKET_JSON, Keyset::Entitlement)),
        )
        .mount(&server)
        .await;

    let playback = scraper(&server)
        .resolve_playback(&episode_url(&server))
        .await
        .unwrap();

    assert_eq!(
        playback.url,
        "https://cdn.example/stream.m3u8?b=100-2000&tkt=abc123"
    );
}

// =============================================================================
// Degraded paths: unticketed URL
// =============================================================================

#[tokio::test]
async fn test_entitlement_transport_failure_returns_unticketed() {
    let server = MockServer::start().await;
    mount_episode(&server).await;
    mount_playlist(&server, encrypt(PLAYLIST_JSON, Keyset::Playlist)).await;

    // Nothing listens on port 1
    let config = config(&server, "http://127.0.0.1:1/entitlement".to_string());
    let scraper = MakoScraper::with_config(config).unwrap();

    let playback = scraper
        .resolve_playback(&episode_url(&server))
        .await
        .unwrap();

    assert_eq!(playback.url, STREAM_URL);
    assert!(!playback.ticketed);
}

#[tokio::test]
async fn test_entitlement_server_error_returns_unticketed() {
    let server = MockServer::start().await;
    mount_episode(&server).await;
    mount_playlist(&server, encrypt(PLAYLIST_JSON, Keyset::Playlist)).await;
    Mock::given(method("POST"))
        .and(path("/entitlement"))
        .respond_with(ResponseTemplate::new(503))
        // First attempt plus one retry
        .expect(2)
        .mount(&server)
        .await;

    let playback = scraper(&server)
        .resolve_playback(&episode_url(&server))
        .await
        .unwrap();

    assert_eq!(playback.url, STREAM_URL);
    assert!(!playback.ticketed);
}

#[tokio::test]
async fn test_undecryptable_entitlement_returns_unticketed() {
    let server = MockServer::start().await;
    mount_episode(&server).await;
    mount_playlist(&server, encrypt(PLAYLIST_JSON, Keyset::Playlist)).await;
    Mock::given(method("POST"))
        .and(path("/entitlement"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<<not encrypted>>"))
        .expect(1)
        .mount(&server)
        .await;

    let playback = scraper(&server)
        .resolve_playback(&episode_url(&server))
        .await
        .unwrap();

    assert_eq!(playback.url, STREAM_URL);
    assert!(!playback.ticketed);
}

#[tokio::test]
async fn test_entitlement_without_ticket_returns_unticketed() {
    let server = MockServer::start().await;
    mount_episode(&server).await;
    mount_playlist(&server, encrypt(PLAYLIST_JSON, Keyset::Playlist)).await;
    Mock::given(method("POST"))
        .and(path("/entitlement"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(encrypt(r#"{"tickets":[]}"#, Keyset::Entitlement)),
        )
        .mount(&server)
        .await;

    let playback = scraper(&server)
        .resolve_playback(&episode_url(&server))
        .await
        .unwrap();

    assert_eq!(playback.url, STREAM_URL);
    assert!(!playback.ticketed);
}

// =============================================================================
// Fatal paths
// =============================================================================

#[tokio::test]
async fn test_undecryptable_playlist_is_fatal() {
    let server = MockServer::start().await;
    mount_episode(&server).await;
    mount_playlist(&server, "garbage!!".to_string()).await;
    Mock::given(method("POST"))
        .and(path("/entitlement"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = scraper(&server).resolve_playback(&episode_url(&server)).await;

    assert!(matches!(result, Err(MakoError::CryptoError(_))));
}

#[tokio::test]
async fn test_playlist_without_media_is_fatal() {
    let server = MockServer::start().await;
    mount_episode(&server).await;
    mount_playlist(&server, encrypt(r#"{"media":[]}"#, Keyset::Playlist)).await;

    let result = scraper(&server).resolve_playback(&episode_url(&server)).await;

    assert!(matches!(result, Err(MakoError::MissingField(_))));
}

#[tokio::test]
async fn test_empty_playlist_response_is_fatal() {
    let server = MockServer::start().await;
    mount_episode(&server).await;
    mount_playlist(&server, "   \n".to_string()).await;

    let result = scraper(&server).resolve_playback(&episode_url(&server)).await;

    assert!(matches!(result, Err(MakoError::ParseError(_))));
}

#[tokio::test]
async fn test_episode_page_without_identifiers_stops_early() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(EPISODE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body></body></html>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/AjaxPage"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = scraper(&server).resolve_playback(&episode_url(&server)).await;

    assert!(matches!(result, Err(MakoError::ParseError(_))));
}

#[tokio::test]
async fn test_missing_episode_page_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(EPISODE_PATH))
        .respond_with(ResponseTemplate::new(404))
        // Client errors are not retried
        .expect(1)
        .mount(&server)
        .await;

    let result = scraper(&server).resolve_playback(&episode_url(&server)).await;

    match result {
        Err(e) => assert!(e.is_transport()),
        Ok(p) => panic!("Expected transport error, got {:?}", p),
    }
}
