use futures::stream::{self, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, ORIGIN, USER_AGENT};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::VecDeque;
use url::Url;

use super::http_pool::HttpPool;
use super::responses::{BrowseResponse, NextResponse, PlayerResponse, SearchResponse};
use super::{ArtistCatalog, ArtistRef, MusicUpstream, PlayerInfo, RawTrack, RecordStream};
use crate::config::AppConfig;
use crate::errors::{AppError, Result};

const SONGS_FILTER: &str = "EgWKAQIIAWoMEA4QChADEAQQCRAF";
const ARTISTS_FILTER: &str = "EgWKAQIgAWoMEA4QChADEAQQCRAF";
const WEB_CLIENT_NAME: &str = "WEB_REMIX";
const WEB_CLIENT_ID: &str = "67";
const MAX_ARTIST_RESULTS: usize = 5;

/// YouTube Music InnerTube client. Cheap to clone; clones share the HTTP pool.
#[derive(Clone)]
pub struct InnerTubeClient {
    http: HttpPool,
    base_url: Url,
    country: String,
    language: String,
    client_version: String,
    player_client_name: String,
    player_client_version: String,
}

enum Cursor {
    First,
    Next(String),
    Done,
}

struct SearchState {
    client: InnerTubeClient,
    query: String,
    cursor: Cursor,
    buffer: VecDeque<RawTrack>,
    produced: usize,
    max_records: usize,
}

impl InnerTubeClient {
    pub fn new(config: &AppConfig, proxy: Option<&str>, country: &str) -> Result<Self> {
        let http = HttpPool::new(config, proxy)?;
        let base_url = crate::config::base_url(&config.innertube_base_url)?;

        log::info!(
            "🎵 InnerTube client ready (base: {}, country: {}, proxy: {})",
            base_url,
            country,
            proxy.unwrap_or("none")
        );

        Ok(Self {
            http,
            base_url,
            country: country.to_string(),
            language: config.language.clone(),
            client_version: config.innertube_client_version.clone(),
            player_client_name: config.player_client_name.clone(),
            player_client_version: config.player_client_version.clone(),
        })
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn proxy(&self) -> Option<&str> {
        self.http.proxy()
    }

    fn context(&self, client_name: &str, client_version: &str) -> Value {
        json!({
            "client": {
                "clientName": client_name,
                "clientVersion": client_version,
                "hl": self.language,
                "gl": self.country,
            },
            "user": {}
        })
    }

    fn web_body(&self, fields: Value) -> Value {
        let mut body = json!({ "context": self.context(WEB_CLIENT_NAME, &self.client_version) });
        if let (Some(target), Value::Object(extra)) = (body.as_object_mut(), fields) {
            target.extend(extra);
        }
        body
    }

    fn web_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Ok(origin) = HeaderValue::from_str(&self.base_url.origin().ascii_serialization()) {
            headers.insert(ORIGIN, origin);
        }
        headers.insert("X-YouTube-Client-Name", HeaderValue::from_static(WEB_CLIENT_ID));
        if let Ok(version) = HeaderValue::from_str(&self.client_version) {
            headers.insert("X-YouTube-Client-Version", version);
        }
        headers
    }

    async fn post<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &Value,
        headers: HeaderMap,
        extra_query: &[(&str, &str)],
    ) -> Result<T> {
        let url = self.base_url.join(&format!("youtubei/v1/{}", endpoint))?;
        log::debug!("POST {} {:?}", url, extra_query);

        let response = self
            .http
            .client()
            .post(url)
            .query(&[("alt", "json"), ("prettyPrint", "false")])
            .query(extra_query)
            .headers(headers)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upstream(format!(
                "InnerTube {} returned HTTP {}",
                endpoint, status
            )));
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn search_page(
        &self,
        query: &str,
        params: &str,
        continuation: Option<&str>,
    ) -> Result<super::responses::SearchPage> {
        let body = self.web_body(json!({ "query": query, "params": params }));
        let extra: Vec<(&str, &str)> = match continuation {
            Some(token) => vec![("ctoken", token), ("continuation", token), ("type", "next")],
            None => Vec::new(),
        };
        let response: SearchResponse = self
            .post("search", &body, self.web_headers(), &extra)
            .await?;
        Ok(response.into_page())
    }

    async fn browse(&self, browse_id: &str) -> Result<BrowseResponse> {
        let body = self.web_body(json!({ "browseId": browse_id }));
        self.post("browse", &body, self.web_headers(), &[]).await
    }
}

impl SearchState {
    async fn next_record(mut self) -> Result<Option<(RawTrack, Self)>> {
        loop {
            if self.produced >= self.max_records {
                return Ok(None);
            }
            if let Some(track) = self.buffer.pop_front() {
                self.produced += 1;
                return Ok(Some((track, self)));
            }

            let token = match std::mem::replace(&mut self.cursor, Cursor::Done) {
                Cursor::Done => return Ok(None),
                Cursor::First => None,
                Cursor::Next(token) => Some(token),
            };

            let page = self
                .client
                .search_page(&self.query, SONGS_FILTER, token.as_deref())
                .await?;
            log::debug!(
                "Search page for '{}': {} records, more: {}",
                self.query,
                page.items.len(),
                page.continuation.is_some()
            );

            // An empty page never advances, so stop rather than spin on its token.
            if page.items.is_empty() {
                return Ok(None);
            }
            if let Some(next) = page.continuation {
                self.cursor = Cursor::Next(next);
            }
            self.buffer.extend(page.items);
        }
    }
}

#[async_trait::async_trait]
impl MusicUpstream for InnerTubeClient {
    fn search_songs(&self, query: &str, max_records: usize) -> RecordStream {
        let state = SearchState {
            client: self.clone(),
            query: query.to_string(),
            cursor: Cursor::First,
            buffer: VecDeque::new(),
            produced: 0,
            max_records,
        };
        stream::try_unfold(state, SearchState::next_record).boxed()
    }

    async fn search_artists(&self, query: &str) -> Result<Vec<ArtistRef>> {
        let page = self.search_page(query, ARTISTS_FILTER, None).await?;
        Ok(page.artists.into_iter().take(MAX_ARTIST_RESULTS).collect())
    }

    async fn artist_catalog(&self, browse_id: &str) -> Result<ArtistCatalog> {
        let (songs, albums) = self.browse(browse_id).await?.artist_sections();
        log::debug!(
            "Artist {}: {} songs on page, {} albums",
            browse_id,
            songs.len(),
            albums.len()
        );
        Ok(ArtistCatalog { songs, albums })
    }

    async fn album_tracks(&self, browse_id: &str) -> Result<Vec<RawTrack>> {
        Ok(self.browse(browse_id).await?.album_tracks())
    }

    async fn watch_playlist(&self, video_id: &str) -> Result<Vec<RawTrack>> {
        let body = self.web_body(json!({
            "videoId": video_id,
            "playlistId": format!("RDAMVM{}", video_id),
            "isAudioOnly": true,
            "enablePersistentPlaylistPanel": true,
            "tunerSettingValue": "AUTOMIX_SETTING_NORMAL",
        }));
        let response: NextResponse = self.post("next", &body, self.web_headers(), &[]).await?;
        Ok(response.tracks())
    }

    async fn player(&self, video_id: &str) -> Result<PlayerInfo> {
        let body = json!({
            "context": self.context(&self.player_client_name, &self.player_client_version),
            "videoId": video_id,
            "contentCheckOk": true,
            "racyCheckOk": true,
        });

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let agent = format!(
            "com.google.android.apps.youtube.vr.oculus/{} (Linux; U; Android 12L; eureka-user Build/SQ3A.220605.009.A1) gzip",
            self.player_client_version
        );
        if let Ok(agent) = HeaderValue::from_str(&agent) {
            headers.insert(USER_AGENT, agent);
        }

        let response: PlayerResponse = self.post("player", &body, headers, &[]).await?;
        Ok(response.into_info(video_id))
    }

    async fn ping(&self) -> Result<()> {
        let response = self.http.client().get(self.base_url.clone()).send().await?;
        if response.status().is_server_error() {
            return Err(AppError::Upstream(format!(
                "{} answered HTTP {}",
                self.base_url,
                response.status()
            )));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "innertube"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> AppConfig {
        AppConfig {
            innertube_base_url: server.uri(),
            ..AppConfig::default()
        }
    }

    fn shelf_item(video_id: &str) -> Value {
        json!({"musicResponsiveListItemRenderer": {
            "flexColumns": [
                {"musicResponsiveListItemFlexColumnRenderer": {"text": {"runs": [{"text": format!("Title {}", video_id)}]}}},
                {"musicResponsiveListItemFlexColumnRenderer": {"text": {"runs": [{"text": "Artist"}]}}}
            ],
            "playlistItemData": {"videoId": video_id}
        }})
    }

    #[tokio::test]
    async fn search_follows_continuations_until_the_cap() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/youtubei/v1/search"))
            .and(query_param("ctoken", "PAGE2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "continuationContents": {"musicShelfContinuation": {
                    "contents": [shelf_item("c"), shelf_item("d")],
                    "continuations": [{"nextContinuationData": {"continuation": "PAGE3"}}]
                }}
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/youtubei/v1/search"))
            .and(body_partial_json(json!({"query": "gale lag ja", "params": SONGS_FILTER})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "contents": {"tabbedSearchResultsRenderer": {"tabs": [{"tabRenderer": {"content": {
                    "sectionListRenderer": {"contents": [{"musicShelfRenderer": {
                        "contents": [shelf_item("a"), shelf_item("b")],
                        "continuations": [{"nextContinuationData": {"continuation": "PAGE2"}}]
                    }}]}
                }}}]}}
            })))
            .mount(&server)
            .await;

        let client = InnerTubeClient::new(&config_for(&server), None, "US").unwrap();
        let tracks: Vec<RawTrack> = client
            .search_songs("gale lag ja", 3)
            .try_collect()
            .await
            .unwrap();

        let ids: Vec<_> = tracks.iter().filter_map(|t| t.video_id.as_deref()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn http_failures_surface_as_upstream_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/youtubei/v1/next"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = InnerTubeClient::new(&config_for(&server), None, "US").unwrap();
        let error = client.watch_playlist("abc").await.unwrap_err();
        assert_eq!(error.kind(), "upstream");
        assert!(error.to_string().contains("503"));
    }

    #[tokio::test]
    async fn country_is_sent_as_gl() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/youtubei/v1/search"))
            .and(body_partial_json(json!({"context": {"client": {"gl": "IN", "clientName": "WEB_REMIX"}}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let client = InnerTubeClient::new(&config_for(&server), None, "IN").unwrap();
        let artists = client.search_artists("Arijit Singh").await.unwrap();
        assert!(artists.is_empty());
    }

    #[tokio::test]
    async fn base_url_path_prefix_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/proxy/youtubei/v1/next"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let config = AppConfig {
            innertube_base_url: format!("{}/proxy", server.uri()),
            ..AppConfig::default()
        };
        let client = InnerTubeClient::new(&config, None, "US").unwrap();
        let tracks = client.watch_playlist("abc").await.unwrap();
        assert!(tracks.is_empty());
    }
}
