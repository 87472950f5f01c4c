//! YouTube transcript fetching.
//!
//! Caption tracks come from the innertube player endpoint, keyed by the API
//! key found on the watch page. The player response embedded in the watch
//! page is the fallback. Each track's `baseUrl` serves timed-text XML.

use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::ACCEPT_LANGUAGE;
use serde::Deserialize;

use super::errors::{Result, SourceError};
use crate::text::html::{collapse_whitespace, decode_entities, extract_html_title, extract_meta_content};
use crate::text::json::balanced_array_at;

pub const YOUTUBE_BASE_URL: &str = "https://www.youtube.com";

/// Client identity sent to the player endpoint
const PLAYER_CLIENT_NAME: &str = "ANDROID";
const PLAYER_CLIENT_VERSION: &str = "20.10.38";

/// Title and flattened caption text of one video
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub video_id: String,
    pub title: String,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    #[serde(default)]
    language_code: String,
    /// "asr" for auto-generated captions
    #[serde(default)]
    kind: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    #[serde(default)]
    playability_status: Option<PlayabilityStatus>,
    #[serde(default)]
    captions: Option<PlayerCaptions>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: String,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerCaptions {
    player_captions_tracklist_renderer: TracklistRenderer,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TracklistRenderer {
    #[serde(default)]
    caption_tracks: Vec<CaptionTrack>,
}

impl CaptionTrack {
    /// Timed-text URL in the classic XML format
    fn timed_text_url(&self) -> String {
        self.base_url.replace("&fmt=srv3", "")
    }

    fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }

    fn matches_language(&self, language: &str) -> bool {
        let code = self.language_code.to_lowercase();
        let language = language.to_lowercase();
        code == language || code.starts_with(&format!("{}-", language))
    }
}

/// Extract the 11-character video id from a URL or a bare id.
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();

    let short = Regex::new(r"youtu\.be/([a-zA-Z0-9_-]{11})").unwrap();
    if let Some(caps) = short.captures(input) {
        return Some(caps[1].to_string());
    }

    let long = Regex::new(r"(?:[?&]v=|/v/|/shorts/|/embed/)([a-zA-Z0-9_-]{11})").unwrap();
    if let Some(caps) = long.captures(input) {
        return Some(caps[1].to_string());
    }

    let bare = Regex::new(r"^[a-zA-Z0-9_-]{11}$").unwrap();
    bare.is_match(input).then(|| input.to_string())
}

/// Fetch the transcript of `video_id`, preferring captions in `language`.
pub fn fetch_transcript(
    client: &Client,
    base_url: &str,
    video_id: &str,
    language: &str,
) -> Result<Transcript> {
    let watch_url = format!("{}/watch?v={}", base_url.trim_end_matches('/'), video_id);
    log::info!("Fetching YouTube watch page for {}", video_id);
    let page = get_text(client, &watch_url, language)?;

    check_playability(&page)?;

    let player_tracks = innertube_api_key(&page)
        .map(|key| {
            player_caption_tracks(client, base_url, video_id, &key).unwrap_or_else(|e| {
                log::warn!("Player endpoint gave no captions for {}: {}", video_id, e);
                Vec::new()
            })
        })
        .unwrap_or_default();
    let page_tracks = caption_tracks(&page);
    if player_tracks.is_empty() && page_tracks.is_empty() {
        return Err(SourceError::NoTranscript(
            "This video has captions/transcript disabled.".to_string(),
        ));
    }

    let mut text = String::new();
    for tracks in [&player_tracks, &page_tracks] {
        let Some(track) = choose_track(tracks, language) else {
            continue;
        };
        log::debug!(
            "Using caption track '{}'{}",
            track.language_code,
            if track.is_generated() { " (auto-generated)" } else { "" }
        );
        let xml = get_text(client, &track.timed_text_url(), language)?;
        text = parse_timed_text(&xml);
        if !text.is_empty() {
            break;
        }
        log::debug!("Caption track '{}' was empty", track.language_code);
    }
    if text.is_empty() {
        return Err(SourceError::NoTranscript("Transcript was empty.".to_string()));
    }

    Ok(Transcript {
        video_id: video_id.to_string(),
        title: video_title(&page, video_id),
        text,
    })
}

fn get_text(client: &Client, url: &str, language: &str) -> Result<String> {
    let response = client
        .get(url)
        .header(ACCEPT_LANGUAGE, format!("{},en;q=0.8", language))
        .send()
        .map_err(|e| SourceError::unreachable(url, e))?;

    if !response.status().is_success() {
        log::warn!("YouTube request failed with status {} for {}", response.status(), url);
        return Err(SourceError::unreachable(url, format!("HTTP {}", response.status())));
    }

    response.text().map_err(|e| SourceError::unreachable(url, e))
}

fn innertube_api_key(page: &str) -> Option<String> {
    let re = Regex::new(r#""INNERTUBE_API_KEY":\s*"([a-zA-Z0-9_-]+)""#).unwrap();
    re.captures(page).map(|c| c[1].to_string())
}

/// Caption tracks from the innertube player endpoint
fn player_caption_tracks(
    client: &Client,
    base_url: &str,
    video_id: &str,
    api_key: &str,
) -> Result<Vec<CaptionTrack>> {
    let url = format!("{}/youtubei/v1/player?key={}", base_url.trim_end_matches('/'), api_key);
    let body = serde_json::json!({
        "context": {
            "client": {
                "clientName": PLAYER_CLIENT_NAME,
                "clientVersion": PLAYER_CLIENT_VERSION,
            }
        },
        "videoId": video_id,
    });

    let response = client
        .post(&url)
        .json(&body)
        .send()
        .map_err(|e| SourceError::unreachable(&url, e))?;
    if !response.status().is_success() {
        return Err(SourceError::unreachable(&url, format!("HTTP {}", response.status())));
    }
    let player: PlayerResponse = response.json()?;

    if let Some(status) = player.playability_status.filter(|p| p.status != "OK") {
        return Err(SourceError::unreachable(
            &url,
            format!("{} ({})", status.status, status.reason.unwrap_or_default()),
        ));
    }

    Ok(player
        .captions
        .map(|c| c.player_captions_tracklist_renderer.caption_tracks)
        .unwrap_or_default())
}

fn check_playability(page: &str) -> Result<()> {
    let re = Regex::new(r#""playabilityStatus":\s*\{\s*"status":\s*"([A-Z_]+)""#).unwrap();
    match re.captures(page).map(|c| c[1].to_string()).as_deref() {
        Some("ERROR") | Some("LOGIN_REQUIRED") | Some("UNPLAYABLE") => Err(SourceError::VideoUnavailable),
        _ => Ok(()),
    }
}

fn caption_tracks(page: &str) -> Vec<CaptionTrack> {
    let Some(key) = page.find("\"captionTracks\":") else {
        return Vec::new();
    };
    let Some(open) = page[key..].find('[').map(|i| key + i) else {
        return Vec::new();
    };
    let Some(array) = balanced_array_at(page, open) else {
        return Vec::new();
    };

    match serde_json::from_str::<Vec<CaptionTrack>>(array) {
        Ok(tracks) => tracks,
        Err(e) => {
            log::warn!("Could not parse caption tracks: {}", e);
            Vec::new()
        }
    }
}

/// Requested language first, manual captions before generated ones.
fn choose_track<'a>(tracks: &'a [CaptionTrack], language: &str) -> Option<&'a CaptionTrack> {
    tracks
        .iter()
        .find(|t| t.matches_language(language) && !t.is_generated())
        .or_else(|| tracks.iter().find(|t| t.matches_language(language)))
        .or_else(|| tracks.iter().find(|t| !t.is_generated()))
        .or_else(|| tracks.first())
}

/// Flatten timed-text XML (`<text>` or `<p>`/`<s>` formats) into plain text.
pub(crate) fn parse_timed_text(xml: &str) -> String {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut snippets: Vec<String> = Vec::new();
    let mut current: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = e.name();
                if name.as_ref() == b"text" || name.as_ref() == b"p" {
                    current = Some(String::new());
                }
            }
            Ok(Event::End(ref e)) => {
                let name = e.name();
                if name.as_ref() == b"text" || name.as_ref() == b"p" {
                    if let Some(snippet) = current.take() {
                        // Captions are often escaped twice (`&amp;#39;`)
                        let snippet = collapse_whitespace(&decode_entities(&snippet));
                        if !snippet.is_empty() {
                            snippets.push(snippet);
                        }
                    }
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Some(ref mut snippet) = current {
                    if let Ok(text) = e.unescape() {
                        snippet.push(' ');
                        snippet.push_str(&text);
                    }
                }
            }
            Ok(Event::CData(ref e)) => {
                if let Some(ref mut snippet) = current {
                    snippet.push(' ');
                    snippet.push_str(&String::from_utf8_lossy(e));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("Error parsing timed-text XML: {}", e);
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    snippets.join(" ")
}

fn video_title(page: &str, video_id: &str) -> String {
    extract_meta_content(page, "og:title")
        .or_else(|| extract_html_title(page))
        .map(|t| t.trim_end_matches(" - YouTube").trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| format!("YouTube video {}", video_id))
}
