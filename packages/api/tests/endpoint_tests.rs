// ABOUTME: Integration tests for pagination and the Spotify domain operations
// ABOUTME: Verifies link following, partial results, request shapes and model decoding

mod common;

use cadenza_api::{ApiError, SearchType};
use common::{
    artist_json, client_for, client_with, device_json, playlist_json, track_json, user_json,
    ScriptedTokens,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use wiremock::{
    matchers::{body_json, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

fn playlists_page(server: &MockServer, ids: &[&str], next_offset: Option<u32>) -> serde_json::Value {
    json!({
        "items": ids.iter().map(|id| playlist_json(id)).collect::<Vec<_>>(),
        "next": next_offset.map(|offset| format!("{}/me/playlists?offset={}&limit=2", server.uri(), offset)),
        "total": 5
    })
}

async fn mount_playlist_pages(server: &MockServer, page_two: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/me/playlists"))
        .and(query_param("offset", "2"))
        .respond_with(page_two)
        .with_priority(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me/playlists"))
        .and(query_param("offset", "4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(playlists_page(server, &["p5"], None)))
        .with_priority(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me/playlists"))
        .and(query_param("limit", "2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(playlists_page(server, &["p1", "p2"], Some(2))),
        )
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_playlists_follow_all_pages_in_order() {
    let server = MockServer::start().await;
    let page_two =
        ResponseTemplate::new(200).set_body_json(playlists_page(&server, &["p3", "p4"], Some(4)));
    mount_playlist_pages(&server, page_two).await;

    let client = client_with(&server, Arc::new(ScriptedTokens::default()), |mut config| {
        config.page_limit = 2;
        config
    });

    let ids: Vec<String> = client
        .current_user_playlists()
        .await
        .unwrap()
        .into_iter()
        .map(|playlist| playlist.id)
        .collect();

    assert_eq!(ids, vec!["p1", "p2", "p3", "p4", "p5"]);
}

#[tokio::test]
async fn test_failed_later_page_returns_partial_results() {
    let server = MockServer::start().await;
    let page_two = ResponseTemplate::new(404).set_body_json(json!({
        "error": {"status": 404, "message": "Not found"}
    }));
    mount_playlist_pages(&server, page_two).await;

    let client = client_with(&server, Arc::new(ScriptedTokens::default()), |mut config| {
        config.page_limit = 2;
        config
    });

    let ids: Vec<String> = client
        .current_user_playlists()
        .await
        .unwrap()
        .into_iter()
        .map(|playlist| playlist.id)
        .collect();

    assert_eq!(ids, vec!["p1", "p2"]);
}

#[tokio::test]
async fn test_next_link_to_foreign_host_is_not_followed() {
    let server = MockServer::start().await;
    let foreign = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me/playlists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [playlist_json("p1"), playlist_json("p2")],
            "next": format!("{}/me/playlists?offset=2&limit=2", foreign.uri()),
            "total": 4
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [playlist_json("p3")],
            "next": null
        })))
        .expect(0)
        .mount(&foreign)
        .await;

    let client = client_with(&server, Arc::new(ScriptedTokens::default()), |mut config| {
        config.page_limit = 2;
        config
    });

    let ids: Vec<String> = client
        .current_user_playlists()
        .await
        .unwrap()
        .into_iter()
        .map(|playlist| playlist.id)
        .collect();

    assert_eq!(ids, vec!["p1", "p2"]);
    assert!(foreign.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_repeated_next_link_stops_pagination() {
    let server = MockServer::start().await;
    let repeating = format!("{}/me/playlists?offset=2&limit=2", server.uri());

    Mock::given(method("GET"))
        .and(path("/me/playlists"))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [playlist_json("p3")],
            "next": repeating.clone(),
            "total": 3
        })))
        .expect(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me/playlists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [playlist_json("p1"), playlist_json("p2")],
            "next": repeating,
            "total": 3
        })))
        .expect(1)
        .with_priority(2)
        .mount(&server)
        .await;

    let client = client_with(&server, Arc::new(ScriptedTokens::default()), |mut config| {
        config.page_limit = 2;
        config
    });

    let ids: Vec<String> = client
        .current_user_playlists()
        .await
        .unwrap()
        .into_iter()
        .map(|playlist| playlist.id)
        .collect();

    assert_eq!(ids, vec!["p1", "p2", "p3"]);
}

#[tokio::test]
async fn test_failed_first_page_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me/playlists"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"status": 403, "message": "Insufficient client scope"}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(ScriptedTokens::default()));

    assert!(matches!(
        client.current_user_playlists().await.unwrap_err(),
        ApiError::RequestFailed { status: 403, .. }
    ));
}

#[tokio::test]
async fn test_playlist_tracks_with_removed_items() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/playlists/37i9dQZF1DXcBWIGoYBM5M/tracks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"added_at": "2024-01-01T00:00:00Z", "track": track_json("t1")},
                {"added_at": "2024-01-02T00:00:00Z", "track": null}
            ],
            "next": null,
            "total": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(ScriptedTokens::default()));
    let items = client
        .playlist_tracks("spotify:playlist:37i9dQZF1DXcBWIGoYBM5M")
        .await
        .unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].track.as_ref().unwrap().name, "Track t1");
    assert!(items[1].track.is_none());
}

#[tokio::test]
async fn test_followed_artists_follow_cursor_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me/following"))
        .and(query_param("after", "a2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "artists": {
                "items": [artist_json("a3")],
                "next": null,
                "cursors": {"after": null}
            }
        })))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me/following"))
        .and(query_param("type", "artist"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "artists": {
                "items": [artist_json("a1"), artist_json("a2")],
                "next": format!("{}/me/following?type=artist&after=a2&limit=50", server.uri()),
                "cursors": {"after": "a2"},
                "total": 3
            }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(ScriptedTokens::default()));
    let names: Vec<String> = client
        .followed_artists()
        .await
        .unwrap()
        .into_iter()
        .map(|artist| artist.name)
        .collect();

    assert_eq!(names, vec!["Artist a1", "Artist a2", "Artist a3"]);
}

#[tokio::test]
async fn test_recently_played_clamps_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me/player/recently-played"))
        .and(query_param("limit", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{
                "track": track_json("t9"),
                "played_at": "2024-05-01T10:00:00.000Z",
                "context": {"uri": "spotify:playlist:p1", "type": "playlist"}
            }],
            "next": null,
            "cursors": {"after": "1714557600000", "before": "1714557600000"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(ScriptedTokens::default()));
    let history = client.recently_played(500).await.unwrap();

    assert_eq!(history.len(), 1);
    assert_eq!(history[0].track.id.as_deref(), Some("t9"));
    assert_eq!(history[0].context.as_ref().unwrap().kind, "playlist");
}

#[tokio::test]
async fn test_current_user() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(ScriptedTokens::default()));
    let user = client.current_user().await.unwrap();

    assert_eq!(user.display_name.as_deref(), Some("Test Listener"));
    assert!(user.is_premium());
}

#[tokio::test]
async fn test_artist_top_tracks_uses_configured_market() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/artists/0OdUWJ0sBjDrqHygGUXeCF/top-tracks"))
        .and(query_param("market", "from_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tracks": [track_json("t1"), track_json("t2")]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/artists/0OdUWJ0sBjDrqHygGUXeCF/top-tracks"))
        .and(query_param("market", "SE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "tracks": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(ScriptedTokens::default()));

    let tracks = client
        .artist_top_tracks("0OdUWJ0sBjDrqHygGUXeCF", None)
        .await
        .unwrap();
    assert_eq!(tracks.len(), 2);

    let tracks = client
        .artist_top_tracks("https://open.spotify.com/artist/0OdUWJ0sBjDrqHygGUXeCF", Some("SE"))
        .await
        .unwrap();
    assert!(tracks.is_empty());
}

#[tokio::test]
async fn test_track_lookup_and_invalid_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tracks/t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(track_json("t1")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(ScriptedTokens::default()));

    let track = client.track("spotify:track:t1").await.unwrap();
    assert_eq!(track.artist_names(), "Artist One");
    assert_eq!(track.duration_display(), "3:20");

    assert!(matches!(
        client.track("spotify:album:t1").await.unwrap_err(),
        ApiError::InvalidInput(_)
    ));
}

#[tokio::test]
async fn test_search_request_shape() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "daft punk"))
        .and(query_param("type", "track,artist"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tracks": {"items": [track_json("t1")], "next": null, "total": 1},
            "artists": {"items": [artist_json("a1")], "next": null, "total": 1}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(ScriptedTokens::default()));
    let results = client
        .search(" daft punk ", &[SearchType::Track, SearchType::Artist], 5)
        .await
        .unwrap();

    assert_eq!(results.tracks.unwrap().items.len(), 1);
    assert_eq!(results.artists.unwrap().items[0].genres, vec!["indie"]);
    assert!(results.albums.is_none());

    assert!(matches!(
        client.search("   ", &[], 5).await.unwrap_err(),
        ApiError::InvalidInput(_)
    ));
}

#[tokio::test]
async fn test_playback_state_decodes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me/player"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "device": device_json("d1", true),
            "is_playing": true,
            "shuffle_state": false,
            "repeat_state": "off",
            "progress_ms": 42000,
            "item": track_json("t1"),
            "context": null,
            "currently_playing_type": "track"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(ScriptedTokens::default()));
    let state = client.playback_state().await.unwrap().unwrap();

    assert!(state.is_playing);
    assert_eq!(state.device.unwrap().id.as_deref(), Some("d1"));
    assert_eq!(state.item.unwrap().id.as_deref(), Some("t1"));
}

#[tokio::test]
async fn test_devices_and_transfer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me/player/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "devices": [device_json("d1", false), device_json("d2", true)]
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/me/player"))
        .and(body_json(json!({"device_ids": ["d1"], "play": true})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(ScriptedTokens::default()));

    let devices = client.devices().await.unwrap();
    assert_eq!(devices.len(), 2);
    assert!(devices[1].is_active);

    client.transfer_playback("d1", true).await.unwrap();
}

#[tokio::test]
async fn test_transport_commands() {
    let server = MockServer::start().await;
    for (verb, route) in [
        ("PUT", "/me/player/pause"),
        ("POST", "/me/player/next"),
        ("POST", "/me/player/previous"),
        ("PUT", "/me/player/play"),
    ] {
        Mock::given(method(verb))
            .and(path(route))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
    }

    let client = client_for(&server, Arc::new(ScriptedTokens::default()));

    client.pause().await.unwrap();
    client.next().await.unwrap();
    client.previous().await.unwrap();
    client
        .play(&cadenza_api::PlayRequest::resume())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_premium_required_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/me/player/next"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {
                "status": 403,
                "message": "Player command failed: Premium required",
                "reason": "PREMIUM_REQUIRED"
            }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(ScriptedTokens::default()));
    let err = client.next().await.unwrap_err();

    assert!(err.is_premium_required());
    assert_eq!(err.user_message(), "This action requires a Spotify Premium account.");
}
