// ABOUTME: Playback state and transport control operations
// ABOUTME: Most of these need an active device and a Premium account

use reqwest::Method;
use serde_json::json;
use tracing::{debug, info};

use crate::{
    client::SpotifyClient,
    error::{ApiError, ApiResult},
    models::{Device, DeviceList, PlayRequest, PlaybackState},
};

impl SpotifyClient {
    /// Current playback, or `None` when nothing is playing on any device
    pub async fn playback_state(&self) -> ApiResult<Option<PlaybackState>> {
        let state: Option<PlaybackState> = self.get_optional("/me/player", &[]).await?;
        if state.is_none() {
            debug!("No playback session");
        }
        Ok(state)
    }

    /// Start or resume playback
    pub async fn play(&self, request: &PlayRequest) -> ApiResult<()> {
        let query = device_query(request.device_id.as_deref());
        let body = if request.is_resume() {
            None
        } else {
            Some(serde_json::to_value(request).map_err(|e| {
                ApiError::InvalidInput(format!("Failed to encode play request: {}", e))
            })?)
        };

        self.command(Method::PUT, "/me/player/play", &query, body.as_ref())
            .await?;
        info!("Playback started");
        Ok(())
    }

    pub async fn pause(&self) -> ApiResult<()> {
        self.command(Method::PUT, "/me/player/pause", &[], None).await
    }

    pub async fn next(&self) -> ApiResult<()> {
        self.command(Method::POST, "/me/player/next", &[], None).await
    }

    pub async fn previous(&self) -> ApiResult<()> {
        self.command(Method::POST, "/me/player/previous", &[], None)
            .await
    }

    /// Devices currently available for playback
    pub async fn devices(&self) -> ApiResult<Vec<Device>> {
        let list: Option<DeviceList> = self.get_optional("/me/player/devices", &[]).await?;
        Ok(list.map(|list| list.devices).unwrap_or_default())
    }

    /// Move playback to `device_id`, optionally starting it there
    pub async fn transfer_playback(&self, device_id: &str, play: bool) -> ApiResult<()> {
        let body = json!({
            "device_ids": [device_id],
            "play": play,
        });
        self.command(Method::PUT, "/me/player", &[], Some(&body))
            .await?;
        info!("Transferred playback to device {}", device_id);
        Ok(())
    }
}

fn device_query(device_id: Option<&str>) -> Vec<(&'static str, String)> {
    device_id
        .map(|id| vec![("device_id", id.to_string())])
        .unwrap_or_default()
}
