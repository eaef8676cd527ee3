use super::device::{extract_ip_from_url, DeviceDescription};
use super::ssdp::{SsdpClient, ZONE_PLAYER_URN};
use crate::error::{Result, SonosError};
use crate::models::Speaker;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::time::Duration;

/// Discovery service for finding Sonos speakers on the network
pub struct Discovery {
    timeout: Duration,
}

impl Discovery {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Discover all Sonos speakers on the network, in response order
    pub fn discover_speakers(&self) -> Result<Vec<Speaker>> {
        info!("Discovering Sonos speakers...");

        let client = SsdpClient::new(self.timeout).map_err(|e| {
            SonosError::DiscoveryFailed(format!("Failed to create SSDP client: {}", e))
        })?;

        let responses = client
            .search(ZONE_PLAYER_URN)
            .map_err(|e| SonosError::DiscoveryFailed(format!("SSDP search failed: {}", e)))?;

        let http_client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| {
                SonosError::CommunicationError(format!("Failed to create HTTP client: {}", e))
            })?;

        let mut speakers: Vec<Speaker> = Vec::new();
        let mut seen_locations = HashSet::new();

        for response in responses {
            let response = match response {
                Ok(response) => response,
                Err(e) => {
                    debug!("Skipping SSDP response: {}", e);
                    continue;
                }
            };

            if !seen_locations.insert(response.location.clone()) || !response.is_likely_sonos() {
                continue;
            }

            let Some(ip) = extract_ip_from_url(&response.location) else {
                continue;
            };

            match Self::fetch_device_info(&http_client, &response.location, ip) {
                // Satellites and bonded subs share their zone name with the main player
                Ok(speaker) if speakers.iter().any(|s| s.name == speaker.name) => {
                    debug!("Skipping duplicate zone {} at {}", speaker.name, speaker.ip_address);
                }
                Ok(speaker) => {
                    info!("Found speaker: {}", speaker.name);
                    speakers.push(speaker);
                }
                Err(e) => debug!("Ignoring device at {}: {}", response.location, e),
            }
        }

        if speakers.is_empty() {
            warn!("No Sonos speakers found on the network");
        }

        Ok(speakers)
    }

    fn fetch_device_info(
        client: &reqwest::blocking::Client,
        location: &str,
        ip_address: String,
    ) -> Result<Speaker> {
        let response = client
            .get(location)
            .send()
            .map_err(|e| SonosError::CommunicationError(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(SonosError::CommunicationError(format!(
                "HTTP request failed with status: {}",
                response.status()
            )));
        }

        let xml = response.text().map_err(|e| {
            SonosError::CommunicationError(format!("Failed to read response body: {}", e))
        })?;

        let device = DeviceDescription::from_xml(&xml)?;

        if !device.is_sonos_speaker() {
            return Err(SonosError::DeviceNotFound(format!(
                "Device at {} is not a Sonos speaker",
                ip_address
            )));
        }

        Ok(device.to_speaker(ip_address))
    }
}

/// Speaker discovery with a custom timeout
pub fn discover_speakers_with_timeout(timeout: Duration) -> Result<Vec<Speaker>> {
    Discovery::new(timeout).discover_speakers()
}
