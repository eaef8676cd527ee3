use std::collections::BTreeSet;
use std::sync::Arc;

use log::debug;

use super::{Device, DeviceHandle, GroupSnapshot, SpeakerDirectory};
use crate::error::{Result, SonosError};
use crate::models::{Favorite, Speaker, SpeakerId, TrackInfo, TransportState};
use crate::transport::device::extract_ip_from_url;
use crate::transport::soap::{Service, SoapClient, SoapResponse};
use crate::xml::{self, ZoneGroup};

const INSTANCE: (&str, &str) = ("InstanceID", "0");

/// Favorites containers browsed on the ContentDirectory service
const SONOS_FAVORITES: &str = "FV:2";
const RADIO_STATIONS: &str = "R:0/0";

/// SOAP-backed Sonos zone player
#[derive(Debug, Clone)]
pub struct SonosDevice {
  speaker: Speaker,
  base_url: String,
  soap: SoapClient,
}

impl SonosDevice {
  pub fn new(speaker: Speaker, soap: SoapClient) -> Self {
    let base_url = speaker.base_url();
    Self {
      speaker,
      base_url,
      soap,
    }
  }

  /// Build a directory of SOAP devices sharing one HTTP client
  pub fn directory(speakers: Vec<Speaker>, soap: &SoapClient) -> SpeakerDirectory {
    speakers
      .into_iter()
      .map(|speaker| Arc::new(SonosDevice::new(speaker, soap.clone())) as DeviceHandle)
      .collect()
  }

  pub fn speaker(&self) -> &Speaker {
    &self.speaker
  }

  fn call(&self, service: Service, action: &str, params: &[(&str, &str)]) -> Result<SoapResponse> {
    debug!("{}: {}", self.speaker.name, action);
    self.soap.call(&self.base_url, service, action, params)
  }

  fn transport_action(&self, action: &str) -> Result<()> {
    self.call(Service::AVTransport, action, &[INSTANCE]).map(|_| ())
  }

  fn set_transport_uri(&self, uri: &str, metadata: &str) -> Result<()> {
    self
      .call(
        Service::AVTransport,
        "SetAVTransportURI",
        &[INSTANCE, ("CurrentURI", uri), ("CurrentURIMetaData", metadata)],
      )
      .map(|_| ())
  }

  /// Build the snapshot for the zone group containing this speaker
  fn snapshot_from_groups(&self, groups: &[ZoneGroup]) -> Result<GroupSnapshot> {
    let group = groups
      .iter()
      .find(|group| group.contains(&self.speaker.id))
      .ok_or_else(|| {
        SonosError::InvalidState(format!("{} is not in any zone group", self.speaker.name))
      })?;

    let coordinator: DeviceHandle = if group.coordinator == self.speaker.id {
      Arc::new(self.clone())
    } else {
      let member = group.coordinator_member().ok_or_else(|| {
        SonosError::InvalidState(format!("coordinator {} is not a visible member", group.coordinator))
      })?;
      let ip_address = extract_ip_from_url(&member.location).ok_or_else(|| {
        SonosError::ParseError(format!("invalid coordinator location: {}", member.location))
      })?;

      let speaker = Speaker {
        id: member.id.clone(),
        name: member.name.clone(),
        model_name: String::new(),
        ip_address,
        port: self.speaker.port,
      };
      Arc::new(SonosDevice::new(speaker, self.soap.clone()))
    };

    Ok(GroupSnapshot {
      coordinator,
      members: group.members.iter().map(|member| member.name.clone()).collect::<BTreeSet<_>>(),
    })
  }

  fn browse(&self, object_id: &str) -> Result<Vec<Favorite>> {
    let response = self.call(
      Service::ContentDirectory,
      "Browse",
      &[
        ("ObjectID", object_id),
        ("BrowseFlag", "BrowseDirectChildren"),
        ("Filter", "*"),
        ("StartingIndex", "0"),
        ("RequestedCount", "100"),
        ("SortCriteria", ""),
      ],
    )?;

    let result = response.value("Result")?;
    xml::parse_favorites(&html_escape::decode_html_entities(&result))
  }

  /// Album art paths like `/getaa?...` are served by the speaker itself
  fn absolute_url(&self, uri: &str) -> String {
    if uri.starts_with('/') {
      format!("{}{}", self.base_url, uri)
    } else {
      uri.to_string()
    }
  }
}

impl Device for SonosDevice {
  fn name(&self) -> &str {
    &self.speaker.name
  }

  fn id(&self) -> &SpeakerId {
    &self.speaker.id
  }

  fn join(&self, coordinator: &dyn Device) -> Result<()> {
    self.set_transport_uri(&format!("x-rincon:{}", coordinator.id()), "")
  }

  fn unjoin(&self) -> Result<()> {
    self.transport_action("BecomeCoordinatorOfStandaloneGroup")
  }

  fn transport_state(&self) -> Result<TransportState> {
    let response = self.call(Service::AVTransport, "GetTransportInfo", &[INSTANCE])?;
    Ok(TransportState::from_transport_state(&response.value("CurrentTransportState")?))
  }

  fn group_snapshot(&self) -> Result<GroupSnapshot> {
    let response = self.call(Service::ZoneGroupTopology, "GetZoneGroupState", &[])?;
    let groups = xml::parse_zone_group_state(&response.value("ZoneGroupState")?)?;
    self.snapshot_from_groups(&groups)
  }

  fn play(&self) -> Result<()> {
    self
      .call(Service::AVTransport, "Play", &[INSTANCE, ("Speed", "1")])
      .map(|_| ())
  }

  fn pause(&self) -> Result<()> {
    self.transport_action("Pause")
  }

  fn stop(&self) -> Result<()> {
    self.transport_action("Stop")
  }

  fn next(&self) -> Result<()> {
    self.transport_action("Next")
  }

  fn previous(&self) -> Result<()> {
    self.transport_action("Previous")
  }

  fn play_uri(&self, uri: &str, metadata: &str) -> Result<()> {
    self.set_transport_uri(uri, metadata)?;
    self.play()
  }

  fn volume(&self) -> Result<u8> {
    let response = self.call(
      Service::RenderingControl,
      "GetVolume",
      &[INSTANCE, ("Channel", "Master")],
    )?;

    response
      .value("CurrentVolume")?
      .trim()
      .parse()
      .map_err(|e| SonosError::ParseError(format!("Failed to parse CurrentVolume: {}", e)))
  }

  fn set_volume(&self, volume: u8) -> Result<()> {
    let volume = volume.to_string();
    self
      .call(
        Service::RenderingControl,
        "SetVolume",
        &[INSTANCE, ("Channel", "Master"), ("DesiredVolume", &volume)],
      )
      .map(|_| ())
  }

  fn track_info(&self) -> Result<TrackInfo> {
    let response = self.call(Service::AVTransport, "GetPositionInfo", &[INSTANCE])?;
    let metadata = response.value("TrackMetaData").unwrap_or_default();
    let track = xml::parse_track_metadata(&html_escape::decode_html_entities(&metadata))?;

    Ok(TrackInfo {
      title: track.title.unwrap_or_default(),
      artist: track.artist.unwrap_or_default(),
      album: track.album.unwrap_or_default(),
      album_art: track
        .album_art_uri
        .map(|uri| self.absolute_url(&uri))
        .unwrap_or_default(),
      uri: html_escape::decode_html_entities(&response.value("TrackURI").unwrap_or_default())
        .into_owned(),
    })
  }

  fn favorites(&self) -> Result<Vec<Favorite>> {
    let mut favorites = self.browse(SONOS_FAVORITES)?;
    favorites.extend(self.browse(RADIO_STATIONS)?);
    Ok(favorites)
  }
}
