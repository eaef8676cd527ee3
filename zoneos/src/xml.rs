//! Parsing for the XML payloads the device layer consumes: zone group state,
//! DIDL-Lite track metadata and DIDL-Lite favorites listings.

use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};
use serde::Deserialize;
use std::io::Cursor;

use crate::error::{Result, SonosError};
use crate::models::{Favorite, SpeakerId};

/// One zone group as reported by `GetZoneGroupState`
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneGroup {
  pub coordinator: SpeakerId,
  pub members: Vec<ZoneMember>,
}

impl ZoneGroup {
  pub fn contains(&self, id: &SpeakerId) -> bool {
    self.members.iter().any(|member| &member.id == id)
  }

  pub fn coordinator_member(&self) -> Option<&ZoneMember> {
    self.members.iter().find(|member| member.id == self.coordinator)
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZoneMember {
  pub id: SpeakerId,
  pub name: String,
  pub location: String,
}

/// Track fields read from a DIDL-Lite item
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackMetadata {
  pub title: Option<String>,
  pub artist: Option<String>,
  pub album: Option<String>,
  pub album_art_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ZoneGroupsXml {
  #[serde(rename = "ZoneGroup", default)]
  zone_groups: Vec<ZoneGroupXml>,
}

#[derive(Debug, Deserialize)]
struct ZoneGroupXml {
  #[serde(rename = "@Coordinator")]
  coordinator: String,
  #[serde(rename = "ZoneGroupMember", default)]
  members: Vec<ZoneGroupMemberXml>,
}

#[derive(Debug, Deserialize)]
struct ZoneGroupMemberXml {
  #[serde(rename = "@UUID")]
  uuid: String,
  #[serde(rename = "@Location", default)]
  location: String,
  #[serde(rename = "@ZoneName", default)]
  zone_name: String,
  #[serde(rename = "@Invisible", default)]
  invisible: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DidlLite {
  #[serde(rename = "item", default)]
  items: Vec<DidlItem>,
}

#[derive(Debug, Deserialize)]
struct DidlItem {
  #[serde(default)]
  title: Option<String>,
  #[serde(default)]
  creator: Option<String>,
  #[serde(default)]
  album: Option<String>,
  #[serde(rename = "albumArtURI", default)]
  album_art_uri: Option<String>,
  #[serde(default)]
  res: Vec<DidlResource>,
  #[serde(rename = "resMD", default)]
  res_md: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DidlResource {
  #[serde(rename = "$text", default)]
  uri: String,
}

/// Parse the `ZoneGroupState` value of a `GetZoneGroupState` response
///
/// Accepts both the entity-encoded form found in the SOAP body and decoded XML.
/// Invisible members (bonded satellites and subs) are left out.
pub fn parse_zone_group_state(xml: &str) -> Result<Vec<ZoneGroup>> {
  let decoded = html_escape::decode_html_entities(xml);

  let start = decoded
    .find("<ZoneGroups")
    .ok_or_else(|| SonosError::ParseError("no ZoneGroups element".to_string()))?;
  let end_tag = "</ZoneGroups>";
  let zone_groups_xml = match decoded[start..].find(end_tag) {
    Some(end) => &decoded[start..start + end + end_tag.len()],
    // <ZoneGroups/> on a system with no groups
    None => return Ok(Vec::new()),
  };

  let parsed: ZoneGroupsXml = quick_xml::de::from_str(zone_groups_xml)
    .map_err(|e| SonosError::ParseError(format!("Failed to parse zone groups: {}", e)))?;

  Ok(parsed
    .zone_groups
    .into_iter()
    .map(|group| ZoneGroup {
      coordinator: SpeakerId::new(&group.coordinator),
      members: group
        .members
        .into_iter()
        .filter(|member| member.invisible.as_deref() != Some("1"))
        .map(|member| ZoneMember {
          id: SpeakerId::new(&member.uuid),
          name: member.zone_name,
          location: member.location,
        })
        .collect(),
    })
    .collect())
}

/// Parse the first item of a DIDL-Lite document into track fields
pub fn parse_track_metadata(didl: &str) -> Result<TrackMetadata> {
  if didl.trim().is_empty() || didl == "NOT_IMPLEMENTED" {
    return Ok(TrackMetadata::default());
  }

  let didl = parse_didl(didl)?;
  Ok(didl
    .items
    .into_iter()
    .next()
    .map(|item| TrackMetadata {
      title: item.title,
      artist: item.creator,
      album: item.album,
      album_art_uri: item.album_art_uri,
    })
    .unwrap_or_default())
}

/// Parse a DIDL-Lite favorites listing from a ContentDirectory `Browse` result
pub fn parse_favorites(didl: &str) -> Result<Vec<Favorite>> {
  if didl.trim().is_empty() {
    return Ok(Vec::new());
  }

  let didl = parse_didl(didl)?;
  Ok(didl
    .items
    .into_iter()
    .filter_map(|item| {
      let title = item.title?;
      let uri = item.res.into_iter().next().map(|res| res.uri).unwrap_or_default();
      Some(Favorite {
        title,
        uri,
        metadata: item.res_md.unwrap_or_default(),
        album_art: item.album_art_uri,
      })
    })
    .collect())
}

fn parse_didl(didl: &str) -> Result<DidlLite> {
  let cleaned = strip_namespaces(didl)?;
  quick_xml::de::from_str(&cleaned)
    .map_err(|e| SonosError::ParseError(format!("Failed to parse DIDL-Lite: {}", e)))
}

/// Rewrite a document with namespace prefixes and declarations removed
///
/// DIDL-Lite mixes `dc:`, `upnp:` and `r:` prefixes; serde field names match
/// on local names only after this pass.
fn strip_namespaces(xml: &str) -> Result<String> {
  let mut reader = Reader::from_str(xml);
  reader.config_mut().trim_text(true);

  let mut writer = Writer::new(Cursor::new(Vec::new()));
  let parse_error = |e: &dyn std::fmt::Display| SonosError::ParseError(e.to_string());

  loop {
    let event = match reader.read_event().map_err(|e| parse_error(&e))? {
      Event::Start(e) => Event::Start(local_element(&e)?),
      Event::Empty(e) => Event::Empty(local_element(&e)?),
      Event::End(e) => {
        let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
        Event::End(BytesEnd::new(name))
      }
      Event::Eof => break,
      event => event,
    };
    writer.write_event(event).map_err(|e| parse_error(&e))?;
  }

  String::from_utf8(writer.into_inner().into_inner()).map_err(|e| parse_error(&e))
}

fn local_element(source: &BytesStart) -> Result<BytesStart<'static>> {
  let name = String::from_utf8_lossy(source.local_name().as_ref()).into_owned();
  let mut element = BytesStart::new(name);

  for attribute in source.attributes() {
    let attribute = attribute.map_err(|e| SonosError::ParseError(e.to_string()))?;
    let key = attribute.key;
    if key.as_ref() == b"xmlns" || key.as_ref().starts_with(b"xmlns:") {
      continue;
    }

    let local_key = key.local_name();
    element.push_attribute(Attribute {
      key: QName(local_key.as_ref()),
      value: attribute.value.clone(),
    });
  }

  Ok(element)
}
