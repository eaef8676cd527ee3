use crate::error::{Result, SonosError};
use crate::models::{Speaker, SpeakerId};
use serde::Deserialize;

/// UPnP device description root element
#[derive(Debug, Deserialize)]
struct Root {
  device: DeviceDescription,
}

/// Device description served at `/xml/device_description.xml`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescription {
  pub device_type: String,
  pub friendly_name: String,
  pub manufacturer: String,
  pub model_name: String,
  #[serde(rename = "UDN")]
  pub udn: String,
  pub room_name: Option<String>,
}

impl DeviceDescription {
  pub fn from_xml(xml: &str) -> Result<Self> {
    let root: Root = quick_xml::de::from_str(xml)
      .map_err(|e| SonosError::ParseError(format!("Failed to parse device XML: {}", e)))?;

    Ok(root.device)
  }

  /// Speakers are addressed by zone (room) name, falling back to the friendly name
  pub fn to_speaker(&self, ip_address: String) -> Speaker {
    Speaker {
      id: SpeakerId::new(&self.udn),
      name: self
        .room_name
        .clone()
        .unwrap_or_else(|| self.friendly_name.clone()),
      model_name: self.model_name.clone(),
      ip_address,
      port: 1400,
    }
  }

  pub fn is_sonos_speaker(&self) -> bool {
    self.manufacturer.to_lowercase().contains("sonos")
      || self.device_type.contains("ZonePlayer")
  }
}

/// Extract the host from a URL like `http://192.168.1.100:1400/xml/...`
pub fn extract_ip_from_url(url: &str) -> Option<String> {
  url.split("//")
    .nth(1)?
    .split(['/', ':'])
    .next()
    .filter(|host| !host.is_empty())
    .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  const SONOS_ONE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
    <root xmlns="urn:schemas-upnp-org:device-1-0">
      <specVersion><major>1</major><minor>0</minor></specVersion>
      <device>
        <deviceType>urn:schemas-upnp-org:device:ZonePlayer:1</deviceType>
        <friendlyName>192.168.1.100 - Sonos One - RINCON_000E58A0123456</friendlyName>
        <manufacturer>Sonos, Inc.</manufacturer>
        <modelName>Sonos One</modelName>
        <UDN>uuid:RINCON_000E58A0123456</UDN>
        <roomName>Living Room</roomName>
      </device>
    </root>"#;

  const ROUTER: &str = r#"<?xml version="1.0"?>
    <root xmlns="urn:schemas-upnp-org:device-1-0">
      <device>
        <deviceType>urn:schemas-upnp-org:device:InternetGatewayDevice:1</deviceType>
        <friendlyName>Home Router</friendlyName>
        <manufacturer>Netgear</manufacturer>
        <modelName>R7000</modelName>
        <UDN>uuid:12345678-1234-1234-1234-123456789012</UDN>
      </device>
    </root>"#;

  #[test]
  fn test_extract_ip_from_url() {
    assert_eq!(
      extract_ip_from_url("http://192.168.1.100:1400/xml/device_description.xml"),
      Some("192.168.1.100".to_string())
    );
    assert_eq!(extract_ip_from_url("http://10.0.0.5/path"), Some("10.0.0.5".to_string()));
    assert_eq!(extract_ip_from_url("invalid-url"), None);
  }

  #[test]
  fn test_device_from_xml() {
    let device = DeviceDescription::from_xml(SONOS_ONE).unwrap();

    assert_eq!(device.manufacturer, "Sonos, Inc.");
    assert_eq!(device.model_name, "Sonos One");
    assert_eq!(device.room_name, Some("Living Room".to_string()));
    assert!(device.is_sonos_speaker());

    let speaker = device.to_speaker("192.168.1.100".to_string());
    assert_eq!(speaker.name, "Living Room");
    assert_eq!(speaker.id, SpeakerId::new("RINCON_000E58A0123456"));
    assert_eq!(speaker.port, 1400);
  }

  #[test]
  fn test_non_sonos_device_uses_friendly_name() {
    let device = DeviceDescription::from_xml(ROUTER).unwrap();
    assert!(!device.is_sonos_speaker());
    assert_eq!(device.to_speaker("192.168.1.1".to_string()).name, "Home Router");
  }

  #[test]
  fn test_invalid_xml() {
    assert!(DeviceDescription::from_xml("not valid xml").is_err());
  }
}
