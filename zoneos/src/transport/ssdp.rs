use std::io::{Error, ErrorKind};
use std::net::UdpSocket;
use std::time::Duration;

const MULTICAST_ADDR: &str = "239.255.255.250:1900";

/// Search target advertised by Sonos zone players
pub const ZONE_PLAYER_URN: &str = "urn:schemas-upnp-org:device:ZonePlayer:1";

#[derive(Debug, Clone, PartialEq)]
pub struct SsdpResponse {
  pub location: String,
  pub urn: String,
  pub usn: String,
  pub server: Option<String>,
}

impl SsdpResponse {
  /// Whether the response most likely came from a Sonos zone player
  pub fn is_likely_sonos(&self) -> bool {
    self.urn.contains("ZonePlayer")
      || self.usn.contains("RINCON_")
      || self
        .server
        .as_ref()
        .is_some_and(|server| server.to_lowercase().contains("sonos"))
      || self.location.contains(":1400/xml/device_description.xml")
  }
}

pub struct SsdpClient {
  socket: UdpSocket,
}

impl SsdpClient {
  /// Bind a socket whose reads give up after `timeout`
  pub fn new(timeout: Duration) -> Result<Self, Error> {
    let socket = UdpSocket::bind("0.0.0.0:0")?;
    socket.set_read_timeout(Some(timeout))?;
    socket.set_multicast_loop_v4(true)?;

    Ok(Self { socket })
  }

  /// Send an M-SEARCH and iterate the responses until the read timeout expires
  pub fn search(&self, search_target: &str) -> Result<SsdpResponseIterator<'_>, Error> {
    let request = format!(
      "M-SEARCH * HTTP/1.1\r\n\
        HOST: {}\r\n\
        MAN: \"ssdp:discover\"\r\n\
        MX: 2\r\n\
        ST: {}\r\n\
        USER-AGENT: zoneos/1.0 UPnP/1.0\r\n\
        \r\n",
      MULTICAST_ADDR, search_target
    );

    self.socket.send_to(request.as_bytes(), MULTICAST_ADDR)?;

    Ok(SsdpResponseIterator {
      socket: &self.socket,
      buffer: [0; 2048],
      finished: false,
    })
  }
}

pub struct SsdpResponseIterator<'a> {
  socket: &'a UdpSocket,
  buffer: [u8; 2048],
  finished: bool,
}

impl Iterator for SsdpResponseIterator<'_> {
  type Item = Result<SsdpResponse, Error>;

  fn next(&mut self) -> Option<Self::Item> {
    while !self.finished {
      match self.socket.recv_from(&mut self.buffer) {
        Ok((size, _)) => {
          // Unparseable datagrams from other UPnP devices are skipped
          let parsed = std::str::from_utf8(&self.buffer[..size])
            .ok()
            .and_then(parse_ssdp_response);
          if let Some(response) = parsed {
            return Some(Ok(response));
          }
        }
        Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
          self.finished = true;
        }
        Err(e) => return Some(Err(e)),
      }
    }
    None
  }
}

fn parse_ssdp_response(response: &str) -> Option<SsdpResponse> {
  let mut location = None;
  let mut urn = None;
  let mut usn = None;
  let mut server = None;

  for line in response.lines() {
    let line = line.trim();

    if let Some(value) = extract_header_value(line, "LOCATION:") {
      location = Some(value);
    } else if let Some(value) = extract_header_value(line, "ST:") {
      urn = Some(value);
    } else if let Some(value) = extract_header_value(line, "USN:") {
      usn = Some(value);
    } else if let Some(value) = extract_header_value(line, "SERVER:") {
      server = Some(value);
    }
  }

  Some(SsdpResponse {
    location: location?,
    urn: urn?,
    usn: usn?,
    server,
  })
}

fn extract_header_value(line: &str, header: &str) -> Option<String> {
  let prefix = line.get(..header.len())?;
  if prefix.eq_ignore_ascii_case(header) {
    Some(line[header.len()..].trim().to_string())
  } else {
    None
  }
}
