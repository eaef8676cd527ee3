use std::time::Duration;

use log::debug;

use crate::error::{Result, SonosError};

/// UPnP services used by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
  AVTransport,
  RenderingControl,
  ZoneGroupTopology,
  ContentDirectory,
}

impl Service {
  pub fn service_type(&self) -> &'static str {
    match self {
      Service::AVTransport => "urn:schemas-upnp-org:service:AVTransport:1",
      Service::RenderingControl => "urn:schemas-upnp-org:service:RenderingControl:1",
      Service::ZoneGroupTopology => "urn:schemas-upnp-org:service:ZoneGroupTopology:1",
      Service::ContentDirectory => "urn:schemas-upnp-org:service:ContentDirectory:1",
    }
  }

  pub fn control_path(&self) -> &'static str {
    match self {
      Service::AVTransport => "/MediaRenderer/AVTransport/Control",
      Service::RenderingControl => "/MediaRenderer/RenderingControl/Control",
      Service::ZoneGroupTopology => "/ZoneGroupTopology/Control",
      Service::ContentDirectory => "/MediaServer/ContentDirectory/Control",
    }
  }
}

pub struct SoapResponse {
  pub body: String,
}

impl SoapResponse {
  /// Text of the first `<tag>` element in the body
  pub fn value(&self, tag: &str) -> Result<String> {
    SoapClient::extract_xml_value(&self.body, tag)
      .ok_or_else(|| SonosError::ParseError(format!("missing {} element", tag)))
  }
}

#[derive(Debug, Clone)]
pub struct SoapClient {
  http_client: reqwest::blocking::Client,
}

impl SoapClient {
  pub fn new(timeout: Duration) -> Result<Self> {
    let http_client = reqwest::blocking::Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| SonosError::CommunicationError(e.to_string()))?;

    Ok(Self { http_client })
  }

  pub fn call(
    &self,
    device_url: &str,
    service: Service,
    action: &str,
    params: &[(&str, &str)],
  ) -> Result<SoapResponse> {
    let url = format!("{}{}", device_url, service.control_path());
    let body = Self::build_soap_envelope(service, action, params);

    debug!("SOAP {} -> {}", action, url);

    let response = self
      .http_client
      .post(&url)
      .header("Content-Type", "text/xml; charset=\"utf-8\"")
      .header(
        "SOAPACTION",
        format!("\"{}#{}\"", service.service_type(), action),
      )
      .body(body)
      .send()
      .map_err(|e| SonosError::CommunicationError(e.to_string()))?;

    let status = response.status();
    let response_body = response
      .text()
      .map_err(|e| SonosError::CommunicationError(e.to_string()))?;

    if response_body.contains("faultstring") {
      return Err(SonosError::SoapFault(Self::extract_fault(&response_body)));
    }

    if !status.is_success() {
      return Err(SonosError::CommunicationError(format!(
        "{} returned HTTP {}",
        action, status
      )));
    }

    Ok(SoapResponse { body: response_body })
  }

  fn build_soap_envelope(service: Service, action: &str, params: &[(&str, &str)]) -> String {
    let mut params_xml = String::new();
    for (key, value) in params {
      params_xml.push_str(&format!(
        "<{}>{}</{}>",
        key,
        html_escape::encode_text(value),
        key
      ));
    }

    format!(
      "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
        <s:Envelope xmlns:s=\"http://schemas.xmlsoap.org/soap/envelope/\" \
        s:encodingStyle=\"http://schemas.xmlsoap.org/soap/encoding/\">\n\
        <s:Body>\n\
        <u:{} xmlns:u=\"{}\">{}</u:{}>\n\
        </s:Body>\n\
        </s:Envelope>",
      action,
      service.service_type(),
      params_xml,
      action
    )
  }

  /// Fault string, with the UPnP error code appended when the device sends one
  fn extract_fault(xml: &str) -> String {
    let fault = Self::extract_xml_value(xml, "faultstring")
      .unwrap_or_else(|| "Unknown SOAP fault".to_string());

    match Self::extract_xml_value(xml, "errorCode") {
      Some(code) => format!("{} (UPnP error {})", fault, code.trim()),
      None => fault,
    }
  }

  pub fn extract_xml_value(xml: &str, tag: &str) -> Option<String> {
    let start_tag = format!("<{}>", tag);
    let end_tag = format!("</{}>", tag);

    xml.find(&start_tag).and_then(|start| {
      let content_start = start + start_tag.len();
      xml[content_start..]
        .find(&end_tag)
        .map(|end| xml[content_start..content_start + end].to_string())
    })
  }
}
