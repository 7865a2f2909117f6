//! SupportedAppProtocol handshake (ISO 15118-2 / -20 common)

use serde::{Deserialize, Serialize};

/// Namespace of ISO 15118-20 DC messages
pub const ISO20_DC_NAMESPACE: &str = "urn:iso:std:iso:15118:-20:DC";
/// Namespace of ISO 15118-20 AC messages
pub const ISO20_AC_NAMESPACE: &str = "urn:iso:std:iso:15118:-20:AC";

/// Protocol offered by the EV
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppProtocol {
    pub protocol_namespace: String,
    pub version_major: u32,
    pub version_minor: u32,
    pub schema_id: u8,
    /// 1 is the highest priority
    pub priority: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedAppProtocolRequest {
    pub app_protocols: Vec<AppProtocol>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SapResponseCode {
    #[serde(rename = "OK_SuccessfulNegotiation")]
    SuccessfulNegotiation,
    #[serde(rename = "OK_SuccessfulNegotiationWithMinorDeviation")]
    SuccessfulNegotiationWithMinorDeviation,
    #[default]
    #[serde(rename = "Failed_NoNegotiation")]
    FailedNoNegotiation,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedAppProtocolResponse {
    pub response_code: SapResponseCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_id: Option<u8>,
}
