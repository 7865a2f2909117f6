//! ISO 15118-20 AC messages (payload type 0x8003)

use serde::{Deserialize, Serialize};

use super::datatypes::{DisplayParameters, EvseStatus, Header, ResponseCode};
use super::RationalNumber;

// ===== Charge parameter discovery =====

/// EV transfer limits; the discharge fields are only present for BPT
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcCpdRequestParams {
    pub max_charge_power: RationalNumber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_charge_power_l2: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_charge_power_l3: Option<RationalNumber>,
    pub min_charge_power: RationalNumber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_discharge_power: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_discharge_power: Option<RationalNumber>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcCpdRequestMode {
    #[serde(rename = "AC_CPDReqEnergyTransferMode")]
    Ac(AcCpdRequestParams),
    #[serde(rename = "BPT_AC_CPDReqEnergyTransferMode")]
    BptAc(AcCpdRequestParams),
}

impl Default for AcCpdRequestMode {
    fn default() -> Self {
        Self::Ac(AcCpdRequestParams::default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcChargeParameterDiscoveryRequest {
    pub header: Header,
    pub transfer_mode: AcCpdRequestMode,
}

/// EVSE transfer limits; the discharge fields are only present for BPT
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcCpdResponseParams {
    pub max_charge_power: RationalNumber,
    pub min_charge_power: RationalNumber,
    pub nominal_frequency: RationalNumber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_power_asymmetry: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_ramp_limit: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub present_active_power: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_discharge_power: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_discharge_power: Option<RationalNumber>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcCpdResponseMode {
    #[serde(rename = "AC_CPDResEnergyTransferMode")]
    Ac(AcCpdResponseParams),
    #[serde(rename = "BPT_AC_CPDResEnergyTransferMode")]
    BptAc(AcCpdResponseParams),
}

impl Default for AcCpdResponseMode {
    fn default() -> Self {
        Self::Ac(AcCpdResponseParams::default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcChargeParameterDiscoveryResponse {
    pub header: Header,
    pub response_code: ResponseCode,
    pub transfer_mode: AcCpdResponseMode,
}

// ===== Charge loop =====

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledAcLoopRequest {
    pub present_active_power: RationalNumber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_energy_request: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_charge_power: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_charge_power: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_discharge_power: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_discharge_power: Option<RationalNumber>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicAcLoopRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_time: Option<u32>,
    pub target_energy_request: RationalNumber,
    pub max_energy_request: RationalNumber,
    pub min_energy_request: RationalNumber,
    pub max_charge_power: RationalNumber,
    pub min_charge_power: RationalNumber,
    pub present_active_power: RationalNumber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub present_reactive_power: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_discharge_power: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_discharge_power: Option<RationalNumber>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcChargeLoopRequestMode {
    Scheduled(ScheduledAcLoopRequest),
    BptScheduled(ScheduledAcLoopRequest),
    Dynamic(DynamicAcLoopRequest),
    BptDynamic(DynamicAcLoopRequest),
}

impl Default for AcChargeLoopRequestMode {
    fn default() -> Self {
        Self::Scheduled(ScheduledAcLoopRequest::default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcChargeLoopRequest {
    pub header: Header,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_parameters: Option<DisplayParameters>,
    pub meter_info_requested: bool,
    pub control_mode: AcChargeLoopRequestMode,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledAcLoopResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_active_power: Option<RationalNumber>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicAcLoopResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_soc: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_soc: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ack_max_delay: Option<u16>,
    pub target_active_power: RationalNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcChargeLoopResponseMode {
    Scheduled(ScheduledAcLoopResponse),
    BptScheduled(ScheduledAcLoopResponse),
    Dynamic(DynamicAcLoopResponse),
    BptDynamic(DynamicAcLoopResponse),
}

impl Default for AcChargeLoopResponseMode {
    fn default() -> Self {
        Self::Scheduled(ScheduledAcLoopResponse::default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcChargeLoopResponse {
    pub header: Header,
    pub response_code: ResponseCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EvseStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_frequency: Option<RationalNumber>,
    pub control_mode: AcChargeLoopResponseMode,
}
