//! ISO 15118-20 DC messages (payload type 0x8004)

use serde::{Deserialize, Serialize};

use super::datatypes::{DisplayParameters, EvseStatus, Header, Processing, ResponseCode};
use super::RationalNumber;

// ===== Charge parameter discovery =====

/// EV transfer limits; the discharge fields are only present for BPT
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DcCpdRequestParams {
    pub max_charge_power: RationalNumber,
    pub min_charge_power: RationalNumber,
    pub max_charge_current: RationalNumber,
    pub min_charge_current: RationalNumber,
    pub max_voltage: RationalNumber,
    pub min_voltage: RationalNumber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_soc: Option<i8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_discharge_power: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_discharge_power: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_discharge_current: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_discharge_current: Option<RationalNumber>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DcCpdRequestMode {
    #[serde(rename = "DC_CPDReqEnergyTransferMode")]
    Dc(DcCpdRequestParams),
    #[serde(rename = "BPT_DC_CPDReqEnergyTransferMode")]
    BptDc(DcCpdRequestParams),
}

impl Default for DcCpdRequestMode {
    fn default() -> Self {
        Self::Dc(DcCpdRequestParams::default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DcChargeParameterDiscoveryRequest {
    pub header: Header,
    pub transfer_mode: DcCpdRequestMode,
}

/// EVSE transfer limits; the discharge fields are only present for BPT
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DcCpdResponseParams {
    pub max_charge_power: RationalNumber,
    pub min_charge_power: RationalNumber,
    pub max_charge_current: RationalNumber,
    pub min_charge_current: RationalNumber,
    pub max_voltage: RationalNumber,
    pub min_voltage: RationalNumber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_ramp_limit: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_discharge_power: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_discharge_power: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_discharge_current: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_discharge_current: Option<RationalNumber>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DcCpdResponseMode {
    #[serde(rename = "DC_CPDResEnergyTransferMode")]
    Dc(DcCpdResponseParams),
    #[serde(rename = "BPT_DC_CPDResEnergyTransferMode")]
    BptDc(DcCpdResponseParams),
}

impl Default for DcCpdResponseMode {
    fn default() -> Self {
        Self::Dc(DcCpdResponseParams::default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DcChargeParameterDiscoveryResponse {
    pub header: Header,
    pub response_code: ResponseCode,
    pub transfer_mode: DcCpdResponseMode,
}

// ===== Cable check / pre-charge =====

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DcCableCheckRequest {
    pub header: Header,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DcCableCheckResponse {
    pub header: Header,
    pub response_code: ResponseCode,
    pub processing: Processing,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DcPreChargeRequest {
    pub header: Header,
    pub processing: Processing,
    pub present_voltage: RationalNumber,
    pub target_voltage: RationalNumber,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DcPreChargeResponse {
    pub header: Header,
    pub response_code: ResponseCode,
    pub present_voltage: RationalNumber,
}

// ===== Charge loop =====

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledDcLoopRequest {
    pub target_current: RationalNumber,
    pub target_voltage: RationalNumber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_charge_power: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_charge_power: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_charge_current: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_voltage: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_voltage: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_discharge_power: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_discharge_power: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_discharge_current: Option<RationalNumber>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicDcLoopRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_time: Option<u32>,
    pub target_energy_request: RationalNumber,
    pub max_energy_request: RationalNumber,
    pub min_energy_request: RationalNumber,
    pub max_charge_power: RationalNumber,
    pub min_charge_power: RationalNumber,
    pub max_charge_current: RationalNumber,
    pub max_voltage: RationalNumber,
    pub min_voltage: RationalNumber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_discharge_power: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_discharge_power: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_discharge_current: Option<RationalNumber>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DcChargeLoopRequestMode {
    Scheduled(ScheduledDcLoopRequest),
    BptScheduled(ScheduledDcLoopRequest),
    Dynamic(DynamicDcLoopRequest),
    BptDynamic(DynamicDcLoopRequest),
}

impl Default for DcChargeLoopRequestMode {
    fn default() -> Self {
        Self::Scheduled(ScheduledDcLoopRequest::default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DcChargeLoopRequest {
    pub header: Header,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_parameters: Option<DisplayParameters>,
    pub meter_info_requested: bool,
    pub present_voltage: RationalNumber,
    pub control_mode: DcChargeLoopRequestMode,
}

/// EVSE limits reported during the charge loop
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DcLoopLimits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_charge_power: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_charge_power: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_charge_current: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_voltage: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_discharge_power: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_discharge_power: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_discharge_current: Option<RationalNumber>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicDcLoopResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_soc: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_soc: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ack_max_delay: Option<u16>,
    pub limits: DcLoopLimits,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DcChargeLoopResponseMode {
    Scheduled(DcLoopLimits),
    BptScheduled(DcLoopLimits),
    Dynamic(DynamicDcLoopResponse),
    BptDynamic(DynamicDcLoopResponse),
}

impl Default for DcChargeLoopResponseMode {
    fn default() -> Self {
        Self::Scheduled(DcLoopLimits::default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DcChargeLoopResponse {
    pub header: Header,
    pub response_code: ResponseCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EvseStatus>,
    pub present_current: RationalNumber,
    pub present_voltage: RationalNumber,
    pub power_limit_achieved: bool,
    pub current_limit_achieved: bool,
    pub voltage_limit_achieved: bool,
    pub control_mode: DcChargeLoopResponseMode,
}

// ===== Welding detection =====

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DcWeldingDetectionRequest {
    pub header: Header,
    pub processing: Processing,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DcWeldingDetectionResponse {
    pub header: Header,
    pub response_code: ResponseCode,
    pub present_voltage: RationalNumber,
}
