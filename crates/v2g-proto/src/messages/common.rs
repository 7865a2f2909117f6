//! ISO 15118-20 common messages (payload type 0x8002)

use serde::{Deserialize, Serialize};

use super::datatypes::{
    hex_bytes, Authorization, ChargeProgress, ControlMode, DcConnector, EvseStatus, Header,
    MobilityNeedsMode, Parameter, ParameterSet, Pricing, Processing, ResponseCode,
    SelectedService, Service, ServiceCategory,
};
use super::RationalNumber;

// ===== Session setup =====

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSetupRequest {
    pub header: Header,
    pub evcc_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSetupResponse {
    pub header: Header,
    pub response_code: ResponseCode,
    pub evse_id: String,
}

// ===== Authorization =====

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationSetupRequest {
    pub header: Header,
}

/// Authorization mode details offered by the EVSE
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorizationModeOffer {
    #[default]
    Eim,
    Pnc {
        #[serde(with = "hex_bytes")]
        gen_challenge: Vec<u8>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        supported_providers: Option<Vec<String>>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationSetupResponse {
    pub header: Header,
    pub response_code: ResponseCode,
    pub authorization_services: Vec<Authorization>,
    pub certificate_installation_service: bool,
    pub authorization_mode: AuthorizationModeOffer,
}

/// Contract data sent with a PnC authorization request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PncAuthorization {
    pub id: String,
    #[serde(with = "hex_bytes")]
    pub gen_challenge: Vec<u8>,
    pub contract_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    pub header: Header,
    pub selected_authorization_service: Authorization,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pnc_params: Option<PncAuthorization>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationResponse {
    pub header: Header,
    pub response_code: ResponseCode,
    pub evse_processing: Processing,
}

// ===== Service discovery and selection =====

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDiscoveryRequest {
    pub header: Header,
    /// ServiceIDs the EV is interested in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_service_ids: Option<Vec<u16>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDiscoveryResponse {
    pub header: Header,
    pub response_code: ResponseCode,
    pub service_renegotiation_supported: bool,
    pub energy_transfer_service_list: Vec<Service>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vas_list: Option<Vec<Service>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDetailRequest {
    pub header: Header,
    pub service: ServiceCategory,
}

impl Default for ServiceDetailRequest {
    fn default() -> Self {
        Self {
            header: Header::default(),
            service: ServiceCategory::Dc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDetailResponse {
    pub header: Header,
    pub response_code: ResponseCode,
    pub service: ServiceCategory,
    pub service_parameter_list: Vec<ParameterSet>,
}

/// Defaults to the mandatory DC parameter set (Core connector, scheduled,
/// mobility needs provided by the EVCC, no pricing), which failure responses
/// still have to carry.
impl Default for ServiceDetailResponse {
    fn default() -> Self {
        Self {
            header: Header::default(),
            response_code: ResponseCode::default(),
            service: ServiceCategory::Dc,
            service_parameter_list: vec![ParameterSet {
                id: 0,
                parameters: vec![
                    Parameter::int("Connector", DcConnector::Core.value()),
                    Parameter::int("ControlMode", ControlMode::Scheduled.value()),
                    Parameter::int("MobilityNeedsMode", MobilityNeedsMode::ProvidedByEvcc.value()),
                    Parameter::int("Pricing", Pricing::NoPricing.value()),
                ],
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSelectionRequest {
    pub header: Header,
    pub selected_energy_transfer_service: SelectedService,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_vas_list: Option<Vec<SelectedService>>,
}

impl Default for ServiceSelectionRequest {
    fn default() -> Self {
        Self {
            header: Header::default(),
            selected_energy_transfer_service: SelectedService {
                service_id: ServiceCategory::Dc,
                parameter_set_id: 0,
            },
            selected_vas_list: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSelectionResponse {
    pub header: Header,
    pub response_code: ResponseCode,
}

// ===== Schedule exchange =====

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledScheduleRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_energy: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_energy: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_energy: Option<RationalNumber>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicScheduleRequest {
    pub departure_time: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_soc: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_soc: Option<u8>,
    pub target_energy: RationalNumber,
    pub max_energy: RationalNumber,
    pub min_energy: RationalNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleExchangeRequestMode {
    Scheduled(ScheduledScheduleRequest),
    Dynamic(DynamicScheduleRequest),
}

impl Default for ScheduleExchangeRequestMode {
    fn default() -> Self {
        Self::Scheduled(ScheduledScheduleRequest::default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleExchangeRequest {
    pub header: Header,
    pub max_supporting_points: u16,
    pub control_mode: ScheduleExchangeRequestMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerScheduleEntry {
    /// Seconds
    pub duration: u32,
    pub power: RationalNumber,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerSchedule {
    /// Seconds since the Unix epoch
    pub time_anchor: u64,
    pub entries: Vec<PowerScheduleEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleTuple {
    pub schedule_tuple_id: u32,
    pub charging_schedule: PowerSchedule,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discharging_schedule: Option<PowerSchedule>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledScheduleResponse {
    pub schedule_tuples: Vec<ScheduleTuple>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicScheduleResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_soc: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_soc: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleExchangeResponseMode {
    Scheduled(ScheduledScheduleResponse),
    Dynamic(DynamicScheduleResponse),
}

impl Default for ScheduleExchangeResponseMode {
    fn default() -> Self {
        Self::Scheduled(ScheduledScheduleResponse::default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleExchangeResponse {
    pub header: Header,
    pub response_code: ResponseCode,
    pub processing: Processing,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub go_to_pause: Option<bool>,
    pub control_mode: ScheduleExchangeResponseMode,
}

// ===== Power delivery =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerDirection {
    Charge,
    Discharge,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerDeliveryRequest {
    pub header: Header,
    pub processing: Processing,
    pub charge_progress: ChargeProgress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bpt_channel_selection: Option<PowerDirection>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerDeliveryResponse {
    pub header: Header,
    pub response_code: ResponseCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EvseStatus>,
}

// ===== Session stop =====

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargingSession {
    Pause,
    #[default]
    Terminate,
    ServiceRenegotiation,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStopRequest {
    pub header: Header,
    pub charging_session: ChargingSession,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ev_termination_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ev_termination_explanation: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStopResponse {
    pub header: Header,
    pub response_code: ResponseCode,
}
