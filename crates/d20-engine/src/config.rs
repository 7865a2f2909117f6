//! Session configuration
//!
//! Everything the EVSE offers during a session: identity, services,
//! parameter sets, transfer limits and timing. The engine only ever reads
//! it; the host loads it once (usually from the daemon's TOML file) and
//! shares it between sessions.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use v2g_proto::{
    AcConnector, Authorization, BptChannel, ControlMode, DcConnector, GeneratorMode,
    IntendedService, InternetPort, InternetProtocol, MobilityNeedsMode, ParkingStatusType,
    Pricing, RationalNumber, ServiceCategory,
};

/// Read-only per-EVSE session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// EVSE identifier reported in SessionSetupRes
    #[serde(default = "default_evse_id")]
    pub evse_id: String,
    /// Energy transfer services offered during service discovery
    #[serde(default = "default_energy_services")]
    pub supported_energy_services: Vec<ServiceCategory>,
    /// Authorization services offered during authorization setup
    #[serde(default = "default_authorization_services")]
    pub authorization_services: Vec<Authorization>,
    /// Offer certificate installation (PnC)
    #[serde(default)]
    pub certificate_installation_service: bool,

    #[serde(default = "default_dc_parameter_list")]
    pub dc_parameter_list: Vec<DcParameterList>,
    #[serde(default)]
    pub dc_bpt_parameter_list: Vec<DcBptParameterList>,
    #[serde(default)]
    pub ac_parameter_list: Vec<AcParameterList>,
    #[serde(default)]
    pub ac_bpt_parameter_list: Vec<AcBptParameterList>,
    /// Internet VAS; offered when non-empty
    #[serde(default)]
    pub internet_parameter_list: Vec<InternetParameterList>,
    /// ParkingStatus VAS; offered when non-empty
    #[serde(default)]
    pub parking_parameter_list: Vec<ParkingParameterList>,

    #[serde(default)]
    pub dc_limits: DcTransferLimits,
    #[serde(default)]
    pub ac_limits: AcTransferLimits,
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Pre-charge is finished once |present - target| is within this many volts
    #[serde(default = "default_pre_charge_tolerance")]
    pub pre_charge_tolerance_v: f32,
    /// Welding detection is finished once the present voltage drops below this
    #[serde(default = "default_welding_threshold")]
    pub welding_detection_threshold_v: f32,
}

fn default_evse_id() -> String {
    "DE*PNX*E12345*1".to_string()
}

fn default_energy_services() -> Vec<ServiceCategory> {
    vec![ServiceCategory::Dc]
}

fn default_authorization_services() -> Vec<Authorization> {
    vec![Authorization::Eim]
}

fn default_dc_parameter_list() -> Vec<DcParameterList> {
    vec![DcParameterList::default()]
}

fn default_pre_charge_tolerance() -> f32 {
    10.0
}

fn default_welding_threshold() -> f32 {
    60.0
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            evse_id: default_evse_id(),
            supported_energy_services: default_energy_services(),
            authorization_services: default_authorization_services(),
            certificate_installation_service: false,
            dc_parameter_list: default_dc_parameter_list(),
            dc_bpt_parameter_list: Vec::new(),
            ac_parameter_list: Vec::new(),
            ac_bpt_parameter_list: Vec::new(),
            internet_parameter_list: Vec::new(),
            parking_parameter_list: Vec::new(),
            dc_limits: DcTransferLimits::default(),
            ac_limits: AcTransferLimits::default(),
            timeouts: TimeoutConfig::default(),
            pre_charge_tolerance_v: default_pre_charge_tolerance(),
            welding_detection_threshold_v: default_welding_threshold(),
        }
    }
}

impl SessionConfig {
    pub fn supports_dc(&self) -> bool {
        self.supported_energy_services.iter().any(|s| s.is_dc())
    }

    pub fn supports_ac(&self) -> bool {
        self.supported_energy_services.iter().any(|s| s.is_ac())
    }

    /// Value-added services offered during service discovery
    pub fn vas_services(&self) -> Vec<ServiceCategory> {
        let mut services = Vec::new();
        if !self.internet_parameter_list.is_empty() {
            services.push(ServiceCategory::Internet);
        }
        if !self.parking_parameter_list.is_empty() {
            services.push(ServiceCategory::ParkingStatus);
        }
        services
    }
}

// =============================================================================
// Service parameter lists
// =============================================================================

/// One DC parameter set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DcParameterList {
    pub connector: DcConnector,
    pub control_mode: ControlMode,
    pub mobility_needs_mode: MobilityNeedsMode,
    pub pricing: Pricing,
}

impl Default for DcParameterList {
    fn default() -> Self {
        Self {
            connector: DcConnector::Core,
            control_mode: ControlMode::Scheduled,
            mobility_needs_mode: MobilityNeedsMode::ProvidedByEvcc,
            pricing: Pricing::NoPricing,
        }
    }
}

/// One DC_BPT parameter set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DcBptParameterList {
    #[serde(flatten)]
    pub dc: DcParameterList,
    pub bpt_channel: BptChannel,
    pub generator_mode: GeneratorMode,
}

/// One AC parameter set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcParameterList {
    pub connector: AcConnector,
    pub control_mode: ControlMode,
    pub mobility_needs_mode: MobilityNeedsMode,
    /// EVSENominalVoltage
    pub nominal_voltage: RationalNumber,
    pub pricing: Pricing,
}

/// One AC_BPT parameter set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcBptParameterList {
    #[serde(flatten)]
    pub ac: AcParameterList,
    pub bpt_channel: BptChannel,
    pub generator_mode: GeneratorMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternetParameterList {
    pub protocol: InternetProtocol,
    pub port: InternetPort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParkingParameterList {
    pub intended_service: IntendedService,
    pub parking_status_type: ParkingStatusType,
}

// =============================================================================
// Transfer limits
// =============================================================================

/// EVSE DC limits reported in DC_ChargeParameterDiscoveryRes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcTransferLimits {
    #[serde(default = "default_dc_max_power")]
    pub max_charge_power: RationalNumber,
    #[serde(default)]
    pub min_charge_power: RationalNumber,
    #[serde(default = "default_dc_max_current")]
    pub max_charge_current: RationalNumber,
    #[serde(default)]
    pub min_charge_current: RationalNumber,
    #[serde(default = "default_dc_max_voltage")]
    pub max_voltage: RationalNumber,
    #[serde(default = "default_dc_min_voltage")]
    pub min_voltage: RationalNumber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_ramp_limit: Option<RationalNumber>,
    /// Discharge limits, required for DC_BPT
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discharge: Option<DcDischargeLimits>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DcDischargeLimits {
    pub max_discharge_power: RationalNumber,
    pub min_discharge_power: RationalNumber,
    pub max_discharge_current: RationalNumber,
    pub min_discharge_current: RationalNumber,
}

fn default_dc_max_power() -> RationalNumber {
    RationalNumber::new(150, 3)
}

fn default_dc_max_current() -> RationalNumber {
    RationalNumber::new(300, 0)
}

fn default_dc_max_voltage() -> RationalNumber {
    RationalNumber::new(900, 0)
}

fn default_dc_min_voltage() -> RationalNumber {
    RationalNumber::new(150, 0)
}

impl Default for DcTransferLimits {
    fn default() -> Self {
        Self {
            max_charge_power: default_dc_max_power(),
            min_charge_power: RationalNumber::ZERO,
            max_charge_current: default_dc_max_current(),
            min_charge_current: RationalNumber::ZERO,
            max_voltage: default_dc_max_voltage(),
            min_voltage: default_dc_min_voltage(),
            power_ramp_limit: None,
            discharge: None,
        }
    }
}

/// EVSE AC limits reported in AC_ChargeParameterDiscoveryRes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcTransferLimits {
    #[serde(default = "default_ac_max_power")]
    pub max_charge_power: RationalNumber,
    #[serde(default = "default_ac_min_power")]
    pub min_charge_power: RationalNumber,
    #[serde(default = "default_nominal_frequency")]
    pub nominal_frequency: RationalNumber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_power_asymmetry: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_ramp_limit: Option<RationalNumber>,
    /// Discharge limits, required for AC_BPT
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discharge: Option<AcDischargeLimits>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcDischargeLimits {
    pub max_discharge_power: RationalNumber,
    pub min_discharge_power: RationalNumber,
}

fn default_ac_max_power() -> RationalNumber {
    RationalNumber::new(22, 3)
}

fn default_ac_min_power() -> RationalNumber {
    RationalNumber::new(1380, 0)
}

fn default_nominal_frequency() -> RationalNumber {
    RationalNumber::new(50, 0)
}

impl Default for AcTransferLimits {
    fn default() -> Self {
        Self {
            max_charge_power: default_ac_max_power(),
            min_charge_power: default_ac_min_power(),
            nominal_frequency: default_nominal_frequency(),
            max_power_asymmetry: None,
            power_ramp_limit: None,
            discharge: None,
        }
    }
}

// =============================================================================
// Timeouts
// =============================================================================

/// Protocol timers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Time from connection to the first SessionSetupReq (ms)
    #[serde(default = "default_performance_ms")]
    pub performance_ms: u64,
    /// Time allowed between a response and the next request (ms)
    #[serde(default = "default_sequence_ms")]
    pub sequence_ms: u64,
    /// Upper bound for a state answering "Ongoing" (ms)
    #[serde(default = "default_ongoing_ms")]
    pub ongoing_ms: u64,
}

fn default_performance_ms() -> u64 {
    20_000
}

fn default_sequence_ms() -> u64 {
    60_000
}

fn default_ongoing_ms() -> u64 {
    60_000
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            performance_ms: default_performance_ms(),
            sequence_ms: default_sequence_ms(),
            ongoing_ms: default_ongoing_ms(),
        }
    }
}

impl TimeoutConfig {
    pub fn performance(&self) -> Duration {
        Duration::from_millis(self.performance_ms)
    }

    pub fn sequence(&self) -> Duration {
        Duration::from_millis(self.sequence_ms)
    }

    pub fn ongoing(&self) -> Duration {
        Duration::from_millis(self.ongoing_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.supported_energy_services, vec![ServiceCategory::Dc]);
        assert_eq!(config.authorization_services, vec![Authorization::Eim]);
        assert_eq!(config.dc_parameter_list.len(), 1);
        assert!(config.vas_services().is_empty());
        assert_eq!(config.timeouts.sequence(), Duration::from_secs(60));
        assert_eq!(config.timeouts.performance(), Duration::from_secs(20));
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
            evse_id = "DE*ABC*E1"
            supported_energy_services = ["DC", "DC_BPT", "AC"]
            authorization_services = ["EIM", "PnC"]
            welding_detection_threshold_v = 40.0

            [[dc_bpt_parameter_list]]
            connector = "Extended"
            control_mode = "Dynamic"
            mobility_needs_mode = "ProvidedBySecc"
            pricing = "NoPricing"
            bpt_channel = "Unified"
            generator_mode = "GridFollowing"

            [[ac_parameter_list]]
            connector = "ThreePhase"
            control_mode = "Scheduled"
            mobility_needs_mode = "ProvidedByEvcc"
            nominal_voltage = { value = 400, exponent = 0 }
            pricing = "NoPricing"

            [[internet_parameter_list]]
            protocol = "https"
            port = "Port443"

            [ac_limits]
            max_charge_power = { value = 11, exponent = 3 }

            [timeouts]
            sequence_ms = 5000
        "#;

        let config: SessionConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.evse_id, "DE*ABC*E1");
        assert!(config.supports_dc());
        assert!(config.supports_ac());
        assert_eq!(config.authorization_services.len(), 2);
        assert_eq!(config.dc_parameter_list, vec![DcParameterList::default()]);
        assert_eq!(config.dc_bpt_parameter_list[0].dc.control_mode, ControlMode::Dynamic);
        assert_eq!(config.ac_parameter_list[0].connector, AcConnector::ThreePhase);
        assert_eq!(config.ac_limits.max_charge_power.to_float(), 11_000.0);
        assert_eq!(config.ac_limits.nominal_frequency, RationalNumber::new(50, 0));
        assert_eq!(config.vas_services(), vec![ServiceCategory::Internet]);
        assert_eq!(config.timeouts.sequence_ms, 5000);
        assert_eq!(config.timeouts.ongoing_ms, 60_000);
        assert_eq!(config.welding_detection_threshold_v, 40.0);
    }
}
