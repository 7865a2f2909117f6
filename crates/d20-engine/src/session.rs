//! Per-connection negotiated state

use std::collections::BTreeMap;

use tracing::warn;
use v2g_proto::{
    AcConnector, Authorization, BptChannel, ControlMode, DcConnector, GeneratorMode, Header,
    MobilityNeedsMode, Pricing, RationalNumber, SelectedService, ServiceCategory, SessionId,
};

use crate::config::{
    AcBptParameterList, AcParameterList, DcBptParameterList, DcParameterList,
    InternetParameterList, ParkingParameterList,
};

/// Services and parameter sets offered to the EV so far
///
/// Parameter-set tables are keyed by the id assigned in ServiceDetail.
#[derive(Debug, Clone, Default)]
pub struct OfferedServices {
    pub energy_services: Vec<ServiceCategory>,
    pub vas_services: Vec<ServiceCategory>,
    pub auth_services: Vec<Authorization>,

    pub dc_parameter_list: BTreeMap<u16, DcParameterList>,
    pub dc_bpt_parameter_list: BTreeMap<u16, DcBptParameterList>,
    pub ac_parameter_list: BTreeMap<u16, AcParameterList>,
    pub ac_bpt_parameter_list: BTreeMap<u16, AcBptParameterList>,
    pub internet_parameter_list: BTreeMap<u16, InternetParameterList>,
    pub parking_parameter_list: BTreeMap<u16, ParkingParameterList>,
}

impl OfferedServices {
    pub fn offers(&self, service: ServiceCategory) -> bool {
        self.energy_services.contains(&service) || self.vas_services.contains(&service)
    }

    /// Whether `id` names an offered parameter set of `service`
    pub fn has_parameter_set(&self, service: ServiceCategory, id: u16) -> bool {
        match service {
            ServiceCategory::Dc => self.dc_parameter_list.contains_key(&id),
            ServiceCategory::DcBpt => self.dc_bpt_parameter_list.contains_key(&id),
            ServiceCategory::Ac => self.ac_parameter_list.contains_key(&id),
            ServiceCategory::AcBpt => self.ac_bpt_parameter_list.contains_key(&id),
            ServiceCategory::Internet => self.internet_parameter_list.contains_key(&id),
            ServiceCategory::ParkingStatus => self.parking_parameter_list.contains_key(&id),
            ServiceCategory::Wpt | ServiceCategory::DcAcdp | ServiceCategory::DcAcdpBpt => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    Dc(DcConnector),
    Ac(AcConnector),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BptParameters {
    pub channel: BptChannel,
    pub generator_mode: GeneratorMode,
}

/// Parameters fixed by a successful ServiceSelection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedServiceParameters {
    pub energy_service: ServiceCategory,
    pub connector: Connector,
    pub control_mode: ControlMode,
    pub mobility_needs_mode: MobilityNeedsMode,
    pub pricing: Pricing,
    /// AC only
    pub nominal_voltage: Option<RationalNumber>,
    /// BPT services only
    pub bpt: Option<BptParameters>,
    pub vas: Vec<SelectedService>,
}

impl SelectedServiceParameters {
    pub fn from_dc(service: ServiceCategory, list: &DcParameterList) -> Self {
        Self {
            energy_service: service,
            connector: Connector::Dc(list.connector),
            control_mode: list.control_mode,
            mobility_needs_mode: list.mobility_needs_mode,
            pricing: list.pricing,
            nominal_voltage: None,
            bpt: None,
            vas: Vec::new(),
        }
    }

    pub fn from_dc_bpt(list: &DcBptParameterList) -> Self {
        Self {
            bpt: Some(BptParameters {
                channel: list.bpt_channel,
                generator_mode: list.generator_mode,
            }),
            ..Self::from_dc(ServiceCategory::DcBpt, &list.dc)
        }
    }

    pub fn from_ac(service: ServiceCategory, list: &AcParameterList) -> Self {
        Self {
            energy_service: service,
            connector: Connector::Ac(list.connector),
            control_mode: list.control_mode,
            mobility_needs_mode: list.mobility_needs_mode,
            pricing: list.pricing,
            nominal_voltage: Some(list.nominal_voltage),
            bpt: None,
            vas: Vec::new(),
        }
    }

    pub fn from_ac_bpt(list: &AcBptParameterList) -> Self {
        Self {
            bpt: Some(BptParameters {
                channel: list.bpt_channel,
                generator_mode: list.generator_mode,
            }),
            ..Self::from_ac(ServiceCategory::AcBpt, &list.ac)
        }
    }

    pub fn is_bpt(&self) -> bool {
        self.energy_service.is_bpt()
    }
}

/// State negotiated on one connection
#[derive(Debug, Clone, Default)]
pub struct Session {
    id: SessionId,
    pub offered_services: OfferedServices,
    pub selected_services: Option<SelectedServiceParameters>,
    pub selected_authorization: Option<Authorization>,
    /// Challenge sent with a PnC offer
    pub gen_challenge: Option<Vec<u8>>,
    pub evcc_id: Option<String>,
    pub terminated: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session with an already established id
    pub fn with_id(id: SessionId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Assign the id; an established id is never replaced
    pub fn establish(&mut self, id: SessionId) {
        if self.id.is_zero() {
            self.id = id;
        } else {
            warn!(current = %self.id, rejected = %id, "Session id already established");
        }
    }

    pub fn is_established(&self) -> bool {
        !self.id.is_zero()
    }

    /// Whether a request header belongs to this session
    pub fn matches(&self, header: &Header) -> bool {
        self.is_established() && header.session_id == self.id
    }

    /// Response header stamped with the current time
    pub fn header(&self) -> Header {
        Header {
            session_id: self.id,
            timestamp: chrono::Utc::now().timestamp().max(0) as u64,
        }
    }
}
