//! Datatypes shared across message families

use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::RationalNumber;

// =============================================================================
// Session id and header
// =============================================================================

/// 8-byte opaque session identifier
///
/// Anything of a different length decodes as [`SessionId::ZERO`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SessionId([u8; 8]);

impl SessionId {
    pub const ZERO: SessionId = SessionId([0; 8]);

    pub const fn new(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    /// Fresh random id, never equal to [`SessionId::ZERO`]
    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        loop {
            let mut bytes = [0u8; 8];
            rng.fill_bytes(&mut bytes);
            let id = Self(bytes);
            if !id.is_zero() {
                return id;
            }
        }
    }

    /// Interpret raw bytes, falling back to the zero id on a length mismatch
    pub fn from_slice_lossy(bytes: &[u8]) -> Self {
        <[u8; 8]>::try_from(bytes).map(Self).unwrap_or(Self::ZERO)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0; 8]
    }

    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&hex::encode_upper(self.0))
    }
}

impl Serialize for SessionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode_upper(self.0))
    }
}

impl<'de> Deserialize<'de> for SessionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        Ok(Self::from_slice_lossy(&bytes))
    }
}

/// Hex encoding for raw byte fields
pub(crate) mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode_upper(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

/// Message header present in every Part-20 message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub session_id: SessionId,
    /// Seconds since the Unix epoch
    pub timestamp: u64,
}

// =============================================================================
// Response codes
// =============================================================================

macro_rules! response_codes {
    ($( $variant:ident => $name:literal ),* $(,)?) => {
        /// Part-20 response codes, in ISO order
        ///
        /// Ordering follows the declaration, so `code >= ResponseCode::Failed`
        /// tells a failure apart from OK and warnings.
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum ResponseCode {
            #[default]
            $( #[serde(rename = $name)] $variant, )*
        }

        impl ResponseCode {
            pub fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $name, )*
                }
            }
        }
    };
}

response_codes! {
    Ok => "OK",
    OkCertificateExpiresSoon => "OK_CertificateExpiresSoon",
    OkNewSessionEstablished => "OK_NewSessionEstablished",
    OkOldSessionJoined => "OK_OldSessionJoined",
    OkPowerToleranceConfirmed => "OK_PowerToleranceConfirmed",
    WarningAuthorizationSelectionInvalid => "WARNING_AuthorizationSelectionInvalid",
    WarningCertificateExpired => "WARNING_CertificateExpired",
    WarningCertificateNotYetValid => "WARNING_CertificateNotYetValid",
    WarningCertificateRevoked => "WARNING_CertificateRevoked",
    WarningCertificateValidationError => "WARNING_CertificateValidationError",
    WarningChallengeInvalid => "WARNING_ChallengeInvalid",
    WarningEimAuthorizationFailure => "WARNING_EIMAuthorizationFailure",
    WarningEmspUnknown => "WARNING_eMSPUnknown",
    WarningEvPowerProfileViolation => "WARNING_EVPowerProfileViolation",
    WarningGeneralPncAuthorizationError => "WARNING_GeneralPnCAuthorizationError",
    WarningNoCertificateAvailable => "WARNING_NoCertificateAvailable",
    WarningNoContractMatchingPcidFound => "WARNING_NoContractMatchingPCIDFound",
    WarningPowerToleranceNotConfirmed => "WARNING_PowerToleranceNotConfirmed",
    WarningScheduleRenegotiationFailed => "WARNING_ScheduleRenegotiationFailed",
    WarningStandbyNotAllowed => "WARNING_StandbyNotAllowed",
    WarningWpt => "WARNING_WPT",
    Failed => "FAILED",
    FailedAssociationError => "FAILED_AssociationError",
    FailedContactorError => "FAILED_ContactorError",
    FailedEvPowerProfileInvalid => "FAILED_EVPowerProfileInvalid",
    FailedEvPowerProfileViolation => "FAILED_EVPowerProfileViolation",
    FailedMeteringSignatureNotValid => "FAILED_MeteringSignatureNotValid",
    FailedNoEnergyTransferServiceSelected => "FAILED_NoEnergyTransferServiceSelected",
    FailedNoServiceRenegotiationSupported => "FAILED_NoServiceRenegotiationSupported",
    FailedPauseNotAllowed => "FAILED_PauseNotAllowed",
    FailedPowerDeliveryNotApplied => "FAILED_PowerDeliveryNotApplied",
    FailedPowerToleranceNotConfirmed => "FAILED_PowerToleranceNotConfirmed",
    FailedScheduleRenegotiation => "FAILED_ScheduleRenegotiation",
    FailedScheduleSelectionInvalid => "FAILED_ScheduleSelectionInvalid",
    FailedSequenceError => "FAILED_SequenceError",
    FailedServiceIdInvalid => "FAILED_ServiceIDInvalid",
    FailedServiceSelectionInvalid => "FAILED_ServiceSelectionInvalid",
    FailedSignatureError => "FAILED_SignatureError",
    FailedUnknownSession => "FAILED_UnknownSession",
    FailedWrongChargeParameter => "FAILED_WrongChargeParameter",
}

impl ResponseCode {
    pub fn is_failure(self) -> bool {
        self >= ResponseCode::Failed
    }

    pub fn is_warning(self) -> bool {
        self >= ResponseCode::WarningAuthorizationSelectionInvalid && self < ResponseCode::Failed
    }
}

impl std::fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress indicator for requests that may take more than one round trip
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Processing {
    #[default]
    Finished,
    Ongoing,
    #[serde(rename = "Ongoing_WaitingForCustomerInteraction")]
    OngoingWaitingForCustomerInteraction,
}

// =============================================================================
// Services
// =============================================================================

/// Service identifiers (energy transfer services and VAS)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ServiceCategory {
    #[serde(rename = "AC")]
    Ac,
    #[serde(rename = "DC")]
    Dc,
    #[serde(rename = "WPT")]
    Wpt,
    #[serde(rename = "DC_ACDP")]
    DcAcdp,
    #[serde(rename = "AC_BPT")]
    AcBpt,
    #[serde(rename = "DC_BPT")]
    DcBpt,
    #[serde(rename = "DC_ACDP_BPT")]
    DcAcdpBpt,
    Internet,
    ParkingStatus,
}

impl ServiceCategory {
    /// ISO ServiceID
    pub fn id(self) -> u16 {
        match self {
            Self::Ac => 1,
            Self::Dc => 2,
            Self::Wpt => 3,
            Self::DcAcdp => 4,
            Self::AcBpt => 5,
            Self::DcBpt => 6,
            Self::DcAcdpBpt => 7,
            Self::Internet => 65,
            Self::ParkingStatus => 66,
        }
    }

    pub fn from_id(id: u16) -> Option<Self> {
        match id {
            1 => Some(Self::Ac),
            2 => Some(Self::Dc),
            3 => Some(Self::Wpt),
            4 => Some(Self::DcAcdp),
            5 => Some(Self::AcBpt),
            6 => Some(Self::DcBpt),
            7 => Some(Self::DcAcdpBpt),
            65 => Some(Self::Internet),
            66 => Some(Self::ParkingStatus),
            _ => None,
        }
    }

    pub fn is_energy_transfer(self) -> bool {
        self.id() < 64
    }

    pub fn is_dc(self) -> bool {
        matches!(self, Self::Dc | Self::DcBpt | Self::DcAcdp | Self::DcAcdpBpt)
    }

    pub fn is_ac(self) -> bool {
        matches!(self, Self::Ac | Self::AcBpt)
    }

    pub fn is_bpt(self) -> bool {
        matches!(self, Self::AcBpt | Self::DcBpt | Self::DcAcdpBpt)
    }
}

impl std::fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Ac => "AC",
            Self::Dc => "DC",
            Self::Wpt => "WPT",
            Self::DcAcdp => "DC_ACDP",
            Self::AcBpt => "AC_BPT",
            Self::DcBpt => "DC_BPT",
            Self::DcAcdpBpt => "DC_ACDP_BPT",
            Self::Internet => "Internet",
            Self::ParkingStatus => "ParkingStatus",
        };
        f.write_str(name)
    }
}

/// Entry of a service list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub service_id: ServiceCategory,
    pub free_service: bool,
}

/// Authorization services
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Authorization {
    #[default]
    #[serde(rename = "EIM")]
    Eim,
    #[serde(rename = "PnC")]
    Pnc,
}

impl std::fmt::Display for Authorization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Eim => f.write_str("EIM"),
            Self::Pnc => f.write_str("PnC"),
        }
    }
}

// =============================================================================
// Service parameters
// =============================================================================

/// Value of a single service parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterValue {
    Bool(bool),
    Int(i32),
    Rational(RationalNumber),
    String(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub value: ParameterValue,
}

impl Parameter {
    pub fn int(name: &str, value: i32) -> Self {
        Self {
            name: name.to_string(),
            value: ParameterValue::Int(value),
        }
    }

    pub fn rational(name: &str, value: RationalNumber) -> Self {
        Self {
            name: name.to_string(),
            value: ParameterValue::Rational(value),
        }
    }

    pub fn string(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: ParameterValue::String(value.to_string()),
        }
    }
}

/// Parameter set offered for one service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSet {
    pub id: u16,
    pub parameters: Vec<Parameter>,
}

macro_rules! int_parameter {
    ($(#[$meta:meta])* $name:ident { $( $variant:ident = $value:literal ),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $variant = $value, )*
        }

        impl $name {
            pub fn value(self) -> i32 {
                self as i32
            }

            pub fn from_value(value: i32) -> Option<Self> {
                match value {
                    $( $value => Some(Self::$variant), )*
                    _ => None,
                }
            }
        }
    };
}

int_parameter! {
    /// DC connector layout
    DcConnector { Core = 1, Extended = 2, Dual2 = 3, Dual4 = 4 }
}

int_parameter! {
    /// AC connector layout
    AcConnector { SinglePhase = 1, ThreePhase = 3 }
}

int_parameter! {
    ControlMode { Scheduled = 1, Dynamic = 2 }
}

int_parameter! {
    MobilityNeedsMode { ProvidedByEvcc = 1, ProvidedBySecc = 2 }
}

int_parameter! {
    Pricing { NoPricing = 0, AbsolutePricing = 1, PriceLevels = 2 }
}

int_parameter! {
    /// Bidirectional power transfer channel
    BptChannel { Unified = 1, Separated = 2 }
}

int_parameter! {
    GeneratorMode { GridFollowing = 1, GridForming = 2 }
}

int_parameter! {
    /// Internet VAS port
    InternetPort { Port20 = 20, Port21 = 21, Port80 = 80, Port443 = 443 }
}

int_parameter! {
    /// ParkingStatus VAS service
    IntendedService { VehicleCheckIn = 1, VehicleCheckOut = 2 }
}

int_parameter! {
    ParkingStatusType { AutoInternal = 1, AutoExternal = 2, Manual = 3 }
}

/// Internet VAS protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InternetProtocol {
    Ftp,
    Http,
    Https,
}

impl InternetProtocol {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ftp => "ftp",
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

/// Service selected by the EV
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedService {
    pub service_id: ServiceCategory,
    pub parameter_set_id: u16,
}

// =============================================================================
// Status and notifications
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvseNotification {
    Pause,
    ExitStandby,
    Terminate,
    ScheduleRenegotiation,
    ServiceRenegotiation,
    #[default]
    MeteringConfirmation,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvseStatus {
    pub notification_max_delay: u16,
    pub notification: EvseNotification,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargeProgress {
    #[default]
    Start,
    Stop,
    Standby,
    ScheduleRenegotiation,
}

/// Values the EV may display to the user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub present_soc: Option<i8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_soc: Option<i8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_time_to_target_soc: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charging_complete: Option<bool>,
}
