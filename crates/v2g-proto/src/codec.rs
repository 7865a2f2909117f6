//! EXI codec boundary
//!
//! A codec turns payload bytes into a *document*: one optional slot per
//! message of a family, exactly as generated EXI bindings expose it. The
//! [`envelope`](crate::envelope) layer checks that a single slot is filled.

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, DecodeError};
use crate::messages::*;
use crate::variant::{Family, Message};

/// Black-box EXI codec, one routine pair per message family
pub trait ExiCodec: Send + Sync {
    fn decode_app_handshake(&self, bytes: &[u8]) -> Result<AppHandshakeDocument, CodecError>;
    fn encode_app_handshake(&self, document: &AppHandshakeDocument) -> Result<Vec<u8>, CodecError>;

    fn decode_main(&self, bytes: &[u8]) -> Result<MainDocument, CodecError>;
    fn encode_main(&self, document: &MainDocument) -> Result<Vec<u8>, CodecError>;

    fn decode_dc(&self, bytes: &[u8]) -> Result<DcDocument, CodecError>;
    fn encode_dc(&self, document: &DcDocument) -> Result<Vec<u8>, CodecError>;

    fn decode_ac(&self, bytes: &[u8]) -> Result<AcDocument, CodecError>;
    fn encode_ac(&self, document: &AcDocument) -> Result<Vec<u8>, CodecError>;
}

macro_rules! document {
    (
        $(#[$meta:meta])*
        $doc:ident ($family:ident) {
            $( $field:ident as $name:literal => $variant:ident ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        pub struct $doc {
            $(
                #[serde(rename = $name, default, skip_serializing_if = "Option::is_none")]
                pub $field: Option<$variant>,
            )*
        }

        impl $doc {
            pub const FAMILY: Family = Family::$family;

            /// Number of filled slots
            pub fn populated(&self) -> usize {
                0 $( + usize::from(self.$field.is_some()) )*
            }

            /// Convert into the single message this document carries
            pub fn into_message(self) -> Result<Message, DecodeError> {
                let count = self.populated();
                if count > 1 {
                    return Err(DecodeError::Ambiguous {
                        family: Self::FAMILY,
                        count,
                    });
                }

                $(
                    if let Some(body) = self.$field {
                        return Ok(Message::from(body));
                    }
                )*

                Err(DecodeError::Empty(Self::FAMILY))
            }

            /// Single-slot document for `message`, `None` if it belongs elsewhere
            pub fn from_message(message: Message) -> Option<Self> {
                match message {
                    $(
                        Message::$variant(body) => Some(Self {
                            $field: Some(body),
                            ..Self::default()
                        }),
                    )*
                    _ => None,
                }
            }
        }
    };
}

document! {
    /// SupportedAppProtocol exchange
    AppHandshakeDocument (AppHandshake) {
        supported_app_protocol_req as "supportedAppProtocolReq" => SupportedAppProtocolRequest,
        supported_app_protocol_res as "supportedAppProtocolRes" => SupportedAppProtocolResponse,
    }
}

document! {
    /// ISO 15118-20 CommonMessages
    MainDocument (Main) {
        session_setup_req as "SessionSetupReq" => SessionSetupRequest,
        session_setup_res as "SessionSetupRes" => SessionSetupResponse,
        authorization_setup_req as "AuthorizationSetupReq" => AuthorizationSetupRequest,
        authorization_setup_res as "AuthorizationSetupRes" => AuthorizationSetupResponse,
        authorization_req as "AuthorizationReq" => AuthorizationRequest,
        authorization_res as "AuthorizationRes" => AuthorizationResponse,
        service_discovery_req as "ServiceDiscoveryReq" => ServiceDiscoveryRequest,
        service_discovery_res as "ServiceDiscoveryRes" => ServiceDiscoveryResponse,
        service_detail_req as "ServiceDetailReq" => ServiceDetailRequest,
        service_detail_res as "ServiceDetailRes" => ServiceDetailResponse,
        service_selection_req as "ServiceSelectionReq" => ServiceSelectionRequest,
        service_selection_res as "ServiceSelectionRes" => ServiceSelectionResponse,
        schedule_exchange_req as "ScheduleExchangeReq" => ScheduleExchangeRequest,
        schedule_exchange_res as "ScheduleExchangeRes" => ScheduleExchangeResponse,
        power_delivery_req as "PowerDeliveryReq" => PowerDeliveryRequest,
        power_delivery_res as "PowerDeliveryRes" => PowerDeliveryResponse,
        session_stop_req as "SessionStopReq" => SessionStopRequest,
        session_stop_res as "SessionStopRes" => SessionStopResponse,
    }
}

document! {
    /// ISO 15118-20 DC messages
    DcDocument (Dc) {
        charge_parameter_discovery_req as "DC_ChargeParameterDiscoveryReq" => DcChargeParameterDiscoveryRequest,
        charge_parameter_discovery_res as "DC_ChargeParameterDiscoveryRes" => DcChargeParameterDiscoveryResponse,
        cable_check_req as "DC_CableCheckReq" => DcCableCheckRequest,
        cable_check_res as "DC_CableCheckRes" => DcCableCheckResponse,
        pre_charge_req as "DC_PreChargeReq" => DcPreChargeRequest,
        pre_charge_res as "DC_PreChargeRes" => DcPreChargeResponse,
        charge_loop_req as "DC_ChargeLoopReq" => DcChargeLoopRequest,
        charge_loop_res as "DC_ChargeLoopRes" => DcChargeLoopResponse,
        welding_detection_req as "DC_WeldingDetectionReq" => DcWeldingDetectionRequest,
        welding_detection_res as "DC_WeldingDetectionRes" => DcWeldingDetectionResponse,
    }
}

document! {
    /// ISO 15118-20 AC messages
    AcDocument (Ac) {
        charge_parameter_discovery_req as "AC_ChargeParameterDiscoveryReq" => AcChargeParameterDiscoveryRequest,
        charge_parameter_discovery_res as "AC_ChargeParameterDiscoveryRes" => AcChargeParameterDiscoveryResponse,
        charge_loop_req as "AC_ChargeLoopReq" => AcChargeLoopRequest,
        charge_loop_res as "AC_ChargeLoopRes" => AcChargeLoopResponse,
    }
}
