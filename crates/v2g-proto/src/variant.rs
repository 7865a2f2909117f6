//! The closed union over every message

use serde::{Deserialize, Serialize};

use crate::messages::*;

/// Message family, one per V2GTP payload type carried on the session stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Family {
    AppHandshake,
    Main,
    Dc,
    Ac,
}

impl std::fmt::Display for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AppHandshake => f.write_str("AppHandshake"),
            Self::Main => f.write_str("Main"),
            Self::Dc => f.write_str("DC"),
            Self::Ac => f.write_str("AC"),
        }
    }
}

/// Typed access to one arm of [`Message`]
pub trait MessageKind: Sized + Into<Message> {
    const TYPE: MessageType;

    fn from_message(message: &Message) -> Option<&Self>;

    fn from_message_owned(message: Message) -> Result<Self, Message>;
}

/// Part-20 response fields every response carries
pub trait Response {
    fn header(&self) -> &Header;

    fn header_mut(&mut self) -> &mut Header;

    fn response_code(&self) -> ResponseCode;

    fn set_response_code(&mut self, code: ResponseCode);
}

macro_rules! messages {
    ($(
        $family:ident {
            $( $variant:ident ),* $(,)?
        }
    )*) => {
        /// Discriminant of [`Message`]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum MessageType {
            $( $( $variant, )* )*
        }

        /// Exactly one decoded request or response
        #[derive(Debug, Clone, PartialEq)]
        pub enum Message {
            $( $( $variant($variant), )* )*
        }

        impl MessageType {
            pub const ALL: &'static [MessageType] = &[$( $( MessageType::$variant, )* )*];

            pub fn family(self) -> Family {
                match self {
                    $( $( Self::$variant => Family::$family, )* )*
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $( $( Self::$variant => stringify!($variant), )* )*
                }
            }
        }

        impl Message {
            pub fn message_type(&self) -> MessageType {
                match self {
                    $( $( Self::$variant(_) => MessageType::$variant, )* )*
                }
            }

            /// Default value of the given type, mandatory header fields only
            pub fn default_of(ty: MessageType) -> Self {
                match ty {
                    $( $( MessageType::$variant => Self::$variant($variant::default()), )* )*
                }
            }
        }

        $( $(
            impl MessageKind for $variant {
                const TYPE: MessageType = MessageType::$variant;

                fn from_message(message: &Message) -> Option<&Self> {
                    match message {
                        Message::$variant(body) => Some(body),
                        _ => None,
                    }
                }

                fn from_message_owned(message: Message) -> Result<Self, Message> {
                    match message {
                        Message::$variant(body) => Ok(body),
                        other => Err(other),
                    }
                }
            }

            impl From<$variant> for Message {
                fn from(body: $variant) -> Self {
                    Message::$variant(body)
                }
            }
        )* )*
    };
}

messages! {
    AppHandshake {
        SupportedAppProtocolRequest,
        SupportedAppProtocolResponse,
    }
    Main {
        SessionSetupRequest,
        SessionSetupResponse,
        AuthorizationSetupRequest,
        AuthorizationSetupResponse,
        AuthorizationRequest,
        AuthorizationResponse,
        ServiceDiscoveryRequest,
        ServiceDiscoveryResponse,
        ServiceDetailRequest,
        ServiceDetailResponse,
        ServiceSelectionRequest,
        ServiceSelectionResponse,
        ScheduleExchangeRequest,
        ScheduleExchangeResponse,
        PowerDeliveryRequest,
        PowerDeliveryResponse,
        SessionStopRequest,
        SessionStopResponse,
    }
    Dc {
        DcChargeParameterDiscoveryRequest,
        DcChargeParameterDiscoveryResponse,
        DcCableCheckRequest,
        DcCableCheckResponse,
        DcPreChargeRequest,
        DcPreChargeResponse,
        DcChargeLoopRequest,
        DcChargeLoopResponse,
        DcWeldingDetectionRequest,
        DcWeldingDetectionResponse,
    }
    Ac {
        AcChargeParameterDiscoveryRequest,
        AcChargeParameterDiscoveryResponse,
        AcChargeLoopRequest,
        AcChargeLoopResponse,
    }
}

macro_rules! part20_responses {
    ($( $variant:ident ),* $(,)?) => {
        $(
            impl Response for $variant {
                fn header(&self) -> &Header {
                    &self.header
                }

                fn header_mut(&mut self) -> &mut Header {
                    &mut self.header
                }

                fn response_code(&self) -> ResponseCode {
                    self.response_code
                }

                fn set_response_code(&mut self, code: ResponseCode) {
                    self.response_code = code;
                }
            }
        )*

        impl Message {
            /// Part-20 response view, `None` for requests and the SAP response
            pub fn as_response(&self) -> Option<&dyn Response> {
                match self {
                    $( Self::$variant(body) => Some(body), )*
                    _ => None,
                }
            }

            pub fn as_response_mut(&mut self) -> Option<&mut dyn Response> {
                match self {
                    $( Self::$variant(body) => Some(body), )*
                    _ => None,
                }
            }
        }
    };
}

part20_responses! {
    SessionSetupResponse,
    AuthorizationSetupResponse,
    AuthorizationResponse,
    ServiceDiscoveryResponse,
    ServiceDetailResponse,
    ServiceSelectionResponse,
    ScheduleExchangeResponse,
    PowerDeliveryResponse,
    SessionStopResponse,
    DcChargeParameterDiscoveryResponse,
    DcCableCheckResponse,
    DcPreChargeResponse,
    DcChargeLoopResponse,
    DcWeldingDetectionResponse,
    AcChargeParameterDiscoveryResponse,
    AcChargeLoopResponse,
}

impl MessageType {
    /// Response type answering this request, `None` for responses
    pub fn response_type(self) -> Option<MessageType> {
        use MessageType::*;

        let response = match self {
            SupportedAppProtocolRequest => SupportedAppProtocolResponse,
            SessionSetupRequest => SessionSetupResponse,
            AuthorizationSetupRequest => AuthorizationSetupResponse,
            AuthorizationRequest => AuthorizationResponse,
            ServiceDiscoveryRequest => ServiceDiscoveryResponse,
            ServiceDetailRequest => ServiceDetailResponse,
            ServiceSelectionRequest => ServiceSelectionResponse,
            ScheduleExchangeRequest => ScheduleExchangeResponse,
            PowerDeliveryRequest => PowerDeliveryResponse,
            SessionStopRequest => SessionStopResponse,
            DcChargeParameterDiscoveryRequest => DcChargeParameterDiscoveryResponse,
            DcCableCheckRequest => DcCableCheckResponse,
            DcPreChargeRequest => DcPreChargeResponse,
            DcChargeLoopRequest => DcChargeLoopResponse,
            DcWeldingDetectionRequest => DcWeldingDetectionResponse,
            AcChargeParameterDiscoveryRequest => AcChargeParameterDiscoveryResponse,
            AcChargeLoopRequest => AcChargeLoopResponse,

            SupportedAppProtocolResponse
            | SessionSetupResponse
            | AuthorizationSetupResponse
            | AuthorizationResponse
            | ServiceDiscoveryResponse
            | ServiceDetailResponse
            | ServiceSelectionResponse
            | ScheduleExchangeResponse
            | PowerDeliveryResponse
            | SessionStopResponse
            | DcChargeParameterDiscoveryResponse
            | DcCableCheckResponse
            | DcPreChargeResponse
            | DcChargeLoopResponse
            | DcWeldingDetectionResponse
            | AcChargeParameterDiscoveryResponse
            | AcChargeLoopResponse => return None,
        };

        Some(response)
    }

    pub fn is_request(self) -> bool {
        self.response_type().is_some()
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl Message {
    /// Borrow the payload as `T`
    pub fn get<T: MessageKind>(&self) -> Option<&T> {
        T::from_message(self)
    }

    /// Borrow the payload as `T`, panicking on a type mismatch
    ///
    /// Only for call sites that already checked [`Message::message_type`].
    pub fn expect<T: MessageKind>(&self) -> &T {
        match T::from_message(self) {
            Some(body) => body,
            None => panic!(
                "message is {}, not {}",
                self.message_type(),
                T::TYPE
            ),
        }
    }

    /// Take the payload as `T`, handing the message back on a mismatch
    pub fn into_kind<T: MessageKind>(self) -> Result<T, Message> {
        T::from_message_owned(self)
    }

    pub fn family(&self) -> Family {
        self.message_type().family()
    }

    /// Response code of a Part-20 response
    pub fn response_code(&self) -> Option<ResponseCode> {
        self.as_response().map(|r| r.response_code())
    }

    /// Whether this is a response reporting failure
    pub fn is_failure(&self) -> bool {
        match self {
            Self::SupportedAppProtocolResponse(res) => {
                res.response_code == SapResponseCode::FailedNoNegotiation
            }
            other => other.response_code().is_some_and(ResponseCode::is_failure),
        }
    }

    /// Header of a Part-20 message
    pub fn header(&self) -> Option<&Header> {
        use Message::*;

        match self {
            SupportedAppProtocolRequest(_) | SupportedAppProtocolResponse(_) => None,
            SessionSetupRequest(m) => Some(&m.header),
            AuthorizationSetupRequest(m) => Some(&m.header),
            AuthorizationRequest(m) => Some(&m.header),
            ServiceDiscoveryRequest(m) => Some(&m.header),
            ServiceDetailRequest(m) => Some(&m.header),
            ServiceSelectionRequest(m) => Some(&m.header),
            ScheduleExchangeRequest(m) => Some(&m.header),
            PowerDeliveryRequest(m) => Some(&m.header),
            SessionStopRequest(m) => Some(&m.header),
            DcChargeParameterDiscoveryRequest(m) => Some(&m.header),
            DcCableCheckRequest(m) => Some(&m.header),
            DcPreChargeRequest(m) => Some(&m.header),
            DcChargeLoopRequest(m) => Some(&m.header),
            DcWeldingDetectionRequest(m) => Some(&m.header),
            AcChargeParameterDiscoveryRequest(m) => Some(&m.header),
            AcChargeLoopRequest(m) => Some(&m.header),
            other => other.as_response().map(|r| r.header()),
        }
    }
}
