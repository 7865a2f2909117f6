//! Simulated EV for engine integration tests
//!
//! Requests are framed and encoded with the JSON development codec and go
//! through `Engine::handle_payload`, so every test also exercises the
//! framer and the envelope.

#![allow(dead_code)]

use std::sync::Arc;

use d20_engine::config::AcParameterList;
use d20_engine::{
    AuthorizationStatus, CableCheckFinished, ContactorsClosed, ControlEvent, Engine, Event,
    Feedback, PresentVoltageCurrent, SessionConfig, Signal, StateId,
};
use v2g_proto::{
    envelope, read_header, AcChargeParameterDiscoveryRequest, AcConnector, AcCpdRequestMode,
    AcCpdRequestParams, AppProtocol, Authorization, AuthorizationRequest,
    AuthorizationSetupRequest, ChargeProgress, ControlMode, DcCableCheckRequest,
    DcChargeParameterDiscoveryRequest, DcPreChargeRequest, Header, JsonCodec, Message,
    MessageKind, MobilityNeedsMode, PayloadType, PowerDeliveryRequest, Pricing, Processing,
    RationalNumber, ScheduleExchangeRequest, ScheduleExchangeRequestMode,
    ScheduledScheduleRequest, SelectedService, ServiceCategory, ServiceDetailRequest,
    ServiceDiscoveryRequest, ServiceSelectionRequest, SessionId, SessionSetupRequest,
    SessionSetupResponse, SupportedAppProtocolRequest, HEADER_LENGTH, ISO20_AC_NAMESPACE,
    ISO20_DC_NAMESPACE,
};

pub const EVCC_ID: &str = "WMIV1234567890ABCDEX";
pub const TIMESTAMP: u64 = 1_691_411_798;

pub struct Ev {
    pub engine: Engine,
    codec: JsonCodec,
    pub session_id: SessionId,
}

impl Ev {
    pub fn new(config: SessionConfig) -> Self {
        Self::with_engine(Engine::new(Arc::new(config), Arc::new(JsonCodec)))
    }

    pub fn with_engine(engine: Engine) -> Self {
        Self {
            engine,
            codec: JsonCodec,
            session_id: SessionId::ZERO,
        }
    }

    pub fn header(&self) -> Header {
        Header {
            session_id: self.session_id,
            timestamp: TIMESTAMP,
        }
    }

    /// Send a request over the byte interface; `None` when the engine stays silent
    pub fn try_send(&mut self, message: impl Into<Message>) -> Option<Message> {
        let frame = envelope::frame(&self.codec, message.into()).unwrap();
        let (len, payload_type) = read_header(&frame, &PayloadType::SESSION).unwrap();
        assert_eq!(len as usize, frame.len() - HEADER_LENGTH);

        let out = self
            .engine
            .handle_payload(payload_type, &frame[HEADER_LENGTH..])
            .unwrap()?;
        Some(self.decode(&out))
    }

    pub fn send(&mut self, message: impl Into<Message>) -> Message {
        let message = message.into();
        let ty = message.message_type();
        self.try_send(message)
            .unwrap_or_else(|| panic!("no response to {ty}"))
    }

    /// Send a request and unwrap the response as `T`
    pub fn exchange<T: MessageKind>(&mut self, message: impl Into<Message>) -> T {
        match self.send(message).into_kind::<T>() {
            Ok(response) => response,
            Err(other) => panic!("unexpected response {}", other.message_type()),
        }
    }

    /// Control event from the host; returns a response released by it
    pub fn control(&mut self, event: impl Into<ControlEvent>) -> Option<Message> {
        self.engine.handle(Event::Control(event.into()))
    }

    pub fn decode(&self, frame: &[u8]) -> Message {
        let (len, payload_type) = read_header(frame, &PayloadType::SESSION).unwrap();
        assert_eq!(len as usize, frame.len() - HEADER_LENGTH);
        envelope::decode_payload(&self.codec, payload_type, &frame[HEADER_LENGTH..]).unwrap()
    }

    pub fn signals(&mut self) -> Vec<Signal> {
        self.engine
            .drain_feedback()
            .into_iter()
            .filter_map(|f| match f {
                Feedback::Signal(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    /// SupportedAppProtocol and SessionSetup; remembers the session id
    pub fn setup(&mut self, namespace: &str) -> SessionSetupResponse {
        self.send(SupportedAppProtocolRequest {
            app_protocols: vec![AppProtocol {
                protocol_namespace: namespace.to_string(),
                version_major: 1,
                version_minor: 0,
                schema_id: 1,
                priority: 1,
            }],
        });

        let res: SessionSetupResponse = self.exchange(SessionSetupRequest {
            header: self.header(),
            evcc_id: EVCC_ID.to_string(),
        });
        self.session_id = res.header.session_id;
        res
    }

    pub fn setup_dc(&mut self) -> SessionSetupResponse {
        self.setup(ISO20_DC_NAMESPACE)
    }

    pub fn setup_ac(&mut self) -> SessionSetupResponse {
        self.setup(ISO20_AC_NAMESPACE)
    }
}

/// Station offering AC only, one three-phase parameter set
pub fn ac_config() -> SessionConfig {
    SessionConfig {
        supported_energy_services: vec![ServiceCategory::Ac],
        ac_parameter_list: vec![AcParameterList {
            connector: AcConnector::ThreePhase,
            control_mode: ControlMode::Scheduled,
            mobility_needs_mode: MobilityNeedsMode::ProvidedByEvcc,
            nominal_voltage: RationalNumber::new(400, 0),
            pricing: Pricing::NoPricing,
        }],
        ..SessionConfig::default()
    }
}

impl Ev {
    /// Fresh DC session driven with valid requests until `target` is current
    pub fn dc_at(target: StateId) -> Self {
        let mut ev = Self::new(SessionConfig::default());
        ev.setup_dc();
        ev.walk_to(target, ServiceCategory::Dc);
        ev
    }

    /// Fresh AC session driven with valid requests until `target` is current
    pub fn ac_at(target: StateId) -> Self {
        let mut ev = Self::new(ac_config());
        ev.setup_ac();
        ev.walk_to(target, ServiceCategory::Ac);
        ev
    }

    fn walk_to(&mut self, target: StateId, service: ServiceCategory) {
        while self.engine.current_state() != target {
            let state = self.engine.current_state();
            assert!(!self.engine.is_terminated(), "session ended in {state}");
            self.step(state, service);
            assert_ne!(self.engine.current_state(), state, "stuck in {state}");
        }
        self.signals();
    }

    /// One valid exchange out of `state`
    fn step(&mut self, state: StateId, service: ServiceCategory) {
        let header = self.header();
        match state {
            StateId::AuthorizationSetup => {
                self.send(AuthorizationSetupRequest { header });
            }
            StateId::Authorization => {
                self.control(AuthorizationStatus::Accepted);
                self.send(AuthorizationRequest {
                    header,
                    selected_authorization_service: Authorization::Eim,
                    pnc_params: None,
                });
            }
            StateId::ServiceDiscovery => {
                self.send(ServiceDiscoveryRequest {
                    header,
                    supported_service_ids: None,
                });
            }
            StateId::ServiceDetail => {
                self.send(ServiceDetailRequest { header, service });
            }
            StateId::ServiceSelection => {
                self.send(ServiceSelectionRequest {
                    header,
                    selected_energy_transfer_service: SelectedService {
                        service_id: service,
                        parameter_set_id: 0,
                    },
                    selected_vas_list: None,
                });
            }
            StateId::DcChargeParameterDiscovery => {
                self.send(DcChargeParameterDiscoveryRequest {
                    header,
                    ..Default::default()
                });
            }
            StateId::AcChargeParameterDiscovery => {
                self.send(AcChargeParameterDiscoveryRequest {
                    header,
                    transfer_mode: AcCpdRequestMode::Ac(AcCpdRequestParams {
                        max_charge_power: RationalNumber::new(11, 3),
                        min_charge_power: RationalNumber::new(1380, 0),
                        ..AcCpdRequestParams::default()
                    }),
                });
            }
            StateId::ScheduleExchange => {
                self.send(ScheduleExchangeRequest {
                    header,
                    max_supporting_points: 1024,
                    control_mode: ScheduleExchangeRequestMode::Scheduled(
                        ScheduledScheduleRequest::default(),
                    ),
                });
            }
            StateId::DcCableCheck => {
                self.control(CableCheckFinished(true));
                self.send(DcCableCheckRequest { header });
            }
            StateId::DcPreCharge => {
                self.control(PresentVoltageCurrent {
                    voltage: 400.0,
                    current: 0.0,
                });
                self.send(DcPreChargeRequest {
                    header,
                    processing: Processing::Ongoing,
                    present_voltage: RationalNumber::new(400, 0),
                    target_voltage: RationalNumber::new(400, 0),
                });
            }
            StateId::PowerDelivery => {
                self.control(ContactorsClosed(true));
                self.send(power_delivery(header, ChargeProgress::Start));
            }
            StateId::DcChargeLoop | StateId::AcChargeLoop => {
                self.send(power_delivery(header, ChargeProgress::Stop));
            }
            other => panic!("no way forward from {other}"),
        }
    }
}

pub fn power_delivery(header: Header, charge_progress: ChargeProgress) -> PowerDeliveryRequest {
    PowerDeliveryRequest {
        header,
        processing: Processing::Finished,
        charge_progress,
        bpt_channel_selection: None,
    }
}
