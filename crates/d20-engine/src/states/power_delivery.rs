//! PowerDelivery: closing the contactors before energy transfer
//!
//! PowerDeliveryRes carries no processing field, so a Start request is held
//! until the host reports the contactors closed. The response is then sent
//! from the control event. If the Ongoing timer expires first the held
//! request is answered with `FAILED_ContactorError`.

use tracing::{info, warn};
use v2g_proto::{
    ChargeProgress, Message, MessageType, PowerDeliveryRequest, PowerDeliveryResponse,
    Processing, ResponseCode,
};

use super::{
    dc_pre_charge, AcChargeLoop, DcChargeLoop, DcWeldingDetection, Event, Handler, SessionStop,
    State,
};
use crate::context::Context;
use crate::control::{ContactorsClosed, ControlEvent};
use crate::feedback::Signal;
use crate::timeout::{OngoingWait, TimeoutKind};

#[derive(Debug, Default)]
pub struct PowerDelivery {
    wait: OngoingWait,
    close_requested: bool,
    /// A Start request waits for the contactors
    held: bool,
}

impl Handler for PowerDelivery {
    fn handle(&mut self, ctx: &mut Context<'_>, event: Event) -> Option<State> {
        match event {
            Event::Control(ControlEvent::ContactorsClosed(ContactorsClosed(true))) if self.held => {
                self.held = false;
                self.start_charge_loop(ctx)
            }
            Event::Control(_) => None,
            Event::Timeout(TimeoutKind::Ongoing) if self.held => {
                warn!("Contactors not closed in time");
                self.held = false;
                self.wait = OngoingWait::default();
                respond(ctx, ResponseCode::FailedContactorError);
                None
            }
            Event::Timeout(kind) => {
                self.wait.on_timeout(kind);
                None
            }
            Event::IncomingMessage(Message::DcPreChargeRequest(req)) if is_dc(ctx) => {
                if ctx.is_known_session(&req.header) {
                    dc_pre_charge::respond(ctx, &req);
                } else {
                    ctx.respond_failure(MessageType::DcPreChargeRequest, ResponseCode::FailedUnknownSession);
                }
                None
            }
            Event::IncomingMessage(Message::PowerDeliveryRequest(req)) => self.handle_request(ctx, &req),
            Event::IncomingMessage(other) => {
                ctx.sequence_error(other.message_type());
                None
            }
        }
    }
}

impl PowerDelivery {
    fn handle_request(&mut self, ctx: &mut Context<'_>, req: &PowerDeliveryRequest) -> Option<State> {
        if !ctx.is_known_session(&req.header) {
            ctx.respond_failure(MessageType::PowerDeliveryRequest, ResponseCode::FailedUnknownSession);
            return None;
        }

        if self.wait.take_expired() {
            respond(ctx, ResponseCode::Failed);
            return None;
        }

        // The EV is still preparing; nothing to switch yet
        if req.processing != Processing::Finished {
            respond(ctx, ResponseCode::Ok);
            return None;
        }

        match req.charge_progress {
            ChargeProgress::Start => {
                if !self.close_requested {
                    ctx.signal(Signal::CloseContactor);
                    self.close_requested = true;
                }
                match ctx.poll_control_event::<ContactorsClosed>() {
                    Some(ContactorsClosed(true)) => self.start_charge_loop(ctx),
                    _ => {
                        info!("Waiting for contactors");
                        self.wait.wait(ctx);
                        self.held = true;
                        None
                    }
                }
            }
            ChargeProgress::Stop => {
                respond(ctx, ResponseCode::Ok);
                stop_target(ctx)
            }
            ChargeProgress::Standby => {
                respond(ctx, ResponseCode::Ok);
                None
            }
            ChargeProgress::ScheduleRenegotiation => {
                warn!("Schedule renegotiation is not supported");
                respond(ctx, ResponseCode::Failed);
                None
            }
        }
    }

    fn start_charge_loop(&mut self, ctx: &mut Context<'_>) -> Option<State> {
        self.wait.finish(ctx);
        respond(ctx, ResponseCode::Ok);
        info!("Contactors closed, starting charge loop");
        if is_dc(ctx) {
            Some(DcChargeLoop::default().into())
        } else {
            Some(AcChargeLoop::default().into())
        }
    }
}

fn is_dc(ctx: &Context<'_>) -> bool {
    ctx.session
        .selected_services
        .as_ref()
        .is_some_and(|s| s.energy_service.is_dc())
}

fn respond(ctx: &mut Context<'_>, response_code: ResponseCode) {
    ctx.respond(PowerDeliveryResponse {
        header: ctx.header(),
        response_code,
        status: None,
    });
}

/// State after the energy transfer was stopped
fn stop_target(ctx: &Context<'_>) -> Option<State> {
    if is_dc(ctx) {
        Some(DcWeldingDetection::default().into())
    } else {
        Some(SessionStop.into())
    }
}

/// PowerDeliveryReq received inside a charge loop
///
/// Stop ends the loop; Start and Standby keep it.
pub fn handle_in_charge_loop(ctx: &mut Context<'_>, req: &PowerDeliveryRequest) -> Option<State> {
    if !ctx.is_known_session(&req.header) {
        ctx.respond_failure(MessageType::PowerDeliveryRequest, ResponseCode::FailedUnknownSession);
        return None;
    }

    match req.charge_progress {
        ChargeProgress::Stop => {
            respond(ctx, ResponseCode::Ok);
            ctx.signal(Signal::ChargeLoopFinished);
            ctx.signal(Signal::OpenContactor);
            stop_target(ctx)
        }
        ChargeProgress::Start | ChargeProgress::Standby => {
            respond(ctx, ResponseCode::Ok);
            None
        }
        ChargeProgress::ScheduleRenegotiation => {
            warn!("Schedule renegotiation is not supported");
            respond(ctx, ResponseCode::Failed);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AcParameterList, DcParameterList};
    use crate::context::testing::Harness;
    use crate::control::PresentVoltageCurrent;
    use crate::session::SelectedServiceParameters;
    use crate::states::StateId;
    use v2g_proto::{
        AcConnector, ControlMode, DcPreChargeRequest, DcPreChargeResponse, MobilityNeedsMode,
        Pricing, RationalNumber, ServiceCategory,
    };

    fn dc_harness() -> Harness {
        let mut harness = Harness::established();
        harness.session.selected_services = Some(SelectedServiceParameters::from_dc(
            ServiceCategory::Dc,
            &DcParameterList::default(),
        ));
        harness
    }

    fn ac_harness() -> Harness {
        let mut harness = Harness::established();
        let list = AcParameterList {
            connector: AcConnector::ThreePhase,
            control_mode: ControlMode::Scheduled,
            mobility_needs_mode: MobilityNeedsMode::ProvidedByEvcc,
            nominal_voltage: RationalNumber::new(400, 0),
            pricing: Pricing::NoPricing,
        };
        harness.session.selected_services =
            Some(SelectedServiceParameters::from_ac(ServiceCategory::Ac, &list));
        harness
    }

    fn request(harness: &Harness, charge_progress: ChargeProgress) -> PowerDeliveryRequest {
        PowerDeliveryRequest {
            header: harness.header(),
            processing: Processing::Finished,
            charge_progress,
            bpt_channel_selection: None,
        }
    }

    fn power_delivery(harness: &Harness, charge_progress: ChargeProgress) -> Event {
        Message::from(request(harness, charge_progress)).into()
    }

    #[test]
    fn test_start_with_contactors_closed() {
        let mut harness = dc_harness();
        harness.control(ContactorsClosed(true));
        let event = power_delivery(&harness, ChargeProgress::Start);

        let (next, res) = harness.run(|ctx| PowerDelivery::default().handle(ctx, event));
        assert_eq!(next.map(|s| s.id()), Some(StateId::DcChargeLoop));
        assert_eq!(res.unwrap().response_code(), Some(ResponseCode::Ok));
        assert_eq!(harness.signals(), vec![Signal::CloseContactor]);
    }

    #[test]
    fn test_start_held_until_contactors_close() {
        let mut harness = ac_harness();
        let mut state = PowerDelivery::default();

        let event = power_delivery(&harness, ChargeProgress::Start);
        let (next, res) = harness.run(|ctx| state.handle(ctx, event));
        assert!(next.is_none());
        assert!(res.is_none());
        assert!(harness.timeouts.is_armed(TimeoutKind::Ongoing));

        // Unrelated control events do not release the request
        let (next, res) = harness.run(|ctx| {
            state.handle(
                ctx,
                ControlEvent::from(PresentVoltageCurrent {
                    voltage: 0.0,
                    current: 0.0,
                })
                .into(),
            )
        });
        assert!(next.is_none());
        assert!(res.is_none());

        harness.control(ContactorsClosed(true));
        let (next, res) =
            harness.run(|ctx| state.handle(ctx, ControlEvent::from(ContactorsClosed(true)).into()));
        assert_eq!(next.map(|s| s.id()), Some(StateId::AcChargeLoop));
        assert_eq!(res.unwrap().response_code(), Some(ResponseCode::Ok));
        assert!(!harness.timeouts.is_armed(TimeoutKind::Ongoing));
    }

    #[test]
    fn test_contactor_timeout() {
        let mut harness = dc_harness();
        let mut state = PowerDelivery::default();

        let event = power_delivery(&harness, ChargeProgress::Start);
        harness.run(|ctx| state.handle(ctx, event));

        let (next, res) = harness.run(|ctx| state.handle(ctx, Event::Timeout(TimeoutKind::Ongoing)));
        assert!(next.is_none());
        assert_eq!(
            res.unwrap().response_code(),
            Some(ResponseCode::FailedContactorError)
        );
    }

    #[test]
    fn test_ev_still_processing() {
        let mut harness = dc_harness();
        let mut req = request(&harness, ChargeProgress::Start);
        req.processing = Processing::Ongoing;

        let (next, res) =
            harness.run(|ctx| PowerDelivery::default().handle(ctx, Message::from(req).into()));
        assert!(next.is_none());
        assert_eq!(res.unwrap().response_code(), Some(ResponseCode::Ok));
        assert!(harness.signals().is_empty());
    }

    #[test]
    fn test_stop_before_loop() {
        let mut harness = dc_harness();
        let event = power_delivery(&harness, ChargeProgress::Stop);
        let (next, _) = harness.run(|ctx| PowerDelivery::default().handle(ctx, event));
        assert_eq!(next.map(|s| s.id()), Some(StateId::DcWeldingDetection));

        let mut harness = ac_harness();
        let event = power_delivery(&harness, ChargeProgress::Stop);
        let (next, _) = harness.run(|ctx| PowerDelivery::default().handle(ctx, event));
        assert_eq!(next.map(|s| s.id()), Some(StateId::SessionStop));
    }

    #[test]
    fn test_schedule_renegotiation_fails() {
        let mut harness = dc_harness();
        let event = power_delivery(&harness, ChargeProgress::ScheduleRenegotiation);
        let (next, res) = harness.run(|ctx| PowerDelivery::default().handle(ctx, event));
        assert!(next.is_none());
        assert_eq!(res.unwrap().response_code(), Some(ResponseCode::Failed));
    }

    #[test]
    fn test_pre_charge_repeat() {
        let mut harness = dc_harness();
        let event: Event = Message::from(DcPreChargeRequest {
            header: harness.header(),
            processing: Processing::Finished,
            present_voltage: RationalNumber::new(400, 0),
            target_voltage: RationalNumber::new(400, 0),
        })
        .into();

        let (next, res) = harness.run(|ctx| PowerDelivery::default().handle(ctx, event));
        assert!(next.is_none());
        let res = res.unwrap();
        assert_eq!(res.expect::<DcPreChargeResponse>().response_code, ResponseCode::Ok);
    }

    #[test]
    fn test_pre_charge_rejected_for_ac() {
        let mut harness = ac_harness();
        let event: Event = Message::from(DcPreChargeRequest {
            header: harness.header(),
            ..DcPreChargeRequest::default()
        })
        .into();

        let (_, res) = harness.run(|ctx| PowerDelivery::default().handle(ctx, event));
        assert_eq!(
            res.unwrap().response_code(),
            Some(ResponseCode::FailedSequenceError)
        );
    }

    #[test]
    fn test_stop_in_charge_loop() {
        let mut harness = dc_harness();
        let req = request(&harness, ChargeProgress::Stop);

        let (next, res) = harness.run(|ctx| handle_in_charge_loop(ctx, &req));
        assert_eq!(next.map(|s| s.id()), Some(StateId::DcWeldingDetection));
        assert_eq!(res.unwrap().response_code(), Some(ResponseCode::Ok));
        assert_eq!(
            harness.signals(),
            vec![Signal::ChargeLoopFinished, Signal::OpenContactor]
        );
    }
}
