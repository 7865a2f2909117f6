//! DC_ChargeLoop: energy transfer under EV control
//!
//! The EV repeats DC_ChargeLoopReq with its targets; the EVSE answers with
//! its present output and limits. The host stops or pauses the session by
//! setting the notification in the next response.

use tracing::{debug, warn};
use v2g_proto::{
    ControlMode, DcChargeLoopRequest, DcChargeLoopRequestMode, DcChargeLoopResponse,
    DcChargeLoopResponseMode, DcLoopLimits, DynamicDcLoopResponse, EvseNotification, EvseStatus,
    Message, MobilityNeedsMode, RationalNumber, ResponseCode,
};

use super::{power_delivery, request_of, Event, Handler, State};
use crate::config::DcTransferLimits;
use crate::context::Context;
use crate::control::{PauseCharging, PresentVoltageCurrent, StopCharging};
use crate::feedback::{Feedback, Signal};
use crate::session::Session;

/// Acknowledge delay reported in dynamic mode (s)
pub const ACK_MAX_DELAY_S: u16 = 30;
/// Pause notification delay in dynamic mode (s)
pub const DYNAMIC_PAUSE_DELAY_S: u16 = 60;

#[derive(Debug, Default)]
pub struct DcChargeLoop {
    started: bool,
}

impl Handler for DcChargeLoop {
    fn handle(&mut self, ctx: &mut Context<'_>, event: Event) -> Option<State> {
        match request_of(event, |_| {})? {
            Message::PowerDeliveryRequest(req) => {
                self.started = false;
                power_delivery::handle_in_charge_loop(ctx, &req)
            }
            Message::DcChargeLoopRequest(req) => {
                self.handle_request(ctx, &req);
                None
            }
            other => {
                ctx.sequence_error(other.message_type());
                None
            }
        }
    }
}

impl DcChargeLoop {
    fn handle_request(&mut self, ctx: &mut Context<'_>, req: &DcChargeLoopRequest) {
        if !self.started {
            ctx.signal(Signal::ChargeLoopStarted);
            self.started = true;
        }

        let present = ctx.poll_control_event::<PresentVoltageCurrent>();
        let stop = ctx.poll_control_event::<StopCharging>().is_some_and(|s| s.0);
        let pause = ctx.poll_control_event::<PauseCharging>().is_some_and(|p| p.0);

        let res = handle_request(req, ctx.session, present, stop, pause, &ctx.config.dc_limits);
        if !res.response_code.is_failure() {
            if let DcChargeLoopRequestMode::Scheduled(mode) | DcChargeLoopRequestMode::BptScheduled(mode) =
                &req.control_mode
            {
                ctx.feedback(Feedback::DcChargeLoopTarget {
                    voltage: mode.target_voltage.to_float(),
                    current: mode.target_current.to_float(),
                });
            }
        }
        ctx.respond(res);
    }
}

/// Build the DC_ChargeLoopRes for `req`
///
/// The request's control mode and BPT flavour must match the selected
/// service, otherwise the response is `FAILED`.
pub fn handle_request(
    req: &DcChargeLoopRequest,
    session: &Session,
    present: Option<PresentVoltageCurrent>,
    stop: bool,
    pause: bool,
    limits: &DcTransferLimits,
) -> DcChargeLoopResponse {
    let failed = |response_code| DcChargeLoopResponse {
        header: session.header(),
        response_code,
        ..DcChargeLoopResponse::default()
    };

    if !session.matches(&req.header) {
        return failed(ResponseCode::FailedUnknownSession);
    }

    let Some(selected) = &session.selected_services else {
        return failed(ResponseCode::Failed);
    };

    let (control_mode, bpt) = match &req.control_mode {
        DcChargeLoopRequestMode::Scheduled(_) => (ControlMode::Scheduled, false),
        DcChargeLoopRequestMode::BptScheduled(_) => (ControlMode::Scheduled, true),
        DcChargeLoopRequestMode::Dynamic(_) => (ControlMode::Dynamic, false),
        DcChargeLoopRequestMode::BptDynamic(_) => (ControlMode::Dynamic, true),
    };

    if selected.control_mode != control_mode
        || selected.is_bpt() != bpt
        || !selected.energy_service.is_dc()
    {
        warn!(?control_mode, bpt, "Charge loop request does not match the selected service");
        return failed(ResponseCode::Failed);
    }

    if bpt && limits.discharge.is_none() {
        warn!("BPT charge loop without discharge limits");
        return failed(ResponseCode::Failed);
    }

    let loop_limits = loop_limits(limits, bpt);
    let dynamic = |limits| DynamicDcLoopResponse {
        ack_max_delay: (selected.mobility_needs_mode == MobilityNeedsMode::ProvidedBySecc)
            .then_some(ACK_MAX_DELAY_S),
        limits,
        ..DynamicDcLoopResponse::default()
    };
    let control_mode_res = match &req.control_mode {
        DcChargeLoopRequestMode::Scheduled(_) => DcChargeLoopResponseMode::Scheduled(loop_limits),
        DcChargeLoopRequestMode::BptScheduled(_) => DcChargeLoopResponseMode::BptScheduled(loop_limits),
        DcChargeLoopRequestMode::Dynamic(_) => DcChargeLoopResponseMode::Dynamic(dynamic(loop_limits)),
        DcChargeLoopRequestMode::BptDynamic(_) => {
            DcChargeLoopResponseMode::BptDynamic(dynamic(loop_limits))
        }
    };

    let status = if stop {
        Some(EvseStatus {
            notification_max_delay: 0,
            notification: EvseNotification::Terminate,
        })
    } else if pause {
        Some(EvseStatus {
            notification_max_delay: match control_mode {
                ControlMode::Dynamic => DYNAMIC_PAUSE_DELAY_S,
                ControlMode::Scheduled => 0,
            },
            notification: EvseNotification::Pause,
        })
    } else {
        None
    };

    let present = present.unwrap_or(PresentVoltageCurrent {
        voltage: 0.0,
        current: 0.0,
    });
    debug!(voltage = present.voltage, current = present.current, "Charge loop");

    DcChargeLoopResponse {
        header: session.header(),
        response_code: ResponseCode::Ok,
        status,
        present_current: RationalNumber::from_float(present.current),
        present_voltage: RationalNumber::from_float(present.voltage),
        power_limit_achieved: false,
        current_limit_achieved: false,
        voltage_limit_achieved: false,
        control_mode: control_mode_res,
    }
}

fn loop_limits(limits: &DcTransferLimits, bpt: bool) -> DcLoopLimits {
    let discharge = limits.discharge.filter(|_| bpt);
    DcLoopLimits {
        max_charge_power: Some(limits.max_charge_power),
        min_charge_power: Some(limits.min_charge_power),
        max_charge_current: Some(limits.max_charge_current),
        max_voltage: Some(limits.max_voltage),
        max_discharge_power: discharge.map(|d| d.max_discharge_power),
        min_discharge_power: discharge.map(|d| d.min_discharge_power),
        max_discharge_current: discharge.map(|d| d.max_discharge_current),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DcBptParameterList, DcParameterList};
    use crate::context::testing::Harness;
    use crate::session::SelectedServiceParameters;
    use crate::states::StateId;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use v2g_proto::{
        BptChannel, ChargeProgress, DynamicDcLoopRequest, GeneratorMode, PowerDeliveryRequest,
        Processing, ScheduledDcLoopRequest, ServiceCategory,
    };

    fn dc_list(control_mode: ControlMode) -> DcParameterList {
        DcParameterList {
            control_mode,
            ..DcParameterList::default()
        }
    }

    fn harness(control_mode: ControlMode) -> Harness {
        let mut harness = Harness::established();
        harness.session.selected_services = Some(SelectedServiceParameters::from_dc(
            ServiceCategory::Dc,
            &dc_list(control_mode),
        ));
        harness
    }

    fn scheduled(harness: &Harness) -> DcChargeLoopRequest {
        DcChargeLoopRequest {
            header: harness.header(),
            display_parameters: None,
            meter_info_requested: false,
            present_voltage: RationalNumber::from_float(400.0),
            control_mode: DcChargeLoopRequestMode::Scheduled(ScheduledDcLoopRequest {
                target_current: RationalNumber::from_float(100.0),
                target_voltage: RationalNumber::from_float(410.0),
                ..ScheduledDcLoopRequest::default()
            }),
        }
    }

    #[test]
    fn test_scheduled_loop() {
        let mut harness = harness(ControlMode::Scheduled);
        let mut state = DcChargeLoop::default();
        harness.control(PresentVoltageCurrent {
            voltage: 400.0,
            current: 99.0,
        });

        for _ in 0..2 {
            let event: Event = Message::from(scheduled(&harness)).into();
            let (next, res) = harness.run(|ctx| state.handle(ctx, event));
            assert!(next.is_none());

            let res = res.unwrap();
            let res = res.expect::<DcChargeLoopResponse>();
            assert_eq!(res.response_code, ResponseCode::Ok);
            assert_eq!(res.present_voltage.to_float(), 400.0);
            assert_eq!(res.present_current.to_float(), 99.0);
            assert_eq!(res.status, None);
            match &res.control_mode {
                DcChargeLoopResponseMode::Scheduled(limits) => {
                    assert_eq!(limits.max_voltage, Some(RationalNumber::new(900, 0)));
                }
                other => panic!("expected scheduled mode, got {other:?}"),
            }
        }

        assert_eq!(harness.signals(), vec![Signal::ChargeLoopStarted]);
        assert!(harness.feedback.contains(&Feedback::DcChargeLoopTarget {
            voltage: 410.0,
            current: 100.0
        }));
    }

    #[rstest]
    #[case::dynamic_for_scheduled(ControlMode::Scheduled, DcChargeLoopRequestMode::Dynamic(DynamicDcLoopRequest::default()))]
    #[case::bpt_for_dc(ControlMode::Scheduled, DcChargeLoopRequestMode::BptScheduled(ScheduledDcLoopRequest::default()))]
    #[case::scheduled_for_dynamic(ControlMode::Dynamic, DcChargeLoopRequestMode::Scheduled(ScheduledDcLoopRequest::default()))]
    fn test_mode_mismatch(#[case] selected: ControlMode, #[case] mode: DcChargeLoopRequestMode) {
        let harness = harness(selected);
        let req = DcChargeLoopRequest {
            control_mode: mode,
            ..scheduled(&harness)
        };
        let res = handle_request(
            &req,
            &harness.session,
            None,
            false,
            false,
            &DcTransferLimits::default(),
        );
        assert_eq!(res.response_code, ResponseCode::Failed);
    }

    #[test]
    fn test_bpt_requires_discharge_limits() {
        let mut harness = Harness::established();
        harness.session.selected_services = Some(SelectedServiceParameters::from_dc_bpt(
            &DcBptParameterList {
                dc: DcParameterList::default(),
                bpt_channel: BptChannel::Unified,
                generator_mode: GeneratorMode::GridFollowing,
            },
        ));
        let req = DcChargeLoopRequest {
            control_mode: DcChargeLoopRequestMode::BptScheduled(ScheduledDcLoopRequest::default()),
            ..scheduled(&harness)
        };

        let res = handle_request(&req, &harness.session, None, false, false, &DcTransferLimits::default());
        assert_eq!(res.response_code, ResponseCode::Failed);
    }

    #[test]
    fn test_stop_and_pause_notifications() {
        let harness = harness(ControlMode::Dynamic);
        let req = DcChargeLoopRequest {
            control_mode: DcChargeLoopRequestMode::Dynamic(DynamicDcLoopRequest::default()),
            ..scheduled(&harness)
        };
        let limits = DcTransferLimits::default();

        let res = handle_request(&req, &harness.session, None, true, true, &limits);
        assert_eq!(
            res.status,
            Some(EvseStatus {
                notification_max_delay: 0,
                notification: EvseNotification::Terminate
            })
        );

        let res = handle_request(&req, &harness.session, None, false, true, &limits);
        assert_eq!(
            res.status,
            Some(EvseStatus {
                notification_max_delay: DYNAMIC_PAUSE_DELAY_S,
                notification: EvseNotification::Pause
            })
        );
    }

    #[test]
    fn test_ack_delay_when_evse_provides_needs() {
        let mut harness = Harness::established();
        harness.session.selected_services = Some(SelectedServiceParameters::from_dc(
            ServiceCategory::Dc,
            &DcParameterList {
                control_mode: ControlMode::Dynamic,
                mobility_needs_mode: MobilityNeedsMode::ProvidedBySecc,
                ..DcParameterList::default()
            },
        ));
        let req = DcChargeLoopRequest {
            control_mode: DcChargeLoopRequestMode::Dynamic(DynamicDcLoopRequest::default()),
            ..scheduled(&harness)
        };

        let res = handle_request(&req, &harness.session, None, false, false, &DcTransferLimits::default());
        match res.control_mode {
            DcChargeLoopResponseMode::Dynamic(dynamic) => {
                assert_eq!(dynamic.ack_max_delay, Some(ACK_MAX_DELAY_S));
            }
            other => panic!("expected dynamic mode, got {other:?}"),
        }
    }

    #[test]
    fn test_power_delivery_stop_ends_loop() {
        let mut harness = harness(ControlMode::Scheduled);
        let event: Event = Message::from(PowerDeliveryRequest {
            header: harness.header(),
            processing: Processing::Finished,
            charge_progress: ChargeProgress::Stop,
            bpt_channel_selection: None,
        })
        .into();

        let (next, _) = harness.run(|ctx| DcChargeLoop::default().handle(ctx, event));
        assert_eq!(next.map(|s| s.id()), Some(StateId::DcWeldingDetection));
    }
}
