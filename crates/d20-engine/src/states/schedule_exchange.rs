//! ScheduleExchange: the power schedule for Scheduled or Dynamic control
//!
//! The EVSE offers a single charging schedule covering one day at its maximum
//! charge power. Dynamic mode carries no schedule.

use tracing::{info, warn};
use v2g_proto::{
    ControlMode, DynamicScheduleResponse, Message, PowerSchedule, PowerScheduleEntry, Processing,
    RationalNumber, ResponseCode, ScheduleExchangeRequest, ScheduleExchangeRequestMode,
    ScheduleExchangeResponse, ScheduleExchangeResponseMode, ScheduleTuple,
    ScheduledScheduleResponse,
};

use super::{request_of, DcCableCheck, Event, Handler, PowerDelivery, State};
use crate::context::Context;
use crate::feedback::Signal;
use crate::session::Session;

/// Length of the single offered schedule entry (s)
pub const SCHEDULE_DURATION_S: u32 = 86_400;

#[derive(Debug, Default)]
pub struct ScheduleExchange;

impl Handler for ScheduleExchange {
    fn handle(&mut self, ctx: &mut Context<'_>, event: Event) -> Option<State> {
        match request_of(event, |_| {})? {
            Message::ScheduleExchangeRequest(req) => {
                let dc = ctx
                    .session
                    .selected_services
                    .as_ref()
                    .is_some_and(|s| s.energy_service.is_dc());
                let max_power = if dc {
                    ctx.config.dc_limits.max_charge_power
                } else {
                    ctx.config.ac_limits.max_charge_power
                };

                let res = handle_request(&req, ctx.session, max_power);
                let ok = !res.response_code.is_failure();
                ctx.respond(res);
                if !ok {
                    return None;
                }

                ctx.signal(Signal::SetupFinished);
                if dc {
                    Some(DcCableCheck::default().into())
                } else {
                    Some(PowerDelivery::default().into())
                }
            }
            other => {
                ctx.sequence_error(other.message_type());
                None
            }
        }
    }
}

/// Build the ScheduleExchangeRes for `req`
pub fn handle_request(
    req: &ScheduleExchangeRequest,
    session: &Session,
    max_power: RationalNumber,
) -> ScheduleExchangeResponse {
    let failed = |response_code| ScheduleExchangeResponse {
        header: session.header(),
        response_code,
        ..ScheduleExchangeResponse::default()
    };

    if !session.matches(&req.header) {
        return failed(ResponseCode::FailedUnknownSession);
    }

    let Some(selected) = &session.selected_services else {
        warn!("Schedule exchange without selected services");
        return failed(ResponseCode::Failed);
    };

    let control_mode = match (&req.control_mode, selected.control_mode) {
        (ScheduleExchangeRequestMode::Scheduled(_), ControlMode::Scheduled) => {
            let schedule = ScheduleTuple {
                schedule_tuple_id: 1,
                charging_schedule: PowerSchedule {
                    time_anchor: req.header.timestamp,
                    entries: vec![PowerScheduleEntry {
                        duration: SCHEDULE_DURATION_S,
                        power: max_power,
                    }],
                },
                discharging_schedule: None,
            };
            ScheduleExchangeResponseMode::Scheduled(ScheduledScheduleResponse {
                schedule_tuples: vec![schedule],
            })
        }
        (ScheduleExchangeRequestMode::Dynamic(_), ControlMode::Dynamic) => {
            ScheduleExchangeResponseMode::Dynamic(DynamicScheduleResponse::default())
        }
        (_, selected_mode) => {
            warn!(?selected_mode, "Schedule request does not match the selected control mode");
            return failed(ResponseCode::Failed);
        }
    };

    info!(max_power = max_power.to_float(), "Schedule offered");

    ScheduleExchangeResponse {
        header: session.header(),
        response_code: ResponseCode::Ok,
        processing: Processing::Finished,
        go_to_pause: None,
        control_mode,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AcParameterList, DcParameterList};
    use crate::context::testing::Harness;
    use crate::session::SelectedServiceParameters;
    use crate::states::StateId;
    use pretty_assertions::assert_eq;
    use v2g_proto::{
        AcConnector, DynamicScheduleRequest, MobilityNeedsMode, Pricing, ScheduledScheduleRequest,
        ServiceCategory,
    };

    fn selected_dc(control_mode: ControlMode) -> SelectedServiceParameters {
        SelectedServiceParameters::from_dc(
            ServiceCategory::Dc,
            &DcParameterList {
                control_mode,
                ..DcParameterList::default()
            },
        )
    }

    fn scheduled(harness: &Harness) -> ScheduleExchangeRequest {
        ScheduleExchangeRequest {
            header: harness.header(),
            max_supporting_points: 1024,
            control_mode: ScheduleExchangeRequestMode::Scheduled(ScheduledScheduleRequest::default()),
        }
    }

    #[test]
    fn test_scheduled_single_entry() {
        let mut harness = Harness::established();
        harness.session.selected_services = Some(selected_dc(ControlMode::Scheduled));
        let req = scheduled(&harness);

        let res = handle_request(&req, &harness.session, RationalNumber::new(150, 3));
        assert_eq!(res.response_code, ResponseCode::Ok);
        assert_eq!(res.processing, Processing::Finished);
        assert_eq!(
            res.control_mode,
            ScheduleExchangeResponseMode::Scheduled(ScheduledScheduleResponse {
                schedule_tuples: vec![ScheduleTuple {
                    schedule_tuple_id: 1,
                    charging_schedule: PowerSchedule {
                        time_anchor: 1_691_411_798,
                        entries: vec![PowerScheduleEntry {
                            duration: SCHEDULE_DURATION_S,
                            power: RationalNumber::new(150, 3),
                        }],
                    },
                    discharging_schedule: None,
                }],
            })
        );
    }

    #[test]
    fn test_dynamic() {
        let mut harness = Harness::established();
        harness.session.selected_services = Some(selected_dc(ControlMode::Dynamic));
        let req = ScheduleExchangeRequest {
            control_mode: ScheduleExchangeRequestMode::Dynamic(DynamicScheduleRequest::default()),
            ..scheduled(&harness)
        };

        let res = handle_request(&req, &harness.session, RationalNumber::new(150, 3));
        assert_eq!(res.response_code, ResponseCode::Ok);
        assert_eq!(
            res.control_mode,
            ScheduleExchangeResponseMode::Dynamic(DynamicScheduleResponse::default())
        );
    }

    #[test]
    fn test_mode_mismatch_fails() {
        let mut harness = Harness::established();
        harness.session.selected_services = Some(selected_dc(ControlMode::Dynamic));
        let req = scheduled(&harness);

        let res = handle_request(&req, &harness.session, RationalNumber::new(150, 3));
        assert_eq!(res.response_code, ResponseCode::Failed);
    }

    #[test]
    fn test_unknown_session() {
        let mut harness = Harness::established();
        harness.session.selected_services = Some(selected_dc(ControlMode::Scheduled));
        let mut req = scheduled(&harness);
        req.header.session_id = v2g_proto::SessionId::new([1; 8]);

        let res = handle_request(&req, &harness.session, RationalNumber::new(150, 3));
        assert_eq!(res.response_code, ResponseCode::FailedUnknownSession);
    }

    #[test]
    fn test_dc_goes_to_cable_check() {
        let mut harness = Harness::established();
        harness.session.selected_services = Some(selected_dc(ControlMode::Scheduled));
        let event: Event = Message::from(scheduled(&harness)).into();

        let (next, res) = harness.run(|ctx| ScheduleExchange.handle(ctx, event));
        assert_eq!(next.map(|s| s.id()), Some(StateId::DcCableCheck));
        assert_eq!(res.unwrap().response_code(), Some(ResponseCode::Ok));
        assert_eq!(harness.signals(), vec![Signal::SetupFinished]);
    }

    #[test]
    fn test_ac_goes_to_power_delivery() {
        let mut harness = Harness::established();
        let list = AcParameterList {
            connector: AcConnector::SinglePhase,
            control_mode: ControlMode::Scheduled,
            mobility_needs_mode: MobilityNeedsMode::ProvidedByEvcc,
            nominal_voltage: RationalNumber::new(230, 0),
            pricing: Pricing::NoPricing,
        };
        harness.session.selected_services =
            Some(SelectedServiceParameters::from_ac(ServiceCategory::Ac, &list));
        let event: Event = Message::from(scheduled(&harness)).into();

        let (next, res) = harness.run(|ctx| ScheduleExchange.handle(ctx, event));
        assert_eq!(next.map(|s| s.id()), Some(StateId::PowerDelivery));

        let res = res.unwrap();
        match &res.expect::<ScheduleExchangeResponse>().control_mode {
            ScheduleExchangeResponseMode::Scheduled(s) => {
                assert_eq!(
                    s.schedule_tuples[0].charging_schedule.entries[0].power,
                    RationalNumber::new(22, 3)
                );
            }
            other => panic!("expected scheduled mode, got {other:?}"),
        }
    }

    #[test]
    fn test_failure_stays() {
        let mut harness = Harness::established();
        let event: Event = Message::from(scheduled(&harness)).into();

        let (next, res) = harness.run(|ctx| ScheduleExchange.handle(ctx, event));
        assert!(next.is_none());
        assert_eq!(res.unwrap().response_code(), Some(ResponseCode::Failed));
        assert!(harness.signals().is_empty());
    }
}
