//! Message structs and datatypes

pub mod ac;
pub mod app_handshake;
pub mod common;
pub mod datatypes;
pub mod dc;
mod rational;

pub use ac::*;
pub use app_handshake::*;
pub use common::*;
pub use datatypes::{
    AcConnector, Authorization, BptChannel, ChargeProgress, ControlMode, DcConnector,
    DisplayParameters, EvseNotification, EvseStatus, GeneratorMode, Header, IntendedService,
    InternetPort, InternetProtocol, MobilityNeedsMode, Parameter, ParameterSet, ParameterValue,
    ParkingStatusType, Pricing, Processing, ResponseCode, SelectedService, Service,
    ServiceCategory, SessionId,
};
pub use dc::*;
pub use rational::RationalNumber;
