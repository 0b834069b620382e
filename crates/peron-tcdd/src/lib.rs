//! TCDD ticket-search API client for peron.
//!
//! This crate provides:
//! - Wire types mirroring the upstream search contract
//! - A `reqwest`-based client with terminal/transient error classification
//! - The [`TicketSearch`] trait consumed by the monitoring engine

mod client;
mod error;
mod types;

pub use client::{TcddClient, TicketSearch};
pub use error::TcddError;
pub use types::{
    CabinAvailability, CabinClass, FareInfo, MinPrice, PassengerTypeCount, RouteQuery,
    SearchRequest, SearchRoute, Segment, Station, Train, TrainAvailability, TrainLeg,
    TrainResponse,
};
