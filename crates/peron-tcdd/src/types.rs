//! Wire types for the TCDD ticket-search API.

use serde::{Deserialize, Serialize};

/// Passenger type id for a single adult, the only kind of search we issue.
const ADULT_PASSENGER_TYPE: i64 = 0;

/// A station as returned by the station-list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    pub id: i64,
    #[serde(default)]
    pub unit_id: f64,
    pub name: String,
    #[serde(rename = "stationCode", default)]
    pub code: String,
    #[serde(rename = "stationTrainTypes", default)]
    pub train_types: Vec<String>,
}

/// One route/date search on behalf of one recipient.
///
/// This is the request contract the monitoring engine depends on; the full
/// upstream payload is derived from it via [`RouteQuery::to_request`].
#[derive(Debug, Clone, PartialEq)]
pub struct RouteQuery {
    pub from_id: i64,
    pub from_name: String,
    pub to_id: i64,
    pub to_name: String,
    /// Travel date in `DD-MM-YYYY[ HH:MM:SS]` form, passed through verbatim.
    pub date: String,
}

impl RouteQuery {
    /// Build the upstream search payload: one route, one adult, no reservation.
    pub fn to_request(&self) -> SearchRequest {
        SearchRequest {
            search_routes: vec![SearchRoute {
                departure_station_id: self.from_id,
                departure_station_name: self.from_name.clone(),
                arrival_station_id: self.to_id,
                arrival_station_name: self.to_name.clone(),
                departure_date: self.date.clone(),
            }],
            passenger_type_counts: vec![PassengerTypeCount {
                id: ADULT_PASSENGER_TYPE,
                count: 1,
            }],
            search_reservation: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub search_routes: Vec<SearchRoute>,
    pub passenger_type_counts: Vec<PassengerTypeCount>,
    pub search_reservation: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRoute {
    pub departure_station_id: i64,
    pub departure_station_name: String,
    pub arrival_station_id: i64,
    pub arrival_station_name: String,
    pub departure_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassengerTypeCount {
    pub id: i64,
    pub count: u32,
}

/// Top-level search response: legs, each with availabilities, each with trains.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainResponse {
    #[serde(default)]
    pub train_legs: Vec<TrainLeg>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainLeg {
    #[serde(default)]
    pub train_availabilities: Vec<TrainAvailability>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainAvailability {
    #[serde(default)]
    pub trains: Vec<Train>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Train {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub train_number: String,
    pub min_price: Option<MinPrice>,
    #[serde(default)]
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub available_fare_info: Vec<FareInfo>,
}

/// A travel segment; departure/arrival are epoch milliseconds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub departure_time: i64,
    pub arrival_time: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FareInfo {
    #[serde(default)]
    pub cabin_classes: Vec<CabinAvailability>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CabinAvailability {
    #[serde(default)]
    pub availability_count: f64,
    pub cabin_class: Option<CabinClass>,
    #[serde(default)]
    pub min_price: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CabinClass {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinPrice {
    pub price_amount: f64,
    #[serde(rename = "priceCurrency", default)]
    pub currency: String,
}
