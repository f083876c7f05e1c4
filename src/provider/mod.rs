pub mod serpapi;

use async_trait::async_trait;

use crate::models::flight::{FlightSearchRequest, FlightSearchResponse};
use crate::models::hotel::{HotelSearchRequest, HotelSearchResponse};

#[cfg(test)]
use mockall::automock;

/// Flight search backend. Failures are reported in the response's `error`
/// field, never raised.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait FlightSearchProvider: Send + Sync + 'static {
    async fn search_flights(&self, request: &FlightSearchRequest) -> FlightSearchResponse;
}

/// Hotel search backend. Failures are reported in the response's `error`
/// field, never raised.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait HotelSearchProvider: Send + Sync + 'static {
    async fn search_hotels(&self, request: &HotelSearchRequest) -> HotelSearchResponse;
}

pub use serpapi::SerpApiClient;
