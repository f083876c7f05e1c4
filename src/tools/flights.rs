use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::location::resolve_airport_code;
use crate::models::common::parse_iso_date;
use crate::models::deserialize_flexible_int;
use crate::models::flight::{
    FlightOption, FlightSearchRequest, FlightSearchResponse, PriceInsights, TravelClass, TripType,
};
use crate::provider::FlightSearchProvider;

fn default_passengers() -> i64 {
    1
}

fn default_trip_type() -> String {
    "round_trip".to_string()
}

fn default_travel_class() -> String {
    "economy".to_string()
}

/// Arguments of the `search_flights` tool.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct SearchFlightsParams {
    #[schemars(description = "Departure airport code (e.g., 'JFK', 'NYC') or city name")]
    pub departure_location: String,

    #[schemars(description = "Arrival airport code (e.g., 'LAX', 'Los Angeles') or city name")]
    pub arrival_location: String,

    #[schemars(description = "Departure date in YYYY-MM-DD format")]
    pub departure_date: String,

    #[schemars(description = "Return date in YYYY-MM-DD format (required for round trip)")]
    #[serde(default)]
    pub return_date: Option<String>,

    #[schemars(description = "Number of passengers (default: 1)")]
    #[schemars(with = "i64")]
    #[serde(default = "default_passengers", deserialize_with = "deserialize_flexible_int")]
    pub passengers: i64,

    #[schemars(
        description = "Type of trip - 'one_way', 'round_trip', or 'multi_city' (default: 'round_trip')"
    )]
    #[serde(default = "default_trip_type")]
    pub trip_type: String,

    #[schemars(
        description = "Travel class - 'economy', 'premium_economy', 'business', or 'first' (default: 'economy')"
    )]
    #[serde(default = "default_travel_class")]
    pub travel_class: String,
}

#[derive(Debug, Serialize)]
pub struct FlightSearchEcho {
    pub departure: String,
    pub arrival: String,
    pub departure_date: String,
    pub return_date: Option<String>,
    pub passengers: i64,
    pub trip_type: String,
    pub travel_class: String,
}

#[derive(Debug, Serialize)]
pub struct FlightResultsSummary {
    pub best_flights_count: usize,
    pub other_flights_count: usize,
    pub price_range: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PriceInsightsSummary {
    pub lowest_price: Option<i64>,
    pub price_level: Option<String>,
    pub typical_range: Vec<i64>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct CarbonSummary {
    pub this_flight_kg: Option<f64>,
    pub vs_typical: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FlightSummary {
    pub price: Option<i64>,
    pub total_duration_hours: Option<f64>,
    pub stops: usize,
    pub airlines: Vec<String>,
    pub departure_time: Option<String>,
    pub arrival_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carbon_emissions: Option<CarbonSummary>,
}

#[derive(Debug, Serialize)]
pub struct FlightSearchResult {
    pub success: bool,
    pub search_params: FlightSearchEcho,
    pub results_summary: FlightResultsSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_insights: Option<PriceInsightsSummary>,
    pub best_flights: Vec<FlightSummary>,
}

const TOP_RESULTS: usize = 3;

/// Runs the `search_flights` tool. Every failure comes back as an error
/// message for the agent to relay.
pub async fn search_flights_impl(
    provider: &dyn FlightSearchProvider,
    params: SearchFlightsParams,
) -> Result<FlightSearchResult, String> {
    let departure_code = resolve_airport_code(&params.departure_location);
    let arrival_code = resolve_airport_code(&params.arrival_location);

    let Some(departure_code) = departure_code else {
        return Err(format!(
            "Could not resolve departure location: {}. Please provide a valid airport code (e.g., JFK, LAX) or major city name.",
            params.departure_location
        ));
    };
    let Some(arrival_code) = arrival_code else {
        return Err(format!(
            "Could not resolve arrival location: {}. Please provide a valid airport code (e.g., JFK, LAX) or major city name.",
            params.arrival_location
        ));
    };

    let outbound_date = parse_iso_date(&params.departure_date).ok_or_else(|| {
        format!(
            "Invalid departure date format: {}. Please use YYYY-MM-DD format.",
            params.departure_date
        )
    })?;

    let return_date_raw = params.return_date.as_deref().filter(|d| !d.is_empty());
    let return_date = match return_date_raw {
        Some(raw) => {
            let parsed = parse_iso_date(raw).ok_or_else(|| {
                format!("Invalid return date format: {raw}. Please use YYYY-MM-DD format.")
            })?;
            if parsed <= outbound_date {
                return Err("Return date must be after departure date.".to_string());
            }
            Some(parsed)
        }
        None => None,
    };

    if params.trip_type == "round_trip" && return_date.is_none() {
        return Err("Return date is required for round trip flights.".to_string());
    }

    let mut request = FlightSearchRequest::new(&departure_code, &arrival_code, outbound_date);
    request.return_date = return_date;
    request.adults = params.passengers;
    request.trip_type = TripType::from_token(&params.trip_type);
    request.travel_class = TravelClass::from_token(&params.travel_class);
    request
        .validate()
        .map_err(|e| format!("Flight search failed: {e}"))?;

    tracing::info!(
        departure = %departure_code,
        arrival = %arrival_code,
        date = %params.departure_date,
        "Searching flights"
    );
    let response = provider.search_flights(&request).await;
    if let Some(error) = response.error.as_ref() {
        return Err(error.clone());
    }

    Ok(FlightSearchResult {
        success: true,
        search_params: FlightSearchEcho {
            departure: departure_code,
            arrival: arrival_code,
            departure_date: params.departure_date,
            return_date: params.return_date,
            passengers: params.passengers,
            trip_type: params.trip_type,
            travel_class: params.travel_class,
        },
        results_summary: FlightResultsSummary {
            best_flights_count: response.best_flights.len(),
            other_flights_count: response.other_flights.len(),
            price_range: response.price_insights.as_ref().and_then(typical_price_range),
        },
        price_insights: response.price_insights.as_ref().map(|insights| PriceInsightsSummary {
            lowest_price: insights.lowest_price,
            price_level: insights.price_level.clone(),
            typical_range: insights.typical_price_range.clone(),
        }),
        best_flights: top_flights(&response),
    })
}

fn typical_price_range(insights: &PriceInsights) -> Option<String> {
    match insights.typical_price_range.as_slice() {
        [low, high, ..] => Some(format!("${low}-${high}")),
        _ => None,
    }
}

fn top_flights(response: &FlightSearchResponse) -> Vec<FlightSummary> {
    response
        .best_flights()
        .iter()
        .take(TOP_RESULTS)
        .map(summarize_option)
        .collect()
}

pub fn summarize_option(option: &FlightOption) -> FlightSummary {
    let mut airlines: Vec<String> = Vec::new();
    for segment in &option.flights {
        if !airlines.contains(&segment.airline) {
            airlines.push(segment.airline.clone());
        }
    }

    FlightSummary {
        price: option.price,
        total_duration_hours: option.total_duration.map(|m| round_one(m as f64 / 60.0)),
        stops: option.layovers.len(),
        airlines,
        departure_time: option
            .flights
            .first()
            .and_then(|f| f.departure_airport.time.clone()),
        arrival_time: option
            .flights
            .last()
            .and_then(|f| f.arrival_airport.time.clone()),
        carbon_emissions: option.carbon_emissions.as_ref().map(|c| CarbonSummary {
            this_flight_kg: c.this_flight.map(|g| round_one(g as f64 / 1000.0)),
            vs_typical: c.difference_percent.map(|d| format!("{d:+}%")),
        }),
    }
}

fn round_one(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
