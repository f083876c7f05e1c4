use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::common::{parse_iso_date, validate_airline_codes};
use super::deserialize_lenient_int;
use crate::error::{Result, TravelAgentError};

// ─────────────────────────────────────────────────────────────
// Enumerations (user tokens <-> provider codes)
// ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripType {
    OneWay,
    #[default]
    RoundTrip,
    MultiCity,
}

impl TripType {
    /// Unknown tokens fall back to a round trip.
    pub fn from_token(token: &str) -> Self {
        match token.trim() {
            "one_way" => TripType::OneWay,
            "multi_city" => TripType::MultiCity,
            _ => TripType::RoundTrip,
        }
    }

    pub fn provider_code(&self) -> &'static str {
        match self {
            TripType::RoundTrip => "1",
            TripType::OneWay => "2",
            TripType::MultiCity => "3",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelClass {
    #[default]
    Economy,
    PremiumEconomy,
    Business,
    First,
}

impl TravelClass {
    /// Unknown tokens fall back to economy.
    pub fn from_token(token: &str) -> Self {
        match token.trim() {
            "premium_economy" => TravelClass::PremiumEconomy,
            "business" => TravelClass::Business,
            "first" => TravelClass::First,
            _ => TravelClass::Economy,
        }
    }

    pub fn provider_code(&self) -> &'static str {
        match self {
            TravelClass::Economy => "1",
            TravelClass::PremiumEconomy => "2",
            TravelClass::Business => "3",
            TravelClass::First => "4",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightSortBy {
    #[default]
    TopFlights,
    Price,
    DepartureTime,
    ArrivalTime,
    Duration,
    Emissions,
}

impl FlightSortBy {
    pub fn provider_code(&self) -> &'static str {
        match self {
            FlightSortBy::TopFlights => "1",
            FlightSortBy::Price => "2",
            FlightSortBy::DepartureTime => "3",
            FlightSortBy::ArrivalTime => "4",
            FlightSortBy::Duration => "5",
            FlightSortBy::Emissions => "6",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stops {
    #[default]
    Any,
    Nonstop,
    OneStopOrFewer,
    TwoStopsOrFewer,
}

impl Stops {
    pub fn provider_code(&self) -> &'static str {
        match self {
            Stops::Any => "0",
            Stops::Nonstop => "1",
            Stops::OneStopOrFewer => "2",
            Stops::TwoStopsOrFewer => "3",
        }
    }
}

// ─────────────────────────────────────────────────────────────
// Request
// ─────────────────────────────────────────────────────────────

/// Fully typed flight query handed to a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightSearchRequest {
    pub departure_id: String,
    pub arrival_id: String,
    pub outbound_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub trip_type: TripType,
    pub adults: i64,
    pub children: i64,
    pub infants_in_seat: i64,
    pub infants_on_lap: i64,
    pub travel_class: TravelClass,
    pub sort_by: FlightSortBy,
    pub stops: Stops,
    pub max_price: Option<i64>,
    pub include_airlines: Option<String>,
    pub exclude_airlines: Option<String>,
    /// Minutes.
    pub max_duration: Option<i64>,
}

impl FlightSearchRequest {
    pub fn new(
        departure_id: impl Into<String>,
        arrival_id: impl Into<String>,
        outbound_date: NaiveDate,
    ) -> Self {
        Self {
            departure_id: departure_id.into(),
            arrival_id: arrival_id.into(),
            outbound_date,
            return_date: None,
            trip_type: TripType::RoundTrip,
            adults: 1,
            children: 0,
            infants_in_seat: 0,
            infants_on_lap: 0,
            travel_class: TravelClass::Economy,
            sort_by: FlightSortBy::TopFlights,
            stops: Stops::Any,
            max_price: None,
            include_airlines: None,
            exclude_airlines: None,
            max_duration: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_range("adults", self.adults, 1, 9)?;
        check_range("children", self.children, 0, 8)?;
        check_range("infants_in_seat", self.infants_in_seat, 0, 8)?;
        check_range("infants_on_lap", self.infants_on_lap, 0, 8)?;
        if self.max_price.is_some_and(|p| p < 0) {
            return Err(TravelAgentError::field_validation(
                "max_price",
                "max_price must be greater than or equal to 0",
            ));
        }
        if self.max_duration.is_some_and(|d| d < 0) {
            return Err(TravelAgentError::field_validation(
                "max_duration",
                "max_duration must be greater than or equal to 0",
            ));
        }

        if self.trip_type == TripType::RoundTrip {
            match self.return_date {
                None => {
                    return Err(TravelAgentError::field_validation(
                        "return_date",
                        "Return date is required for round trip flights",
                    ));
                }
                Some(ret) if ret <= self.outbound_date => {
                    return Err(TravelAgentError::field_validation(
                        "return_date",
                        "Return date must be after departure date",
                    ));
                }
                Some(_) => {}
            }
        }

        for codes in [&self.include_airlines, &self.exclude_airlines]
            .into_iter()
            .flatten()
        {
            validate_airline_codes(codes)?;
        }
        Ok(())
    }
}

pub(crate) fn check_range(field: &str, value: i64, min: i64, max: i64) -> Result<()> {
    if value < min || value > max {
        return Err(TravelAgentError::field_validation(
            field,
            format!("{field} must be between {min} and {max}"),
        ));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────
// Normalized provider response
// ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Airport {
    pub name: String,
    pub id: String,
    pub time: Option<String>,
}

/// One flight segment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Flight {
    pub departure_airport: Airport,
    pub arrival_airport: Airport,
    #[serde(deserialize_with = "deserialize_lenient_int")]
    pub duration: Option<i64>,
    pub airplane: Option<String>,
    pub airline: String,
    pub airline_logo: Option<String>,
    pub travel_class: Option<String>,
    pub flight_number: Option<String>,
    pub extensions: Vec<String>,
    pub legroom: Option<String>,
    pub overnight: bool,
    pub often_delayed_by_over_30_min: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layover {
    #[serde(deserialize_with = "deserialize_lenient_int")]
    pub duration: Option<i64>,
    pub name: String,
    pub id: String,
    pub overnight: bool,
}

/// Grams of CO2.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarbonEmissions {
    #[serde(deserialize_with = "deserialize_lenient_int")]
    pub this_flight: Option<i64>,
    #[serde(deserialize_with = "deserialize_lenient_int")]
    pub typical_for_this_route: Option<i64>,
    #[serde(deserialize_with = "deserialize_lenient_int")]
    pub difference_percent: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightOption {
    pub flights: Vec<Flight>,
    pub layovers: Vec<Layover>,
    #[serde(deserialize_with = "deserialize_lenient_int")]
    pub total_duration: Option<i64>,
    pub carbon_emissions: Option<CarbonEmissions>,
    #[serde(deserialize_with = "deserialize_lenient_int")]
    pub price: Option<i64>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub airline_logo: Option<String>,
    pub extensions: Vec<String>,
    pub departure_token: Option<String>,
    pub booking_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceInsights {
    #[serde(deserialize_with = "deserialize_lenient_int")]
    pub lowest_price: Option<i64>,
    pub price_level: Option<String>,
    pub typical_price_range: Vec<i64>,
    pub price_history: Vec<Vec<i64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightSearchResponse {
    pub best_flights: Vec<FlightOption>,
    pub other_flights: Vec<FlightOption>,
    pub price_insights: Option<PriceInsights>,
    pub search_metadata: serde_json::Map<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FlightSearchResponse {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Ranked options, empty whenever the provider reported an error.
    pub fn best_flights(&self) -> &[FlightOption] {
        if self.error.is_some() {
            &[]
        } else {
            &self.best_flights
        }
    }

    pub fn other_flights(&self) -> &[FlightOption] {
        if self.error.is_some() {
            &[]
        } else {
            &self.other_flights
        }
    }
}

// ─────────────────────────────────────────────────────────────
// Loosely typed parameters captured from a conversation
// ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightSearchParams {
    pub departure_location: Option<String>,
    pub arrival_location: Option<String>,
    pub departure_date: Option<String>,
    pub return_date: Option<String>,
    pub passengers: i64,
    pub trip_type: String,
    pub travel_class: String,
}

impl Default for FlightSearchParams {
    fn default() -> Self {
        Self {
            departure_location: None,
            arrival_location: None,
            departure_date: None,
            return_date: None,
            passengers: 1,
            trip_type: "round_trip".to_string(),
            travel_class: "economy".to_string(),
        }
    }
}

impl FlightSearchParams {
    /// Builds a validated request, or `None` when a required field is
    /// missing or anything fails to parse or validate.
    pub fn to_search_request(&self) -> Option<FlightSearchRequest> {
        let departure = non_empty(&self.departure_location)?;
        let arrival = non_empty(&self.arrival_location)?;
        let outbound = parse_iso_date(non_empty(&self.departure_date)?)?;
        let return_date = match non_empty(&self.return_date) {
            Some(raw) => Some(parse_iso_date(raw)?),
            None => None,
        };

        let mut request = FlightSearchRequest::new(departure, arrival, outbound);
        request.return_date = return_date;
        request.adults = self.passengers;
        request.trip_type = TripType::from_token(&self.trip_type);
        request.travel_class = TravelClass::from_token(&self.travel_class);
        request.validate().ok()?;
        Some(request)
    }
}

pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        parse_iso_date(s).expect("test date")
    }

    #[test]
    fn unknown_tokens_fall_back_silently() {
        assert_eq!(TripType::from_token("circle"), TripType::RoundTrip);
        assert_eq!(TripType::from_token("one_way").provider_code(), "2");
        assert_eq!(TravelClass::from_token("luxury"), TravelClass::Economy);
        assert_eq!(TravelClass::from_token("first").provider_code(), "4");
    }

    #[test]
    fn round_trip_requires_later_return_date() {
        let mut request = FlightSearchRequest::new("JFK", "LAX", date("2026-01-10"));
        let err = request.validate().expect_err("missing return date");
        assert_eq!(err.to_string(), "Return date is required for round trip flights");

        request.return_date = Some(date("2026-01-10"));
        let err = request.validate().expect_err("same-day return");
        assert_eq!(err.to_string(), "Return date must be after departure date");

        request.return_date = Some(date("2026-01-11"));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn one_way_ignores_return_date_rules() {
        let mut request = FlightSearchRequest::new("JFK", "LAX", date("2026-01-10"));
        request.trip_type = TripType::OneWay;
        assert!(request.validate().is_ok());
    }

    #[test]
    fn passenger_bounds_are_enforced() {
        let mut request = FlightSearchRequest::new("JFK", "LAX", date("2026-01-10"));
        request.trip_type = TripType::OneWay;
        request.adults = 10;
        assert_eq!(
            request.validate().expect_err("too many adults").to_string(),
            "adults must be between 1 and 9"
        );
        request.adults = 2;
        request.infants_on_lap = 9;
        assert!(request.validate().is_err());
    }

    #[test]
    fn params_need_every_required_field() {
        let mut params = FlightSearchParams {
            departure_location: Some("JFK".into()),
            arrival_location: Some("LAX".into()),
            ..FlightSearchParams::default()
        };
        assert!(params.to_search_request().is_none());

        params.departure_date = Some("2026-01-10".into());
        // round trip without a return date is not producible
        assert!(params.to_search_request().is_none());

        params.return_date = Some("2026-01-17".into());
        let request = params.to_search_request().expect("complete params");
        assert_eq!(request.return_date, Some(date("2026-01-17")));
        assert_eq!(request.adults, 1);

        params.departure_date = Some("Jan 10".into());
        assert!(params.to_search_request().is_none());
    }

    #[test]
    fn error_hides_ranked_results() {
        let mut response = FlightSearchResponse::failed("quota exceeded");
        response.best_flights.push(FlightOption::default());
        assert!(response.best_flights().is_empty());
        assert!(response.other_flights().is_empty());
    }

    #[test]
    fn provider_payload_decodes_with_missing_fields() {
        let raw = serde_json::json!({
            "best_flights": [{
                "flights": [{
                    "departure_airport": {"name": "JFK", "id": "JFK", "time": "2026-01-10 08:00"},
                    "arrival_airport": {"name": "LAX", "id": "LAX", "time": "2026-01-10 11:30"},
                    "duration": 390,
                    "airline": "Delta"
                }],
                "total_duration": 390,
                "price": 412,
                "type": "Round trip"
            }],
            "price_insights": {"lowest_price": 380, "price_level": "low", "typical_price_range": [350, 600]}
        });
        let response: FlightSearchResponse =
            serde_json::from_value(raw).expect("payload should decode");
        assert_eq!(response.best_flights().len(), 1);
        assert_eq!(response.best_flights[0].price, Some(412));
        assert_eq!(response.best_flights[0].kind.as_deref(), Some("Round trip"));
        assert!(response.other_flights().is_empty());
    }
}
