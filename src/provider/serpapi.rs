use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};

use super::{FlightSearchProvider, HotelSearchProvider};
use crate::config::Config;
use crate::error::{ExternalApi, Result, TravelAgentError};
use crate::models::flight::{FlightSearchRequest, FlightSearchResponse, Stops, TravelClass};
use crate::models::hotel::{HotelSearchRequest, HotelSearchResponse, HotelSortBy};

const SEARCH_PATH: &str = "/search.json";
const MISSING_KEY: &str = "SerpAPI key is required. Set SERPAPI_API_KEY environment variable.";

pub type QueryParams = Vec<(&'static str, String)>;

/// Google Flights / Google Hotels through SerpAPI. Read-only after
/// construction; no retries.
pub struct SerpApiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl SerpApiClient {
    pub fn new(api_key: Option<String>, base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            TravelAgentError::Configuration(format!("Failed to build SerpAPI client: {e}"))
        })?;
        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config
            .has_serpapi_key()
            .then(|| config.serpapi.api_key.clone());
        Self::new(api_key, &config.serpapi.base_url, config.serpapi_timeout())
    }

    async fn fetch(&self, params: &QueryParams) -> Result<serde_json::Value> {
        let url = format!("{}{}", self.base_url, SEARCH_PATH);
        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| external(format!("request failed: {e}"), None))?;

        let status = response.status();
        let body: serde_json::Value = match response.json().await {
            Ok(body) => body,
            Err(e) if status.is_success() => {
                return Err(external(format!("invalid JSON body: {e}"), Some(status.as_u16())));
            }
            Err(_) => {
                return Err(external(format!("HTTP {status}"), Some(status.as_u16())));
            }
        };

        // SerpAPI puts its own message in `error` for both 200 and 4xx answers
        if body.get("error").is_some() || status.is_success() {
            return Ok(body);
        }
        Err(external(format!("HTTP {status}"), Some(status.as_u16())))
    }

    async fn search<T>(&self, params: Option<QueryParams>, domain: &str) -> std::result::Result<T, String>
    where
        T: DeserializeOwned,
    {
        let params = params.ok_or_else(|| MISSING_KEY.to_string())?;
        let started = Instant::now();
        let body = self
            .fetch(&params)
            .await
            .map_err(|e| format!("{domain} search failed: {e}"))?;
        tracing::info!(
            engine = %params.first().map(|(_, v)| v.as_str()).unwrap_or_default(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "SerpAPI search completed"
        );

        if let Some(error) = body.get("error") {
            let message = match error {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return Err(message);
        }

        serde_json::from_value(body)
            .map_err(|e| format!("Failed to parse {} results: {e}", domain.to_lowercase()))
    }
}

fn external(message: String, status: Option<u16>) -> TravelAgentError {
    TravelAgentError::ExternalApi {
        api: ExternalApi::SerpApi,
        message,
        status,
    }
}

/// Query string for a Google Flights search.
pub fn flight_query(request: &FlightSearchRequest, api_key: &str) -> QueryParams {
    let mut params: QueryParams = vec![
        ("engine", "google_flights".to_string()),
        ("api_key", api_key.to_string()),
        ("departure_id", request.departure_id.clone()),
        ("arrival_id", request.arrival_id.clone()),
        ("outbound_date", request.outbound_date.format("%Y-%m-%d").to_string()),
        ("currency", "USD".to_string()),
        ("hl", "en".to_string()),
        ("type", request.trip_type.provider_code().to_string()),
    ];

    if let Some(return_date) = request.return_date {
        params.push(("return_date", return_date.format("%Y-%m-%d").to_string()));
    }
    if request.adults > 1 {
        params.push(("adults", request.adults.to_string()));
    }
    if request.children > 0 {
        params.push(("children", request.children.to_string()));
    }
    if request.infants_in_seat > 0 {
        params.push(("infants_in_seat", request.infants_in_seat.to_string()));
    }
    if request.infants_on_lap > 0 {
        params.push(("infants_on_lap", request.infants_on_lap.to_string()));
    }
    if request.travel_class != TravelClass::Economy {
        params.push(("travel_class", request.travel_class.provider_code().to_string()));
    }
    if request.sort_by.provider_code() != "1" {
        params.push(("sort_by", request.sort_by.provider_code().to_string()));
    }
    if request.stops != Stops::Any {
        params.push(("stops", request.stops.provider_code().to_string()));
    }
    if let Some(max_price) = request.max_price.filter(|p| *p > 0) {
        params.push(("max_price", max_price.to_string()));
    }
    if let Some(include) = request.include_airlines.as_ref().filter(|s| !s.is_empty()) {
        params.push(("include_airlines", include.clone()));
    }
    if let Some(exclude) = request.exclude_airlines.as_ref().filter(|s| !s.is_empty()) {
        params.push(("exclude_airlines", exclude.clone()));
    }
    if let Some(max_duration) = request.max_duration.filter(|d| *d > 0) {
        params.push(("max_duration", max_duration.to_string()));
    }
    params
}

/// Query string for a Google Hotels search.
pub fn hotel_query(request: &HotelSearchRequest, api_key: &str) -> QueryParams {
    let mut params: QueryParams = vec![
        ("engine", "google_hotels".to_string()),
        ("api_key", api_key.to_string()),
        ("q", request.q.clone()),
        ("check_in_date", request.check_in_date.format("%Y-%m-%d").to_string()),
        ("check_out_date", request.check_out_date.format("%Y-%m-%d").to_string()),
        ("adults", request.adults.to_string()),
        ("children", request.children.to_string()),
        ("currency", request.currency.clone()),
        ("gl", request.gl.clone()),
        ("hl", request.hl.clone()),
    ];

    if request.sort_by != HotelSortBy::Relevance {
        params.push(("sort_by", request.sort_by.provider_code().to_string()));
    }
    if let Some(min_price) = request.min_price.filter(|p| *p > 0) {
        params.push(("min_price", min_price.to_string()));
    }
    if let Some(max_price) = request.max_price.filter(|p| *p > 0) {
        params.push(("max_price", max_price.to_string()));
    }
    if let Some(rating) = request.rating {
        params.push(("rating", rating.provider_code().to_string()));
    }
    let filters = [
        ("hotel_class", &request.hotel_class),
        ("property_types", &request.property_types),
        ("amenities", &request.amenities),
        ("brands", &request.brands),
    ];
    for (key, value) in filters {
        if let Some(value) = value.as_ref().filter(|v| !v.is_empty()) {
            params.push((key, value.clone()));
        }
    }
    if request.vacation_rentals {
        params.push(("vacation_rentals", "true".to_string()));
        if let Some(bedrooms) = request.bedrooms.filter(|b| *b > 0) {
            params.push(("bedrooms", bedrooms.to_string()));
        }
        if let Some(bathrooms) = request.bathrooms.filter(|b| *b > 0) {
            params.push(("bathrooms", bathrooms.to_string()));
        }
    }
    for (key, enabled) in [
        ("free_cancellation", request.free_cancellation),
        ("special_offers", request.special_offers),
        ("eco_certified", request.eco_certified),
    ] {
        if enabled {
            params.push((key, "true".to_string()));
        }
    }
    params
}

#[async_trait]
impl FlightSearchProvider for SerpApiClient {
    async fn search_flights(&self, request: &FlightSearchRequest) -> FlightSearchResponse {
        let params = self.api_key.as_deref().map(|key| flight_query(request, key));
        match self.search::<FlightSearchResponse>(params, "Flight").await {
            Ok(response) => {
                tracing::info!(
                    departure = %request.departure_id,
                    arrival = %request.arrival_id,
                    best = response.best_flights.len(),
                    other = response.other_flights.len(),
                    "Flight search returned results"
                );
                response
            }
            Err(error) => {
                tracing::warn!(%error, "Flight search failed");
                FlightSearchResponse::failed(error)
            }
        }
    }
}

#[async_trait]
impl HotelSearchProvider for SerpApiClient {
    async fn search_hotels(&self, request: &HotelSearchRequest) -> HotelSearchResponse {
        let params = self.api_key.as_deref().map(|key| hotel_query(request, key));
        match self.search::<HotelSearchResponse>(params, "Hotel").await {
            Ok(response) => {
                tracing::info!(
                    q = %request.q,
                    properties = response.properties.len(),
                    ads = response.ads.len(),
                    "Hotel search returned results"
                );
                response
            }
            Err(error) => {
                tracing::warn!(%error, "Hotel search failed");
                HotelSearchResponse::failed(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::common::parse_iso_date;
    use crate::models::flight::TripType;

    fn value<'a>(params: &'a QueryParams, key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn flight_query_omits_default_filters() {
        let outbound = parse_iso_date("2026-01-10").expect("date");
        let mut request = FlightSearchRequest::new("JFK", "LAX", outbound);
        request.trip_type = TripType::OneWay;

        let params = flight_query(&request, "key");
        assert_eq!(value(&params, "engine"), Some("google_flights"));
        assert_eq!(value(&params, "type"), Some("2"));
        assert_eq!(value(&params, "outbound_date"), Some("2026-01-10"));
        assert_eq!(value(&params, "currency"), Some("USD"));
        for absent in ["adults", "travel_class", "sort_by", "stops", "return_date"] {
            assert!(value(&params, absent).is_none(), "{absent} should be omitted");
        }
    }

    #[test]
    fn flight_query_includes_non_default_filters() {
        let outbound = parse_iso_date("2026-01-10").expect("date");
        let mut request = FlightSearchRequest::new("JFK", "CDG", outbound);
        request.return_date = parse_iso_date("2026-01-20");
        request.adults = 2;
        request.travel_class = TravelClass::Business;
        request.stops = Stops::Nonstop;
        request.include_airlines = Some("AF,DL".into());

        let params = flight_query(&request, "key");
        assert_eq!(value(&params, "return_date"), Some("2026-01-20"));
        assert_eq!(value(&params, "adults"), Some("2"));
        assert_eq!(value(&params, "travel_class"), Some("3"));
        assert_eq!(value(&params, "stops"), Some("1"));
        assert_eq!(value(&params, "include_airlines"), Some("AF,DL"));
    }

    #[test]
    fn hotel_query_only_sends_rental_sizes_for_rentals() {
        let check_in = parse_iso_date("2026-02-01").expect("date");
        let check_out = parse_iso_date("2026-02-04").expect("date");
        let mut request = HotelSearchRequest::new("Paris", check_in, check_out);
        request.bedrooms = Some(2);
        request.sort_by = HotelSortBy::LowestPrice;
        request.free_cancellation = true;

        let params = hotel_query(&request, "key");
        assert_eq!(value(&params, "engine"), Some("google_hotels"));
        assert_eq!(value(&params, "adults"), Some("2"));
        assert_eq!(value(&params, "sort_by"), Some("3"));
        assert_eq!(value(&params, "free_cancellation"), Some("true"));
        assert!(value(&params, "bedrooms").is_none());

        request.vacation_rentals = true;
        let params = hotel_query(&request, "key");
        assert_eq!(value(&params, "vacation_rentals"), Some("true"));
        assert_eq!(value(&params, "bedrooms"), Some("2"));
    }

    #[tokio::test]
    async fn missing_key_is_reported_without_a_request() {
        let client = SerpApiClient::new(None, "http://127.0.0.1:9", Duration::from_secs(1))
            .expect("client");
        let outbound = parse_iso_date("2026-01-10").expect("date");
        let response = client
            .search_flights(&FlightSearchRequest::new("JFK", "LAX", outbound))
            .await;
        assert_eq!(response.error.as_deref(), Some(MISSING_KEY));
    }
}
