use std::sync::LazyLock;

use regex::Regex;

use crate::models::flight::FlightSearchParams;

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("valid date pattern"));

/// Keyword extractor behind the debug endpoint; the agent does the real
/// extraction.
///
/// Locations come from the lower-cased text after the first "from": the
/// departure is everything up to the next "to" and the arrival is the first
/// word after it. Any "to" counts, including the one inside "tokyo". The
/// first two ISO dates are the departure and return dates.
pub fn extract_flight_params(message: &str) -> FlightSearchParams {
    let mut params = FlightSearchParams::default();
    let lower = message.to_lowercase();

    if lower.contains("from") && lower.contains("to") {
        let after_from = lower.split("from").nth(1).unwrap_or_default();
        let mut parts = after_from.split("to");
        if let (Some(departure), Some(rest)) = (parts.next(), parts.next()) {
            params.departure_location = Some(departure.trim().to_string());
            params.arrival_location = rest.split_whitespace().next().map(str::to_string);
        }
    }

    let mut dates = ISO_DATE.find_iter(message).map(|m| m.as_str().to_string());
    params.departure_date = dates.next();
    if params.departure_date.is_some() {
        params.return_date = dates.next();
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_locations_and_dates() {
        let params =
            extract_flight_params("Flights from New York to Los Angeles on 2026-01-10 back 2026-01-17");
        assert_eq!(params.departure_location.as_deref(), Some("new york"));
        assert_eq!(params.arrival_location.as_deref(), Some("los"));
        assert_eq!(params.departure_date.as_deref(), Some("2026-01-10"));
        assert_eq!(params.return_date.as_deref(), Some("2026-01-17"));
        assert_eq!(params.passengers, 1);
        assert_eq!(params.trip_type, "round_trip");
    }

    #[test]
    fn to_inside_words_splits_too() {
        let params = extract_flight_params("from tokyo to paris");
        assert_eq!(params.departure_location.as_deref(), Some(""));
        assert_eq!(params.arrival_location.as_deref(), Some("kyo"));
    }

    #[test]
    fn trailing_to_leaves_arrival_empty() {
        let params = extract_flight_params("from paris to");
        assert_eq!(params.departure_location.as_deref(), Some("paris"));
        assert_eq!(params.arrival_location, None);
    }

    #[test]
    fn no_markers_no_locations() {
        let params = extract_flight_params("I want to travel on 2026-05-01");
        assert_eq!(params.departure_location, None);
        assert_eq!(params.departure_date.as_deref(), Some("2026-05-01"));
        assert_eq!(params.return_date, None);
    }

    #[test]
    fn same_input_same_output() {
        let msg = "from JFK to LAX 2026-01-10";
        assert_eq!(extract_flight_params(msg), extract_flight_params(msg));
    }
}
