use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::common::parse_iso_date;
use super::deserialize_lenient_int;
use super::flight::{check_range, non_empty};
use crate::error::{Result, TravelAgentError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HotelSortBy {
    #[default]
    #[serde(rename = "0", alias = "relevance")]
    Relevance,
    #[serde(rename = "3", alias = "lowest_price")]
    LowestPrice,
    #[serde(rename = "8", alias = "highest_rating")]
    HighestRating,
    #[serde(rename = "13", alias = "most_reviewed")]
    MostReviewed,
}

impl HotelSortBy {
    /// Maps the tool token (`relevance`, `price`, `rating`, `reviews`).
    /// Anything else sorts by relevance.
    pub fn from_token(token: &str) -> Self {
        match token.trim() {
            "price" => HotelSortBy::LowestPrice,
            "rating" => HotelSortBy::HighestRating,
            "reviews" => HotelSortBy::MostReviewed,
            _ => HotelSortBy::Relevance,
        }
    }

    pub fn provider_code(&self) -> &'static str {
        match self {
            HotelSortBy::Relevance => "0",
            HotelSortBy::LowestPrice => "3",
            HotelSortBy::HighestRating => "8",
            HotelSortBy::MostReviewed => "13",
        }
    }
}

/// Minimum guest rating filter (3.5+, 4.0+, 4.5+).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HotelRating {
    #[serde(rename = "7")]
    ThreeFivePlus,
    #[serde(rename = "8")]
    FourPlus,
    #[serde(rename = "9")]
    FourFivePlus,
}

impl HotelRating {
    pub fn provider_code(&self) -> &'static str {
        match self {
            HotelRating::ThreeFivePlus => "7",
            HotelRating::FourPlus => "8",
            HotelRating::FourFivePlus => "9",
        }
    }
}

fn default_adults() -> i64 {
    2
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_gl() -> String {
    "us".to_string()
}

fn default_hl() -> String {
    "en".to_string()
}

/// Fully typed hotel query. Also the body of the direct hotel search endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelSearchRequest {
    pub q: String,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    #[serde(default = "default_adults")]
    pub adults: i64,
    #[serde(default)]
    pub children: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_gl")]
    pub gl: String,
    #[serde(default = "default_hl")]
    pub hl: String,
    #[serde(default)]
    pub sort_by: HotelSortBy,
    #[serde(default)]
    pub min_price: Option<i64>,
    #[serde(default)]
    pub max_price: Option<i64>,
    #[serde(default)]
    pub rating: Option<HotelRating>,
    /// Comma separated star classes, e.g. `3,4,5`.
    #[serde(default)]
    pub hotel_class: Option<String>,
    #[serde(default)]
    pub property_types: Option<String>,
    #[serde(default)]
    pub amenities: Option<String>,
    #[serde(default)]
    pub brands: Option<String>,
    #[serde(default)]
    pub vacation_rentals: bool,
    #[serde(default)]
    pub bedrooms: Option<i64>,
    #[serde(default)]
    pub bathrooms: Option<i64>,
    #[serde(default)]
    pub free_cancellation: bool,
    #[serde(default)]
    pub special_offers: bool,
    #[serde(default)]
    pub eco_certified: bool,
}

impl HotelSearchRequest {
    pub fn new(q: impl Into<String>, check_in_date: NaiveDate, check_out_date: NaiveDate) -> Self {
        Self {
            q: q.into(),
            check_in_date,
            check_out_date,
            adults: default_adults(),
            children: 0,
            currency: default_currency(),
            gl: default_gl(),
            hl: default_hl(),
            sort_by: HotelSortBy::Relevance,
            min_price: None,
            max_price: None,
            rating: None,
            hotel_class: None,
            property_types: None,
            amenities: None,
            brands: None,
            vacation_rentals: false,
            bedrooms: None,
            bathrooms: None,
            free_cancellation: false,
            special_offers: false,
            eco_certified: false,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.check_out_date <= self.check_in_date {
            return Err(TravelAgentError::field_validation(
                "check_out_date",
                "Check-out date must be after check-in date",
            ));
        }
        check_range("adults", self.adults, 1, 20)?;
        check_range("children", self.children, 0, 10)?;
        for (field, value) in [
            ("min_price", self.min_price),
            ("max_price", self.max_price),
            ("bedrooms", self.bedrooms),
            ("bathrooms", self.bathrooms),
        ] {
            if value.is_some_and(|v| v < 0) {
                return Err(TravelAgentError::field_validation(
                    field,
                    format!("{field} must be greater than or equal to 0"),
                ));
            }
        }
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if max <= min {
                return Err(TravelAgentError::field_validation(
                    "max_price",
                    "Maximum price must be greater than minimum price",
                ));
            }
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────
// Normalized provider response
// ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GpsCoordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transportation {
    #[serde(rename = "type")]
    pub kind: String,
    pub duration: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NearbyPlace {
    pub name: String,
    pub transportations: Vec<Transportation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotelImage {
    pub thumbnail: Option<String>,
    pub original_image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateInfo {
    pub lowest: Option<String>,
    pub extracted_lowest: Option<f64>,
    pub before_taxes_fees: Option<String>,
    pub extracted_before_taxes_fees: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceSource {
    pub source: String,
    pub logo: Option<String>,
    #[serde(deserialize_with = "deserialize_lenient_int")]
    pub num_guests: Option<i64>,
    pub rate_per_night: Option<RateInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingBreakdown {
    pub name: String,
    pub description: Option<String>,
    #[serde(deserialize_with = "deserialize_lenient_int")]
    pub total_mentioned: Option<i64>,
    #[serde(deserialize_with = "deserialize_lenient_int")]
    pub positive: Option<i64>,
    #[serde(deserialize_with = "deserialize_lenient_int")]
    pub negative: Option<i64>,
    #[serde(deserialize_with = "deserialize_lenient_int")]
    pub neutral: Option<i64>,
}

/// Star rating distribution bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarRating {
    pub stars: i64,
    pub count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotelProperty {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub link: Option<String>,
    pub logo: Option<String>,
    pub sponsored: bool,
    pub eco_certified: bool,

    pub gps_coordinates: Option<GpsCoordinates>,
    pub nearby_places: Vec<NearbyPlace>,

    pub check_in_time: Option<String>,
    pub check_out_time: Option<String>,

    pub rate_per_night: Option<RateInfo>,
    pub total_rate: Option<RateInfo>,
    pub prices: Vec<PriceSource>,

    pub hotel_class: Option<String>,
    #[serde(deserialize_with = "deserialize_lenient_int")]
    pub extracted_hotel_class: Option<i64>,
    pub images: Vec<HotelImage>,

    pub overall_rating: Option<f64>,
    #[serde(deserialize_with = "deserialize_lenient_int")]
    pub reviews: Option<i64>,
    pub ratings: Vec<StarRating>,
    pub location_rating: Option<f64>,
    pub reviews_breakdown: Vec<RatingBreakdown>,

    pub amenities: Vec<String>,
    pub excluded_amenities: Vec<String>,
    pub essential_info: Vec<String>,

    pub property_token: Option<String>,
    pub serpapi_property_details_link: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotelAd {
    pub name: String,
    pub source: String,
    pub source_icon: Option<String>,
    pub link: Option<String>,
    pub property_token: Option<String>,
    pub serpapi_property_details_link: Option<String>,
    pub gps_coordinates: Option<GpsCoordinates>,
    #[serde(deserialize_with = "deserialize_lenient_int")]
    pub hotel_class: Option<i64>,
    pub thumbnail: Option<String>,
    pub overall_rating: Option<f64>,
    #[serde(deserialize_with = "deserialize_lenient_int")]
    pub reviews: Option<i64>,
    pub price: Option<String>,
    pub extracted_price: Option<f64>,
    pub amenities: Vec<String>,
    pub free_cancellation: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotelBrand {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<HotelBrand>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotelSearchResponse {
    pub properties: Vec<HotelProperty>,
    pub ads: Vec<HotelAd>,
    pub brands: Vec<HotelBrand>,
    pub search_metadata: serde_json::Map<String, serde_json::Value>,
    pub search_information: serde_json::Map<String, serde_json::Value>,
    pub serpapi_pagination: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HotelSearchResponse {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Ranked properties, empty whenever the provider reported an error.
    pub fn properties(&self) -> &[HotelProperty] {
        if self.error.is_some() {
            &[]
        } else {
            &self.properties
        }
    }

    pub fn ads(&self) -> &[HotelAd] {
        if self.error.is_some() { &[] } else { &self.ads }
    }
}

/// Lowest and highest extracted nightly rate across `properties`.
/// Properties without a positive extracted rate are skipped.
pub fn nightly_price_range(properties: &[HotelProperty]) -> Option<(f64, f64)> {
    properties
        .iter()
        .filter_map(|p| p.rate_per_night.as_ref()?.extracted_lowest)
        .filter(|price| *price != 0.0)
        .fold(None, |range, price| match range {
            None => Some((price, price)),
            Some((lo, hi)) => Some((f64::min(lo, price), f64::max(hi, price))),
        })
}

// ─────────────────────────────────────────────────────────────
// Loosely typed parameters captured from a conversation
// ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelSearchParams {
    pub location: Option<String>,
    pub check_in_date: Option<String>,
    pub check_out_date: Option<String>,
    pub guests: i64,
    pub rooms: i64,
    pub hotel_class: Option<String>,
    pub amenities: Option<String>,
    pub max_price: Option<i64>,
    pub vacation_rental: bool,
}

impl Default for HotelSearchParams {
    fn default() -> Self {
        Self {
            location: None,
            check_in_date: None,
            check_out_date: None,
            guests: 2,
            rooms: 1,
            hotel_class: None,
            amenities: None,
            max_price: None,
            vacation_rental: false,
        }
    }
}

impl HotelSearchParams {
    /// Builds a validated request, or `None` when a required field is
    /// missing or anything fails to parse or validate.
    pub fn to_search_request(&self) -> Option<HotelSearchRequest> {
        let location = non_empty(&self.location)?;
        let check_in = parse_iso_date(non_empty(&self.check_in_date)?)?;
        let check_out = parse_iso_date(non_empty(&self.check_out_date)?)?;

        let mut request = HotelSearchRequest::new(location, check_in, check_out);
        request.adults = self.guests;
        request.vacation_rentals = self.vacation_rental;
        request.hotel_class = self.hotel_class.clone();
        request.amenities = self.amenities.clone();
        request.max_price = self.max_price;
        request.validate().ok()?;
        Some(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        parse_iso_date(s).expect("test date")
    }

    fn priced(extracted: Option<f64>) -> HotelProperty {
        HotelProperty {
            name: "Test Inn".into(),
            rate_per_night: Some(RateInfo {
                extracted_lowest: extracted,
                ..RateInfo::default()
            }),
            ..HotelProperty::default()
        }
    }

    #[test]
    fn checkout_must_follow_checkin() {
        let request = HotelSearchRequest::new("Paris", date("2026-02-01"), date("2026-01-30"));
        assert_eq!(
            request.validate().expect_err("inverted stay").to_string(),
            "Check-out date must be after check-in date"
        );
        let same_day = HotelSearchRequest::new("Paris", date("2026-02-01"), date("2026-02-01"));
        assert!(same_day.validate().is_err());
    }

    #[test]
    fn price_bounds_and_guest_limits() {
        let mut request = HotelSearchRequest::new("Paris", date("2026-02-01"), date("2026-02-04"));
        request.min_price = Some(200);
        request.max_price = Some(200);
        assert_eq!(
            request.validate().expect_err("max == min").to_string(),
            "Maximum price must be greater than minimum price"
        );
        request.max_price = Some(350);
        assert!(request.validate().is_ok());

        request.adults = 21;
        assert!(request.validate().is_err());
    }

    #[test]
    fn sort_tokens_map_to_provider_codes() {
        assert_eq!(HotelSortBy::from_token("price").provider_code(), "3");
        assert_eq!(HotelSortBy::from_token("reviews").provider_code(), "13");
        assert_eq!(HotelSortBy::from_token("stars"), HotelSortBy::Relevance);
    }

    #[test]
    fn request_body_fills_defaults() {
        let request: HotelSearchRequest = serde_json::from_value(serde_json::json!({
            "q": "Tokyo",
            "check_in_date": "2026-03-01",
            "check_out_date": "2026-03-05",
            "sort_by": "8"
        }))
        .expect("minimal body");
        assert_eq!(request.adults, 2);
        assert_eq!(request.currency, "USD");
        assert_eq!(request.sort_by, HotelSortBy::HighestRating);
    }

    #[test]
    fn price_range_skips_missing_rates() {
        assert_eq!(nightly_price_range(&[]), None);

        let properties = vec![
            priced(Some(180.0)),
            HotelProperty::default(),
            priced(None),
            priced(Some(95.5)),
            priced(Some(240.0)),
        ];
        assert_eq!(nightly_price_range(&properties), Some((95.5, 240.0)));
    }

    #[test]
    fn params_map_guests_to_adults() {
        let params = HotelSearchParams {
            location: Some("Paris".into()),
            check_in_date: Some("2026-02-01".into()),
            check_out_date: Some("2026-02-04".into()),
            guests: 3,
            ..HotelSearchParams::default()
        };
        let request = params.to_search_request().expect("complete params");
        assert_eq!(request.adults, 3);
        assert_eq!(request.q, "Paris");

        let missing = HotelSearchParams {
            check_in_date: None,
            ..params
        };
        assert!(missing.to_search_request().is_none());
    }
}
