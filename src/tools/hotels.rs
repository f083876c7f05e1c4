use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::models::common::parse_iso_date;
use crate::models::hotel::{
    HotelProperty, HotelSearchRequest, HotelSortBy, nightly_price_range,
};
use crate::models::{
    deserialize_flexible_int, deserialize_flexible_int_opt, deserialize_flexible_string_opt,
};
use crate::provider::HotelSearchProvider;

fn default_guests() -> i64 {
    2
}

fn default_rooms() -> i64 {
    1
}

fn default_sort_by() -> String {
    "relevance".to_string()
}

/// Arguments of the `search_hotels` tool.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct SearchHotelsParams {
    #[schemars(description = "Hotel location (city, address, or landmark)")]
    pub location: String,

    #[schemars(description = "Check-in date in YYYY-MM-DD format")]
    pub check_in_date: String,

    #[schemars(description = "Check-out date in YYYY-MM-DD format")]
    pub check_out_date: String,

    #[schemars(description = "Number of guests (default: 2)")]
    #[schemars(with = "i64")]
    #[serde(default = "default_guests", deserialize_with = "deserialize_flexible_int")]
    pub guests: i64,

    #[schemars(description = "Number of rooms (default: 1)")]
    #[schemars(with = "i64")]
    #[serde(default = "default_rooms", deserialize_with = "deserialize_flexible_int")]
    pub rooms: i64,

    #[schemars(
        description = "Sort results by 'relevance', 'price', 'rating', or 'reviews' (default: 'relevance')"
    )]
    #[serde(default = "default_sort_by")]
    pub sort_by: String,

    #[schemars(description = "Maximum price per night filter")]
    #[schemars(with = "Option<i64>")]
    #[serde(default, deserialize_with = "deserialize_flexible_int_opt")]
    pub max_price: Option<i64>,

    #[schemars(description = "Hotel class filter (e.g., '3,4,5' for 3-5 star hotels)")]
    #[schemars(with = "Option<String>")]
    #[serde(default, deserialize_with = "deserialize_flexible_string_opt")]
    pub hotel_class: Option<String>,

    #[schemars(
        description = "Search for vacation rentals instead of hotels (default: false)"
    )]
    #[serde(default)]
    pub vacation_rental: bool,
}

#[derive(Debug, Serialize)]
pub struct HotelSearchEcho {
    pub location: String,
    pub check_in_date: String,
    pub check_out_date: String,
    pub guests: i64,
    pub rooms: i64,
    pub sort_by: String,
    pub vacation_rental: bool,
}

#[derive(Debug, Serialize)]
pub struct HotelResultsSummary {
    pub properties_count: usize,
    pub ads_count: usize,
    pub price_range: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PropertySummary {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub rating: Option<f64>,
    pub reviews: Option<i64>,
    pub price_per_night: Option<String>,
    pub amenities: Vec<String>,
    pub location_rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hotel_class: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HotelSearchResult {
    pub success: bool,
    pub search_params: HotelSearchEcho,
    pub results_summary: HotelResultsSummary,
    pub properties: Vec<PropertySummary>,
}

const TOP_RESULTS: usize = 3;
const TOP_AMENITIES: usize = 5;

/// Runs the `search_hotels` tool. Every failure comes back as an error
/// message for the agent to relay.
pub async fn search_hotels_impl(
    provider: &dyn HotelSearchProvider,
    params: SearchHotelsParams,
) -> Result<HotelSearchResult, String> {
    let check_in = parse_iso_date(&params.check_in_date).ok_or_else(|| {
        format!(
            "Invalid check-in date format: {}. Please use YYYY-MM-DD format.",
            params.check_in_date
        )
    })?;
    let check_out = parse_iso_date(&params.check_out_date).ok_or_else(|| {
        format!(
            "Invalid check-out date format: {}. Please use YYYY-MM-DD format.",
            params.check_out_date
        )
    })?;
    if check_out <= check_in {
        return Err("Check-out date must be after check-in date.".to_string());
    }

    let mut request = HotelSearchRequest::new(&params.location, check_in, check_out);
    request.adults = params.guests;
    request.sort_by = HotelSortBy::from_token(&params.sort_by);
    request.max_price = params.max_price;
    request.hotel_class = params.hotel_class.clone();
    request.vacation_rentals = params.vacation_rental;
    request
        .validate()
        .map_err(|e| format!("Hotel search failed: {e}"))?;

    tracing::info!(
        location = %params.location,
        check_in = %params.check_in_date,
        check_out = %params.check_out_date,
        "Searching hotels"
    );
    let response = provider.search_hotels(&request).await;
    if let Some(error) = response.error.as_ref() {
        return Err(error.clone());
    }

    let properties = response.properties();
    Ok(HotelSearchResult {
        success: true,
        results_summary: HotelResultsSummary {
            properties_count: properties.len(),
            ads_count: response.ads().len(),
            price_range: nightly_price_range(properties)
                .map(|(low, high)| format!("${low:.0}-${high:.0}")),
        },
        properties: properties
            .iter()
            .take(TOP_RESULTS)
            .map(summarize_property)
            .collect(),
        search_params: HotelSearchEcho {
            location: params.location,
            check_in_date: params.check_in_date,
            check_out_date: params.check_out_date,
            guests: params.guests,
            rooms: params.rooms,
            sort_by: params.sort_by,
            vacation_rental: params.vacation_rental,
        },
    })
}

/// Nightly price preference: the provider's formatted string, then the
/// extracted number formatted as whole dollars.
pub fn nightly_price(property: &HotelProperty) -> Option<String> {
    let rate = property.rate_per_night.as_ref()?;
    if let Some(lowest) = rate.lowest.as_ref().filter(|s| !s.is_empty()) {
        return Some(lowest.clone());
    }
    rate.extracted_lowest
        .filter(|price| *price != 0.0)
        .map(|price| format!("${price:.0}"))
}

fn summarize_property(property: &HotelProperty) -> PropertySummary {
    PropertySummary {
        name: property.name.clone(),
        kind: property.kind.clone(),
        rating: property.overall_rating,
        reviews: property.reviews,
        price_per_night: nightly_price(property),
        amenities: property.amenities.iter().take(TOP_AMENITIES).cloned().collect(),
        location_rating: property.location_rating,
        hotel_class: property.hotel_class.clone().filter(|c| !c.is_empty()),
    }
}
