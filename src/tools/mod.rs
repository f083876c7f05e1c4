pub mod flights;
pub mod hotels;
pub mod suggestions;

use std::sync::Arc;

use schemars::JsonSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::error::{Result, TravelAgentError};
use crate::provider::{FlightSearchProvider, HotelSearchProvider};

use self::flights::{SearchFlightsParams, search_flights_impl};
use self::hotels::{SearchHotelsParams, search_hotels_impl};
use self::suggestions::{LocationQueryArgs, get_airport_suggestions, get_hotel_suggestions};

pub const SEARCH_FLIGHTS: &str = "search_flights";
pub const SEARCH_HOTELS: &str = "search_hotels";
pub const GET_AIRPORT_SUGGESTIONS: &str = "get_airport_suggestions";
pub const GET_HOTEL_SUGGESTIONS: &str = "get_hotel_suggestions";

/// Name, description and JSON parameter schema handed to the model.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

impl ToolSpec {
    fn new<T: JsonSchema>(name: &'static str, description: &'static str) -> Self {
        let mut parameters = serde_json::to_value(schemars::schema_for!(T)).unwrap_or_default();
        if let Some(object) = parameters.as_object_mut() {
            object.remove("$schema");
            object.remove("title");
        }
        Self {
            name,
            description,
            parameters,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolSet {
    Flight,
    Hotel,
    #[default]
    Travel,
}

impl ToolSet {
    pub fn tool_names(&self) -> &'static [&'static str] {
        match self {
            ToolSet::Flight => &[SEARCH_FLIGHTS, GET_AIRPORT_SUGGESTIONS],
            ToolSet::Hotel => &[SEARCH_HOTELS, GET_HOTEL_SUGGESTIONS],
            ToolSet::Travel => &[
                SEARCH_FLIGHTS,
                GET_AIRPORT_SUGGESTIONS,
                SEARCH_HOTELS,
                GET_HOTEL_SUGGESTIONS,
            ],
        }
    }
}

fn spec_for(name: &str) -> Option<ToolSpec> {
    let spec = match name {
        SEARCH_FLIGHTS => ToolSpec::new::<SearchFlightsParams>(
            SEARCH_FLIGHTS,
            "Search for flights between two locations. Accepts airport codes or city names, \
             dates in YYYY-MM-DD format, passenger count, trip type \
             (round_trip, one_way, multi_city) and travel class \
             (economy, premium_economy, business, first).",
        ),
        SEARCH_HOTELS => ToolSpec::new::<SearchHotelsParams>(
            SEARCH_HOTELS,
            "Search for hotels in a location. Accepts a city, address or landmark, \
             check-in and check-out dates in YYYY-MM-DD format, guest and room counts, \
             a sort order and optional price or class filters.",
        ),
        GET_AIRPORT_SUGGESTIONS => ToolSpec::new::<LocationQueryArgs>(
            GET_AIRPORT_SUGGESTIONS,
            "Get airport code suggestions for a city or partial airport name.",
        ),
        GET_HOTEL_SUGGESTIONS => ToolSpec::new::<LocationQueryArgs>(
            GET_HOTEL_SUGGESTIONS,
            "Get hotel location suggestions for a city or area.",
        ),
        _ => return None,
    };
    Some(spec)
}

pub fn specs_for(set: ToolSet) -> Vec<ToolSpec> {
    set.tool_names()
        .iter()
        .filter_map(|name| spec_for(name))
        .collect()
}

/// The travel tools bound to their search providers.
#[derive(Clone)]
pub struct TravelTools {
    flights: Arc<dyn FlightSearchProvider>,
    hotels: Arc<dyn HotelSearchProvider>,
    set: ToolSet,
}

impl TravelTools {
    pub fn new(
        flights: Arc<dyn FlightSearchProvider>,
        hotels: Arc<dyn HotelSearchProvider>,
        set: ToolSet,
    ) -> Self {
        Self {
            flights,
            hotels,
            set,
        }
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        specs_for(self.set)
    }

    /// Runs one tool. Failures inside a tool come back as `{"error": ...}`
    /// output; only an unknown tool or undecodable arguments are errors.
    pub async fn call(&self, name: &str, args: Value) -> Result<Value> {
        if !self.set.tool_names().contains(&name) {
            return Err(unknown_tool(name));
        }

        let output = match name {
            SEARCH_FLIGHTS => {
                let params: SearchFlightsParams = decode_args(name, args)?;
                to_output(search_flights_impl(self.flights.as_ref(), params).await)
            }
            SEARCH_HOTELS => {
                let params: SearchHotelsParams = decode_args(name, args)?;
                to_output(search_hotels_impl(self.hotels.as_ref(), params).await)
            }
            GET_AIRPORT_SUGGESTIONS => get_airport_suggestions(&decode_args(name, args)?),
            GET_HOTEL_SUGGESTIONS => get_hotel_suggestions(&decode_args(name, args)?),
            other => return Err(unknown_tool(other)),
        };
        Ok(output)
    }
}

fn unknown_tool(name: &str) -> TravelAgentError {
    TravelAgentError::ToolExecution {
        tool: name.to_string(),
        message: "unknown tool".to_string(),
    }
}

fn decode_args<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T> {
    serde_json::from_value(args).map_err(|e| TravelAgentError::ToolExecution {
        tool: tool.to_string(),
        message: format!("invalid arguments: {e}"),
    })
}

fn to_output<T: Serialize>(result: std::result::Result<T, String>) -> Value {
    match result {
        Ok(value) => serde_json::to_value(value).unwrap_or_else(|e| json!({ "error": e.to_string() })),
        Err(error) => {
            tracing::warn!(%error, "Tool returned an error");
            json!({ "error": error })
        }
    }
}
