use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::location::{airport_suggestions, hotel_suggestions};

/// Arguments shared by both suggestion tools.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct LocationQueryArgs {
    /// Partial or full name of a city or airport
    pub location_query: String,
}

pub fn get_airport_suggestions(args: &LocationQueryArgs) -> Value {
    let suggestions = airport_suggestions(&args.location_query);
    if suggestions.is_empty() {
        return json!({
            "error": format!("No airport suggestions found for: {}", args.location_query),
            "suggestions": [],
        });
    }
    json!({ "query": args.location_query, "suggestions": suggestions })
}

pub fn get_hotel_suggestions(args: &LocationQueryArgs) -> Value {
    let suggestions = hotel_suggestions(&args.location_query);
    if suggestions.is_empty() {
        return json!({
            "error": format!("No location suggestions found for: {}", args.location_query),
            "suggestions": [],
        });
    }
    json!({ "query": args.location_query, "suggestions": suggestions })
}
