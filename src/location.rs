//! Static city tables standing in for a geocoding service.
//!
//! Matching is a case-insensitive substring test in both directions, so
//! short or overlapping inputs can hit several cities (and the empty query
//! hits all of them). Callers rely on that exact behavior.

use serde::{Deserialize, Serialize};

const MAX_SUGGESTIONS: usize = 5;

type Table = &'static [(&'static str, &'static [(&'static str, &'static str)])];

const AIRPORTS: Table = &[
    (
        "new york",
        &[
            ("JFK", "John F. Kennedy International Airport"),
            ("LGA", "LaGuardia Airport"),
            ("EWR", "Newark Liberty International Airport"),
        ],
    ),
    (
        "london",
        &[
            ("LHR", "London Heathrow Airport"),
            ("LGW", "London Gatwick Airport"),
            ("STN", "London Stansted Airport"),
        ],
    ),
    (
        "paris",
        &[("CDG", "Charles de Gaulle Airport"), ("ORY", "Paris-Orly Airport")],
    ),
    (
        "tokyo",
        &[("NRT", "Narita International Airport"), ("HND", "Haneda Airport")],
    ),
    ("los angeles", &[("LAX", "Los Angeles International Airport")]),
    (
        "chicago",
        &[
            ("ORD", "O'Hare International Airport"),
            ("MDW", "Midway International Airport"),
        ],
    ),
    ("miami", &[("MIA", "Miami International Airport")]),
    ("san francisco", &[("SFO", "San Francisco International Airport")]),
    ("boston", &[("BOS", "Logan International Airport")]),
    (
        "washington",
        &[
            ("DCA", "Ronald Reagan Washington National Airport"),
            ("IAD", "Washington Dulles International Airport"),
        ],
    ),
];

const HOTEL_DESTINATIONS: Table = &[
    (
        "new york",
        &[
            ("New York, NY", "New York City, United States"),
            ("Manhattan, New York", "Manhattan, New York City"),
            ("Brooklyn, New York", "Brooklyn, New York City"),
        ],
    ),
    (
        "london",
        &[
            ("London, UK", "London, United Kingdom"),
            ("Central London", "Central London, UK"),
            ("Westminster, London", "Westminster, London"),
        ],
    ),
    (
        "paris",
        &[
            ("Paris, France", "Paris, France"),
            ("Champs-Élysées, Paris", "Champs-Élysées, Paris"),
            ("Montmartre, Paris", "Montmartre, Paris"),
        ],
    ),
    (
        "tokyo",
        &[
            ("Tokyo, Japan", "Tokyo, Japan"),
            ("Shibuya, Tokyo", "Shibuya, Tokyo"),
            ("Shinjuku, Tokyo", "Shinjuku, Tokyo"),
        ],
    ),
    (
        "los angeles",
        &[
            ("Los Angeles, CA", "Los Angeles, California"),
            ("Hollywood, Los Angeles", "Hollywood, Los Angeles"),
            ("Beverly Hills, CA", "Beverly Hills, California"),
        ],
    ),
    (
        "miami",
        &[
            ("Miami, FL", "Miami, Florida"),
            ("South Beach, Miami", "South Beach, Miami"),
            ("Miami Beach, FL", "Miami Beach, Florida"),
        ],
    ),
    (
        "las vegas",
        &[
            ("Las Vegas, NV", "Las Vegas, Nevada"),
            ("Las Vegas Strip", "Las Vegas Strip, Nevada"),
            ("Downtown Las Vegas", "Downtown Las Vegas, Nevada"),
        ],
    ),
    (
        "san francisco",
        &[
            ("San Francisco, CA", "San Francisco, California"),
            ("Union Square, San Francisco", "Union Square, San Francisco"),
            (
                "Fisherman's Wharf, San Francisco",
                "Fisherman's Wharf, San Francisco",
            ),
        ],
    ),
    (
        "chicago",
        &[
            ("Chicago, IL", "Chicago, Illinois"),
            ("Downtown Chicago", "Downtown Chicago, Illinois"),
            ("Magnificent Mile, Chicago", "Magnificent Mile, Chicago"),
        ],
    ),
    (
        "boston",
        &[
            ("Boston, MA", "Boston, Massachusetts"),
            ("Back Bay, Boston", "Back Bay, Boston"),
            ("Cambridge, MA", "Cambridge, Massachusetts"),
        ],
    ),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirportSuggestion {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotelLocationSuggestion {
    pub location: String,
    pub description: String,
}

fn is_airport_code(query: &str) -> bool {
    query.chars().count() == 3 && query.chars().all(char::is_alphabetic)
}

fn matching_entries(table: Table, query: &str) -> impl Iterator<Item = &'static (&'static str, &'static str)> {
    let query = query.to_lowercase();
    table
        .iter()
        .filter(move |(city, _)| city.contains(query.as_str()) || query.contains(city))
        .flat_map(|&(_, entries)| entries.iter())
}

/// Up to five airports for a free-text query.
pub fn airport_suggestions(query: &str) -> Vec<AirportSuggestion> {
    let mut suggestions: Vec<AirportSuggestion> = matching_entries(AIRPORTS, query)
        .take(MAX_SUGGESTIONS)
        .map(|(code, name)| AirportSuggestion {
            code: code.to_string(),
            name: name.to_string(),
        })
        .collect();

    if suggestions.is_empty() && is_airport_code(query) {
        let code = query.to_uppercase();
        suggestions.push(AirportSuggestion {
            name: format!("{code} Airport"),
            code,
        });
    }
    suggestions
}

/// Resolves a location to an airport code. Three letter alphabetic input is
/// taken as a code without any registry check.
pub fn resolve_airport_code(location: &str) -> Option<String> {
    if is_airport_code(location) {
        return Some(location.to_uppercase());
    }
    airport_suggestions(location)
        .into_iter()
        .next()
        .map(|suggestion| suggestion.code)
}

/// Up to five hotel destinations; unknown queries get a single generic entry.
pub fn hotel_suggestions(query: &str) -> Vec<HotelLocationSuggestion> {
    let mut suggestions: Vec<HotelLocationSuggestion> = matching_entries(HOTEL_DESTINATIONS, query)
        .take(MAX_SUGGESTIONS)
        .map(|(location, description)| HotelLocationSuggestion {
            location: location.to_string(),
            description: description.to_string(),
        })
        .collect();

    if suggestions.is_empty() {
        let location = title_case(query);
        suggestions.push(HotelLocationSuggestion {
            description: format!("Hotels in {location}"),
            location,
        });
    }
    suggestions
}

/// Upper-cases the first letter of every run of letters and lower-cases the rest.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}
