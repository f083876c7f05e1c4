use serde::{Deserialize, Serialize};

use super::flight::FlightSearchParams;
use super::hotel::HotelSearchParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Flight,
    Hotel,
    #[default]
    Both,
}

impl SearchType {
    /// Widens the tag: seeing a second domain always yields `Both`, and
    /// `Both` never narrows back.
    pub fn widen(self, seen: SearchType) -> SearchType {
        if self == seen { self } else { SearchType::Both }
    }
}

/// Flight and hotel fields captured across one extraction pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelSearchParams {
    pub search_type: SearchType,

    pub departure_location: Option<String>,
    pub arrival_location: Option<String>,
    pub departure_date: Option<String>,
    pub return_date: Option<String>,
    pub passengers: i64,
    pub trip_type: String,
    pub travel_class: String,

    pub hotel_location: Option<String>,
    pub check_in_date: Option<String>,
    pub check_out_date: Option<String>,
    pub guests: i64,
    pub rooms: i64,
    pub hotel_class: Option<String>,
    pub amenities: Option<String>,
    pub max_price: Option<i64>,
    pub vacation_rental: bool,
}

impl Default for TravelSearchParams {
    fn default() -> Self {
        let flight = FlightSearchParams::default();
        let hotel = HotelSearchParams::default();
        Self {
            search_type: SearchType::Both,
            departure_location: flight.departure_location,
            arrival_location: flight.arrival_location,
            departure_date: flight.departure_date,
            return_date: flight.return_date,
            passengers: flight.passengers,
            trip_type: flight.trip_type,
            travel_class: flight.travel_class,
            hotel_location: hotel.location,
            check_in_date: hotel.check_in_date,
            check_out_date: hotel.check_out_date,
            guests: hotel.guests,
            rooms: hotel.rooms,
            hotel_class: hotel.hotel_class,
            amenities: hotel.amenities,
            max_price: hotel.max_price,
            vacation_rental: hotel.vacation_rental,
        }
    }
}

impl TravelSearchParams {
    pub fn flight_params(&self) -> Option<FlightSearchParams> {
        if !matches!(self.search_type, SearchType::Flight | SearchType::Both) {
            return None;
        }
        Some(FlightSearchParams {
            departure_location: self.departure_location.clone(),
            arrival_location: self.arrival_location.clone(),
            departure_date: self.departure_date.clone(),
            return_date: self.return_date.clone(),
            passengers: self.passengers,
            trip_type: self.trip_type.clone(),
            travel_class: self.travel_class.clone(),
        })
    }

    pub fn hotel_params(&self) -> Option<HotelSearchParams> {
        if !matches!(self.search_type, SearchType::Hotel | SearchType::Both) {
            return None;
        }
        Some(HotelSearchParams {
            location: self.hotel_location.clone(),
            check_in_date: self.check_in_date.clone(),
            check_out_date: self.check_out_date.clone(),
            guests: self.guests,
            rooms: self.rooms,
            hotel_class: self.hotel_class.clone(),
            amenities: self.amenities.clone(),
            max_price: self.max_price,
            vacation_rental: self.vacation_rental,
        })
    }

    /// Overwrites every flight field with the values of `flight`.
    fn set_flight(&mut self, flight: FlightSearchParams) {
        self.departure_location = flight.departure_location;
        self.arrival_location = flight.arrival_location;
        self.departure_date = flight.departure_date;
        self.return_date = flight.return_date;
        self.passengers = flight.passengers;
        self.trip_type = flight.trip_type;
        self.travel_class = flight.travel_class;
    }

    /// Overwrites the hotel fields a search call carries. `amenities` is not
    /// a search argument and is left alone.
    fn set_hotel(&mut self, hotel: HotelSearchParams) {
        self.hotel_location = hotel.location;
        self.check_in_date = hotel.check_in_date;
        self.check_out_date = hotel.check_out_date;
        self.guests = hotel.guests;
        self.rooms = hotel.rooms;
        self.hotel_class = hotel.hotel_class;
        self.max_price = hotel.max_price;
        self.vacation_rental = hotel.vacation_rental;
    }
}

/// Folds search calls into one [`TravelSearchParams`].
///
/// Merge law: the latest call of a domain replaces that domain's fields
/// (last writer wins), and the search type starts at the first domain seen
/// and only ever widens to `both`.
#[derive(Debug, Default, Clone)]
pub struct TravelParamsAccumulator {
    params: Option<TravelSearchParams>,
}

impl TravelParamsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn absorb_flight(&mut self, flight: FlightSearchParams) {
        self.absorb(SearchType::Flight, |params| params.set_flight(flight));
    }

    pub fn absorb_hotel(&mut self, hotel: HotelSearchParams) {
        self.absorb(SearchType::Hotel, |params| params.set_hotel(hotel));
    }

    fn absorb(&mut self, seen: SearchType, apply: impl FnOnce(&mut TravelSearchParams)) {
        let params = self.params.get_or_insert_with(|| TravelSearchParams {
            search_type: seen,
            ..TravelSearchParams::default()
        });
        params.search_type = params.search_type.widen(seen);
        apply(params);
    }

    pub fn finish(self) -> Option<TravelSearchParams> {
        self.params
    }
}
