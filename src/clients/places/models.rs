use indexmap::IndexMap;
use serde::Deserialize;

use crate::business::{Coordinates, collect_address_components};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
}

/// Nearby Search の1件分の要約。
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlaceSummary {
    #[serde(default)]
    pub place_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub vicinity: Option<String>,
}

impl PlaceSummary {
    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        self.geometry
            .and_then(|geometry| Coordinates::new(geometry.location.lat, geometry.location.lng))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OpeningHours {
    #[serde(default)]
    pub weekday_text: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AddressComponent {
    pub long_name: String,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
}

/// Place Details の拡張フィールド。
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlaceDetails {
    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub formatted_phone_number: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub opening_hours: Option<OpeningHours>,
    #[serde(default)]
    pub address_components: Vec<AddressComponent>,
}

impl PlaceDetails {
    #[must_use]
    pub fn weekday_text(&self) -> Vec<String> {
        self.opening_hours
            .as_ref()
            .map(|hours| hours.weekday_text.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn address_component_map(&self) -> IndexMap<String, String> {
        collect_address_components(
            self.address_components
                .iter()
                .map(|component| (component.types.as_slice(), component.long_name.as_str())),
        )
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeResponse {
    pub(crate) status: String,
    #[serde(default)]
    pub(crate) results: Vec<GeocodeResult>,
    #[serde(default)]
    pub(crate) error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeResult {
    pub(crate) geometry: Geometry,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NearbySearchResponse {
    pub(crate) status: String,
    #[serde(default)]
    pub(crate) results: Vec<PlaceSummary>,
    #[serde(default)]
    pub(crate) next_page_token: Option<String>,
    #[serde(default)]
    pub(crate) error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlaceDetailsResponse {
    pub(crate) status: String,
    #[serde(default)]
    pub(crate) result: Option<PlaceDetails>,
    #[serde(default)]
    pub(crate) error_message: Option<String>,
}
