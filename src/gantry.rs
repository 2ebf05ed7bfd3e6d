//! The gantry catalogue and its binding to a computed route.

use crate::math::geo::LatLng;
use crate::route::RouteIndex;
use crate::tariff::{resolve_price, TimeProfile, VehicleCategory};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// A toll collection point with a position and a pricing record.
///
/// Field names mirror the catalogue JSON, which was scraped from
/// OpenStreetMap and enriched from concession tariff documents. The tariff
/// record is polymorphic: `precio` is a flat price, `tarifas_urbanas` a
/// loosely-structured table; either or both may be missing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Gantry {
    /// The OSM identifier, e.g. `"node/13881069"`.
    pub id: String,
    /// The gantry's display name.
    #[serde(rename = "nombre")]
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    /// The highway the gantry belongs to.
    #[serde(rename = "autopista", default)]
    pub highway: Option<String>,
    /// A flat price in CLP, where the concession has a single tariff.
    #[serde(rename = "precio", default)]
    pub flat_price: Option<f64>,
    /// The extracted urban tariff table, keyed by category and/or time band.
    #[serde(rename = "tarifas_urbanas", default)]
    pub schedule: Option<Map<String, Value>>,
}

/// An error reading the gantry catalogue.
#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("failed to read catalogue: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse catalogue: {0}")]
    Parse(#[from] serde_json::Error),
}

impl Gantry {
    /// The gantry's geographic position.
    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    /// Resolves this gantry's price for a category under a time profile.
    pub fn resolve_price(&self, category: VehicleCategory, profile: TimeProfile) -> f64 {
        resolve_price(self.schedule.as_ref(), self.flat_price, category, profile)
    }

    /// Reads the full gantry catalogue from a JSON array file.
    pub fn load_catalogue(path: impl AsRef<Path>) -> Result<Vec<Gantry>, CatalogueError> {
        Self::parse_catalogue(std::fs::File::open(path)?)
    }

    /// Parses the gantry catalogue from a JSON array.
    pub fn parse_catalogue(reader: impl Read) -> Result<Vec<Gantry>, CatalogueError> {
        Ok(serde_json::from_reader(reader)?)
    }
}

/// The pre-computed association of a gantry with a specific route.
#[derive(Clone, Debug)]
pub struct RouteBinding {
    /// The bound gantry's identifier.
    pub gantry_id: String,
    /// The bound gantry's display name.
    pub name: String,
    /// The gantry's geographic position.
    pub position: LatLng,
    /// The fraction along the route at which the gantry sits.
    pub fraction: f64,
    /// The gantry's offset from the route at that fraction, in m.
    pub offset_m: f64,
    /// The resolved price per category at the active time profile.
    prices: [f64; 3],
}

impl RouteBinding {
    /// The pre-resolved price for a vehicle category, in CLP.
    pub fn price(&self, category: VehicleCategory) -> f64 {
        self.prices[category.index()]
    }
}

/// Binds to the route every gantry within `threshold_m` of it, with prices
/// pre-resolved for every category so the simulation never touches the raw
/// tariff records. Pure; recompute on any route or profile change.
///
/// The returned bindings are ordered by fraction ascending.
pub fn bind_route(
    route: &RouteIndex,
    gantries: &[Gantry],
    threshold_m: f64,
    profile: TimeProfile,
) -> Vec<RouteBinding> {
    let mut bindings: Vec<RouteBinding> = gantries
        .iter()
        .filter_map(|gantry| {
            let near = route.nearest_fraction(gantry.position());
            if near.distance_m > threshold_m {
                return None;
            }
            let prices =
                VehicleCategory::ALL.map(|cat| gantry.resolve_price(cat, profile));
            Some(RouteBinding {
                gantry_id: gantry.id.clone(),
                name: gantry.name.clone(),
                position: gantry.position(),
                fraction: near.fraction,
                offset_m: near.distance_m,
                prices,
            })
        })
        .collect();
    bindings.sort_by(|a, b| a.fraction.total_cmp(&b.fraction));
    bindings
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use serde_json::json;

    fn straight_route() -> RouteIndex {
        RouteIndex::build(&[LatLng::new(-33.40, -70.65), LatLng::new(-33.50, -70.65)]).unwrap()
    }

    fn gantry_at(id: &str, lat: f64, lng: f64, price: f64) -> Gantry {
        Gantry {
            id: id.to_string(),
            name: id.to_string(),
            lat,
            lng,
            highway: None,
            flat_price: Some(price),
            schedule: None,
        }
    }

    #[test]
    fn binds_gantries_on_the_route_in_order() {
        let route = straight_route();
        let gantries = [
            gantry_at("b", -33.47, -70.65, 700.0),
            gantry_at("a", -33.42, -70.65, 500.0),
            // Roughly 900 m east of the route; must be discarded.
            gantry_at("far", -33.45, -70.64, 999.0),
        ];
        let bindings = bind_route(&route, &gantries, 50.0, TimeProfile::Peak);
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[0].gantry_id, "a");
        assert_eq!(bindings[1].gantry_id, "b");
        assert!(bindings[0].fraction < bindings[1].fraction);
        assert_approx_eq!(bindings[0].fraction, 0.2, 1e-3);
        assert_eq!(bindings[0].price(VehicleCategory::Heavy), 500.0);
    }

    #[test]
    fn binding_pre_resolves_every_category() {
        let route = straight_route();
        let gantry = Gantry {
            id: "g".into(),
            name: "Pórtico".into(),
            lat: -33.45,
            lng: -70.65,
            highway: None,
            flat_price: None,
            schedule: json!({
                "categoria_1": { "TBP": 100 },
                "categoria_2": { "TBP": 200 },
                "categoria_3": { "TBP": 300 },
            })
            .as_object()
            .cloned(),
        };
        let bindings = bind_route(&route, &[gantry], 50.0, TimeProfile::Peak);
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].price(VehicleCategory::Light), 100.0);
        assert_eq!(bindings[0].price(VehicleCategory::TwoAxle), 200.0);
        assert_eq!(bindings[0].price(VehicleCategory::Heavy), 300.0);
    }

    #[test]
    fn catalogue_parses_heterogeneous_records() {
        let raw = r#"[
            {
                "id": "node/1", "nombre": "Peaje Lo Prado", "lat": -33.46, "lng": -70.85,
                "km": 20, "tipo": "toll_booth", "autopista": "Ruta 68", "precio": 3400
            },
            {
                "id": "node/2", "nombre": "PA-2 Vivaceta", "lat": -33.41, "lng": -70.66,
                "tipo": "toll_gantry", "autopista": "Costanera Norte",
                "tarifas_urbanas": { "TBFP": 585, "TBP": 669, "TS": 1003 }
            }
        ]"#;
        let gantries = Gantry::parse_catalogue(raw.as_bytes()).unwrap();
        assert_eq!(gantries.len(), 2);
        assert_eq!(gantries[0].flat_price, Some(3400.0));
        assert!(gantries[0].schedule.is_none());
        assert_eq!(
            gantries[1].resolve_price(VehicleCategory::Light, TimeProfile::Saturation),
            1003.0
        );
        assert_eq!(
            gantries[0].resolve_price(VehicleCategory::Heavy, TimeProfile::Peak),
            3400.0
        );
    }
}
