//! Tariff resolution over the heterogeneous pricing records of the gantry
//! catalogue.
//!
//! The catalogue was extracted from concession documents with wildly
//! inconsistent schemas: some gantries carry a single flat price, others a
//! nested table keyed by vehicle category and time-of-day band, with key
//! spellings that differ per highway (`"TBFP"`, `"Tarifa Base"`,
//! `"categoria_1_4"`, ...). [resolve_price] hides all of that behind one
//! total function so the simulator only ever sees a clean number.

use log::warn;
use serde_json::{Map, Value};

/// A vehicle class used to select a price tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum VehicleCategory {
    /// Categoría 1: motorbikes, cars and light trucks.
    Light,
    /// Categoría 2: buses and two-axle trucks.
    TwoAxle,
    /// Categoría 3: articulated trucks and anything with more than two axles.
    Heavy,
}

impl VehicleCategory {
    /// All categories, ordered lightest to heaviest.
    pub const ALL: [VehicleCategory; 3] = [Self::Light, Self::TwoAxle, Self::Heavy];

    /// Index of the category in [Self::ALL].
    pub fn index(self) -> usize {
        match self {
            Self::Light => 0,
            Self::TwoAxle => 1,
            Self::Heavy => 2,
        }
    }

    /// The normalized key spellings seen for this category across
    /// differently-extracted records, in lookup order.
    fn synonyms(self) -> &'static [&'static str] {
        match self {
            Self::Light => &[
                "categoria_1",
                "categoria_1_4",
                "autos_y_camionetas",
                "autos",
                "livianos",
                "liviano",
                "motos",
            ],
            Self::TwoAxle => &[
                "categoria_2",
                "buses_y_camiones_2_ejes",
                "buses_y_camiones",
                "camiones_2_ejes",
                "buses",
                "medianos",
            ],
            Self::Heavy => &[
                "categoria_3",
                "camiones_mas_de_2_ejes",
                "camiones_con_remolque",
                "articulados",
                "pesados",
                "pesado",
            ],
        }
    }
}

/// A time-of-day pricing regime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum TimeProfile {
    /// TBFP: tarifa base fuera de punta.
    OffPeak,
    /// TBP: tarifa base en punta.
    Peak,
    /// TS: tarifa de saturación.
    Saturation,
}

impl TimeProfile {
    /// The normalized key spellings seen for this profile, in lookup order.
    fn synonyms(self) -> &'static [&'static str] {
        match self {
            Self::OffPeak => &[
                "tbfp",
                "valle",
                "tarifa_base_fuera_punta",
                "tarifa_base_fuera_de_punta",
                "tarifa_base",
                "fuera_punta",
                "fuera_de_punta",
                "tb",
                "base",
                "normal",
            ],
            Self::Peak => &[
                "tbp",
                "punta",
                "tarifa_punta",
                "tarifa_base_punta",
                "tarifa_base_en_punta",
                "hora_punta",
            ],
            Self::Saturation => &["ts", "saturacion", "tarifa_saturacion", "tarifa_de_saturacion"],
        }
    }
}

/// Normalizes a tariff-record key: lowercased, accents stripped,
/// spaces and hyphens collapsed to underscores.
fn normalize_key(key: &str) -> String {
    key.trim()
        .chars()
        .flat_map(|c| {
            let c = match c {
                'á' | 'Á' => 'a',
                'é' | 'É' => 'e',
                'í' | 'Í' => 'i',
                'ó' | 'Ó' => 'o',
                'ú' | 'Ú' | 'ü' | 'Ü' => 'u',
                'ñ' | 'Ñ' => 'n',
                ' ' | '-' | '/' => '_',
                c => c,
            };
            c.to_lowercase()
        })
        .collect()
}

/// Finds the first synonym present in the map and returns its value.
fn lookup<'a>(map: &'a Map<String, Value>, synonyms: &[&str]) -> Option<&'a Value> {
    // Normalize once per record rather than per synonym.
    let entries: Vec<(String, &Value)> = map
        .iter()
        .map(|(k, v)| (normalize_key(k), v))
        .collect();
    synonyms
        .iter()
        .find_map(|syn| entries.iter().find(|(k, _)| k == syn).map(|(_, v)| *v))
}

/// Interprets a JSON value as a price. Extraction sometimes leaves numbers
/// as strings like `"1.350"` or `"585"`.
fn as_price(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace('.', "").replace(',', ".").parse().ok(),
        _ => None,
    }
}

/// Resolves the price for one crossing, in CLP.
///
/// Total: always produces a finite, non-negative number. The fallback order is
/// 1. the category sub-object, if the record has one (else the whole record);
/// 2. the requested profile, tried against every known key spelling;
/// 3. the off-peak value, regardless of the requested profile;
/// 4. the gantry's flat price;
/// 5. zero.
///
/// A resolved 0 from a gantry that should have a price is a data-quality
/// signal, not an error; it is logged and the simulation keeps running.
pub fn resolve_price(
    schedule: Option<&Map<String, Value>>,
    flat_price: Option<f64>,
    category: VehicleCategory,
    profile: TimeProfile,
) -> f64 {
    if let Some(record) = schedule {
        let category_val = lookup(record, category.synonyms());

        // A category key mapping straight to a number is a per-category
        // flat price with no time bands.
        if let Some(price) = category_val.and_then(as_price) {
            return price.max(0.0);
        }

        let category_obj = category_val.and_then(Value::as_object).unwrap_or(record);

        let hit = lookup(category_obj, profile.synonyms())
            .and_then(as_price)
            .or_else(|| lookup(category_obj, TimeProfile::OffPeak.synonyms()).and_then(as_price));
        if let Some(price) = hit {
            return price.max(0.0);
        }
    }

    match flat_price {
        Some(price) => price.max(0.0),
        None => {
            warn!(
                "tariff record exhausted every fallback for {:?}/{:?}; charging 0",
                category, profile
            );
            0.0
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn resolves_short_code_profiles() {
        let record = map(json!({ "TBFP": 585, "TBP": 669, "TS": 1003 }));
        for cat in VehicleCategory::ALL {
            assert_eq!(
                resolve_price(Some(&record), None, cat, TimeProfile::OffPeak),
                585.0
            );
            assert_eq!(
                resolve_price(Some(&record), None, cat, TimeProfile::Peak),
                669.0
            );
            assert_eq!(
                resolve_price(Some(&record), None, cat, TimeProfile::Saturation),
                1003.0
            );
        }
    }

    #[test]
    fn resolves_descriptive_keys() {
        let record = map(json!({ "Tarifa Base": 1500, "Tarifa Punta": 2200 }));
        assert_eq!(
            resolve_price(Some(&record), None, VehicleCategory::Light, TimeProfile::OffPeak),
            1500.0
        );
        assert_eq!(
            resolve_price(Some(&record), None, VehicleCategory::Light, TimeProfile::Peak),
            2200.0
        );
    }

    #[test]
    fn resolves_nested_category_tables() {
        let record = map(json!({
            "categoria_1": { "TBFP": 100, "TBP": 150 },
            "categoria_2": { "TBFP": 200, "TBP": 300 },
            "categoria_3": { "TBFP": 300, "TBP": 450 },
        }));
        assert_eq!(
            resolve_price(Some(&record), None, VehicleCategory::Light, TimeProfile::Peak),
            150.0
        );
        assert_eq!(
            resolve_price(Some(&record), None, VehicleCategory::TwoAxle, TimeProfile::OffPeak),
            200.0
        );
        assert_eq!(
            resolve_price(Some(&record), None, VehicleCategory::Heavy, TimeProfile::Peak),
            450.0
        );
    }

    #[test]
    fn per_category_flat_prices_ignore_the_profile() {
        let record = map(json!({ "categoria_1": 585, "categoria_2": 800 }));
        for profile in [TimeProfile::OffPeak, TimeProfile::Peak, TimeProfile::Saturation] {
            assert_eq!(
                resolve_price(Some(&record), None, VehicleCategory::Light, profile),
                585.0
            );
        }
        assert_eq!(
            resolve_price(Some(&record), None, VehicleCategory::TwoAxle, TimeProfile::Peak),
            800.0
        );
        // No categoria_3 entry and no usable fallback inside the record.
        assert_eq!(
            resolve_price(Some(&record), Some(950.0), VehicleCategory::Heavy, TimeProfile::Peak),
            950.0
        );
    }

    #[test]
    fn missing_profile_falls_back_to_off_peak() {
        let record = map(json!({ "categoria_1": { "TBFP": 420 } }));
        assert_eq!(
            resolve_price(Some(&record), None, VehicleCategory::Light, TimeProfile::Saturation),
            420.0
        );
    }

    #[test]
    fn flat_price_applies_to_every_category_and_profile() {
        for cat in VehicleCategory::ALL {
            for profile in [TimeProfile::OffPeak, TimeProfile::Peak, TimeProfile::Saturation] {
                assert_eq!(resolve_price(None, Some(1350.0), cat, profile), 1350.0);
            }
        }
    }

    #[test]
    fn useless_schedule_falls_back_to_flat_price() {
        let record = map(json!({ "observaciones": "exento en festivos" }));
        assert_eq!(
            resolve_price(Some(&record), Some(900.0), VehicleCategory::Light, TimeProfile::Peak),
            900.0
        );
    }

    #[test]
    fn exhausted_fallback_is_zero_never_a_panic() {
        let malformed = [
            map(json!({})),
            map(json!({ "categoria_1": {} })),
            map(json!({ "TBFP": null })),
            map(json!({ "TBFP": [1, 2, 3] })),
            map(json!({ "categoria_1": { "TBP": "no disponible" } })),
        ];
        for record in &malformed {
            for cat in VehicleCategory::ALL {
                let price = resolve_price(Some(record), None, cat, TimeProfile::Peak);
                assert!(price.is_finite());
                assert!(price >= 0.0);
                assert_eq!(price, 0.0);
            }
        }
    }

    #[test]
    fn negative_prices_are_clamped() {
        assert_eq!(
            resolve_price(None, Some(-10.0), VehicleCategory::Light, TimeProfile::Peak),
            0.0
        );
    }

    #[test]
    fn accented_and_spaced_keys_normalize() {
        let record = map(json!({ "Tarifa de Saturación": 1003 }));
        assert_eq!(
            resolve_price(Some(&record), None, VehicleCategory::Light, TimeProfile::Saturation),
            1003.0
        );
        assert_eq!(normalize_key("Fuera de Punta"), "fuera_de_punta");
        assert_eq!(normalize_key("Categoría 1"), "categoria_1");
    }

    #[test]
    fn numeric_strings_parse_as_prices() {
        let record = map(json!({ "TBFP": "1.350" }));
        assert_eq!(
            resolve_price(Some(&record), None, VehicleCategory::Light, TimeProfile::OffPeak),
            1350.0
        );
    }
}
