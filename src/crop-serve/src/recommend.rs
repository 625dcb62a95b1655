//! Rule-based crop and fertilizer recommendations.
//!
//! Stand-in logic until a trained model replaces it. The thresholds are
//! simple agronomic rules of thumb, not calibrated science.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};

/// Soil and climate readings for crop selection.
#[derive(Debug, Deserialize)]
pub struct CropFeatures {
    #[serde(rename = "N", deserialize_with = "lenient_f64")]
    pub n: f64,
    #[serde(rename = "P", deserialize_with = "lenient_f64")]
    pub p: f64,
    #[serde(rename = "K", deserialize_with = "lenient_f64")]
    pub k: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub ph: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub rainfall: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub temperature: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub humidity: f64,
}

/// Soil, climate and crop context for fertilizer selection.
#[derive(Debug, Deserialize)]
pub struct FertilizerFeatures {
    #[serde(rename = "N", deserialize_with = "lenient_f64")]
    pub n: f64,
    #[serde(rename = "P", deserialize_with = "lenient_f64")]
    pub p: f64,
    #[serde(rename = "K", deserialize_with = "lenient_f64")]
    pub k: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub temperature: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub humidity: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub moisture: f64,
    pub soil_type: String,
    pub crop_type: String,
}

/// Accepts JSON numbers as well as numeric strings. The web frontend
/// posts form values as strings.
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    struct LenientF64;

    impl Visitor<'_> for LenientF64 {
        type Value = f64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a number or a numeric string")
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
            v.trim()
                .parse()
                .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
        }
    }

    deserializer.deserialize_any(LenientF64)
}

pub fn recommend_crop(features: &CropFeatures) -> &'static str {
    let CropFeatures {
        n,
        p,
        ph,
        rainfall,
        temperature,
        humidity,
        ..
    } = *features;

    if temperature > 30.0 && n > 50.0 && ph > 6.0 && rainfall > 100.0 {
        "Rice"
    } else if temperature > 20.0
        && temperature < 30.0
        && n > 30.0
        && n < 60.0
        && ph > 5.0
        && ph < 7.0
    {
        "Wheat"
    } else if temperature < 20.0 && humidity > 50.0 && p > 30.0 {
        "Potato"
    } else {
        "Maize"
    }
}

pub fn recommend_fertilizer(features: &FertilizerFeatures) -> String {
    let FertilizerFeatures {
        n,
        p,
        k,
        temperature,
        humidity,
        moisture,
        ..
    } = *features;
    let crop = features.crop_type.to_lowercase();

    let base = if n > 80.0 && p > 60.0 && k > 50.0 {
        "High-NPK fertilizer (e.g., 19-19-19)"
    } else if n < 40.0 && p < 40.0 && k < 40.0 {
        "Balanced, low-dose fertilizer (e.g., 10-10-10)"
    } else if n > 70.0 {
        "High-Nitrogen fertilizer (e.g., Urea, 28-0-0)"
    } else if p > 50.0 {
        "High-Phosphorus fertilizer (e.g., DAP)"
    } else if k > 50.0 {
        "High-Potassium fertilizer (e.g., Muriate of Potash)"
    } else {
        "A balanced fertilizer (e.g., 20-20-20)"
    };

    let mut recommendation = if crop.contains("rice") {
        if n < 60.0 {
            "Urea is often recommended for rice. Consider supplementing.".to_owned()
        } else {
            "Your nitrogen levels seem adequate for rice. Use a balanced fertilizer.".to_owned()
        }
    } else if crop.contains("maize") {
        if k < 50.0 {
            format!("{base}, with extra Potassium for maize.")
        } else {
            base.to_owned()
        }
    } else if crop.contains("wheat") {
        if n < 50.0 {
            "Wheat requires good nitrogen. Consider a nitrogen-rich fertilizer.".to_owned()
        } else {
            base.to_owned()
        }
    } else {
        base.to_owned()
    };

    if temperature > 30.0 && humidity > 70.0 {
        recommendation
            .push_str(" Be cautious with dosage in high heat and humidity to avoid root burn.");
    } else if moisture < 20.0 {
        recommendation
            .push_str(" Ensure adequate irrigation, as fertilizer is less effective in dry soil.");
    }

    recommendation
}
