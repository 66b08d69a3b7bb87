// ABOUTME: Rule-based nutrition analysis used when no generative model is available
// ABOUTME: Flags sugar, salt and fat thresholds per 100 g and picks summary and diet suitability
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};

/// Calories per 100 g considered high
const HIGH_CALORIES: f64 = 250.0;
/// Calories per 100 g considered moderate
const MODERATE_CALORIES: f64 = 150.0;
/// Sugar (g per 100 g) considered high
const HIGH_SUGAR: f64 = 10.0;
/// Salt (g per 100 g) considered high
const HIGH_SALT: f64 = 0.5;
/// Fat (g per 100 g) considered high
const HIGH_FAT: f64 = 17.0;
/// Carbohydrates (g per 100 g) that still fit a low-carb diet
const LOW_CARB_LIMIT: f64 = 5.0;

const MAX_RISKS: usize = 3;
const MAX_WARNINGS: usize = 2;

const RISK_DIABETES: &str = "Diabetes tipe 2";
const RISK_OBESITY: &str = "Obesitas";
const RISK_HYPERTENSION: &str = "Hipertensi";
const RISK_CARDIOVASCULAR: &str = "Penyakit kardiovaskular";

const WARNING_SUGAR: &str = "Produk ini tinggi gula \u{2014} batasi konsumsi.";
const WARNING_SALT: &str =
    "Kandungan garam tinggi \u{2014} hindari jika Anda memiliki tekanan darah tinggi.";
const WARNING_FAT: &str = "Kaya lemak \u{2014} konsumsi secukupnya.";

const SUMMARY_NEUTRAL: &str = "Netral \u{2014} konsumsi dalam porsi yang wajar.";
const SUMMARY_UNHEALTHY: &str = "Produk ini cenderung tidak sehat jika dikonsumsi berlebihan.";
const SUMMARY_LIGHT: &str =
    "Produk relatif rendah kalori/gula; dapat dikonsumsi lebih santai dalam porsi moderat.";

const DIET_NEUTRAL: &str = "Netral";
const DIET_LOW_CARB: &str = "Cocok untuk diet rendah karbohidrat (low-carb).";
const DIET_NOT_LOW_SUGAR: &str = "Tidak cocok untuk diet rendah gula atau penderita diabetes.";
const DIET_NOT_LOW_SALT: &str = "Tidak cocok untuk diet rendah garam.";

const RECOMMENDATIONS: [&str; 2] = [
    "Ganti dengan air putih atau teh tawar untuk mengurangi gula.",
    "Pilih buah segar atau yoghurt rendah lemak sebagai alternatif yang lebih sehat.",
];

const DISCLAIMER: &str =
    "Ini adalah analisis heuristik sederhana dan bukan pengganti nasihat medis profesional.";

/// Marker stored in [`HeuristicAnalysis::source`]
pub const HEURISTIC_SOURCE: &str = "heuristic";

/// Nutrition values of one product, per 100 g
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeuristicInput {
    pub product_name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub sugar: f64,
    pub salt: f64,
}

/// Analysis shaped like a normalized model answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeuristicAnalysis {
    pub summary: String,
    pub risks: Vec<String>,
    pub warnings: Vec<String>,
    pub diet_suitability: String,
    pub recommendations: Vec<String>,
    pub disclaimer: String,
    pub source: String,
}

/// Build an analysis from fixed thresholds
///
/// Non-finite inputs are treated as 0.
#[must_use]
pub fn generate(input: &HeuristicInput) -> HeuristicAnalysis {
    let finite = |v: f64| if v.is_finite() { v } else { 0.0 };
    let calories = finite(input.calories);
    let carbs = finite(input.carbs);
    let fat = finite(input.fat);
    let sugar = finite(input.sugar);
    let salt = finite(input.salt);

    let high_sugar = sugar >= HIGH_SUGAR;
    let high_salt = salt >= HIGH_SALT;
    let high_fat = fat >= HIGH_FAT;

    let mut risks: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();
    let mut add_risk = |risk: &str| {
        if !risks.iter().any(|r| r == risk) {
            risks.push(risk.to_owned());
        }
    };

    if high_sugar {
        add_risk(RISK_DIABETES);
        add_risk(RISK_OBESITY);
        warnings.push(WARNING_SUGAR.to_owned());
    }
    if high_salt {
        add_risk(RISK_HYPERTENSION);
        warnings.push(WARNING_SALT.to_owned());
    }
    if high_fat {
        add_risk(RISK_CARDIOVASCULAR);
        warnings.push(WARNING_FAT.to_owned());
    }
    risks.truncate(MAX_RISKS);
    warnings.truncate(MAX_WARNINGS);

    let summary = if calories >= HIGH_CALORIES || high_sugar || high_salt {
        SUMMARY_UNHEALTHY
    } else if calories <= MODERATE_CALORIES {
        SUMMARY_LIGHT
    } else {
        SUMMARY_NEUTRAL
    };

    let diet_suitability = if carbs <= LOW_CARB_LIMIT && !high_sugar {
        DIET_LOW_CARB
    } else if high_sugar {
        DIET_NOT_LOW_SUGAR
    } else if high_salt {
        DIET_NOT_LOW_SALT
    } else {
        DIET_NEUTRAL
    };

    HeuristicAnalysis {
        summary: summary.to_owned(),
        risks,
        warnings,
        diet_suitability: diet_suitability.to_owned(),
        recommendations: RECOMMENDATIONS.iter().map(|r| (*r).to_owned()).collect(),
        disclaimer: DISCLAIMER.to_owned(),
        source: HEURISTIC_SOURCE.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(calories: f64, protein: f64, carbs: f64, fat: f64, sugar: f64, salt: f64) -> HeuristicInput {
        HeuristicInput {
            product_name: "Test".to_owned(),
            calories,
            protein,
            carbs,
            fat,
            sugar,
            salt,
        }
    }

    #[test]
    fn test_sugary_drink_flags_diabetes() {
        let analysis = generate(&input(120.0, 0.0, 10.9, 0.0, 10.9, 0.0));
        assert!(analysis.risks.iter().any(|r| r == RISK_DIABETES));
        assert_eq!(analysis.summary, SUMMARY_UNHEALTHY);
        assert_eq!(analysis.diet_suitability, DIET_NOT_LOW_SUGAR);
        assert_eq!(analysis.source, "heuristic");
    }

    #[test]
    fn test_all_zero_has_no_risks() {
        let analysis = generate(&HeuristicInput::default());
        assert!(analysis.risks.is_empty());
        assert!(analysis.warnings.is_empty());
        assert_eq!(analysis.summary, SUMMARY_LIGHT);
        assert_eq!(analysis.diet_suitability, DIET_LOW_CARB);
        assert_eq!(analysis.recommendations.len(), 2);
    }

    #[test]
    fn test_salty_snack_flags_hypertension() {
        let analysis = generate(&input(200.0, 2.0, 20.0, 10.0, 2.0, 1.0));
        assert!(analysis.risks.iter().any(|r| r == RISK_HYPERTENSION));
        assert_eq!(analysis.diet_suitability, DIET_NOT_LOW_SALT);
    }

    #[test]
    fn test_limits_risks_and_warnings() {
        let analysis = generate(&input(500.0, 5.0, 60.0, 30.0, 40.0, 2.0));
        assert_eq!(analysis.risks.len(), 3);
        assert_eq!(analysis.warnings.len(), 2);
        assert!(!analysis.risks.iter().any(|r| r == RISK_CARDIOVASCULAR));
    }

    #[test]
    fn test_moderate_calories_are_neutral() {
        let analysis = generate(&input(200.0, 5.0, 30.0, 5.0, 2.0, 0.1));
        assert_eq!(analysis.summary, SUMMARY_NEUTRAL);
        assert_eq!(analysis.diet_suitability, DIET_NEUTRAL);
    }
}
