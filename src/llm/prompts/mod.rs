// ABOUTME: Prompt templates for LLM interactions loaded at compile time
// ABOUTME: Provides the chatbot system prompt and the food analysis and vision prompts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Prompts
//!
//! Prompts are loaded at compile time from markdown files for easy maintenance.
//! Templates use `{{name}}` placeholders filled in by the functions below.

use crate::nutrition::HeuristicInput;

/// Chatbot system prompt template
const CHATBOT_SYSTEM_TEMPLATE: &str = include_str!("chatbot_system.md");

/// Per-product analysis prompt template
const FOOD_ANALYSIS_TEMPLATE: &str = include_str!("food_analysis.md");

/// Vision prompt describing a food photo
pub const FOOD_VISION_PROMPT: &str = include_str!("food_vision.md");

/// Nutrition estimate prompt template
const NUTRITION_ESTIMATE_TEMPLATE: &str = include_str!("nutrition_estimate.md");

/// Where features live in the mobile app
pub mod navigation {
    pub const SCAN_BARCODE: &str =
        "Di halaman Home, tap card 'Scan Barcode makanan' di bagian Dua Cara Mudah Tracking Nutrisi";
    pub const SCAN_FOOD: &str = "Di halaman Home, tap card 'Foto Makanan' tepat di samping tombol Scan Barcode. atau bisa langsung klik 'Scan Makanan' di bottom navigation, atau icon \u{2630} di pojok kanan atas";
    pub const JOURNAL: &str =
        "Tap icon 'Dashboard' di bottom navigation, atau icon \u{2630} di pojok kanan atas";
    pub const EDIT_BMI: &str =
        "Tap icon 'Calculator' di bottom navigation, atau icon \u{2630} di pojok kanan atas";
    pub const PROFILE: &str =
        "Tap icon 'Profil' di bottom navigation, atau icon \u{2630} di pojok kanan atas";
}

/// Model reply that primes the chatbot conversation after the system prompt
pub const CHATBOT_PRIMING_REPLY: &str = "Baik, saya siap membantu sebagai asisten Scanbar yang fokus pada topik makanan, nutrisi, dan panduan aplikasi!";

/// Chatbot system prompt with the navigation hints filled in
#[must_use]
pub fn chatbot_system_prompt() -> String {
    CHATBOT_SYSTEM_TEMPLATE
        .replace("{{nav_scan_barcode}}", navigation::SCAN_BARCODE)
        .replace("{{nav_scan_food}}", navigation::SCAN_FOOD)
        .replace("{{nav_journal}}", navigation::JOURNAL)
        .replace("{{nav_edit_bmi}}", navigation::EDIT_BMI)
        .replace("{{nav_profile}}", navigation::PROFILE)
}

/// Analysis prompt for one product
#[must_use]
pub fn food_analysis_prompt(input: &HeuristicInput) -> String {
    FOOD_ANALYSIS_TEMPLATE
        .replace("{{product_name}}", input.product_name.trim())
        .replace("{{calories}}", &input.calories.to_string())
        .replace("{{protein}}", &input.protein.to_string())
        .replace("{{carbs}}", &input.carbs.to_string())
        .replace("{{fat}}", &input.fat.to_string())
        .replace("{{sugar}}", &input.sugar.to_string())
        .replace("{{salt}}", &input.salt.to_string())
}

/// Nutrition estimate prompt for a food description
#[must_use]
pub fn nutrition_estimate_prompt(description: &str) -> String {
    NUTRITION_ESTIMATE_TEMPLATE.replace("{{description}}", description.trim())
}
