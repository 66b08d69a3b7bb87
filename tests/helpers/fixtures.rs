// ABOUTME: Canned Open Food Facts products and NewsAPI articles for integration tests
// ABOUTME: Shapes mirror what the real upstream services return
#![allow(dead_code)]

use scanbar_server::external::news_api::NewsSourceRef;
use scanbar_server::external::{OffProduct, RawArticle};
use serde_json::json;

/// Barcode of a packaged tea with complete nutrition facts
pub const TEA_BARCODE: &str = "8996001600269";

/// Barcode of a product Open Food Facts knows without nutrition facts
pub const BARE_BARCODE: &str = "8991002101104";

/// Product with complete per-100g nutrition
pub fn tea_product() -> OffProduct {
    OffProduct::from_value(&json!({
        "product_name": "Teh Botol Sosro",
        "brands": "Sosro",
        "image_front_url": "https://images.openfoodfacts.org/teh-botol-front.jpg",
        "image_small_url": "https://images.openfoodfacts.org/teh-botol-small.jpg",
        "serving_size": "250 ml",
        "nutriments": {
            "energy-kcal_100g": 36,
            "proteins_100g": 0,
            "carbohydrates_100g": 9,
            "fat_100g": 0,
            "sugars_100g": 9,
            "sodium_100g": 0.01
        }
    }))
}

/// Product whose nutrition facts are all zero
pub fn bare_product() -> OffProduct {
    OffProduct::from_value(&json!({
        "product_name": "Kerupuk Udang",
        "nutriments": { "energy-kcal_100g": 0 }
    }))
}

/// NewsAPI article
pub fn article(title: &str, url: &str) -> RawArticle {
    RawArticle {
        title: Some(title.to_owned()),
        description: Some(format!("Ringkasan: {title}")),
        url: Some(url.to_owned()),
        url_to_image: None,
        published_at: Some("2025-03-01T08:00:00Z".to_owned()),
        source: NewsSourceRef {
            name: Some("Kompas Health".to_owned()),
        },
    }
}
