//! Dimensão de produtos: tradução de categorias e agrupamento em segmentos

use chrono::Utc;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::error::Result;
use crate::extract::ProductRecord;
use crate::types::{DataRow, DataValue, Table};

/// Tradução das categorias de origem (português → inglês)
const CATEGORY_TRANSLATION: &[(&str, &str)] = &[
    ("beleza_saude", "health_beauty"),
    ("informatica_acessorios", "computers_accessories"),
    ("automotivo", "automotive"),
    ("cama_mesa_banho", "bed_bath_table"),
    ("moveis_decoracao", "furniture_decor"),
    ("esporte_lazer", "sports_leisure"),
    ("perfumaria", "perfumery"),
    ("utilidades_domesticas", "housewares"),
    ("telefonia", "telephony"),
    ("relogios_presentes", "watches_gifts"),
    ("alimentos_bebidas", "food_drinks"),
    ("bebes", "baby"),
    ("papelaria", "stationery"),
    ("tablets_impressao_imagem", "tablets_printing_image"),
    ("brinquedos", "toys"),
    ("telefonia_fixa", "fixed_telephony"),
    ("ferramentas_jardim", "garden_tools"),
    ("fashion_bolsas_e_acessorios", "fashion_bags_accessories"),
    ("eletrônicos", "electronics"),
    ("eletrodomesticos", "home_appliances"),
    ("livros_interesse_geral", "books_general_interest"),
    ("construcao_ferramentas_construcao", "construction_tools_construction"),
    ("casa_construcao", "home_construction"),
    ("instrumentos_musicais", "musical_instruments"),
    ("eletrodomesticos_2", "home_appliances_2"),
    ("livros_tecnicos", "books_technical"),
    ("cool_stuff", "cool_stuff"),
    ("malas_acessorios", "luggage_accessories"),
    ("climatizacao", "air_conditioning"),
    ("construcao_ferramentas_iluminacao", "construction_tools_lighting"),
    ("artigos_de_festas", "party_supplies"),
    ("construcao_ferramentas_seguranca", "construction_tools_safety"),
    ("industria_comercio_e_negocios", "industry_commerce_business"),
    ("livros_importados", "books_imported"),
    ("pcs", "computers"),
    ("artigos_de_natal", "christmas_articles"),
    ("fashion_calcados", "fashion_shoes"),
    ("flores", "flowers"),
    ("artes_e_artesanato", "arts_crafts"),
    ("fraldas_higiene", "diapers_hygiene"),
    ("fashion_underwear_e_moda_praia", "fashion_underwear_beach"),
    ("pet_shop", "pet_shop"),
    ("moveis_sala", "living_room_furniture"),
    ("construcao_ferramentas_jardim", "construction_tools_garden"),
    ("fashion_esporte", "fashion_sports"),
    ("sinalizacao_e_seguranca", "signaling_security"),
    ("la_cuisine", "la_cuisine"),
    ("dvds_blu_ray", "dvds_blu_ray"),
    ("fashion_roupa_masculina", "fashion_male_clothing"),
    ("portateis_casa_forno_e_cafe", "portable_kitchen_food_processor"),
    ("cds_dvds_musicais", "cds_dvds_musicals"),
    ("consoles_games", "consoles_games"),
    ("audio", "audio"),
    ("fashion_roupa_feminina", "fashion_female_clothing"),
    ("seguros_e_servicos", "insurance_services"),
    ("portateis_cozinha_e_preparadores_de_alimentos", "portable_kitchen"),
    ("casa_conforto_2", "home_comfort_2"),
    ("agro_industria_e_comercio", "agro_industry_commerce"),
    ("market_place", "market_place"),
    ("fashion_roupa_infanto_juvenil", "fashion_children_clothes"),
    ("musica", "music"),
    ("casa_conforto", "home_comfort"),
    ("cine_foto", "cine_photo"),
    (
        "moveis_cozinha_area_de_servico_jantar_e_jardim",
        "kitchen_dining_laundry_garden_furniture",
    ),
    ("moveis_escritorio", "office_furniture"),
    ("moveis_quarto", "bedroom_furniture"),
    ("fashion_roupa_de_banho", "fashion_swimwear"),
    ("alimentos", "food"),
    ("artes", "arts"),
    ("eletronicos", "electronics"),
    ("livros", "books"),
];

/// Segmentos de negócio; a ordem importa (primeira correspondência vence)
const CATEGORY_SEGMENTS: &[(&str, &[&str])] = &[
    (
        "Electronics",
        &[
            "computers_accessories",
            "telephony",
            "electronics",
            "tablets_printing_image",
            "fixed_telephony",
            "computers",
            "consoles_games",
            "audio",
            "cine_photo",
        ],
    ),
    (
        "Home & Furniture",
        &[
            "bed_bath_table",
            "furniture_decor",
            "housewares",
            "home_appliances",
            "home_construction",
            "air_conditioning",
            "living_room_furniture",
            "kitchen_dining_laundry_garden_furniture",
            "office_furniture",
            "bedroom_furniture",
            "home_comfort",
            "home_appliances_2",
            "home_comfort_2",
            "la_cuisine",
        ],
    ),
    (
        "Fashion & Beauty",
        &[
            "health_beauty",
            "perfumery",
            "fashion_bags_accessories",
            "fashion_shoes",
            "fashion_underwear_beach",
            "fashion_sports",
            "fashion_male_clothing",
            "fashion_female_clothing",
            "fashion_children_clothes",
            "fashion_swimwear",
            "watches_gifts",
        ],
    ),
    (
        "Sports & Leisure",
        &["sports_leisure", "toys", "baby", "pet_shop", "diapers_hygiene"],
    ),
    (
        "Books & Media",
        &[
            "books_general_interest",
            "books_technical",
            "books_imported",
            "dvds_blu_ray",
            "cds_dvds_musicals",
            "music",
            "stationery",
            "arts_crafts",
            "arts",
        ],
    ),
    (
        "Automotive & Tools",
        &[
            "automotive",
            "garden_tools",
            "construction_tools_construction",
            "construction_tools_lighting",
            "construction_tools_safety",
            "construction_tools_garden",
            "signaling_security",
        ],
    ),
    (
        "Food & Drinks",
        &[
            "food_drinks",
            "food",
            "portable_kitchen_food_processor",
            "portable_kitchen",
        ],
    ),
    (
        "Gifts & Party",
        &["party_supplies", "christmas_articles", "flowers", "cool_stuff"],
    ),
    (
        "Business & Industry",
        &[
            "industry_commerce_business",
            "agro_industry_commerce",
            "office_furniture",
            "musical_instruments",
        ],
    ),
    ("Services", &["insurance_services", "market_place"]),
];

/// Dimensão de produtos construída, com o mapa product_id → product_key
#[derive(Debug, Clone)]
pub struct ProductDimension {
    pub table: Table,
    pub keys: HashMap<String, i64>,
}

/// Construtor da dimensão de produtos
#[derive(Debug, Clone)]
pub struct ProductDimensionBuilder {
    translation: HashMap<&'static str, &'static str>,
}

impl Default for ProductDimensionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductDimensionBuilder {
    pub fn new() -> Self {
        Self {
            translation: CATEGORY_TRANSLATION.iter().copied().collect(),
        }
    }

    /// Enriquece os produtos extraídos com categoria traduzida e segmento
    pub fn build(&self, products: &[ProductRecord]) -> Result<ProductDimension> {
        info!(rows = products.len(), "Construindo dimensão de produtos");

        // Defesa contra product_id vazio que tenha passado pela extração
        let valid: Vec<&ProductRecord> =
            products.iter().filter(|p| !p.product_id.is_empty()).collect();
        let dropped = products.len() - valid.len();
        if dropped > 0 {
            warn!(dropped, "produtos sem product_id descartados");
        }

        let mut untranslated = 0usize;
        let mut rows = Vec::with_capacity(valid.len());
        let mut keys = HashMap::with_capacity(valid.len());
        let created_at = Utc::now();

        for (index, product) in valid.iter().enumerate() {
            let product_key = index as i64 + 1;
            keys.insert(product.product_id.clone(), product_key);

            let category_english = match product.product_category_name.as_deref() {
                Some(name) if !name.is_empty() => match self.translation.get(name) {
                    Some(translated) => translated.to_string(),
                    None => {
                        untranslated += 1;
                        name.to_string()
                    }
                },
                _ => {
                    untranslated += 1;
                    "uncategorized".to_string()
                }
            };
            let segment = segment_for(&category_english);

            let mut row = DataRow::new();
            row.insert("product_key".to_string(), DataValue::Integer(product_key));
            row.insert(
                "product_id".to_string(),
                DataValue::String(product.product_id.clone()),
            );
            row.insert(
                "product_category_name".to_string(),
                product.product_category_name.clone().into(),
            );
            row.insert(
                "product_category_english".to_string(),
                DataValue::String(category_english),
            );
            row.insert(
                "product_category_segment".to_string(),
                DataValue::String(segment.to_string()),
            );
            row.insert(
                "product_weight_g".to_string(),
                product.product_weight_g.into(),
            );
            row.insert(
                "product_length_cm".to_string(),
                product.product_length_cm.into(),
            );
            row.insert(
                "product_height_cm".to_string(),
                product.product_height_cm.into(),
            );
            row.insert(
                "product_width_cm".to_string(),
                product.product_width_cm.into(),
            );
            row.insert(
                "product_volume_cm3".to_string(),
                product.product_volume_cm3.into(),
            );
            row.insert(
                "product_photos_qty".to_string(),
                product.product_photos_qty.into(),
            );
            row.insert("has_photos".to_string(), DataValue::Boolean(product.has_photos));
            row.insert("created_at".to_string(), DataValue::Timestamp(created_at));

            rows.push(row);
        }

        if untranslated > 0 {
            warn!(untranslated, "categorias sem tradução");
        }
        info!(rows = rows.len(), "Dimensão de produtos construída");

        let table = Table::new(
            "dim_products",
            vec![
                "product_key",
                "product_id",
                "product_category_name",
                "product_category_english",
                "product_category_segment",
                "product_weight_g",
                "product_length_cm",
                "product_height_cm",
                "product_width_cm",
                "product_volume_cm3",
                "product_photos_qty",
                "has_photos",
                "created_at",
            ],
            rows,
        );

        Ok(ProductDimension { table, keys })
    }
}

/// Primeiro segmento cuja lista contém a categoria; sem correspondência → Other
fn segment_for(category_english: &str) -> &'static str {
    for (segment, categories) in CATEGORY_SEGMENTS {
        if categories.contains(&category_english) {
            return segment;
        }
    }
    "Other"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, category: Option<&str>) -> ProductRecord {
        ProductRecord {
            product_id: id.to_string(),
            product_category_name: category.map(String::from),
            product_photos_qty: Some(2),
            product_weight_g: Some(500.0),
            product_length_cm: Some(20.0),
            product_height_cm: Some(10.0),
            product_width_cm: Some(15.0),
            product_volume_cm3: Some(3000.0),
            has_photos: true,
        }
    }

    #[test]
    fn test_translation_and_segment() {
        let builder = ProductDimensionBuilder::new();
        let dim = builder
            .build(&[product("p1", Some("perfumaria")), product("p2", Some("automotivo"))])
            .unwrap();

        assert_eq!(dim.table.len(), 2);
        assert_eq!(
            dim.table.value(0, "product_category_english"),
            DataValue::String("perfumery".to_string())
        );
        assert_eq!(
            dim.table.value(0, "product_category_segment"),
            DataValue::String("Fashion & Beauty".to_string())
        );
        assert_eq!(
            dim.table.value(1, "product_category_segment"),
            DataValue::String("Automotive & Tools".to_string())
        );
    }

    #[test]
    fn test_unknown_category_keeps_original_name() {
        let builder = ProductDimensionBuilder::new();
        let dim = builder
            .build(&[product("p1", Some("categoria_nova"))])
            .unwrap();

        assert_eq!(
            dim.table.value(0, "product_category_english"),
            DataValue::String("categoria_nova".to_string())
        );
        assert_eq!(
            dim.table.value(0, "product_category_segment"),
            DataValue::String("Other".to_string())
        );
    }

    #[test]
    fn test_missing_category_is_uncategorized() {
        let builder = ProductDimensionBuilder::new();
        let dim = builder.build(&[product("p1", None)]).unwrap();

        assert_eq!(
            dim.table.value(0, "product_category_english"),
            DataValue::String("uncategorized".to_string())
        );
    }

    #[test]
    fn test_surrogate_keys_are_dense() {
        let builder = ProductDimensionBuilder::new();
        let dim = builder
            .build(&[
                product("a", Some("livros")),
                product("b", Some("audio")),
                product("c", None),
            ])
            .unwrap();

        assert_eq!(dim.keys["a"], 1);
        assert_eq!(dim.keys["b"], 2);
        assert_eq!(dim.keys["c"], 3);
    }
}
