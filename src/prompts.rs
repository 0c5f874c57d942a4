//! Instruction templates for the two model calls, and the JSON field names
//! they ask for.
//!
//! The templates are Spanish: the tool was built for Spanish-speaking freight
//! forwarders and the model answers in the language it is prompted in. The
//! field names below are therefore the Spanish wire names; the English names
//! in doc comments are what the UI shows.
//!
//! Keeping both prompts here means a prompt change never touches the
//! transport or parsing code, and tests can assert on them directly.

/// Placeholder the model is told to use for any field missing from the document.
pub const NOT_FOUND: &str = "no_encontrado";

/// Origin city and country.
pub const FIELD_ORIGIN: &str = "origen";
/// Destination city and country.
pub const FIELD_DESTINATION: &str = "destino";
/// Total weight in kilograms.
pub const FIELD_TOTAL_WEIGHT_KG: &str = "peso_total_kg";
/// Short description of the goods.
pub const FIELD_GOODS_DESCRIPTION: &str = "descripcion_mercancia";
/// Incoterm, if visible.
pub const FIELD_INCOTERM: &str = "incoterm";
/// Declared value in USD.
pub const FIELD_DECLARED_VALUE_USD: &str = "valor_mercancia_usd";

/// The six extracted fields in display order, with their UI labels.
pub const EXTRACTION_FIELDS: [(&str, &str); 6] = [
    (FIELD_ORIGIN, "Origin"),
    (FIELD_DESTINATION, "Destination"),
    (FIELD_TOTAL_WEIGHT_KG, "Total weight (kg)"),
    (FIELD_GOODS_DESCRIPTION, "Goods description"),
    (FIELD_INCOTERM, "Incoterm"),
    (FIELD_DECLARED_VALUE_USD, "Declared value (USD)"),
];

/// Top-level key of the recommendation reply.
pub const KEY_ANALYSIS: &str = "analisis";
/// Road-only option.
pub const KEY_GROUND: &str = "opcion_terrestre";
/// Rail + truck option.
pub const KEY_INTERMODAL: &str = "opcion_intermodal";
/// Free-text verdict.
pub const KEY_RECOMMENDATION: &str = "recomendacion";
pub const KEY_COST_EUR: &str = "coste_eur";
pub const KEY_TRANSIT_HOURS: &str = "tiempo_horas";
pub const KEY_CO2_KG: &str = "co2_kg";
pub const KEY_ADVANTAGES: &str = "ventajas";
pub const KEY_DISADVANTAGES: &str = "desventajas";

/// Instruction sent together with the document image.
pub const EXTRACTION_PROMPT: &str = r#"Eres un experto en logística internacional y procesamiento de documentos de comercio exterior.
Analiza el documento proporcionado y extrae SOLO los siguientes datos en formato JSON:

{
  "origen": "ciudad y país de origen",
  "destino": "ciudad y país de destino",
  "peso_total_kg": peso en kilogramos,
  "descripcion_mercancia": "breve descripción del producto",
  "incoterm": "término incoterm si es visible (ej: FOB, CIF, EXW)",
  "valor_mercancia_usd": valor declarado en dólares si está disponible
}

Si algún dato no está presente en el documento, usa "no_encontrado".
Solo responde con el JSON, sin explicaciones adicionales."#;

/// Body of the recommendation instruction. `{shipment}` is replaced with the
/// extracted record.
const RECOMMENDATION_TEMPLATE: &str = r#"Basándote en estos datos de envío:
{shipment}

Actúa como un experto en optimización de rutas europeas sostenibles.
Compara DOS opciones para este envío dentro de Europa:

1. **Opción Terrestre (Camión)**: La opción más rápida y directa.
2. **Opción Intermodal (Tren + Camión)**: La opción más sostenible y potencialmente más económica para distancias largas.

Para cada opción, proporciona estimaciones realistas para:
- Coste aproximado (en EUR)
- Tiempo de tránsito (en horas)
- Huella de carbono aproximada (en kg de CO₂eq)

Considera que:
- El transporte por ferrocarril emite aproximadamente 1/4 del CO₂ del transporte por carretera.
- La combinación intermodal puede añadir 12-24 horas por transbordo.

Presenta tu respuesta en formato JSON claro:
{
  "analisis": {
    "opcion_terrestre": {
      "coste_eur": "valor",
      "tiempo_horas": "valor",
      "co2_kg": "valor",
      "ventajas": ["lista de ventajas"],
      "desventajas": ["lista de desventajas"]
    },
    "opcion_intermodal": {
      "coste_eur": "valor",
      "tiempo_horas": "valor",
      "co2_kg": "valor",
      "ventajas": ["lista de ventajas"],
      "desventajas": ["lista de desventajas"]
    },
    "recomendacion": "explicación de cuál opción recomiendas y por qué"
  }
}

Solo responde con el JSON, sin explicaciones adicionales."#;

/// Build the recommendation instruction for an already-serialised shipment record.
pub fn recommendation_prompt(shipment: &str) -> String {
    RECOMMENDATION_TEMPLATE.replacen("{shipment}", shipment, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_prompt_names_every_field() {
        for (key, _) in EXTRACTION_FIELDS {
            assert!(
                EXTRACTION_PROMPT.contains(&format!("\"{key}\"")),
                "prompt is missing {key}"
            );
        }
        assert!(EXTRACTION_PROMPT.contains(NOT_FOUND));
    }

    #[test]
    fn recommendation_prompt_embeds_shipment_once() {
        let p = recommendation_prompt(r#"{"origen": "Madrid"}"#);
        assert!(p.starts_with("Basándote en estos datos de envío:\n{\"origen\": \"Madrid\"}"));
        assert!(!p.contains("{shipment}"));
    }

    #[test]
    fn recommendation_prompt_states_domain_heuristics() {
        let p = recommendation_prompt("{}");
        assert!(p.contains("1/4 del CO₂"));
        assert!(p.contains("12-24 horas"));
        for key in [KEY_ANALYSIS, KEY_GROUND, KEY_INTERMODAL, KEY_RECOMMENDATION] {
            assert!(p.contains(key), "prompt is missing {key}");
        }
    }

    #[test]
    fn shipment_with_placeholder_text_is_not_reexpanded() {
        let p = recommendation_prompt("{shipment}");
        assert_eq!(p.matches("{shipment}").count(), 1);
    }
}
