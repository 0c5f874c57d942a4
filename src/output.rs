//! Output types: what the user sees and what they can download.
//!
//! The two parsed replies stay `serde_json::Value`s end to end. The views in
//! this module only read from them for display; nothing is validated or
//! coerced, so the export carries exactly what the model said.

use crate::error::GreenLogisticsError;
use crate::prompts::{
    EXTRACTION_FIELDS, KEY_ADVANTAGES, KEY_ANALYSIS, KEY_CO2_KG, KEY_COST_EUR,
    KEY_DISADVANTAGES, KEY_GROUND, KEY_INTERMODAL, KEY_RECOMMENDATION, KEY_TRANSIT_HOURS,
    NOT_FOUND,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::info;

/// Fixed download file name.
pub const REPORT_FILE_NAME: &str = "analisis_greenlogisticsai.json";

/// Media type of the exported report.
pub const REPORT_MEDIA_TYPE: &str = "application/json";

/// Render a JSON value for display: strings bare, everything else as JSON.
pub fn display_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ── Extraction ───────────────────────────────────────────────────────────

/// One displayed line of the extracted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShipmentField {
    /// Wire key, e.g. `peso_total_kg`.
    pub key: String,
    /// UI label. Extra keys the model added are shown under their own name.
    pub label: String,
    pub value: String,
}

/// The parsed extraction reply plus its display view.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedShipmentRecord {
    /// The six canonical fields in order, then any extra keys.
    pub fields: Vec<ShipmentField>,
    value: Value,
}

impl ExtractedShipmentRecord {
    /// Build the display view. Canonical fields the model omitted show the
    /// placeholder; a reply that is not an object shows all six as missing.
    pub fn from_value(value: Value) -> Self {
        let empty = serde_json::Map::new();
        let obj = value.as_object().unwrap_or(&empty);

        let mut fields: Vec<ShipmentField> = EXTRACTION_FIELDS
            .iter()
            .map(|(key, label)| ShipmentField {
                key: key.to_string(),
                label: label.to_string(),
                value: obj
                    .get(*key)
                    .map(display_value)
                    .unwrap_or_else(|| NOT_FOUND.to_string()),
            })
            .collect();

        for (key, v) in obj {
            if !EXTRACTION_FIELDS.iter().any(|(k, _)| k == key) {
                fields.push(ShipmentField {
                    key: key.clone(),
                    label: key.clone(),
                    value: display_value(v),
                });
            }
        }

        Self { fields, value }
    }

    /// The reply exactly as parsed.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Display value of `key`, if present in the view.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.key == key)
            .map(|f| f.value.as_str())
    }
}

// ── Recommendation ───────────────────────────────────────────────────────

/// One of the two compared transport modes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransportOption {
    pub cost_eur: String,
    pub transit_hours: String,
    pub co2_kg: String,
    pub advantages: Vec<String>,
    pub disadvantages: Vec<String>,
}

impl TransportOption {
    fn from_value(v: Option<&Value>) -> Self {
        let figure = |key: &str| {
            v.and_then(|o| o.get(key))
                .map(display_value)
                .unwrap_or_else(|| NOT_FOUND.to_string())
        };
        let list = |key: &str| match v.and_then(|o| o.get(key)) {
            Some(Value::Array(items)) => items.iter().map(display_value).collect(),
            Some(Value::Null) | None => Vec::new(),
            Some(other) => vec![display_value(other)],
        };
        Self {
            cost_eur: figure(KEY_COST_EUR),
            transit_hours: figure(KEY_TRANSIT_HOURS),
            co2_kg: figure(KEY_CO2_KG),
            advantages: list(KEY_ADVANTAGES),
            disadvantages: list(KEY_DISADVANTAGES),
        }
    }
}

/// Road vs. rail-intermodal comparison read from the recommendation reply.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteComparison {
    pub ground: TransportOption,
    pub intermodal: TransportOption,
    pub recommendation: String,
    analysis: Value,
}

impl RouteComparison {
    /// Read the comparison from a parsed reply.
    ///
    /// Returns `None` when the reply has no `analisis` object; everything
    /// inside it is read leniently.
    pub fn from_value(reply: &Value) -> Option<Self> {
        let analysis = reply.get(KEY_ANALYSIS).filter(|a| a.is_object())?;
        Some(Self {
            ground: TransportOption::from_value(analysis.get(KEY_GROUND)),
            intermodal: TransportOption::from_value(analysis.get(KEY_INTERMODAL)),
            recommendation: analysis
                .get(KEY_RECOMMENDATION)
                .map(display_value)
                .unwrap_or_default(),
            analysis: analysis.clone(),
        })
    }

    /// The `analisis` object exactly as parsed.
    pub fn analysis(&self) -> &Value {
        &self.analysis
    }
}

// ── Export ───────────────────────────────────────────────────────────────

/// The downloadable document.
///
/// Field order is the export's key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub datos_extraidos: Value,
    pub analisis_rutas: Value,
}

impl Report {
    pub fn new(extracted: &ExtractedShipmentRecord, comparison: &RouteComparison) -> Self {
        Self {
            datos_extraidos: extracted.value().clone(),
            analisis_rutas: comparison.analysis().clone(),
        }
    }

    /// Two-space indented JSON with non-ASCII characters kept literally.
    pub fn to_pretty_json(&self) -> Result<String, GreenLogisticsError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| GreenLogisticsError::Internal(format!("Report serialisation failed: {e}")))
    }

    /// Write the report to `path` atomically (temp file, then rename).
    pub async fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), GreenLogisticsError> {
        let path = path.as_ref();
        let json = self.to_pretty_json()?;
        let write_err = |e| GreenLogisticsError::ReportWriteFailed {
            path: path.to_path_buf(),
            source: e,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, json.as_bytes())
            .await
            .map_err(write_err)?;
        tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;

        info!("Report written to {}", path.display());
        Ok(())
    }
}

/// A request that made it all the way through.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub extracted: ExtractedShipmentRecord,
    pub comparison: RouteComparison,
    pub report: Report,
}

impl AnalysisReport {
    pub fn new(extracted: ExtractedShipmentRecord, comparison: RouteComparison) -> Self {
        let report = Report::new(&extracted, &comparison);
        Self {
            extracted,
            comparison,
            report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn recommendation() -> Value {
        json!({
            "analisis": {
                "opcion_terrestre": {
                    "coste_eur": 1850,
                    "tiempo_horas": "28",
                    "co2_kg": 620.5,
                    "ventajas": ["Entrega puerta a puerta", "Más rápido"],
                    "desventajas": ["Mayor huella de carbono"]
                },
                "opcion_intermodal": {
                    "coste_eur": "1400",
                    "tiempo_horas": "46",
                    "co2_kg": "155",
                    "ventajas": "Menos CO₂"
                },
                "recomendacion": "Intermodal: ahorra un 75% de CO₂."
            }
        })
    }

    #[test]
    fn record_fills_missing_fields_with_placeholder() {
        let rec = ExtractedShipmentRecord::from_value(json!({
            "origen": "Madrid, España",
            "peso_total_kg": 500,
            "puerto_escala": "Valencia"
        }));

        assert_eq!(rec.fields.len(), 7);
        assert_eq!(rec.fields[0].label, "Origin");
        assert_eq!(rec.get("origen"), Some("Madrid, España"));
        assert_eq!(rec.get("peso_total_kg"), Some("500"));
        assert_eq!(rec.get("destino"), Some(NOT_FOUND));
        assert_eq!(rec.get("incoterm"), Some(NOT_FOUND));
        assert_eq!(rec.fields[6].key, "puerto_escala");
    }

    #[test]
    fn record_from_non_object_shows_placeholders() {
        let rec = ExtractedShipmentRecord::from_value(json!(["origen"]));
        assert_eq!(rec.fields.len(), 6);
        assert!(rec.fields.iter().all(|f| f.value == NOT_FOUND));
        assert_eq!(rec.value(), &json!(["origen"]));
    }

    #[test]
    fn comparison_reads_both_options() {
        let cmp = RouteComparison::from_value(&recommendation()).unwrap();
        assert_eq!(cmp.ground.cost_eur, "1850");
        assert_eq!(cmp.ground.transit_hours, "28");
        assert_eq!(cmp.ground.co2_kg, "620.5");
        assert_eq!(cmp.ground.advantages.len(), 2);
        assert_eq!(cmp.intermodal.advantages, vec!["Menos CO₂".to_string()]);
        assert!(cmp.intermodal.disadvantages.is_empty());
        assert_eq!(cmp.recommendation, "Intermodal: ahorra un 75% de CO₂.");
    }

    #[test]
    fn comparison_requires_analysis_object() {
        assert!(RouteComparison::from_value(&json!({"opcion_terrestre": {}})).is_none());
        assert!(RouteComparison::from_value(&json!({"analisis": "n/a"})).is_none());
        assert!(RouteComparison::from_value(&json!([1, 2])).is_none());
    }

    #[test]
    fn missing_option_shows_placeholders() {
        let cmp = RouteComparison::from_value(&json!({"analisis": {}})).unwrap();
        assert_eq!(cmp.ground.cost_eur, NOT_FOUND);
        assert!(cmp.intermodal.advantages.is_empty());
        assert_eq!(cmp.recommendation, "");
    }

    #[test]
    fn report_json_is_pretty_and_keeps_unicode() {
        let rec = ExtractedShipmentRecord::from_value(json!({"destino": "Berlín, Alemania"}));
        let cmp = RouteComparison::from_value(&json!({"analisis": {"recomendacion": "Tren"}})).unwrap();
        let json = AnalysisReport::new(rec, cmp).report.to_pretty_json().unwrap();

        assert_eq!(
            json,
            "{\n  \"datos_extraidos\": {\n    \"destino\": \"Berlín, Alemania\"\n  },\n  \"analisis_rutas\": {\n    \"recomendacion\": \"Tren\"\n  }\n}"
        );
    }

    #[test]
    fn report_keeps_model_key_order() {
        let rec = ExtractedShipmentRecord::from_value(json!({"z": 1, "a": 2}));
        let cmp = RouteComparison::from_value(&recommendation()).unwrap();
        let json = Report::new(&rec, &cmp).to_pretty_json().unwrap();
        assert!(json.find("\"z\"").unwrap() < json.find("\"a\"").unwrap());
        assert!(json.find("opcion_terrestre").unwrap() < json.find("opcion_intermodal").unwrap());
    }

    #[tokio::test]
    async fn write_to_file_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join(REPORT_FILE_NAME);
        let rec = ExtractedShipmentRecord::from_value(json!({"origen": "Lyon"}));
        let cmp = RouteComparison::from_value(&recommendation()).unwrap();
        let report = Report::new(&rec, &cmp);

        report.write_to_file(&path).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, report.to_pretty_json().unwrap());
        assert!(!path.with_extension("json.tmp").exists());
    }
}
