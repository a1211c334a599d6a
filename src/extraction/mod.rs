pub mod fallback;
pub mod provider;

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::observability::metrics::Metrics;
pub use provider::{OpenAiExtractor, StructuredExtractor};

const ROUTE_INSTRUCTIONS: &str = "Верни строго JSON c ключами: car_number, address_from, address_to. \
     Пустые значения делай пустой строкой.";

const CARGO_INSTRUCTIONS: &str = "Верни строго JSON: cargo_type (строка), load_amount (число), \
     unload_amount (число). Числа — number с точкой, без единиц. Пустые поля — null.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStep {
    Route,
    Cargo,
}

impl ExtractionStep {
    fn label(self) -> &'static str {
        match self {
            ExtractionStep::Route => "route",
            ExtractionStep::Cargo => "cargo",
        }
    }

    fn instructions(self) -> &'static str {
        match self {
            ExtractionStep::Route => ROUTE_INSTRUCTIONS,
            ExtractionStep::Cargo => CARGO_INSTRUCTIONS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RouteFields {
    pub car_number: Option<String>,
    pub address_from: Option<String>,
    pub address_to: Option<String>,
}

impl RouteFields {
    pub fn has_addresses(&self) -> bool {
        self.address_from.is_some() && self.address_to.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CargoFields {
    pub cargo_type: Option<String>,
    pub load_amount: Option<f64>,
    pub unload_amount: Option<f64>,
}

impl CargoFields {
    pub fn has_amounts(&self) -> bool {
        self.load_amount.is_some() && self.unload_amount.is_some()
    }
}

pub fn parse_amount(raw: &str) -> Option<f64> {
    let normalized: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    normalized.parse::<f64>().ok().filter(|value| value.is_finite())
}

fn text_field(data: &Map<String, Value>, key: &str) -> Option<String> {
    let raw = match data.get(key)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!raw.is_empty()).then_some(raw)
}

fn amount_field(data: &Map<String, Value>, key: &str) -> Option<f64> {
    match data.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_amount(s),
        _ => None,
    }
}

pub struct ExtractionEngine {
    provider: Option<Arc<dyn StructuredExtractor>>,
    metrics: Metrics,
}

impl ExtractionEngine {
    pub fn new(provider: Option<Arc<dyn StructuredExtractor>>, metrics: Metrics) -> Self {
        Self { provider, metrics }
    }

    async fn primary(&self, step: ExtractionStep, text: &str) -> Map<String, Value> {
        let Some(provider) = &self.provider else {
            debug!(step = step.label(), "no extraction provider configured");
            return Map::new();
        };
        if text.trim().is_empty() {
            return Map::new();
        }

        match provider.complete_json(step.instructions(), text).await {
            Ok(data) => data,
            Err(err) => {
                warn!(step = step.label(), error = %err, "structured extraction failed");
                Map::new()
            }
        }
    }

    fn record(&self, step: ExtractionStep, outcome: &str) {
        self.metrics
            .extractions_total
            .with_label_values(&[step.label(), outcome])
            .inc();
    }

    pub async fn extract_route(&self, text: &str) -> RouteFields {
        let data = self.primary(ExtractionStep::Route, text).await;
        let mut fields = RouteFields {
            car_number: text_field(&data, "car_number"),
            address_from: text_field(&data, "address_from"),
            address_to: text_field(&data, "address_to"),
        };

        let from_provider = fields.has_addresses();
        fallback::fill_route(&mut fields, text);

        let outcome = match (from_provider, fields.has_addresses()) {
            (true, _) => "provider",
            (false, true) => "fallback",
            (false, false) => "incomplete",
        };
        self.record(ExtractionStep::Route, outcome);
        fields
    }

    pub async fn extract_cargo(&self, text: &str) -> CargoFields {
        let data = self.primary(ExtractionStep::Cargo, text).await;
        let mut fields = CargoFields {
            cargo_type: text_field(&data, "cargo_type"),
            load_amount: amount_field(&data, "load_amount"),
            unload_amount: amount_field(&data, "unload_amount"),
        };

        let from_provider = fields.has_amounts();
        fallback::fill_cargo(&mut fields, text);

        let outcome = match (from_provider, fields.has_amounts()) {
            (true, _) => "provider",
            (false, true) => "fallback",
            (false, false) => "incomplete",
        };
        self.record(ExtractionStep::Cargo, outcome);
        fields
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::{json, Map, Value};

    use super::{parse_amount, ExtractionEngine, StructuredExtractor};
    use crate::error::ProviderError;
    use crate::observability::metrics::Metrics;

    struct Canned(Value);

    #[async_trait]
    impl StructuredExtractor for Canned {
        async fn complete_json(
            &self,
            _instructions: &str,
            _text: &str,
        ) -> Result<Map<String, Value>, ProviderError> {
            match &self.0 {
                Value::Object(map) => Ok(map.clone()),
                _ => Err(ProviderError::Malformed("not an object".to_string())),
            }
        }
    }

    fn engine(answer: Value) -> ExtractionEngine {
        ExtractionEngine::new(Some(Arc::new(Canned(answer))), Metrics::new())
    }

    #[test]
    fn amounts_accept_commas_and_spaces() {
        assert_eq!(parse_amount("20"), Some(20.0));
        assert_eq!(parse_amount(" 12,5 "), Some(12.5));
        assert_eq!(parse_amount("1 200,75"), Some(1200.75));
        assert_eq!(parse_amount("двадцать"), None);
        assert_eq!(parse_amount("inf"), None);
    }

    #[tokio::test]
    async fn provider_answer_is_used_as_is() {
        let engine = engine(json!({
            "car_number": " А123ВС77 ",
            "address_from": "Москва, Тверская 1",
            "address_to": "Москва, Арбат 10"
        }));
        let fields = engine.extract_route("что угодно").await;
        assert_eq!(fields.car_number.as_deref(), Some("А123ВС77"));
        assert_eq!(fields.address_from.as_deref(), Some("Москва, Тверская 1"));
        assert_eq!(fields.address_to.as_deref(), Some("Москва, Арбат 10"));
    }

    #[tokio::test]
    async fn empty_strings_from_provider_fall_back_to_patterns() {
        let engine = engine(json!({ "car_number": "", "address_from": "", "address_to": "" }));
        let fields = engine
            .extract_route("Машина А123ВС77, откуда Москва Тверская 1, куда Москва Арбат 10")
            .await;
        assert_eq!(fields.car_number.as_deref(), Some("А123ВС77"));
        assert_eq!(fields.address_from.as_deref(), Some("Москва Тверская 1"));
        assert_eq!(fields.address_to.as_deref(), Some("Москва Арбат 10"));
    }

    #[tokio::test]
    async fn provider_errors_degrade_to_patterns() {
        let engine = engine(json!("garbage"));
        let fields = engine.extract_cargo("ЩПС, загрузка 20, выгрузка 5").await;
        assert_eq!(fields.load_amount, Some(20.0));
        assert_eq!(fields.unload_amount, Some(5.0));
    }

    #[tokio::test]
    async fn string_amounts_from_provider_are_parsed() {
        let engine = engine(json!({
            "cargo_type": "Песок",
            "load_amount": "20,5",
            "unload_amount": 4
        }));
        let fields = engine.extract_cargo("песок").await;
        assert_eq!(fields.cargo_type.as_deref(), Some("Песок"));
        assert_eq!(fields.load_amount, Some(20.5));
        assert_eq!(fields.unload_amount, Some(4.0));
    }

    #[tokio::test]
    async fn without_provider_nothing_is_invented() {
        let engine = ExtractionEngine::new(None, Metrics::new());
        let fields = engine.extract_route("привет").await;
        assert_eq!(fields, Default::default());

        let fields = engine.extract_cargo("").await;
        assert_eq!(fields, Default::default());
    }
}
