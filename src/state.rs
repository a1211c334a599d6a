use std::sync::Arc;

use crate::config::Config;
use crate::conversation::{Assistant, Collaborators};
use crate::error::AppError;
use crate::extraction::{OpenAiExtractor, StructuredExtractor};
use crate::geo::osrm::OsrmRouter;
use crate::geo::yandex::YandexMaps;
use crate::geo::{DistanceChain, Geocoder};
use crate::mirror::BroadcastMirror;
use crate::observability::metrics::Metrics;
use crate::speech::{SpeechToText, WhisperClient};
use crate::store::{InMemoryOrderStore, OrderStore};

pub struct Services {
    pub extractor: Option<Arc<dyn StructuredExtractor>>,
    pub speech: Option<Arc<dyn SpeechToText>>,
    pub geocoder: Option<Arc<dyn Geocoder>>,
    pub routes: DistanceChain,
    pub store: Arc<dyn OrderStore>,
}

impl Services {
    pub fn offline() -> Self {
        Self {
            extractor: None,
            speech: None,
            geocoder: None,
            routes: DistanceChain::default(),
            store: Arc::new(InMemoryOrderStore::new()),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(config.external_timeout())
            .build()
            .map_err(|err| AppError::Internal(format!("failed to build http client: {err}")))?;

        let extractor = config.openai_api_key.as_ref().map(|key| {
            Arc::new(OpenAiExtractor::new(
                client.clone(),
                &config.openai_base_url,
                key.clone(),
                config.openai_model.clone(),
            )) as Arc<dyn StructuredExtractor>
        });

        let speech = config.openai_api_key.as_ref().map(|key| {
            Arc::new(WhisperClient::new(
                client.clone(),
                &config.openai_base_url,
                key.clone(),
                config.openai_stt_model.clone(),
            )) as Arc<dyn SpeechToText>
        });

        let yandex = config
            .yandex_maps_api_key
            .as_ref()
            .map(|key| Arc::new(YandexMaps::new(client.clone(), key.clone())));

        let mut routes = DistanceChain::default();
        if let Some(yandex) = &yandex {
            routes = routes.then(yandex.clone());
        }
        if let Some(base_url) = &config.osrm_base_url {
            routes = routes.then(Arc::new(OsrmRouter::new(client.clone(), base_url)));
        }

        Ok(Self {
            extractor,
            speech,
            geocoder: yandex.map(|yandex| yandex as Arc<dyn Geocoder>),
            routes,
            store: Arc::new(InMemoryOrderStore::new()),
        })
    }
}

pub struct AppState {
    pub assistant: Assistant,
    pub store: Arc<dyn OrderStore>,
    pub order_events: BroadcastMirror,
    pub metrics: Metrics,
    pub recent_orders_limit: usize,
}

impl AppState {
    pub fn new(services: Services, event_buffer_size: usize, recent_orders_limit: usize) -> Self {
        let metrics = Metrics::new();
        let order_events = BroadcastMirror::new(event_buffer_size);

        let assistant = Assistant::new(
            Collaborators {
                extractor: services.extractor,
                speech: services.speech,
                geocoder: services.geocoder,
                routes: services.routes,
                store: services.store.clone(),
                mirror: Arc::new(order_events.clone()),
            },
            metrics.clone(),
            recent_orders_limit,
        );

        Self {
            assistant,
            store: services.store,
            order_events,
            metrics,
            recent_orders_limit,
        }
    }
}
