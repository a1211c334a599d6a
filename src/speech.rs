use std::sync::Arc;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ProviderError;

#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe(&self, audio: &[u8]) -> Result<Option<String>, ProviderError>;
}

pub struct WhisperClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl WhisperClient {
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl SpeechToText for WhisperClient {
    async fn transcribe(&self, audio: &[u8]) -> Result<Option<String>, ProviderError> {
        let file = Part::bytes(audio.to_vec())
            .file_name("audio.ogg")
            .mime_str("audio/ogg")?;
        let form = Form::new()
            .part("file", file)
            .text("model", self.model.clone())
            .text("language", "ru")
            .text("response_format", "json")
            .text("temperature", "0");

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;
        let response = ProviderError::from_response(response).await?;

        let body: TranscriptionResponse = response
            .json()
            .await
            .map_err(|err| ProviderError::Malformed(err.to_string()))?;

        let text = body.text.trim().to_string();
        Ok((!text.is_empty()).then_some(text))
    }
}

pub struct VoiceRecognizer {
    backend: Option<Arc<dyn SpeechToText>>,
}

impl VoiceRecognizer {
    pub fn new(backend: Option<Arc<dyn SpeechToText>>) -> Self {
        Self { backend }
    }

    pub async fn recognize(&self, audio: &[u8]) -> Option<String> {
        if audio.is_empty() {
            return None;
        }
        let Some(backend) = &self.backend else {
            debug!("no speech-to-text backend configured");
            return None;
        };

        match backend.transcribe(audio).await {
            Ok(text) => text.filter(|text| !text.trim().is_empty()),
            Err(err) => {
                warn!(error = %err, bytes = audio.len(), "speech recognition failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::{SpeechToText, VoiceRecognizer};
    use crate::error::ProviderError;

    struct Scripted(Result<Option<&'static str>, ()>);

    #[async_trait]
    impl SpeechToText for Scripted {
        async fn transcribe(&self, _audio: &[u8]) -> Result<Option<String>, ProviderError> {
            match self.0 {
                Ok(text) => Ok(text.map(str::to_string)),
                Err(()) => Err(ProviderError::Malformed("bad audio".to_string())),
            }
        }
    }

    #[tokio::test]
    async fn failures_read_as_no_text() {
        let recognizer = VoiceRecognizer::new(Some(Arc::new(Scripted(Err(())))));
        assert_eq!(recognizer.recognize(b"ogg").await, None);

        let recognizer = VoiceRecognizer::new(Some(Arc::new(Scripted(Ok(Some("   "))))));
        assert_eq!(recognizer.recognize(b"ogg").await, None);

        let recognizer = VoiceRecognizer::new(None);
        assert_eq!(recognizer.recognize(b"ogg").await, None);
    }

    #[tokio::test]
    async fn empty_audio_is_not_sent() {
        let recognizer = VoiceRecognizer::new(Some(Arc::new(Scripted(Ok(Some("текст"))))));
        assert_eq!(recognizer.recognize(b"").await, None);
        assert_eq!(recognizer.recognize(b"ogg").await.as_deref(), Some("текст"));
    }
}
