//! Generation gateway: resolves configuration, selects the provider
//! adapter, and relays generation events to sessions.

use crate::adapter::{ProviderAdapter, ProviderRegistry};
use crate::session::run_generation;
use crate::types::{GatewayEvent, GenerationConfig, GenerationRequest, PromptBuilder};
use crate::Error;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Source of the stored generation configuration.
///
/// The store itself (user settings, browser storage, a config file) is an
/// external collaborator; the gateway only ever reads one snapshot per
/// request. `None` means nothing is stored yet.
#[async_trait::async_trait]
pub trait ConfigSource: Send + Sync + 'static {
    async fn load(&self) -> Option<GenerationConfig>;
}

/// A fixed configuration is itself a source; useful for tests and embedders
/// with their own persistence.
#[async_trait::async_trait]
impl ConfigSource for GenerationConfig {
    async fn load(&self) -> Option<GenerationConfig> {
        Some(self.clone())
    }
}

/// One open session: its outbound event channel and the cancellation handle
/// of the in-flight generation, if any.
struct SessionState {
    events: UnboundedSender<GatewayEvent>,
    active: Option<CancellationToken>,
}

/// Everything needed to issue one upstream call, resolved from the current
/// configuration snapshot.
struct ResolvedProvider {
    adapter: ProviderAdapter,
    base_url: String,
    api_key: String,
    model: String,
}

/// The generation gateway. Constructed once per process with an injected
/// provider registry, configuration source, and prompt builder; shared
/// across sessions.
pub struct Gateway {
    client: reqwest::Client,
    registry: ProviderRegistry,
    config: Arc<dyn ConfigSource>,
    prompts: Arc<dyn PromptBuilder>,
    sessions: Mutex<HashMap<String, SessionState>>,
}

impl Gateway {
    /// Create a gateway with its own HTTP client.
    pub fn new(
        registry: ProviderRegistry,
        config: impl ConfigSource,
        prompts: impl PromptBuilder,
    ) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self::with_client(client, registry, config, prompts))
    }

    /// Create a gateway around an existing HTTP client.
    pub fn with_client(
        client: reqwest::Client,
        registry: ProviderRegistry,
        config: impl ConfigSource,
        prompts: impl PromptBuilder,
    ) -> Self {
        Self {
            client,
            registry,
            config: Arc::new(config),
            prompts: Arc::new(prompts),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Open a session and return its event channel.
    ///
    /// Re-opening an existing id replaces the session, cancelling any
    /// generation still running for the old one.
    pub async fn open_session(&self, session_id: &str) -> UnboundedReceiver<GatewayEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut sessions = self.sessions.lock().await;
        if let Some(previous) = sessions.insert(
            session_id.to_string(),
            SessionState {
                events: tx,
                active: None,
            },
        ) {
            if let Some(token) = previous.active {
                token.cancel();
            }
        }
        tracing::debug!("session {session_id} opened");
        rx
    }

    /// Start a generation for a session. Fire-and-forget: results arrive as
    /// events on the session channel.
    ///
    /// At most one upstream request is active per session; a second `start`
    /// cancels the first before anything else happens, so no event from the
    /// superseded generation can trail into the new one.
    pub async fn start(&self, session_id: &str, request: GenerationRequest) -> Result<(), Error> {
        let (events, cancel) = {
            let mut sessions = self.sessions.lock().await;
            let session = sessions
                .get_mut(session_id)
                .ok_or_else(|| Error::UnknownSession(session_id.to_string()))?;

            if let Some(previous) = session.active.take() {
                previous.cancel();
            }
            let token = CancellationToken::new();
            session.active = Some(token.clone());
            (session.events.clone(), token)
        };

        let upstream = match self.resolve().await.and_then(|resolved| {
            let pair = self.prompts.build(&request);
            let built = resolved.adapter.build_request(
                &resolved.base_url,
                &resolved.model,
                &resolved.api_key,
                &pair,
                true,
            )?;
            Ok((resolved.adapter, built))
        }) {
            Ok(upstream) => upstream,
            Err(e) => {
                // Configuration problems fail before any network call.
                tracing::debug!("generation for {session_id} rejected: {e}");
                let _ = events.send(GatewayEvent::error(e.to_string()));
                return Ok(());
            }
        };

        let (adapter, upstream_request) = upstream;
        tracing::debug!(
            "session {session_id}: starting '{}' generation against {}",
            request.action,
            upstream_request.url
        );

        let client = self.client.clone();
        tokio::spawn(run_generation(client, adapter, upstream_request, events, cancel));
        Ok(())
    }

    /// Cancel the session's in-flight generation, if any. The session stays
    /// open and can start new generations.
    pub async fn cancel(&self, session_id: &str) -> Result<(), Error> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| Error::UnknownSession(session_id.to_string()))?;
        if let Some(token) = session.active.take() {
            tracing::debug!("session {session_id}: generation cancelled");
            token.cancel();
        }
        Ok(())
    }

    /// Close a session, cancelling its in-flight generation. Called when
    /// the session's transport channel disconnects.
    pub async fn close_session(&self, session_id: &str) {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.remove(session_id) {
            if let Some(token) = session.active {
                token.cancel();
            }
            tracing::debug!("session {session_id} closed");
        }
    }

    /// Run one non-streaming generation and return the extracted text.
    pub async fn generate_once(&self, request: &GenerationRequest) -> Result<String, Error> {
        let resolved = self.resolve().await?;
        let pair = self.prompts.build(request);
        let upstream = resolved.adapter.build_request(
            &resolved.base_url,
            &resolved.model,
            &resolved.api_key,
            &pair,
            false,
        )?;

        let mut builder = self.client.post(&upstream.url).json(&upstream.body);
        for (name, value) in &upstream.headers {
            builder = builder.header(name, value);
        }
        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::upstream(status.as_u16(), body));
        }

        let body: serde_json::Value = response.json().await?;
        Ok(resolved.adapter.extract_content(&body))
    }

    /// Resolve the configuration snapshot down to one issuable provider.
    /// Every failure here is reported before any network call is made.
    async fn resolve(&self) -> Result<ResolvedProvider, Error> {
        let config = self.config.load().await.ok_or(Error::ConfigMissing)?;

        let api_key = config
            .api_key()
            .ok_or_else(|| Error::credential_missing(&config.provider))?
            .to_string();

        let provider = self
            .registry
            .resolve(&config.provider)
            .ok_or_else(|| Error::UnsupportedProvider(config.provider.clone()))?;

        Ok(ResolvedProvider {
            adapter: provider.adapter,
            base_url: provider.resolve_base_url(config.base_url_for(&config.provider)),
            api_key,
            model: config.effective_model().to_string(),
        })
    }
}
