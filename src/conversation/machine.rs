use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use super::patch::parse_edit_patch;
use super::replies::{self, Keyboard, Reply};
use super::session::{CargoDraft, RouteDraft, SessionRegistry, SessionState};
use super::{Command, ConfirmChoice, Inbound};
use crate::extraction::{ExtractionEngine, StructuredExtractor};
use crate::geo::{DistanceChain, GeoResolver, Geocoder};
use crate::mirror::OrderMirror;
use crate::models::order::{remainder, NewOrder, OrderPatch};
use crate::observability::metrics::Metrics;
use crate::speech::{SpeechToText, VoiceRecognizer};
use crate::store::OrderStore;

pub struct Collaborators {
    pub extractor: Option<Arc<dyn StructuredExtractor>>,
    pub speech: Option<Arc<dyn SpeechToText>>,
    pub geocoder: Option<Arc<dyn Geocoder>>,
    pub routes: DistanceChain,
    pub store: Arc<dyn OrderStore>,
    pub mirror: Arc<dyn OrderMirror>,
}

struct Transition {
    next: SessionState,
    replies: Vec<Reply>,
}

impl Transition {
    fn to(next: SessionState, replies: Vec<Reply>) -> Self {
        Self { next, replies }
    }

    fn single(next: SessionState, reply: Reply) -> Self {
        Self {
            next,
            replies: vec![reply],
        }
    }
}

pub struct Assistant {
    sessions: SessionRegistry,
    extraction: ExtractionEngine,
    geo: GeoResolver,
    voice: VoiceRecognizer,
    store: Arc<dyn OrderStore>,
    mirror: Arc<dyn OrderMirror>,
    metrics: Metrics,
    recent_limit: usize,
}

impl Assistant {
    pub fn new(collaborators: Collaborators, metrics: Metrics, recent_limit: usize) -> Self {
        Self {
            sessions: SessionRegistry::new(),
            extraction: ExtractionEngine::new(collaborators.extractor, metrics.clone()),
            geo: GeoResolver::new(collaborators.geocoder, collaborators.routes, metrics.clone()),
            voice: VoiceRecognizer::new(collaborators.speech),
            store: collaborators.store,
            mirror: collaborators.mirror,
            metrics,
            recent_limit,
        }
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub async fn handle(&self, user_id: i64, inbound: Inbound) -> Vec<Reply> {
        let started = Instant::now();
        let session = self.sessions.checkout(user_id);
        let mut state = session.lock().await;

        let from = state.label();
        let was_idle = state.is_idle();
        self.metrics.messages_total.with_label_values(&[from]).inc();

        let current = std::mem::take(&mut *state);
        let transition = match inbound.command() {
            Some(command) => self.on_command(user_id, current, command).await,
            None => self.step(user_id, current, inbound).await,
        };

        debug!(user_id, from, to = transition.next.label(), "session transition");
        match (was_idle, transition.next.is_idle()) {
            (true, false) => self.metrics.active_sessions.inc(),
            (false, true) => self.metrics.active_sessions.dec(),
            _ => {}
        }
        *state = transition.next;
        drop(state);
        drop(session);
        self.sessions.release(user_id);

        self.metrics
            .message_latency_seconds
            .with_label_values(&[from])
            .observe(started.elapsed().as_secs_f64());
        transition.replies
    }

    async fn on_command(&self, user_id: i64, current: SessionState, command: Command) -> Transition {
        match command {
            Command::Start => Transition::single(
                SessionState::Idle,
                Reply::with_keyboard(replies::GREETING, Keyboard::MainMenu),
            ),
            Command::Add => Transition::single(
                SessionState::Step1Collect,
                Reply::with_keyboard(replies::STEP1_PROMPT, Keyboard::Remove),
            ),
            // Viewing is a plain read and leaves any flow in progress alone.
            Command::View => {
                let reply = match self.store.list_recent(user_id, self.recent_limit).await {
                    Ok(orders) if orders.is_empty() => Reply::text(replies::NO_ORDERS),
                    Ok(orders) => Reply::text(replies::order_listing(&orders)),
                    Err(err) => {
                        error!(user_id, error = %err, "failed to list orders");
                        Reply::text(replies::LOAD_FAILED)
                    }
                };
                Transition::single(current, reply)
            }
            Command::Edit => match self.store.list_recent(user_id, self.recent_limit).await {
                Ok(orders) if orders.is_empty() => Transition::single(
                    SessionState::Idle,
                    Reply::with_keyboard(replies::NO_ORDERS_TO_EDIT, Keyboard::MainMenu),
                ),
                Ok(orders) => Transition::single(
                    SessionState::EditChooseId,
                    Reply::with_keyboard(replies::edit_listing(&orders), Keyboard::Remove),
                ),
                Err(err) => {
                    error!(user_id, error = %err, "failed to list orders for editing");
                    Transition::single(
                        SessionState::Idle,
                        Reply::with_keyboard(replies::LOAD_FAILED, Keyboard::MainMenu),
                    )
                }
            },
        }
    }

    async fn step(&self, user_id: i64, state: SessionState, inbound: Inbound) -> Transition {
        match state {
            SessionState::Idle => Transition::single(
                SessionState::Idle,
                Reply::with_keyboard(replies::IDLE_HINT, Keyboard::MainMenu),
            ),
            SessionState::Step1Collect => self.collect_route(inbound).await,
            SessionState::Step1Confirm { draft } => {
                self.confirm_route(user_id, draft, inbound).await
            }
            SessionState::Step2Collect { order_id } => self.collect_cargo(order_id, inbound).await,
            SessionState::Step2Confirm { order_id, draft } => {
                self.confirm_cargo(order_id, draft, inbound).await
            }
            SessionState::EditChooseId => self.choose_order(user_id, inbound).await,
            SessionState::EditApplyFields { order_id } => {
                self.apply_edit(user_id, order_id, inbound).await
            }
        }
    }

    async fn message_text(&self, inbound: Inbound) -> Option<String> {
        match inbound {
            Inbound::Text(text) => Some(text),
            Inbound::Voice(audio) => self.voice.recognize(&audio).await,
        }
    }

    async fn collect_route(&self, inbound: Inbound) -> Transition {
        let Some(text) = self.message_text(inbound).await else {
            return Transition::single(
                SessionState::Step1Collect,
                Reply::text(replies::VOICE_NOT_RECOGNIZED),
            );
        };

        let fields = self.extraction.extract_route(&text).await;
        let (Some(address_from), Some(address_to)) = (fields.address_from, fields.address_to)
        else {
            return Transition::single(
                SessionState::Step1Collect,
                Reply::text(replies::ROUTE_NOT_RECOGNIZED),
            );
        };

        let from = self.geo.geocode(&address_from).await;
        let to = self.geo.geocode(&address_to).await;
        let (Some(from), Some(to)) = (from, to) else {
            return Transition::single(
                SessionState::Step1Collect,
                Reply::text(replies::GEOCODE_FAILED),
            );
        };

        let draft = RouteDraft {
            car_number: fields.car_number,
            address_from,
            address_to,
            distance_km: self.geo.distance(from, to).await,
        };

        let summary = Reply::text(replies::route_summary(&draft));
        Transition::to(
            SessionState::Step1Confirm { draft },
            vec![
                summary,
                Reply::with_keyboard(replies::CONFIRM_PROMPT, Keyboard::ConfirmChoice),
            ],
        )
    }

    async fn confirm_route(&self, user_id: i64, draft: RouteDraft, inbound: Inbound) -> Transition {
        match inbound.confirm_choice() {
            Some(ConfirmChoice::Accept) => {
                let new_order = NewOrder {
                    user_id,
                    car_number: draft.car_number.clone(),
                    address_from: draft.address_from.clone(),
                    address_to: draft.address_to.clone(),
                    distance_km: Some(draft.distance_km),
                };

                match self.store.create(new_order).await {
                    Ok(order) => {
                        info!(user_id, order_id = order.id, "order created from route step");
                        self.metrics
                            .orders_written_total
                            .with_label_values(&["created"])
                            .inc();
                        self.mirror.on_create(&order);
                        Transition::single(
                            SessionState::Step2Collect { order_id: order.id },
                            Reply::with_keyboard(replies::STEP2_PROMPT, Keyboard::Remove),
                        )
                    }
                    Err(err) => {
                        error!(user_id, error = %err, "failed to create order");
                        Transition::single(
                            SessionState::Step1Confirm { draft },
                            Reply::with_keyboard(replies::SAVE_FAILED, Keyboard::ConfirmChoice),
                        )
                    }
                }
            }
            Some(ConfirmChoice::Rewrite) => Transition::single(
                SessionState::Step1Collect,
                Reply::with_keyboard(replies::STEP1_RETRY, Keyboard::Remove),
            ),
            None => Transition::single(
                SessionState::Step1Confirm { draft },
                Reply::with_keyboard(replies::CONFIRM_INVALID, Keyboard::ConfirmChoice),
            ),
        }
    }

    async fn collect_cargo(&self, order_id: u64, inbound: Inbound) -> Transition {
        let Some(text) = self.message_text(inbound).await else {
            return Transition::single(
                SessionState::Step2Collect { order_id },
                Reply::text(replies::VOICE_NOT_RECOGNIZED),
            );
        };

        let fields = self.extraction.extract_cargo(&text).await;
        let (Some(load_amount), Some(unload_amount)) = (fields.load_amount, fields.unload_amount)
        else {
            return Transition::single(
                SessionState::Step2Collect { order_id },
                Reply::text(replies::AMOUNTS_NOT_RECOGNIZED),
            );
        };

        let draft = CargoDraft {
            cargo_type: fields.cargo_type,
            load_amount,
            unload_amount,
            remainder: remainder(load_amount, unload_amount),
        };

        let summary = Reply::text(replies::cargo_summary(&draft));
        Transition::to(
            SessionState::Step2Confirm { order_id, draft },
            vec![
                summary,
                Reply::with_keyboard(replies::CONFIRM_PROMPT, Keyboard::ConfirmChoice),
            ],
        )
    }

    async fn confirm_cargo(&self, order_id: u64, draft: CargoDraft, inbound: Inbound) -> Transition {
        match inbound.confirm_choice() {
            Some(ConfirmChoice::Accept) => {
                let patch = OrderPatch {
                    cargo_type: draft.cargo_type.clone(),
                    load_amount: Some(draft.load_amount),
                    unload_amount: Some(draft.unload_amount),
                    ..OrderPatch::default()
                };

                match self.store.update(order_id, patch).await {
                    Ok(Some(order)) => {
                        info!(order_id, remainder = ?order.remainder, "order completed");
                        self.metrics
                            .orders_written_total
                            .with_label_values(&["completed"])
                            .inc();
                        self.mirror.on_update(&order);
                        Transition::single(
                            SessionState::Idle,
                            Reply::with_keyboard(replies::order_saved(order.id), Keyboard::MainMenu),
                        )
                    }
                    Ok(None) => {
                        warn!(order_id, "order behind the session is gone; resetting");
                        Transition::single(
                            SessionState::Idle,
                            Reply::with_keyboard(replies::DRAFT_LOST, Keyboard::MainMenu),
                        )
                    }
                    Err(err) => {
                        error!(order_id, error = %err, "failed to store cargo fields");
                        Transition::single(
                            SessionState::Step2Confirm { order_id, draft },
                            Reply::with_keyboard(replies::SAVE_FAILED, Keyboard::ConfirmChoice),
                        )
                    }
                }
            }
            Some(ConfirmChoice::Rewrite) => Transition::single(
                SessionState::Step2Collect { order_id },
                Reply::with_keyboard(replies::STEP2_RETRY, Keyboard::Remove),
            ),
            None => Transition::single(
                SessionState::Step2Confirm { order_id, draft },
                Reply::with_keyboard(replies::CONFIRM_INVALID, Keyboard::ConfirmChoice),
            ),
        }
    }

    async fn choose_order(&self, user_id: i64, inbound: Inbound) -> Transition {
        let order_id = match &inbound {
            Inbound::Text(text) => text.trim().trim_start_matches('#').parse::<u64>().ok(),
            Inbound::Voice(_) => None,
        };
        let Some(order_id) = order_id else {
            return Transition::single(
                SessionState::EditChooseId,
                Reply::text(replies::EDIT_ID_INVALID),
            );
        };

        match self.store.get(order_id).await {
            Ok(Some(order)) if order.user_id == user_id => Transition::single(
                SessionState::EditApplyFields { order_id },
                Reply::text(replies::EDIT_FORMAT),
            ),
            Ok(_) => Transition::single(
                SessionState::EditChooseId,
                Reply::text(replies::unknown_order(order_id)),
            ),
            Err(err) => {
                error!(user_id, order_id, error = %err, "failed to load order for editing");
                Transition::single(SessionState::EditChooseId, Reply::text(replies::LOAD_FAILED))
            }
        }
    }

    async fn apply_edit(&self, user_id: i64, order_id: u64, inbound: Inbound) -> Transition {
        let mut patch = match &inbound {
            Inbound::Text(text) => parse_edit_patch(text),
            Inbound::Voice(_) => OrderPatch::default(),
        };
        if patch.is_empty() {
            return Transition::single(
                SessionState::EditApplyFields { order_id },
                Reply::text(replies::EDIT_PATCH_INVALID),
            );
        }

        let order = match self.store.get(order_id).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                warn!(user_id, order_id, "order under edit is gone; resetting");
                return Transition::single(
                    SessionState::Idle,
                    Reply::with_keyboard(replies::EDIT_ORDER_LOST, Keyboard::MainMenu),
                );
            }
            Err(err) => {
                error!(user_id, order_id, error = %err, "failed to load order for editing");
                return Transition::single(
                    SessionState::EditApplyFields { order_id },
                    Reply::text(replies::LOAD_FAILED),
                );
            }
        };

        let mut distance_kept = false;
        if patch.touches_route() {
            let address_from = patch.address_from.as_deref().unwrap_or(&order.address_from);
            let address_to = patch.address_to.as_deref().unwrap_or(&order.address_to);

            let from = self.geo.geocode(address_from).await;
            let to = self.geo.geocode(address_to).await;
            match (from, to) {
                (Some(from), Some(to)) => patch.distance_km = Some(self.geo.distance(from, to).await),
                _ => distance_kept = true,
            }
        }

        match self.store.update(order_id, patch).await {
            Ok(Some(order)) => {
                info!(user_id, order_id, "order edited");
                self.metrics
                    .orders_written_total
                    .with_label_values(&["edited"])
                    .inc();
                self.mirror.on_update(&order);

                let mut replies_out = Vec::with_capacity(2);
                if distance_kept {
                    replies_out.push(Reply::text(replies::DISTANCE_NOT_UPDATED));
                }
                replies_out.push(Reply::with_keyboard(replies::EDIT_SAVED, Keyboard::MainMenu));
                Transition::to(SessionState::Idle, replies_out)
            }
            Ok(None) => Transition::single(
                SessionState::Idle,
                Reply::with_keyboard(replies::EDIT_ORDER_LOST, Keyboard::MainMenu),
            ),
            Err(err) => {
                error!(user_id, order_id, error = %err, "failed to store edit");
                Transition::single(
                    SessionState::EditApplyFields { order_id },
                    Reply::text(replies::SAVE_FAILED),
                )
            }
        }
    }
}
