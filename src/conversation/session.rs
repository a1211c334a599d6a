use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteDraft {
    pub car_number: Option<String>,
    pub address_from: String,
    pub address_to: String,
    pub distance_km: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CargoDraft {
    pub cargo_type: Option<String>,
    pub load_amount: f64,
    pub unload_amount: f64,
    pub remainder: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Idle,
    Step1Collect,
    Step1Confirm {
        draft: RouteDraft,
    },
    Step2Collect {
        order_id: u64,
    },
    Step2Confirm {
        order_id: u64,
        draft: CargoDraft,
    },
    EditChooseId,
    EditApplyFields {
        order_id: u64,
    },
}

impl SessionState {
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Step1Collect => "step1_collect",
            SessionState::Step1Confirm { .. } => "step1_confirm",
            SessionState::Step2Collect { .. } => "step2_collect",
            SessionState::Step2Confirm { .. } => "step2_confirm",
            SessionState::EditChooseId => "edit_choose_id",
            SessionState::EditApplyFields { .. } => "edit_apply_fields",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, SessionState::Idle)
    }
}

/// Per-user sessions. Each entry has its own lock; holding it for a whole
/// transition serializes one user's messages without blocking anyone else.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<i64, Arc<Mutex<SessionState>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn checkout(&self, user_id: i64) -> Arc<Mutex<SessionState>> {
        self.sessions.entry(user_id).or_default().clone()
    }

    pub async fn snapshot(&self, user_id: i64) -> SessionState {
        let session = self.sessions.get(&user_id).map(|entry| entry.value().clone());
        match session {
            Some(session) => session.lock().await.clone(),
            None => SessionState::Idle,
        }
    }

    pub fn release(&self, user_id: i64) {
        self.sessions.remove_if(&user_id, |_, session| {
            Arc::strong_count(session) == 1
                && session.try_lock().is_ok_and(|state| state.is_idle())
        });
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{SessionRegistry, SessionState};

    #[tokio::test]
    async fn sessions_start_idle_and_are_shared_per_user() {
        let registry = SessionRegistry::new();
        assert_eq!(registry.snapshot(1).await, SessionState::Idle);

        let first = registry.checkout(1);
        let again = registry.checkout(1);
        let other = registry.checkout(2);
        assert!(Arc::ptr_eq(&first, &again));
        assert!(!Arc::ptr_eq(&first, &other));

        *first.lock().await = SessionState::EditChooseId;
        assert_eq!(registry.snapshot(1).await, SessionState::EditChooseId);
        assert_eq!(registry.snapshot(2).await, SessionState::Idle);
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn idle_sessions_are_released() {
        let registry = SessionRegistry::new();

        let busy = registry.checkout(1);
        *busy.lock().await = SessionState::Step1Collect;
        drop(busy);
        drop(registry.checkout(2));
        registry.release(1);
        registry.release(2);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.snapshot(1).await, SessionState::Step1Collect);

        let held = registry.checkout(3);
        registry.release(3);
        assert_eq!(registry.len(), 2);

        drop(held);
        registry.release(3);
        assert_eq!(registry.len(), 1);
    }
}
