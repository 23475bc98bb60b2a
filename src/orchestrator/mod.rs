//! Turn orchestration
//!
//! Sequences one conversation turn: classify the message, reconcile the
//! extracted role with session state, dispatch to the matching handler,
//! and persist the result. This is the single writer for `current_role`
//! and the only place sessions are created or retired. Every turn ends in
//! exactly one session store write: a field-level update, or a full
//! retirement plus recreation when the conversation ends.

use std::sync::Arc;

use uuid::Uuid;

use crate::catalog::RoleCatalog;
use crate::ending;
use crate::knowledge::KnowledgeResponder;
use crate::router::{IntentClassifier, Route};
use crate::scheduling::SchedulingAgent;
use crate::session::{Session, SessionStore};

/// Shown when the classifier fails or its output is outside the closed set
const CLARIFICATION: &str =
    "I can help you with job information and scheduling interviews. Which role are you interested in?";

/// Degraded response when a handler's collaborator fails mid-turn
const APOLOGY: &str = "I'm sorry, I encountered an error. Please try again.";

/// Result of one orchestrated turn
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub bot_response: String,
    /// Human-readable trace of this turn, for observability; never persisted
    pub logs: Vec<String>,
    /// True when the session was retired and the caller must switch ids
    pub new_session_required: bool,
    pub new_session_id: Option<String>,
    pub welcome_message: Option<String>,
}

impl TurnOutcome {
    fn reply(bot_response: String, logs: Vec<String>) -> Self {
        Self {
            bot_response,
            logs,
            new_session_required: false,
            new_session_id: None,
            welcome_message: None,
        }
    }
}

/// Per-turn sequencer over the classifier, handlers and session store
pub struct Orchestrator {
    sessions: Arc<dyn SessionStore>,
    classifier: Arc<dyn IntentClassifier>,
    responder: KnowledgeResponder,
    scheduler: SchedulingAgent,
    catalog: RoleCatalog,
}

impl Orchestrator {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        classifier: Arc<dyn IntentClassifier>,
        responder: KnowledgeResponder,
        scheduler: SchedulingAgent,
        catalog: RoleCatalog,
    ) -> Self {
        Self {
            sessions,
            classifier,
            responder,
            scheduler,
            catalog,
        }
    }

    /// Welcome text for a freshly created session, listing all open roles
    pub fn welcome_message(&self) -> String {
        format!(
            "Hello! I'm an AI career assistant. I can help you with the following open positions:\n- {}\n\nWhich role are you interested in learning more about?",
            self.catalog.friendly_names().join("\n- ")
        )
    }

    /// Handle one user message for one session.
    ///
    /// Never fails: every per-turn error degrades into a clarification or
    /// apology response, with the cause traced into the outcome's logs.
    pub async fn handle_turn(&self, session_id: &str, user_message: &str) -> TurnOutcome {
        let mut trace = vec![
            "Executing intelligent router...".to_string(),
            format!("User message: '{user_message}'"),
        ];

        let mut session = match self.sessions.get(session_id).await {
            Some(session) => session,
            None => {
                trace.push(format!("New session created: {session_id}"));
                Session::new(session_id)
            }
        };
        session.push_user(user_message);
        let prior = session.history.len() - 1;

        let decision = match self
            .classifier
            .classify(user_message, &session.history[..prior])
            .await
        {
            Ok(decision) => decision,
            Err(e) => {
                // Fail-soft: the turn ends with a clarification, state intact.
                tracing::warn!(session_id, error = %e, "Classifier failure");
                trace.push(format!("Classifier failure: {e}"));
                trace.push("Could not determine next action, asking for clarification".to_string());
                session.push_assistant(CLARIFICATION);
                self.sessions.put(session).await;
                return TurnOutcome::reply(CLARIFICATION.to_string(), trace);
            }
        };
        trace.push(format!("Router decision: {:?}", decision.route));

        // Role reconciliation. This is the only write to current_role in
        // the system; handlers get read access only.
        match decision.role {
            Some(role) if session.current_role != Some(role) => {
                if session.is_booked() {
                    trace.push(
                        "Role changed after a confirmed booking; booking remains confirmed for this session."
                            .to_string(),
                    );
                }
                trace.push(format!("Role state changed to: '{role}'"));
                session.current_role = Some(role);
            }
            Some(role) => trace.push(format!("Role state unchanged: '{role}'")),
            None => match session.current_role {
                Some(role) => trace.push(format!("Role state maintained: '{role}'")),
                None => trace.push("No role state available".to_string()),
            },
        }

        let bot_response = match decision.route {
            Route::Answer => match self.responder.answer(&session, user_message, &mut trace).await {
                Ok(reply) => {
                    if reply.offered_scheduling {
                        session.scheduling_offered = true;
                    }
                    reply.text
                }
                Err(e) => {
                    tracing::warn!(session_id, error = %e, "Knowledge responder failure");
                    trace.push(format!("Responder failure: {e}"));
                    APOLOGY.to_string()
                }
            },
            Route::Schedule => {
                match self.scheduler.handle(&mut session, user_message, &mut trace).await {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::warn!(session_id, error = %e, "Scheduling agent failure");
                        trace.push(format!("Scheduling failure: {e}"));
                        APOLOGY.to_string()
                    }
                }
            }
            Route::End => {
                return self.retire_session(session, user_message, trace).await;
            }
        };

        session.push_assistant(&bot_response);
        self.sessions.put(session).await;
        TurnOutcome::reply(bot_response, trace)
    }

    /// Destroy the session and substitute a freshly initialized one, so the
    /// caller can present a seamless restart.
    async fn retire_session(
        &self,
        session: Session,
        user_message: &str,
        mut trace: Vec<String>,
    ) -> TurnOutcome {
        trace.push("Ending conversation and preparing for new session.".to_string());
        let closing = ending::closing_message(user_message, session.booking_status);

        self.sessions.remove(&session.session_id).await;
        trace.push(format!(
            "Session {} cleaned up - creating a new session",
            session.session_id
        ));

        let new_session_id = Uuid::new_v4().to_string();
        self.sessions.put(Session::new(&new_session_id)).await;
        trace.push(format!("New session created: {new_session_id}"));

        TurnOutcome {
            bot_response: closing.to_string(),
            logs: trace,
            new_session_required: true,
            new_session_id: Some(new_session_id),
            welcome_message: Some(self.welcome_message()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::{NaiveDate, NaiveTime};
    use serde_json::Value;
    use std::collections::VecDeque;
    use tokio::sync::Mutex;

    use crate::catalog::RoleId;
    use crate::core::{AssistantError, AssistantResult};
    use crate::llm::{LlmDecision, LlmProvider, ResponseSchema, ToolDefinition};
    use crate::retrieval::{Passage, Retriever};
    use crate::router::RouteDecision;
    use crate::scheduling::{InMemorySlotStore, Slot};
    use crate::session::{BookingStatus, ChatMessage, InMemorySessionStore};

    /// Classifier fake replaying a scripted sequence of decisions
    struct ScriptedClassifier {
        decisions: Mutex<VecDeque<AssistantResult<RouteDecision>>>,
    }

    impl ScriptedClassifier {
        fn new(decisions: Vec<AssistantResult<RouteDecision>>) -> Self {
            Self {
                decisions: Mutex::new(decisions.into()),
            }
        }
    }

    #[async_trait]
    impl IntentClassifier for ScriptedClassifier {
        async fn classify(
            &self,
            _message: &str,
            _history: &[ChatMessage],
        ) -> AssistantResult<RouteDecision> {
            self.decisions
                .lock()
                .await
                .pop_front()
                .expect("classifier script exhausted")
        }
    }

    struct FakeRetriever;

    #[async_trait]
    impl Retriever for FakeRetriever {
        async fn retrieve(
            &self,
            _query: &str,
            _role: RoleId,
            _top_k: usize,
        ) -> AssistantResult<Vec<Passage>> {
            Ok(vec![Passage {
                text: "grounding chunk".into(),
                score: 0.9,
            }])
        }
    }

    /// Provider fake: echoes completions, replays scripted tool proposals
    struct FakeLlm {
        proposals: Mutex<VecDeque<LlmDecision>>,
    }

    impl FakeLlm {
        fn new(proposals: Vec<LlmDecision>) -> Self {
            Self {
                proposals: Mutex::new(proposals.into()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for FakeLlm {
        async fn complete(&self, _: &str, _: &[ChatMessage], user: &str) -> Result<String> {
            Ok(format!("overview: {user}"))
        }

        async fn complete_structured(
            &self,
            _: &str,
            _: &[ChatMessage],
            _: &str,
            _: &ResponseSchema,
        ) -> Result<Value> {
            unimplemented!("orchestrator tests script the classifier directly")
        }

        async fn propose_action(
            &self,
            _: &str,
            _: &[ChatMessage],
            _: &str,
            _: &[ToolDefinition],
        ) -> Result<LlmDecision> {
            Ok(self
                .proposals
                .lock()
                .await
                .pop_front()
                .unwrap_or_else(|| LlmDecision::text("Which day works for you?")))
        }

        fn model(&self) -> String {
            "fake".into()
        }
    }

    fn decision(route: Route, role: Option<RoleId>) -> AssistantResult<RouteDecision> {
        Ok(RouteDecision { route, role })
    }

    async fn build(
        decisions: Vec<AssistantResult<RouteDecision>>,
        proposals: Vec<LlmDecision>,
        slots: Vec<Slot>,
    ) -> (Orchestrator, Arc<InMemorySessionStore>) {
        let sessions = Arc::new(InMemorySessionStore::new());
        let llm = Arc::new(FakeLlm::new(proposals));
        let slot_store = Arc::new(InMemorySlotStore::new());
        slot_store.seed(slots).await;

        let orchestrator = Orchestrator::new(
            sessions.clone(),
            Arc::new(ScriptedClassifier::new(decisions)),
            KnowledgeResponder::new(Arc::new(FakeRetriever), llm.clone(), RoleCatalog::new()),
            SchedulingAgent::new(llm, slot_store, RoleCatalog::new()),
            RoleCatalog::new(),
        );
        (orchestrator, sessions)
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn time(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    #[tokio::test]
    async fn test_first_role_mention_answers_and_invites_scheduling() {
        let (orchestrator, sessions) = build(
            vec![decision(Route::Answer, Some(RoleId::DataAnalyst))],
            vec![],
            vec![],
        )
        .await;

        let outcome = orchestrator.handle_turn("s1", "Data analyst").await;
        assert!(outcome.bot_response.starts_with("overview:"));
        assert!(outcome.bot_response.contains("book an interview"));
        assert!(!outcome.new_session_required);

        let session = sessions.get("s1").await.unwrap();
        assert_eq!(session.current_role, Some(RoleId::DataAnalyst));
        assert!(session.scheduling_offered);
        assert_eq!(session.history.len(), 2);
    }

    #[tokio::test]
    async fn test_role_changes_only_on_extraction() {
        let (orchestrator, sessions) = build(
            vec![
                decision(Route::Answer, Some(RoleId::DataAnalyst)),
                // No extraction: role must be left untouched whatever the route.
                decision(Route::Schedule, None),
                decision(Route::Answer, Some(RoleId::PythonDeveloper)),
            ],
            vec![LlmDecision::text("Which day works for you?")],
            vec![],
        )
        .await;

        orchestrator.handle_turn("s1", "Data analyst").await;
        assert_eq!(
            sessions.get("s1").await.unwrap().current_role,
            Some(RoleId::DataAnalyst)
        );

        orchestrator.handle_turn("s1", "let's schedule").await;
        assert_eq!(
            sessions.get("s1").await.unwrap().current_role,
            Some(RoleId::DataAnalyst)
        );

        orchestrator.handle_turn("s1", "actually, python developer").await;
        assert_eq!(
            sessions.get("s1").await.unwrap().current_role,
            Some(RoleId::PythonDeveloper)
        );
    }

    #[tokio::test]
    async fn test_classifier_failure_degrades_to_clarification() {
        let (orchestrator, sessions) = build(
            vec![Err(AssistantError::classifier("model unreachable"))],
            vec![],
            vec![],
        )
        .await;

        let outcome = orchestrator.handle_turn("s1", "???").await;
        assert_eq!(outcome.bot_response, CLARIFICATION);
        assert!(!outcome.new_session_required);
        assert!(outcome.logs.iter().any(|l| l.contains("Classifier failure")));

        // The turn ended without corrupting or destroying the session.
        let session = sessions.get("s1").await.unwrap();
        assert_eq!(session.history.len(), 2);
        assert_eq!(session.current_role, None);
    }

    #[tokio::test]
    async fn test_termination_retires_and_replaces_session() {
        let (orchestrator, sessions) = build(
            vec![
                decision(Route::Answer, Some(RoleId::DataAnalyst)),
                decision(Route::End, None),
                decision(Route::Answer, None),
            ],
            vec![],
            vec![],
        )
        .await;

        orchestrator.handle_turn("s1", "Data analyst").await;
        let outcome = orchestrator.handle_turn("s1", "Thank you, that's all").await;

        assert_eq!(outcome.bot_response, "Thank you for your time. Have a great day!");
        assert!(outcome.new_session_required);
        let new_id = outcome.new_session_id.unwrap();
        assert_ne!(new_id, "s1");

        let welcome = outcome.welcome_message.unwrap();
        for name in RoleCatalog::new().friendly_names() {
            assert!(welcome.contains(name), "welcome must list {name}");
        }

        // The replacement session is seeded empty.
        let fresh = sessions.get(&new_id).await.unwrap();
        assert!(fresh.history.is_empty());
        assert_eq!(fresh.current_role, None);

        // Reusing the retired id starts a brand-new conversation.
        assert!(sessions.get("s1").await.is_none());
        orchestrator.handle_turn("s1", "hello again").await;
        let reborn = sessions.get("s1").await.unwrap();
        assert_eq!(reborn.current_role, None);
        assert_eq!(reborn.booking_status, BookingStatus::None);
        assert_eq!(reborn.history.len(), 2);
    }

    #[tokio::test]
    async fn test_booking_confirms_and_survives_role_switch() {
        let book = LlmDecision::tool(
            crate::scheduling::action::BOOK_TOOL,
            serde_json::json!({"role_id": "data_analyst", "date": "2026-09-01", "time": "14:00"}),
        );
        let (orchestrator, sessions) = build(
            vec![
                decision(Route::Schedule, Some(RoleId::DataAnalyst)),
                decision(Route::Schedule, Some(RoleId::PythonDeveloper)),
            ],
            vec![book, LlmDecision::text("unused")],
            vec![Slot::open("Analyst", date("2026-09-01"), time("14:00"))],
        )
        .await;

        let outcome = orchestrator.handle_turn("s1", "book 14:00 on the 1st").await;
        assert!(outcome.bot_response.contains("Success!"));
        assert_eq!(
            sessions.get("s1").await.unwrap().booking_status,
            BookingStatus::Confirmed
        );

        // Booking stays confirmed for the session after a role switch; the
        // agent short-circuits rather than re-opening scheduling.
        let outcome = orchestrator
            .handle_turn("s1", "can I interview for python developer too?")
            .await;
        assert!(outcome.bot_response.contains("already have an interview booked"));
        let session = sessions.get("s1").await.unwrap();
        assert_eq!(session.current_role, Some(RoleId::PythonDeveloper));
        assert_eq!(session.booking_status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_scheduling_without_role_asks_for_role() {
        let (orchestrator, _) = build(
            vec![decision(Route::Schedule, None)],
            vec![LlmDecision::text("unused")],
            vec![],
        )
        .await;

        let outcome = orchestrator.handle_turn("s1", "book me an interview").await;
        assert!(outcome
            .bot_response
            .contains("I need to know which role we're discussing"));
    }
}
