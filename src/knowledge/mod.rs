//! Document-grounded question answering
//!
//! Given the session's role and a free-text question, fetches grounding
//! passages and generates an answer constrained to the retrieved context.
//! When no role is selected yet, responds from a handful of pure local
//! branches without touching the retrieval service at all. Owns no state
//! and never writes `current_role` or `booking_status`.

use std::sync::Arc;

use crate::catalog::RoleCatalog;
use crate::core::{AssistantError, AssistantResult};
use crate::llm::LlmProvider;
use crate::retrieval::{join_context, Retriever, DEFAULT_TOP_K};
use crate::session::Session;

/// Grounding template. The "not available" rule is a correctness contract
/// on the model, best-effort rather than locally enforced.
const ANSWER_SYSTEM_TEMPLATE: &str = r#"You are an expert assistant answering questions about a job description.
Your task is to provide helpful information based on the user's input and the CONTEXT below.

**IMPORTANT RULES:**
1. If the user asks a specific question, answer it based on the CONTEXT.
2. If the user just mentions a role (like "Data analyst"), provide a general overview of that role from the CONTEXT.
3. If the user's question cannot be answered from the CONTEXT, say: "I'm sorry, but that specific information is not available in the provided job description."
4. Keep responses concise, professional, and informative.
5. Always provide useful information when possible.

CONTEXT:
"#;

const SCHEDULING_INVITATION: &str = "\n\nIf you're interested, we can proceed to scheduling. \
Would you like to book an interview for this role?";

const POSITION_PHRASES: [&str; 6] = [
    "open position",
    "available position",
    "what position",
    "current position",
    "what roles",
    "what jobs",
];

/// What the responder produced for one turn
#[derive(Debug, Clone)]
pub struct KnowledgeReply {
    pub text: String,
    /// True when a scheduling invitation was appended this turn
    pub offered_scheduling: bool,
}

impl KnowledgeReply {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            offered_scheduling: false,
        }
    }
}

/// Role-grounded question answering over the retrieval and generation oracles
pub struct KnowledgeResponder {
    retriever: Arc<dyn Retriever>,
    llm: Arc<dyn LlmProvider>,
    catalog: RoleCatalog,
    top_k: usize,
}

impl KnowledgeResponder {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        llm: Arc<dyn LlmProvider>,
        catalog: RoleCatalog,
    ) -> Self {
        Self {
            retriever,
            llm,
            catalog,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Answer one user message.
    ///
    /// Errors here mean the retrieval or generation collaborator failed;
    /// the orchestrator degrades them into an apology without mutating
    /// session state.
    pub async fn answer(
        &self,
        session: &Session,
        message: &str,
        trace: &mut Vec<String>,
    ) -> AssistantResult<KnowledgeReply> {
        trace.push("Executing knowledge responder...".to_string());

        let Some(role) = session.current_role else {
            trace.push("No role state available - handling general inquiries".to_string());
            return Ok(self.answer_without_role(message));
        };
        trace.push(format!("Reading role state: '{role}'"));

        let passages = self.retriever.retrieve(message, role, self.top_k).await?;
        trace.push(format!("Found {} relevant document chunks.", passages.len()));

        let system = format!("{ANSWER_SYSTEM_TEMPLATE}{}", join_context(&passages));

        trace.push("Generating grounded answer...".to_string());
        let mut text = self
            .llm
            .complete(&system, &[], message)
            .await
            .map_err(|e| AssistantError::Generation(e.to_string()))?;

        // Invite scheduling once per session, while nothing is booked yet.
        let offer = !session.is_booked() && !session.scheduling_offered;
        if offer {
            trace.push("Adding scheduling call-to-action to response.".to_string());
            text.push_str(SCHEDULING_INVITATION);
        }

        Ok(KnowledgeReply {
            text,
            offered_scheduling: offer,
        })
    }

    /// Pure local branches for the under-specified case: no role selected,
    /// so no retrieval call is made at all.
    fn answer_without_role(&self, message: &str) -> KnowledgeReply {
        let lower = message.to_lowercase();
        let bullets = self.catalog.bulleted_roles();

        if self.catalog.roles_mentioned(message).len() > 1 {
            return KnowledgeReply::plain(format!(
                "I noticed you mentioned multiple roles. To provide you with the best \
                 assistance, please choose just one role that you'd like to learn more about:\n\n\
                 {bullets}\n\nWhich specific role interests you the most?"
            ));
        }

        if POSITION_PHRASES.iter().any(|p| lower.contains(p)) {
            return KnowledgeReply::plain(format!(
                "Here are our current open positions:\n\n{bullets}\n\n\
                 Which role are you interested in learning more about?"
            ));
        }

        if lower.starts_with("hi")
            || lower.starts_with("hello")
            || lower.contains("my name is")
            || lower.contains("i am")
            || lower.contains("i'm")
        {
            return KnowledgeReply::plain(format!(
                "Hello! I'm an AI career assistant. I can help you with the following open \
                 positions:\n\n{bullets}\n\nWhich role are you interested in learning more about?"
            ));
        }

        KnowledgeReply::plain(
            "I can help you with information about our available positions. \
             Which job role are you interested in?",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use serde_json::Value;

    use crate::catalog::RoleId;
    use crate::llm::{LlmDecision, ResponseSchema, ToolDefinition};
    use crate::retrieval::Passage;
    use crate::session::ChatMessage;

    struct FakeRetriever {
        passages: Vec<Passage>,
    }

    #[async_trait]
    impl Retriever for FakeRetriever {
        async fn retrieve(
            &self,
            _query: &str,
            _role: RoleId,
            _top_k: usize,
        ) -> AssistantResult<Vec<Passage>> {
            Ok(self.passages.clone())
        }
    }

    struct EchoLlm;

    #[async_trait]
    impl LlmProvider for EchoLlm {
        async fn complete(&self, _: &str, _: &[ChatMessage], user: &str) -> Result<String> {
            Ok(format!("answer about: {user}"))
        }

        async fn complete_structured(
            &self,
            _: &str,
            _: &[ChatMessage],
            _: &str,
            _: &ResponseSchema,
        ) -> Result<Value> {
            unimplemented!("not used by the responder")
        }

        async fn propose_action(
            &self,
            _: &str,
            _: &[ChatMessage],
            _: &str,
            _: &[ToolDefinition],
        ) -> Result<LlmDecision> {
            unimplemented!("not used by the responder")
        }

        fn model(&self) -> String {
            "fake".into()
        }
    }

    fn responder() -> KnowledgeResponder {
        KnowledgeResponder::new(
            Arc::new(FakeRetriever {
                passages: vec![Passage {
                    text: "role overview chunk".into(),
                    score: 0.8,
                }],
            }),
            Arc::new(EchoLlm),
            RoleCatalog::new(),
        )
    }

    #[tokio::test]
    async fn test_grounded_answer_includes_invitation_once() {
        let r = responder();
        let mut session = Session::new("s1");
        session.current_role = Some(RoleId::DataAnalyst);
        let mut trace = Vec::new();

        let reply = r
            .answer(&session, "what are the requirements?", &mut trace)
            .await
            .unwrap();
        assert!(reply.text.starts_with("answer about:"));
        assert!(reply.text.contains("book an interview"));
        assert!(reply.offered_scheduling);

        // Once the hint is set the invitation is not repeated.
        session.scheduling_offered = true;
        let reply = r
            .answer(&session, "and the salary?", &mut trace)
            .await
            .unwrap();
        assert!(!reply.text.contains("book an interview"));
        assert!(!reply.offered_scheduling);
    }

    #[tokio::test]
    async fn test_no_invitation_after_booking() {
        let r = responder();
        let mut session = Session::new("s1");
        session.current_role = Some(RoleId::DataAnalyst);
        session.booking_status = crate::session::BookingStatus::Confirmed;
        let mut trace = Vec::new();

        let reply = r
            .answer(&session, "what about benefits?", &mut trace)
            .await
            .unwrap();
        assert!(!reply.text.contains("book an interview"));
    }

    #[tokio::test]
    async fn test_no_role_greeting_branch_is_local() {
        let r = responder();
        let session = Session::new("s1");
        let mut trace = Vec::new();

        let reply = r
            .answer(&session, "Hello, my name is Dana", &mut trace)
            .await
            .unwrap();
        assert!(reply.text.contains("AI career assistant"));
        assert!(reply.text.contains("Data Analyst"));
        assert!(!reply.offered_scheduling);
    }

    #[tokio::test]
    async fn test_no_role_positions_branch() {
        let r = responder();
        let session = Session::new("s1");
        let mut trace = Vec::new();

        let reply = r
            .answer(&session, "what roles do you have?", &mut trace)
            .await
            .unwrap();
        assert!(reply.text.contains("current open positions"));
    }

    #[tokio::test]
    async fn test_multiple_roles_asks_to_pick_one() {
        let r = responder();
        let session = Session::new("s1");
        let mut trace = Vec::new();

        let reply = r
            .answer(
                &session,
                "I like both the data analyst and python developer roles",
                &mut trace,
            )
            .await
            .unwrap();
        assert!(reply.text.contains("choose just one role"));
    }

    #[tokio::test]
    async fn test_no_role_default_prompt() {
        let r = responder();
        let session = Session::new("s1");
        let mut trace = Vec::new();

        let reply = r.answer(&session, "ok", &mut trace).await.unwrap();
        assert!(reply.text.contains("Which job role are you interested in?"));
    }
}
