//! Intent classification
//!
//! One classifier call per turn decides where the message goes: grounded
//! question answering, interview scheduling, or conversation end. The
//! classifier also extracts the canonical role id when the message names a
//! role. Its output is validated against closed sets here; anything else is
//! a classifier failure the orchestrator absorbs into a clarification.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::catalog::{RoleCatalog, RoleId};
use crate::core::{AssistantError, AssistantResult};
use crate::llm::{LlmProvider, ResponseSchema};
use crate::session::ChatMessage;

/// The per-turn dispatch decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Document-grounded question answering
    Answer,
    /// Interview scheduling dialogue
    Schedule,
    /// Conversation termination
    End,
}

impl Route {
    fn parse(label: &str) -> Option<Route> {
        match label {
            "rag_system" => Some(Route::Answer),
            "sql_database" => Some(Route::Schedule),
            "end_conversation" => Some(Route::End),
            _ => None,
        }
    }
}

/// What the classifier decided for one message
#[derive(Debug, Clone, Copy)]
pub struct RouteDecision {
    pub route: Route,
    /// Extracted role, if the message named one
    pub role: Option<RoleId>,
}

/// Trait for intent classification backends.
///
/// The classification is non-deterministic across identical inputs; callers
/// must invoke it fresh every turn and never assume referential
/// transparency.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(
        &self,
        message: &str,
        history: &[ChatMessage],
    ) -> AssistantResult<RouteDecision>;
}

/// Route labels the model is allowed to emit
const ROUTE_LABELS: [&str; 3] = ["rag_system", "sql_database", "end_conversation"];

/// LLM-backed classifier using schema-constrained structured output
pub struct LlmIntentClassifier {
    llm: Arc<dyn LlmProvider>,
    system_prompt: String,
    schema: ResponseSchema,
}

impl LlmIntentClassifier {
    pub fn new(llm: Arc<dyn LlmProvider>, catalog: &RoleCatalog) -> Self {
        let system_prompt = build_system_prompt(catalog);
        let schema = build_schema();
        Self {
            llm,
            system_prompt,
            schema,
        }
    }

    fn parse_decision(&self, value: &Value) -> AssistantResult<RouteDecision> {
        let label = value
            .get("next_node")
            .and_then(Value::as_str)
            .ok_or_else(|| AssistantError::classifier("missing next_node in classifier output"))?;

        let route = Route::parse(label).ok_or_else(|| {
            AssistantError::classifier(format!("unknown route label '{label}'"))
        })?;

        let role = match value.get("job_role_id") {
            None | Some(Value::Null) => None,
            Some(Value::String(id)) => Some(RoleId::parse(id).ok_or_else(|| {
                AssistantError::classifier(format!("unknown role id '{id}'"))
            })?),
            Some(other) => {
                return Err(AssistantError::classifier(format!(
                    "job_role_id had unexpected shape: {other}"
                )));
            }
        };

        Ok(RouteDecision { route, role })
    }
}

#[async_trait]
impl IntentClassifier for LlmIntentClassifier {
    async fn classify(
        &self,
        message: &str,
        history: &[ChatMessage],
    ) -> AssistantResult<RouteDecision> {
        let value = self
            .llm
            .complete_structured(&self.system_prompt, history, message, &self.schema)
            .await
            .map_err(|e| AssistantError::classifier(e.to_string()))?;

        let decision = self.parse_decision(&value)?;
        tracing::debug!(route = ?decision.route, role = ?decision.role, "Classifier decision");
        Ok(decision)
    }
}

fn build_schema() -> ResponseSchema {
    let role_ids: Vec<&str> = RoleId::ALL.iter().map(|r| r.as_str()).collect();
    ResponseSchema::new(
        "route_query",
        json!({
            "type": "object",
            "properties": {
                "next_node": {
                    "type": "string",
                    "enum": ROUTE_LABELS,
                    "description": "Given the user query, choose the best tool to handle it."
                },
                "job_role_id": {
                    "type": ["string", "null"],
                    "enum": role_ids,
                    "description": "If the user's query is about a specific job, extract its canonical ID."
                }
            },
            "required": ["next_node"],
            "additionalProperties": false
        }),
    )
}

fn build_system_prompt(catalog: &RoleCatalog) -> String {
    format!(
        r#"You are a professional, polite, and helpful AI chat Assistant.
Your mission is to represent the company by providing which roles are available, information about the roles and schedule interviews.

**Your Core Directives:**
1. **Route to RAG for Role Information:** Route to `rag_system` when:
   - The candidate asks specific questions about a particular role (e.g., "what are the requirements for Data Analyst?", "tell me about the Python Developer role")
   - The candidate just mentions a specific role name (e.g., "Data analyst", "Python Developer") - provide them with general information about that role

2. **Route to Scheduling:** When the candidate agrees to schedule an interview or asks about times, route to `sql_database`. This includes:
   - Direct scheduling requests (e.g., "can we schedule an interview?", "I'd like to book an interview")
   - Time/date preferences (e.g., "I can come at 15:00", "3 days afternoon", "next week morning")
   - Confirmation of slots (e.g., "yes, that works", "I'll take that slot")

3. **End Conversation:** Choose `end_conversation` ONLY when:
   - The candidate uses clear sign-off phrases (e.g., "thank you, that's all", "goodbye", "no more questions", "that's it")
   - The candidate explicitly states they are not interested in any of the roles
   - The candidate has already booked an interview and confirms they have no more questions

**Job Role Extraction Logic:**
The candidate chooses one role from the list; if they mention more than one role, do not extract any role id.
You must identify the user's desired job role using the following mapping. Extract the canonical ID.
{}
If a role was mentioned previously, maintain that context. If the user mentions a new role, switch to it.
"#,
        catalog.role_instructions()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use crate::llm::{LlmDecision, ToolDefinition};

    /// Provider fake that returns one canned structured value
    struct FakeStructured(Value);

    #[async_trait]
    impl LlmProvider for FakeStructured {
        async fn complete(&self, _: &str, _: &[ChatMessage], _: &str) -> Result<String> {
            unimplemented!("not used by the classifier")
        }

        async fn complete_structured(
            &self,
            _: &str,
            _: &[ChatMessage],
            _: &str,
            _: &ResponseSchema,
        ) -> Result<Value> {
            Ok(self.0.clone())
        }

        async fn propose_action(
            &self,
            _: &str,
            _: &[ChatMessage],
            _: &str,
            _: &[ToolDefinition],
        ) -> Result<LlmDecision> {
            unimplemented!("not used by the classifier")
        }

        fn model(&self) -> String {
            "fake".into()
        }
    }

    fn classifier(value: Value) -> LlmIntentClassifier {
        LlmIntentClassifier::new(Arc::new(FakeStructured(value)), &RoleCatalog::new())
    }

    #[tokio::test]
    async fn test_valid_decision_with_role() {
        let c = classifier(json!({"next_node": "rag_system", "job_role_id": "data_analyst"}));
        let decision = c.classify("Data analyst", &[]).await.unwrap();
        assert_eq!(decision.route, Route::Answer);
        assert_eq!(decision.role, Some(RoleId::DataAnalyst));
    }

    #[tokio::test]
    async fn test_valid_decision_without_role() {
        let c = classifier(json!({"next_node": "sql_database", "job_role_id": null}));
        let decision = c.classify("can we schedule?", &[]).await.unwrap();
        assert_eq!(decision.route, Route::Schedule);
        assert_eq!(decision.role, None);
    }

    #[tokio::test]
    async fn test_unknown_route_label_is_failure() {
        let c = classifier(json!({"next_node": "teleport"}));
        let err = c.classify("hm", &[]).await.unwrap_err();
        assert!(matches!(err, AssistantError::Classifier(_)));
    }

    #[tokio::test]
    async fn test_unknown_role_id_is_failure() {
        let c = classifier(json!({"next_node": "rag_system", "job_role_id": "astronaut"}));
        let err = c.classify("astronaut role?", &[]).await.unwrap_err();
        assert!(matches!(err, AssistantError::Classifier(_)));
    }

    #[tokio::test]
    async fn test_missing_next_node_is_failure() {
        let c = classifier(json!({"job_role_id": "data_analyst"}));
        assert!(c.classify("hi", &[]).await.is_err());
    }
}
