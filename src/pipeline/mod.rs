//! Question -> SQL -> rows -> answer.
//!
//! Each model call is three plain steps (`build_*_prompt`, [`call_model`],
//! [`parse_output`]) so tests can stub any of them.

pub mod prompts;

use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::chat::{render_transcript, ChatMessage};
use crate::db::{DbError, QueryResult, SqlDatabase};
use crate::llm::{
    models::{ChatOptions, ChatResponse, Message},
    LlmError, LlmProvider,
};
use prompts::{AnswerPromptInput, QueryPromptInput};

const QUERY_TEMPERATURE: f32 = 0.0;
const ANSWER_TEMPERATURE: f32 = 0.3;

/// Dialect-tagged openers are removed before the bare fence so no tag is left behind.
const FENCE_OPENERS: &[&str] = &["```postgresql", "```postgres", "```duckdb", "```sql", "```SQL"];
const FENCE: &str = "```";

/// What to do when the generated SQL fails to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryErrorPolicy {
    /// Fail the interaction with the query error.
    #[default]
    Abort,
    /// Hand the error text to the answer stage as if it were the result.
    Fold,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Model(#[from] LlmError),
    #[error("Query failed: {source} (query: {query})")]
    Query { query: String, source: DbError },
    #[error("Schema unavailable: {0}")]
    Schema(DbError),
}

/// The execution result as seen by the answer stage.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Rows(QueryResult),
    Failed(String),
}

impl fmt::Display for QueryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryOutcome::Rows(rows) => write!(f, "{}", rows),
            QueryOutcome::Failed(msg) => write!(f, "Error: {}", msg),
        }
    }
}

/// Everything one question produced.
#[derive(Debug, Clone)]
pub struct Interaction {
    pub question: String,
    pub query: String,
    pub outcome: QueryOutcome,
    pub answer: String,
}

pub fn build_query_prompt(dialect: &str, question: &str, history: &[ChatMessage], schema: &str) -> String {
    prompts::query_prompt(&QueryPromptInput {
        dialect,
        schema,
        history: &render_transcript(history),
        question,
    })
}

pub fn build_answer_prompt(
    question: &str,
    schema: &str,
    query: &str,
    query_response: &str,
    history: &[ChatMessage],
) -> String {
    prompts::answer_prompt(&AnswerPromptInput {
        question,
        schema,
        query,
        query_response,
        history: &render_transcript(history),
    })
}

/// Sends one composed prompt as a single user turn.
pub async fn call_model(llm: &dyn LlmProvider, prompt: String, options: ChatOptions) -> Result<ChatResponse, LlmError> {
    llm.chat(&[Message::user(prompt)], options).await
}

/// The raw completion text, untouched.
pub fn parse_output(response: ChatResponse) -> String {
    response.content
}

pub async fn generate_query(
    llm: &dyn LlmProvider,
    dialect: &str,
    question: &str,
    history: &[ChatMessage],
    schema: &str,
) -> Result<String, LlmError> {
    let prompt = build_query_prompt(dialect, question, history, schema);
    let options = ChatOptions {
        temperature: Some(QUERY_TEMPERATURE),
    };
    let response = call_model(llm, prompt, options).await?;
    Ok(parse_output(response))
}

/// Removes the known markdown fence markers and nothing else. Text without
/// any fence comes back unchanged.
pub fn strip_code_fences(raw: &str) -> String {
    if !raw.contains(FENCE) {
        return raw.to_string();
    }
    let mut text = raw.to_string();
    for opener in FENCE_OPENERS {
        text = text.replace(opener, "");
    }
    text.replace(FENCE, "").trim().to_string()
}

/// Strips fences from the model output and runs what is left verbatim.
/// Returns the executed text alongside the result.
pub async fn execute_query(raw_model_output: &str, db: &dyn SqlDatabase) -> (String, Result<QueryResult, DbError>) {
    let query = strip_code_fences(raw_model_output);
    debug!(query = %query, "Executable query");
    let result = db.run(&query).await;
    (query, result)
}

pub async fn generate_answer(
    llm: &dyn LlmProvider,
    question: &str,
    schema: &str,
    query: &str,
    query_response: &str,
    history: &[ChatMessage],
) -> Result<String, LlmError> {
    let prompt = build_answer_prompt(question, schema, query, query_response, history);
    let options = ChatOptions {
        temperature: Some(ANSWER_TEMPERATURE),
    };
    let response = call_model(llm, prompt, options).await?;
    Ok(parse_output(response))
}

/// Runs the fixed sequence generate_query -> execute -> generate_answer.
#[derive(Clone)]
pub struct Pipeline {
    llm: Arc<dyn LlmProvider>,
    policy: QueryErrorPolicy,
}

impl Pipeline {
    pub fn new(llm: Arc<dyn LlmProvider>, policy: QueryErrorPolicy) -> Self {
        Self { llm, policy }
    }

    pub fn policy(&self) -> QueryErrorPolicy {
        self.policy
    }

    pub async fn run(
        &self,
        db: &dyn SqlDatabase,
        schema: &str,
        question: &str,
        history: &[ChatMessage],
    ) -> Result<Interaction, PipelineError> {
        let raw = generate_query(self.llm.as_ref(), db.dialect(), question, history, schema).await?;

        let (query, result) = execute_query(&raw, db).await;
        let outcome = match result {
            Ok(rows) => QueryOutcome::Rows(rows),
            Err(e) => match self.policy {
                QueryErrorPolicy::Abort => return Err(PipelineError::Query { query, source: e }),
                QueryErrorPolicy::Fold => {
                    warn!("Query failed, passing the error on to the answer stage: {}", e);
                    QueryOutcome::Failed(e.to_string())
                }
            },
        };

        let answer = generate_answer(
            self.llm.as_ref(),
            question,
            schema,
            &query,
            &outcome.to_string(),
            history,
        )
        .await?;

        Ok(Interaction {
            question: question.to_string(),
            query,
            outcome,
            answer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::db::duck::DuckDbDatabase;

    struct ScriptedLlm {
        replies: Mutex<Vec<String>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedLlm {
        fn new(replies: &[&str]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().rev().map(|s| s.to_string()).collect()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedLlm {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn chat(&self, messages: &[Message], _options: ChatOptions) -> Result<ChatResponse, LlmError> {
            self.prompts.lock().unwrap().push(messages[0].content.clone());
            let content = self
                .replies
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| LlmError::Api("script exhausted".to_string()))?;
            Ok(ChatResponse {
                content,
                model: "scripted".to_string(),
                usage: None,
            })
        }

        fn supported_models(&self) -> Vec<&str> {
            vec!["scripted"]
        }
    }

    fn db() -> DuckDbDatabase {
        let db = DuckDbDatabase::open_in_memory().unwrap();
        db.execute_batch("CREATE TABLE t (n INTEGER); INSERT INTO t VALUES (1), (2);")
            .unwrap();
        db
    }

    #[test]
    fn stripping_unfenced_text_is_a_no_op() {
        let plain = "  SELECT name FROM customer ORDER BY name\n";
        assert_eq!(strip_code_fences(plain), plain);
    }

    #[test]
    fn stripping_fenced_text_yields_inner_query() {
        assert_eq!(strip_code_fences("```sql\nSELECT 1\n```"), "SELECT 1");
        assert_eq!(strip_code_fences("```\nSELECT 1\n```"), "SELECT 1");
        assert_eq!(strip_code_fences("```postgresql\nSELECT 1;\n```\n"), "SELECT 1;");
        let once = strip_code_fences("```sql SELECT 2 ```");
        assert_eq!(strip_code_fences(&once), once);
    }

    #[test]
    fn stripping_leaves_bare_keywords_alone() {
        assert_eq!(strip_code_fences("sql SELECT 1"), "sql SELECT 1");
    }

    #[test]
    fn parse_output_returns_content_verbatim() {
        let response = ChatResponse {
            content: "```sql\nSELECT 1\n```".to_string(),
            model: "m".to_string(),
            usage: None,
        };
        assert_eq!(parse_output(response), "```sql\nSELECT 1\n```");
    }

    #[tokio::test]
    async fn answer_stage_sees_exact_query_and_rows() {
        let llm = Arc::new(ScriptedLlm::new(&["```sql\nSELECT SUM(n) AS total FROM t\n```", "The total is 3."]));
        let pipeline = Pipeline::new(llm.clone(), QueryErrorPolicy::Abort);
        let db = db();

        let interaction = pipeline.run(&db, "schema-text", "What is the total?", &[]).await.unwrap();

        assert_eq!(interaction.query, "SELECT SUM(n) AS total FROM t");
        assert_eq!(interaction.outcome.to_string(), "[(3,)]");
        assert_eq!(interaction.answer, "The total is 3.");

        let prompts = llm.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("DuckDB"));
        assert!(prompts[1].contains("SQL query: SELECT SUM(n) AS total FROM t\n"));
        assert!(prompts[1].contains("SQL query response: [(3,)]\n"));
    }

    #[tokio::test]
    async fn abort_policy_stops_before_answer() {
        let llm = Arc::new(ScriptedLlm::new(&["SELECT nope FROM t", "unused"]));
        let pipeline = Pipeline::new(llm.clone(), QueryErrorPolicy::Abort);

        let err = pipeline.run(&db(), "", "q", &[]).await.unwrap_err();
        assert!(matches!(err, PipelineError::Query { ref query, .. } if query == "SELECT nope FROM t"));
        assert_eq!(llm.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn fold_policy_passes_error_text_on() {
        let llm = Arc::new(ScriptedLlm::new(&["SELECT nope FROM t", "Something went wrong."]));
        let pipeline = Pipeline::new(llm.clone(), QueryErrorPolicy::Fold);

        let interaction = pipeline.run(&db(), "", "q", &[]).await.unwrap();
        assert!(matches!(interaction.outcome, QueryOutcome::Failed(_)));

        let prompts = llm.prompts.lock().unwrap();
        assert!(prompts[1].contains("SQL query response: Error: Query Error:"));
    }

    #[tokio::test]
    async fn model_failure_propagates() {
        let llm = Arc::new(ScriptedLlm::new(&[]));
        let pipeline = Pipeline::new(llm, QueryErrorPolicy::Fold);
        let err = pipeline.run(&db(), "", "q", &[]).await.unwrap_err();
        assert!(matches!(err, PipelineError::Model(LlmError::Api(_))));
    }
}
