//! Fixed prompt templates for the two model calls.

/// Inputs for the query-generation prompt.
pub struct QueryPromptInput<'a> {
    pub dialect: &'a str,
    pub schema: &'a str,
    pub history: &'a str,
    pub question: &'a str,
}

/// Inputs for the answer prompt.
pub struct AnswerPromptInput<'a> {
    pub question: &'a str,
    pub schema: &'a str,
    pub query: &'a str,
    pub query_response: &'a str,
    pub history: &'a str,
}

pub fn query_prompt(input: &QueryPromptInput<'_>) -> String {
    format!(
        r#"You translate questions written in natural language into a single, syntactically correct {dialect} query.

Database schema:
{schema}

Conversation so far (use it to resolve follow-up questions):
{history}

Guidelines:
- Select only the columns the question needs. Never use SELECT *.
- Use the exact table and column names from the schema.
- When several rows can come back, order them by a meaningful column.
- Only use functions that {dialect} supports.
- Double-check the query before you answer.

Output rules:
- Reply with the query only: no explanation, no markdown, no code fences, no leading dialect name.

Question: {question}"#,
        dialect = input.dialect,
        schema = input.schema,
        history = input.history,
        question = input.question,
    )
}

pub fn answer_prompt(input: &AnswerPromptInput<'_>) -> String {
    format!(
        r#"You are an assistant that explains database results to the person who asked the question.
Using the question, the database schema, the SQL query that was run and its response, reply in plain English.

- If the response holds several values, lay them out as a table.
- If the response is a single value, say what that value means for the question.
- Keep the reply well formatted.

Question: {question}

Database schema:
{schema}

SQL query: {query}

SQL query response: {query_response}

Conversation history:
{history}"#,
        question = input.question,
        schema = input.schema,
        query = input.query,
        query_response = input.query_response,
        history = input.history,
    )
}
