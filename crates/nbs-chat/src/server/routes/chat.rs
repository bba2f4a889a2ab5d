//! Chat turn endpoint

use axum::{
    extract::{FromRequest, Multipart, Query, Request, State},
    http::header,
    response::{IntoResponse, Response},
    Form, Json,
};

use crate::error::{Error, Result};
use crate::history::Message;
use crate::server::state::AppState;
use crate::types::{ChatForm, ChatRequest, ChatResponseBody, UserQuery};

/// Upper bound on a chat request body
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// POST /chat - Answer a question and return the user's whole history
#[utoipa::path(
    post,
    path = "/chat",
    tag = "chat",
    params(UserQuery),
    request_body(
        content = ChatRequest,
        description = "JSON `{\"input\"}`; a form field `input` is accepted as well",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Answer plus the full per-user history", body = ChatResponseBody),
        (status = 400, description = "Malformed JSON body"),
        (status = 503, description = "Language model unavailable"),
    )
)]
pub async fn chat(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
    request: Request,
) -> Response {
    let username = query.username;
    let session_id = state.sessions().session_id(request.headers());

    let question = match read_question(&state, request).await {
        Ok(question) => question,
        Err(e) => return e.into_response(),
    };

    let ticket = state.sessions().ensure_flow(session_id, &username, &question);

    let mut response = match run_turn(&state, &username, question).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => e.into_response(),
    };

    if ticket.issued {
        if let Some(cookie) = state.sessions().set_cookie(&ticket.id) {
            response.headers_mut().insert(header::SET_COOKIE, cookie);
        }
    }
    response
}

/// One serialized turn: record the question, ask the engine, record the answer
async fn run_turn(state: &AppState, username: &str, question: String) -> Result<ChatResponseBody> {
    let history = state.history();
    let _turn = history.begin_turn(username).await;

    history.append(username, Message::user(username, question.as_str()));

    let answer = state.engine().chat(&question).await?.to_string();
    history.append(username, Message::ai(answer.as_str()));

    tracing::info!("User question: {}", question);
    tracing::info!("AI response: {}", answer);

    Ok(ChatResponseBody {
        response: answer,
        messages: history.views(username, state.timestamp_format()),
    })
}

/// Question from a JSON body, else from a form body, else empty
async fn read_question(state: &AppState, request: Request) -> Result<String> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim_start().to_ascii_lowercase())
        .unwrap_or_default();

    if content_type.starts_with("application/json") {
        let bytes = axum::body::to_bytes(request.into_body(), MAX_BODY_BYTES)
            .await
            .map_err(|e| Error::BadRequest(format!("Failed to read body: {}", e)))?;
        let body: ChatRequest = serde_json::from_slice(&bytes)?;
        return Ok(body.input);
    }

    if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, state)
            .await
            .map_err(|e| Error::BadRequest(format!("Invalid multipart body: {}", e)))?;
        return read_multipart_input(multipart).await;
    }

    match Form::<ChatForm>::from_request(request, state).await {
        Ok(Form(form)) => Ok(form.input),
        Err(rejection) => {
            tracing::debug!("No form input ({}), using an empty question", rejection);
            Ok(String::new())
        }
    }
}

/// `input` field of a multipart form; other fields are skipped
async fn read_multipart_input(mut multipart: Multipart) -> Result<String> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::BadRequest(format!("Failed to read multipart field: {}", e)))?
    {
        if field.name() == Some("input") {
            return field
                .text()
                .await
                .map_err(|e| Error::BadRequest(format!("Failed to read input field: {}", e)));
        }
    }
    Ok(String::new())
}
