use actix_web::{delete, get, post, web, HttpResponse, Responder, Result as WebResult};
use tracing::warn;
use uuid::Uuid;

use crate::api::models::{AskRequest, AskResponse, ConnectRequest, ConnectResponse, ErrorResponse, SessionResponse};
use crate::api::SessionRegistry;
use crate::chat::SessionError;
use crate::pipeline::PipelineError;

fn error_body(message: impl Into<String>) -> ErrorResponse {
    ErrorResponse { error: message.into() }
}

fn session_not_found() -> HttpResponse {
    HttpResponse::NotFound().json(error_body("Session not found"))
}

fn session_error(e: &SessionError) -> HttpResponse {
    let mut builder = match e {
        SessionError::Disconnected => HttpResponse::Conflict(),
        SessionError::EmptyQuestion | SessionError::Connection(_) => HttpResponse::BadRequest(),
        SessionError::Pipeline(PipelineError::Query { .. }) => HttpResponse::UnprocessableEntity(),
        SessionError::Pipeline(PipelineError::Model(_)) => HttpResponse::BadGateway(),
        SessionError::Pipeline(PipelineError::Schema(_)) => HttpResponse::InternalServerError(),
    };
    builder.json(error_body(e.to_string()))
}

#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({"status": "healthy"}))
}

// --- Sessions ---

#[post("")]
pub async fn create_session(registry: web::Data<SessionRegistry>) -> WebResult<HttpResponse> {
    let (id, created_at, session) = registry.create();
    let session = session.lock().await;

    Ok(HttpResponse::Created().json(SessionResponse {
        id,
        created_at,
        connected: session.is_connected(),
        messages: session.messages().to_vec(),
    }))
}

#[get("/{id}")]
pub async fn get_session(registry: web::Data<SessionRegistry>, id: web::Path<Uuid>) -> WebResult<HttpResponse> {
    let id = id.into_inner();
    let Some((created_at, session)) = registry.get(id) else {
        return Ok(session_not_found());
    };
    let session = session.lock().await;

    Ok(HttpResponse::Ok().json(SessionResponse {
        id,
        created_at,
        connected: session.is_connected(),
        messages: session.messages().to_vec(),
    }))
}

#[delete("/{id}")]
pub async fn delete_session(registry: web::Data<SessionRegistry>, id: web::Path<Uuid>) -> WebResult<HttpResponse> {
    if registry.remove(id.into_inner()) {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Ok(session_not_found())
    }
}

#[post("/{id}/connect")]
pub async fn connect(
    registry: web::Data<SessionRegistry>,
    id: web::Path<Uuid>,
    req: web::Json<ConnectRequest>,
) -> WebResult<HttpResponse> {
    let Some((_, session)) = registry.get(id.into_inner()) else {
        return Ok(session_not_found());
    };
    let params = req.into_inner().apply(registry.config().database.connection_params());

    let mut session = session.lock().await;
    match session.connect(&params).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ConnectResponse {
            connected: true,
            database: params.database.clone(),
        })),
        Err(e) => {
            warn!("Connection attempt failed: {}", e);
            Ok(session_error(&e))
        }
    }
}

// --- Messages ---

#[get("/{id}/messages")]
pub async fn get_messages(registry: web::Data<SessionRegistry>, id: web::Path<Uuid>) -> WebResult<HttpResponse> {
    let Some((_, session)) = registry.get(id.into_inner()) else {
        return Ok(session_not_found());
    };
    let session = session.lock().await;
    Ok(HttpResponse::Ok().json(session.messages()))
}

#[post("/{id}/messages")]
pub async fn ask(
    registry: web::Data<SessionRegistry>,
    id: web::Path<Uuid>,
    req: web::Json<AskRequest>,
) -> WebResult<HttpResponse> {
    let Some((_, session)) = registry.get(id.into_inner()) else {
        return Ok(session_not_found());
    };
    let req = req.into_inner();

    let mut session = session.lock().await;
    match session.ask(&req.content).await {
        Ok(interaction) => Ok(HttpResponse::Ok().json(AskResponse {
            question: interaction.question,
            query: interaction.query,
            answer: interaction.answer,
        })),
        Err(e) => Ok(session_error(&e)),
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health).service(
        web::scope("/sessions")
            .service(create_session)
            .service(get_session)
            .service(delete_session)
            .service(connect)
            .service(get_messages)
            .service(ask),
    );
}
