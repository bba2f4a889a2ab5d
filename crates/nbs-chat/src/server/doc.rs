//! OpenAPI document served behind the Swagger UI

use utoipa::OpenApi;

use crate::history::MessageView;
use crate::server::routes;
use crate::types::{ChatRequest, ChatResponseBody, HistoryResponse, UserQuery};

/// Where the Swagger UI is mounted
pub const SWAGGER_PATH: &str = "/swagger";
/// Where the OpenAPI JSON is served
pub const OPENAPI_PATH: &str = "/static/swagger.json";

#[derive(OpenApi)]
#[openapi(
    info(title = "NBS Chat", description = "Chat about data published by the Nigerian Bureau of Statistics"),
    paths(routes::home::home, routes::chat::chat, routes::history::history),
    components(schemas(ChatRequest, ChatResponseBody, HistoryResponse, MessageView, UserQuery)),
    tags(
        (name = "chat", description = "Chat turns and history"),
        (name = "pages", description = "Browser pages")
    )
)]
pub struct ApiDoc;
