use axum::response::Html;

const INDEX_HTML: &str = include_str!("../../../static/index.html");

/// GET / - Chat page
#[utoipa::path(
    get,
    path = "/",
    tag = "pages",
    responses((status = 200, description = "Chat page", content_type = "text/html"))
)]
pub async fn home() -> Html<&'static str> {
    Html(INDEX_HTML)
}
