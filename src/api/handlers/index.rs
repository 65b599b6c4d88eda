use axum::response::Html;

const UPLOAD_FORM: &str = include_str!("../../../static/index.html");

/// Browser upload form with a live progress bar.
pub async fn upload_form() -> Html<&'static str> {
    Html(UPLOAD_FORM)
}
