/* Chiamate HTTP verso il server, fatte con la fetch del browser. */
use rollcall_core::{ListUsersResponse, USERS_PATH};
use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{AbortSignal, Headers, Request, RequestInit, Response};

#[derive(Error, Debug)]
pub enum FetchError {
    /// Errore di rete o del browser (compresa la fetch annullata).
    #[error("browser error: {0}")]
    Js(String),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("invalid response body: {0}")]
    Decode(String),
}

impl From<JsValue> for FetchError {
    fn from(value: JsValue) -> Self {
        FetchError::Js(format!("{value:?}"))
    }
}

/// GET /api/users. Con `signal` la richiesta si può annullare dall'esterno.
pub async fn fetch_users(signal: Option<&AbortSignal>) -> Result<ListUsersResponse, FetchError> {
    let headers = Headers::new()?;
    headers.set("accept", "application/json")?;

    let init = RequestInit::new();
    init.set_method("GET");
    init.set_headers(&headers);
    init.set_signal(signal);

    let request = Request::new_with_str_and_init(USERS_PATH, &init)?;
    let window = web_sys::window().ok_or_else(|| FetchError::Js("no window".to_string()))?;

    let response: Response = JsFuture::from(window.fetch_with_request(&request))
        .await?
        .dyn_into()?;
    if !response.ok() {
        return Err(FetchError::Status(response.status()));
    }

    let body = JsFuture::from(response.json()?).await?;
    serde_wasm_bindgen::from_value(body).map_err(|e| FetchError::Decode(e.to_string()))
}
