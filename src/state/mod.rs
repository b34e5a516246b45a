use crate::api::ApiClient;
use crate::models::PageSummary;
use leptos::prelude::*;

#[derive(Clone)]
pub(crate) struct AppState {
    pub api_client: RwSignal<ApiClient>,

    /// Site pages, loaded from backend for the home list.
    pub pages: RwSignal<Vec<PageSummary>>,
    pub pages_loading: RwSignal<bool>,
    pub pages_error: RwSignal<Option<String>>,

    /// Load guard (ignore stale responses).
    pub pages_request_id: RwSignal<u64>,
}

impl AppState {
    pub fn new() -> Self {
        let stored_client = ApiClient::load_from_storage();

        Self {
            api_client: RwSignal::new(stored_client),
            pages: RwSignal::new(vec![]),
            pages_loading: RwSignal::new(false),
            pages_error: RwSignal::new(None),
            pages_request_id: RwSignal::new(0),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub(crate) struct AppContext(pub AppState);
