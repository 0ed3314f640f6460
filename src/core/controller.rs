//! Turns user actions into fetches and drives the view surface.
//!
//! Each controller owns its own `ViewState`; nothing is process-global, so
//! several independent views can live side by side. A query moves through
//! `Loading` and settles in `Success`, `Empty` or `Error`, after which the
//! controls are enabled again. At most one request per controller is in
//! flight: it is identified by a `RequestToken`, and a response whose token
//! is no longer current (after `cancel()` or a dropped future) is discarded.

use crate::config::toml_config::{build_url, EndpointConfig, HealthConfig, ParameterSpec, ViewerConfig};
use crate::core::decoder::ResponseDecoder;
use crate::core::messages::{fill, TemplateVars};
use crate::core::normalizer::{normalize, Normalized};
use crate::core::paginator::{PageView, Paginator};
use crate::core::renderer::TableRenderer;
use crate::core::surface::{TableSurface, ViewSurface};
use crate::domain::model::{RequestIdentity, ResultSet, Severity, StatusMessage};
use crate::domain::ports::Transport;
use crate::utils::error::{Result, ViewerError};
use crate::utils::validation;
use std::sync::{Mutex, MutexGuard, PoisonError};
use url::Url;

pub const HEALTH_ACTION: &str = "health";
pub const CANCELLED_MESSAGE: &str = "Consulta cancelada";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewPhase {
    Idle,
    Loading,
    Success,
    Empty,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Escape,
    Char(char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Success { rows: usize, total_pages: usize },
    Empty,
    HealthOk,
    Failed { message: String },
    /// Local validation failed; no request was sent.
    Invalid { field: String, message: String },
    /// Another request from this view is still in flight.
    Busy,
    /// The request was cancelled before its response arrived.
    Superseded,
}

#[derive(Debug)]
struct ViewState {
    phase: ViewPhase,
    result_set: Option<ResultSet>,
    current_page: usize,
    surface: ViewSurface,
    last_token: u64,
    in_flight: Option<RequestToken>,
}

impl ViewState {
    fn new(initial_status: &str) -> Self {
        Self {
            phase: ViewPhase::Idle,
            result_set: None,
            current_page: 1,
            surface: ViewSurface::new(initial_status),
            last_token: 0,
            in_flight: None,
        }
    }
}

enum Target<'a> {
    Endpoint(&'a EndpointConfig),
    Health,
}

pub struct ViewController<T: Transport> {
    transport: T,
    base: Url,
    endpoints: Vec<EndpointConfig>,
    health: HealthConfig,
    paginator: Paginator,
    renderer: TableRenderer,
    state: Mutex<ViewState>,
}

impl<T: Transport> ViewController<T> {
    pub fn new(transport: T, config: &ViewerConfig) -> Result<Self> {
        let base = config.proxy_base()?;
        let mut renderer = TableRenderer::new(config.locale()?);
        if let Some(message) = &config.viewer.no_results_message {
            renderer = renderer.with_no_results_message(message.clone());
        }

        Ok(Self {
            transport,
            base,
            endpoints: config.endpoints.clone(),
            health: config.health.clone(),
            paginator: Paginator::new(config.page_size()),
            renderer,
            state: Mutex::new(ViewState::new(config.initial_status())),
        })
    }

    fn lock(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn endpoints(&self) -> &[EndpointConfig] {
        &self.endpoints
    }

    pub fn endpoint(&self, name: &str) -> Option<&EndpointConfig> {
        self.endpoints.iter().find(|e| e.name == name)
    }

    pub fn snapshot(&self) -> ViewSurface {
        self.lock().surface.clone()
    }

    pub fn status(&self) -> StatusMessage {
        self.lock().surface.status.clone()
    }

    pub fn phase(&self) -> ViewPhase {
        self.lock().phase
    }

    pub fn controls_enabled(&self) -> bool {
        self.lock().surface.controls_enabled
    }

    pub fn result_set(&self) -> Option<ResultSet> {
        self.lock().result_set.clone()
    }

    pub fn page_view(&self) -> Option<PageView> {
        let state = self.lock();
        state
            .result_set
            .as_ref()
            .map(|rs| self.paginator.view(rs.len(), state.current_page))
    }

    fn resolve(&self, action: &str) -> Option<Target<'_>> {
        match self.endpoint(action) {
            Some(endpoint) => Some(Target::Endpoint(endpoint)),
            None if action == HEALTH_ACTION => Some(Target::Health),
            None => None,
        }
    }

    /// Live validation while the user edits an input. Only touches the
    /// invalid-input marker.
    pub fn validate_input(&self, action: &str, input: Option<&str>) -> bool {
        let Some(endpoint) = self.endpoint(action) else {
            return false;
        };
        let valid = check_parameter(&endpoint.parameter, input).is_ok();
        if let Some(field) = endpoint.parameter.field() {
            self.lock().surface.mark_input(field, valid);
        }
        valid
    }

    pub async fn on_key(&self, action: &str, key: Key, input: Option<&str>) -> Option<ActionOutcome> {
        match key {
            Key::Enter => Some(self.submit(action, input).await),
            Key::Escape | Key::Char(_) => None,
        }
    }

    /// Runs one user action. Errors never escape: they end up in the
    /// status slot and the returned outcome.
    pub async fn submit(&self, action: &str, input: Option<&str>) -> ActionOutcome {
        let Some(target) = self.resolve(action) else {
            tracing::warn!("Unknown action requested: {}", action);
            return ActionOutcome::Invalid {
                field: "action".to_string(),
                message: format!("Unknown action: {}", action),
            };
        };

        let (token, parameter) = match self.begin(&target, input) {
            Ok(started) => started,
            Err(outcome) => return outcome,
        };

        let mut pending = PendingRequest {
            controller: self,
            token,
            settled: false,
        };
        let result = self.fetch(&target, parameter.as_deref()).await;
        pending.settled = true;

        self.complete(&target, token, parameter, result)
    }

    fn begin(
        &self,
        target: &Target<'_>,
        input: Option<&str>,
    ) -> std::result::Result<(RequestToken, Option<String>), ActionOutcome> {
        let mut state = self.lock();
        if let Some(token) = state.in_flight {
            tracing::debug!("Request {:?} still in flight, ignoring action", token);
            return Err(ActionOutcome::Busy);
        }

        let (parameter, loading) = match target {
            Target::Endpoint(endpoint) => {
                let field = endpoint.parameter.field();
                let parameter = match check_parameter(&endpoint.parameter, input) {
                    Ok(parameter) => parameter,
                    Err(e) => {
                        let field = field.unwrap_or("input").to_string();
                        state.surface.mark_input(&field, false);
                        return Err(ActionOutcome::Invalid {
                            field,
                            message: e.status_text(),
                        });
                    }
                };
                if let Some(field) = field {
                    state.surface.mark_input(field, true);
                }
                let loading = fill(
                    &endpoint.messages.loading,
                    &TemplateVars {
                        param: parameter.as_deref(),
                        ..Default::default()
                    },
                );
                (parameter, loading)
            }
            Target::Health => (None, self.health.loading.clone()),
        };

        state.last_token += 1;
        let token = RequestToken(state.last_token);
        state.in_flight = Some(token);
        state.phase = ViewPhase::Loading;
        state.surface.set_status(loading, Severity::Loading);
        state.surface.set_controls_enabled(false);
        tracing::info!("Request {:?} started", token);

        Ok((token, parameter))
    }

    async fn fetch(&self, target: &Target<'_>, parameter: Option<&str>) -> Result<Normalized> {
        match target {
            Target::Endpoint(endpoint) => {
                let url = endpoint.request_url(&self.base, parameter)?;
                let response = self.transport.get(&url).await?;
                let body = ResponseDecoder::with_status_fallbacks(endpoint.status_fallbacks.clone())
                    .decode(&response)?;
                Ok(normalize(Some(&body), &endpoint.array_fields))
            }
            Target::Health => {
                let url = build_url(&self.base, &self.health.path, None)?;
                let response = self.transport.get(&url).await?;
                ResponseDecoder::new().decode(&response)?;
                Ok(Normalized::Empty)
            }
        }
    }

    fn complete(
        &self,
        target: &Target<'_>,
        token: RequestToken,
        parameter: Option<String>,
        result: Result<Normalized>,
    ) -> ActionOutcome {
        let mut guard = self.lock();
        if guard.in_flight != Some(token) {
            tracing::info!("Discarding response for superseded request {:?}", token);
            return ActionOutcome::Superseded;
        }
        let state = &mut *guard;
        state.in_flight = None;

        let outcome = match (target, result) {
            (&Target::Health, Ok(_)) => {
                self.clear_results(state, None);
                state.phase = ViewPhase::Success;
                state.surface.set_status(self.health.success.clone(), Severity::Success);
                ActionOutcome::HealthOk
            }
            (&Target::Endpoint(endpoint), Ok(Normalized::Rows { rows, metadata })) => {
                let result_set = ResultSet::new(
                    RequestIdentity::new(endpoint.name.clone(), parameter.clone()),
                    rows,
                    metadata,
                );
                let nonconforming = result_set.nonconforming_rows();
                if !nonconforming.is_empty() {
                    tracing::warn!(
                        "{} rows differ from the first row's fields; missing cells render blank",
                        nonconforming.len()
                    );
                }

                state.current_page = 1;
                state.surface.table.clear_headers();
                let view = self.render_page(&mut state.surface.table, &result_set, 1, Some(endpoint));

                let message = fill(
                    &endpoint.messages.success,
                    &TemplateVars {
                        param: parameter.as_deref(),
                        count: Some(result_set.len()),
                        error: None,
                        metadata: Some(&result_set.metadata),
                    },
                );
                tracing::info!("Request {:?} returned {} rows", token, result_set.len());
                state.surface.set_status(message, Severity::Success);
                state.phase = ViewPhase::Success;
                state.result_set = Some(result_set);

                ActionOutcome::Success {
                    rows: view.total_items,
                    total_pages: view.total_pages(),
                }
            }
            (&Target::Endpoint(endpoint), Ok(Normalized::Empty)) => {
                self.clear_results(state, endpoint.columns.as_deref());
                let message = fill(
                    &endpoint.messages.empty,
                    &TemplateVars {
                        param: parameter.as_deref(),
                        count: Some(0),
                        ..Default::default()
                    },
                );
                tracing::info!("Request {:?} returned no rows", token);
                state.surface.set_status(message, Severity::Empty);
                state.phase = ViewPhase::Empty;
                ActionOutcome::Empty
            }
            (target, Err(err)) => {
                tracing::error!(
                    "Request {:?} failed: {} (Category: {:?})",
                    token,
                    err,
                    err.category()
                );
                let (template, columns) = match target {
                    Target::Endpoint(endpoint) => (endpoint.messages.error.as_str(), endpoint.columns.as_deref()),
                    Target::Health => (self.health.error.as_str(), None),
                };
                self.clear_results(state, columns);
                let detail = err.status_text();
                let message = fill(
                    template,
                    &TemplateVars {
                        param: parameter.as_deref(),
                        error: Some(&detail),
                        ..Default::default()
                    },
                );
                state.surface.set_status(message, Severity::Error);
                state.phase = ViewPhase::Error;
                ActionOutcome::Failed { message: detail }
            }
        };

        state.surface.set_controls_enabled(true);
        outcome
    }

    fn clear_results(&self, state: &mut ViewState, columns: Option<&[String]>) {
        state.result_set = None;
        state.current_page = 1;
        self.renderer.render_empty(&mut state.surface.table, columns);
    }

    fn render_page(
        &self,
        table: &mut TableSurface,
        result_set: &ResultSet,
        page: usize,
        endpoint: Option<&EndpointConfig>,
    ) -> PageView {
        let slice = self.paginator.paginate(&result_set.rows, page);
        let columns = endpoint.and_then(|e| e.columns.as_deref());
        let formats = endpoint.map(|e| e.column_formats()).unwrap_or_default();
        self.renderer.render_rows(table, slice.items, columns, &formats);
        table.pagination = slice.view.controls();
        slice.view
    }

    /// Re-slices the held result set; never fetches.
    pub fn go_to_page(&self, page: usize) -> Result<PageView> {
        let mut guard = self.lock();
        let state = &mut *guard;
        let result_set = state
            .result_set
            .as_ref()
            .ok_or_else(|| ViewerError::ValidationError {
                field: "page".to_string(),
                message: "No results loaded".to_string(),
            })?;

        let total_pages = self.paginator.view(result_set.len(), 1).total_pages();
        validation::validate_range("page", page, 1, total_pages)?;

        let endpoint = self.endpoint(&result_set.request.endpoint);
        let view = self.render_page(&mut state.surface.table, result_set, page, endpoint);
        state.current_page = page;
        tracing::debug!("Showing page {} of {}", page, total_pages);
        Ok(view)
    }

    pub fn next_page(&self) -> Result<PageView> {
        let current = self.lock().current_page;
        self.go_to_page(current + 1)
    }

    pub fn previous_page(&self) -> Result<PageView> {
        let current = self.lock().current_page;
        self.go_to_page(current.saturating_sub(1))
    }

    /// Invalidates the in-flight request, if any. Its response will be
    /// dropped when it arrives.
    pub fn cancel(&self) -> bool {
        let token = self.lock().in_flight;
        match token {
            Some(token) => self.abandon(token),
            None => false,
        }
    }

    fn abandon(&self, token: RequestToken) -> bool {
        let mut state = self.lock();
        if state.in_flight != Some(token) {
            return false;
        }
        state.in_flight = None;
        state.phase = ViewPhase::Idle;
        state.surface.set_status(CANCELLED_MESSAGE, Severity::Info);
        state.surface.set_controls_enabled(true);
        tracing::info!("Request {:?} cancelled", token);
        true
    }
}

/// Releases the single-flight slot if the submitting future is dropped
/// before its response is applied.
struct PendingRequest<'a, T: Transport> {
    controller: &'a ViewController<T>,
    token: RequestToken,
    settled: bool,
}

impl<T: Transport> Drop for PendingRequest<'_, T> {
    fn drop(&mut self) {
        if !self.settled {
            self.controller.abandon(self.token);
        }
    }
}

fn check_parameter(parameter: &ParameterSpec, input: Option<&str>) -> Result<Option<String>> {
    match parameter {
        ParameterSpec::None => Ok(None),
        ParameterSpec::Text { field } => {
            let value = input.unwrap_or("");
            validation::validate_non_empty_string(field, value)?;
            let value = value.trim();
            validation::validate_path_segment(field, value)?;
            Ok(Some(value.to_string()))
        }
        ParameterSpec::Choice { field, options } => {
            let value = input.unwrap_or("").trim();
            validation::validate_choice(field, value, options)?;
            Ok(Some(value.to_string()))
        }
    }
}
