/// Form controller. Owns the input fields and the request lifecycle.
///
/// Lifecycle:
///   Idle ──submit──▶ Loading ──▶ Success(menu) | Error(message)
///   Success / Error ──submit──▶ Loading
///
/// `begin` and `finish` are the two halves of one submission so the TUI can run
/// the network step on a spawned task; `submit` glues them for callers that
/// simply await.
use std::num::IntErrorKind;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::client::{MenuBackend, Reply, TransportError};
use crate::menu::{Menu, MenuRequest};

// ── Errors ────────────────────────────────────────────────────────────────────

/// Every way a submission can end without a menu. `Display` is the message the
/// user sees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("budget must be zero or greater")]
    NegativeBudget,
    #[error("budget must be a whole number")]
    BudgetNotNumber,
    #[error("budget is too large")]
    BudgetTooLarge,
    #[error("enter at least one ingredient")]
    NoIngredients,
    #[error("{0}")]
    Server(String),
    #[error("the server returned a menu in an unexpected format")]
    Malformed,
    #[error("could not reach the menu server; check that it is running")]
    Transport,
}

/// Shown when a failed response carries no usable `error` field.
pub const UNKNOWN_SERVER_ERROR: &str = "an unknown error occurred";

// ── State ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default)]
pub enum UiState {
    #[default]
    Idle,
    Loading,
    Error(String),
    Success(Menu),
}

/// Raw text of the three fields, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormInput {
    pub ingredients: String,
    pub budget: String,
    pub preference: String,
}

#[derive(Debug, Default)]
pub struct FormController {
    pub input: FormInput,
    state: UiState,
    in_flight: bool,
}

impl FormController {
    pub fn new(input: FormInput) -> Self {
        Self { input, ..Default::default() }
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            UiState::Error(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn menu(&self) -> Option<&Menu> {
        match &self.state {
            UiState::Success(menu) => Some(menu),
            _ => None,
        }
    }

    /// Start a submission. Returns the request to send, or `None` when there is
    /// nothing to send: either a request is already in flight (no state change
    /// at all) or validation failed (state is now `Error`, flag released).
    pub fn begin(&mut self) -> Option<MenuRequest> {
        if self.in_flight {
            debug!("submit ignored: a request is already in flight");
            return None;
        }
        self.in_flight = true;
        self.state = UiState::Loading;

        match build_request(&self.input) {
            Ok(request) => {
                info!(
                    ingredients = request.ingredients.len(),
                    budget = ?request.budget,
                    preference = request.preference.is_some(),
                    "submitting menu request"
                );
                Some(request)
            }
            Err(e) => {
                debug!(error = %e, "submission rejected by validation");
                self.settle(Err(e));
                None
            }
        }
    }

    /// Complete the in-flight submission with whatever the network produced.
    pub fn finish(&mut self, outcome: Result<Reply, TransportError>) {
        let result = match outcome {
            Ok(reply) => interpret(reply),
            Err(e) => {
                warn!(cause = %e, "menu request failed before any response arrived");
                Err(SubmitError::Transport)
            }
        };
        self.settle(result);
    }

    /// One full submission: validate, send, store the outcome.
    pub async fn submit<B: MenuBackend>(&mut self, backend: &B) {
        let Some(request) = self.begin() else { return };
        let outcome = backend.generate(&request).await;
        self.finish(outcome);
    }

    // Every exit path funnels through here; releasing the flag is the last step
    fn settle(&mut self, result: Result<Menu, SubmitError>) {
        self.state = match result {
            Ok(menu) => {
                info!(plans = menu.plans().count(), title = ?menu.title, "menu received");
                UiState::Success(menu)
            }
            Err(e) => UiState::Error(e.to_string()),
        };
        self.in_flight = false;
    }
}

// ── Normalization ─────────────────────────────────────────────────────────────

/// Separators accepted between ingredients: ASCII comma plus the ideographic
/// and full-width commas.
const INGREDIENT_SEPARATORS: [char; 3] = [',', '、', '，'];

/// Split on commas, trim each piece, drop the empty ones. Order and duplicates
/// are preserved.
pub fn normalize_ingredients(text: &str) -> Vec<String> {
    text.split(INGREDIENT_SEPARATORS)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Blank → `None`. Negative (integer or decimal) → `NegativeBudget`. Digits
/// past `u64::MAX` → `BudgetTooLarge`. Anything else that is not a whole number
/// → `BudgetNotNumber`.
pub fn parse_budget(text: &str) -> Result<Option<u64>, SubmitError> {
    let t = text.trim();
    if t.is_empty() {
        return Ok(None);
    }
    if let Ok(n) = t.parse::<i64>() {
        return if n < 0 {
            Err(SubmitError::NegativeBudget)
        } else {
            Ok(Some(n as u64))
        };
    }
    match t.parse::<u64>() {
        Ok(n) => return Ok(Some(n)),
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => return Err(SubmitError::BudgetTooLarge),
        Err(_) => {}
    }
    match t.parse::<f64>() {
        Ok(f) if f < 0.0 => Err(SubmitError::NegativeBudget),
        _ => Err(SubmitError::BudgetNotNumber),
    }
}

pub fn build_request(input: &FormInput) -> Result<MenuRequest, SubmitError> {
    let budget = parse_budget(&input.budget)?;

    let ingredients = normalize_ingredients(&input.ingredients);
    if ingredients.is_empty() {
        return Err(SubmitError::NoIngredients);
    }

    let preference = Some(input.preference.trim())
        .filter(|p| !p.is_empty())
        .map(str::to_string);

    Ok(MenuRequest { ingredients, budget, preference })
}

// ── Reply interpretation ──────────────────────────────────────────────────────

fn interpret(reply: Reply) -> Result<Menu, SubmitError> {
    if !reply.is_success() {
        let message = reply
            .body
            .as_ref()
            .and_then(|b| b.get("error"))
            .and_then(Value::as_str)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(UNKNOWN_SERVER_ERROR)
            .to_string();
        warn!(status = reply.status, %message, "menu server reported an error");
        return Err(SubmitError::Server(message));
    }

    let Some(body) = reply.body else {
        warn!(status = reply.status, "menu server answered with a non-JSON body");
        return Err(SubmitError::Malformed);
    };
    Menu::from_value(&body).map_err(|e| {
        warn!(error = %e, "menu response failed validation");
        SubmitError::Malformed
    })
}
