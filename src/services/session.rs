// src/services/session.rs
use chrono::{Datelike, Utc};
use log::{info, warn};
use serde::Deserialize;
use std::error::Error;

use crate::errors::ImportError;
use crate::models::{
    CurveSeries, IndexDefinition, MonthlyReturns, UserReturns, ViewState, FLOOR_YEAR,
};
use crate::services::calculations::{cumulative_curve, CURVE_BASE};
use crate::services::comparison::compare;
use crate::services::normalizer::{annual_yields, group_by_year};
use crate::services::profile::{FetchStatus, ProfileFetcher};
use crate::services::returns::ReturnStore;
use crate::services::storage::BlobStore;
use crate::services::year_range::{effective_range, in_bounds, resolve_effective_start, year_sequence};

const USER_LABEL: &str = "You";
const USER_COLOR: &str = "#4ade80";

/// Discrete user intents, translated from raw UI events.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    SetReturn { year: i32, value: Option<f64> },
    ImportFetched { username: String, start_year: i32, monthly: MonthlyReturns },
    Clear { confirmed: bool },
    ChangeStartYear { year: i32 },
    /// Fills the input surface from the saved state.
    RestoreSaved,
}

/// Receives every recomputed view. Failures are logged, never rolled back.
pub trait Presenter: Send {
    fn present(&mut self, view: &ViewState) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// One user's comparison session: owns the return store and the display range.
pub struct Session {
    store: ReturnStore,
    indices: Vec<IndexDefinition>,
    start_year: i32,
    presenter: Option<Box<dyn Presenter>>,
}

impl Session {
    pub fn start(backend: Box<dyn BlobStore>, indices: Vec<IndexDefinition>) -> Self {
        Self::with_year(backend, indices, Utc::now().year())
    }

    pub fn with_year(backend: Box<dyn BlobStore>, indices: Vec<IndexDefinition>, current_year: i32) -> Self {
        let store = ReturnStore::load(backend, current_year);
        Session {
            store,
            indices,
            start_year: FLOOR_YEAR,
            presenter: None,
        }
    }

    pub fn set_presenter(&mut self, presenter: Box<dyn Presenter>) {
        self.presenter = Some(presenter);
    }

    pub fn returns(&self) -> &UserReturns {
        self.store.returns()
    }

    pub fn indices(&self) -> &[IndexDefinition] {
        &self.indices
    }

    pub fn start_year(&self) -> i32 {
        self.start_year
    }

    pub fn current_year(&self) -> i32 {
        self.store.current_year()
    }

    pub fn dispatch(&mut self, action: Action) -> ViewState {
        match action {
            Action::SetReturn { year, value } => {
                if !in_bounds(year, self.current_year()) {
                    warn!("Ignoring return for out-of-range year {}", year);
                } else {
                    self.store.set_return(year, value);
                }
            }
            Action::ImportFetched { username, start_year, monthly } => {
                self.apply_import(&username, start_year, &monthly);
            }
            Action::Clear { confirmed } => {
                if confirmed {
                    self.store.clear();
                } else {
                    info!("Clear not confirmed, keeping data");
                }
            }
            Action::ChangeStartYear { year } => {
                self.start_year = resolve_effective_start(year, None, FLOOR_YEAR);
            }
            Action::RestoreSaved => self.store.restore_saved(),
        }
        self.refresh()
    }

    /// Fetches a profile and imports it. The store is only touched on success.
    pub async fn import_profile<F>(
        &mut self,
        fetcher: &ProfileFetcher,
        username: &str,
        start_year: i32,
        on_status: F,
    ) -> Result<ViewState, ImportError>
    where
        F: FnMut(&FetchStatus) + Send,
    {
        let monthly = fetcher.fetch(username, on_status).await?;
        Ok(self.dispatch(Action::ImportFetched {
            username: username.trim().to_string(),
            start_year,
            monthly,
        }))
    }

    fn apply_import(&mut self, username: &str, requested_start: i32, monthly: &MonthlyReturns) {
        let grouped = group_by_year(monthly);
        let effective_start = resolve_effective_start(requested_start, grouped.earliest_year, FLOOR_YEAR);
        let yields = annual_yields(&grouped, effective_start, self.current_year());

        info!(
            "Importing {} annual yields for {} (requested start {}, effective {})",
            yields.len(),
            username,
            requested_start,
            effective_start
        );
        self.store.bulk_replace(yields);

        if effective_start != requested_start {
            info!("Start year moved forward from {} to {}", requested_start, effective_start);
        }
        self.start_year = effective_start;
    }

    /// Recomputes the view and hands it to the presenter, if any.
    pub fn refresh(&mut self) -> ViewState {
        let view = self.render();
        if let Some(presenter) = self.presenter.as_mut() {
            if let Err(e) = presenter.present(&view) {
                warn!("Presentation update failed: {}", e);
            }
        }
        view
    }

    pub fn render(&self) -> ViewState {
        let range = effective_range(self.start_year, self.current_year());
        let years = year_sequence(range.start_year, range.end_year);

        let index_curves = self
            .indices
            .iter()
            .map(|index| CurveSeries {
                label: index.name.clone(),
                color: index.color.clone(),
                points: cumulative_curve(&years, &index.returns, CURVE_BASE),
            })
            .collect();

        let returns = self.store.returns();
        let user_points = cumulative_curve(&years, returns, CURVE_BASE);
        let user_curve = if user_points.iter().any(|p| p.value.is_some()) {
            Some(CurveSeries {
                label: USER_LABEL.to_string(),
                color: USER_COLOR.to_string(),
                points: user_points,
            })
        } else {
            None
        };

        ViewState {
            range,
            years,
            inputs: returns.clone(),
            user_curve,
            index_curves,
            comparison: compare(returns, &self.indices),
        }
    }
}
