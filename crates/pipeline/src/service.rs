//! Decision service: the end-to-end request path

use crate::artifacts::{Artifacts, PermutationImportance};
use crate::config::PipelineConfig;
use crate::explanation::ExplanationContext;
use crate::PipelineError;
use decision_engine::{
    decide_by_argmax, decide_by_cost, evaluate_realized, local_attribution, ArgmaxDecision,
    CostDecision, RealizedCost, SurvivalOracle,
};
use feature_engine::{
    attach_metadata, build_windows, select_features, FeatureMatrix, SelectedFeatures,
    StatisticalExtractor, WindowFeatureExtractor,
};
use preprocessing::{difference, interpolate};
use readout::{ReadoutTable, Validator, VehicleId};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How strictly a request's readout table is checked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// Single uploaded readout, row count enforced when configured
    Interactive,
    /// Any number of rows and vehicles
    Batch,
}

impl RequestMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMode::Interactive => "interactive",
            RequestMode::Batch => "batch",
        }
    }
}

/// Both decisions for one window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowDecision {
    pub window_id: String,
    pub vehicle_id: Option<VehicleId>,
    /// Anchor time of the window
    pub time_step: Option<f64>,
    pub by_cost: CostDecision,
    pub by_argmax: ArgmaxDecision,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionReport {
    pub decisions: Vec<RowDecision>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<ExplanationContext>,
}

/// Immutable request processor built once at startup.
///
/// Holds the configuration, the shared survival oracle and the selected
/// feature set. Every request works on its own data only, so one service
/// can serve concurrent callers by reference.
pub struct DecisionService {
    config: PipelineConfig,
    oracle: Arc<dyn SurvivalOracle>,
    selected: SelectedFeatures,
    importances: Option<Vec<PermutationImportance>>,
    extractor: StatisticalExtractor,
}

impl DecisionService {
    pub fn new(
        config: PipelineConfig,
        oracle: Arc<dyn SurvivalOracle>,
        selected: SelectedFeatures,
        importances: Option<Vec<PermutationImportance>>,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        let extractor = StatisticalExtractor::new(
            config.extraction.statistics.clone(),
            config.extraction.workers,
        )?;
        Ok(Self {
            config,
            oracle,
            selected,
            importances,
            extractor,
        })
    }

    /// Load every configured artifact and build the service
    pub fn from_config(config: PipelineConfig) -> Result<Self, PipelineError> {
        let artifacts = Artifacts::load(&config.artifacts)?;
        info!(
            "Decision service ready: {} selected features, importances {}",
            artifacts.selected_features.len(),
            if artifacts.importances.is_some() {
                "loaded"
            } else {
                "not configured"
            }
        );
        Self::new(
            config,
            Arc::new(artifacts.model),
            artifacts.selected_features,
            artifacts.importances,
        )
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn selected_features(&self) -> &SelectedFeatures {
        &self.selected
    }

    /// Readout table to selected feature matrix, one row per window
    pub fn features(
        &self,
        table: &ReadoutTable,
        mode: RequestMode,
    ) -> Result<FeatureMatrix, PipelineError> {
        self.features_with_sizes(table, mode, &self.config.windowing.window_sizes)
    }

    fn features_with_sizes(
        &self,
        table: &ReadoutTable,
        mode: RequestMode,
        window_sizes: &[f64],
    ) -> Result<FeatureMatrix, PipelineError> {
        let validator = match mode {
            RequestMode::Interactive if self.config.input.single_readout => {
                Validator::single_readout()
            }
            _ => Validator::new(),
        };
        validator.validate(table)?;

        let table = difference(&interpolate(table));
        let windows = build_windows(&table, window_sizes)?;

        let grouped = windows.windows();
        let fallbacks = grouped.iter().filter(|w| w.is_fallback()).count();
        metrics::counter!("rul_windows_total").increment(grouped.len() as u64);
        metrics::counter!("rul_fallback_windows_total").increment(fallbacks as u64);
        debug!("{} windows, {} from the fallback path", grouped.len(), fallbacks);

        if windows.is_empty() {
            warn!("No windows formed, returning an empty feature matrix");
            return Ok(FeatureMatrix::new(
                self.selected.names().map(String::from).collect(),
            ));
        }

        let extracted = attach_metadata(self.extractor.extract(&windows)?, &windows);
        Ok(select_features(&extracted, &self.selected)?)
    }

    /// Run the full pipeline and decide every window both ways.
    ///
    /// With `explain`, the report also carries the explanation context of
    /// the first window, including its local attribution against the
    /// request's own feature rows.
    pub fn decide(
        &self,
        table: &ReadoutTable,
        mode: RequestMode,
        explain: bool,
    ) -> Result<DecisionReport, PipelineError> {
        metrics::counter!("rul_requests_total", "mode" => mode.as_str()).increment(1);

        let features = self.features(table, mode)?;
        let taus = &self.config.decision.taus;
        let cost = &self.config.decision.cost;

        let by_cost = decide_by_cost(self.oracle.as_ref(), &features, taus, cost)?;
        let by_argmax = decide_by_argmax(self.oracle.as_ref(), &features, taus)?;
        for d in &by_cost {
            metrics::histogram!("rul_expected_cost").record(d.expected_cost);
        }

        let explanation = match (explain, by_cost.first()) {
            (true, Some(first)) => Some(self.explain(&features, first)?),
            (true, None) => {
                warn!("Nothing to explain, no decisions were made");
                None
            }
            (false, _) => None,
        };

        let decisions: Vec<RowDecision> = by_cost
            .into_iter()
            .zip(by_argmax)
            .enumerate()
            .map(|(i, (by_cost, by_argmax))| {
                let meta = features.metadata()[i];
                RowDecision {
                    window_id: features.ids()[i].clone(),
                    vehicle_id: meta.map(|m| m.vehicle_id),
                    time_step: meta.map(|m| m.time_step),
                    by_cost,
                    by_argmax,
                }
            })
            .collect();

        info!(
            "Decided {} windows in {} mode",
            decisions.len(),
            mode.as_str()
        );
        Ok(DecisionReport {
            decisions,
            explanation,
        })
    }

    fn explain(
        &self,
        features: &FeatureMatrix,
        decision: &CostDecision,
    ) -> Result<ExplanationContext, PipelineError> {
        let taus = &self.config.decision.taus;
        let attribution = match features.row_matrix(0) {
            Some(instance) => local_attribution(self.oracle.as_ref(), features, &instance, taus)?,
            None => Vec::new(),
        };
        ExplanationContext::for_first_row(
            features,
            decision,
            *taus,
            self.config.decision.cost,
            self.importances.as_deref(),
            attribution,
        )
    }

    /// Score cost decisions against per-vehicle ground truth.
    ///
    /// Each labelled vehicle is judged by the cost decision at its latest
    /// anchor for the first configured window size. Vehicles without a label
    /// are ignored.
    pub fn evaluate(
        &self,
        table: &ReadoutTable,
        labels: &BTreeMap<VehicleId, usize>,
    ) -> Result<RealizedCost, PipelineError> {
        metrics::counter!("rul_requests_total", "mode" => "evaluate").increment(1);

        let size = *self
            .config
            .windowing
            .window_sizes
            .first()
            .ok_or_else(|| PipelineError::InvalidConfig("no window size configured".into()))?;
        let features = self.features_with_sizes(table, RequestMode::Batch, &[size])?;
        let decisions = decide_by_cost(
            self.oracle.as_ref(),
            &features,
            &self.config.decision.taus,
            &self.config.decision.cost,
        )?;

        let mut latest: BTreeMap<VehicleId, (f64, usize)> = BTreeMap::new();
        for (row, meta) in features.metadata().iter().enumerate() {
            let Some(meta) = meta else { continue };
            let entry = latest.entry(meta.vehicle_id).or_insert((meta.time_step, row));
            if meta.time_step >= entry.0 {
                *entry = (meta.time_step, row);
            }
        }

        let mut truth = Vec::with_capacity(labels.len());
        let mut predicted = Vec::with_capacity(labels.len());
        for (&vehicle_id, &label) in labels {
            let &(_, row) = latest
                .get(&vehicle_id)
                .ok_or(PipelineError::UndecidedVehicle(vehicle_id))?;
            truth.push(label);
            predicted.push(decisions[row].class);
        }

        let unlabelled = latest.keys().filter(|v| !labels.contains_key(v)).count();
        if unlabelled > 0 {
            debug!("Skipping {} vehicles without a label", unlabelled);
        }

        Ok(evaluate_realized(
            &truth,
            &predicted,
            &self.config.decision.cost,
        )?)
    }
}
