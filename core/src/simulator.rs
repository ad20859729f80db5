//! Scenario simulator: counterfactual re-scoring of retention actions.
//!
//! For each scenario, in catalog order:
//!   1. Clone the baseline (the baseline itself is never touched)
//!   2. Zero every indicator group the scenario touches
//!   3. Apply the scenario's overrides
//!   4. Recompute total charges if tenure or monthly charges changed
//!   5. Score the copy; a failure marks that scenario only
//!
//! Outcomes are then ranked per SimulatorConfig.

use crate::{
    encoder::DerivedCharges,
    error::{ChurnError, ChurnResult},
    schema::FeatureVector,
    scenario::{Override, Scenario},
    scoring::{checked_score, Scorer},
    types::Probability,
    vocabulary::{indicator_name, CategoryField, CategoryVocabulary},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ranking {
    /// Lowest resulting churn probability first.
    #[default]
    ProbabilityAscending,
    /// Largest reduction first.
    ReductionDescending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    #[serde(default)]
    pub ranking: Ranking,
    /// Report risk-increasing scenarios with a reduction of 0 instead of a
    /// negative number.
    #[serde(default = "default_clamp_negative")]
    pub clamp_negative: bool,
}

fn default_clamp_negative() -> bool {
    true
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            ranking: Ranking::default(),
            clamp_negative: default_clamp_negative(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScenarioOutcome {
    Scored {
        scenario:        String,
        new_probability: Probability,
        /// baseline − new, unclamped.
        delta:           f64,
        reduction:       f64,
    },
    Failed {
        scenario: String,
        reason:   String,
    },
}

impl ScenarioOutcome {
    pub fn scenario(&self) -> &str {
        match self {
            ScenarioOutcome::Scored { scenario, .. } | ScenarioOutcome::Failed { scenario, .. } => {
                scenario
            }
        }
    }

    pub fn new_probability(&self) -> Option<Probability> {
        match self {
            ScenarioOutcome::Scored { new_probability, .. } => Some(*new_probability),
            ScenarioOutcome::Failed { .. } => None,
        }
    }

    pub fn reduction(&self) -> Option<f64> {
        match self {
            ScenarioOutcome::Scored { reduction, .. } => Some(*reduction),
            ScenarioOutcome::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ScenarioOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub baseline_probability: Probability,
    pub outcomes:             Vec<ScenarioOutcome>,
}

/// The best-ranked scenario that actually lowers risk, if any.
pub fn recommendation(ranked: &[ScenarioOutcome]) -> Option<&ScenarioOutcome> {
    ranked
        .iter()
        .find(|o| matches!(o, ScenarioOutcome::Scored { delta, .. } if *delta > 0.0))
}

pub struct ScenarioSimulator {
    config:     SimulatorConfig,
    vocabulary: CategoryVocabulary,
    derived:    DerivedCharges,
}

impl ScenarioSimulator {
    pub fn new(config: SimulatorConfig, vocabulary: CategoryVocabulary, derived: DerivedCharges) -> Self {
        Self { config, vocabulary, derived }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Apply `scenario` to an independent copy of `baseline`.
    pub fn apply(&self, baseline: &FeatureVector, scenario: &Scenario) -> ChurnResult<FeatureVector> {
        let mut sim = baseline.clone();

        for group in self.touched_groups(scenario) {
            for name in group.indicators() {
                sim.set(&name, 0.0);
            }
        }

        let mut charges_changed = false;
        for o in &scenario.overrides {
            match o {
                Override::Set { feature, value } => {
                    if !sim.set(feature, *value) {
                        return Err(unknown_feature(scenario, feature));
                    }
                    charges_changed |= self.derived.is_input(feature);
                }
                Override::Scale { feature, factor } => {
                    if self.vocabulary.group_of(feature).is_some() {
                        return Err(invalid(scenario, format!("cannot scale indicator '{feature}'")));
                    }
                    let current = sim
                        .get(feature)
                        .ok_or_else(|| unknown_feature(scenario, feature))?;
                    sim.set(feature, current * factor);
                    charges_changed |= self.derived.is_input(feature);
                }
                Override::Select { field, value } => {
                    let group = self
                        .vocabulary
                        .field(field)
                        .ok_or_else(|| invalid(scenario, format!("unknown field '{field}'")))?;
                    if !group.allows(value) {
                        return Err(invalid(
                            scenario,
                            format!("'{value}' is not an allowed value for {field}"),
                        ));
                    }
                    // A false return is the dropped reference category: it
                    // has no column and the zeroed group already encodes it.
                    sim.set(&indicator_name(field, value), 1.0);
                }
            }
        }

        if charges_changed
            && sim.schema().contains(&self.derived.total_charges)
            && !self.derived.recompute(&mut sim)
        {
            return Err(invalid(
                scenario,
                format!(
                    "cannot recompute {} from {} and {}",
                    self.derived.total_charges, self.derived.tenure, self.derived.monthly_charges
                ),
            ));
        }
        Ok(sim)
    }

    /// Score the baseline, then every scenario against it.
    pub fn simulate(
        &self,
        baseline: &FeatureVector,
        scorer: &dyn Scorer,
        scenarios: &[Scenario],
    ) -> ChurnResult<SimulationReport> {
        let baseline_probability = checked_score(scorer, baseline)?;
        let outcomes = self.simulate_from(baseline, baseline_probability, scorer, scenarios);
        Ok(SimulationReport { baseline_probability, outcomes })
    }

    /// Score every scenario against an already-scored baseline. A failing
    /// scenario is reported as `Failed` and the rest still run.
    pub fn simulate_from(
        &self,
        baseline: &FeatureVector,
        baseline_probability: Probability,
        scorer: &dyn Scorer,
        scenarios: &[Scenario],
    ) -> Vec<ScenarioOutcome> {
        let mut outcomes: Vec<ScenarioOutcome> = scenarios
            .iter()
            .map(|scenario| {
                let result = self
                    .apply(baseline, scenario)
                    .and_then(|sim| checked_score(scorer, &sim));
                match result {
                    Ok(new_probability) => {
                        let delta = baseline_probability - new_probability;
                        let reduction = if self.config.clamp_negative { delta.max(0.0) } else { delta };
                        log::debug!(
                            "scenario '{}': p={new_probability:.4} delta={delta:+.4}",
                            scenario.name
                        );
                        ScenarioOutcome::Scored {
                            scenario: scenario.name.clone(),
                            new_probability,
                            delta,
                            reduction,
                        }
                    }
                    Err(e) => {
                        log::warn!("scenario '{}' failed: {e}", scenario.name);
                        ScenarioOutcome::Failed {
                            scenario: scenario.name.clone(),
                            reason:   e.to_string(),
                        }
                    }
                }
            })
            .collect();

        self.rank(&mut outcomes);
        outcomes
    }

    /// Stable sort: scored outcomes per the configured ranking, failures
    /// last in catalog order.
    pub fn rank(&self, outcomes: &mut [ScenarioOutcome]) {
        let ranking = self.config.ranking;
        outcomes.sort_by(|a, b| match (a, b) {
            (
                ScenarioOutcome::Scored { new_probability: pa, reduction: ra, .. },
                ScenarioOutcome::Scored { new_probability: pb, reduction: rb, .. },
            ) => match ranking {
                Ranking::ProbabilityAscending => pa.total_cmp(pb),
                Ranking::ReductionDescending => rb.total_cmp(ra),
            },
            (ScenarioOutcome::Scored { .. }, ScenarioOutcome::Failed { .. }) => std::cmp::Ordering::Less,
            (ScenarioOutcome::Failed { .. }, ScenarioOutcome::Scored { .. }) => std::cmp::Ordering::Greater,
            (ScenarioOutcome::Failed { .. }, ScenarioOutcome::Failed { .. }) => std::cmp::Ordering::Equal,
        });
    }

    fn touched_groups(&self, scenario: &Scenario) -> Vec<&CategoryField> {
        let mut groups: Vec<&CategoryField> = Vec::new();
        for o in &scenario.overrides {
            let group = match o {
                Override::Set { feature, .. } | Override::Scale { feature, .. } => {
                    self.vocabulary.group_of(feature)
                }
                Override::Select { field, .. } => self.vocabulary.field(field),
            };
            if let Some(g) = group {
                if !groups.iter().any(|seen| seen.field == g.field) {
                    groups.push(g);
                }
            }
        }
        groups
    }
}

fn unknown_feature(scenario: &Scenario, feature: &str) -> ChurnError {
    invalid(scenario, format!("unknown feature '{feature}'"))
}

fn invalid(scenario: &Scenario, reason: String) -> ChurnError {
    ChurnError::InvalidScenario { scenario: scenario.name.clone(), reason }
}
