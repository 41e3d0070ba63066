//! Treatment Scoring Engine.
//!
//! Converts a batch of administered remedies into a toxicity delta
//! (elemental-weakness amplified) and a satisfaction grade
//! (elemental-benefit and quality graded), mutating the patient.

use crate::catalog::NeedCode;
use crate::constants::{
    BENEFIT_MULTIPLIER, HIGH_SATISFACTION_RATIO, LOW_SATISFACTION_RATIO,
    MAX_REMEDIES_PER_TREATMENT, PRIMARY_NEED_WEIGHT, SECONDARY_NEED_WEIGHT, WEAKNESS_MULTIPLIER,
};
use crate::elements::Element;
use crate::error::ClinicError;
use crate::patient::{Patient, Satisfaction};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Remedy quality grade, ranked U > S > A > B > C.
/// Declared worst-first so the derived ordering matches the rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QualityGrade {
    C = 0,
    B = 1,
    A = 2,
    S = 3,
    U = 4,
}

impl QualityGrade {
    pub const WORST: QualityGrade = QualityGrade::C;

    /// Satisfaction multiplier for this grade. B is the neutral baseline.
    pub fn multiplier(&self) -> f64 {
        match self {
            QualityGrade::U => 1.5,
            QualityGrade::S => 1.3,
            QualityGrade::A => 1.15,
            QualityGrade::B => 1.0,
            QualityGrade::C => 0.85,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            QualityGrade::U => "U",
            QualityGrade::S => "S",
            QualityGrade::A => "A",
            QualityGrade::B => "B",
            QualityGrade::C => "C",
        }
    }

    pub fn from_name(s: &str) -> Option<QualityGrade> {
        match s {
            "U" => Some(QualityGrade::U),
            "S" => Some(QualityGrade::S),
            "A" => Some(QualityGrade::A),
            "B" => Some(QualityGrade::B),
            "C" => Some(QualityGrade::C),
            _ => None,
        }
    }
}

impl fmt::Display for QualityGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A validated, complete remedy descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Remedy {
    /// Need codes this remedy addresses. Never empty.
    pub addressed_needs: BTreeSet<NeedCode>,
    /// Base toxicity, non-negative.
    pub toxicity: f64,
    /// Elemental affinity; `None` for neutral remedies.
    pub affinity: Option<Element>,
    pub quality: QualityGrade,
}

/// A possibly-incomplete remedy as entered at the preparation bench.
/// The quality selector defaults to B when left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemedyDraft {
    pub addressed_needs: Vec<NeedCode>,
    pub toxicity: Option<f64>,
    pub affinity: Option<Element>,
    pub quality: Option<QualityGrade>,
}

impl RemedyDraft {
    /// True when any field beyond the defaulted quality has been filled in.
    pub fn has_data(&self) -> bool {
        !self.addressed_needs.is_empty() || self.toxicity.is_some() || self.affinity.is_some()
    }

    /// Validates the draft into a complete remedy: at least one addressed
    /// need and a non-negative toxicity value.
    pub fn complete(&self) -> Option<Remedy> {
        if self.addressed_needs.is_empty() {
            return None;
        }
        let toxicity = self.toxicity.filter(|t| *t >= 0.0)?;
        Some(Remedy {
            addressed_needs: self.addressed_needs.iter().copied().collect(),
            toxicity,
            affinity: self.affinity,
            quality: self.quality.unwrap_or(QualityGrade::B),
        })
    }
}

/// Filters a draft batch down to its complete remedies. Drafts with no data
/// entered are skipped silently; drafts with partial data are reported by
/// index so the caller can surface them.
pub fn collect_complete(drafts: &[RemedyDraft]) -> (Vec<Remedy>, Vec<usize>) {
    let mut complete = Vec::new();
    let mut incomplete = Vec::new();
    for (idx, draft) in drafts.iter().enumerate() {
        if !draft.has_data() {
            continue;
        }
        match draft.complete() {
            Some(remedy) => complete.push(remedy),
            None => incomplete.push(idx),
        }
    }
    (complete, incomplete)
}

/// Outcome of one completed treatment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreatmentOutcome {
    pub toxicity_delta: f64,
    /// `None` when the treatment killed the patient before satisfaction
    /// could be assessed.
    pub satisfaction: Option<Satisfaction>,
    pub fatal: bool,
}

/// Scores a remedy batch against the patient's truth state, mutating
/// toxicity, satisfaction, and the alive flag.
///
/// The toxicity step always runs first; if the patient dies from it the
/// outcome is terminal and `previous_satisfaction` is left untouched.
pub fn score(patient: &mut Patient, remedies: &[Remedy]) -> Result<TreatmentOutcome, ClinicError> {
    if remedies.is_empty() {
        return Err(ClinicError::DataIncomplete);
    }
    if remedies.len() > MAX_REMEDIES_PER_TREATMENT {
        return Err(ClinicError::InvalidState(
            "remedy batch exceeds the per-treatment limit",
        ));
    }
    let constitution = patient
        .constitution()
        .ok_or(ClinicError::InvalidState("constitution not assigned"))?;

    // Toxicity step: remedies matching the element that weakens the
    // patient's constitution are amplified.
    let weakness = constitution.weakened_by();
    let toxicity_delta: f64 = remedies
        .iter()
        .map(|r| {
            if r.affinity == Some(weakness) {
                r.toxicity * WEAKNESS_MULTIPLIER
            } else {
                r.toxicity
            }
        })
        .sum();
    patient.increase_toxicity(toxicity_delta);

    if !patient.is_alive() {
        return Ok(TreatmentOutcome {
            toxicity_delta,
            satisfaction: None,
            fatal: true,
        });
    }

    // Satisfaction step, against the truth needs (never the diagnosed view).
    let benefit = constitution.benefited_by();
    let mut max_score = 0u32;
    let mut achieved_score = 0.0f64;
    let mut main_met_quality: Option<QualityGrade> = None;

    for need in patient.needs() {
        let base_weight = if need.is_main {
            PRIMARY_NEED_WEIGHT
        } else {
            SECONDARY_NEED_WEIGHT
        };
        max_score += base_weight;

        let meeting: Vec<&Remedy> = remedies
            .iter()
            .filter(|r| r.addressed_needs.contains(&need.code))
            .collect();
        if meeting.is_empty() {
            continue;
        }

        let has_bonus = meeting.iter().any(|r| r.affinity == Some(benefit));
        let best_quality = meeting
            .iter()
            .map(|r| r.quality)
            .max()
            .unwrap_or(QualityGrade::B);

        let mut need_score = base_weight as f64;
        if has_bonus {
            need_score *= BENEFIT_MULTIPLIER;
        }
        need_score *= best_quality.multiplier();
        achieved_score += need_score;

        if need.is_main {
            main_met_quality = Some(best_quality);
        }
    }

    let fulfillment_ratio = if max_score > 0 {
        achieved_score / max_score as f64
    } else {
        0.0
    };

    let mut satisfaction = if fulfillment_ratio >= HIGH_SATISFACTION_RATIO {
        Satisfaction::High
    } else if fulfillment_ratio < LOW_SATISFACTION_RATIO {
        Satisfaction::Low
    } else {
        Satisfaction::Medium
    };

    // Category cap: a worst-grade remedy on the main need can never leave a
    // High impression, whatever the raw ratio says.
    if main_met_quality == Some(QualityGrade::WORST) && satisfaction == Satisfaction::High {
        satisfaction = Satisfaction::Medium;
    }

    patient.set_satisfaction(satisfaction);

    Ok(TreatmentOutcome {
        toxicity_delta,
        satisfaction: Some(satisfaction),
        fatal: false,
    })
}
