//! Caller-owned diagnosis session.
//!
//! The presentation layer decides when and where clues appear; this module
//! owns everything else about an in-progress diagnosis: which clues have
//! been collected, the player-facing confidence meters, the question pool,
//! the pulse reading, and the final diagnosis record. One session exists
//! per visit and is dropped when the visit ends; there is no process-wide
//! selection state.

use crate::catalog::{Clue, DiagnosisMethod, NeedCode, NeedDefinition};
use crate::constants::{
    CONFIDENCE_COMPLETION_THRESHOLD, TOXICITY_STAGE_ACCUMULATING, TOXICITY_STAGE_DEEP,
    TOXICITY_STAGE_FAINT,
};
use crate::diagnosis::selection::ClueSelectionResult;
use crate::elements::Element;
use crate::error::ClinicError;
use crate::patient::{Need, Patient};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Coarse pulse reading shown to the player instead of raw numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToxicityStage {
    /// 微毒 — under a quarter of capacity.
    Faint,
    /// 積毒 — under half.
    Accumulating,
    /// 深毒 — under three quarters.
    Deep,
    /// 劇毒 — three quarters or more.
    Virulent,
    /// 未明 — pulse never taken.
    Undetermined,
}

/// Maps a toxicity level to its stage term.
pub fn toxicity_stage(level: f64, capacity: f64) -> ToxicityStage {
    let ratio = if capacity > 0.0 { level / capacity } else { 0.0 };
    if ratio < TOXICITY_STAGE_FAINT {
        ToxicityStage::Faint
    } else if ratio < TOXICITY_STAGE_ACCUMULATING {
        ToxicityStage::Accumulating
    } else if ratio < TOXICITY_STAGE_DEEP {
        ToxicityStage::Deep
    } else {
        ToxicityStage::Virulent
    }
}

/// What the system knows about the patient at diagnosis time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruthState {
    pub constitution: Option<Element>,
    pub needs: Vec<Need>,
    pub toxicity_level: f64,
    pub toxicity_capacity: Option<f64>,
}

/// What the player actually discovered; may be incomplete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosedState {
    pub constitution: Option<Element>,
    pub needs: Vec<Need>,
    pub toxicity: ToxicityStage,
}

/// The visit's diagnosis output: truth alongside the player's verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisRecord {
    pub truth: TruthState,
    pub diagnosed: DiagnosedState,
}

impl DiagnosisRecord {
    /// Serializes the record as a versioned, timestamped JSON document for
    /// external tooling.
    pub fn export_json(&self) -> serde_json::Result<String> {
        #[derive(Serialize)]
        struct ExportDocument<'a> {
            version: &'static str,
            build: &'static str,
            timestamp: String,
            diagnosis: &'a DiagnosisRecord,
        }

        serde_json::to_string_pretty(&ExportDocument {
            version: env!("CARGO_PKG_VERSION"),
            build: crate::build_info::BUILD_COMMIT,
            timestamp: chrono::Utc::now().to_rfc3339(),
            diagnosis: self,
        })
    }
}

/// An in-progress diagnosis for one visit.
#[derive(Debug, Clone)]
pub struct DiagnosisSession {
    selection: ClueSelectionResult,
    /// Player-facing accumulator, clamped at the completion threshold.
    collected: BTreeMap<NeedCode, u32>,
    collected_ids: BTreeSet<String>,
    observed_toxicity: Option<ToxicityStage>,
}

impl DiagnosisSession {
    pub fn new(selection: ClueSelectionResult, needs: &[NeedDefinition]) -> Self {
        Self {
            selection,
            collected: needs.iter().map(|n| (n.code, 0)).collect(),
            collected_ids: BTreeSet::new(),
            observed_toxicity: None,
        }
    }

    /// Clues the presentation layer scatters for the player to find
    /// (observation and listening), excluding already-collected ones.
    pub fn scattered_clues(&self) -> impl Iterator<Item = &Clue> {
        self.selection.selected_clues.iter().filter(move |c| {
            matches!(
                c.method,
                DiagnosisMethod::Observation | DiagnosisMethod::Listening
            ) && !self.collected_ids.contains(&c.id)
        })
    }

    /// Uncollected question clues remaining in the ask pool.
    pub fn remaining_questions(&self) -> usize {
        self.selection
            .selected_clues
            .iter()
            .filter(|c| c.method == DiagnosisMethod::Inquiry && !self.collected_ids.contains(&c.id))
            .count()
    }

    /// Collects a revealed clue, adding its weight vector to the player's
    /// confidence meters (clamped at the completion threshold).
    pub fn collect_clue(&mut self, clue_id: &str) -> Result<(), ClinicError> {
        if self.collected_ids.contains(clue_id) {
            return Err(ClinicError::InvalidState("clue already collected"));
        }
        let clue = self
            .selection
            .selected_clues
            .iter()
            .find(|c| c.id == clue_id)
            .ok_or(ClinicError::InvalidState(
                "clue was not selected for this visit",
            ))?
            .clone();

        for (&code, total) in self.collected.iter_mut() {
            *total = (*total + clue.weight_for(code)).min(CONFIDENCE_COMPLETION_THRESHOLD);
        }
        self.collected_ids.insert(clue.id);
        Ok(())
    }

    /// Asks the patient a question: picks one uncollected inquiry clue
    /// uniformly at random, collects it, and returns it for display.
    /// Returns `None` when the question pool is exhausted.
    pub fn ask_question(&mut self, rng: &mut impl Rng) -> Option<Clue> {
        let pool: Vec<Clue> = self
            .selection
            .selected_clues
            .iter()
            .filter(|c| c.method == DiagnosisMethod::Inquiry && !self.collected_ids.contains(&c.id))
            .cloned()
            .collect();
        if pool.is_empty() {
            return None;
        }
        let chosen = pool[rng.gen_range(0..pool.len())].clone();
        // Infallible: the clue came from the selection and is uncollected.
        self.collect_clue(&chosen.id).ok()?;
        Some(chosen)
    }

    /// Takes the pulse, revealing the toxicity stage. Idempotent.
    pub fn take_pulse(&mut self, patient: &Patient) -> ToxicityStage {
        let stage = match patient.toxicity_capacity() {
            Some(capacity) => toxicity_stage(patient.toxicity_level(), capacity),
            None => ToxicityStage::Undetermined,
        };
        self.observed_toxicity = Some(stage);
        stage
    }

    pub fn pulse_taken(&self) -> bool {
        self.observed_toxicity.is_some()
    }

    /// The player's current confidence meter for a code.
    pub fn confidence(&self, code: NeedCode) -> u32 {
        self.collected.get(&code).copied().unwrap_or(0)
    }

    /// True once every present need's meter is at the threshold.
    pub fn is_complete(&self, patient: &Patient) -> bool {
        patient
            .needs()
            .iter()
            .all(|n| self.confidence(n.code) >= CONFIDENCE_COMPLETION_THRESHOLD)
    }

    /// Closes the session with the automatically derived verdict: every
    /// code whose meter reached the threshold counts as diagnosed, with the
    /// main flag taken from the truth state and main needs listed first.
    pub fn finish(&self, patient: &Patient) -> DiagnosisRecord {
        let mut diagnosed_needs: Vec<Need> = self
            .collected
            .iter()
            .filter(|&(_, &meter)| meter >= CONFIDENCE_COMPLETION_THRESHOLD)
            .map(|(&code, _)| Need {
                code,
                is_main: patient
                    .needs()
                    .iter()
                    .any(|n| n.code == code && n.is_main),
            })
            .collect();
        diagnosed_needs.sort_by_key(|n| !n.is_main);

        self.build_record(patient, diagnosed_needs)
    }

    /// Closes the session with an explicit player verdict (one main need
    /// plus up to two secondaries), validating the same invariants the
    /// patient's own need set obeys.
    pub fn finish_with_selection(
        &self,
        patient: &Patient,
        main: NeedCode,
        secondary: &[NeedCode],
    ) -> Result<DiagnosisRecord, ClinicError> {
        if secondary.len() > crate::constants::MAX_SECONDARY_NEEDS {
            return Err(ClinicError::InvalidState(
                "verdict exceeds the secondary-need limit",
            ));
        }
        if secondary.contains(&main) {
            return Err(ClinicError::InvalidState(
                "verdict lists the main need as secondary",
            ));
        }
        let mut unique = secondary.to_vec();
        unique.sort();
        unique.dedup();
        if unique.len() != secondary.len() {
            return Err(ClinicError::InvalidState("verdict duplicates a need code"));
        }

        let mut diagnosed_needs = vec![Need {
            code: main,
            is_main: true,
        }];
        diagnosed_needs.extend(secondary.iter().map(|&code| Need {
            code,
            is_main: false,
        }));

        Ok(self.build_record(patient, diagnosed_needs))
    }

    fn build_record(&self, patient: &Patient, diagnosed_needs: Vec<Need>) -> DiagnosisRecord {
        DiagnosisRecord {
            truth: TruthState {
                constitution: patient.constitution(),
                needs: patient.needs().to_vec(),
                toxicity_level: patient.toxicity_level(),
                toxicity_capacity: patient.toxicity_capacity(),
            },
            diagnosed: DiagnosedState {
                // The constitution is revealed during the visit's first
                // interaction, so the verdict always carries it.
                constitution: patient.constitution(),
                needs: diagnosed_needs,
                toxicity: self.observed_toxicity.unwrap_or(ToxicityStage::Undetermined),
            },
        }
    }
}
