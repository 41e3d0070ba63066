//! Clue Selection Engine.
//!
//! At visit start this picks which clues the visit will reveal: an iterative
//! greedy loop that keeps choosing high-quality clues (strong weight on the
//! patient's present needs, weak weight on absent ones) with a bounded
//! random tie-break, until every present need is confirmable or the
//! candidates run out.

use crate::catalog::{catalog_codes, Clue, NeedCode, NeedDefinition};
use crate::constants::{
    CONFIDENCE_COMPLETION_THRESHOLD, FALSE_POSITIVE_THRESHOLD, MAX_SELECTION_ITERATIONS,
    SELECTION_SHORTLIST_SIZE,
};
use crate::patient::Patient;
use rand::Rng;
use std::collections::BTreeMap;

/// Tuning knobs for clue selection. The ceiling and the false-positive
/// threshold are tuning constants, not contracts; callers may override them.
#[derive(Debug, Clone)]
pub struct SelectionConfig {
    /// A present need counts as confirmed at this confidence total.
    pub completion_threshold: u32,
    /// An absent need at or above this total is flagged as a
    /// false-positive risk.
    pub false_positive_threshold: u32,
    /// Each iteration picks uniformly among this many top-quality candidates.
    pub shortlist_size: usize,
    /// Safety ceiling on selection iterations.
    pub max_iterations: u32,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            completion_threshold: CONFIDENCE_COMPLETION_THRESHOLD,
            false_positive_threshold: FALSE_POSITIVE_THRESHOLD,
            shortlist_size: SELECTION_SHORTLIST_SIZE,
            max_iterations: MAX_SELECTION_ITERATIONS,
        }
    }
}

/// The visit's revealed clue set and accumulated confidence totals.
/// Produced fresh per visit and discarded when the visit ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClueSelectionResult {
    /// Clues in reveal order.
    pub selected_clues: Vec<Clue>,
    /// Confidence total per catalog code. Unbounded upward, never clamped,
    /// never decreasing while the selection runs.
    pub confidences: BTreeMap<NeedCode, u32>,
    /// Non-fatal diagnostics: under-confident present needs, false-positive
    /// risks on absent needs, iteration-ceiling hits.
    pub warnings: Vec<String>,
}

/// Selects the clues for a visit with the default configuration.
pub fn select_clues(
    patient: &Patient,
    clues: &[Clue],
    needs: &[NeedDefinition],
    rng: &mut impl Rng,
) -> ClueSelectionResult {
    select_clues_with_config(patient, clues, needs, &SelectionConfig::default(), rng)
}

/// Selects the clues for a visit.
///
/// Termination: success (all present needs at the completion threshold),
/// starvation (no remaining clue helps an under-threshold present need), or
/// the iteration ceiling. All three report through `warnings`; an
/// incomplete diagnosis is legitimate, not an error.
pub fn select_clues_with_config(
    patient: &Patient,
    clues: &[Clue],
    needs: &[NeedDefinition],
    config: &SelectionConfig,
    rng: &mut impl Rng,
) -> ClueSelectionResult {
    if !patient.has_needs() {
        return ClueSelectionResult {
            selected_clues: Vec::new(),
            confidences: BTreeMap::new(),
            warnings: vec!["No patient needs defined".to_string()],
        };
    }

    let present_codes: Vec<NeedCode> = patient.needs().iter().map(|n| n.code).collect();
    let all_codes = catalog_codes(needs);
    let absent_codes: Vec<NeedCode> = all_codes
        .iter()
        .copied()
        .filter(|c| !present_codes.contains(c))
        .collect();

    let mut confidences: BTreeMap<NeedCode, u32> =
        all_codes.iter().map(|&c| (c, 0)).collect();

    // Lookups go through `confidence_of`: a present code missing from the
    // catalog (a stale snapshot restored against a changed catalog) reads as
    // zero and falls out as an under-confidence warning, never a panic.
    let confidence_of = |confidences: &BTreeMap<NeedCode, u32>, code: NeedCode| {
        confidences.get(&code).copied().unwrap_or(0)
    };

    let all_present_satisfied = |confidences: &BTreeMap<NeedCode, u32>| {
        present_codes
            .iter()
            .all(|&c| confidence_of(confidences, c) >= config.completion_threshold)
    };

    let mut selected_clues: Vec<Clue> = Vec::new();
    let mut available: Vec<&Clue> = clues.iter().collect();
    let mut iterations = 0u32;

    while !all_present_satisfied(&confidences)
        && !available.is_empty()
        && iterations < config.max_iterations
    {
        iterations += 1;

        // Candidates must contribute to at least one present need that is
        // still below the threshold; a clue with zero weight on every
        // present code never qualifies.
        let mut scored: Vec<(usize, f64)> = available
            .iter()
            .enumerate()
            .filter(|(_, clue)| {
                present_codes.iter().any(|&code| {
                    confidence_of(&confidences, code) < config.completion_threshold
                        && clue.weight_for(code) > 0
                })
            })
            .map(|(idx, clue)| {
                let present_sum: u32 = present_codes.iter().map(|&c| clue.weight_for(c)).sum();
                let absent_sum: u32 = absent_codes.iter().map(|&c| clue.weight_for(c)).sum();
                // Favor clues with high present weight and low absent weight.
                let quality = present_sum as f64 / (absent_sum as f64 + 1.0);
                (idx, quality)
            })
            .collect();

        if scored.is_empty() {
            // Starvation: no helpful clues remain.
            break;
        }

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        let shortlist_len = scored.len().min(config.shortlist_size);
        let (chosen_idx, _) = scored[rng.gen_range(0..shortlist_len)];
        let chosen = available.remove(chosen_idx);

        // The full weight vector accumulates, absent codes included; that is
        // what makes false positives observable.
        for (&code, total) in confidences.iter_mut() {
            *total += chosen.weight_for(code);
        }
        selected_clues.push(chosen.clone());
    }

    let mut warnings = Vec::new();
    for &code in &present_codes {
        let total = confidence_of(&confidences, code);
        if total < config.completion_threshold {
            warnings.push(format!(
                "Need {} only reached {}/{} confidence",
                code, total, config.completion_threshold
            ));
        }
    }
    for &code in &absent_codes {
        if confidences[&code] >= config.false_positive_threshold {
            warnings.push(format!(
                "Absent need {} reached {} confidence (false positive risk)",
                code, confidences[&code]
            ));
        }
    }
    if iterations >= config.max_iterations {
        warnings.push("Maximum iterations reached in clue selection".to_string());
    }

    ClueSelectionResult {
        selected_clues,
        confidences,
        warnings,
    }
}
