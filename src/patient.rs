//! Patient entity: need lifecycle, toxicity accumulation, and snapshots.

use crate::catalog::{catalog_codes, NeedCode, NeedDefinition};
use crate::constants::{
    MAX_SECONDARY_NEEDS, SECONDARY_CHANGE_CHANCE, SECONDARY_REPLACE_CHANCE, SNAPSHOT_VERSION,
    TOXICITY_CAPACITY_MAX, TOXICITY_CAPACITY_MIN,
};
use crate::elements::Element;
use crate::error::ClinicError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default pool of patient names used on first-visit identity assignment.
pub const NAME_POOL: [&str; 12] = [
    "李玄真", "王守一", "張子虛", "陳養和", "周清遠", "劉觀明",
    "趙靜修", "黃元和", "吳養生", "徐太和", "沈抱樸", "何存真",
];

/// Satisfaction verdict from the previous completed treatment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Satisfaction {
    None,
    Low,
    Medium,
    High,
}

/// A need attached to a patient. Exactly one need per patient is main.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Need {
    pub code: NeedCode,
    pub is_main: bool,
}

/// Secondary-need changes produced by a between-visit update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NeedChangeReport {
    pub removed: Vec<NeedCode>,
    pub added: Vec<NeedCode>,
}

impl NeedChangeReport {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }
}

/// The single mutable entity of the simulation. Fields are private; the
/// visit layer drives mutation through the lifecycle methods and display
/// code reads through the accessors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    id: Uuid,
    name: Option<String>,
    constitution: Option<Element>,
    needs: Vec<Need>,
    primary_need_code: Option<NeedCode>,
    toxicity_capacity: Option<f64>,
    toxicity_level: f64,
    alive: bool,
    previous_satisfaction: Satisfaction,
}

impl Default for Patient {
    fn default() -> Self {
        Self::new()
    }
}

impl Patient {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            name: None,
            constitution: None,
            needs: Vec::new(),
            primary_need_code: None,
            toxicity_capacity: None,
            toxicity_level: 0.0,
            alive: true,
            previous_satisfaction: Satisfaction::None,
        }
    }

    // --- Read-only status accessors ---

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn constitution(&self) -> Option<Element> {
        self.constitution
    }

    pub fn needs(&self) -> &[Need] {
        &self.needs
    }

    pub fn has_needs(&self) -> bool {
        !self.needs.is_empty()
    }

    pub fn primary_need_code(&self) -> Option<NeedCode> {
        self.primary_need_code
    }

    pub fn toxicity_capacity(&self) -> Option<f64> {
        self.toxicity_capacity
    }

    pub fn toxicity_level(&self) -> f64 {
        self.toxicity_level
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn previous_satisfaction(&self) -> Satisfaction {
        self.previous_satisfaction
    }

    // --- Lifecycle ---

    /// First-visit identity assignment: picks a name from the pool and rolls
    /// the permanent toxicity capacity. No-op when already named.
    pub fn assign_identity(&mut self, name_pool: &[&str], rng: &mut impl Rng) {
        if self.name.is_some() || name_pool.is_empty() {
            return;
        }
        let idx = rng.gen_range(0..name_pool.len());
        self.name = Some(name_pool[idx].to_string());
        if self.toxicity_capacity.is_none() {
            self.toxicity_capacity =
                Some(rng.gen_range(TOXICITY_CAPACITY_MIN..=TOXICITY_CAPACITY_MAX) as f64);
        }
    }

    /// Assigns a uniformly random constitution on the first in-visit
    /// interaction. Re-assignment is a documented benign no-op.
    pub fn assign_constitution(&mut self, rng: &mut impl Rng) -> Element {
        if let Some(existing) = self.constitution {
            return existing;
        }
        let element = Element::random(rng);
        self.constitution = Some(element);
        element
    }

    /// First-visit need assignment: one uniformly drawn primary (fixed for
    /// the patient's lifetime) plus 0-2 distinct secondaries drawn without
    /// replacement from the remaining catalog codes.
    pub fn initialize_needs(
        &mut self,
        catalog: &[NeedDefinition],
        rng: &mut impl Rng,
    ) -> Result<&[Need], ClinicError> {
        if !self.needs.is_empty() {
            return Err(ClinicError::InvalidState(
                "needs already initialized for this patient",
            ));
        }
        if catalog.is_empty() {
            return Err(ClinicError::InvalidState("need catalog is empty"));
        }

        let all_codes = catalog_codes(catalog);
        let primary = all_codes[rng.gen_range(0..all_codes.len())];
        self.primary_need_code = Some(primary);
        self.needs.push(Need {
            code: primary,
            is_main: true,
        });

        let num_secondary = rng.gen_range(0..=MAX_SECONDARY_NEEDS);
        let mut available: Vec<NeedCode> =
            all_codes.into_iter().filter(|&c| c != primary).collect();
        for _ in 0..num_secondary {
            if available.is_empty() {
                break;
            }
            let code = available.remove(rng.gen_range(0..available.len()));
            self.needs.push(Need {
                code,
                is_main: false,
            });
        }

        Ok(&self.needs)
    }

    /// Between-visit secondary churn. Each secondary is independently
    /// flagged for removal with probability 0.2; each flagged need is then
    /// replaced with probability 0.5 by a uniform draw from codes not
    /// currently held, otherwise dropped outright. The primary is never
    /// touched.
    ///
    /// Returns `None` when nothing changed.
    pub fn update_secondary_needs(
        &mut self,
        catalog: &[NeedDefinition],
        rng: &mut impl Rng,
    ) -> Result<Option<NeedChangeReport>, ClinicError> {
        let primary = self
            .primary_need_code
            .ok_or(ClinicError::InvalidState("needs not initialized yet"))?;

        let mut report = NeedChangeReport::default();
        let mut kept: Vec<Need> = Vec::new();
        let mut flagged: Vec<NeedCode> = Vec::new();

        for need in self.needs.iter().filter(|n| !n.is_main) {
            if rng.gen::<f64>() < SECONDARY_CHANGE_CHANCE {
                flagged.push(need.code);
            } else {
                kept.push(*need);
            }
        }

        // Replacement pool: catalog codes minus the primary and the kept
        // secondaries, drawn without replacement.
        let mut available: Vec<NeedCode> = catalog_codes(catalog)
            .into_iter()
            .filter(|&c| c != primary && !kept.iter().any(|n| n.code == c))
            .collect();

        for removed in flagged {
            report.removed.push(removed);
            if !available.is_empty() && rng.gen::<f64>() < SECONDARY_REPLACE_CHANCE {
                let code = available.remove(rng.gen_range(0..available.len()));
                kept.push(Need {
                    code,
                    is_main: false,
                });
                report.added.push(code);
            }
        }

        self.needs = Vec::with_capacity(1 + kept.len());
        self.needs.push(Need {
            code: primary,
            is_main: true,
        });
        self.needs.extend(kept);

        debug_assert!(self.needs.iter().filter(|n| !n.is_main).count() <= MAX_SECONDARY_NEEDS);

        Ok(if report.is_empty() {
            None
        } else {
            Some(report)
        })
    }

    /// Adds to the toxicity level; exceeding the capacity kills the patient
    /// permanently. Intentionally not guarded against post-death calls (the
    /// visit layer stops routing treatments once the patient is dead).
    pub fn increase_toxicity(&mut self, delta: f64) {
        debug_assert!(delta >= 0.0);
        self.toxicity_level += delta;
        if let Some(capacity) = self.toxicity_capacity {
            if self.toxicity_level > capacity {
                self.alive = false;
            }
        }
    }

    pub(crate) fn set_satisfaction(&mut self, satisfaction: Satisfaction) {
        self.previous_satisfaction = satisfaction;
    }

    /// Admin reset to a fresh patient (new identity, everything cleared).
    pub fn reset(&mut self) {
        *self = Patient::new();
    }

    // --- Snapshots ---

    /// Produces the persistable snapshot of the patient's truth state.
    pub fn snapshot(&self) -> PatientSnapshot {
        PatientSnapshot {
            version: SNAPSHOT_VERSION,
            id: self.id,
            name: self.name.clone(),
            constitution: self.constitution,
            needs: self.needs.clone(),
            primary_need_code: self.primary_need_code,
            toxicity_capacity: self.toxicity_capacity,
            toxicity_level: self.toxicity_level,
            alive: self.alive,
            previous_satisfaction: self.previous_satisfaction,
            saved_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Rebuilds a patient from a snapshot. Restore always lands between
    /// visits; visit-scoped state is never persisted.
    pub fn from_snapshot(snapshot: PatientSnapshot) -> Self {
        Self {
            id: snapshot.id,
            name: snapshot.name,
            constitution: snapshot.constitution,
            needs: snapshot.needs,
            primary_need_code: snapshot.primary_need_code,
            toxicity_capacity: snapshot.toxicity_capacity,
            toxicity_level: snapshot.toxicity_level,
            alive: snapshot.alive,
            previous_satisfaction: snapshot.previous_satisfaction,
        }
    }
}

/// Plain serializable form of the patient used by the save manager and by
/// tests that need a patient in a known state. The persistence format that
/// wraps this (file layout, checksums) lives in `save_manager`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientSnapshot {
    pub version: u32,
    pub id: Uuid,
    pub name: Option<String>,
    pub constitution: Option<Element>,
    pub needs: Vec<Need>,
    pub primary_need_code: Option<NeedCode>,
    pub toxicity_capacity: Option<f64>,
    pub toxicity_level: f64,
    pub alive: bool,
    pub previous_satisfaction: Satisfaction,
    pub saved_at: i64,
}
