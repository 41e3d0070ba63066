//! Visit lifecycle state machine.
//!
//! A `ClinicSession` owns one patient and walks each visit through
//! arrival, constitution reading, diagnosis, treatment, and departure.
//! Per-visit artifacts (the clue selection and the diagnosis record)
//! live only for the duration of the visit.

use crate::catalog::{Clue, NeedDefinition};
use crate::diagnosis::{select_clues, ClueSelectionResult, DiagnosisRecord};
use crate::elements::Element;
use crate::error::ClinicError;
use crate::patient::{NeedChangeReport, Patient, PatientSnapshot};
use crate::treatment::{self, Remedy, TreatmentOutcome};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Where the session currently sits in the visit cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisitState {
    /// No patient in the clinic.
    NoVisit,
    /// Patient arrived but their constitution has not been read yet.
    AwaitingConstitution,
    /// Examination and remedy preparation are open.
    Diagnosing,
    /// A treatment has been scored; the visit can be closed.
    Treated,
}

/// What the caller learns when a visit opens.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitReport {
    pub first_visit: bool,
    /// Secondary-need churn on a return visit; `None` on first visits and
    /// unchanged returns.
    pub need_changes: Option<NeedChangeReport>,
    /// Greeting line tied to the patient's primary need.
    pub greeting: Option<String>,
}

/// One patient's ongoing relationship with the clinic.
#[derive(Debug)]
pub struct ClinicSession {
    patient: Patient,
    state: VisitState,
    selection: Option<ClueSelectionResult>,
    diagnosis: Option<DiagnosisRecord>,
}

impl ClinicSession {
    pub fn new() -> Self {
        ClinicSession {
            patient: Patient::new(),
            state: VisitState::NoVisit,
            selection: None,
            diagnosis: None,
        }
    }

    /// Resumes a session from a persisted patient snapshot. Visits always
    /// restart from the closed state; per-visit artifacts are not persisted.
    pub fn from_snapshot(snapshot: PatientSnapshot) -> Self {
        ClinicSession {
            patient: Patient::from_snapshot(snapshot),
            state: VisitState::NoVisit,
            selection: None,
            diagnosis: None,
        }
    }

    pub fn patient(&self) -> &Patient {
        &self.patient
    }

    pub fn state(&self) -> VisitState {
        self.state
    }

    pub fn diagnosis(&self) -> Option<&DiagnosisRecord> {
        self.diagnosis.as_ref()
    }

    /// Snapshot for persistence. Only valid between visits so that no
    /// mid-visit truth state is frozen.
    pub fn snapshot(&self) -> Result<PatientSnapshot, ClinicError> {
        if self.state != VisitState::NoVisit {
            return Err(ClinicError::InvalidState(
                "cannot snapshot during an open visit",
            ));
        }
        Ok(self.patient.snapshot())
    }

    /// Opens a visit. On the first visit the patient receives an identity
    /// and a full need set; on return visits the secondary needs may churn.
    /// The visit's clue selection is rolled here, before any examination.
    pub fn begin_visit(
        &mut self,
        needs: &[NeedDefinition],
        clues: &[Clue],
        name_pool: &[&str],
        rng: &mut impl Rng,
    ) -> Result<VisitReport, ClinicError> {
        if self.state != VisitState::NoVisit {
            return Err(ClinicError::InvalidState("a visit is already open"));
        }
        if !self.patient.is_alive() {
            return Err(ClinicError::InvalidState("patient is dead"));
        }

        let first_visit = !self.patient.has_needs();
        let need_changes = if first_visit {
            self.patient.assign_identity(name_pool, rng);
            self.patient.initialize_needs(needs, rng)?;
            None
        } else {
            self.patient.update_secondary_needs(needs, rng)?
        };

        self.selection = Some(select_clues(&self.patient, clues, needs, rng));
        self.diagnosis = None;
        self.state = if self.patient.constitution().is_none() {
            VisitState::AwaitingConstitution
        } else {
            VisitState::Diagnosing
        };

        let greeting = self.patient.primary_need_code().and_then(|code| {
            needs
                .iter()
                .find(|def| def.code == code)
                .map(|def| def.greeting_text.clone())
        });

        Ok(VisitReport {
            first_visit,
            need_changes,
            greeting,
        })
    }

    /// Reads the patient's constitution. Rolls once ever; on later calls the
    /// existing element is returned unchanged.
    pub fn assign_constitution(&mut self, rng: &mut impl Rng) -> Result<Element, ClinicError> {
        match self.state {
            VisitState::AwaitingConstitution | VisitState::Diagnosing => {
                let element = self.patient.assign_constitution(rng);
                self.state = VisitState::Diagnosing;
                Ok(element)
            }
            _ => Err(ClinicError::InvalidState(
                "constitution can only be read during a visit",
            )),
        }
    }

    /// Hands the visit's clue selection to the examination phase. Yields
    /// exactly once per visit.
    pub fn take_selection(&mut self) -> Result<ClueSelectionResult, ClinicError> {
        if self.state != VisitState::Diagnosing {
            return Err(ClinicError::InvalidState("examination is not open"));
        }
        self.selection
            .take()
            .ok_or(ClinicError::InvalidState("clue selection already taken"))
    }

    /// Files the finished diagnosis. Required before treatment.
    pub fn record_diagnosis(&mut self, record: DiagnosisRecord) -> Result<(), ClinicError> {
        if self.state != VisitState::Diagnosing {
            return Err(ClinicError::InvalidState("examination is not open"));
        }
        self.diagnosis = Some(record);
        Ok(())
    }

    /// Scores a remedy batch against the patient and closes the treatment
    /// phase. A fatal outcome still lands in the treated state so the visit
    /// can be closed out.
    pub fn treat(&mut self, remedies: &[Remedy]) -> Result<TreatmentOutcome, ClinicError> {
        if self.state != VisitState::Diagnosing {
            return Err(ClinicError::InvalidState("examination is not open"));
        }
        if self.diagnosis.is_none() {
            return Err(ClinicError::InvalidState(
                "treatment requires a recorded diagnosis",
            ));
        }
        let outcome = treatment::score(&mut self.patient, remedies)?;
        self.state = VisitState::Treated;
        Ok(outcome)
    }

    /// Closes the visit and discards its artifacts. The patient's truth
    /// state carries over to the next visit.
    pub fn end_visit(&mut self) -> Result<(), ClinicError> {
        if self.state != VisitState::Treated {
            return Err(ClinicError::InvalidState("no treated visit to close"));
        }
        self.selection = None;
        self.diagnosis = None;
        self.state = VisitState::NoVisit;
        Ok(())
    }
}

impl Default for ClinicSession {
    fn default() -> Self {
        ClinicSession::new()
    }
}
