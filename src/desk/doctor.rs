//! Doctor desk: today's queue and prescribing.

use std::path::PathBuf;

use chrono::NaiveDate;

use super::{resume, DeskError};
use crate::api::OpdApi;
use crate::models::{Patient, Role, User};
use crate::prescription_pdf::{PrescriberInfo, PrescriptionExporter};
use crate::session::SessionStore;
use crate::validation::PrescriptionDraft;

pub const PRESCRIBED: &str = "Prescription saved and PDF generated!";
pub const PRESCRIBE_FAILED: &str = "Failed to save prescription";
pub const FETCH_TODAY_FAILED: &str = "Failed to fetch patients";

/// Result of a successful prescribe.
#[derive(Debug, Clone, PartialEq)]
pub struct PrescriptionOutcome {
    /// Patient as returned by the backend after saving.
    pub patient: Patient,
    pub pdf_path: PathBuf,
}

pub struct DoctorDesk<'a, A: OpdApi + ?Sized, E: PrescriptionExporter + ?Sized> {
    api: &'a A,
    exporter: &'a E,
    doctor: User,
    today: Vec<Patient>,
}

impl<'a, A, E> DoctorDesk<'a, A, E>
where
    A: OpdApi + ?Sized,
    E: PrescriptionExporter + ?Sized,
{
    /// Desk for `doctor` on an already authenticated gateway.
    pub fn new(api: &'a A, exporter: &'a E, doctor: User) -> Self {
        Self {
            api,
            exporter,
            doctor,
            today: Vec::new(),
        }
    }

    /// Desk for the persisted doctor session.
    pub fn open(api: &'a A, exporter: &'a E, store: &SessionStore) -> Result<Self, DeskError> {
        let session = resume(api, store, Role::Doctor)?;
        Ok(Self::new(api, exporter, session.user))
    }

    pub fn doctor(&self) -> &User {
        &self.doctor
    }

    pub fn today(&self) -> &[Patient] {
        &self.today
    }

    /// Today's patients still waiting for a prescription.
    pub fn pending(&self) -> impl Iterator<Item = &Patient> {
        self.today.iter().filter(|p| !p.is_completed())
    }

    pub fn refresh_today(&mut self) -> Result<&[Patient], DeskError> {
        self.today = self.api.list_today_patients(&self.doctor.id)?;
        tracing::debug!(count = self.today.len(), "Today's patients refreshed");
        Ok(&self.today)
    }

    /// Validate the draft, save it, print it, then re-fetch today's list.
    ///
    /// An invalid draft stops before any backend or printer call. Once the
    /// save succeeded the list is refreshed even if printing fails.
    pub fn prescribe(
        &mut self,
        patient_id: &str,
        draft: &PrescriptionDraft,
        date: NaiveDate,
    ) -> Result<PrescriptionOutcome, DeskError> {
        let prescription = draft.validate()?;

        let saved = self.api.save_prescription(patient_id, &prescription)?;
        tracing::info!(patient_id, medicines = prescription.medicines.len(), "Prescription saved");

        let printed = saved.prescription.clone().unwrap_or(prescription);
        let doctor = PrescriberInfo::from(&self.doctor);
        let exported = self.exporter.export(&saved, &doctor, &printed, date);

        if let Err(e) = self.refresh_today() {
            tracing::warn!(error = %e, "Today's list refresh after prescribing failed");
        }

        let pdf_path = exported?;
        Ok(PrescriptionOutcome {
            patient: saved,
            pdf_path,
        })
    }
}
