//! Patient roster for the admin overview.
//!
//! Groups a flat patient list by registration day, then by attending
//! doctor, and totals the fees collected per doctor. Days and doctors keep
//! first-seen order (the order the backend listed them in), not calendar
//! or alphabetical order.

use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use serde::Serialize;

use crate::models::Patient;

/// Patients seen by one doctor on one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DoctorBucket {
    pub doctor_name: String,
    pub patients: Vec<Patient>,
    /// Sum of each patient's effective fee.
    pub total_fees: f64,
}

/// All doctors' buckets for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayGroup {
    pub date: NaiveDate,
    pub doctors: Vec<DoctorBucket>,
}

impl DayGroup {
    /// Long US form, e.g. "October 19, 2026".
    pub fn label(&self) -> String {
        format_day_label(self.date)
    }

    pub fn doctor(&self, name: &str) -> Option<&DoctorBucket> {
        self.doctors.iter().find(|b| b.doctor_name == name)
    }

    pub fn day_total(&self) -> f64 {
        self.doctors.iter().map(|b| b.total_fees).sum()
    }

    pub fn patient_count(&self) -> usize {
        self.doctors.iter().map(|b| b.patients.len()).sum()
    }
}

/// Derived view over a patient list. Never aliases the input.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Roster {
    pub days: Vec<DayGroup>,
}

impl Roster {
    pub fn day(&self, date: NaiveDate) -> Option<&DayGroup> {
        self.days.iter().find(|d| d.date == date)
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn patient_count(&self) -> usize {
        self.days.iter().map(DayGroup::patient_count).sum()
    }

    pub fn grand_total(&self) -> f64 {
        self.days.iter().map(DayGroup::day_total).sum()
    }
}

pub fn format_day_label(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Group by UTC calendar day, then doctor.
pub fn group_by_date_then_doctor(patients: &[Patient]) -> Roster {
    group_by_date_then_doctor_in(patients, Utc.fix())
}

/// Group by calendar day as observed at `offset`, then doctor.
pub fn group_by_date_then_doctor_in(patients: &[Patient], offset: FixedOffset) -> Roster {
    let mut roster = Roster::default();

    for patient in patients {
        let date = patient.registration_date.with_timezone(&offset).date_naive();

        let day_idx = match roster.days.iter().position(|d| d.date == date) {
            Some(idx) => idx,
            None => {
                roster.days.push(DayGroup {
                    date,
                    doctors: Vec::new(),
                });
                roster.days.len() - 1
            }
        };
        let day = &mut roster.days[day_idx];

        let doctor_name = patient.doctor_name();
        let bucket_idx = match day.doctors.iter().position(|b| b.doctor_name == doctor_name) {
            Some(idx) => idx,
            None => {
                day.doctors.push(DoctorBucket {
                    doctor_name: doctor_name.to_string(),
                    patients: Vec::new(),
                    total_fees: 0.0,
                });
                day.doctors.len() - 1
            }
        };
        let bucket = &mut day.doctors[bucket_idx];

        bucket.total_fees += patient.effective_fee();
        bucket.patients.push(patient.clone());
    }

    tracing::debug!(
        days = roster.days.len(),
        patients = patients.len(),
        "Roster grouped"
    );
    roster
}
