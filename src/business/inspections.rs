//! Inspection operations and the remediation sweep
//!
//! An inspection left pending remediation (`cho_khac_phuc`) past its deadline
//! becomes a failure (`khong_dat`). The sweep runs whenever an inspection
//! history is loaded.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::{info, warn};
use crate::error::{AttpError, Result, ValidationErrors};
use crate::database::{Inspection, InspectionInput, InspectionResult, queries};
use crate::utils::{generate_id, today};
use crate::{MIN_INSPECTION_YEAR, MAX_INSPECTION_YEAR};
use super::registry::Registry;

/// A record the sweep could not persist
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepFailure {
    pub inspection_id: String,
    pub message: String,
}

/// Outcome of one remediation sweep
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SweepReport {
    /// IDs of inspections moved to `khong_dat`
    pub transitioned: Vec<String>,
    /// Overdue inspections whose update failed; left unchanged
    pub failures: Vec<SweepFailure>,
}

impl SweepReport {
    pub fn transitioned_count(&self) -> usize {
        self.transitioned.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Transition every overdue inspection to `khong_dat`
///
/// `persist` is called once per overdue record with the record as it should
/// be stored. A record is updated in place only if its persist succeeded;
/// failures do not stop the sweep.
pub fn sweep_overdue<F>(inspections: &mut [Inspection], today: NaiveDate, mut persist: F) -> SweepReport
where
    F: FnMut(&Inspection) -> Result<()>,
{
    let mut report = SweepReport::default();

    for inspection in inspections.iter_mut().filter(|i| i.is_overdue(today)) {
        let mut updated = inspection.clone();
        updated.result = InspectionResult::KhongDat;

        match persist(&updated) {
            Ok(()) => {
                *inspection = updated;
                report.transitioned.push(inspection.id.clone());
            }
            Err(e) => {
                warn!(inspection_id = %inspection.id, error = %e, "failed to persist overdue inspection");
                report.failures.push(SweepFailure {
                    inspection_id: inspection.id.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    if !report.transitioned.is_empty() {
        info!(count = report.transitioned_count(), "overdue inspections marked as failed");
    }
    report
}

/// Inspection list after the sweep
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InspectionHistory {
    /// Newest first
    pub inspections: Vec<Inspection>,
    pub sweep: SweepReport,
}

impl InspectionInput {
    /// Validate the inspection form
    pub fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let year = self.inspection_date.year();
        if !(MIN_INSPECTION_YEAR..=MAX_INSPECTION_YEAR).contains(&year) {
            errors.push("year", format!(
                "Năm kiểm tra phải trong khoảng {} đến {}",
                MIN_INSPECTION_YEAR, MAX_INSPECTION_YEAR
            ));
        }

        if self.result == InspectionResult::ChoKhacPhuc && self.remediation_deadline.is_none() {
            errors.push(
                "remediation_deadline",
                "Thời hạn khắc phục là bắt buộc khi kết quả là 'Chờ khắc phục'",
            );
        }

        if self.has_penalty && !self.penalty_amount.is_some_and(|amount| amount > 0) {
            errors.push("penalty_amount", "Số tiền xử phạt phải lớn hơn 0");
        }

        errors.into_result()
    }
}

impl Registry {
    /// Get all inspections
    pub fn inspections(&mut self) -> Result<&[Inspection]> {
        self.ensure_signed_in()?;
        self.load_inspections_if_needed()?;
        Ok(self.inspections_cache.as_deref().unwrap_or_default())
    }

    /// Load inspections from database if not cached
    pub(crate) fn load_inspections_if_needed(&mut self) -> Result<()> {
        if self.inspections_cache.is_some() {
            return Ok(());
        }
        let inspections = queries::get_all_inspections(self.conn()?)?;
        self.inspections_cache = Some(inspections);
        Ok(())
    }

    /// Record an inspection for a facility
    pub fn add_inspection(&mut self, facility_id: &str, input: InspectionInput) -> Result<String> {
        self.ensure_signed_in()?;
        input.validate()?;

        let conn = self.conn()?;
        if queries::get_facility(conn, facility_id)?.is_none() {
            return Err(AttpError::FacilityNotFound(facility_id.to_string()));
        }

        let mut input = input;
        if !input.has_penalty {
            input.penalty_amount = None;
        }

        let id = generate_id();
        queries::create_inspection(conn, &id, facility_id, input.inspection_date.year(), &input)?;
        info!(inspection_id = %id, facility_id = %facility_id, result = %input.result, "recorded inspection");

        self.invalidate_inspections();
        Ok(id)
    }

    /// Load a facility's inspections, newest first, sweeping overdue ones
    pub fn facility_inspections(&mut self, facility_id: &str) -> Result<InspectionHistory> {
        self.facility_inspections_on(facility_id, today())
    }

    /// Same as [`Registry::facility_inspections`] with an explicit "today"
    pub fn facility_inspections_on(&mut self, facility_id: &str, today: NaiveDate) -> Result<InspectionHistory> {
        self.ensure_signed_in()?;

        let conn = self.conn()?;
        if queries::get_facility(conn, facility_id)?.is_none() {
            return Err(AttpError::FacilityNotFound(facility_id.to_string()));
        }

        let mut inspections = queries::get_inspections_by_facility(conn, facility_id)?;
        let sweep = sweep_overdue(&mut inspections, today, |inspection| {
            queries::update_inspection_result(conn, &inspection.id, inspection.result)
        });

        if !sweep.transitioned.is_empty() {
            self.invalidate_inspections();
        }
        Ok(InspectionHistory { inspections, sweep })
    }

    /// Load every inspection, newest first, sweeping overdue ones
    pub fn all_inspections_on(&mut self, today: NaiveDate) -> Result<InspectionHistory> {
        self.ensure_signed_in()?;

        let conn = self.conn()?;
        let mut inspections = queries::get_all_inspections(conn)?;
        let sweep = sweep_overdue(&mut inspections, today, |inspection| {
            queries::update_inspection_result(conn, &inspection.id, inspection.result)
        });

        self.inspections_cache = Some(inspections.clone());
        self.dashboard_cache = None;
        Ok(InspectionHistory { inspections, sweep })
    }

    /// Mark a pending inspection as remediated
    pub fn mark_remediated(&mut self, inspection_id: &str) -> Result<()> {
        self.ensure_signed_in()?;

        let conn = self.conn()?;
        let inspection = queries::get_inspection(conn, inspection_id)?
            .ok_or_else(|| AttpError::InspectionNotFound(inspection_id.to_string()))?;

        if inspection.result != InspectionResult::ChoKhacPhuc {
            return Err(AttpError::InvalidOperation(format!(
                "Only inspections pending remediation can be marked remediated (current: {})",
                inspection.result
            )));
        }

        queries::update_inspection_result(conn, inspection_id, InspectionResult::DaKhacPhuc)?;
        info!(inspection_id = %inspection_id, "inspection remediated");

        self.invalidate_inspections();
        Ok(())
    }
}
