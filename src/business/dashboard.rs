//! Dashboard aggregation
//!
//! [`aggregate`] is a pure fold over the facility and inspection
//! collections. The registry caches its output until either collection
//! changes or the day rolls over.

use std::collections::BTreeMap;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use crate::error::Result;
use crate::database::{Facility, Inspection, InspectionResult};
use crate::utils::today;
use crate::{EXPIRING_SOON_LIMIT, EXPIRING_WINDOW_DAYS};
use super::certificates::{CertificateStatus, classify_with_window};
use super::registry::Registry;

/// Inspection count per result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultCounts {
    pub dat: usize,
    pub cho_khac_phuc: usize,
    pub da_khac_phuc: usize,
    pub khong_dat: usize,
}

impl ResultCounts {
    fn add(&mut self, result: InspectionResult) {
        match result {
            InspectionResult::Dat => self.dat += 1,
            InspectionResult::ChoKhacPhuc => self.cho_khac_phuc += 1,
            InspectionResult::DaKhacPhuc => self.da_khac_phuc += 1,
            InspectionResult::KhongDat => self.khong_dat += 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total_facilities: usize,
    /// Facilities whose certificate is valid
    pub active_gcn_count: usize,
    pub not_certified_or_expired_count: usize,
    pub inspections_this_year: usize,
    pub inspections_by_result: ResultCounts,
    /// Sum of penalty amounts (VND) over penalized inspections
    pub total_penalties: i64,
    pub penalty_count: usize,
}

/// Pie chart slice: facilities of one type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeSlice {
    pub name: String,
    pub value: usize,
}

/// Bar chart column: passed-like and failed-like results of one year
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearTally {
    pub year: i32,
    pub passed: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardCharts {
    /// Ordered by type name
    pub pie: Vec<TypeSlice>,
    /// Ordered by year
    pub bar: Vec<YearTally>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    pub summary: DashboardSummary,
    pub charts: DashboardCharts,
    /// Up to five expiring-soon facilities, earliest expiry first
    pub expiring_soon: Vec<Facility>,
}

/// Aggregate with the default 30-day window
pub fn aggregate(facilities: &[Facility], inspections: &[Inspection], today: NaiveDate) -> DashboardStats {
    aggregate_with_window(facilities, inspections, today, EXPIRING_WINDOW_DAYS)
}

pub fn aggregate_with_window(
    facilities: &[Facility],
    inspections: &[Inspection],
    today: NaiveDate,
    window_days: i64,
) -> DashboardStats {
    let mut summary = DashboardSummary {
        total_facilities: facilities.len(),
        ..Default::default()
    };
    let mut by_type: BTreeMap<&str, usize> = BTreeMap::new();
    let mut expiring: Vec<(NaiveDate, &Facility)> = Vec::new();

    for facility in facilities {
        match classify_with_window(facility, today, window_days) {
            CertificateStatus::Valid => summary.active_gcn_count += 1,
            CertificateStatus::NotCertified | CertificateStatus::Expired => {
                summary.not_certified_or_expired_count += 1
            }
            CertificateStatus::ExpiringSoon => {
                if let Some(expiry) = facility.effective_expiry() {
                    expiring.push((expiry, facility));
                }
            }
        }
        *by_type.entry(facility.facility_type.as_str()).or_default() += 1;
    }

    expiring.sort_by_key(|(expiry, _)| *expiry);
    let expiring_soon = expiring.into_iter()
        .take(EXPIRING_SOON_LIMIT)
        .map(|(_, f)| f.clone())
        .collect();

    let mut by_year: BTreeMap<i32, YearTally> = BTreeMap::new();
    let current_year = today.year();

    for inspection in inspections {
        if inspection.year == current_year {
            summary.inspections_this_year += 1;
        }
        summary.inspections_by_result.add(inspection.result);

        if inspection.has_penalty {
            summary.penalty_count += 1;
            summary.total_penalties = summary.total_penalties.saturating_add(inspection.penalty_amount.unwrap_or(0));
        }

        let tally = by_year.entry(inspection.year).or_insert_with(|| YearTally {
            year: inspection.year,
            passed: 0,
            failed: 0,
        });
        if inspection.result.is_passed_like() {
            tally.passed += 1;
        } else if inspection.result.is_failed_like() {
            tally.failed += 1;
        }
    }

    DashboardStats {
        summary,
        charts: DashboardCharts {
            pie: by_type.into_iter()
                .map(|(name, value)| TypeSlice { name: name.to_string(), value })
                .collect(),
            bar: by_year.into_values().collect(),
        },
        expiring_soon,
    }
}

impl Registry {
    /// Dashboard statistics as of today
    pub fn dashboard_stats(&mut self) -> Result<DashboardStats> {
        self.dashboard_stats_on(today())
    }

    /// Dashboard statistics as of a given day
    pub fn dashboard_stats_on(&mut self, today: NaiveDate) -> Result<DashboardStats> {
        self.ensure_signed_in()?;

        if let Some((day, stats)) = &self.dashboard_cache {
            if *day == today {
                return Ok(stats.clone());
            }
        }

        self.load_facilities_if_needed()?;
        self.load_inspections_if_needed()?;

        let stats = aggregate_with_window(
            self.facilities_cache.as_deref().unwrap_or_default(),
            self.inspections_cache.as_deref().unwrap_or_default(),
            today,
            self.config.expiring_window_days,
        );
        self.dashboard_cache = Some((today, stats.clone()));
        Ok(stats)
    }
}
