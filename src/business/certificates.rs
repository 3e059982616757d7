//! Certificate (GCN) lifecycle
//!
//! Classification is a pure function of the facility and a calendar date.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::info;
use crate::error::{Result, ValidationErrors};
use crate::database::{CertificateUpdate, Facility, queries};
use crate::database::queries::FacilityFilter;
use crate::utils::{non_empty, today};
use crate::{EXPIRING_WINDOW_DAYS, MAX_EXPIRING_WINDOW_DAYS};
use super::registry::Registry;

/// Lifecycle state of a facility's certificate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateStatus {
    NotCertified,
    Expired,
    ExpiringSoon,
    Valid,
}

impl CertificateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CertificateStatus::NotCertified => "not_certified",
            CertificateStatus::Expired => "expired",
            CertificateStatus::ExpiringSoon => "expiring_soon",
            CertificateStatus::Valid => "valid",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CertificateStatus::NotCertified => "Chưa cấp",
            CertificateStatus::Expired => "Hết hạn",
            CertificateStatus::ExpiringSoon => "Sắp hết hạn",
            CertificateStatus::Valid => "Còn hiệu lực",
        }
    }
}

/// Classify with the default 30-day window
pub fn classify(facility: &Facility, today: NaiveDate) -> CertificateStatus {
    classify_with_window(facility, today, EXPIRING_WINDOW_DAYS)
}

/// Classify a facility's certificate as of `today`
///
/// Expiry on `today` counts as expired; expiry exactly `window_days` ahead
/// counts as expiring soon.
pub fn classify_with_window(facility: &Facility, today: NaiveDate, window_days: i64) -> CertificateStatus {
    let Some(expiry) = facility.effective_expiry() else {
        return CertificateStatus::NotCertified;
    };

    let window = Duration::days(window_days.clamp(0, MAX_EXPIRING_WINDOW_DAYS));
    if expiry <= today {
        CertificateStatus::Expired
    } else if today.checked_add_signed(window).is_none_or(|horizon| expiry <= horizon) {
        CertificateStatus::ExpiringSoon
    } else {
        CertificateStatus::Valid
    }
}

/// A facility together with its certificate status
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CertificateRow {
    pub facility: Facility,
    pub status: CertificateStatus,
}

impl CertificateUpdate {
    pub fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.is_certified && self.certificate_expiry.is_none() {
            errors.push("certificate_expiry", "Ngày hết hạn GCN là bắt buộc khi đã cấp GCN");
        }
        if let (Some(issued), Some(expiry)) = (self.certificate_date, self.certificate_expiry) {
            if expiry < issued {
                errors.push("certificate_expiry", "Ngày hết hạn GCN phải sau ngày cấp GCN");
            }
        }
        errors.into_result()
    }
}

impl Registry {
    /// Classify using the configured window and today's date
    pub fn certificate_status(&self, facility: &Facility) -> CertificateStatus {
        classify_with_window(facility, today(), self.config.expiring_window_days)
    }

    /// List facilities with their certificate status, optionally only one status
    pub fn list_certificates(
        &self,
        filter: &FacilityFilter,
        status: Option<CertificateStatus>,
    ) -> Result<Vec<CertificateRow>> {
        self.list_certificates_on(filter, status, today())
    }

    /// Same as [`Registry::list_certificates`] with an explicit "today"
    pub fn list_certificates_on(
        &self,
        filter: &FacilityFilter,
        status: Option<CertificateStatus>,
        today: NaiveDate,
    ) -> Result<Vec<CertificateRow>> {
        let window = self.config.expiring_window_days;
        let rows = self.list_facilities(filter)?
            .into_iter()
            .map(|facility| {
                let status = classify_with_window(&facility, today, window);
                CertificateRow { facility, status }
            })
            .filter(|row| status.is_none_or(|wanted| row.status == wanted))
            .collect();
        Ok(rows)
    }

    /// Apply the certificate-update form to a facility
    pub fn update_certificate(&mut self, facility_id: &str, update: CertificateUpdate) -> Result<()> {
        self.ensure_signed_in()?;
        update.validate()?;

        let update = CertificateUpdate {
            certificate_number: non_empty(update.certificate_number.as_deref()),
            ..update
        };
        queries::update_certificate(self.conn()?, facility_id, &update)?;
        info!(facility_id = %facility_id, certified = update.is_certified, "updated certificate");

        self.invalidate_facilities();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::business::registry::tests::create_test_registry;
    use crate::database::{FacilityInput, FacilityStatus, ManagementLevel};
    use crate::error::AttpError;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn facility(is_certified: bool, expiry: Option<NaiveDate>) -> Facility {
        Facility {
            id: "f1".to_string(),
            name: "A".to_string(),
            owner_name: None,
            address: None,
            facility_type: "Dịch vụ ăn uống".to_string(),
            province_code: ManagementLevel::Tinh,
            status: FacilityStatus::Active,
            is_certified,
            certificate_number: None,
            certificate_date: None,
            certificate_expiry: expiry,
            latitude: None,
            longitude: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_classify_boundaries() {
        let today = date(2024, 6, 1);
        assert_eq!(classify(&facility(true, Some(date(2024, 5, 31))), today), CertificateStatus::Expired);
        assert_eq!(classify(&facility(true, Some(today)), today), CertificateStatus::Expired);
        assert_eq!(classify(&facility(true, Some(date(2024, 6, 2))), today), CertificateStatus::ExpiringSoon);
        assert_eq!(classify(&facility(true, Some(date(2024, 7, 1))), today), CertificateStatus::ExpiringSoon);
        assert_eq!(classify(&facility(true, Some(date(2024, 7, 2))), today), CertificateStatus::Valid);
    }

    #[test]
    fn test_classify_not_certified() {
        let today = date(2024, 6, 1);
        assert_eq!(classify(&facility(false, Some(date(2030, 1, 1))), today), CertificateStatus::NotCertified);
        assert_eq!(classify(&facility(false, Some(date(2020, 1, 1))), today), CertificateStatus::NotCertified);
        assert_eq!(classify(&facility(true, None), today), CertificateStatus::NotCertified);
    }

    #[test]
    fn test_classify_custom_window() {
        let today = date(2024, 6, 1);
        let f = facility(true, Some(date(2024, 6, 20)));
        assert_eq!(classify_with_window(&f, today, 7), CertificateStatus::Valid);
        assert_eq!(classify_with_window(&f, today, 30), CertificateStatus::ExpiringSoon);
    }

    #[test]
    fn test_classify_out_of_range_window() {
        let today = date(2024, 6, 1);
        let far = facility(true, Some(date(2300, 1, 1)));
        let near = facility(true, Some(date(2024, 6, 20)));
        assert_eq!(classify_with_window(&near, today, i64::MAX), CertificateStatus::ExpiringSoon);
        assert_eq!(classify_with_window(&far, today, i64::MAX), CertificateStatus::Valid);
        assert_eq!(classify_with_window(&near, today, i64::MIN), CertificateStatus::Valid);
        assert_eq!(classify_with_window(&near, NaiveDate::MAX - Duration::days(1), 30), CertificateStatus::Expired);
    }

    #[test]
    fn test_status_wire_values() {
        assert_eq!(serde_json::to_string(&CertificateStatus::ExpiringSoon).unwrap(), "\"expiring_soon\"");
        assert_eq!(CertificateStatus::NotCertified.as_str(), "not_certified");
    }

    #[test]
    fn test_update_certificate_and_filter() {
        let (mut registry, _temp) = create_test_registry();
        let a = registry.add_facility(FacilityInput::new("A", "Dịch vụ ăn uống", ManagementLevel::Tinh)).unwrap();
        let b = registry.add_facility(FacilityInput::new("B", "Dịch vụ ăn uống", ManagementLevel::Tinh)).unwrap();

        registry.update_certificate(&a, CertificateUpdate {
            is_certified: true,
            certificate_number: Some(" GCN-001 ".to_string()),
            certificate_date: Some(date(2024, 1, 1)),
            certificate_expiry: Some(date(2024, 6, 15)),
        }).unwrap();

        let stored = registry.get_facility(&a).unwrap();
        assert_eq!(stored.certificate_number.as_deref(), Some("GCN-001"));

        let today = date(2024, 6, 1);
        let soon = registry.list_certificates_on(&FacilityFilter::default(), Some(CertificateStatus::ExpiringSoon), today).unwrap();
        assert_eq!(soon.len(), 1);
        assert_eq!(soon[0].facility.id, a);

        let all = registry.list_certificates_on(&FacilityFilter::default(), None, today).unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().any(|r| r.facility.id == b && r.status == CertificateStatus::NotCertified));
    }

    #[test]
    fn test_update_certificate_validation() {
        let (mut registry, _temp) = create_test_registry();
        let a = registry.add_facility(FacilityInput::new("A", "Dịch vụ ăn uống", ManagementLevel::Tinh)).unwrap();

        let result = registry.update_certificate(&a, CertificateUpdate {
            is_certified: true,
            ..Default::default()
        });
        assert!(matches!(result, Err(AttpError::Validation(_))));

        let result = registry.update_certificate("missing", CertificateUpdate::default());
        assert!(matches!(result, Err(AttpError::FacilityNotFound(_))));
    }
}
