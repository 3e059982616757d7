//! Facility operations
//!
//! This module provides facility management operations for the Registry.

use tracing::info;
use crate::error::{AttpError, Result, ValidationErrors};
use crate::database::{Facility, FacilityInput, queries};
use crate::database::queries::FacilityFilter;
use crate::utils::generate_id;
use super::registry::Registry;

/// Check a latitude/longitude pair against the valid coordinate ranges
pub(crate) fn check_coordinates(errors: &mut ValidationErrors, latitude: Option<f64>, longitude: Option<f64>) {
    if latitude.is_some_and(|lat| !(-90.0..=90.0).contains(&lat)) {
        errors.push("latitude", "Vĩ độ phải trong khoảng -90 đến 90");
    }
    if longitude.is_some_and(|lng| !(-180.0..=180.0).contains(&lng)) {
        errors.push("longitude", "Kinh độ phải trong khoảng -180 đến 180");
    }
}

impl FacilityInput {
    /// Validate the facility form
    ///
    /// An empty `active_types` list accepts any type name.
    pub fn validate(&self, active_types: &[String]) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.name.trim().is_empty() {
            errors.push("name", "Tên cơ sở là bắt buộc");
        }

        let facility_type = self.facility_type.trim();
        if facility_type.is_empty() {
            errors.push("type", "Loại hình là bắt buộc");
        } else if !active_types.is_empty() && !active_types.iter().any(|t| t == facility_type) {
            errors.push("type", format!(
                "Loại hình \"{}\" không hợp lệ. Các giá trị hợp lệ: {}",
                facility_type,
                active_types.join(", ")
            ));
        }

        check_coordinates(&mut errors, self.latitude, self.longitude);

        if let (Some(issued), Some(expiry)) = (self.certificate_date, self.certificate_expiry) {
            if expiry < issued {
                errors.push("certificate_expiry", "Ngày hết hạn GCN phải sau ngày cấp GCN");
            }
        }

        errors.into_result()
    }

    /// Copy with text fields trimmed and blank optionals cleared
    pub(crate) fn normalized(&self) -> Self {
        let trim_opt = |v: &Option<String>| crate::utils::non_empty(v.as_deref());
        Self {
            name: self.name.trim().to_string(),
            owner_name: trim_opt(&self.owner_name),
            address: trim_opt(&self.address),
            facility_type: self.facility_type.trim().to_string(),
            certificate_number: trim_opt(&self.certificate_number),
            ..self.clone()
        }
    }
}

/// Case-insensitive name match
fn matches_search(facility: &Facility, needle: &str) -> bool {
    needle.is_empty() || facility.name.to_lowercase().contains(needle)
}

impl Registry {
    /// Get all facilities ordered by name
    pub fn facilities(&mut self) -> Result<&[Facility]> {
        self.ensure_signed_in()?;
        self.load_facilities_if_needed()?;
        Ok(self.facilities_cache.as_deref().unwrap_or_default())
    }

    /// Load facilities from database if not cached
    pub(crate) fn load_facilities_if_needed(&mut self) -> Result<()> {
        if self.facilities_cache.is_some() {
            return Ok(());
        }
        let facilities = queries::get_all_facilities(self.conn()?)?;
        self.facilities_cache = Some(facilities);
        Ok(())
    }

    /// List facilities matching a filter
    pub fn list_facilities(&self, filter: &FacilityFilter) -> Result<Vec<Facility>> {
        self.ensure_signed_in()?;

        let mut facilities = queries::get_facilities(self.conn()?, filter)?;
        if let Some(search) = filter.search.as_deref() {
            let needle = search.trim().to_lowercase();
            facilities.retain(|f| matches_search(f, &needle));
        }
        Ok(facilities)
    }

    /// Get a facility by ID
    pub fn get_facility(&self, id: &str) -> Result<Facility> {
        self.ensure_signed_in()?;
        queries::get_facility(self.conn()?, id)?
            .ok_or_else(|| AttpError::FacilityNotFound(id.to_string()))
    }

    /// Create a new facility
    pub fn add_facility(&mut self, input: FacilityInput) -> Result<String> {
        self.ensure_signed_in()?;

        let input = input.normalized();
        let conn = self.conn()?;
        let active_types = queries::get_active_facility_type_names(conn)?;
        input.validate(&active_types)?;

        let id = generate_id();
        queries::create_facility(conn, &id, &input)?;
        info!(facility_id = %id, name = %input.name, "created facility");

        self.invalidate_facilities();
        Ok(id)
    }

    /// Update all editable fields of a facility
    pub fn update_facility(&mut self, id: &str, input: FacilityInput) -> Result<()> {
        self.ensure_signed_in()?;

        let input = input.normalized();
        let conn = self.conn()?;
        let existing = queries::get_facility(conn, id)?
            .ok_or_else(|| AttpError::FacilityNotFound(id.to_string()))?;

        // A retired type stays acceptable on records that already carry it
        let mut accepted = queries::get_active_facility_type_names(conn)?;
        if !accepted.is_empty() && !accepted.contains(&existing.facility_type) {
            accepted.push(existing.facility_type.clone());
        }
        input.validate(&accepted)?;

        queries::update_facility(conn, id, &input)?;
        info!(facility_id = %id, "updated facility");

        self.invalidate_facilities();
        Ok(())
    }

    /// Update the coordinates of a facility
    pub fn update_location(&mut self, id: &str, latitude: Option<f64>, longitude: Option<f64>) -> Result<()> {
        self.ensure_signed_in()?;

        let mut errors = ValidationErrors::new();
        check_coordinates(&mut errors, latitude, longitude);
        errors.into_result()?;

        queries::update_location(self.conn()?, id, latitude, longitude)?;
        info!(facility_id = %id, "updated facility location");

        self.invalidate_facilities();
        Ok(())
    }

    /// Delete a facility with all its inspections (admin only)
    pub fn delete_facility(&mut self, id: &str) -> Result<()> {
        self.ensure_admin()?;

        queries::delete_facility(self.conn()?, id)?;
        info!(facility_id = %id, "deleted facility");

        self.invalidate_facilities();
        self.invalidate_inspections();
        Ok(())
    }
}
