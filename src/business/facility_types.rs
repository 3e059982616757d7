//! Facility type operations

use rusqlite::Connection;
use tracing::info;
use crate::error::{AttpError, Result, ValidationErrors};
use crate::database::{FacilityType, FacilityTypeInput, queries};
use crate::utils::{generate_id, non_empty};
use super::registry::Registry;

impl FacilityTypeInput {
    /// Validate the facility type form
    pub fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.name.trim().is_empty() {
            errors.push("name", "Tên loại hình là bắt buộc");
        }
        errors.into_result()
    }

    fn normalized(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            description: non_empty(self.description.as_deref()),
            is_active: self.is_active,
        }
    }
}

impl Registry {
    /// Get all facility types, newest first
    pub fn facility_types(&mut self) -> Result<&[FacilityType]> {
        self.ensure_signed_in()?;
        if self.types_cache.is_none() {
            let types = queries::get_all_facility_types(self.conn()?)?;
            self.types_cache = Some(types);
        }
        Ok(self.types_cache.as_deref().unwrap_or_default())
    }

    /// Names of the active facility types, alphabetical
    pub fn active_facility_type_names(&self) -> Result<Vec<String>> {
        self.ensure_signed_in()?;
        queries::get_active_facility_type_names(self.conn()?)
    }

    /// Create a facility type (admin only)
    pub fn add_facility_type(&mut self, input: FacilityTypeInput) -> Result<String> {
        self.ensure_admin()?;

        let input = input.normalized();
        input.validate()?;

        let conn = self.conn()?;
        ensure_unique_name(conn, &input.name, None)?;

        let id = generate_id();
        queries::create_facility_type(conn, &id, &input)?;
        info!(type_id = %id, name = %input.name, "created facility type");

        self.types_cache = None;
        Ok(id)
    }

    /// Update a facility type (admin only)
    ///
    /// Facilities keep the type name they were saved with.
    pub fn update_facility_type(&mut self, id: &str, input: FacilityTypeInput) -> Result<()> {
        self.ensure_admin()?;

        let input = input.normalized();
        input.validate()?;

        let conn = self.conn()?;
        ensure_unique_name(conn, &input.name, Some(id))?;
        queries::update_facility_type(conn, id, &input)?;
        info!(type_id = %id, name = %input.name, active = input.is_active, "updated facility type");

        self.types_cache = None;
        Ok(())
    }

    /// Delete a facility type (admin only)
    pub fn delete_facility_type(&mut self, id: &str) -> Result<()> {
        self.ensure_admin()?;

        queries::delete_facility_type(self.conn()?, id)?;
        info!(type_id = %id, "deleted facility type");

        self.types_cache = None;
        Ok(())
    }
}

fn ensure_unique_name(conn: &Connection, name: &str, except_id: Option<&str>) -> Result<()> {
    if queries::facility_type_name_exists(conn, name, except_id)? {
        let mut errors = ValidationErrors::new();
        errors.push("name", format!("Loại hình \"{}\" đã tồn tại", name));
        return Err(AttpError::Validation(errors));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::business::registry::tests::{create_test_registry, sign_in_as_staff};

    fn form(name: &str, active: bool) -> FacilityTypeInput {
        FacilityTypeInput {
            name: name.to_string(),
            description: Some("  ".to_string()),
            is_active: active,
        }
    }

    #[test]
    fn test_seeded_types() {
        let (mut registry, _temp) = create_test_registry();
        assert_eq!(registry.facility_types().unwrap().len(), 4);
        let names = registry.active_facility_type_names().unwrap();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_add_update_delete() {
        let (mut registry, _temp) = create_test_registry();

        let id = registry.add_facility_type(form(" Nhà hàng ", true)).unwrap();
        let added = registry.facility_types().unwrap().iter().find(|t| t.id == id).cloned().unwrap();
        assert_eq!(added.name, "Nhà hàng");
        assert!(added.description.is_none());

        registry.update_facility_type(&id, form("Nhà hàng", false)).unwrap();
        assert!(!registry.active_facility_type_names().unwrap().contains(&"Nhà hàng".to_string()));

        registry.delete_facility_type(&id).unwrap();
        assert!(registry.facility_types().unwrap().iter().all(|t| t.id != id));
        assert!(matches!(registry.delete_facility_type(&id), Err(AttpError::FacilityTypeNotFound(_))));
    }

    #[test]
    fn test_duplicate_and_blank_names() {
        let (mut registry, _temp) = create_test_registry();
        assert!(matches!(
            registry.add_facility_type(form("Bếp ăn tập thể", true)),
            Err(AttpError::Validation(_))
        ));
        assert!(matches!(
            registry.add_facility_type(form("   ", true)),
            Err(AttpError::Validation(_))
        ));
    }

    #[test]
    fn test_rename_to_own_name_allowed() {
        let (mut registry, _temp) = create_test_registry();
        let id = registry.add_facility_type(form("Căng tin", true)).unwrap();
        registry.update_facility_type(&id, form("Căng tin", true)).unwrap();
    }

    #[test]
    fn test_staff_cannot_mutate_types() {
        let (mut registry, _temp) = create_test_registry();
        sign_in_as_staff(&mut registry);
        assert!(matches!(
            registry.add_facility_type(form("Mới", true)),
            Err(AttpError::PermissionDenied(_))
        ));
        assert!(!registry.active_facility_type_names().unwrap().is_empty());
    }
}
