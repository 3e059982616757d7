//! Account management
//!
//! Profiles mirror identities held by the external auth service.

use tracing::info;
use crate::error::{AttpError, Result, ValidationErrors};
use crate::database::{AccountInput, Profile, queries};
use crate::utils::{generate_id, non_empty};
use super::registry::Registry;

impl AccountInput {
    /// Validate the account creation form
    pub fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let username = self.username.trim();
        if username.is_empty() {
            errors.push("username", "Tên đăng nhập là bắt buộc");
        } else if username.chars().any(char::is_whitespace) {
            errors.push("username", "Tên đăng nhập không được chứa khoảng trắng");
        }
        errors.into_result()
    }
}

impl Registry {
    /// Create an account under the signed-in admin
    pub fn create_account(&mut self, input: AccountInput) -> Result<String> {
        let creator_id = self.ensure_admin()?.id.clone();

        let input = AccountInput {
            username: input.username.trim().to_string(),
            full_name: non_empty(input.full_name.as_deref()),
            managed_area: non_empty(input.managed_area.as_deref()),
            ..input
        };
        input.validate()?;

        let conn = self.conn()?;
        if queries::get_profile_by_username(conn, &input.username)?.is_some() {
            let mut errors = ValidationErrors::new();
            errors.push("username", format!("Tên đăng nhập \"{}\" đã tồn tại", input.username));
            return Err(errors.into());
        }

        let id = generate_id();
        queries::create_profile(conn, &id, &input, Some(&creator_id))?;
        info!(username = %input.username, role = %input.role, "created account");
        Ok(id)
    }

    /// All accounts, newest first (admin only)
    pub fn list_accounts(&self) -> Result<Vec<Profile>> {
        self.ensure_admin()?;
        queries::get_all_profiles(self.conn()?)
    }

    /// Accounts created by a given profile (admin only)
    pub fn sub_accounts(&self, parent_id: &str) -> Result<Vec<Profile>> {
        self.ensure_admin()?;
        queries::get_profiles_by_creator(self.conn()?, parent_id)
    }

    /// Delete an account other than your own (admin only)
    pub fn delete_account(&mut self, id: &str) -> Result<()> {
        let me = self.ensure_admin()?;
        if me.id == id {
            return Err(AttpError::InvalidOperation(
                "Cannot delete the signed-in account".to_string()
            ));
        }

        queries::delete_profile(self.conn()?, id)?;
        info!(profile_id = %id, "deleted account");
        Ok(())
    }

    /// Update the signed-in profile's own display fields
    pub fn update_own_profile(&mut self, full_name: Option<&str>, managed_area: Option<&str>) -> Result<Profile> {
        let id = self.ensure_signed_in()?.id.clone();

        let conn = self.conn()?;
        queries::update_profile(conn, &id, non_empty(full_name).as_deref(), non_empty(managed_area).as_deref())?;
        let profile = queries::get_profile(conn, &id)?
            .ok_or_else(|| AttpError::ProfileNotFound(id.clone()))?;

        self.session = Some(profile.clone());
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::business::registry::tests::{create_test_registry, sign_in_as_staff};
    use crate::database::Role;

    fn account(username: &str) -> AccountInput {
        AccountInput {
            username: username.to_string(),
            full_name: Some("Nguyễn Văn A".to_string()),
            role: Role::Staff,
            managed_area: Some("  ".to_string()),
        }
    }

    #[test]
    fn test_create_account_records_creator() {
        let (mut registry, _temp) = create_test_registry();
        let admin_id = registry.current_profile().unwrap().id.clone();

        let id = registry.create_account(account(" nv01 ")).unwrap();
        let subs = registry.sub_accounts(&admin_id).unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].id, id);
        assert_eq!(subs[0].username, "nv01");
        assert_eq!(subs[0].created_by.as_deref(), Some(admin_id.as_str()));
        assert!(subs[0].managed_area.is_none());

        assert_eq!(registry.list_accounts().unwrap().len(), 2);
    }

    #[test]
    fn test_create_account_rejects_duplicates_and_blanks() {
        let (mut registry, _temp) = create_test_registry();
        registry.create_account(account("nv01")).unwrap();
        assert!(matches!(registry.create_account(account("nv01")), Err(AttpError::Validation(_))));
        assert!(matches!(registry.create_account(account("  ")), Err(AttpError::Validation(_))));
        assert!(matches!(registry.create_account(account("nv 02")), Err(AttpError::Validation(_))));
    }

    #[test]
    fn test_staff_cannot_manage_accounts() {
        let (mut registry, _temp) = create_test_registry();
        sign_in_as_staff(&mut registry);
        assert!(matches!(registry.create_account(account("x")), Err(AttpError::PermissionDenied(_))));
        assert!(matches!(registry.list_accounts(), Err(AttpError::PermissionDenied(_))));
    }

    #[test]
    fn test_delete_account() {
        let (mut registry, _temp) = create_test_registry();
        let id = registry.create_account(account("nv01")).unwrap();
        let me = registry.current_profile().unwrap().id.clone();

        assert!(matches!(registry.delete_account(&me), Err(AttpError::InvalidOperation(_))));
        registry.delete_account(&id).unwrap();
        assert!(matches!(registry.delete_account(&id), Err(AttpError::ProfileNotFound(_))));
    }

    #[test]
    fn test_update_own_profile() {
        let (mut registry, _temp) = create_test_registry();
        sign_in_as_staff(&mut registry);

        let profile = registry.update_own_profile(Some(" Trần Thị B "), Some("Phường 1")).unwrap();
        assert_eq!(profile.full_name.as_deref(), Some("Trần Thị B"));
        assert_eq!(registry.current_profile().unwrap().managed_area.as_deref(), Some("Phường 1"));
    }
}
