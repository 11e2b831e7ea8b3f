//! Role directory operations.
//!
//! A staff name is bound to one role the first time it is written. Later
//! writes with the same role are no-ops; a different role is a conflict.

use crate::model::role::{Role, RoleBinding};
use crate::model::validation::require_text;
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::repository::{now_epoch_ms, Change, Repository};
use crate::store::DocumentStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleUpsert {
    Created,
    /// Binding already existed with the same role; nothing was written.
    Unchanged,
}

impl<S: DocumentStore> Repository<S> {
    /// Binds `name` to `role`.
    ///
    /// # Errors
    /// - `RoleConflict` when `name` is already bound to a different role.
    /// - `Validation` when `name` is blank.
    pub fn upsert_role(&self, name: &str, role: Role) -> RepoResult<RoleUpsert> {
        let name = require_text("roleBinding", "name", name)?;
        self.mutate("upsert_role", move |db| match db.role_binding(&name) {
            Some(binding) if binding.role == role => Ok(Change::unchanged(RoleUpsert::Unchanged)),
            Some(binding) => Err(RepoError::RoleConflict {
                name,
                existing: binding.role,
                requested: role,
            }),
            None => {
                db.roles_directory.push(RoleBinding {
                    name,
                    role,
                    bound_at: now_epoch_ms(),
                    extra: serde_json::Map::new(),
                });
                Ok(Change::write(RoleUpsert::Created))
            }
        })
    }

    /// Same as `upsert_role`, parsing a role label first.
    pub fn upsert_role_label(&self, name: &str, role: &str) -> RepoResult<RoleUpsert> {
        let role = role.parse::<Role>()?;
        self.upsert_role(name, role)
    }

    pub fn list_roles(&self) -> RepoResult<Vec<RoleBinding>> {
        Ok(self.snapshot()?.roles_directory.into_vec())
    }

    pub fn role_of(&self, name: &str) -> RepoResult<Option<Role>> {
        Ok(self.snapshot()?.role_binding(name).map(|binding| binding.role))
    }
}
