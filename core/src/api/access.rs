use tracing::info;

use crate::client::{decode, expect_found, TeamCityClient};
use crate::error::ApiError;
use crate::http::{ContentType, HttpMethod};
use crate::locator::{Endpoint, Locator};
use crate::types::{Group, ParentGroups, Role, RoleAssignment, User};

/// Derive a group key from its display name: whitespace becomes `_`,
/// letters and digits are upper-cased, everything else is dropped.
pub fn generate_group_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_whitespace() {
            key.push('_');
        } else if c.is_alphanumeric() {
            key.extend(c.to_uppercase());
        }
    }
    key
}

fn user(locator: &Locator) -> Endpoint {
    Endpoint::rest().segment("users").locator(locator)
}

fn group(key: &str) -> Endpoint {
    Endpoint::rest().segment("userGroups").locator(&Locator::key(key))
}

fn role(id: &str) -> Endpoint {
    Endpoint::rest().segment("roles").locator(&Locator::id(id))
}

impl TeamCityClient {
    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    pub fn create_user(&self, new_user: &User) -> Result<User, ApiError> {
        let created: User = self.post_json(&Endpoint::rest().segment("users"), new_user)?;
        info!(username = %created.username, "created user");
        Ok(created)
    }

    pub fn get_user(&self, id: &str) -> Result<Option<User>, ApiError> {
        self.get_json(&user(&Locator::id(id)))
    }

    pub fn get_user_by_name(&self, username: &str) -> Result<Option<User>, ApiError> {
        self.get_json(&user(&Locator::username(username)))
    }

    /// Replace a user record. The record must carry its server id.
    pub fn update_user(&self, updated: &User) -> Result<User, ApiError> {
        let id = updated
            .id
            .ok_or_else(|| ApiError::Config(format!("user {} has no id", updated.username)))?;
        self.put_json(&user(&Locator::id(id.to_string())), updated)
    }

    pub fn delete_user(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&user(&Locator::id(id)))
    }

    // -----------------------------------------------------------------------
    // Groups
    // -----------------------------------------------------------------------

    /// Create a group, deriving its key from the name when none is given.
    pub fn create_group(&self, new_group: &Group) -> Result<Group, ApiError> {
        let mut body = new_group.clone();
        if body.key.is_empty() {
            body.key = generate_group_key(&body.name);
        }
        let created: Group = self.post_json(&Endpoint::rest().segment("userGroups"), &body)?;
        info!(key = %created.key, "created group");
        Ok(created)
    }

    pub fn get_group(&self, key: &str) -> Result<Option<Group>, ApiError> {
        self.get_json(&group(key))
    }

    pub fn get_group_by_name(&self, name: &str) -> Result<Option<Group>, ApiError> {
        self.get_json(&Endpoint::rest().segment("userGroups").locator(&Locator::name(name)))
    }

    pub fn delete_group(&self, key: &str) -> Result<(), ApiError> {
        self.delete(&group(key))
    }

    pub fn add_group_role(&self, key: &str, role_id: &str, scope: &str) -> Result<(), ApiError> {
        let assignment = RoleAssignment {
            role_id: role_id.to_string(),
            scope: scope.to_string(),
        };
        self.write_json(HttpMethod::Post, &group(key).segment("roles"), &assignment)?;
        Ok(())
    }

    pub fn remove_group_role(&self, key: &str, role_id: &str, scope: &str) -> Result<(), ApiError> {
        self.delete(&group(key).segment("roles").segment(role_id).segment(scope))
    }

    /// Replace the parent groups of a group.
    pub fn set_group_parents(&self, key: &str, parents: &[String]) -> Result<(), ApiError> {
        let body = ParentGroups {
            group: parents
                .iter()
                .map(|parent| Group {
                    key: parent.clone(),
                    ..Default::default()
                })
                .collect(),
        };
        self.write_json(HttpMethod::Put, &group(key).segment("parent-groups"), &body)?;
        Ok(())
    }

    pub fn add_group_member(&self, key: &str, username: &str) -> Result<(), ApiError> {
        let body = Group {
            key: key.to_string(),
            ..Default::default()
        };
        self.write_json(
            HttpMethod::Post,
            &user(&Locator::username(username)).segment("groups"),
            &body,
        )?;
        Ok(())
    }

    /// Whether `username` belongs to the group.
    pub fn is_group_member(&self, key: &str, username: &str) -> Result<bool, ApiError> {
        let endpoint = user(&Locator::username(username))
            .segment("groups")
            .segment(key);
        let member: Option<Group> = self.get_json(&endpoint)?;
        Ok(member.is_some())
    }

    pub fn remove_group_member(&self, key: &str, username: &str) -> Result<(), ApiError> {
        self.delete(
            &user(&Locator::username(username))
                .segment("groups")
                .segment(key),
        )
    }

    // -----------------------------------------------------------------------
    // Roles
    // -----------------------------------------------------------------------

    pub fn create_role(&self, new_role: &Role) -> Result<Role, ApiError> {
        self.post_json(&Endpoint::rest().segment("roles"), new_role)
    }

    pub fn get_role(&self, id: &str) -> Result<Option<Role>, ApiError> {
        self.get_json(&role(id))
    }

    pub fn delete_role(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&role(id))
    }

    pub fn add_included_role(&self, id: &str, included: &str) -> Result<Role, ApiError> {
        self.role_member(HttpMethod::Put, role(id).segment("included").segment(included))
    }

    pub fn remove_included_role(&self, id: &str, included: &str) -> Result<Role, ApiError> {
        self.role_member(HttpMethod::Delete, role(id).segment("included").segment(included))
    }

    pub fn add_permission(&self, id: &str, permission: &str) -> Result<Role, ApiError> {
        self.role_member(HttpMethod::Put, role(id).segment("permissions").segment(permission))
    }

    pub fn remove_permission(&self, id: &str, permission: &str) -> Result<Role, ApiError> {
        self.role_member(HttpMethod::Delete, role(id).segment("permissions").segment(permission))
    }

    fn role_member(&self, method: HttpMethod, endpoint: Endpoint) -> Result<Role, ApiError> {
        let request = self.build_request(method, &endpoint, None, ContentType::Json)?;
        let response = expect_found(&request.label(), self.send(&request)?)?;
        decode(&request.label(), &response.body)
    }
}
