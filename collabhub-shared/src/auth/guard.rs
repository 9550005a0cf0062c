//! Ownership-based authorization policy
//!
//! Every mutating lifecycle operation asks the guard before touching the
//! store. The predicates are pure: they only look at the caller id and the
//! ownership fields already loaded for the resource.
//!
//! # Rules
//!
//! | Action                 | Allowed when                                       |
//! |------------------------|----------------------------------------------------|
//! | update project         | any caller, or owner only under `OwnerOnly` policy |
//! | delete project         | caller owns the project                            |
//! | add project members    | caller owns the project                            |
//! | remove project members | caller owns the project and target is not owner    |
//! | set document status    | caller owns the document's project                 |
//! | delete note            | caller wrote the note                              |
//!
//! # Example
//!
//! ```
//! use collabhub_shared::auth::guard::{Action, AuthorizationGuard, Decision};
//! # use collabhub_shared::models::{Project, ProjectStatus};
//! # use chrono::Utc;
//! # use uuid::Uuid;
//! # let project = Project {
//! #     id: Uuid::new_v4(), org_id: Uuid::new_v4(), name: "Launch".into(),
//! #     description: None, status: ProjectStatus::Active, owner_id: "user_owner".into(),
//! #     assigned_to: None, start_date: None, due_date: None,
//! #     created_at: Utc::now(), updated_at: Utc::now(),
//! # };
//!
//! let guard = AuthorizationGuard::default();
//!
//! assert!(guard.can_delete_project("user_owner", &project).is_allowed());
//!
//! match guard.can_delete_project("user_other", &project) {
//!     Decision::Deny(denial) => assert_eq!(denial.action, Action::DeleteProject),
//!     Decision::Allow => unreachable!(),
//! }
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::models::{Note, Project};

/// Guarded operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    UpdateProject,
    DeleteProject,
    AddMember,
    RemoveMember,
    SetDocumentStatus,
    DeleteNote,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::UpdateProject => "update project",
            Action::DeleteProject => "delete project",
            Action::AddMember => "add project members",
            Action::RemoveMember => "remove project members",
            Action::SetDocumentStatus => "set document status",
            Action::DeleteNote => "delete note",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialKind {
    /// Caller lacks the right to perform the action
    NotPermitted,

    /// Caller has the right, but the target is protected (the owner's membership)
    ProtectedResource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    pub action: Action,
    pub reason: String,
    pub kind: DenialKind,
}

impl From<Denial> for ServiceError {
    fn from(denial: Denial) -> Self {
        match denial.kind {
            DenialKind::NotPermitted => ServiceError::Authorization {
                action: denial.action,
                reason: denial.reason,
            },
            DenialKind::ProtectedResource => ServiceError::validation("user_id", denial.reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

impl Decision {
    fn deny(action: Action, reason: &str) -> Self {
        Decision::Deny(Denial {
            action,
            reason: reason.to_string(),
            kind: DenialKind::NotPermitted,
        })
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Converts a denial into the matching [`ServiceError`]
    pub fn into_result(self) -> Result<(), ServiceError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(denial) => Err(denial.into()),
        }
    }
}

/// Who may edit a project's fields
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectEditPolicy {
    /// Any authenticated caller
    #[default]
    AnyAuthenticated,

    /// Only the project owner
    OwnerOnly,
}

impl FromStr for ProjectEditPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "any_authenticated" => Ok(ProjectEditPolicy::AnyAuthenticated),
            "owner_only" => Ok(ProjectEditPolicy::OwnerOnly),
            other => Err(format!("Unknown project edit policy: {}", other)),
        }
    }
}

/// Stateless policy checks; the only setting is the project edit policy
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorizationGuard {
    edit_policy: ProjectEditPolicy,
}

impl AuthorizationGuard {
    pub fn new(edit_policy: ProjectEditPolicy) -> Self {
        Self { edit_policy }
    }

    pub fn edit_policy(&self) -> ProjectEditPolicy {
        self.edit_policy
    }

    pub fn can_update_project(&self, caller: &str, project: &Project) -> Decision {
        match self.edit_policy {
            ProjectEditPolicy::AnyAuthenticated => Decision::Allow,
            ProjectEditPolicy::OwnerOnly => owner_only(
                caller,
                project,
                Action::UpdateProject,
                "Only project owner can update the project",
            ),
        }
    }

    pub fn can_delete_project(&self, caller: &str, project: &Project) -> Decision {
        owner_only(
            caller,
            project,
            Action::DeleteProject,
            "Only project owner can delete the project",
        )
    }

    pub fn can_add_member(&self, caller: &str, project: &Project) -> Decision {
        owner_only(
            caller,
            project,
            Action::AddMember,
            "Only project owner can add members",
        )
    }

    /// Ownership is checked before the protected-membership rules, so a
    /// non-owner trying to remove the owner gets an authorization denial.
    /// The assignee keeps their membership until the project is reassigned.
    pub fn can_remove_member(&self, caller: &str, project: &Project, target: &str) -> Decision {
        let decision = owner_only(
            caller,
            project,
            Action::RemoveMember,
            "Only project owner can remove members",
        );
        if !decision.is_allowed() {
            return decision;
        }

        if target == project.owner_id {
            return Decision::Deny(Denial {
                action: Action::RemoveMember,
                reason: "Cannot remove project owner".to_string(),
                kind: DenialKind::ProtectedResource,
            });
        }

        if project.assigned_to.as_deref() == Some(target) {
            return Decision::Deny(Denial {
                action: Action::RemoveMember,
                reason: "Cannot remove the project assignee; reassign the project first".to_string(),
                kind: DenialKind::ProtectedResource,
            });
        }

        Decision::Allow
    }

    pub fn can_set_document_status(&self, caller: &str, project: &Project) -> Decision {
        owner_only(
            caller,
            project,
            Action::SetDocumentStatus,
            "Only project owner can change document status",
        )
    }

    /// Authorship only; owning the project grants nothing here
    pub fn can_delete_note(&self, caller: &str, note: &Note) -> Decision {
        if caller == note.user_id {
            Decision::Allow
        } else {
            Decision::deny(Action::DeleteNote, "Unauthorized to delete this note")
        }
    }
}

fn owner_only(caller: &str, project: &Project, action: Action, reason: &str) -> Decision {
    if caller == project.owner_id {
        Decision::Allow
    } else {
        Decision::deny(action, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProjectStatus;
    use chrono::Utc;
    use uuid::Uuid;

    fn project(owner: &str) -> Project {
        Project {
            id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
            name: "Launch".to_string(),
            description: None,
            status: ProjectStatus::Active,
            owner_id: owner.to_string(),
            assigned_to: None,
            start_date: None,
            due_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn note(author: &str) -> Note {
        Note {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            user_id: author.to_string(),
            content: "hello".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn denial(decision: Decision) -> Denial {
        match decision {
            Decision::Deny(denial) => denial,
            Decision::Allow => panic!("expected denial"),
        }
    }

    #[test]
    fn test_owner_passes_every_owner_check() {
        let guard = AuthorizationGuard::default();
        let p = project("owner");

        assert!(guard.can_delete_project("owner", &p).is_allowed());
        assert!(guard.can_add_member("owner", &p).is_allowed());
        assert!(guard.can_remove_member("owner", &p, "someone").is_allowed());
        assert!(guard.can_set_document_status("owner", &p).is_allowed());
    }

    #[test]
    fn test_non_owner_is_not_permitted() {
        let guard = AuthorizationGuard::default();
        let p = project("owner");

        for (decision, action) in [
            (guard.can_delete_project("other", &p), Action::DeleteProject),
            (guard.can_add_member("other", &p), Action::AddMember),
            (guard.can_remove_member("other", &p, "x"), Action::RemoveMember),
            (guard.can_set_document_status("other", &p), Action::SetDocumentStatus),
        ] {
            let denial = denial(decision);
            assert_eq!(denial.action, action);
            assert_eq!(denial.kind, DenialKind::NotPermitted);
        }
    }

    #[test]
    fn test_owner_membership_is_protected() {
        let guard = AuthorizationGuard::default();
        let p = project("owner");

        let denial = denial(guard.can_remove_member("owner", &p, "owner"));
        assert_eq!(denial.kind, DenialKind::ProtectedResource);

        let err: ServiceError = denial.into();
        assert!(matches!(err, ServiceError::Validation { .. }));
    }

    #[test]
    fn test_assignee_membership_is_protected() {
        let guard = AuthorizationGuard::default();
        let mut p = project("owner");
        p.assigned_to = Some("assignee".to_string());

        let denial = denial(guard.can_remove_member("owner", &p, "assignee"));
        assert_eq!(denial.kind, DenialKind::ProtectedResource);
        assert!(guard.can_remove_member("owner", &p, "someone").is_allowed());
    }

    #[test]
    fn test_non_owner_removing_owner_is_authorization_failure() {
        let guard = AuthorizationGuard::default();
        let p = project("owner");

        let denial = denial(guard.can_remove_member("other", &p, "owner"));
        assert_eq!(denial.kind, DenialKind::NotPermitted);
    }

    #[test]
    fn test_note_deletion_requires_authorship() {
        let guard = AuthorizationGuard::default();
        let n = note("author");

        assert!(guard.can_delete_note("author", &n).is_allowed());
        let denial = denial(guard.can_delete_note("project_owner", &n));
        assert_eq!(denial.action, Action::DeleteNote);
    }

    #[test]
    fn test_edit_policy() {
        let p = project("owner");

        let open = AuthorizationGuard::default();
        assert!(open.can_update_project("anyone", &p).is_allowed());

        let strict = AuthorizationGuard::new(ProjectEditPolicy::OwnerOnly);
        assert!(strict.can_update_project("owner", &p).is_allowed());
        assert!(!strict.can_update_project("anyone", &p).is_allowed());
    }

    #[test]
    fn test_edit_policy_from_str() {
        assert_eq!(
            "owner_only".parse::<ProjectEditPolicy>().unwrap(),
            ProjectEditPolicy::OwnerOnly
        );
        assert_eq!(
            "ANY_AUTHENTICATED".parse::<ProjectEditPolicy>().unwrap(),
            ProjectEditPolicy::AnyAuthenticated
        );
        assert!("admins".parse::<ProjectEditPolicy>().is_err());
    }

    #[test]
    fn test_into_result() {
        let guard = AuthorizationGuard::default();
        let err = guard
            .can_delete_project("other", &project("owner"))
            .into_result()
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Authorization { action: Action::DeleteProject, .. }
        ));
    }
}
