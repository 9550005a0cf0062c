//! Data model for CollabHub
//!
//! Plain record types plus the explicit joined shapes returned by list
//! queries. Persistence lives behind the [`Store`](crate::store::Store)
//! capability; these types carry no database handles.
//!
//! # Models
//!
//! - `user`: Users mirrored from the identity provider
//! - `organization`: Tenants and organization memberships (mirrored)
//! - `project`: Projects and project memberships
//! - `document`: Uploaded documents backed by blob storage
//! - `note`: Free-text project notes

pub mod document;
pub mod note;
pub mod organization;
pub mod project;
pub mod user;

pub use document::{Document, DocumentStatus, DocumentWithUploader, NewDocument};
pub use note::{NewNote, Note, NoteWithAuthor};
pub use organization::{OrgMemberWithUser, OrgMembership, Organization, UpsertOrganization};
pub use project::{
    MembershipWithUser, NewProject, Project, ProjectChanges, ProjectDetail, ProjectMembership,
    ProjectStatus, ProjectWithOwner,
};
pub use user::{UpsertUser, User, UserSummary};
