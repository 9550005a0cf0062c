//! PostgreSQL implementation of the store capability
//!
//! Upserts use `INSERT ... ON CONFLICT ... DO UPDATE` on the natural keys
//! (`users.id`, `organizations.external_org_id`, `org_members(org_id, user_id)`),
//! so replaying the same write leaves the row unchanged apart from
//! `updated_at`. Cascading deletes are declared in the schema.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::models::{
    Document, DocumentStatus, DocumentWithUploader, MembershipWithUser, NewDocument, NewNote,
    NewProject, Note, NoteWithAuthor, OrgMemberWithUser, OrgMembership, Organization, Project,
    ProjectChanges, ProjectDetail, ProjectMembership, ProjectWithOwner, UpsertOrganization,
    UpsertUser, User, UserSummary,
};

const USER_COLUMNS: &str = "id, email, first_name, last_name, avatar_url, created_at, updated_at";
const ORG_COLUMNS: &str = "id, external_org_id, name, slug, created_at, updated_at";
const PROJECT_COLUMNS: &str = "id, org_id, name, description, status, owner_id, assigned_to, \
     start_date, due_date, created_at, updated_at";
const DOCUMENT_COLUMNS: &str = "id, project_id, name, file_path, file_size, file_type, status, \
     uploaded_by, created_at, updated_at";
const NOTE_COLUMNS: &str = "id, project_id, user_id, content, created_at, updated_at";

/// Store backed by a PostgreSQL connection pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps sqlx errors onto store error kinds
fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        let constraint = db_err.constraint().unwrap_or("unknown").to_string();
        if db_err.is_unique_violation() {
            return StoreError::Conflict(constraint);
        }
        if db_err.is_foreign_key_violation() {
            return StoreError::ForeignKey(constraint);
        }
    }
    StoreError::Backend(err.to_string())
}

/// Builds the joined profile when the LEFT JOIN found a user row
fn joined_user(
    id: &str,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    avatar_url: Option<String>,
) -> Option<UserSummary> {
    email.map(|email| UserSummary {
        id: id.to_string(),
        email,
        first_name,
        last_name,
        avatar_url,
    })
}

#[derive(sqlx::FromRow)]
struct ProjectOwnerRow {
    #[sqlx(flatten)]
    project: Project,
    owner_email: Option<String>,
    owner_first_name: Option<String>,
    owner_last_name: Option<String>,
    owner_avatar_url: Option<String>,
}

impl From<ProjectOwnerRow> for ProjectWithOwner {
    fn from(row: ProjectOwnerRow) -> Self {
        let owner = joined_user(
            &row.project.owner_id,
            row.owner_email,
            row.owner_first_name,
            row.owner_last_name,
            row.owner_avatar_url,
        );
        ProjectWithOwner {
            project: row.project,
            owner,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrgMemberRow {
    #[sqlx(flatten)]
    membership: OrgMembership,
    user_email: Option<String>,
    user_first_name: Option<String>,
    user_last_name: Option<String>,
    user_avatar_url: Option<String>,
}

#[derive(sqlx::FromRow)]
struct ProjectMemberRow {
    #[sqlx(flatten)]
    membership: ProjectMembership,
    user_email: Option<String>,
    user_first_name: Option<String>,
    user_last_name: Option<String>,
    user_avatar_url: Option<String>,
}

#[derive(sqlx::FromRow)]
struct DocumentUploaderRow {
    #[sqlx(flatten)]
    document: Document,
    user_email: Option<String>,
    user_first_name: Option<String>,
    user_last_name: Option<String>,
    user_avatar_url: Option<String>,
}

#[derive(sqlx::FromRow)]
struct NoteAuthorRow {
    #[sqlx(flatten)]
    note: Note,
    user_email: Option<String>,
    user_first_name: Option<String>,
    user_last_name: Option<String>,
    user_avatar_url: Option<String>,
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        crate::db::pool::health_check(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn upsert_user(&self, user: UpsertUser) -> StoreResult<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, email, first_name, last_name, avatar_url)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                email = EXCLUDED.email,
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                avatar_url = EXCLUDED.avatar_url,
                updated_at = NOW()
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(user.email)
        .bind(user.first_name)
        .bind(user.last_name)
        .bind(user.avatar_url)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn find_user(&self, id: &str) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn upsert_organization(&self, org: UpsertOrganization) -> StoreResult<Organization> {
        sqlx::query_as::<_, Organization>(&format!(
            r#"
            INSERT INTO organizations (external_org_id, name, slug)
            VALUES ($1, $2, $3)
            ON CONFLICT (external_org_id) DO UPDATE SET
                name = EXCLUDED.name,
                slug = EXCLUDED.slug,
                updated_at = NOW()
            RETURNING {ORG_COLUMNS}
            "#
        ))
        .bind(org.external_org_id)
        .bind(org.name)
        .bind(org.slug)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn find_organization_by_external_id(
        &self,
        external_org_id: &str,
    ) -> StoreResult<Option<Organization>> {
        sqlx::query_as::<_, Organization>(&format!(
            "SELECT {ORG_COLUMNS} FROM organizations WHERE external_org_id = $1"
        ))
        .bind(external_org_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn upsert_org_membership(
        &self,
        org_id: Uuid,
        user_id: &str,
        role: &str,
    ) -> StoreResult<OrgMembership> {
        sqlx::query_as::<_, OrgMembership>(
            r#"
            INSERT INTO org_members (org_id, user_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (org_id, user_id) DO UPDATE SET role = EXCLUDED.role
            RETURNING id, org_id, user_id, role, created_at
            "#,
        )
        .bind(org_id)
        .bind(user_id)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn delete_org_membership(&self, org_id: Uuid, user_id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM org_members WHERE org_id = $1 AND user_id = $2")
            .bind(org_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_org_members(&self, org_id: Uuid) -> StoreResult<Vec<OrgMemberWithUser>> {
        let rows = sqlx::query_as::<_, OrgMemberRow>(
            r#"
            SELECT m.id, m.org_id, m.user_id, m.role, m.created_at,
                   u.email AS user_email, u.first_name AS user_first_name,
                   u.last_name AS user_last_name, u.avatar_url AS user_avatar_url
            FROM org_members m
            LEFT JOIN users u ON u.id = m.user_id
            WHERE m.org_id = $1
            ORDER BY m.created_at DESC
            "#,
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let user = joined_user(
                    &row.membership.user_id,
                    row.user_email,
                    row.user_first_name,
                    row.user_last_name,
                    row.user_avatar_url,
                );
                OrgMemberWithUser {
                    membership: row.membership,
                    user,
                }
            })
            .collect())
    }

    async fn insert_project(&self, project: NewProject) -> StoreResult<Project> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            INSERT INTO projects (org_id, name, description, status, owner_id, assigned_to, start_date, due_date)
            VALUES ($1, $2, $3, 'active', $4, $5, $6, $7)
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(project.org_id)
        .bind(project.name)
        .bind(project.description)
        .bind(project.owner_id)
        .bind(project.assigned_to)
        .bind(project.start_date)
        .bind(project.due_date)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        sqlx::query_as::<_, Project>(&format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn find_project_detail(&self, id: Uuid) -> StoreResult<Option<ProjectDetail>> {
        let row = sqlx::query_as::<_, ProjectOwnerRow>(
            r#"
            SELECT p.*,
                   u.email AS owner_email, u.first_name AS owner_first_name,
                   u.last_name AS owner_last_name, u.avatar_url AS owner_avatar_url
            FROM projects p
            LEFT JOIN users u ON u.id = p.owner_id
            WHERE p.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let documents = sqlx::query_as::<_, Document>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE project_id = $1 ORDER BY created_at DESC"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let ProjectWithOwner { project, owner } = row.into();
        Ok(Some(ProjectDetail {
            project,
            owner,
            documents,
        }))
    }

    async fn update_project(&self, id: Uuid, changes: ProjectChanges) -> StoreResult<Option<Project>> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            UPDATE projects SET
                name = $2,
                description = $3,
                status = $4,
                start_date = $5,
                due_date = $6,
                assigned_to = $7,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.description)
        .bind(changes.status)
        .bind(changes.start_date)
        .bind(changes.due_date)
        .bind(changes.assigned_to)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_projects(&self, org_id: Uuid) -> StoreResult<Vec<ProjectWithOwner>> {
        let rows = sqlx::query_as::<_, ProjectOwnerRow>(
            r#"
            SELECT p.*,
                   u.email AS owner_email, u.first_name AS owner_first_name,
                   u.last_name AS owner_last_name, u.avatar_url AS owner_avatar_url
            FROM projects p
            LEFT JOIN users u ON u.id = p.owner_id
            WHERE p.org_id = $1
            ORDER BY p.created_at DESC
            "#,
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ProjectWithOwner::from).collect())
    }

    async fn insert_project_member(
        &self,
        project_id: Uuid,
        user_id: &str,
    ) -> StoreResult<ProjectMembership> {
        sqlx::query_as::<_, ProjectMembership>(
            r#"
            INSERT INTO project_members (project_id, user_id)
            VALUES ($1, $2)
            RETURNING id, project_id, user_id, created_at
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn is_project_member(&self, project_id: Uuid, user_id: &str) -> StoreResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM project_members
                WHERE project_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn delete_project_member(&self, project_id: Uuid, user_id: &str) -> StoreResult<bool> {
        let result =
            sqlx::query("DELETE FROM project_members WHERE project_id = $1 AND user_id = $2")
                .bind(project_id)
                .bind(user_id)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_project_members(&self, project_id: Uuid) -> StoreResult<Vec<MembershipWithUser>> {
        let rows = sqlx::query_as::<_, ProjectMemberRow>(
            r#"
            SELECT m.id, m.project_id, m.user_id, m.created_at,
                   u.email AS user_email, u.first_name AS user_first_name,
                   u.last_name AS user_last_name, u.avatar_url AS user_avatar_url
            FROM project_members m
            LEFT JOIN users u ON u.id = m.user_id
            WHERE m.project_id = $1
            ORDER BY m.created_at DESC
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let user = joined_user(
                    &row.membership.user_id,
                    row.user_email,
                    row.user_first_name,
                    row.user_last_name,
                    row.user_avatar_url,
                );
                MembershipWithUser {
                    membership: row.membership,
                    user,
                }
            })
            .collect())
    }

    async fn insert_document(&self, document: NewDocument) -> StoreResult<Document> {
        sqlx::query_as::<_, Document>(&format!(
            r#"
            INSERT INTO documents (project_id, name, file_path, file_size, file_type, status, uploaded_by)
            VALUES ($1, $2, $3, $4, $5, 'draft', $6)
            RETURNING {DOCUMENT_COLUMNS}
            "#
        ))
        .bind(document.project_id)
        .bind(document.name)
        .bind(document.file_path)
        .bind(document.file_size)
        .bind(document.file_type)
        .bind(document.uploaded_by)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn find_document(&self, id: Uuid) -> StoreResult<Option<Document>> {
        sqlx::query_as::<_, Document>(&format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn set_document_status(
        &self,
        id: Uuid,
        status: DocumentStatus,
    ) -> StoreResult<Option<Document>> {
        sqlx::query_as::<_, Document>(&format!(
            r#"
            UPDATE documents SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {DOCUMENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn delete_document(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_documents(&self, project_id: Uuid) -> StoreResult<Vec<DocumentWithUploader>> {
        let rows = sqlx::query_as::<_, DocumentUploaderRow>(
            r#"
            SELECT d.*,
                   u.email AS user_email, u.first_name AS user_first_name,
                   u.last_name AS user_last_name, u.avatar_url AS user_avatar_url
            FROM documents d
            LEFT JOIN users u ON u.id = d.uploaded_by
            WHERE d.project_id = $1
            ORDER BY d.created_at DESC
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let uploader = joined_user(
                    &row.document.uploaded_by,
                    row.user_email,
                    row.user_first_name,
                    row.user_last_name,
                    row.user_avatar_url,
                );
                DocumentWithUploader {
                    document: row.document,
                    uploader,
                }
            })
            .collect())
    }

    async fn insert_note(&self, note: NewNote) -> StoreResult<Note> {
        sqlx::query_as::<_, Note>(&format!(
            r#"
            INSERT INTO project_notes (project_id, user_id, content)
            VALUES ($1, $2, $3)
            RETURNING {NOTE_COLUMNS}
            "#
        ))
        .bind(note.project_id)
        .bind(note.user_id)
        .bind(note.content)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn find_note(&self, id: Uuid) -> StoreResult<Option<Note>> {
        sqlx::query_as::<_, Note>(&format!("SELECT {NOTE_COLUMNS} FROM project_notes WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn delete_note(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM project_notes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_notes(&self, project_id: Uuid) -> StoreResult<Vec<NoteWithAuthor>> {
        let rows = sqlx::query_as::<_, NoteAuthorRow>(
            r#"
            SELECT n.*,
                   u.email AS user_email, u.first_name AS user_first_name,
                   u.last_name AS user_last_name, u.avatar_url AS user_avatar_url
            FROM project_notes n
            LEFT JOIN users u ON u.id = n.user_id
            WHERE n.project_id = $1
            ORDER BY n.created_at DESC
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let user = joined_user(
                    &row.note.user_id,
                    row.user_email,
                    row.user_first_name,
                    row.user_last_name,
                    row.user_avatar_url,
                );
                NoteWithAuthor {
                    note: row.note,
                    user,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joined_user_requires_email() {
        assert!(joined_user("user_1", None, Some("Ada".into()), None, None).is_none());

        let user = joined_user("user_1", Some("ada@example.com".into()), None, None, None).unwrap();
        assert_eq!(user.id, "user_1");
        assert_eq!(user.email, "ada@example.com");
    }

    #[test]
    fn test_non_database_errors_are_backend_errors() {
        let err = map_sqlx_error(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Backend(_)));
    }
}
