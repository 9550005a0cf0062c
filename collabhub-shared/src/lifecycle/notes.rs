use tracing::info;
use uuid::Uuid;

use super::{authenticated, required, ResourceLifecycleManager};
use crate::auth::CallerIdentity;
use crate::error::{ServiceError, ServiceResult};
use crate::invalidation::ViewScope;
use crate::models::{NewNote, Note, NoteWithAuthor};

impl ResourceLifecycleManager {
    pub async fn create_note(
        &self,
        caller: &CallerIdentity,
        project_id: Uuid,
        content: &str,
    ) -> ServiceResult<Note> {
        let caller_id = authenticated(caller)?;
        let content = required("content", content, "Note content is required")?;
        self.load_project(project_id).await?;

        let note = self
            .store
            .insert_note(NewNote {
                project_id,
                user_id: caller_id.to_string(),
                content,
            })
            .await?;

        info!(note_id = %note.id, project_id = %project_id, caller = %caller_id, "Note created");
        self.announce(&[ViewScope::Project(project_id)]).await;
        Ok(note)
    }

    /// Only the author may delete a note, whoever owns the project
    pub async fn delete_note(
        &self,
        caller: &CallerIdentity,
        project_id: Uuid,
        note_id: Uuid,
    ) -> ServiceResult<()> {
        let caller_id = authenticated(caller)?;
        let note = self
            .store
            .find_note(note_id)
            .await?
            .filter(|note| note.project_id == project_id)
            .ok_or_else(|| ServiceError::not_found("Note"))?;

        self.guard.can_delete_note(caller_id, &note).into_result()?;

        self.store.delete_note(note_id).await?;

        info!(note_id = %note_id, project_id = %project_id, caller = %caller_id, "Note deleted");
        self.announce(&[ViewScope::Project(project_id)]).await;
        Ok(())
    }

    pub async fn list_notes(
        &self,
        caller: &CallerIdentity,
        project_id: Uuid,
    ) -> ServiceResult<Vec<NoteWithAuthor>> {
        authenticated(caller)?;
        self.load_project(project_id).await?;

        Ok(self.store.list_notes(project_id).await?)
    }
}
