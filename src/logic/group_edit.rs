use crate::error::{DraftError, GroupSaveError, SubmitError};
use crate::feedback::FeedbackReporter;
use crate::logic::draft::{Draft, DraftStore};
use crate::model::{
    ErrorDetail, Id, MessageKey, ScreenGroup, ScreenGroupInput, UpdateScreenGroupRequest,
    WriteStatus,
};
use crate::store::traits::ScreenGroupChannel;
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Editing a screen group's own attributes. One write per save, no
/// relations.
pub struct GroupEditSession<A> {
    group_id: Id,
    api: Arc<A>,
    reporter: Arc<dyn FeedbackReporter>,
    draft: DraftStore,
    saving: WriteStatus,
    in_flight: Option<JoinHandle<Result<ScreenGroup, ErrorDetail>>>,
    last_saved: Option<ScreenGroup>,
}

impl<A> GroupEditSession<A>
where
    A: ScreenGroupChannel + 'static,
{
    pub fn new(group_id: impl Into<Id>, api: Arc<A>, reporter: Arc<dyn FeedbackReporter>) -> Self {
        Self {
            group_id: group_id.into(),
            api,
            reporter,
            draft: DraftStore::new(),
            saving: WriteStatus::Idle,
            in_flight: None,
            last_saved: None,
        }
    }

    pub fn group_id(&self) -> &Id {
        &self.group_id
    }

    pub fn draft(&self) -> Arc<Draft> {
        self.draft.get()
    }

    pub fn hydrate(&mut self, snapshot: &ScreenGroup) -> Result<(), DraftError> {
        self.draft.hydrate(Draft::from_snapshot(snapshot)?)
    }

    pub fn set_field(&mut self, path: &str, value: Value) -> Result<(), DraftError> {
        self.draft.set_field(path, value)
    }

    pub fn status(&self) -> WriteStatus {
        self.saving
    }

    pub fn busy(&self) -> bool {
        self.saving.is_pending()
    }

    pub fn loading_message(&self) -> Option<MessageKey> {
        self.busy().then_some(MessageKey::SavingGroup)
    }

    pub fn last_saved(&self) -> Option<&ScreenGroup> {
        self.last_saved.as_ref()
    }

    /// Fetch the group and take it as the draft, discarding local edits.
    pub async fn load(&mut self) -> Result<(), ErrorDetail> {
        log::info!("{} {}", MessageKey::LoadingGroup.default_text(), self.group_id);
        match self.api.get_screen_group(&self.group_id).await {
            Ok(group) => {
                let draft = Draft::from_snapshot(&group)
                    .map_err(|e| ErrorDetail::transport(e.to_string()))?;
                self.draft.reload(draft);
                Ok(())
            }
            Err(detail) => {
                let message = format!(
                    "{} {}",
                    MessageKey::LoadGroupError.default_text(),
                    self.group_id
                );
                self.reporter.notify_error(&message, &detail);
                Err(detail)
            }
        }
    }

    /// Issue the write for the current draft. Must be called from within a
    /// tokio runtime.
    pub fn submit(&mut self) -> Result<(), SubmitError> {
        if self.busy() {
            return Err(SubmitError::SaveInProgress);
        }

        let group: ScreenGroup = self.draft.get().to_entity()?;
        let request =
            UpdateScreenGroupRequest::new(self.group_id.clone(), ScreenGroupInput::from(&group));
        log::debug!("Issuing screen group write for {}", self.group_id);

        let api = Arc::clone(&self.api);
        self.in_flight = Some(tokio::spawn(async move {
            api.update_screen_group(request).await
        }));
        self.saving = WriteStatus::Pending;
        Ok(())
    }

    /// Wait for the pending write and report its outcome. `None` when no
    /// write is pending.
    pub async fn finish(&mut self) -> Option<Result<ScreenGroup, ErrorDetail>> {
        let handle = self.in_flight.take()?;
        let result = match handle.await {
            Ok(result) => result,
            Err(err) => Err(ErrorDetail::transport(format!("write task failed: {}", err))),
        };

        match &result {
            Ok(saved) => {
                self.last_saved = Some(saved.clone());
                self.reporter
                    .notify_success(MessageKey::SavedGroup.default_text());
            }
            Err(detail) => {
                self.reporter
                    .notify_error(MessageKey::SaveGroupError.default_text(), detail);
            }
        }
        self.saving = WriteStatus::Idle;
        Some(result)
    }

    /// Submit and wait for the write.
    pub async fn save(&mut self) -> Result<ScreenGroup, GroupSaveError> {
        self.submit()?;
        match self.finish().await {
            Some(Ok(saved)) => Ok(saved),
            Some(Err(detail)) => Err(GroupSaveError::Write(detail)),
            None => Err(SubmitError::SaveInProgress.into()),
        }
    }
}
