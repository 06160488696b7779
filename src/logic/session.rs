use crate::error::{DraftError, SubmitError};
use crate::feedback::FeedbackReporter;
use crate::logic::builders::ReferencePolicy;
use crate::logic::draft::{Draft, DraftStore};
use crate::logic::orchestrator::{
    Completion, Dispatch, SaveOrchestrator, Transition, WriteOutcome, WriteRequest,
};
use crate::model::{
    Channel, ErrorDetail, Id, MessageKey, Notification, SaveReport, Screen, WriteStatus,
};
use crate::store::traits::{ScreenReader, WriteChannel};
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinSet;

/// One user editing one screen: the draft, its save state machine and the
/// writes currently in flight.
///
/// Completions are applied strictly one at a time through [`next_event`],
/// so the orchestrator never sees two transitions interleave. Dropping the
/// session abandons whatever is still in flight; those results are never
/// observed.
///
/// [`next_event`]: ScreenEditSession::next_event
pub struct ScreenEditSession<A> {
    api: Arc<A>,
    reporter: Arc<dyn FeedbackReporter>,
    draft: DraftStore,
    orchestrator: SaveOrchestrator,
    in_flight: JoinSet<Completion>,
    last_saved: Option<Screen>,
}

impl<A> ScreenEditSession<A>
where
    A: WriteChannel + 'static,
{
    pub fn new(
        screen_id: impl Into<Id>,
        api: Arc<A>,
        reporter: Arc<dyn FeedbackReporter>,
        policy: ReferencePolicy,
    ) -> Self {
        Self {
            api,
            reporter,
            draft: DraftStore::new(),
            orchestrator: SaveOrchestrator::new(screen_id, policy),
            in_flight: JoinSet::new(),
            last_saved: None,
        }
    }

    pub fn screen_id(&self) -> &Id {
        self.orchestrator.screen_id()
    }

    pub fn draft(&self) -> Arc<Draft> {
        self.draft.get()
    }

    pub fn hydrate(&mut self, snapshot: &Screen) -> Result<(), DraftError> {
        self.draft.hydrate(Draft::from_snapshot(snapshot)?)
    }

    pub fn set_field(&mut self, path: &str, value: Value) -> Result<(), DraftError> {
        self.draft.set_field(path, value)
    }

    pub fn busy(&self) -> bool {
        self.orchestrator.busy()
    }

    pub fn loading_message(&self) -> Option<MessageKey> {
        self.orchestrator.loading_message()
    }

    pub fn status(&self, channel: Channel) -> WriteStatus {
        self.orchestrator.status(channel)
    }

    /// The screen as last returned by a successful primary write.
    pub fn last_saved(&self) -> Option<&Screen> {
        self.last_saved.as_ref()
    }

    /// Start a save cycle from the current draft. Must be called from within
    /// a tokio runtime; the writes run as tasks on it.
    pub fn submit(&mut self) -> Result<(), SubmitError> {
        let draft = self.draft.get();
        let mut transition = self.orchestrator.submit(&draft)?;
        self.apply(&mut transition);
        Ok(())
    }

    /// Wait for the next write to complete and apply it. `None` once nothing
    /// is in flight.
    pub async fn next_event(&mut self) -> Option<Transition> {
        let joined = self.in_flight.join_next().await?;
        let mut transition = match joined {
            Ok(completion) => self.orchestrator.on_completion(completion),
            Err(err) => {
                // the wrapper task never panics; this only happens on cancellation
                log::error!("Write task for screen {} was lost: {}", self.screen_id(), err);
                self.in_flight.shutdown().await;
                self.orchestrator
                    .abandon(ErrorDetail::transport(format!("write task lost: {}", err)))
            }
        };
        self.apply(&mut transition);
        if let Some(saved) = &transition.saved_screen {
            self.last_saved = Some(saved.clone());
        }
        Some(transition)
    }

    /// Drive the current cycle until its report is produced.
    pub async fn run_to_completion(&mut self) -> Option<SaveReport> {
        while let Some(transition) = self.next_event().await {
            if let Some(report) = transition.finished {
                return Some(report);
            }
        }
        None
    }

    /// Submit and wait for the whole cycle.
    pub async fn save(&mut self) -> Result<SaveReport, SubmitError> {
        self.submit()?;
        self.run_to_completion()
            .await
            .ok_or(SubmitError::SaveInProgress)
    }

    /// Report the transition's notifications and issue its writes, leaving
    /// `dispatches` empty.
    fn apply(&mut self, transition: &mut Transition) {
        for notification in &transition.notifications {
            report(self.reporter.as_ref(), notification);
        }
        for dispatch in std::mem::take(&mut transition.dispatches) {
            self.spawn(dispatch);
        }
    }

    fn spawn(&mut self, dispatch: Dispatch) {
        let api = Arc::clone(&self.api);
        let Dispatch { cycle, request } = dispatch;
        log::debug!("Issuing {} write (cycle {})", request.channel(), cycle);

        self.in_flight.spawn(async move {
            let fallback = request.clone();
            let write = tokio::spawn(perform(api, request));
            let outcome = match write.await {
                Ok(outcome) => outcome,
                Err(err) => WriteOutcome::failed(
                    &fallback,
                    ErrorDetail::transport(format!("write task failed: {}", err)),
                ),
            };
            Completion { cycle, outcome }
        });
    }
}

impl<A> ScreenEditSession<A>
where
    A: ScreenReader + WriteChannel + 'static,
{
    /// Fetch the screen and take it as the draft, discarding local edits.
    pub async fn load(&mut self) -> Result<(), ErrorDetail> {
        log::info!("{} {}", MessageKey::LoadingScreen.default_text(), self.screen_id());
        match self.api.get_screen(self.screen_id()).await {
            Ok(screen) => {
                let draft = Draft::from_snapshot(&screen).map_err(|e| ErrorDetail {
                    error: Some(e.to_string()),
                    ..Default::default()
                })?;
                self.draft.reload(draft);
                Ok(())
            }
            Err(detail) => {
                let message = format!(
                    "{} {}",
                    MessageKey::LoadScreenError.default_text(),
                    self.screen_id()
                );
                self.reporter.notify_error(&message, &detail);
                Err(detail)
            }
        }
    }
}

async fn perform<A: WriteChannel>(api: Arc<A>, request: WriteRequest) -> WriteOutcome {
    match request {
        WriteRequest::Screen(req) => WriteOutcome::Screen(api.update_screen(req).await),
        WriteRequest::Groups(req) => WriteOutcome::Groups(api.update_screen_groups(req).await),
        WriteRequest::RegionPlaylists(req) => {
            let region_id = req.region_id.clone();
            WriteOutcome::RegionPlaylists {
                region_id,
                result: api.update_region_playlists(req).await,
            }
        }
    }
}

pub(crate) fn report(reporter: &dyn FeedbackReporter, notification: &Notification) {
    log::debug!("[{}] {}", notification.message.key(), notification.render());
    let text = notification.message.default_text();
    if notification.is_error() {
        let detail = notification.detail.clone().unwrap_or_default();
        reporter.notify_error(text, &detail);
    } else {
        reporter.notify_success(text);
    }
}
