use crate::error::{SaveError, SubmitError};
use crate::logic::builders::{build_playlist_queue, capture_group_payload, ReferencePolicy};
use crate::logic::draft::Draft;
use crate::model::{
    Channel, CycleToken, ErrorDetail, GroupWritePayload, Id, MessageKey, Notification,
    RegionOutcome, SaveQueue, SaveReport, Screen, ScreenInput, UpdateRegionPlaylistsRequest,
    UpdateScreenGroupsRequest, UpdateScreenRequest, WriteStatus,
};
use chrono::Utc;

/// A write the orchestrator wants issued on the write channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub cycle: CycleToken,
    pub request: WriteRequest,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteRequest {
    Screen(UpdateScreenRequest),
    Groups(UpdateScreenGroupsRequest),
    RegionPlaylists(UpdateRegionPlaylistsRequest),
}

impl WriteRequest {
    pub fn channel(&self) -> Channel {
        match self {
            WriteRequest::Screen(_) => Channel::Primary,
            WriteRequest::Groups(_) => Channel::Groups,
            WriteRequest::RegionPlaylists(_) => Channel::Playlists,
        }
    }
}

/// The result of one dispatched write, tagged with the cycle that issued it.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub cycle: CycleToken,
    pub outcome: WriteOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    Screen(Result<Screen, ErrorDetail>),
    Groups(Result<(), ErrorDetail>),
    RegionPlaylists {
        region_id: Id,
        result: Result<(), ErrorDetail>,
    },
}

impl WriteOutcome {
    /// A failed outcome for the channel `request` was sent on.
    pub fn failed(request: &WriteRequest, detail: ErrorDetail) -> Self {
        match request {
            WriteRequest::Screen(_) => WriteOutcome::Screen(Err(detail)),
            WriteRequest::Groups(_) => WriteOutcome::Groups(Err(detail)),
            WriteRequest::RegionPlaylists(req) => WriteOutcome::RegionPlaylists {
                region_id: req.region_id.clone(),
                result: Err(detail),
            },
        }
    }
}

/// Everything one state change asks of the caller.
#[derive(Debug, Default)]
pub struct Transition {
    pub dispatches: Vec<Dispatch>,
    pub notifications: Vec<Notification>,
    /// The screen as returned by a successful primary write.
    pub saved_screen: Option<Screen>,
    /// Set when the transition ended the cycle.
    pub finished: Option<SaveReport>,
}

#[derive(Debug)]
struct ActiveCycle {
    token: CycleToken,
    groups: Option<GroupWritePayload>,
    queue: SaveQueue,
    in_flight_region: Option<Id>,
    report: SaveReport,
}

/// Sequences the screen write, the group write and the region playlist queue
/// for one screen.
///
/// Pure state machine: `submit` and `on_completion` return the writes to
/// issue and the notifications to show, and never perform I/O themselves.
/// Dependent writes are only released by the primary write's success, and
/// region tasks are released one at a time in build order.
#[derive(Debug)]
pub struct SaveOrchestrator {
    screen_id: Id,
    policy: ReferencePolicy,
    primary: WriteStatus,
    groups: WriteStatus,
    playlists: WriteStatus,
    cycle: Option<ActiveCycle>,
}

impl SaveOrchestrator {
    pub fn new(screen_id: impl Into<Id>, policy: ReferencePolicy) -> Self {
        Self {
            screen_id: screen_id.into(),
            policy,
            primary: WriteStatus::Idle,
            groups: WriteStatus::Idle,
            playlists: WriteStatus::Idle,
            cycle: None,
        }
    }

    pub fn screen_id(&self) -> &Id {
        &self.screen_id
    }

    pub fn status(&self, channel: Channel) -> WriteStatus {
        match channel {
            Channel::Primary => self.primary,
            Channel::Groups => self.groups,
            Channel::Playlists => self.playlists,
        }
    }

    pub fn current_cycle(&self) -> Option<CycleToken> {
        self.cycle.as_ref().map(|c| c.token)
    }

    /// Region tasks built but not yet dispatched.
    pub fn queued_regions(&self) -> usize {
        self.cycle.as_ref().map_or(0, |c| c.queue.len())
    }

    pub fn busy(&self) -> bool {
        self.primary.is_pending() || self.groups.is_pending() || self.playlists_busy()
    }

    fn playlists_busy(&self) -> bool {
        self.cycle
            .as_ref()
            .is_some_and(|c| !c.queue.is_empty() || c.in_flight_region.is_some())
    }

    /// Loading text for whichever channel is pending; the screen write wins
    /// over groups, groups over playlists.
    pub fn loading_message(&self) -> Option<MessageKey> {
        if self.primary.is_pending() {
            Some(MessageKey::SavingScreen)
        } else if self.groups.is_pending() {
            Some(MessageKey::SavingGroups)
        } else if self.playlists_busy() {
            Some(MessageKey::SavingPlaylists)
        } else {
            None
        }
    }

    /// Snapshot the draft's payloads and release the primary write.
    pub fn submit(&mut self, draft: &Draft) -> Result<Transition, SubmitError> {
        if self.busy() || self.cycle.is_some() {
            return Err(SubmitError::SaveInProgress);
        }

        let screen: Screen = draft.to_entity()?;
        let body = ScreenInput::from_screen(&screen)?;
        let groups = capture_group_payload(&screen, self.policy)?;
        let queue = build_playlist_queue(&self.screen_id, &screen, self.policy)?;

        let token = CycleToken::new();
        log::debug!(
            "Submitting screen {} (cycle {}): groups={}, region tasks={}",
            self.screen_id,
            token,
            groups.as_ref().map_or("unchanged".to_string(), |g| g.len().to_string()),
            queue.len()
        );

        self.primary = WriteStatus::Pending;
        self.cycle = Some(ActiveCycle {
            token,
            groups,
            queue,
            in_flight_region: None,
            report: SaveReport::begin(token, self.screen_id.clone()),
        });

        Ok(Transition {
            dispatches: vec![Dispatch {
                cycle: token,
                request: WriteRequest::Screen(UpdateScreenRequest::new(self.screen_id.clone(), body)),
            }],
            ..Default::default()
        })
    }

    /// Apply one write result. Results from another cycle, or for a channel
    /// that is not waiting on one, are dropped without a transition.
    pub fn on_completion(&mut self, completion: Completion) -> Transition {
        let mut transition = Transition::default();

        let Some(cycle) = self.cycle.as_mut().filter(|c| c.token == completion.cycle) else {
            log::warn!(
                "Ignoring completion from stale cycle {} for screen {}",
                completion.cycle,
                self.screen_id
            );
            return transition;
        };

        match completion.outcome {
            WriteOutcome::Screen(result) => {
                if !self.primary.is_pending() {
                    log::warn!("Ignoring unexpected screen write result (cycle {})", cycle.token);
                    return transition;
                }
                match result {
                    Ok(saved) => {
                        log::debug!("Screen {} saved (cycle {})", self.screen_id, cycle.token);
                        cycle.report.primary = WriteStatus::Succeeded;
                        transition
                            .notifications
                            .push(Notification::success(MessageKey::SavedScreen));
                        transition.saved_screen = Some(saved);

                        if let Some(payload) = cycle.groups.take() {
                            self.groups = WriteStatus::Pending;
                            transition.dispatches.push(Dispatch {
                                cycle: cycle.token,
                                request: WriteRequest::Groups(UpdateScreenGroupsRequest::new(
                                    self.screen_id.clone(),
                                    payload,
                                )),
                            });
                        }
                        Self::dispatch_next_region(cycle, &mut self.playlists, &mut transition);
                    }
                    Err(detail) => {
                        log::debug!(
                            "Screen {} save failed (cycle {}): {}; dropping {} dependent region task(s)",
                            self.screen_id,
                            cycle.token,
                            detail,
                            cycle.queue.len()
                        );
                        cycle.report.primary = WriteStatus::Failed;
                        cycle.groups = None;
                        cycle.queue.clear();
                        transition
                            .notifications
                            .push(Notification::error(MessageKey::SaveScreenError, detail.clone()));
                        cycle.report.errors.push(SaveError::PrimaryWrite(detail));
                    }
                }
                self.primary = WriteStatus::Idle;
            }
            WriteOutcome::Groups(result) => {
                if !self.groups.is_pending() {
                    log::warn!("Ignoring unexpected group write result (cycle {})", cycle.token);
                    return transition;
                }
                match result {
                    Ok(()) => {
                        cycle.report.groups = WriteStatus::Succeeded;
                        transition
                            .notifications
                            .push(Notification::success(MessageKey::SavedGroups));
                    }
                    Err(detail) => {
                        cycle.report.groups = WriteStatus::Failed;
                        transition
                            .notifications
                            .push(Notification::error(MessageKey::SaveGroupsError, detail.clone()));
                        cycle.report.errors.push(SaveError::GroupWrite(detail));
                    }
                }
                self.groups = WriteStatus::Idle;
            }
            WriteOutcome::RegionPlaylists { region_id, result } => {
                if cycle.in_flight_region.as_ref() != Some(&region_id) {
                    log::warn!(
                        "Ignoring playlist result for region {} which is not in flight (cycle {})",
                        region_id,
                        cycle.token
                    );
                    return transition;
                }
                cycle.in_flight_region = None;
                match result {
                    Ok(()) => {
                        cycle.report.regions.push(RegionOutcome {
                            region_id,
                            status: WriteStatus::Succeeded,
                        });
                        transition
                            .notifications
                            .push(Notification::success(MessageKey::SavedPlaylists));
                    }
                    Err(detail) => {
                        log::debug!("Playlists for region {} failed: {}", region_id, detail);
                        cycle.report.regions.push(RegionOutcome {
                            region_id: region_id.clone(),
                            status: WriteStatus::Failed,
                        });
                        transition.notifications.push(Notification::error(
                            MessageKey::SavePlaylistsError,
                            detail.clone(),
                        ));
                        cycle
                            .report
                            .errors
                            .push(SaveError::PlaylistWrite { region_id, detail });
                    }
                }
                Self::dispatch_next_region(cycle, &mut self.playlists, &mut transition);
            }
        }

        self.finish_if_settled(&mut transition);
        transition
    }

    /// End the active cycle when its in-flight writes can no longer report.
    /// Every pending channel fails with `detail`; queued region tasks are
    /// dropped unsent.
    pub fn abandon(&mut self, detail: ErrorDetail) -> Transition {
        let mut transition = Transition::default();
        let Some(cycle) = self.cycle.as_mut() else {
            return transition;
        };
        log::warn!(
            "Abandoning save cycle {} for screen {}: {}; {} region task(s) unsent",
            cycle.token,
            self.screen_id,
            detail,
            cycle.queue.len()
        );

        if self.primary.is_pending() {
            cycle.report.primary = WriteStatus::Failed;
            transition
                .notifications
                .push(Notification::error(MessageKey::SaveScreenError, detail.clone()));
            cycle.report.errors.push(SaveError::PrimaryWrite(detail.clone()));
        }
        if self.groups.is_pending() {
            cycle.report.groups = WriteStatus::Failed;
            transition
                .notifications
                .push(Notification::error(MessageKey::SaveGroupsError, detail.clone()));
            cycle.report.errors.push(SaveError::GroupWrite(detail.clone()));
        }
        if let Some(region_id) = cycle.in_flight_region.take() {
            cycle.report.regions.push(RegionOutcome {
                region_id: region_id.clone(),
                status: WriteStatus::Failed,
            });
            transition
                .notifications
                .push(Notification::error(MessageKey::SavePlaylistsError, detail.clone()));
            cycle
                .report
                .errors
                .push(SaveError::PlaylistWrite { region_id, detail });
        }

        cycle.groups = None;
        cycle.queue.clear();
        self.primary = WriteStatus::Idle;
        self.groups = WriteStatus::Idle;
        self.playlists = WriteStatus::Idle;
        self.finish_if_settled(&mut transition);
        transition
    }

    fn finish_if_settled(&mut self, transition: &mut Transition) {
        if self.busy() {
            return;
        }
        if let Some(mut cycle) = self.cycle.take() {
            cycle.report.finished_at = Utc::now();
            log::info!(
                "Save cycle {} for screen {} finished: {} error(s)",
                cycle.token,
                self.screen_id,
                cycle.report.errors.len()
            );
            transition.finished = Some(cycle.report);
        }
    }

    fn dispatch_next_region(
        cycle: &mut ActiveCycle,
        status: &mut WriteStatus,
        transition: &mut Transition,
    ) {
        match cycle.queue.pop_front() {
            Some(task) => {
                log::debug!(
                    "Dispatching playlists for region {} ({} left in queue)",
                    task.region_id,
                    cycle.queue.len()
                );
                *status = WriteStatus::Pending;
                cycle.in_flight_region = Some(task.region_id.clone());
                transition.dispatches.push(Dispatch {
                    cycle: cycle.token,
                    request: WriteRequest::RegionPlaylists(task.into_request()),
                });
            }
            None => *status = WriteStatus::Idle,
        }
    }
}
