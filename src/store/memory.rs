use crate::model::{
    DimensionValue, ErrorDetail, Id, PlaylistAssignment, Screen, ScreenGroup,
    UpdateRegionPlaylistsRequest, UpdateScreenGroupRequest, UpdateScreenGroupsRequest,
    UpdateScreenRequest,
};
use crate::store::traits::{ScreenGroupChannel, ScreenReader, WriteChannel};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

/// A write as received by the in-memory API.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedWrite {
    Screen(UpdateScreenRequest),
    Groups(UpdateScreenGroupsRequest),
    RegionPlaylists(UpdateRegionPlaylistsRequest),
    ScreenGroup(UpdateScreenGroupRequest),
}

/// One write with the logical times it started and finished.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteRecord {
    pub write: RecordedWrite,
    pub started: u64,
    pub finished: u64,
    pub failed: bool,
}

/// Where an injected failure applies.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FailurePoint {
    Screen,
    Groups,
    Region(Id),
    ScreenGroup,
}

/// In-memory stand-in for the signage API.
#[derive(Debug, Default)]
pub struct InMemoryApi {
    screens: RwLock<HashMap<Id, Screen>>,
    screen_groups: RwLock<HashMap<Id, ScreenGroup>>,
    memberships: RwLock<HashMap<Id, Vec<Id>>>,
    /// Keyed by (screen id, region id)
    region_playlists: RwLock<HashMap<(Id, Id), Vec<PlaylistAssignment>>>,
    failures: RwLock<HashMap<FailurePoint, ErrorDetail>>,
    writes: RwLock<Vec<WriteRecord>>,
    clock: AtomicU64,
    latency: Option<Duration>,
}

impl InMemoryApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write sleeps for `latency` between its start and finish.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    pub async fn insert_screen(&self, id: impl Into<Id>, screen: Screen) {
        self.screens.write().await.insert(id.into(), screen);
    }

    pub async fn insert_screen_group(&self, id: impl Into<Id>, group: ScreenGroup) {
        self.screen_groups.write().await.insert(id.into(), group);
    }

    /// Make every later write at `point` fail with `detail`.
    pub async fn fail(&self, point: FailurePoint, detail: ErrorDetail) {
        self.failures.write().await.insert(point, detail);
    }

    pub async fn clear_failures(&self) {
        self.failures.write().await.clear();
    }

    pub async fn screen(&self, id: &str) -> Option<Screen> {
        self.screens.read().await.get(id).cloned()
    }

    pub async fn screen_group(&self, id: &str) -> Option<ScreenGroup> {
        self.screen_groups.read().await.get(id).cloned()
    }

    pub async fn memberships(&self, screen_id: &str) -> Option<Vec<Id>> {
        self.memberships.read().await.get(screen_id).cloned()
    }

    pub async fn region_playlists(&self, screen_id: &str, region_id: &str) -> Option<Vec<PlaylistAssignment>> {
        let key = (screen_id.to_string(), region_id.to_string());
        self.region_playlists.read().await.get(&key).cloned()
    }

    /// All writes in the order they finished.
    pub async fn writes(&self) -> Vec<WriteRecord> {
        self.writes.read().await.clone()
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::SeqCst)
    }

    /// Shared prologue of every write: stamp the start, wait out the latency
    /// and look up an injected failure.
    async fn begin(&self, point: FailurePoint) -> (u64, Option<ErrorDetail>) {
        let started = self.tick();
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let failure = self.failures.read().await.get(&point).cloned();
        (started, failure)
    }

    async fn record(&self, write: RecordedWrite, started: u64, failed: bool) {
        let finished = self.tick();
        self.writes.write().await.push(WriteRecord {
            write,
            started,
            finished,
            failed,
        });
    }
}

fn not_found(what: &str, id: &str) -> ErrorDetail {
    ErrorDetail::http(
        404,
        Some(serde_json::json!({ "hydra:description": format!("{} {} not found", what, id) })),
    )
}

#[async_trait::async_trait]
impl ScreenReader for InMemoryApi {
    async fn get_screen(&self, id: &Id) -> Result<Screen, ErrorDetail> {
        self.screen(id).await.ok_or_else(|| not_found("Screen", id))
    }
}

#[async_trait::async_trait]
impl WriteChannel for InMemoryApi {
    async fn update_screen(&self, request: UpdateScreenRequest) -> Result<Screen, ErrorDetail> {
        let (started, failure) = self.begin(FailurePoint::Screen).await;

        let result = match failure {
            Some(detail) => Err(detail),
            None => {
                let mut screens = self.screens.write().await;
                match screens.get_mut(&request.id) {
                    Some(screen) => {
                        let body = &request.body;
                        screen.title = body.title.clone();
                        screen.description = body.description.clone();
                        screen.size = body.size.clone();
                        screen.modified_by = body.modified_by.clone();
                        screen.created_by = body.created_by.clone();
                        screen.layout = body.layout.clone();
                        screen.location = body.location.clone();
                        screen.dimensions.width = DimensionValue::Integer(body.dimensions.width);
                        screen.dimensions.height = DimensionValue::Integer(body.dimensions.height);
                        Ok(screen.clone())
                    }
                    None => Err(not_found("Screen", &request.id)),
                }
            }
        };

        self.record(RecordedWrite::Screen(request), started, result.is_err()).await;
        result
    }

    async fn update_screen_groups(&self, request: UpdateScreenGroupsRequest) -> Result<(), ErrorDetail> {
        let (started, failure) = self.begin(FailurePoint::Groups).await;

        let result = match failure {
            Some(detail) => Err(detail),
            None => {
                self.memberships
                    .write()
                    .await
                    .insert(request.id.clone(), request.body.clone());
                Ok(())
            }
        };

        self.record(RecordedWrite::Groups(request), started, result.is_err()).await;
        result
    }

    async fn update_region_playlists(
        &self,
        request: UpdateRegionPlaylistsRequest,
    ) -> Result<(), ErrorDetail> {
        let (started, failure) = self
            .begin(FailurePoint::Region(request.region_id.clone()))
            .await;

        let result = match failure {
            Some(detail) => Err(detail),
            None => {
                let key = (request.screen_id.clone(), request.region_id.clone());
                self.region_playlists
                    .write()
                    .await
                    .insert(key, request.body.clone());
                Ok(())
            }
        };

        self.record(RecordedWrite::RegionPlaylists(request), started, result.is_err())
            .await;
        result
    }
}

#[async_trait::async_trait]
impl ScreenGroupChannel for InMemoryApi {
    async fn get_screen_group(&self, id: &Id) -> Result<ScreenGroup, ErrorDetail> {
        self.screen_group(id)
            .await
            .ok_or_else(|| not_found("Screen group", id))
    }

    async fn update_screen_group(
        &self,
        request: UpdateScreenGroupRequest,
    ) -> Result<ScreenGroup, ErrorDetail> {
        let (started, failure) = self.begin(FailurePoint::ScreenGroup).await;

        let result = match failure {
            Some(detail) => Err(detail),
            None => {
                let mut groups = self.screen_groups.write().await;
                match groups.get_mut(&request.id) {
                    Some(group) => {
                        group.title = request.body.title.clone();
                        group.description = request.body.description.clone();
                        group.modified_by = request.body.modified_by.clone();
                        group.created_by = request.body.created_by.clone();
                        Ok(group.clone())
                    }
                    None => Err(not_found("Screen group", &request.id)),
                }
            }
        };

        self.record(RecordedWrite::ScreenGroup(request), started, result.is_err())
            .await;
        result
    }
}
