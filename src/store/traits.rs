use crate::model::{
    ErrorDetail, Id, Screen, ScreenGroup, UpdateRegionPlaylistsRequest, UpdateScreenGroupRequest,
    UpdateScreenGroupsRequest, UpdateScreenRequest,
};

/// Read side used to hydrate a screen draft.
#[async_trait::async_trait]
pub trait ScreenReader: Send + Sync {
    async fn get_screen(&self, id: &Id) -> Result<Screen, ErrorDetail>;
}

/// The three independent writes behind one screen save.
#[async_trait::async_trait]
pub trait WriteChannel: Send + Sync {
    /// Update the screen's own attributes; returns the stored screen.
    async fn update_screen(&self, request: UpdateScreenRequest) -> Result<Screen, ErrorDetail>;
    /// Replace the screen's group memberships.
    async fn update_screen_groups(
        &self,
        request: UpdateScreenGroupsRequest,
    ) -> Result<(), ErrorDetail>;
    /// Replace the ordered playlists of one region of a screen.
    async fn update_region_playlists(
        &self,
        request: UpdateRegionPlaylistsRequest,
    ) -> Result<(), ErrorDetail>;
}

#[async_trait::async_trait]
pub trait ScreenGroupChannel: Send + Sync {
    async fn get_screen_group(&self, id: &Id) -> Result<ScreenGroup, ErrorDetail>;
    async fn update_screen_group(
        &self,
        request: UpdateScreenGroupRequest,
    ) -> Result<ScreenGroup, ErrorDetail>;
}

pub trait SignageApi: ScreenReader + WriteChannel + ScreenGroupChannel + Send + Sync {}
impl<T: ScreenReader + WriteChannel + ScreenGroupChannel> SignageApi for T {}
