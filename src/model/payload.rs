use crate::error::SubmitError;
use crate::model::{Id, Screen, ScreenGroup};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Canonical group IDs for the group-membership write. Order is passed through
/// as built and duplicates are not removed.
pub type GroupWritePayload = Vec<Id>;

/// Region tasks in drain order for one submit cycle.
pub type SaveQueue = VecDeque<RegionAssignmentTask>;

/// Body of the primary screen write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenInput {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub dimensions: DimensionsInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionsInput {
    pub width: i64,
    pub height: i64,
}

impl ScreenInput {
    /// Build the write body from a draft snapshot, coercing the edited
    /// dimensions to integers.
    pub fn from_screen(screen: &Screen) -> Result<Self, SubmitError> {
        let width = screen
            .dimensions
            .width
            .to_integer()
            .ok_or_else(|| SubmitError::InvalidDimension {
                field: "width".to_string(),
                value: screen.dimensions.width.describe(),
            })?;
        let height = screen
            .dimensions
            .height
            .to_integer()
            .ok_or_else(|| SubmitError::InvalidDimension {
                field: "height".to_string(),
                value: screen.dimensions.height.describe(),
            })?;

        Ok(Self {
            title: screen.title.clone(),
            description: screen.description.clone(),
            size: screen.size.clone(),
            modified_by: screen.modified_by.clone(),
            created_by: screen.created_by.clone(),
            layout: screen.layout.clone(),
            location: screen.location.clone(),
            dimensions: DimensionsInput { width, height },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateScreenRequest {
    pub id: Id,
    pub body: ScreenInput,
}

impl UpdateScreenRequest {
    pub fn new(id: impl Into<Id>, body: ScreenInput) -> Self {
        Self {
            id: id.into(),
            body,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateScreenGroupsRequest {
    pub id: Id,
    pub body: GroupWritePayload,
}

impl UpdateScreenGroupsRequest {
    pub fn new(id: impl Into<Id>, body: GroupWritePayload) -> Self {
        Self {
            id: id.into(),
            body,
        }
    }
}

/// One playlist's position within a region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistAssignment {
    pub playlist: Id,
    pub weight: i64,
}

/// "These playlists, in this order, belong to this region."
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionAssignmentTask {
    pub region_id: Id,
    pub screen_id: Id,
    pub ordered_assignments: Vec<PlaylistAssignment>,
}

impl RegionAssignmentTask {
    pub fn into_request(self) -> UpdateRegionPlaylistsRequest {
        UpdateRegionPlaylistsRequest {
            screen_id: self.screen_id,
            region_id: self.region_id,
            body: self.ordered_assignments,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRegionPlaylistsRequest {
    pub screen_id: Id,
    pub region_id: Id,
    pub body: Vec<PlaylistAssignment>,
}

/// Body of the screen-group attribute write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenGroupInput {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

impl From<&ScreenGroup> for ScreenGroupInput {
    fn from(group: &ScreenGroup) -> Self {
        Self {
            title: group.title.clone(),
            description: group.description.clone(),
            modified_by: group.modified_by.clone(),
            created_by: group.created_by.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateScreenGroupRequest {
    pub id: Id,
    pub body: ScreenGroupInput,
}

impl UpdateScreenGroupRequest {
    pub fn new(id: impl Into<Id>, body: ScreenGroupInput) -> Self {
        Self {
            id: id.into(),
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DimensionValue;
    use serde_json::json;

    #[test]
    fn test_screen_input_coerces_text_dimensions() {
        let mut screen = Screen {
            title: "Foyer".to_string(),
            layout: Some("/v1/layouts/full".to_string()),
            ..Default::default()
        };
        screen.dimensions.width = DimensionValue::Text("1920".to_string());
        screen.dimensions.height = DimensionValue::Text("1080".to_string());

        let input = ScreenInput::from_screen(&screen).unwrap();
        let body = serde_json::to_value(&input).unwrap();

        assert_eq!(body["dimensions"], json!({"width": 1920, "height": 1080}));
        assert_eq!(body["layout"], json!("/v1/layouts/full"));
        // Absent fields are left out rather than sent as null
        assert!(body.get("modifiedBy").is_none());
        assert!(body.get("description").is_none());
    }

    #[test]
    fn test_screen_input_rejects_non_numeric_dimension() {
        let mut screen = Screen::default();
        screen.dimensions.width = DimensionValue::Integer(800);
        screen.dimensions.height = DimensionValue::Text("tall".to_string());

        let err = ScreenInput::from_screen(&screen).unwrap_err();
        assert_eq!(
            err,
            SubmitError::InvalidDimension {
                field: "height".to_string(),
                value: "\"tall\"".to_string(),
            }
        );
    }

    #[test]
    fn test_region_task_becomes_request() {
        let task = RegionAssignmentTask {
            region_id: "r1".to_string(),
            screen_id: "s1".to_string(),
            ordered_assignments: vec![PlaylistAssignment {
                playlist: "p1".to_string(),
                weight: 0,
            }],
        };
        let request = task.into_request();
        assert_eq!(request.screen_id, "s1");
        assert_eq!(request.region_id, "r1");
        assert_eq!(
            serde_json::to_value(&request.body).unwrap(),
            json!([{"playlist": "p1", "weight": 0}])
        );
    }
}
