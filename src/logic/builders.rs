use crate::error::MalformedReferenceError;
use crate::logic::normalize::canonical_id;
use crate::model::{
    GroupWritePayload, Id, PlaylistAssignment, RegionAssignmentTask, SaveQueue, Screen,
};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What to do with a relation reference that cannot be normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReferencePolicy {
    /// Abort the build; nothing is written.
    #[default]
    Reject,
    /// Drop the offending relation and keep building.
    Skip,
}

fn normalize(
    reference: &Value,
    policy: ReferencePolicy,
    relation: &str,
) -> Result<Option<Id>, MalformedReferenceError> {
    match canonical_id(reference) {
        Ok(id) => Ok(Some(id)),
        Err(err) => match policy {
            ReferencePolicy::Reject => Err(err),
            ReferencePolicy::Skip => {
                log::warn!("Dropping {} relation: {}", relation, err);
                Ok(None)
            }
        },
    }
}

/// Canonical group IDs for every membership in the draft, in draft order.
/// Memberships that are absent or not yet an array yield an empty payload.
pub fn build_group_payload(
    screen: &Screen,
    policy: ReferencePolicy,
) -> Result<GroupWritePayload, MalformedReferenceError> {
    Ok(capture_group_payload(screen, policy)?.unwrap_or_default())
}

/// Like [`build_group_payload`], but `None` when the draft never edited its
/// memberships. Only a captured payload (even an empty one) is written.
pub fn capture_group_payload(
    screen: &Screen,
    policy: ReferencePolicy,
) -> Result<Option<GroupWritePayload>, MalformedReferenceError> {
    let Some(Value::Array(groups)) = &screen.in_screen_groups else {
        return Ok(None);
    };

    let mut payload = Vec::with_capacity(groups.len());
    for group in groups {
        if let Some(id) = normalize(group, policy, "group")? {
            payload.push(id);
        }
    }
    Ok(Some(payload))
}

/// One task per region that has playlists, regions in order of first
/// appearance, weights counting from zero within each region.
///
/// An explicitly empty playlist list clears every region of the screen.
pub fn build_playlist_queue(
    screen_id: &Id,
    screen: &Screen,
    policy: ReferencePolicy,
) -> Result<SaveQueue, MalformedReferenceError> {
    let Some(playlists) = &screen.playlists else {
        return Ok(SaveQueue::new());
    };

    if playlists.is_empty() {
        let mut queue = SaveQueue::with_capacity(screen.regions.len());
        for region in &screen.regions {
            if let Some(region_id) = normalize(region, policy, "region")? {
                queue.push_back(RegionAssignmentTask {
                    region_id,
                    screen_id: screen_id.clone(),
                    ordered_assignments: Vec::new(),
                });
            }
        }
        return Ok(queue);
    }

    let mut placements: Vec<(Id, Id)> = Vec::with_capacity(playlists.len());
    for entry in playlists {
        let playlist = normalize(&entry.playlist, policy, "playlist")?;
        let region = normalize(&entry.region, policy, "playlist region")?;
        if let (Some(playlist), Some(region)) = (playlist, region) {
            placements.push((playlist, region));
        }
    }

    let queue = placements
        .iter()
        .map(|(_, region)| region)
        .unique()
        .map(|region_id| RegionAssignmentTask {
            region_id: region_id.clone(),
            screen_id: screen_id.clone(),
            ordered_assignments: placements
                .iter()
                .filter(|(_, region)| region == region_id)
                .enumerate()
                .map(|(weight, (playlist, _))| PlaylistAssignment {
                    playlist: playlist.clone(),
                    weight: weight as i64,
                })
                .collect(),
        })
        .collect();

    Ok(queue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn screen(value: Value) -> Screen {
        serde_json::from_value(value).unwrap()
    }

    fn assignments(task: &RegionAssignmentTask) -> Value {
        serde_json::to_value(&task.ordered_assignments).unwrap()
    }

    #[test]
    fn test_single_region_gets_contiguous_weights() {
        let draft = screen(json!({
            "title": "A",
            "regions": ["r1", "r2"],
            "playlists": [
                {"@id": "p1", "region": "r1"},
                {"@id": "p2", "region": "r1"}
            ]
        }));

        let queue = build_playlist_queue(&"s1".to_string(), &draft, ReferencePolicy::Reject).unwrap();

        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].region_id, "r1");
        assert_eq!(queue[0].screen_id, "s1");
        assert_eq!(
            assignments(&queue[0]),
            json!([{"playlist": "p1", "weight": 0}, {"playlist": "p2", "weight": 1}])
        );
    }

    #[test]
    fn test_empty_playlists_clear_every_region() {
        let draft = screen(json!({
            "title": "A",
            "regions": ["r1", "/v1/layouts/regions/r2"],
            "playlists": []
        }));

        let queue = build_playlist_queue(&"s1".to_string(), &draft, ReferencePolicy::Reject).unwrap();

        let regions: Vec<_> = queue.iter().map(|t| t.region_id.as_str()).collect();
        assert_eq!(regions, vec!["r1", "r2"]);
        assert!(queue.iter().all(|t| t.ordered_assignments.is_empty()));
    }

    #[test]
    fn test_regions_without_playlists_are_untouched_when_others_have_some() {
        let draft = screen(json!({
            "regions": ["r1", "r2", "r3"],
            "playlists": [{"@id": "p9", "region": "r3"}]
        }));

        let queue = build_playlist_queue(&"s1".to_string(), &draft, ReferencePolicy::Reject).unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].region_id, "r3");
    }

    #[test]
    fn test_interleaved_regions_keep_first_appearance_order() {
        let draft = screen(json!({
            "regions": ["r1", "r2"],
            "playlists": [
                {"@id": "/v1/playlists/a", "region": "/v1/layouts/regions/r2"},
                {"@id": "/v1/playlists/b", "region": "/v1/layouts/regions/r1"},
                {"@id": "/v1/playlists/c", "region": "/v1/layouts/regions/r2"},
                {"@id": "/v1/playlists/a", "region": "/v1/layouts/regions/r2"}
            ]
        }));

        let queue = build_playlist_queue(&"s1".to_string(), &draft, ReferencePolicy::Reject).unwrap();

        assert_eq!(queue.len(), 2);
        assert_eq!(queue[0].region_id, "r2");
        assert_eq!(
            assignments(&queue[0]),
            json!([
                {"playlist": "a", "weight": 0},
                {"playlist": "c", "weight": 1},
                {"playlist": "a", "weight": 2}
            ])
        );
        assert_eq!(queue[1].region_id, "r1");
        assert_eq!(assignments(&queue[1]), json!([{"playlist": "b", "weight": 0}]));
    }

    #[test]
    fn test_missing_playlists_build_nothing() {
        let draft = screen(json!({"regions": ["r1"]}));
        let queue = build_playlist_queue(&"s1".to_string(), &draft, ReferencePolicy::Reject).unwrap();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_malformed_playlist_reference_rejects_or_skips() {
        let draft = screen(json!({
            "regions": ["r1"],
            "playlists": [
                {"@id": "p1", "region": "r1"},
                {"@id": "/v1/playlists/", "region": "r1"},
                {"@id": "p3", "region": "r1"}
            ]
        }));

        let err = build_playlist_queue(&"s1".to_string(), &draft, ReferencePolicy::Reject).unwrap_err();
        assert_eq!(err.reference, "\"/v1/playlists/\"");

        let queue = build_playlist_queue(&"s1".to_string(), &draft, ReferencePolicy::Skip).unwrap();
        assert_eq!(
            assignments(&queue[0]),
            json!([{"playlist": "p1", "weight": 0}, {"playlist": "p3", "weight": 1}])
        );
    }

    #[test]
    fn test_group_payload_preserves_order_and_duplicates() {
        let draft = screen(json!({
            "inScreenGroups": [
                "/v1/screen-groups/g2",
                {"@id": "/v1/screen-groups/g1", "title": "North"},
                "g2"
            ]
        }));

        let payload = build_group_payload(&draft, ReferencePolicy::Reject).unwrap();
        assert_eq!(payload, vec!["g2", "g1", "g2"]);
    }

    #[test]
    fn test_group_payload_only_captured_for_arrays() {
        let unedited = screen(json!({"inScreenGroups": "/v1/screens/s1/screen-groups"}));
        assert_eq!(capture_group_payload(&unedited, ReferencePolicy::Reject).unwrap(), None);
        assert!(build_group_payload(&unedited, ReferencePolicy::Reject).unwrap().is_empty());

        let absent = screen(json!({}));
        assert_eq!(capture_group_payload(&absent, ReferencePolicy::Reject).unwrap(), None);

        let cleared = screen(json!({"inScreenGroups": []}));
        assert_eq!(
            capture_group_payload(&cleared, ReferencePolicy::Reject).unwrap(),
            Some(Vec::new())
        );
    }

    #[test]
    fn test_group_payload_skip_policy_drops_bad_reference() {
        let draft = screen(json!({"inScreenGroups": ["g1", 7, "g3"]}));
        assert!(build_group_payload(&draft, ReferencePolicy::Reject).is_err());
        assert_eq!(
            build_group_payload(&draft, ReferencePolicy::Skip).unwrap(),
            vec!["g1", "g3"]
        );
    }
}
