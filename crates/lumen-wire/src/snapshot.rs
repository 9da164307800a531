//! JSON decoding of snapshot messages.
//!
//! Required: `agents`, `waypoints` (arrays of `{x, y}`) and `tick`
//! (integer). Optional, defaulting to empty when absent or `null`:
//! `goals`, `lightPositions`, `lightStates`, `cameraPosition`,
//! `cameraDirection`. Unknown fields are ignored. There is no partial
//! success: either the whole snapshot decodes or the message is rejected.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use lumen_core::{Snapshot, TickId, Vec2};

use crate::error::WireError;

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
struct WirePoint {
    x: f32,
    y: f32,
}

impl From<WirePoint> for Vec2 {
    fn from(p: WirePoint) -> Self {
        Vec2::new(p.x, p.y)
    }
}

impl From<&Vec2> for WirePoint {
    fn from(p: &Vec2) -> Self {
        WirePoint { x: p.x, y: p.y }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSnapshot {
    agents: Vec<WirePoint>,
    waypoints: Vec<WirePoint>,
    #[serde(default)]
    goals: Option<Vec<WirePoint>>,
    #[serde(default)]
    light_positions: Option<Vec<WirePoint>>,
    #[serde(default)]
    light_states: Option<Vec<bool>>,
    #[serde(default)]
    camera_position: Option<Vec<f32>>,
    #[serde(default)]
    camera_direction: Option<Vec<f32>>,
    tick: i64,
}

fn points(raw: Option<Vec<WirePoint>>) -> Vec<Vec2> {
    raw.unwrap_or_default().into_iter().map(Vec2::from).collect()
}

impl From<WireSnapshot> for Snapshot {
    fn from(w: WireSnapshot) -> Self {
        Snapshot {
            agents: points(Some(w.agents)),
            waypoints: points(Some(w.waypoints)),
            goals: points(w.goals),
            light_positions: points(w.light_positions),
            light_states: w.light_states.unwrap_or_default(),
            camera_position: SmallVec::from_vec(w.camera_position.unwrap_or_default()),
            camera_direction: SmallVec::from_vec(w.camera_direction.unwrap_or_default()),
            tick: TickId(w.tick),
        }
    }
}

/// Decode one snapshot message.
///
/// # Errors
///
/// Returns [`WireError::MalformedSnapshot`] if the text is not a JSON
/// object, a required field is missing, or any field has the wrong shape.
pub fn parse_snapshot(text: &str) -> Result<Snapshot, WireError> {
    // serde accepts a positional array for a struct; the protocol does not.
    if !text.trim_start().starts_with('{') {
        return Err(WireError::MalformedSnapshot {
            detail: "expected a JSON object".into(),
        });
    }
    serde_json::from_str::<WireSnapshot>(text)
        .map(Snapshot::from)
        .map_err(|e| WireError::MalformedSnapshot {
            detail: e.to_string(),
        })
}

/// Encode a snapshot the way the server sends it.
///
/// All optional arrays are written out, empty or not.
pub fn encode_snapshot(snapshot: &Snapshot) -> Result<String, WireError> {
    let collect = |pts: &[Vec2]| pts.iter().map(WirePoint::from).collect::<Vec<_>>();
    let wire = WireSnapshot {
        agents: collect(&snapshot.agents),
        waypoints: collect(&snapshot.waypoints),
        goals: Some(collect(&snapshot.goals)),
        light_positions: Some(collect(&snapshot.light_positions)),
        light_states: Some(snapshot.light_states.clone()),
        camera_position: Some(snapshot.camera_position.to_vec()),
        camera_direction: Some(snapshot.camera_direction.to_vec()),
        tick: snapshot.tick.0,
    };
    serde_json::to_string(&wire).map_err(|e| WireError::Encode {
        detail: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::Vec2;
    use proptest::prelude::*;

    const SCENARIO: &str = r#"{"agents":[{"x":1,"y":2}],"waypoints":[{"x":0,"y":0},{"x":10,"y":0}],"goals":[{"x":5,"y":5}],"lightPositions":[],"lightStates":[],"cameraPosition":[],"cameraDirection":[],"tick":7}"#;

    #[test]
    fn parses_full_message() {
        let snap = parse_snapshot(SCENARIO).unwrap();
        assert_eq!(snap.agents, vec![Vec2::new(1.0, 2.0)]);
        assert_eq!(
            snap.waypoints,
            vec![Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0)]
        );
        assert_eq!(snap.goals, vec![Vec2::new(5.0, 5.0)]);
        assert!(snap.light_positions.is_empty());
        assert!(snap.camera_position.is_empty());
        assert_eq!(snap.tick, TickId(7));
    }

    #[test]
    fn optional_fields_default_to_empty() {
        let snap = parse_snapshot(r#"{"agents":[],"waypoints":[],"tick":3}"#).unwrap();
        assert!(snap.goals.is_empty());
        assert!(snap.light_states.is_empty());
        assert!(snap.camera_direction.is_empty());

        let snap =
            parse_snapshot(r#"{"agents":[],"waypoints":[],"goals":null,"tick":3}"#).unwrap();
        assert!(snap.goals.is_empty());
    }

    #[test]
    fn camera_and_lights_are_decoded() {
        let text = r#"{"agents":[],"waypoints":[],
            "lightPositions":[{"x":1.5,"y":-2}],"lightStates":[true],
            "cameraPosition":[0,100,0],"cameraDirection":[0,0,1],"tick":9}"#;
        let snap = parse_snapshot(text).unwrap();
        assert_eq!(snap.light_positions, vec![Vec2::new(1.5, -2.0)]);
        assert_eq!(snap.light_states, vec![true]);
        assert_eq!(snap.camera_position.as_slice(), &[0.0, 100.0, 0.0]);
        assert_eq!(snap.camera_direction.as_slice(), &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn negative_tick_is_accepted() {
        let snap = parse_snapshot(r#"{"agents":[],"waypoints":[],"tick":-4}"#).unwrap();
        assert_eq!(snap.tick, TickId(-4));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let snap =
            parse_snapshot(r#"{"agents":[],"waypoints":[],"tick":1,"weather":"rain"}"#).unwrap();
        assert_eq!(snap.tick, TickId(1));
    }

    #[test]
    fn missing_required_fields_are_malformed() {
        for text in [
            r#"{"waypoints":[],"tick":1}"#,
            r#"{"agents":[],"tick":1}"#,
            r#"{"agents":[],"waypoints":[]}"#,
            r#"{"agents":null,"waypoints":[],"tick":1}"#,
        ] {
            let err = parse_snapshot(text).unwrap_err();
            assert!(
                matches!(err, WireError::MalformedSnapshot { .. }),
                "{text} -> {err:?}"
            );
        }
    }

    #[test]
    fn wrong_shapes_are_malformed() {
        for text in [
            "",
            "not json",
            "[1,2,3]",
            r#"{"agents":[{"x":1}],"waypoints":[],"tick":1}"#,
            r#"{"agents":[],"waypoints":[],"tick":1.5}"#,
            r#"{"agents":[],"waypoints":[],"lightStates":[1],"tick":1}"#,
            r#"{"agents":[],"waypoints":[],"tick":1}{"agents":[],"waypoints":[],"tick":2}"#,
        ] {
            assert!(parse_snapshot(text).is_err(), "{text:?} should be rejected");
        }
    }

    fn arb_point() -> impl Strategy<Value = Vec2> {
        (-1.0e4f32..1.0e4, -1.0e4f32..1.0e4).prop_map(|(x, y)| Vec2::new(x, y))
    }

    fn arb_snapshot() -> impl Strategy<Value = Snapshot> {
        (
            prop::collection::vec(arb_point(), 0..16),
            prop::collection::vec(arb_point(), 0..16),
            prop::collection::vec(arb_point(), 0..16),
            prop::collection::vec((arb_point(), any::<bool>()), 0..8),
            prop::collection::vec(-500.0f32..500.0, 0..4),
            prop::collection::vec(-500.0f32..500.0, 0..4),
            any::<i64>(),
        )
            .prop_map(
                |(agents, waypoints, goals, lights, cam_pos, cam_dir, tick)| Snapshot {
                    agents,
                    waypoints,
                    goals,
                    light_positions: lights.iter().map(|(p, _)| *p).collect(),
                    light_states: lights.iter().map(|(_, s)| *s).collect(),
                    camera_position: SmallVec::from_vec(cam_pos),
                    camera_direction: SmallVec::from_vec(cam_dir),
                    tick: TickId(tick),
                },
            )
    }

    proptest! {
        #[test]
        fn parse_recovers_what_the_peer_sent(snap in arb_snapshot()) {
            let text = encode_snapshot(&snap).unwrap();
            let parsed = parse_snapshot(&text).unwrap();
            prop_assert_eq!(parsed, snap);
        }
    }
}
