use crate::core::input::InputState;
use crate::game::node::{MusicNode, NodeState};
use crate::game::rail::LANE_COUNT;

/// Lane of the live node closest to the judgment line.
pub fn next_target<'a>(nodes: impl Iterator<Item = &'a MusicNode>) -> Option<usize> {
    nodes
        .filter(|n| n.state() == NodeState::Live)
        .min_by(|a, b| a.time().total_cmp(&b.time()))
        .map(MusicNode::rail)
}

/// Held input that moves the player from `current` toward `target`. Edge
/// lanes are held against their bound so snap-back does not pull off them.
pub fn steer_toward(current: usize, target: usize) -> InputState {
    if target < current || (target == current && target == 0) {
        InputState::LEFT
    } else if target > current || (target == current && target == LANE_COUNT - 1) {
        InputState::RIGHT
    } else {
        InputState::NONE
    }
}

pub fn input_for<'a>(current: usize, nodes: impl Iterator<Item = &'a MusicNode>) -> InputState {
    match next_target(nodes) {
        Some(target) => steer_toward(current, target),
        None => InputState::NONE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scene::{Entity, EntityKind, Scene};

    #[test]
    fn steers_toward_target_lane() {
        assert_eq!(steer_toward(1, 0), InputState::LEFT);
        assert_eq!(steer_toward(1, 2), InputState::RIGHT);
        assert_eq!(steer_toward(1, 1), InputState::NONE);
        assert_eq!(steer_toward(0, 0), InputState::LEFT);
        assert_eq!(steer_toward(LANE_COUNT - 1, LANE_COUNT - 1), InputState::RIGHT);
    }

    #[test]
    fn targets_earliest_live_node() {
        let mut scene = Scene::new();
        let mut make = |lane, time| {
            let id = scene.register(Entity::new(EntityKind::Node));
            MusicNode::new(id, lane, time)
        };
        let mut judged = make(0, 0.1);
        judged.miss();
        let nodes = [make(2, 1.5), judged, make(1, 0.7)];
        assert_eq!(next_target(nodes.iter()), Some(1), "missed nodes are ignored");
        assert_eq!(next_target(std::iter::empty()), None);
    }
}
