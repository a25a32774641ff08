//! Stability judge
//!
//! Runs once per tick over the stack. A missed drop is forgiven; a landed item
//! that tips past the tilt threshold or drops off the stage ends the run.

use super::stack::{ItemId, StackModel};
use crate::consts::SETTLE_GRACE_MS;
use crate::difficulty::DifficultyProfile;
use crate::{normalize_tilt, off_stage_y};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    Stable,
    /// Settled item leaned too far
    Toppled { item: ItemId, tilt: f32 },
    /// Landed item fell off the stage
    FellOff(ItemId),
}

impl Verdict {
    pub fn is_failure(&self) -> bool {
        matches!(self, Verdict::Toppled { .. } | Verdict::FellOff(_))
    }
}

/// The in-flight item, if it has dropped past the lower boundary. A miss is
/// forgiven, so it is reported here rather than as a `Verdict`.
pub fn missed_drop(stack: &StackModel) -> Option<ItemId> {
    stack
        .in_flight()
        .filter(|item| item.position.y >= off_stage_y())
        .map(|item| item.id)
}

/// First failing landed item, if any
pub fn judge(stack: &StackModel, profile: &DifficultyProfile, now: u64) -> Verdict {
    for item in stack.items().iter().filter(|i| i.has_landed) {
        let settled = item
            .landed_at
            .is_some_and(|at| now.saturating_sub(at) > SETTLE_GRACE_MS);
        if settled {
            let tilt = normalize_tilt(item.angle);
            if tilt >= profile.tilt_threshold {
                return Verdict::Toppled { item: item.id, tilt };
            }
        }
        if item.position.y >= off_stage_y() {
            return Verdict::FellOff(item.id);
        }
    }
    Verdict::Stable
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::Difficulty;
    use crate::sim::physics::{BodyHandle, ContactStarted, ItemShape, ScriptedWorld};
    use crate::theme::ThemeKind;
    use glam::Vec2;

    fn shape() -> ItemShape {
        ThemeKind::Pancake.theme().item_shape
    }

    fn landed_item(stack: &mut StackModel, world: &mut ScriptedWorld, landed_at: u64) -> ItemId {
        let profile = Difficulty::Normal.profile();
        let id = stack.spawn(world, Vec2::new(210.0, 600.0), 1.0, &shape(), &profile, 0);
        let body = stack.get(id).expect("item").body;
        stack.on_contacts(&[ContactStarted { a: body, b: BodyHandle(999) }], world, landed_at);
        id
    }

    #[test]
    fn test_tilt_respects_grace_period() {
        let profile = Difficulty::Normal.profile();
        let mut world = ScriptedWorld::frozen();
        let mut stack = StackModel::new();
        let id = landed_item(&mut stack, &mut world, 1_000);
        let body = stack.get(id).expect("item").body;

        world.set_pose(body, Vec2::new(210.0, 600.0), 0.5);
        stack.sync(&world);
        assert_eq!(judge(&stack, &profile, 5_000), Verdict::Stable);

        world.set_pose(body, Vec2::new(210.0, 600.0), 0.8);
        stack.sync(&world);
        // Still settling: exactly at the grace boundary is not judged yet
        assert_eq!(judge(&stack, &profile, 1_800), Verdict::Stable);
        assert!(matches!(
            judge(&stack, &profile, 1_801),
            Verdict::Toppled { item, .. } if item == id
        ));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let profile = Difficulty::Normal.profile();
        let mut world = ScriptedWorld::frozen();
        let mut stack = StackModel::new();
        let id = landed_item(&mut stack, &mut world, 0);
        let body = stack.get(id).expect("item").body;
        world.set_pose(body, Vec2::new(210.0, 600.0), -profile.tilt_threshold);
        stack.sync(&world);
        assert!(judge(&stack, &profile, 10_000).is_failure());
    }

    #[test]
    fn test_landed_item_off_stage_fails_immediately() {
        let profile = Difficulty::Easy.profile();
        let mut world = ScriptedWorld::frozen();
        let mut stack = StackModel::new();
        let id = landed_item(&mut stack, &mut world, 100);
        let body = stack.get(id).expect("item").body;
        world.set_pose(body, Vec2::new(210.0, off_stage_y()), 0.0);
        stack.sync(&world);
        assert_eq!(judge(&stack, &profile, 100), Verdict::FellOff(id));
    }

    #[test]
    fn test_in_flight_item_is_missed_not_failed() {
        let profile = Difficulty::Hard.profile();
        let mut world = ScriptedWorld::frozen();
        let mut stack = StackModel::new();
        let id = stack.spawn(&mut world, Vec2::new(390.0, 80.0), 1.0, &shape(), &profile, 0);
        let body = stack.get(id).expect("item").body;

        world.set_pose(body, Vec2::new(390.0, off_stage_y() - 1.0), 2.0);
        stack.sync(&world);
        assert_eq!(missed_drop(&stack), None);

        world.set_pose(body, Vec2::new(390.0, off_stage_y() + 10.0), 2.0);
        stack.sync(&world);
        assert_eq!(missed_drop(&stack), Some(id));
        assert_eq!(judge(&stack, &profile, 60_000), Verdict::Stable);
    }
}
