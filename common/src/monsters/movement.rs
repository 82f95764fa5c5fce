use bevy_math::Vec2;

use super::{Monster, MonsterContext, Variant};
use crate::{
    collision::{AgentKind, direction_to, distance, resolve_collision},
    constants::{MONSTER_PATH_UPDATE_INTERVAL, MONSTER_WAYPOINT_RADIUS},
};

impl Monster {
    // A phasing Phantom ignores the grid entirely
    fn is_phasing(&self) -> bool {
        matches!(&self.variant, Variant::Phantom(phantom) if !phantom.is_visible())
    }

    pub(super) fn update_pathfinding(&mut self, dt: f32, ctx: &MonsterContext<'_>) {
        if self.is_phasing() {
            self.base.path.clear();
            return;
        }

        let base = &mut self.base;
        base.path_timer -= dt;
        if base.path_timer > 0.0 {
            return;
        }
        let Some(target) = base.target else {
            return;
        };
        base.path_timer = MONSTER_PATH_UPDATE_INTERVAL;
        base.path = base.pathfinder.find_path(ctx.map, ctx.doors, base.pos, target);
    }

    pub(super) fn update_movement(&mut self, dt: f32, ctx: &MonsterContext<'_>) {
        let speed = self.current_speed();
        let phasing = self.is_phasing();
        let base = &mut self.base;

        if phasing {
            if let Some(target) = base.target
                && distance(base.pos, target) > MONSTER_WAYPOINT_RADIUS
            {
                base.pos += direction_to(base.pos, target) * speed * dt;
            }
            return;
        }

        let goal = if let Some(&next) = base.path.get(1) {
            let waypoint = ctx.map.tile_to_world(next);
            if distance(base.pos, waypoint) <= MONSTER_WAYPOINT_RADIUS {
                base.path.remove(0);
                return;
            }
            waypoint
        } else {
            match base.target {
                Some(target) if distance(base.pos, target) > MONSTER_WAYPOINT_RADIUS => target,
                _ => return,
            }
        };

        let delta: Vec2 = direction_to(base.pos, goal) * speed * dt;
        base.pos = resolve_collision(base.pos, delta, base.size, ctx.map, ctx.doors, AgentKind::Monster);
    }
}

#[cfg(test)]
mod tests {
    use super::super::{MonsterKind, MonsterState, testing::*};
    use super::*;

    #[test]
    fn follows_path_around_wall() {
        let mut sandbox = Sandbox::ascii(&[
            "#########",
            "#.......#",
            "#.#####.#",
            "#.......#",
            "#########",
        ]);
        let start = sandbox.map.tile_to_world(crate::map::TilePos::new(3, 1));
        let goal = sandbox.map.tile_to_world(crate::map::TilePos::new(3, 3));
        let mut monster = Monster::new(0, MonsterKind::Kraken, start);
        monster.base.target = Some(goal);

        let hidden = hidden_player(Vec2::new(48.0, 48.0));
        let mut reached = false;
        for _ in 0..200 {
            sandbox.step(&mut monster, 0.05, hidden);
            let tile = sandbox.map.world_to_tile(monster.pos());
            assert!(sandbox.map.is_walkable_for_monster(tile), "entered {tile:?}");
            if distance(monster.pos(), goal) < 30.0 {
                reached = true;
                break;
            }
        }
        assert!(reached);
        assert_eq!(monster.state(), MonsterState::Patrol);
    }

    #[test]
    fn path_is_refreshed_on_interval() {
        let mut sandbox = Sandbox::room(12, 12);
        let mut monster = Monster::new(0, MonsterKind::Kraken, Vec2::new(48.0, 48.0));
        monster.base.investigate(Vec2::new(300.0, 300.0));
        sandbox.step(&mut monster, 0.05, hidden_player(Vec2::new(48.0, 330.0)));
        assert!(monster.path().len() > 1);
        assert!((monster.base.path_timer - MONSTER_PATH_UPDATE_INTERVAL).abs() < 1e-6);
    }
}
