//! Levels: platform and collectible entities, world scrolling, collisions.
//!
//! A level is built from a declarative `LevelSpec`. Construction validates
//! the spec and partitions its entities by the `fixed` flag: fixed entities
//! are platforms (they block and persist), the rest are collectibles
//! (removed from play on contact). Scrolling is a world shift: every entity
//! translates horizontally while the character stays near screen center.

use serde::Deserialize;

use crate::rect::Rect;

#[derive(Debug, Deserialize, Clone)]
pub struct LevelSpec {
    pub level_id: String,
    pub entities: Vec<EntitySpec>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EntitySpec {
    pub id: String,
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    pub fixed: bool,
    #[serde(default = "default_color")]
    pub color: [f32; 4],
}

const fn default_color() -> [f32; 4] {
    [1.0, 1.0, 1.0, 1.0]
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: String,
    pub rect: Rect,
    pub fixed: bool,
    pub color: [f32; 4],
    pulse: u32,
}

impl Entity {
    fn from_spec(spec: &EntitySpec) -> Self {
        Self {
            id: spec.id.clone(),
            rect: Rect::new(spec.x, spec.y, spec.w, spec.h),
            fixed: spec.fixed,
            color: spec.color,
            pulse: 0,
        }
    }

    /// Per-tick entity update. The only animated entity state is the pulse
    /// counter driving the collectible shimmer.
    fn update(&mut self) {
        self.pulse = self.pulse.wrapping_add(1);
    }

    /// Alpha multiplier for the shimmer, cycling once per second.
    pub fn pulse_alpha(&self) -> f32 {
        let phase = (self.pulse % 60) as f32 / 60.0;
        0.75 + 0.25 * (phase * std::f32::consts::TAU).sin()
    }

    /// Contact hook, invoked once per tick per overlapping entity.
    fn collision_detected(&self) {
        log::debug!(
            "Contact with {} '{}'",
            if self.fixed { "platform" } else { "collectible" },
            self.id
        );
    }
}

#[derive(Debug)]
pub struct Level {
    pub level_id: String,
    platforms: Vec<Entity>,
    collectibles: Vec<Entity>,
    /// Cumulative pixels the world has been shifted left/right.
    pub world_shift: i32,
    /// Collectibles picked up since the level was built.
    pub collected: u32,
}

impl Level {
    pub fn from_spec(spec: &LevelSpec) -> Result<Self, String> {
        validate_spec(spec)?;

        let mut platforms = Vec::new();
        let mut collectibles = Vec::new();
        for entity_spec in &spec.entities {
            let entity = Entity::from_spec(entity_spec);
            if entity.fixed {
                platforms.push(entity);
            } else {
                collectibles.push(entity);
            }
        }

        Ok(Self {
            level_id: spec.level_id.clone(),
            platforms,
            collectibles,
            world_shift: 0,
            collected: 0,
        })
    }

    pub fn platforms(&self) -> &[Entity] {
        &self.platforms
    }

    pub fn collectibles(&self) -> &[Entity] {
        &self.collectibles
    }

    /// Advance every entity's per-tick state.
    pub fn update(&mut self) {
        for platform in &mut self.platforms {
            platform.update();
        }
        for collectible in &mut self.collectibles {
            collectible.update();
        }
    }

    /// Translate every entity by `shift_x` pixels and record the total.
    pub fn shift_world(&mut self, shift_x: i32) {
        self.world_shift += shift_x;
        log::trace!("World shift {:+} (total {})", shift_x, self.world_shift);
        for platform in &mut self.platforms {
            platform.rect.x += shift_x;
        }
        for collectible in &mut self.collectibles {
            collectible.rect.x += shift_x;
        }
    }

    /// Test `actor` against every entity. Platform hits are non-destructive;
    /// every hit's contact hook runs and the first hit's id is returned.
    /// Collectible hits are destructive: the entity leaves its collection and
    /// counts toward `collected`. Collectibles never contribute to the return
    /// value.
    pub fn detect_collisions(&mut self, actor: &Rect) -> Option<String> {
        let mut first_platform = None;
        for platform in &self.platforms {
            if platform.rect.overlaps(actor) {
                platform.collision_detected();
                if first_platform.is_none() {
                    first_platform = Some(platform.id.clone());
                }
            }
        }

        let mut picked_up = 0;
        self.collectibles.retain(|collectible| {
            if collectible.rect.overlaps(actor) {
                collectible.collision_detected();
                picked_up += 1;
                false
            } else {
                true
            }
        });
        self.collected += picked_up;

        first_platform
    }
}

fn validate_spec(spec: &LevelSpec) -> Result<(), String> {
    if spec.level_id.is_empty() {
        return Err("Level validation failed: level_id is empty".to_string());
    }

    let mut seen = std::collections::HashSet::new();
    for entity in &spec.entities {
        if entity.id.is_empty() {
            return Err(format!(
                "Level validation failed: entity in '{}' has an empty id",
                spec.level_id
            ));
        }
        if !seen.insert(entity.id.as_str()) {
            return Err(format!(
                "Level validation failed: duplicate entity id '{}'",
                entity.id
            ));
        }
        if entity.w <= 0 || entity.h <= 0 {
            return Err(format!(
                "Level validation failed: entity '{}' has non-positive extent {}x{}",
                entity.id, entity.w, entity.h
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: &str, x: i32, y: i32, fixed: bool) -> EntitySpec {
        EntitySpec {
            id: id.to_string(),
            x,
            y,
            w: 40,
            h: 40,
            fixed,
            color: default_color(),
        }
    }

    fn sample_spec() -> LevelSpec {
        LevelSpec {
            level_id: "test_level".to_string(),
            entities: vec![
                entity("ledge_a", 0, 100, true),
                entity("ledge_b", 200, 100, true),
                entity("pearl_a", 400, 100, false),
            ],
        }
    }

    #[test]
    fn construction_partitions_entities_by_fixed_flag() {
        let level = Level::from_spec(&sample_spec()).expect("valid spec");
        assert_eq!(level.platforms().len(), 2);
        assert_eq!(level.collectibles().len(), 1);
        assert!(level.platforms().iter().all(|e| e.fixed));
        assert!(level.collectibles().iter().all(|e| !e.fixed));
    }

    #[test]
    fn from_spec_rejects_duplicate_entity_ids() {
        let mut spec = sample_spec();
        spec.entities.push(entity("ledge_a", 300, 0, true));
        let err = Level::from_spec(&spec).expect_err("duplicate id should fail");
        assert!(err.contains("duplicate entity id"));
    }

    #[test]
    fn from_spec_rejects_non_positive_extent() {
        let mut spec = sample_spec();
        spec.entities[0].w = 0;
        let err = Level::from_spec(&spec).expect_err("zero width should fail");
        assert!(err.contains("non-positive extent"));
    }

    #[test]
    fn from_spec_rejects_empty_level_id() {
        let mut spec = sample_spec();
        spec.level_id.clear();
        let err = Level::from_spec(&spec).expect_err("empty level id should fail");
        assert!(err.contains("level_id is empty"));
    }

    #[test]
    fn shift_world_round_trips() {
        let mut level = Level::from_spec(&sample_spec()).expect("valid spec");
        let before: Vec<i32> = level
            .platforms()
            .iter()
            .chain(level.collectibles())
            .map(|e| e.rect.x)
            .collect();

        level.shift_world(37);
        level.shift_world(-37);

        let after: Vec<i32> = level
            .platforms()
            .iter()
            .chain(level.collectibles())
            .map(|e| e.rect.x)
            .collect();
        assert_eq!(before, after);
        assert_eq!(level.world_shift, 0);
    }

    #[test]
    fn shift_world_accumulates() {
        let mut level = Level::from_spec(&sample_spec()).expect("valid spec");
        level.shift_world(15);
        level.shift_world(15);
        assert_eq!(level.world_shift, 30);
        assert_eq!(level.platforms()[0].rect.x, 30);
    }

    #[test]
    fn collectible_contact_removes_exactly_that_collectible() {
        let mut level = Level::from_spec(&sample_spec()).expect("valid spec");
        // Actor fully covers pearl_a, far from both platforms.
        let actor = Rect::new(390, 90, 60, 60);

        let hit = level.detect_collisions(&actor);
        assert_eq!(hit, None, "a collectible is never the platform result");
        assert_eq!(level.collectibles().len(), 0);
        assert_eq!(level.collected, 1);

        // A second pass finds nothing left to collect.
        let hit = level.detect_collisions(&actor);
        assert_eq!(hit, None);
        assert_eq!(level.collected, 1);
    }

    #[test]
    fn platform_contact_does_not_remove_the_platform() {
        let mut level = Level::from_spec(&sample_spec()).expect("valid spec");
        let actor = Rect::new(10, 110, 20, 20);

        for _ in 0..5 {
            let hit = level.detect_collisions(&actor);
            assert_eq!(hit.as_deref(), Some("ledge_a"));
            assert_eq!(level.platforms().len(), 2);
        }
    }

    #[test]
    fn first_overlapping_platform_wins() {
        let mut level = Level::from_spec(&sample_spec()).expect("valid spec");
        // Wide actor spanning both platforms.
        let actor = Rect::new(0, 90, 250, 60);
        let hit = level.detect_collisions(&actor);
        assert_eq!(hit.as_deref(), Some("ledge_a"));
    }

    #[test]
    fn update_advances_the_collectible_shimmer() {
        let mut level = Level::from_spec(&sample_spec()).expect("valid spec");
        let before = level.collectibles()[0].pulse_alpha();
        for _ in 0..15 {
            level.update();
        }
        let after = level.collectibles()[0].pulse_alpha();
        assert!((before - after).abs() > f32::EPSILON);
    }
}
