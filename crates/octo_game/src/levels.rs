//! Builtin level specifications.
//!
//! Levels are static in-code data, not loaded from disk. Coordinates assume
//! the 800x600 undersea backdrop; x values beyond the screen edge scroll
//! into view as the world shifts.

use crate::level::{EntitySpec, LevelSpec};

const ROCK: [f32; 4] = [0.42, 0.39, 0.35, 1.0];
const KELP: [f32; 4] = [0.18, 0.55, 0.28, 1.0];
const PEARL: [f32; 4] = [0.92, 0.90, 0.82, 1.0];
const SHELL: [f32; 4] = [0.85, 0.55, 0.65, 1.0];

fn platform(id: &str, x: i32, y: i32, w: i32, color: [f32; 4]) -> EntitySpec {
    EntitySpec {
        id: id.to_string(),
        x,
        y,
        w,
        h: 24,
        fixed: true,
        color,
    }
}

fn collectible(id: &str, x: i32, y: i32, color: [f32; 4]) -> EntitySpec {
    EntitySpec {
        id: id.to_string(),
        x,
        y,
        w: 20,
        h: 20,
        fixed: false,
        color,
    }
}

pub fn builtin_levels() -> Vec<LevelSpec> {
    vec![reef_shallows(), kelp_forest()]
}

fn reef_shallows() -> LevelSpec {
    LevelSpec {
        level_id: "reef_shallows".to_string(),
        entities: vec![
            platform("rock_1", 120, 440, 160, ROCK),
            platform("rock_2", 420, 360, 140, ROCK),
            platform("rock_3", 700, 470, 180, ROCK),
            platform("rock_4", 1040, 400, 160, ROCK),
            collectible("pearl_1", 180, 400, PEARL),
            collectible("pearl_2", 470, 320, PEARL),
            collectible("pearl_3", 760, 430, PEARL),
            collectible("shell_1", 1100, 360, SHELL),
        ],
    }
}

fn kelp_forest() -> LevelSpec {
    LevelSpec {
        level_id: "kelp_forest".to_string(),
        entities: vec![
            platform("kelp_ledge_1", 60, 480, 120, KELP),
            platform("kelp_ledge_2", 300, 380, 120, KELP),
            platform("kelp_ledge_3", 540, 280, 120, KELP),
            platform("kelp_ledge_4", 820, 420, 200, KELP),
            collectible("shell_2", 340, 340, SHELL),
            collectible("shell_3", 580, 240, SHELL),
            collectible("pearl_4", 900, 380, PEARL),
        ],
    }
}
