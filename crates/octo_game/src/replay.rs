//! Test-only replay harness: JSON input sequences driving the session.
//!
//! A replay file is a list of tick inputs with repeat counts. Expanding one
//! gives a deterministic input stream, which the tests below feed to two
//! independent sessions to assert the simulation is a pure function of its
//! inputs.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::session::TickInput;

#[derive(Debug, Deserialize, Clone)]
pub struct ReplaySequence {
    pub frames: Vec<ReplayFrame>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplayFrame {
    #[serde(default)]
    pub left: bool,
    #[serde(default)]
    pub right: bool,
    #[serde(default)]
    pub up: bool,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

impl ReplaySequence {
    pub fn expanded_inputs(&self) -> Vec<TickInput> {
        let mut out = Vec::new();
        for frame in &self.frames {
            for _ in 0..frame.repeat.max(1) {
                out.push(TickInput {
                    left: frame.left,
                    right: frame.right,
                    up: frame.up,
                });
            }
        }
        out
    }
}

pub fn load_replay_from_path(path: &Path) -> Result<ReplaySequence, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let replay: ReplaySequence = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse replay JSON {}: {e}", path.display()))?;
    validate_replay(&replay)?;
    Ok(replay)
}

fn validate_replay(replay: &ReplaySequence) -> Result<(), String> {
    if replay.frames.is_empty() {
        return Err("Replay validation failed: frames list is empty".to_string());
    }
    Ok(())
}

const fn default_repeat() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::{Character, CharacterSprites};
    use crate::levels::builtin_levels;
    use crate::session::GameSession;
    use std::sync::Arc;
    use std::time::{SystemTime, UNIX_EPOCH};

    const SCREEN: (u32, u32) = (800, 600);

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "octo_replay_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn test_session() -> GameSession {
        let sprites = CharacterSprites {
            left: vec![Arc::from("l_1.png"), Arc::from("l_2.png")],
            right: vec![Arc::from("r_1.png"), Arc::from("r_2.png")],
            size: (64, 64),
        };
        let character = Character::new(&sprites, SCREEN).expect("character should construct");
        GameSession::new(character, &builtin_levels(), SCREEN).expect("session should construct")
    }

    #[test]
    fn replay_file_parses_and_expands() {
        let path = temp_file_path("parse");
        fs::write(
            &path,
            r#"{
              "frames": [
                { "left": true, "repeat": 3 },
                { "up": true }
              ]
            }"#,
        )
        .expect("write replay file");

        let replay = load_replay_from_path(&path).expect("replay should load");
        let expanded = replay.expanded_inputs();
        assert_eq!(expanded.len(), 4);
        assert!(expanded[0].left);
        assert!(expanded[3].up);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn replay_rejects_empty_frame_list() {
        let path = temp_file_path("empty");
        fs::write(&path, r#"{ "frames": [] }"#).expect("write replay file");
        let err = load_replay_from_path(&path).expect_err("empty replay should fail");
        assert!(err.contains("frames list is empty"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn replay_run_is_deterministic() {
        let path = temp_file_path("deterministic");
        fs::write(
            &path,
            r#"{
              "frames": [
                { "right": true, "repeat": 40 },
                { "right": true, "up": true, "repeat": 5 },
                { "repeat": 30 },
                { "left": true, "repeat": 90 },
                { "up": true, "repeat": 12 }
              ]
            }"#,
        )
        .expect("write replay file");

        let replay = load_replay_from_path(&path).expect("replay should load");
        let inputs = replay.expanded_inputs();

        let mut run_a = test_session();
        let mut run_b = test_session();
        for input in &inputs {
            run_a.step(*input);
        }
        for input in &inputs {
            run_b.step(*input);
        }

        assert_eq!(run_a.character.x, run_b.character.x);
        assert_eq!(run_a.character.y, run_b.character.y);
        assert_eq!(run_a.character.dy, run_b.character.dy);
        assert_eq!(run_a.character.blocked, run_b.character.blocked);
        assert_eq!(
            run_a.current_level().world_shift,
            run_b.current_level().world_shift
        );
        assert_eq!(run_a.current_level().collected, run_b.current_level().collected);
        assert_eq!(run_a.bg_x, run_b.bg_x);
        assert_eq!(run_a.bg_x2, run_b.bg_x2);

        let _ = fs::remove_file(path);
    }
}
