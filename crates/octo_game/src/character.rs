//! The player character: position, velocity, facing, and the two walk-cycle
//! frame rings.
//!
//! Vertical motion is a tiny state machine driven by *exact* velocity
//! comparisons: the jump impulse and the ceiling-push value are sentinels,
//! and `integrate` re-applies gravity only when `dy` equals one of them
//! exactly. The `VerticalState` enum mirrors what the sentinels decide so
//! callers and tests can observe the state by name, but it never drives a
//! transition itself; the numeric comparisons do. Keep it that way: a `dy`
//! outside the sentinel set (the bottom-edge push of -2, for instance)
//! deliberately coasts until the floor check catches it.

use std::sync::Arc;

use octo_core::cycle::FrameCycle;

use crate::assets::AssetStore;
use crate::rect::Rect;

/// Horizontal pixels moved per tick of held input.
pub const WALK_STEP: i32 = 15;
/// Jump impulse, negative because y grows downward. Sentinel.
pub const JUMP_SPEED: i32 = -10;
/// Downward velocity applied once a jump or ceiling push resolves.
pub const GRAVITY_SPEED: i32 = 10;
/// Small downward push applied at the top screen edge. Sentinel.
pub const CEILING_PUSH: i32 = 2;
/// Small upward push applied at the bottom screen edge. NOT a sentinel; it
/// resolves through the floor check instead.
pub const FLOOR_PUSH: i32 = -2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalState {
    Grounded,
    Jumping,
    Falling,
}

/// Frame keys and sprite dimensions for both facings, pulled out of the
/// asset store so the character itself stays free of decoding concerns.
pub struct CharacterSprites {
    pub left: Vec<Arc<str>>,
    pub right: Vec<Arc<str>>,
    pub size: (u32, u32),
}

impl CharacterSprites {
    pub fn from_assets(assets: &AssetStore) -> Result<Self, String> {
        let last_right = assets
            .right_frames
            .last()
            .ok_or_else(|| "Character sprites: no right-facing frames".to_string())?;
        let sprite = assets
            .image(last_right)
            .ok_or_else(|| format!("Character sprites: image '{last_right}' not decoded"))?;
        Ok(Self {
            left: assets.left_frames.clone(),
            right: assets.right_frames.clone(),
            size: (sprite.width, sprite.height),
        })
    }
}

#[derive(Debug)]
pub struct Character {
    pub x: i32,
    pub y: i32,
    /// Horizontal pixels per move call; also the world-shift amount at the
    /// screen edges.
    pub step: i32,
    /// Vertical velocity, pixels per tick.
    pub dy: i32,
    pub rect: Rect,
    pub floor: i32,
    vertical: VerticalState,
    /// Id of the most recent platform contact, refreshed every tick.
    pub blocked: Option<String>,
    left_frames: FrameCycle<Arc<str>>,
    right_frames: FrameCycle<Arc<str>>,
    /// The frame the renderer blits. Only `face` refreshes this; advancing
    /// the rings while standing still leaves the displayed frame frozen.
    pub current_frame: Arc<str>,
}

impl Character {
    /// Place a new character at mid-screen on the floor line. The floor sits
    /// one pixel above the point where the sprite would touch the bottom
    /// edge.
    pub fn new(sprites: &CharacterSprites, screen: (u32, u32)) -> Result<Self, String> {
        let mut left_frames = FrameCycle::new();
        for key in &sprites.left {
            left_frames.append(key.clone());
        }
        left_frames.set_current()?;

        let mut right_frames = FrameCycle::new();
        for key in &sprites.right {
            right_frames.append(key.clone());
        }
        right_frames.set_current()?;

        let current_frame = right_frames
            .current()
            .cloned()
            .ok_or_else(|| "Character: right frame ring has no current frame".to_string())?;

        let (w, h) = (sprites.size.0 as i32, sprites.size.1 as i32);
        let floor = screen.1 as i32 - h - 1;
        let x = screen.0 as i32 / 2;
        let y = floor;

        Ok(Self {
            x,
            y,
            step: WALK_STEP,
            dy: 0,
            rect: Rect::new(x, y, w, h),
            floor,
            vertical: VerticalState::Grounded,
            blocked: None,
            left_frames,
            right_frames,
            current_frame,
        })
    }

    /// One tick of vertical motion. Advances y by dy, then resolves the
    /// sentinel transitions: an exact jump or ceiling-push velocity resets to
    /// gravity, otherwise reaching the floor grounds the character. Finally
    /// syncs the collision rect to (x, y).
    pub fn integrate(&mut self) {
        self.y += self.dy;
        if self.dy == JUMP_SPEED || self.dy == CEILING_PUSH {
            self.dy = GRAVITY_SPEED;
            self.vertical = VerticalState::Falling;
        } else if self.y >= self.floor {
            self.dy = 0;
            self.vertical = VerticalState::Grounded;
        }

        self.rect.x = self.x;
        self.rect.y = self.y;
    }

    /// No collision checking here; the session decides whether the move
    /// triggers a world shift.
    pub fn move_left(&mut self) {
        self.x -= self.step;
    }

    pub fn move_right(&mut self) {
        self.x += self.step;
    }

    /// Arm the jump sentinel. Callable airborne: holding the key re-arms it
    /// every tick, which is what lets the octopus swim upward.
    pub fn jump(&mut self) {
        self.dy = JUMP_SPEED;
        self.vertical = VerticalState::Jumping;
    }

    /// Top screen edge: force a small downward velocity (sentinel).
    pub fn bounce_off_ceiling(&mut self) {
        self.dy = CEILING_PUSH;
    }

    /// Bottom screen edge: force a small upward velocity (not a sentinel).
    pub fn push_off_bottom(&mut self) {
        self.dy = FLOOR_PUSH;
    }

    /// Turn to `facing` and refresh the displayed frame from that ring.
    pub fn face(&mut self, facing: Facing) {
        let cycle = match facing {
            Facing::Left => &self.left_frames,
            Facing::Right => &self.right_frames,
        };
        if let Some(frame) = cycle.current() {
            self.current_frame = frame.clone();
        }
    }

    /// Advance both frame rings. Called at the throttled animation cadence,
    /// not every tick. Does not touch `current_frame`.
    pub fn advance_cycles(&mut self) {
        self.left_frames.advance();
        self.right_frames.advance();
    }

    #[allow(dead_code)]
    pub fn vertical_state(&self) -> VerticalState {
        self.vertical
    }
}
