//! Keyboard/touch to gameplay command translation.
//!
//! Movement is grid based and throttled: at most one step per
//! [`MOVE_DELAY_MS`]. With auto-movement on, a held key keeps stepping on
//! every tick; with it off, each key press moves once and holding does not
//! repeat. Action keys bypass the throttle.

pub const MOVE_DELAY_MS: u64 = 120;
pub const TICK_MS: u64 = 16;
pub const SWIPE_MIN_PX: f64 = 24.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameKey {
    Move(Direction),
    Block,
    Interact,
    Dash,
    Trap,
    Flashlight,
    /// Run ability slot, 0-based.
    Ability(u8),
    SkipDialog,
    Pause,
}

impl GameKey {
    /// Maps a `KeyboardEvent.code`.
    pub fn from_code(code: &str) -> Option<Self> {
        let key = match code {
            "KeyW" | "ArrowUp" => GameKey::Move(Direction::Up),
            "KeyS" | "ArrowDown" => GameKey::Move(Direction::Down),
            "KeyA" | "ArrowLeft" => GameKey::Move(Direction::Left),
            "KeyD" | "ArrowRight" => GameKey::Move(Direction::Right),
            "Space" => GameKey::Block,
            "KeyE" => GameKey::Interact,
            "ShiftLeft" | "ShiftRight" => GameKey::Dash,
            "KeyT" => GameKey::Trap,
            "KeyF" => GameKey::Flashlight,
            "Digit1" => GameKey::Ability(0),
            "Digit2" => GameKey::Ability(1),
            "Digit3" => GameKey::Ability(2),
            "Enter" => GameKey::SkipDialog,
            "Escape" => GameKey::Pause,
            _ => return None,
        };
        Some(key)
    }
}

/// What currently owns the keyboard.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InputLock {
    #[default]
    Free,
    /// Cutscene, pause or generator mini-game.
    Modal,
    /// Dialog that Enter may skip.
    SkippableDialog,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputCommand {
    Move(Direction),
    ToggleBlock,
    Interact,
    Dash,
    PlaceTrap,
    ToggleFlashlight,
    UseAbility(u8),
    SkipDialog,
    TogglePause,
}

/// Bucket of one: a step is allowed once `MOVE_DELAY_MS` has passed since the last one.
#[derive(Clone, Debug, Default)]
pub struct MoveThrottle {
    last_step_at: Option<u64>,
}

impl MoveThrottle {
    pub fn ready(&self, now: u64) -> bool {
        match self.last_step_at {
            Some(t) => now.saturating_sub(t) >= MOVE_DELAY_MS,
            None => true,
        }
    }

    pub fn record_step(&mut self, now: u64) {
        self.last_step_at = Some(now);
    }
}

#[derive(Clone, Debug, Default)]
pub struct InputDispatcher {
    auto_movement: bool,
    held: [bool; 4],
    /// Set on key-down, cleared on key-up; stops OS key repeat from stepping.
    latched: [bool; 4],
    throttle: MoveThrottle,
    touch_start: Option<(f64, f64)>,
}

impl InputDispatcher {
    pub fn new(auto_movement: bool) -> Self {
        Self { auto_movement, ..Default::default() }
    }

    pub fn set_auto_movement(&mut self, on: bool) {
        self.auto_movement = on;
    }

    pub fn is_held(&self, dir: Direction) -> bool {
        self.held[dir.index()]
    }

    /// The session calls this after a move actually changed the position.
    pub fn record_step(&mut self, now: u64) {
        self.throttle.record_step(now);
    }

    pub fn release_all(&mut self) {
        self.held = [false; 4];
        self.latched = [false; 4];
        self.touch_start = None;
    }

    pub fn key_down(&mut self, code: &str, now: u64, lock: InputLock) -> Option<InputCommand> {
        let key = GameKey::from_code(code)?;
        if key == GameKey::Pause {
            return Some(InputCommand::TogglePause);
        }
        match lock {
            InputLock::Free => {}
            InputLock::SkippableDialog if key == GameKey::SkipDialog => {
                return Some(InputCommand::SkipDialog);
            }
            InputLock::SkippableDialog | InputLock::Modal => return None,
        }
        let cmd = match key {
            GameKey::Move(dir) => {
                let i = dir.index();
                self.held[i] = true;
                if self.auto_movement || self.latched[i] {
                    return None;
                }
                self.latched[i] = true;
                if !self.throttle.ready(now) {
                    return None;
                }
                InputCommand::Move(dir)
            }
            GameKey::Block => InputCommand::ToggleBlock,
            GameKey::Interact => InputCommand::Interact,
            GameKey::Dash => InputCommand::Dash,
            GameKey::Trap => InputCommand::PlaceTrap,
            GameKey::Flashlight => InputCommand::ToggleFlashlight,
            GameKey::Ability(slot) => InputCommand::UseAbility(slot),
            GameKey::SkipDialog => return None,
            GameKey::Pause => InputCommand::TogglePause,
        };
        Some(cmd)
    }

    pub fn key_up(&mut self, code: &str) {
        if let Some(GameKey::Move(dir)) = GameKey::from_code(code) {
            self.held[dir.index()] = false;
            self.latched[dir.index()] = false;
        }
    }

    /// Horizontal wins over vertical; no diagonals.
    fn held_direction(&self) -> Option<Direction> {
        [Direction::Left, Direction::Right, Direction::Up, Direction::Down]
            .into_iter()
            .find(|d| self.held[d.index()])
    }

    /// Auto-movement step for this tick, if any.
    pub fn tick(&self, now: u64, lock: InputLock) -> Option<Direction> {
        if !self.auto_movement || lock != InputLock::Free {
            return None;
        }
        let dir = self.held_direction()?;
        self.throttle.ready(now).then_some(dir)
    }

    pub fn touch_start(&mut self, x: f64, y: f64) {
        self.touch_start = Some((x, y));
    }

    /// A swipe moves by its dominant axis; a short tap interacts.
    pub fn touch_end(&mut self, x: f64, y: f64, now: u64, lock: InputLock) -> Option<InputCommand> {
        let (sx, sy) = self.touch_start.take()?;
        if lock != InputLock::Free {
            return None;
        }
        let (dx, dy) = (x - sx, y - sy);
        if dx.abs().max(dy.abs()) < SWIPE_MIN_PX {
            return Some(InputCommand::Interact);
        }
        let dir = if dx.abs() >= dy.abs() {
            if dx > 0.0 { Direction::Right } else { Direction::Left }
        } else if dy > 0.0 {
            Direction::Down
        } else {
            Direction::Up
        };
        self.throttle.ready(now).then_some(InputCommand::Move(dir))
    }
}
