//! Game session: owns every piece of run and meta state and advances it one
//! tick at a time.
//!
//! The browser shell feeds it key/touch events and calls [`GameSession::tick`]
//! every ~16 ms with the current epoch milliseconds. A tick runs the update
//! phase in a fixed order; rendering reads the public fields afterwards.

use crate::abilities::{AbilityState, DEFAULT_ABILITY_DURATION_MS, TimedAbility};
use crate::achievements::{AchievementEngine, GameEvent, StoredSkinUnlocker};
use crate::endless::{
    Difficulty, EndlessProgression, EnemyKind, PurchaseRejection, RunSummary, UpgradeKey,
};
use crate::input::{Direction, InputCommand, InputDispatcher, InputLock};
use crate::maze::{Position, Room, TileKind};
use crate::settings::Settings;
use crate::storage::KeyValueStore;
use crate::timers::TimerQueue;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

pub const MAX_STAMINA: f64 = 100.0;
const STAMINA_REGEN_PER_SEC: f64 = 20.0;
const BLOCK_DRAIN_PER_SEC: f64 = 15.0;
const REFLECT_COST: f64 = 25.0;
const DASH_CELLS: u32 = 3;
const DASH_COOLDOWN_MS: u64 = 1_500;
const DASH_COOLDOWN_STEP_MS: u64 = 250;
const HIT_GRACE_MS: u64 = 1_000;
const SPAWN_GRACE_MS: u64 = 1_500;
const TRAP_STUN_MS: u64 = 3_000;
const TRAP_COOLDOWN_MS: u64 = 5_000;
const POPUP_DELAY_MS: u64 = 400;
const POPUP_MS: u64 = 4_000;
const DIALOG_MS: u64 = 6_000;
const SEEKER_SIGHT: u32 = 6;
const MORTAR_RANGE: u32 = 2;
const ENEMY_SPAWN_MIN_DIST: u32 = 8;
/// Longest frame gap fed into stamina integration.
const MAX_FRAME_MS: u64 = 250;

pub const SKILL_CHECK_PERIOD_MS: u64 = 1_200;
const SKILL_CHECK_SWEEPS: u64 = 3;
const SKILL_ZONE_WIDTH: f64 = 0.2;
const SKILL_PERFECT_HALF_WIDTH: f64 = 0.03;

pub const CAMPAIGN_LEVELS: u32 = 10;

impl EnemyKind {
    fn action_interval_ms(self) -> u64 {
        match self {
            EnemyKind::Chaser => 420,
            EnemyKind::Seeker => 520,
            EnemyKind::FlyingPig => 360,
            EnemyKind::Batter => 480,
            EnemyKind::Mortar => 2_500,
        }
    }

    fn flies(self) -> bool {
        self == EnemyKind::FlyingPig
    }

    pub fn label(self) -> &'static str {
        match self {
            EnemyKind::Chaser => "Chaser",
            EnemyKind::Seeker => "Seeker",
            EnemyKind::FlyingPig => "Flying Pig",
            EnemyKind::Batter => "Batter",
            EnemyKind::Mortar => "Mortar",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub pos: Position,
    pub facing: Direction,
    pub stamina: f64,
    pub blocking: bool,
    pub dash_ready_at: u64,
    pub grace_until: u64,
    pub flashlight: bool,
    pub trap: Option<Position>,
    pub trap_ready_at: u64,
    pub hit_this_room: bool,
}

impl Player {
    fn spawn(at: Position) -> Self {
        Self {
            pos: at,
            facing: Direction::Right,
            stamina: MAX_STAMINA,
            blocking: false,
            dash_ready_at: 0,
            grace_until: 0,
            flashlight: false,
            trap: None,
            trap_ready_at: 0,
            hit_this_room: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Enemy {
    pub kind: EnemyKind,
    pub pos: Position,
    pub spawn: Position,
    pub next_action_at: u64,
    pub stunned_until: u64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AbilitySlot {
    pub ability: TimedAbility,
    pub charged: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CampaignRun {
    pub level: u32,
    pub started_at: u64,
    pub died: bool,
    pub used_ability: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Mode {
    Menu,
    Campaign(CampaignRun),
    Endless,
    GameOver { summary: Option<RunSummary> },
    Victory,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SkillCheck {
    pub generator: Position,
    pub started_at: u64,
    pub zone_start: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkillCheckResult {
    Perfect,
    Success,
    Miss,
}

impl SkillCheck {
    /// Needle position in 0.0..1.0.
    pub fn needle(&self, now: u64) -> f64 {
        let elapsed = now.saturating_sub(self.started_at) % SKILL_CHECK_PERIOD_MS;
        elapsed as f64 / SKILL_CHECK_PERIOD_MS as f64
    }

    pub fn zone(&self) -> (f64, f64) {
        (self.zone_start, self.zone_start + SKILL_ZONE_WIDTH)
    }

    pub fn perfect_zone(&self) -> (f64, f64) {
        let mid = self.zone_start + SKILL_ZONE_WIDTH / 2.0;
        (mid - SKILL_PERFECT_HALF_WIDTH, mid + SKILL_PERFECT_HALF_WIDTH)
    }

    pub fn judge(&self, now: u64) -> SkillCheckResult {
        let needle = self.needle(now);
        let (lo, hi) = self.zone();
        let (plo, phi) = self.perfect_zone();
        if needle >= plo && needle <= phi {
            SkillCheckResult::Perfect
        } else if needle >= lo && needle < hi {
            SkillCheckResult::Success
        } else {
            SkillCheckResult::Miss
        }
    }

    fn timed_out(&self, now: u64) -> bool {
        now.saturating_sub(self.started_at) >= SKILL_CHECK_PERIOD_MS * SKILL_CHECK_SWEEPS
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Dialog {
    pub id: u64,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Popup {
    pub id: u64,
    pub title: String,
    pub body: String,
    pub color: &'static str,
}

#[derive(Clone, Debug)]
enum Deferred {
    ShowPopup(Popup),
    DismissPopup(u64),
    EndDialog(u64),
}

pub struct GameSession {
    store: Box<dyn KeyValueStore>,
    pub settings: Settings,
    pub abilities: AbilityState,
    pub achievements: AchievementEngine,
    pub endless: EndlessProgression,
    input: InputDispatcher,
    rng: SmallRng,
    pub mode: Mode,
    /// Difficulty of the most recent endless run, for "run again".
    pub last_endless_mode: Difficulty,
    pub paused: bool,
    pub room: Room,
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub skill_check: Option<SkillCheck>,
    pub dialog: Option<Dialog>,
    pub ability_slots: Vec<AbilitySlot>,
    pub popups: Vec<Popup>,
    timers: TimerQueue<Deferred>,
    next_id: u64,
    last_tick: Option<u64>,
}

impl GameSession {
    pub fn new(store: Box<dyn KeyValueStore>, seed: u64) -> Self {
        let settings = Settings::load(store.as_ref());
        let mut achievements =
            AchievementEngine::load(store.as_ref(), Some(Box::new(StoredSkinUnlocker)));
        achievements.set_god_mode(settings.god_mode);
        let endless = EndlessProgression::load(store.as_ref());
        let mut rng = SmallRng::seed_from_u64(seed);
        let room = Room::generate(&mut rng, 0, false, false);
        let mut session = Self {
            store,
            input: InputDispatcher::new(settings.auto_movement),
            settings,
            abilities: AbilityState::default(),
            achievements,
            endless,
            rng,
            mode: Mode::Menu,
            last_endless_mode: Difficulty::default(),
            paused: false,
            player: Player::spawn(room.start),
            room,
            enemies: Vec::new(),
            skill_check: None,
            dialog: None,
            ability_slots: Vec::new(),
            popups: Vec::new(),
            timers: TimerQueue::new(),
            next_id: 0,
            last_tick: None,
        };
        // A run left active by a closed tab still pays out.
        if let Some(summary) = session.endless.end_endless_run(false) {
            log::info!("banked {} points from an interrupted run", summary.points);
            session.endless.save(session.store.as_mut());
        }
        session
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.mode, Mode::Campaign(_) | Mode::Endless)
    }

    pub fn input_lock(&self) -> InputLock {
        if !self.is_playing() || self.paused || self.skill_check.is_some() {
            InputLock::Modal
        } else if self.dialog.is_some() {
            InputLock::SkippableDialog
        } else {
            InputLock::Free
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    // ---------------- Run lifecycle -----------------

    pub fn start_endless(&mut self, mode: Difficulty, now: u64) {
        self.endless.start_endless_run(mode, now);
        self.last_endless_mode = mode;
        self.abilities.initialize_run(&self.endless.current_run.abilities);
        self.ability_slots = self
            .endless
            .current_run
            .abilities
            .iter()
            .filter_map(|a| a.timed())
            .map(|ability| AbilitySlot { ability, charged: true })
            .collect();
        self.endless.save(self.store.as_mut());
        self.mode = Mode::Endless;
        self.paused = false;
        self.player = Player::spawn(self.room.start);
        self.enter_endless_room(now);
    }

    fn enter_endless_room(&mut self, now: u64) {
        let run = &self.endless.current_run;
        let upcoming = run.room_number + 1;
        let mode = run.mode;
        let difficulty = self.endless.room_difficulty(upcoming, mode, &mut self.rng);
        self.enter_room(
            difficulty.generators,
            difficulty.enemies,
            upcoming % 3 == 0,
            upcoming % 4 == 0,
            now,
        );
    }

    pub fn start_campaign(&mut self, level: u32, now: u64) {
        let level = level.clamp(1, CAMPAIGN_LEVELS);
        self.abilities.initialize_run(&[]);
        self.ability_slots = [(3, TimedAbility::EnemySlow), (6, TimedAbility::WallPhase)]
            .into_iter()
            .filter(|(from, _)| level >= *from)
            .map(|(_, ability)| AbilitySlot { ability, charged: true })
            .collect();
        self.mode = Mode::Campaign(CampaignRun {
            level,
            started_at: now,
            died: false,
            used_ability: false,
        });
        self.paused = false;
        self.player = Player::spawn(self.room.start);
        let enemies = EnemyKind::ALL.iter().copied().take(level.min(5) as usize).collect();
        let with_terminal = campaign_secret(level).is_some();
        self.enter_room(3, enemies, with_terminal, level == 5 || level == 9, now);
    }

    fn enter_room(
        &mut self,
        generators: u32,
        kinds: Vec<EnemyKind>,
        terminal: bool,
        dark: bool,
        now: u64,
    ) {
        self.room = Room::generate(&mut self.rng, generators, terminal, dark);
        let stamina = self.player.stamina;
        self.player = Player::spawn(self.room.start);
        self.player.stamina = stamina;
        self.player.grace_until = now + SPAWN_GRACE_MS;
        self.skill_check = None;
        self.dialog = None;
        self.timers.retain(|d| !matches!(d, Deferred::EndDialog(_)));
        self.input.release_all();

        let dist = self.room.distances_from(self.room.start, false);
        let mut spots: Vec<Position> = self
            .room
            .positions()
            .zip(dist)
            .filter(|(p, d)| {
                d.is_some_and(|d| d >= ENEMY_SPAWN_MIN_DIST)
                    && self.room.tile(*p) == Some(TileKind::Floor)
            })
            .map(|(p, _)| p)
            .collect();
        spots.shuffle(&mut self.rng);
        if spots.is_empty() {
            spots.push(self.room.exit);
        }
        self.enemies = kinds
            .into_iter()
            .zip(spots.iter().cycle())
            .map(|(kind, &pos)| Enemy {
                kind,
                pos,
                spawn: pos,
                next_action_at: now + SPAWN_GRACE_MS,
                stunned_until: 0,
            })
            .collect();
        log::debug!("room ready: {} generators, {} enemies", generators, self.enemies.len());
    }

    /// Leaves the current run. Endless points earned so far are banked.
    pub fn quit_run(&mut self, now: u64) {
        if self.mode == Mode::Endless {
            self.finish_endless(false);
        } else if matches!(self.mode, Mode::Campaign(_)) {
            self.mode = Mode::Menu;
        }
        self.last_tick = Some(now);
    }

    pub fn return_to_menu(&mut self) {
        if self.mode == Mode::Endless {
            self.finish_endless(false);
        }
        self.mode = Mode::Menu;
        self.paused = false;
    }

    fn finish_endless(&mut self, won: bool) {
        let summary = self.endless.end_endless_run(won);
        self.endless.save(self.store.as_mut());
        self.abilities.initialize_run(&[]);
        self.mode = Mode::GameOver { summary };
    }

    // ---------------- Input -----------------

    pub fn key_down(&mut self, code: &str, now: u64) {
        if self.skill_check.is_some() && !self.paused && matches!(code, "KeyE" | "Space") {
            self.resolve_skill_check(now);
            return;
        }
        let lock = self.input_lock();
        if let Some(cmd) = self.input.key_down(code, now, lock) {
            self.apply_command(cmd, now);
        }
    }

    pub fn key_up(&mut self, code: &str) {
        self.input.key_up(code);
    }

    pub fn touch_start(&mut self, x: f64, y: f64) {
        self.input.touch_start(x, y);
    }

    pub fn touch_end(&mut self, x: f64, y: f64, now: u64) {
        if self.skill_check.is_some() && !self.paused {
            self.input.release_all();
            self.resolve_skill_check(now);
            return;
        }
        let lock = self.input_lock();
        if let Some(cmd) = self.input.touch_end(x, y, now, lock) {
            self.apply_command(cmd, now);
        }
    }

    fn apply_command(&mut self, cmd: InputCommand, now: u64) {
        match cmd {
            InputCommand::Move(dir) => {
                self.try_move(dir, now);
            }
            InputCommand::ToggleBlock => {
                self.player.blocking = !self.player.blocking && self.player.stamina > 0.0;
            }
            InputCommand::Interact => self.interact(now),
            InputCommand::Dash => self.dash(now),
            InputCommand::PlaceTrap => {
                if self.player.trap.is_none() && now >= self.player.trap_ready_at {
                    self.player.trap = Some(self.player.pos);
                }
            }
            InputCommand::ToggleFlashlight => {
                if self.room.dark {
                    self.player.flashlight = !self.player.flashlight;
                }
            }
            InputCommand::UseAbility(slot) => self.use_ability(slot as usize, now),
            InputCommand::SkipDialog => self.dialog = None,
            InputCommand::TogglePause => {
                if self.is_playing() {
                    self.paused = !self.paused;
                    self.input.release_all();
                }
            }
        }
    }

    fn try_move(&mut self, dir: Direction, now: u64) -> bool {
        self.player.facing = dir;
        let phase = self.abilities.can_phase_walls(now);
        match self.room.step(self.player.pos, dir, phase) {
            Some(to) => {
                self.player.pos = to;
                self.input.record_step(now);
                true
            }
            None => false,
        }
    }

    fn dash(&mut self, now: u64) {
        if self.player.stamina < MAX_STAMINA || now < self.player.dash_ready_at {
            return;
        }
        let phase = self.abilities.can_phase_walls(now);
        let mut moved = 0;
        while moved < DASH_CELLS {
            match self.room.step(self.player.pos, self.player.facing, phase) {
                Some(to) => {
                    self.player.pos = to;
                    moved += 1;
                }
                None => break,
            }
        }
        self.player.stamina -= MAX_STAMINA * self.abilities.stamina_multiplier();
        let level = self.endless_level(UpgradeKey::DashCooldown) as u64;
        self.player.dash_ready_at =
            now + DASH_COOLDOWN_MS.saturating_sub(DASH_COOLDOWN_STEP_MS * level);
        self.input.record_step(now);
    }

    fn endless_level(&self, key: UpgradeKey) -> u32 {
        if self.mode == Mode::Endless { self.endless.effective_level(key) } else { 0 }
    }

    fn use_ability(&mut self, slot: usize, now: u64) {
        let Some(s) = self.ability_slots.get_mut(slot) else { return };
        if !s.charged {
            return;
        }
        s.charged = false;
        let ability = s.ability;
        self.abilities.activate_timed_ability(ability, now, DEFAULT_ABILITY_DURATION_MS);
        if let Mode::Campaign(run) = &mut self.mode {
            run.used_ability = true;
        }
        self.record_event(GameEvent::AbilityUsed, now);
    }

    /// Terminal, then generator, then pickup, on the player's tile or next to it.
    fn interact(&mut self, now: u64) {
        let here = self.player.pos;
        let mut near = vec![here];
        near.extend(Direction::ALL.iter().filter_map(|d| self.room.step(here, *d, false)));
        let find = |want: fn(TileKind) -> bool| {
            near.iter().copied().find(|p| self.room.tile(*p).is_some_and(want))
        };

        if let Some(p) = find(|t| matches!(t, TileKind::Terminal { read: false })) {
            self.read_terminal(p, now);
        } else if let Some(p) = find(|t| matches!(t, TileKind::Generator { repaired: false })) {
            let zone_start = self.rng.gen_range(0.35..0.75);
            self.skill_check = Some(SkillCheck { generator: p, started_at: now, zone_start });
            self.player.blocking = false;
        } else if let Some(p) = find(|t| t == TileKind::Pickup) {
            self.room.set(p, TileKind::Floor);
            self.player.stamina = MAX_STAMINA;
        }
    }

    fn read_terminal(&mut self, at: Position, now: u64) {
        self.room.set(at, TileKind::Terminal { read: true });
        let secret_id = match &self.mode {
            Mode::Campaign(run) => campaign_secret(run.level).unwrap_or("log").to_string(),
            _ => format!("log_r{}", self.endless.current_run.room_number % 8),
        };
        let id = self.next_id();
        self.dialog = Some(Dialog { id, text: terminal_text(&secret_id).to_string() });
        self.timers.schedule(now + DIALOG_MS, Deferred::EndDialog(id));
        self.record_event(GameEvent::SecretFound { secret_id }, now);
    }

    fn resolve_skill_check(&mut self, now: u64) {
        let Some(check) = self.skill_check.take() else { return };
        match check.judge(now) {
            SkillCheckResult::Miss => {
                log::debug!("skill check missed at {:?}", check.generator);
            }
            result => {
                self.room.set(check.generator, TileKind::Generator { repaired: true });
                if result == SkillCheckResult::Perfect {
                    self.record_event(GameEvent::GeneratorPerfect, now);
                }
            }
        }
    }

    // ---------------- Tick -----------------

    pub fn tick(&mut self, now: u64) {
        let dt = self.last_tick.map_or(0, |t| now.saturating_sub(t)).min(MAX_FRAME_MS);
        self.last_tick = Some(now);
        self.abilities.update_status_effects(now);
        self.run_timers(now);

        // an open dialog freezes the room like a pause
        if self.is_playing() && !self.paused && self.dialog.is_none() {
            if self.skill_check.as_ref().is_some_and(|c| c.timed_out(now)) {
                self.skill_check = None;
            }
            let lock = self.input_lock();
            if let Some(dir) = self.input.tick(now, lock) {
                self.try_move(dir, now);
            }
            self.update_stamina(dt);
            let mut strikes = self.update_enemies(now);
            strikes.extend(self.contacts());
            if let Some(&idx) = strikes.first() {
                if now >= self.player.grace_until {
                    self.take_hit(idx, now);
                }
            }
            self.check_room_complete(now);
        }
        self.flush_notifications(now);
    }

    fn run_timers(&mut self, now: u64) {
        for entry in self.timers.drain_due(now) {
            match entry {
                Deferred::ShowPopup(popup) => {
                    self.timers.schedule(now + POPUP_MS, Deferred::DismissPopup(popup.id));
                    self.popups.push(popup);
                }
                Deferred::DismissPopup(id) => self.popups.retain(|p| p.id != id),
                Deferred::EndDialog(id) => {
                    if self.dialog.as_ref().is_some_and(|d| d.id == id) {
                        self.dialog = None;
                    }
                }
            }
        }
    }

    fn update_stamina(&mut self, dt: u64) {
        let secs = dt as f64 / 1000.0;
        let p = &mut self.player;
        if p.blocking {
            p.stamina -= BLOCK_DRAIN_PER_SEC * secs * self.abilities.stamina_multiplier();
            if p.stamina <= 0.0 {
                p.stamina = 0.0;
                p.blocking = false;
            }
        } else {
            let level = if self.mode == Mode::Endless {
                self.endless.effective_level(UpgradeKey::StaminaRegen)
            } else {
                0
            };
            let rate = STAMINA_REGEN_PER_SEC * (1.0 + 0.25 * level as f64);
            p.stamina = (p.stamina + rate * secs).min(MAX_STAMINA);
        }
    }

    /// Moves enemies whose cadence is due; returns indices of mortars that fired in range.
    fn update_enemies(&mut self, now: u64) -> Vec<usize> {
        let speed = self.abilities.enemy_speed_multiplier(now);
        let target = self.player.pos;
        let mut strikes = Vec::new();
        let mut caught = 0;
        let Self { enemies, room, rng, player, .. } = self;
        for (i, e) in enemies.iter_mut().enumerate() {
            if now < e.stunned_until || now < e.next_action_at {
                continue;
            }
            e.next_action_at = now + (e.kind.action_interval_ms() as f64 / speed) as u64;
            let next = match e.kind {
                EnemyKind::Mortar => {
                    if e.pos.manhattan(target) <= MORTAR_RANGE {
                        strikes.push(i);
                    }
                    None
                }
                EnemyKind::Seeker if e.pos.manhattan(target) > SEEKER_SIGHT => {
                    let open: Vec<Position> =
                        Direction::ALL.iter().filter_map(|d| room.step(e.pos, *d, false)).collect();
                    open.choose(rng).copied()
                }
                kind => room.next_step_towards(e.pos, target, kind.flies()),
            };
            if let Some(p) = next {
                e.pos = p;
            }
            if !e.kind.flies() && player.trap == Some(e.pos) {
                e.stunned_until = now + TRAP_STUN_MS;
                player.trap = None;
                player.trap_ready_at = now + TRAP_COOLDOWN_MS;
                caught += 1;
            }
        }
        for _ in 0..caught {
            self.record_event(GameEvent::TrapCatch, now);
        }
        strikes
    }

    fn contacts(&self) -> Vec<usize> {
        let now_pos = self.player.pos;
        let last = self.last_tick.unwrap_or(0);
        self.enemies
            .iter()
            .enumerate()
            .filter(|(_, e)| last >= e.stunned_until)
            .filter(|(_, e)| match e.kind {
                EnemyKind::Mortar => false,
                EnemyKind::Batter => e.pos.manhattan(now_pos) <= 1,
                _ => e.pos == now_pos,
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Block, then protections (consumed once), then a spare life, else death.
    fn take_hit(&mut self, enemy: usize, now: u64) {
        self.player.grace_until = now + HIT_GRACE_MS;
        if let Some(e) = self.enemies.get_mut(enemy) {
            e.pos = e.spawn;
            e.next_action_at = now + HIT_GRACE_MS;
        }
        if self.player.blocking && self.player.stamina >= REFLECT_COST {
            self.player.stamina -= REFLECT_COST * self.abilities.stamina_multiplier();
            self.record_event(GameEvent::ShieldReflect, now);
            return;
        }
        let protection = self.abilities.resolve_and_consume_protection(now);
        log::debug!("hit resolved as {protection:?}");
        if !protection.should_take_damage() {
            return;
        }
        self.player.hit_this_room = true;
        if self.abilities.consume_extra_life() {
            self.show_popup_later("Extra life used", "The echo holds you together", "#ff6b6b", now);
            return;
        }
        self.player_died(now);
    }

    fn player_died(&mut self, now: u64) {
        self.record_event(GameEvent::Death, now);
        if self.mode == Mode::Endless {
            self.finish_endless(false);
            return;
        }
        let Mode::Campaign(run) = &mut self.mode else { return };
        run.died = true;
        // campaign deaths restart the level in place
        self.player = Player::spawn(self.room.start);
        self.player.grace_until = now + SPAWN_GRACE_MS;
        self.skill_check = None;
        for e in &mut self.enemies {
            e.pos = e.spawn;
            e.next_action_at = now + SPAWN_GRACE_MS;
        }
    }

    fn check_room_complete(&mut self, now: u64) {
        if self.player.pos != self.room.exit || !self.room.all_generators_repaired() {
            return;
        }
        match self.mode.clone() {
            Mode::Endless => {
                let perfect = !self.player.hit_this_room;
                let Some(cleared) = self.endless.complete_endless_room(now, perfect) else {
                    return;
                };
                for ev in cleared.events {
                    self.record_event(ev, now);
                }
                for ability in &cleared.granted {
                    match ability.timed() {
                        Some(timed) => {
                            self.ability_slots.push(AbilitySlot { ability: timed, charged: true })
                        }
                        None => self.abilities.apply_static_ability(*ability),
                    }
                }
                for slot in &mut self.ability_slots {
                    slot.charged = true;
                }
                let granted: Vec<&str> = cleared.granted.iter().map(|a| a.label()).collect();
                let body = if granted.is_empty() {
                    format!("+{} points", cleared.points)
                } else {
                    format!("+{} points, gained {}", cleared.points, granted.join(", "))
                };
                let title = format!("Room {} cleared", cleared.room);
                self.show_popup_later(&title, &body, "#2ea043", now);
                self.endless.save(self.store.as_mut());
                self.enter_endless_room(now);
            }
            Mode::Campaign(run) => {
                self.record_event(
                    GameEvent::LevelComplete {
                        level: run.level,
                        time_ms: now.saturating_sub(run.started_at),
                        deathless: !run.died,
                        no_abilities: !run.used_ability,
                    },
                    now,
                );
                if run.level >= CAMPAIGN_LEVELS {
                    self.mode = Mode::Victory;
                } else {
                    self.start_campaign(run.level + 1, now);
                }
            }
            _ => {}
        }
    }

    // ---------------- Events & notifications -----------------

    /// Feeds an achievement event from gameplay or from an outside caller.
    pub fn record_event(&mut self, event: GameEvent, now: u64) {
        self.achievements.check_achievements(self.store.as_mut(), &event, now);
    }

    fn show_popup_later(&mut self, title: &str, body: &str, color: &'static str, now: u64) {
        let id = self.next_id();
        let popup = Popup { id, title: title.to_string(), body: body.to_string(), color };
        self.timers.schedule(now + POPUP_DELAY_MS, Deferred::ShowPopup(popup));
    }

    fn flush_notifications(&mut self, now: u64) {
        for n in self.achievements.drain_notifications() {
            self.show_popup_later(&format!("🏆 {}", n.name), n.description, n.tier.color(), now);
        }
    }

    // ---------------- Meta -----------------

    pub fn purchase_upgrade(&mut self, key: UpgradeKey) -> Result<u64, PurchaseRejection> {
        let cost = self.endless.purchase_upgrade(key)?;
        self.endless.save(self.store.as_mut());
        Ok(cost)
    }

    pub fn reset_upgrades(&mut self) -> u64 {
        let refund = self.endless.reset_upgrades();
        self.endless.save(self.store.as_mut());
        refund
    }

    pub fn set_upgrades_enabled(&mut self, enabled: bool) {
        self.endless.set_upgrades_enabled(enabled);
        self.endless.save(self.store.as_mut());
    }

    pub fn update_settings(&mut self, settings: Settings) {
        self.input.set_auto_movement(settings.auto_movement);
        self.achievements.set_god_mode(settings.god_mode);
        settings.save(self.store.as_mut());
        self.settings = settings;
    }

    pub fn reset_achievements(&mut self) {
        self.achievements.reset_achievements(self.store.as_mut());
    }

    pub fn skin_unlocked(&self, skin_id: &str) -> bool {
        let key = crate::storage::skin_key(skin_id);
        crate::storage::load_flag(self.store.as_ref(), &key).unwrap_or(false)
    }
}

fn campaign_secret(level: u32) -> Option<&'static str> {
    match level {
        4 => Some("hidden_room"),
        7 => Some("true_ending"),
        10 => Some("sacrifice"),
        2 => Some("log_first_signal"),
        _ => None,
    }
}

fn terminal_text(secret_id: &str) -> &'static str {
    match secret_id {
        "hidden_room" => "The map lied. There was always a door here.",
        "true_ending" => "Every echo you heard was your own voice, arriving late.",
        "sacrifice" => "Someone has to keep the generators running. It could be you.",
        "log_first_signal" => "Signal received. Something below is listening.",
        _ => "Static, and under it a rhythm, like footsteps.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abilities::RunAbility;
    use crate::storage::MemoryStore;

    fn session() -> GameSession {
        GameSession::new(Box::new(MemoryStore::new()), 42)
    }

    fn open_direction(s: &GameSession) -> Direction {
        Direction::ALL
            .into_iter()
            .find(|d| s.room.step(s.player.pos, *d, false).is_some())
            .unwrap()
    }

    fn code_for(d: Direction) -> &'static str {
        match d {
            Direction::Up => "ArrowUp",
            Direction::Down => "ArrowDown",
            Direction::Left => "ArrowLeft",
            Direction::Right => "ArrowRight",
        }
    }

    #[test]
    fn skill_check_judging() {
        let check = SkillCheck { generator: Position::new(1, 1), started_at: 0, zone_start: 0.5 };
        let at = |frac: f64| (frac * SKILL_CHECK_PERIOD_MS as f64) as u64;
        assert_eq!(check.judge(at(0.6)), SkillCheckResult::Perfect);
        assert_eq!(check.judge(at(0.52)), SkillCheckResult::Success);
        assert_eq!(check.judge(at(0.2)), SkillCheckResult::Miss);
        assert_eq!(check.judge(SKILL_CHECK_PERIOD_MS + at(0.6)), SkillCheckResult::Perfect);
        assert!(check.timed_out(SKILL_CHECK_PERIOD_MS * SKILL_CHECK_SWEEPS));
    }

    #[test]
    fn held_key_moves_with_throttle() {
        let mut s = session();
        s.start_campaign(1, 0);
        s.enemies.clear();
        let dir = open_direction(&s);
        let start = s.player.pos;
        s.key_down(code_for(dir), 0);
        s.tick(16);
        assert_ne!(s.player.pos, start);
        let after_first = s.player.pos;
        s.tick(66);
        assert_eq!(s.player.pos, after_first);
    }

    #[test]
    fn dash_needs_full_stamina() {
        let mut s = session();
        s.start_campaign(1, 0);
        s.enemies.clear();
        s.player.facing = open_direction(&s);
        s.player.stamina = MAX_STAMINA - 1.0;
        let start = s.player.pos;
        s.key_down("ShiftLeft", 100);
        assert_eq!(s.player.pos, start);
        s.player.stamina = MAX_STAMINA;
        s.key_down("ShiftLeft", 100);
        assert_ne!(s.player.pos, start);
        assert_eq!(s.player.stamina, 0.0);
        let dashed_to = s.player.pos;
        s.player.stamina = MAX_STAMINA;
        s.key_down("ShiftLeft", 200);
        assert_eq!(s.player.pos, dashed_to);
    }

    #[test]
    fn shield_boost_absorbs_then_extra_life_then_death() {
        let mut s = session();
        s.start_endless(Difficulty::Easy, 0);
        s.abilities.initialize_run(&[RunAbility::ShieldBoost, RunAbility::ExtraLife]);
        s.enemies.truncate(1);
        for t in [10_000, 20_000] {
            s.take_hit(0, t);
            assert_eq!(s.mode, Mode::Endless);
        }
        // third hit breaks the shield, the spare life catches it
        s.take_hit(0, 30_000);
        assert_eq!(s.mode, Mode::Endless);
        assert_eq!(s.abilities.extra_lives, 0);
        s.take_hit(0, 40_000);
        assert!(matches!(s.mode, Mode::GameOver { .. }));
        assert!(!s.endless.is_run_active());
        assert_eq!(s.endless.lifetime_stats.total_runs, 1);
        assert_eq!(s.achievements.stats(s.store()).total_deaths, 1);
    }

    #[test]
    fn blocking_reflects_hits() {
        let mut s = session();
        s.start_campaign(1, 0);
        s.key_down("Space", 0);
        assert!(s.player.blocking);
        s.take_hit(0, 5_000);
        assert_eq!(s.achievements.stats(s.store()).shield_reflects, 1);
        assert!(s.achievements.is_unlocked("first_reflect"));
        assert_eq!(s.achievements.stats(s.store()).total_deaths, 0);
    }

    #[test]
    fn trap_stuns_walking_enemy() {
        let mut s = session();
        s.start_campaign(1, 0);
        s.enemies.truncate(1);
        s.enemies[0].kind = EnemyKind::Chaser;
        let path = s.room.path(s.enemies[0].pos, s.player.pos, false);
        s.player.trap = Some(path[1]);
        s.enemies[0].next_action_at = 0;
        s.update_enemies(2_000);
        assert_eq!(s.enemies[0].stunned_until, 2_000 + TRAP_STUN_MS);
        assert!(s.player.trap.is_none());
        assert_eq!(s.achievements.stats(s.store()).trap_catches, 1);
    }

    #[test]
    fn generators_then_exit_clear_an_endless_room() {
        let mut s = session();
        s.start_endless(Difficulty::Easy, 0);
        s.enemies.clear();
        for p in s.room.positions().collect::<Vec<_>>() {
            if let Some(TileKind::Generator { .. }) = s.room.tile(p) {
                s.room.set(p, TileKind::Generator { repaired: true });
            }
        }
        s.player.pos = s.room.exit;
        s.tick(1_000);
        assert_eq!(s.endless.current_run.room_number, 1);
        assert_eq!(s.endless.current_run.points, 12);
        assert_eq!(s.player.pos, s.room.start);
        assert_eq!(s.achievements.stats(s.store()).best_endless_wave, 1);
    }

    #[test]
    fn campaign_level_complete_reports_flags() {
        let mut s = session();
        s.start_campaign(3, 1_000);
        s.enemies.clear();
        s.key_down("Digit1", 2_000);
        assert!(s.abilities.is_ability_active(TimedAbility::EnemySlow, 2_001));
        for p in s.room.positions().collect::<Vec<_>>() {
            if let Some(TileKind::Generator { .. }) = s.room.tile(p) {
                s.room.set(p, TileKind::Generator { repaired: true });
            }
        }
        s.player.pos = s.room.exit;
        s.tick(31_000);
        assert!(s.achievements.is_unlocked("first_steps"));
        assert!(s.achievements.is_unlocked("speedrunner"));
        assert!(s.achievements.is_unlocked("untouchable"));
        assert!(!s.achievements.is_unlocked("purist"));
        assert!(matches!(&s.mode, Mode::Campaign(run) if run.level == 4));
    }

    #[test]
    fn popups_appear_late_and_dismiss_themselves() {
        let mut s = session();
        s.start_campaign(1, 0);
        s.record_event(GameEvent::AbilityUsed, 0);
        s.tick(0);
        assert!(s.popups.is_empty());
        s.tick(POPUP_DELAY_MS);
        assert_eq!(s.popups.len(), 1);
        s.tick(POPUP_DELAY_MS + POPUP_MS);
        assert!(s.popups.is_empty());
    }

    #[test]
    fn interrupted_run_is_banked_on_load() {
        let mut store = MemoryStore::new();
        let mut p = EndlessProgression::default();
        p.start_endless_run(Difficulty::Easy, 0);
        p.complete_endless_room(1, true);
        p.save(&mut store);
        let s = GameSession::new(Box::new(store), 1);
        assert!(!s.endless.is_run_active());
        assert_eq!(s.endless.available_points, 12);
    }

    #[test]
    fn paused_session_ignores_gameplay_keys() {
        let mut s = session();
        s.start_campaign(1, 0);
        s.key_down("Escape", 0);
        assert!(s.paused);
        assert_eq!(s.input_lock(), InputLock::Modal);
        s.key_down("Space", 0);
        assert!(!s.player.blocking);
        s.key_down("Escape", 0);
        assert!(!s.paused);
    }

    #[test]
    fn open_dialog_freezes_the_room() {
        let mut s = session();
        s.start_campaign(1, 0);
        let start = s.player.pos;
        s.enemies = vec![Enemy {
            kind: EnemyKind::Chaser,
            pos: start,
            spawn: start,
            next_action_at: 0,
            stunned_until: 0,
        }];
        s.dialog = Some(Dialog { id: 99, text: "log".into() });
        assert_eq!(s.input_lock(), InputLock::SkippableDialog);

        let code = code_for(open_direction(&s));
        s.key_down(code, 2_000);
        for t in (2_000..8_000).step_by(16) {
            s.tick(t);
        }
        s.key_up(code);
        assert_eq!(s.player.pos, start);
        assert_eq!(s.achievements.stats(s.store()).total_deaths, 0);

        s.key_down("Enter", 8_000);
        assert!(s.dialog.is_none());
        s.tick(8_016);
        assert_eq!(s.achievements.stats(s.store()).total_deaths, 1);
    }
}
