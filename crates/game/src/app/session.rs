use engine::{Canvas, CursorHint, Game, InputSnapshot, Sound, Vec2};
use rand::rngs::StdRng;
use rand::Rng;
use tracing::{info, warn};

use super::background::ParallaxBackground;
use super::config::GameConfig;
use super::entity::EntityRegistry;
use super::hud::{GameOverView, Hud};
use super::menu::{BuildMenu, MenuEvent};
use super::module::{DamageLevel, ModuleKind};
use super::particles::Particle;
use super::ship::{Ship, ShipEvent, ShipLayout, ShipStats};

/// Named audio cues the session fires through the sound capability.
pub mod cues {
    pub const MENU_OPEN: &str = "menu_open";
    pub const BUILD_START: &str = "build_start";
    pub const BUILD_DONE: &str = "build_done";
    pub const REPAIR_START: &str = "repair_start";
    pub const REPAIR_DONE: &str = "repair_done";
    pub const MODULE_CRACK: &str = "module_crack";
    pub const MODULE_BREAK: &str = "module_break";
    pub const SHIP_SUNK: &str = "ship_sunk";
}

const STEAM_INTERVAL_SECONDS: f32 = 0.45;
const SPRAY_CHANCE_PER_SECOND: f32 = 1.4;
const BUILD_DUST_COUNT: usize = 8;
const BREAK_SPRAY_COUNT: usize = 5;

/// The one deferred player action the global cooldown may hold. Kept as
/// plain data rather than a captured closure so the pending slot stays
/// inspectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    Repair {
        x: usize,
        y: usize,
    },
    Build {
        x: usize,
        y: usize,
        kind: ModuleKind,
    },
}

/// Mutable per-session record shared with entities during update and
/// interaction dispatch. Derived quantities (ship height, difficulty) are
/// snapshots refreshed every tick, not authorities.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    /// Depth the hull currently sits at, in module-height units.
    pub draught: f32,
    pub distance: f32,
    /// Simulation clock; advances only while unpaused and serves as "now"
    /// for every entity in a tick.
    pub elapsed_seconds: f32,
    pub speed: f32,
    /// The single global cooldown gating deferred player actions.
    pub cooldown_seconds: f32,
    pub pending: Option<PendingAction>,
    pub paused: bool,
    pub debug: bool,
    pub running: bool,
    pub restart_requested: bool,
    pub hovered_cell: Option<(usize, usize)>,
    pub last_stats: ShipStats,
    pub ship_height: f32,
    cue_queue: Vec<&'static str>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            draught: 0.0,
            distance: 0.0,
            elapsed_seconds: 0.0,
            speed: 0.0,
            cooldown_seconds: 0.0,
            pending: None,
            paused: false,
            debug: false,
            running: true,
            restart_requested: false,
            hovered_cell: None,
            last_stats: ShipStats::default(),
            ship_height: 0.0,
            cue_queue: Vec::new(),
        }
    }

    pub fn queue_cue(&mut self, cue: &'static str) {
        self.cue_queue.push(cue);
    }

    fn take_cues(&mut self) -> Vec<&'static str> {
        std::mem::take(&mut self.cue_queue)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

/// One voyage. Owns the ship, the entity registry, the pending-action slot
/// and the collaborator ports; constructed at session start and torn down
/// (or reset in place) at the end.
pub struct Session {
    config: GameConfig,
    state: SessionState,
    ship: Ship,
    registry: EntityRegistry,
    background: ParallaxBackground,
    layout: ShipLayout,
    menu: Box<dyn BuildMenu>,
    sound: Box<dyn Sound>,
    rng: StdRng,
    last_cursor: Option<Vec2>,
    steam_accumulator: f32,
}

impl Session {
    pub fn new(
        config: GameConfig,
        viewport: (u32, u32),
        menu: Box<dyn BuildMenu>,
        sound: Box<dyn Sound>,
        rng: StdRng,
    ) -> Self {
        let ship = Ship::with_starting_hull(config.columns);
        let layout = ShipLayout::for_viewport(viewport, ship.columns());
        let mut session = Self {
            config,
            state: SessionState::new(),
            ship,
            registry: EntityRegistry::new(),
            background: ParallaxBackground::new(),
            layout,
            menu,
            sound,
            rng,
            last_cursor: None,
            steam_accumulator: 0.0,
        };
        session.state.ship_height = session.ship.height();
        session.registry.spawn(Box::new(Hud::new()));
        session.registry.begin_tick();
        info!(
            columns = session.ship.columns(),
            ship_height = session.state.ship_height,
            "session_started"
        );
        session
    }

    pub fn pause(&mut self) {
        if !self.state.paused {
            self.state.paused = true;
            info!("session_paused");
        }
    }

    pub fn resume(&mut self) {
        if self.state.paused {
            self.state.paused = false;
            info!("session_resumed");
        }
    }

    fn toggle_pause(&mut self) {
        if self.state.paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    fn restart(&mut self) {
        self.state = SessionState::new();
        self.ship = Ship::with_starting_hull(self.config.columns);
        self.state.ship_height = self.ship.height();
        self.registry.clear();
        self.registry.spawn(Box::new(Hud::new()));
        self.registry.begin_tick();
        self.menu.close();
        self.background = ParallaxBackground::new();
        self.last_cursor = None;
        self.steam_accumulator = 0.0;
        info!("session_restarted");
    }

    /// Routes a click. A nonzero cooldown swallows everything: one deferred
    /// action at a time, no queue.
    fn handle_click(&mut self, point: Vec2) {
        if self.state.cooldown_seconds > 0.0 {
            return;
        }
        if self.menu.is_open() {
            self.menu.handle_click(point);
            return;
        }
        let paused = self.state.paused;
        if self.registry.dispatch_click(point, paused, &mut self.state) {
            return;
        }
        if self.state.paused || !self.state.running {
            return;
        }
        self.handle_ship_click(point);
    }

    fn handle_ship_click(&mut self, point: Vec2) {
        let Some((x, y)) = self
            .layout
            .cell_at(point, self.state.draught, self.ship.row_count())
        else {
            return;
        };
        let Some(module) = self.ship.get(x, y) else {
            return;
        };
        let is_slot = module.is_slot();
        let repairable = module.level() == DamageLevel::Broken && !module.repairing();
        if is_slot {
            let options = self.ship.legal_kinds(x, y);
            if !options.is_empty() {
                self.menu.open(x, y, &options);
                self.state.queue_cue(cues::MENU_OPEN);
            }
        } else if repairable && self.ship.begin_repair(x, y) {
            self.state.cooldown_seconds = self.config.repair_seconds;
            self.state.pending = Some(PendingAction::Repair { x, y });
            self.state.queue_cue(cues::REPAIR_START);
            info!(x, y, "repair_started");
        }
    }

    fn poll_menu(&mut self) {
        match self.menu.poll() {
            Some(MenuEvent::Confirmed { x, y, kind }) => {
                if self.state.cooldown_seconds <= 0.0
                    && self.ship.begin_construction(kind, x, y)
                {
                    self.state.cooldown_seconds = self.config.build_seconds;
                    self.state.pending = Some(PendingAction::Build { x, y, kind });
                    self.state.queue_cue(cues::BUILD_START);
                    info!(x, y, kind = kind.label(), "construction_started");
                }
            }
            Some(MenuEvent::Cancelled) | None => {}
        }
    }

    /// Counts the cooldown down and, on reaching zero, interprets the
    /// pending action exactly once.
    fn resolve_cooldown(&mut self, dt_seconds: f32) {
        if self.state.cooldown_seconds <= 0.0 {
            return;
        }
        self.state.cooldown_seconds = (self.state.cooldown_seconds - dt_seconds).max(0.0);
        if self.state.cooldown_seconds > 0.0 {
            return;
        }
        if let Some(action) = self.state.pending.take() {
            match action {
                PendingAction::Repair { x, y } => {
                    self.ship.complete_repair(x, y);
                    self.state.queue_cue(cues::REPAIR_DONE);
                    info!(x, y, "repair_completed");
                }
                PendingAction::Build { x, y, kind } => {
                    if self.ship.finish_construction(kind, x, y) {
                        self.state.queue_cue(cues::BUILD_DONE);
                        let center = self.layout.module_center(x, y, self.state.draught);
                        for _ in 0..BUILD_DUST_COUNT {
                            let particle =
                                Particle::dust(self.state.elapsed_seconds, center, &mut self.rng);
                            self.registry.spawn(Box::new(particle));
                        }
                        info!(x, y, kind = kind.label(), "construction_completed");
                    }
                }
            }
        }
        // The busy affordance just ended; whatever is under the pointer is
        // interactive again.
        if let Some(cursor) = self.last_cursor {
            self.refresh_hover(cursor);
        }
    }

    fn tick_ship(&mut self, dt_seconds: f32) {
        let difficulty = self
            .config
            .difficulty
            .coefficient(self.state.distance, self.state.elapsed_seconds);
        let events = self
            .ship
            .tick(dt_seconds, difficulty, self.config.flood_rate, &mut self.rng);
        for event in events {
            match event {
                ShipEvent::ModuleDamaged { x, y, kind } => {
                    self.state.queue_cue(cues::MODULE_CRACK);
                    info!(x, y, kind = kind.label(), "module_damaged");
                }
                ShipEvent::ModuleBroke { x, y, kind } => {
                    self.state.queue_cue(cues::MODULE_BREAK);
                    warn!(x, y, kind = kind.label(), "module_broke");
                    let center = self.layout.module_center(x, y, self.state.draught);
                    for _ in 0..BREAK_SPRAY_COUNT {
                        let particle =
                            Particle::spray(self.state.elapsed_seconds, center, &mut self.rng);
                        self.registry.spawn(Box::new(particle));
                    }
                }
            }
        }
    }

    fn apply_physics(&mut self, dt_seconds: f32) {
        let stats = self.ship.stats(self.state.draught);
        self.state.last_stats = stats;
        self.state.speed = stats.speed;
        self.state.draught = (self.state.draught
            + (stats.weight - stats.buoyancy) * self.config.buoyancy_scale * dt_seconds)
            .max(0.0);
        self.state.distance += stats.speed * self.config.distance_scale * dt_seconds;
        self.state.elapsed_seconds += dt_seconds;
        self.state.ship_height = self.ship.height();
    }

    /// One-way for the session's lifetime: once the hull sits as deep as it
    /// is tall, `running` flips false and only an explicit restart undoes it.
    fn check_loss(&mut self) {
        if !self.state.running || self.state.draught < self.state.ship_height {
            return;
        }
        self.state.running = false;
        self.state.cooldown_seconds = 0.0;
        self.state.pending = None;
        self.menu.close();
        self.registry.spawn(Box::new(GameOverView::new(
            self.state.distance,
            self.state.elapsed_seconds,
        )));
        self.state.queue_cue(cues::SHIP_SUNK);
        warn!(
            distance = self.state.distance,
            elapsed_seconds = self.state.elapsed_seconds,
            "ship_sunk"
        );
    }

    fn emit_ambient_particles(&mut self, dt_seconds: f32) {
        let mut steam_spouts = Vec::new();
        let mut spray_spouts = Vec::new();

        self.steam_accumulator += dt_seconds;
        let emit_steam = self.steam_accumulator >= STEAM_INTERVAL_SECONDS;
        if emit_steam {
            self.steam_accumulator -= STEAM_INTERVAL_SECONDS;
        }

        for y in 0..self.ship.row_count() {
            for x in 0..self.ship.columns() {
                let Some(module) = self.ship.get(x, y) else {
                    continue;
                };
                let center = self.layout.module_center(x, y, self.state.draught);
                let top = Vec2::new(center.x, center.y - super::ship::MODULE_SIZE_PX * 0.5);
                if emit_steam
                    && module.kind() == ModuleKind::Boiler
                    && module.level() != DamageLevel::Broken
                {
                    steam_spouts.push(top);
                }
                if module.kind() == ModuleKind::Hull
                    && module.level() == DamageLevel::Broken
                    && super::module::submersion_fraction(y, self.state.draught) > 0.0
                {
                    spray_spouts.push(top);
                }
            }
        }

        let now = self.state.elapsed_seconds;
        for position in steam_spouts {
            let particle = Particle::steam(now, position, &mut self.rng);
            self.registry.spawn(Box::new(particle));
        }
        for position in spray_spouts {
            if self.rng.gen::<f32>() < SPRAY_CHANCE_PER_SECOND * dt_seconds {
                let particle = Particle::spray(now, position, &mut self.rng);
                self.registry.spawn(Box::new(particle));
            }
        }
    }

    fn refresh_hover(&mut self, cursor: Vec2) {
        let paused = self.state.paused;
        self.registry.dispatch_hover(cursor, paused, &mut self.state);
        let ship_interactive = self.registry.hovered().is_none()
            && !self.menu.is_open()
            && self.state.cooldown_seconds <= 0.0
            && !self.state.paused
            && self.state.running;
        self.state.hovered_cell = if ship_interactive {
            self.actionable_cell_at(cursor)
        } else {
            None
        };
    }

    fn actionable_cell_at(&self, point: Vec2) -> Option<(usize, usize)> {
        let (x, y) = self
            .layout
            .cell_at(point, self.state.draught, self.ship.row_count())?;
        let module = self.ship.get(x, y)?;
        let actionable = if module.is_slot() {
            !self.ship.legal_kinds(x, y).is_empty()
        } else {
            module.level() == DamageLevel::Broken && !module.repairing()
        };
        actionable.then_some((x, y))
    }

    fn drain_cues(&mut self) {
        for cue in self.state.take_cues() {
            self.sound.play(cue);
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> &SessionState {
        &self.state
    }

    #[cfg(test)]
    pub(crate) fn ship(&self) -> &Ship {
        &self.ship
    }

    #[cfg(test)]
    pub(crate) fn ship_mut(&mut self) -> &mut Ship {
        &mut self.ship
    }

    #[cfg(test)]
    pub(crate) fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    #[cfg(test)]
    pub(crate) fn layout(&self) -> &ShipLayout {
        &self.layout
    }
}

impl Game for Session {
    fn tick(&mut self, dt_seconds: f32, input: &InputSnapshot) {
        if input.pause_pressed() {
            self.toggle_pause();
        }
        if input.debug_pressed() {
            self.state.debug = !self.state.debug;
            info!(debug = self.state.debug, "debug_toggled");
        }
        if let Some(cursor) = input.cursor_position_px() {
            self.last_cursor = Some(cursor);
            self.refresh_hover(cursor);
        }
        if input.click_pressed() {
            if let Some(point) = input.cursor_position_px().or(self.last_cursor) {
                self.handle_click(point);
            }
        }
        if self.state.restart_requested {
            self.restart();
            return;
        }
        if self.state.paused {
            // The loop keeps the wall-clock marker; a paused tick advances
            // nothing and costs nothing.
            return;
        }

        self.registry.begin_tick();
        self.registry.update_all(dt_seconds, &mut self.state);

        if self.state.running {
            self.poll_menu();
            self.tick_ship(dt_seconds);
            self.resolve_cooldown(dt_seconds);
            self.apply_physics(dt_seconds);
            self.check_loss();
            self.emit_ambient_particles(dt_seconds);
        }
        self.drain_cues();
    }

    fn render(&mut self, canvas: &mut dyn Canvas, frame_dt_seconds: f32) {
        self.background.render(
            canvas,
            self.state.distance,
            frame_dt_seconds,
            self.layout.waterline_y(),
        );
        self.ship.render(
            canvas,
            &self.layout,
            self.state.draught,
            self.state.hovered_cell,
        );
        self.background
            .render_foreground(canvas, self.layout.waterline_y());
        self.registry.render_all(canvas, &self.state);
        self.menu.render(canvas);
    }

    fn cursor_hint(&self) -> CursorHint {
        if self.state.cooldown_seconds > 0.0 {
            CursorHint::Busy
        } else if self.state.hovered_cell.is_some() || self.registry.hovered().is_some() {
            CursorHint::Action
        } else {
            CursorHint::Default
        }
    }

    fn debug_title(&self) -> Option<String> {
        self.state.debug.then(|| {
            format!(
                "Waterline [draught {:.2}/{:.0} dist {:.0}]",
                self.state.draught, self.state.ship_height, self.state.distance
            )
        })
    }

    fn shutdown(&mut self) {
        self.menu.close();
        info!(
            distance = self.state.distance,
            elapsed_seconds = self.state.elapsed_seconds,
            "session_teardown"
        );
    }
}
