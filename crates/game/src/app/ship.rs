use engine::{Canvas, Rgba, Vec2};
use rand::Rng;

use super::module::{submersion_fraction, DamageLevel, ModuleKind, ShipModule, BUILDABLE_KINDS};

pub const DEFAULT_COLUMNS: usize = 7;
pub const MODULE_SIZE_PX: f32 = 48.0;

/// Wear added by one successful damage roll.
const DAMAGE_STEP: f32 = 1.0;

const SCAFFOLD_COLOR: Rgba = [150, 122, 82, 255];
const HULL_COLOR: Rgba = [108, 84, 58, 255];
const CASTLE_COLOR: Rgba = [148, 150, 160, 255];
const BOILER_COLOR: Rgba = [72, 70, 76, 255];
const PADDLE_COLOR: Rgba = [146, 52, 44, 255];
const HULL_CAP_COLOR: Rgba = [70, 52, 34, 255];
const DAMAGED_TINT: Rgba = [0, 0, 0, 90];
const BROKEN_TINT: Rgba = [180, 30, 20, 110];
const REPAIR_OUTLINE_COLOR: Rgba = [240, 240, 220, 255];
const SLOT_OUTLINE_COLOR: Rgba = [220, 230, 240, 70];
const SLOT_HOVER_COLOR: Rgba = [255, 230, 120, 200];
const CAP_THICKNESS_PX: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShipEvent {
    ModuleDamaged {
        x: usize,
        y: usize,
        kind: ModuleKind,
    },
    ModuleBroke {
        x: usize,
        y: usize,
        kind: ModuleKind,
    },
}

/// Per-tick aggregate of every module's contribution. Always recomputed from
/// the live grid; never carried across a tick boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShipStats {
    pub weight: f32,
    pub buoyancy: f32,
    pub speed: f32,
    pub flood: f32,
}

/// The buildable grid. Columns are fixed; rows grow upward as construction
/// reaches the top. Row 0 is the keel row. Every stored row is fully
/// populated; empty cells hold a `Slot` module.
#[derive(Debug, Clone)]
pub struct Ship {
    columns: usize,
    rows: Vec<Vec<ShipModule>>,
}

impl Ship {
    pub fn new(columns: usize) -> Self {
        let columns = columns.max(3);
        Self {
            columns,
            rows: vec![Self::slot_row(columns)],
        }
    }

    /// Fresh ship with a hull run across the keel row, the classic opening
    /// position: every non-edge column decked, one clear row above. The keel
    /// is seeded outward from a center hull so each further hull satisfies
    /// the lateral-neighbor predicate.
    pub fn with_starting_hull(columns: usize) -> Self {
        let mut ship = Self::new(columns);
        let center = ship.columns / 2;
        ship.rows[0][center] = ShipModule::new(ModuleKind::Hull);
        ship.rows.push(Self::slot_row(ship.columns));
        ship.refresh_display_flags_around(center, 0);
        for x in center + 1..ship.columns - 1 {
            let placed = ship.place(ModuleKind::Hull, x, 0);
            debug_assert!(placed);
        }
        for x in (1..center).rev() {
            let placed = ship.place(ModuleKind::Hull, x, 0);
            debug_assert!(placed);
        }
        ship
    }

    /// Builds a ship from explicit rows of kinds, keel row first. Short rows
    /// are padded with slots. Test-scenario setup; gameplay construction
    /// goes through placement.
    #[cfg(test)]
    pub(crate) fn from_rows(columns: usize, kinds: &[&[ModuleKind]]) -> Self {
        let columns = columns.max(3);
        let mut rows: Vec<Vec<ShipModule>> = kinds
            .iter()
            .map(|row_kinds| {
                let mut row = Self::slot_row(columns);
                for (x, kind) in row_kinds.iter().enumerate().take(columns) {
                    row[x] = ShipModule::new(*kind);
                }
                row
            })
            .collect();
        if rows.is_empty() {
            rows.push(Self::slot_row(columns));
        }
        let mut ship = Self { columns, rows };
        for y in 0..ship.rows.len() {
            for x in 0..ship.columns {
                ship.refresh_display_flags_at(x, y);
            }
        }
        ship
    }

    fn slot_row(columns: usize) -> Vec<ShipModule> {
        vec![ShipModule::new(ModuleKind::Slot); columns]
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Out-of-range access is absence, never a fault.
    pub fn get(&self, x: usize, y: usize) -> Option<&ShipModule> {
        self.rows.get(y).and_then(|row| row.get(x))
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut ShipModule> {
        self.rows.get_mut(y).and_then(|row| row.get_mut(x))
    }

    fn kind_at(&self, x: isize, y: isize) -> Option<ModuleKind> {
        if x < 0 || y < 0 {
            return None;
        }
        self.get(x as usize, y as usize).map(ShipModule::kind)
    }

    fn solid_at(&self, x: isize, y: isize) -> bool {
        self.kind_at(x, y).is_some_and(ModuleKind::is_solid)
    }

    pub fn is_edge_column(&self, x: usize) -> bool {
        x == 0 || x + 1 == self.columns
    }

    /// True iff `kind` may be built at `(x, y)` right now: the cell holds a
    /// buildable slot, the kind's support predicate is met, and solid kinds
    /// keep clear of the outermost columns.
    pub fn can_place(&self, kind: ModuleKind, x: usize, y: usize) -> bool {
        let Some(cell) = self.get(x, y) else {
            return false;
        };
        if !cell.is_slot() {
            return false;
        }
        if kind.is_solid() && self.is_edge_column(x) {
            return false;
        }
        self.placement_supported(kind, x, y)
    }

    fn placement_supported(&self, kind: ModuleKind, x: usize, y: usize) -> bool {
        let (x, y) = (x as isize, y as isize);
        match kind {
            ModuleKind::Slot | ModuleKind::Scaffold => false,
            ModuleKind::Hull => {
                if y == 0 {
                    self.solid_at(x - 1, 0) || self.solid_at(x + 1, 0)
                } else {
                    self.solid_at(x, y - 1)
                }
            }
            ModuleKind::Castle | ModuleKind::Boiler => self.solid_at(x, y - 1),
            ModuleKind::Paddle => {
                self.kind_at(x - 1, y) == Some(ModuleKind::Boiler)
                    || self.kind_at(x + 1, y) == Some(ModuleKind::Boiler)
            }
        }
    }

    pub fn legal_kinds(&self, x: usize, y: usize) -> Vec<ModuleKind> {
        BUILDABLE_KINDS
            .into_iter()
            .filter(|kind| self.can_place(*kind, x, y))
            .collect()
    }

    /// Immediate placement. Prefer the two-phase
    /// `begin_construction`/`finish_construction` path for player builds.
    pub fn place(&mut self, kind: ModuleKind, x: usize, y: usize) -> bool {
        if !self.can_place(kind, x, y) {
            return false;
        }
        self.install(kind, x, y);
        true
    }

    fn install(&mut self, kind: ModuleKind, x: usize, y: usize) {
        self.rows[y][x] = ShipModule::new(kind);
        if kind.is_solid() && y + 1 == self.rows.len() {
            self.rows.push(Self::slot_row(self.columns));
        }
        self.refresh_display_flags_around(x, y);
    }

    /// First phase of construction: the chosen kind is validated, then the
    /// cell holds a scaffold until the build cooldown expires.
    pub fn begin_construction(&mut self, kind: ModuleKind, x: usize, y: usize) -> bool {
        if !self.can_place(kind, x, y) {
            return false;
        }
        self.rows[y][x] = ShipModule::new(ModuleKind::Scaffold);
        self.refresh_display_flags_around(x, y);
        true
    }

    /// Second phase: swap the scaffold for the real module. Support cannot
    /// have vanished in between, since modules are only ever added.
    pub fn finish_construction(&mut self, kind: ModuleKind, x: usize, y: usize) -> bool {
        match self.get(x, y) {
            Some(module) if module.kind() == ModuleKind::Scaffold => {
                self.install(kind, x, y);
                true
            }
            _ => false,
        }
    }

    pub fn begin_repair(&mut self, x: usize, y: usize) -> bool {
        match self.get_mut(x, y) {
            Some(module) if module.level() == DamageLevel::Broken && !module.repairing() => {
                module.set_repairing(true);
                true
            }
            _ => false,
        }
    }

    pub fn complete_repair(&mut self, x: usize, y: usize) {
        if let Some(module) = self.get_mut(x, y) {
            module.complete_repair();
        }
    }

    fn castle_adjacent(&self, x: usize, y: usize) -> bool {
        let (x, y) = (x as isize, y as isize);
        [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)]
            .into_iter()
            .any(|(nx, ny)| self.kind_at(nx, ny) == Some(ModuleKind::Castle))
    }

    /// One simulation step of wear and flooding. Fragile modules roll damage
    /// scaled by the difficulty coefficient and the tick delta; broken hulls
    /// take on water.
    pub fn tick<R: Rng>(
        &mut self,
        dt_seconds: f32,
        difficulty: f32,
        flood_rate: f32,
        rng: &mut R,
    ) -> Vec<ShipEvent> {
        let mut rolls = Vec::new();
        for y in 0..self.rows.len() {
            for x in 0..self.columns {
                let module = &self.rows[y][x];
                if !module.destructible() {
                    continue;
                }
                let fragility = module.effective_fragility(self.castle_adjacent(x, y));
                rolls.push((x, y, fragility));
            }
        }

        let mut events = Vec::new();
        for (x, y, fragility) in rolls {
            let chance = (fragility * difficulty * dt_seconds).clamp(0.0, 1.0);
            if rng.gen::<f32>() >= chance {
                continue;
            }
            let module = &mut self.rows[y][x];
            let kind = module.kind();
            match module.apply_damage(DAMAGE_STEP) {
                Some(DamageLevel::Damaged) => {
                    events.push(ShipEvent::ModuleDamaged { x, y, kind });
                }
                Some(DamageLevel::Broken) => {
                    events.push(ShipEvent::ModuleBroke { x, y, kind });
                }
                _ => {}
            }
        }

        for row in &mut self.rows {
            for module in row {
                module.tick_flood(dt_seconds, flood_rate);
            }
        }
        events
    }

    /// Sums every live module's contribution for this tick.
    pub fn stats(&self, draught: f32) -> ShipStats {
        let mut stats = ShipStats::default();
        for (y, row) in self.rows.iter().enumerate() {
            let submersion = submersion_fraction(y, draught);
            for module in row {
                stats.weight += module.weight();
                stats.buoyancy += module.buoyancy_contribution(submersion);
                stats.speed += module.speed_contribution();
                stats.flood += module.flood();
            }
        }
        stats
    }

    /// Ship height in module-height units: rows that hold at least one real
    /// module. The all-slot expansion row on top does not count.
    pub fn height(&self) -> f32 {
        self.rows
            .iter()
            .filter(|row| row.iter().any(|module| module.kind().is_real()))
            .count() as f32
    }

    /// Recomputes neighbor-derived display state for a cell and its four
    /// orthogonal neighbors. Safe to call repeatedly; the result depends only
    /// on current grid contents.
    pub fn refresh_display_flags_around(&mut self, x: usize, y: usize) {
        self.refresh_display_flags_at(x, y);
        if x > 0 {
            self.refresh_display_flags_at(x - 1, y);
        }
        self.refresh_display_flags_at(x + 1, y);
        if y > 0 {
            self.refresh_display_flags_at(x, y - 1);
        }
        self.refresh_display_flags_at(x, y + 1);
    }

    fn refresh_display_flags_at(&mut self, x: usize, y: usize) {
        let cap_exposed = {
            let Some(module) = self.get(x, y) else {
                return;
            };
            module.is_solid() && !self.solid_at(x as isize, y as isize + 1)
        };
        if let Some(module) = self.get_mut(x, y) {
            module.set_cap_exposed(cap_exposed);
        }
    }

    pub fn render(
        &self,
        canvas: &mut dyn Canvas,
        layout: &ShipLayout,
        draught: f32,
        hovered_cell: Option<(usize, usize)>,
    ) {
        for y in 0..self.rows.len() {
            for x in 0..self.columns {
                let module = &self.rows[y][x];
                let (left, top, size) = layout.module_rect(x, y, draught);
                let hovered = hovered_cell == Some((x, y));
                match module.kind() {
                    ModuleKind::Slot => {
                        if !self.legal_kinds(x, y).is_empty() {
                            let color = if hovered {
                                SLOT_HOVER_COLOR
                            } else {
                                SLOT_OUTLINE_COLOR
                            };
                            canvas.stroke_rect(left + 2.0, top + 2.0, size - 4.0, size - 4.0, color);
                        }
                    }
                    kind => {
                        canvas.fill_rect(left, top, size, size, module_color(kind));
                        if let Some(key) = kind.sprite_key() {
                            canvas.draw_sprite(key, left, top);
                        }
                        if module.cap_exposed() {
                            canvas.fill_rect(left, top, size, CAP_THICKNESS_PX, HULL_CAP_COLOR);
                        }
                        match module.level() {
                            DamageLevel::Normal => {}
                            DamageLevel::Damaged => {
                                // Wear darkens with how close the module is
                                // to breaking.
                                let ratio = (module.damage() / module.health()).clamp(0.0, 1.0);
                                let mut tint = DAMAGED_TINT;
                                tint[3] = (tint[3] as f32 * (0.5 + ratio * 0.5)) as u8;
                                canvas.fill_rect(left, top, size, size, tint);
                            }
                            DamageLevel::Broken => {
                                canvas.fill_rect(left, top, size, size, BROKEN_TINT);
                            }
                        }
                        if module.repairing() {
                            canvas.stroke_rect(left, top, size, size, REPAIR_OUTLINE_COLOR);
                        } else if hovered && module.level() == DamageLevel::Broken {
                            canvas.stroke_rect(left, top, size, size, SLOT_HOVER_COLOR);
                        }
                    }
                }
            }
        }
    }
}

fn module_color(kind: ModuleKind) -> Rgba {
    match kind {
        ModuleKind::Slot => [0, 0, 0, 0],
        ModuleKind::Scaffold => SCAFFOLD_COLOR,
        ModuleKind::Hull => HULL_COLOR,
        ModuleKind::Castle => CASTLE_COLOR,
        ModuleKind::Boiler => BOILER_COLOR,
        ModuleKind::Paddle => PADDLE_COLOR,
    }
}

/// Screen placement of the grid. The waterline is fixed on screen; the hull
/// sits deeper as draught grows, so submerged rows slide below it.
#[derive(Debug, Clone, Copy)]
pub struct ShipLayout {
    origin_x: f32,
    waterline_y: f32,
    columns: usize,
}

impl ShipLayout {
    pub fn for_viewport(viewport: (u32, u32), columns: usize) -> Self {
        Self {
            origin_x: (viewport.0 as f32 - columns as f32 * MODULE_SIZE_PX) * 0.5,
            waterline_y: viewport.1 as f32 * 0.62,
            columns,
        }
    }

    pub fn waterline_y(&self) -> f32 {
        self.waterline_y
    }

    fn keel_bottom_y(&self, draught: f32) -> f32 {
        self.waterline_y + draught * MODULE_SIZE_PX
    }

    /// Screen rect `(left, top, size)` of cell `(x, y)` at the given draught.
    pub fn module_rect(&self, x: usize, y: usize, draught: f32) -> (f32, f32, f32) {
        let left = self.origin_x + x as f32 * MODULE_SIZE_PX;
        let top = self.keel_bottom_y(draught) - (y as f32 + 1.0) * MODULE_SIZE_PX;
        (left, top, MODULE_SIZE_PX)
    }

    /// Center of a cell, for particle emission.
    pub fn module_center(&self, x: usize, y: usize, draught: f32) -> Vec2 {
        let (left, top, size) = self.module_rect(x, y, draught);
        Vec2::new(left + size * 0.5, top + size * 0.5)
    }

    /// Grid cell under a screen point, if any.
    pub fn cell_at(
        &self,
        point: Vec2,
        draught: f32,
        row_count: usize,
    ) -> Option<(usize, usize)> {
        let fx = (point.x - self.origin_x) / MODULE_SIZE_PX;
        let fy = (self.keel_bottom_y(draught) - point.y) / MODULE_SIZE_PX;
        if fx < 0.0 || fy < 0.0 {
            return None;
        }
        let x = fx as usize;
        let y = fy as usize;
        if x >= self.columns || y >= row_count {
            return None;
        }
        Some((x, y))
    }
}
