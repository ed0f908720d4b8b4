const HULL_WEIGHT: f32 = 5.0;
const HULL_HEALTH: f32 = 4.0;
const HULL_FRAGILITY: f32 = 0.05;
const HULL_BUOYANCY_CAPACITY: f32 = 9.0;
const CASTLE_WEIGHT: f32 = 4.0;
const BOILER_WEIGHT: f32 = 6.0;
const BOILER_HEALTH: f32 = 3.0;
const BOILER_FRAGILITY: f32 = 0.08;
const PADDLE_WEIGHT: f32 = 3.0;
const PADDLE_HEALTH: f32 = 2.0;
const PADDLE_FRAGILITY: f32 = 0.06;
const PADDLE_SPEED: f32 = 4.0;
const SCAFFOLD_WEIGHT: f32 = 1.0;

/// Adjacent castle shelters a module from half of its incoming wear.
const CASTLE_SHELTER_FACTOR: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    /// Placeholder for an empty grid cell. Occupied rows always hold one of
    /// these instead of a missing entry, so grid walkers never branch on null.
    Slot,
    /// Construction in progress; swapped for the real module on cooldown expiry.
    Scaffold,
    Hull,
    Castle,
    Boiler,
    Paddle,
}

impl ModuleKind {
    /// Anything that physically exists on the ship, scaffolding included.
    pub fn is_real(self) -> bool {
        !matches!(self, ModuleKind::Slot)
    }

    /// Whether further modules may rest on or beside this one.
    pub fn is_solid(self) -> bool {
        matches!(self, ModuleKind::Hull | ModuleKind::Castle | ModuleKind::Boiler)
    }

    pub fn label(self) -> &'static str {
        match self {
            ModuleKind::Slot => "SLOT",
            ModuleKind::Scaffold => "SCAFFOLD",
            ModuleKind::Hull => "HULL",
            ModuleKind::Castle => "CASTLE",
            ModuleKind::Boiler => "BOILER",
            ModuleKind::Paddle => "PADDLE",
        }
    }

    pub fn sprite_key(self) -> Option<&'static str> {
        match self {
            ModuleKind::Slot => None,
            ModuleKind::Scaffold => Some("modules/scaffold"),
            ModuleKind::Hull => Some("modules/hull"),
            ModuleKind::Castle => Some("modules/castle"),
            ModuleKind::Boiler => Some("modules/boiler"),
            ModuleKind::Paddle => Some("modules/paddle"),
        }
    }
}

/// Kinds the construction menu may offer. `Slot` and `Scaffold` are grid
/// mechanics, not player choices.
pub const BUILDABLE_KINDS: [ModuleKind; 4] = [
    ModuleKind::Hull,
    ModuleKind::Castle,
    ModuleKind::Boiler,
    ModuleKind::Paddle,
];

/// Discrete wear state. Only ever advances under damage; the single way back
/// to `Normal` is a completed repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DamageLevel {
    Normal,
    Damaged,
    Broken,
}

#[derive(Debug, Clone)]
pub struct ShipModule {
    kind: ModuleKind,
    weight: f32,
    base_fragility: f32,
    health: f32,
    damage: f32,
    level: DamageLevel,
    repairing: bool,
    flood: f32,
    buoyancy_capacity: f32,
    speed: f32,
    cap_exposed: bool,
}

impl ShipModule {
    pub fn new(kind: ModuleKind) -> Self {
        let (weight, base_fragility, health, buoyancy_capacity, speed) = match kind {
            ModuleKind::Slot => (0.0, 0.0, 1.0, 0.0, 0.0),
            ModuleKind::Scaffold => (SCAFFOLD_WEIGHT, 0.0, 1.0, 0.0, 0.0),
            ModuleKind::Hull => (
                HULL_WEIGHT,
                HULL_FRAGILITY,
                HULL_HEALTH,
                HULL_BUOYANCY_CAPACITY,
                0.0,
            ),
            ModuleKind::Castle => (CASTLE_WEIGHT, 0.0, 1.0, 0.0, 0.0),
            ModuleKind::Boiler => (BOILER_WEIGHT, BOILER_FRAGILITY, BOILER_HEALTH, 0.0, 0.0),
            ModuleKind::Paddle => (
                PADDLE_WEIGHT,
                PADDLE_FRAGILITY,
                PADDLE_HEALTH,
                0.0,
                PADDLE_SPEED,
            ),
        };
        Self {
            kind,
            weight,
            base_fragility,
            health,
            damage: 0.0,
            level: DamageLevel::Normal,
            repairing: false,
            flood: 0.0,
            buoyancy_capacity,
            speed,
            cap_exposed: false,
        }
    }

    pub fn kind(&self) -> ModuleKind {
        self.kind
    }

    pub fn is_slot(&self) -> bool {
        self.kind == ModuleKind::Slot
    }

    pub fn is_solid(&self) -> bool {
        self.kind.is_solid()
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn damage(&self) -> f32 {
        self.damage
    }

    pub fn level(&self) -> DamageLevel {
        self.level
    }

    pub fn repairing(&self) -> bool {
        self.repairing
    }

    pub fn flood(&self) -> f32 {
        self.flood
    }

    pub fn cap_exposed(&self) -> bool {
        self.cap_exposed
    }

    pub fn set_cap_exposed(&mut self, cap_exposed: bool) {
        self.cap_exposed = cap_exposed;
    }

    /// Zero fragility means indestructible.
    pub fn destructible(&self) -> bool {
        self.base_fragility > 0.0
    }

    /// Fragility after accounting for a sheltering castle next door. Derived
    /// per check; never stored, since neighbors change under construction.
    pub fn effective_fragility(&self, castle_adjacent: bool) -> f32 {
        if castle_adjacent {
            self.base_fragility * CASTLE_SHELTER_FACTOR
        } else {
            self.base_fragility
        }
    }

    /// Accumulates wear, clamped to `[0, health]`, and advances the damage
    /// level. Returns the new level when it changed. Levels never regress
    /// here; see `complete_repair`.
    pub fn apply_damage(&mut self, amount: f32) -> Option<DamageLevel> {
        if !self.destructible() || amount <= 0.0 {
            return None;
        }
        self.damage = (self.damage + amount).clamp(0.0, self.health);
        let reached = if self.damage >= self.health {
            DamageLevel::Broken
        } else if self.damage >= self.health * 0.5 {
            DamageLevel::Damaged
        } else {
            DamageLevel::Normal
        };
        if reached > self.level {
            self.level = reached;
            Some(reached)
        } else {
            None
        }
    }

    pub fn set_repairing(&mut self, repairing: bool) {
        self.repairing = repairing;
    }

    /// Finishes a repair: damage to exactly zero, level to `Normal`, flood
    /// drained, flag cleared. One atomic step; no intermediate state is
    /// observable between these.
    pub fn complete_repair(&mut self) {
        self.damage = 0.0;
        self.level = DamageLevel::Normal;
        self.flood = 0.0;
        self.repairing = false;
    }

    /// Broken hulls take on water until their buoyant volume is spent.
    pub fn tick_flood(&mut self, dt_seconds: f32, flood_rate: f32) {
        if self.kind != ModuleKind::Hull || self.level != DamageLevel::Broken {
            return;
        }
        self.flood = (self.flood + flood_rate * dt_seconds).min(self.buoyancy_capacity);
    }

    /// Upward push from this module given how deep it currently sits.
    /// Dry modules push nothing; flooded volume is lost.
    pub fn buoyancy_contribution(&self, submersion: f32) -> f32 {
        if submersion <= 0.0 {
            return 0.0;
        }
        (self.buoyancy_capacity * submersion - self.flood).max(0.0)
    }

    pub fn speed_contribution(&self) -> f32 {
        if self.level == DamageLevel::Broken {
            0.0
        } else {
            self.speed
        }
    }
}

/// Fraction of a module's vertical extent below the waterline, given the row
/// it occupies. Draught and rows are both in module-height units.
pub fn submersion_fraction(row: usize, draught: f32) -> f32 {
    (draught - row as f32).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damage_stays_within_zero_and_health() {
        let mut module = ShipModule::new(ModuleKind::Hull);
        module.apply_damage(1000.0);
        assert_eq!(module.damage(), module.health());

        module.complete_repair();
        assert_eq!(module.damage(), 0.0);
        module.apply_damage(-5.0);
        assert_eq!(module.damage(), 0.0);
    }

    #[test]
    fn half_health_damage_is_damaged_not_broken() {
        let mut module = ShipModule::new(ModuleKind::Hull);
        let changed = module.apply_damage(module.health() * 0.5);
        assert_eq!(changed, Some(DamageLevel::Damaged));
        assert_eq!(module.level(), DamageLevel::Damaged);
    }

    #[test]
    fn full_health_damage_is_broken() {
        let mut module = ShipModule::new(ModuleKind::Hull);
        let changed = module.apply_damage(module.health());
        assert_eq!(changed, Some(DamageLevel::Broken));
        assert_eq!(module.level(), DamageLevel::Broken);
    }

    #[test]
    fn below_half_damage_stays_normal() {
        let mut module = ShipModule::new(ModuleKind::Hull);
        assert_eq!(module.apply_damage(module.health() * 0.25), None);
        assert_eq!(module.level(), DamageLevel::Normal);
    }

    #[test]
    fn level_is_monotonic_under_accumulating_damage() {
        let mut module = ShipModule::new(ModuleKind::Boiler);
        let mut previous = module.level();
        for _ in 0..20 {
            module.apply_damage(0.3);
            assert!(module.level() >= previous);
            previous = module.level();
        }
        assert_eq!(module.level(), DamageLevel::Broken);
    }

    #[test]
    fn indestructible_module_never_takes_damage() {
        let mut castle = ShipModule::new(ModuleKind::Castle);
        assert!(!castle.destructible());
        assert_eq!(castle.apply_damage(100.0), None);
        assert_eq!(castle.damage(), 0.0);
        assert_eq!(castle.level(), DamageLevel::Normal);
    }

    #[test]
    fn repair_resets_damage_level_and_flood_atomically() {
        let mut module = ShipModule::new(ModuleKind::Hull);
        module.apply_damage(module.health());
        module.tick_flood(10.0, 2.0);
        module.set_repairing(true);
        assert!(module.flood() > 0.0);

        module.complete_repair();
        assert_eq!(module.damage(), 0.0);
        assert_eq!(module.level(), DamageLevel::Normal);
        assert_eq!(module.flood(), 0.0);
        assert!(!module.repairing());
    }

    #[test]
    fn castle_adjacency_halves_effective_fragility() {
        let module = ShipModule::new(ModuleKind::Hull);
        let sheltered = module.effective_fragility(true);
        let exposed = module.effective_fragility(false);
        assert!((sheltered * 2.0 - exposed).abs() < f32::EPSILON);
    }

    #[test]
    fn flood_only_accumulates_while_broken_and_caps_at_capacity() {
        let mut module = ShipModule::new(ModuleKind::Hull);
        module.tick_flood(5.0, 1.0);
        assert_eq!(module.flood(), 0.0);

        module.apply_damage(module.health());
        module.tick_flood(1.0, 1.0);
        assert_eq!(module.flood(), 1.0);
        module.tick_flood(1000.0, 1.0);
        assert_eq!(module.flood(), HULL_BUOYANCY_CAPACITY);
    }

    #[test]
    fn non_hull_modules_never_flood() {
        let mut boiler = ShipModule::new(ModuleKind::Boiler);
        boiler.apply_damage(boiler.health());
        boiler.tick_flood(10.0, 1.0);
        assert_eq!(boiler.flood(), 0.0);
    }

    #[test]
    fn dry_module_has_no_buoyancy() {
        let module = ShipModule::new(ModuleKind::Hull);
        assert_eq!(module.buoyancy_contribution(0.0), 0.0);
    }

    #[test]
    fn buoyancy_scales_with_submersion_minus_flood() {
        let mut module = ShipModule::new(ModuleKind::Hull);
        assert_eq!(
            module.buoyancy_contribution(1.0),
            HULL_BUOYANCY_CAPACITY
        );
        assert_eq!(
            module.buoyancy_contribution(0.5),
            HULL_BUOYANCY_CAPACITY * 0.5
        );

        module.apply_damage(module.health());
        module.tick_flood(2.0, 1.0);
        assert_eq!(
            module.buoyancy_contribution(1.0),
            HULL_BUOYANCY_CAPACITY - 2.0
        );
        // A barely submerged, heavily flooded hull pushes nothing, never pulls.
        module.tick_flood(100.0, 1.0);
        assert_eq!(module.buoyancy_contribution(0.1), 0.0);
    }

    #[test]
    fn broken_paddle_contributes_no_speed() {
        let mut paddle = ShipModule::new(ModuleKind::Paddle);
        assert_eq!(paddle.speed_contribution(), PADDLE_SPEED);
        paddle.apply_damage(paddle.health());
        assert_eq!(paddle.speed_contribution(), 0.0);
    }

    #[test]
    fn submersion_fraction_clamps_per_row() {
        assert_eq!(submersion_fraction(0, 0.0), 0.0);
        assert_eq!(submersion_fraction(0, 0.5), 0.5);
        assert_eq!(submersion_fraction(0, 3.0), 1.0);
        assert_eq!(submersion_fraction(2, 1.0), 0.0);
        assert_eq!(submersion_fraction(2, 2.5), 0.5);
    }
}
