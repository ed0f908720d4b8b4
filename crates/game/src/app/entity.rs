use engine::{Canvas, Vec2};

use super::session::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(pub u64);

/// A unit in the active set: particles, overlays, HUD widgets. Capability
/// flags gate which passes touch it; every behavior has a no-op default so
/// concrete types implement only what they use.
pub trait Entity {
    /// Draw order. Higher depths draw on top; ties keep array order.
    fn depth(&self) -> i32 {
        0
    }

    /// Once false, the entity is dropped at the next tick's compaction pass.
    fn alive(&self) -> bool {
        true
    }

    fn visible(&self) -> bool {
        true
    }

    fn updating(&self) -> bool {
        true
    }

    /// Interaction stays enabled for this entity while the session is paused.
    fn clickable_while_paused(&self) -> bool {
        false
    }

    fn update(&mut self, _dt_seconds: f32, _state: &mut SessionState) {}

    fn render(&self, _canvas: &mut dyn Canvas, _state: &SessionState) {}

    /// Whether `point` lands on this entity.
    fn hit_test(&self, _point: Vec2) -> bool {
        false
    }

    fn on_click(&mut self, _point: Vec2, _state: &mut SessionState) {}

    fn on_hover_enter(&mut self, _state: &mut SessionState) {}

    fn on_hover_exit(&mut self, _state: &mut SessionState) {}
}

struct Entry {
    id: EntityId,
    entity: Box<dyn Entity>,
}

/// Insertion-ordered collection of live entities.
///
/// Spawns are deferred and removal happens only in `begin_tick`'s compaction
/// pass, so neither ever mutates the collection mid-iteration.
#[derive(Default)]
pub struct EntityRegistry {
    next_id: u64,
    entries: Vec<Entry>,
    pending_spawns: Vec<Entry>,
    hovered: Option<EntityId>,
    draw_order: Vec<usize>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an entity; it joins the active set at the next compaction.
    pub fn spawn(&mut self, entity: Box<dyn Entity>) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.pending_spawns.push(Entry { id, entity });
        id
    }

    pub fn hovered(&self) -> Option<EntityId> {
        self.hovered
    }

    /// Compaction pass: drop dead entities in one order-preserving sweep,
    /// then admit pending spawns at the tail.
    pub fn begin_tick(&mut self) {
        self.entries.retain(|entry| entry.entity.alive());
        self.entries.append(&mut self.pending_spawns);
    }

    /// Advances every live, updating entity with the same delta.
    pub fn update_all(&mut self, dt_seconds: f32, state: &mut SessionState) {
        for entry in &mut self.entries {
            if entry.entity.alive() && entry.entity.updating() {
                entry.entity.update(dt_seconds, state);
            }
        }
    }

    /// Draws visible entities in stable depth order: the scratch index list
    /// is sorted by depth with ties keeping current array order.
    pub fn render_all(&mut self, canvas: &mut dyn Canvas, state: &SessionState) {
        self.draw_order.clear();
        self.draw_order.extend(0..self.entries.len());
        let entries = &self.entries;
        self.draw_order
            .sort_by_key(|index| entries[*index].entity.depth());
        for index in &self.draw_order {
            let entity = &self.entries[*index].entity;
            if entity.alive() && entity.visible() {
                entity.render(canvas, state);
            }
        }
    }

    fn interaction_eligible(entry: &Entry, paused: bool) -> bool {
        entry.entity.alive()
            && entry.entity.updating()
            && (!paused || entry.entity.clickable_while_paused())
    }

    /// Click fan-out in current array order: the first eligible entity whose
    /// hit test passes receives the click and stops propagation.
    pub fn dispatch_click(&mut self, point: Vec2, paused: bool, state: &mut SessionState) -> bool {
        let target = self
            .entries
            .iter()
            .position(|entry| Self::interaction_eligible(entry, paused) && entry.entity.hit_test(point));
        match target {
            Some(index) => {
                self.entries[index].entity.on_click(point, state);
                true
            }
            None => false,
        }
    }

    /// Hover fan-out with enter/exit edges. A previously hovered entity that
    /// died since is forgotten without an exit notification.
    pub fn dispatch_hover(&mut self, point: Vec2, paused: bool, state: &mut SessionState) {
        if let Some(previous) = self.hovered {
            let still_alive = self
                .entries
                .iter()
                .any(|entry| entry.id == previous && entry.entity.alive());
            if !still_alive {
                self.hovered = None;
            }
        }

        let target = self
            .entries
            .iter()
            .position(|entry| Self::interaction_eligible(entry, paused) && entry.entity.hit_test(point));
        let target_id = target.map(|index| self.entries[index].id);
        if target_id == self.hovered {
            return;
        }

        if let Some(previous) = self.hovered.take() {
            if let Some(entry) = self.entries.iter_mut().find(|entry| entry.id == previous) {
                entry.entity.on_hover_exit(state);
            }
        }
        if let Some(index) = target {
            self.entries[index].entity.on_hover_enter(state);
        }
        self.hovered = target_id;
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.pending_spawns.clear();
        self.hovered = None;
        self.draw_order.clear();
    }
}

#[cfg(test)]
impl EntityRegistry {
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn contains(&self, id: EntityId) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum ProbeCall {
        Update,
        Render,
        Click,
        HoverEnter,
        HoverExit,
    }

    #[derive(Default)]
    struct ProbeLog {
        calls: Vec<(&'static str, ProbeCall)>,
    }

    struct Probe {
        name: &'static str,
        depth: i32,
        alive: bool,
        updating: bool,
        clickable_while_paused: bool,
        hit: bool,
        log: Rc<RefCell<ProbeLog>>,
    }

    impl Probe {
        fn new(name: &'static str, log: &Rc<RefCell<ProbeLog>>) -> Self {
            Self {
                name,
                depth: 0,
                alive: true,
                updating: true,
                clickable_while_paused: false,
                hit: true,
                log: Rc::clone(log),
            }
        }

        fn record(&self, call: ProbeCall) {
            self.log.borrow_mut().calls.push((self.name, call));
        }
    }

    impl Entity for Probe {
        fn depth(&self) -> i32 {
            self.depth
        }

        fn alive(&self) -> bool {
            self.alive
        }

        fn updating(&self) -> bool {
            self.updating
        }

        fn clickable_while_paused(&self) -> bool {
            self.clickable_while_paused
        }

        fn update(&mut self, _dt_seconds: f32, _state: &mut SessionState) {
            self.record(ProbeCall::Update);
        }

        fn render(&self, _canvas: &mut dyn Canvas, _state: &SessionState) {
            self.record(ProbeCall::Render);
        }

        fn hit_test(&self, _point: Vec2) -> bool {
            self.hit
        }

        fn on_click(&mut self, _point: Vec2, _state: &mut SessionState) {
            self.record(ProbeCall::Click);
        }

        fn on_hover_enter(&mut self, _state: &mut SessionState) {
            self.record(ProbeCall::HoverEnter);
        }

        fn on_hover_exit(&mut self, _state: &mut SessionState) {
            self.record(ProbeCall::HoverExit);
        }
    }

    struct NullCanvas;

    impl Canvas for NullCanvas {
        fn size(&self) -> (u32, u32) {
            (960, 540)
        }
        fn clear(&mut self, _color: engine::Rgba) {}
        fn fill_rect(
            &mut self,
            _x: f32,
            _y: f32,
            _width: f32,
            _height: f32,
            _color: engine::Rgba,
        ) {
        }
        fn stroke_rect(
            &mut self,
            _x: f32,
            _y: f32,
            _width: f32,
            _height: f32,
            _color: engine::Rgba,
        ) {
        }
        fn draw_sprite(&mut self, _key: &str, _x: f32, _y: f32) {}
        fn draw_text(&mut self, _text: &str, _x: f32, _y: f32, _color: engine::Rgba) {}
        fn measure_text(&self, _text: &str) -> f32 {
            0.0
        }
        fn set_alpha(&mut self, _alpha: f32) {}
        fn push(&mut self) {}
        fn pop(&mut self) {}
        fn translate(&mut self, _dx: f32, _dy: f32) {}
    }

    fn state() -> SessionState {
        SessionState::new()
    }

    fn calls(log: &Rc<RefCell<ProbeLog>>) -> Vec<(&'static str, ProbeCall)> {
        log.borrow().calls.clone()
    }

    #[test]
    fn spawned_entities_join_at_next_compaction() {
        let log = Rc::new(RefCell::new(ProbeLog::default()));
        let mut registry = EntityRegistry::new();
        let id = registry.spawn(Box::new(Probe::new("a", &log)));
        assert_eq!(registry.len(), 0);
        assert!(!registry.contains(id));

        registry.begin_tick();
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(id));
    }

    #[test]
    fn dead_entities_are_dropped_in_order_preserving_pass() {
        let log = Rc::new(RefCell::new(ProbeLog::default()));
        let mut registry = EntityRegistry::new();
        let mut doomed = Probe::new("doomed", &log);
        doomed.alive = false;
        registry.spawn(Box::new(Probe::new("first", &log)));
        let doomed_id = registry.spawn(Box::new(doomed));
        let last_id = registry.spawn(Box::new(Probe::new("last", &log)));
        registry.begin_tick();
        assert_eq!(registry.len(), 3);

        registry.begin_tick();
        assert_eq!(registry.len(), 2);
        assert!(!registry.contains(doomed_id));
        assert!(registry.contains(last_id));
    }

    #[test]
    fn update_skips_non_updating_entities() {
        let log = Rc::new(RefCell::new(ProbeLog::default()));
        let mut registry = EntityRegistry::new();
        let mut sleeper = Probe::new("sleeper", &log);
        sleeper.updating = false;
        registry.spawn(Box::new(Probe::new("runner", &log)));
        registry.spawn(Box::new(sleeper));
        registry.begin_tick();

        registry.update_all(0.1, &mut state());
        assert_eq!(calls(&log), vec![("runner", ProbeCall::Update)]);
    }

    #[test]
    fn render_draws_in_depth_order_with_stable_ties() {
        let log = Rc::new(RefCell::new(ProbeLog::default()));
        let mut registry = EntityRegistry::new();
        let mut top = Probe::new("top", &log);
        top.depth = 10;
        let mut tie_a = Probe::new("tie_a", &log);
        tie_a.depth = 5;
        let mut tie_b = Probe::new("tie_b", &log);
        tie_b.depth = 5;
        registry.spawn(Box::new(top));
        registry.spawn(Box::new(tie_a));
        registry.spawn(Box::new(tie_b));
        registry.begin_tick();

        registry.render_all(&mut NullCanvas, &state());
        assert_eq!(
            calls(&log),
            vec![
                ("tie_a", ProbeCall::Render),
                ("tie_b", ProbeCall::Render),
                ("top", ProbeCall::Render),
            ]
        );
    }

    #[test]
    fn click_goes_to_first_hit_in_array_order_not_depth_order() {
        let log = Rc::new(RefCell::new(ProbeLog::default()));
        let mut registry = EntityRegistry::new();
        let mut shallow_first = Probe::new("shallow_first", &log);
        shallow_first.depth = 0;
        let mut deep_second = Probe::new("deep_second", &log);
        deep_second.depth = 100;
        registry.spawn(Box::new(shallow_first));
        registry.spawn(Box::new(deep_second));
        registry.begin_tick();

        assert!(registry.dispatch_click(Vec2::ZERO, false, &mut state()));
        assert_eq!(calls(&log), vec![("shallow_first", ProbeCall::Click)]);
    }

    #[test]
    fn click_skips_entities_that_miss_the_hit_test() {
        let log = Rc::new(RefCell::new(ProbeLog::default()));
        let mut registry = EntityRegistry::new();
        let mut miss = Probe::new("miss", &log);
        miss.hit = false;
        registry.spawn(Box::new(miss));
        registry.spawn(Box::new(Probe::new("hit", &log)));
        registry.begin_tick();

        assert!(registry.dispatch_click(Vec2::ZERO, false, &mut state()));
        assert_eq!(calls(&log), vec![("hit", ProbeCall::Click)]);
    }

    #[test]
    fn click_returns_false_when_nothing_is_hit() {
        let log = Rc::new(RefCell::new(ProbeLog::default()));
        let mut registry = EntityRegistry::new();
        let mut miss = Probe::new("miss", &log);
        miss.hit = false;
        registry.spawn(Box::new(miss));
        registry.begin_tick();

        assert!(!registry.dispatch_click(Vec2::ZERO, false, &mut state()));
        assert!(calls(&log).is_empty());
    }

    #[test]
    fn paused_click_only_reaches_pause_exempt_entities() {
        let log = Rc::new(RefCell::new(ProbeLog::default()));
        let mut registry = EntityRegistry::new();
        let mut exempt = Probe::new("exempt", &log);
        exempt.clickable_while_paused = true;
        registry.spawn(Box::new(Probe::new("ordinary", &log)));
        registry.spawn(Box::new(exempt));
        registry.begin_tick();

        assert!(registry.dispatch_click(Vec2::ZERO, true, &mut state()));
        assert_eq!(calls(&log), vec![("exempt", ProbeCall::Click)]);
    }

    #[test]
    fn non_updating_entities_are_not_clickable() {
        let log = Rc::new(RefCell::new(ProbeLog::default()));
        let mut registry = EntityRegistry::new();
        let mut dormant = Probe::new("dormant", &log);
        dormant.updating = false;
        registry.spawn(Box::new(dormant));
        registry.begin_tick();

        assert!(!registry.dispatch_click(Vec2::ZERO, false, &mut state()));
    }

    #[test]
    fn hover_enter_fires_once_per_target() {
        let log = Rc::new(RefCell::new(ProbeLog::default()));
        let mut registry = EntityRegistry::new();
        registry.spawn(Box::new(Probe::new("first", &log)));
        registry.begin_tick();

        registry.dispatch_hover(Vec2::ZERO, false, &mut state());
        assert_eq!(calls(&log), vec![("first", ProbeCall::HoverEnter)]);

        // Same target again: no edges.
        registry.dispatch_hover(Vec2::ZERO, false, &mut state());
        assert_eq!(calls(&log).len(), 1);
    }

    #[test]
    fn hover_change_fires_exit_on_old_then_enter_on_new() {
        let log = Rc::new(RefCell::new(ProbeLog::default()));
        let mut registry = EntityRegistry::new();
        let mut exempt = Probe::new("exempt", &log);
        exempt.clickable_while_paused = true;
        registry.spawn(Box::new(Probe::new("ordinary", &log)));
        registry.spawn(Box::new(exempt));
        registry.begin_tick();

        registry.dispatch_hover(Vec2::ZERO, false, &mut state());
        assert_eq!(calls(&log), vec![("ordinary", ProbeCall::HoverEnter)]);

        // Pausing removes the first entity from eligibility, so the hover
        // target changes to the pause-exempt one.
        registry.dispatch_hover(Vec2::ZERO, true, &mut state());
        assert_eq!(
            calls(&log),
            vec![
                ("ordinary", ProbeCall::HoverEnter),
                ("ordinary", ProbeCall::HoverExit),
                ("exempt", ProbeCall::HoverEnter),
            ]
        );
    }

    #[test]
    fn hover_exit_fires_when_cursor_leaves_everything() {
        let log = Rc::new(RefCell::new(ProbeLog::default()));
        let mut registry = EntityRegistry::new();
        registry.spawn(Box::new(Probe::new("only", &log)));
        registry.begin_tick();

        registry.dispatch_hover(Vec2::ZERO, false, &mut state());
        assert_eq!(registry.hovered().map(|id| id.0), Some(0));

        // Nothing hit this time: paused with no exemption blocks eligibility.
        registry.dispatch_hover(Vec2::ZERO, true, &mut state());
        assert_eq!(registry.hovered(), None);
        assert_eq!(
            calls(&log),
            vec![("only", ProbeCall::HoverEnter), ("only", ProbeCall::HoverExit)]
        );
    }

    #[test]
    fn dead_hoveree_is_forgotten_without_exit_notification() {
        let log = Rc::new(RefCell::new(ProbeLog::default()));
        let mut registry = EntityRegistry::new();

        struct Mortal {
            alive: Rc<RefCell<bool>>,
            log: Rc<RefCell<ProbeLog>>,
        }
        impl Entity for Mortal {
            fn alive(&self) -> bool {
                *self.alive.borrow()
            }
            fn hit_test(&self, _point: Vec2) -> bool {
                true
            }
            fn on_hover_exit(&mut self, _state: &mut SessionState) {
                self.log.borrow_mut().calls.push(("mortal", ProbeCall::HoverExit));
            }
        }

        let alive = Rc::new(RefCell::new(true));
        registry.spawn(Box::new(Mortal {
            alive: Rc::clone(&alive),
            log: Rc::clone(&log),
        }));
        registry.begin_tick();
        registry.dispatch_hover(Vec2::ZERO, false, &mut state());
        assert!(registry.hovered().is_some());

        *alive.borrow_mut() = false;
        registry.dispatch_hover(Vec2::ZERO, false, &mut state());
        assert_eq!(registry.hovered(), None);
        assert!(calls(&log).is_empty());
    }
}
