use std::collections::HashMap;
use std::f32::consts::TAU;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::clock::FrameClock;
use crate::config::{DotsOptions, SimulationConfig};
use crate::dot::{Bounds, Dot, DotId, DotSpec, FillColor};
use crate::error::DotsError;
use crate::math::Vector;
use crate::sector_index::SectorIndex;
use crate::snapshot::DotSnapshot;

const FALLBACK_SEED: u64 = 0x5eed_d075;
const VECTOR_TOLERANCE: f32 = 1.0e-3;

/// Owns every dot and the sector index, and advances them one frame at a time.
pub struct Simulation {
    bounds: Bounds,
    config: SimulationConfig,
    options: DotsOptions,
    index: SectorIndex,
    dots: Vec<Dot>,
    slots: HashMap<DotId, usize>,
    next_id: u32,
    running: bool,
    clock: FrameClock,
    rng: SmallRng,
    step_index: u64,
}

impl Simulation {
    pub fn new(width: f32, height: f32, config: SimulationConfig) -> Result<Self, DotsError> {
        config.validate()?;
        config.validate_area(width, height)?;
        let index = SectorIndex::new(width, height, config.sector_size)?;
        let rng = seeded_rng(config.seed);

        Ok(Self {
            bounds: Bounds::new(width, height),
            config,
            options: DotsOptions::default(),
            index,
            dots: Vec::new(),
            slots: HashMap::new(),
            next_id: 0,
            running: false,
            clock: FrameClock::new(),
            rng,
            step_index: 0,
        })
    }

    /// Replaces all dots with `count` random ones and starts running.
    pub fn configure(&mut self, count: usize, options: DotsOptions) -> Result<(), DotsError> {
        if count == 0 {
            return Err(DotsError::InvalidDotCount);
        }
        self.index
            .build(self.bounds.width, self.bounds.height, self.config.sector_size)?;

        self.rng = seeded_rng(self.config.seed);
        self.dots.clear();
        self.slots.clear();
        self.next_id = 0;
        self.options = options;

        for _ in 0..count {
            let spec = self.random_spec();
            let id = self.insert_dot(spec, true);
            debug!(%id, "generated dot");
        }

        self.step_index = 0;
        self.running = true;
        self.clock.reset();
        info!(count, ?options, "starting the engine");
        Ok(())
    }

    /// Adds a dot exactly as described, without clamping it into bounds.
    pub fn spawn(&mut self, spec: DotSpec) -> Result<DotId, DotsError> {
        if !(spec.x.is_finite() && spec.y.is_finite() && spec.direction.is_finite()) {
            return Err(DotsError::InvalidDot("position and direction must be finite"));
        }
        if !spec.radius.is_finite() || spec.radius <= 0.0 {
            return Err(DotsError::InvalidDot("radius must be positive"));
        }
        if !spec.speed.is_finite() || spec.speed < 0.0 {
            return Err(DotsError::InvalidDot("speed must be non-negative"));
        }
        check_fits(self.bounds, spec.radius)?;

        let id = self.insert_dot(spec, false);
        debug!(%id, x = spec.x, y = spec.y, "spawned dot");
        Ok(id)
    }

    pub fn remove(&mut self, id: DotId) -> Result<Dot, DotsError> {
        let slot = *self.slots.get(&id).ok_or(DotsError::UnknownDot(id))?;
        let mut dot = self.dots.remove(slot);
        self.index.unregister(&mut dot);
        self.reindex_slots();
        debug!(%id, "removed dot");
        Ok(dot)
    }

    /// Moves every dot by `delta` time units. A no-op while stopped.
    pub fn advance(&mut self, delta: f32) -> Vec<DotSnapshot> {
        if self.running {
            self.step(sanitize_delta(delta));
        }
        self.snapshots()
    }

    /// Advances by the time elapsed since the previous frame.
    pub fn frame(&mut self, now_seconds: f64) -> Vec<DotSnapshot> {
        if !self.running {
            return self.snapshots();
        }
        let delta = self.clock.tick(now_seconds);
        self.advance(delta)
    }

    pub fn stop(&mut self) {
        self.running = false;
        info!("the engine has been stopped");
    }

    pub fn resume(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.clock.reset();
        info!("the engine has been allowed to proceed");
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_show_vectors(&mut self, show: bool) {
        self.options.show_vector = show;
        for dot in &mut self.dots {
            dot.show_vector = show;
        }
    }

    pub fn set_show_info(&mut self, show: bool) {
        self.options.show_info = show;
        for dot in &mut self.dots {
            dot.show_info = show;
        }
    }

    pub fn set_avoidance(&mut self, avoid: bool) {
        self.options.avoid_each_other = avoid;
        for dot in &mut self.dots {
            dot.avoid_each_other = avoid;
        }
    }

    pub fn set_clear_canvas(&mut self, clear: bool) {
        self.options.clear_canvas = clear;
    }

    /// Resizes the area, pulling every dot back inside it.
    pub fn set_bounds(&mut self, width: f32, height: f32) -> Result<(), DotsError> {
        self.config.validate_area(width, height)?;
        let largest = self.dots.iter().map(Dot::radius).fold(0.0, f32::max);
        check_fits(Bounds::new(width, height), largest)?;
        self.index.build(width, height, self.config.sector_size)?;
        self.bounds = Bounds::new(width, height);

        for dot in &mut self.dots {
            dot.clamp_to(self.bounds);
            self.index.register(dot);
        }
        debug!(width, height, "bounds changed");
        Ok(())
    }

    pub fn snapshots(&self) -> Vec<DotSnapshot> {
        self.dots.iter().map(DotSnapshot::from).collect()
    }

    pub fn dots(&self) -> &[Dot] {
        &self.dots
    }

    pub fn dot(&self, id: DotId) -> Option<&Dot> {
        self.slots.get(&id).map(|&slot| &self.dots[slot])
    }

    pub fn count(&self) -> usize {
        self.dots.len()
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn options(&self) -> DotsOptions {
        self.options
    }

    pub fn index(&self) -> &SectorIndex {
        &self.index
    }

    pub fn step_index(&self) -> u64 {
        self.step_index
    }

    fn step(&mut self, delta: f32) {
        self.step_index = self.step_index.wrapping_add(1);

        // Headings turned during this pass only take effect next frame.
        let displacements: Vec<Vector> = self
            .dots
            .iter()
            .map(|dot| dot.vector() * delta)
            .collect();
        for (i, displacement) in displacements.into_iter().enumerate() {
            self.move_dot(i, displacement);
        }

        self.debug_validate_state();
    }

    fn move_dot(&mut self, i: usize, displacement: Vector) {
        self.dots[i].offset(displacement);

        if self.dots[i].avoid_each_other {
            self.avoid_neighbors(i, displacement);
        }

        let bounds = self.bounds;
        let dot = &mut self.dots[i];
        if let Some(overshoot) = dot.out_of_bounds(bounds) {
            dot.reflect(overshoot);
            dot.offset(displacement * -2.0);
            dot.clamp_to(bounds);
        }

        self.index.register(dot);
    }

    fn avoid_neighbors(&mut self, i: usize, displacement: Vector) {
        let neighbors = self.index.neighbors_near(&self.dots[i]);
        for id in neighbors {
            let Some(&j) = self.slots.get(&id) else {
                continue;
            };
            let (dot, other) = pair_mut(&mut self.dots, i, j);
            if dot.distance_to(other) > dot.safe_range() {
                continue;
            }

            let angle = dot.avoidance_angle(other);
            dot.offset(-displacement);
            dot.rotate(angle);
            other.rotate(angle);
            dot.offset(displacement);

            // Already moved this pass, so its lookahead sectors follow the old heading.
            if j < i {
                self.index.register(other);
            }
        }
    }

    fn random_spec(&mut self) -> DotSpec {
        let spawn = self.config.spawn;
        let rng = &mut self.rng;
        DotSpec {
            x: (rng.random::<f32>() * self.bounds.width).floor(),
            y: (rng.random::<f32>() * self.bounds.height).floor(),
            radius: rng.random_range(spawn.radius_min..=spawn.radius_max) as f32,
            direction: rng.random_range(0.0..TAU),
            speed: rng.random_range(spawn.speed_min..=spawn.speed_max) as f32,
            fill: FillColor {
                r: rng.random_range(spawn.channel_min..=spawn.channel_max),
                g: rng.random_range(spawn.channel_min..=spawn.channel_max),
                b: rng.random_range(spawn.channel_min..=spawn.channel_max),
                a: spawn.alpha,
            },
        }
    }

    fn insert_dot(&mut self, spec: DotSpec, clamp: bool) -> DotId {
        self.next_id += 1;
        let id = DotId(self.next_id);

        let mut dot = Dot::new(id, spec);
        if clamp {
            dot.clamp_to(self.bounds);
        }
        dot.show_vector = self.options.show_vector;
        dot.show_info = self.options.show_info;
        dot.avoid_each_other = self.options.avoid_each_other;
        self.index.register(&mut dot);

        self.slots.insert(id, self.dots.len());
        self.dots.push(dot);
        id
    }

    fn reindex_slots(&mut self) {
        self.slots.clear();
        for (slot, dot) in self.dots.iter().enumerate() {
            self.slots.insert(dot.id, slot);
        }
    }

    fn debug_validate_state(&self) {
        if !cfg!(debug_assertions) {
            return;
        }

        for dot in &self.dots {
            debug_assert!(
                dot.x.is_finite() && dot.y.is_finite(),
                "dot {} has a non-finite position",
                dot.id
            );
            debug_assert!(
                dot.out_of_bounds(self.bounds).is_none(),
                "dot {} left the area at ({}, {})",
                dot.id,
                dot.x,
                dot.y
            );

            let expected = Vector::from_heading(dot.direction(), dot.speed());
            let vector = dot.vector();
            debug_assert!(
                (expected.x_off - vector.x_off).abs() <= VECTOR_TOLERANCE
                    && (expected.y_off - vector.y_off).abs() <= VECTOR_TOLERANCE,
                "dot {} has a stale vector",
                dot.id
            );
            debug_assert!(
                dot.sectors().contains(&self.index.cell_of(dot.x, dot.y)),
                "dot {} is missing its own sector",
                dot.id
            );
        }
    }
}

fn pair_mut<T>(items: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    assert_ne!(a, b, "cannot borrow the same dot twice");
    if a < b {
        let (head, tail) = items.split_at_mut(b);
        (&mut head[a], &mut tail[0])
    } else {
        let (head, tail) = items.split_at_mut(a);
        (&mut tail[0], &mut head[b])
    }
}

fn check_fits(bounds: Bounds, radius: f32) -> Result<(), DotsError> {
    if bounds.width < 2.0 * radius || bounds.height < 2.0 * radius {
        return Err(DotsError::AreaTooSmall {
            width: bounds.width,
            height: bounds.height,
            max_radius: radius,
        });
    }
    Ok(())
}

fn sanitize_delta(delta: f32) -> f32 {
    if delta.is_finite() && delta >= 0.0 {
        return delta;
    }
    warn!(delta, "ignoring invalid frame delta");
    0.0
}

fn seeded_rng(seed: Option<u64>) -> SmallRng {
    let seed = seed.unwrap_or_else(|| {
        getrandom::u64().unwrap_or_else(|err| {
            warn!(%err, "entropy unavailable, using fixed seed");
            FALLBACK_SEED
        })
    });
    SmallRng::seed_from_u64(seed)
}
