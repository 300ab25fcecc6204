//! Fixed-step particle relaxation used by the cluster overview.

/// A glyph particle in viewport space.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub radius: f64,
    /// Seed clamped into the bounding region; the x/y forces pull toward it
    pub target_x: f64,
    pub target_y: f64,
}

impl Particle {
    pub fn new(x: f64, y: f64, radius: f64) -> Self {
        Self {
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            radius,
            target_x: x,
            target_y: y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceParams {
    pub width: f64,
    pub height: f64,
    /// Gap kept between a glyph and the viewport border
    pub clamp_margin: f64,
    pub collide_strength: f64,
    pub position_strength: f64,
    pub velocity_decay: f64,
    pub alpha_min: f64,
}

/// Extra distance, in pixels, added when separating an overlapping pair.
const SEPARATION_SLACK: f64 = 1e-6;

/// Deterministic LCG used only to separate coincident particles.
#[derive(Debug, Clone)]
struct Lcg(u64);

impl Lcg {
    const A: u64 = 1_664_525;
    const C: u64 = 1_013_904_223;
    const M: u64 = 1 << 32;

    fn next(&mut self) -> f64 {
        self.0 = (Self::A * self.0 + Self::C) % Self::M;
        self.0 as f64 / Self::M as f64
    }

    fn jiggle(&mut self) -> f64 {
        (self.next() - 0.5) * 1e-6
    }
}

/// One relaxation batch. `run` consumes the simulation, so a finished
/// batch cannot be stepped again.
#[derive(Debug, Clone)]
pub struct Simulation {
    particles: Vec<Particle>,
    params: ForceParams,
    alpha: f64,
    alpha_decay: f64,
    rng: Lcg,
}

impl Simulation {
    pub fn new(mut particles: Vec<Particle>, params: ForceParams) -> Self {
        for p in &mut particles {
            let lo = p.radius + params.clamp_margin;
            p.target_x = clamp_soft(p.x, lo, params.width - lo);
            p.target_y = clamp_soft(p.y, lo, params.height - lo);
        }
        Self {
            particles,
            params,
            alpha: 1.0,
            alpha_decay: 1.0 - params.alpha_min.powf(1.0 / 300.0),
            rng: Lcg(1),
        }
    }

    /// Run exactly `steps` ticks, then resolve any residual overlap.
    pub fn run(mut self, steps: usize, separation_sweeps: usize) -> Vec<Particle> {
        for _ in 0..steps {
            self.tick();
        }
        tracing::trace!(
            particles = self.particles.len(),
            alpha = self.alpha,
            "relaxation finished"
        );
        self.separate(separation_sweeps);
        self.particles
    }

    fn tick(&mut self) {
        self.alpha += (0.0 - self.alpha) * self.alpha_decay;
        self.collide();
        self.center();
        self.pull_to_targets();

        let keep = 1.0 - self.params.velocity_decay;
        for p in &mut self.particles {
            p.vx *= keep;
            p.x += p.vx;
            p.vy *= keep;
            p.y += p.vy;
        }
    }

    /// Soft pairwise collision on predicted positions.
    fn collide(&mut self) {
        let strength = self.params.collide_strength;
        let n = self.particles.len();
        for i in 0..n {
            let (ri, xi, yi) = {
                let a = &self.particles[i];
                (a.radius, a.x + a.vx, a.y + a.vy)
            };
            let ri2 = ri * ri;
            for j in (i + 1)..n {
                let b = &self.particles[j];
                let rj = b.radius;
                let r = ri + rj;
                let mut x = xi - b.x - b.vx;
                let mut y = yi - b.y - b.vy;
                let mut l = x * x + y * y;
                if l >= r * r {
                    continue;
                }
                if x == 0.0 {
                    x = self.rng.jiggle();
                    l += x * x;
                }
                if y == 0.0 {
                    y = self.rng.jiggle();
                    l += y * y;
                }
                let dist = l.sqrt();
                let push = (r - dist) / dist * strength;
                x *= push;
                y *= push;
                let rj2 = rj * rj;
                let share = rj2 / (ri2 + rj2);

                let a = &mut self.particles[i];
                a.vx += x * share;
                a.vy += y * share;
                let b = &mut self.particles[j];
                b.vx -= x * (1.0 - share);
                b.vy -= y * (1.0 - share);
            }
        }
    }

    /// Translate every particle so the mean sits at the viewport centre.
    fn center(&mut self) {
        let n = self.particles.len();
        if n == 0 {
            return;
        }
        let (sx, sy) = self
            .particles
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        let dx = sx / n as f64 - self.params.width / 2.0;
        let dy = sy / n as f64 - self.params.height / 2.0;
        for p in &mut self.particles {
            p.x -= dx;
            p.y -= dy;
        }
    }

    fn pull_to_targets(&mut self) {
        let k = self.params.position_strength * self.alpha;
        for p in &mut self.particles {
            p.vx += (p.target_x - p.x) * k;
        }
        for p in &mut self.particles {
            p.vy += (p.target_y - p.y) * k;
        }
    }

    /// Hard pairwise projection until no pair overlaps or the sweep budget
    /// runs out. Each resolved pair is pushed `SEPARATION_SLACK` past
    /// touching so rounding cannot leave it overlapping.
    fn separate(&mut self, sweeps: usize) {
        let n = self.particles.len();
        for sweep in 0..sweeps {
            let mut moved = false;
            for i in 0..n {
                for j in (i + 1)..n {
                    let (a, b) = (&self.particles[i], &self.particles[j]);
                    let r = a.radius + b.radius;
                    let mut x = a.x - b.x;
                    let mut y = a.y - b.y;
                    let mut dist = x.hypot(y);
                    if dist >= r {
                        continue;
                    }
                    if dist == 0.0 {
                        x = 1.0;
                        y = 0.0;
                        dist = 1.0;
                    }
                    let push = (r + SEPARATION_SLACK - dist) / dist;
                    let (ri2, rj2) = (a.radius * a.radius, b.radius * b.radius);
                    let share = rj2 / (ri2 + rj2);

                    let a = &mut self.particles[i];
                    a.x += x * push * share;
                    a.y += y * push * share;
                    let b = &mut self.particles[j];
                    b.x -= x * push * (1.0 - share);
                    b.y -= y * push * (1.0 - share);
                    moved = true;
                }
            }
            if !moved {
                tracing::trace!(sweep, "separation settled");
                return;
            }
        }
        if sweeps > 0 {
            tracing::warn!(sweeps, particles = n, "separation budget exhausted");
        }
    }
}

/// Clamp that tolerates an inverted range (viewport narrower than the glyph).
fn clamp_soft(v: f64, lo: f64, hi: f64) -> f64 {
    lo.max(hi.min(v))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ForceParams {
        ForceParams {
            width: 800.0,
            height: 600.0,
            clamp_margin: 20.0,
            collide_strength: 0.7,
            position_strength: 0.1,
            velocity_decay: 0.4,
            alpha_min: 0.001,
        }
    }

    fn gap(p: &[Particle]) -> f64 {
        (p[0].x - p[1].x).hypot(p[0].y - p[1].y)
    }

    #[test]
    fn test_targets_are_clamped() {
        let sim = Simulation::new(vec![Particle::new(5.0, 900.0, 30.0)], params());
        let p = &sim.particles[0];
        assert_eq!(p.target_x, 50.0);
        assert_eq!(p.target_y, 550.0);
    }

    #[test]
    fn test_soft_collision_leaves_residue_without_separation() {
        let seeds = vec![
            Particle::new(375.0, 300.0, 30.0),
            Particle::new(425.0, 300.0, 30.0),
        ];
        let out = Simulation::new(seeds, params()).run(100, 0);
        let d = gap(&out);
        assert!(d > 55.0 && d < 60.0, "distance {d}");
    }

    #[test]
    fn test_separation_removes_overlap() {
        let seeds = vec![
            Particle::new(375.0, 300.0, 30.0),
            Particle::new(425.0, 300.0, 30.0),
        ];
        let out = Simulation::new(seeds, params()).run(100, 32);
        assert!(gap(&out) + 1e-6 >= 60.0);
    }

    #[test]
    fn test_coincident_particles_split() {
        let seeds = vec![
            Particle::new(400.0, 300.0, 25.0),
            Particle::new(400.0, 300.0, 25.0),
        ];
        let out = Simulation::new(seeds, params()).run(100, 32);
        assert!(gap(&out) + 1e-6 >= 50.0);
    }

    #[test]
    fn test_single_particle_stays_near_centre() {
        // centering runs before integration, so the last pull toward the
        // seed leaves a small offset in its direction
        let out = Simulation::new(vec![Particle::new(100.0, 100.0, 25.0)], params()).run(100, 32);
        assert!(out[0].x < 400.0 && out[0].x > 390.0, "x {}", out[0].x);
        assert!(out[0].y < 300.0 && out[0].y > 290.0, "y {}", out[0].y);
    }

    #[test]
    fn test_dense_pack_is_fully_separated() {
        let seeds: Vec<Particle> = (0..30)
            .map(|i| {
                let t = i as f64;
                Particle::new(400.0 + (t * 0.7).sin() * 3.0, 300.0 + (t * 1.3).cos() * 3.0, 30.0)
            })
            .collect();
        let out = Simulation::new(seeds, params()).run(100, 1000);
        for (i, a) in out.iter().enumerate() {
            for b in &out[i + 1..] {
                let d = (a.x - b.x).hypot(a.y - b.y);
                assert!(d + 1e-6 >= a.radius + b.radius, "distance {d}");
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let seeds = vec![
            Particle::new(400.0, 300.0, 25.0),
            Particle::new(400.0, 300.0, 40.0),
            Particle::new(410.0, 290.0, 30.0),
        ];
        let a = Simulation::new(seeds.clone(), params()).run(100, 32);
        let b = Simulation::new(seeds, params()).run(100, 32);
        assert_eq!(a, b);
    }
}
