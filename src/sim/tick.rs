//! Fixed timestep simulation tick
//!
//! Advances a flight session deterministically. Tug and aerodynamic forces
//! are both accumulated before integration so input never lags a frame, and
//! tension is measured on the integrated position before the constraint
//! pulls the kite back in.

use super::collision::{Sphere, kite_hits_sphere, string_intersects_any};
use super::kite::aerodynamic_force;
use super::state::{FlightEvent, FlightPhase, FlightSession};
use super::string::tension_damage;
use super::tug::TugCommand;
use super::wind::GustTransition;
use crate::consts::*;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Latest tug intent, if the input device changed since the last tick
    pub tug: Option<TugCommand>,
    /// Pause toggle
    pub pause: bool,
    /// Start over with the session's seed
    pub restart: bool,
    /// Values of sparks the scenery reports as collected
    pub pickups: Vec<u32>,
    /// Obstacle bounds near the kite this tick
    pub obstacles: Vec<Sphere>,
}

/// Advance the session by one fixed timestep
pub fn tick(session: &mut FlightSession, input: &TickInput, dt: f32) {
    session.events.clear();

    if input.restart {
        let seed = session.seed;
        session.reset(seed);
        return;
    }

    // The input slot is written even while paused or over
    if let Some(command) = input.tug {
        session.tug.apply(command, &session.tuning.controls);
    }

    // Handle pause toggle
    if input.pause {
        match session.phase {
            FlightPhase::Flying => {
                session.phase = FlightPhase::Paused;
                return;
            }
            FlightPhase::Paused => session.phase = FlightPhase::Flying,
            FlightPhase::GameOver => {}
        }
    }

    // Don't tick if paused or game over
    if session.phase != FlightPhase::Flying {
        return;
    }
    if !(dt > 0.0 && dt.is_finite()) {
        return;
    }

    session.time_ticks += 1;
    session.elapsed += dt;
    let difficulty = session.difficulty();
    update_theme(session);

    // 1. Wind
    let transition = session
        .wind
        .step(dt, difficulty, &session.tuning.wind, &mut session.rng);
    match transition {
        Some(GustTransition::Started { strength, duration }) => session
            .events
            .push(FlightEvent::GustStarted { strength, duration }),
        Some(GustTransition::Ended) => session.events.push(FlightEvent::GustEnded),
        None => {}
    }

    // 2. Released input bleeds off
    if !session.tug.is_driven() {
        let controls = &session.tuning.controls;
        session
            .tug
            .decay_toward_zero(controls.decay_rate, controls.decay_epsilon);
    }

    // 3. Tug
    session.string.tug_force = session.tug.vector();
    session.string.apply_tug_force(&mut session.kite);

    // 4. Aerodynamics (skipped entirely when the wind can't push the face)
    let kite_tuning = &session.tuning.kite;
    if let Some(aero) = aerodynamic_force(
        session.kite.orientation,
        session.wind.current_wind(),
        kite_tuning.lift_coefficient,
        kite_tuning.drag_coefficient,
    ) {
        session.kite.apply_force(aero.total());
    }

    // 5. Integrate
    session.kite.integrate(GRAVITY, dt);

    // 6. Length and tension from the integrated position, then constrain
    session.string.enforce_length();
    let tension = session
        .string
        .compute_tension(session.kite.position, session.tuning.string.stiffness);
    session
        .string
        .constrain(&mut session.kite, &session.constraint);

    // 7. Overstretch damage
    let string_tuning = &session.tuning.string;
    if let Some(amount) = tension_damage(
        tension,
        string_tuning.tension_threshold,
        string_tuning.damage_scale,
    ) {
        session.damage(amount);
    }

    // 8. String shape for collision and rendering
    let string_tuning = &session.tuning.string;
    let (segments, max_sag, taut) = (
        string_tuning.segments,
        string_tuning.max_sag,
        string_tuning.taut_tension,
    );
    session
        .string
        .sample_curve(session.kite.position, segments, max_sag, taut);

    for &value in &input.pickups {
        session.collect_pickup(value);
    }

    if check_obstacles(session, &input.obstacles) {
        session.events.push(FlightEvent::ObstacleHit);
        let amount = session.tuning.health.obstacle_damage;
        session.damage(amount);
    }
}

/// Emit a theme change when flight time crosses a threshold
fn update_theme(session: &mut FlightSession) {
    let theme = session.scheduled_theme();
    if theme != session.theme {
        log::info!("Theme changed: {}", theme.as_str());
        session.theme = theme;
        session.events.push(FlightEvent::ThemeChanged(theme));
    }
}

/// Whether the kite or any part of the string touches an obstacle
fn check_obstacles(session: &FlightSession, obstacles: &[Sphere]) -> bool {
    if obstacles.is_empty() || session.is_game_over() {
        return false;
    }
    let size = session.tuning.kite.size;
    obstacles
        .iter()
        .any(|sphere| kite_hits_sphere(session.kite.position, size, sphere))
        || string_intersects_any(session.string.samples(), obstacles)
}
