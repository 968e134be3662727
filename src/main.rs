//! Merge Forge headless runner
//!
//! Plays a seeded session against the in-memory world and logs the event
//! stream. Contacts come from a naive proximity check standing in for a
//! physics host.
//!
//! Usage: `merge-forge [seed] [highscores.json]`

use std::collections::BTreeSet;
use std::sync::Arc;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use merge_forge::consts::SIM_DT;
use merge_forge::sim::{
    ActivationOutcome, Catalog, CyclingSupplier, DropKind, Engine, EntityId, GameEvent,
    GameOverResult, SimWorld,
};
use merge_forge::upgrades::{AttributeUpgrade, UpgradeKind};
use merge_forge::{ConfigError, GameSettings, HighScores};

const CATALOG_JSON: &str = include_str!("../data/catalog.json");

/// Body radius at scale 1.0
const BODY_RADIUS: f32 = 0.6;
/// Ticks between drops
const DROP_INTERVAL: u64 = 20;
/// Live bodies above this count put new drops in the danger zone
const PILE_LIMIT: usize = 14;
/// Hard stop for the scripted session
const MAX_TICKS: u64 = 60 * 180;

type Session = Engine<SimWorld, CyclingSupplier>;

fn main() {
    env_logger::init();
    log::info!("Merge Forge (headless) starting...");

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), ConfigError> {
    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(42u64);
    let scores_path = args.next();

    let catalog = Arc::new(Catalog::from_json(CATALOG_JSON)?);
    let high_scores = match &scores_path {
        Some(path) => HighScores::load(path)?,
        None => HighScores::new(),
    };

    let supplier = CyclingSupplier::new(drop_cycle(&catalog))
        .ok_or_else(|| ConfigError::InvalidSetting {
            field: "drop_cycle",
            reason: "catalog has nothing to drop".into(),
        })?;
    let mut engine = Engine::new(
        catalog,
        GameSettings::default(),
        SimWorld::new(),
        supplier,
        high_scores,
        seed,
    )?;

    let result = play(&mut engine, seed);
    log::info!(
        "final score {} after {} ticks ({:?})",
        engine.score(),
        engine.time_ticks(),
        result
    );

    if let GameOverResult::Ranked(rank) = result {
        engine.submit_name(rank, "bot");
    }
    for (i, entry) in engine.leaderboard().iter().enumerate() {
        log::info!("#{} {:>6} {}", i + 1, entry.score, entry.name);
    }

    if let Some(path) = scores_path {
        engine.high_scores().save(path)?;
    }
    Ok(())
}

/// Mostly basic elements with a connector every few drops
fn drop_cycle(catalog: &Catalog) -> Vec<DropKind> {
    let mut cycle = Vec::new();
    let mut elements = catalog.element_ids();
    let basic = elements.next();
    let second = elements.next();
    let connectors: Vec<_> = catalog.connector_ids().collect();

    for (i, connector) in connectors.iter().enumerate() {
        if let Some(basic) = basic {
            cycle.extend([DropKind::Element(basic); 3]);
        }
        if let Some(second) = second.filter(|_| i % 2 == 0) {
            cycle.push(DropKind::Element(second));
        }
        cycle.push(DropKind::Connector(*connector));
    }
    if cycle.is_empty() {
        cycle.extend(basic.map(DropKind::Element));
    }
    cycle
}

fn upgrade_pool() -> Vec<AttributeUpgrade> {
    vec![
        AttributeUpgrade {
            name: "Sharper Parts".into(),
            description: "+2 to every score gain".into(),
            kind: UpgradeKind::ComponentScore,
            value: 2,
        },
        AttributeUpgrade {
            name: "Steady Hands".into(),
            description: "+1 s before the drop releases".into(),
            kind: UpgradeKind::CountdownDuration,
            value: 1,
        },
        AttributeUpgrade {
            name: "Quick Rails".into(),
            description: "+1 drop movement speed".into(),
            kind: UpgradeKind::MovementSpeed,
            value: 1,
        },
        AttributeUpgrade {
            name: "Polish".into(),
            description: "+1 to every score gain".into(),
            kind: UpgradeKind::ComponentScore,
            value: 1,
        },
    ]
}

/// Every pair of bodies whose circles overlap, lower id first
fn touching_pairs(world: &SimWorld) -> BTreeSet<(EntityId, EntityId)> {
    let bodies: Vec<_> = world.bodies().collect();
    let mut pairs = BTreeSet::new();
    for (i, (a, body_a)) in bodies.iter().enumerate() {
        for (b, body_b) in &bodies[i + 1..] {
            let reach = BODY_RADIUS * (body_a.scale + body_b.scale);
            if body_a.pos.distance(body_b.pos) <= reach {
                pairs.insert((*a, *b));
            }
        }
    }
    pairs
}

fn play(engine: &mut Session, seed: u64) -> GameOverResult {
    // Separate stream from the engine's own RNG
    let mut rng = Pcg32::seed_from_u64(seed ^ 0x5eed);
    let pool = upgrade_pool();
    let mut touching = BTreeSet::new();

    while engine.time_ticks() < MAX_TICKS {
        if engine.time_ticks() % DROP_INTERVAL == 0 {
            let pos = Vec2::new(rng.random_range(-3.0..3.0), rng.random_range(0.0..2.0));
            match engine.drop_next(pos) {
                Ok(drop) if engine.world().len() > PILE_LIMIT => engine.on_danger_enter(drop),
                Ok(_) => {}
                Err(e) => log::warn!("drop failed: {}", e),
            }
        }

        let now = touching_pairs(engine.world());
        // Nothing under the drop: the floor catches it
        if let Some(drop) = engine.active_drop() {
            if !now.iter().any(|&(a, b)| a == drop || b == drop) {
                engine.on_drop_landed(drop);
            }
        }
        for &(a, b) in touching.difference(&now) {
            if engine.kind_of(a).is_some() && engine.kind_of(b).is_some() {
                let _ = engine.on_contact_end(a, b);
                let _ = engine.on_contact_end(b, a);
            }
        }
        for &(a, b) in now.difference(&touching) {
            // Physics delivers symmetric callbacks in no particular order
            let (first, second) = if rng.random_bool(0.5) { (a, b) } else { (b, a) };
            for (owner, other) in [(first, second), (second, first)] {
                if let Err(e) = engine.on_contact_begin(owner, other) {
                    log::warn!("contact {:?} -> {:?}: {}", owner, other, e);
                }
            }
        }
        touching = now;

        for host in engine.inventory().to_vec() {
            match engine.activate_equipment(host) {
                Ok(ActivationOutcome::Activated { .. }) => break,
                Ok(_) => {}
                Err(e) => log::warn!("activation of {:?}: {}", host, e),
            }
        }

        if engine.upgrade_pending() {
            let offer = engine.draw_upgrade_offer(&pool);
            if let Some(choice) = offer.first() {
                engine.apply_upgrade(choice);
            }
        }

        let report = engine.tick(SIM_DT);
        for event in engine.drain_events() {
            log_event(engine.catalog(), &event);
        }
        if let Some(result) = report.game_over {
            return result;
        }
    }

    let result = engine.game_over();
    for event in engine.drain_events() {
        log_event(engine.catalog(), &event);
    }
    result
}

fn log_event(catalog: &Catalog, event: &GameEvent) {
    match event {
        GameEvent::Merged { product, pos, .. } => {
            let name = catalog.element(*product).map_or("?", |e| e.name.as_str());
            log::info!("merged into {} at ({:.1}, {:.1})", name, pos.x, pos.y);
        }
        GameEvent::Crafted { equipment, .. } => {
            let name = catalog.equipment(*equipment).map_or("?", |e| e.name.as_str());
            log::info!("crafted {}", name);
        }
        GameEvent::ThresholdCrossed { threshold } => {
            log::info!("threshold {} reached, upgrade offered", threshold);
        }
        GameEvent::EquipmentActivated {
            effect,
            destroyed,
            spawned,
            scaled,
            ..
        } => {
            log::info!(
                "{} fired: -{} +{} ~{}",
                effect.as_str(),
                destroyed,
                spawned,
                scaled
            );
        }
        GameEvent::DropLanded { entity } => log::trace!("{:?} landed", entity),
        GameEvent::GameOver { score, result } => {
            log::info!("game over with {} ({:?})", score, result);
        }
    }
}
