//! End-to-end scenarios against the bundled catalog and the in-memory world.

use std::sync::Arc;

use glam::Vec2;
use merge_forge::sim::{
    ActivationOutcome, Catalog, ContactEvent, ContactOutcome, CyclingSupplier, DropKind,
    EffectReport, EffectTag, Engine, EntityId, EntityKind, GameEvent, GameOverResult,
    SessionPhase, SimWorld,
};
use merge_forge::upgrades::{AttributeUpgrade, UpgradeKind};
use merge_forge::{EngineError, GameSettings, HighScores};

const CATALOG_JSON: &str = include_str!("../data/catalog.json");

type TestEngine = Engine<SimWorld, CyclingSupplier>;

// ===========================================================================
// Helpers
// ===========================================================================

fn engine_with(catalog: Catalog) -> TestEngine {
    let scrap = catalog.element_id("scrap").unwrap();
    Engine::new(
        Arc::new(catalog),
        GameSettings::default(),
        SimWorld::new(),
        CyclingSupplier::new(vec![DropKind::Element(scrap)]).unwrap(),
        HighScores::new(),
        1234,
    )
    .unwrap()
}

fn engine() -> TestEngine {
    engine_with(Catalog::from_json(CATALOG_JSON).unwrap())
}

fn element(engine: &mut TestEngine, name: &str, x: f32, y: f32) -> EntityId {
    let kind = engine.catalog().element_id(name).unwrap();
    engine
        .spawn_tracked(EntityKind::Element(kind), Vec2::new(x, y), Vec2::ZERO)
        .unwrap()
}

fn connector(engine: &mut TestEngine, name: &str, x: f32, y: f32) -> EntityId {
    let kind = engine.catalog().connector_id(name).unwrap();
    engine
        .spawn_tracked(EntityKind::Connector(kind), Vec2::new(x, y), Vec2::ZERO)
        .unwrap()
}

fn equipment(engine: &mut TestEngine, name: &str, x: f32, y: f32) -> EntityId {
    let kind = engine.catalog().equipment_id(name).unwrap();
    engine
        .spawn_tracked(EntityKind::Equipment(kind), Vec2::new(x, y), Vec2::ZERO)
        .unwrap()
}

/// Deliver both sides of a touch, `a` first
fn touch(engine: &mut TestEngine, a: EntityId, b: EntityId) -> (ContactOutcome, ContactOutcome) {
    let first = engine.on_contact_begin(a, b).unwrap();
    let second = engine.on_contact_begin(b, a).unwrap();
    (first, second)
}

/// Earn 12 points per merge by pairing gears far away from the action
fn earn(engine: &mut TestEngine, merges: usize) {
    for i in 0..merges {
        let x = 1000.0 + i as f32 * 10.0;
        let a = element(engine, "gear", x, 0.0);
        let b = element(engine, "gear", x + 1.0, 0.0);
        touch(engine, a, b);
    }
    engine.tick(0.0);
}

fn count(engine: &TestEngine, name: &str) -> usize {
    let kind = engine.catalog().element_id(name).unwrap();
    engine.world().count_kind(EntityKind::Element(kind))
}

// ===========================================================================
// Merges
// ===========================================================================

#[test]
fn test_merge_outcome_independent_of_event_order() {
    let mut forward = engine();
    let a = element(&mut forward, "scrap", 0.0, 0.0);
    let b = element(&mut forward, "scrap", 1.0, 0.0);
    let (fa, fb) = touch(&mut forward, a, b);

    let mut backward = engine();
    let a2 = element(&mut backward, "scrap", 0.0, 0.0);
    let b2 = element(&mut backward, "scrap", 1.0, 0.0);
    let (ba, bb) = touch(&mut backward, b2, a2);

    assert_eq!(fa, ContactOutcome::Tracked);
    assert!(matches!(fb, ContactOutcome::Merged { .. }));
    assert!(matches!(ba, ContactOutcome::Merged { .. }));
    assert_eq!(bb, ContactOutcome::Ignored);

    for engine in [&mut forward, &mut backward] {
        engine.tick(0.0);
        assert_eq!(count(engine, "scrap"), 0);
        assert_eq!(count(engine, "plate"), 1);
        assert_eq!(engine.score(), 2);
    }
}

#[test]
fn test_merge_event_carries_product_and_midpoint() {
    let mut engine = engine();
    let a = element(&mut engine, "plate", 2.0, 4.0);
    let b = element(&mut engine, "plate", 4.0, 8.0);
    touch(&mut engine, a, b);

    let plate = engine.catalog().element_id("plate").unwrap();
    let gear = engine.catalog().element_id("gear").unwrap();
    let events = engine.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        GameEvent::Merged { source, product, pos, .. }
            if *source == plate && *product == gear && *pos == Vec2::new(3.0, 6.0)
    )));
}

#[test]
fn test_terminal_tier_pair_stays() {
    let mut engine = engine();
    let a = element(&mut engine, "core", 0.0, 0.0);
    let b = element(&mut engine, "core", 1.0, 0.0);
    let (x, y) = touch(&mut engine, a, b);
    assert_eq!((x, y), (ContactOutcome::Tracked, ContactOutcome::Tracked));

    engine.tick(0.0);
    assert_eq!(count(&engine, "core"), 2);
    assert_eq!(engine.score(), 0);
    assert!(engine.contacts().get(a).unwrap().contains(b));
}

#[test]
fn test_different_kinds_do_not_merge() {
    let mut engine = engine();
    let a = element(&mut engine, "scrap", 0.0, 0.0);
    let b = element(&mut engine, "plate", 1.0, 0.0);
    touch(&mut engine, a, b);
    engine.tick(0.0);
    assert_eq!(engine.world().len(), 2);
}

#[test]
fn test_merge_product_can_merge_again() {
    let mut engine = engine();
    let a = element(&mut engine, "scrap", 0.0, 0.0);
    let b = element(&mut engine, "scrap", 1.0, 0.0);
    let c = element(&mut engine, "plate", 0.5, 1.0);
    let (_, outcome) = touch(&mut engine, a, b);
    let ContactOutcome::Merged { entity, .. } = outcome else {
        panic!("expected merge, got {:?}", outcome);
    };
    engine.tick(0.0);

    touch(&mut engine, entity, c);
    engine.tick(0.0);
    assert_eq!(count(&engine, "gear"), 1);
    assert_eq!(engine.world().len(), 1);
    assert_eq!(engine.score(), 2 + 5);
}

// ===========================================================================
// Recipes
// ===========================================================================

#[test]
fn test_partial_recipe_consumes_nothing() {
    let mut engine = engine();
    let weld = connector(&mut engine, "weld", 0.0, 0.0);
    let s1 = element(&mut engine, "scrap", 3.0, 0.0);
    let s2 = element(&mut engine, "scrap", 0.0, 3.0);
    assert_eq!(touch(&mut engine, s1, weld).1, ContactOutcome::Tracked);
    assert_eq!(touch(&mut engine, s2, weld).1, ContactOutcome::Tracked);

    engine.tick(0.0);
    assert_eq!(engine.world().len(), 3);
    assert!(engine.inventory().is_empty());
    assert_eq!(engine.contacts().snapshot(weld).unwrap(), vec![s1, s2]);
}

#[test]
fn test_craft_consumes_only_contributors() {
    let mut engine = engine();
    let weld = connector(&mut engine, "weld", 0.0, 0.0);
    let s1 = element(&mut engine, "scrap", 3.0, 0.0);
    let s2 = element(&mut engine, "scrap", 0.0, 3.0);
    let extra = element(&mut engine, "gear", 0.0, -3.0);
    let s3 = element(&mut engine, "scrap", -3.0, 0.0);

    touch(&mut engine, s1, weld);
    touch(&mut engine, s2, weld);
    touch(&mut engine, extra, weld);
    let (_, outcome) = touch(&mut engine, s3, weld);

    let overclock = engine.catalog().equipment_id("overclock").unwrap();
    match outcome {
        ContactOutcome::Crafted {
            entity,
            equipment,
            pos,
            consumed,
        } => {
            assert_eq!(equipment, overclock);
            assert_eq!(pos, Vec2::new(0.0, 0.75));
            assert_eq!(consumed, vec![s1, s2, s3]);
            assert_eq!(engine.inventory(), &[entity]);
        }
        other => panic!("expected craft, got {:?}", other),
    }
    assert_eq!(engine.score(), 8);

    let report = engine.tick(0.0);
    assert_eq!(report.destroyed, vec![weld, s1, s2, s3]);
    assert!(engine.is_live(extra));
    assert_eq!(count(&engine, "gear"), 1);
}

#[test]
fn test_first_listed_recipe_wins() {
    let json = r#"{
        "elements": [
            { "name": "scrap", "tier": 1 },
            { "name": "plate", "tier": 2 }
        ],
        "equipment": [
            { "name": "big", "effect": "Promote" },
            { "name": "small", "effect": "ShrinkAll" }
        ],
        "connectors": [
            { "name": "forge", "recipes": [
                { "name": "both", "requires": ["plate", "scrap"], "produces": "big", "score": 30 },
                { "name": "single", "requires": ["scrap"], "produces": "small", "score": 5 }
            ]}
        ]
    }"#;
    let mut engine = engine_with(Catalog::from_json(json).unwrap());
    let forge = connector(&mut engine, "forge", 0.0, 0.0);
    let plate = element(&mut engine, "plate", 1.0, 0.0);
    let scrap = element(&mut engine, "scrap", -1.0, 0.0);

    touch(&mut engine, plate, forge);
    let (_, outcome) = touch(&mut engine, scrap, forge);

    let big = engine.catalog().equipment_id("big").unwrap();
    assert!(matches!(
        outcome,
        ContactOutcome::Crafted { equipment, .. } if equipment == big
    ));
    assert_eq!(engine.score(), 30);
    let crafted: Vec<_> = engine
        .drain_events()
        .into_iter()
        .filter_map(|e| match e {
            GameEvent::Crafted { recipe_index, .. } => Some(recipe_index),
            _ => None,
        })
        .collect();
    assert_eq!(crafted, vec![0]);
}

#[test]
fn test_craft_ignores_dead_contacts() {
    let mut engine = engine();
    let rivet = connector(&mut engine, "rivet", 0.0, 0.0);
    let scrap = element(&mut engine, "scrap", 1.0, 0.0);
    touch(&mut engine, scrap, rivet);
    engine.destroy(scrap).unwrap();

    let plate = element(&mut engine, "plate", -1.0, 0.0);
    let (_, outcome) = touch(&mut engine, plate, rivet);
    assert_eq!(outcome, ContactOutcome::Tracked);
    assert!(engine.inventory().is_empty());
}

fn crafted_count(engine: &mut TestEngine) -> usize {
    engine
        .drain_events()
        .iter()
        .filter(|e| matches!(e, GameEvent::Crafted { .. }))
        .count()
}

#[test]
fn test_shared_element_feeds_one_craft_per_tick() {
    let mut engine = engine();
    let r1 = connector(&mut engine, "rivet", -1.0, 0.0);
    let r2 = connector(&mut engine, "rivet", 1.0, 0.0);
    let scrap = element(&mut engine, "scrap", 0.0, 0.0);
    assert_eq!(touch(&mut engine, scrap, r1).1, ContactOutcome::Tracked);
    assert_eq!(touch(&mut engine, scrap, r2).1, ContactOutcome::Tracked);

    let p1 = element(&mut engine, "plate", -2.0, 0.0);
    let (_, first) = touch(&mut engine, p1, r1);
    assert!(matches!(first, ContactOutcome::Crafted { ref consumed, .. } if consumed == &vec![scrap, p1]));

    // Same tick: the scrap is already spoken for
    let p2 = element(&mut engine, "plate", 2.0, 0.0);
    let (_, second) = touch(&mut engine, p2, r2);
    assert_eq!(second, ContactOutcome::Tracked);
    assert_eq!(engine.inventory().len(), 1);
    assert_eq!(crafted_count(&mut engine), 1);
    assert_eq!(engine.contacts().snapshot(r2).unwrap(), vec![p2]);

    let report = engine.tick(0.0);
    assert_eq!(report.destroyed, vec![r1, scrap, p1]);
    assert!(engine.is_live(r2));
    assert!(engine.is_live(p2));
}

#[test]
fn test_merged_element_leaves_connector_contacts() {
    let mut engine = engine();
    let weld = connector(&mut engine, "weld", 0.0, 0.0);
    let s1 = element(&mut engine, "scrap", 1.0, 0.0);
    let s2 = element(&mut engine, "scrap", -1.0, 0.0);
    let s3 = element(&mut engine, "scrap", 2.0, 0.0);
    touch(&mut engine, s1, weld);
    touch(&mut engine, s2, weld);

    let (_, merged) = touch(&mut engine, s1, s3);
    assert!(matches!(merged, ContactOutcome::Merged { .. }));

    // Two live scraps on the weld, not the three the bundle needs
    let s4 = element(&mut engine, "scrap", 0.0, 1.0);
    let (_, outcome) = touch(&mut engine, s4, weld);
    assert_eq!(outcome, ContactOutcome::Tracked);
    assert!(engine.inventory().is_empty());
    assert_eq!(crafted_count(&mut engine), 0);
    assert_eq!(engine.contacts().snapshot(weld).unwrap(), vec![s2, s4]);

    engine.tick(0.0);
    assert!(engine.is_live(weld));
    assert_eq!(count(&engine, "scrap"), 2);
    assert_eq!(count(&engine, "plate"), 1);
}

#[test]
fn test_contact_end_forgets_partner() {
    let mut engine = engine();
    let rivet = connector(&mut engine, "rivet", 0.0, 0.0);
    let scrap = element(&mut engine, "scrap", 1.0, 0.0);
    touch(&mut engine, scrap, rivet);
    engine
        .handle_contact(ContactEvent::End {
            owner: rivet,
            other: scrap,
        })
        .unwrap();

    let plate = element(&mut engine, "plate", -1.0, 0.0);
    assert_eq!(touch(&mut engine, plate, rivet).1, ContactOutcome::Tracked);
}

// ===========================================================================
// Equipment effects
// ===========================================================================

#[test]
fn test_effect_with_no_contacts_only_consumes_host() {
    let mut engine = engine();
    earn(&mut engine, 1);
    let score = engine.score();
    let host = equipment(&mut engine, "compressor", 0.0, 0.0);
    let before = engine.world().len();

    let outcome = engine.activate_equipment(host).unwrap();
    assert_eq!(
        outcome,
        ActivationOutcome::Activated {
            effect: EffectTag::ShrinkAll,
            report: EffectReport::default(),
        }
    );
    assert_eq!(engine.score(), score);
    engine.tick(0.0);
    assert_eq!(engine.world().len(), before - 1);
}

#[test]
fn test_promote_raises_each_element() {
    let mut engine = engine();
    let host = equipment(&mut engine, "overclock", 0.0, 0.0);
    let scrap = element(&mut engine, "scrap", 1.0, 0.0);
    let plate = element(&mut engine, "plate", -1.0, 0.0);
    let core = element(&mut engine, "core", 0.0, 1.0);
    for e in [scrap, plate, core] {
        engine.on_contact_begin(host, e).unwrap();
    }

    let outcome = engine.activate_equipment(host).unwrap();
    let ActivationOutcome::Activated { report, .. } = outcome else {
        panic!("expected activation, got {:?}", outcome);
    };
    assert_eq!(report.destroyed, 2);
    assert_eq!(report.spawned, 2);

    engine.tick(0.0);
    assert_eq!(count(&engine, "scrap"), 0);
    assert_eq!(count(&engine, "plate"), 1);
    assert_eq!(count(&engine, "gear"), 1);
    assert_eq!(count(&engine, "core"), 1);
    assert!(engine.kind_of(host).is_none());
    assert!(engine.inventory().is_empty());
}

#[test]
fn test_locked_equipment_changes_nothing() {
    let mut engine = engine();
    let host = equipment(&mut engine, "reset_field", 0.0, 0.0);
    let plate = element(&mut engine, "plate", 1.0, 0.0);
    engine.on_contact_begin(host, plate).unwrap();

    assert_eq!(
        engine.activate_equipment(host).unwrap(),
        ActivationOutcome::Locked {
            required: 20,
            current: 0,
        }
    );
    assert_eq!(engine.inventory(), &[host]);
    assert!(engine.is_live(host));
    assert!(engine.contacts().get(host).unwrap().contains(plate));
}

#[test]
fn test_replace_with_lowest_tier() {
    let mut engine = engine();
    earn(&mut engine, 2);
    let host = equipment(&mut engine, "reset_field", 0.0, 0.0);
    let gear = element(&mut engine, "gear", 1.0, 0.0);
    let scrap = element(&mut engine, "scrap", -1.0, 0.0);
    let plate = element(&mut engine, "plate", 0.0, 1.0);
    for e in [gear, scrap, plate] {
        engine.on_contact_begin(host, e).unwrap();
    }
    let cores = count(&engine, "core");

    engine.activate_equipment(host).unwrap();
    engine.tick(0.0);
    assert_eq!(count(&engine, "scrap"), 3);
    assert_eq!(count(&engine, "plate"), 0);
    assert_eq!(count(&engine, "gear"), 0);
    assert_eq!(count(&engine, "core"), cores);
}

#[test]
fn test_shrink_all_scales_every_tracked_body() {
    let mut engine = engine();
    earn(&mut engine, 1);
    let host = equipment(&mut engine, "compressor", 0.0, 0.0);
    let scrap = element(&mut engine, "scrap", 1.0, 0.0);
    let weld = connector(&mut engine, "weld", -1.0, 0.0);
    let other = equipment(&mut engine, "overclock", 0.0, 1.0);
    for e in [scrap, weld, other] {
        engine.on_contact_begin(host, e).unwrap();
    }

    let outcome = engine.activate_equipment(host).unwrap();
    let ActivationOutcome::Activated { report, .. } = outcome else {
        panic!("expected activation, got {:?}", outcome);
    };
    assert_eq!(report.scaled, 3);
    assert_eq!(report.destroyed, 0);

    engine.tick(0.0);
    for e in [scrap, weld, other] {
        let body = engine.world().body(e).unwrap();
        assert!((body.scale - 0.8).abs() < 1e-6);
    }
    assert_eq!(engine.inventory(), &[other]);
}

#[test]
fn test_non_shrink_equipment_ignores_connectors() {
    let mut engine = engine();
    let host = equipment(&mut engine, "overclock", 0.0, 0.0);
    let weld = connector(&mut engine, "weld", 1.0, 0.0);
    engine.on_contact_begin(host, weld).unwrap();
    assert!(engine.contacts().get(host).unwrap().is_empty());
}

#[test]
fn test_transform_connectors_hits_whole_board() {
    let mut engine = engine();
    earn(&mut engine, 4);
    let host = equipment(&mut engine, "disassembler", 0.0, 0.0);
    let plate = element(&mut engine, "plate", 1.0, 0.0);
    let scrap = element(&mut engine, "scrap", -1.0, 0.0);
    let weld = connector(&mut engine, "weld", 50.0, 0.0);
    let rivet = connector(&mut engine, "rivet", -50.0, 3.0);
    engine.on_contact_begin(host, plate).unwrap();
    engine.on_contact_begin(host, scrap).unwrap();

    let outcome = engine.activate_equipment(host).unwrap();
    let ActivationOutcome::Activated { report, .. } = outcome else {
        panic!("expected activation, got {:?}", outcome);
    };
    assert_eq!(report.destroyed, 2);
    assert_eq!(report.spawned, 2);

    engine.tick(0.0);
    assert!(engine.kind_of(weld).is_none());
    assert!(engine.kind_of(rivet).is_none());
    assert_eq!(count(&engine, "scrap"), 3);
    assert_eq!(count(&engine, "plate"), 1);
    let spawned_at: Vec<Vec2> = engine
        .world()
        .bodies()
        .filter(|(_, b)| b.pos.x.abs() == 50.0)
        .map(|(_, b)| b.pos)
        .collect();
    assert_eq!(spawned_at, vec![Vec2::new(50.0, 0.0), Vec2::new(-50.0, 3.0)]);
}

#[test]
fn test_activation_is_single_use() {
    let mut engine = engine();
    let host = equipment(&mut engine, "overclock", 0.0, 0.0);
    assert!(matches!(
        engine.activate_equipment(host).unwrap(),
        ActivationOutcome::Activated { .. }
    ));
    assert_eq!(
        engine.activate_equipment(host).unwrap(),
        ActivationOutcome::Unavailable
    );
    engine.tick(0.0);
    assert_eq!(
        engine.activate_equipment(host),
        Err(EngineError::Untracked(host))
    );
}

#[test]
fn test_activating_an_element_is_an_error() {
    let mut engine = engine();
    let scrap = element(&mut engine, "scrap", 0.0, 0.0);
    assert_eq!(
        engine.activate_equipment(scrap),
        Err(EngineError::NotEquipment(scrap))
    );
}

// ===========================================================================
// Score, upgrades, defeat
// ===========================================================================

#[test]
fn test_threshold_events_and_upgrade_choice() {
    let mut engine = engine();
    earn(&mut engine, 9);
    assert_eq!(engine.score(), 108);
    let thresholds: Vec<_> = engine
        .drain_events()
        .into_iter()
        .filter_map(|e| match e {
            GameEvent::ThresholdCrossed { threshold } => Some(threshold),
            _ => None,
        })
        .collect();
    assert_eq!(thresholds, vec![100]);
    assert!(engine.upgrade_pending());

    let bonus = AttributeUpgrade {
        name: "bonus".into(),
        description: String::new(),
        kind: UpgradeKind::ComponentScore,
        value: 3,
    };
    assert!(engine.apply_upgrade(&bonus));
    assert!(!engine.upgrade_pending());
    assert!(!engine.apply_upgrade(&bonus));

    earn(&mut engine, 1);
    assert_eq!(engine.score(), 108 + 12 + 3);
}

#[test]
fn test_drop_tuning_upgrades() {
    let mut engine = engine();
    earn(&mut engine, 9);
    let base = engine.tuning();
    engine.apply_upgrade(&AttributeUpgrade {
        name: "slow".into(),
        description: String::new(),
        kind: UpgradeKind::CountdownDuration,
        value: 2,
    });
    assert_eq!(engine.tuning().countdown_duration, base.countdown_duration + 2.0);
    assert_eq!(engine.tuning().movement_speed, base.movement_speed);
}

#[test]
fn test_upgrade_offer_draws_from_pool() {
    let mut engine = engine();
    let pool: Vec<_> = (0..6)
        .map(|i| AttributeUpgrade {
            name: format!("u{}", i),
            description: String::new(),
            kind: UpgradeKind::MovementSpeed,
            value: 1,
        })
        .collect();
    let offer = engine.draw_upgrade_offer(&pool);
    assert_eq!(offer.len(), 3);
    assert!(offer.iter().all(|u| pool.contains(u)));
}

#[test]
fn test_danger_zone_waits_for_open_upgrade() {
    let mut engine = engine();
    earn(&mut engine, 9);
    assert!(engine.upgrade_pending());

    let stuck = element(&mut engine, "core", 0.0, 10.0);
    engine.on_danger_enter(stuck);
    for _ in 0..20 {
        assert_eq!(engine.tick(0.25).game_over, None);
    }

    engine.apply_upgrade(&AttributeUpgrade {
        name: "speed".into(),
        description: String::new(),
        kind: UpgradeKind::MovementSpeed,
        value: 1,
    });
    assert_eq!(engine.tick(0.25).game_over, Some(GameOverResult::Ranked(0)));
    assert_eq!(engine.phase(), SessionPhase::GameOver);
}

#[test]
fn test_leaving_danger_zone_avoids_defeat() {
    let mut engine = engine();
    let a = element(&mut engine, "core", 0.0, 10.0);
    engine.on_danger_enter(a);
    engine.tick(1.0);
    engine.on_danger_exit(a);
    for _ in 0..10 {
        assert_eq!(engine.tick(1.0).game_over, None);
    }
}

#[test]
fn test_game_over_is_idempotent_and_blocks_equipment() {
    let mut engine = engine();
    earn(&mut engine, 1);
    let host = equipment(&mut engine, "overclock", 0.0, 0.0);
    assert_eq!(engine.game_over(), GameOverResult::Ranked(0));
    assert_eq!(engine.game_over(), GameOverResult::AlreadyOver);
    assert_eq!(engine.leaderboard().len(), 1);
    assert_eq!(
        engine.activate_equipment(host).unwrap(),
        ActivationOutcome::Unavailable
    );

    let over: Vec<_> = engine
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, GameEvent::GameOver { .. }))
        .collect();
    assert_eq!(over.len(), 1);
}

#[test]
fn test_reset_keeps_only_the_leaderboard() {
    let mut engine = engine();
    earn(&mut engine, 3);
    let weld = connector(&mut engine, "weld", 0.0, 0.0);
    let scrap = element(&mut engine, "scrap", 1.0, 0.0);
    touch(&mut engine, scrap, weld);
    equipment(&mut engine, "overclock", 5.0, 0.0);

    let result = engine.game_over();
    assert_eq!(result, GameOverResult::Ranked(0));
    assert!(engine.submit_name(0, "ada"));
    engine.reset_session();

    assert!(engine.world().is_empty());
    assert!(engine.contacts().is_empty());
    assert!(engine.inventory().is_empty());
    assert_eq!(engine.score(), 0);
    assert_eq!(engine.progress().next_threshold, 100);
    assert_eq!(engine.phase(), SessionPhase::Playing);
    assert_eq!(engine.leaderboard()[0].name, "ada");
    assert_eq!(engine.leaderboard()[0].score, 36);
}

#[test]
fn test_sessions_share_one_board() {
    let mut engine = engine();
    for merges in [1, 3, 2, 5] {
        earn(&mut engine, merges);
        engine.game_over();
        engine.reset_session();
    }
    let board: Vec<i64> = engine.leaderboard().iter().map(|e| e.score).collect();
    assert_eq!(board, vec![60, 36, 24]);
}

// ===========================================================================
// Drops and invariants
// ===========================================================================

#[test]
fn test_drop_landing_is_reported_once() {
    let mut engine = engine();
    let floor = element(&mut engine, "core", 0.0, 0.0);
    let drop = engine.drop_next(Vec2::new(0.0, 1.0)).unwrap();
    touch(&mut engine, drop, floor);
    let next = engine.drop_next(Vec2::new(3.0, 1.0)).unwrap();
    touch(&mut engine, next, floor);

    let landed: Vec<_> = engine
        .drain_events()
        .into_iter()
        .filter_map(|e| match e {
            GameEvent::DropLanded { entity } => Some(entity),
            _ => None,
        })
        .collect();
    assert_eq!(landed, vec![drop, next]);
}

#[test]
fn test_untracked_owner_is_an_error() {
    let mut engine = engine();
    let a = element(&mut engine, "scrap", 0.0, 0.0);
    let ghost = EntityId(9_999);
    assert_eq!(
        engine.on_contact_begin(ghost, a),
        Err(EngineError::Untracked(ghost))
    );
    assert_eq!(engine.on_contact_begin(a, ghost).unwrap(), ContactOutcome::Ignored);
}

#[test]
fn test_double_destroy_is_an_error() {
    let mut engine = engine();
    let a = element(&mut engine, "scrap", 0.0, 0.0);
    engine.destroy(a).unwrap();
    assert_eq!(engine.destroy(a), Err(EngineError::DoubleDestroy(a)));
}
