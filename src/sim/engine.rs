//! The merge/craft engine
//!
//! Owns the bookkeeping that sits between the physics host and the game:
//! contact sets, the destroy queue, score and the danger zone. The host
//! reports contacts and ticks; the engine answers with outcomes and queues
//! [`GameEvent`]s for presentation.
//!
//! Destruction is deferred. A merge or craft marks its inputs as doomed and
//! from then on they are dead to every query, but the world only loses them
//! when the tick flushes the queue.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::catalog::{Catalog, ElementKindId, EquipmentKindId};
use super::contact::{ContactSet, ContactTracker};
use super::defeat::DangerZone;
use super::effects::{BoardAction, EffectInput, EffectTag, ElementContact, plan_effect};
use super::entity::{Category, EntityId, EntityKind};
use super::events::GameEvent;
use super::merge::{MergeCandidate, MergeDecision, resolve_merge};
use super::recipe::match_recipe;
use super::score::{GameOverResult, GameProgressState, ScoreTracker, SessionPhase};
use super::world::{EntityWorld, KindSupplier};
use crate::centroid;
use crate::error::{ConfigError, EngineError};
use crate::highscores::{HighScoreEntry, HighScores};
use crate::settings::GameSettings;
use crate::upgrades::{AttributeUpgrade, DropTuning, UpgradeKind, draw_offer};

/// A contact notification from the physics host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactEvent {
    Begin { owner: EntityId, other: EntityId },
    End { owner: EntityId, other: EntityId },
}

/// What a contact notification caused
#[derive(Debug, Clone, PartialEq)]
pub enum ContactOutcome {
    /// One side is dead, doomed or unknown to the engine, or an ended
    /// contact was never recorded
    Ignored,
    /// Recorded; nothing else happened
    Tracked,
    Merged {
        entity: EntityId,
        product: ElementKindId,
        pos: Vec2,
    },
    Crafted {
        entity: EntityId,
        equipment: EquipmentKindId,
        pos: Vec2,
        consumed: Vec<EntityId>,
    },
}

/// Board changes made by one activation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EffectReport {
    pub destroyed: usize,
    pub spawned: usize,
    pub scaled: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActivationOutcome {
    /// The effect ran and the host was consumed
    Activated {
        effect: EffectTag,
        report: EffectReport,
    },
    /// Score too low; nothing changed
    Locked { required: i64, current: i64 },
    /// Session over or host already consumed
    Unavailable,
}

/// Result of one engine tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Entities removed from the world this tick, ascending by id
    pub destroyed: Vec<EntityId>,
    /// Stale contact entries dropped
    pub purged: usize,
    pub game_over: Option<GameOverResult>,
}

/// Tracked, not doomed, and still in the world
fn is_live<W: EntityWorld>(
    kinds: &HashMap<EntityId, EntityKind>,
    doomed: &BTreeSet<EntityId>,
    world: &W,
    id: EntityId,
) -> bool {
    kinds.contains_key(&id) && !doomed.contains(&id) && world.is_alive(id)
}

pub struct Engine<W, S> {
    catalog: Arc<Catalog>,
    settings: GameSettings,
    world: W,
    supplier: S,
    kinds: HashMap<EntityId, EntityKind>,
    contacts: ContactTracker,
    /// Destroy queue, flushed at the end of each tick
    doomed: BTreeSet<EntityId>,
    score: ScoreTracker,
    /// Crafted equipment not yet consumed, in creation order
    inventory: Vec<EntityId>,
    danger: DangerZone,
    tuning: DropTuning,
    events: Vec<GameEvent>,
    /// Last supplied drop that has not touched anything yet
    active_drop: Option<EntityId>,
    rng: Pcg32,
    seed: u64,
    time_ticks: u64,
}

impl<W: EntityWorld, S: KindSupplier> Engine<W, S> {
    pub fn new(
        catalog: Arc<Catalog>,
        settings: GameSettings,
        world: W,
        supplier: S,
        high_scores: HighScores,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        let tuning = DropTuning {
            countdown_duration: settings.countdown_duration,
            movement_speed: settings.movement_speed,
        };
        Ok(Self {
            score: ScoreTracker::new(settings.score_threshold, high_scores),
            catalog,
            settings,
            world,
            supplier,
            kinds: HashMap::new(),
            contacts: ContactTracker::new(),
            doomed: BTreeSet::new(),
            inventory: Vec::new(),
            danger: DangerZone::new(),
            tuning,
            events: Vec::new(),
            active_drop: None,
            rng: Pcg32::seed_from_u64(seed),
            seed,
            time_ticks: 0,
        })
    }

    // === Accessors ===

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn contacts(&self) -> &ContactTracker {
        &self.contacts
    }

    pub fn score(&self) -> i64 {
        self.score.score()
    }

    pub fn progress(&self) -> GameProgressState {
        self.score.progress()
    }

    pub fn phase(&self) -> SessionPhase {
        self.score.phase()
    }

    pub fn leaderboard(&self) -> &[HighScoreEntry] {
        self.score.leaderboard()
    }

    pub fn high_scores(&self) -> &HighScores {
        self.score.high_scores()
    }

    pub fn upgrade_pending(&self) -> bool {
        self.score.upgrade_pending()
    }

    pub fn inventory(&self) -> &[EntityId] {
        &self.inventory
    }

    pub fn tuning(&self) -> DropTuning {
        self.tuning
    }

    pub fn active_drop(&self) -> Option<EntityId> {
        self.active_drop
    }

    pub fn danger_zone(&self) -> &DangerZone {
        &self.danger
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    pub fn kind_of(&self, id: EntityId) -> Option<EntityKind> {
        self.kinds.get(&id).copied()
    }

    pub fn is_live(&self, id: EntityId) -> bool {
        is_live(&self.kinds, &self.doomed, &self.world, id)
    }

    pub fn is_doomed(&self, id: EntityId) -> bool {
        self.doomed.contains(&id)
    }

    /// Take every queued event, oldest first
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // === Registration ===

    /// Start tracking an entity the host spawned itself
    pub fn track_entity(&mut self, id: EntityId, kind: EntityKind) -> Result<(), EngineError> {
        let set = match kind {
            EntityKind::Equipment(equipment) => ContactSet::partitioned(
                self.catalog
                    .equipment(equipment)
                    .is_some_and(|def| def.effect.tracks_bodies()),
            ),
            EntityKind::Element(_) | EntityKind::Connector(_) => ContactSet::single(),
        };
        self.contacts.track(id, set)?;
        self.kinds.insert(id, kind);
        if kind.category() == Category::Equipment {
            self.inventory.push(id);
        }
        Ok(())
    }

    /// Spawn through the world and track the result
    pub fn spawn_tracked(
        &mut self,
        kind: EntityKind,
        pos: Vec2,
        impulse: Vec2,
    ) -> Result<EntityId, EngineError> {
        let id = self.world.spawn(kind, pos, impulse);
        self.track_entity(id, kind)?;
        Ok(id)
    }

    /// Materialize the supplier's next kind at `pos`. It becomes the active drop.
    pub fn drop_next(&mut self, pos: Vec2) -> Result<EntityId, EngineError> {
        let kind = self.supplier.supply_next_kind();
        let id = self.spawn_tracked(kind.into(), pos, Vec2::ZERO)?;
        self.active_drop = Some(id);
        log::debug!("drop {:?} as {:?} at {:?}", kind, id, pos);
        Ok(id)
    }

    /// Queue an entity for removal at the end of the tick
    pub fn destroy(&mut self, id: EntityId) -> Result<(), EngineError> {
        if !self.kinds.contains_key(&id) {
            return Err(EngineError::Untracked(id));
        }
        self.mark_destroyed(id)
    }

    fn mark_destroyed(&mut self, id: EntityId) -> Result<(), EngineError> {
        if !self.doomed.insert(id) {
            return Err(EngineError::DoubleDestroy(id));
        }
        self.inventory.retain(|&held| held != id);
        if self.active_drop == Some(id) {
            self.active_drop = None;
        }
        Ok(())
    }

    fn random_impulse(&mut self) -> Vec2 {
        let angle = self.rng.random_range(0.0..std::f32::consts::TAU);
        Vec2::from_angle(angle) * self.settings.spawn_impulse
    }

    fn purge_contacts(&mut self, owner: EntityId) -> Result<usize, EngineError> {
        let (kinds, doomed, world) = (&self.kinds, &self.doomed, &self.world);
        self.contacts
            .purge_dead(owner, |id| is_live(kinds, doomed, world, id))
    }

    fn award(&mut self, delta: i64) {
        for threshold in self.score.add_score(delta) {
            log::debug!("threshold {} crossed", threshold);
            self.events.push(GameEvent::ThresholdCrossed { threshold });
        }
    }

    // === Contacts ===

    pub fn handle_contact(&mut self, event: ContactEvent) -> Result<ContactOutcome, EngineError> {
        match event {
            ContactEvent::Begin { owner, other } => self.on_contact_begin(owner, other),
            ContactEvent::End { owner, other } => Ok(if self.on_contact_end(owner, other)? {
                ContactOutcome::Tracked
            } else {
                ContactOutcome::Ignored
            }),
        }
    }

    /// `owner` started touching `other`, seen from `owner`'s side.
    ///
    /// Runs the merge rule for element pairs and the recipe matcher whenever
    /// a connector is involved.
    pub fn on_contact_begin(
        &mut self,
        owner: EntityId,
        other: EntityId,
    ) -> Result<ContactOutcome, EngineError> {
        if !self.contacts.is_tracked(owner) {
            return Err(EngineError::Untracked(owner));
        }
        if owner == other || !self.is_live(owner) || !self.is_live(other) {
            return Ok(ContactOutcome::Ignored);
        }
        let (Some(&owner_kind), Some(&other_kind)) = (self.kinds.get(&owner), self.kinds.get(&other))
        else {
            return Ok(ContactOutcome::Ignored);
        };

        self.contacts
            .on_contact_begin(owner, other, other_kind.category())?;

        if !self.on_drop_landed(owner) {
            self.on_drop_landed(other);
        }

        match (owner_kind, other_kind) {
            (EntityKind::Element(a), EntityKind::Element(b)) => self.try_merge(owner, a, other, b),
            (EntityKind::Connector(_), _) => self.try_craft(owner),
            (_, EntityKind::Connector(_)) => self.try_craft(other),
            _ => Ok(ContactOutcome::Tracked),
        }
    }

    /// The held drop touched anything: another body, a wall or the floor.
    ///
    /// Returns false when `id` is not the active drop.
    pub fn on_drop_landed(&mut self, id: EntityId) -> bool {
        if self.active_drop != Some(id) {
            return false;
        }
        self.active_drop = None;
        self.events.push(GameEvent::DropLanded { entity: id });
        true
    }

    /// `owner` stopped touching `other`
    pub fn on_contact_end(&mut self, owner: EntityId, other: EntityId) -> Result<bool, EngineError> {
        self.contacts.on_contact_end(owner, other)
    }

    fn try_merge(
        &mut self,
        owner: EntityId,
        owner_kind: ElementKindId,
        other: EntityId,
        other_kind: ElementKindId,
    ) -> Result<ContactOutcome, EngineError> {
        let (Some(owner_pos), Some(other_pos)) =
            (self.world.position(owner), self.world.position(other))
        else {
            return Ok(ContactOutcome::Tracked);
        };
        let decision = resolve_merge(
            &self.catalog,
            &MergeCandidate {
                id: owner,
                kind: owner_kind,
                pos: owner_pos,
            },
            &MergeCandidate {
                id: other,
                kind: other_kind,
                pos: other_pos,
            },
        );

        let plan = match decision {
            MergeDecision::Merge(plan) => plan,
            MergeDecision::TerminalTier => {
                log::trace!("{:?} and {:?} are at terminal tier", owner, other);
                return Ok(ContactOutcome::Tracked);
            }
            MergeDecision::Passive | MergeDecision::Incompatible => {
                return Ok(ContactOutcome::Tracked);
            }
        };

        self.mark_destroyed(plan.initiator)?;
        self.mark_destroyed(plan.partner)?;
        let impulse = self.random_impulse();
        let entity = self.spawn_tracked(EntityKind::Element(plan.product), plan.position, impulse)?;
        self.award(plan.score);
        self.events.push(GameEvent::Merged {
            source: plan.source,
            product: plan.product,
            entity,
            pos: plan.position,
        });
        log::debug!(
            "merge {:?} + {:?} -> {:?} ({:?}) at {:?}",
            plan.initiator,
            plan.partner,
            entity,
            plan.product,
            plan.position
        );

        Ok(ContactOutcome::Merged {
            entity,
            product: plan.product,
            pos: plan.position,
        })
    }

    fn try_craft(&mut self, connector: EntityId) -> Result<ContactOutcome, EngineError> {
        let Some(connector_kind) = self.kinds.get(&connector).and_then(|k| k.as_connector()) else {
            return Ok(ContactOutcome::Tracked);
        };
        self.purge_contacts(connector)?;

        let touching: Vec<(EntityId, ElementKindId)> = self
            .contacts
            .snapshot(connector)?
            .into_iter()
            .filter_map(|id| {
                let kind = self.kinds.get(&id)?.as_element()?;
                Some((id, kind))
            })
            .collect();

        let catalog = Arc::clone(&self.catalog);
        let Some(def) = catalog.connector(connector_kind) else {
            return Ok(ContactOutcome::Tracked);
        };
        let Some(found) = match_recipe(def, &touching) else {
            return Ok(ContactOutcome::Tracked);
        };

        let points: Vec<Vec2> = std::iter::once(connector)
            .chain(found.contributors.iter().copied())
            .filter_map(|id| self.world.position(id))
            .collect();
        let Some(pos) = centroid(&points) else {
            return Ok(ContactOutcome::Tracked);
        };

        for &contributor in &found.contributors {
            self.mark_destroyed(contributor)?;
        }
        self.mark_destroyed(connector)?;

        let impulse = self.random_impulse();
        let entity = self.spawn_tracked(EntityKind::Equipment(found.produces), pos, impulse)?;
        self.award(found.score);
        self.events.push(GameEvent::Crafted {
            connector: connector_kind,
            recipe_index: found.recipe_index,
            equipment: found.produces,
            entity,
            pos,
        });
        log::info!(
            "crafted {} via {} ({} parts) as {:?}",
            catalog
                .equipment(found.produces)
                .map_or("?", |e| e.name.as_str()),
            def.recipes[found.recipe_index].name,
            found.contributors.len(),
            entity
        );

        Ok(ContactOutcome::Crafted {
            entity,
            equipment: found.produces,
            pos,
            consumed: found.contributors,
        })
    }

    // === Equipment ===

    fn effect_input(&self, host: EntityId) -> Result<EffectInput, EngineError> {
        let elements = self
            .contacts
            .snapshot_partition(host, Category::Element)?
            .into_iter()
            .filter_map(|id| {
                Some(ElementContact {
                    id,
                    kind: self.kinds.get(&id)?.as_element()?,
                    pos: self.world.position(id)?,
                })
            })
            .collect();

        let mut board_connectors: Vec<(EntityId, Vec2)> = self
            .kinds
            .iter()
            .filter(|(id, kind)| kind.category() == Category::Connector && self.is_live(**id))
            .filter_map(|(&id, _)| Some((id, self.world.position(id)?)))
            .collect();
        board_connectors.sort_by_key(|&(id, _)| id);

        Ok(EffectInput {
            elements,
            connectors: self.contacts.snapshot_partition(host, Category::Connector)?,
            equipment: self.contacts.snapshot_partition(host, Category::Equipment)?,
            board_connectors,
        })
    }

    /// Run the effect of equipment `host`, then consume it.
    ///
    /// An effect with nothing to act on changes nothing on the board, but the
    /// host is still consumed.
    pub fn activate_equipment(&mut self, host: EntityId) -> Result<ActivationOutcome, EngineError> {
        let kind = *self.kinds.get(&host).ok_or(EngineError::Untracked(host))?;
        let equipment = kind.as_equipment().ok_or(EngineError::NotEquipment(host))?;
        if self.score.is_game_over() || !self.is_live(host) {
            log::warn!("stale activation request for {:?}", host);
            return Ok(ActivationOutcome::Unavailable);
        }

        let catalog = Arc::clone(&self.catalog);
        let Some(def) = catalog.equipment(equipment) else {
            return Ok(ActivationOutcome::Unavailable);
        };
        let current = self.score.score();
        if current < def.activation_score {
            return Ok(ActivationOutcome::Locked {
                required: def.activation_score,
                current,
            });
        }

        self.purge_contacts(host)?;
        let input = self.effect_input(host)?;
        let actions = plan_effect(def.effect, &catalog, &input, self.settings.shrink_factor);

        let mut report = EffectReport::default();
        for action in actions {
            match action {
                BoardAction::Replace { target, with, at } => {
                    self.mark_destroyed(target)?;
                    report.destroyed += 1;
                    self.spawn_tracked(EntityKind::Element(with), at, Vec2::ZERO)?;
                    report.spawned += 1;
                }
                BoardAction::Scale { target, factor } => {
                    if self.world.scale(target, factor) {
                        report.scaled += 1;
                    }
                }
            }
        }

        for &category in def.effect.cleared_partitions() {
            self.contacts.clear(host, category)?;
        }
        self.mark_destroyed(host)?;

        self.events.push(GameEvent::EquipmentActivated {
            entity: host,
            effect: def.effect,
            destroyed: report.destroyed,
            spawned: report.spawned,
            scaled: report.scaled,
        });
        log::debug!(
            "{} ({}) activated: {:?}",
            def.name,
            def.effect.as_str(),
            report
        );

        Ok(ActivationOutcome::Activated {
            effect: def.effect,
            report,
        })
    }

    // === Upgrades ===

    /// Draw an upgrade offer with the session RNG
    pub fn draw_upgrade_offer(&mut self, pool: &[AttributeUpgrade]) -> Vec<AttributeUpgrade> {
        draw_offer(pool, &mut self.rng)
    }

    /// Apply the chosen upgrade and close one pending choice.
    /// Returns false (and changes nothing) when no choice is open.
    pub fn apply_upgrade(&mut self, upgrade: &AttributeUpgrade) -> bool {
        if !self.score.upgrade_pending() {
            log::warn!("upgrade {} chosen with no choice open", upgrade.name);
            return false;
        }
        match upgrade.kind {
            UpgradeKind::ComponentScore => self.score.add_bonus(upgrade.value),
            UpgradeKind::CountdownDuration => {
                self.tuning.countdown_duration += upgrade.value as f32;
            }
            UpgradeKind::MovementSpeed => self.tuning.movement_speed += upgrade.value as f32,
        }
        log::debug!("upgrade {} applied", upgrade.name);
        self.score.resolve_upgrade()
    }

    // === Danger zone ===

    pub fn on_danger_enter(&mut self, id: EntityId) {
        if self.is_live(id) {
            self.danger.on_enter(id);
        }
    }

    pub fn on_danger_exit(&mut self, id: EntityId) {
        self.danger.on_exit(id);
    }

    // === Tick and session ===

    fn flush_destroyed(&mut self) -> Vec<EntityId> {
        let doomed = std::mem::take(&mut self.doomed);
        let mut destroyed = Vec::with_capacity(doomed.len());
        for id in doomed {
            if !self.world.destroy(id) {
                log::warn!("{:?} was already gone from the world", id);
            }
            self.contacts.untrack(id);
            self.kinds.remove(&id);
            destroyed.push(id);
        }
        destroyed
    }

    /// Advance one step: flush the destroy queue, purge stale contacts and
    /// run the danger zone timer. The timer holds while an upgrade is open.
    pub fn tick(&mut self, dt: f32) -> TickReport {
        self.time_ticks += 1;
        let destroyed = self.flush_destroyed();

        let (kinds, doomed, world) = (&self.kinds, &self.doomed, &self.world);
        let purged = self
            .contacts
            .purge_all(|id| is_live(kinds, doomed, world, id));
        self.danger
            .purge(|id| is_live(kinds, doomed, world, id));

        let mut game_over = None;
        if !self.score.is_game_over()
            && self
                .danger
                .tick(dt, self.settings.defeat_time, self.score.upgrade_pending())
        {
            game_over = Some(self.game_over());
        }

        TickReport {
            destroyed,
            purged,
            game_over,
        }
    }

    /// End the session. Idempotent.
    pub fn game_over(&mut self) -> GameOverResult {
        let result = self.score.game_over();
        if result != GameOverResult::AlreadyOver {
            let score = self.score.score();
            log::info!("game over at tick {}: score {} ({:?})", self.time_ticks, score, result);
            self.events.push(GameEvent::GameOver { score, result });
        }
        result
    }

    /// Name a ranked leaderboard slot
    pub fn submit_name(&mut self, rank: usize, name: &str) -> bool {
        self.score.submit_name(rank, name)
    }

    /// Remove every tracked entity and start over. The leaderboard survives.
    pub fn reset_session(&mut self) {
        let mut tracked: Vec<EntityId> = self.kinds.keys().copied().collect();
        tracked.sort();
        for id in &tracked {
            self.world.destroy(*id);
        }

        self.kinds.clear();
        self.contacts.clear_all();
        self.doomed.clear();
        self.inventory.clear();
        self.danger.reset();
        self.events.clear();
        self.active_drop = None;
        self.tuning = DropTuning {
            countdown_duration: self.settings.countdown_duration,
            movement_speed: self.settings.movement_speed,
        };
        self.score.reset_session();
        self.rng = Pcg32::seed_from_u64(self.seed);
        self.time_ticks = 0;

        log::info!("session reset ({} entities removed)", tracked.len());
    }
}
