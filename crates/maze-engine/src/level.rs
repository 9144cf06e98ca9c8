//! The maze scene.
//!
//! [`Level`] owns every gameplay component of one run through the maze plus
//! the [`PhysicsWorld`] they share, and [`Level::build`] wraps it in a
//! [`TickLoop`] with the systems registered in this order:
//!
//! | System       | Does                                                      |
//! |--------------|-----------------------------------------------------------|
//! | `menu_input` | pause, resume, restart, exit and respawn buttons          |
//! | `movement`   | player motor and character controller                     |
//! | `patrol`     | observer waypoint steering                                |
//! | `physics`    | physics step, zone events to exit/save/observers/pickups  |
//! | `detection`  | line-of-sight checks for observers with the player in range |
//! | `timer`      | countdown, menu reveal, time expiry                       |
//! | `ending`     | fade and scene change after exit or capture               |
//! | `flicker`    | light intensities                                         |
//!
//! `movement`, `patrol` and `physics` stand still while the clock is frozen.

use maze_core::checkpoint::{Checkpoint, CheckpointStore};
use maze_core::clock::ClockMultiplier;
use maze_core::collectible::TimeCollectible;
use maze_core::command::{AudioCue, Cause, CommandBuffer, HostCommand, SceneRequest, SystemId};
use maze_core::config::GameConfig;
use maze_core::detection::DetectionAgent;
use maze_core::ending::EndOfLevel;
use maze_core::entity::{EntityId, EntityKind, EntityRegistry};
use maze_core::flicker::LightFlicker;
use maze_core::math::Position;
use maze_core::movement::PlayerMotor;
use maze_core::patrol::WaypointPatrol;
use maze_core::pause::PauseMenu;
use maze_core::persistent::Shared;
use maze_core::timer::CountdownTimer;
use maze_core::MazeError;

use crate::physics::{PhysicsWorld, ZoneEvent, ZoneEventKind, PHYSICS_SYSTEM_NAME};
use crate::tick::{MenuButton, Simulation, TickConfig, TickContext, TickLoop};

// ---------------------------------------------------------------------------
// Scene objects
// ---------------------------------------------------------------------------

/// A gargoyle or ghost.
#[derive(Debug, Clone)]
pub struct Observer {
    /// Sight logic.
    pub agent: DetectionAgent,
    /// Route; empty for gargoyles.
    pub patrol: WaypointPatrol,
    /// Current eye point.
    pub eye: Position,
}

/// A time pickup placed in the maze.
#[derive(Debug, Clone)]
pub struct Pickup {
    /// Trigger volume owner.
    pub id: EntityId,
    /// Bonus state.
    pub collectible: TimeCollectible,
}

// ---------------------------------------------------------------------------
// Level
// ---------------------------------------------------------------------------

/// State of one maze run.
pub struct Level {
    config: GameConfig,
    scene_index: usize,
    clock: ClockMultiplier,
    entities: EntityRegistry,
    physics: PhysicsWorld,
    player: EntityId,
    player_position: Position,
    motor: PlayerMotor,
    timer: CountdownTimer,
    checkpoints: Shared<CheckpointStore>,
    exit: EntityId,
    ending: EndOfLevel,
    pause: PauseMenu,
    observers: Vec<Observer>,
    pickups: Vec<Pickup>,
    lights: Vec<LightFlicker>,
}

impl Level {
    /// Lay out the maze described by `config.layout`.
    ///
    /// `scene_index` is the build index this level was loaded as; a capture
    /// reloads it. `checkpoints` is the session's persistent store.
    pub fn new(config: &GameConfig, scene_index: usize, checkpoints: Shared<CheckpointStore>) -> Self {
        let layout = &config.layout;
        let mut entities = EntityRegistry::new();
        let mut physics = PhysicsWorld::new();

        let player = entities.spawn(EntityKind::Player);
        physics.add_character(
            player,
            layout.player_start,
            config.movement.player_radius,
            config.movement.player_half_height,
        );

        for wall in &layout.walls {
            let id = entities.spawn(EntityKind::Wall);
            physics.add_wall(id, wall);
        }

        let exit = entities.spawn(EntityKind::ExitZone);
        physics.add_zone(exit, &layout.exit);

        for save_point in &layout.save_points {
            let id = entities.spawn(EntityKind::SavePoint);
            physics.add_zone(id, save_point);
        }

        let observers = layout
            .observers
            .iter()
            .map(|spec| {
                let id = entities.spawn(EntityKind::Observer);
                physics.add_observer(id, spec.position, spec.sight_radius);
                Observer {
                    agent: DetectionAgent::new(id, player, config.detection.eye_offset),
                    patrol: WaypointPatrol::new(spec.waypoints.clone(), &config.patrol),
                    eye: spec.position,
                }
            })
            .collect();

        let pickups = layout
            .collectibles
            .iter()
            .map(|spec| {
                let id = entities.spawn(EntityKind::Collectible);
                physics.add_zone(id, &spec.zone);
                Pickup {
                    id,
                    collectible: TimeCollectible::new(spec.bonus),
                }
            })
            .collect();

        let lights = (0..layout.lights)
            .map(|i| LightFlicker::new(config.flicker.mode.clone(), config.flicker.seed.wrapping_add(i as u64)))
            .collect();

        tracing::info!(
            scene_index,
            walls = layout.walls.len(),
            observers = layout.observers.len(),
            bodies = physics.body_count(),
            "level built"
        );

        Self {
            config: config.clone(),
            scene_index,
            clock: ClockMultiplier::NORMAL,
            entities,
            physics,
            player,
            player_position: layout.player_start,
            motor: PlayerMotor::new(&config.movement),
            timer: CountdownTimer::new(config.timer.clone()),
            checkpoints,
            exit,
            ending: EndOfLevel::new(
                config.ending.clone(),
                player,
                scene_index,
                config.scenes.main_menu.clone(),
            ),
            pause: PauseMenu::new(config.scenes.main_menu.clone()),
            observers,
            pickups,
            lights,
        }
    }

    /// A level wrapped in a tick loop with every system registered.
    pub fn build(
        config: &GameConfig,
        scene_index: usize,
        checkpoints: Shared<CheckpointStore>,
    ) -> TickLoop<Level> {
        let level = Level::new(config, scene_index, checkpoints);
        let mut tick_loop = TickLoop::new(
            level,
            TickConfig {
                fixed_dt: config.tick.fixed_dt,
            },
        );
        tick_loop.add_system("menu_input", menu_input_system);
        tick_loop.add_system_after("movement", &["menu_input"], movement_system);
        tick_loop.add_system("patrol", patrol_system);
        tick_loop.add_system_after(PHYSICS_SYSTEM_NAME, &["movement", "patrol"], physics_system);
        tick_loop.add_system_after("detection", &[PHYSICS_SYSTEM_NAME], detection_system);
        tick_loop.add_system("timer", timer_system);
        tick_loop.add_system_after("ending", &["detection", "timer"], ending_system);
        tick_loop.add_system("flicker", flicker_system);
        tick_loop
    }

    /// Restore the last checkpoint: position and countdown.
    pub fn respawn(&mut self) -> Result<Checkpoint, MazeError> {
        let store = self.checkpoints.borrow();
        let checkpoint = store.restore(&mut self.player_position, &mut self.timer)?;
        self.physics.teleport(self.player, self.player_position);
        tracing::info!(
            x = checkpoint.position.x,
            z = checkpoint.position.z,
            time_remaining = checkpoint.time_remaining,
            "respawned at checkpoint"
        );
        Ok(checkpoint)
    }

    fn dispatch_zone_event(&mut self, event: ZoneEvent) {
        let Some(kind) = self.entities.kind_of(event.zone) else {
            return;
        };
        match (kind, event.kind) {
            (EntityKind::ExitZone, ZoneEventKind::Enter) => self.ending.on_zone_enter(event.visitor),
            (EntityKind::SavePoint, ZoneEventKind::Enter) if event.visitor == self.player => {
                self.checkpoints
                    .borrow_mut()
                    .save(self.player_position, self.timer.remaining());
            }
            (EntityKind::Observer, edge) => {
                if let Some(observer) = self.observers.iter_mut().find(|o| o.agent.id() == event.zone) {
                    match edge {
                        ZoneEventKind::Enter => observer.agent.on_zone_enter(event.visitor),
                        ZoneEventKind::Exit => observer.agent.on_zone_exit(event.visitor),
                    }
                }
            }
            (EntityKind::Collectible, ZoneEventKind::Enter) if event.visitor == self.player => {
                let Some(pickup) = self.pickups.iter_mut().find(|p| p.id == event.zone) else {
                    return;
                };
                if pickup.collectible.collect(&mut self.timer) {
                    self.physics.remove_entity(event.zone);
                    self.entities.despawn(event.zone);
                }
            }
            _ => {}
        }
    }

    // -- accessors ----------------------------------------------------------

    /// Build index this level was loaded as.
    pub fn scene_index(&self) -> usize {
        self.scene_index
    }

    /// The configuration the level was built from.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// The player's id.
    pub fn player(&self) -> EntityId {
        self.player
    }

    /// The exit volume's id.
    pub fn exit(&self) -> EntityId {
        self.exit
    }

    /// Where the player's feet are.
    pub fn player_position(&self) -> Position {
        self.player_position
    }

    /// Player motor.
    pub fn motor(&self) -> &PlayerMotor {
        &self.motor
    }

    /// Countdown.
    pub fn timer(&self) -> &CountdownTimer {
        &self.timer
    }

    /// Mutable countdown, for scripted setups.
    pub fn timer_mut(&mut self) -> &mut CountdownTimer {
        &mut self.timer
    }

    /// End-of-level coordinator.
    pub fn ending(&self) -> &EndOfLevel {
        &self.ending
    }

    /// Pause menu.
    pub fn pause(&self) -> &PauseMenu {
        &self.pause
    }

    /// Shared checkpoint store.
    pub fn checkpoints(&self) -> &Shared<CheckpointStore> {
        &self.checkpoints
    }

    /// Gargoyles and ghosts.
    pub fn observers(&self) -> &[Observer] {
        &self.observers
    }

    /// Time pickups.
    pub fn pickups(&self) -> &[Pickup] {
        &self.pickups
    }

    /// Flickering lights.
    pub fn lights(&self) -> &[LightFlicker] {
        &self.lights
    }

    /// Physics world.
    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    /// Scene object ids.
    pub fn entities(&self) -> &EntityRegistry {
        &self.entities
    }

    /// Place the player directly, bypassing walls.
    pub fn teleport_player(&mut self, position: Position) {
        self.player_position = position;
        self.physics.teleport(self.player, position);
    }
}

impl Simulation for Level {
    fn clock(&self) -> ClockMultiplier {
        self.clock
    }

    fn light_count(&self) -> usize {
        self.lights.len()
    }

    fn begin(&mut self, cmds: &mut CommandBuffer) {
        self.pause.begin(&mut self.clock, cmds);
        self.timer.begin(cmds);
        cmds.push(
            HostCommand::PlayAudio(AudioCue::Ambience),
            SystemId::SESSION,
            Cause::GameRule("level_start".to_owned()),
        );
        for (light, flicker) in self.lights.iter().enumerate() {
            cmds.push(
                HostCommand::SetLightIntensity {
                    light,
                    intensity: flicker.intensity(),
                },
                SystemId::FLICKER,
                Cause::GameRule("level_start".to_owned()),
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

fn menu_input_system(level: &mut Level, ctx: &TickContext<'_>, cmds: &mut CommandBuffer) {
    for button in &ctx.input.buttons {
        match button {
            MenuButton::Pause => level.pause.pause(&mut level.clock, cmds),
            MenuButton::Resume => level.pause.resume(&mut level.clock, cmds),
            MenuButton::TogglePause => level.pause.toggle(&mut level.clock, cmds),
            MenuButton::Restart => level.pause.restart(&mut level.clock, cmds),
            MenuButton::ExitToMenu => level.pause.exit_to_menu(&mut level.clock, cmds),
            MenuButton::Respawn => {
                if let Err(err) = level.respawn() {
                    tracing::warn!(%err, "respawn skipped");
                }
            }
            MenuButton::StartGame | MenuButton::Quit => {
                tracing::debug!(button = ?button, "title screen button ignored in level");
            }
        }
    }
}

fn movement_system(level: &mut Level, ctx: &TickContext<'_>, cmds: &mut CommandBuffer) {
    if ctx.time.is_frozen() {
        return;
    }
    let dt = ctx.time.scaled();
    let step = level
        .motor
        .step(ctx.input.horizontal, ctx.input.vertical, dt, cmds);
    if !step.walking {
        return;
    }
    if let Some(feet) = level.physics.move_character(level.player, step.displacement, dt) {
        level.player_position = feet;
    }
}

fn patrol_system(level: &mut Level, ctx: &TickContext<'_>, _cmds: &mut CommandBuffer) {
    if ctx.time.is_frozen() {
        return;
    }
    let dt = ctx.time.scaled();
    for observer in &mut level.observers {
        if !observer.patrol.is_moving() {
            continue;
        }
        let next = observer.patrol.step(observer.eye, dt);
        if next != observer.eye {
            observer.eye = next;
            level.physics.teleport(observer.agent.id(), next);
        }
    }
}

fn physics_system(level: &mut Level, ctx: &TickContext<'_>, _cmds: &mut CommandBuffer) {
    if ctx.time.is_frozen() {
        return;
    }
    let events = level.physics.step(ctx.time.scaled());
    for event in events {
        tracing::trace!(tick = ctx.tick, zone = %event.zone, visitor = %event.visitor, kind = ?event.kind, "zone event");
        level.dispatch_zone_event(event);
    }
}

fn detection_system(level: &mut Level, _ctx: &TickContext<'_>, _cmds: &mut CommandBuffer) {
    let target = level.player_position;
    let spotted = level
        .observers
        .iter()
        .find(|o| o.agent.check(o.eye, target, &level.physics));
    if let Some(observer) = spotted {
        tracing::debug!(observer = %observer.agent.id(), "player spotted");
        level.ending.caught();
    }
}

fn timer_system(level: &mut Level, ctx: &TickContext<'_>, cmds: &mut CommandBuffer) {
    let signals = level.timer.tick(ctx.time.scaled(), cmds);
    if signals.menu_revealed {
        level.pause.show_menu(cmds);
    }
    if signals.expired {
        let menu = level.config.scenes.main_menu.clone();
        tracing::info!(scene = %menu, "time is up");
        cmds.push(
            HostCommand::LoadScene(SceneRequest::Named(menu)),
            SystemId::TIMER,
            Cause::Timer("expired".to_owned()),
        );
    }
}

fn ending_system(level: &mut Level, ctx: &TickContext<'_>, cmds: &mut CommandBuffer) {
    let was_transitioning = level.ending.is_transitioning();
    level.ending.tick(ctx.time.scaled(), cmds);
    if !was_transitioning && level.ending.is_transitioning() {
        level.timer.stop();
    }
}

fn flicker_system(level: &mut Level, ctx: &TickContext<'_>, cmds: &mut CommandBuffer) {
    let dt = ctx.time.scaled();
    for (light, flicker) in level.lights.iter_mut().enumerate() {
        let before = flicker.intensity();
        let intensity = flicker.tick(dt);
        if intensity != before {
            cmds.push(
                HostCommand::SetLightIntensity { light, intensity },
                SystemId::FLICKER,
                Cause::Timer("flicker".to_owned()),
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
