//! Headless stand-in for the engine services a level talks to.
//!
//! The [`Host`] is the only place [`HostCommand`]s take effect. It keeps an
//! [`AudioMixer`] with one source per [`AudioCue`], a [`Hud`] with element
//! visibility, the countdown text, fade alphas and light intensities, plus the
//! scene load and quit requests raised during the last tick.
//!
//! Commands are applied strictly in buffer order. Only the first scene
//! request of a tick is kept; later ones are logged and dropped, matching an
//! engine where the first `LoadScene` call wins and the frame ends.

use std::collections::BTreeMap;

use maze_core::command::{AudioCue, Command, FadeImage, HostCommand, SceneRequest, TimerColor, UiElement};
use maze_core::flicker::INTENSITY_TO_EMISSION;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Audio
// ---------------------------------------------------------------------------

/// Playback state of one audio source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SourceState {
    /// Not playing.
    #[default]
    Stopped,
    /// Playing.
    Playing,
    /// Paused mid-clip by a pause-all.
    Paused,
}

/// One source per cue, with a counter of how often each clip was started.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AudioMixer {
    sources: BTreeMap<AudioCue, SourceState>,
    plays: BTreeMap<AudioCue, u32>,
}

impl AudioMixer {
    /// All sources stopped.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restart `cue` from the beginning.
    pub fn play(&mut self, cue: AudioCue) {
        self.sources.insert(cue, SourceState::Playing);
        *self.plays.entry(cue).or_default() += 1;
    }

    /// Stop `cue`.
    pub fn stop(&mut self, cue: AudioCue) {
        self.sources.insert(cue, SourceState::Stopped);
    }

    /// Pause every playing source. Stopped ones stay stopped.
    pub fn pause_all(&mut self) {
        for state in self.sources.values_mut() {
            if *state == SourceState::Playing {
                *state = SourceState::Paused;
            }
        }
    }

    /// Resume only the sources a pause-all paused.
    pub fn resume_all(&mut self) {
        for state in self.sources.values_mut() {
            if *state == SourceState::Paused {
                *state = SourceState::Playing;
            }
        }
    }

    /// Current state of `cue`.
    pub fn state(&self, cue: AudioCue) -> SourceState {
        self.sources.get(&cue).copied().unwrap_or_default()
    }

    /// Whether `cue` is audible.
    pub fn is_playing(&self, cue: AudioCue) -> bool {
        self.state(cue) == SourceState::Playing
    }

    /// How many times `cue` has been started.
    pub fn play_count(&self, cue: AudioCue) -> u32 {
        self.plays.get(&cue).copied().unwrap_or(0)
    }

    /// The cues that are currently audible, in cue order.
    pub fn playing(&self) -> Vec<AudioCue> {
        AudioCue::ALL.into_iter().filter(|c| self.is_playing(*c)).collect()
    }
}

// ---------------------------------------------------------------------------
// HUD
// ---------------------------------------------------------------------------

/// Everything the player would see on screen.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Hud {
    visible: BTreeMap<UiElement, bool>,
    timer_text: Option<(String, TimerColor)>,
    fades: BTreeMap<FadeImage, f32>,
    lights: BTreeMap<usize, f32>,
}

impl Hud {
    /// Whether `element` is shown. Elements start shown until told otherwise.
    pub fn is_visible(&self, element: UiElement) -> bool {
        self.visible.get(&element).copied().unwrap_or(true)
    }

    /// Last countdown text and colour.
    pub fn timer_text(&self) -> Option<(&str, TimerColor)> {
        self.timer_text.as_ref().map(|(text, color)| (text.as_str(), *color))
    }

    /// Opacity of a fade image. Zero until first set.
    pub fn fade_alpha(&self, image: FadeImage) -> f32 {
        self.fades.get(&image).copied().unwrap_or(0.0)
    }

    /// Last intensity of light `index`.
    pub fn light_intensity(&self, index: usize) -> Option<f32> {
        self.lights.get(&index).copied()
    }

    /// Emission scale of light `index`, derived from its intensity.
    pub fn light_emission(&self, index: usize) -> Option<f32> {
        self.light_intensity(index).map(|i| i * INTENSITY_TO_EMISSION)
    }
}

// ---------------------------------------------------------------------------
// Host
// ---------------------------------------------------------------------------

/// Applies host commands for one scene.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Host {
    audio: AudioMixer,
    hud: Hud,
    light_count: usize,
    scene_request: Option<SceneRequest>,
    quit_requested: bool,
    applied: u64,
}

impl Host {
    /// A host for a scene with `light_count` flickering lights.
    pub fn new(light_count: usize) -> Self {
        Self {
            light_count,
            ..Self::default()
        }
    }

    /// Apply commands in order.
    pub fn apply_all(&mut self, commands: &[Command]) {
        for command in commands {
            self.apply(command);
        }
    }

    /// Apply a single command.
    pub fn apply(&mut self, command: &Command) {
        self.applied += 1;
        match &command.kind {
            HostCommand::PlayAudio(cue) => self.audio.play(*cue),
            HostCommand::StopAudio(cue) => self.audio.stop(*cue),
            HostCommand::PauseAllAudio => self.audio.pause_all(),
            HostCommand::ResumeAllAudio => self.audio.resume_all(),
            HostCommand::SetVisible(element, shown) => {
                self.hud.visible.insert(*element, *shown);
            }
            HostCommand::SetTimerText { text, color } => {
                self.hud.timer_text = Some((text.clone(), *color));
            }
            HostCommand::SetFadeAlpha(image, alpha) => {
                self.hud.fades.insert(*image, alpha.clamp(0.0, 1.0));
            }
            HostCommand::SetLightIntensity { light, intensity } => {
                if *light >= self.light_count {
                    tracing::warn!(light, lights = self.light_count, "no such light, skipping");
                    return;
                }
                self.hud.lights.insert(*light, *intensity);
            }
            HostCommand::LoadScene(request) => {
                if let Some(pending) = &self.scene_request {
                    tracing::warn!(
                        pending = ?pending,
                        dropped = ?request,
                        issued_by = command.issued_by.0,
                        "scene load already pending this tick"
                    );
                    return;
                }
                tracing::debug!(scene = ?request, issued_by = command.issued_by.0, "scene load requested");
                self.scene_request = Some(request.clone());
            }
            HostCommand::Quit => {
                self.quit_requested = true;
            }
        }
    }

    /// Take the pending scene request, if any.
    pub fn take_scene_request(&mut self) -> Option<SceneRequest> {
        self.scene_request.take()
    }

    /// The pending scene request, if any.
    pub fn scene_request(&self) -> Option<&SceneRequest> {
        self.scene_request.as_ref()
    }

    /// Whether a quit was requested.
    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// Audio state.
    pub fn audio(&self) -> &AudioMixer {
        &self.audio
    }

    /// Screen state.
    pub fn hud(&self) -> &Hud {
        &self.hud
    }

    /// Total commands applied since creation.
    pub fn applied_count(&self) -> u64 {
        self.applied
    }
}
