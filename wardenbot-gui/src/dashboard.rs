use std::time::Duration;

use egui::{Align2, Color32, RichText, ScrollArea, Sense, Vec2};
use wardenbot_common::models::{BotStatus, IntentsMode, TargetRef};
use wardenbot_core::InvokeOutcome;
use wardenbot_core::platforms::discord::WorkerState;
use wardenbot_core::services::ModerationAction;

use crate::layout_constants::*;

/// What the user asked for this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UIEvent {
    Start(IntentsMode),
    Action(ModerationAction),
}

/// Everything the dashboard needs to draw one frame. Built fresh each frame
/// from the supervisor.
pub struct DashboardState<'a> {
    pub worker: WorkerState,
    pub status: BotStatus,
    pub running_mode: Option<IntentsMode>,
    pub target: Option<TargetRef>,
    pub client_id: Option<&'a str>,
    pub last_outcome: Option<&'a InvokeOutcome>,
    pub notice: Option<&'a str>,
    pub action_timeout: Duration,
}

pub struct DashboardRenderer {
    privileged: bool,
    confirm_ban: bool,
}

const DASHBOARD_ACTIONS: [(&str, ModerationAction); 4] = [
    ("🔨 Ban", ModerationAction::Ban),
    ("🔇 Mute", ModerationAction::Mute),
    ("🙉 Deafen", ModerationAction::Deafen),
    ("📤 Disconnect", ModerationAction::Disconnect),
];

const HELP_COMMANDS: [(&str, &str); 7] = [
    ("/ban [reason]", "Ban Members, asks for confirmation"),
    ("/mute [reason]", "Mute Members"),
    ("/unmute [reason]", "Mute Members"),
    ("/deafen [reason]", "Deafen Members"),
    ("/undeafen [reason]", "Deafen Members"),
    ("/move channel", "Move Members"),
    ("/disconnect", "Move Members"),
];

impl DashboardRenderer {
    pub fn new(initial_mode: IntentsMode) -> Self {
        Self {
            privileged: initial_mode.is_privileged(),
            confirm_ban: false,
        }
    }

    pub fn render(&mut self, ctx: &egui::Context, state: &DashboardState<'_>) -> Option<UIEvent> {
        let mut event = None;

        egui::CentralPanel::default().show(ctx, |ui| {
            ScrollArea::vertical().show(ui, |ui| {
                ui.heading("wardenbot");
                ui.add_space(SECTION_SPACING);

                if let Some(e) = self.render_connection(ui, state) {
                    event = Some(e);
                }
                ui.add_space(SECTION_SPACING);

                if let Some(e) = self.render_actions(ui, state) {
                    event = Some(e);
                }
                ui.add_space(SECTION_SPACING);

                render_outcome(ui, state);
                ui.add_space(SECTION_SPACING);

                render_help(ui, state);
            });
        });

        if self.confirm_ban {
            if let Some(e) = self.render_ban_confirmation(ctx, state) {
                event = Some(e);
            }
        }

        event
    }

    fn render_connection(&mut self, ui: &mut egui::Ui, state: &DashboardState<'_>) -> Option<UIEvent> {
        let mut event = None;

        ui.group(|ui| {
            ui.label(RichText::new("Bot").strong());

            ui.horizontal(|ui| {
                let (color, text) = worker_badge(&state.worker);
                let (rect, _) = ui.allocate_exact_size(
                    Vec2::splat(STATUS_DOT_RADIUS * 2.0),
                    Sense::hover(),
                );
                ui.painter().circle_filled(rect.center(), STATUS_DOT_RADIUS, color);
                ui.label(text);
            });

            if !state.status.identity.is_empty() {
                ui.label(format!("Logged in as {}", state.status.identity));
            }
            if let Some(client_id) = state.client_id {
                ui.label(RichText::new(format!("Client ID: {client_id}")).small());
            }
            if !state.status.last_error.is_empty() {
                ui.label(RichText::new(&state.status.last_error).color(Color32::LIGHT_RED));
            }

            ui.add_space(4.0);
            ui.checkbox(&mut self.privileged, "Elevated membership access (Server Members intent)");

            ui.horizontal(|ui| {
                let mode = IntentsMode::from_flag(self.privileged);
                let label = match (&state.worker, state.running_mode) {
                    (WorkerState::NotStarted | WorkerState::Terminated(_), _) => "▶ Start bot",
                    (_, Some(running)) if running != mode => "🔄 Restart with new intents",
                    _ => "▶ Start bot (running)",
                };
                if ui.button(label).clicked() {
                    event = Some(UIEvent::Start(mode));
                }
            });

            if let Some(notice) = state.notice {
                ui.label(RichText::new(notice).small().italics());
            }
        });

        event
    }

    fn render_actions(&mut self, ui: &mut egui::Ui, state: &DashboardState<'_>) -> Option<UIEvent> {
        let mut event = None;

        ui.group(|ui| {
            ui.label(RichText::new("Actions").strong());
            match state.target {
                Some(target) => {
                    ui.label(format!("Target <@{}> in guild {}", target.user_id, target.guild_id));
                }
                None => {
                    ui.label(
                        RichText::new("Set GUILD_ID and TARGET_USER_ID to enable these buttons.")
                            .color(Color32::YELLOW),
                    );
                }
            }

            ui.label(
                RichText::new(format!(
                    "Each action waits up to {}s for Discord.",
                    state.action_timeout.as_secs()
                ))
                .small(),
            );

            let enabled = state.target.is_some() && state.status.connected;
            ui.horizontal_wrapped(|ui| {
                for (label, action) in DASHBOARD_ACTIONS {
                    let button = egui::Button::new(label)
                        .min_size(Vec2::new(ACTION_BUTTON_WIDTH, ACTION_BUTTON_HEIGHT));
                    if ui.add_enabled(enabled, button).clicked() {
                        if action == ModerationAction::Ban {
                            self.confirm_ban = true;
                        } else {
                            event = Some(UIEvent::Action(action));
                        }
                    }
                }
            });
        });

        event
    }

    fn render_ban_confirmation(
        &mut self,
        ctx: &egui::Context,
        state: &DashboardState<'_>,
    ) -> Option<UIEvent> {
        let mut event = None;
        let target = state
            .target
            .map(|t| format!("<@{}>", t.user_id))
            .unwrap_or_else(|| "the target".to_string());

        egui::Window::new("Confirm ban")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(format!("Really ban {target}?"));
                ui.horizontal(|ui| {
                    if ui.button("Confirm ban").clicked() {
                        event = Some(UIEvent::Action(ModerationAction::Ban));
                        self.confirm_ban = false;
                    }
                    if ui.button("Cancel").clicked() {
                        self.confirm_ban = false;
                    }
                });
            });

        event
    }
}

fn worker_badge(state: &WorkerState) -> (Color32, String) {
    match state {
        WorkerState::NotStarted => (Color32::GRAY, "Not started".to_string()),
        WorkerState::Starting => (Color32::YELLOW, "Connecting…".to_string()),
        WorkerState::Connected => (Color32::GREEN, "Connected".to_string()),
        WorkerState::Disconnected => (Color32::from_rgb(255, 165, 0), "Disconnected, waiting for resume".to_string()),
        WorkerState::Terminated(reason) => (Color32::RED, format!("Stopped: {reason}")),
    }
}

fn render_outcome(ui: &mut egui::Ui, state: &DashboardState<'_>) {
    ui.group(|ui| {
        ui.label(RichText::new("Last result").strong());
        match state.last_outcome {
            Some(outcome) if outcome.ok => {
                ui.label(RichText::new(&outcome.message).color(Color32::GREEN));
            }
            Some(outcome) => {
                ui.label(RichText::new(&outcome.message).color(Color32::LIGHT_RED));
            }
            None => {
                ui.label(RichText::new("Nothing yet").weak());
            }
        }
    });
}

fn render_help(ui: &mut egui::Ui, state: &DashboardState<'_>) {
    egui::CollapsingHeader::new("Help").show(ui, |ui| {
        ui.label("Slash commands, with the permission each one needs:");
        egui::Grid::new("help_commands").striped(true).show(ui, |ui| {
            for (command, permission) in HELP_COMMANDS {
                ui.monospace(command);
                ui.label(permission);
                ui.end_row();
            }
        });
        ui.add_space(4.0);
        if state.target.is_some() {
            ui.label("Commands are locked to the configured member.");
        } else {
            ui.label("Commands take a required `member` option.");
        }
        ui.label(
            RichText::new(
                "The bot role must sit above the target's highest role. Elevated membership \
                 access also has to be enabled under Bot -> Privileged Gateway Intents.",
            )
            .small()
            .italics(),
        );
    });
}
