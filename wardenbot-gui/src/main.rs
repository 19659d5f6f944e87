#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod dashboard;
mod layout_constants;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use eframe::egui;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use wardenbot_common::models::IntentsMode;
use wardenbot_core::platforms::discord::DiscordWorkerFactory;
use wardenbot_core::{BotConfig, InvokeOutcome, StartOutcome, WorkerSupervisor};

use dashboard::{DashboardRenderer, DashboardState, UIEvent};
use layout_constants::*;

#[derive(Parser, Debug, Clone)]
#[command(name = "wardenbot")]
#[command(author, version, about = "wardenbot - Discord moderation dashboard")]
struct Args {
    /// Start with the Server Members intent requested
    #[arg(long)]
    privileged_intents: Option<bool>,

    /// Seconds a dashboard action may take before it is abandoned
    #[arg(long)]
    timeout_secs: Option<u64>,
}

struct DashboardApp {
    supervisor: WorkerSupervisor<DiscordWorkerFactory>,
    renderer: DashboardRenderer,
    client_id: Option<String>,
    last_outcome: Option<InvokeOutcome>,
    notice: Option<String>,
}

impl DashboardApp {
    fn new(config: BotConfig) -> Self {
        let renderer = DashboardRenderer::new(config.intents_mode);
        let client_id = config.client_id.clone();
        Self {
            supervisor: WorkerSupervisor::from_config(config),
            renderer,
            client_id,
            last_outcome: None,
            notice: None,
        }
    }

    fn start(&mut self, mode: IntentsMode) {
        self.notice = Some(match self.supervisor.start(mode) {
            Ok(StartOutcome::Started) => format!("Bot starting with {mode} intents."),
            Ok(StartOutcome::AlreadyRunning) => "Bot is already running.".to_string(),
            Ok(StartOutcome::Restarted) => format!("Bot restarted with {mode} intents."),
            Err(e) => {
                error!("Could not start the bot: {e}");
                format!("Could not start the bot: {e}")
            }
        });
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let state = DashboardState {
            worker: self.supervisor.state(),
            status: self.supervisor.status(),
            running_mode: self.supervisor.mode(),
            target: self.supervisor.target(),
            client_id: self.client_id.as_deref(),
            last_outcome: self.last_outcome.as_ref(),
            notice: self.notice.as_deref(),
            action_timeout: self.supervisor.invoker().timeout(),
        };

        match self.renderer.render(ctx, &state) {
            Some(UIEvent::Start(mode)) => self.start(mode),
            Some(UIEvent::Action(action)) => {
                let outcome = self.supervisor.run_action(action);
                if outcome.ok {
                    info!("{}: {}", action.name(), outcome.message);
                } else {
                    warn!("{} failed: {}", action.name(), outcome.message);
                }
                self.last_outcome = Some(outcome);
            }
            None => {}
        }

        ctx.request_repaint_after(Duration::from_millis(STATUS_POLL_MS));
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        info!("Window closing; stopping the bot");
        self.supervisor.stop();
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("wardenbot_gui=info,wardenbot_core=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = BotConfig::from_env()?;
    if let Some(privileged) = args.privileged_intents {
        config.intents_mode = IntentsMode::from_flag(privileged);
    }
    if let Some(secs) = args.timeout_secs.filter(|s| *s > 0) {
        config.invoke_timeout = Duration::from_secs(secs);
    }
    info!("Loaded configuration: {config:?}");

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("wardenbot")
            .with_inner_size([WINDOW_WIDTH, WINDOW_HEIGHT])
            .with_min_inner_size([MIN_WINDOW_WIDTH, MIN_WINDOW_HEIGHT]),
        ..Default::default()
    };

    eframe::run_native(
        "wardenbot",
        native_options,
        Box::new(|_cc| Ok(Box::new(DashboardApp::new(config)))),
    )
    .map_err(|e| anyhow::anyhow!("eframe error: {e}"))?;

    info!("Application exited normally");
    Ok(())
}
