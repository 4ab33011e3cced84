use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use eframe::egui;

use crate::server::{Command, Flow, MenuState, ServerController};
use crate::tray::{self, Tray};

/// Status window hosting the tray icon on the UI thread.
pub struct ItemTrayApp {
    controller: Arc<ServerController>,
    exit_requested: Arc<AtomicBool>,
    initialized: bool,
    tray: Option<Tray>,
    synced_menu: Option<MenuState>,
}

impl ItemTrayApp {
    pub fn new(controller: Arc<ServerController>) -> Self {
        Self {
            controller,
            exit_requested: Arc::new(AtomicBool::new(false)),
            initialized: false,
            tray: None,
            synced_menu: None,
        }
    }

    fn run(&self, command: Command, ctx: &egui::Context) {
        if self.controller.dispatch(command) == Flow::Exit {
            self.exit_requested.store(true, Ordering::SeqCst);
        }
        ctx.request_repaint();
    }

    fn sync_menu(&mut self, menu: MenuState) {
        if self.synced_menu == Some(menu) {
            return;
        }
        if let Some(tray) = &self.tray {
            tray.sync(menu);
        }
        self.synced_menu = Some(menu);
    }
}

impl eframe::App for ItemTrayApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // The tray needs the event loop, so build it on the first frame
        if !self.initialized {
            self.initialized = true;
            match tray::build_tray(self.controller.menu_state()) {
                Ok(tray) => {
                    tray::start_menu_listener(
                        Arc::clone(&self.controller),
                        Arc::clone(&self.exit_requested),
                        ctx.clone(),
                    );
                    self.tray = Some(tray);
                }
                Err(e) => tracing::error!("Tray unavailable, window controls only: {e}"),
            }
        }

        // The worker can flip `running` on its own, so keep polling
        ctx.request_repaint_after(Duration::from_millis(250));

        if ctx.input(|i| i.viewport().close_requested()) {
            self.run(Command::Exit, ctx);
        }

        if self.exit_requested.load(Ordering::SeqCst) {
            self.tray = None;
            tracing::info!("Exiting");
            std::process::exit(0);
        }

        let menu = self.controller.menu_state();
        self.sync_menu(menu);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Item Tray");
            ui.separator();

            if self.controller.is_running() {
                match self.controller.local_addr() {
                    Some(addr) => ui.label(format!("Running on http://{addr}")),
                    None => ui.label("Starting..."),
                };
                if let Some(started) = self.controller.started_at() {
                    ui.label(format!("Since {}", started.format("%Y-%m-%d %H:%M:%S")));
                }
            } else {
                ui.label("Stopped");
            }
            let store = self.controller.store();
            if store.is_empty() {
                ui.label("No items yet");
            } else {
                ui.label(format!("Items: {}", store.len()));
            }

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(menu.start_enabled, egui::Button::new("Start Server"))
                    .clicked()
                {
                    self.run(Command::Start, ctx);
                }
                if ui
                    .add_enabled(menu.stop_enabled, egui::Button::new("Stop Server"))
                    .clicked()
                {
                    self.run(Command::Stop, ctx);
                }
                if ui.button("Exit").clicked() {
                    self.run(Command::Exit, ctx);
                }
            });
        });
    }
}
