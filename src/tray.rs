use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use tray_icon::menu::{Menu, MenuEvent, MenuId, MenuItem};
use tray_icon::{Icon, TrayIcon, TrayIconBuilder};

use crate::error::TrayError;
use crate::server::{Command, Flow, MenuState, ServerController};

const START_ID: &str = "start-server";
const STOP_ID: &str = "stop-server";
const EXIT_ID: &str = "exit";

/// The tray icon plus the menu items whose enablement follows the server state.
pub struct Tray {
    _icon: TrayIcon,
    start_item: MenuItem,
    stop_item: MenuItem,
}

impl Tray {
    pub fn sync(&self, menu: MenuState) {
        self.start_item.set_enabled(menu.start_enabled);
        self.stop_item.set_enabled(menu.stop_enabled);
    }
}

/// Create a simple 16x16 blue icon for the system tray.
fn create_default_icon() -> Result<Icon, TrayError> {
    let size = 16u32;
    let mut rgba = Vec::with_capacity((size * size * 4) as usize);
    for _ in 0..size * size {
        rgba.extend_from_slice(&[40, 90, 200, 255]);
    }
    Ok(Icon::from_rgba(rgba, size, size)?)
}

pub fn command_for(id: &MenuId) -> Option<Command> {
    match id.0.as_str() {
        START_ID => Some(Command::Start),
        STOP_ID => Some(Command::Stop),
        EXIT_ID => Some(Command::Exit),
        _ => None,
    }
}

/// Build the tray icon with Start Server / Stop Server / Exit.
pub fn build_tray(menu: MenuState) -> Result<Tray, TrayError> {
    let start_item = MenuItem::with_id(START_ID, "Start Server", menu.start_enabled, None);
    let stop_item = MenuItem::with_id(STOP_ID, "Stop Server", menu.stop_enabled, None);
    let exit_item = MenuItem::with_id(EXIT_ID, "Exit", true, None);

    let tray_menu = Menu::new();
    tray_menu.append(&start_item)?;
    tray_menu.append(&stop_item)?;
    tray_menu.append(&exit_item)?;

    let icon = TrayIconBuilder::new()
        .with_menu(Box::new(tray_menu))
        .with_tooltip("Item Tray")
        .with_icon(create_default_icon()?)
        .build()?;

    Ok(Tray {
        _icon: icon,
        start_item,
        stop_item,
    })
}

/// Forward menu clicks to the controller from a background thread.
/// Raises `exit_requested` and returns once Exit has been handled.
pub fn start_menu_listener(
    controller: Arc<ServerController>,
    exit_requested: Arc<AtomicBool>,
    ctx: eframe::egui::Context,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        while let Ok(event) = MenuEvent::receiver().recv() {
            let Some(command) = command_for(event.id()) else {
                continue;
            };
            tracing::debug!("Tray command {:?}", command);
            let flow = controller.dispatch(command);
            if flow == Flow::Exit {
                exit_requested.store(true, Ordering::SeqCst);
            }
            ctx.request_repaint();
            if flow == Flow::Exit {
                break;
            }
        }
    })
}
