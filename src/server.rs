//! Start/stop lifecycle for the embedded HTTP listener.
//!
//! The listener runs on its own thread with its own tokio runtime so the UI
//! event loop never waits on it. `running` is shared with that thread so a
//! failed listener can flip it back to false on its own.

use std::net::SocketAddr;
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use chrono::{DateTime, Local};
use tokio::sync::oneshot;

use crate::api;
use crate::config::Config;
use crate::error::ServerError;
use crate::store::ItemStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Exit,
}

/// What the UI should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuState {
    pub start_enabled: bool,
    pub stop_enabled: bool,
}

struct Worker {
    shutdown: oneshot::Sender<()>,
    done: mpsc::Receiver<()>,
    thread: thread::JoinHandle<()>,
}

#[derive(Default)]
struct State {
    running: bool,
    /// Bumped on every start; a worker only touches state while it is current.
    generation: u64,
    local_addr: Option<SocketAddr>,
    started_at: Option<DateTime<Local>>,
    worker: Option<Worker>,
}

type SharedState = Arc<Mutex<State>>;

fn lock(state: &SharedState) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct ServerController {
    config: Config,
    store: Arc<ItemStore>,
    state: SharedState,
}

impl ServerController {
    pub fn new(config: Config, store: Arc<ItemStore>) -> Self {
        Self {
            config,
            store,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    pub fn dispatch(&self, command: Command) -> Flow {
        match command {
            Command::Start => {
                if let Err(e) = self.start() {
                    tracing::error!("Could not start server: {e}");
                }
                Flow::Continue
            }
            Command::Stop => {
                self.stop();
                Flow::Continue
            }
            Command::Exit => {
                self.stop();
                Flow::Exit
            }
        }
    }

    /// Launch the listener. Returns `Ok(false)` if it was already running.
    pub fn start(&self) -> Result<bool, ServerError> {
        let mut state = lock(&self.state);
        if state.running {
            return Ok(false);
        }
        state.running = true;
        state.generation += 1;
        state.local_addr = None;
        state.started_at = Some(Local::now());

        let generation = state.generation;
        let addr = self.config.listen_addr();
        let router = api::router(Arc::clone(&self.store), &self.config.static_dir);
        let shared = Arc::clone(&self.state);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (done_tx, done_rx) = mpsc::channel();

        tracing::info!("Starting HTTP server on {addr}");
        let spawned = thread::Builder::new()
            .name("item-tray-http".into())
            .spawn(move || {
                let result = run_listener(addr, router, shutdown_rx, &shared, generation);
                let mut state = lock(&shared);
                if state.generation == generation {
                    if let Err(e) = &result {
                        tracing::error!("Error in server thread: {e}");
                    } else if state.running {
                        tracing::warn!("HTTP server exited without a stop request");
                    }
                    state.running = false;
                    state.local_addr = None;
                    state.started_at = None;
                }
                drop(state);
                let _ = done_tx.send(());
            });

        match spawned {
            Ok(thread) => {
                state.worker = Some(Worker {
                    shutdown: shutdown_tx,
                    done: done_rx,
                    thread,
                });
                Ok(true)
            }
            Err(e) => {
                state.running = false;
                state.started_at = None;
                Err(ServerError::Spawn(e))
            }
        }
    }

    /// Signal the listener to shut down and wait for it, bounded by the
    /// configured stop timeout. Returns `false` if it was not running.
    pub fn stop(&self) -> bool {
        let worker = {
            let mut state = lock(&self.state);
            if !state.running {
                return false;
            }
            state.running = false;
            state.local_addr = None;
            state.started_at = None;
            state.worker.take()
        };

        tracing::info!("Stopping HTTP server");
        let Some(worker) = worker else {
            return true;
        };
        let _ = worker.shutdown.send(());

        let timeout = self.config.stop_timeout();
        match worker.done.recv_timeout(timeout) {
            Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => {
                if worker.thread.join().is_err() {
                    tracing::error!("HTTP server thread panicked");
                }
                tracing::info!("HTTP server stopped");
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::warn!("HTTP server did not stop within {timeout:?}, detaching");
            }
        }
        true
    }

    pub fn is_running(&self) -> bool {
        lock(&self.state).running
    }

    /// The bound address, once the listener socket is open.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        lock(&self.state).local_addr
    }

    pub fn started_at(&self) -> Option<DateTime<Local>> {
        lock(&self.state).started_at
    }

    pub fn menu_state(&self) -> MenuState {
        let running = self.is_running();
        MenuState {
            start_enabled: !running,
            stop_enabled: running,
        }
    }

    pub fn store(&self) -> &Arc<ItemStore> {
        &self.store
    }
}

fn run_listener(
    addr: SocketAddr,
    router: axum::Router,
    shutdown: oneshot::Receiver<()>,
    shared: &SharedState,
    generation: u64,
) -> Result<(), ServerError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(ServerError::Runtime)?;

    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        let local_addr = listener.local_addr().map_err(ServerError::Serve)?;

        {
            let mut state = lock(shared);
            if state.generation == generation && state.running {
                state.local_addr = Some(local_addr);
            }
        }
        tracing::info!("HTTP server listening on http://{local_addr}");

        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = shutdown.await;
            })
            .await
            .map_err(ServerError::Serve)
    })
}
