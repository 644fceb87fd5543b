//! TUI Runner - main loop that owns the terminal and the network tasks
//!
//! The runner draws the App, routes terminal events into it, spawns the
//! requests it queues, and feeds their completions back in. The App never
//! sees the network directly.

use std::sync::Arc;
use std::time::Duration;

use eyre::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::Tui;
use super::app::App;
use super::events::{Event, EventHandler};
use super::views;
use crate::api::ChurnApi;
use crate::workflow::Completion;

/// TUI Runner that manages the terminal and event loop
pub struct TuiRunner {
    app: App,
    terminal: Tui,
    event_handler: EventHandler,
    api: Arc<dyn ChurnApi>,
    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: mpsc::UnboundedReceiver<Completion>,
}

impl TuiRunner {
    pub fn new(terminal: Tui, app: App, api: Arc<dyn ChurnApi>, tick_rate: Duration) -> Self {
        debug!(?tick_rate, "TuiRunner::new: called");
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        Self {
            app,
            terminal,
            event_handler: EventHandler::new(tick_rate),
            api,
            completion_tx,
            completion_rx,
        }
    }

    /// Run until the user quits
    pub async fn run(&mut self) -> Result<()> {
        debug!("TuiRunner::run: entering main loop");
        loop {
            self.terminal.draw(|frame| views::render(&self.app, frame))?;

            tokio::select! {
                event = self.event_handler.next() => {
                    match event? {
                        Event::Tick => self.app.tick(),
                        Event::Key(key) => {
                            if self.app.handle_key(key) {
                                break;
                            }
                        }
                        Event::Resize(width, height) => {
                            debug!(width, height, "TuiRunner::run: resize");
                        }
                    }
                }
                Some(completion) = self.completion_rx.recv() => {
                    self.app.handle_completion(completion);
                }
            }

            self.dispatch_requests();

            if self.app.state().should_quit {
                debug!("TuiRunner::run: should_quit is true, breaking");
                break;
            }
        }

        info!("TUI exiting");
        Ok(())
    }

    /// Spawn every request the App queued; each reports back on the channel
    fn dispatch_requests(&mut self) {
        for request in self.app.take_requests() {
            debug!(?request, "TuiRunner::dispatch_requests: spawning");
            let api = Arc::clone(&self.api);
            let tx = self.completion_tx.clone();
            let token = self.app.session_reader().token();
            tokio::spawn(async move {
                if let Some(completion) = request.perform(api, token).await {
                    let _ = tx.send(completion);
                }
            });
        }
    }
}
