//! Console engine
//!
//! Owns the state and the message channel. Each message is reduced, the
//! resulting command is handed to the executor, and foreground commands
//! (the note editor) run inline with the terminal released.

use std::sync::Arc;

use tokio::sync::mpsc;

use super::command::Cmd;
use super::executor::Executor;
use super::message::Msg;
use super::state::State;
use super::update::update;
use crate::editor::{EditRequest, NoteEditor};
use crate::launcher::ProcessSpawner;
use crate::pagerduty::IncidentService;

/// Gives the terminal to a foreground program and takes it back
pub trait TerminalHandover {
    fn release(&mut self) -> std::io::Result<()>;
    fn restore(&mut self) -> std::io::Result<()>;
}

/// Handover for running without a terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct Detached;

impl TerminalHandover for Detached {
    fn release(&mut self) -> std::io::Result<()> {
        Ok(())
    }

    fn restore(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

pub struct Console {
    state: State,
    executor: Executor,
    editor: Arc<dyn NoteEditor>,
    tx: mpsc::UnboundedSender<Msg>,
    rx: mpsc::UnboundedReceiver<Msg>,
}

impl Console {
    pub fn new(
        state: State,
        service: Arc<dyn IncidentService>,
        spawner: Arc<dyn ProcessSpawner>,
        editor: Arc<dyn NoteEditor>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            state,
            executor: Executor::new(service, spawner, tx.clone()),
            editor,
            tx,
            rx,
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Sender for messages produced outside the engine (input, scheduler)
    pub fn sender(&self) -> mpsc::UnboundedSender<Msg> {
        self.tx.clone()
    }

    /// Load the current user, then the incident list
    pub fn init(&mut self) {
        tracing::info!("Starting console");
        self.executor.spawn(Cmd::Sequence(vec![
            Cmd::FetchCurrentUser,
            Cmd::Emit(Msg::RefreshIncidentList),
        ]));
    }

    /// Reduce one message and start its command
    ///
    /// Returns the editor request when the command needs the terminal.
    pub fn dispatch(&mut self, msg: Msg) -> Option<EditRequest> {
        let cmd = update(&mut self.state, msg)?;
        self.execute(cmd)
    }

    fn execute(&mut self, cmd: Cmd) -> Option<EditRequest> {
        match cmd {
            Cmd::OpenEditor(request) => Some(request),
            Cmd::Batch(cmds) => cmds
                .into_iter()
                .filter_map(|cmd| self.execute(cmd))
                .last(),
            cmd => {
                self.executor.spawn(cmd);
                None
            }
        }
    }

    /// Process a message, running the editor through `handover` if asked to
    pub fn process_with(
        &mut self,
        msg: Msg,
        handover: &mut dyn TerminalHandover,
    ) -> std::io::Result<()> {
        let Some(request) = self.dispatch(msg) else {
            return Ok(());
        };

        handover.release()?;
        let result = self.editor.edit(&request);
        let restored = handover.restore();

        // The note is submitted even when the terminal could not be restored
        if let Err(e) = &result {
            tracing::warn!("Editor for incident {} failed: {}", request.incident_id, e);
        }
        if self.dispatch(Msg::EditorFinished(result)).is_some() {
            tracing::warn!("Editor finished with another editor request, ignoring it");
        }
        if let Err(e) = &restored {
            tracing::error!("Failed to restore terminal after editing: {}", e);
        }
        restored
    }

    /// Process a message without a terminal
    pub fn process(&mut self, msg: Msg) {
        if let Err(e) = self.process_with(msg, &mut Detached) {
            tracing::error!("Failed to process message: {}", e);
        }
    }

    /// Process every queued message; returns how many were handled
    pub fn drain_with(&mut self, handover: &mut dyn TerminalHandover) -> std::io::Result<usize> {
        let mut handled = 0;
        while let Ok(msg) = self.rx.try_recv() {
            self.process_with(msg, handover)?;
            handled += 1;
        }
        Ok(handled)
    }

    pub fn drain(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(msg) = self.rx.try_recv() {
            self.process(msg);
            handled += 1;
        }
        handled
    }

    /// Process messages as they arrive until `done` holds
    pub async fn run_until(&mut self, mut done: impl FnMut(&State) -> bool) {
        while !done(&self.state) {
            match self.rx.recv().await {
                Some(msg) => self.process(msg),
                None => break,
            }
        }
    }

    pub fn should_quit(&self) -> bool {
        self.state.should_quit
    }
}
