//! Engine Channels
//!
//! Communication between the UI thread and the scope engine thread.
//! Commands travel over an unbounded tokio mpsc queue so the UI never
//! blocks; the engine awaits them alongside its timers. Events travel the
//! other way and are polled by the UI once per frame.

use std::collections::HashMap;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::commands::{ScopeCommand, ScopeEvent};
use crate::error::{ScopeError, ScopeResult};

/// Holds both directions of communication channels.
/// Split into handles for the two threads.
pub struct EngineChannels {
    command_tx: UnboundedSender<ScopeCommand>,
    command_rx: UnboundedReceiver<ScopeCommand>,
    event_tx: UnboundedSender<ScopeEvent>,
    event_rx: UnboundedReceiver<ScopeEvent>,
}

impl EngineChannels {
    pub fn new() -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            command_tx,
            command_rx,
            event_tx,
            event_rx,
        }
    }

    /// Split the channels into UI-side and engine-side handles.
    pub fn split(self) -> (UiHandle, EngineHandle) {
        let ui = UiHandle {
            command_tx: self.command_tx,
            event_rx: self.event_rx,
        };
        let engine = EngineHandle {
            command_rx: self.command_rx,
            event_tx: EventSender(self.event_tx),
        };
        (ui, engine)
    }
}

impl Default for EngineChannels {
    fn default() -> Self {
        Self::new()
    }
}

/// UI-side handle: sends commands, polls events.
pub struct UiHandle {
    command_tx: UnboundedSender<ScopeCommand>,
    event_rx: UnboundedReceiver<ScopeEvent>,
}

impl UiHandle {
    /// Queue a command. Fails only once the engine has exited.
    pub fn send_command(&self, cmd: ScopeCommand) -> ScopeResult<()> {
        self.command_tx
            .send(cmd)
            .map_err(|_| ScopeError::EngineStopped)
    }

    /// Receive an event if one is pending. Never blocks.
    pub fn recv_event(&mut self) -> Option<ScopeEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Drain all pending events from the engine.
    pub fn drain_events(&mut self) -> impl Iterator<Item = ScopeEvent> + '_ {
        std::iter::from_fn(|| self.recv_event())
    }
}

/// Engine-side handle: receives command batches, hands out event senders.
pub struct EngineHandle {
    command_rx: UnboundedReceiver<ScopeCommand>,
    event_tx: EventSender,
}

impl EngineHandle {
    /// Wait for the next command, then take everything else already
    /// queued behind it and coalesce the batch.
    ///
    /// Returns `None` once every UI handle is gone. Cancel safe.
    pub async fn next_batch(&mut self) -> Option<Vec<ScopeCommand>> {
        let first = self.command_rx.recv().await?;
        let mut batch = vec![first];
        while let Ok(next) = self.command_rx.try_recv() {
            batch.push(next);
        }
        Some(coalesce(batch))
    }

    pub fn event_sender(&self) -> EventSender {
        self.event_tx.clone()
    }
}

/// Sends events to the UI. Losing the UI is not an error for the engine,
/// so sends never fail.
#[derive(Clone)]
pub struct EventSender(UnboundedSender<ScopeEvent>);

impl EventSender {
    pub fn send(&self, event: ScopeEvent) {
        if self.0.send(event).is_err() {
            tracing::trace!("event dropped, UI handle is gone");
        }
    }
}

/// Keep only the last command of each coalescable kind, preserving the
/// relative order of everything that survives.
pub(crate) fn coalesce(batch: Vec<ScopeCommand>) -> Vec<ScopeCommand> {
    let mut last: HashMap<u8, usize> = HashMap::new();
    for (index, cmd) in batch.iter().enumerate() {
        if let Some(key) = cmd.coalesce_key() {
            last.insert(key, index);
        }
    }

    let before = batch.len();
    let kept: Vec<ScopeCommand> = batch
        .into_iter()
        .enumerate()
        .filter(|(index, cmd)| {
            cmd.coalesce_key()
                .map_or(true, |key| last.get(&key) == Some(index))
        })
        .map(|(_, cmd)| cmd)
        .collect();

    if kept.len() < before {
        tracing::debug!(queued = before, kept = kept.len(), "coalesced queued commands");
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::SignalParameters;
    use crate::engine::DisplayId;

    fn params(frequency: f64) -> SignalParameters {
        SignalParameters::new(3.0, frequency, 0.0).unwrap()
    }

    #[test]
    fn test_command_send_receive() {
        let (ui, mut engine) = EngineChannels::new().split();
        ui.send_command(ScopeCommand::Shutdown).unwrap();
        assert_eq!(engine.command_rx.try_recv().unwrap(), ScopeCommand::Shutdown);
    }

    #[test]
    fn test_event_send_receive() {
        let (mut ui, engine) = EngineChannels::new().split();
        engine.event_sender().send(ScopeEvent::Stopped);
        assert_eq!(ui.recv_event(), Some(ScopeEvent::Stopped));
        assert_eq!(ui.recv_event(), None);
    }

    #[test]
    fn test_send_after_engine_dropped() {
        let (ui, engine) = EngineChannels::new().split();
        drop(engine);
        assert!(matches!(
            ui.send_command(ScopeCommand::Shutdown),
            Err(ScopeError::EngineStopped)
        ));
    }

    #[test]
    fn test_event_send_without_ui_is_silent() {
        let (ui, engine) = EngineChannels::new().split();
        drop(ui);
        engine.event_sender().send(ScopeEvent::Stopped);
    }

    #[test]
    fn test_drain_events() {
        let (mut ui, engine) = EngineChannels::new().split();
        let events = engine.event_sender();
        events.send(ScopeEvent::SurfaceReady(DisplayId::Carrier));
        events.send(ScopeEvent::Rejected("bad".into()));
        events.send(ScopeEvent::Stopped);

        let drained: Vec<_> = ui.drain_events().collect();
        assert_eq!(drained.len(), 3);
        assert!(ui.recv_event().is_none());
    }

    #[test]
    fn test_coalesce_keeps_last_of_each_kind() {
        let batch = vec![
            ScopeCommand::SetCarrier(params(10.0)),
            ScopeCommand::Teardown(DisplayId::Modulating),
            ScopeCommand::SetCarrier(params(20.0)),
            ScopeCommand::SetModulating(params(5.0)),
            ScopeCommand::SetCarrier(params(30.0)),
        ];
        let kept = coalesce(batch);
        assert_eq!(
            kept,
            vec![
                ScopeCommand::Teardown(DisplayId::Modulating),
                ScopeCommand::SetModulating(params(5.0)),
                ScopeCommand::SetCarrier(params(30.0)),
            ]
        );
    }

    #[test]
    fn test_coalesce_keeps_lifecycle_commands() {
        let batch = vec![
            ScopeCommand::Teardown(DisplayId::Carrier),
            ScopeCommand::Attach(DisplayId::Carrier),
            ScopeCommand::Teardown(DisplayId::Carrier),
        ];
        assert_eq!(coalesce(batch.clone()), batch);
    }

    #[tokio::test]
    async fn test_next_batch_drains_queue() {
        let (ui, mut engine) = EngineChannels::new().split();
        ui.send_command(ScopeCommand::SetCarrier(params(10.0))).unwrap();
        ui.send_command(ScopeCommand::SetCarrier(params(20.0))).unwrap();
        ui.send_command(ScopeCommand::Shutdown).unwrap();

        let batch = engine.next_batch().await.unwrap();
        assert_eq!(
            batch,
            vec![
                ScopeCommand::SetCarrier(params(20.0)),
                ScopeCommand::Shutdown
            ]
        );

        drop(ui);
        assert!(engine.next_batch().await.is_none());
    }
}
