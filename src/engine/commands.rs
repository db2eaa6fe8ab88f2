//! Engine Commands and Events
//!
//! Defines the messages that flow between the UI thread and the scope
//! engine thread. All types here are Send + 'static.

use super::displays::DisplayId;
use crate::backend::{AnalogRequest, DigitalRequest};
use crate::dsp::SignalParameters;

/// Commands sent from the UI thread to the scope engine.
#[derive(Debug, Clone, PartialEq)]
pub enum ScopeCommand {
    /// Start waiting for a display's surface (again, after a teardown).
    Attach(DisplayId),

    /// Restart the carrier oscilloscope with new parameters.
    SetCarrier(SignalParameters),

    /// Restart the modulating oscilloscope with new parameters.
    SetModulating(SignalParameters),

    /// Ask the backend for an AM/FM/PM waveform.
    RequestAnalog(AnalogRequest),

    /// Ask the backend for an ASK/FSK/PSK waveform.
    RequestDigital(DigitalRequest),

    /// Stop a display: cancel its readiness wait and timer, release its
    /// surface.
    Teardown(DisplayId),

    /// Tear everything down and exit the engine thread.
    Shutdown,
}

impl ScopeCommand {
    /// Commands of the same kind that only the latest instance matters for.
    /// Earlier ones in a queued batch are dropped.
    pub(crate) fn coalesce_key(&self) -> Option<u8> {
        match self {
            ScopeCommand::SetCarrier(_) => Some(0),
            ScopeCommand::SetModulating(_) => Some(1),
            ScopeCommand::RequestAnalog(_) => Some(2),
            ScopeCommand::RequestDigital(_) => Some(3),
            ScopeCommand::Attach(_) | ScopeCommand::Teardown(_) | ScopeCommand::Shutdown => None,
        }
    }
}

/// Events sent from the scope engine to the UI thread.
#[derive(Debug, Clone, PartialEq)]
pub enum ScopeEvent {
    /// A display's surface was created and configured.
    SurfaceReady(DisplayId),

    /// A scrolling display restarted with new parameters.
    ScrollStarted {
        display: DisplayId,
        params: SignalParameters,
    },

    /// The analog modulated display was refreshed.
    AnalogRendered {
        /// Points shown after clipping.
        points: usize,
    },

    /// The digital displays were refreshed.
    DigitalRendered {
        /// The bits the backend actually modulated.
        bits: Vec<u8>,
    },

    /// Parameters were rejected before reaching a display.
    Rejected(String),

    /// The backend failed; displays keep their last data.
    BackendError(String),

    /// The engine loop has exited.
    Stopped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_debug() {
        let cmd = ScopeCommand::Teardown(DisplayId::Carrier);
        assert!(format!("{:?}", cmd).contains("Teardown"));
    }

    #[test]
    fn test_coalesce_keys() {
        let carrier = ScopeCommand::SetCarrier(SignalParameters::CARRIER);
        let modulating = ScopeCommand::SetModulating(SignalParameters::MODULATING);
        assert!(carrier.coalesce_key().is_some());
        assert_ne!(carrier.coalesce_key(), modulating.coalesce_key());
        assert_eq!(ScopeCommand::Shutdown.coalesce_key(), None);
        assert_eq!(ScopeCommand::Attach(DisplayId::Carrier).coalesce_key(), None);
    }

    #[test]
    fn test_event_clone() {
        let event = ScopeEvent::DigitalRendered {
            bits: vec![1, 0, 1],
        };
        let cloned = event.clone();
        if let ScopeEvent::DigitalRendered { bits } = cloned {
            assert_eq!(bits, vec![1, 0, 1]);
        } else {
            panic!("Clone failed");
        }
    }
}
