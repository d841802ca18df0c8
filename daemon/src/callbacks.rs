use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::engine::EngineError;
use crate::processor::MatchReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Start,
    End,
    Error,
    ErrorNetwork,
    ErrorPermissionBlocked,
    ErrorPermissionDenied,
    SoundStart,
    SoundEnd,
    Result,
    ResultMatch,
    ResultNoMatch,
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Start => "start",
            EventKind::End => "end",
            EventKind::Error => "error",
            EventKind::ErrorNetwork => "errorNetwork",
            EventKind::ErrorPermissionBlocked => "errorPermissionBlocked",
            EventKind::ErrorPermissionDenied => "errorPermissionDenied",
            EventKind::SoundStart => "soundstart",
            EventKind::SoundEnd => "soundend",
            EventKind::Result => "result",
            EventKind::ResultMatch => "resultMatch",
            EventKind::ResultNoMatch => "resultNoMatch",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lifecycle notification handed to registered callbacks.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Start,
    End,
    Error(EngineError),
    SoundStart,
    SoundEnd,
    /// Every hypothesis of a result, before any matching.
    Result { hypotheses: Vec<String> },
    ResultMatch(MatchReport),
    /// The unfiltered hypotheses of a result that matched nothing.
    ResultNoMatch { hypotheses: Vec<String> },
}

impl Event {
    /// The callback lists this event is delivered to, in delivery order.
    pub fn kinds(&self) -> Vec<EventKind> {
        match self {
            Event::Start => vec![EventKind::Start],
            Event::End => vec![EventKind::End],
            Event::Error(error) => {
                let mut kinds = vec![EventKind::Error];
                match error {
                    EngineError::Network => kinds.push(EventKind::ErrorNetwork),
                    EngineError::PermissionBlocked => kinds.push(EventKind::ErrorPermissionBlocked),
                    EngineError::PermissionDenied => kinds.push(EventKind::ErrorPermissionDenied),
                    EngineError::AlreadyStarted | EngineError::Other(_) => {}
                }
                kinds
            }
            Event::SoundStart => vec![EventKind::SoundStart],
            Event::SoundEnd => vec![EventKind::SoundEnd],
            Event::Result { .. } => vec![EventKind::Result],
            Event::ResultMatch(_) => vec![EventKind::ResultMatch],
            Event::ResultNoMatch { .. } => vec![EventKind::ResultNoMatch],
        }
    }
}

pub type EventCallback = Arc<dyn Fn(&Event) + Send + Sync>;

/// Handle returned by `CallbackRegistry::add`, used to remove that callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(u64);

#[derive(Default)]
pub struct CallbackRegistry {
    next_id: u64,
    entries: HashMap<EventKind, Vec<(CallbackId, EventCallback)>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<F>(&mut self, kind: EventKind, callback: F) -> CallbackId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let id = CallbackId(self.next_id);
        self.next_id += 1;
        self.entries
            .entry(kind)
            .or_default()
            .push((id, Arc::new(callback)));
        id
    }

    /// Remove callbacks. `None` for the kind means every kind; `None` for the
    /// id means every callback of the selected kind(s).
    pub fn remove(&mut self, kind: Option<EventKind>, id: Option<CallbackId>) {
        match (kind, id) {
            (None, None) => self.entries.clear(),
            (Some(kind), None) => {
                self.entries.remove(&kind);
            }
            (None, Some(id)) => {
                for callbacks in self.entries.values_mut() {
                    callbacks.retain(|(existing, _)| *existing != id);
                }
            }
            (Some(kind), Some(id)) => {
                if let Some(callbacks) = self.entries.get_mut(&kind) {
                    callbacks.retain(|(existing, _)| *existing != id);
                }
            }
        }
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.entries.get(&kind).map_or(0, Vec::len)
    }

    pub fn emit(&self, event: &Event) {
        for kind in event.kinds() {
            let Some(callbacks) = self.entries.get(&kind) else {
                continue;
            };
            debug!("Emitting '{}' to {} callback(s)", kind, callbacks.len());
            for (_, callback) in callbacks {
                callback(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) -> EventCallback) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let shared = Arc::clone(&log);
        let make = move |label: &str| -> EventCallback {
            let log = Arc::clone(&shared);
            let label = label.to_string();
            Arc::new(move |_: &Event| log.lock().unwrap().push(label.clone()))
        };
        (log, make)
    }

    #[test]
    fn test_callbacks_run_in_registration_order() {
        let (log, make) = recorder();
        let mut registry = CallbackRegistry::new();
        let first = make("first");
        let second = make("second");
        registry.add(EventKind::Start, move |e| first(e));
        registry.add(EventKind::Start, move |e| second(e));

        registry.emit(&Event::Start);
        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_only_matching_kind_runs() {
        let (log, make) = recorder();
        let mut registry = CallbackRegistry::new();
        let end = make("end");
        registry.add(EventKind::End, move |e| end(e));

        registry.emit(&Event::Start);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_error_reaches_generic_and_specific_lists() {
        let (log, make) = recorder();
        let mut registry = CallbackRegistry::new();
        let generic = make("error");
        let network = make("network");
        registry.add(EventKind::Error, move |e| generic(e));
        registry.add(EventKind::ErrorNetwork, move |e| network(e));

        registry.emit(&Event::Error(EngineError::Network));
        registry.emit(&Event::Error(EngineError::Other("boom".to_string())));
        assert_eq!(*log.lock().unwrap(), vec!["error", "network", "error"]);
    }

    #[test]
    fn test_remove_variants() {
        let mut registry = CallbackRegistry::new();
        let a = registry.add(EventKind::Start, |_| {});
        let b = registry.add(EventKind::Start, |_| {});
        registry.add(EventKind::End, |_| {});

        registry.remove(Some(EventKind::Start), Some(a));
        assert_eq!(registry.count(EventKind::Start), 1);

        registry.remove(None, Some(b));
        assert_eq!(registry.count(EventKind::Start), 0);
        assert_eq!(registry.count(EventKind::End), 1);

        registry.add(EventKind::Start, |_| {});
        registry.remove(Some(EventKind::End), None);
        assert_eq!(registry.count(EventKind::End), 0);
        assert_eq!(registry.count(EventKind::Start), 1);

        registry.remove(None, None);
        assert_eq!(registry.count(EventKind::Start), 0);
    }

    #[test]
    fn test_event_kind_names() {
        assert_eq!(EventKind::ResultNoMatch.to_string(), "resultNoMatch");
        assert_eq!(EventKind::SoundStart.name(), "soundstart");
    }
}
