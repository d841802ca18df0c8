use tracing::{debug, info};

use crate::callbacks::{CallbackRegistry, Event};
use crate::grammar::Arg;
use crate::hotword::{HotwordConfig, HotwordOutcome};
use crate::registry::{match_in, Snapshot};

/// What was recognised and which command it triggered.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchReport {
    /// The hypothesis that matched, as the engine delivered it.
    pub hypothesis: String,
    pub template: String,
    pub args: Vec<Arg>,
    /// Every hypothesis of the result, best first.
    pub hypotheses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    Matched(MatchReport),
    NoMatch {
        hypotheses: Vec<String>,
        /// Set when no hypothesis got past the hotword.
        hotword_rejected: bool,
    },
}

impl MatchOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchOutcome::Matched(_))
    }
}

/// Runs one recognition result against a fixed view of the commands and the
/// hotword as they were when the result arrived.
pub struct ResultProcessor<'a> {
    commands: Snapshot,
    hotword: HotwordConfig,
    callbacks: &'a CallbackRegistry,
}

impl<'a> ResultProcessor<'a> {
    pub fn new(commands: Snapshot, hotword: HotwordConfig, callbacks: &'a CallbackRegistry) -> Self {
        Self {
            commands,
            hotword,
            callbacks,
        }
    }

    pub fn process(&self, hypotheses: &[String], is_final: bool) -> MatchOutcome {
        debug!(
            "Processing {} hypotheses (final: {})",
            hypotheses.len(),
            is_final
        );
        self.callbacks.emit(&Event::Result {
            hypotheses: hypotheses.to_vec(),
        });

        let mut hotword_rejected = true;

        for hypothesis in hypotheses {
            let text = match self.hotword.apply(hypothesis) {
                HotwordOutcome::Accepted(text) => text,
                HotwordOutcome::Rejected => {
                    debug!("Hotword missing in '{}'", hypothesis);
                    continue;
                }
            };
            hotword_rejected = false;

            if text.trim().is_empty() {
                debug!("Nothing left to match in '{}'", hypothesis);
                continue;
            }

            let Some((command, args)) = match_in(&self.commands, &text) else {
                continue;
            };

            info!(
                "Matched '{}' to command '{}' with {:?}",
                hypothesis,
                command.template(),
                args
            );

            let report = MatchReport {
                hypothesis: hypothesis.trim().to_string(),
                template: command.template().to_string(),
                args,
                hypotheses: hypotheses.to_vec(),
            };
            self.callbacks.emit(&Event::ResultMatch(report.clone()));
            command.invoke(&report.args);
            return MatchOutcome::Matched(report);
        }

        debug!("No command matched {:?}", hypotheses);
        self.callbacks.emit(&Event::ResultNoMatch {
            hypotheses: hypotheses.to_vec(),
        });
        MatchOutcome::NoMatch {
            hypotheses: hypotheses.to_vec(),
            hotword_rejected: hotword_rejected && !hypotheses.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::EventKind;
    use crate::registry::{CommandBinding, MatcherRegistry};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn hyps(list: &[&str]) -> Vec<String> {
        list.iter().map(|h| h.to_string()).collect()
    }

    #[test]
    fn test_best_hypothesis_wins() {
        let mut registry = MatcherRegistry::new();
        registry
            .add(vec![
                CommandBinding::new("hello", |_| {}),
                CommandBinding::new("yellow", |_| {}),
            ])
            .unwrap();
        let callbacks = CallbackRegistry::new();
        let processor =
            ResultProcessor::new(registry.snapshot(), HotwordConfig::Disabled, &callbacks);

        let outcome = processor.process(&hyps(&["yellow", "hello"]), true);
        match outcome {
            MatchOutcome::Matched(report) => {
                assert_eq!(report.template, "yellow");
                assert_eq!(report.hypotheses.len(), 2);
            }
            other => panic!("expected a match, got {:?}", other),
        }
    }

    #[test]
    fn test_falls_back_to_lower_ranked_hypothesis() {
        let mut registry = MatcherRegistry::new();
        registry
            .add(vec![CommandBinding::new("go to :place", |_| {})])
            .unwrap();
        let callbacks = CallbackRegistry::new();
        let processor =
            ResultProcessor::new(registry.snapshot(), HotwordConfig::Disabled, &callbacks);

        let outcome = processor.process(&hyps(&["no to paris", "go to paris"]), true);
        match outcome {
            MatchOutcome::Matched(report) => {
                assert_eq!(report.hypothesis, "go to paris");
                assert_eq!(report.args, vec![Arg::Text("paris".to_string())]);
            }
            other => panic!("expected a match, got {:?}", other),
        }
    }

    #[test]
    fn test_stops_after_first_match() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let mut registry = MatcherRegistry::new();
        registry
            .add(vec![CommandBinding::new("ping", move |_| {
                c.fetch_add(1, Ordering::SeqCst);
            })])
            .unwrap();
        let callbacks = CallbackRegistry::new();
        let processor =
            ResultProcessor::new(registry.snapshot(), HotwordConfig::Disabled, &callbacks);

        processor.process(&hyps(&["ping", "ping", "ping"]), true);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_no_match_fires_once_with_unfiltered_hypotheses() {
        let registry = MatcherRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let mut callbacks = CallbackRegistry::new();
        callbacks.add(EventKind::ResultNoMatch, move |event| {
            if let Event::ResultNoMatch { hypotheses } = event {
                s.lock().unwrap().push(hypotheses.clone());
            }
        });
        let processor =
            ResultProcessor::new(registry.snapshot(), HotwordConfig::from("Jimmy"), &callbacks);

        let outcome = processor.process(&hyps(&["Jimmy foo", "bar"]), true);
        assert_eq!(
            outcome,
            MatchOutcome::NoMatch {
                hypotheses: hyps(&["Jimmy foo", "bar"]),
                hotword_rejected: false,
            }
        );
        assert_eq!(*seen.lock().unwrap(), vec![hyps(&["Jimmy foo", "bar"])]);
    }

    #[test]
    fn test_all_rejected_by_hotword() {
        let mut registry = MatcherRegistry::new();
        registry
            .add(vec![CommandBinding::new("Lorem", |_| {})])
            .unwrap();
        let no_match = Arc::new(AtomicUsize::new(0));
        let n = Arc::clone(&no_match);
        let mut callbacks = CallbackRegistry::new();
        callbacks.add(EventKind::ResultNoMatch, move |_| {
            n.fetch_add(1, Ordering::SeqCst);
        });
        let processor =
            ResultProcessor::new(registry.snapshot(), HotwordConfig::from("Jimmy"), &callbacks);

        let outcome = processor.process(&hyps(&["Lorem", "Lorem ipsum"]), true);
        assert!(matches!(
            outcome,
            MatchOutcome::NoMatch {
                hotword_rejected: true,
                ..
            }
        ));
        assert_eq!(no_match.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_hotword_alone_matches_nothing() {
        let count = Arc::new(AtomicUsize::new(0));
        let (a, b) = (Arc::clone(&count), Arc::clone(&count));
        let mut registry = MatcherRegistry::new();
        registry
            .add(vec![
                CommandBinding::new("*anything", move |_| {
                    a.fetch_add(1, Ordering::SeqCst);
                }),
                CommandBinding::new(regex::Regex::new("^.*$").unwrap(), move |_| {
                    b.fetch_add(1, Ordering::SeqCst);
                }),
            ])
            .unwrap();
        let callbacks = CallbackRegistry::new();
        let processor =
            ResultProcessor::new(registry.snapshot(), HotwordConfig::from("Jimmy"), &callbacks);

        let outcome = processor.process(&hyps(&["Jimmy", "  Jimmy  "]), true);
        assert!(matches!(
            outcome,
            MatchOutcome::NoMatch {
                hotword_rejected: false,
                ..
            }
        ));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_event_order_on_match() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let (a, b, c) = (Arc::clone(&order), Arc::clone(&order), Arc::clone(&order));
        let mut registry = MatcherRegistry::new();
        registry
            .add(vec![CommandBinding::new("hi", move |_| {
                a.lock().unwrap().push("command")
            })])
            .unwrap();
        let mut callbacks = CallbackRegistry::new();
        callbacks.add(EventKind::Result, move |_| b.lock().unwrap().push("result"));
        callbacks.add(EventKind::ResultMatch, move |_| {
            c.lock().unwrap().push("resultMatch")
        });
        let processor =
            ResultProcessor::new(registry.snapshot(), HotwordConfig::Disabled, &callbacks);

        assert!(processor.process(&hyps(&["hi"]), true).is_match());
        assert_eq!(
            *order.lock().unwrap(),
            vec!["result", "resultMatch", "command"]
        );
    }
}
