// Common test helpers for vocmdd integration tests
//
// This module provides utilities for:
// - Building sessions with commands already registered
// - Counting and recording callback invocations

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use vocmdd::grammar::Arg;
use vocmdd::{CommandBinding, ScriptedEngine, Session, StartOptions};

pub fn hyps(list: &[&str]) -> Vec<String> {
    list.iter().map(|h| h.to_string()).collect()
}

/// Cloneable invocation counter usable as a command or event callback.
#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    pub fn called(&self) -> bool {
        self.count() > 0
    }

    pub fn binding(&self, template: &str) -> CommandBinding {
        let counter = self.clone();
        CommandBinding::new(template, move |_| counter.hit())
    }
}

/// Ordered log of labels shared between callbacks.
#[derive(Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<String>>>);

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, label: impl Into<String>) {
        self.0.lock().unwrap().push(label.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn binding(&self, template: &str) -> CommandBinding {
        let recorder = self.clone();
        let label = template.to_string();
        CommandBinding::new(template, move |args: &[Arg]| {
            let args: Vec<String> = args.iter().map(ToString::to_string).collect();
            recorder.push(format!("{}{:?}", label, args));
        })
    }
}

pub fn session_with(bindings: Vec<CommandBinding>) -> Session<ScriptedEngine> {
    let mut session = Session::new(ScriptedEngine::new());
    session.add_commands(bindings).unwrap();
    session
}

/// Start and deliver the engine's start event.
pub fn start(session: &mut Session<ScriptedEngine>, options: StartOptions) {
    session.start(options);
    session.pump();
}

/// Say one final utterance and pump it through the session.
pub fn say(session: &mut Session<ScriptedEngine>, hypotheses: &[&str]) -> bool {
    let heard = session.engine_mut().say(hypotheses);
    session.pump();
    heard
}
