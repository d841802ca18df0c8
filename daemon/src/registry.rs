use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::grammar::{compile, Arg, CompileError, CompiledMatcher, Template};

pub type CommandCallback = Arc<dyn Fn(&[Arg]) + Send + Sync>;

/// A template together with the callbacks to run when it matches.
pub struct CommandBinding {
    template: Template,
    callbacks: Vec<CommandCallback>,
}

impl CommandBinding {
    pub fn new<F>(template: impl Into<Template>, callback: F) -> Self
    where
        F: Fn(&[Arg]) + Send + Sync + 'static,
    {
        Self {
            template: template.into(),
            callbacks: vec![Arc::new(callback)],
        }
    }

    pub fn with_callbacks(template: impl Into<Template>, callbacks: Vec<CommandCallback>) -> Self {
        Self {
            template: template.into(),
            callbacks,
        }
    }

    /// Attach another callback; all of them run, in order, on a match.
    pub fn also<F>(mut self, callback: F) -> Self
    where
        F: Fn(&[Arg]) + Send + Sync + 'static,
    {
        self.callbacks.push(Arc::new(callback));
        self
    }
}

pub struct RegisteredCommand {
    pub matcher: CompiledMatcher,
    pub callbacks: Vec<CommandCallback>,
}

impl RegisteredCommand {
    pub fn template(&self) -> &str {
        self.matcher.source()
    }

    pub fn invoke(&self, args: &[Arg]) {
        for callback in &self.callbacks {
            callback(args);
        }
    }
}

impl fmt::Debug for RegisteredCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredCommand")
            .field("template", &self.template())
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

/// Templates that failed to compile in a batch. Every other template in the
/// batch was registered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{} command(s) failed to compile: {}", .failures.len(), summarize(.failures))]
pub struct RegisterError {
    pub failures: Vec<(String, CompileError)>,
}

fn summarize(failures: &[(String, CompileError)]) -> String {
    failures
        .iter()
        .map(|(template, err)| format!("'{}' ({})", template, err))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Read-only view of the registry taken at the start of a matching pass.
pub type Snapshot = Arc<Vec<Arc<RegisteredCommand>>>;

#[derive(Default)]
pub struct MatcherRegistry {
    commands: Snapshot,
}

impl MatcherRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(&self.commands)
    }

    pub fn templates(&self) -> Vec<String> {
        self.commands
            .iter()
            .map(|c| c.template().to_string())
            .collect()
    }

    /// Compile and register a batch. A template already present is replaced
    /// where it stands; new templates are appended.
    pub fn add<I>(&mut self, bindings: I) -> Result<(), RegisterError>
    where
        I: IntoIterator<Item = CommandBinding>,
    {
        let mut failures = Vec::new();
        let commands = Arc::make_mut(&mut self.commands);

        for binding in bindings {
            let matcher = match compile(&binding.template) {
                Ok(matcher) => matcher,
                Err(e) => {
                    warn!("Command '{}' not registered: {}", binding.template, e);
                    failures.push((binding.template.source().to_string(), e));
                    continue;
                }
            };

            let entry = Arc::new(RegisteredCommand {
                matcher,
                callbacks: binding.callbacks,
            });

            match commands
                .iter()
                .position(|c| c.template() == entry.template())
            {
                Some(index) => {
                    debug!("Replacing command '{}'", entry.template());
                    commands[index] = entry;
                }
                None => {
                    debug!(
                        "Registering command '{}' ({:?})",
                        entry.template(),
                        entry.matcher.priority()
                    );
                    commands.push(entry);
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(RegisterError { failures })
        }
    }

    /// Remove every command, or only those whose template text is listed.
    pub fn remove(&mut self, templates: Option<&[&str]>) {
        match templates {
            None => {
                info!("Removing all {} commands", self.commands.len());
                self.commands = Arc::new(Vec::new());
            }
            Some(templates) => {
                let commands = Arc::make_mut(&mut self.commands);
                let before = commands.len();
                commands.retain(|c| !templates.contains(&c.template()));
                debug!("Removed {} commands", before - commands.len());
            }
        }
    }

    /// First command, in registration order, whose pattern accepts the text.
    pub fn match_against(&self, hypothesis: &str) -> Option<(Arc<RegisteredCommand>, Vec<Arg>)> {
        match_in(&self.commands, hypothesis)
    }
}

pub(crate) fn match_in(
    commands: &[Arc<RegisteredCommand>],
    hypothesis: &str,
) -> Option<(Arc<RegisteredCommand>, Vec<Arg>)> {
    commands.iter().find_map(|command| {
        command
            .matcher
            .captures(hypothesis)
            .map(|args| (Arc::clone(command), args))
    })
}
