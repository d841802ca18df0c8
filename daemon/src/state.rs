use shared::ipc::{MatchInfo, StatusInfo};
use tracing::{info, warn};

use crate::config::{CommandConfig, Config};
use crate::engine::ScriptedEngine;
use crate::grammar::Template;
use crate::hotword::HotwordConfig;
use crate::processor::{MatchOutcome, MatchReport};
use crate::registry::{CommandBinding, RegisterError};
use crate::session::{Phase, Session};

/// What became of one utterance handed to the daemon.
#[derive(Debug, Clone, PartialEq)]
pub enum Heard {
    Matched(MatchReport),
    NoMatch(Vec<String>),
    Discarded,
}

pub struct DaemonState {
    pub config: Config,
    session: Session<ScriptedEngine>,
}

impl DaemonState {
    pub fn new(config: Config) -> Self {
        let mut session = Session::new(ScriptedEngine::new());
        session.set_hotword(config.session.hotword.clone());

        let mut state = Self { config, session };
        let commands = state.config.commands.clone();
        for command in &commands {
            if let Err(e) = state.add_command(command) {
                warn!("Skipping configured command '{}': {}", command.template, e);
            }
        }

        if state.config.session.autostart {
            state.start();
        }
        state
    }

    pub fn session(&self) -> &Session<ScriptedEngine> {
        &self.session
    }

    pub fn add_command(&mut self, command: &CommandConfig) -> anyhow::Result<()> {
        let template = command.to_template()?;
        self.register(template)?;
        Ok(())
    }

    fn register(&mut self, template: Template) -> Result<(), RegisterError> {
        let name = template.source().to_string();
        self.session
            .add_commands(vec![CommandBinding::new(template, move |args| {
                info!("Command '{}' triggered with {:?}", name, args);
            })])
    }

    pub fn remove_commands(&mut self, templates: Option<Vec<String>>) {
        match templates {
            Some(templates) => {
                let refs: Vec<&str> = templates.iter().map(String::as_str).collect();
                self.session.remove_commands(Some(refs.as_slice()));
            }
            None => self.session.remove_commands(None),
        }
    }

    pub fn commands(&self) -> Vec<String> {
        self.session.commands()
    }

    /// Also kept in the config so a later `start` does not bring back the old one.
    pub fn set_hotword(&mut self, words: Vec<String>) {
        let hotword = HotwordConfig::from(words);
        self.config.session.hotword = hotword.clone();
        self.session.set_hotword(hotword);
    }

    pub fn start(&mut self) {
        self.session.start(self.config.session.start_options());
        self.session.pump();
        info!("Session started");
    }

    pub fn stop(&mut self) {
        self.session.abort();
        self.session.pump();
        info!("Session stopped");
    }

    pub fn pause(&mut self) {
        self.session.pause();
        self.session.pump();
    }

    pub fn resume(&mut self) {
        self.session.resume();
        self.session.pump();
    }

    pub fn toggle(&mut self) {
        match self.session.phase() {
            Phase::Listening => self.pause(),
            Phase::Paused => self.resume(),
            Phase::Idle | Phase::Aborting => self.start(),
        }
    }

    /// Let the engine "hear" the hypotheses and report what they triggered.
    pub fn say(&mut self, hypotheses: Vec<String>, is_final: bool) -> Heard {
        // Flush anything still queued so the result is judged on current state.
        self.session.pump();

        if !self.session.engine_mut().emit_result(hypotheses, is_final) {
            return Heard::Discarded;
        }

        match self.session.pump().into_iter().next() {
            Some(MatchOutcome::Matched(report)) => Heard::Matched(report),
            Some(MatchOutcome::NoMatch { hypotheses, .. }) => Heard::NoMatch(hypotheses),
            None => Heard::Discarded,
        }
    }

    pub fn get_status(&self) -> StatusInfo {
        StatusInfo {
            is_running: true,
            is_listening: self.session.is_listening(),
            is_paused: self.session.is_paused(),
            hotword: self.session.hotword().words(),
            commands: self.session.commands().len(),
        }
    }
}

impl From<MatchReport> for MatchInfo {
    fn from(report: MatchReport) -> Self {
        MatchInfo {
            hypothesis: report.hypothesis,
            template: report.template,
            args: report.args.iter().map(ToString::to_string).collect(),
        }
    }
}
