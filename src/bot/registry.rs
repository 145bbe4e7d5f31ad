use std::{collections::HashMap, sync::Arc};

use tracing::debug;

use crate::{
    bot::{conversation::ProcessKind, processes::Process},
    error::BotError,
    locale::{LocaleRegistry, PhraseBundle},
};

/// Maps dispatch keys to processes.
///
/// Keys are resolved once at startup: every process tag, plus the trigger
/// phrases (menu label and command) of every known language.
pub struct ProcessRegistry {
    processes: HashMap<ProcessKind, Arc<dyn Process>>,
    by_tag: HashMap<&'static str, ProcessKind>,
    // language code -> trigger phrase -> process
    by_trigger: HashMap<String, HashMap<String, ProcessKind>>,
}

impl ProcessRegistry {
    /// Build the registry for `processes` and the languages of `locales`.
    pub fn new(processes: Vec<Arc<dyn Process>>, locales: &LocaleRegistry) -> Self {
        let processes: HashMap<ProcessKind, Arc<dyn Process>> = processes
            .into_iter()
            .map(|process| (process.kind(), process))
            .collect();
        let by_tag = processes.keys().map(|kind| (kind.tag(), *kind)).collect();

        let mut by_trigger = HashMap::new();
        for bundle in locales.bundles().chain([locales.default_bundle()]) {
            by_trigger.insert(bundle.language_code.clone(), triggers(bundle));
        }
        debug!(
            processes = processes.len(),
            languages = by_trigger.len(),
            "process registry ready"
        );

        Self {
            processes,
            by_tag,
            by_trigger,
        }
    }

    /// Process registered for `kind`.
    pub fn get(&self, kind: ProcessKind) -> Result<Arc<dyn Process>, BotError> {
        self.processes
            .get(&kind)
            .cloned()
            .ok_or_else(|| BotError::ProcessNotFound(kind.tag().to_owned()))
    }

    /// Process whose tag or trigger phrase in `phrases`' language equals `key`
    /// exactly.
    pub fn resolve(&self, key: &str, phrases: &PhraseBundle) -> Result<Arc<dyn Process>, BotError> {
        let kind = self.by_tag.get(key).copied().or_else(|| {
            self.by_trigger
                .get(&phrases.language_code)
                .and_then(|triggers| triggers.get(key))
                .copied()
        });

        match kind {
            Some(kind) => self.get(kind),
            None => Err(BotError::ProcessNotFound(key.to_owned())),
        }
    }
}

fn triggers(bundle: &PhraseBundle) -> HashMap<String, ProcessKind> {
    ProcessKind::ALL
        .into_iter()
        .flat_map(|kind| {
            let phrases = match kind {
                ProcessKind::Registration => {
                    [&bundle.registrate_btn, &bundle.registration_command]
                }
                ProcessKind::TeamChoosing => {
                    [&bundle.generate_teams_btn, &bundle.team_choosing_command]
                }
            };
            phrases.map(|phrase| (phrase.clone(), kind))
        })
        .collect()
}
