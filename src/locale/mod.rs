//! Localized phrase bundles and their lookup by language code.

mod builtin;

use std::{collections::HashMap, fs, path::Path, sync::Arc};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Every user-facing string of one language, including the trigger phrases
/// that start a process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseBundle {
    /// Language code the bundle is registered under, e.g. `en`.
    pub language_code: String,

    /// Main menu label starting registration.
    pub registrate_btn: String,
    /// Main menu label starting team choosing.
    pub generate_teams_btn: String,
    /// Command starting registration.
    pub registration_command: String,
    /// Command starting team choosing.
    pub team_choosing_command: String,

    /// Affirmative answer button.
    pub yes_btn: String,
    /// Negative answer button.
    pub no_btn: String,
    /// Label prefixed to the echoed answer of a prompt.
    pub answer: String,
    /// Sent when a button press does not belong to the current step.
    pub wrong_btn_pressing: String,
    /// Sent when text arrives while a button press is expected.
    pub unexpected_text: String,
    /// Replies picked at random when a message matches nothing.
    pub fallback: Vec<String>,
    /// Hint shown in the input field of the main menu.
    pub input_field_placeholder: String,

    /// Asks for the nickname to register.
    pub reg_nickname_request: String,
    /// Refuses a taken nickname; template with `{nickname}`.
    pub reg_nickname_in_use: String,
    /// Refuses an empty or overlong nickname.
    pub reg_nickname_invalid: String,
    /// Confirmation prompt; template with `{nickname}`.
    pub reg_nickname_confirm: String,
    /// Asks for another nickname after "no".
    pub reg_nickname_request_again: String,
    /// Registration finished; template with `{nickname}`.
    pub reg_done: String,
    /// Follow-up shown with the main menu after registering.
    pub reg_after: String,
    /// Sent when a registered user starts registration; template with `{nickname}`.
    pub reg_already_registered: String,

    /// Asks how many players take part.
    pub tc_players_count_request: String,
    /// Asks for the team star rating.
    pub tc_rating_request: String,
    /// Asks for the country of the teams.
    pub tc_teams_country_request: String,
    /// Country button drawing from every country.
    pub tc_teams_country_never_mind_btn: String,
    /// Template with `{player_number}`, `{team_name}`, `{league}`, `{general}`,
    /// `{attack}`, `{midfield}` and `{defense}`.
    pub team_description: String,
    /// Substitution button; template with `{player_number}`.
    pub tc_change_team_btn: String,
    /// Button accepting the drawn teams.
    pub tc_confirm_teams_btn: String,
    /// Sent when no reserved team is left to swap in.
    pub tc_no_more_teams: String,
    /// Sent when the pool is too small; template with `{available}` and `{players}`.
    pub tc_not_enough_teams: String,
    /// Header of the first-round pair list.
    pub tc_first_round_pairs: String,
    /// Template with `{first}` and `{second}`.
    pub tc_pair: String,
    /// Sent when the teams are final.
    pub tc_done: String,
}

/// Substitute every `{key}` placeholder of `template`.
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    values
        .iter()
        .fold(template.to_owned(), |text, (key, value)| {
            text.replace(&format!("{{{key}}}"), value)
        })
}

/// Phrase bundles keyed by language code with a default for unknown codes.
#[derive(Debug, Clone)]
pub struct LocaleRegistry {
    bundles: HashMap<String, Arc<PhraseBundle>>,
    default: Arc<PhraseBundle>,
}

impl LocaleRegistry {
    /// Registry holding only the bundles shipped with the binary.
    pub fn builtin(default_language: &str) -> Self {
        Self::from_bundles(default_language, builtin::bundles())
    }

    /// Built-in bundles, overridden or extended by `<dir>/<code>.json` files.
    ///
    /// Unreadable or invalid files are logged and skipped.
    pub fn load(default_language: &str, dir: Option<&Path>) -> Self {
        let mut bundles = builtin::bundles();
        if let Some(dir) = dir {
            bundles.extend(read_bundles(dir));
        }
        Self::from_bundles(default_language, bundles)
    }

    fn from_bundles(default_language: &str, bundles: Vec<PhraseBundle>) -> Self {
        let bundles: HashMap<String, Arc<PhraseBundle>> = bundles
            .into_iter()
            .map(|bundle| (bundle.language_code.clone(), Arc::new(bundle)))
            .collect();

        let default = match bundles.get(default_language) {
            Some(bundle) => bundle.clone(),
            None => {
                warn!(
                    language = default_language,
                    "no phrase bundle for the default language; using the built-in Russian bundle"
                );
                Arc::new(builtin::russian())
            }
        };

        Self { bundles, default }
    }

    /// Bundle for `code`, falling back to the primary subtag (`en-US` -> `en`)
    /// and then to the default language.
    pub fn resolve(&self, code: Option<&str>) -> Arc<PhraseBundle> {
        let Some(code) = code else {
            return self.default.clone();
        };
        let primary = code.split(['-', '_']).next().unwrap_or(code);
        self.bundles
            .get(code)
            .or_else(|| self.bundles.get(primary))
            .unwrap_or(&self.default)
            .clone()
    }

    /// Bundle used when a sender's language is unknown.
    pub fn default_bundle(&self) -> &PhraseBundle {
        &self.default
    }

    /// Every registered bundle, in no particular order.
    pub fn bundles(&self) -> impl Iterator<Item = &PhraseBundle> {
        self.bundles.values().map(AsRef::as_ref)
    }
}

fn read_bundles(dir: &Path) -> Vec<PhraseBundle> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(path = %dir.display(), error = %err, "failed to read locales directory");
            return Vec::new();
        }
    };

    let mut bundles = Vec::new();
    for path in entries.filter_map(Result::ok).map(|entry| entry.path()) {
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        let parsed = fs::read_to_string(&path)
            .map_err(|err| err.to_string())
            .and_then(|raw| {
                serde_json::from_str::<PhraseBundle>(&raw).map_err(|err| err.to_string())
            });
        match parsed {
            Ok(bundle) => {
                info!(path = %path.display(), language = %bundle.language_code, "loaded phrase bundle");
                bundles.push(bundle);
            }
            Err(err) => warn!(path = %path.display(), error = %err, "skipping invalid phrase bundle"),
        }
    }
    bundles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_replaces_every_occurrence() {
        let text = render("{a} and {b}, again {a}", &[("a", "x"), ("b", "y")]);
        assert_eq!(text, "x and y, again x");
    }

    #[test]
    fn resolve_falls_back_to_primary_tag_then_default() {
        let registry = LocaleRegistry::builtin("ru");
        assert_eq!(registry.resolve(Some("en")).language_code, "en");
        assert_eq!(registry.resolve(Some("en-GB")).language_code, "en");
        assert_eq!(registry.resolve(Some("pt")).language_code, "ru");
        assert_eq!(registry.resolve(None).language_code, "ru");
    }

    #[test]
    fn unknown_default_language_uses_russian() {
        let registry = LocaleRegistry::builtin("de");
        assert_eq!(registry.default_bundle().language_code, "ru");
    }

    #[test]
    fn bundle_files_override_builtins() {
        let dir = std::env::temp_dir().join(format!("locales-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let mut english = builtin::english();
        english.reg_done = "Welcome aboard, {nickname}!".into();
        fs::write(dir.join("en.json"), serde_json::to_string(&english).unwrap()).unwrap();
        fs::write(dir.join("broken.json"), "{").unwrap();

        let registry = LocaleRegistry::load("en", Some(&dir));
        assert_eq!(
            registry.resolve(Some("en")).reg_done,
            "Welcome aboard, {nickname}!"
        );
        assert_eq!(registry.bundles().count(), 2);

        fs::remove_dir_all(&dir).unwrap();
    }
}
