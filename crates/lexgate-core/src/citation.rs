//! Citation format validation.
//!
//! Each jurisdiction with a registered official bulletin gets a specific rule:
//! the answer must name the bulletin (full name or abbreviation) AND carry at
//! least one pinpoint locator (article, chapter, or section followed by an
//! arabic or Roman identifier). Every other jurisdiction falls back to a
//! generic rule that accepts any pinpoint locator or a numbered law/decree
//! reference. The generic rule accepts everything the specific rule's locator
//! half accepts, so it is never stricter.
//!
//! Matching runs on [`fold`]ed text, so accents and case do not matter.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ConfigError;
use crate::jurisdiction::{JurisdictionCode, JurisdictionKind};
use crate::registry::Registry;
use crate::text::fold;
use crate::types::CitationValidationResult;

/// Answers shorter than this (in characters, trimmed) never validate.
pub const MIN_ANSWER_CHARS: usize = 40;

/// Arabic number or well-formed Roman numeral (folded to lower case). The
/// Roman branch can match empty, so callers check the `num` group.
const IDENT: &str = r"(?P<num>\d+|m{0,4}(?:cm|cd|d?c{0,3})(?:xc|xl|l?x{0,3})(?:ix|iv|v?i{0,3})\b)(?:\s*(?:º|ª|°|bis\b|ter\b))?";

/// Named pinpoint-locator predicates.
static LOCATORS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    vec![
        (
            "article",
            Regex::new(&format!(r"\b(?:articulos?|arts?\.?|articles?)\s*{IDENT}"))
                .expect("article locator regex is valid"),
        ),
        (
            "chapter",
            Regex::new(&format!(r"\b(?:capitulos?|cap\.|chapters?|ch\.)\s*{IDENT}"))
                .expect("chapter locator regex is valid"),
        ),
        (
            "section",
            Regex::new(&format!(r"(?:\bseccion(?:es)?|\bsec\.|\bsections?|§)\s*{IDENT}"))
                .expect("section locator regex is valid"),
        ),
    ]
});

/// Numbered law or decree reference, accepted by the generic rule only.
static LAW_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:ley(?:\s+organica)?|law|real\s+decreto(?:-ley)?|decreto(?:-ley)?|decree|reglamento|regulation)\s+(?:n\.?\s*[º°o]?\.?\s*)?\d+",
    )
    .expect("law reference regex is valid")
});

#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    pub min_answer_chars: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            min_answer_chars: MIN_ANSWER_CHARS,
        }
    }
}

/// Source-mention predicate for one jurisdiction.
#[derive(Debug, Clone)]
struct SourceRule {
    label: String,
    pattern: Regex,
}

/// Citation pattern registry, built once from the jurisdiction registry.
#[derive(Debug, Clone)]
pub struct CitationValidator {
    rules: HashMap<JurisdictionCode, SourceRule>,
    config: ValidatorConfig,
}

impl CitationValidator {
    pub fn from_registry(registry: &Registry) -> Result<Self, ConfigError> {
        Self::with_config(registry, ValidatorConfig::default())
    }

    /// Compile one source rule per sub-national jurisdiction with an official bulletin.
    pub fn with_config(registry: &Registry, config: ValidatorConfig) -> Result<Self, ConfigError> {
        let mut rules = HashMap::new();
        for jurisdiction in registry.jurisdictions() {
            if jurisdiction.kind() != JurisdictionKind::SubNational {
                continue;
            }
            let Some(source) = &jurisdiction.source else {
                continue;
            };
            let mut names = vec![regex::escape(&fold(&source.name))];
            if let Some(abbr) = &source.abbreviation {
                names.push(regex::escape(&fold(abbr)));
            }
            let pattern = Regex::new(&format!(r"\b(?:{})\b", names.join("|"))).map_err(
                |source| ConfigError::Pattern {
                    code: jurisdiction.code.to_string(),
                    source,
                },
            )?;
            rules.insert(
                jurisdiction.code.clone(),
                SourceRule {
                    label: format!("source:{}", source.short_label()),
                    pattern,
                },
            );
        }
        Ok(Self { rules, config })
    }

    /// Whether `code` is held to a jurisdiction-specific rule.
    pub fn has_specific_rule(&self, code: &JurisdictionCode) -> bool {
        self.rules.contains_key(code)
    }

    /// Check a drafted answer against the rule for `jurisdiction`.
    pub fn validate(&self, answer: &str, jurisdiction: &JurisdictionCode) -> CitationValidationResult {
        if answer.trim().chars().count() < self.config.min_answer_chars {
            return CitationValidationResult::rejected();
        }
        let text = fold(answer);
        let locators = matched_locators(&text);

        let matched = match self.rules.get(jurisdiction) {
            Some(rule) => {
                if !rule.pattern.is_match(&text) || locators.is_empty() {
                    return CitationValidationResult::rejected();
                }
                let mut matched = vec![rule.label.clone()];
                matched.extend(locators.into_iter().map(str::to_string));
                matched
            }
            None => {
                let mut matched: Vec<String> =
                    locators.into_iter().map(str::to_string).collect();
                if LAW_REFERENCE.is_match(&text) {
                    matched.push("law_reference".to_string());
                }
                if matched.is_empty() {
                    return CitationValidationResult::rejected();
                }
                matched
            }
        };

        CitationValidationResult {
            ok: true,
            matched_patterns: matched,
        }
    }
}

fn matched_locators(folded: &str) -> Vec<&'static str> {
    LOCATORS
        .iter()
        .filter(|(_, re)| {
            re.captures_iter(folded)
                .any(|c| c.name("num").is_some_and(|m| !m.as_str().is_empty()))
        })
        .map(|(label, _)| *label)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> (Registry, CitationValidator) {
        let registry = Registry::builtin().unwrap();
        let validator = CitationValidator::from_registry(&registry).unwrap();
        (registry, validator)
    }

    fn code(registry: &Registry, raw: &str) -> JurisdictionCode {
        registry.resolve(raw).unwrap()
    }

    #[test]
    fn specific_rule_needs_source_and_locator() {
        let (registry, v) = validator();
        let an = code(&registry, "ES-AN");

        let both = "Según el Boletín Oficial de la Junta de Andalucía, el Art. 12 fija el plazo.";
        let result = v.validate(both, &an);
        assert!(result.ok);
        assert_eq!(result.matched_patterns, vec!["source:BOJA", "article"]);

        let locator_only = "El plazo de presentación está fijado en el Art. 12 de la norma autonómica.";
        assert!(!v.validate(locator_only, &an).ok);

        let source_only = "El plazo de presentación se publicó en el BOJA del pasado mes de marzo.";
        assert!(!v.validate(source_only, &an).ok);
    }

    #[test]
    fn abbreviation_counts_as_source() {
        let (registry, v) = validator();
        let ct = code(&registry, "ES-CT");
        let answer = "Ho regula el DOGC, capítulo III, sobre el règim d'autoritzacions ambientals.";
        let result = v.validate(answer, &ct);
        assert!(result.ok, "{result:?}");
        assert!(result.matched_patterns.contains(&"chapter".to_string()));
    }

    #[test]
    fn source_of_another_region_does_not_count() {
        let (registry, v) = validator();
        let an = code(&registry, "ES-AN");
        let answer = "Según el Diari Oficial de la Generalitat de Catalunya, artículo 5 de la norma.";
        assert!(!v.validate(answer, &an).ok);
    }

    #[test]
    fn locator_forms() {
        for text in [
            "artículo 12",
            "Art. 12º",
            "arts. 3 bis",
            "Capítulo IV",
            "sección 2ª",
            "§ 4",
            "Article 7",
            "sección II",
            "capítulo XIV",
            "art. mmxxiv",
        ] {
            let folded = fold(text);
            assert!(!matched_locators(&folded).is_empty(), "no locator in {text:?}");
        }
        assert!(matched_locators(&fold("el arte de legislar")).is_empty());
        assert!(matched_locators(&fold("capítulo sin número")).is_empty());
        assert!(matched_locators(&fold("la Sección Civil de la Audiencia")).is_empty());
        assert!(matched_locators(&fold("el artículo mil veces citado")).is_empty());
        assert!(matched_locators(&fold("capítulo final")).is_empty());
        assert!(matched_locators(&fold("sección")).is_empty());
    }

    #[test]
    fn roman_lookalike_words_are_not_pinpoints() {
        let (registry, v) = validator();
        let an = code(&registry, "ES-AN");
        let es = code(&registry, "ES");

        let civil = "Según el BOJA, la Sección Civil de la Audiencia resolverá el recurso en plazo.";
        assert_eq!(v.validate(civil, &an), CitationValidationResult::rejected());

        let mil = "La respuesta depende del artículo mil veces citado por los tribunales locales.";
        assert_eq!(v.validate(mil, &es), CitationValidationResult::rejected());
    }

    #[test]
    fn every_specific_rule_needs_source_and_locator() {
        let (registry, v) = validator();
        let mut checked = 0;
        for j in registry.jurisdictions() {
            if !v.has_specific_rule(&j.code) {
                continue;
            }
            let source = j.source.as_ref().unwrap();
            checked += 1;

            let locator_only = "El plazo de presentación está fijado en el Art. 12 de la norma aplicable.";
            assert!(!v.validate(locator_only, &j.code).ok, "{}: locator only", j.code);

            let source_only = format!(
                "El plazo de presentación se publicó en el {} del pasado mes de marzo.",
                source.short_label()
            );
            assert!(!v.validate(&source_only, &j.code).ok, "{}: source only", j.code);

            let both = format!("Según el {}, el Art. 12 fija el plazo de presentación.", source.name);
            let result = v.validate(&both, &j.code);
            assert!(result.ok, "{}: source and locator: {result:?}", j.code);
            assert_eq!(result.matched_patterns[0], format!("source:{}", source.short_label()));
        }
        assert_eq!(checked, 9, "every sub-national source should carry a rule");
    }

    #[test]
    fn generic_rule_for_unpatterned_jurisdictions() {
        let (registry, v) = validator();
        for raw in ["ES", "PT", "ES-RI", "GLOBAL"] {
            let c = code(&registry, raw);
            assert!(!v.has_specific_rule(&c));
            let answer = "La materia se regula en la Ley 39/2015, de procedimiento administrativo común.";
            let result = v.validate(answer, &c);
            assert!(result.ok, "{raw}: {result:?}");
            assert_eq!(result.matched_patterns, vec!["law_reference"]);
        }
    }

    #[test]
    fn generic_rule_accepts_what_specific_rule_accepts() {
        let (registry, v) = validator();
        let an = code(&registry, "ES-AN");
        let es = code(&registry, "ES");
        let answer = "Conforme al Boletín Oficial de la Junta de Andalucía, sección II regula el trámite.";
        assert!(v.validate(answer, &an).ok);
        assert!(v.validate(answer, &es).ok);
    }

    #[test]
    fn generic_rule_rejects_uncited_prose() {
        let (registry, v) = validator();
        let es = code(&registry, "ES");
        let result = v.validate(
            "Depende de muchos factores y conviene consultar a un profesional.",
            &es,
        );
        assert_eq!(result, CitationValidationResult::rejected());
    }

    #[test]
    fn short_answers_always_fail() {
        let (registry, v) = validator();
        assert!(!v.validate("Yes.", &code(&registry, "ES")).ok);
        assert!(!v.validate("BOJA, Art. 12.", &code(&registry, "ES-AN")).ok);
    }
}
