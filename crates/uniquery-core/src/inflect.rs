//! English inflection for table and attribute names.
//!
//! Table names are turned into singular, plural and CamelCase forms to
//! produce model names and relation attribute names. Only the handful of
//! rules that show up in schema names are covered; anything more exotic
//! can be supplied through a per-call custom rule map, which takes
//! precedence over both the irregular forms and the suffix rules.
//!
//! The custom map passed to [`to_plural`] maps singular to plural forms.
//! The one passed to [`to_singular`] and [`is_plural`] maps plural to
//! singular forms.

use std::collections::BTreeMap;

/// Irregular (singular, plural) pairs, checked before the suffix rules.
const IRREGULAR: &[(&str, &str)] = &[
    ("child", "children"),
    ("ox", "oxen"),
    ("man", "men"),
    ("woman", "women"),
    ("mouse", "mice"),
    ("goose", "geese"),
];

const SIBILANT_ENDINGS: &[&str] = &["s", "x", "z", "ch", "sh"];

fn ends_with_any(word: &str, suffixes: &[&str]) -> bool {
    suffixes.iter().any(|s| word.ends_with(s))
}

fn irregular_plural(word: &str) -> Option<&'static str> {
    IRREGULAR
        .iter()
        .find(|(singular, _)| *singular == word)
        .map(|(_, plural)| *plural)
}

fn irregular_singular(word: &str) -> Option<&'static str> {
    IRREGULAR
        .iter()
        .find(|(_, plural)| *plural == word)
        .map(|(singular, _)| *singular)
}

/// Convert a singular word to its plural form.
///
/// Words that already look plural are returned unchanged.
pub fn to_plural(word: &str, custom_rules: Option<&BTreeMap<String, String>>) -> String {
    if let Some(plural) = custom_rules.and_then(|rules| rules.get(word)) {
        return plural.clone();
    }
    if is_plural(word, None) {
        return word.to_string();
    }
    if let Some(plural) = irregular_plural(word) {
        return plural.to_string();
    }

    if word.ends_with('y') && !ends_with_any(word, &["ay", "ey", "iy", "oy", "uy"]) {
        return format!("{}ies", &word[..word.len() - 1]);
    }
    if ends_with_any(word, SIBILANT_ENDINGS) {
        return format!("{word}es");
    }
    if let Some(stem) = word.strip_suffix("an") {
        return format!("{stem}en");
    }
    if let Some(stem) = word.strip_suffix("lf") {
        return format!("{stem}lves");
    }
    if let Some(stem) = word.strip_suffix("fe") {
        return format!("{stem}ves");
    }
    format!("{word}s")
}

/// Convert a plural word to its singular form.
///
/// Words no rule applies to are returned unchanged.
pub fn to_singular(word: &str, custom_rules: Option<&BTreeMap<String, String>>) -> String {
    if let Some(singular) = custom_rules.and_then(|rules| rules.get(word)) {
        return singular.clone();
    }
    if let Some(singular) = irregular_singular(word) {
        return singular.to_string();
    }

    if let Some(stem) = word.strip_suffix("ies") {
        return format!("{stem}y");
    }
    if let Some(stem) = word.strip_suffix("es") {
        if ends_with_any(stem, SIBILANT_ENDINGS) {
            return stem.to_string();
        }
    }
    if let Some(stem) = word.strip_suffix("lves") {
        return format!("{stem}lf");
    }
    if let Some(stem) = word.strip_suffix("ves") {
        return format!("{stem}fe");
    }
    if word.ends_with('s') && !word.ends_with("ss") {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

/// Heuristically decide whether `word` is a plural form.
pub fn is_plural(word: &str, custom_rules: Option<&BTreeMap<String, String>>) -> bool {
    if custom_rules.is_some_and(|rules| rules.contains_key(word)) {
        return true;
    }
    if irregular_singular(word).is_some() {
        return true;
    }

    if ends_with_any(word, &["ies", "ves", "en"]) {
        return true;
    }
    if let Some(stem) = word.strip_suffix("es") {
        if !ends_with_any(stem, SIBILANT_ENDINGS) {
            return false;
        }
    }
    word.ends_with('s') && !ends_with_any(word, &["ss", "us"])
}

/// Convert a snake_case word to CamelCase.
///
/// Each `_`-separated part gets an uppercase first letter and lowercase rest.
pub fn to_camel_case(snake_word: &str) -> String {
    let mut out = String::with_capacity(snake_word.len());
    for part in snake_word.split('_') {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            for c in chars {
                out.extend(c.to_lowercase());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAIRS: &[(&str, &str)] = &[
        ("bus", "buses"),
        ("city", "cities"),
        ("fox", "foxes"),
        ("woman", "women"),
        ("child", "children"),
        ("ox", "oxen"),
        ("sky", "skies"),
        ("box", "boxes"),
        ("man", "men"),
        ("wolf", "wolves"),
        ("knife", "knives"),
        ("car", "cars"),
        ("day", "days"),
    ];

    #[test]
    fn test_to_plural() {
        for (singular, plural) in PAIRS {
            assert_eq!(to_plural(singular, None), *plural, "plural of {singular}");
        }
    }

    #[test]
    fn test_to_singular() {
        for (singular, plural) in PAIRS {
            assert_eq!(to_singular(plural, None), *singular, "singular of {plural}");
        }
    }

    #[test]
    fn test_is_plural() {
        for (singular, plural) in PAIRS {
            assert!(is_plural(plural, None), "{plural} should be plural");
            assert!(!is_plural(singular, None), "{singular} should be singular");
        }
        assert!(!is_plural("class", None));
        assert!(!is_plural("status", None));
    }

    #[test]
    fn test_plural_passthrough() {
        assert_eq!(to_plural("cars", None), "cars");
        assert_eq!(to_plural("children", None), "children");
    }

    #[test]
    fn test_table_names() {
        assert_eq!(to_singular("clients_cars", None), "clients_car");
        assert_eq!(to_singular("bom_link", None), "bom_link");
        assert_eq!(to_singular("invoice", None), "invoice");
        assert_eq!(to_singular("company", None), "company");
        assert_eq!(to_plural("company", None), "companies");
        assert_eq!(to_plural("invoice", None), "invoices");
    }

    #[test]
    fn test_custom_rules_take_precedence() {
        let plurals = BTreeMap::from([("person".to_string(), "people".to_string())]);
        assert_eq!(to_plural("person", Some(&plurals)), "people");

        let singulars = BTreeMap::from([
            ("people".to_string(), "person".to_string()),
            ("children".to_string(), "kid".to_string()),
        ]);
        assert_eq!(to_singular("people", Some(&singulars)), "person");
        assert_eq!(to_singular("children", Some(&singulars)), "kid");
        assert!(is_plural("people", Some(&singulars)));
    }

    #[test]
    fn test_to_camel_case() {
        assert_eq!(to_camel_case("uno_dUE_tre"), "UnoDueTre");
        assert_eq!(to_camel_case("car"), "Car");
        assert_eq!(to_camel_case("clients_car"), "ClientsCar");
        assert_eq!(to_camel_case("bom_link"), "BomLink");
        assert_eq!(to_camel_case(""), "");
    }
}
