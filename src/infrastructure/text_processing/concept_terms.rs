use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

static SENTENCE_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?\n]+").unwrap());

const MIN_TERM_CHARS: usize = 3;
const MAX_TERM_CHARS: usize = 25;

const ENGLISH_STOPWORDS: &[&str] = &[
    "the", "and", "a", "an", "to", "of", "in", "for", "on", "with", "at", "by", "from", "about",
    "into", "over", "after", "under", "above", "below", "is", "are", "was", "were", "be", "been",
    "being", "have", "has", "had", "do", "does", "did", "but", "if", "or", "because", "as",
    "until", "while", "than", "that", "this", "these", "those", "they", "them", "their", "there",
    "here", "where", "when", "what", "who", "whom", "whose", "which", "how", "why", "would",
    "could", "should", "might", "may", "must", "shall", "can", "will", "just", "also", "very",
    "too", "such", "so", "not", "no", "nor", "only", "own", "same", "other", "another", "each",
    "every", "all", "some", "any", "many", "much", "more", "most", "less", "few", "both",
    "either", "neither", "between", "among", "during", "before", "again", "once", "never",
    "always", "often", "sometimes", "now", "then", "soon", "today", "tomorrow", "yesterday",
    "thing", "things", "way", "ways", "time", "times", "kind", "kinds", "sort", "sorts", "get",
    "got", "make", "made", "take", "took", "come", "came", "know", "knew", "think", "thought",
    "say", "said", "see", "saw", "look", "looked", "well", "back", "even", "still", "yet", "out",
    "off", "down", "away", "around", "through", "within", "without", "really", "quite", "rather",
    "me", "my", "mine", "you", "your", "yours", "him", "his", "she", "her", "hers", "its", "we",
    "us", "our", "ours",
];

const SPANISH_STOPWORDS: &[&str] = &[
    "el", "la", "los", "las", "un", "una", "unos", "unas", "a", "ante", "bajo", "con", "contra",
    "de", "del", "desde", "durante", "en", "entre", "hacia", "hasta", "mediante", "para", "por",
    "según", "sin", "sobre", "tras", "y", "e", "ni", "o", "u", "pero", "mas", "sino", "que",
    "porque", "pues", "aunque", "si", "como", "cuando", "donde", "mientras", "ya", "ser", "estar",
    "haber", "tener", "hacer", "ir", "venir", "dar", "decir", "poder", "deber", "querer", "saber",
    "ver", "fue", "era", "había", "es", "son", "está", "están", "hay", "yo", "tú", "él", "ella",
    "nosotros", "vosotros", "ellos", "ellas", "me", "te", "se", "nos", "os", "lo", "le", "les",
    "mi", "tu", "su", "nuestro", "vuestro", "este", "esta", "esto", "estos", "estas", "ese",
    "esa", "eso", "esos", "esas", "aquel", "aquella", "no", "sí", "también", "tampoco", "muy",
    "más", "menos", "tan", "tanto", "bastante", "poco", "mucho", "algo", "nada", "todo", "todos",
    "siempre", "nunca", "bien", "mal", "mejor", "peor", "ahora", "antes", "después", "luego",
    "entonces", "aquí", "ahí", "allí", "hoy", "ayer", "mañana", "vez", "veces", "cosa", "cosas",
    "parte", "partes", "tiempo", "momento", "forma", "manera", "modo", "caso", "casos", "otro",
    "otra", "otros", "otras", "mismo", "misma", "cada", "cualquier", "tal",
];

const SPANISH_INDICATORS: &[&str] = &[
    "el", "la", "de", "que", "y", "en", "un", "es", "se", "no", "te", "lo", "le", "da", "su",
    "por", "son", "con", "para", "al", "del", "los", "las", "pero", "español", "hablar", "hacer",
    "trabajo", "tiempo", "persona", "año", "gobierno",
];

static STOPWORDS_EN: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| ENGLISH_STOPWORDS.iter().copied().collect());

static STOPWORDS_ES: LazyLock<HashSet<String>> =
    LazyLock::new(|| SPANISH_STOPWORDS.iter().map(|w| normalize_word(w)).collect());

static INDICATORS_ES: LazyLock<HashSet<String>> =
    LazyLock::new(|| SPANISH_INDICATORS.iter().map(|w| normalize_word(w)).collect());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    Spanish,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "english",
            Language::Spanish => "spanish",
        }
    }

    pub fn from_hint(hint: &str) -> Option<Language> {
        match hint.to_lowercase().as_str() {
            "en" | "english" => Some(Language::English),
            "es" | "spanish" | "español" | "espanol" => Some(Language::Spanish),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConceptTerm {
    pub term: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConceptEdge {
    pub source: String,
    pub target: String,
    pub weight: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConceptMap {
    pub language: Language,
    pub terms: Vec<ConceptTerm>,
    pub edges: Vec<ConceptEdge>,
}

pub fn normalize_word(word: &str) -> String {
    word.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn detect_language(text: &str) -> Language {
    let mut total = 0usize;
    let mut hits = 0usize;
    for word in text.split_whitespace() {
        total += 1;
        if INDICATORS_ES.contains(normalize_word(word).as_str()) {
            hits += 1;
        }
    }
    // More than 10% indicator words reads as Spanish.
    if total > 0 && hits * 10 > total {
        Language::Spanish
    } else {
        Language::English
    }
}

pub fn extract_concepts(text: &str, language_hint: Option<&str>, max_terms: usize) -> ConceptMap {
    let language = language_hint
        .and_then(Language::from_hint)
        .unwrap_or_else(|| detect_language(text));

    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut sentence_terms: Vec<HashSet<String>> = Vec::new();

    for sentence in SENTENCE_BREAK.split(text) {
        let sentence = sentence.trim();
        if sentence.is_empty() {
            continue;
        }
        let mut seen: HashSet<String> = HashSet::new();
        for token in sentence.split(|c: char| !c.is_alphabetic()) {
            if token.chars().count() < MIN_TERM_CHARS {
                continue;
            }
            let normalized = normalize_word(token);
            if is_stopword(&normalized, language) {
                continue;
            }
            let term = singularize(&normalized, language);
            let len = term.chars().count();
            if len < MIN_TERM_CHARS || len > MAX_TERM_CHARS || is_stopword(&term, language) {
                continue;
            }
            *counts.entry(term.clone()).or_insert(0) += 1;
            seen.insert(term);
        }
        if seen.len() >= 2 {
            sentence_terms.push(seen);
        }
    }

    let mut terms: Vec<ConceptTerm> = counts
        .into_iter()
        .map(|(term, count)| ConceptTerm { term, count })
        .collect();
    terms.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.term.cmp(&b.term)));
    terms.truncate(max_terms);

    let kept: HashSet<&str> = terms.iter().map(|t| t.term.as_str()).collect();
    let mut weights: HashMap<(String, String), usize> = HashMap::new();
    for present in &sentence_terms {
        let mut in_sentence: Vec<&str> = present
            .iter()
            .map(String::as_str)
            .filter(|t| kept.contains(t))
            .collect();
        in_sentence.sort_unstable();
        for i in 0..in_sentence.len() {
            for j in (i + 1)..in_sentence.len() {
                let key = (in_sentence[i].to_string(), in_sentence[j].to_string());
                *weights.entry(key).or_insert(0) += 1;
            }
        }
    }

    let mut edges: Vec<ConceptEdge> = weights
        .into_iter()
        .map(|((source, target), weight)| ConceptEdge {
            source,
            target,
            weight,
        })
        .collect();
    edges.sort_by(|a, b| {
        b.weight
            .cmp(&a.weight)
            .then_with(|| a.source.cmp(&b.source))
            .then_with(|| a.target.cmp(&b.target))
    });

    ConceptMap {
        language,
        terms,
        edges,
    }
}

fn is_stopword(word: &str, language: Language) -> bool {
    match language {
        Language::English => STOPWORDS_EN.contains(word),
        Language::Spanish => STOPWORDS_ES.contains(word),
    }
}

fn singularize(word: &str, language: Language) -> String {
    match language {
        Language::English => singularize_english(word),
        Language::Spanish => singularize_spanish(word),
    }
}

fn singularize_english(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies") {
        if stem.chars().count() >= 2 {
            return format!("{}y", stem);
        }
    }
    for suffix in ["sses", "shes", "ches", "xes", "zes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix('s') {
        if stem.chars().count() >= MIN_TERM_CHARS {
            return stem.to_string();
        }
    }
    word.to_string()
}

fn singularize_spanish(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ces") {
        if stem.chars().count() >= 2 {
            return format!("{}z", stem);
        }
    }
    if let Some(stem) = word.strip_suffix("es") {
        let ends_in_consonant = stem.chars().last().is_some_and(|c| !is_spanish_vowel(c));
        if ends_in_consonant && stem.chars().count() >= MIN_TERM_CHARS {
            return stem.to_string();
        }
    }
    if let Some(stem) = word.strip_suffix('s') {
        if stem.chars().count() >= MIN_TERM_CHARS {
            return stem.to_string();
        }
    }
    word.to_string()
}

fn is_spanish_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}
