mod concept_terms;

pub use concept_terms::{
    ConceptEdge, ConceptMap, ConceptTerm, Language, detect_language, extract_concepts,
    normalize_word,
};
