//! Stopword lists.

use ahash::{AHashMap, AHashSet};
use lazy_static::lazy_static;

use crate::analysis::tokenizer::normalize;
use crate::error::{Result, SorrelError};

/// Decides whether a normalized word is too common to index or search.
pub trait Stopper: Send + Sync {
    fn is_stopword(&self, word: &str) -> bool;
}

const ENGLISH: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between",
    "both", "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during",
    "each", "few", "for", "from", "further", "had", "has", "have", "having", "he", "her",
    "here", "hers", "herself", "him", "himself", "his", "how", "i", "if", "in", "into",
    "is", "it", "its", "itself", "me", "more", "most", "my", "myself", "no", "nor", "not",
    "of", "off", "on", "once", "only", "or", "other", "ought", "our", "ours", "ourselves",
    "out", "over", "own", "same", "she", "should", "so", "some", "such", "than", "that",
    "the", "their", "theirs", "them", "themselves", "then", "there", "these", "they",
    "this", "those", "through", "to", "too", "under", "until", "up", "very", "was", "we",
    "were", "what", "when", "where", "which", "while", "who", "whom", "why", "with",
    "would", "you", "your", "yours", "yourself", "yourselves",
];

const FRENCH: &[&str] = &[
    "au", "aux", "avec", "ce", "ces", "dans", "de", "des", "du", "elle", "en", "et", "eux",
    "il", "je", "la", "le", "les", "leur", "lui", "ma", "mais", "me", "même", "mes", "moi",
    "mon", "ne", "nos", "notre", "nous", "on", "ou", "par", "pas", "pour", "qu", "que",
    "qui", "sa", "se", "ses", "son", "sur", "ta", "te", "tes", "toi", "ton", "tu", "un",
    "une", "vos", "votre", "vous", "c", "d", "j", "l", "à", "m", "n", "s", "t", "y", "été",
    "étée", "être", "est", "sont", "suis", "était",
];

const GERMAN: &[&str] = &[
    "aber", "alle", "als", "also", "am", "an", "auch", "auf", "aus", "bei", "bin", "bis",
    "bist", "da", "damit", "dann", "das", "dass", "dem", "den", "der", "des", "die",
    "dies", "dir", "doch", "du", "durch", "ein", "eine", "einem", "einen", "einer", "es",
    "für", "hat", "hatte", "ich", "ihr", "im", "in", "ist", "ja", "jede", "kann", "kein",
    "man", "mich", "mir", "mit", "nach", "nicht", "noch", "nun", "nur", "ob", "oder",
    "sich", "sie", "sind", "so", "über", "um", "und", "uns", "unter", "vom", "von", "vor",
    "war", "was", "weil", "wenn", "wer", "wie", "wir", "wird", "zu", "zum", "zur",
];

const SPANISH: &[&str] = &[
    "a", "al", "algo", "como", "con", "de", "del", "el", "ella", "ellos", "en", "era",
    "es", "esa", "ese", "eso", "esta", "está", "este", "esto", "fue", "ha", "hay", "la",
    "las", "le", "les", "lo", "los", "más", "me", "mi", "muy", "nada", "ni", "no", "nos",
    "o", "para", "pero", "por", "porque", "que", "qué", "se", "sea", "si", "sí", "sin",
    "sobre", "son", "su", "sus", "también", "te", "tu", "un", "una", "uno", "y", "ya",
    "yo",
];

const ITALIAN: &[&str] = &[
    "a", "ad", "al", "alla", "alle", "anche", "che", "chi", "ci", "come", "con", "da",
    "dal", "dalla", "dei", "del", "della", "delle", "di", "e", "è", "ed", "gli", "ha",
    "ho", "i", "il", "in", "io", "la", "le", "lei", "lo", "loro", "lui", "ma", "mi", "mio",
    "ne", "nei", "nel", "nella", "noi", "non", "o", "per", "più", "quella", "quello",
    "questa", "questo", "se", "si", "sono", "su", "sua", "suo", "tra", "tu", "un", "una",
    "uno", "voi",
];

const DUTCH: &[&str] = &[
    "aan", "al", "als", "bij", "dan", "dat", "de", "der", "deze", "die", "dit", "doch",
    "door", "een", "en", "er", "had", "heb", "hem", "het", "hij", "hoe", "hun", "ik", "in",
    "is", "je", "kan", "maar", "me", "men", "met", "mij", "na", "naar", "niet", "nog",
    "nu", "of", "om", "omdat", "ons", "ook", "op", "over", "te", "tot", "uit", "van",
    "veel", "voor", "want", "was", "wat", "we", "wel", "werd", "wie", "wij", "worden",
    "zal", "ze", "zich", "zij", "zijn", "zo", "zou",
];

const PORTUGUESE: &[&str] = &[
    "a", "ao", "aos", "as", "com", "como", "da", "das", "de", "do", "dos", "e", "é", "ela",
    "ele", "eles", "em", "entre", "era", "essa", "esse", "esta", "este", "eu", "foi",
    "há", "isso", "isto", "já", "lhe", "mais", "mas", "me", "mesmo", "meu", "minha",
    "muito", "na", "não", "nas", "nem", "no", "nos", "nós", "o", "os", "ou", "para",
    "pela", "pelo", "por", "qual", "quando", "que", "quem", "se", "sem", "seu", "sua",
    "também", "te", "tem", "um", "uma", "você",
];

lazy_static! {
    static ref STOPWORDS: AHashMap<&'static str, &'static [&'static str]> = {
        let mut m = AHashMap::new();
        m.insert("english", ENGLISH);
        m.insert("french", FRENCH);
        m.insert("german", GERMAN);
        m.insert("spanish", SPANISH);
        m.insert("italian", ITALIAN);
        m.insert("dutch", DUTCH);
        m.insert("portuguese", PORTUGUESE);
        m
    };
}

/// Canonical language name for a name or ISO 639-1 code.
pub fn canonical_language(language: &str) -> String {
    let language = language.trim().to_lowercase();
    match language.as_str() {
        "en" => "english",
        "fr" => "french",
        "de" => "german",
        "es" => "spanish",
        "it" => "italian",
        "nl" => "dutch",
        "pt" => "portuguese",
        other => other,
    }
    .to_string()
}

/// Whether bundled stopword data exists for a language.
pub fn has_stopwords(language: &str) -> bool {
    STOPWORDS.contains_key(canonical_language(language).as_str())
}

/// A stopper backed by a set of words.
#[derive(Debug, Clone, Default)]
pub struct WordListStopper {
    words: AHashSet<String>,
}

impl WordListStopper {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words.into_iter().map(|w| normalize(w.as_ref())).collect(),
        }
    }

    /// The bundled list for a language.
    pub fn for_language(language: &str) -> Result<Self> {
        let canonical = canonical_language(language);
        STOPWORDS
            .get(canonical.as_str())
            .map(|words| Self::new(words.iter()))
            .ok_or_else(|| SorrelError::unsupported_language(language))
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Stopper for WordListStopper {
    fn is_stopword(&self, word: &str) -> bool {
        self.words.contains(word)
    }
}
