use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Independently toggleable query-syntax features.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct QueryFlags: u32 {
        /// `AND`, `OR`, `NOT`, `XOR` and parentheses.
        const BOOLEAN = 1;
        /// Quoted phrases.
        const PHRASE = 1 << 1;
        /// `+required` and `-excluded` words.
        const LOVEHATE = 1 << 2;
        /// Boolean operators also in lower case.
        const BOOLEAN_ANY_CASE = 1 << 3;
        /// `term*` expands to every indexed term with that prefix.
        const WILDCARD = 1 << 4;
        /// Queries made only of `NOT` clauses.
        const PURE_NOT = 1 << 5;
        /// Look up spelling corrections for unknown words.
        const SPELLING_CORRECTION = 1 << 7;
        /// Expand each word to its synonym group.
        const SYNONYM = 1 << 9;
    }
}

impl Default for QueryFlags {
    fn default() -> Self {
        QueryFlags::BOOLEAN
            | QueryFlags::BOOLEAN_ANY_CASE
            | QueryFlags::WILDCARD
            | QueryFlags::LOVEHATE
            | QueryFlags::SPELLING_CORRECTION
            | QueryFlags::PHRASE
    }
}
