//! # Formula Parser
//!
//! Turns a chemical formula such as `"Ca3(PO4)2"` or `"CuSO4·5H2O"` into an ordered list of
//! element symbols with their integer counts.
//!
//! Parsing stages:
//! 1. trailing phase marks like `(s)` or `(g)` are removed
//! 2. the formula is split at the first hydrate separator into main part and hydrate part
//! 3. innermost parenthetical groups `(...)n` of the main part are repeated n times until no group is left
//! 4. the main part is scanned for tokens "uppercase letter, lowercase letters, digits"
//! 5. a hydrate part of the form `nH2O` adds n water molecules, any other hydrate part is dropped
//!
//! Parsing never fails: a blank or elementless formula gives an empty result and a malformed
//! hydrate suffix is ignored. Use `validate_formula` to report such problems instead.
use crate::Stoichiometry::errors::StoichError;
use log::{debug, warn};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

/// characters separating the main compound from the water of crystallization
pub const HYDRATE_SEPARATORS: [char; 5] = ['·', '•', '∙', '*', '.'];
const WATER: &str = "H2O";
/// longest text a single group may be repeated into; longer groups are multiplied token by token
pub const MAX_GROUP_EXPANSION: usize = 4096;

static TOKEN_RE: OnceLock<Regex> = OnceLock::new();
static GROUP_RE: OnceLock<Regex> = OnceLock::new();
static HYDRATE_RE: OnceLock<Regex> = OnceLock::new();
static PHASE_RE: OnceLock<Regex> = OnceLock::new();

fn token_regex() -> &'static Regex {
    TOKEN_RE.get_or_init(|| Regex::new(r"([A-Z][a-z]*)([0-9]*)").expect("token pattern"))
}
// innermost group: no parentheses inside
fn group_regex() -> &'static Regex {
    GROUP_RE.get_or_init(|| Regex::new(r"\(([^()]*)\)([0-9]*)").expect("group pattern"))
}
fn hydrate_regex() -> &'static Regex {
    HYDRATE_RE.get_or_init(|| Regex::new(r"^\s*([0-9]*)\s*H2O\s*$").expect("hydrate pattern"))
}
fn phase_regex() -> &'static Regex {
    PHASE_RE.get_or_init(|| Regex::new(r"\((?:s|l|g|c|cr|aq)\)\s*$").expect("phase pattern"))
}

/// one element symbol and its number of atoms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementCount {
    pub symbol: String,
    pub count: usize,
}

/// Element counts in the order each symbol was first seen.
/// Symbols are unique and every count is at least 1.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementCounts {
    entries: Vec<ElementCount>,
}

impl ElementCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: &[(&str, usize)]) -> Self {
        let mut counts = Self::new();
        for (symbol, count) in pairs {
            counts.add(symbol, *count);
        }
        counts
    }
    /// adds atoms to an existing entry or appends a new one; zero counts are ignored
    pub fn add(&mut self, symbol: &str, count: usize) {
        if count == 0 {
            return;
        }
        match self.entries.iter_mut().find(|entry| entry.symbol == symbol) {
            Some(entry) => entry.count = entry.count.saturating_add(count),
            None => self.entries.push(ElementCount {
                symbol: symbol.to_string(),
                count,
            }),
        }
    }

    pub fn get(&self, symbol: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|entry| entry.symbol == symbol)
            .map(|entry| entry.count)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    /// total number of atoms
    pub fn total(&self) -> usize {
        self.entries
            .iter()
            .fold(0usize, |acc, entry| acc.saturating_add(entry.count))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ElementCount> {
        self.entries.iter()
    }

    pub fn symbols(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.symbol.as_str()).collect()
    }

    pub fn counts(&self) -> Vec<usize> {
        self.entries.iter().map(|entry| entry.count).collect()
    }

    pub fn to_hashmap(&self) -> HashMap<String, usize> {
        self.entries
            .iter()
            .map(|entry| (entry.symbol.clone(), entry.count))
            .collect()
    }
    /// every count multiplied by `factor`
    pub fn scaled(&self, factor: usize) -> Self {
        let mut scaled = Self::new();
        for entry in self.entries.iter() {
            scaled.add(&entry.symbol, entry.count.saturating_mul(factor));
        }
        scaled
    }
}

impl<'a> IntoIterator for &'a ElementCounts {
    type Item = &'a ElementCount;
    type IntoIter = std::slice::Iter<'a, ElementCount>;
    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Chemical groups abbreviations and their atoms, e.g. {"Me": {C:1, H:3}}
pub type ChemicalGroups = HashMap<String, ElementCounts>;

/// Parser configured with optional chemical group abbreviations
#[derive(Debug, Clone, Default)]
pub struct FormulaParser {
    pub groups: Option<ChemicalGroups>,
}

impl FormulaParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_groups(groups: ChemicalGroups) -> Self {
        Self {
            groups: Some(groups),
        }
    }

    pub fn parse(&self, formula: &str) -> ElementCounts {
        parse_with_groups(formula, self.groups.as_ref())
    }
}

// digits overflowing usize saturate instead of failing
fn parse_count(digits: &str) -> usize {
    if digits.is_empty() {
        return 1;
    }
    match digits.parse() {
        Ok(count) => count,
        Err(_) => {
            warn!("count '{}' does not fit into usize, saturated to {}", digits, usize::MAX);
            usize::MAX
        }
    }
}

/// removes a trailing phase annotation such as "(s)", "(l)", "(g)", "(aq)"
pub fn strip_phase_marks(formula: &str) -> String {
    phase_regex().replace(formula.trim(), "").into_owned()
}

/// Splits at the first hydrate separator: "CuSO4·5H2O" -> ("CuSO4", Some("5H2O"))
pub fn split_hydrate(formula: &str) -> (&str, Option<&str>) {
    match formula
        .char_indices()
        .find(|(_, c)| HYDRATE_SEPARATORS.contains(c))
    {
        Some((i, separator)) => (
            &formula[..i],
            Some(&formula[i + separator.len_utf8()..]),
        ),
        None => (formula, None),
    }
}

fn repeat_group(content: &str, multiplier: usize) -> String {
    if content.len().saturating_mul(multiplier) <= MAX_GROUP_EXPANSION {
        return content.repeat(multiplier);
    }
    debug!("group '{}' x{} multiplied token by token", content, multiplier);
    let mut expanded = String::new();
    for caps in token_regex().captures_iter(content) {
        let count = parse_count(&caps[2]).saturating_mul(multiplier);
        if count > 0 {
            expanded.push_str(&caps[1]);
            expanded.push_str(&count.to_string());
        }
    }
    expanded
}

/// Expands parenthetical groups from the innermost outwards by repeating their text:
/// "Ca3(PO4)2" -> "Ca3PO4PO4", "Si(OH)2" -> "SiOHOH".
/// A group whose repetition would exceed `MAX_GROUP_EXPANSION` bytes has each token's count
/// multiplied instead ("(CH3)5000" -> "C5000H15000"), which gives the same counts unless the
/// group text runs into its neighbours, as in "(C)l".
/// Unbalanced parentheses are left in place.
pub fn expand_parentheses(formula: &str) -> String {
    let mut expanded = formula.to_string();
    while group_regex().is_match(&expanded) {
        expanded = group_regex()
            .replace_all(&expanded, |caps: &Captures| {
                repeat_group(&caps[1], parse_count(&caps[2]))
            })
            .into_owned();
        debug!("expanded group: {}", expanded);
    }
    expanded
}

/// scans "uppercase letter + lowercase letters + digits" tokens and accumulates them
pub fn tokenize_into(formula: &str, counts: &mut ElementCounts) {
    for caps in token_regex().captures_iter(formula) {
        counts.add(&caps[1], parse_count(&caps[2]));
    }
}

/// number of water molecules in a hydrate suffix like "5H2O", None if the suffix has another shape
pub fn hydrate_multiplier(hydrate: &str) -> Option<usize> {
    hydrate_regex()
        .captures(hydrate)
        .map(|caps| parse_count(&caps[1]))
}

// Chemical formulae may contain special names for chemical groups, e.g. Me (methyl) group, which is converted into {"C":1, "H":3}
fn handle_groups(counts: ElementCounts, groups: Option<&ChemicalGroups>) -> ElementCounts {
    let Some(groups) = groups else {
        return counts;
    };
    let mut resolved = ElementCounts::new();
    for entry in counts.iter() {
        match groups.get(&entry.symbol) {
            Some(atomic_composition) => {
                for atom in atomic_composition.iter() {
                    resolved.add(&atom.symbol, atom.count.saturating_mul(entry.count));
                }
            }
            None => resolved.add(&entry.symbol, entry.count),
        }
    }
    resolved
}

/// Parses a chemical formula into element counts in first-occurrence order.
///
/// # Examples
/// ```
/// use FabStoich::Stoichiometry::formula_parser::parse_formula;
/// let counts = parse_formula("CuSO4·5H2O");
/// assert_eq!(counts.symbols(), vec!["Cu", "S", "O", "H"]);
/// assert_eq!(counts.counts(), vec![1, 1, 9, 10]);
/// ```
pub fn parse_formula(formula: &str) -> ElementCounts {
    parse_with_groups(formula, None)
}

/// Same as `parse_formula`, resolving group abbreviations such as "Me" or "Ph" into their atoms
pub fn parse_with_groups(formula: &str, groups: Option<&ChemicalGroups>) -> ElementCounts {
    debug!("parsing formula: {}", formula);
    let cleaned = strip_phase_marks(formula);
    let (main_part, hydrate_part) = split_hydrate(&cleaned);

    let expanded = expand_parentheses(main_part);
    let mut counts = ElementCounts::new();
    tokenize_into(&expanded, &mut counts);

    if let Some(hydrate) = hydrate_part {
        match hydrate_multiplier(hydrate) {
            Some(n) => {
                let mut water = ElementCounts::new();
                tokenize_into(WATER, &mut water);
                for atom in water.scaled(n).iter() {
                    counts.add(&atom.symbol, atom.count);
                }
            }
            None => warn!(
                "hydrate suffix '{}' of formula '{}' is not of the form nH2O, ignored",
                hydrate, formula
            ),
        }
    }
    let counts = handle_groups(counts, groups);
    debug!("formula {} parsed into {:?}", formula, counts);
    counts
}

/// Strict check of a formula, reporting what `parse_formula` would silently skip
pub fn validate_formula(formula: &str) -> Result<(), StoichError> {
    let cleaned = strip_phase_marks(formula);
    if cleaned.trim().is_empty() {
        return Err(StoichError::EmptyFormula);
    }
    let (main_part, hydrate_part) = split_hydrate(&cleaned);

    let mut depth: i64 = 0;
    let mut previous: Option<char> = None;
    for (position, c) in main_part.chars().enumerate() {
        let accepted = match c {
            '(' => {
                depth += 1;
                true
            }
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(StoichError::UnbalancedParentheses(formula.to_string()));
                }
                true
            }
            'A'..='Z' => true,
            'a'..='z' => previous.is_some_and(|p| p.is_ascii_alphabetic()),
            '0'..='9' => previous.is_some_and(|p| p.is_ascii_alphanumeric() || p == ')'),
            _ => c.is_whitespace(),
        };
        if !accepted {
            return Err(StoichError::UnexpectedCharacter {
                formula: formula.to_string(),
                character: c,
                position,
            });
        }
        previous = Some(c);
    }
    if depth != 0 {
        return Err(StoichError::UnbalancedParentheses(formula.to_string()));
    }
    if let Some(hydrate) = hydrate_part {
        if hydrate_multiplier(hydrate).is_none() {
            return Err(StoichError::MalformedHydrate(hydrate.to_string()));
        }
    }
    if parse_formula(formula).is_empty() {
        return Err(StoichError::EmptyFormula);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_formulas() {
        let counts = parse_formula("Al2O3");
        assert_eq!(counts, ElementCounts::from_pairs(&[("Al", 2), ("O", 3)]));

        let counts = parse_formula("NaCl");
        assert_eq!(counts, ElementCounts::from_pairs(&[("Na", 1), ("Cl", 1)]));

        let counts = parse_formula("C6H8O6");
        assert_eq!(counts.counts(), vec![6, 8, 6]);
    }

    #[test]
    fn test_total_matches_written_atoms() {
        for (formula, atoms) in [("SiH4", 5), ("Si3N4", 7), ("GaAs", 2), ("CH3CH2OH", 9), ("TiN", 2)] {
            assert_eq!(parse_formula(formula).total(), atoms, "{}", formula);
        }
    }

    #[test]
    fn test_repeated_symbols_are_summed() {
        let counts = parse_formula("C5H6OOH");
        assert_eq!(counts, ElementCounts::from_pairs(&[("C", 5), ("H", 7), ("O", 2)]));
        let counts = parse_formula("CH3COOH");
        assert_eq!(counts, ElementCounts::from_pairs(&[("C", 2), ("H", 4), ("O", 2)]));
    }

    #[test]
    fn test_parentheses() {
        let counts = parse_formula("Si(OH)2");
        assert_eq!(counts, ElementCounts::from_pairs(&[("Si", 1), ("O", 2), ("H", 2)]));

        let counts = parse_formula("Ca3(PO4)2");
        assert_eq!(counts, ElementCounts::from_pairs(&[("Ca", 3), ("P", 2), ("O", 8)]));

        let counts = parse_formula("Na(NO3)2");
        assert_eq!(counts.to_hashmap().get("O"), Some(&6));
        // group without multiplier
        let counts = parse_formula("(CH3)");
        assert_eq!(counts, ElementCounts::from_pairs(&[("C", 1), ("H", 3)]));
    }

    #[test]
    fn test_nested_parentheses() {
        let counts = parse_formula("Al2(Si(OH)3)2");
        assert_eq!(
            counts,
            ElementCounts::from_pairs(&[("Al", 2), ("Si", 2), ("O", 6), ("H", 6)])
        );
        let counts = parse_formula("((CH3)2N)3P");
        assert_eq!(
            counts,
            ElementCounts::from_pairs(&[("C", 6), ("H", 18), ("N", 3), ("P", 1)])
        );
    }

    #[test]
    fn test_expand_parentheses_repeats_group_text() {
        assert_eq!(expand_parentheses("Ca3(PO4)2"), "Ca3PO4PO4");
        assert_eq!(expand_parentheses("Si(OH)2"), "SiOHOH");
        assert_eq!(expand_parentheses("((CH3)2N)3"), "CH3CH3NCH3CH3NCH3CH3N");
        // zero multiplier removes the group
        assert_eq!(expand_parentheses("Si(OH)0"), "Si");
    }

    #[test]
    fn test_group_text_joins_its_neighbours() {
        assert_eq!(expand_parentheses("(C)l"), "Cl");
        assert_eq!(parse_formula("(C)l"), ElementCounts::from_pairs(&[("Cl", 1)]));
        assert_eq!(
            parse_formula("(C)2l"),
            ElementCounts::from_pairs(&[("C", 1), ("Cl", 1)])
        );
    }

    #[test]
    fn test_large_group_multiplier_is_bounded() {
        assert_eq!(expand_parentheses("(CH3)5000"), "C5000H15000");
        let counts = parse_formula("Si((CH3)1000)1000");
        assert_eq!(
            counts,
            ElementCounts::from_pairs(&[("Si", 1), ("C", 1_000_000), ("H", 3_000_000)])
        );
    }

    #[test]
    fn test_overflowing_count_saturates() {
        let counts = parse_formula("H99999999999999999999999O");
        assert_eq!(counts.get("H"), Some(usize::MAX));
        assert_eq!(counts.get("O"), Some(1));
        assert_eq!(counts.total(), usize::MAX);
    }

    #[test]
    fn test_hydrate() {
        let counts = parse_formula("CuSO4·5H2O");
        assert_eq!(
            counts,
            ElementCounts::from_pairs(&[("Cu", 1), ("S", 1), ("O", 9), ("H", 10)])
        );
        let counts = parse_formula("SiO2·4H2O");
        assert_eq!(counts, ElementCounts::from_pairs(&[("Si", 1), ("O", 6), ("H", 8)]));
        // implicit single water molecule, alternative separators
        let counts = parse_formula("NaCl*H2O");
        assert_eq!(
            counts,
            ElementCounts::from_pairs(&[("Na", 1), ("Cl", 1), ("H", 2), ("O", 1)])
        );
        assert_eq!(parse_formula("CuSO4.5H2O"), parse_formula("CuSO4·5H2O"));
        assert_eq!(parse_formula("CuSO4 · 5 H2O"), parse_formula("CuSO4·5H2O"));
    }

    #[test]
    fn test_malformed_hydrate_is_ignored() {
        let counts = parse_formula("CuSO4·5NH3");
        assert_eq!(counts, parse_formula("CuSO4"));
        let counts = parse_formula("MgSO4·xH2O");
        assert_eq!(counts, parse_formula("MgSO4"));
    }

    #[test]
    fn test_hydrate_multiplier() {
        assert_eq!(hydrate_multiplier("5H2O"), Some(5));
        assert_eq!(hydrate_multiplier("H2O"), Some(1));
        assert_eq!(hydrate_multiplier(" 12 H2O "), Some(12));
        assert_eq!(hydrate_multiplier("5D2O"), None);
    }

    #[test]
    fn test_split_hydrate() {
        assert_eq!(split_hydrate("CuSO4·5H2O"), ("CuSO4", Some("5H2O")));
        assert_eq!(split_hydrate("Al2O3"), ("Al2O3", None));
    }

    #[test]
    fn test_empty_and_unrecognizable() {
        assert!(parse_formula("").is_empty());
        assert!(parse_formula("   ").is_empty());
        assert!(parse_formula("1234-+").is_empty());
        assert_eq!(parse_formula("").total(), 0);
    }

    #[test]
    fn test_zero_count_token_creates_no_entry() {
        let counts = parse_formula("H2O0");
        assert_eq!(counts, ElementCounts::from_pairs(&[("H", 2)]));
    }

    #[test]
    fn test_phase_marks() {
        assert_eq!(parse_formula("H2O(g)"), parse_formula("H2O"));
        assert_eq!(parse_formula("SiO2(s)"), parse_formula("SiO2"));
        assert_eq!(strip_phase_marks("NaCl(aq)"), "NaCl");
        // uppercase (S) is sulfur in a group, not a phase mark
        assert_eq!(parse_formula("Cu(S)2").get("S"), Some(2));
    }

    #[test]
    fn test_with_groups() {
        let groups = ChemicalGroups::from([(
            "Me".to_string(),
            ElementCounts::from_pairs(&[("C", 1), ("H", 3)]),
        )]);
        let parser = FormulaParser::with_groups(groups);

        let toluene = parser.parse("C6H5Me");
        assert_eq!(toluene, ElementCounts::from_pairs(&[("C", 7), ("H", 8)]));

        let xylene = parser.parse("C6H4(Me)2");
        assert_eq!(xylene, ElementCounts::from_pairs(&[("C", 8), ("H", 10)]));

        let tmg = parser.parse("GaMe3");
        assert_eq!(tmg, ElementCounts::from_pairs(&[("Ga", 1), ("C", 3), ("H", 9)]));
    }

    #[test]
    fn test_parse_is_idempotent() {
        let parser = FormulaParser::new();
        let first = parser.parse("Ca3(PO4)2·2H2O");
        let second = parser.parse("Ca3(PO4)2·2H2O");
        assert_eq!(first, second);
        assert_eq!(first.symbols(), vec!["Ca", "P", "O", "H"]);
    }

    #[test]
    fn test_element_counts_accumulator() {
        let mut counts = ElementCounts::new();
        counts.add("O", 2);
        counts.add("Si", 1);
        counts.add("O", 3);
        counts.add("N", 0);
        assert_eq!(counts.symbols(), vec!["O", "Si"]);
        assert_eq!(counts.get("O"), Some(5));
        assert_eq!(counts.get("N"), None);
        assert_eq!(counts.total(), 6);
        assert_eq!(counts.scaled(2).counts(), vec![10, 2]);
    }

    #[test]
    fn test_validate_formula() {
        assert!(validate_formula("Ca3(PO4)2").is_ok());
        assert!(validate_formula("CuSO4·5H2O").is_ok());
        assert!(validate_formula("H2O(g)").is_ok());
        assert!(matches!(validate_formula(""), Err(StoichError::EmptyFormula)));
        assert!(matches!(
            validate_formula("Si(OH2"),
            Err(StoichError::UnbalancedParentheses(_))
        ));
        assert!(matches!(
            validate_formula("SiOH)2"),
            Err(StoichError::UnbalancedParentheses(_))
        ));
        assert!(matches!(
            validate_formula("Al2-O3"),
            Err(StoichError::UnexpectedCharacter {
                character: '-',
                position: 3,
                ..
            })
        ));
        assert!(matches!(
            validate_formula("2H2O"),
            Err(StoichError::UnexpectedCharacter { position: 0, .. })
        ));
        assert!(matches!(
            validate_formula("CuSO4·5NH3"),
            Err(StoichError::MalformedHydrate(_))
        ));
    }
}
