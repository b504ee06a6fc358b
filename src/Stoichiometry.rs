/// Parsing of chemical formulas into element counts.
/// Handles parenthetical groups of any nesting depth, hydrate suffixes ("CuSO4·5H2O"),
/// phase marks ("H2O(g)") and user-defined chemical groups ("Me" = CH3).
///
///  # Examples
/// ```
/// use FabStoich::Stoichiometry::formula_parser::parse_formula;
/// let counts = parse_formula("Ca3(PO4)2");
/// assert_eq!(counts.symbols(), vec!["Ca", "P", "O"]);
/// assert_eq!(counts.counts(), vec![3, 2, 8]);
/// ```
pub mod formula_parser;
/// Atomic and mass fractions, molar masses and element composition matrix
///
///  # Examples
/// ```
/// use FabStoich::Stoichiometry::atomic_masses::PeriodicTable;
/// use FabStoich::Stoichiometry::composition::{CompositionCalculator, print_composition};
/// use FabStoich::Stoichiometry::formula_parser::parse_formula;
/// let calculator = CompositionCalculator::with_masses(&PeriodicTable);
/// let composition = calculator.compute(&parse_formula("Si3N4")).unwrap();
/// print_composition(&composition);
/// ```
pub mod composition;
/// standard atomic masses and user mass tables
pub mod atomic_masses;
pub mod errors;
/// material records holding a formula and its elemental composition
///
///  # Examples
/// ```
/// use FabStoich::Stoichiometry::material_record::MaterialRecord;
/// let mut record = MaterialRecord::new("PECVD nitride", "Si3N4");
/// record.normalize().unwrap();
/// println!("{:?}", record.elemental_composition);
/// ```
pub mod material_record;
