//! # Atomic Mass Tables
//!
//! Lookup adapters mapping element symbols to standard atomic masses (amu).
//! - `PeriodicTable`: built-in IUPAC standard atomic weights for elements 1-118
//! - `CustomMassTable`: user-supplied masses, from a map or a JSON file
//! - `MassTable`: enum dispatching `AtomicMassLookup` over both
//!
//! The process-wide default table is built once from the mass library
//! configuration (see `library_manager`) and then only read.
use crate::Stoichiometry::errors::StoichError;
use crate::Utils::load_from_file::load_mass_table_from_file;
use crate::library_manager::with_library_manager;
use enum_dispatch::enum_dispatch;
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

// Define a struct to hold element data
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Element {
    pub number: u8,
    pub symbol: &'static str,
    pub name: &'static str,
    pub atomic_mass: f64,
}

// Standard atomic weights, conventional values; mass number of the most stable isotope for elements without stable ones
pub const ELEMENTS: &[Element] = &[
    Element { number: 1, symbol: "H", name: "Hydrogen", atomic_mass: 1.008 },
    Element { number: 2, symbol: "He", name: "Helium", atomic_mass: 4.0026 },
    Element { number: 3, symbol: "Li", name: "Lithium", atomic_mass: 6.94 },
    Element { number: 4, symbol: "Be", name: "Beryllium", atomic_mass: 9.0122 },
    Element { number: 5, symbol: "B", name: "Boron", atomic_mass: 10.81 },
    Element { number: 6, symbol: "C", name: "Carbon", atomic_mass: 12.011 },
    Element { number: 7, symbol: "N", name: "Nitrogen", atomic_mass: 14.007 },
    Element { number: 8, symbol: "O", name: "Oxygen", atomic_mass: 15.999 },
    Element { number: 9, symbol: "F", name: "Fluorine", atomic_mass: 18.998 },
    Element { number: 10, symbol: "Ne", name: "Neon", atomic_mass: 20.18 },
    Element { number: 11, symbol: "Na", name: "Sodium", atomic_mass: 22.99 },
    Element { number: 12, symbol: "Mg", name: "Magnesium", atomic_mass: 24.305 },
    Element { number: 13, symbol: "Al", name: "Aluminium", atomic_mass: 26.982 },
    Element { number: 14, symbol: "Si", name: "Silicon", atomic_mass: 28.085 },
    Element { number: 15, symbol: "P", name: "Phosphorus", atomic_mass: 30.974 },
    Element { number: 16, symbol: "S", name: "Sulfur", atomic_mass: 32.06 },
    Element { number: 17, symbol: "Cl", name: "Chlorine", atomic_mass: 35.45 },
    Element { number: 18, symbol: "Ar", name: "Argon", atomic_mass: 39.948 },
    Element { number: 19, symbol: "K", name: "Potassium", atomic_mass: 39.098 },
    Element { number: 20, symbol: "Ca", name: "Calcium", atomic_mass: 40.078 },
    Element { number: 21, symbol: "Sc", name: "Scandium", atomic_mass: 44.956 },
    Element { number: 22, symbol: "Ti", name: "Titanium", atomic_mass: 47.867 },
    Element { number: 23, symbol: "V", name: "Vanadium", atomic_mass: 50.942 },
    Element { number: 24, symbol: "Cr", name: "Chromium", atomic_mass: 51.996 },
    Element { number: 25, symbol: "Mn", name: "Manganese", atomic_mass: 54.938 },
    Element { number: 26, symbol: "Fe", name: "Iron", atomic_mass: 55.845 },
    Element { number: 27, symbol: "Co", name: "Cobalt", atomic_mass: 58.933 },
    Element { number: 28, symbol: "Ni", name: "Nickel", atomic_mass: 58.693 },
    Element { number: 29, symbol: "Cu", name: "Copper", atomic_mass: 63.546 },
    Element { number: 30, symbol: "Zn", name: "Zinc", atomic_mass: 65.38 },
    Element { number: 31, symbol: "Ga", name: "Gallium", atomic_mass: 69.723 },
    Element { number: 32, symbol: "Ge", name: "Germanium", atomic_mass: 72.63 },
    Element { number: 33, symbol: "As", name: "Arsenic", atomic_mass: 74.922 },
    Element { number: 34, symbol: "Se", name: "Selenium", atomic_mass: 78.971 },
    Element { number: 35, symbol: "Br", name: "Bromine", atomic_mass: 79.904 },
    Element { number: 36, symbol: "Kr", name: "Krypton", atomic_mass: 83.798 },
    Element { number: 37, symbol: "Rb", name: "Rubidium", atomic_mass: 85.468 },
    Element { number: 38, symbol: "Sr", name: "Strontium", atomic_mass: 87.62 },
    Element { number: 39, symbol: "Y", name: "Yttrium", atomic_mass: 88.906 },
    Element { number: 40, symbol: "Zr", name: "Zirconium", atomic_mass: 91.224 },
    Element { number: 41, symbol: "Nb", name: "Niobium", atomic_mass: 92.906 },
    Element { number: 42, symbol: "Mo", name: "Molybdenum", atomic_mass: 95.95 },
    Element { number: 43, symbol: "Tc", name: "Technetium", atomic_mass: 98.0 },
    Element { number: 44, symbol: "Ru", name: "Ruthenium", atomic_mass: 101.07 },
    Element { number: 45, symbol: "Rh", name: "Rhodium", atomic_mass: 102.91 },
    Element { number: 46, symbol: "Pd", name: "Palladium", atomic_mass: 106.42 },
    Element { number: 47, symbol: "Ag", name: "Silver", atomic_mass: 107.87 },
    Element { number: 48, symbol: "Cd", name: "Cadmium", atomic_mass: 112.41 },
    Element { number: 49, symbol: "In", name: "Indium", atomic_mass: 114.82 },
    Element { number: 50, symbol: "Sn", name: "Tin", atomic_mass: 118.71 },
    Element { number: 51, symbol: "Sb", name: "Antimony", atomic_mass: 121.76 },
    Element { number: 52, symbol: "Te", name: "Tellurium", atomic_mass: 127.6 },
    Element { number: 53, symbol: "I", name: "Iodine", atomic_mass: 126.9 },
    Element { number: 54, symbol: "Xe", name: "Xenon", atomic_mass: 131.29 },
    Element { number: 55, symbol: "Cs", name: "Caesium", atomic_mass: 132.91 },
    Element { number: 56, symbol: "Ba", name: "Barium", atomic_mass: 137.33 },
    Element { number: 57, symbol: "La", name: "Lanthanum", atomic_mass: 138.91 },
    Element { number: 58, symbol: "Ce", name: "Cerium", atomic_mass: 140.12 },
    Element { number: 59, symbol: "Pr", name: "Praseodymium", atomic_mass: 140.91 },
    Element { number: 60, symbol: "Nd", name: "Neodymium", atomic_mass: 144.24 },
    Element { number: 61, symbol: "Pm", name: "Promethium", atomic_mass: 145.0 },
    Element { number: 62, symbol: "Sm", name: "Samarium", atomic_mass: 150.36 },
    Element { number: 63, symbol: "Eu", name: "Europium", atomic_mass: 151.96 },
    Element { number: 64, symbol: "Gd", name: "Gadolinium", atomic_mass: 157.25 },
    Element { number: 65, symbol: "Tb", name: "Terbium", atomic_mass: 158.93 },
    Element { number: 66, symbol: "Dy", name: "Dysprosium", atomic_mass: 162.5 },
    Element { number: 67, symbol: "Ho", name: "Holmium", atomic_mass: 164.93 },
    Element { number: 68, symbol: "Er", name: "Erbium", atomic_mass: 167.26 },
    Element { number: 69, symbol: "Tm", name: "Thulium", atomic_mass: 168.93 },
    Element { number: 70, symbol: "Yb", name: "Ytterbium", atomic_mass: 173.05 },
    Element { number: 71, symbol: "Lu", name: "Lutetium", atomic_mass: 174.97 },
    Element { number: 72, symbol: "Hf", name: "Hafnium", atomic_mass: 178.49 },
    Element { number: 73, symbol: "Ta", name: "Tantalum", atomic_mass: 180.95 },
    Element { number: 74, symbol: "W", name: "Tungsten", atomic_mass: 183.84 },
    Element { number: 75, symbol: "Re", name: "Rhenium", atomic_mass: 186.21 },
    Element { number: 76, symbol: "Os", name: "Osmium", atomic_mass: 190.23 },
    Element { number: 77, symbol: "Ir", name: "Iridium", atomic_mass: 192.22 },
    Element { number: 78, symbol: "Pt", name: "Platinum", atomic_mass: 195.08 },
    Element { number: 79, symbol: "Au", name: "Gold", atomic_mass: 196.97 },
    Element { number: 80, symbol: "Hg", name: "Mercury", atomic_mass: 200.59 },
    Element { number: 81, symbol: "Tl", name: "Thallium", atomic_mass: 204.38 },
    Element { number: 82, symbol: "Pb", name: "Lead", atomic_mass: 207.2 },
    Element { number: 83, symbol: "Bi", name: "Bismuth", atomic_mass: 208.98 },
    Element { number: 84, symbol: "Po", name: "Polonium", atomic_mass: 209.0 },
    Element { number: 85, symbol: "At", name: "Astatine", atomic_mass: 210.0 },
    Element { number: 86, symbol: "Rn", name: "Radon", atomic_mass: 222.0 },
    Element { number: 87, symbol: "Fr", name: "Francium", atomic_mass: 223.0 },
    Element { number: 88, symbol: "Ra", name: "Radium", atomic_mass: 226.0 },
    Element { number: 89, symbol: "Ac", name: "Actinium", atomic_mass: 227.0 },
    Element { number: 90, symbol: "Th", name: "Thorium", atomic_mass: 232.04 },
    Element { number: 91, symbol: "Pa", name: "Protactinium", atomic_mass: 231.04 },
    Element { number: 92, symbol: "U", name: "Uranium", atomic_mass: 238.03 },
    Element { number: 93, symbol: "Np", name: "Neptunium", atomic_mass: 237.0 },
    Element { number: 94, symbol: "Pu", name: "Plutonium", atomic_mass: 244.0 },
    Element { number: 95, symbol: "Am", name: "Americium", atomic_mass: 243.0 },
    Element { number: 96, symbol: "Cm", name: "Curium", atomic_mass: 247.0 },
    Element { number: 97, symbol: "Bk", name: "Berkelium", atomic_mass: 247.0 },
    Element { number: 98, symbol: "Cf", name: "Californium", atomic_mass: 251.0 },
    Element { number: 99, symbol: "Es", name: "Einsteinium", atomic_mass: 252.0 },
    Element { number: 100, symbol: "Fm", name: "Fermium", atomic_mass: 257.0 },
    Element { number: 101, symbol: "Md", name: "Mendelevium", atomic_mass: 258.0 },
    Element { number: 102, symbol: "No", name: "Nobelium", atomic_mass: 259.0 },
    Element { number: 103, symbol: "Lr", name: "Lawrencium", atomic_mass: 266.0 },
    Element { number: 104, symbol: "Rf", name: "Rutherfordium", atomic_mass: 267.0 },
    Element { number: 105, symbol: "Db", name: "Dubnium", atomic_mass: 268.0 },
    Element { number: 106, symbol: "Sg", name: "Seaborgium", atomic_mass: 269.0 },
    Element { number: 107, symbol: "Bh", name: "Bohrium", atomic_mass: 270.0 },
    Element { number: 108, symbol: "Hs", name: "Hassium", atomic_mass: 269.0 },
    Element { number: 109, symbol: "Mt", name: "Meitnerium", atomic_mass: 278.0 },
    Element { number: 110, symbol: "Ds", name: "Darmstadtium", atomic_mass: 281.0 },
    Element { number: 111, symbol: "Rg", name: "Roentgenium", atomic_mass: 282.0 },
    Element { number: 112, symbol: "Cn", name: "Copernicium", atomic_mass: 285.0 },
    Element { number: 113, symbol: "Nh", name: "Nihonium", atomic_mass: 286.0 },
    Element { number: 114, symbol: "Fl", name: "Flerovium", atomic_mass: 289.0 },
    Element { number: 115, symbol: "Mc", name: "Moscovium", atomic_mass: 290.0 },
    Element { number: 116, symbol: "Lv", name: "Livermorium", atomic_mass: 293.0 },
    Element { number: 117, symbol: "Ts", name: "Tennessine", atomic_mass: 294.0 },
    Element { number: 118, symbol: "Og", name: "Oganesson", atomic_mass: 294.0 },
];

/// Look up an element by its symbol (e.g. "Si", "Ga")
pub fn element_by_symbol(symbol: &str) -> Option<&'static Element> {
    ELEMENTS.iter().find(|element| element.symbol == symbol)
}

/// Anything able to answer "what is the atomic mass of this symbol"
#[enum_dispatch]
pub trait AtomicMassLookup {
    fn atomic_mass(&self, symbol: &str) -> Option<f64>;
    fn contains(&self, symbol: &str) -> bool {
        self.atomic_mass(symbol).is_some()
    }
    fn table_name(&self) -> String;
}

/// built-in periodic table
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PeriodicTable;

impl AtomicMassLookup for PeriodicTable {
    fn atomic_mass(&self, symbol: &str) -> Option<f64> {
        element_by_symbol(symbol).map(|element| element.atomic_mass)
    }
    fn table_name(&self) -> String {
        "periodic table".to_string()
    }
}

/// user-supplied atomic masses, e.g. rounded values {Al: 26.98, O: 16.00} or isotopically enriched materials
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomMassTable {
    pub name: String,
    masses: HashMap<String, f64>,
}

impl CustomMassTable {
    /// Every mass must be finite and positive, otherwise mass fractions are meaningless
    pub fn new(name: &str, masses: HashMap<String, f64>) -> Result<Self, StoichError> {
        for (symbol, &mass) in masses.iter() {
            if !mass.is_finite() || mass <= 0.0 {
                return Err(StoichError::InvalidMass {
                    symbol: symbol.clone(),
                    mass,
                });
            }
        }
        Ok(Self {
            name: name.to_string(),
            masses,
        })
    }

    pub fn from_pairs(name: &str, pairs: &[(&str, f64)]) -> Result<Self, StoichError> {
        let masses = pairs
            .iter()
            .map(|(symbol, mass)| (symbol.to_string(), *mass))
            .collect();
        Self::new(name, masses)
    }
    /// JSON object of the form {"Al": 26.98, "O": 16.0}
    pub fn from_json_file(file_name: &str) -> Result<Self, StoichError> {
        let masses = load_mass_table_from_file(file_name)?;
        Self::new(file_name, masses)
    }

    pub fn len(&self) -> usize {
        self.masses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masses.is_empty()
    }
}

impl AtomicMassLookup for CustomMassTable {
    fn atomic_mass(&self, symbol: &str) -> Option<f64> {
        self.masses.get(symbol).copied()
    }
    fn table_name(&self) -> String {
        self.name.clone()
    }
}

impl AtomicMassLookup for HashMap<String, f64> {
    fn atomic_mass(&self, symbol: &str) -> Option<f64> {
        self.get(symbol).copied()
    }
    fn table_name(&self) -> String {
        "map".to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
#[enum_dispatch(AtomicMassLookup)]
pub enum MassTable {
    Builtin(PeriodicTable),
    Custom(CustomMassTable),
}

impl Default for MassTable {
    fn default() -> Self {
        MassTable::Builtin(PeriodicTable)
    }
}

static DEFAULT_MASS_TABLE: OnceLock<MassTable> = OnceLock::new();

/// Mass table shared by every record normalization in the process.
///
/// Built on first use from the mass library configuration. If the configured
/// file can not be loaded the built-in periodic table is used and the failure is logged.
pub fn default_mass_table() -> &'static MassTable {
    DEFAULT_MASS_TABLE.get_or_init(|| {
        match with_library_manager(|manager| manager.load_mass_table()) {
            Ok(table) => {
                info!("default atomic mass table: {}", table.table_name());
                table
            }
            Err(e) => {
                error!("failed to load configured atomic mass table: {}, using built-in periodic table", e);
                MassTable::default()
            }
        }
    })
}
