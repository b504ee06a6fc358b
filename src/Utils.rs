/// loading of mass tables and material lists from files
pub mod load_from_file;
