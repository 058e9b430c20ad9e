pub mod atom;
pub mod fingerprint;
pub mod proof_tree;
pub mod symbol_table;
pub mod term;
pub mod variable_map;
