pub mod molecule;
pub mod node;
