pub mod periodic;
pub mod primitive;
pub mod sites;
pub mod supercell;
