pub mod events;
pub mod materials;
pub mod visits;
