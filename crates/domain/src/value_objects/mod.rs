pub mod battle;
pub mod position;
pub mod reward;
pub mod ticket;
