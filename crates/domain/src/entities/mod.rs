pub mod character;
pub mod dungeon;
pub mod instance;
pub mod monster;
pub mod skill;
