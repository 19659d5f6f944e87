pub mod confirm;
pub mod slashcommands;
