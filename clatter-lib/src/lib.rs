pub mod command;
pub mod dice;
pub mod error;
mod fold;
mod parser;
pub mod source;
pub mod system;
pub mod token;

pub use command::Options;
pub use command::RollCommand;
pub use source::Source;
pub use system::new_roller;
pub use system::RollSystem;
pub use token::tokenize;
pub use token::Token;
