//! One module per subcommand.

pub mod day;
pub mod login;
pub mod mark;
pub mod roster;
pub mod scan;
