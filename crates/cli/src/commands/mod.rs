pub mod model;
pub mod repl;
pub mod turn;
