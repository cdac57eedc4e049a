pub mod repl;
pub mod telegram;
