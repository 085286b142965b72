mod num;
mod string_double;
mod heredoc;

pub use num::num;
pub use string_double::string_double;
pub use heredoc::heredoc;
