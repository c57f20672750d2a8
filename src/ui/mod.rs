pub mod colors;
pub mod editor;
pub mod prompt;
pub mod spinner;

pub use colors::*;
pub use editor::*;
pub use prompt::*;
pub use spinner::Spinner;
