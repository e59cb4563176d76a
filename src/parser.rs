pub mod classify;
pub mod section;

pub use section::Section;
