pub mod applications;
pub mod exports;
pub mod files;

pub use applications::*;
pub use exports::*;
pub use files::*;
