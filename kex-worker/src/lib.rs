mod driver;
pub use driver::*;
mod race;
pub use race::*;
