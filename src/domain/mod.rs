pub mod forecast;
pub mod history;
pub mod tariff;

pub use forecast::*;
pub use history::*;
pub use tariff::*;
