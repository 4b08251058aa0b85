//! Types that represent the core data model, such as `Figure` and `BillRecord`.
mod bill;
mod figure;

pub use bill::{BillRecord, Person, Side};
pub use figure::{Figure, FigureError};
