//! Cutting-list optimizer: packs rectangular cut pieces onto stock sheets
//! with guillotine or nested shelf layouts and reports waste.

pub mod iq;
pub mod optimizer;
pub mod types;

pub use iq::{IqDocument, IqImport, IqPart, IqStockPiece};
pub use optimizer::{optimize, Optimizer};
pub use types::*;
