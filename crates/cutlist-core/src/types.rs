use serde::{Deserialize, Serialize};

/// Stock quantities at or above this value are treated as an unbounded supply.
pub const UNLIMITED_QUANTITY: u32 = 999;

/// Stock piece - a raw sheet type that cut pieces are produced from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockPiece {
    pub external_id: String,
    pub width: f64,
    pub length: f64,
    /// Number of sheets of this type on hand, `UNLIMITED_QUANTITY` or more means unbounded
    pub quantity: u32,
}

impl StockPiece {
    pub fn is_unlimited(&self) -> bool {
        self.quantity >= UNLIMITED_QUANTITY
    }

    pub fn area(&self) -> f64 {
        self.width * self.length
    }
}

/// Cut piece - a finished-size rectangle that has to be produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutPiece {
    pub external_id: String,
    pub width: f64,
    pub length: f64,
    pub quantity: u32,
    /// False when the grain direction is fixed
    #[serde(default = "default_can_rotate")]
    pub can_rotate: bool,
}

fn default_can_rotate() -> bool {
    true
}

/// Discriminator used by callers that hand over a single mixed piece list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PieceKind {
    Cut,
    Stock,
}

impl TryFrom<u8> for PieceKind {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(PieceKind::Cut),
            1 => Ok(PieceKind::Stock),
            other => Err(format!("unknown piece kind {other}, expected 0 (cut) or 1 (stock)")),
        }
    }
}

impl From<PieceKind> for u8 {
    fn from(kind: PieceKind) -> Self {
        match kind {
            PieceKind::Cut => 0,
            PieceKind::Stock => 1,
        }
    }
}

/// Normalized piece record as produced by form entry or text extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Piece {
    pub external_id: String,
    pub width: f64,
    pub length: f64,
    pub quantity: u32,
    pub kind: PieceKind,
    #[serde(default = "default_can_rotate")]
    pub can_rotate: bool,
}

impl Piece {
    /// Returns the stock view of this record, or `None` for cut pieces.
    pub fn into_stock(self) -> Option<StockPiece> {
        match self.kind {
            PieceKind::Stock => Some(StockPiece {
                external_id: self.external_id,
                width: self.width,
                length: self.length,
                quantity: self.quantity,
            }),
            PieceKind::Cut => None,
        }
    }

    /// Returns the cut view of this record, or `None` for stock pieces.
    pub fn into_cut(self) -> Option<CutPiece> {
        match self.kind {
            PieceKind::Cut => Some(CutPiece {
                external_id: self.external_id,
                width: self.width,
                length: self.length,
                quantity: self.quantity,
                can_rotate: self.can_rotate,
            }),
            PieceKind::Stock => None,
        }
    }
}

/// Splits a mixed list into stock and cut pieces, keeping the relative order of each.
pub fn split_pieces(pieces: Vec<Piece>) -> (Vec<StockPiece>, Vec<CutPiece>) {
    let mut stock = Vec::new();
    let mut cuts = Vec::new();
    for piece in pieces {
        match piece.kind {
            PieceKind::Stock => stock.extend(piece.into_stock()),
            PieceKind::Cut => cuts.extend(piece.into_cut()),
        }
    }
    (stock, cuts)
}

/// Which cuts are legal when filling a sheet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    /// Full-width shelves, every cut runs edge to edge
    #[default]
    Guillotine,
    /// Pieces may start directly under an individual placed piece
    Nested,
}

impl std::str::FromStr for LayoutMode {
    type Err = OptimizerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "guillotine" => Ok(LayoutMode::Guillotine),
            "nested" => Ok(LayoutMode::Nested),
            _ => Err(OptimizerError::UnknownLayout(s.to_string())),
        }
    }
}

impl std::fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutMode::Guillotine => write!(f, "guillotine"),
            LayoutMode::Nested => write!(f, "nested"),
        }
    }
}

/// Input: what the caller provides
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationRequest {
    pub stock_pieces: Vec<StockPiece>,
    pub cut_pieces: Vec<CutPiece>,
    /// Blade width consumed between adjacent cuts
    #[serde(default)]
    pub kerf: f64,
    #[serde(default)]
    pub layout_mode: LayoutMode,
}

/// One unit of a cut piece placed on a sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedPiece {
    /// Label of the originating cut piece
    pub external_id: String,
    /// Copy number within the originating cut piece, starting at 1
    pub unit: u32,
    pub x: f64,
    pub y: f64,
    /// Effective width after rotation
    pub width: f64,
    /// Effective length after rotation
    pub length: f64,
    pub rotated: bool,
}

impl PlacedPiece {
    pub fn area(&self) -> f64 {
        self.width * self.length
    }
}

/// One physical sheet cut from a stock type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockPieceInstance {
    /// Position of the stock type in the request's `stock_pieces`
    pub stock_index: usize,
    pub stock_id: String,
    /// 1-based count of sheets of this stock type opened so far
    pub sheet_number: u32,
    pub width: f64,
    pub length: f64,
    pub placements: Vec<PlacedPiece>,
    pub used_area: f64,
    pub waste_area: f64,
}

impl StockPieceInstance {
    pub fn area(&self) -> f64 {
        self.width * self.length
    }
}

/// Why a cut-piece unit could not be placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnplaceableReason {
    /// No stock type is large enough in any allowed orientation
    TooLarge,
    /// A large enough stock type exists but its supply is used up
    StockExhausted,
}

/// A cut-piece unit that could not be placed on any sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnplaceableItem {
    pub external_id: String,
    pub unit: u32,
    pub width: f64,
    pub length: f64,
    pub reason: UnplaceableReason,
}

/// Output: what the optimizer returns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    /// Sheets in the order they were opened
    pub instances: Vec<StockPieceInstance>,
    /// Sheets used per stock type, parallel to the request's `stock_pieces`
    pub stock_usage: Vec<u32>,
    pub total_area: f64,
    pub used_area: f64,
    pub waste_area: f64,
    pub waste_percentage: f64,
    #[serde(default)]
    pub unplaceable: Vec<UnplaceableItem>,
}

impl Solution {
    pub fn placed_count(&self) -> usize {
        self.instances.iter().map(|i| i.placements.len()).sum()
    }

    /// Waste percentage rounded to two decimals for display.
    pub fn display_waste_percentage(&self) -> f64 {
        (self.waste_percentage * 100.0).round() / 100.0
    }
}

/// Error type for optimization
#[derive(Debug, thiserror::Error)]
pub enum OptimizerError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown layout '{0}', expected guillotine or nested")]
    UnknownLayout(String),

    #[error("Optimization stopped at its deadline")]
    DeadlineExceeded,

    #[error("Malformed document: {0}")]
    Format(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, OptimizerError>;
