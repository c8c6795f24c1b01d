use crate::types::*;
use std::convert::Infallible;
use std::time::Instant;
use tracing::{debug, info, warn};

mod sheet;
mod summary;
#[cfg(test)]
mod tests;

pub use sheet::EPSILON;
use sheet::OpenSheet;

/// Units packed between two deadline checks.
const DEADLINE_CHECK_INTERVAL: usize = 64;

/// Packs cut pieces onto stock sheets with a greedy decreasing-area shelf heuristic.
pub struct Optimizer {
    request: OptimizationRequest,
}

/// One unit of demand after quantities have been expanded.
#[derive(Debug, Clone, Copy)]
struct UnitRequest<'a> {
    piece: &'a CutPiece,
    unit: u32,
}

impl UnitRequest<'_> {
    fn area(&self) -> f64 {
        self.piece.width * self.piece.length
    }

    fn max_side(&self) -> f64 {
        self.piece.width.max(self.piece.length)
    }

    fn orientations(&self) -> impl Iterator<Item = (f64, f64, bool)> {
        let piece = self.piece;
        let rotated = (piece.can_rotate && piece.width != piece.length)
            .then_some((piece.length, piece.width, true));
        std::iter::once((piece.width, piece.length, false)).chain(rotated)
    }

    fn fits_stock(&self, stock: &StockPiece) -> bool {
        self.orientations().any(|(width, length, _)| {
            width <= stock.width + EPSILON && length <= stock.length + EPSILON
        })
    }

    fn placed(&self, width: f64, length: f64, rotated: bool) -> PlacedPiece {
        PlacedPiece {
            external_id: self.piece.external_id.clone(),
            unit: self.unit,
            x: 0.0,
            y: 0.0,
            width,
            length,
            rotated,
        }
    }

    fn unplaceable(&self, reason: UnplaceableReason) -> UnplaceableItem {
        UnplaceableItem {
            external_id: self.piece.external_id.clone(),
            unit: self.unit,
            width: self.piece.width,
            length: self.piece.length,
            reason,
        }
    }
}

impl Optimizer {
    /// Validates requests and builds a new optimizer instance.
    pub fn new(request: OptimizationRequest) -> Result<Self> {
        if request.stock_pieces.is_empty() {
            return Err(OptimizerError::InvalidInput(
                "At least one stock piece must be provided".to_string(),
            ));
        }

        if request.cut_pieces.is_empty() {
            return Err(OptimizerError::InvalidInput(
                "At least one cut piece must be provided".to_string(),
            ));
        }

        if !request.kerf.is_finite() || request.kerf < 0.0 {
            return Err(OptimizerError::InvalidInput(format!(
                "Kerf must be a non-negative number, got {}",
                request.kerf
            )));
        }

        for stock in &request.stock_pieces {
            check_piece("Stock piece", &stock.external_id, stock.width, stock.length, stock.quantity)?;
        }

        for cut in &request.cut_pieces {
            check_piece("Cut piece", &cut.external_id, cut.width, cut.length, cut.quantity)?;
        }

        Ok(Self { request })
    }

    pub fn request(&self) -> &OptimizationRequest {
        &self.request
    }

    /// Total number of cut-piece units the packing pass will place.
    pub fn unit_count(&self) -> u64 {
        self.request
            .cut_pieces
            .iter()
            .map(|piece| u64::from(piece.quantity))
            .sum()
    }

    /// Runs the packing pass and returns the finished solution.
    pub fn optimize(&self) -> Solution {
        match self.pack(|_| Ok::<(), Infallible>(())) {
            Ok(solution) => solution,
            Err(never) => match never {},
        }
    }

    /// Runs the packing pass, giving up with `DeadlineExceeded` once `deadline` has passed.
    pub fn optimize_within(&self, deadline: Instant) -> Result<Solution> {
        self.pack(|done| {
            if done % DEADLINE_CHECK_INTERVAL == 0 && Instant::now() >= deadline {
                warn!(units_handled = done, "optimization deadline reached");
                return Err(OptimizerError::DeadlineExceeded);
            }
            Ok(())
        })
    }

    /// Packing loop shared by both entry points. `check` runs before every unit
    /// with the number of units handled so far and may stop the run.
    fn pack<E>(
        &self,
        mut check: impl FnMut(usize) -> std::result::Result<(), E>,
    ) -> std::result::Result<Solution, E> {
        let units = self.expand_cut_pieces();
        let mut remaining: Vec<Option<u32>> = self
            .request
            .stock_pieces
            .iter()
            .map(|s| (!s.is_unlimited()).then_some(s.quantity))
            .collect();

        let mut sheets: Vec<OpenSheet> = Vec::new();
        let mut unplaceable = Vec::new();

        for (done, unit) in units.iter().enumerate() {
            check(done)?;
            if self.place_on_open_sheets(unit, &mut sheets) {
                continue;
            }
            if let Err(reason) = self.place_on_new_sheet(unit, &mut sheets, &mut remaining) {
                warn!(
                    piece = %unit.piece.external_id,
                    unit = unit.unit,
                    width = unit.piece.width,
                    length = unit.piece.length,
                    ?reason,
                    "cut piece could not be placed"
                );
                unplaceable.push(unit.unplaceable(reason));
            }
        }

        let solution = self.build_solution(sheets, unplaceable);

        info!(
            sheets = solution.instances.len(),
            placed = solution.placed_count(),
            unplaceable = solution.unplaceable.len(),
            waste_percentage = solution.display_waste_percentage(),
            mode = %self.request.layout_mode,
            "optimization finished"
        );

        Ok(solution)
    }

    /// Duplicates cut pieces by quantity and orders them largest first.
    /// Ties fall back to the longer side, then to input order.
    fn expand_cut_pieces(&self) -> Vec<UnitRequest<'_>> {
        let mut units: Vec<UnitRequest<'_>> = self
            .request
            .cut_pieces
            .iter()
            .flat_map(|piece| (1..=piece.quantity).map(move |unit| UnitRequest { piece, unit }))
            .collect();

        // sort_by is stable, which keeps input order for exact ties
        units.sort_by(|a, b| {
            b.area()
                .total_cmp(&a.area())
                .then_with(|| b.max_side().total_cmp(&a.max_side()))
        });
        units
    }

    /// Tries the open sheets in creation order, as given before rotated.
    fn place_on_open_sheets(&self, unit: &UnitRequest<'_>, sheets: &mut [OpenSheet]) -> bool {
        for sheet in sheets.iter_mut() {
            if try_place(unit, sheet) {
                return true;
            }
        }
        false
    }

    /// Opens a sheet from the first stock type, in caller order, that can hold the piece.
    fn place_on_new_sheet(
        &self,
        unit: &UnitRequest<'_>,
        sheets: &mut Vec<OpenSheet>,
        remaining: &mut [Option<u32>],
    ) -> std::result::Result<(), UnplaceableReason> {
        let mut reason = UnplaceableReason::TooLarge;

        for (stock_index, stock) in self.request.stock_pieces.iter().enumerate() {
            if !unit.fits_stock(stock) {
                continue;
            }
            if remaining[stock_index] == Some(0) {
                reason = UnplaceableReason::StockExhausted;
                continue;
            }

            let sheet_number = sheets
                .iter()
                .filter(|s| s.stock_index == stock_index)
                .count() as u32
                + 1;
            let mut sheet = OpenSheet::new(
                stock_index,
                sheet_number,
                stock.width,
                stock.length,
                self.request.kerf,
                self.request.layout_mode,
            );
            if !try_place(unit, &mut sheet) {
                continue;
            }

            if let Some(left) = remaining[stock_index].as_mut() {
                *left -= 1;
            }
            debug!(
                stock = %stock.external_id,
                sheet_number,
                piece = %unit.piece.external_id,
                "opened new sheet"
            );
            sheets.push(sheet);
            return Ok(());
        }

        Err(reason)
    }
}

/// Places the unit on the sheet in the first orientation that fits.
fn try_place(unit: &UnitRequest<'_>, sheet: &mut OpenSheet) -> bool {
    for (width, length, rotated) in unit.orientations() {
        if let Some(spot) = sheet.find_spot(width, length) {
            return sheet.commit(spot, unit.placed(width, length, rotated));
        }
    }
    false
}

fn check_piece(what: &str, id: &str, width: f64, length: f64, quantity: u32) -> Result<()> {
    if !width.is_finite() || !length.is_finite() || width <= 0.0 || length <= 0.0 {
        return Err(OptimizerError::InvalidInput(format!(
            "{} '{}' must have positive dimensions, got {}x{}",
            what, id, width, length
        )));
    }
    if quantity == 0 {
        return Err(OptimizerError::InvalidInput(format!(
            "{} '{}' must have a positive quantity",
            what, id
        )));
    }
    Ok(())
}

/// Validates the inputs and packs `cut_pieces` onto `stock_pieces`.
///
/// The caller's slices are copied, never modified.
pub fn optimize(
    stock_pieces: &[StockPiece],
    cut_pieces: &[CutPiece],
    kerf: f64,
    layout_mode: LayoutMode,
) -> Result<Solution> {
    let optimizer = Optimizer::new(OptimizationRequest {
        stock_pieces: stock_pieces.to_vec(),
        cut_pieces: cut_pieces.to_vec(),
        kerf,
        layout_mode,
    })?;
    Ok(optimizer.optimize())
}
