use super::*;

impl Optimizer {
    /// Freezes the working sheets into instances and computes area statistics.
    pub(super) fn build_solution(
        &self,
        sheets: Vec<OpenSheet>,
        unplaceable: Vec<UnplaceableItem>,
    ) -> Solution {
        let instances: Vec<StockPieceInstance> = sheets
            .into_iter()
            .map(|sheet| self.freeze_sheet(sheet))
            .collect();

        let stock_usage = count_stock_usage(&instances, self.request.stock_pieces.len());
        let total_area: f64 = instances.iter().map(|i| i.area()).sum();
        let used_area: f64 = instances.iter().map(|i| i.used_area).sum();
        let waste_area = (total_area - used_area).max(0.0);
        let waste_percentage = waste_percentage(waste_area, total_area);

        Solution {
            instances,
            stock_usage,
            total_area,
            used_area,
            waste_area,
            waste_percentage,
            unplaceable,
        }
    }

    fn freeze_sheet(&self, sheet: OpenSheet) -> StockPieceInstance {
        let stock_id = self.request.stock_pieces[sheet.stock_index]
            .external_id
            .clone();
        let used_area: f64 = sheet.placements.iter().map(|p| p.area()).sum();
        let waste_area = (sheet.width * sheet.length - used_area).max(0.0);

        StockPieceInstance {
            stock_index: sheet.stock_index,
            stock_id,
            sheet_number: sheet.sheet_number,
            width: sheet.width,
            length: sheet.length,
            placements: sheet.placements,
            used_area,
            waste_area,
        }
    }
}

/// Aggregates how many sheets of each stock type were consumed, by stock index.
fn count_stock_usage(instances: &[StockPieceInstance], stock_types: usize) -> Vec<u32> {
    let mut counts = vec![0; stock_types];
    for instance in instances {
        counts[instance.stock_index] += 1;
    }
    counts
}

/// Share of `total_area` that is waste, in percent. Zero when nothing was cut.
fn waste_percentage(waste_area: f64, total_area: f64) -> f64 {
    if total_area > 0.0 {
        ((waste_area / total_area) * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    }
}
