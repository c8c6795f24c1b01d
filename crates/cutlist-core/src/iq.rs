//! IQ interchange documents.
//!
//! An IQ document carries a cutting list as `stockPieces` (supply) and `parts`
//! (demand) plus the blade width, unit and layout it was drawn up with.
//! Importing yields typed pieces for the optimizer; exporting writes a solution
//! back in the same shape, listing only the stock types that were consumed and
//! echoing the original parts.

use crate::optimizer::Optimizer;
use crate::types::*;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Number;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IqDocument {
    /// Kept as raw JSON, files carry it both as a number and as a string
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub version: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub unit: String,
    pub layout: String,
    /// Numbers are kept as written so an integer `3` is not echoed as `3.0`
    pub cut_width: Number,
    pub stock_pieces: Vec<IqStockPiece>,
    pub parts: Vec<IqPart>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IqStockPiece {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub width: Number,
    pub length: Number,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IqPart {
    #[serde(deserialize_with = "string_or_number")]
    pub name: String,
    pub width: Number,
    pub length: Number,
    pub quantity: u32,
    /// Missing means the grain allows rotation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_rotate: Option<bool>,
}

/// Accepts labels written either as JSON strings or as bare numbers.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!(
            "expected a string or number label, got {other}"
        ))),
    }
}

fn to_f64(field: &str, owner: &str, value: &Number) -> Result<f64> {
    value.as_f64().ok_or_else(|| {
        OptimizerError::InvalidInput(format!("{field} of '{owner}' is out of range: {value}"))
    })
}

impl IqDocument {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Maps the document onto optimizer input.
    pub fn import(&self) -> Result<IqImport> {
        let layout_mode: LayoutMode = self.layout.parse()?;

        let stock_pieces = self
            .stock_pieces
            .iter()
            .map(|s| {
                Ok(StockPiece {
                    external_id: s.id.clone(),
                    width: to_f64("width", &s.id, &s.width)?,
                    length: to_f64("length", &s.id, &s.length)?,
                    quantity: s.quantity,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let cut_pieces = self
            .parts
            .iter()
            .map(|p| {
                Ok(CutPiece {
                    external_id: p.name.clone(),
                    width: to_f64("width", &p.name, &p.width)?,
                    length: to_f64("length", &p.name, &p.length)?,
                    quantity: p.quantity,
                    can_rotate: p.can_rotate.unwrap_or(true),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(IqImport {
            document: self.clone(),
            request: OptimizationRequest {
                stock_pieces,
                cut_pieces,
                kerf: to_f64("cutWidth", "document", &self.cut_width)?,
                layout_mode,
            },
        })
    }
}

/// An imported document, ready to optimize and to export results against.
#[derive(Debug, Clone)]
pub struct IqImport {
    document: IqDocument,
    request: OptimizationRequest,
}

impl IqImport {
    pub fn document(&self) -> &IqDocument {
        &self.document
    }

    pub fn request(&self) -> &OptimizationRequest {
        &self.request
    }

    pub fn optimizer(&self) -> Result<Optimizer> {
        Optimizer::new(self.request.clone())
    }

    pub fn optimize(&self) -> Result<Solution> {
        Ok(self.optimizer()?.optimize())
    }

    /// Writes a solution back as an IQ document.
    ///
    /// `unit`, `layout` and `cutWidth` are copied from the imported document,
    /// `stockPieces` lists consumed stock types in first-use order with the
    /// number of sheets used, and `parts` repeats the imported demand.
    /// Stock types are told apart by position, so repeated ids stay separate.
    pub fn export(&self, solution: &Solution) -> IqDocument {
        let mut seen: Vec<usize> = Vec::new();
        let mut stock_pieces: Vec<IqStockPiece> = Vec::new();
        for instance in &solution.instances {
            if seen.contains(&instance.stock_index) {
                continue;
            }
            seen.push(instance.stock_index);

            // Dimensions come from the imported record so values stay verbatim
            let Some(source) = self.document.stock_pieces.get(instance.stock_index) else {
                continue;
            };
            let quantity = solution
                .stock_usage
                .get(instance.stock_index)
                .copied()
                .unwrap_or(0);

            stock_pieces.push(IqStockPiece {
                quantity,
                ..source.clone()
            });
        }

        IqDocument {
            stock_pieces,
            ..self.document.clone()
        }
    }
}
