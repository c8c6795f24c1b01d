use super::*;

fn stock(id: &str, width: f64, length: f64, quantity: u32) -> StockPiece {
    StockPiece {
        external_id: id.to_string(),
        width,
        length,
        quantity,
    }
}

fn cut(id: &str, width: f64, length: f64, quantity: u32, can_rotate: bool) -> CutPiece {
    CutPiece {
        external_id: id.to_string(),
        width,
        length,
        quantity,
        can_rotate,
    }
}

fn run(request: OptimizationRequest) -> Solution {
    Optimizer::new(request).unwrap().optimize()
}

#[test]
fn test_simple_optimization() {
    let request = OptimizationRequest {
        stock_pieces: vec![StockPiece {
            external_id: "panel_a".to_string(),
            width: 100.0,
            length: 100.0,
            quantity: UNLIMITED_QUANTITY,
        }],
        cut_pieces: vec![
            CutPiece {
                external_id: "item1".to_string(),
                width: 20.0,
                length: 30.0,
                quantity: 2,
                can_rotate: true,
            },
            CutPiece {
                external_id: "item2".to_string(),
                width: 40.0,
                length: 50.0,
                quantity: 1,
                can_rotate: false,
            },
        ],
        kerf: 3.0,
        layout_mode: LayoutMode::Guillotine,
    };

    let solution = run(request);

    assert_eq!(solution.instances.len(), 1);
    assert_eq!(solution.placed_count(), 3);
    assert!(solution.unplaceable.is_empty());
    assert!(solution.waste_percentage >= 0.0);
    assert!(solution.waste_percentage <= 100.0);
    assert_eq!(solution.used_area, 2.0 * 20.0 * 30.0 + 40.0 * 50.0);
    assert_eq!(solution.total_area, 10_000.0);
    assert_eq!(solution.stock_usage, vec![1]);
}

#[test]
fn test_plywood_sheet_shelf_positions() {
    let request = OptimizationRequest {
        stock_pieces: vec![stock("plywood", 2440.0, 1220.0, 999)],
        cut_pieces: vec![
            cut("door", 800.0, 600.0, 2, true),
            cut("drawer", 400.0, 300.0, 4, true),
        ],
        kerf: 3.0,
        layout_mode: LayoutMode::Guillotine,
    };

    let solution = run(request);
    let placements = &solution.instances[0].placements;
    let origins: Vec<(f64, f64)> = placements.iter().map(|p| (p.x, p.y)).collect();

    assert_eq!(solution.instances.len(), 1);
    assert_eq!(
        origins,
        vec![
            (0.0, 0.0),
            (803.0, 0.0),
            (1606.0, 0.0),
            (2009.0, 0.0),
            (0.0, 603.0),
            (403.0, 603.0),
        ]
    );
    assert!(placements.iter().all(|p| !p.rotated));
    assert_eq!(solution.used_area, 1_440_000.0);
}

#[test]
fn test_rejects_empty_stock() {
    let request = OptimizationRequest {
        stock_pieces: vec![],
        cut_pieces: vec![cut("a", 10.0, 10.0, 1, true)],
        kerf: 0.0,
        layout_mode: LayoutMode::Guillotine,
    };
    assert!(matches!(
        Optimizer::new(request),
        Err(OptimizerError::InvalidInput(_))
    ));
}

#[test]
fn test_rejects_empty_cuts() {
    let request = OptimizationRequest {
        stock_pieces: vec![stock("s", 100.0, 100.0, 1)],
        cut_pieces: vec![],
        kerf: 0.0,
        layout_mode: LayoutMode::Guillotine,
    };
    assert!(matches!(
        Optimizer::new(request),
        Err(OptimizerError::InvalidInput(_))
    ));
}

#[test]
fn test_rejects_bad_kerf() {
    for kerf in [-1.0, f64::NAN, f64::INFINITY] {
        let request = OptimizationRequest {
            stock_pieces: vec![stock("s", 100.0, 100.0, 1)],
            cut_pieces: vec![cut("a", 10.0, 10.0, 1, true)],
            kerf,
            layout_mode: LayoutMode::Guillotine,
        };
        assert!(
            matches!(Optimizer::new(request), Err(OptimizerError::InvalidInput(_))),
            "kerf {kerf} should be rejected"
        );
    }
}

#[test]
fn test_rejects_non_positive_dimensions_and_quantities() {
    let bad_cuts = [
        cut("a", 0.0, 10.0, 1, true),
        cut("a", 10.0, -5.0, 1, true),
        cut("a", 10.0, 10.0, 0, true),
    ];
    for bad in bad_cuts {
        let request = OptimizationRequest {
            stock_pieces: vec![stock("s", 100.0, 100.0, 1)],
            cut_pieces: vec![bad],
            kerf: 0.0,
            layout_mode: LayoutMode::Guillotine,
        };
        assert!(matches!(
            Optimizer::new(request),
            Err(OptimizerError::InvalidInput(_))
        ));
    }

    let request = OptimizationRequest {
        stock_pieces: vec![stock("s", 100.0, 0.0, 1)],
        cut_pieces: vec![cut("a", 10.0, 10.0, 1, true)],
        kerf: 0.0,
        layout_mode: LayoutMode::Guillotine,
    };
    assert!(Optimizer::new(request).is_err());

    let request = OptimizationRequest {
        stock_pieces: vec![stock("s", 100.0, 100.0, 0)],
        cut_pieces: vec![cut("a", 10.0, 10.0, 1, true)],
        kerf: 0.0,
        layout_mode: LayoutMode::Guillotine,
    };
    assert!(Optimizer::new(request).is_err());
}

#[test]
fn test_stock_types_sharing_a_label_are_counted_separately() {
    let request = OptimizationRequest {
        stock_pieces: vec![
            stock("Plywood", 1220.0, 610.0, 1),
            stock("Plywood", 2440.0, 1220.0, 999),
        ],
        cut_pieces: vec![cut("door", 1000.0, 500.0, 2, false)],
        kerf: 0.0,
        layout_mode: LayoutMode::Guillotine,
    };

    let solution = run(request);
    assert_eq!(solution.instances.len(), 2);
    assert_eq!(solution.instances[0].stock_index, 0);
    assert_eq!(solution.instances[0].width, 1220.0);
    assert_eq!(solution.instances[1].stock_index, 1);
    assert_eq!(solution.instances[1].width, 2440.0);
    assert!(solution.instances.iter().all(|i| i.stock_id == "Plywood"));
    assert!(solution.instances.iter().all(|i| i.sheet_number == 1));
    assert_eq!(solution.stock_usage, vec![1, 1]);
    assert!(solution.unplaceable.is_empty());
}

#[test]
fn test_passed_deadline_stops_packing() {
    let request = OptimizationRequest {
        stock_pieces: vec![stock("s", 100.0, 100.0, 999)],
        cut_pieces: vec![cut("a", 10.0, 10.0, 500, true)],
        kerf: 0.0,
        layout_mode: LayoutMode::Guillotine,
    };
    let optimizer = Optimizer::new(request).unwrap();
    assert_eq!(optimizer.unit_count(), 500);

    let result = optimizer.optimize_within(std::time::Instant::now());
    assert!(matches!(result, Err(OptimizerError::DeadlineExceeded)));
}

#[test]
fn test_generous_deadline_matches_unbounded_run() {
    let request = OptimizationRequest {
        stock_pieces: vec![stock("s", 100.0, 100.0, 999)],
        cut_pieces: vec![cut("a", 30.0, 20.0, 40, true)],
        kerf: 2.0,
        layout_mode: LayoutMode::Nested,
    };
    let optimizer = Optimizer::new(request).unwrap();
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(60);

    let bounded = optimizer.optimize_within(deadline).unwrap();
    assert_eq!(bounded, optimizer.optimize());
}

#[test]
fn test_rotation_used_when_needed() {
    let request = OptimizationRequest {
        stock_pieces: vec![stock("s", 100.0, 50.0, 999)],
        cut_pieces: vec![cut("a", 50.0, 100.0, 1, true)],
        kerf: 0.0,
        layout_mode: LayoutMode::Guillotine,
    };

    let solution = run(request);
    let placed = &solution.instances[0].placements[0];
    assert!(placed.rotated);
    assert_eq!((placed.width, placed.length), (100.0, 50.0));
    assert_eq!(placed.external_id, "a");
}

#[test]
fn test_fixed_grain_never_rotates() {
    let request = OptimizationRequest {
        stock_pieces: vec![stock("s", 100.0, 50.0, 999)],
        cut_pieces: vec![cut("a", 50.0, 100.0, 1, false)],
        kerf: 0.0,
        layout_mode: LayoutMode::Guillotine,
    };

    let solution = run(request);
    assert!(solution.instances.is_empty());
    assert_eq!(solution.unplaceable.len(), 1);
    assert_eq!(solution.unplaceable[0].reason, UnplaceableReason::TooLarge);
}

#[test]
fn test_ties_break_on_longest_side_then_input_order() {
    let request = OptimizationRequest {
        stock_pieces: vec![stock("s", 1000.0, 1000.0, 999)],
        cut_pieces: vec![
            cut("a", 10.0, 40.0, 1, false),
            cut("b", 20.0, 20.0, 1, false),
            cut("c", 40.0, 10.0, 1, false),
        ],
        kerf: 0.0,
        layout_mode: LayoutMode::Guillotine,
    };

    let solution = run(request);
    let order: Vec<&str> = solution.instances[0]
        .placements
        .iter()
        .map(|p| p.external_id.as_str())
        .collect();
    assert_eq!(order, vec!["a", "c", "b"]);
}

#[test]
fn test_unit_numbers_follow_quantity() {
    let request = OptimizationRequest {
        stock_pieces: vec![stock("s", 1000.0, 1000.0, 999)],
        cut_pieces: vec![cut("shelf", 100.0, 50.0, 3, true)],
        kerf: 0.0,
        layout_mode: LayoutMode::Guillotine,
    };

    let solution = run(request);
    let units: Vec<u32> = solution.instances[0]
        .placements
        .iter()
        .map(|p| p.unit)
        .collect();
    assert_eq!(units, vec![1, 2, 3]);
}

#[test]
fn test_bounded_stock_falls_through_to_next_type() {
    let request = OptimizationRequest {
        stock_pieces: vec![stock("small", 100.0, 100.0, 1), stock("big", 200.0, 200.0, 999)],
        cut_pieces: vec![cut("a", 100.0, 100.0, 2, false)],
        kerf: 0.0,
        layout_mode: LayoutMode::Guillotine,
    };

    let solution = run(request);
    let used: Vec<&str> = solution
        .instances
        .iter()
        .map(|i| i.stock_id.as_str())
        .collect();
    assert_eq!(used, vec!["small", "big"]);
    assert_eq!(solution.stock_usage, vec![1, 1]);
    assert!(solution.unplaceable.is_empty());
}

#[test]
fn test_exhausted_stock_reported() {
    let request = OptimizationRequest {
        stock_pieces: vec![stock("s", 100.0, 100.0, 1)],
        cut_pieces: vec![cut("a", 100.0, 100.0, 2, false)],
        kerf: 0.0,
        layout_mode: LayoutMode::Guillotine,
    };

    let solution = run(request);
    assert_eq!(solution.instances.len(), 1);
    assert_eq!(solution.unplaceable.len(), 1);
    assert_eq!(
        solution.unplaceable[0].reason,
        UnplaceableReason::StockExhausted
    );
    assert_eq!(solution.unplaceable[0].unit, 2);
}

#[test]
fn test_oversized_piece_does_not_abort_run() {
    let request = OptimizationRequest {
        stock_pieces: vec![stock("plywood", 2440.0, 1220.0, 999)],
        cut_pieces: vec![
            cut("table", 3000.0, 3000.0, 1, true),
            cut("seat", 500.0, 500.0, 1, true),
        ],
        kerf: 3.0,
        layout_mode: LayoutMode::Guillotine,
    };

    let solution = run(request);
    assert_eq!(solution.instances.len(), 1);
    assert_eq!(solution.placed_count(), 1);
    assert_eq!(solution.unplaceable.len(), 1);
    assert_eq!(solution.unplaceable[0].external_id, "table");
}

#[test]
fn test_sheet_numbers_count_per_stock_type() {
    let request = OptimizationRequest {
        stock_pieces: vec![stock("s", 100.0, 100.0, 999)],
        cut_pieces: vec![cut("a", 100.0, 100.0, 3, false)],
        kerf: 0.0,
        layout_mode: LayoutMode::Guillotine,
    };

    let solution = run(request);
    let numbers: Vec<u32> = solution.instances.iter().map(|i| i.sheet_number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(solution.stock_usage, vec![3]);
}

#[test]
fn test_exact_fit_has_no_waste() {
    let request = OptimizationRequest {
        stock_pieces: vec![stock("s", 100.0, 100.0, 999)],
        cut_pieces: vec![cut("a", 50.0, 50.0, 4, false)],
        kerf: 0.0,
        layout_mode: LayoutMode::Guillotine,
    };

    let solution = run(request);
    assert_eq!(solution.instances.len(), 1);
    assert_eq!(solution.waste_area, 0.0);
    assert_eq!(solution.waste_percentage, 0.0);
    assert_eq!(solution.instances[0].waste_area, 0.0);
}

#[test]
fn test_nested_reuses_space_under_short_piece() {
    let cut_pieces = vec![
        cut("tall", 50.0, 80.0, 1, false),
        cut("square", 50.0, 50.0, 1, false),
        cut("flat", 50.0, 30.0, 1, false),
    ];
    let guillotine = run(OptimizationRequest {
        stock_pieces: vec![stock("s", 100.0, 100.0, 999)],
        cut_pieces: cut_pieces.clone(),
        kerf: 0.0,
        layout_mode: LayoutMode::Guillotine,
    });
    let nested = run(OptimizationRequest {
        stock_pieces: vec![stock("s", 100.0, 100.0, 999)],
        cut_pieces,
        kerf: 0.0,
        layout_mode: LayoutMode::Nested,
    });

    assert_eq!(guillotine.instances.len(), 2);
    assert_eq!(nested.instances.len(), 1);
    assert!(nested.waste_area < guillotine.waste_area);
}

#[test]
fn test_display_waste_percentage_rounds_to_two_decimals() {
    let request = OptimizationRequest {
        stock_pieces: vec![stock("s", 30.0, 10.0, 999)],
        cut_pieces: vec![cut("a", 20.0, 10.0, 1, false)],
        kerf: 0.0,
        layout_mode: LayoutMode::Guillotine,
    };

    let solution = run(request);
    assert!((solution.waste_percentage - 100.0 / 3.0).abs() < 1e-12);
    assert_eq!(solution.display_waste_percentage(), 33.33);
}

#[test]
fn test_free_function_leaves_inputs_untouched() {
    let stock_pieces = vec![stock("s", 100.0, 100.0, 999)];
    let cut_pieces = vec![cut("a", 60.0, 40.0, 2, true)];
    let before = (stock_pieces.clone(), cut_pieces.clone());

    let solution = optimize(&stock_pieces, &cut_pieces, 2.0, LayoutMode::Nested).unwrap();

    assert_eq!(solution.placed_count(), 2);
    assert_eq!((stock_pieces, cut_pieces), before);
}
