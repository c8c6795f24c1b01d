use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use cutlist_core::{IqDocument, OptimizationRequest, Optimizer, Solution, StockPiece};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "cutlist")]
#[command(about = "Cutting list optimizer - pack cut pieces onto stock sheets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Optimize a cutting list request
    Optimize {
        /// Input file (YAML or JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for the solution (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Optimize an IQ document and export the result as IQ
    Iq {
        /// IQ document (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Output IQ document
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the full solution (JSON)
        #[arg(long)]
        solution: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Optimize { input, output } => {
            optimize_command(input, output)?;
        }
        Commands::Iq {
            input,
            output,
            solution,
        } => {
            iq_command(input, output, solution)?;
        }
    }

    Ok(())
}

fn read_request(input: &Path) -> Result<OptimizationRequest> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("reading {}", input.display()))?;
    let is_yaml = matches!(
        input.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    );
    let request = if is_yaml {
        serde_yaml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };
    Ok(request)
}

fn optimize_command(input: PathBuf, output: Option<PathBuf>) -> Result<()> {
    println!("{}", "🔍 Loading input...".bright_blue());

    let request = read_request(&input)?;
    print_request(&request);

    println!("{}", "🚀 Running optimization...".bright_blue());

    let optimizer = Optimizer::new(request)?;
    let solution = optimizer.optimize();

    print_solution(&solution, &optimizer.request().stock_pieces);

    let json = serde_json::to_string_pretty(&solution)?;
    write_or_print(output.as_deref(), &json, "solution")
}

fn iq_command(input: PathBuf, output: Option<PathBuf>, solution_path: Option<PathBuf>) -> Result<()> {
    println!("{}", "🔍 Loading IQ document...".bright_blue());

    let content = std::fs::read_to_string(&input)
        .with_context(|| format!("reading {}", input.display()))?;
    let document = IqDocument::from_json(&content)?;
    let import = document.import()?;

    if let Some(title) = &document.title {
        println!("  {}", title.bright_white().bold());
    }
    println!(
        "  unit {}, layout {}, cut width {}",
        document.unit.bright_white(),
        document.layout.bright_white(),
        document.cut_width.to_string().bright_white()
    );
    print_request(import.request());

    println!("{}", "🚀 Running optimization...".bright_blue());

    let solution = import.optimize()?;
    print_solution(&solution, &import.request().stock_pieces);

    if let Some(path) = solution_path {
        let json = serde_json::to_string_pretty(&solution)?;
        write_or_print(Some(&path), &json, "solution")?;
    }

    let exported = import.export(&solution).to_json_pretty()?;
    write_or_print(output.as_deref(), &exported, "IQ document")
}

fn print_request(request: &OptimizationRequest) {
    println!(
        "  {} cut pieces to produce",
        request.cut_pieces.len().to_string().bright_white().bold()
    );
    println!(
        "  {} stock types available",
        request.stock_pieces.len().to_string().bright_white().bold()
    );
    println!();
}

fn print_solution(solution: &Solution, stock_pieces: &[StockPiece]) {
    println!();
    println!("{}", "✅ Optimization complete!".bright_green().bold());
    println!();

    println!("{}", "📊 Results:".bright_yellow().bold());
    println!("  Sheets used:");
    for (stock, count) in stock_pieces.iter().zip(&solution.stock_usage) {
        if *count == 0 {
            continue;
        }
        println!(
            "    • {} ({}x{}): {} sheets",
            stock.external_id.bright_white(),
            stock.width,
            stock.length,
            count
        );
    }
    println!();
    println!(
        "  Pieces placed: {}",
        solution.placed_count().to_string().bright_white().bold()
    );
    println!(
        "  Used area: {} of {}",
        solution.used_area.to_string().bright_white(),
        solution.total_area.to_string().bright_white()
    );
    println!(
        "  Total waste: {:.2}%",
        solution.display_waste_percentage()
    );

    if !solution.unplaceable.is_empty() {
        println!();
        println!(
            "{}",
            format!(
                "⚠️  {} pieces could not be placed:",
                solution.unplaceable.len()
            )
            .bright_red()
            .bold()
        );
        for item in &solution.unplaceable {
            println!(
                "    • {} #{} ({}x{}): {:?}",
                item.external_id.bright_white(),
                item.unit,
                item.width,
                item.length,
                item.reason
            );
        }
    }

    println!();
}

fn write_or_print(path: Option<&Path>, content: &str, what: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("writing {}", path.display()))?;
            println!(
                "💾 Saved {} to {}",
                what,
                path.display().to_string().bright_white()
            );
        }
        None => println!("{}", content),
    }
    Ok(())
}
