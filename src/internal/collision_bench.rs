#![allow(clippy::arithmetic_side_effects)]
#![allow(clippy::indexing_slicing)]
#![allow(clippy::cast_precision_loss)]

use std::{
    error::Error,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
};

use clap::Parser;
use collision_table::{
    AssociativeTable, CollisionMethod, DEFAULT_CAPACITY, DEFAULT_OUTPUT, DEFAULT_SIZES, KeyOrder,
    Operation, TimingSample, append_csv, initialize_logger, measure_performance,
};
use log::info;
use plotters::prelude::*;

/// Times insert, retrieve and remove batches for each collision strategy
#[derive(Parser, Debug)]
#[command(about)]
struct Args {
    /// Requested table capacity, rounded up to a prime
    #[arg(short = 'c', long = "capacity", default_value_t = DEFAULT_CAPACITY)]
    capacity: usize,
    /// CSV file the results are appended to
    #[arg(short = 'o', long = "output", default_value = DEFAULT_OUTPUT)]
    output: PathBuf,
    /// Comma separated batch sizes
    #[arg(short = 's', long = "sizes", value_delimiter = ',', default_values_t = DEFAULT_SIZES.to_vec())]
    sizes: Vec<usize>,
    /// Run a single strategy (1-4) instead of showing the menu
    #[arg(short = 'm', long = "method", value_parser = clap::value_parser!(u32).range(1..=4))]
    method: Option<u32>,
    /// Visit keys in a seeded random order during retrieve and remove
    #[arg(long = "shuffle-seed")]
    shuffle_seed: Option<u64>,
    /// Also render the timings of each run to this PNG file
    #[arg(long = "plot")]
    plot: Option<PathBuf>,
}

/// Menu entry that ends the session
const EXIT_CHOICE: u32 = 5;

fn print_menu() -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "\nChoose a collision handling method:")?;
    for (number, method) in (1..).zip(CollisionMethod::ALL) {
        writeln!(out, "{number}. {method}")?;
    }
    writeln!(out, "{EXIT_CHOICE}. Exit")?;
    write!(out, "Enter your choice (1-{EXIT_CHOICE}): ")?;
    out.flush()
}

/// Reads menu choices until a valid one arrives. `None` means the input ended.
fn read_choice(input: &mut impl BufRead) -> io::Result<Option<u32>> {
    let mut line = String::new();
    loop {
        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        match line.trim().parse::<u32>() {
            Ok(choice) if (1..=EXIT_CHOICE).contains(&choice) => return Ok(Some(choice)),
            _ => {
                print!("Invalid choice. Please enter a number between 1 and {EXIT_CHOICE}: ");
                io::stdout().flush()?;
            }
        }
    }
}

fn run_method(args: &Args, method: CollisionMethod, order: KeyOrder) -> Result<(), Box<dyn Error>> {
    println!("Selected collision handling method: {method}");

    let mut table = AssociativeTable::with_capacity(args.capacity, method)?;
    let samples = measure_performance(&mut table, &args.sizes, order)?;

    println!("Operation\tSize\tTime (ms)");
    for sample in &samples {
        println!("{}\t{}\t{:.3}", sample.operation, sample.size, sample.millis());
    }

    append_csv(&args.output, method.name(), &samples)?;
    println!("Performance results saved to {}.", args.output.display());

    if let Some(path) = &args.plot {
        plot_samples(path, method, &samples)?;
    }
    Ok(())
}

/// Draws one line per operation: batch time against batch size
fn plot_samples(path: &Path, method: CollisionMethod, samples: &[TimingSample]) -> Result<(), Box<dyn Error>> {
    let font_family = "sans-serif";
    let operations = [Operation::Insert, Operation::Retrieve, Operation::Remove];
    let colors = [
        RGBColor(220, 50, 50), // Bright red
        RGBColor(50, 90, 220), // Bright blue
        RGBColor(50, 180, 50), // Bright green
    ];

    let sizes: Vec<usize> =
        samples.iter().filter(|s| s.operation == Operation::Insert).map(|s| s.size).collect();
    let x_labels: Vec<String> = sizes.iter().map(ToString::to_string).collect();
    let max_ms = samples.iter().map(TimingSample::millis).fold(0.0, f64::max).max(0.001) * 1.1;

    let root = BitMapBackend::new(path, (1200, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("{method}: batch timings"), (font_family, 35))
        .margin(15)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .right_y_label_area_size(10)
        .build_cartesian_2d(0..sizes.len().saturating_sub(1).max(1), 0.0..max_ms)?;

    chart
        .configure_mesh()
        .x_labels(sizes.len())
        .x_label_formatter(&|x| x_labels.get(*x).cloned().unwrap_or_default())
        .x_desc("Number of Keys")
        .y_desc("Time (ms)")
        .axis_desc_style((font_family, 16))
        .draw()?;

    for (operation, color) in operations.iter().zip(colors.iter()) {
        let points: Vec<(usize, f64)> = samples
            .iter()
            .filter(|s| s.operation == *operation)
            .enumerate()
            .map(|(i, s)| (i, s.millis()))
            .collect();
        let line_style = ShapeStyle::from(color).stroke_width(2);

        chart
            .draw_series(LineSeries::new(points.clone(), line_style))?
            .label(operation.to_string())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], line_style));
        chart.draw_series(points.into_iter().map(|point| Circle::new(point, 4, color.filled())))?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .position(SeriesLabelPosition::UpperLeft)
        .draw()?;
    root.present()?;

    info!("Generated plot image: {}", path.display());
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    initialize_logger();
    let args = Args::parse();
    let order = args.shuffle_seed.map_or(KeyOrder::Sequential, |seed| KeyOrder::Shuffled { seed });

    if let Some(choice) = args.method {
        let method =
            CollisionMethod::from_menu_choice(choice).ok_or("method must be between 1 and 4")?;
        return run_method(&args, method, order);
    }

    let mut input = io::stdin().lock();
    loop {
        print_menu()?;
        let method = read_choice(&mut input)?.and_then(CollisionMethod::from_menu_choice);
        let Some(method) = method else {
            println!("Exiting program. Goodbye!");
            break;
        };
        run_method(&args, method, order)?;
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn test_read_choice_skips_invalid_input() {
        let mut input = Cursor::new("abc\n0\n9\n3\n");
        assert_eq!(read_choice(&mut input).unwrap(), Some(3));
    }

    #[test]
    fn test_read_choice_exit_and_eof() {
        let mut input = Cursor::new(" 5 \n");
        assert_eq!(read_choice(&mut input).unwrap(), Some(EXIT_CHOICE));
        assert_eq!(read_choice(&mut input).unwrap(), None);
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["collision_bench"]);
        assert_eq!(args.capacity, 100);
        assert_eq!(args.sizes, vec![100, 1_000, 10_000]);
        assert_eq!(args.output, PathBuf::from("performance_results.csv"));
        assert_eq!(args.method, None);
    }

    #[test]
    fn test_args_overrides() {
        let args = Args::parse_from([
            "collision_bench",
            "--sizes",
            "10,20",
            "--method",
            "4",
            "--shuffle-seed",
            "9",
        ]);
        assert_eq!(args.sizes, vec![10, 20]);
        assert_eq!(args.method, Some(4));
        assert_eq!(args.shuffle_seed, Some(9));
        assert!(Args::try_parse_from(["collision_bench", "--method", "5"]).is_err());
    }
}
