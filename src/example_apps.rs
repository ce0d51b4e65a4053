use std::error::Error;

use clap::{Parser, ValueEnum, error::ErrorKind};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::config::{BalanceConfig, BalanceStrategy, TimeUnit, UndersampleParams, WeightParams};
use crate::constants::resample::{
    DEFAULT_A, DEFAULT_ALPHA, DEFAULT_B, DEFAULT_BETA, DEFAULT_UNDERSAMPLE_RATIO,
};
use crate::data::{Label, LabelVector};
use crate::discovery::DiscoveryTimeEstimator;
use crate::metrics::batch_composition;
use crate::rng::DeterministicRng;
use crate::trace::RunTrace;
use crate::{ScreeningError, TrainingBatchBuilder};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    Simple,
    Double,
    Undersample,
}

#[derive(Debug, Parser)]
#[command(
    name = "balance_demo",
    disable_help_subcommand = true,
    about = "Show how training batches are rebalanced as labels accumulate",
    long_about = "Reveal labels of a synthetic corpus one item per iteration and print the class make-up of each resampled training batch."
)]
struct BalanceDemoCli {
    #[arg(long, default_value_t = 42, help = "Run seed; each iteration derives its own generator")]
    seed: u64,
    #[arg(long, default_value_t = 10, value_parser = parse_positive_usize, help = "Relevant items in the synthetic corpus")]
    relevant: usize,
    #[arg(long, default_value_t = 190, value_parser = parse_positive_usize, help = "Irrelevant items in the synthetic corpus")]
    irrelevant: usize,
    #[arg(long, default_value_t = 20, value_parser = parse_positive_usize, help = "Number of labeling iterations to run")]
    iterations: usize,
    #[arg(long, value_enum, default_value_t = StrategyArg::Double, help = "Balancing strategy")]
    strategy: StrategyArg,
    #[arg(long, default_value_t = DEFAULT_A)]
    a: f64,
    #[arg(long, default_value_t = DEFAULT_ALPHA)]
    alpha: f64,
    #[arg(long, default_value_t = DEFAULT_B)]
    b: f64,
    #[arg(long, default_value_t = DEFAULT_BETA)]
    beta: f64,
    #[arg(long, default_value_t = DEFAULT_UNDERSAMPLE_RATIO, help = "Target ratio for undersampling")]
    ratio: f64,
    #[arg(long, help = "Emit one JSON object per iteration")]
    json: bool,
}

#[derive(Debug, Parser)]
#[command(
    name = "discovery_demo",
    disable_help_subcommand = true,
    about = "Estimate discovery times from synthetic simulation traces",
    long_about = "Generate seeded simulation traces over a synthetic corpus and report the averaged discovery time of every relevant item."
)]
struct DiscoveryDemoCli {
    #[arg(long, default_value_t = 42)]
    seed: u64,
    #[arg(long, default_value_t = 500, value_parser = parse_positive_usize, help = "Universe size")]
    items: usize,
    #[arg(long, default_value_t = 15, value_parser = parse_positive_usize, help = "Relevant items in the universe")]
    relevant: usize,
    #[arg(long, default_value_t = 5, value_parser = parse_positive_usize, help = "Number of simulated runs")]
    traces: usize,
    #[arg(long, default_value_t = 0.5, help = "Share of the universe screened in each run")]
    screened: f64,
    #[arg(long, default_value = "percentage", help = "count, fraction or percentage")]
    unit: TimeUnit,
    #[arg(long, help = "Emit the result as JSON")]
    json: bool,
}

#[derive(Debug, Serialize)]
struct IterationReport {
    iteration: u64,
    n_read: usize,
    strategy: &'static str,
    batch_size: Option<usize>,
    relevant_rows: Option<usize>,
    relevant_share: Option<f64>,
    oversampling_factor: Option<f64>,
    skipped: Option<String>,
}

#[derive(Debug, Serialize)]
struct DiscoveryReport {
    unit: TimeUnit,
    traces: usize,
    average: Option<f64>,
    times: indexmap::IndexMap<usize, f64>,
}

/// Run the batch-balancing demo with CLI-style arguments (program name excluded).
pub fn run_balance_demo<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    init_tracing();
    let args = std::iter::once("balance_demo".to_string()).chain(args_iter);
    let Some(cli) = parse_cli::<BalanceDemoCli, _>(args)? else {
        return Ok(());
    };

    let strategy = match cli.strategy {
        StrategyArg::Simple => BalanceStrategy::Simple,
        StrategyArg::Double => {
            BalanceStrategy::Double(WeightParams::new(cli.a, cli.alpha, cli.b, cli.beta)?)
        }
        StrategyArg::Undersample => {
            BalanceStrategy::Undersample(UndersampleParams { ratio: cli.ratio })
        }
    };
    let config = BalanceConfig {
        seed: cli.seed,
        strategy,
    }
    .validated()?;
    let builder = TrainingBatchBuilder::new(config.strategy)?;

    let n_total = cli.relevant + cli.irrelevant;
    let truth: Vec<Label> = (0..n_total)
        .map(|idx| {
            if idx < cli.relevant {
                Label::Relevant
            } else {
                Label::Irrelevant
            }
        })
        .collect();

    // One relevant and one irrelevant item are known up front; the rest are revealed in a
    // seeded random order.
    let mut reveal: Vec<usize> = (1..n_total).filter(|&idx| idx != cli.relevant).collect();
    reveal.shuffle(&mut DeterministicRng::new(cli.seed));
    let mut current = vec![Label::Unlabeled; n_total];
    current[0] = Label::Relevant;
    current[cli.relevant] = Label::Irrelevant;

    for iteration in 0..cli.iterations as u64 {
        if let Some(&idx) = reveal.get(iteration as usize) {
            current[idx] = truth[idx];
        }
        let labels = LabelVector::new(current.clone());
        let mut rng = config.rng_for_iteration(iteration);
        let report = match builder.sample_indices(&labels, &mut rng) {
            Ok(indices) => {
                let comp = batch_composition(&indices, &labels);
                IterationReport {
                    iteration,
                    n_read: labels.n_read(),
                    strategy: config.strategy.name(),
                    batch_size: Some(indices.len()),
                    relevant_rows: comp.as_ref().map(|c| c.relevant),
                    relevant_share: comp.as_ref().map(|c| c.relevant_share),
                    oversampling_factor: comp.as_ref().map(|c| c.oversampling_factor),
                    skipped: None,
                }
            }
            Err(err @ (ScreeningError::InsufficientLabels { .. } | ScreeningError::Domain(_))) => {
                IterationReport {
                    iteration,
                    n_read: labels.n_read(),
                    strategy: config.strategy.name(),
                    batch_size: None,
                    relevant_rows: None,
                    relevant_share: None,
                    oversampling_factor: None,
                    skipped: Some(err.to_string()),
                }
            }
            Err(err) => return Err(err.into()),
        };
        print_iteration(&report, cli.json)?;
    }
    Ok(())
}

/// Run the discovery-time demo with CLI-style arguments (program name excluded).
pub fn run_discovery_demo<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    init_tracing();
    let Some(cli) = parse_cli::<DiscoveryDemoCli, _>(
        std::iter::once("discovery_demo".to_string()).chain(args_iter),
    )?
    else {
        return Ok(());
    };
    if cli.relevant >= cli.items {
        return Err("--relevant must be smaller than --items".into());
    }
    if !(0.0..=1.0).contains(&cli.screened) {
        return Err("--screened must lie in [0, 1]".into());
    }

    let truth: LabelVector = (0..cli.items)
        .map(|idx| {
            if idx < cli.relevant {
                Label::Relevant
            } else {
                Label::Irrelevant
            }
        })
        .collect();

    let mut rng = DeterministicRng::new(cli.seed);
    let traces: Vec<RunTrace> = (0..cli.traces)
        .map(|_| synthetic_trace(&truth, cli.relevant, cli.screened, &mut rng))
        .collect();

    let unit = cli.unit;
    let times = DiscoveryTimeEstimator::new(unit).estimate(&traces, &truth)?;
    let report = DiscoveryReport {
        unit,
        traces: traces.len(),
        average: times.average(),
        times: times.into_map(),
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    println!("=== discovery times ({}) over {} traces ===", report.unit, report.traces);
    for (item, time) in &report.times {
        println!("  item {item:>5} => {time:.3}");
    }
    match report.average {
        Some(avg) => println!("average time to discovery: {avg:.3}"),
        None => println!("no relevant item was observed"),
    }
    Ok(())
}

/// One simulated run: a random relevant and irrelevant item as prior knowledge, the rest
/// ordered by a noisy score that favors relevant items. The screened share becomes
/// `label_order`; the unscreened remainder becomes `proba_order`.
fn synthetic_trace<R: Rng + ?Sized>(
    truth: &LabelVector,
    n_relevant: usize,
    screened: f64,
    rng: &mut R,
) -> RunTrace {
    let n_total = truth.len();
    let prior_one = rng.random_range(0..n_relevant);
    let prior_zero = rng.random_range(n_relevant..n_total);

    let mut scored: Vec<(usize, f64)> = (0..n_total)
        .filter(|&idx| idx != prior_one && idx != prior_zero)
        .map(|idx| {
            let boost = if truth.is_relevant(idx) { 0.6 } else { 0.0 };
            (idx, rng.random::<f64>() + boost)
        })
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let n_screen = ((scored.len() as f64) * screened).round() as usize;
    let mut label_order = vec![prior_one, prior_zero];
    label_order.extend(scored[..n_screen].iter().map(|(idx, _)| *idx));
    let proba_order = scored[n_screen..].iter().map(|(idx, _)| *idx).collect();
    RunTrace::new(label_order, proba_order, 2)
}

fn print_iteration(report: &IterationReport, json: bool) -> Result<(), Box<dyn Error>> {
    if json {
        println!("{}", serde_json::to_string(report)?);
        return Ok(());
    }
    match (&report.skipped, report.batch_size, report.relevant_rows) {
        (Some(reason), _, _) => println!(
            "iter {:>3} n_read={:>4} [{}] skipped: {}",
            report.iteration, report.n_read, report.strategy, reason
        ),
        (None, Some(size), Some(relevant)) => println!(
            "iter {:>3} n_read={:>4} [{}] batch={} relevant={} share={:.2} oversampling={:.2}x",
            report.iteration,
            report.n_read,
            report.strategy,
            size,
            relevant,
            report.relevant_share.unwrap_or(0.0),
            report.oversampling_factor.unwrap_or(0.0)
        ),
        _ => println!(
            "iter {:>3} n_read={:>4} [{}] empty batch",
            report.iteration, report.n_read, report.strategy
        ),
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

fn parse_positive_usize(raw: &str) -> Result<usize, String> {
    let parsed = raw
        .parse::<usize>()
        .map_err(|_| format!("Could not parse '{}' as a positive integer", raw))?;
    if parsed == 0 {
        return Err("value must be greater than zero".to_string());
    }
    Ok(parsed)
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}
