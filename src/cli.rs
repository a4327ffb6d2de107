use crate::aggregator::Aggregator;
use crate::config::Config;
use crate::exchanges::{self, COMMON_SYMBOLS, EXCHANGE_NAMES};
use crate::normalize::canonical_symbol;
use crate::{export, render, spread};
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "fundarb",
    about = "Compare perpetual funding rates across exchanges",
    version
)]
pub struct Cli {
    /// Exchanges to query (e.g. binance hyperliquid); all of them when omitted
    #[arg(long, num_args = 1..)]
    pub exchanges: Vec<String>,

    /// Trading pairs to query (e.g. BTC ETH); a common set when omitted
    #[arg(long, num_args = 1..)]
    pub pairs: Vec<String>,

    /// Export the comparison to this file (.json for JSON, CSV otherwise)
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Pick exchanges and pairs from numbered menus
    #[arg(short, long)]
    pub interactive: bool,

    /// Keep refreshing and expose the latest comparison over HTTP
    #[arg(long)]
    pub serve: bool,
}

impl Cli {
    /// Bare `fundarb` with no selection is treated as a request for the
    /// interactive menus, like the original tool.
    pub fn wants_interactive(&self) -> bool {
        self.interactive
            || (!self.serve
                && self.exchanges.is_empty()
                && self.pairs.is_empty()
                && self.export.is_none())
    }
}

pub fn resolve_exchanges(requested: &[String]) -> Vec<String> {
    if requested.is_empty() {
        EXCHANGE_NAMES.iter().map(|s| s.to_string()).collect()
    } else {
        requested.iter().map(|s| s.trim().to_lowercase()).collect()
    }
}

pub fn resolve_pairs(requested: &[String]) -> Vec<String> {
    if requested.is_empty() {
        COMMON_SYMBOLS.iter().map(|s| s.to_string()).collect()
    } else {
        requested.iter().map(|p| canonical_symbol(p)).collect()
    }
}

/// One-shot run: fetch, display, optionally export. Partial failures have
/// already been logged by the aggregator; they do not fail the run.
pub async fn run(args: Cli, config: &Config) -> anyhow::Result<()> {
    let interactive = args.wants_interactive();

    let (names, pairs) = if interactive {
        println!("=== Funding Rate CLI Tool ===");
        println!("Fetch funding rates from top perpetual exchanges\n");
        let names = select_from_menu("exchange", &EXCHANGE_NAMES)?;
        let raw_pairs = select_from_menu("pair", &COMMON_SYMBOLS)?;
        let pairs = raw_pairs.iter().map(|p| canonical_symbol(p)).collect();
        (names, pairs)
    } else {
        (resolve_exchanges(&args.exchanges), resolve_pairs(&args.pairs))
    };

    let clients = exchanges::select(&names, config)?;
    let aggregator = Aggregator::new(clients)?;

    tracing::info!(
        "Fetching funding rates for {} pairs from {} exchanges...",
        pairs.len(),
        names.len()
    );
    let result = aggregator.run(&pairs).await;

    println!("{}", render::comparison_table(&result));

    let spreads = spread::compute_spreads(&result.records);
    if !spreads.is_empty() {
        println!("\n{}", render::spread_report(&spreads));
    }

    let export_path = if interactive && !result.records.is_empty() {
        prompt_export_path()?
    } else {
        args.export.clone()
    };

    if let Some(path) = &export_path {
        export::export(&result, path)?;
        tracing::info!("Data exported to {}", path.display());
    }

    if interactive {
        let mut equivalent = format!(
            "fundarb --exchanges {} --pairs {}",
            names.join(" "),
            pairs.join(" ")
        );
        if let Some(path) = &export_path {
            equivalent.push_str(&format!(" --export {}", path.display()));
        }
        println!("\nNon-interactive equivalent: {equivalent}");
    }

    Ok(())
}

/// Numbered menu: "1,3,5" picks entries, "all" picks everything, anything
/// else re-prompts.
fn select_from_menu(kind: &str, options: &[&str]) -> anyhow::Result<Vec<String>> {
    println!("Available {kind}s:");
    for (i, name) in options.iter().enumerate() {
        println!("{:2}. {}", i + 1, name);
    }

    loop {
        let line = prompt_line(&format!(
            "\nEnter {kind} numbers separated by commas (e.g. 1,3,5) or 'all': "
        ))?;
        let line = line.trim().to_lowercase();

        if line == "all" {
            return Ok(options.iter().map(|s| s.to_string()).collect());
        }

        match parse_selection(&line, options.len()) {
            Some(indices) if !indices.is_empty() => {
                return Ok(indices.into_iter().map(|i| options[i - 1].to_string()).collect());
            }
            _ => println!("Invalid selection. Please try again."),
        }
    }
}

/// 1-based indices; None on anything unparsable, out-of-range entries are
/// dropped like the original tool drops them.
fn parse_selection(line: &str, len: usize) -> Option<Vec<usize>> {
    let mut indices = Vec::new();
    for part in line.split(',') {
        let n = part.trim().parse::<usize>().ok()?;
        if (1..=len).contains(&n) {
            indices.push(n);
        }
    }
    Some(indices)
}

fn prompt_export_path() -> anyhow::Result<Option<PathBuf>> {
    let answer = prompt_line("\nExport data to CSV? (y/n): ")?;
    if !matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
        return Ok(None);
    }

    let filename = prompt_line("Enter filename (press Enter for default): ")?;
    let filename = filename.trim();
    if filename.is_empty() {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        Ok(Some(PathBuf::from(format!("funding_rates_{stamp}.csv"))))
    } else {
        Ok(Some(PathBuf::from(filename)))
    }
}

fn prompt_line(prompt: &str) -> anyhow::Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        anyhow::bail!("stdin closed while waiting for input");
    }
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_parse_into_selections() {
        let args = Cli::try_parse_from([
            "fundarb",
            "--exchanges",
            "binance",
            "bybit",
            "--pairs",
            "BTC",
            "--export",
            "out.csv",
        ])
        .unwrap();

        assert_eq!(args.exchanges, ["binance", "bybit"]);
        assert_eq!(args.pairs, ["BTC"]);
        assert_eq!(args.export, Some(PathBuf::from("out.csv")));
        assert!(!args.wants_interactive());
    }

    #[test]
    fn bare_invocation_means_interactive() {
        let args = Cli::try_parse_from(["fundarb"]).unwrap();
        assert!(args.wants_interactive());

        let args = Cli::try_parse_from(["fundarb", "--serve"]).unwrap();
        assert!(!args.wants_interactive());

        let args = Cli::try_parse_from(["fundarb", "--pairs", "BTC", "-i"]).unwrap();
        assert!(args.wants_interactive());
    }

    #[test]
    fn resolvers_fall_back_to_full_defaults() {
        assert_eq!(resolve_exchanges(&[]).len(), EXCHANGE_NAMES.len());
        assert_eq!(resolve_pairs(&[]).len(), COMMON_SYMBOLS.len());
        assert_eq!(resolve_exchanges(&[" Binance ".to_string()]), ["binance"]);
        assert_eq!(resolve_pairs(&["btcusdt".to_string()]), ["BTC"]);
    }

    #[test]
    fn selection_parsing_drops_out_of_range_and_rejects_garbage() {
        assert_eq!(parse_selection("1, 3 ,5", 10), Some(vec![1, 3, 5]));
        assert_eq!(parse_selection("1,99", 10), Some(vec![1]));
        assert_eq!(parse_selection("one,two", 10), None);
    }
}
