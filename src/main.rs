use clap::Parser;
use cpu_ident::{get_brand, get_core_count, get_feature_summary, get_part, get_vendor, Report, Tier};
use tracing::Level;

#[derive(Parser, Debug)]
#[command(author, version, about = "Identify the host CPU", long_about = None)]
struct Args {
    /// Print the report as JSON
    #[arg(short, long)]
    json: bool,

    /// List every SIMD tier with its result
    #[arg(short, long)]
    tiers: bool,

    /// Log acquisition failures to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    if args.json {
        let json = serde_json::to_string_pretty(&Report::collect())?;
        println!("{}", json);
        return Ok(());
    }

    let mut buffer = [0u8; 2048];
    let queries: [(&str, fn(&mut [u8]) -> bool); 5] = [
        ("Vendor", get_vendor),
        ("Brand", get_brand),
        ("Part", get_part),
        ("Cores", get_core_count),
        ("Features", get_feature_summary),
    ];
    for (label, query) in queries {
        if query(&mut buffer) {
            let text = cpu_ident::core::buffer::terminated_str(&buffer);
            println!("{:<9} {}", format!("{}:", label), text);
        }
    }

    if args.tiers {
        println!();
        for tier in Tier::ALL {
            let mark = if cpu_ident::cpu_supports(tier) { "yes" } else { "no" };
            println!("  {:<18} {}", tier.mnemonic(), mark);
        }
    }

    Ok(())
}
