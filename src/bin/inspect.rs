use clap::Parser;
use cpu_ident::core::cpuid::{CpuRegisterSet, CpuidSource, EXTENDED_BASE};
use cpu_ident::core::cpuinfo::{CpuinfoScanner, PROC_CPUINFO};
use cpu_ident::platform::arm::{feature_tokens, IdRegisters, Midr};
use cpu_ident::platform::{self, x86};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{warn, Level};

/// Standard leaves past this are vendor-reserved noise on most parts.
const MAX_DUMPED_LEAF: u32 = 0x20;
const MAX_DUMPED_EXTENDED: u32 = EXTENDED_BASE + 0x20;

#[derive(Parser, Debug)]
#[command(author, version, about = "Dump raw CPU identification descriptors as JSON", long_about = None)]
struct Args {
    /// Scan this cpuinfo-format file instead of the live descriptors
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = PROC_CPUINFO)]
    cpuinfo: Option<PathBuf>,

    /// Keys to look up, in file order (with --cpuinfo)
    #[arg(short, long = "key", value_name = "KEY")]
    keys: Vec<String>,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct LeafDump {
    leaf: String,
    subleaf: u32,
    registers: CpuRegisterSet,
}

#[derive(Serialize)]
struct CpuidDump {
    vendor: Option<String>,
    brand: Option<String>,
    signature: Option<String>,
    leaves: Vec<LeafDump>,
}

#[derive(Serialize)]
struct IdRegisterDump {
    registers: IdRegisters,
    midr: Midr,
    vendor: Option<&'static str>,
    part: Option<&'static str>,
    architecture: Option<&'static str>,
    features: Vec<&'static str>,
}

#[derive(Serialize)]
struct EntryDump {
    key: String,
    value: Option<String>,
}

#[derive(Serialize)]
struct Inspection {
    provider: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cpuid: Option<CpuidDump>,
    #[serde(skip_serializing_if = "Option::is_none")]
    id_registers: Option<IdRegisterDump>,
}

fn dump_range(cpuid: &dyn CpuidSource, base: u32, cap: u32, leaves: &mut Vec<LeafDump>) {
    let max = match cpuid.max_leaf(base) {
        Ok(max) => max.min(cap),
        Err(err) => {
            warn!("leaf {:#x} probe failed: {}", base, err);
            return;
        }
    };
    for leaf in base..=max {
        // Leaves 4, 7, 0xb and 0xd are indexed; subleaf 0 and 1 cover what matters here.
        let subleaves = if matches!(leaf, 0x4 | 0x7 | 0xb | 0xd) { 0..2 } else { 0..1 };
        for subleaf in subleaves {
            if let Ok(registers) = cpuid.query(leaf, subleaf) {
                leaves.push(LeafDump {
                    leaf: format!("{:#010x}", leaf),
                    subleaf,
                    registers,
                });
            }
        }
    }
}

fn dump_cpuid(cpuid: &dyn CpuidSource) -> CpuidDump {
    let mut leaves = Vec::new();
    dump_range(cpuid, 0, MAX_DUMPED_LEAF, &mut leaves);
    dump_range(cpuid, EXTENDED_BASE, MAX_DUMPED_EXTENDED, &mut leaves);
    CpuidDump {
        vendor: x86::vendor_string(cpuid).ok(),
        brand: x86::brand_string(cpuid).ok(),
        signature: x86::signature(cpuid).ok().map(|sig| sig.to_string()),
        leaves,
    }
}

fn dump_id_registers(registers: IdRegisters) -> IdRegisterDump {
    let midr = Midr::decode(registers.midr);
    IdRegisterDump {
        registers,
        midr,
        vendor: midr.vendor_name().ok(),
        part: midr.part_name().ok(),
        architecture: midr.architecture_name().ok(),
        features: feature_tokens(&registers),
    }
}

fn scan_cpuinfo(path: &PathBuf, keys: &[String]) -> Result<Vec<EntryDump>, Box<dyn std::error::Error>> {
    let mut scanner = CpuinfoScanner::open(path)?;
    let mut entries = Vec::with_capacity(keys.len());
    for key in keys {
        let value = match scanner.next_entry(key) {
            Ok(value) => Some(value.to_string()),
            Err(err) => {
                warn!("{}: {}", key, err);
                None
            }
        };
        entries.push(EntryDump { key: key.clone(), value });
    }
    Ok(entries)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    if let Some(path) = &args.cpuinfo {
        let entries = scan_cpuinfo(path, &args.keys)?;
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    let host = platform::host();
    let inspection = Inspection {
        provider: host.name(),
        cpuid: host.cpuid().map(dump_cpuid),
        id_registers: host.id_registers().ok().map(dump_id_registers),
    };
    println!("{}", serde_json::to_string_pretty(&inspection)?);

    Ok(())
}
