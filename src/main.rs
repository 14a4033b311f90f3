use clap::{Parser, ValueEnum};
use data_encoding::{BASE64, HEXLOWER_PERMISSIVE};
use dvbsi::fmt::{format_payload, running_status_name};
use dvbsi::{Sdt, Section};
use std::process;

/// Parse DVB Service Description Table sections and print the reassembled
/// table.
#[derive(Parser)]
#[command(name = "dvbsi", version)]
struct Args {
    /// Hex- or base64-encoded SI sections, in transmission order. Each
    /// argument may carry one section or several back to back.
    #[arg(required = true)]
    sections: Vec<String>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

#[derive(Copy, Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable summary.
    Text,
    /// JSON document.
    Json,
}

fn decode_input(arg: &str) -> Result<Vec<u8>, String> {
    let compact: String = arg.chars().filter(|c| !c.is_whitespace()).collect();
    if let Ok(bytes) = HEXLOWER_PERMISSIVE.decode(compact.as_bytes()) {
        return Ok(bytes);
    }
    BASE64
        .decode(compact.as_bytes())
        .map_err(|e| format!("input is neither hex nor base64: {e}"))
}

fn parse_sections(bytes: &[u8]) -> Result<Vec<Section>, String> {
    let mut sections = Vec::new();
    let mut rest = bytes;
    while !rest.is_empty() {
        // 0xFF after a section is stuffing up to the end of the packet.
        if rest[0] == 0xFF {
            break;
        }
        let (section, consumed) =
            Section::parse(rest).map_err(|e| format!("error parsing section: {e}"))?;
        sections.push(section);
        rest = &rest[consumed..];
    }
    Ok(sections)
}

fn print_text(sdt: &Sdt) {
    println!("Service Description Table");
    println!("  Table ID: 0x{:02X}", sdt.table_id());
    println!("  Version: {}", sdt.version);
    println!("  Current: {}", sdt.is_current);
    println!("  Transport Stream ID: {}", sdt.transport_stream_id);
    println!("  Original Network ID: {}", sdt.original_network_id);
    println!("  Services: {}", sdt.services.len());
    for (id, service) in &sdt.services {
        println!("    Service 0x{id:04X}");
        let name = service.service_name();
        if !name.is_empty() {
            println!("      Name: {name}");
        }
        let provider = service.provider_name();
        if !provider.is_empty() {
            println!("      Provider: {provider}");
        }
        println!("      Type: 0x{:02X}", service.service_type());
        println!(
            "      Running Status: {}",
            running_status_name(service.running_status)
        );
        println!("      Free CA Mode: {}", service.free_ca_mode);
        println!(
            "      EIT: schedule={} present/following={}",
            service.eit_schedule, service.eit_present_following
        );
        for descriptor in &service.descriptors {
            println!(
                "      Descriptor 0x{:02X}: {}",
                descriptor.tag(),
                format_payload(descriptor.payload())
            );
        }
    }
}

fn main() {
    let args = Args::parse();

    let mut sections = Vec::new();
    for arg in &args.sections {
        let bytes = match decode_input(arg) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        };
        match parse_sections(&bytes) {
            Ok(parsed) => sections.extend(parsed),
            Err(e) => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        }
    }

    let sdt = Sdt::from_sections(&sections);

    match args.output {
        OutputFormat::Text => {
            if !sdt.is_valid() {
                eprintln!("Error: section sequence does not form a valid SDT");
                process::exit(1);
            }
            print_text(&sdt);
        }
        OutputFormat::Json => {
            let status = if sdt.is_valid() { "success" } else { "invalid" };
            let document = serde_json::json!({
                "status": status,
                "section_count": sections.len(),
                "data": sdt,
            });
            match serde_json::to_string_pretty(&document) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("Error serializing output: {e}");
                    process::exit(1);
                }
            }
            if !sdt.is_valid() {
                process::exit(1);
            }
        }
    }
}
