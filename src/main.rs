use ctxtnef::{next_record, Tnef, TnefError, TNEF_SIGNATURE};
use std::fs::File;
use std::io::{self, Write};
use tracing_subscriber::prelude::*;

fn usage(me: &str) -> ! {
    eprintln!("Usage:");
    eprintln!("{} <tneffile>", me);
    eprintln!("  Lists the message details and the attachments in <tneffile>");
    eprintln!("{} <tneffile> --records", me);
    eprintln!("  Lists the raw records in <tneffile>");
    eprintln!("{} <tneffile> --json", me);
    eprintln!("  Dumps the decoded <tneffile> as JSON");
    eprintln!("{} <tneffile> --body <output>", me);
    eprintln!("  Extracts the text body from <tneffile> and writes it to <output>");
    eprintln!("{} <tneffile> --html <output>", me);
    eprintln!("  Extracts the HTML body from <tneffile> and writes it to <output>");
    eprintln!("{} <tneffile> <n> <output>", me);
    eprintln!("  Extracts attachment number <n> from <tneffile> and writes it to <output>");
    std::process::exit(1);
}

fn write_data(data: &[u8], to: &str) -> Result<(), io::Error> {
    let mut writer: Box<dyn Write> = match to {
        "-" => Box::new(io::stdout()),
        _ => Box::new(File::create(to)?),
    };
    writer.write_all(data)
}

fn list_records(fname: &str) -> Result<(), TnefError> {
    let data = std::fs::read(fname).map_err(TnefError::Io)?;
    if data.len() < 6 || data[0..4] != TNEF_SIGNATURE.to_le_bytes() {
        return Err(TnefError::NoMarker);
    }
    let mut r = &data[6..];
    while let Some(rec) = next_record(&mut r) {
        println!(
            "level {:#04x} id {:#06x} type {:#06x} len {} checksum {:#06x}",
            rec.level,
            rec.id,
            rec.data_type,
            rec.data.len(),
            rec.checksum
        );
    }
    if !r.is_empty() {
        eprintln!("Warning: {} trailing bytes after the last record", r.len());
    }
    Ok(())
}

fn main() -> Result<(), TnefError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();
    if !(2..=4).contains(&args.len()) {
        usage(&args[0]);
    }

    let fname = &args[1];
    if args.len() == 3 && args[2] == "--records" {
        return list_records(fname).map_err(|e| {
            eprintln!("Failed to scan {}: {}", fname, e);
            e
        });
    }

    let tnef = Tnef::decode_file(fname).map_err(|e| {
        eprintln!("Failed to decode {}: {}", fname, e);
        e
    })?;

    if args.len() == 2 {
        if let Some(class) = &tnef.message_class {
            println!("Message class: {}", String::from_utf8_lossy(class));
        }
        if let Some(body) = &tnef.body {
            println!("Text body: {} bytes", body.len());
        }
        if let Some(html) = &tnef.body_html {
            println!("HTML body: {} bytes", html.len());
        }
        println!("Message properties: {}", tnef.properties.len());
        for (n, attachment) in tnef.attachments.iter().enumerate() {
            let inline = if tnef.attachment_is_inline(attachment) {
                " (inline)"
            } else {
                ""
            };
            println!(
                "[{}] {:?} {} bytes{}",
                n,
                attachment.title,
                attachment.data.as_ref().map(|d| d.len()).unwrap_or(0),
                inline
            );
        }
    } else if args[2] == "--json" {
        let json = serde_json::to_string_pretty(&tnef)
            .map_err(|e| TnefError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))?;
        println!("{}", json);
    } else if args[2] == "--body" || args[2] == "--html" {
        if args.len() != 4 {
            usage(&args[0]);
        }
        let body = if args[2] == "--body" {
            &tnef.body
        } else {
            &tnef.body_html
        };
        match body {
            Some(data) => write_data(data, &args[3]).map_err(|e| {
                eprintln!("Failed to write output: {}", e);
                TnefError::Io(e)
            })?,
            None => {
                eprintln!("The requested body is not present");
                std::process::exit(1);
            }
        }
    } else if args.len() == 4 {
        let n: usize = match args[2].parse() {
            Ok(n) => n,
            Err(_) => usage(&args[0]),
        };
        let attachment = match tnef.attachments.get(n) {
            Some(attachment) => attachment,
            None => {
                eprintln!(
                    "No attachment {} ({} attachments present)",
                    n,
                    tnef.attachments.len()
                );
                std::process::exit(1);
            }
        };
        match &attachment.data {
            Some(data) => write_data(data, &args[3]).map_err(|e| {
                eprintln!("Failed to write output: {}", e);
                TnefError::Io(e)
            })?,
            None => {
                eprintln!("Attachment {} carries no data", n);
                std::process::exit(1);
            }
        }
    } else {
        usage(&args[0]);
    }
    Ok(())
}
