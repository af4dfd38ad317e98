//! Collector Command Encoding Demo
//!
//! Encodes a handful of text commands for a collector serial number and
//! prints the framed bytes.
//!
//! Usage:
//!   cargo run --example encode_commands -- [SNCODE]

use huasilink_core::protocol::{CalType, CommandBuilder, LayType, TxtCommand};

fn main() {
    let sncode = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "280537".to_string());

    println!("Encoding commands for collector {}", sncode);
    let builder = CommandBuilder::new(&sncode);

    let commands = vec![
        TxtCommand::GetData,
        TxtCommand::GetNodes,
        TxtCommand::SetMode {
            cal_type: CalType::NearEnd,
            lay_type: LayType::Vertical,
        },
        TxtCommand::set_twist(vec![("0001".to_string(), 10.0), ("0002".to_string(), 20.0)]),
        TxtCommand::SetGlimit { glimit: 0.5 },
        TxtCommand::Ack,
    ];

    for command in commands {
        match builder.encode(&command) {
            Ok(frame) => {
                let hex: Vec<String> = frame.iter().map(|b| format!("{:02X}", b)).collect();
                println!(
                    "  {:40} {}",
                    String::from_utf8_lossy(&frame).trim_end(),
                    hex.join(" ")
                );
            }
            Err(err) => println!("  {:?} failed: {}", command.id(), err),
        }
    }
}
