//! `pathfinder chat`: Interactive conversation with in-memory history.

use pathfinder_core::message::ChatMessage;
use std::io::Write;
use tokio::io::{self, AsyncBufReadExt, BufReader};

use crate::StudentArgs;

pub async fn run(student: &StudentArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (config, pipeline) = super::pipeline(student.offline)?;
    let probe = super::start_probe(&config, &pipeline);
    let mut context = student.context();

    println!();
    println!("  Pathfinder — Career Guidance");
    println!("  ============================");
    println!();
    println!("  Student:    {} ({})", context.first_name(), context.education_level.label());
    println!("  Region:     {}", context.region_or_default());
    if pipeline.provider_ids().is_empty() {
        println!("  Providers:  none configured (offline answers only)");
    } else {
        println!("  Providers:  {}", pipeline.provider_ids().join(" → "));
    }
    println!();
    println!("  Type your question and press Enter.");
    println!("  Commands: /offline, /online, /status, exit");
    println!();

    let mut lines = BufReader::new(io::stdin()).lines();
    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        match line {
            "" => continue,
            "exit" | "quit" | "/exit" | "/quit" => break,
            "/offline" => {
                pipeline.set_offline_mode(true);
                println!("  Offline mode on.\n");
                continue;
            }
            "/online" => {
                pipeline.set_offline_mode(false);
                println!("  Offline mode off.\n");
                continue;
            }
            "/status" => {
                let status = if pipeline.connection_status() { "online" } else { "offline" };
                println!("  Connection: {status}\n");
                continue;
            }
            _ => {}
        }

        let reply = pipeline.send_message(line, &context).await;
        println!("\n  Guide > {}", reply.message());
        println!("          [{} · {:.2}]\n", reply.source(), reply.confidence());

        context.prior_messages.push(ChatMessage::user(line));
        context.prior_messages.push(ChatMessage::assistant(reply.message()));
    }

    if let Some(probe) = probe {
        probe.abort();
    }
    println!("  Goodbye, {}!", context.first_name());
    Ok(())
}
