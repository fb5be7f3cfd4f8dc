//! `pathfinder ask`: One message, one reply.

use crate::StudentArgs;

pub async fn run(message: &str, student: &StudentArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (_config, pipeline) = super::pipeline(student.offline)?;
    let reply = pipeline.send_message(message, &student.context()).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&reply)?);
    } else {
        println!("{}", reply.message());
        eprintln!(
            "\n  [{} · confidence {:.2}{}]",
            reply.source(),
            reply.confidence(),
            if reply.is_offline() { " · offline" } else { "" }
        );
    }

    Ok(())
}
