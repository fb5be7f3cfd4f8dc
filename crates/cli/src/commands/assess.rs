//! `pathfinder assess`: Career interest assessment.

use pathfinder_core::assessment::{
    AnswerChoice, Catalogue, CategoryScore, builtin_catalogue, parse_answers, score,
};
use std::io::Write;
use std::path::Path;
use tokio::io::{self, AsyncBufReadExt, BufReader};

pub async fn run(
    answers: Option<&Path>,
    catalogue: Option<&Path>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let catalogue = match catalogue {
        Some(path) => Catalogue::from_json(&std::fs::read_to_string(path)?)
            .map_err(|e| format!("{}: {e}", path.display()))?,
        None => builtin_catalogue(),
    };

    let answers = match answers {
        Some(path) => parse_answers(&std::fs::read_to_string(path)?)
            .map_err(|e| format!("{}: {e}", path.display()))?,
        None => ask_interactively(&catalogue).await?,
    };

    let scores = score(&catalogue, &answers);
    if json {
        println!("{}", serde_json::to_string_pretty(&scores)?);
    } else {
        print!("{}", render(&scores));
    }
    Ok(())
}

async fn ask_interactively(catalogue: &Catalogue) -> Result<Vec<AnswerChoice>, Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(io::stdin()).lines();
    let mut answers = Vec::with_capacity(catalogue.questions.len());

    for (n, question) in catalogue.questions.iter().enumerate() {
        println!("\n  {}. {}", n + 1, question.text);
        for (i, option) in question.options.iter().enumerate() {
            println!("     {}) {}", i + 1, option.label);
        }

        loop {
            print!("  Choice (Enter to skip) > ");
            std::io::stdout().flush()?;
            let Some(line) = lines.next_line().await? else {
                return Ok(answers);
            };
            let line = line.trim();
            if line.is_empty() {
                break;
            }
            match line.parse::<usize>().ok().and_then(|i| question.options.get(i.wrapping_sub(1))) {
                Some(option) => {
                    answers.push(AnswerChoice {
                        question_id: question.id.clone(),
                        option_id: option.id.clone(),
                    });
                    break;
                }
                None => println!("  Please enter a number between 1 and {}.", question.options.len()),
            }
        }
    }
    Ok(answers)
}

fn render(scores: &[CategoryScore]) -> String {
    let mut out = String::from("\n  Your career interest profile\n  ----------------------------\n");
    for s in scores {
        let bar = "█".repeat((s.percentage / 5.0).round() as usize);
        out.push_str(&format!("  {:<12} {:>5.1}%  {bar}\n", s.category, s.percentage));
    }
    if scores.first().is_some_and(|s| s.percentage > 0.0) {
        out.push_str(&format!(
            "\n  Strongest match: {}. Ask `pathfinder ask` about it for next steps.\n",
            scores[0].category
        ));
    }
    out
}
