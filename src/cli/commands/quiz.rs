//! Interactive quiz command.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::session::StudySession;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// What the learner typed at the answer prompt.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Answer(usize),
    Quit,
    Invalid,
}

fn parse_input(line: &str, option_count: usize) -> Input {
    let line = line.trim();
    if line.eq_ignore_ascii_case("q") || line.eq_ignore_ascii_case("quit") {
        return Input::Quit;
    }
    match line.parse::<usize>() {
        Ok(n) if (1..=option_count).contains(&n) => Input::Answer(n - 1),
        _ => Input::Invalid,
    }
}

/// Run the quiz command.
pub async fn run_quiz(
    input: &str,
    rebuild: bool,
    strategy: Option<&str>,
    mut settings: Settings,
) -> Result<()> {
    if let Some(strategy) = strategy {
        settings.quiz.strategy = strategy.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    }

    let orchestrator = Orchestrator::new(settings)?;
    if !orchestrator.has_generator() {
        Output::warning("No generative model configured; questions will be placeholders.");
    }

    let video = orchestrator.resolve_video(input)?;
    let mut session = StudySession::new();

    let spinner = Output::spinner("Preparing quiz...");
    let prepared = orchestrator.prepare_session(&mut session, &video, rebuild).await;
    spinner.finish_and_clear();

    match prepared {
        Ok(result) if result.from_cache => Output::info("Using cached quiz. Use --rebuild for new questions."),
        Ok(_) => {}
        Err(e) => {
            Output::warning(&format!("Could not prepare a quiz for {}: {}", video.video_id, e));
            return Ok(());
        }
    }

    run_questions(&mut session)?;

    let progress = session.quiz().progress();
    Output::header("Result");
    Output::kv("Score", &format!("{}/{}", progress.score, progress.current));
    Output::kv("Completed", &format!("{:.0}%", progress.percent));

    Ok(())
}

fn run_questions(session: &mut StudySession) -> Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let total = session.quiz().questions().len();

    while let Some(question) = session.quiz().current_question().cloned() {
        Output::question(session.quiz().current_index() + 1, total, &question);

        let answer = loop {
            print!("{} ", style("Answer (1-4, q to quit):").dim());
            io::stdout().flush()?;

            let Some(line) = lines.next() else {
                return Ok(());
            };
            match parse_input(&line?, question.options.len()) {
                Input::Answer(index) => break index,
                Input::Quit => return Ok(()),
                Input::Invalid => Output::warning("Enter a number from 1 to 4."),
            }
        };

        if session.quiz_mut().submit_answer(answer) {
            Output::success("Correct!");
        } else {
            Output::error(&format!("Incorrect. The answer was: {}", question.correct_answer()));
        }
        if !question.explanation.is_empty() {
            println!("   {}", style(&question.explanation).dim());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("2\n", 4), Input::Answer(1));
        assert_eq!(parse_input(" Q ", 4), Input::Quit);
        assert_eq!(parse_input("5", 4), Input::Invalid);
        assert_eq!(parse_input("0", 4), Input::Invalid);
        assert_eq!(parse_input("two", 4), Input::Invalid);
    }
}
