//! Interactive terminal quiz loop.

use std::io::{self, BufRead, Write};

use quiz_core::grading::option_letter;
use quiz_core::model::{ModuleSelector, OptionMark, Seed};
use services::{
    GradingMode, QuestionView, QuizError, QuizLoopService, QuizScreen, QuizSession,
    RecoveryAction,
};

/// One line of user input, parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    /// Single letter: toggle that option.
    Toggle(usize),
    /// Empty line: lock (immediate mode) and move on.
    Advance,
    Next,
    Previous,
    /// 1-based question number.
    Jump(usize),
    Finish,
    Retry,
    Quit,
    Help,
    Unknown(String),
}

fn parse_action(line: &str) -> Action {
    let line = line.trim();
    if line.is_empty() {
        return Action::Advance;
    }
    if let Ok(number) = line.parse::<usize>() {
        return match number.checked_sub(1) {
            Some(index) => Action::Jump(index),
            None => Action::Unknown(line.to_owned()),
        };
    }
    let mut chars = line.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_alphabetic() {
            let upper = c.to_ascii_uppercase();
            return Action::Toggle(usize::from(upper as u8 - b'A'));
        }
    }
    match line.to_ascii_lowercase().as_str() {
        "next" | ">" => Action::Next,
        "back" | "prev" | "<" => Action::Previous,
        "finish" | "submit" => Action::Finish,
        "retry" => Action::Retry,
        "quit" | "exit" => Action::Quit,
        "help" | "?" => Action::Help,
        _ => Action::Unknown(line.to_owned()),
    }
}

enum SessionExit {
    Retry(QuizSession),
    Quit,
}

/// Run quizzes until the user quits.
///
/// # Errors
///
/// Returns an error only when the terminal cannot be read or written.
pub(crate) async fn play(
    service: &QuizLoopService,
    selector: ModuleSelector,
    seed: Option<Seed>,
) -> Result<(), Box<dyn std::error::Error>> {
    let stdin = io::stdin();
    let mut input = stdin.lock();

    let mut screen = match seed {
        Some(seed) => QuizScreen::Loading { selector, seed },
        None => service.loading(selector),
    };

    loop {
        screen = match screen {
            QuizScreen::Loading { selector, seed } => {
                println!("Loading questions for {selector} (seed {seed})...");
                service.start_with_seed(selector, seed).await
            }
            QuizScreen::NoQuestions { selector, .. } => {
                println!("No questions available for {selector}.");
                return Ok(());
            }
            QuizScreen::Failed(err) => {
                report_error(&err);
                return Ok(());
            }
            QuizScreen::Ready(session) => {
                print_help(session.mode());
                match run_session(service, session, &mut input).await? {
                    SessionExit::Retry(session) => service.retry(session).await,
                    SessionExit::Quit => return Ok(()),
                }
            }
        };
    }
}

async fn run_session(
    service: &QuizLoopService,
    mut session: QuizSession,
    input: &mut impl BufRead,
) -> io::Result<SessionExit> {
    loop {
        if session.is_finished() {
            print_question(&session.current_view());
        } else {
            let progress = session.progress();
            println!();
            println!(
                "── answered {}/{} · graded {} ──",
                progress.answered, progress.total, progress.graded
            );
            print_question(&session.current_view());
        }

        let Some(line) = prompt(input)? else {
            return Ok(SessionExit::Quit);
        };

        let result = match parse_action(&line) {
            Action::Toggle(option) => session.toggle_option(option).map(|_| ()),
            Action::Advance => session.advance().map(|moved| {
                if !moved && !session.is_finished() {
                    println!("Last question. Type `finish` when you are done.");
                }
            }),
            Action::Next => {
                session.next();
                Ok(())
            }
            Action::Previous => {
                session.previous();
                Ok(())
            }
            Action::Jump(index) => session.jump_to(index),
            Action::Finish => {
                match service.finish(&mut session).await {
                    Ok(_) => print_outcome(&session),
                    Err(err) => {
                        report_error(&err);
                        if err.recovery() == RecoveryAction::ReturnHome {
                            return Ok(SessionExit::Quit);
                        }
                    }
                }
                Ok(())
            }
            Action::Retry => return Ok(SessionExit::Retry(session)),
            Action::Quit => return Ok(SessionExit::Quit),
            Action::Help => {
                print_help(session.mode());
                Ok(())
            }
            Action::Unknown(raw) => {
                println!("Unknown command: {raw} (type `help`)");
                Ok(())
            }
        };

        if let Err(err) = result {
            println!("! {err}");
        }
    }
}

fn prompt(input: &mut impl BufRead) -> io::Result<Option<String>> {
    print!("> ");
    io::stdout().flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

fn mark_symbol(mark: OptionMark) -> &'static str {
    match mark {
        OptionMark::Correct => "[+]",
        OptionMark::Wrong => "[-]",
        OptionMark::Selected => "[x]",
        OptionMark::Neutral => "[ ]",
    }
}

fn print_question(view: &QuestionView) {
    println!("Question {}/{}", view.index + 1, view.total);
    println!("{}", view.text);
    if view.multi_select {
        println!("(select all that apply)");
    }
    for option in &view.options {
        println!("  {} {}. {}", mark_symbol(option.mark), option.letter, option.text);
    }
    if let Some(is_correct) = view.is_correct {
        let status = if is_correct { "Correct." } else { "Incorrect." };
        let lock = if view.locked { "" } else { " (not locked yet)" };
        println!("{status}{lock}");
    }
    if let Some(explanation) = &view.explanation {
        println!("{explanation}");
    }
}

fn print_outcome(session: &QuizSession) {
    let Some(outcome) = session.outcome() else {
        return;
    };
    println!();
    println!(
        "Score: {}/{} ({}%)",
        outcome.summary.score, outcome.summary.total, outcome.summary.percentage
    );
    println!("{}", outcome.verdict.message());
    for (number, (result, question)) in outcome.results.iter().zip(session.questions()).enumerate() {
        let status = if result.is_correct { "+" } else { "-" };
        let picked: Vec<String> = result.selected.iter().map(option_letter).collect();
        let picked = if picked.is_empty() {
            "none".to_owned()
        } else {
            picked.join(", ")
        };
        println!("  {status} {:>2}. {} (you: {picked})", number + 1, question.text());
        if !result.is_correct {
            println!("       {}", result.explanation);
        }
    }
    println!();
    println!("Enter a question number to review it, `retry` for a new order, or `quit`.");
}

fn report_error(err: &QuizError) {
    println!("! {}", err.user_message());
    let hint = match err.recovery() {
        RecoveryAction::Reload => "Reload and try again.",
        RecoveryAction::Retry => "Type `submit` to try again.",
        RecoveryAction::ReturnHome => "Returning to the start.",
    };
    println!("  {hint}");
}

fn print_help(mode: GradingMode) {
    println!();
    println!("Commands:");
    println!("  a, b, c ...   toggle an option");
    match mode {
        GradingMode::Immediate => println!("  <enter>       lock the answer and go to the next question"),
        GradingMode::Batch => println!("  <enter>       go to the next question"),
    }
    println!("  next, back    move without locking");
    println!("  <number>      jump to a question");
    println!("  finish        grade the quiz (also `submit`)");
    println!("  retry         start over with a new question order");
    println!("  quit          leave");
}
