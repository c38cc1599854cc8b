//! Blocking question-and-answer with the operator.
//!
//! Everything that needs a human decision goes through [`Prompt`], so a
//! session can be driven by a terminal or by a fixed script.

use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader, Stdin, Stdout, Write};

use crate::error::SyncError;

/// Asks a question and blocks until an answer arrives.
pub trait Prompt {
    /// Shows `question` and returns the answer with surrounding whitespace removed.
    /// An error means no answer will ever arrive.
    fn ask(&mut self, question: &str) -> io::Result<String>;
}

/// Reads answers line by line from `input`, writing questions to `output`.
pub struct ConsolePrompt<R, W> {
    input: R,
    output: W,
}

impl ConsolePrompt<BufReader<Stdin>, Stdout> {
    pub fn stdio() -> Self {
        ConsolePrompt::new(BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsolePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        ConsolePrompt { input, output }
    }
}

impl<R: BufRead, W: Write> Prompt for ConsolePrompt<R, W> {
    fn ask(&mut self, question: &str) -> io::Result<String> {
        write!(self.output, "{} ", question)?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
        }
        Ok(line.trim().to_owned())
    }
}

/// Answers from a fixed list, in order. Every question asked is kept for inspection.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<String>,
    questions: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScriptedPrompt {
            answers: answers.into_iter().map(Into::into).collect(),
            questions: Vec::new(),
        }
    }

    /// The questions asked so far.
    pub fn questions(&self) -> &[String] {
        &self.questions
    }

    /// Answers not consumed yet.
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Prompt for ScriptedPrompt {
    fn ask(&mut self, question: &str) -> io::Result<String> {
        self.questions.push(question.to_owned());
        match self.answers.pop_front() {
            Some(answer) => Ok(answer.trim().to_owned()),
            None => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted")),
        }
    }
}

/// Asks until `parse` accepts the answer.
pub fn ask_until<Q, T, F>(prompt: &mut Q, question: &str, parse: F) -> Result<T, SyncError>
where
    Q: Prompt + ?Sized,
    F: Fn(&str) -> Option<T>,
{
    loop {
        let answer = prompt.ask(question).map_err(SyncError::Prompt)?;
        match parse(&answer) {
            Some(value) => return Ok(value),
            None => warn!("Unrecognised answer {:?}", answer),
        }
    }
}

pub fn ask_yes_no<Q: Prompt + ?Sized>(prompt: &mut Q, question: &str) -> Result<bool, SyncError> {
    ask_until(prompt, question, |answer| match answer.to_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_prompt_reads_one_line_per_question() {
        let input = io::Cursor::new("  yes \nno\n");
        let mut output = Vec::new();
        {
            let mut prompt = ConsolePrompt::new(input, &mut output);
            assert_eq!(prompt.ask("first?").unwrap(), "yes");
            assert_eq!(prompt.ask("second?").unwrap(), "no");
            assert_eq!(prompt.ask("third?").unwrap_err().kind(), io::ErrorKind::UnexpectedEof);
        }
        assert_eq!(String::from_utf8(output).unwrap(), "first? second? third? ");
    }

    #[test]
    fn unrecognised_answers_are_asked_again() {
        let mut prompt = ScriptedPrompt::new(vec!["maybe", "Y"]);
        assert!(ask_yes_no(&mut prompt, "purge?").unwrap());
        assert_eq!(prompt.questions().len(), 2);
        assert_eq!(prompt.remaining(), 0);
    }

    #[test]
    fn exhausted_script_is_a_prompt_error() {
        let mut prompt = ScriptedPrompt::new(Vec::<String>::new());
        match ask_yes_no(&mut prompt, "purge?") {
            Err(SyncError::Prompt(_)) => {}
            other => panic!("unexpected result {:?}", other),
        }
    }
}
