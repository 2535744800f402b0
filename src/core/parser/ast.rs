#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RedirectInstruction {
    /// `<`
    Input,
    /// `>`
    Output,
    /// `>>`
    Append,
}

impl RedirectInstruction {
    pub fn from_operator(token: &str) -> Option<Self> {
        match token {
            "<" => Some(RedirectInstruction::Input),
            ">" => Some(RedirectInstruction::Output),
            ">>" => Some(RedirectInstruction::Append),
            _ => None,
        }
    }

    pub fn is_input(self) -> bool {
        self == RedirectInstruction::Input
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Redirect {
    pub instruction: RedirectInstruction,
    pub filename: String,
}

/// One side of a command line: the argument vector with redirections
/// already removed, and the redirections in the order they were written.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SimpleCommand {
    pub words: Vec<String>,
    pub redirects: Vec<Redirect>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Command {
    Simple(SimpleCommand),
    Pipeline(SimpleCommand, SimpleCommand),
}

#[derive(Debug, Default)]
pub struct SimpleCommandBuilder {
    pub words: Vec<String>,
    pub redirects: Vec<Redirect>,
}

impl SimpleCommandBuilder {
    pub fn new() -> SimpleCommandBuilder {
        Default::default()
    }

    pub fn update(mut self, command_part: SimpleCommandPart) -> SimpleCommandBuilder {
        match command_part {
            SimpleCommandPart::Word(w) => self.words.push(w),
            SimpleCommandPart::Redirect(r) => self.redirects.push(r),
        };

        self
    }

    pub fn build(self) -> SimpleCommand {
        SimpleCommand {
            words: self.words,
            redirects: self.redirects,
        }
    }
}

#[derive(Debug)]
pub enum SimpleCommandPart {
    Word(String),
    Redirect(Redirect),
}
